//! Renderers - Accessor Declarations From A Symbol Table
//!
//! A renderer keeps category grouping and symbol order exactly as the table
//! gives them. Every constant is preceded by a comment holding the original
//! resource name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::symbols::{Symbol, SymbolTable};

pub const GENERATED_NOTICE: &str = "// Generated by resindex. Do not edit.";

/// Target language of the generated accessors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Objc,
    Swift,
}

impl Language {
    pub fn renderer(self) -> Box<dyn Renderer> {
        match self {
            Self::Objc => Box::new(ObjcRenderer),
            Self::Swift => Box::new(SwiftRenderer),
        }
    }

    /// Words an identifier must not be equal to
    pub fn reserved_words(self) -> &'static [&'static str] {
        match self {
            Self::Objc => OBJC_RESERVED,
            Self::Swift => SWIFT_RESERVED,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Objc => "objc",
            Self::Swift => "swift",
        })
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "objc" | "objective-c" => Ok(Self::Objc),
            "swift" => Ok(Self::Swift),
            other => Err(format!("unknown target language '{}'", other)),
        }
    }
}

const OBJC_RESERVED: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "id", "self", "super", "nil", "Nil",
    "YES", "NO", "BOOL", "SEL", "Class", "IMP", "in", "out", "inout", "bycopy", "byref",
    "oneway", "nonatomic", "atomic", "strong", "weak", "retain", "assign", "copy", "readonly",
    "readwrite", "getter", "setter", "nullable", "nonnull",
];

const SWIFT_RESERVED: &[&str] = &[
    "associatedtype", "class", "deinit", "enum", "extension", "fileprivate", "func", "import",
    "init", "inout", "internal", "let", "open", "operator", "private", "precedencegroup",
    "protocol", "public", "rethrows", "static", "struct", "subscript", "typealias", "var",
    "break", "case", "catch", "continue", "default", "defer", "do", "else", "fallthrough",
    "for", "guard", "if", "in", "repeat", "return", "throw", "switch", "where", "while", "as",
    "false", "is", "nil", "self", "Self", "super", "throws", "true", "try", "async", "await",
    "any", "some",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedFile {
    pub file_name: String,
    pub contents: String,
}

pub trait Renderer {
    fn language(&self) -> Language;
    fn render(&self, constant_name: &str, table: &SymbolTable) -> Vec<RenderedFile>;
}

/// Indenting line writer for nested declarations
pub struct CodeWriter {
    out: String,
    depth: usize,
    unit: &'static str,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
            unit: "    ",
        }
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(self.unit);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Writes `open`, the body one level deeper, then `close`
    pub fn block(&mut self, open: impl AsRef<str>, close: impl AsRef<str>, body: impl FnOnce(&mut Self)) {
        self.line(open);
        self.depth += 1;
        body(self);
        self.depth -= 1;
        self.line(close);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Comment lines of a symbol: the original name, then its documentation
pub fn doc_lines(symbol: &Symbol) -> Vec<String> {
    let mut lines: Vec<String> = symbol.comment().lines().map(|l| format!("/// {}", l)).collect();
    if lines.is_empty() {
        lines.push(format!("/// {}", symbol.comment()));
    }
    if let Some(doc) = symbol.documentation.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.extend(doc.lines().map(|l| format!("/// {}", l.trim_end())));
    }
    lines
}

/// Body of a double-quoted string literal
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

// --- Concrete Renderers ---

/// `R.h` with a nested struct declaration and `R.m` with its definition
pub struct ObjcRenderer;

impl Renderer for ObjcRenderer {
    fn language(&self) -> Language { Language::Objc }

    fn render(&self, constant_name: &str, table: &SymbolTable) -> Vec<RenderedFile> {
        let mut header = CodeWriter::new();
        header.line(GENERATED_NOTICE);
        header.line("");
        header.line("#import <Foundation/Foundation.h>");
        header.line("");
        header.block(
            format!("extern const struct {} {{", constant_name),
            format!("}} {};", constant_name),
            |w| {
                if table.is_empty() {
                    w.line("char empty;");
                }
                for section in table.sections() {
                    let name = section.category.name();
                    w.block(format!("struct {} {{", name), format!("}} {};", name), |w| {
                        for symbol in &section.symbols {
                            for doc in doc_lines(symbol) {
                                w.line(doc);
                            }
                            w.line(format!("__unsafe_unretained NSString *{};", symbol.identifier));
                        }
                    });
                }
            },
        );

        let mut implementation = CodeWriter::new();
        implementation.line(GENERATED_NOTICE);
        implementation.line("");
        implementation.line(format!("#import \"{}.h\"", constant_name));
        implementation.line("");
        implementation.block(
            format!("const struct {0} {0} = {{", constant_name),
            "};",
            |w| {
                if table.is_empty() {
                    w.line(".empty = 0,");
                }
                for section in table.sections() {
                    w.block(format!(".{} = {{", section.category.name()), "},", |w| {
                        for symbol in &section.symbols {
                            w.line(format!(
                                ".{} = @\"{}\",",
                                symbol.identifier,
                                escape_literal(&symbol.reference)
                            ));
                        }
                    });
                }
            },
        );

        vec![
            RenderedFile {
                file_name: format!("{}.h", constant_name),
                contents: header.finish(),
            },
            RenderedFile {
                file_name: format!("{}.m", constant_name),
                contents: implementation.finish(),
            },
        ]
    }
}

/// `R.swift` with one nested enum per category
pub struct SwiftRenderer;

impl Renderer for SwiftRenderer {
    fn language(&self) -> Language { Language::Swift }

    fn render(&self, constant_name: &str, table: &SymbolTable) -> Vec<RenderedFile> {
        let mut out = CodeWriter::new();
        out.line(GENERATED_NOTICE);
        out.line("");
        out.block(format!("enum {} {{", constant_name), "}", |w| {
            for (i, section) in table.sections().iter().enumerate() {
                if i > 0 {
                    w.line("");
                }
                w.block(format!("enum {} {{", section.category.name()), "}", |w| {
                    for symbol in &section.symbols {
                        for doc in doc_lines(symbol) {
                            w.line(doc);
                        }
                        w.line(format!(
                            "static let {} = \"{}\"",
                            symbol.identifier,
                            escape_literal(&symbol.reference)
                        ));
                    }
                });
            }
        });

        vec![RenderedFile {
            file_name: format!("{}.swift", constant_name),
            contents: out.finish(),
        }]
    }
}
