//! Symbol Table - The Compiler's Output

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

use crate::categories::Category;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub identifier: String,
    /// Raw name, never normalized
    pub original_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub reference: String,
    pub source: PathBuf,
    pub category: Category,
}

impl Symbol {
    /// Text of the comment emitted next to the symbol
    pub fn comment(&self) -> &str {
        &self.original_name
    }
}

/// Order of symbols inside a category: case-insensitive original name,
/// then exact bytes, then source path.
pub fn symbol_order(a: &Symbol, b: &Symbol) -> Ordering {
    a.original_name
        .to_lowercase()
        .cmp(&b.original_name.to_lowercase())
        .then_with(|| a.original_name.cmp(&b.original_name))
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.identifier.cmp(&b.identifier))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySymbols {
    pub category: Category,
    pub symbols: Vec<Symbol>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    sections: Vec<CategorySymbols>,
}

impl SymbolTable {
    /// Sections must already be in declared category order with sorted symbols.
    pub(crate) fn from_sections(sections: Vec<CategorySymbols>) -> Self {
        Self {
            sections: sections.into_iter().filter(|s| !s.symbols.is_empty()).collect(),
        }
    }

    pub fn sections(&self) -> &[CategorySymbols] {
        &self.sections
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.sections.iter().map(|s| &s.category)
    }

    pub fn get(&self, category: &Category) -> Option<&[Symbol]> {
        self.sections
            .iter()
            .find(|s| &s.category == category)
            .map(|s| s.symbols.as_slice())
    }

    pub fn identifiers(&self, category: &Category) -> Vec<&str> {
        self.get(category)
            .unwrap_or_default()
            .iter()
            .map(|s| s.identifier.as_str())
            .collect()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.sections.iter().flat_map(|s| s.symbols.iter())
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.symbols.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
