//! Resource Scanner - Filesystem To Raw Resources
//!
//! Finds loose images and fonts, `*.bundle` directories, `*.xcassets`
//! catalogs and `*.lproj/*.strings` tables. Images are never opened;
//! `.strings` tables are read only to list their keys.

use globset::GlobSet;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::categories::{Category, FONT_EXTENSIONS, IMAGE_EXTENSIONS};
use crate::config::{CompileConfig, ConfigError};
use crate::resource::RawResource;

/// Asset catalog set kinds that become catalog entries
pub const CATALOG_SET_EXTENSIONS: &[&str] = &["imageset", "appiconset", "launchimage"];

lazy_static! {
    /// `name@2x~ipad.png` -> `name` + `.png`
    static ref DEVICE_VARIANT_RE: Regex =
        Regex::new(r"^(?P<base>.+?)(@[1-9]x)?(~(iphone|ipad))?(?P<ext>\.[^.]+)$").unwrap();

    /// Launch images the system loads by itself
    static ref LAUNCH_IMAGE_RE: Regex =
        Regex::new(r"^Default(-568h)?(@2x)?\.[^.]+$").unwrap();

    /// `/* comment */ "key" = "value";` with an optional leading comment.
    /// A block comment ends at its first `*/`. A comment separated from the
    /// key by a blank line stands alone and documents nothing.
    static ref STRINGS_ENTRY_RE: Regex = Regex::new(
        r#"(?:(?:/\*(?P<block>[^*]*\*+(?:[^/*][^*]*\*+)*)/|//(?P<line>[^\n]*))[ \t]*(?:\r?\n[ \t]*)?)?"(?P<key>(?:[^"\\]|\\.)*)"\s*=\s*"(?:[^"\\]|\\.)*"\s*;"#
    )
    .unwrap();
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to walk resource tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is neither UTF-8 nor UTF-16")]
    Encoding(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringsEntry {
    pub key: String,
    pub comment: Option<String>,
}

pub struct Scanner {
    root: PathBuf,
    exclude: GlobSet,
    default_language: Option<String>,
    extra_extensions: BTreeSet<String>,
    include_unknown: bool,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude: GlobSet::empty(),
            default_language: None,
            extra_extensions: BTreeSet::new(),
            include_unknown: false,
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &CompileConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(root)
            .with_exclude(config.exclude_set()?)
            .with_default_language(config.default_language.clone())
            .with_extensions(config.custom_extensions())
            .include_unknown(config.include_unknown))
    }

    /// Paths (relative to the root) matching the set are skipped
    pub fn with_exclude(mut self, exclude: GlobSet) -> Self {
        self.exclude = exclude;
        self
    }

    /// `.lproj` language providing string keys. Without one, `en` is used
    /// if present, else the first language found.
    pub fn with_default_language(mut self, language: Option<String>) -> Self {
        self.default_language = language;
        self
    }

    /// Further file extensions to report, e.g. those of custom categories
    pub fn with_extensions(mut self, extensions: BTreeSet<String>) -> Self {
        self.extra_extensions = extensions;
        self
    }

    /// Also report files of unknown kinds, so the classifier decides
    /// what happens to them.
    pub fn include_unknown(mut self, include: bool) -> Self {
        self.include_unknown = include;
        self
    }

    pub fn scan(&self) -> Result<Vec<RawResource>, ScanError> {
        let mut resources = vec![];
        let mut loose = BTreeSet::new();
        let mut tables: Vec<(String, PathBuf)> = vec![];
        let (mut bundles, mut catalogs, mut skipped) = (0usize, 0usize, 0usize);

        let mut walker = WalkDir::new(&self.root).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let Some(entry) = readable(entry)? else {
                continue;
            };
            if entry.depth() == 0 {
                continue;
            }
            let rel = self.relative(entry.path());
            let is_dir = entry.file_type().is_dir();

            if is_hidden(&rel) || self.exclude.is_match(&rel) {
                if is_dir {
                    walker.skip_current_dir();
                }
                continue;
            }

            let ext = lowercase_extension(&rel);
            if is_dir {
                match ext.as_deref() {
                    Some("bundle") => {
                        resources.extend(self.scan_bundle(entry.path(), &rel)?);
                        bundles += 1;
                        walker.skip_current_dir();
                    }
                    Some("xcassets") => {
                        resources.extend(self.scan_catalog(entry.path(), &rel)?);
                        catalogs += 1;
                        walker.skip_current_dir();
                    }
                    _ => {}
                }
                continue;
            }

            match ext.as_deref() {
                Some("strings") => {
                    if let Some(language) = lproj_language(&rel) {
                        tables.push((language, rel));
                    }
                }
                Some(e) if IMAGE_EXTENSIONS.contains(&e) => {
                    if !LAUNCH_IMAGE_RE.is_match(&file_name(&rel)) {
                        loose.insert(strip_device_variant(&rel));
                    }
                }
                Some(e) if FONT_EXTENSIONS.contains(&e) => {
                    let name = file_name(&rel);
                    resources.push(RawResource::file_with_reference(rel, name));
                }
                Some(e) if self.extra_extensions.contains(e) => {
                    let name = file_name(&rel);
                    resources.push(RawResource::file_with_reference(rel, name));
                }
                _ if self.include_unknown => {
                    let name = file_name(&rel);
                    resources.push(RawResource::file_with_reference(rel, name));
                }
                _ => {
                    debug!(path = %rel.display(), "skipping file of unknown kind");
                    skipped += 1;
                }
            }
        }

        debug!(
            loose = loose.len(),
            bundles,
            catalogs,
            tables = tables.len(),
            skipped,
            "scanned resource tree"
        );

        for path in loose {
            let name = file_name(&path);
            resources.push(RawResource::file_with_reference(path, name));
        }

        resources.extend(self.scan_tables(tables)?);
        Ok(resources)
    }

    /// Images of a bundle (plus files of custom extensions), hinted with
    /// the category named like the bundle
    fn scan_bundle(&self, dir: &Path, rel_dir: &Path) -> Result<Vec<RawResource>, ScanError> {
        let name = file_stem(rel_dir);
        let category = Category::from_name(&name);
        let mut images = BTreeSet::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let Some(entry) = readable(entry)? else {
                continue;
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = self.relative(entry.path());
            if is_hidden(&rel) || self.exclude.is_match(&rel) {
                continue;
            }
            match lowercase_extension(&rel) {
                Some(e) if IMAGE_EXTENSIONS.contains(&e.as_str()) => {
                    images.insert(strip_device_variant(&rel));
                }
                Some(e) if self.extra_extensions.contains(&e) => {
                    images.insert(rel);
                }
                _ => {}
            }
        }

        debug!(bundle = %rel_dir.display(), images = images.len(), "found resource bundle");

        Ok(images
            .into_iter()
            .map(|path| {
                let inner = path
                    .strip_prefix(rel_dir)
                    .unwrap_or(&path)
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                RawResource::file_with_reference(path, inner).with_hint(category.clone())
            })
            .collect())
    }

    fn scan_catalog(&self, dir: &Path, rel_dir: &Path) -> Result<Vec<RawResource>, ScanError> {
        let mut entries = vec![];
        let mut walker = WalkDir::new(dir).sort_by_file_name().into_iter();

        while let Some(entry) = walker.next() {
            let Some(entry) = readable(entry)? else {
                continue;
            };
            if !entry.file_type().is_dir() || entry.depth() == 0 {
                continue;
            }
            let rel = self.relative(entry.path());
            if self.exclude.is_match(&rel) {
                walker.skip_current_dir();
                continue;
            }
            let is_set = lowercase_extension(&rel)
                .map_or(false, |e| CATALOG_SET_EXTENSIONS.contains(&e.as_str()));
            if is_set {
                entries.push(RawResource::catalog_entry(rel_dir, file_stem(&rel)));
                walker.skip_current_dir();
            }
        }

        debug!(catalog = %rel_dir.display(), sets = entries.len(), "found asset catalog");
        Ok(entries)
    }

    fn scan_tables(&self, tables: Vec<(String, PathBuf)>) -> Result<Vec<RawResource>, ScanError> {
        let languages: BTreeSet<&str> = tables.iter().map(|(l, _)| l.as_str()).collect();
        let Some(language) = select_language(&languages, self.default_language.as_deref()) else {
            return Ok(vec![]);
        };
        if !languages.contains(language.as_str()) {
            warn!(%language, "no .strings tables for the default language");
        }
        debug!(%language, available = ?languages, "selected strings language");

        let mut keys = vec![];
        for (_, rel) in tables.iter().filter(|(l, _)| *l == language) {
            let path = self.root.join(rel);
            let bytes = fs::read(&path).map_err(|source| ScanError::Io {
                path: path.clone(),
                source,
            })?;
            let content = decode_strings(&bytes).ok_or_else(|| ScanError::Encoding(path.clone()))?;
            let entries = parse_strings(&content);
            debug!(table = %rel.display(), keys = entries.len(), "read strings table");
            keys.extend(
                entries
                    .into_iter()
                    .map(|e| RawResource::string_key(rel.clone(), e.key, e.comment)),
            );
        }
        Ok(keys)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }
}

/// An unreadable root fails the scan, anything below it is skipped
fn readable(entry: walkdir::Result<DirEntry>) -> Result<Option<DirEntry>, ScanError> {
    match entry {
        Ok(entry) => Ok(Some(entry)),
        Err(err) if err.depth() == 0 => Err(err.into()),
        Err(err) => {
            warn!(error = %err, "skipping unreadable entry");
            Ok(None)
        }
    }
}

fn select_language(languages: &BTreeSet<&str>, preferred: Option<&str>) -> Option<String> {
    preferred
        .or_else(|| languages.get("en").copied())
        .or_else(|| languages.iter().next().copied())
        .map(str::to_string)
}

/// Decode a `.strings` table: UTF-16 with BOM, else UTF-8
pub fn decode_strings(bytes: &[u8]) -> Option<String> {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec()).ok(),
        _ => String::from_utf8(bytes.to_vec()).ok(),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| unit([c[0], c[1]])).collect();
    String::from_utf16(&units).ok()
}

/// Keys of a `.strings` table with the comment directly in front of them
pub fn parse_strings(content: &str) -> Vec<StringsEntry> {
    STRINGS_ENTRY_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let key = unescape(caps.name("key")?.as_str());
            let comment = caps
                .name("block")
                .or_else(|| caps.name("line"))
                .map(|m| m.as_str().trim_matches('*').trim().to_string())
                .filter(|c| !c.is_empty());
            Some(StringsEntry { key, comment })
        })
        .collect()
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// `img/a@2x~ipad.png` -> `img/a.png`
fn strip_device_variant(path: &Path) -> PathBuf {
    let name = file_name(path);
    let base = DEVICE_VARIANT_RE.replace(&name, "$base$ext").into_owned();
    path.with_file_name(base)
}

fn lproj_language(rel: &Path) -> Option<String> {
    let parent = rel.parent()?;
    let name = parent.file_name()?.to_str()?;
    name.strip_suffix(".lproj").map(str::to_string)
}

fn is_hidden(rel: &Path) -> bool {
    rel.components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
