//! Resource Descriptors - What The Scanner Hands Over
//!
//! One variant per kind of resource. Nothing here reads resource content.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::categories::Category;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResourceDescriptor {
    /// A file in the resource tree (image, icon, font, ...). `path` is where
    /// it was found; `reference` overrides the runtime lookup value.
    File {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },

    /// A set inside an asset catalog
    #[serde(rename_all = "camelCase")]
    CatalogEntry { catalog: PathBuf, name: String },

    /// A key of a `.strings` table
    #[serde(rename_all = "camelCase")]
    StringKey {
        table: PathBuf,
        key: String,
        #[serde(default)]
        comment: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawResource {
    #[serde(flatten)]
    pub descriptor: ResourceDescriptor,
    /// Declared category, if the scanner already knows it
    #[serde(default)]
    pub hint: Option<Category>,
}

impl RawResource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            descriptor: ResourceDescriptor::File {
                path: path.into(),
                reference: None,
            },
            hint: None,
        }
    }

    /// File looked up at runtime by `reference` instead of its path
    pub fn file_with_reference(path: impl Into<PathBuf>, reference: impl Into<String>) -> Self {
        Self {
            descriptor: ResourceDescriptor::File {
                path: path.into(),
                reference: Some(reference.into()),
            },
            hint: None,
        }
    }

    pub fn catalog_entry(catalog: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            descriptor: ResourceDescriptor::CatalogEntry {
                catalog: catalog.into(),
                name: name.into(),
            },
            hint: None,
        }
    }

    pub fn string_key(
        table: impl Into<PathBuf>,
        key: impl Into<String>,
        comment: Option<String>,
    ) -> Self {
        Self {
            descriptor: ResourceDescriptor::StringKey {
                table: table.into(),
                key: key.into(),
                comment,
            },
            hint: None,
        }
    }

    pub fn with_hint(mut self, category: Category) -> Self {
        self.hint = Some(category);
        self
    }

    /// The name as the resource author wrote it. Emitted verbatim as the
    /// symbol's comment.
    pub fn original_name(&self) -> &str {
        match &self.descriptor {
            ResourceDescriptor::File { path, .. } => file_name(path),
            ResourceDescriptor::CatalogEntry { name, .. } => name,
            ResourceDescriptor::StringKey { key, .. } => key,
        }
    }

    /// The part of the original name that identifiers are derived from.
    pub fn naming_stem(&self) -> &str {
        match &self.descriptor {
            ResourceDescriptor::File { path, .. } => {
                let name = file_name(path);
                match name.rfind('.') {
                    Some(dot) if dot > 0 => &name[..dot],
                    _ => name,
                }
            }
            _ => self.original_name(),
        }
    }

    /// Where the resource was found. Two resources with the same original
    /// name but different sources are distinct resources.
    pub fn source(&self) -> &Path {
        match &self.descriptor {
            ResourceDescriptor::File { path, .. } => path,
            ResourceDescriptor::CatalogEntry { catalog, .. } => catalog,
            ResourceDescriptor::StringKey { table, .. } => table,
        }
    }

    /// The value calling code uses to look the resource up at runtime.
    pub fn reference(&self) -> String {
        match &self.descriptor {
            ResourceDescriptor::File {
                reference: Some(reference),
                ..
            } => reference.clone(),
            ResourceDescriptor::File { path, .. } => path
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            ResourceDescriptor::CatalogEntry { name, .. } => name.clone(),
            ResourceDescriptor::StringKey { key, .. } => key.clone(),
        }
    }

    pub fn documentation(&self) -> Option<&str> {
        match &self.descriptor {
            ResourceDescriptor::StringKey { comment, .. } => comment.as_deref(),
            _ => None,
        }
    }

    /// Lower-cased extension of a file resource
    pub fn extension(&self) -> Option<String> {
        match &self.descriptor {
            ResourceDescriptor::File { path, .. } => path
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase()),
            _ => None,
        }
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}
