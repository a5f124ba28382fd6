//! Build Configuration - `resindex.json`
//!
//! Everything optional; a missing file means built-in defaults.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::categories::{is_identifier, CategoryError, CategoryRegistry, CategoryRule};
use crate::naming::NamingRules;
use crate::render::Language;
use crate::validation::CompilePolicy;

pub const CONFIG_FILE_NAME: &str = "resindex.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid constant name '{0}': expected an identifier")]
    InvalidConstantName(String),

    #[error("'{name}' is a reserved word in {language} and cannot name a declaration")]
    ReservedName { name: String, language: Language },

    #[error("Invalid digit prefix '{0}': must start with a letter or underscore")]
    InvalidDigitPrefix(String),

    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    #[error(transparent)]
    Category(#[from] CategoryError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompileConfig {
    #[serde(default)]
    pub engine_min_version: Option<String>,
    #[serde(default = "default_constant_name")]
    pub constant_name: String,
    #[serde(default)]
    pub target: Language,
    #[serde(default)]
    pub policy: CompilePolicy,
    #[serde(default)]
    pub naming: NamingRules,
    /// Custom categories, evaluated before the built-in rules
    #[serde(default)]
    pub categories: Vec<CategoryRule>,
    /// Glob patterns of paths the scanner skips
    #[serde(default)]
    pub exclude: Vec<String>,
    /// `.lproj` language whose `.strings` tables provide the keys
    #[serde(default)]
    pub default_language: Option<String>,
    /// Hand files of unknown kinds to the classifier instead of skipping them
    #[serde(default)]
    pub include_unknown: bool,
}

fn default_constant_name() -> String { "R".to_string() }

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            engine_min_version: None,
            constant_name: default_constant_name(),
            target: Language::default(),
            policy: CompilePolicy::default(),
            naming: NamingRules::default(),
            categories: vec![],
            exclude: vec![],
            default_language: None,
            include_unknown: false,
        }
    }
}

impl CompileConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else `resindex.json` in `dir` if it exists,
    /// else defaults.
    pub fn discover(path: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let candidate = dir.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::load_from_path(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.constant_name) {
            return Err(ConfigError::InvalidConstantName(self.constant_name.clone()));
        }
        let prefix_ok = self
            .naming
            .digit_prefix
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
            && self.naming.digit_prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !prefix_ok {
            return Err(ConfigError::InvalidDigitPrefix(self.naming.digit_prefix.clone()));
        }
        let reserved = self.target.reserved_words();
        let declared = std::iter::once(self.constant_name.as_str())
            .chain(self.categories.iter().map(|rule| rule.category.name()));
        for name in declared {
            if reserved.contains(&name) {
                return Err(ConfigError::ReservedName {
                    name: name.to_string(),
                    language: self.target,
                });
            }
        }
        self.registry()?;
        self.exclude_set()?;
        Ok(())
    }

    pub fn registry(&self) -> Result<CategoryRegistry, ConfigError> {
        Ok(CategoryRegistry::with_custom(self.categories.clone())?)
    }

    /// Extensions named by custom category rules, lower-cased
    pub fn custom_extensions(&self) -> BTreeSet<String> {
        self.categories
            .iter()
            .flat_map(|rule| &rule.extensions)
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }

    /// Each pattern matches both at the root and at any depth
    pub fn exclude_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            builder.add(Glob::new(pattern)?);
            if !pattern.starts_with("**/") {
                builder.add(Glob::new(&format!("**/{}", pattern))?);
            }
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::Category;
    use crate::naming::ReservedWordPolicy;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config: CompileConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CompileConfig::default());
        assert_eq!(config.constant_name, "R");
        assert_eq!(config.target, Language::Objc);
        assert!(config.policy.fail_on_unclassified);
        config.validate().unwrap();
    }

    #[test]
    fn test_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "engineMinVersion": "1.0.0",
                "constantName": "Res",
                "target": "swift",
                "policy": {{ "failOnUnclassified": false, "allowIdenticalMerge": true }},
                "naming": {{
                    "splitCaseTransitions": false,
                    "stripWords": ["icon", "image"],
                    "reservedWordPolicy": "reject"
                }},
                "categories": [{{ "category": "Sounds", "extensions": ["caf"] }}],
                "exclude": ["*.psd"],
                "defaultLanguage": "en"
            }}"#
        )
        .unwrap();

        let config = CompileConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.constant_name, "Res");
        assert_eq!(config.target, Language::Swift);
        assert!(config.policy.allow_identical_merge);
        assert!(!config.naming.split_case_transitions);
        assert_eq!(config.naming.reserved_word_policy, ReservedWordPolicy::Reject);
        assert_eq!(config.naming.digit_prefix, "_");
        assert_eq!(config.categories[0].category, Category::Custom("Sounds".into()));

        let excludes = config.exclude_set().unwrap();
        assert!(excludes.is_match("master.psd"));
        assert!(excludes.is_match("art/master.psd"));
        assert!(!excludes.is_match("art/master.png"));
    }

    #[test]
    fn test_invalid_values() {
        let config = CompileConfig {
            constant_name: "1R".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidConstantName(_))));

        let mut config = CompileConfig::default();
        config.naming.digit_prefix = "9".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDigitPrefix(_))));

        let config = CompileConfig {
            exclude: vec!["[".into()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPattern(_))));
    }

    #[test]
    fn test_reserved_declaration_names() {
        let config = CompileConfig {
            constant_name: "struct".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ReservedName { ref name, language: Language::Objc }) if name == "struct"
        ));

        let config = CompileConfig {
            categories: vec![CategoryRule::new(Category::Custom("int".into()), &[], &["caf"])],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ReservedName { .. })));

        // Reserved only where the target language reserves it
        let config = CompileConfig {
            constant_name: "internal".into(),
            ..Default::default()
        };
        config.validate().unwrap();
        let config = CompileConfig {
            target: Language::Swift,
            ..config
        };
        assert!(matches!(config.validate(), Err(ConfigError::ReservedName { .. })));
    }

    #[test]
    fn test_scanner_settings() {
        let config: CompileConfig = serde_json::from_str(
            r#"{
                "categories": [
                    { "category": "Sounds", "extensions": ["CAF", ".mp3"] },
                    { "category": "Splash", "directories": ["splash"] }
                ],
                "includeUnknown": true
            }"#,
        )
        .unwrap();
        assert!(config.include_unknown);
        let extensions: Vec<_> = config.custom_extensions().into_iter().collect();
        assert_eq!(extensions, ["caf", "mp3"]);
        assert!(!CompileConfig::default().include_unknown);
    }

    #[test]
    fn test_discover_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CompileConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config, CompileConfig::default());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{"constantName": "Assets"}"#).unwrap();
        let config = CompileConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.constant_name, "Assets");
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = CompileConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }
}
