//! Category System - Closed Groupings With Declared Order
//!
//! A registry holds the category rules of one build and the order in which
//! categories appear in the symbol table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Component;
use thiserror::Error;

use crate::resource::{RawResource, ResourceDescriptor};

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];
pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Icons,
    Images,
    ImageAssets,
    Strings,
    Fonts,
    Custom(String),
    /// Catch-all, only used when unclassified resources are tolerated
    Other,
}

impl Category {
    pub const BUILT_IN: [Category; 5] = [
        Category::Icons,
        Category::Images,
        Category::ImageAssets,
        Category::Strings,
        Category::Fonts,
    ];

    pub fn from_name(name: &str) -> Self {
        match name {
            "Icons" => Self::Icons,
            "Images" => Self::Images,
            "ImageAssets" => Self::ImageAssets,
            "Strings" => Self::Strings,
            "Fonts" => Self::Fonts,
            "Other" => Self::Other,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Icons => "Icons",
            Self::Images => "Images",
            Self::ImageAssets => "ImageAssets",
            Self::Strings => "Strings",
            Self::Fonts => "Fonts",
            Self::Custom(name) => name,
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.name().to_string()
    }
}

/// Matches file resources by parent directory and/or extension.
/// An empty list matches anything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRule {
    pub category: Category,
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: Category, directories: &[&str], extensions: &[&str]) -> Self {
        Self {
            category,
            directories: directories.iter().map(|d| d.to_string()).collect(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn matches(&self, resource: &RawResource) -> bool {
        let ResourceDescriptor::File { path, .. } = &resource.descriptor else {
            return false;
        };

        let dir_ok = self.directories.is_empty()
            || path
                .parent()
                .into_iter()
                .flat_map(|p| p.components())
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(name.to_string_lossy()),
                    _ => None,
                })
                .any(|dir| {
                    let dir = dir.strip_suffix(".bundle").unwrap_or(&dir);
                    self.directories.iter().any(|d| d.eq_ignore_ascii_case(dir))
                });

        let ext_ok = self.extensions.is_empty()
            || resource
                .extension()
                .map_or(false, |ext| {
                    self.extensions
                        .iter()
                        .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext))
                });

        dir_ok && ext_ok
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Unclassified {
    #[error("declared category '{0}' is not part of this build")]
    UndeclaredHint(Category),

    #[error("no category rule matches")]
    NoMatchingRule,
}

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Invalid category name '{0}': expected an identifier")]
    InvalidName(String),

    #[error("Category '{0}' cannot be configured, it is reserved")]
    Reserved(String),
}

/// Category registry - rules and declared order for one build
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    rules: Vec<CategoryRule>,
    order: Vec<Category>,
}

impl CategoryRegistry {
    /// Registry with only the built-in categories
    pub fn new() -> Self {
        Self {
            rules: Self::built_in_rules(),
            order: Category::BUILT_IN.to_vec(),
        }
    }

    /// Built-ins plus custom rules. Custom rules are evaluated first, their
    /// categories are ordered after the built-ins in the order given.
    pub fn with_custom(custom: Vec<CategoryRule>) -> Result<Self, CategoryError> {
        let mut registry = Self::new();
        let mut rules = Vec::with_capacity(custom.len() + registry.rules.len());

        for rule in custom {
            if let Category::Custom(name) = &rule.category {
                if !is_identifier(name) {
                    return Err(CategoryError::InvalidName(name.clone()));
                }
            } else if rule.category == Category::Other {
                return Err(CategoryError::Reserved(rule.category.to_string()));
            }
            if !registry.order.contains(&rule.category) {
                registry.order.push(rule.category.clone());
            }
            rules.push(rule);
        }

        rules.append(&mut registry.rules);
        registry.rules = rules;
        Ok(registry)
    }

    fn built_in_rules() -> Vec<CategoryRule> {
        vec![
            CategoryRule::new(Category::Icons, &["icons"], IMAGE_EXTENSIONS),
            CategoryRule::new(Category::Fonts, &[], FONT_EXTENSIONS),
            CategoryRule::new(Category::Images, &[], IMAGE_EXTENSIONS),
        ]
    }

    pub fn is_declared(&self, category: &Category) -> bool {
        self.order.contains(category)
    }

    /// Declared order, catch-all last
    pub fn order(&self) -> impl Iterator<Item = &Category> {
        self.order.iter().chain(std::iter::once(&Category::Other))
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Position of a category in the declared order
    pub fn rank(&self, category: &Category) -> usize {
        self.order().position(|c| c == category).unwrap_or(usize::MAX)
    }

    pub fn classify(&self, resource: &RawResource) -> Result<Category, Unclassified> {
        if let Some(hint) = &resource.hint {
            return if self.is_declared(hint) {
                Ok(hint.clone())
            } else {
                Err(Unclassified::UndeclaredHint(hint.clone()))
            };
        }

        match &resource.descriptor {
            ResourceDescriptor::CatalogEntry { .. } => Ok(Category::ImageAssets),
            ResourceDescriptor::StringKey { .. } => Ok(Category::Strings),
            ResourceDescriptor::File { .. } => self
                .rules
                .iter()
                .find(|rule| rule.matches(resource))
                .map(|rule| rule.category.clone())
                .ok_or(Unclassified::NoMatchingRule),
        }
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_wins() {
        let registry = CategoryRegistry::new();
        let res = RawResource::file("tab_bar/tabbar_list.png").with_hint(Category::Icons);
        assert_eq!(registry.classify(&res), Ok(Category::Icons));
    }

    #[test]
    fn test_undeclared_hint_is_unclassified() {
        let registry = CategoryRegistry::new();
        let res = RawResource::file("a.caf").with_hint(Category::Custom("Sounds".into()));
        assert!(matches!(
            registry.classify(&res),
            Err(Unclassified::UndeclaredHint(_))
        ));
    }

    #[test]
    fn test_rules_by_directory_and_extension() {
        let registry = CategoryRegistry::new();
        let classify = |p: &str| registry.classify(&RawResource::file(p));

        assert_eq!(classify("Icons.bundle/tab_bar/list.png"), Ok(Category::Icons));
        assert_eq!(classify("icons/map.PNG"), Ok(Category::Icons));
        assert_eq!(classify("photos/doge.jpeg"), Ok(Category::Images));
        assert_eq!(classify("Fonts/Inter.ttf"), Ok(Category::Fonts));
        assert_eq!(classify("readme.txt"), Err(Unclassified::NoMatchingRule));
    }

    #[test]
    fn test_descriptor_kinds() {
        let registry = CategoryRegistry::new();
        let asset = RawResource::catalog_entry("Images.xcassets", "AppIcon");
        let key = RawResource::string_key("en.lproj/Localizable.strings", "foo", None);
        assert_eq!(registry.classify(&asset), Ok(Category::ImageAssets));
        assert_eq!(registry.classify(&key), Ok(Category::Strings));
    }

    #[test]
    fn test_custom_rules_first_and_ordered_last() {
        let sounds = Category::Custom("Sounds".into());
        let registry = CategoryRegistry::with_custom(vec![
            CategoryRule::new(sounds.clone(), &[], &["caf", "mp3"]),
            CategoryRule::new(Category::Custom("Splash".into()), &["splash"], &[]),
        ])
        .unwrap();

        assert_eq!(registry.classify(&RawResource::file("beep.caf")), Ok(sounds.clone()));
        assert_eq!(
            registry.classify(&RawResource::file("splash/doge.png")),
            Ok(Category::Custom("Splash".into()))
        );

        let order: Vec<_> = registry.order().map(|c| c.name().to_string()).collect();
        assert_eq!(
            order,
            ["Icons", "Images", "ImageAssets", "Strings", "Fonts", "Sounds", "Splash", "Other"]
        );
        assert!(registry.rank(&Category::Icons) < registry.rank(&sounds));
    }

    #[test]
    fn test_custom_name_must_be_identifier() {
        let result = CategoryRegistry::with_custom(vec![CategoryRule::new(
            Category::Custom("2 Sounds".into()),
            &[],
            &["caf"],
        )]);
        assert!(matches!(result, Err(CategoryError::InvalidName(_))));

        let result =
            CategoryRegistry::with_custom(vec![CategoryRule::new(Category::Other, &[], &["x"])]);
        assert!(matches!(result, Err(CategoryError::Reserved(_))));
    }

    #[test]
    fn test_category_serializes_as_name() {
        let json = serde_json::to_string(&Category::Custom("Sounds".into())).unwrap();
        assert_eq!(json, r#""Sounds""#);
        let back: Category = serde_json::from_str(r#""ImageAssets""#).unwrap();
        assert_eq!(back, Category::ImageAssets);
    }
}
