//! Name Normalizer - Raw Names To Identifier Fragments
//!
//! A fragment depends on one raw name and the naming rules, never on
//! sibling names.

use heck::ToLowerCamelCase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NamingRules {
    /// Split `tabBar` into `tab` + `bar`. When off, only non-alphanumeric
    /// characters separate words.
    #[serde(default = "default_true")]
    pub split_case_transitions: bool,
    /// Words dropped from identifiers, e.g. `icon` turns `AppIcon` into `app`.
    /// Defaults to `icon` and `image`; set `[]` to keep every word.
    #[serde(default = "default_strip_words")]
    pub strip_words: Vec<String>,
    #[serde(default = "default_digit_prefix")]
    pub digit_prefix: String,
    #[serde(default)]
    pub reserved_word_policy: ReservedWordPolicy,
}

fn default_true() -> bool { true }
fn default_digit_prefix() -> String { "_".to_string() }
fn default_strip_words() -> Vec<String> { vec!["icon".to_string(), "image".to_string()] }

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            split_case_transitions: true,
            strip_words: default_strip_words(),
            digit_prefix: default_digit_prefix(),
            reserved_word_policy: ReservedWordPolicy::default(),
        }
    }
}

/// What happens to a fragment that is a keyword of the target language
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ReservedWordPolicy {
    /// `default` -> `default_`
    #[default]
    TrailingUnderscore,
    /// `default` -> `_default`
    LeadingUnderscore,
    /// Report the resource as having an invalid name
    Reject,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("'{0}' contains no letters or digits")]
    Empty(String),

    #[error("'{raw}' normalizes to the reserved word '{word}'")]
    Reserved { raw: String, word: String },
}

/// Normalize a raw name into a lowerCamelCase identifier fragment.
pub fn normalize(raw: &str, rules: &NamingRules, reserved: &[&str]) -> Result<String, NamingError> {
    let words: Vec<String> = split_words(raw, rules.split_case_transitions)
        .into_iter()
        .map(|w| w.to_ascii_lowercase())
        .collect();

    if words.is_empty() {
        return Err(NamingError::Empty(raw.to_string()));
    }

    let kept: Vec<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|w| !rules.strip_words.iter().any(|s| s.eq_ignore_ascii_case(w)))
        .collect();
    let kept = if kept.is_empty() {
        words.iter().map(String::as_str).collect()
    } else {
        kept
    };

    let mut fragment = kept.join("_").to_lower_camel_case();
    if fragment.starts_with(|c: char| c.is_ascii_digit()) {
        fragment.insert_str(0, &rules.digit_prefix);
    }

    if reserved.contains(&fragment.as_str()) {
        fragment = match rules.reserved_word_policy {
            ReservedWordPolicy::TrailingUnderscore => format!("{}_", fragment),
            ReservedWordPolicy::LeadingUnderscore => format!("_{}", fragment),
            ReservedWordPolicy::Reject => {
                return Err(NamingError::Reserved {
                    raw: raw.to_string(),
                    word: fragment,
                })
            }
        };
    }

    Ok(fragment)
}

/// Split on everything that is not an ASCII letter or digit, and optionally
/// on case transitions (`tabBar`, `URLCache`).
fn split_words(raw: &str, split_case: bool) -> Vec<String> {
    let mut words = vec![];
    let mut current = String::new();
    let chars: Vec<char> = raw.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if split_case && !current.is_empty() && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map_or(false, |n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower);
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        normalize(raw, &NamingRules::default(), &[]).unwrap()
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(norm("ab_cd_ef"), "abCdEf");
        assert_eq!(norm("ab/cd/ef"), "abCdEf");
        assert_eq!(norm("Ab_1cdEf"), "ab1cdEf");
        assert_eq!(norm("tabbar_list"), "tabbarList");
        assert_eq!(norm("tab bar-list"), "tabBarList");
        assert_eq!(norm("Tab Bar List"), "tabBarList");
        assert_eq!(norm("TabBarList"), "tabBarList");
        assert_eq!(norm("doge"), "doge");
    }

    #[test]
    fn test_acronyms() {
        assert_eq!(norm("URLCache"), "urlCache");
        assert_eq!(norm("loadHTML"), "loadHtml");
    }

    #[test]
    fn test_case_split_can_be_disabled() {
        let rules = NamingRules {
            split_case_transitions: false,
            ..Default::default()
        };
        assert_eq!(normalize("tabBar_list", &rules, &[]).unwrap(), "tabbarList");
        assert_eq!(
            normalize("tabBar_list", &NamingRules::default(), &[]).unwrap(),
            "tabBarList"
        );
    }

    #[test]
    fn test_illegal_characters_are_stripped() {
        assert_eq!(norm("caf\u{e9}.menu@2x"), "cafMenu2x");
        assert_eq!(norm("__a___b__c___"), "aBC");
    }

    #[test]
    fn test_leading_digit_gets_prefix() {
        assert_eq!(norm("2x_cat"), "_2xCat");
        let rules = NamingRules {
            digit_prefix: "r".to_string(),
            ..Default::default()
        };
        assert_eq!(normalize("404", &rules, &[]).unwrap(), "r404");
    }

    #[test]
    fn test_empty_name_is_an_error() {
        let rules = NamingRules::default();
        assert_eq!(normalize("", &rules, &[]), Err(NamingError::Empty(String::new())));
        assert!(matches!(normalize(" -_. ", &rules, &[]), Err(NamingError::Empty(_))));
        assert!(matches!(normalize("\u{1F436}", &rules, &[]), Err(NamingError::Empty(_))));
    }

    #[test]
    fn test_strip_words() {
        let rules = NamingRules::default();
        assert_eq!(normalize("AppIcon", &rules, &[]).unwrap(), "app");
        assert_eq!(normalize("LaunchImage", &rules, &[]).unwrap(), "launch");
        assert_eq!(normalize("my_icon_catImage", &rules, &[]).unwrap(), "myCat");
        // Stripping everything keeps the name intact
        assert_eq!(normalize("Icon", &rules, &[]).unwrap(), "icon");

        let keep_all = NamingRules {
            strip_words: vec![],
            ..Default::default()
        };
        assert_eq!(normalize("AppIcon", &keep_all, &[]).unwrap(), "appIcon");
        let parsed: NamingRules = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.strip_words, ["icon", "image"]);
    }

    #[test]
    fn test_reserved_word_policies() {
        let reserved = ["default", "auto"];
        let mut rules = NamingRules::default();
        assert_eq!(normalize("Default.png", &rules, &reserved).unwrap(), "defaultPng");
        assert_eq!(normalize("default", &rules, &reserved).unwrap(), "default_");

        rules.reserved_word_policy = ReservedWordPolicy::LeadingUnderscore;
        assert_eq!(normalize("auto", &rules, &reserved).unwrap(), "_auto");

        rules.reserved_word_policy = ReservedWordPolicy::Reject;
        assert_eq!(
            normalize("Auto", &rules, &reserved),
            Err(NamingError::Reserved {
                raw: "Auto".into(),
                word: "auto".into()
            })
        );
        assert_eq!(normalize("cat", &rules, &reserved).unwrap(), "cat");
    }
}
