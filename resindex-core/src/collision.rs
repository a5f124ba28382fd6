//! Collision Resolver - Unique Identifiers Per Category
//!
//! Suffixes depend only on the sorted original names of one category,
//! never on scan order and never on other categories.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::categories::Category;
use crate::resource::RawResource;
use crate::validation::{CompilePolicy, Violation};

/// First numeric suffix handed out to the second resource of a collision
pub const FIRST_SUFFIX: usize = 2;

#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub resource: &'a RawResource,
    pub fragment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub resource: &'a RawResource,
    pub identifier: String,
}

pub fn resolve<'a>(
    category: &Category,
    mut candidates: Vec<Candidate<'a>>,
    policy: &CompilePolicy,
) -> Result<Vec<Resolved<'a>>, Vec<Violation>> {
    candidates.sort_by(|a, b| {
        a.resource
            .original_name()
            .cmp(b.resource.original_name())
            .then_with(|| a.resource.source().cmp(b.resource.source()))
            .then_with(|| a.resource.documentation().cmp(&b.resource.documentation()))
            .then_with(|| a.resource.reference().cmp(&b.resource.reference()))
            .then_with(|| a.resource.hint.cmp(&b.resource.hint))
    });
    // Only an exact repeat is the same resource
    candidates.dedup_by(|b, a| a.resource == b.resource);

    let mut violations = vec![];
    let mut unique: Vec<Candidate<'a>> = Vec::with_capacity(candidates.len());

    for group in candidates.chunk_by(|a, b| a.resource.original_name() == b.resource.original_name()) {
        if group.len() == 1 || policy.allow_identical_merge {
            if group.len() > 1 {
                debug!(
                    category = %category,
                    name = group[0].resource.original_name(),
                    locations = group.len(),
                    "merging identically named resources"
                );
            }
            unique.push(group[0].clone());
        } else {
            violations.extend(
                group
                    .iter()
                    .map(|c| Violation::duplicate(c.resource, category.name(), group.len() - 1)),
            );
        }
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    let mut by_fragment: BTreeMap<String, Vec<Candidate<'a>>> = BTreeMap::new();
    for candidate in unique {
        by_fragment
            .entry(candidate.fragment.clone())
            .or_default()
            .push(candidate);
    }

    let mut taken: BTreeSet<String> = by_fragment.keys().cloned().collect();
    let mut resolved = vec![];

    for (fragment, group) in by_fragment {
        let mut suffix = FIRST_SUFFIX;
        for (i, candidate) in group.into_iter().enumerate() {
            let identifier = if i == 0 {
                fragment.clone()
            } else {
                let mut next = format!("{}{}", fragment, suffix);
                while taken.contains(&next) {
                    suffix += 1;
                    next = format!("{}{}", fragment, suffix);
                }
                suffix += 1;
                taken.insert(next.clone());
                debug!(
                    category = %category,
                    name = candidate.resource.original_name(),
                    identifier = %next,
                    "disambiguated colliding identifier"
                );
                next
            };
            resolved.push(Resolved {
                resource: candidate.resource,
                identifier,
            });
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ViolationKind;

    fn candidates<'a>(resources: &'a [RawResource], fragments: &[&str]) -> Vec<Candidate<'a>> {
        resources
            .iter()
            .zip(fragments)
            .map(|(resource, f)| Candidate {
                resource,
                fragment: f.to_string(),
            })
            .collect()
    }

    fn identifiers(resolved: &[Resolved<'_>]) -> Vec<(String, String)> {
        resolved
            .iter()
            .map(|r| (r.resource.original_name().to_string(), r.identifier.clone()))
            .collect()
    }

    #[test]
    fn test_collision_suffix_follows_name_order() {
        let resources = [
            RawResource::catalog_entry("A.xcassets", "TabBarList"),
            RawResource::catalog_entry("A.xcassets", "Tab Bar List"),
        ];
        let policy = CompilePolicy::default();

        let forward = resolve(
            &Category::ImageAssets,
            candidates(&resources, &["tabBarList", "tabBarList"]),
            &policy,
        )
        .unwrap();

        let mut reversed = candidates(&resources, &["tabBarList", "tabBarList"]);
        reversed.reverse();
        let backward = resolve(&Category::ImageAssets, reversed, &policy).unwrap();

        let expected = vec![
            ("Tab Bar List".to_string(), "tabBarList".to_string()),
            ("TabBarList".to_string(), "tabBarList2".to_string()),
        ];
        assert_eq!(identifiers(&forward), expected);
        assert_eq!(identifiers(&backward), expected);
    }

    #[test]
    fn test_suffix_skips_taken_identifiers() {
        let resources = [
            RawResource::file("foo.png"),
            RawResource::file("Foo.png"),
            RawResource::file("foo2.png"),
        ];
        let resolved = resolve(
            &Category::Images,
            candidates(&resources, &["foo", "foo", "foo2"]),
            &CompilePolicy::default(),
        )
        .unwrap();

        let mut ids: Vec<_> = resolved.iter().map(|r| r.identifier.as_str()).collect();
        ids.sort();
        assert_eq!(ids, ["foo", "foo2", "foo3"]);
        let upper = resolved
            .iter()
            .find(|r| r.resource.original_name() == "Foo.png")
            .unwrap();
        assert_eq!(upper.identifier, "foo");
    }

    #[test]
    fn test_identical_names_are_duplicates() {
        let resources = [
            RawResource::file("a/doge.png"),
            RawResource::file("b/doge.png"),
            RawResource::file("cat.png"),
        ];
        let err = resolve(
            &Category::Images,
            candidates(&resources, &["doge", "doge", "cat"]),
            &CompilePolicy::default(),
        )
        .unwrap_err();

        assert_eq!(err.len(), 2);
        assert!(err.iter().all(|v| v.kind == ViolationKind::DuplicateResource));
    }

    #[test]
    fn test_identical_names_merge_when_allowed() {
        let resources = [RawResource::file("b/doge.png"), RawResource::file("a/doge.png")];
        let policy = CompilePolicy {
            allow_identical_merge: true,
            ..Default::default()
        };
        let resolved = resolve(
            &Category::Images,
            candidates(&resources, &["doge", "doge"]),
            &policy,
        )
        .unwrap();

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].resource.reference(), "a/doge.png");
        assert_eq!(resolved[0].identifier, "doge");
    }

    #[test]
    fn test_differing_references_never_depend_on_order() {
        let resources = [
            RawResource::file_with_reference("doge.jpeg", "two.jpeg"),
            RawResource::file_with_reference("doge.jpeg", "one.jpeg"),
        ];
        let mut reversed = candidates(&resources, &["doge", "doge"]);
        reversed.reverse();

        let err = resolve(
            &Category::Images,
            candidates(&resources, &["doge", "doge"]),
            &CompilePolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(err.iter().all(|v| v.kind == ViolationKind::DuplicateResource));

        let policy = CompilePolicy {
            allow_identical_merge: true,
            ..Default::default()
        };
        let forward = resolve(
            &Category::Images,
            candidates(&resources, &["doge", "doge"]),
            &policy,
        )
        .unwrap();
        let backward = resolve(&Category::Images, reversed, &policy).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward[0].resource.reference(), "one.jpeg");
    }

    #[test]
    fn test_same_resource_twice_is_not_a_duplicate() {
        let resources = [RawResource::file("doge.png"), RawResource::file("doge.png")];
        let resolved = resolve(
            &Category::Images,
            candidates(&resources, &["doge", "doge"]),
            &CompilePolicy::default(),
        )
        .unwrap();
        assert_eq!(resolved.len(), 1);
    }
}
