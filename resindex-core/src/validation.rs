//! Violation System - Findings And Policy
//!
//! Every phase of a compile produces structured violations.
//! Policy decides which findings are fatal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::categories::Unclassified;
use crate::naming::NamingError;
use crate::resource::RawResource;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    InvalidResourceName,
    UnclassifiedResource,
    DuplicateResource,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidResourceName => "invalid_resource_name",
            Self::UnclassifiedResource => "unclassified_resource",
            Self::DuplicateResource => "duplicate_resource",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: ViolationSeverity,
    pub source: PathBuf,
    pub original_name: String,
    pub message: String,
    pub remediation: Vec<String>,
}

impl Violation {
    pub fn invalid_name(resource: &RawResource, err: &NamingError) -> Self {
        let remediation = match err {
            NamingError::Empty(_) => "Rename the resource to contain at least one letter or digit",
            NamingError::Reserved { .. } => {
                "Rename the resource or allow escaping of reserved words"
            }
        };
        Self::error(ViolationKind::InvalidResourceName, resource, err.to_string(), remediation)
    }

    pub fn unclassified(resource: &RawResource, reason: &Unclassified) -> Self {
        Self::error(
            ViolationKind::UnclassifiedResource,
            resource,
            format!("Resource has no category: {}", reason),
            "Declare a category rule for it or disable failOnUnclassified",
        )
    }

    pub fn duplicate(resource: &RawResource, category: &str, others: usize) -> Self {
        Self::error(
            ViolationKind::DuplicateResource,
            resource,
            format!(
                "'{}' exists in {} other location(s) of category {}",
                resource.original_name(),
                others,
                category
            ),
            "Rename one of the resources or enable allowIdenticalMerge",
        )
    }

    fn error(
        kind: ViolationKind,
        resource: &RawResource,
        message: String,
        remediation: &str,
    ) -> Self {
        Self {
            kind,
            severity: ViolationSeverity::Error,
            source: resource.source().to_path_buf(),
            original_name: resource.original_name().to_string(),
            message,
            remediation: vec![remediation.to_string()],
        }
    }

    /// Total order so reports list violations identically on every run
    fn sort_key(&self) -> (ViolationKind, &PathBuf, &str, &str) {
        (self.kind, &self.source, &self.original_name, &self.message)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.kind, self.source.display(), self.message)
    }
}

/// All violations of one compile
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn extend(&mut self, violations: impl IntoIterator<Item = Violation>) {
        self.0.extend(violations);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.0.iter().filter(move |v| v.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sorted(mut self) -> Self {
        self.0.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.0.dedup();
        self
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<_> = self.0.iter().map(|v| v.to_string()).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Strictness of a compile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompilePolicy {
    /// Unmatched resources fail the build instead of landing in `Other`
    #[serde(default = "default_true")]
    pub fail_on_unclassified: bool,
    /// Identically named resources from different locations become one symbol
    #[serde(default)]
    pub allow_identical_merge: bool,
}

fn default_true() -> bool { true }

impl Default for CompilePolicy {
    fn default() -> Self {
        Self {
            fail_on_unclassified: true,
            allow_identical_merge: false,
        }
    }
}
