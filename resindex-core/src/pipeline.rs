//! Compilation Pipeline - Single Entry Point
//!
//! classify + normalize (parallel map) -> resolve per category (reduce)
//! -> order -> table. All or nothing: any violation fails the compile.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::categories::{Category, CategoryRegistry, CategoryRule};
use crate::collision::{self, Candidate};
use crate::config::{CompileConfig, ConfigError};
use crate::hashing::{compute_input_hash, compute_table_hash};
use crate::naming::{self, NamingRules};
use crate::render::Language;
use crate::resource::RawResource;
use crate::symbols::{symbol_order, CategorySymbols, Symbol, SymbolTable};
use crate::validation::{CompilePolicy, Violation, Violations};
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Compilation failed with {count} violation(s): {0}", count = .0.len())]
    CompileFailed(Violations),

    #[error("Configuration requires engine >= {0}, current is {1}")]
    EngineVersionMismatch(String, String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::CompileFailed(violations) => Some(violations),
            _ => None,
        }
    }
}

/// Result of a compile plus run metadata. Only `id` and `created_at`
/// differ between runs over the same input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileReport {
    pub id: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub input_hash: String,
    pub table_hash: String,
    pub resource_count: usize,
    pub symbol_count: usize,
    pub table: SymbolTable,
}

/// Settings that influence identifiers, hashed into the input fingerprint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Settings<'a> {
    rules: &'a [CategoryRule],
    naming: &'a NamingRules,
    policy: &'a CompilePolicy,
    target: Language,
}

/// The compilation pipeline - immutable, shareable between threads
pub struct CompilationPipeline {
    registry: CategoryRegistry,
    naming: NamingRules,
    policy: CompilePolicy,
    language: Language,
}

impl CompilationPipeline {
    pub fn new(
        registry: CategoryRegistry,
        naming: NamingRules,
        policy: CompilePolicy,
        language: Language,
    ) -> Self {
        Self {
            registry,
            naming,
            policy,
            language,
        }
    }

    pub fn from_config(config: &CompileConfig) -> Result<Self, PipelineError> {
        if let Some(min) = &config.engine_min_version {
            check_engine_version(min)?;
        }
        config.validate()?;
        Ok(Self::new(
            config.registry()?,
            config.naming.clone(),
            config.policy,
            config.target,
        ))
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &CompilePolicy {
        &self.policy
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Category a resource ends up in under the current policy
    pub fn classify(&self, resource: &RawResource) -> Result<Category, Violation> {
        match self.registry.classify(resource) {
            Ok(category) => Ok(category),
            Err(reason) if !self.policy.fail_on_unclassified => {
                debug!(
                    source = %resource.source().display(),
                    %reason,
                    "resource falls into the catch-all category"
                );
                Ok(Category::Other)
            }
            Err(reason) => Err(Violation::unclassified(resource, &reason)),
        }
    }

    /// Compile resources into a symbol table
    pub fn compile(&self, resources: &[RawResource]) -> Result<SymbolTable, PipelineError> {
        debug!(resources = resources.len(), target = %self.language, "compiling resources");

        let mapped: Vec<Result<(Category, Candidate<'_>), Vec<Violation>>> = resources
            .par_iter()
            .map(|resource| self.map_resource(resource))
            .collect();

        let mut violations = Violations::new();
        let mut groups: BTreeMap<usize, (Category, Vec<Candidate<'_>>)> = BTreeMap::new();
        for outcome in mapped {
            match outcome {
                Ok((category, candidate)) => {
                    groups
                        .entry(self.registry.rank(&category))
                        .or_insert_with(|| (category, vec![]))
                        .1
                        .push(candidate);
                }
                Err(found) => violations.extend(found),
            }
        }

        let resolved: Vec<Result<CategorySymbols, Vec<Violation>>> = groups
            .into_values()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(category, candidates)| self.reduce_category(category, candidates))
            .collect();

        let mut sections = Vec::with_capacity(resolved.len());
        for outcome in resolved {
            match outcome {
                Ok(section) => sections.push(section),
                Err(found) => violations.extend(found),
            }
        }

        if violations.has_errors() {
            let violations = violations.sorted();
            debug!(violations = violations.len(), "compilation failed");
            return Err(PipelineError::CompileFailed(violations));
        }

        let table = SymbolTable::from_sections(sections);
        debug!(
            categories = table.sections().len(),
            symbols = table.len(),
            "compiled symbol table"
        );
        Ok(table)
    }

    /// Compile and attach fingerprints and run metadata
    pub fn compile_with_report(
        &self,
        resources: &[RawResource],
    ) -> Result<CompileReport, PipelineError> {
        let table = self.compile(resources)?;

        let settings = Settings {
            rules: self.registry.rules(),
            naming: &self.naming,
            policy: &self.policy,
            target: self.language,
        };

        Ok(CompileReport {
            id: Uuid::new_v4().to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            input_hash: compute_input_hash(resources, &settings, ENGINE_VERSION)?,
            table_hash: compute_table_hash(&table)?,
            resource_count: resources.len(),
            symbol_count: table.len(),
            table,
        })
    }

    fn map_resource<'a>(
        &self,
        resource: &'a RawResource,
    ) -> Result<(Category, Candidate<'a>), Vec<Violation>> {
        let category = self.classify(resource);
        let fragment = naming::normalize(
            resource.naming_stem(),
            &self.naming,
            self.language.reserved_words(),
        );

        match (category, fragment) {
            (Ok(category), Ok(fragment)) => Ok((category, Candidate { resource, fragment })),
            (category, fragment) => {
                let mut found = vec![];
                if let Err(violation) = category {
                    found.push(violation);
                }
                if let Err(err) = fragment {
                    found.push(Violation::invalid_name(resource, &err));
                }
                Err(found)
            }
        }
    }

    fn reduce_category(
        &self,
        category: Category,
        candidates: Vec<Candidate<'_>>,
    ) -> Result<CategorySymbols, Vec<Violation>> {
        let resolved = collision::resolve(&category, candidates, &self.policy)?;

        let mut symbols: Vec<Symbol> = resolved
            .into_iter()
            .map(|r| Symbol {
                identifier: r.identifier,
                original_name: r.resource.original_name().to_string(),
                documentation: r.resource.documentation().map(str::to_string),
                reference: r.resource.reference(),
                source: r.resource.source().to_path_buf(),
                category: category.clone(),
            })
            .collect();
        symbols.sort_by(symbol_order);

        debug!(category = %category, symbols = symbols.len(), "resolved category");
        Ok(CategorySymbols { category, symbols })
    }
}

fn check_engine_version(min_version: &str) -> Result<(), PipelineError> {
    let engine_ver = semver::Version::parse(ENGINE_VERSION)
        .map_err(|_| PipelineError::InvalidVersion(ENGINE_VERSION.to_string()))?;
    let min_ver = semver::Version::parse(min_version)
        .map_err(|_| PipelineError::InvalidVersion(min_version.to_string()))?;

    if engine_ver < min_ver {
        return Err(PipelineError::EngineVersionMismatch(
            min_version.to_string(),
            ENGINE_VERSION.to_string(),
        ));
    }

    Ok(())
}

impl Default for CompilationPipeline {
    fn default() -> Self {
        Self::new(
            CategoryRegistry::default(),
            NamingRules::default(),
            CompilePolicy::default(),
            Language::default(),
        )
    }
}
