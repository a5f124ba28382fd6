//! Resindex Core - Resource Index Compiler
//!
//! Turns the resources of an application bundle (images, icons, asset
//! catalog sets, localized string keys, fonts) into a symbol table of
//! compile-time constants, grouped by category.
//!
//! # Guarantees
//! 1. Same resources, same table - input order never matters
//! 2. Categories never influence each other's identifiers
//! 3. Collisions resolve by a fixed rule, never by arrival order
//! 4. Every violation is reported, nothing is emitted on failure

pub mod categories;
pub mod collision;
pub mod config;
pub mod hashing;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod resource;
pub mod scan;
pub mod symbols;
pub mod validation;

pub use categories::{Category, CategoryRegistry, CategoryRule};
pub use config::{CompileConfig, ConfigError};
pub use hashing::{canonical_json, compute_input_hash, compute_table_hash};
pub use naming::{normalize, NamingRules, ReservedWordPolicy};
pub use pipeline::{CompilationPipeline, CompileReport, PipelineError};
pub use render::{Language, RenderedFile, Renderer};
pub use resource::{RawResource, ResourceDescriptor};
pub use scan::{ScanError, Scanner};
pub use symbols::{Symbol, SymbolTable};
pub use validation::{CompilePolicy, Violation, ViolationKind, ViolationSeverity, Violations};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
