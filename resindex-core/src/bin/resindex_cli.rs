//! Resindex CLI - Build step interface
//!
//! Commands: build, compile, categories
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on compile failure, 1 on any other error

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use resindex_core::{
    output, CompilationPipeline, CompileConfig, Language, PipelineError, RawResource, Scanner,
};

#[derive(Parser)]
#[command(name = "resindex-cli")]
#[command(about = "Resindex CLI - Resource Index Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to resindex.json (default: looked up in the resource root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    silent: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a resource tree and write the accessor files
    Build {
        /// Resource root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Directory receiving the generated files
        #[arg(short, long)]
        output: PathBuf,

        /// Target language, overrides the configuration
        #[arg(short, long)]
        language: Option<Language>,

        /// Language of the .strings tables to index
        #[arg(long)]
        default_language: Option<String>,

        /// Hand files of unknown kinds to the classifier
        #[arg(long)]
        include_unknown: bool,
    },

    /// Compile a JSON list of resources and print the report
    Compile {
        /// JSON payload (list of resources)
        #[arg(short, long, conflicts_with = "input")]
        payload: Option<String>,

        /// File holding the JSON payload
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// List categories in declared order with their rules
    Categories,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WrittenFile {
    path: PathBuf,
    outcome: output::WriteOutcome,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.silent);

    let config_dir = match &cli.command {
        Commands::Build { root, .. } => root.clone(),
        _ => PathBuf::from("."),
    };
    let config = match CompileConfig::discover(cli.config.as_deref(), &config_dir) {
        Ok(c) => c,
        Err(e) => return fail(&format!("Failed to load configuration: {}", e)),
    };

    match cli.command {
        Commands::Build {
            root,
            output,
            language,
            default_language,
            include_unknown,
        } => {
            let mut config = config;
            if let Some(language) = language {
                config.target = language;
            }
            if default_language.is_some() {
                config.default_language = default_language;
            }
            config.include_unknown |= include_unknown;
            build(&config, &root, &output)
        }

        Commands::Compile { payload, input } => {
            let payload = match (payload, input) {
                (Some(p), _) => p,
                (None, Some(path)) => match std::fs::read_to_string(&path) {
                    Ok(p) => p,
                    Err(e) => return fail(&format!("Failed to read {}: {}", path.display(), e)),
                },
                (None, None) => return fail("Either --payload or --input is required"),
            };
            let resources: Vec<RawResource> = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => return fail(&format!("Invalid payload: {}", e)),
            };

            let pipeline = match CompilationPipeline::from_config(&config) {
                Ok(p) => p,
                Err(e) => return fail(&e.to_string()),
            };
            match pipeline.compile_with_report(&resources) {
                Ok(report) => print_json(&serde_json::json!({
                    "success": true,
                    "report": report,
                })),
                Err(e) => compile_failed(&e),
            }
        }

        Commands::Categories => {
            let registry = match config.registry() {
                Ok(r) => r,
                Err(e) => return fail(&e.to_string()),
            };
            let categories: Vec<_> = registry
                .order()
                .map(|category| {
                    let rules: Vec<_> = registry
                        .rules()
                        .iter()
                        .filter(|rule| &rule.category == category)
                        .collect();
                    serde_json::json!({
                        "name": category.name(),
                        "rules": rules,
                    })
                })
                .collect();
            print_json(&categories)
        }
    }
}

fn build(config: &CompileConfig, root: &Path, output_dir: &Path) -> ExitCode {
    let scanner = match Scanner::from_config(root, config) {
        Ok(s) => s,
        Err(e) => return fail(&e.to_string()),
    };
    let resources = match scanner.scan() {
        Ok(r) => r,
        Err(e) => return fail(&e.to_string()),
    };
    info!(root = %root.display(), resources = resources.len(), "scanned resources");

    let pipeline = match CompilationPipeline::from_config(config) {
        Ok(p) => p,
        Err(e) => return fail(&e.to_string()),
    };
    let report = match pipeline.compile_with_report(&resources) {
        Ok(r) => r,
        Err(e) => return compile_failed(&e),
    };

    let files = config
        .target
        .renderer()
        .render(&config.constant_name, &report.table);
    let written = match output::write_all(output_dir, &files) {
        Ok(w) => w,
        Err(e) => return fail(&e.to_string()),
    };
    info!(files = written.len(), symbols = report.symbol_count, "wrote accessors");

    let written: Vec<_> = written
        .into_iter()
        .map(|(path, outcome)| WrittenFile { path, outcome })
        .collect();
    print_json(&serde_json::json!({
        "success": true,
        "language": config.target,
        "resourceCount": report.resource_count,
        "symbolCount": report.symbol_count,
        "inputHash": report.input_hash,
        "tableHash": report.table_hash,
        "files": written,
    }))
}

fn init_tracing(verbose: u8, silent: bool) {
    let default = match (silent, verbose) {
        (true, _) => "error",
        (false, 0) => "resindex_core=info,warn",
        (false, 1) => "resindex_core=debug,info",
        (false, _) => "resindex_core=trace,debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&format!("Failed to serialize output: {}", e)),
    }
}

fn compile_failed(error: &PipelineError) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": error.to_string(),
        "violations": error.violations(),
    });
    println!("{}", output);
    if error.violations().is_some() {
        ExitCode::from(2) // Compilation failure (violations)
    } else {
        ExitCode::FAILURE
    }
}

fn fail(message: &str) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": message,
    });
    println!("{}", output);
    ExitCode::FAILURE
}
