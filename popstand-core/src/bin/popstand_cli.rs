//! PopStand CLI - Bridge interface for non-Rust callers
//!
//! Commands: profiles, normalize, validate, build, contract, compile
//! Outputs JSON to stdout, logs to stderr (RUST_LOG)
//! Returns 2 on validation failure

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use popstand_core::{
    export::{self, ExportFormat},
    CompileRequest, EngineConfig, PipelineError, ProfileRegistry, RawForm, StandPipeline,
};

#[derive(Parser)]
#[command(name = "popstand-cli")]
#[command(about = "PopStand CLI - Parametric Display-Stand Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to product profiles directory
    #[arg(short = 'd', long, default_value = "profiles")]
    profiles_dir: PathBuf,

    /// Engine config JSON (thresholds, defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available product profiles
    Profiles,

    /// Normalize a raw form into a Spec
    Normalize {
        /// JSON payload (RawForm)
        #[arg(short, long)]
        payload: String,
    },

    /// Run the math gate and print the report
    Validate {
        /// JSON payload (RawForm)
        #[arg(short, long)]
        payload: String,
    },

    /// Build the scene graph
    Build {
        /// JSON payload (RawForm)
        #[arg(short, long)]
        payload: String,

        /// json, obj or stl
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Print the manufacturing contract
    Contract {
        /// JSON payload (RawForm)
        #[arg(short, long)]
        payload: String,
    },

    /// Compile a stand manifest
    Compile {
        /// JSON payload (CompileRequest)
        #[arg(short, long)]
        payload: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl serde::Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&format!("Serialization error: {}", e), ExitCode::FAILURE),
    }
}

fn fail(message: &str, code: ExitCode) -> ExitCode {
    println!("{}", serde_json::json!({ "success": false, "error": message }));
    code
}

fn exit_code_for(error: &PipelineError) -> ExitCode {
    match error {
        PipelineError::Validation(_) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn parse_form(payload: &str) -> Result<RawForm, ExitCode> {
    serde_json::from_str(payload)
        .map_err(|e| fail(&format!("Invalid payload: {}", e), ExitCode::FAILURE))
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let registry = match ProfileRegistry::load_from_dir(&cli.profiles_dir) {
        Ok(r) => r,
        Err(e) => return fail(&format!("Failed to load profiles: {}", e), ExitCode::FAILURE),
    };
    let config = match &cli.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(c) => c,
            Err(e) => return fail(&e.to_string(), ExitCode::FAILURE),
        },
        None => EngineConfig::default(),
    };

    let pipeline = StandPipeline::new(registry, config);

    match cli.command {
        Commands::Profiles => print_json(&pipeline.list_profiles()),

        Commands::Normalize { payload } => {
            let form = match parse_form(&payload) {
                Ok(f) => f,
                Err(code) => return code,
            };
            match pipeline.normalize(&form) {
                Ok(normalized) => print_json(&normalized),
                Err(e) => fail(&e.to_string(), exit_code_for(&e)),
            }
        }

        Commands::Validate { payload } => {
            let form = match parse_form(&payload) {
                Ok(f) => f,
                Err(code) => return code,
            };
            match pipeline.check(&form) {
                Ok(checked) => {
                    let valid = checked.validation.is_valid;
                    let code = print_json(&checked.validation);
                    if valid { code } else { ExitCode::from(2) }
                }
                Err(e) => fail(&e.to_string(), exit_code_for(&e)),
            }
        }

        Commands::Build { payload, format } => {
            let form = match parse_form(&payload) {
                Ok(f) => f,
                Err(code) => return code,
            };
            let export_format = if format.eq_ignore_ascii_case("json") {
                None
            } else {
                match format.parse::<ExportFormat>() {
                    Ok(f) => Some(f),
                    Err(e) => return fail(&e, ExitCode::FAILURE),
                }
            };
            let scene = pipeline
                .normalize(&form)
                .and_then(|n| pipeline.build_scene(&n.spec));
            match (scene, export_format) {
                (Ok(scene), None) => print_json(&scene),
                (Ok(scene), Some(f)) => {
                    print!("{}", export::render(&scene, f, "stand"));
                    ExitCode::SUCCESS
                }
                (Err(e), _) => fail(&e.to_string(), exit_code_for(&e)),
            }
        }

        Commands::Contract { payload } => {
            let form = match parse_form(&payload) {
                Ok(f) => f,
                Err(code) => return code,
            };
            let contract = pipeline.normalize(&form).and_then(|n| {
                pipeline.validate_spec(&n.spec)?;
                Ok(popstand_core::to_contract(&n.spec, &n.brand))
            });
            match contract {
                Ok(c) => print_json(&c),
                Err(e) => fail(&e.to_string(), exit_code_for(&e)),
            }
        }

        Commands::Compile { payload } => {
            let request: CompileRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => return fail(&format!("Invalid payload: {}", e), ExitCode::FAILURE),
            };
            match pipeline.compile(&request) {
                Ok(compiled) => print_json(&serde_json::json!({
                    "success": true,
                    "stand": compiled,
                })),
                Err(e) => fail(&e.to_string(), exit_code_for(&e)),
            }
        }
    }
}
