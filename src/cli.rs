use crate::config::presets::standard_policy;
use crate::config::types::ReviewConfig;
use crate::config::validator::{check_system_capabilities, validate_config};
use crate::exec::types::Inputs;
use crate::oracle;
use crate::review::{ReviewRequest, Reviewer};
use crate::sandbox::Sandbox;
use crate::sanitizer::sanitize;
use crate::value::Value;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Review candidate code and print the report as JSON
    Review {
        /// Review request JSON file, or '-' for stdin
        #[arg(long)]
        request: String,
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Maximum number of tests executed concurrently
        #[arg(long)]
        parallel: Option<usize>,
        /// Wall clock limit per test call in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },
    /// Print the sanitized form of a source file
    Sanitize {
        /// Python source file, or '-' for stdin
        #[arg(long)]
        file: String,
        /// Configuration file (JSON); selects the parsing interpreter
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print an oracle's expected output for one input
    Oracle {
        /// Intent label (fibonacci, sum_first_n, find_duplicates, ...)
        #[arg(long)]
        intent: String,
        /// Input as a JSON object, or a bare JSON value for single-argument intents
        #[arg(long)]
        input: String,
    },
    /// Check that the configured interpreter is usable
    CheckDeps {
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Show limit and capability details
        #[arg(long)]
        verbose: bool,
    },
}

extern "C" fn signal_handler(sig: i32) {
    // Async-signal-safe only: raw write and _exit. Workers carry
    // PDEATHSIG and die with us.
    let msg = b"reviewbox: signal received, exiting\n";
    unsafe {
        libc::write(2, msg.as_ptr() as *const libc::c_void, msg.len());
        libc::_exit(128 + sig);
    }
}

fn setup_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as usize);
        libc::signal(libc::SIGINT, signal_handler as usize);
    }
}

pub fn run() -> Result<()> {
    setup_signal_handlers();
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Review {
            request,
            config,
            parallel,
            timeout_ms,
            pretty,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(parallel) = parallel {
                config.max_parallel = parallel;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.call_wall_time_limit_ms = timeout_ms;
            }
            validate_config(&config)?;

            let request: ReviewRequest = serde_json::from_str(&read_input(&request)?)
                .context("invalid review request")?;
            let reviewer = Reviewer::new(config, standard_policy())?;
            let report = reviewer.review(&request);

            let json = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{}", json);

            if report.verdict.status.is_failure() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Sanitize { file, config } => {
            let config = load_config(config.as_deref())?;
            validate_config(&config)?;
            let sandbox = Sandbox::new(config, standard_policy())?;
            let code = read_input(&file)?;
            match sanitize(&sandbox, &code) {
                Ok(artifact) => {
                    log::info!(
                        "kept {} definitions, {} imports (sha256 {})",
                        artifact.definitions.len(),
                        artifact.imports,
                        artifact.digest
                    );
                    println!("{}", artifact.sanitized);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Oracle { intent, input } => {
            let oracle = oracle::lookup(&intent).ok_or_else(|| {
                anyhow::anyhow!(
                    "no oracle for intent '{}' (known: {})",
                    intent,
                    oracle::intents().join(", ")
                )
            })?;
            let inputs = parse_oracle_input(&input)?;
            match oracle.expected(&inputs) {
                Some(expected) => {
                    println!("{}", expected.to_json_string());
                    Ok(())
                }
                None => {
                    eprintln!("Error: input cannot be interpreted by the '{}' oracle", intent);
                    std::process::exit(1);
                }
            }
        }
        Commands::CheckDeps { config, verbose } => check_dependencies(config.as_deref(), verbose),
    }
}

fn load_config(path: Option<&Path>) -> Result<ReviewConfig> {
    match path {
        Some(path) => ReviewConfig::from_file(path)
            .with_context(|| format!("cannot load config {}", path.display())),
        None => Ok(ReviewConfig::default()),
    }
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("cannot read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("cannot read {}", source))
    }
}

fn parse_oracle_input(raw: &str) -> Result<Inputs> {
    let value: Value = serde_json::from_str(raw).context("input is not valid JSON")?;
    Ok(match value {
        Value::Map(entries) => entries.into_iter().collect(),
        other => Inputs::new().with("input", other),
    })
}

fn check_dependencies(config: Option<&Path>, verbose: bool) -> Result<()> {
    let config = load_config(config)?;
    let validation = validate_config(&config)?;
    let sandbox = Sandbox::new(config, standard_policy())?;

    println!("Checking review dependencies...");
    let interpreter = sandbox.config().interpreter.display().to_string();
    let version = sandbox.interpreter_version();
    let ok = match &version {
        Ok(version) if version.starts_with("Python 3") => {
            println!("OK   {} -> {}", interpreter, version);
            true
        }
        Ok(version) => {
            println!("FAIL {} -> unexpected version output: {}", interpreter, version);
            false
        }
        Err(e) => {
            println!("FAIL {} -> {}", interpreter, e);
            false
        }
    };

    let policy = sandbox.policy();
    println!(
        "     policy {} v{} exposes {} builtins",
        policy.id,
        policy.version,
        policy.exposed_names().len()
    );

    for warning in validation
        .warnings
        .iter()
        .chain(check_system_capabilities(sandbox.config()).iter())
    {
        println!("WARN {}", warning);
    }

    if verbose {
        let config = sandbox.config();
        println!();
        println!("  call wall limit   {}ms", config.call_wall_time_limit_ms);
        println!("  load wall limit   {}ms", config.load_wall_time_limit_ms);
        println!("  memory limit      {:?}", config.memory_limit);
        println!("  max parallel      {}", config.max_parallel);
    }

    if !ok {
        eprintln!("Install Python 3 or point 'interpreter' in the config at one.");
        std::process::exit(1);
    }
    Ok(())
}
