#![doc = include_str!("../README.md")]

use std::path::PathBuf;

use clap::{command, Parser, Subcommand};
use polyexit_proof::ExitProofError;
use tracing::{error, info, info_span, subscriber::set_global_default, Instrument};
use tracing_subscriber::filter::EnvFilter;

mod commands;

/// Crates whose events follow `--log-level`; everything else logs warnings only
const LOG_TARGETS: [&str; 4] = [
    "polyexit",
    "polyexit_client",
    "polyexit_proof",
    "polyexit_rpc_client",
];

/// Exit status of a burn that cannot be exited yet but will be later (EX_TEMPFAIL)
const EXIT_RETRY_LATER: i32 = 75;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Logging level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Settings file loaded before `.env`; variables already set take precedence
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Debug)]
enum Commands {
    /// Build the exit payload of one burn log
    Payload(commands::PayloadArgs),
    /// Build one exit payload per matching burn log of a batch withdrawal
    Payloads(commands::PayloadsArgs),
    /// Print the exit hash of a burn log
    ExitHash(commands::ExitHashArgs),
    /// Check whether a burn is checkpointed and whether its exit was processed
    Status(commands::ExitHashArgs),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Payload(_) => "payload",
            Commands::Payloads(_) => "payloads",
            Commands::ExitHash(_) => "exit-hash",
            Commands::Status(_) => "status",
        }
    }
}

/// Filter directives applying `log_level` to our own crates
fn log_directives(log_level: &str) -> String {
    if log_level.eq_ignore_ascii_case("off") {
        return "off".to_string();
    }
    let mut directives = String::from("warn");
    for target in LOG_TARGETS {
        directives.push_str(&format!(",{target}={log_level}"));
    }
    directives
}

fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_directives(log_level)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    set_global_default(subscriber).expect("Failed to set subscriber");
}

/// Value of `--env-file`, looked up before parsing since other arguments read the environment
fn env_file_arg<I: IntoIterator<Item = String>>(args: I) -> Option<PathBuf> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--" {
            break;
        }
        if arg == "--env-file" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--env-file=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ExitProofError>() {
        Some(err) if err.is_retryable() => EXIT_RETRY_LATER,
        _ => 1,
    }
}

#[tokio::main]
async fn main() {
    let env_file = env_file_arg(std::env::args().skip(1));
    let env_file_error = env_file
        .as_ref()
        .and_then(|path| dotenv::from_path(path).err());
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let (Some(path), Some(err)) = (env_file, env_file_error) {
        error!("Cannot load settings from {}: {}", path.display(), err);
        std::process::exit(1);
    }

    let command = cli.command.name();
    let span = info_span!("polyexit", command);
    let res = async {
        match cli.command {
            Commands::Payload(args) => commands::payload(args).await,
            Commands::Payloads(args) => commands::payloads(args).await,
            Commands::ExitHash(args) => commands::exit_hash(args).await,
            Commands::Status(args) => commands::status(args).await,
        }
    }
    .instrument(span)
    .await;

    match res {
        Ok(()) => {
            info!("polyexit {} finished", command);
            std::process::exit(0);
        }
        Err(err) => {
            let code = exit_code(&err);
            if code == EXIT_RETRY_LATER {
                error!("polyexit {} cannot run yet, retry later: {:#}", command, err);
            } else {
                error!("polyexit {} failed: {:#}", command, err);
            }
            std::process::exit(code);
        }
    }
}
