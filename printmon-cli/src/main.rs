//! printmon — supervisor console for a local print-ticket server.
//!
//! # Usage
//!
//! ```text
//! printmon [console]                 interactive operator console
//! printmon run                       start the server and relay its log until ctrl-c
//! printmon print [--code A123 ...]   one test print
//! printmon qrcode [--qrcode URL ...] one QR-code test print
//! printmon config show [--json]      effective settings
//! ```

mod app;
mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigCommand, print::PrintArgs};
use output::OutputFormat;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "printmon",
    version,
    about = "Launch, watch and test a local print-ticket server",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Settings file (default: ./printmon.yaml, then the user config dir).
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Operator log format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Show only summarized success/failure lines.
    #[arg(long, global = true)]
    pub simple: bool,

    /// Emit debug diagnostics on stderr.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive operator console (default).
    Console,

    /// Start the server and relay its output until ctrl-c.
    Run,

    /// Send one test print to /imprimir.
    Print(PrintArgs),

    /// Send one QR-code test print to /imprimir/qrcode.
    Qrcode(PrintArgs),

    /// Inspect settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Console));
    init_tracing(&cli.global, interactive);

    match cli.command {
        None | Some(Commands::Console) => commands::console::run(&cli.global),
        Some(Commands::Run) => commands::run::run(&cli.global),
        Some(Commands::Print(args)) => args.run(&cli.global, printmon_core::Endpoint::Print),
        Some(Commands::Qrcode(args)) => args.run(&cli.global, printmon_core::Endpoint::QrCode),
        Some(Commands::Config { command }) => commands::config::run(command, &cli.global),
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(global: &GlobalArgs, interactive: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match (global.verbose, interactive) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match global.format {
        OutputFormat::Json => builder.json().try_init(),
        OutputFormat::Text => builder.try_init(),
    };
}
