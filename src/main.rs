use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pdfqa::cli::commands::{handle_ask, handle_config, handle_serve, handle_status, handle_upload};
use pdfqa::cli::{Cli, Commands};
use pdfqa::models::OutputFormat;
use pdfqa::server::shutdown_signal;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "pdfqa=debug,tower_http=debug"
    } else {
        "pdfqa=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = cli.format.unwrap_or_default();
    let verbose = cli.verbose;

    // The server drains on its own signal handler.
    if let Commands::Serve(args) = cli.command {
        return handle_serve(args).await;
    }

    tokio::select! {
        result = run_command(cli.command, format, verbose) => result,
        _ = shutdown_signal() => {
            eprintln!("\nInterrupted");
            std::process::exit(130);
        }
    }
}

async fn run_command(command: Commands, format: OutputFormat, verbose: bool) -> Result<()> {
    match command {
        Commands::Serve(args) => handle_serve(args).await,
        Commands::Upload(args) => handle_upload(args, format, verbose).await,
        Commands::Ask(args) => handle_ask(args, format, verbose).await,
        Commands::Status => handle_status(format, verbose).await,
        Commands::Config(cmd) => handle_config(cmd, format, verbose).await,
    }
}
