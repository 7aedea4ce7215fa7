//! bgproc CLI - Main entry point

mod cli;
mod serve;

use bgproc_foundation::SupervisorConfig;
use bgproc_task::ProcessSupervisor;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// bgproc - background process supervisor
#[derive(Parser, Debug)]
#[command(name = "bgproc")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Load configuration from this file instead of the global/project files
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Default working directory for started processes
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve tool requests as JSON lines on stdin/stdout
    Serve,

    /// Run a single command and stream its output until it exits
    Run {
        /// Command line to run (one quoted shell line, or program and arguments)
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "100")]
        poll_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (stdout은 응답 전용이므로 stderr로)
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => SupervisorConfig::load_from(path)?,
        None => SupervisorConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}", e);
            SupervisorConfig::default()
        }),
    };
    if let Some(cwd) = &args.cwd {
        config = config.default_working_dir(cwd.clone());
    }

    let working_dir = config.working_dir();
    let supervisor = ProcessSupervisor::new(config);

    match args.command {
        Command::Serve => {
            serve::serve(supervisor, working_dir).await?;
        }
        Command::Run { command, poll_ms } => {
            let command_line = cli::command_line(&command)?;
            let result = cli::run_once(
                &supervisor,
                &command_line,
                None,
                Duration::from_millis(poll_ms.max(1)),
            )
            .await;
            // 실패해도 자식 프로세스는 먼저 정리
            supervisor.shutdown().await;
            std::process::exit(result?);
        }
    }

    Ok(())
}
