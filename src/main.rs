//! LeadFlow - CRM lead-entry automation service
//!
//! Main entry point for the LeadFlow CLI and server.

mod cli;
mod cmd_leads;
mod cmd_state;
mod server;

use clap::Parser;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use leadflow_api::ServerConfig;
use leadflow_config::{leadflow_dir, ConfigValidator};

use cli::{Cli, Commands};
use cmd_leads::handle_leads_command;
use cmd_state::{handle_reset_command, handle_state_command};
use server::{load_config, run_server};

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.leadflow/logs/ with daily rotation.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = leadflow_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("leadflow")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes the file writer on exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        None => {
            let server = ServerConfig::new(config.server.host.clone(), config.server.port);
            run_server(config, server).await
        }
        Some(Commands::Serve { host, port }) => {
            let server = ServerConfig::new(
                host.unwrap_or_else(|| config.server.host.clone()),
                port.unwrap_or(config.server.port),
            );
            run_server(config, server).await
        }
        Some(Commands::Check) => {
            let result = ConfigValidator::validate(&config);
            for warning in &result.warnings {
                println!("warning: {}: {}", warning.path, warning.message);
            }
            for err in &result.errors {
                println!("error: {}: {}", err.path, err.message);
            }
            if !result.is_valid() {
                return Err(format!("{} is invalid", cli.config.display()).into());
            }
            info!("Configuration OK");
            println!("{} is valid", cli.config.display());
            Ok(())
        }
        Some(Commands::Leads { action }) => handle_leads_command(action, &config).await,
        Some(Commands::State { tail, format }) => handle_state_command(&config, tail, &format).await,
        Some(Commands::Reset { logs }) => handle_reset_command(&config, logs).await,
    }
}
