use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Book catalog replicas and the gateway in front of them
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one catalog replica
    Serve {
        /// Listen on this port instead of `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the gateway that dispatches requests to replica pools by method
    Route {
        /// Listen on this port instead of `gateway.port`
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the collection and insert the starter books, then exit
    Bootstrap,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load SHELF settings")?;
    shelf_telemetry::init(&settings.telemetry)?;
    tracing::info!(env = ?settings.environment, command = ?cli.command, "shelf starting");

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            shelf_app::run(settings).await
        }
        Command::Route { port } => {
            if let Some(port) = port {
                settings.gateway.port = port;
            }
            shelf_gateway::start_gateway(&settings.gateway).await
        }
        Command::Bootstrap => {
            let report = shelf_app::bootstrap(&settings).await?;
            println!(
                "inserted {} starter books, {} already present",
                report.inserted, report.existing
            );
            Ok(())
        }
    }
}
