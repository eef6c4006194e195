use anyhow::{Context, Result};
use chart_mcp::McpServer;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;

use config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "chart-server")]
#[command(about = "Chart generation tools with local rendering and remote fallback", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "CHART_SERVER_CONFIG", default_value = "chart-server.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the image server (local mode) and wait for Ctrl-C
    Serve,
    /// Print the enabled tool schemas as JSON
    Tools,
    /// Invoke one tool and print its result as JSON
    Call {
        /// Tool name, e.g. generate_pie_chart
        #[arg(short, long)]
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        arguments: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chart=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = ServerConfig::load(&args.config)?
        .resolve(|key| std::env::var(key).ok())
        .context("Invalid configuration")?;
    tracing::info!(mode = ?config.render_mode, delivery = ?config.image_delivery, "Configuration loaded");

    let server = McpServer::from_config(config)?;

    match args.command {
        Command::Serve => serve(&server).await?,
        Command::Tools => {
            println!("{}", serde_json::to_string_pretty(&server.list_tools())?);
        }
        Command::Call { tool, arguments } => {
            let arguments: serde_json::Value =
                serde_json::from_str(&arguments).context("Tool arguments must be valid JSON")?;
            let result = server.call_tool(&tool, arguments).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result.is_error() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn serve(server: &McpServer) -> Result<()> {
    let generator = server.generator();
    if !generator.config().is_local() {
        tracing::info!("Remote rendering mode, no image server needed");
        return Ok(());
    }

    generator.init_local_rendering().await?;
    tracing::info!("Serving charts at {}", generator.image_server().url_prefix());

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutting down");
    Ok(())
}
