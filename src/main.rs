use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use validator::Validate;

use file_insight::{
    config::Config,
    models::{AnalyzeRequest, AnalyzeResponse},
    routes::create_router,
    utils::init_logger,
    AppState,
};

#[derive(Parser)]
#[command(name = "file-insight", version, about = "Describe uploaded attachments for chat assistants")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Analyze a single file URL and print the result as JSON
    Analyze {
        /// Fetchable URL of the file
        url: String,
        /// Declared MIME type, e.g. image/png
        #[arg(long)]
        content_type: String,
        /// Display name used in the description
        #[arg(long)]
        file_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;
    let _log_guard = init_logger(&config.logging);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Analyze {
            url,
            content_type,
            file_name,
        } => analyze_once(config, url, content_type, file_name).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.auth.ensure_usable()?;
    info!("Configuration loaded: {:?}", config.server);
    info!("Auth mode: {:?}", config.auth.mode);

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("HOST '{}' is not an IP address", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    let state = AppState::from_config(config)?;
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn analyze_once(
    config: Config,
    url: String,
    content_type: String,
    file_name: Option<String>,
) -> anyhow::Result<()> {
    let payload = AnalyzeRequest {
        url: Some(url),
        content_type: Some(content_type),
        file_name,
    };
    if let Err(errors) = payload.validate() {
        anyhow::bail!("Invalid request: {}", errors);
    }
    let request = payload.into_extraction();

    let state = AppState::from_config(config)?;
    let result = state.pipeline.analyze(&request).await;

    let mut output = serde_json::to_value(AnalyzeResponse::new(&request, &result))?;
    output["category"] = serde_json::to_value(result.category)?;
    if let Some(diagnostic) = &result.diagnostic {
        output["diagnostic"] = serde_json::Value::String(diagnostic.clone());
    }
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
