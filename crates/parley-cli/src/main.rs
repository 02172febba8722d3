mod config;

use clap::{Parser, Subcommand, ValueEnum};
use config::ParleyConfig;
use parley_agent::{AgentClient, AgentProvider, CredentialSource};
use parley_core::SessionId;
use parley_gateway::GatewayServer;
use parley_session::{FileTranscriptStore, TranscriptStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley", about = "Parley: local web chat for a hosted conversational agent")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "parley.toml")]
    config: PathBuf,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the chat server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Validate the configuration and print it without secrets
    Check,
    /// Print the transcript of one session
    Transcript {
        /// Session identifier
        session_id: String,
    },
}

/// Reads the `.env` file (the one in the working directory when `env_file`
/// is `None`), then builds the log filter from `filter_var`, so a filter set
/// in `.env` takes effect. Existing environment variables win over `.env`.
fn load_env(
    env_file: Option<&Path>,
    filter_var: &str,
) -> (EnvFilter, Result<PathBuf, dotenvy::Error>) {
    let dotenv = match env_file {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    let filter = EnvFilter::try_from_env(filter_var).unwrap_or_else(|_| EnvFilter::new("info"));
    (filter, dotenv)
}

fn init_logging(format: LogFormat, filter: EnvFilter) {
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (filter, dotenv) = load_env(None, EnvFilter::DEFAULT_ENV);
    init_logging(cli.log_format, filter);
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Failed to read .env file"),
    }

    let mut config = ParleyConfig::load(&cli.config).await?;
    config.apply_env(|key| std::env::var(key).ok());

    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await?,
        Commands::Check => check(&config)?,
        Commands::Transcript { session_id } => transcript(&config, &session_id).await?,
    }

    Ok(())
}

async fn serve(config: ParleyConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);

    info!("Starting Parley on {host}:{port}");

    // Refuse to start without a usable agent configuration
    let agent = Arc::new(AgentClient::new(&config.agent).await?);
    info!(
        backend = agent.backend_name(),
        region = %config.agent.region,
        trace = config.agent.enable_trace,
        "Agent client ready"
    );

    let transcripts = Arc::new(FileTranscriptStore::new(config.data_dir.clone()).await?);
    info!(data_dir = %config.data_dir.display(), "Transcript store ready");

    let app = GatewayServer::build(agent, transcripts);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Parley listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Parley stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn check(config: &ParleyConfig) -> anyhow::Result<()> {
    config.agent.validate()?;

    println!("Configuration OK");
    match config.agent.provider {
        AgentProvider::Bedrock => {
            println!("  provider:    bedrock");
            println!("  region:      {}", config.agent.region);
            println!("  agent:       {}", config.agent.agent_id().unwrap_or_default());
            println!("  alias:       {}", config.agent.agent_alias_id().unwrap_or_default());
            let credentials = match config.agent.credential_source() {
                CredentialSource::Explicit { access_key_id, .. } => {
                    format!("explicit key pair ({access_key_id})")
                }
                CredentialSource::Profile(name) => format!("profile '{name}'"),
                CredentialSource::Default => "default provider chain".to_string(),
            };
            println!("  credentials: {credentials}");
        }
        AgentProvider::Http => {
            println!("  provider:    http");
            println!("  url:         {}", config.agent.url().unwrap_or_default());
            println!("  backoff:     {} ms", config.agent.retry_backoff_ms);
        }
    }
    println!("  trace:       {}", config.agent.enable_trace);
    println!("  attempts:    {}", config.agent.max_attempts);
    println!("  data_dir:    {}", config.data_dir.display());
    println!("  listen:      {}:{}", config.server.host, config.server.port);
    Ok(())
}

async fn transcript(config: &ParleyConfig, raw_id: &str) -> anyhow::Result<()> {
    let session_id = SessionId::parse(raw_id)?;
    let store = FileTranscriptStore::new(config.data_dir.clone()).await?;
    let records = store.read(&session_id).await?;

    if records.is_empty() {
        println!("No transcript for session {session_id}.");
        return Ok(());
    }

    for record in &records {
        println!("[{}] {}", record.role, record.text);
    }
    println!("\nTotal: {} record(s)", records.len());
    Ok(())
}
