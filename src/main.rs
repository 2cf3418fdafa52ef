use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docserve::config::{ServerConfig, Settings, DEFAULT_PORT};
use docserve::{routes, AppState};

#[derive(Parser, Debug)]
#[command(name = "docserve")]
#[command(about = "Browse and render a directory of documentation over HTTP")]
#[command(version)]
struct Cli {
    /// Directory to serve (defaults to the current directory)
    #[arg(env = "DOCSERVE_ROOT", default_value = ".")]
    directory: PathBuf,

    /// Port to listen on
    #[arg(
        env = "DOCSERVE_PORT",
        default_value_t = DEFAULT_PORT,
        value_parser = clap::value_parser!(u16).range(1..=65535)
    )]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "DOCSERVE_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Settings file path (optional)
    #[arg(short, long, env = "DOCSERVE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, env = "DOCSERVE_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = if cli.verbose {
        "docserve=debug,tower_http=debug"
    } else {
        "docserve=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings from file if provided, otherwise use defaults
    let settings = if let Some(config_path) = &cli.config {
        Settings::from_file(config_path)?
    } else {
        Settings::default()
    };

    let config = ServerConfig::new(&cli.directory, cli.port, cli.bind, settings)?;
    let addr = config.socket_addr()?;

    info!("Serving files from: {}", config.root_dir.display());

    let app = routes::app(AppState::from(&config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
