use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use http_relay::config::{resolve_config, EnvSource, Overrides};
use http_relay::observability::logging;
use http_relay::{RelayServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "http-relay", version)]
#[command(about = "Forward every HTTP request to one upstream origin", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dotenv file read for BASE_URL, PORT and friends.
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Listen port, overriding every other source.
    #[arg(short, long)]
    port: Option<u16>,

    /// Upstream base URL, overriding every other source.
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let env = EnvSource::collect(&cli.env_file);
    let overrides = Overrides {
        port: cli.port,
        base_url: cli.base_url,
    };

    let config = match resolve_config(cli.config.as_deref(), &env, &overrides) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            tracing::error!(error = %e, "Invalid configuration, refusing to start");
            eprintln!("http-relay: {e}");
            std::process::exit(1);
        }
    };

    logging::init(&config.observability.log_level);
    tracing::info!(
        port = config.listener.port,
        log_traffic = config.observability.log_traffic,
        connect_timeout_secs = ?config.timeouts.connect_secs,
        request_timeout_secs = ?config.timeouts.request_secs,
        "Configuration loaded"
    );

    let server = RelayServer::new(&config)?;

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        "Relay → {} listening on :{}",
        server.upstream(),
        local_addr.port()
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown.trigger_on_signal());

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
