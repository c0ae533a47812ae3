use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tuplespace::client;
use tuplespace::config::{Config, LogConfig};
use tuplespace::server::Server;
use tuplespace::stats;
use tuplespace::DEFAULT_ADDR;

#[derive(Parser, Debug)]
#[command(author, version, about = "Networked tuple space", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the tuple space server
    Server(ServerArgs),
    /// Replay request files against a running server
    Client(ClientArgs),
}

#[derive(Args, Debug)]
struct ServerArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Address to listen on, overrides the configuration file
    #[arg(long)]
    listen: Option<String>,

    /// Seconds between statistics reports, overrides the configuration file
    #[arg(long)]
    stats_interval: Option<u64>,
}

#[derive(Args, Debug)]
struct ClientArgs {
    /// Address of the server
    #[arg(long, default_value = DEFAULT_ADDR)]
    server: String,

    /// Request files, each replayed over its own connection
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Server(args) => run_server(args).await,
        Command::Client(args) => {
            init_logging(&LogConfig {
                file: None,
                level: "warn".to_string(),
            })?;
            client::run(&args.server, args.files).await
        }
    }
}

async fn run_server(args: ServerArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(listen) = args.listen {
        config.server_addr = listen;
    }
    if let Some(secs) = args.stats_interval {
        config.stats_interval_secs = secs;
    }
    config.validate()?;

    init_logging(&config.log)?;
    info!("Starting tuple space server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let server = Server::bind(&config.server_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr))?;
    info!("Server listening on: {}", server.local_addr());

    let reporter = stats::spawn(server.store(), config.stats_interval());
    server.run_until_ctrl_c().await;
    reporter.abort();

    info!("Server stopped");
    Ok(())
}

fn init_logging(log: &LogConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    match &log.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file '{}'", path))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}
