use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use event_bridge::{EventBridge, EventBridgeConfig, RedisPublisher, MODULE_NAME};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Mesh Bridge Server - forwards HTTP-submitted events to pub/sub channels
#[derive(Parser)]
#[command(name = "mesh-bridge-server")]
#[command(about = "Mesh Bridge Server - forwards HTTP-submitted events to pub/sub channels")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bridge server
    Run,
    /// Check configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    // defaults -> YAML -> env -> CLI
    let mut config = AppConfig::load_layered(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, &config.home_dir());

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

fn bind_addr(config: &AppConfig) -> Result<SocketAddr> {
    let raw = config.bind_addr();
    raw.parse()
        .with_context(|| format!("Invalid listen address '{raw}'"))
}

fn bridge_config(config: &AppConfig) -> Result<EventBridgeConfig> {
    config.module_config::<EventBridgeConfig>(MODULE_NAME)
}

async fn run_server(config: AppConfig) -> Result<()> {
    let bridge_cfg = bridge_config(&config)?;
    let addr = bind_addr(&config)?;
    tracing::info!(service = %bridge_cfg.service_name, "Mesh bridge starting");

    let request_timeout =
        (config.server.timeout_sec > 0).then(|| Duration::from_secs(config.server.timeout_sec));
    let bridge = EventBridge::with_redis(bridge_cfg)?.with_request_timeout(request_timeout);

    let cancel = CancellationToken::new();
    let _signals = runtime::shutdown::cancel_on_signal(cancel.clone());

    bridge.serve(addr, cancel).await?;
    tracing::info!("Mesh bridge stopped");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let bridge_cfg = bridge_config(&config)?;
    let addr = bind_addr(&config)?;
    let publisher = RedisPublisher::open(&bridge_cfg.redis_url)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("listen: {addr}");
    println!("channel: {}", publisher.target());
    println!("service: {}", bridge_cfg.service_name);
    Ok(())
}
