use anyhow::Context;
use clap::Parser;
use smartcity_monitor::{config::ConfigLoader, http_server, logging, AppState};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Smart-city infrastructure monitor backend
#[derive(Debug, Parser)]
#[command(name = "smartcity-monitor", version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "SMARTCITY_CONFIG")]
    config: Option<String>,

    /// Address to bind, e.g. 0.0.0.0:3001
    #[arg(long, env = "SMARTCITY_BIND")]
    bind: Option<String>,

    /// Milliseconds between simulation ticks
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Fixed RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new()
        .load_from_file(cli.config.as_deref())
        .load_from_env()
        .build()?;

    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.simulation.tick_interval_ms = tick_ms;
    }
    if cli.seed.is_some() {
        config.simulation.seed = cli.seed;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate().context("Invalid command line override")?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init_logging(&config.logging)?;

    let shutdown = CancellationToken::new();
    let bind_addr = config.bind_addr()?;
    let (state, simulator) = AppState::bootstrap(config, shutdown.clone());

    let simulation = simulator.spawn(state.store.clone(), state.push.clone(), shutdown.clone());

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received");
        signal_token.cancel();
    });

    let server_token = shutdown.clone();
    http_server::serve(listener, state, async move {
        server_token.cancelled().await
    })
    .await?;

    shutdown.cancel();
    simulation.await.context("simulation task panicked")?;
    info!("Backend stopped");

    Ok(())
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
