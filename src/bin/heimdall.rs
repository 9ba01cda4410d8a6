use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use heimdall::{
    Watcher,
    config::{
        BaseSettings, DEFAULT_PING_TARGETS, DEFAULT_PING_TIMEOUT, DEFAULT_POLL_INTERVAL,
        RuntimeConfigStore,
    },
    probe::PingProbe,
    storage::StorageBackend,
};
use tracing::{error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about = "Network connectivity watcher")]
struct Args {
    /// SQLite database file
    #[arg(long, env = "HEIMDALL_DB", default_value = "heimdall.db")]
    db: PathBuf,

    /// Settings file written by config updates
    #[arg(long, env = "HEIMDALL_SETTINGS_FILE", default_value = "heimdall.settings.json")]
    settings_file: PathBuf,

    /// Address the HTTP API binds to
    #[arg(long, env = "HEIMDALL_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(long, env = "HEIMDALL_PORT", default_value_t = 9000)]
    port: u16,

    /// Comma-separated hosts to probe
    #[arg(long, env = "HEIMDALL_PING_TARGETS", default_value = DEFAULT_PING_TARGETS)]
    ping_targets: String,

    /// Single host to probe; overrides --ping-targets
    #[arg(long, env = "HEIMDALL_PING_TARGET")]
    ping_target: Option<String>,

    /// Seconds between probe cycles
    #[arg(long, env = "HEIMDALL_POLL_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL)]
    poll_interval: u64,

    /// Seconds to wait for an echo reply
    #[arg(long, env = "HEIMDALL_PING_TIMEOUT", default_value_t = DEFAULT_PING_TIMEOUT)]
    ping_timeout: u64,

    /// Directory served as the dashboard
    #[arg(long, env = "HEIMDALL_STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn base_settings(&self) -> BaseSettings {
        BaseSettings {
            ping_targets: self.ping_targets.clone(),
            ping_target: self.ping_target.clone(),
            poll_interval: self.poll_interval,
            ping_timeout: self.ping_timeout,
        }
    }
}

fn init(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let filter = filter::Targets::new().with_targets(vec![
        ("heimdall", level),
        ("tower_http", level),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[cfg(feature = "storage-sqlite")]
async fn open_storage(args: &Args) -> anyhow::Result<Arc<dyn StorageBackend>> {
    use heimdall::storage::sqlite::SqliteBackend;

    let backend = SqliteBackend::new(&args.db)
        .await
        .with_context(|| format!("failed to open database {}", args.db.display()))?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "storage-sqlite"))]
async fn open_storage(_args: &Args) -> anyhow::Result<Arc<dyn StorageBackend>> {
    use heimdall::storage::memory::MemoryBackend;

    warn!("built without storage-sqlite, history is kept in memory only");
    Ok(Arc::new(MemoryBackend::new()))
}

#[cfg(feature = "api")]
async fn start_api(args: &Args, watcher: Watcher) -> anyhow::Result<()> {
    use heimdall::api::{ApiConfig, ApiState, spawn_api_server};

    let config = ApiConfig {
        bind_addr: SocketAddr::new(args.host, args.port),
        static_dir: args.static_dir.clone(),
        ..Default::default()
    };

    let addr = spawn_api_server(config, ApiState::new(watcher, args.port)).await?;
    info!("dashboard at http://{addr}/");
    Ok(())
}

#[cfg(not(feature = "api"))]
async fn start_api(args: &Args, _watcher: Watcher) -> anyhow::Result<()> {
    let addr = SocketAddr::new(args.host, args.port);
    warn!("built without api, not listening on {addr}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let storage = open_storage(&args).await?;
    let config = RuntimeConfigStore::load(&args.base_settings(), args.settings_file.clone())
        .await
        .context("invalid configuration")?;

    let watcher = Watcher::new(storage, config);
    let monitor = watcher.start_monitor(Arc::new(PingProbe::new()))?;

    start_api(&args, watcher.clone()).await?;

    tokio::select! {
        result = monitor => {
            let outcome = match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(anyhow::Error::new(e).context("monitor task panicked")),
            };
            if let Err(e) = &outcome {
                error!("monitor stopped: {e:#}");
            }
            if let Err(e) = watcher.close().await {
                warn!("failed to close storage: {e}");
            }
            match outcome {
                Ok(()) => bail!("monitor stopped unexpectedly"),
                Err(e) => Err(e),
            }
        }

        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!("shutting down");
            if let Err(e) = watcher.close().await {
                warn!("failed to close storage: {e}");
            }
            Ok(())
        }
    }
}
