//! EmberKV Server Binary
//!
//! Opens the engine (replaying durability files) and starts the TCP server.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use emberkv::config::DurabilitySync;
use emberkv::network::Server;
use emberkv::{Config, Engine, Role};
use tracing_subscriber::{fmt, EnvFilter};

/// EmberKV Server
#[derive(Parser, Debug)]
#[command(name = "emberkv-server")]
#[command(about = "In-memory key-value store with durable per-key files and snapshots")]
#[command(version)]
struct Args {
    /// Durability file directory
    #[arg(short, long, default_value = "./storage")]
    storage_dir: PathBuf,

    /// Snapshot directory
    #[arg(long, default_value = "./snapshots")]
    snapshot_dir: PathBuf,

    /// Listen address for clients (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Inter-node address (reserved, not served)
    #[arg(long, default_value = "127.0.0.1:8090")]
    internal: String,

    /// Operating role: primary or replica
    #[arg(short, long, default_value = "primary")]
    role: Role,

    /// Maximum combined key + value size in bytes
    #[arg(long, default_value = "1024000")]
    max_item_size: usize,

    /// Number of connection worker threads
    #[arg(short, long, default_value = "16")]
    workers: usize,

    /// Connection read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "5000")]
    read_timeout_ms: u64,

    /// Connection write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,

    /// Skip fsync on durability writes
    #[arg(long)]
    no_fsync: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.log_file.as_ref()) {
        eprintln!("Failed to open log file: {}", e);
        std::process::exit(1);
    }

    tracing::info!("EmberKV Server v{}", emberkv::VERSION);
    tracing::info!("Storage directory: {}", args.storage_dir.display());
    tracing::info!("Snapshot directory: {}", args.snapshot_dir.display());
    tracing::info!("Internal address {} reserved (no protocol served)", args.internal);

    let durability_sync = if args.no_fsync {
        DurabilitySync::OsBuffered
    } else {
        DurabilitySync::EveryWrite
    };

    // Build config from args
    let config = Config::builder()
        .storage_dir(&args.storage_dir)
        .snapshot_dir(&args.snapshot_dir)
        .listen_addr(&args.listen)
        .internal_addr(&args.internal)
        .role(args.role)
        .max_item_size(args.max_item_size)
        .worker_threads(args.workers)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .durability_sync(durability_sync)
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    // Open engine; failing to create directories or list them is fatal
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized with {} keys", engine.len());

    let mut server = Server::new(config, engine);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

/// Initialize tracing, optionally writing to a log file instead of stderr
fn init_logging(log_file: Option<&PathBuf>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,emberkv=debug"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }

    Ok(())
}
