use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use claimlink_api::{AppState, Metrics};
use claimlink_execution::MockHost;
use claimlink_genesis::GenesisConfig;
use claimlink_sequencer::{SequencerHandle, SequencerService};
use claimlink_storage::Storage;
use claimlink_types::{short_hex, GlobalState};
use tokio::signal;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "./data")]
    data_dir: String,
    /// Genesis config JSON. The built-in devnet is used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 3000)]
    api_port: u16,
    #[arg(long, default_value_t = 2000)]
    block_interval_ms: u64,
    /// Keep everything in memory instead of opening RocksDB. Always on when
    /// built without the `rocksdb` feature.
    #[arg(long)]
    in_memory: bool,
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn open_storage(args: &Args) -> Result<Storage> {
    if args.in_memory {
        return Ok(Storage::in_memory());
    }
    if !cfg!(feature = "rocksdb") {
        warn!("Built without the rocksdb feature, state in {} will not be used", args.data_dir);
        return Ok(Storage::in_memory());
    }
    let storage = Storage::open(&args.data_dir).context("Failed to initialize storage")?;
    info!("Storage initialized at {}", args.data_dir);
    Ok(storage)
}

/// Restore ledger and host from storage, or build them from genesis on first start.
fn load_or_genesis(storage: &Storage, args: &Args) -> Result<(GlobalState, MockHost)> {
    if let Some(state) = storage.load_state()? {
        let host = storage.load_host::<MockHost>()?.unwrap_or_default();
        info!("Loaded existing state with {} relayer instances", state.relayers.len());
        return Ok((state, host));
    }

    let config = match &args.config {
        Some(path) => claimlink_genesis::load_from_file(path)?,
        None => {
            info!("No genesis config given, using the built-in devnet");
            GenesisConfig::default()
        }
    };
    let state = claimlink_genesis::create_genesis_state(&config).context("Failed to build genesis state")?;
    let host = claimlink_genesis::create_genesis_host(&config);

    storage.save_state(0, &state).context("Failed to save genesis state")?;
    storage.save_host(&host).context("Failed to save genesis host")?;
    for relayer in &config.relayers {
        info!(
            "Genesis relayer {} at {}",
            relayer.name,
            short_hex(&claimlink_genesis::relayer_address(&relayer.name))
        );
    }
    Ok((state, host))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(args.log_level).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    info!("Starting claimlink node...");

    let storage = Arc::new(open_storage(&args)?);

    let (state, host) = load_or_genesis(&storage, &args)?;
    let shared_state = Arc::new(RwLock::new(state));

    let (submit_tx, submit_rx) = mpsc::channel(1000);
    let sequencer = SequencerService::new(
        shared_state.clone(),
        host,
        storage.clone(),
        submit_rx,
        Duration::from_millis(args.block_interval_ms),
    )?;
    let (stop_sequencer, shutdown) = oneshot::channel();
    let sequencer_task = tokio::spawn(sequencer.run(shutdown));

    let api_state = AppState {
        global_state: shared_state.clone(),
        storage: storage.clone(),
        sequencer: SequencerHandle::new(submit_tx),
        metrics: Arc::new(Metrics::new()),
    };
    let api_port = args.api_port;
    tokio::spawn(async move {
        if let Err(e) = claimlink_api::start_server(api_state, api_port).await {
            error!("API server stopped: {:#}", e);
        }
    });

    info!("Node running. Press Ctrl+C to stop.");
    signal::ctrl_c().await?;
    info!("Shutting down");

    // The API keeps a handle, so the sequencer has to be told to stop.
    let _ = stop_sequencer.send(());
    sequencer_task.await.context("sequencer task failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_flag_skips_data_dir() {
        let args = Args::parse_from(["claimlink-node", "--in-memory", "--data-dir", "/nonexistent/claimlink"]);
        let storage = open_storage(&args).unwrap();
        assert!(storage.load_tip().unwrap().is_none());
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn default_build_starts_without_rocksdb() {
        let args = Args::parse_from(["claimlink-node"]);
        assert!(!args.in_memory);
        let storage = open_storage(&args).unwrap();
        let (state, _host) = load_or_genesis(&storage, &args).unwrap();
        assert!(!state.relayers.is_empty());
        assert!(storage.load_state().unwrap().is_some());
    }
}
