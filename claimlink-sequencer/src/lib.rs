use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use claimlink_execution::{execute_transaction, ExecutionContext, Host, RelayError};
use claimlink_storage::Storage;
use claimlink_types::block::{Block, BlockHeader};
use claimlink_types::{short_hex, GlobalState, Receipt, Transaction};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{error, info, warn};

pub type Outcome = std::result::Result<Receipt, RelayError>;

pub struct SubmitRequest {
    pub tx: Transaction,
    pub reply: oneshot::Sender<Outcome>,
}

/// Cloneable front door to a running sequencer.
#[derive(Clone)]
pub struct SequencerHandle {
    sender: mpsc::Sender<SubmitRequest>,
}

impl SequencerHandle {
    pub fn new(sender: mpsc::Sender<SubmitRequest>) -> Self {
        Self { sender }
    }

    /// Queue `tx` and wait for it to be applied or rejected.
    pub async fn submit(&self, tx: Transaction) -> Result<Outcome> {
        let (reply, outcome) = oneshot::channel();
        self.sender
            .send(SubmitRequest { tx, reply })
            .await
            .map_err(|_| anyhow!("sequencer is not running"))?;
        outcome.await.context("sequencer dropped the request")
    }
}

/// Sole writer of the ledger and collaborator host.
///
/// Transactions are applied one at a time as they arrive; applied ones are
/// batched and sealed into a block on every tick.
pub struct SequencerService<H> {
    state: Arc<RwLock<GlobalState>>,
    host: H,
    storage: Arc<Storage>,
    submit_rx: mpsc::Receiver<SubmitRequest>,
    block_interval: Duration,
    height: u64,
    last_hash: [u8; 32],
    pending: Vec<(Transaction, Receipt)>,
}

impl<H> SequencerService<H>
where
    H: Host + Serialize + Send + 'static,
{
    pub fn new(
        state: Arc<RwLock<GlobalState>>,
        host: H,
        storage: Arc<Storage>,
        submit_rx: mpsc::Receiver<SubmitRequest>,
        block_interval: Duration,
    ) -> Result<Self> {
        let (height, last_hash) = storage.load_tip()?.unwrap_or((0, [0u8; 32]));
        if height > 0 {
            info!("Recovered chain tip. Starting at height {}", height);
        }
        Ok(Self {
            state,
            host,
            storage,
            submit_rx,
            block_interval,
            height,
            last_hash,
            pending: Vec::new(),
        })
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Drive the sequencer until `shutdown` fires, its sender is dropped, or
    /// every handle is dropped.
    /// Either way the pending batch is sealed before returning.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        info!("Starting sequencer, block interval {:?}", self.block_interval);
        let mut interval = tokio::time::interval(self.block_interval);

        loop {
            tokio::select! {
                request = self.submit_rx.recv() => {
                    match request {
                        Some(SubmitRequest { tx, reply }) => {
                            let outcome = self.apply(tx).await;
                            let _ = reply.send(outcome);
                        }
                        None => {
                            info!("Submission channel closed, sealing remaining transactions");
                            self.seal_final().await;
                            return;
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested, sealing remaining transactions");
                    self.seal_final().await;
                    return;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.seal_block().await {
                        error!("Failed to seal block {}: {:#}", self.height + 1, e);
                    }
                }
            }
        }
    }

    async fn seal_final(&mut self) {
        if let Err(e) = self.seal_block().await {
            error!("Failed to seal final block, {} txs not persisted: {:#}", self.pending.len(), e);
        }
    }

    /// Execute `tx` against the live ledger. Rejected transactions are dropped.
    pub async fn apply(&mut self, tx: Transaction) -> Outcome {
        let mut guard = self.state.write().await;
        let mut ctx = ExecutionContext {
            state: &mut guard,
            host: &mut self.host,
            height: self.height + 1,
            timestamp: now(),
        };

        match execute_transaction(&tx, &mut ctx) {
            Ok(receipt) => {
                self.pending.push((tx, receipt.clone()));
                Ok(receipt)
            }
            Err(e) => {
                warn!(
                    "Rejected {} from {}: {} ({:?})",
                    tx.instruction.name(),
                    short_hex(&tx.sender),
                    e,
                    e.kind()
                );
                Err(e)
            }
        }
    }

    /// Seal pending transactions into the next block and persist it.
    ///
    /// The pending batch is kept if persisting fails, so the next attempt
    /// seals the same transactions at the same height.
    pub async fn seal_block(&mut self) -> Result<Option<Block>> {
        if self.pending.is_empty() {
            return Ok(None);
        }

        let (transactions, receipts): (Vec<_>, Vec<_>) = self.pending.iter().cloned().unzip();
        let height = self.height + 1;
        let state = self.state.read().await;

        let block = Block {
            header: BlockHeader {
                height,
                prev_hash: self.last_hash,
                transactions_root: Block::transactions_root(&transactions),
                state_root: state.root_hash().context("state root")?,
                timestamp: now(),
            },
            transactions,
            receipts,
        };
        let hash = block.hash();

        self.storage
            .commit_block(&block, &state, &self.host)
            .with_context(|| format!("commit block {}", height))?;
        drop(state);

        self.pending.clear();
        self.height = height;
        self.last_hash = hash;
        info!("Committed block {} with {} txs", height, block.transactions.len());
        Ok(Some(block))
    }
}

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
