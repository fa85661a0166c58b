use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use claimlink_types::block::Block;
use claimlink_types::state::GlobalState;
#[cfg(feature = "rocksdb")]
use rocksdb::{Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

const STATE_KEY: &[u8] = b"global_state";
const HOST_KEY: &[u8] = b"host_state";
const TIP_KEY: &[u8] = b"chain_tip";

fn state_height_key(height: u64) -> Vec<u8> {
    format!("state_height_{}", height).into_bytes()
}

fn block_height_key(height: u64) -> Vec<u8> {
    format!("block_height_{}", height).into_bytes()
}

fn block_hash_key(hash: &[u8; 32]) -> Vec<u8> {
    format!("block_hash_{}", hex::encode(hash)).into_bytes()
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| anyhow!("Serialization error: {}", e))
}

enum Backend {
    Memory(Mutex<BTreeMap<Vec<u8>, Vec<u8>>>),
    #[cfg(feature = "rocksdb")]
    Rocks(DB),
}

pub struct Storage {
    backend: Backend,
}

impl Storage {
    /// Open a RocksDB store at `path`.
    #[cfg(feature = "rocksdb")]
    pub fn open(path: &str) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(|e| anyhow!("Failed to open DB at {}: {}", path, e))?;
        debug!("opened rocksdb at {}", path);
        Ok(Self { backend: Backend::Rocks(db) })
    }

    #[cfg(not(feature = "rocksdb"))]
    pub fn open(path: &str) -> Result<Self> {
        Err(anyhow!("cannot open {}: built without the rocksdb feature, run with --in-memory", path))
    }

    pub fn in_memory() -> Self {
        debug!("using in-memory storage");
        Self { backend: Backend::Memory(Mutex::new(BTreeMap::new())) }
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        match &self.backend {
            Backend::Memory(map) => {
                map.lock()
                    .map_err(|_| anyhow!("storage lock poisoned"))?
                    .insert(key.to_vec(), value.to_vec());
                Ok(())
            }
            #[cfg(feature = "rocksdb")]
            Backend::Rocks(db) => db.put(key, value).map_err(|e| anyhow!("DB write error: {}", e)),
        }
    }

    /// Apply every write or none of them.
    fn put_batch(&self, writes: Vec<(Vec<u8>, Vec<u8>)>) -> Result<()> {
        match &self.backend {
            Backend::Memory(map) => {
                map.lock()
                    .map_err(|_| anyhow!("storage lock poisoned"))?
                    .extend(writes);
                Ok(())
            }
            #[cfg(feature = "rocksdb")]
            Backend::Rocks(db) => {
                let mut batch = WriteBatch::default();
                for (key, value) in writes {
                    batch.put(key, value);
                }
                db.write(batch).map_err(|e| anyhow!("DB batch write error: {}", e))
            }
        }
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match &self.backend {
            Backend::Memory(map) => Ok(map
                .lock()
                .map_err(|_| anyhow!("storage lock poisoned"))?
                .get(key)
                .cloned()),
            #[cfg(feature = "rocksdb")]
            Backend::Rocks(db) => db.get(key).map_err(|e| anyhow!("DB read error: {}", e)),
        }
    }

    fn put_encoded<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        self.put(key, &encode(value)?)
    }

    fn get_decoded<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.get(key)? {
            Some(bytes) => {
                let decoded = bincode::deserialize(&bytes)
                    .with_context(|| format!("Deserialization error for key {}", String::from_utf8_lossy(key)))?;
                Ok(Some(decoded))
            }
            None => Ok(None),
        }
    }

    /// Writes the latest snapshot and a per-height copy.
    pub fn save_state(&self, height: u64, state: &GlobalState) -> Result<()> {
        self.put_encoded(STATE_KEY, state)?;
        self.put_encoded(&state_height_key(height), state)
    }

    pub fn load_state(&self) -> Result<Option<GlobalState>> {
        self.get_decoded(STATE_KEY)
    }

    pub fn load_state_at(&self, height: u64) -> Result<Option<GlobalState>> {
        self.get_decoded(&state_height_key(height))
    }

    /// Collaborator host snapshot, stored next to the ledger it belongs to.
    pub fn save_host<H: Serialize>(&self, host: &H) -> Result<()> {
        self.put_encoded(HOST_KEY, host)
    }

    pub fn load_host<H: DeserializeOwned>(&self) -> Result<Option<H>> {
        self.get_decoded(HOST_KEY)
    }

    pub fn save_block(&self, block: &Block) -> Result<()> {
        let encoded = encode(block)?;
        self.put_batch(vec![
            (block_height_key(block.header.height), encoded.clone()),
            (block_hash_key(&block.hash()), encoded),
        ])
    }

    pub fn load_block_by_height(&self, height: u64) -> Result<Option<Block>> {
        self.get_decoded(&block_height_key(height))
    }

    pub fn load_block_by_hash(&self, hash: &[u8; 32]) -> Result<Option<Block>> {
        self.get_decoded(&block_hash_key(hash))
    }

    pub fn save_tip(&self, height: u64, hash: &[u8; 32]) -> Result<()> {
        self.put_encoded(TIP_KEY, &(height, *hash))
    }

    pub fn load_tip(&self) -> Result<Option<(u64, [u8; 32])>> {
        self.get_decoded(TIP_KEY)
    }

    /// Persist a sealed block with the state and host it produced, and move the tip.
    ///
    /// Everything is encoded up front and written in one batch, so a failure
    /// leaves the previous tip and its snapshots untouched.
    pub fn commit_block<H: Serialize>(&self, block: &Block, state: &GlobalState, host: &H) -> Result<()> {
        let height = block.header.height;
        let hash = block.hash();
        let encoded_block = encode(block)?;
        let encoded_state = encode(state)?;
        let encoded_host = encode(host)?;
        let encoded_tip = encode(&(height, hash))?;

        self.put_batch(vec![
            (block_height_key(height), encoded_block.clone()),
            (block_hash_key(&hash), encoded_block),
            (STATE_KEY.to_vec(), encoded_state.clone()),
            (state_height_key(height), encoded_state),
            (HOST_KEY.to_vec(), encoded_host),
            (TIP_KEY.to_vec(), encoded_tip),
        ])
    }
}
