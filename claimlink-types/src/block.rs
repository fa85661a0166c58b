use crate::event::Receipt;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

fn hash_concat(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(left);
    hasher.update(right);
    *hasher.finalize().as_bytes()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u64,
    pub prev_hash: [u8; 32],
    pub transactions_root: [u8; 32],
    pub state_root: [u8; 32],
    pub timestamp: u64,
}

/// Batch of transactions the sequencer committed together. Rejected transactions never appear here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    pub receipts: Vec<Receipt>,
}

impl Block {
    pub fn transactions_root(txs: &[Transaction]) -> [u8; 32] {
        if txs.is_empty() {
            return [0u8; 32];
        }

        let mut level: Vec<[u8; 32]> = txs.iter().map(|tx| tx.id()).collect();
        while level.len() > 1 {
            // Odd levels pair the last node with itself.
            level = level
                .chunks(2)
                .map(|pair| hash_concat(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
        }
        level[0]
    }

    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&bincode::serialize(&self.header).expect("block header serialization"));
        *hasher.finalize().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::RelayInstruction;

    fn tx(nonce: u64) -> Transaction {
        Transaction {
            sender: [1u8; 32],
            target: [2u8; 32],
            nonce,
            value: 0,
            instruction: RelayInstruction::Disable,
            signature: vec![],
            gas_limit: 0,
            gas_price: 0,
        }
    }

    #[test]
    fn transactions_root_depends_on_order() {
        assert_eq!(Block::transactions_root(&[]), [0u8; 32]);
        assert_eq!(Block::transactions_root(&[tx(0)]), tx(0).id());

        let forward = Block::transactions_root(&[tx(0), tx(1), tx(2)]);
        let reversed = Block::transactions_root(&[tx(2), tx(1), tx(0)]);
        assert_ne!(forward, reversed);
    }
}
