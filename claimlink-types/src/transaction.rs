use serde::{Deserialize, Serialize};

use crate::instruction::RelayInstruction;
use crate::{Address, Amount};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub sender: Address,
    /// Relayer instance the instruction is addressed to.
    pub target: Address,
    pub nonce: u64,
    /// Native value attached to payable instructions.
    pub value: Amount,
    pub instruction: RelayInstruction,
    pub signature: Vec<u8>,
    pub gas_limit: u64,
    pub gas_price: u64,
}

impl Transaction {
    pub fn signing_bytes(&self) -> Vec<u8> {
        #[derive(Serialize)]
        struct SigningTx<'a> {
            sender: &'a Address,
            target: &'a Address,
            nonce: u64,
            value: Amount,
            instruction: &'a RelayInstruction,
            gas_limit: u64,
            gas_price: u64,
        }

        let signing = SigningTx {
            sender: &self.sender,
            target: &self.target,
            nonce: self.nonce,
            value: self.value,
            instruction: &self.instruction,
            gas_limit: self.gas_limit,
            gas_price: self.gas_price,
        };

        bincode::serialize(&signing).expect("tx signing serialization")
    }

    pub fn id(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.signing_bytes());
        hasher.update(&self.signature);
        *hasher.finalize().as_bytes()
    }

    /// Upper bound the sender must hold before execution starts.
    pub fn max_cost(&self) -> Option<Amount> {
        (self.gas_limit as Amount)
            .checked_mul(self.gas_price as Amount)?
            .checked_add(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> Transaction {
        Transaction {
            sender: [1u8; 32],
            target: [2u8; 32],
            nonce: 0,
            value: 5,
            instruction: RelayInstruction::Disable,
            signature: vec![],
            gas_limit: 100,
            gas_price: 3,
        }
    }

    #[test]
    fn signature_is_not_part_of_signing_bytes() {
        let a = tx();
        let mut b = tx();
        b.signature = vec![9u8; 64];
        assert_eq!(a.signing_bytes(), b.signing_bytes());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn max_cost_covers_gas_and_value() {
        assert_eq!(tx().max_cost(), Some(305));
    }
}
