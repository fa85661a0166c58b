use serde::{Deserialize, Serialize};

use crate::fees::{FeeTier, TierFees};
use crate::{Address, Amount};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Registered {
        principal: Address,
        escrow_wallet: Address,
        deposit: Amount,
    },
    AutoClaimDisabled {
        principal: Address,
    },
    GuaranteedAutoClaimDisabled {
        principal: Address,
    },
    SettingsApplied {
        principal: Address,
        max_gas_price: u64,
        max_fee_per_claim: Amount,
        top_up: Amount,
    },
    EscrowWithdrawn {
        principal: Address,
        amount: Amount,
    },
    Claimed {
        principal: Address,
        claimer: Address,
        tier: FeeTier,
        gas_cost: Amount,
        claimer_fee: Amount,
        platform_fee: Amount,
        fees_claimed: Amount,
        rewards_claimed: Amount,
    },
    FeesChanged {
        base: TierFees,
        guaranteed: Option<TierFees>,
        gas_offset_correction: u64,
    },
    Migrated {
        principal: Address,
        previous_version: Address,
        escrow_wallet: Address,
        carried_over: Amount,
        deposit: Amount,
    },
}

/// Outcome of a committed transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_id: [u8; 32],
    pub gas_used: u64,
    pub events: Vec<RelayEvent>,
}
