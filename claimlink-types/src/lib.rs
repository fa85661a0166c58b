pub mod account;
pub mod block;
pub mod event;
pub mod fees;
pub mod gas;
pub mod instruction;
pub mod state;
pub mod transaction;

pub use account::{NativeAccount, PrincipalAccount, Registry};
pub use block::Block;
pub use event::{Receipt, RelayEvent};
pub use fees::{FeeParameter, FeeSchedule, FeeTier, Ratchet, TierFees};
pub use instruction::RelayInstruction;
pub use state::{GlobalState, RelayerState};
pub use transaction::Transaction;

/// 32-byte account identity. Principals and claimers use their ed25519 verifying key.
pub type Address = [u8; 32];

/// Native value in base units (1 ether = 10^18).
pub type Amount = u128;

pub const GWEI: u64 = 1_000_000_000;
pub const ETHER: Amount = 1_000_000_000_000_000_000;

/// Fixed-point scale for collateralization ratios.
pub const PRECISE_UNIT: u128 = 1_000_000_000_000_000_000;

/// Short hex form used in logs.
pub fn short_hex(addr: &Address) -> String {
    hex::encode(&addr[..6])
}
