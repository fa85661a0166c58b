use claimlink_types::{Amount, FeeParameter};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Unknown relayer instance: {0}")]
    UnknownRelayer(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    #[error("Instruction {0} does not accept value")]
    NotPayable(&'static str),

    #[error("Out of gas: limit {limit}, needed {needed}")]
    OutOfGas { limit: u64, needed: u64 },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("User is already registered")]
    AlreadyRegistered,

    #[error("User is not registered")]
    NotRegistered,

    #[error("User disabled auto-claim")]
    UserDisabled,

    #[error("Relayer is not an approved delegate for the user")]
    NotApproved,

    #[error("User must be registered to previous contract to be migrated")]
    NotPreviouslyRegistered,

    #[error("Caller is not the operator")]
    NotOperator,

    #[error("Caller does not own the escrow wallet")]
    NotWalletOwner,

    #[error("Guaranteed fee tier does not match the relayer version")]
    TierMismatch,

    #[error("Gas Price higher than user configured")]
    GasPriceExceeded { gas_price: u64, max_gas_price: u64 },

    #[error("Total cost higher than user configured")]
    TotalCostExceeded { total_cost: Amount, max_fee_per_claim: Amount },

    /// Carries the reward pool's reason unchanged.
    #[error("Failed to ClaimOnBehalf: {0}")]
    ClaimFailed(String),

    #[error("Debt settlement failed: {0}")]
    DebtSettlementFailed(String),

    #[error("Insufficient escrow balance: need {needed}, have {available}")]
    InsufficientEscrow { needed: Amount, available: Amount },

    #[error("Escrow wallet creation failed: {0}")]
    WalletCreationFailed(String),

    #[error("Escrow withdrawal refused: {0}")]
    WithdrawalRefused(String),

    #[error("{0}")]
    FeeTooHigh(FeeParameter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PreconditionViolation,
    CeilingExceeded,
    ExternalCollaboratorFailure,
    OperatorPolicyViolation,
    InvalidTransaction,
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        use RelayError::*;
        match self {
            AlreadyRegistered | NotRegistered | UserDisabled | NotApproved
            | NotPreviouslyRegistered | NotOperator | NotWalletOwner | TierMismatch => {
                ErrorKind::PreconditionViolation
            }
            GasPriceExceeded { .. } | TotalCostExceeded { .. } => ErrorKind::CeilingExceeded,
            ClaimFailed(_)
            | DebtSettlementFailed(_)
            | InsufficientEscrow { .. }
            | WalletCreationFailed(_)
            | WithdrawalRefused(_) => ErrorKind::ExternalCollaboratorFailure,
            FeeTooHigh(_) => ErrorKind::OperatorPolicyViolation,
            UnknownRelayer(_)
            | InvalidSignature
            | InvalidNonce { .. }
            | InsufficientBalance { .. }
            | NotPayable(_)
            | OutOfGas { .. }
            | ArithmeticOverflow => ErrorKind::InvalidTransaction,
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
