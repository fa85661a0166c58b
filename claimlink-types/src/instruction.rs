use serde::{Deserialize, Serialize};

use crate::fees::TierFees;
use crate::Amount;

/// Operations a signed transaction can invoke on a relayer instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum RelayInstruction {
    // ══════════════════════════════════════════════════════════════
    // Principal lifecycle
    // ══════════════════════════════════════════════════════════════
    /// Payable: the attached value funds the new escrow wallet.
    Register {
        max_gas_price: u64,
        max_fee_per_claim: Amount,
        guaranteed_opt_out: bool,
    },
    Disable,
    DisableGuaranteedAutoClaim,
    /// Payable: the attached value tops up the escrow wallet.
    ApplySettings {
        max_gas_price: u64,
        max_fee_per_claim: Amount,
        guaranteed_enabled: bool,
        enabled: bool,
    },
    WithdrawEscrow { amount: Amount },

    // ══════════════════════════════════════════════════════════════
    // Claiming
    // ══════════════════════════════════════════════════════════════
    ClaimOnBehalf { principal: [u8; 32] },

    // ══════════════════════════════════════════════════════════════
    // Operator
    // ══════════════════════════════════════════════════════════════
    ChangeFees {
        base: TierFees,
        guaranteed: Option<TierFees>,
        gas_offset_correction: u64,
    },

    // ══════════════════════════════════════════════════════════════
    // Versioning
    // ══════════════════════════════════════════════════════════════
    /// Payable: the attached value is added to the carried-over escrow balance.
    MigrateUser {
        max_gas_price: u64,
        max_fee_per_claim: Amount,
        guaranteed_opt_out: bool,
    },
}

impl RelayInstruction {
    pub fn is_payable(&self) -> bool {
        matches!(
            self,
            RelayInstruction::Register { .. }
                | RelayInstruction::ApplySettings { .. }
                | RelayInstruction::MigrateUser { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            RelayInstruction::Register { .. } => "register",
            RelayInstruction::Disable => "disable",
            RelayInstruction::DisableGuaranteedAutoClaim => "disable_guaranteed_auto_claim",
            RelayInstruction::ApplySettings { .. } => "apply_settings",
            RelayInstruction::WithdrawEscrow { .. } => "withdraw_escrow",
            RelayInstruction::ClaimOnBehalf { .. } => "claim_on_behalf",
            RelayInstruction::ChangeFees { .. } => "change_fees",
            RelayInstruction::MigrateUser { .. } => "migrate_user",
        }
    }
}
