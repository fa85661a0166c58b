//! Tier selection, fee quoting and the principal's ceilings.

use claimlink_types::{Address, Amount, FeeSchedule, FeeTier, PrincipalAccount};

use crate::error::{RelayError, Result};
use crate::host::CollateralOracle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub tier: FeeTier,
    pub gas_used: u64,
    pub gas_cost: Amount,
    pub claimer_fee: Amount,
    pub platform_fee: Amount,
}

impl FeeQuote {
    /// Checked against the principal's `max_fee_per_claim`. The platform fee is not part of it.
    pub fn total_cost(&self) -> Result<Amount> {
        self.gas_cost.checked_add(self.claimer_fee).ok_or(RelayError::ArithmeticOverflow)
    }

    /// Paid to the claimer: gas reimbursement plus the claimer fee.
    pub fn claimer_payout(&self) -> Result<Amount> {
        self.total_cost()
    }

    /// Everything leaving the escrow wallet for this claim.
    pub fn escrow_debit(&self) -> Result<Amount> {
        self.total_cost()?
            .checked_add(self.platform_fee)
            .ok_or(RelayError::ArithmeticOverflow)
    }
}

/// Whether the tiered relayer should settle the principal's debt and charge guaranteed fees.
///
/// Strictly below target and settleable. A principal sitting exactly on target stays on base.
pub fn select_tier<O: CollateralOracle>(
    schedule: &FeeSchedule,
    account: &PrincipalAccount,
    oracle: &O,
    principal: &Address,
) -> FeeTier {
    if !schedule.is_tiered() || account.guaranteed_auto_claim_disabled {
        return FeeTier::Base;
    }
    let ratio = oracle.collateralization_ratio(principal);
    if ratio < oracle.target_ratio() && oracle.can_settle_debt(principal) {
        FeeTier::Guaranteed
    } else {
        FeeTier::Base
    }
}

pub fn quote(schedule: &FeeSchedule, tier: FeeTier, gas_used: u64, gas_price: u64) -> Result<FeeQuote> {
    let billable = gas_used
        .checked_add(schedule.gas_offset_correction())
        .ok_or(RelayError::ArithmeticOverflow)?;
    let gas_cost = (billable as Amount)
        .checked_mul(gas_price as Amount)
        .ok_or(RelayError::ArithmeticOverflow)?;
    let fees = schedule.fees_for(tier);

    Ok(FeeQuote {
        tier,
        gas_used,
        gas_cost,
        claimer_fee: fees.claimer_fee,
        platform_fee: fees.platform_fee,
    })
}

/// Gas price first, then total cost.
pub fn check_ceilings(account: &PrincipalAccount, gas_price: u64, quote: &FeeQuote) -> Result<()> {
    if gas_price > account.max_gas_price {
        return Err(RelayError::GasPriceExceeded { gas_price, max_gas_price: account.max_gas_price });
    }
    let total_cost = quote.total_cost()?;
    if total_cost > account.max_fee_per_claim {
        return Err(RelayError::TotalCostExceeded {
            total_cost,
            max_fee_per_claim: account.max_fee_per_claim,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCollateralOracle;
    use claimlink_types::{TierFees, ETHER, GWEI, PRECISE_UNIT};

    const P: Address = [5u8; 32];

    fn tenk(n: u128) -> Amount {
        ETHER / 10_000 * n
    }

    fn tiered() -> FeeSchedule {
        FeeSchedule::tiered(
            TierFees { platform_fee: tenk(5), claimer_fee: tenk(10) },
            TierFees { platform_fee: tenk(10), claimer_fee: tenk(20) },
            280_000,
        )
    }

    fn account(opted_out: bool) -> PrincipalAccount {
        PrincipalAccount {
            escrow_wallet: [9u8; 32],
            max_gas_price: 2 * GWEI,
            max_fee_per_claim: tenk(30),
            auto_claim_disabled: false,
            guaranteed_auto_claim_disabled: opted_out,
            ever_disabled: false,
            migrated_from: None,
            registered_at: 0,
        }
    }

    fn oracle(ratio: u128) -> MockCollateralOracle {
        let mut oracle = MockCollateralOracle::default();
        oracle.set_ratio(P, ratio);
        oracle
    }

    #[test]
    fn under_target_selects_guaranteed() {
        let oracle = oracle(69 * PRECISE_UNIT / 10);
        assert_eq!(select_tier(&tiered(), &account(false), &oracle, &P), FeeTier::Guaranteed);
    }

    #[test]
    fn at_or_above_target_stays_base() {
        let at = oracle(8 * PRECISE_UNIT);
        assert_eq!(select_tier(&tiered(), &account(false), &at, &P), FeeTier::Base);
        let above = oracle(833 * PRECISE_UNIT / 100);
        assert_eq!(select_tier(&tiered(), &account(false), &above, &P), FeeTier::Base);
    }

    #[test]
    fn opt_out_and_unsettleable_stay_base() {
        let oracle_low = oracle(PRECISE_UNIT);
        assert_eq!(select_tier(&tiered(), &account(true), &oracle_low, &P), FeeTier::Base);

        let mut blocked = oracle(PRECISE_UNIT);
        blocked.set_can_settle(P, false);
        assert_eq!(select_tier(&tiered(), &account(false), &blocked, &P), FeeTier::Base);
    }

    #[test]
    fn base_schedule_never_guarantees() {
        let schedule = FeeSchedule::base(TierFees { platform_fee: tenk(5), claimer_fee: tenk(10) }, 220_000);
        let oracle = oracle(PRECISE_UNIT);
        assert_eq!(select_tier(&schedule, &account(false), &oracle, &P), FeeTier::Base);
    }

    #[test]
    fn quote_adds_offset_before_pricing() {
        let q = quote(&tiered(), FeeTier::Guaranteed, 20_000, GWEI).unwrap();
        assert_eq!(q.gas_cost, 300_000 * GWEI as Amount);
        assert_eq!(q.claimer_fee, tenk(20));
        assert_eq!(q.platform_fee, tenk(10));
        assert_eq!(q.total_cost().unwrap(), 300_000 * GWEI as Amount + tenk(20));
        assert_eq!(q.escrow_debit().unwrap(), q.total_cost().unwrap() + tenk(10));
    }

    #[test]
    fn gas_price_is_checked_before_total() {
        let mut acct = account(false);
        acct.max_fee_per_claim = 0;
        let q = quote(&tiered(), FeeTier::Base, 0, 3 * GWEI).unwrap();
        assert!(matches!(check_ceilings(&acct, 3 * GWEI, &q), Err(RelayError::GasPriceExceeded { .. })));

        let q = quote(&tiered(), FeeTier::Base, 0, GWEI).unwrap();
        assert!(matches!(check_ceilings(&acct, GWEI, &q), Err(RelayError::TotalCostExceeded { .. })));
    }

    #[test]
    fn total_equal_to_ceiling_passes() {
        let q = quote(&tiered(), FeeTier::Base, 0, GWEI).unwrap();
        let mut acct = account(false);
        acct.max_fee_per_claim = q.total_cost().unwrap();
        assert!(check_ceilings(&acct, GWEI, &q).is_ok());
    }
}
