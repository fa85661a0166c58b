//! Claim-on-behalf settlement.
//!
//! Check registration, opt-out and delegate approval, run the external claim,
//! settle debt when the guaranteed tier applies, then quote and check fees
//! against the principal's ceilings before paying claimer and collector out of
//! escrow. Any failure unwinds the whole transaction.

use claimlink_types::gas::{EXTERNAL_CALL_GAS, STORAGE_READ_GAS, STORAGE_WRITE_GAS};
use claimlink_types::{short_hex, Address, FeeTier, RelayEvent};
use tracing::info;

use crate::error::{RelayError, Result};
use crate::fees::{check_ceilings, quote, select_tier};
use crate::host::{CollateralOracle, DelegateApprovals, Host, RewardPool};
use crate::{escrow, relayer_mut, relayer_ref, Call, ExecutionContext};

pub fn claim_on_behalf<H: Host>(ctx: &mut ExecutionContext<H>, call: &mut Call, principal: &Address) -> Result<()> {
    let gas_start = call.meter.used();

    call.meter.charge(STORAGE_READ_GAS)?;
    let relayer = relayer_ref(ctx.state, &call.relayer)?;
    let account = relayer.principal(principal).cloned().ok_or(RelayError::NotRegistered)?;
    let schedule = relayer.fee_schedule;
    let fee_collector = relayer.fee_collector;

    if account.auto_claim_disabled {
        return Err(RelayError::UserDisabled);
    }

    call.meter.charge(EXTERNAL_CALL_GAS)?;
    if !ctx.host.approvals().can_claim_for(principal, &call.relayer) {
        return Err(RelayError::NotApproved);
    }

    call.meter.charge(EXTERNAL_CALL_GAS)?;
    let (fees_claimed, rewards_claimed) = ctx.host.reward_pool().fees_available(principal);

    call.meter.charge(EXTERNAL_CALL_GAS)?;
    let pool_gas = ctx
        .host
        .reward_pool_mut()
        .claim_on_behalf(principal, &call.relayer)
        .map_err(RelayError::ClaimFailed)?;
    call.meter.charge(pool_gas)?;

    let tier = if schedule.is_tiered() && !account.guaranteed_auto_claim_disabled {
        call.meter.charge(3 * EXTERNAL_CALL_GAS)?;
        select_tier(&schedule, &account, ctx.host.collateral(), principal)
    } else {
        FeeTier::Base
    };
    if tier == FeeTier::Guaranteed {
        settle_debt(ctx, call, principal)?;
    }

    let gas_used = call.meter.used() - gas_start;
    let fee_quote = quote(&schedule, tier, gas_used, call.gas_price)?;
    check_ceilings(&account, call.gas_price, &fee_quote)?;

    let relayer_addr = call.relayer;
    let claimer = call.sender;
    escrow::disburse(ctx, call, &account.escrow_wallet, &relayer_addr, &claimer, fee_quote.claimer_payout()?)?;
    escrow::disburse(ctx, call, &account.escrow_wallet, &relayer_addr, &fee_collector, fee_quote.platform_fee)?;

    call.meter.charge(2 * STORAGE_WRITE_GAS)?;
    let relayer = relayer_mut(ctx.state, &relayer_addr)?;
    relayer.total_fees_claimed = relayer
        .total_fees_claimed
        .checked_add(fees_claimed)
        .ok_or(RelayError::ArithmeticOverflow)?;
    relayer.total_rewards_claimed = relayer
        .total_rewards_claimed
        .checked_add(rewards_claimed)
        .ok_or(RelayError::ArithmeticOverflow)?;

    info!(
        "claimed for {} by {} ({:?}): gas cost {} claimer fee {} platform fee {}",
        short_hex(principal),
        short_hex(&claimer),
        tier,
        fee_quote.gas_cost,
        fee_quote.claimer_fee,
        fee_quote.platform_fee
    );

    call.emit(RelayEvent::Claimed {
        principal: *principal,
        claimer,
        tier,
        gas_cost: fee_quote.gas_cost,
        claimer_fee: fee_quote.claimer_fee,
        platform_fee: fee_quote.platform_fee,
        fees_claimed,
        rewards_claimed,
    })
}

/// Burn approval is required on top of the oracle's own settlement check.
fn settle_debt<H: Host>(ctx: &mut ExecutionContext<H>, call: &mut Call, principal: &Address) -> Result<()> {
    call.meter.charge(EXTERNAL_CALL_GAS)?;
    if !ctx.host.approvals().can_burn_for(principal, &call.relayer) {
        return Err(RelayError::DebtSettlementFailed(
            "relayer is not approved to burn for the user".into(),
        ));
    }

    call.meter.charge(EXTERNAL_CALL_GAS)?;
    let gas = ctx
        .host
        .collateral_mut()
        .settle_debt(principal, &call.relayer)
        .map_err(RelayError::DebtSettlementFailed)?;
    call.meter.charge(gas)
}
