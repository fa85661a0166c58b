//! Principal registration, settings and the operator's fee controls.

use claimlink_types::fees::FeeChangeError;
use claimlink_types::gas::{STORAGE_READ_GAS, STORAGE_WRITE_GAS};
use claimlink_types::{short_hex, Address, Amount, PrincipalAccount, RelayEvent, TierFees};
use tracing::{debug, info};

use crate::error::{RelayError, Result};
use crate::host::Host;
use crate::{escrow, relayer_mut, relayer_ref, Call, ExecutionContext};

pub fn register<H: Host>(
    ctx: &mut ExecutionContext<H>,
    call: &mut Call,
    max_gas_price: u64,
    max_fee_per_claim: Amount,
    guaranteed_opt_out: bool,
) -> Result<()> {
    call.meter.charge(STORAGE_READ_GAS)?;
    let relayer = relayer_ref(ctx.state, &call.relayer)?;
    if relayer.is_registered(&call.sender) {
        return Err(RelayError::AlreadyRegistered);
    }
    let tiered = relayer.is_tiered();
    let daily_limit = relayer.escrow_daily_limit;

    let principal = call.sender;
    let deposit = call.value;
    let escrow_wallet = escrow::provision(ctx, call, principal, deposit, daily_limit)?;

    let account = PrincipalAccount {
        escrow_wallet,
        max_gas_price,
        max_fee_per_claim,
        auto_claim_disabled: false,
        guaranteed_auto_claim_disabled: guaranteed_opt_out || !tiered,
        ever_disabled: false,
        migrated_from: None,
        registered_at: ctx.height,
    };
    insert_principal(ctx, call, principal, account)?;

    call.emit(RelayEvent::Registered { principal, escrow_wallet, deposit })?;
    debug!("registered {} with escrow {}", short_hex(&principal), short_hex(&escrow_wallet));
    Ok(())
}

/// Store a new account and append it to the registry.
pub(crate) fn insert_principal<H: Host>(
    ctx: &mut ExecutionContext<H>,
    call: &mut Call,
    principal: Address,
    account: PrincipalAccount,
) -> Result<()> {
    call.meter.charge(2 * STORAGE_WRITE_GAS)?;
    let relayer = relayer_mut(ctx.state, &call.relayer)?;
    if relayer.principals.insert(principal, account).is_some() {
        return Err(RelayError::AlreadyRegistered);
    }
    relayer.registry.append(principal);
    Ok(())
}

pub fn disable<H: Host>(ctx: &mut ExecutionContext<H>, call: &mut Call) -> Result<()> {
    call.meter.charge(STORAGE_READ_GAS + STORAGE_WRITE_GAS)?;
    let relayer = relayer_mut(ctx.state, &call.relayer)?;
    let account = relayer
        .principals
        .get_mut(&call.sender)
        .ok_or(RelayError::NotRegistered)?;

    account.auto_claim_disabled = true;
    if !account.ever_disabled {
        account.ever_disabled = true;
        relayer.registry.record_disabled();
    }

    let principal = call.sender;
    call.emit(RelayEvent::AutoClaimDisabled { principal })
}

pub fn disable_guaranteed<H: Host>(ctx: &mut ExecutionContext<H>, call: &mut Call) -> Result<()> {
    call.meter.charge(STORAGE_READ_GAS + STORAGE_WRITE_GAS)?;
    let relayer = relayer_mut(ctx.state, &call.relayer)?;
    let account = relayer
        .principals
        .get_mut(&call.sender)
        .ok_or(RelayError::NotRegistered)?;
    account.guaranteed_auto_claim_disabled = true;

    let principal = call.sender;
    call.emit(RelayEvent::GuaranteedAutoClaimDisabled { principal })
}

pub fn apply_settings<H: Host>(
    ctx: &mut ExecutionContext<H>,
    call: &mut Call,
    max_gas_price: u64,
    max_fee_per_claim: Amount,
    guaranteed_enabled: bool,
    enabled: bool,
) -> Result<()> {
    call.meter.charge(STORAGE_READ_GAS + 2 * STORAGE_WRITE_GAS)?;
    let relayer = relayer_mut(ctx.state, &call.relayer)?;
    let tiered = relayer.is_tiered();
    let account = relayer
        .principals
        .get_mut(&call.sender)
        .ok_or(RelayError::NotRegistered)?;

    account.max_gas_price = max_gas_price;
    account.max_fee_per_claim = max_fee_per_claim;
    account.guaranteed_auto_claim_disabled = !guaranteed_enabled || !tiered;
    account.auto_claim_disabled = !enabled;
    if !enabled && !account.ever_disabled {
        account.ever_disabled = true;
        relayer.registry.record_disabled();
    }
    let escrow_wallet = account.escrow_wallet;

    let top_up = call.value;
    escrow::fund(ctx, call, &escrow_wallet, top_up)?;

    let principal = call.sender;
    call.emit(RelayEvent::SettingsApplied { principal, max_gas_price, max_fee_per_claim, top_up })
}

pub fn withdraw_escrow<H: Host>(ctx: &mut ExecutionContext<H>, call: &mut Call, amount: Amount) -> Result<()> {
    call.meter.charge(STORAGE_READ_GAS)?;
    let principal = call.sender;
    let escrow_wallet = relayer_ref(ctx.state, &call.relayer)?
        .principal(&principal)
        .map(|a| a.escrow_wallet)
        .ok_or(RelayError::NotRegistered)?;

    escrow::disburse(ctx, call, &escrow_wallet, &principal, &principal, amount)?;
    call.emit(RelayEvent::EscrowWithdrawn { principal, amount })
}

pub fn change_fees<H: Host>(
    ctx: &mut ExecutionContext<H>,
    call: &mut Call,
    base: TierFees,
    guaranteed: Option<TierFees>,
    gas_offset_correction: u64,
) -> Result<()> {
    call.meter.charge(STORAGE_READ_GAS + 5 * STORAGE_WRITE_GAS)?;
    let relayer = relayer_mut(ctx.state, &call.relayer)?;
    if relayer.operator != call.sender {
        return Err(RelayError::NotOperator);
    }

    relayer
        .fee_schedule
        .change(base, guaranteed, gas_offset_correction)
        .map_err(|e| match e {
            FeeChangeError::TooHigh(param) => RelayError::FeeTooHigh(param),
            FeeChangeError::TierMismatch => RelayError::TierMismatch,
        })?;

    info!(
        "fees lowered on relayer {}: platform {} claimer {} offset {}",
        short_hex(&call.relayer),
        base.platform_fee,
        base.claimer_fee,
        gas_offset_correction
    );
    call.emit(RelayEvent::FeesChanged { base, guaranteed, gas_offset_correction })
}
