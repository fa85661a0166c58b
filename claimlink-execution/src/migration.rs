use claimlink_types::gas::STORAGE_READ_GAS;
use claimlink_types::{short_hex, Amount, PrincipalAccount, RelayEvent};
use tracing::info;

use crate::error::{RelayError, Result};
use crate::host::Host;
use crate::registry::insert_principal;
use crate::{escrow, relayer_mut, relayer_ref, Call, ExecutionContext};

/// Move the caller from the predecessor relayer into this one, carrying the old escrow balance.
pub fn migrate_user<H: Host>(
    ctx: &mut ExecutionContext<H>,
    call: &mut Call,
    max_gas_price: u64,
    max_fee_per_claim: Amount,
    guaranteed_opt_out: bool,
) -> Result<()> {
    let principal = call.sender;

    call.meter.charge(STORAGE_READ_GAS)?;
    let relayer = relayer_ref(ctx.state, &call.relayer)?;
    if relayer.is_registered(&principal) {
        return Err(RelayError::AlreadyRegistered);
    }
    let tiered = relayer.is_tiered();
    let daily_limit = relayer.escrow_daily_limit;
    let previous_version = relayer.previous_version.ok_or(RelayError::NotPreviouslyRegistered)?;

    call.meter.charge(STORAGE_READ_GAS)?;
    let old_wallet = ctx
        .state
        .relayer(&previous_version)
        .and_then(|prev| prev.principal(&principal))
        .map(|a| a.escrow_wallet)
        .ok_or(RelayError::NotPreviouslyRegistered)?;

    let deposit = call.value;
    let escrow_wallet = escrow::provision(ctx, call, principal, deposit, daily_limit)?;

    call.meter.charge(STORAGE_READ_GAS)?;
    let carried_over = ctx.state.balance_of(&old_wallet);
    escrow::disburse(ctx, call, &old_wallet, &principal, &escrow_wallet, carried_over)?;

    let account = PrincipalAccount {
        escrow_wallet,
        max_gas_price,
        max_fee_per_claim,
        auto_claim_disabled: false,
        guaranteed_auto_claim_disabled: guaranteed_opt_out || !tiered,
        ever_disabled: false,
        migrated_from: Some(previous_version),
        registered_at: ctx.height,
    };
    insert_principal(ctx, call, principal, account)?;
    relayer_mut(ctx.state, &call.relayer)?.registry.record_migrated();

    info!(
        "migrated {} from {} carrying {} plus deposit {}",
        short_hex(&principal),
        short_hex(&previous_version),
        carried_over,
        deposit
    );

    call.emit(RelayEvent::Migrated { principal, previous_version, escrow_wallet, carried_over, deposit })
}
