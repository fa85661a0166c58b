//! Escrow wallets: one per principal per relayer, owned jointly by the relayer
//! instance and the principal with a single required confirmation.

use claimlink_types::gas::{STORAGE_READ_GAS, VALUE_TRANSFER_GAS, WALLET_CREATE_GAS};
use claimlink_types::{Address, Amount};

use crate::error::{RelayError, Result};
use crate::host::{Host, WalletFactory};
use crate::{ledger, Call, ExecutionContext};

pub const ESCROW_REQUIRED_CONFIRMATIONS: u32 = 1;

/// Create an escrow wallet for `principal` and fund it with `deposit` from the caller.
pub fn provision<H: Host>(
    ctx: &mut ExecutionContext<H>,
    call: &mut Call,
    principal: Address,
    deposit: Amount,
    daily_limit: Amount,
) -> Result<Address> {
    call.meter.charge(WALLET_CREATE_GAS)?;
    let wallet = ctx
        .host
        .wallets_mut()
        .create(vec![call.relayer, principal], ESCROW_REQUIRED_CONFIRMATIONS, daily_limit)
        .map_err(RelayError::WalletCreationFailed)?;

    fund(ctx, call, &wallet, deposit)?;
    Ok(wallet)
}

/// Move `amount` of the caller's attached value into `wallet`.
pub fn fund<H: Host>(ctx: &mut ExecutionContext<H>, call: &mut Call, wallet: &Address, amount: Amount) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    call.meter.charge(VALUE_TRANSFER_GAS)?;
    ledger::transfer(&mut ctx.state.accounts, &call.sender, wallet, amount)
}

/// Pay `amount` out of `wallet` to `to`, authorized by wallet owner `owner`.
pub fn disburse<H: Host>(
    ctx: &mut ExecutionContext<H>,
    call: &mut Call,
    wallet: &Address,
    owner: &Address,
    to: &Address,
    amount: Amount,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    if !ctx.host.wallets().is_owner(wallet, owner) {
        return Err(RelayError::NotWalletOwner);
    }

    call.meter.charge(STORAGE_READ_GAS)?;
    let available = ctx.state.balance_of(wallet);
    if available < amount {
        return Err(RelayError::InsufficientEscrow { needed: amount, available });
    }

    let day = ctx.day();
    ctx.host
        .wallets_mut()
        .authorize_withdrawal(wallet, owner, amount, day)
        .map_err(RelayError::WithdrawalRefused)?;

    call.meter.charge(VALUE_TRANSFER_GAS)?;
    ledger::transfer(&mut ctx.state.accounts, wallet, to, amount)
}
