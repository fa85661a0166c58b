pub mod claim;
pub mod error;
pub mod escrow;
pub mod fees;
pub mod host;
pub mod ledger;
pub mod meter;
pub mod migration;
pub mod mock;
pub mod registry;
pub mod wallet;


use claimlink_crypto::verify_signature;
use claimlink_types::gas::{EVENT_GAS, TX_BASE_GAS};
use claimlink_types::{
    short_hex, Address, Amount, GlobalState, Receipt, RelayEvent, RelayInstruction, RelayerState,
    Transaction,
};
use tracing::debug;

pub use error::{ErrorKind, RelayError, Result};
pub use host::{CollateralOracle, DelegateApprovals, Host, RewardPool, WalletFactory};
pub use meter::GasMeter;
pub use mock::MockHost;
pub use wallet::MultiSigWalletFactory;

const SECONDS_PER_DAY: u64 = 86_400;

pub struct ExecutionContext<'a, H: Host> {
    pub state: &'a mut GlobalState,
    pub host: &'a mut H,
    pub height: u64,
    pub timestamp: u64,
}

impl<'a, H: Host> ExecutionContext<'a, H> {
    pub fn day(&self) -> u64 {
        self.timestamp / SECONDS_PER_DAY
    }
}

/// Per-transaction call frame.
#[derive(Debug, Clone)]
pub struct Call {
    pub sender: Address,
    pub relayer: Address,
    pub value: Amount,
    pub gas_price: u64,
    pub meter: GasMeter,
    pub events: Vec<RelayEvent>,
}

impl Call {
    pub fn new(tx: &Transaction) -> Self {
        Self {
            sender: tx.sender,
            relayer: tx.target,
            value: tx.value,
            gas_price: tx.gas_price,
            meter: GasMeter::new(tx.gas_limit),
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: RelayEvent) -> Result<()> {
        self.meter.charge(EVENT_GAS)?;
        self.events.push(event);
        Ok(())
    }
}

/// Staged copies of ledger and host. Nothing reaches the live copies until `commit`.
pub struct UnitOfWork<H: Host> {
    state: GlobalState,
    host: H,
}

impl<H: Host> UnitOfWork<H> {
    pub fn begin(state: &GlobalState, host: &H) -> Self {
        Self { state: state.clone(), host: host.clone() }
    }

    pub fn context(&mut self, height: u64, timestamp: u64) -> ExecutionContext<'_, H> {
        ExecutionContext { state: &mut self.state, host: &mut self.host, height, timestamp }
    }

    pub fn commit(self, state: &mut GlobalState, host: &mut H) {
        *state = self.state;
        *host = self.host;
    }
}

pub(crate) fn relayer_ref<'s>(state: &'s GlobalState, relayer: &Address) -> Result<&'s RelayerState> {
    state
        .relayers
        .get(relayer)
        .ok_or_else(|| RelayError::UnknownRelayer(hex::encode(relayer)))
}

pub(crate) fn relayer_mut<'s>(state: &'s mut GlobalState, relayer: &Address) -> Result<&'s mut RelayerState> {
    state
        .relayers
        .get_mut(relayer)
        .ok_or_else(|| RelayError::UnknownRelayer(hex::encode(relayer)))
}

/// Validate, execute and charge a signed transaction.
///
/// A rejected transaction leaves `ctx` untouched: no nonce bump, no gas charge,
/// no collaborator side effect.
pub fn execute_transaction<H: Host>(tx: &Transaction, ctx: &mut ExecutionContext<H>) -> Result<Receipt> {
    relayer_ref(ctx.state, &tx.target)?;

    verify_signature(&tx.sender, &tx.signing_bytes(), &tx.signature)
        .map_err(|_| RelayError::InvalidSignature)?;

    let expected = ctx.state.nonce_of(&tx.sender);
    if tx.nonce != expected {
        return Err(RelayError::InvalidNonce { expected, got: tx.nonce });
    }

    let needed = tx.max_cost().ok_or(RelayError::ArithmeticOverflow)?;
    let available = ctx.state.balance_of(&tx.sender);
    if available < needed {
        return Err(RelayError::InsufficientBalance { needed, available });
    }

    if tx.value > 0 && !tx.instruction.is_payable() {
        return Err(RelayError::NotPayable(tx.instruction.name()));
    }

    let mut work = UnitOfWork::begin(ctx.state, ctx.host);
    let mut call = Call::new(tx);
    call.meter.charge(TX_BASE_GAS)?;
    {
        let mut staged = work.context(ctx.height, ctx.timestamp);
        execute_instruction(&tx.instruction, &mut call, &mut staged)?;

        let fee = (call.meter.used() as Amount)
            .checked_mul(tx.gas_price as Amount)
            .ok_or(RelayError::ArithmeticOverflow)?;
        let sender = staged.state.accounts.entry(tx.sender).or_default();
        sender.balance = sender
            .balance
            .checked_sub(fee)
            .ok_or(RelayError::InsufficientBalance { needed: fee, available: sender.balance })?;
        sender.nonce += 1;
    }
    work.commit(ctx.state, ctx.host);

    debug!(
        "{} by {} on relayer {} used {} gas",
        tx.instruction.name(),
        short_hex(&tx.sender),
        short_hex(&tx.target),
        call.meter.used()
    );

    Ok(Receipt { tx_id: tx.id(), gas_used: call.meter.used(), events: call.events })
}

pub fn execute_instruction<H: Host>(
    ix: &RelayInstruction,
    call: &mut Call,
    ctx: &mut ExecutionContext<H>,
) -> Result<()> {
    match ix {
        RelayInstruction::Register { max_gas_price, max_fee_per_claim, guaranteed_opt_out } => {
            registry::register(ctx, call, *max_gas_price, *max_fee_per_claim, *guaranteed_opt_out)
        }
        RelayInstruction::Disable => registry::disable(ctx, call),
        RelayInstruction::DisableGuaranteedAutoClaim => registry::disable_guaranteed(ctx, call),
        RelayInstruction::ApplySettings { max_gas_price, max_fee_per_claim, guaranteed_enabled, enabled } => {
            registry::apply_settings(ctx, call, *max_gas_price, *max_fee_per_claim, *guaranteed_enabled, *enabled)
        }
        RelayInstruction::WithdrawEscrow { amount } => registry::withdraw_escrow(ctx, call, *amount),
        RelayInstruction::ClaimOnBehalf { principal } => claim::claim_on_behalf(ctx, call, principal),
        RelayInstruction::ChangeFees { base, guaranteed, gas_offset_correction } => {
            registry::change_fees(ctx, call, *base, *guaranteed, *gas_offset_correction)
        }
        RelayInstruction::MigrateUser { max_gas_price, max_fee_per_claim, guaranteed_opt_out } => {
            migration::migrate_user(ctx, call, *max_gas_price, *max_fee_per_claim, *guaranteed_opt_out)
        }
    }
}
