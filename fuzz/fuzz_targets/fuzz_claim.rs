#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use claimlink_execution::{execute_instruction, Call, GasMeter, MockHost, UnitOfWork, WalletFactory};
use claimlink_types::{
    Amount, FeeSchedule, GlobalState, PrincipalAccount, RelayEvent, RelayInstruction, RelayerState, TierFees,
    PRECISE_UNIT,
};

const RELAYER: [u8; 32] = [0xa2; 32];
const COLLECTOR: [u8; 32] = [0xc0; 32];
const PRINCIPAL: [u8; 32] = [0x01; 32];
const CLAIMER: [u8; 32] = [0x02; 32];

#[derive(Arbitrary, Debug)]
struct ClaimInput {
    deposit: u64,
    max_gas_price: u64,
    max_fee_per_claim: u64,
    gas_price: u32,
    gas_limit: u32,
    ratio_tenths: u8,
    opted_out: bool,
    disabled: bool,
    approved: bool,
    burn_approved: bool,
    fail_claim: bool,
    fail_settle: bool,
}

fn total_balance(state: &GlobalState) -> Amount {
    state.accounts.values().map(|a| a.balance).sum()
}

fuzz_target!(|data: ClaimInput| {
    let mut host = MockHost::default();
    let mut state = GlobalState::default();

    let schedule = FeeSchedule::tiered(
        TierFees { platform_fee: 500_000, claimer_fee: 1_000_000 },
        TierFees { platform_fee: 1_000_000, claimer_fee: 2_000_000 },
        280_000,
    );
    let mut relayer = RelayerState::new([0u8; 32], COLLECTOR, schedule);

    let Ok(escrow_wallet) = host.wallets.create(vec![RELAYER, PRINCIPAL], 1, 0) else {
        return;
    };
    state.mint(escrow_wallet, data.deposit as Amount);
    relayer.principals.insert(
        PRINCIPAL,
        PrincipalAccount {
            escrow_wallet,
            max_gas_price: data.max_gas_price,
            max_fee_per_claim: data.max_fee_per_claim as Amount,
            auto_claim_disabled: data.disabled,
            guaranteed_auto_claim_disabled: data.opted_out,
            ever_disabled: data.disabled,
            migrated_from: None,
            registered_at: 0,
        },
    );
    relayer.registry.append(PRINCIPAL);
    state.relayers.insert(RELAYER, relayer);

    if data.approved {
        host.approvals.approve_claim(PRINCIPAL, RELAYER);
    }
    if data.burn_approved {
        host.approvals.approve_burn(PRINCIPAL, RELAYER);
    }
    host.oracle.set_ratio(PRINCIPAL, data.ratio_tenths as u128 * PRECISE_UNIT / 10);
    host.pool.fail_claim = data.fail_claim;
    host.oracle.fail_settle = data.fail_settle;
    host.pool.set_available(PRINCIPAL, 7, 11);

    let before = total_balance(&state);
    let escrow_before = state.balance_of(&escrow_wallet);

    let mut call = Call {
        sender: CLAIMER,
        relayer: RELAYER,
        value: 0,
        gas_price: data.gas_price as u64,
        meter: GasMeter::new(data.gas_limit as u64),
        events: Vec::new(),
    };
    let mut work = UnitOfWork::begin(&state, &host);
    let result = {
        let mut ctx = work.context(1, 1);
        execute_instruction(&RelayInstruction::ClaimOnBehalf { principal: PRINCIPAL }, &mut call, &mut ctx)
    };

    if result.is_ok() {
        work.commit(&mut state, &mut host);
        assert_eq!(total_balance(&state), before);

        let Some(RelayEvent::Claimed { gas_cost, claimer_fee, platform_fee, .. }) = call.events.last() else {
            panic!("claim without Claimed event");
        };
        assert!(gas_cost + claimer_fee <= data.max_fee_per_claim as Amount);
        assert_eq!(escrow_before - state.balance_of(&escrow_wallet), gas_cost + claimer_fee + platform_fee);
        assert!(data.gas_price as u64 <= data.max_gas_price);
        assert!(!data.disabled && data.approved && !data.fail_claim);
    }
});
