#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use claimlink_types::{FeeSchedule, TierFees};

#[derive(Arbitrary, Debug)]
struct Change {
    platform_fee: u64,
    claimer_fee: u64,
    guaranteed: Option<(u64, u64)>,
    gas_offset_correction: u32,
}

#[derive(Arbitrary, Debug)]
struct FeeInput {
    tiered: bool,
    changes: Vec<Change>,
}

fuzz_target!(|data: FeeInput| {
    let base = TierFees { platform_fee: 500_000, claimer_fee: 1_000_000 };
    let mut schedule = if data.tiered {
        FeeSchedule::tiered(base, TierFees { platform_fee: 1_000_000, claimer_fee: 2_000_000 }, 280_000)
    } else {
        FeeSchedule::base(base, 220_000)
    };

    for change in data.changes.iter().take(64) {
        let before = schedule;
        let result = schedule.change(
            TierFees { platform_fee: change.platform_fee as u128, claimer_fee: change.claimer_fee as u128 },
            change
                .guaranteed
                .map(|(p, c)| TierFees { platform_fee: p as u128, claimer_fee: c as u128 }),
            change.gas_offset_correction as u64,
        );

        if result.is_err() {
            assert_eq!(schedule, before);
            continue;
        }

        assert!(schedule.base_fees().platform_fee <= before.base_fees().platform_fee);
        assert!(schedule.base_fees().claimer_fee <= before.base_fees().claimer_fee);
        assert!(schedule.gas_offset_correction() <= before.gas_offset_correction());
        if let (Some(now), Some(prev)) = (schedule.guaranteed_fees(), before.guaranteed_fees()) {
            assert!(now.platform_fee <= prev.platform_fee);
            assert!(now.claimer_fee <= prev.claimer_fee);
        }
        assert_eq!(schedule.is_tiered(), data.tiered);
    }
});
