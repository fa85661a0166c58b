//! Simulated collaborators for devnets and tests.

use std::collections::{BTreeMap, BTreeSet};

use claimlink_types::{Address, Amount, PRECISE_UNIT};
use serde::{Deserialize, Serialize};

use crate::host::{CollateralOracle, DelegateApprovals, Host, RewardPool};
use crate::wallet::MultiSigWalletFactory;

pub const DEFAULT_CLAIM_GAS: u64 = 60_000;
pub const DEFAULT_SETTLE_GAS: u64 = 40_000;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MockRewardPool {
    available: BTreeMap<Address, (Amount, Amount)>,
    pub fail_claim: bool,
    pub claim_gas: u64,
    pub claims: u64,
}

impl Default for MockRewardPool {
    fn default() -> Self {
        Self { available: BTreeMap::new(), fail_claim: false, claim_gas: DEFAULT_CLAIM_GAS, claims: 0 }
    }
}

impl MockRewardPool {
    pub fn set_available(&mut self, principal: Address, fees: Amount, rewards: Amount) {
        self.available.insert(principal, (fees, rewards));
    }
}

impl RewardPool for MockRewardPool {
    fn fees_available(&self, principal: &Address) -> (Amount, Amount) {
        self.available.get(principal).copied().unwrap_or((0, 0))
    }

    fn claim_on_behalf(&mut self, principal: &Address, _delegate: &Address) -> Result<u64, String> {
        if self.fail_claim {
            return Err("reward pool rejected the claim".into());
        }
        self.available.remove(principal);
        self.claims += 1;
        Ok(self.claim_gas)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MockDelegateApprovals {
    claim: BTreeSet<(Address, Address)>,
    burn: BTreeSet<(Address, Address)>,
}

impl MockDelegateApprovals {
    pub fn approve_claim(&mut self, principal: Address, delegate: Address) {
        self.claim.insert((principal, delegate));
    }

    pub fn approve_burn(&mut self, principal: Address, delegate: Address) {
        self.burn.insert((principal, delegate));
    }

    pub fn revoke_claim(&mut self, principal: Address, delegate: Address) {
        self.claim.remove(&(principal, delegate));
    }
}

impl DelegateApprovals for MockDelegateApprovals {
    fn can_claim_for(&self, principal: &Address, delegate: &Address) -> bool {
        self.claim.contains(&(*principal, *delegate))
    }

    fn can_burn_for(&self, principal: &Address, delegate: &Address) -> bool {
        self.burn.contains(&(*principal, *delegate))
    }
}

/// Principals without a configured ratio carry no debt.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MockCollateralOracle {
    ratios: BTreeMap<Address, u128>,
    unsettleable: BTreeSet<Address>,
    pub target: u128,
    pub fail_settle: bool,
    pub settle_gas: u64,
    pub settlements: u64,
}

impl Default for MockCollateralOracle {
    fn default() -> Self {
        Self {
            ratios: BTreeMap::new(),
            unsettleable: BTreeSet::new(),
            target: 8 * PRECISE_UNIT,
            fail_settle: false,
            settle_gas: DEFAULT_SETTLE_GAS,
            settlements: 0,
        }
    }
}

impl MockCollateralOracle {
    pub fn set_ratio(&mut self, principal: Address, ratio: u128) {
        self.ratios.insert(principal, ratio);
    }

    pub fn set_can_settle(&mut self, principal: Address, can_settle: bool) {
        if can_settle {
            self.unsettleable.remove(&principal);
        } else {
            self.unsettleable.insert(principal);
        }
    }
}

impl CollateralOracle for MockCollateralOracle {
    fn collateralization_ratio(&self, principal: &Address) -> u128 {
        self.ratios.get(principal).copied().unwrap_or(u128::MAX)
    }

    fn target_ratio(&self) -> u128 {
        self.target
    }

    fn can_settle_debt(&self, principal: &Address) -> bool {
        !self.unsettleable.contains(principal)
    }

    fn settle_debt(&mut self, principal: &Address, _delegate: &Address) -> Result<u64, String> {
        if self.fail_settle {
            return Err("debt burn reverted".into());
        }
        // Settling restores the target ratio.
        self.ratios.insert(*principal, self.target);
        self.settlements += 1;
        Ok(self.settle_gas)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MockHost {
    pub wallets: MultiSigWalletFactory,
    pub pool: MockRewardPool,
    pub approvals: MockDelegateApprovals,
    pub oracle: MockCollateralOracle,
}

impl Host for MockHost {
    type Wallets = MultiSigWalletFactory;
    type Pool = MockRewardPool;
    type Approvals = MockDelegateApprovals;
    type Oracle = MockCollateralOracle;

    fn wallets(&self) -> &Self::Wallets {
        &self.wallets
    }

    fn wallets_mut(&mut self) -> &mut Self::Wallets {
        &mut self.wallets
    }

    fn reward_pool(&self) -> &Self::Pool {
        &self.pool
    }

    fn reward_pool_mut(&mut self) -> &mut Self::Pool {
        &mut self.pool
    }

    fn approvals(&self) -> &Self::Approvals {
        &self.approvals
    }

    fn collateral(&self) -> &Self::Oracle {
        &self.oracle
    }

    fn collateral_mut(&mut self) -> &mut Self::Oracle {
        &mut self.oracle
    }
}
