//! Seams to the systems a relayer depends on but does not own.

use claimlink_types::{Address, Amount};

/// Creates and polices escrow wallets.
pub trait WalletFactory {
    /// Deploy a wallet with the given owners and confirmation threshold.
    fn create(&mut self, owners: Vec<Address>, required: u32, daily_limit: Amount) -> Result<Address, String>;

    fn is_owner(&self, wallet: &Address, who: &Address) -> bool;

    /// Gate a single-owner withdrawal of `amount` on `day`. Does not move funds.
    fn authorize_withdrawal(&mut self, wallet: &Address, owner: &Address, amount: Amount, day: u64) -> Result<(), String>;
}

pub trait RewardPool {
    /// `(fees, rewards)` currently claimable by `principal`.
    fn fees_available(&self, principal: &Address) -> (Amount, Amount);

    /// Claim for `principal` with `delegate` as caller. Returns the gas the pool consumed.
    fn claim_on_behalf(&mut self, principal: &Address, delegate: &Address) -> Result<u64, String>;
}

pub trait DelegateApprovals {
    fn can_claim_for(&self, principal: &Address, delegate: &Address) -> bool;
    fn can_burn_for(&self, principal: &Address, delegate: &Address) -> bool;
}

/// Collateral ratios are collateral over debt in `PRECISE_UNIT` fixed point.
pub trait CollateralOracle {
    fn collateralization_ratio(&self, principal: &Address) -> u128;
    fn target_ratio(&self) -> u128;
    fn can_settle_debt(&self, principal: &Address) -> bool;
    fn settle_debt(&mut self, principal: &Address, delegate: &Address) -> Result<u64, String>;
}

/// Everything execution reaches outside the ledger.
///
/// `Clone` lets a transaction run against a staged copy that is dropped on failure.
pub trait Host: Clone {
    type Wallets: WalletFactory;
    type Pool: RewardPool;
    type Approvals: DelegateApprovals;
    type Oracle: CollateralOracle;

    fn wallets(&self) -> &Self::Wallets;
    fn wallets_mut(&mut self) -> &mut Self::Wallets;
    fn reward_pool(&self) -> &Self::Pool;
    fn reward_pool_mut(&mut self) -> &mut Self::Pool;
    fn approvals(&self) -> &Self::Approvals;
    fn collateral(&self) -> &Self::Oracle;
    fn collateral_mut(&mut self) -> &mut Self::Oracle;
}
