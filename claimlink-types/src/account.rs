use serde::{Deserialize, Serialize};

use crate::{Address, Amount};

/// Native ledger entry for any address: principals, claimers, escrow wallets, collectors.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeAccount {
    pub nonce: u64,
    pub balance: Amount,
}

/// Per-principal configuration held by a relayer instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PrincipalAccount {
    pub escrow_wallet: Address,
    pub max_gas_price: u64,
    pub max_fee_per_claim: Amount,
    pub auto_claim_disabled: bool,
    /// Always true on base-version relayers.
    pub guaranteed_auto_claim_disabled: bool,
    /// Latched on the first disablement; the disabled counter follows this flag.
    pub ever_disabled: bool,
    /// Predecessor relayer this account was migrated from.
    pub migrated_from: Option<Address>,
    pub registered_at: u64,
}

impl PrincipalAccount {
    pub fn is_migrated(&self) -> bool {
        self.migrated_from.is_some()
    }
}

/// Append-only list of registered principals plus the running user counters.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    users: Vec<Address>,
    disabled: u64,
    migrated: u64,
}

impl Registry {
    pub fn append(&mut self, principal: Address) {
        self.users.push(principal);
    }

    pub fn record_disabled(&mut self) {
        self.disabled = self.disabled.saturating_add(1);
    }

    pub fn record_migrated(&mut self) {
        self.migrated = self.migrated.saturating_add(1);
    }

    pub fn user_at(&self, index: usize) -> Option<&Address> {
        self.users.get(index)
    }

    pub fn users(&self) -> &[Address] {
        &self.users
    }

    pub fn registered_count(&self) -> u64 {
        self.users.len() as u64
    }

    pub fn disabled_count(&self) -> u64 {
        self.disabled
    }

    pub fn migrated_count(&self) -> u64 {
        self.migrated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keeps_insertion_order() {
        let mut registry = Registry::default();
        registry.append([3u8; 32]);
        registry.append([1u8; 32]);
        registry.append([2u8; 32]);

        assert_eq!(registry.registered_count(), 3);
        assert_eq!(registry.user_at(0), Some(&[3u8; 32]));
        assert_eq!(registry.user_at(2), Some(&[2u8; 32]));
        assert_eq!(registry.user_at(3), None);
    }

    #[test]
    fn counters_start_at_zero() {
        let mut registry = Registry::default();
        assert_eq!(registry.disabled_count(), 0);
        assert_eq!(registry.migrated_count(), 0);

        registry.record_migrated();
        registry.record_disabled();
        assert_eq!(registry.migrated_count(), 1);
        assert_eq!(registry.disabled_count(), 1);
        assert_eq!(registry.registered_count(), 0);
    }
}
