use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use claimlink_crypto::{address_of, derive_address, keypair_from_seed};
use claimlink_execution::MockHost;
use claimlink_types::{Address, Amount, FeeSchedule, GlobalState, RelayerState, TierFees, ETHER, PRECISE_UNIT};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RelayerConfig {
    /// Instance name; the address is derived from it.
    pub name: String,
    pub base: TierFees,
    /// Present for tiered instances.
    #[serde(default)]
    pub guaranteed: Option<TierFees>,
    pub gas_offset_correction: u64,
    /// Name of the predecessor instance principals may migrate from.
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub escrow_daily_limit: Amount,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FundedAccount {
    /// Seed of a deterministic devnet key.
    pub seed: String,
    pub balance: Amount,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GenesisConfig {
    pub operator_seed: String,
    pub fee_collector_seed: String,
    /// Collateral target handed to the devnet oracle.
    pub target_ratio: u128,
    pub relayers: Vec<RelayerConfig>,
    pub accounts: Vec<FundedAccount>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        let tenk = |n: Amount| ETHER / 10_000 * n;
        let base = TierFees { platform_fee: tenk(5), claimer_fee: tenk(10) };
        Self {
            operator_seed: "operator".into(),
            fee_collector_seed: "fee-collector".into(),
            target_ratio: 8 * PRECISE_UNIT,
            relayers: vec![
                RelayerConfig {
                    name: "v1".into(),
                    base,
                    guaranteed: None,
                    gas_offset_correction: 220_000,
                    previous: None,
                    escrow_daily_limit: 0,
                },
                RelayerConfig {
                    name: "v2".into(),
                    base,
                    guaranteed: Some(TierFees { platform_fee: tenk(10), claimer_fee: tenk(20) }),
                    gas_offset_correction: 280_000,
                    previous: Some("v1".into()),
                    escrow_daily_limit: 0,
                },
            ],
            accounts: ["operator", "alice", "bob", "claimer"]
                .iter()
                .map(|seed| FundedAccount { seed: seed.to_string(), balance: 100 * ETHER })
                .collect(),
        }
    }
}

pub fn relayer_address(name: &str) -> Address {
    derive_address("claimlink relayer instance v1", &[name.as_bytes()])
}

pub fn seed_address(seed: &str) -> Address {
    address_of(&keypair_from_seed(seed.as_bytes()))
}

pub fn load_from_file(path: &Path) -> Result<GenesisConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read genesis config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid genesis config {}", path.display()))
}

pub fn create_genesis_state(config: &GenesisConfig) -> Result<GlobalState> {
    let operator = seed_address(&config.operator_seed);
    let fee_collector = seed_address(&config.fee_collector_seed);
    let mut state = GlobalState::default();

    let mut seen = BTreeSet::new();
    for relayer in &config.relayers {
        if !seen.insert(relayer.name.as_str()) {
            bail!("duplicate relayer instance {}", relayer.name);
        }

        let schedule = match relayer.guaranteed {
            Some(guaranteed) => FeeSchedule::tiered(relayer.base, guaranteed, relayer.gas_offset_correction),
            None => FeeSchedule::base(relayer.base, relayer.gas_offset_correction),
        };
        let mut instance = RelayerState::new(operator, fee_collector, schedule);
        instance.escrow_daily_limit = relayer.escrow_daily_limit;

        if let Some(previous) = &relayer.previous {
            if relayer.guaranteed.is_none() {
                bail!("base instance {} cannot have a predecessor", relayer.name);
            }
            if !seen.contains(previous.as_str()) || previous == &relayer.name {
                bail!("predecessor {} of {} must be declared before it", previous, relayer.name);
            }
            instance.previous_version = Some(relayer_address(previous));
        }

        state.relayers.insert(relayer_address(&relayer.name), instance);
    }

    for account in &config.accounts {
        state.mint(seed_address(&account.seed), account.balance);
    }

    Ok(state)
}

pub fn create_genesis_host(config: &GenesisConfig) -> MockHost {
    let mut host = MockHost::default();
    host.oracle.target = config.target_ratio;
    host
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_devnet_links_successor_to_predecessor() {
        let config = GenesisConfig::default();
        let state = create_genesis_state(&config).unwrap();

        let v1 = state.relayer(&relayer_address("v1")).unwrap();
        let v2 = state.relayer(&relayer_address("v2")).unwrap();
        assert!(!v1.is_tiered());
        assert!(v2.is_tiered());
        assert_eq!(v2.previous_version, Some(relayer_address("v1")));
        assert_eq!(v2.fee_schedule.gas_offset_correction(), 280_000);
        assert_eq!(v1.operator, seed_address("operator"));
        assert_eq!(state.balance_of(&seed_address("alice")), 100 * ETHER);
    }

    #[test]
    fn config_survives_json() {
        let config = GenesisConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: GenesisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn predecessor_must_exist_first() {
        let mut config = GenesisConfig::default();
        config.relayers.reverse();
        assert!(create_genesis_state(&config).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut config = GenesisConfig::default();
        let first = config.relayers[0].clone();
        config.relayers.push(first);
        assert!(create_genesis_state(&config).is_err());
    }

    #[test]
    fn host_uses_configured_target() {
        let mut config = GenesisConfig::default();
        config.target_ratio = 5 * PRECISE_UNIT;
        assert_eq!(create_genesis_host(&config).oracle.target, 5 * PRECISE_UNIT);
    }
}
