use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::account::{NativeAccount, PrincipalAccount, Registry};
use crate::fees::FeeSchedule;
use crate::{Address, Amount};

/// One deployed relayer instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RelayerState {
    /// Privileged operator allowed to lower fees.
    pub operator: Address,
    pub fee_collector: Address,
    /// Predecessor instance principals may migrate from. Tiered instances only.
    pub previous_version: Option<Address>,
    pub fee_schedule: FeeSchedule,
    /// Daily limit passed to the wallet factory for new escrow wallets.
    pub escrow_daily_limit: Amount,
    #[serde(with = "address_map")]
    pub principals: BTreeMap<Address, PrincipalAccount>,
    pub registry: Registry,
    pub total_fees_claimed: Amount,
    pub total_rewards_claimed: Amount,
}

impl RelayerState {
    pub fn new(operator: Address, fee_collector: Address, fee_schedule: FeeSchedule) -> Self {
        Self {
            operator,
            fee_collector,
            previous_version: None,
            fee_schedule,
            escrow_daily_limit: 0,
            principals: BTreeMap::new(),
            registry: Registry::default(),
            total_fees_claimed: 0,
            total_rewards_claimed: 0,
        }
    }

    pub fn is_tiered(&self) -> bool {
        self.fee_schedule.is_tiered()
    }

    pub fn is_registered(&self, principal: &Address) -> bool {
        self.principals.contains_key(principal)
    }

    pub fn principal(&self, principal: &Address) -> Option<&PrincipalAccount> {
        self.principals.get(principal)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalState {
    #[serde(with = "address_map")]
    pub accounts: BTreeMap<Address, NativeAccount>,
    #[serde(with = "address_map")]
    pub relayers: BTreeMap<Address, RelayerState>,
}

impl GlobalState {
    pub fn balance_of(&self, addr: &Address) -> Amount {
        self.accounts.get(addr).map(|a| a.balance).unwrap_or(0)
    }

    pub fn nonce_of(&self, addr: &Address) -> u64 {
        self.accounts.get(addr).map(|a| a.nonce).unwrap_or(0)
    }

    pub fn relayer(&self, addr: &Address) -> Option<&RelayerState> {
        self.relayers.get(addr)
    }

    /// Credit without a matching debit. Genesis and test fixtures only.
    pub fn mint(&mut self, addr: Address, amount: Amount) {
        let account = self.accounts.entry(addr).or_default();
        account.balance = account.balance.saturating_add(amount);
    }

    /// blake3 of the bincode encoding. Fails only if a map key cannot be encoded.
    pub fn root_hash(&self) -> Result<[u8; 32], bincode::Error> {
        let encoded = bincode::serialize(self)?;
        Ok(*blake3::hash(&encoded).as_bytes())
    }
}

/// Address-keyed maps serialize with hex keys so the state is valid JSON.
mod address_map {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    use crate::Address;

    pub fn serialize<V, S>(map: &BTreeMap<Address, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        if serializer.is_human_readable() {
            let hexed: BTreeMap<String, &V> = map.iter().map(|(k, v)| (hex::encode(k), v)).collect();
            hexed.serialize(serializer)
        } else {
            map.serialize(serializer)
        }
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<BTreeMap<Address, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let hexed = BTreeMap::<String, V>::deserialize(deserializer)?;
            hexed
                .into_iter()
                .map(|(k, v)| {
                    let bytes = hex::decode(&k).map_err(D::Error::custom)?;
                    let addr: Address = bytes
                        .try_into()
                        .map_err(|_| D::Error::custom("address must be 32 bytes"))?;
                    Ok((addr, v))
                })
                .collect()
        } else {
            BTreeMap::<Address, V>::deserialize(deserializer)
        }
    }
}
