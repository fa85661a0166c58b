//! In-process multi-signature wallet factory with a daily withdrawal limit.

use std::collections::BTreeMap;

use claimlink_crypto::derive_address;
use claimlink_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::host::WalletFactory;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MultiSigWallet {
    pub owners: Vec<Address>,
    pub required: u32,
    pub daily_limit: Amount,
    spent_today: Amount,
    last_day: u64,
}

impl MultiSigWallet {
    fn is_owner(&self, who: &Address) -> bool {
        self.owners.contains(who)
    }

    /// Amount a single owner may still move today.
    pub fn remaining_today(&self, day: u64) -> Amount {
        if day > self.last_day {
            self.daily_limit
        } else {
            self.daily_limit.saturating_sub(self.spent_today)
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSigWalletFactory {
    created: u64,
    wallets: BTreeMap<Address, MultiSigWallet>,
}

impl MultiSigWalletFactory {
    pub fn wallet(&self, address: &Address) -> Option<&MultiSigWallet> {
        self.wallets.get(address)
    }

    pub fn created(&self) -> u64 {
        self.created
    }
}

impl WalletFactory for MultiSigWalletFactory {
    fn create(&mut self, owners: Vec<Address>, required: u32, daily_limit: Amount) -> Result<Address, String> {
        if owners.is_empty() {
            return Err("wallet needs at least one owner".into());
        }
        if required == 0 || required as usize > owners.len() {
            return Err(format!("invalid requirement {} for {} owners", required, owners.len()));
        }
        for (i, owner) in owners.iter().enumerate() {
            if owners[..i].contains(owner) {
                return Err(format!("duplicate owner {}", hex::encode(owner)));
            }
        }

        let nonce = self.created.to_le_bytes();
        let mut parts: Vec<&[u8]> = vec![&nonce];
        parts.extend(owners.iter().map(|o| o.as_slice()));
        let address = derive_address("claimlink escrow wallet v1", &parts);

        self.wallets.insert(
            address,
            MultiSigWallet { owners, required, daily_limit, spent_today: 0, last_day: 0 },
        );
        self.created += 1;
        Ok(address)
    }

    fn is_owner(&self, wallet: &Address, who: &Address) -> bool {
        self.wallets.get(wallet).map(|w| w.is_owner(who)).unwrap_or(false)
    }

    fn authorize_withdrawal(&mut self, wallet: &Address, owner: &Address, amount: Amount, day: u64) -> Result<(), String> {
        let wallet = self.wallets.get_mut(wallet).ok_or_else(|| "unknown wallet".to_string())?;
        if !wallet.is_owner(owner) {
            return Err("caller is not an owner".into());
        }
        if wallet.required <= 1 {
            return Ok(());
        }

        if day > wallet.last_day {
            wallet.last_day = day;
            wallet.spent_today = 0;
        }
        let spent = wallet.spent_today.saturating_add(amount);
        if spent > wallet.daily_limit {
            return Err(format!(
                "daily limit exceeded: {} remaining, {} requested",
                wallet.daily_limit.saturating_sub(wallet.spent_today),
                amount
            ));
        }
        wallet.spent_today = spent;
        Ok(())
    }
}
