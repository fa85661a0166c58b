use std::collections::BTreeMap;

use claimlink_types::{Address, Amount, NativeAccount};

use crate::error::{RelayError, Result};

/// Move native balance between two accounts. A zero amount is a no-op.
pub fn transfer(
    accounts: &mut BTreeMap<Address, NativeAccount>,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<()> {
    if amount == 0 || from == to {
        return Ok(());
    }
    let available = accounts.get(from).map(|a| a.balance).unwrap_or(0);
    if available < amount {
        return Err(RelayError::InsufficientBalance { needed: amount, available });
    }
    let credited = accounts
        .get(to)
        .map(|a| a.balance)
        .unwrap_or(0)
        .checked_add(amount)
        .ok_or(RelayError::ArithmeticOverflow)?;

    accounts.entry(*from).or_default().balance = available - amount;
    accounts.entry(*to).or_default().balance = credited;
    Ok(())
}
