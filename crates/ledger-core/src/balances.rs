//! Balance ledger.
//!
//! Maps accounts to balances and keeps the running total supply. The sum of
//! all entries always equals `total_supply`; entries that drop to zero are
//! removed so the map only holds funded accounts.

use crate::LedgerError;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLedger {
	balances: HashMap<Address, U256>,
	total_supply: U256,
}

impl BalanceLedger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn balance_of(&self, account: &Address) -> U256 {
		self.balances.get(account).copied().unwrap_or(U256::ZERO)
	}

	pub fn total_supply(&self) -> U256 {
		self.total_supply
	}

	/// Iterates over every funded account.
	pub fn iter(&self) -> impl Iterator<Item = (&Address, &U256)> {
		self.balances.iter()
	}

	/// Checks every precondition of [`transfer`](Self::transfer) without
	/// mutating anything.
	pub fn ensure_transfer(&self, from: &Address, to: &Address, amount: U256) -> Result<(), LedgerError> {
		if from.is_zero() {
			return Err(LedgerError::InvalidSender(*from));
		}
		if to.is_zero() {
			return Err(LedgerError::InvalidRecipient(*to));
		}

		let balance = self.balance_of(from);
		if balance < amount {
			return Err(LedgerError::InsufficientBalance {
				account: *from,
				balance,
				needed: amount,
			});
		}

		Ok(())
	}

	/// Moves `amount` from `from` to `to`. Either the full amount moves or
	/// nothing changes.
	pub fn transfer(&mut self, from: &Address, to: &Address, amount: U256) -> Result<(), LedgerError> {
		self.ensure_transfer(from, to, amount)?;

		if from == to {
			return Ok(());
		}

		let from_balance = self.balance_of(from) - amount;
		self.set_balance(*from, from_balance);

		// cannot overflow: every balance is bounded by total_supply
		let to_balance = self.balance_of(to) + amount;
		self.set_balance(*to, to_balance);

		Ok(())
	}

	/// Credits newly issued supply to `to`, bounded by `cap`.
	pub(crate) fn mint(&mut self, to: &Address, amount: U256, cap: U256) -> Result<(), LedgerError> {
		if to.is_zero() {
			return Err(LedgerError::InvalidRecipient(*to));
		}

		let supply = self
			.total_supply
			.checked_add(amount)
			.ok_or(LedgerError::SupplyCapExceeded {
				supply: U256::MAX,
				cap,
			})?;
		if supply > cap {
			return Err(LedgerError::SupplyCapExceeded { supply, cap });
		}

		self.total_supply = supply;
		let balance = self.balance_of(to) + amount;
		self.set_balance(*to, balance);
		Ok(())
	}

	/// Verifies that the balances add up to the recorded supply.
	pub(crate) fn check_conservation(&self) -> Result<(), LedgerError> {
		let mut sum = U256::ZERO;
		for balance in self.balances.values() {
			sum = sum
				.checked_add(*balance)
				.ok_or_else(|| LedgerError::InvalidSnapshot("balance sum overflows".into()))?;
		}
		if sum != self.total_supply {
			return Err(LedgerError::InvalidSnapshot(format!(
				"balances sum to {} but total supply is {}",
				sum, self.total_supply
			)));
		}
		Ok(())
	}

	fn set_balance(&mut self, account: Address, balance: U256) {
		if balance.is_zero() {
			self.balances.remove(&account);
		} else {
			self.balances.insert(account, balance);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn funded(holder: Address, amount: u64) -> BalanceLedger {
		let mut ledger = BalanceLedger::new();
		ledger
			.mint(&holder, U256::from(amount), U256::from(u64::MAX))
			.unwrap();
		ledger
	}

	#[test]
	fn test_transfer_moves_full_amount() {
		let alice = Address::repeat_byte(0x0a);
		let bob = Address::repeat_byte(0x0b);
		let mut ledger = funded(alice, 1000);

		ledger.transfer(&alice, &bob, U256::from(400u64)).unwrap();

		assert_eq!(ledger.balance_of(&alice), U256::from(600u64));
		assert_eq!(ledger.balance_of(&bob), U256::from(400u64));
		assert_eq!(ledger.total_supply(), U256::from(1000u64));
		ledger.check_conservation().unwrap();
	}

	#[test]
	fn test_transfer_rejects_overdraft_without_changes() {
		let alice = Address::repeat_byte(0x0a);
		let bob = Address::repeat_byte(0x0b);
		let mut ledger = funded(alice, 100);
		let before = ledger.clone();

		let err = ledger.transfer(&alice, &bob, U256::from(101u64)).unwrap_err();
		assert_eq!(
			err,
			LedgerError::InsufficientBalance {
				account: alice,
				balance: U256::from(100u64),
				needed: U256::from(101u64),
			}
		);
		assert_eq!(ledger, before);
	}

	#[test]
	fn test_transfer_rejects_null_accounts() {
		let alice = Address::repeat_byte(0x0a);
		let mut ledger = funded(alice, 100);

		assert_eq!(
			ledger.transfer(&alice, &Address::ZERO, U256::from(1u64)),
			Err(LedgerError::InvalidRecipient(Address::ZERO))
		);
		assert_eq!(
			ledger.transfer(&Address::ZERO, &alice, U256::ZERO),
			Err(LedgerError::InvalidSender(Address::ZERO))
		);
	}

	#[test]
	fn test_drained_accounts_are_pruned() {
		let alice = Address::repeat_byte(0x0a);
		let bob = Address::repeat_byte(0x0b);
		let mut ledger = funded(alice, 10);

		ledger.transfer(&alice, &bob, U256::from(10u64)).unwrap();
		assert_eq!(ledger.iter().count(), 1);

		// self transfer is a no-op
		ledger.transfer(&bob, &bob, U256::from(10u64)).unwrap();
		assert_eq!(ledger.balance_of(&bob), U256::from(10u64));
	}

	#[test]
	fn test_mint_respects_cap() {
		let alice = Address::repeat_byte(0x0a);
		let mut ledger = BalanceLedger::new();

		let err = ledger
			.mint(&alice, U256::from(11u64), U256::from(10u64))
			.unwrap_err();
		assert!(matches!(err, LedgerError::SupplyCapExceeded { .. }));
		assert_eq!(ledger.total_supply(), U256::ZERO);
	}
}
