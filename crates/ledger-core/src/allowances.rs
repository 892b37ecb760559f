//! Allowance table.
//!
//! `(owner, spender) -> amount`, defaulting to zero. Approvals overwrite,
//! spends decrement. There is no unlimited sentinel: an allowance of
//! `U256::MAX` is decremented like any other.

use crate::LedgerError;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceTable {
	allowances: HashMap<Address, HashMap<Address, U256>>,
}

impl AllowanceTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
		self.allowances
			.get(owner)
			.and_then(|spenders| spenders.get(spender))
			.copied()
			.unwrap_or(U256::ZERO)
	}

	/// Sets the allowance to exactly `amount`.
	pub fn approve(&mut self, owner: &Address, spender: &Address, amount: U256) -> Result<(), LedgerError> {
		self.ensure_approve(owner, spender)?;
		self.set(*owner, *spender, amount);
		Ok(())
	}

	pub fn ensure_approve(&self, owner: &Address, spender: &Address) -> Result<(), LedgerError> {
		if owner.is_zero() {
			return Err(LedgerError::InvalidApprover(*owner));
		}
		if spender.is_zero() {
			return Err(LedgerError::InvalidSpender(*spender));
		}
		Ok(())
	}

	pub fn ensure_spend(&self, owner: &Address, spender: &Address, amount: U256) -> Result<(), LedgerError> {
		let allowance = self.allowance(owner, spender);
		if allowance < amount {
			return Err(LedgerError::InsufficientAllowance {
				spender: *spender,
				allowance,
				needed: amount,
			});
		}
		Ok(())
	}

	/// Decrements the allowance by `amount`.
	pub fn spend(&mut self, owner: &Address, spender: &Address, amount: U256) -> Result<(), LedgerError> {
		self.ensure_spend(owner, spender, amount)?;
		let remaining = self.allowance(owner, spender) - amount;
		self.set(*owner, *spender, remaining);
		Ok(())
	}

	fn set(&mut self, owner: Address, spender: Address, amount: U256) {
		if amount.is_zero() {
			if let Some(spenders) = self.allowances.get_mut(&owner) {
				spenders.remove(&spender);
				if spenders.is_empty() {
					self.allowances.remove(&owner);
				}
			}
		} else {
			self.allowances
				.entry(owner)
				.or_default()
				.insert(spender, amount);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const OWNER: Address = Address::repeat_byte(0x01);
	const SPENDER: Address = Address::repeat_byte(0x02);

	#[test]
	fn test_approve_overwrites() {
		let mut table = AllowanceTable::new();
		table.approve(&OWNER, &SPENDER, U256::from(100u64)).unwrap();
		table.approve(&OWNER, &SPENDER, U256::from(30u64)).unwrap();
		assert_eq!(table.allowance(&OWNER, &SPENDER), U256::from(30u64));

		table.approve(&OWNER, &SPENDER, U256::ZERO).unwrap();
		assert_eq!(table, AllowanceTable::new());
	}

	#[test]
	fn test_approve_rejects_null_accounts() {
		let mut table = AllowanceTable::new();
		assert_eq!(
			table.approve(&OWNER, &Address::ZERO, U256::from(1u64)),
			Err(LedgerError::InvalidSpender(Address::ZERO))
		);
		assert_eq!(
			table.approve(&Address::ZERO, &SPENDER, U256::from(1u64)),
			Err(LedgerError::InvalidApprover(Address::ZERO))
		);
	}

	#[test]
	fn test_spend_decrements() {
		let mut table = AllowanceTable::new();
		table.approve(&OWNER, &SPENDER, U256::from(100u64)).unwrap();

		table.spend(&OWNER, &SPENDER, U256::from(60u64)).unwrap();
		assert_eq!(table.allowance(&OWNER, &SPENDER), U256::from(40u64));

		let err = table.spend(&OWNER, &SPENDER, U256::from(41u64)).unwrap_err();
		assert_eq!(
			err,
			LedgerError::InsufficientAllowance {
				spender: SPENDER,
				allowance: U256::from(40u64),
				needed: U256::from(41u64),
			}
		);
		assert_eq!(table.allowance(&OWNER, &SPENDER), U256::from(40u64));
	}

	#[test]
	fn test_max_allowance_is_not_unlimited() {
		let mut table = AllowanceTable::new();
		table.approve(&OWNER, &SPENDER, U256::MAX).unwrap();
		table.spend(&OWNER, &SPENDER, U256::from(1u64)).unwrap();
		assert_eq!(table.allowance(&OWNER, &SPENDER), U256::MAX - U256::from(1u64));
	}
}
