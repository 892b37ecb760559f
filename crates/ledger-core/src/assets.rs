//! External assets the recovery guard can pull out of the ledger's account.
//!
//! An external asset is another token contract. Calling its `transfer`
//! hands control to code the ledger does not trust, so the call receives a
//! mutable handle to the calling ledger and may invoke any of its entry
//! points before returning.

use crate::Ledger;
use alloy_primitives::{Address, U256};
use dashmap::DashMap;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors reported by an external asset's transfer entry point.
#[derive(Debug, Error)]
pub enum AssetError {
	#[error("Insufficient balance for {account}: balance {balance}, needed {needed}")]
	InsufficientBalance {
		account: Address,
		balance: U256,
		needed: U256,
	},
	#[error("Invalid recipient: {0}")]
	InvalidRecipient(Address),
	#[error("Call reverted: {0}")]
	Reverted(String),
}

/// Transfer interface of a token contract other than the ledger itself.
pub trait ExternalAsset: Send + Sync {
	/// Address of the asset contract.
	fn address(&self) -> Address;

	fn balance_of(&self, account: &Address) -> U256;

	/// Transfers `amount` from `caller`'s account to `to`.
	///
	/// Returns `Ok(false)` for tokens that signal failure through the return
	/// value instead of reverting.
	fn transfer(&self, caller: &mut Ledger, to: Address, amount: U256) -> Result<bool, AssetError>;
}

/// Plain in-memory token.
pub struct MemoryAsset {
	address: Address,
	balances: DashMap<Address, U256>,
}

impl MemoryAsset {
	pub fn new(address: Address) -> Self {
		Self {
			address,
			balances: DashMap::new(),
		}
	}

	/// Rebuilds an asset from previously exported holdings.
	pub fn with_balances(address: Address, balances: impl IntoIterator<Item = (Address, U256)>) -> Self {
		Self {
			address,
			balances: balances.into_iter().collect(),
		}
	}

	/// Credits `amount` to `account` out of thin air.
	pub fn mint(&self, account: Address, amount: U256) {
		*self.balances.entry(account).or_insert(U256::ZERO) += amount;
	}

	/// Non-zero holdings, ordered by account.
	pub fn balances(&self) -> BTreeMap<Address, U256> {
		self.balances
			.iter()
			.filter(|entry| !entry.value().is_zero())
			.map(|entry| (*entry.key(), *entry.value()))
			.collect()
	}
}

impl ExternalAsset for MemoryAsset {
	fn address(&self) -> Address {
		self.address
	}

	fn balance_of(&self, account: &Address) -> U256 {
		self.balances
			.get(account)
			.map(|balance| *balance)
			.unwrap_or(U256::ZERO)
	}

	fn transfer(&self, caller: &mut Ledger, to: Address, amount: U256) -> Result<bool, AssetError> {
		let from = caller.address();
		if to.is_zero() {
			return Err(AssetError::InvalidRecipient(to));
		}

		let balance = self.balance_of(&from);
		if balance < amount {
			return Err(AssetError::InsufficientBalance {
				account: from,
				balance,
				needed: amount,
			});
		}

		self.balances.insert(from, balance - amount);
		*self.balances.entry(to).or_insert(U256::ZERO) += amount;
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::*;

	const ASSET: Address = Address::repeat_byte(0x42);
	const HOLDER: Address = Address::repeat_byte(0x07);

	#[test]
	fn test_exported_balances_restore() {
		let asset = MemoryAsset::new(ASSET);
		asset.mint(LEDGER, U256::from(40u64));
		asset.mint(HOLDER, U256::from(2u64));

		let exported = asset.balances();
		assert_eq!(exported.len(), 2);

		let restored = MemoryAsset::with_balances(ASSET, exported.clone());
		assert_eq!(restored.balance_of(&LEDGER), U256::from(40u64));
		assert_eq!(restored.balances(), exported);
	}

	#[test]
	fn test_drained_accounts_are_not_exported() {
		let mut f = deploy();
		let asset = MemoryAsset::new(ASSET);
		asset.mint(LEDGER, U256::from(5u64));

		assert!(asset.transfer(&mut f.ledger, HOLDER, U256::from(5u64)).unwrap());
		assert_eq!(
			asset.balances().into_iter().collect::<Vec<_>>(),
			vec![(HOLDER, U256::from(5u64))]
		);
	}
}
