//! Nonce registry.
//!
//! One counter per owner, starting at zero. `consume` is the only mutation:
//! there is no reset, decrement or override.

use crate::LedgerError;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRegistry {
	nonces: HashMap<Address, U256>,
}

impl NonceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn current(&self, owner: &Address) -> U256 {
		self.nonces.get(owner).copied().unwrap_or(U256::ZERO)
	}

	/// Advances the owner's counter from `expected` to `expected + 1`.
	pub fn consume(&mut self, owner: &Address, expected: U256) -> Result<(), LedgerError> {
		let current = self.current(owner);
		if current != expected {
			return Err(LedgerError::NonceMismatch {
				account: *owner,
				current,
				expected,
			});
		}

		// a counter only moves by one per signed permit, so this never wraps
		self.nonces.insert(*owner, current + U256::from(1u64));
		Ok(())
	}
}
