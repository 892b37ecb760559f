//! Single-administrator access control.

use crate::LedgerError;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
	owner: Address,
}

impl Ownership {
	pub fn new(owner: Address) -> Result<Self, LedgerError> {
		if owner.is_zero() {
			return Err(LedgerError::InvalidOwner(owner));
		}
		Ok(Self { owner })
	}

	/// Current administrator. Zero once ownership has been renounced.
	pub fn owner(&self) -> Address {
		self.owner
	}

	pub fn only_owner(&self, caller: &Address) -> Result<(), LedgerError> {
		if self.owner.is_zero() || *caller != self.owner {
			return Err(LedgerError::Unauthorized(*caller));
		}
		Ok(())
	}

	/// Hands the role to `new_owner` and returns the previous owner.
	pub fn transfer(&mut self, caller: &Address, new_owner: Address) -> Result<Address, LedgerError> {
		self.only_owner(caller)?;
		if new_owner.is_zero() {
			return Err(LedgerError::InvalidOwner(new_owner));
		}
		Ok(std::mem::replace(&mut self.owner, new_owner))
	}

	/// Leaves the ledger without an administrator.
	pub fn renounce(&mut self, caller: &Address) -> Result<Address, LedgerError> {
		self.only_owner(caller)?;
		Ok(std::mem::replace(&mut self.owner, Address::ZERO))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_transfer_and_renounce() {
		let admin = Address::repeat_byte(0x01);
		let next = Address::repeat_byte(0x02);
		let mut ownership = Ownership::new(admin).unwrap();

		assert_eq!(
			ownership.transfer(&next, next),
			Err(LedgerError::Unauthorized(next))
		);
		assert_eq!(
			ownership.transfer(&admin, Address::ZERO),
			Err(LedgerError::InvalidOwner(Address::ZERO))
		);
		assert_eq!(ownership.transfer(&admin, next), Ok(admin));
		assert_eq!(ownership.owner(), next);

		assert_eq!(ownership.renounce(&next), Ok(next));
		assert!(ownership.owner().is_zero());
		// nobody, including the null account, is owner after renouncing
		assert_eq!(
			ownership.only_owner(&Address::ZERO),
			Err(LedgerError::Unauthorized(Address::ZERO))
		);
	}

	#[test]
	fn test_rejects_null_initial_owner() {
		assert_eq!(
			Ownership::new(Address::ZERO),
			Err(LedgerError::InvalidOwner(Address::ZERO))
		);
	}
}
