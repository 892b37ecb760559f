//! Recovery guard.
//!
//! Lets the administrator move assets that ended up in the ledger's own
//! account to a recipient. Preconditions are checked in a fixed order, each
//! with its own error: caller, reentrancy, amount, asset, recipient, held
//! balance.
//!
//! For external assets the recovery event is recorded before the external
//! transfer is invoked. The external call may re-enter the ledger; a
//! transient lock rejects nested recoveries, and if the call fails every
//! change made since the checkpoint, including re-entrant ones, is rolled
//! back.

use crate::{Ledger, LedgerError};
use alloy_primitives::{Address, U256};
use ledger_types::LedgerEvent;

/// Transient lock held for the duration of a recovery.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
	entered: bool,
}

impl ReentrancyGuard {
	pub fn enter(&mut self) -> Result<(), LedgerError> {
		if self.entered {
			return Err(LedgerError::ReentrantCall);
		}
		self.entered = true;
		Ok(())
	}

	pub fn exit(&mut self) {
		self.entered = false;
	}

	pub fn is_entered(&self) -> bool {
		self.entered
	}
}

impl Ledger {
	/// Sends `amount` of `asset` held by the ledger's own account to
	/// `recipient`. Administrator only.
	pub fn recover(
		&mut self,
		caller: Address,
		asset: Address,
		recipient: Address,
		amount: U256,
	) -> Result<(), LedgerError> {
		self.state.ownership.only_owner(&caller)?;
		self.guard.enter()?;
		let result = self.recover_locked(asset, recipient, amount);
		self.guard.exit();

		match &result {
			Ok(()) => tracing::info!(%asset, %recipient, %amount, "asset recovered"),
			Err(e) => tracing::warn!(%asset, %recipient, %amount, error = %e, "recovery rejected"),
		}
		result
	}

	fn recover_locked(&mut self, asset: Address, recipient: Address, amount: U256) -> Result<(), LedgerError> {
		if amount.is_zero() {
			return Err(LedgerError::InvalidAmount(amount));
		}
		if asset.is_zero() {
			return Err(LedgerError::InvalidToken(asset));
		}
		if recipient.is_zero() {
			return Err(LedgerError::InvalidRecipient(recipient));
		}

		let this = self.address();
		if asset == this {
			self.state.balances.transfer(&this, &recipient, amount)?;
			self.emit(LedgerEvent::Transfer {
				from: this,
				to: recipient,
				value: amount,
			});
			self.emit(LedgerEvent::AssetRecovered {
				asset,
				recipient,
				amount,
			});
			return Ok(());
		}

		let external = self
			.assets
			.get(&asset)
			.cloned()
			.ok_or(LedgerError::UnknownAsset(asset))?;

		let held = external.balance_of(&this);
		if held < amount {
			return Err(LedgerError::InsufficientBalance {
				account: this,
				balance: held,
				needed: amount,
			});
		}

		// effects
		let checkpoint = self.checkpoint();
		self.emit(LedgerEvent::AssetRecovered {
			asset,
			recipient,
			amount,
		});

		// interaction
		let reason = match external.transfer(self, recipient, amount) {
			Ok(true) => return Ok(()),
			Ok(false) => "transfer returned false".to_string(),
			Err(e) => e.to_string(),
		};

		self.rollback(checkpoint);
		Err(LedgerError::ExternalTransferFailed { asset, reason })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{deploy, tokens, LEDGER};
	use crate::{AssetError, ExternalAsset, MemoryAsset};
	use std::sync::{Arc, Mutex};

	const OTHER: Address = Address::repeat_byte(0x42);

	/// Signals failure through its return value instead of erroring.
	struct SilentAsset;

	impl ExternalAsset for SilentAsset {
		fn address(&self) -> Address {
			OTHER
		}

		fn balance_of(&self, _account: &Address) -> U256 {
			U256::MAX
		}

		fn transfer(&self, _caller: &mut Ledger, _to: Address, _amount: U256) -> Result<bool, AssetError> {
			Ok(false)
		}
	}

	/// Calls back into the ledger from inside its transfer.
	struct ReentrantAsset {
		owner: Address,
		nested: Mutex<Option<LedgerError>>,
		fail_after: bool,
	}

	impl ExternalAsset for ReentrantAsset {
		fn address(&self) -> Address {
			OTHER
		}

		fn balance_of(&self, _account: &Address) -> U256 {
			U256::MAX
		}

		fn transfer(&self, caller: &mut Ledger, to: Address, amount: U256) -> Result<bool, AssetError> {
			let nested = caller.recover(self.owner, LEDGER, to, amount).err();
			*self.nested.lock().unwrap() = nested;

			// a plain ledger call still goes through
			let this = caller.address();
			caller
				.transfer(this, to, U256::from(1u64))
				.map_err(|e| AssetError::Reverted(e.to_string()))?;

			if self.fail_after {
				return Err(AssetError::Reverted("boom".into()));
			}
			Ok(true)
		}
	}

	fn reentrant(owner: Address, fail_after: bool) -> Arc<ReentrantAsset> {
		Arc::new(ReentrantAsset {
			owner,
			nested: Mutex::new(None),
			fail_after,
		})
	}

	#[test]
	fn test_recover_own_tokens() {
		let mut f = deploy();
		let owner = f.owner.address();
		let user1 = f.user1.address();

		f.ledger.transfer(owner, LEDGER, tokens(1000)).unwrap();
		f.ledger.take_events();

		f.ledger.recover(owner, LEDGER, user1, tokens(1000)).unwrap();

		assert_eq!(f.ledger.balance_of(&LEDGER), U256::ZERO);
		assert_eq!(f.ledger.balance_of(&user1), tokens(1000));
		assert_eq!(
			f.ledger.take_events(),
			vec![
				LedgerEvent::Transfer {
					from: LEDGER,
					to: user1,
					value: tokens(1000),
				},
				LedgerEvent::AssetRecovered {
					asset: LEDGER,
					recipient: user1,
					amount: tokens(1000),
				},
			]
		);
		assert!(!f.ledger.guard.is_entered());
	}

	#[test]
	fn test_precondition_order() {
		let mut f = deploy();
		let owner = f.owner.address();
		let user1 = f.user1.address();

		// caller is checked before anything else
		assert_eq!(
			f.ledger.recover(user1, Address::ZERO, Address::ZERO, U256::ZERO),
			Err(LedgerError::Unauthorized(user1))
		);
		assert_eq!(
			f.ledger.recover(owner, Address::ZERO, Address::ZERO, U256::ZERO),
			Err(LedgerError::InvalidAmount(U256::ZERO))
		);
		assert_eq!(
			f.ledger.recover(owner, Address::ZERO, Address::ZERO, tokens(1)),
			Err(LedgerError::InvalidToken(Address::ZERO))
		);
		assert_eq!(
			f.ledger.recover(owner, LEDGER, Address::ZERO, tokens(1)),
			Err(LedgerError::InvalidRecipient(Address::ZERO))
		);
		assert!(matches!(
			f.ledger.recover(owner, LEDGER, user1, tokens(1)),
			Err(LedgerError::InsufficientBalance { .. })
		));
		assert!(!f.ledger.guard.is_entered());
	}

	#[test]
	fn test_recover_after_ownership_change() {
		let mut f = deploy();
		let owner = f.owner.address();
		let user1 = f.user1.address();
		f.ledger.transfer(owner, LEDGER, tokens(3)).unwrap();
		f.ledger.transfer_ownership(owner, user1).unwrap();

		assert_eq!(
			f.ledger.recover(owner, LEDGER, owner, tokens(3)),
			Err(LedgerError::Unauthorized(owner))
		);
		f.ledger.recover(user1, LEDGER, user1, tokens(3)).unwrap();
		assert_eq!(f.ledger.balance_of(&user1), tokens(3));
	}

	#[test]
	fn test_recover_external_asset() {
		let mut f = deploy();
		let owner = f.owner.address();
		let user1 = f.user1.address();

		assert_eq!(
			f.ledger.recover(owner, OTHER, user1, tokens(1)),
			Err(LedgerError::UnknownAsset(OTHER))
		);

		let asset = Arc::new(MemoryAsset::new(OTHER));
		asset.mint(LEDGER, tokens(7));
		f.ledger.register_asset(asset.clone()).unwrap();

		assert!(matches!(
			f.ledger.recover(owner, OTHER, user1, tokens(8)),
			Err(LedgerError::InsufficientBalance { .. })
		));

		f.ledger.take_events();
		f.ledger.recover(owner, OTHER, user1, tokens(7)).unwrap();
		assert_eq!(asset.balance_of(&LEDGER), U256::ZERO);
		assert_eq!(asset.balance_of(&user1), tokens(7));
		assert_eq!(
			f.ledger.take_events(),
			vec![LedgerEvent::AssetRecovered {
				asset: OTHER,
				recipient: user1,
				amount: tokens(7),
			}]
		);
	}

	#[test]
	fn test_register_asset_rejects_ledger_and_null() {
		let mut f = deploy();
		assert_eq!(
			f.ledger.register_asset(Arc::new(MemoryAsset::new(LEDGER))),
			Err(LedgerError::InvalidToken(LEDGER))
		);
		assert_eq!(
			f.ledger.register_asset(Arc::new(MemoryAsset::new(Address::ZERO))),
			Err(LedgerError::InvalidToken(Address::ZERO))
		);
	}

	#[test]
	fn test_false_return_rolls_back() {
		let mut f = deploy();
		let owner = f.owner.address();
		f.ledger.register_asset(Arc::new(SilentAsset)).unwrap();
		f.ledger.take_events();

		let err = f
			.ledger
			.recover(owner, OTHER, f.user1.address(), tokens(1))
			.unwrap_err();
		assert!(matches!(err, LedgerError::ExternalTransferFailed { asset, .. } if asset == OTHER));
		assert!(f.ledger.events().is_empty());
		assert!(!f.ledger.guard.is_entered());
	}

	#[test]
	fn test_reentrant_recovery_is_rejected() {
		let mut f = deploy();
		let owner = f.owner.address();
		let user1 = f.user1.address();
		f.ledger.transfer(owner, LEDGER, tokens(10)).unwrap();

		let asset = reentrant(owner, false);
		f.ledger.register_asset(asset.clone()).unwrap();

		f.ledger.recover(owner, OTHER, user1, tokens(5)).unwrap();

		assert_eq!(*asset.nested.lock().unwrap(), Some(LedgerError::ReentrantCall));
		// only the plain transfer made from inside the call landed
		assert_eq!(f.ledger.balance_of(&LEDGER), tokens(10) - U256::from(1u64));
		assert_eq!(f.ledger.balance_of(&user1), U256::from(1u64));
		assert!(!f.ledger.guard.is_entered());

		// the lock is released, so a later recovery goes through
		f.ledger.recover(owner, LEDGER, user1, tokens(1)).unwrap();
	}

	#[test]
	fn test_failed_external_call_reverts_reentrant_effects() {
		let mut f = deploy();
		let owner = f.owner.address();
		let user1 = f.user1.address();
		f.ledger.transfer(owner, LEDGER, tokens(10)).unwrap();

		f.ledger.register_asset(reentrant(owner, true)).unwrap();
		let before = f.ledger.snapshot();
		let events = f.ledger.events().len();

		let err = f.ledger.recover(owner, OTHER, user1, tokens(5)).unwrap_err();
		assert!(matches!(err, LedgerError::ExternalTransferFailed { .. }));
		assert_eq!(f.ledger.snapshot(), before);
		assert_eq!(f.ledger.events().len(), events);
	}
}
