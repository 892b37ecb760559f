//! Account management for the permit ledger.
//!
//! An account is the off-chain side of a permit: it holds a signing key and
//! produces the `(v, r, s)` signature a relayer later submits to the ledger.

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use ledger_types::utils::{compute_final_digest, compute_permit_struct_hash};
use ledger_types::PermitSignature;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when interacting with the account implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Interface every account implementation provides.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Address controlled by this account.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs a 32-byte digest without any prefixing.
	async fn sign_hash(&self, hash: &B256) -> Result<PermitSignature, AccountError>;
}

/// Signature of the factory every account implementation exposes.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// A permit ready to be relayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPermit {
	pub owner: Address,
	pub spender: Address,
	pub value: U256,
	pub nonce: U256,
	pub deadline: U256,
	pub digest: B256,
	pub signature: PermitSignature,
}

/// High-level account operations over an implementation.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs a `Permit` authorizing `spender` to move `value` of this
	/// account's balance.
	///
	/// `nonce` must be the owner's current nonce on the ledger and
	/// `domain_separator` the ledger's separator for the chain the permit
	/// will be relayed on, otherwise the ledger recovers a different signer.
	pub async fn sign_permit(
		&self,
		domain_separator: &B256,
		spender: Address,
		value: U256,
		nonce: U256,
		deadline: U256,
	) -> Result<SignedPermit, AccountError> {
		let owner = self.get_address().await?;
		let struct_hash = compute_permit_struct_hash(&owner, &spender, value, nonce, deadline);
		let digest = compute_final_digest(domain_separator, &struct_hash);
		let signature = self.implementation.sign_hash(&digest).await?;

		tracing::debug!(%owner, %spender, %value, %nonce, %deadline, "signed permit");
		Ok(SignedPermit {
			owner,
			spender,
			value,
			nonce,
			deadline,
			digest,
			signature,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::local::LocalAccount;
	use alloy_primitives::address;
	use ledger_types::SecretString;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn service() -> AccountService {
		let account = LocalAccount::new(&SecretString::from(KEY)).unwrap();
		AccountService::new(Box::new(account))
	}

	#[tokio::test]
	async fn test_sign_permit_recovers_owner() {
		let service = service();
		let domain = B256::repeat_byte(0x07);
		let spender = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

		let permit = service
			.sign_permit(&domain, spender, U256::from(1000u64), U256::ZERO, U256::from(1u64))
			.await
			.unwrap();

		assert_eq!(permit.owner, address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
		assert!(permit.signature.v == 27 || permit.signature.v == 28);

		let parity = permit.signature.v == 28;
		let sig = alloy_primitives::PrimitiveSignature::new(
			permit.signature.r_u256(),
			permit.signature.s_u256(),
			parity,
		);
		assert_eq!(
			sig.recover_address_from_prehash(&permit.digest).unwrap(),
			permit.owner
		);
	}

	#[tokio::test]
	async fn test_digest_binds_every_field() {
		let service = service();
		let domain = B256::repeat_byte(0x07);
		let spender = Address::repeat_byte(0x01);

		let base = service
			.sign_permit(&domain, spender, U256::from(1u64), U256::ZERO, U256::from(9u64))
			.await
			.unwrap();
		let other_nonce = service
			.sign_permit(&domain, spender, U256::from(1u64), U256::from(1u64), U256::from(9u64))
			.await
			.unwrap();
		let other_domain = service
			.sign_permit(&B256::ZERO, spender, U256::from(1u64), U256::ZERO, U256::from(9u64))
			.await
			.unwrap();

		assert_ne!(base.digest, other_nonce.digest);
		assert_ne!(base.digest, other_domain.digest);
	}

	#[test]
	fn test_signed_permit_serializes() {
		let permit = SignedPermit {
			owner: Address::repeat_byte(0x01),
			spender: Address::repeat_byte(0x02),
			value: U256::from(5u64),
			nonce: U256::ZERO,
			deadline: U256::from(100u64),
			digest: B256::ZERO,
			signature: PermitSignature::new(27, B256::repeat_byte(1), B256::repeat_byte(2)),
		};
		let json = serde_json::to_string(&permit).unwrap();
		assert_eq!(serde_json::from_str::<SignedPermit>(&json).unwrap(), permit);
	}
}
