//! Local private-key account.

use crate::{AccountError, AccountInterface};
use alloy_primitives::{Address, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use ledger_types::{PermitSignature, SecretString};

/// Account backed by a private key held in memory.
pub struct LocalAccount {
	signer: PrivateKeySigner,
}

impl LocalAccount {
	/// Builds the account from a hex private key, with or without `0x`.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		if private_key.is_empty() {
			return Err(AccountError::InvalidKey("private key is empty".into()));
		}

		let signer: PrivateKeySigner = private_key.with_exposed(|key| {
			key.parse()
				.map_err(|_| AccountError::InvalidKey("Invalid private key format".into()))
		})?;
		Ok(Self { signer })
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_hash(&self, hash: &B256) -> Result<PermitSignature, AccountError> {
		let signature = self
			.signer
			.sign_hash_sync(hash)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
		Ok(signature.into())
	}
}

/// Factory function to create a local account from configuration.
///
/// Configuration parameters:
/// - `private_key`: hex-encoded signing key (required)
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::InvalidKey("private_key is required".into()))?;

	let account = LocalAccount::new(&SecretString::from(private_key))?;
	Ok(Box::new(account))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_create_from_config() {
		let config: toml::Value = toml::from_str(
			r#"private_key = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d""#,
		)
		.unwrap();
		let account = create_account(&config).unwrap();

		assert_eq!(
			account.address().await.unwrap(),
			"0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
				.parse::<Address>()
				.unwrap()
		);
	}

	#[test]
	fn test_rejects_bad_keys() {
		let config = toml::Value::Table(toml::map::Map::new());
		assert!(matches!(
			create_account(&config),
			Err(AccountError::InvalidKey(_))
		));

		assert!(LocalAccount::new(&SecretString::from("")).is_err());
		assert!(LocalAccount::new(&SecretString::from("0x1234")).is_err());
	}

	#[tokio::test]
	async fn test_signatures_are_low_s() {
		let account = LocalAccount::new(&SecretString::from(
			"0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
		))
		.unwrap();

		for byte in 0u8..8 {
			let sig = account.sign_hash(&B256::repeat_byte(byte)).await.unwrap();
			assert!(sig.s_u256() <= ledger_types::SECP256K1N_HALF);
		}
	}
}
