//! Core ledger engine.
//!
//! A capped fungible token ledger with two guarded mechanisms on top of the
//! usual transfer and approve bookkeeping:
//!
//! - **permit**: allowances granted by an EIP-712 signature that a third
//!   party relays, protected by per-owner nonces and a deadline;
//! - **recover**: administrator-only extraction of assets held by the
//!   ledger's own account, protected against reentrancy.
//!
//! The ledger runs against an [`Environment`] that supplies the block
//! timestamp and chain id, and calls out to [`ExternalAsset`]
//! implementations when recovering tokens other than itself.

pub mod allowances;
pub mod assets;
pub mod balances;
pub mod environment;
mod error;
mod ledger;
pub mod nonces;
pub mod ownership;
pub mod permit;
pub mod recovery;

pub use assets::{AssetError, ExternalAsset, MemoryAsset};
pub use environment::{Environment, ManualEnvironment, SystemEnvironment};
pub use error::LedgerError;
pub use ledger::{
	default_max_supply, DeployParams, Ledger, LedgerSnapshot, LedgerState, TokenMetadata,
	DEFAULT_DECIMALS, DEFAULT_NAME, DEFAULT_SYMBOL, DEFAULT_VERSION,
};
pub use permit::{permit_digest, DomainContext, SignatureFault};

#[cfg(test)]
pub(crate) mod test_utils {
	use super::*;
	use alloy_primitives::{address, Address, U256};
	use alloy_signer::SignerSync;
	use alloy_signer_local::PrivateKeySigner;
	use ledger_types::PermitSignature;
	use std::sync::Arc;

	pub const START: u64 = 1_700_000_000;
	pub const CHAIN_ID: u64 = 31;
	pub const LEDGER: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

	// well-known development keys
	pub const OWNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	pub const USER1_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
	pub const USER2_KEY: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

	pub struct Fixture {
		pub ledger: Ledger,
		pub env: Arc<ManualEnvironment>,
		pub owner: PrivateKeySigner,
		pub user1: PrivateKeySigner,
		pub user2: PrivateKeySigner,
	}

	pub fn signer(key: &str) -> PrivateKeySigner {
		key.parse().unwrap()
	}

	pub fn tokens(whole: u64) -> U256 {
		U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
	}

	pub fn deploy() -> Fixture {
		let env = Arc::new(ManualEnvironment::new(START, CHAIN_ID));
		let owner = signer(OWNER_KEY);
		let ledger =
			Ledger::deploy(DeployParams::special_token(owner.address(), LEDGER), env.clone()).unwrap();

		Fixture {
			ledger,
			env,
			owner,
			user1: signer(USER1_KEY),
			user2: signer(USER2_KEY),
		}
	}

	/// Signs a permit for the owner's current nonce.
	pub fn sign_permit(
		ledger: &Ledger,
		signer: &PrivateKeySigner,
		owner: Address,
		spender: Address,
		value: U256,
		deadline: U256,
	) -> PermitSignature {
		let digest = ledger.permit_digest(&owner, &spender, value, deadline);
		signer.sign_hash_sync(&digest).unwrap().into()
	}
}
