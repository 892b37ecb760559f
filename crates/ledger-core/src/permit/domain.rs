//! Deployment-scoping data mixed into every permit digest.

use alloy_primitives::{Address, B256};
use ledger_types::utils::compute_domain_hash;
use serde::{Deserialize, Serialize};

/// `(name, version, chain id, verifying contract)`, fixed at deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainContext {
	pub name: String,
	pub version: String,
	pub chain_id: u64,
	pub verifying_contract: Address,
}

impl DomainContext {
	/// Domain separator for the chain the ledger was deployed on.
	pub fn separator(&self) -> B256 {
		self.separator_for_chain(self.chain_id)
	}

	/// Domain separator for `chain_id`, used after a fork changes the id
	/// reported by the environment.
	pub fn separator_for_chain(&self, chain_id: u64) -> B256 {
		compute_domain_hash(&self.name, &self.version, chain_id, &self.verifying_contract)
	}
}
