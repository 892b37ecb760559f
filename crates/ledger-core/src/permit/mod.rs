//! Signature authorization engine.
//!
//! An owner grants an allowance without sending a transaction by signing an
//! EIP-712 `Permit` message that a third party relays. The message is bound
//! to the deployment's domain, to the owner's current nonce and to a
//! deadline:
//!
//! 1. `now > deadline` fails with `ExpiredSignature` (`now == deadline` passes).
//! 2. The nonce is always read from the registry; the relayer cannot pick it.
//! 3. The digest is `keccak256(0x1901 || domainSeparator || structHash)`.
//! 4. The recovered signer must be the owner and never the null account.
//! 5. Nonce consumption and the approval commit together or not at all.

mod domain;
mod signature;

pub use domain::DomainContext;
pub use signature::{check_canonical, recover_signer, SignatureFault};

use crate::{Ledger, LedgerError};
use alloy_primitives::{Address, B256, U256};
use ledger_types::utils::{compute_final_digest, compute_permit_struct_hash};
use ledger_types::{LedgerEvent, PermitSignature};

/// Builds the digest an owner signs to authorize `spender`.
pub fn permit_digest(
	domain_separator: &B256,
	owner: &Address,
	spender: &Address,
	value: U256,
	nonce: U256,
	deadline: U256,
) -> B256 {
	let struct_hash = compute_permit_struct_hash(owner, spender, value, nonce, deadline);
	compute_final_digest(domain_separator, &struct_hash)
}

impl Ledger {
	/// EIP-712 domain separator for the chain currently reported by the
	/// environment. Recomputed only when that chain differs from the
	/// deployment chain.
	pub fn domain_separator(&self) -> B256 {
		let chain_id = self.env.chain_id();
		if chain_id == self.domain.chain_id {
			self.cached_separator
		} else {
			self.domain.separator_for_chain(chain_id)
		}
	}

	pub fn domain(&self) -> &DomainContext {
		&self.domain
	}

	/// Digest for a permit bound to the owner's current nonce.
	pub fn permit_digest(&self, owner: &Address, spender: &Address, value: U256, deadline: U256) -> B256 {
		let nonce = self.state.nonces.current(owner);
		permit_digest(&self.domain_separator(), owner, spender, value, nonce, deadline)
	}

	/// Sets `allowance(owner, spender) = value` on the strength of the
	/// owner's signature `(v, r, s)`.
	#[allow(clippy::too_many_arguments)]
	pub fn permit(
		&mut self,
		owner: Address,
		spender: Address,
		value: U256,
		deadline: U256,
		v: u8,
		r: B256,
		s: B256,
	) -> Result<(), LedgerError> {
		self.permit_with_signature(owner, spender, value, deadline, &PermitSignature::new(v, r, s))
	}

	/// Same as [`permit`](Self::permit) with the components already packed.
	pub fn permit_with_signature(
		&mut self,
		owner: Address,
		spender: Address,
		value: U256,
		deadline: U256,
		signature: &PermitSignature,
	) -> Result<(), LedgerError> {
		let now = self.env.block_timestamp();
		if U256::from(now) > deadline {
			return Err(LedgerError::ExpiredSignature { deadline, now });
		}

		let nonce = self.state.nonces.current(&owner);
		let digest = permit_digest(
			&self.domain_separator(),
			&owner,
			&spender,
			value,
			nonce,
			deadline,
		);

		let signer = recover_signer(&digest, signature)?.ok_or(LedgerError::InvalidSigner {
			signer: Address::ZERO,
			owner,
		})?;
		if signer != owner {
			tracing::debug!(%owner, %signer, "permit signed by another account");
			return Err(LedgerError::InvalidSigner { signer, owner });
		}

		// Check the approval before burning the nonce so both land together.
		self.state.allowances.ensure_approve(&owner, &spender)?;
		self.state.nonces.consume(&owner, nonce)?;
		self.state.allowances.approve(&owner, &spender, value)?;

		tracing::info!(%owner, %spender, %value, %nonce, "permit accepted");
		self.emit(LedgerEvent::Approval {
			owner,
			spender,
			value,
		});
		Ok(())
	}
}
