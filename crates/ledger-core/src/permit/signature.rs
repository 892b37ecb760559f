//! Signer recovery for permit signatures.
//!
//! Recovery is a pure function of the digest and the `(v, r, s)` triple.
//! Components outside the canonical range are rejected up front instead of
//! being handed to the curve library for a best-effort attempt.

use alloy_primitives::{Address, PrimitiveSignature, B256};
use ledger_types::{PermitSignature, SECP256K1N, SECP256K1N_HALF};
use thiserror::Error;

/// Reason a signature was rejected before recovery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureFault {
	#[error("recovery id {0} is not 27 or 28")]
	InvalidRecoveryId(u8),
	#[error("r is zero or not below the curve order")]
	InvalidR,
	#[error("s is zero or in the upper half of the curve order")]
	InvalidS,
}

/// Validates the components and returns the y-parity bit encoded in `v`.
pub fn check_canonical(sig: &PermitSignature) -> Result<bool, SignatureFault> {
	let y_parity = match sig.v {
		27 => false,
		28 => true,
		v => return Err(SignatureFault::InvalidRecoveryId(v)),
	};

	let r = sig.r_u256();
	if r.is_zero() || r >= SECP256K1N {
		return Err(SignatureFault::InvalidR);
	}

	let s = sig.s_u256();
	if s.is_zero() || s > SECP256K1N_HALF {
		return Err(SignatureFault::InvalidS);
	}

	Ok(y_parity)
}

/// Recovers the account that signed `digest`.
///
/// Returns `Ok(None)` when the components are well formed but no public key
/// can be recovered, or when recovery yields the null account. Callers must
/// treat `None` as a failed authorization, never as a valid null owner.
pub fn recover_signer(digest: &B256, sig: &PermitSignature) -> Result<Option<Address>, SignatureFault> {
	let y_parity = check_canonical(sig)?;
	let signature = PrimitiveSignature::new(sig.r_u256(), sig.s_u256(), y_parity);

	match signature.recover_address_from_prehash(digest) {
		Ok(signer) if !signer.is_zero() => Ok(Some(signer)),
		Ok(_) => Ok(None),
		Err(e) => {
			tracing::debug!(error = %e, "signature recovery failed");
			Ok(None)
		},
	}
}
