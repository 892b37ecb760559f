//! Permit signature components.
//!
//! A permit is relayed as the three ECDSA components `v`, `r` and `s`. Off
//! chain tooling usually passes them around as a single 65-byte hex string
//! laid out as `r || s || v`; this module converts between both shapes.

use alloy_primitives::{hex, uint, PrimitiveSignature, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Order of the secp256k1 group.
pub const SECP256K1N: U256 =
	uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);

/// Upper bound (inclusive) for a canonical low-s value.
pub const SECP256K1N_HALF: U256 =
	uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// Errors raised when decoding a packed signature.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureParseError {
	#[error("Invalid signature hex: {0}")]
	InvalidHex(String),
	#[error("Invalid signature length: expected 65 bytes, got {0}")]
	InvalidLength(usize),
}

/// The `(v, r, s)` triple submitted with a permit.
///
/// `v` is kept exactly as received. Whether it is an acceptable recovery
/// identifier is decided by the verifier, not by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitSignature {
	pub v: u8,
	pub r: B256,
	pub s: B256,
}

impl PermitSignature {
	pub fn new(v: u8, r: B256, s: B256) -> Self {
		Self { v, r, s }
	}

	/// Decodes a packed `r || s || v` signature.
	///
	/// A trailing `v` of 0 or 1 is shifted to 27 or 28, matching how wallets
	/// split signatures before submitting them.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureParseError> {
		if bytes.len() != 65 {
			return Err(SignatureParseError::InvalidLength(bytes.len()));
		}

		let r = B256::from_slice(&bytes[0..32]);
		let s = B256::from_slice(&bytes[32..64]);
		let v = match bytes[64] {
			v @ (0 | 1) => v + 27,
			v => v,
		};

		Ok(Self { v, r, s })
	}

	/// Packs the signature as `r || s || v`.
	pub fn to_bytes(&self) -> [u8; 65] {
		let mut out = [0u8; 65];
		out[0..32].copy_from_slice(self.r.as_slice());
		out[32..64].copy_from_slice(self.s.as_slice());
		out[64] = self.v;
		out
	}

	pub fn r_u256(&self) -> U256 {
		U256::from_be_bytes(self.r.0)
	}

	pub fn s_u256(&self) -> U256 {
		U256::from_be_bytes(self.s.0)
	}
}

impl From<PrimitiveSignature> for PermitSignature {
	fn from(sig: PrimitiveSignature) -> Self {
		Self {
			v: 27 + sig.v() as u8,
			r: B256::from(sig.r().to_be_bytes::<32>()),
			s: B256::from(sig.s().to_be_bytes::<32>()),
		}
	}
}

impl FromStr for PermitSignature {
	type Err = SignatureParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let bytes = hex::decode(s.trim()).map_err(|e| SignatureParseError::InvalidHex(e.to_string()))?;
		Self::from_bytes(&bytes)
	}
}

impl fmt::Display for PermitSignature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.to_bytes()))
	}
}
