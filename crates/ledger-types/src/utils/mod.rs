//! Utility functions for EIP-712 encoding and amount formatting.

pub mod eip712;
pub mod formatting;

pub use eip712::{
	compute_domain_hash, compute_final_digest, compute_permit_struct_hash, Eip712AbiEncoder,
	DOMAIN_TYPE, PERMIT_TYPE,
};
pub use formatting::{format_token_amount, parse_token_amount, AmountParseError};
