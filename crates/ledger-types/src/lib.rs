//! Common types module for the permit ledger.
//!
//! This module defines the data types shared by the ledger engine, the
//! signing account, the storage layer and the command-line service, so
//! that every component agrees on addresses, signatures, events and the
//! EIP-712 encoding rules.

/// Events emitted by committed ledger state changes.
pub mod events;
/// Secure string type for private keys.
pub mod secret_string;
/// Permit signature components and parsing.
pub mod signature;
/// Storage namespaces for persisted ledger data.
pub mod storage;
/// EIP-712 encoding and amount formatting helpers.
pub mod utils;

pub use alloy_primitives::{Address, B256, U256};
pub use events::*;
pub use secret_string::SecretString;
pub use signature::{PermitSignature, SignatureParseError, SECP256K1N, SECP256K1N_HALF};
pub use storage::*;
pub use utils::{format_token_amount, parse_token_amount, AmountParseError};
