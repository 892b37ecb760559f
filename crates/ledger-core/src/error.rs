//! Error taxonomy for ledger entry points.
//!
//! Every variant aborts the triggering call with no partial state change.
//! None of them is retried by the ledger; the caller decides whether to
//! resubmit with corrected parameters.

use crate::permit::SignatureFault;
use alloy_primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
	#[error("Invalid recipient: {0}")]
	InvalidRecipient(Address),
	#[error("Invalid sender: {0}")]
	InvalidSender(Address),
	#[error("Invalid spender: {0}")]
	InvalidSpender(Address),
	#[error("Invalid approver: {0}")]
	InvalidApprover(Address),
	#[error("Invalid token: {0}")]
	InvalidToken(Address),
	#[error("Invalid amount: {0}")]
	InvalidAmount(U256),
	#[error("Insufficient balance for {account}: balance {balance}, needed {needed}")]
	InsufficientBalance {
		account: Address,
		balance: U256,
		needed: U256,
	},
	#[error("Insufficient allowance for {spender}: allowance {allowance}, needed {needed}")]
	InsufficientAllowance {
		spender: Address,
		allowance: U256,
		needed: U256,
	},
	#[error("Expired signature: deadline {deadline} is before {now}")]
	ExpiredSignature { deadline: U256, now: u64 },
	#[error("Invalid signer {signer}, expected {owner}")]
	InvalidSigner { signer: Address, owner: Address },
	#[error("Malformed signature: {0}")]
	MalformedSignature(#[from] SignatureFault),
	#[error("Nonce mismatch for {account}: current {current}, expected {expected}")]
	NonceMismatch {
		account: Address,
		current: U256,
		expected: U256,
	},
	#[error("Unauthorized account: {0}")]
	Unauthorized(Address),
	#[error("Invalid owner: {0}")]
	InvalidOwner(Address),
	#[error("Reentrant call")]
	ReentrantCall,
	#[error("Supply cap exceeded: supply {supply}, cap {cap}")]
	SupplyCapExceeded { supply: U256, cap: U256 },
	#[error("Unknown asset: {0}")]
	UnknownAsset(Address),
	#[error("External transfer of {asset} failed: {reason}")]
	ExternalTransferFailed { asset: Address, reason: String },
	#[error("Invalid snapshot: {0}")]
	InvalidSnapshot(String),
}
