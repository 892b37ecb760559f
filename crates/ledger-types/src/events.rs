//! Event types recorded by the ledger.
//!
//! Every committed state change appends one of these events to the ledger's
//! event log. Failed calls never leave an event behind.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An observable state change of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
	/// Value moved between two accounts. `from` is the zero address for the
	/// deployment mint.
	Transfer {
		from: Address,
		to: Address,
		value: U256,
	},
	/// An allowance was set, either directly or through a permit.
	Approval {
		owner: Address,
		spender: Address,
		value: U256,
	},
	/// The administrator changed. `new_owner` is zero after renouncing.
	OwnershipTransferred {
		previous_owner: Address,
		new_owner: Address,
	},
	/// The administrator pulled an asset out of the ledger's own account.
	AssetRecovered {
		asset: Address,
		recipient: Address,
		amount: U256,
	},
}

impl LedgerEvent {
	/// Short event name, as used in log lines.
	pub fn name(&self) -> &'static str {
		match self {
			LedgerEvent::Transfer { .. } => "Transfer",
			LedgerEvent::Approval { .. } => "Approval",
			LedgerEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
			LedgerEvent::AssetRecovered { .. } => "AssetRecovered",
		}
	}
}

impl fmt::Display for LedgerEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LedgerEvent::Transfer { from, to, value } => {
				write!(f, "Transfer(from={}, to={}, value={})", from, to, value)
			},
			LedgerEvent::Approval {
				owner,
				spender,
				value,
			} => write!(
				f,
				"Approval(owner={}, spender={}, value={})",
				owner, spender, value
			),
			LedgerEvent::OwnershipTransferred {
				previous_owner,
				new_owner,
			} => write!(
				f,
				"OwnershipTransferred(previous={}, new={})",
				previous_owner, new_owner
			),
			LedgerEvent::AssetRecovered {
				asset,
				recipient,
				amount,
			} => write!(
				f,
				"AssetRecovered(asset={}, recipient={}, amount={})",
				asset, recipient, amount
			),
		}
	}
}
