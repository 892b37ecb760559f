//! Command-line operations.
//!
//! Amounts are given in whole tokens and may carry a fractional part up to
//! the ledger's decimals, e.g. `1000` or `0.5`.

use clap::Subcommand;
use ledger_types::{Address, PermitSignature};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Deploy the ledger described by the configuration
	Deploy,
	/// Show token metadata, supply, owner and domain separator
	Info,
	/// Show the balance of an account
	Balance { account: Address },
	/// Show an account's holdings of a configured external asset
	AssetBalance { asset: Address, account: Address },
	/// Show how much `spender` may move on behalf of `owner`
	Allowance { owner: Address, spender: Address },
	/// Show the permit nonce of an account
	Nonce { account: Address },
	/// Move tokens from the signing account to `to`
	Transfer { to: Address, amount: String },
	/// Let `spender` move tokens of the signing account
	Approve { spender: Address, amount: String },
	/// Move tokens of `owner` using the signing account's allowance
	TransferFrom {
		owner: Address,
		to: Address,
		amount: String,
	},
	/// Sign a permit off-chain for the signing account and print it as JSON
	SignPermit {
		spender: Address,
		amount: String,
		/// Unix timestamp; defaults to one hour from now
		#[arg(long)]
		deadline: Option<u64>,
	},
	/// Relay a signed permit
	Permit {
		owner: Address,
		spender: Address,
		amount: String,
		deadline: u64,
		/// Packed 65-byte `r || s || v` signature in hex
		signature: PermitSignature,
	},
	/// Recover ledger tokens or a configured asset held by the ledger's own
	/// account (owner only)
	Recover {
		asset: Address,
		to: Address,
		amount: String,
	},
	/// Hand administration to another account (owner only)
	TransferOwnership { new_owner: Address },
	/// Give up administration for good (owner only)
	RenounceOwnership,
	/// Print the recorded event history
	Events,
}

impl Command {
	/// Whether the command changes ledger state and must be persisted.
	pub fn is_mutation(&self) -> bool {
		matches!(
			self,
			Command::Deploy
				| Command::Transfer { .. }
				| Command::Approve { .. }
				| Command::TransferFrom { .. }
				| Command::Permit { .. }
				| Command::Recover { .. }
				| Command::TransferOwnership { .. }
				| Command::RenounceOwnership
		)
	}
}
