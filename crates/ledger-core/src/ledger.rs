//! The ledger aggregate and its direct entry points.
//!
//! `Ledger` owns the balance ledger, allowance table, nonce registry and
//! ownership record, plus the immutable metadata and domain fixed at
//! deployment. Every entry point takes `&mut self`, so calls are serialized
//! by construction and each either commits fully or returns an error with
//! no state change.

use crate::allowances::AllowanceTable;
use crate::assets::ExternalAsset;
use crate::balances::BalanceLedger;
use crate::environment::Environment;
use crate::nonces::NonceRegistry;
use crate::ownership::Ownership;
use crate::permit::DomainContext;
use crate::recovery::ReentrancyGuard;
use crate::LedgerError;
use alloy_primitives::{Address, B256, U256};
use ledger_types::LedgerEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_NAME: &str = "SpecialToken";
pub const DEFAULT_SYMBOL: &str = "SPT";
pub const DEFAULT_VERSION: &str = "1";
pub const DEFAULT_DECIMALS: u8 = 18;

/// One billion whole tokens at 18 decimals.
pub fn default_max_supply() -> U256 {
	U256::from(1_000_000_000u64) * U256::from(10u64).pow(U256::from(DEFAULT_DECIMALS))
}

/// Descriptive token data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
}

/// Parameters of the one-time deployment.
#[derive(Debug, Clone)]
pub struct DeployParams {
	pub metadata: TokenMetadata,
	/// EIP-712 domain version.
	pub version: String,
	pub max_supply: U256,
	/// Minted once to `initial_holder`. Defaults to `max_supply`.
	pub initial_supply: Option<U256>,
	pub owner: Address,
	pub initial_holder: Address,
	/// The ledger's own account.
	pub address: Address,
}

impl DeployParams {
	/// The reference deployment: the deployer administers the ledger and
	/// receives the whole capped supply.
	pub fn special_token(deployer: Address, address: Address) -> Self {
		Self {
			metadata: TokenMetadata {
				name: DEFAULT_NAME.to_string(),
				symbol: DEFAULT_SYMBOL.to_string(),
				decimals: DEFAULT_DECIMALS,
			},
			version: DEFAULT_VERSION.to_string(),
			max_supply: default_max_supply(),
			initial_supply: None,
			owner: deployer,
			initial_holder: deployer,
			address,
		}
	}
}

/// Mutable state of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
	pub balances: BalanceLedger,
	pub allowances: AllowanceTable,
	pub nonces: NonceRegistry,
	pub ownership: Ownership,
}

/// Everything needed to rebuild a ledger, minus the environment and the
/// registered external assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
	pub metadata: TokenMetadata,
	pub domain: DomainContext,
	pub max_supply: U256,
	pub state: LedgerState,
}

pub(crate) struct Checkpoint {
	state: LedgerState,
	events: usize,
}

pub struct Ledger {
	metadata: TokenMetadata,
	pub(crate) domain: DomainContext,
	pub(crate) cached_separator: B256,
	max_supply: U256,
	pub(crate) state: LedgerState,
	pub(crate) env: Arc<dyn Environment>,
	pub(crate) assets: HashMap<Address, Arc<dyn ExternalAsset>>,
	pub(crate) guard: ReentrancyGuard,
	events: Vec<LedgerEvent>,
}

impl Ledger {
	/// Creates the ledger and mints the initial supply to the initial holder.
	pub fn deploy(params: DeployParams, env: Arc<dyn Environment>) -> Result<Self, LedgerError> {
		if params.address.is_zero() {
			return Err(LedgerError::InvalidToken(params.address));
		}

		let ownership = Ownership::new(params.owner)?;
		let mut balances = BalanceLedger::new();
		let initial_supply = params.initial_supply.unwrap_or(params.max_supply);
		balances.mint(&params.initial_holder, initial_supply, params.max_supply)?;

		let domain = DomainContext {
			name: params.metadata.name.clone(),
			version: params.version,
			chain_id: env.chain_id(),
			verifying_contract: params.address,
		};

		let mut ledger = Self {
			metadata: params.metadata,
			cached_separator: domain.separator(),
			domain,
			max_supply: params.max_supply,
			state: LedgerState {
				balances,
				allowances: AllowanceTable::new(),
				nonces: NonceRegistry::new(),
				ownership,
			},
			env,
			assets: HashMap::new(),
			guard: ReentrancyGuard::default(),
			events: Vec::new(),
		};

		ledger.emit(LedgerEvent::OwnershipTransferred {
			previous_owner: Address::ZERO,
			new_owner: params.owner,
		});
		ledger.emit(LedgerEvent::Transfer {
			from: Address::ZERO,
			to: params.initial_holder,
			value: initial_supply,
		});

		tracing::info!(
			address = %ledger.address(),
			name = %ledger.metadata.name,
			chain_id = ledger.domain.chain_id,
			supply = %initial_supply,
			"ledger deployed"
		);
		Ok(ledger)
	}

	/// Rebuilds a ledger from a snapshot after checking its invariants.
	pub fn restore(snapshot: LedgerSnapshot, env: Arc<dyn Environment>) -> Result<Self, LedgerError> {
		snapshot.state.balances.check_conservation()?;
		if snapshot.state.balances.total_supply() > snapshot.max_supply {
			return Err(LedgerError::SupplyCapExceeded {
				supply: snapshot.state.balances.total_supply(),
				cap: snapshot.max_supply,
			});
		}
		if snapshot.domain.verifying_contract.is_zero() {
			return Err(LedgerError::InvalidSnapshot("ledger address is zero".into()));
		}

		Ok(Self {
			metadata: snapshot.metadata,
			cached_separator: snapshot.domain.separator(),
			domain: snapshot.domain,
			max_supply: snapshot.max_supply,
			state: snapshot.state,
			env,
			assets: HashMap::new(),
			guard: ReentrancyGuard::default(),
			events: Vec::new(),
		})
	}

	pub fn snapshot(&self) -> LedgerSnapshot {
		LedgerSnapshot {
			metadata: self.metadata.clone(),
			domain: self.domain.clone(),
			max_supply: self.max_supply,
			state: self.state.clone(),
		}
	}

	/// Makes an external asset reachable by [`recover`](Self::recover).
	pub fn register_asset(&mut self, asset: Arc<dyn ExternalAsset>) -> Result<(), LedgerError> {
		let address = asset.address();
		if address.is_zero() || address == self.address() {
			return Err(LedgerError::InvalidToken(address));
		}
		self.assets.insert(address, asset);
		Ok(())
	}

	// --- views ---

	/// The ledger's own account.
	pub fn address(&self) -> Address {
		self.domain.verifying_contract
	}

	pub fn name(&self) -> &str {
		&self.metadata.name
	}

	pub fn symbol(&self) -> &str {
		&self.metadata.symbol
	}

	pub fn decimals(&self) -> u8 {
		self.metadata.decimals
	}

	pub fn total_supply(&self) -> U256 {
		self.state.balances.total_supply()
	}

	pub fn max_supply(&self) -> U256 {
		self.max_supply
	}

	pub fn owner(&self) -> Address {
		self.state.ownership.owner()
	}

	pub fn balance_of(&self, account: &Address) -> U256 {
		self.state.balances.balance_of(account)
	}

	pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
		self.state.allowances.allowance(owner, spender)
	}

	pub fn nonces(&self, owner: &Address) -> U256 {
		self.state.nonces.current(owner)
	}

	pub fn state(&self) -> &LedgerState {
		&self.state
	}

	// --- mutations ---

	pub fn transfer(&mut self, caller: Address, to: Address, amount: U256) -> Result<bool, LedgerError> {
		self.state.balances.transfer(&caller, &to, amount)?;
		self.emit(LedgerEvent::Transfer {
			from: caller,
			to,
			value: amount,
		});
		Ok(true)
	}

	pub fn approve(&mut self, caller: Address, spender: Address, amount: U256) -> Result<bool, LedgerError> {
		self.state.allowances.approve(&caller, &spender, amount)?;
		self.emit(LedgerEvent::Approval {
			owner: caller,
			spender,
			value: amount,
		});
		Ok(true)
	}

	/// Moves `amount` from `owner` to `to` on the strength of the allowance
	/// `owner` granted to `caller`.
	pub fn transfer_from(
		&mut self,
		caller: Address,
		owner: Address,
		to: Address,
		amount: U256,
	) -> Result<bool, LedgerError> {
		self.state.allowances.ensure_spend(&owner, &caller, amount)?;
		self.state.balances.ensure_transfer(&owner, &to, amount)?;

		self.state.allowances.spend(&owner, &caller, amount)?;
		self.state.balances.transfer(&owner, &to, amount)?;
		self.emit(LedgerEvent::Transfer {
			from: owner,
			to,
			value: amount,
		});
		Ok(true)
	}

	pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<(), LedgerError> {
		let previous_owner = self.state.ownership.transfer(&caller, new_owner)?;
		tracing::info!(%previous_owner, %new_owner, "ownership transferred");
		self.emit(LedgerEvent::OwnershipTransferred {
			previous_owner,
			new_owner,
		});
		Ok(())
	}

	pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), LedgerError> {
		let previous_owner = self.state.ownership.renounce(&caller)?;
		tracing::warn!(%previous_owner, "ownership renounced");
		self.emit(LedgerEvent::OwnershipTransferred {
			previous_owner,
			new_owner: Address::ZERO,
		});
		Ok(())
	}

	// --- events ---

	pub fn events(&self) -> &[LedgerEvent] {
		&self.events
	}

	/// Drains the events recorded since the last call.
	pub fn take_events(&mut self) -> Vec<LedgerEvent> {
		std::mem::take(&mut self.events)
	}

	pub(crate) fn emit(&mut self, event: LedgerEvent) {
		tracing::debug!(event = %event, "ledger event");
		self.events.push(event);
	}

	pub(crate) fn checkpoint(&self) -> Checkpoint {
		Checkpoint {
			state: self.state.clone(),
			events: self.events.len(),
		}
	}

	pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
		self.state = checkpoint.state;
		self.events.truncate(checkpoint.events);
	}
}
