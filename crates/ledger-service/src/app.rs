//! Wiring between configuration, storage, the signing account and the ledger.
//!
//! Each command loads the ledger record, runs one operation and, when the
//! operation changed state, writes the record back with the events it
//! emitted. Snapshot, external asset holdings and event history share one
//! storage record, so they commit together. A failed operation leaves
//! storage untouched.

use crate::commands::Command;
use alloy_primitives::{Address, U256};
use ledger_account::{AccountError, AccountService};
use ledger_config::{Config, ConfigError};
use ledger_core::{
	DeployParams, Environment, ExternalAsset, Ledger, LedgerError, LedgerSnapshot, MemoryAsset,
	TokenMetadata,
};
use ledger_storage::{StorageError, StorageService};
use ledger_types::{format_token_amount, parse_token_amount, LedgerEvent, StorageKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Lifetime of a permit signed without an explicit deadline.
pub const DEFAULT_PERMIT_LIFETIME_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum AppError {
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),
	#[error("No signing account configured")]
	NoAccount,
	#[error("Ledger {0} has not been deployed")]
	NotDeployed(Address),
	#[error("Ledger {0} is already deployed")]
	AlreadyDeployed(Address),
	#[error("Invalid input: {0}")]
	InvalidInput(String),
}

/// An event together with the block time it was committed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
	pub block_timestamp: u64,
	pub event: LedgerEvent,
}

/// Everything stored for one ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
	pub snapshot: LedgerSnapshot,
	/// Holdings of each configured external asset, by asset address.
	#[serde(default)]
	pub assets: BTreeMap<Address, BTreeMap<Address, U256>>,
	#[serde(default)]
	pub events: Vec<EventRecord>,
}

/// A configured external asset registered with the loaded ledger.
struct AssetHandle {
	symbol: String,
	decimals: u8,
	asset: Arc<MemoryAsset>,
}

/// A ledger together with the state stored next to it.
struct Session {
	ledger: Ledger,
	assets: Vec<AssetHandle>,
	history: Vec<EventRecord>,
}

pub struct LedgerApp {
	config: Config,
	storage: StorageService,
	account: Option<AccountService>,
	env: Arc<dyn Environment>,
}

impl LedgerApp {
	pub fn new(
		config: Config,
		storage: StorageService,
		account: Option<AccountService>,
		env: Arc<dyn Environment>,
	) -> Self {
		Self {
			config,
			storage,
			account,
			env,
		}
	}

	fn account(&self) -> Result<&AccountService, AppError> {
		self.account.as_ref().ok_or(AppError::NoAccount)
	}

	async fn account_address(&self) -> Result<Address, AppError> {
		Ok(self.account()?.get_address().await?)
	}

	/// Administrator of a new deployment: the configured owner, otherwise
	/// the signing account.
	async fn deployment_owner(&self) -> Result<Address, AppError> {
		match self.config.deployment.owner_address()? {
			Some(owner) => Ok(owner),
			None => self.account_address().await,
		}
	}

	/// Address of the ledger this configuration refers to.
	///
	/// Without an explicit address this is the contract address the owner's
	/// deployment transaction would create.
	pub async fn ledger_address(&self) -> Result<Address, AppError> {
		if let Some(address) = self.config.deployment.ledger_address()? {
			return Ok(address);
		}
		let owner = self.deployment_owner().await?;
		Ok(owner.create(self.config.deployment.deployer_nonce))
	}

	fn storage_id(address: &Address) -> String {
		address.to_string()
	}

	async fn load(&self, address: &Address) -> Result<Session, AppError> {
		let record: LedgerRecord = self
			.storage
			.retrieve_optional(StorageKey::Ledgers, &Self::storage_id(address))
			.await?
			.ok_or(AppError::NotDeployed(*address))?;
		let ledger = Ledger::restore(record.snapshot, self.env.clone())?;
		self.open(ledger, record.assets, record.events)
	}

	/// Registers every configured asset with the ledger. Assets without
	/// stored holdings start with their configured ledger balance.
	fn open(
		&self,
		mut ledger: Ledger,
		mut stored: BTreeMap<Address, BTreeMap<Address, U256>>,
		history: Vec<EventRecord>,
	) -> Result<Session, AppError> {
		let mut assets = Vec::with_capacity(self.config.assets.len());
		for (symbol, settings) in &self.config.assets {
			let address = settings.asset_address()?;
			let asset = match stored.remove(&address) {
				Some(balances) => MemoryAsset::with_balances(address, balances),
				None => {
					let asset = MemoryAsset::new(address);
					asset.mint(ledger.address(), settings.ledger_balance_units()?);
					asset
				},
			};
			let asset = Arc::new(asset);
			ledger.register_asset(asset.clone())?;
			tracing::debug!(%symbol, %address, "external asset registered");

			assets.push(AssetHandle {
				symbol: symbol.clone(),
				decimals: settings.decimals,
				asset,
			});
		}

		Ok(Session {
			ledger,
			assets,
			history,
		})
	}

	/// Writes the snapshot, asset holdings and the events emitted since the
	/// session was opened as one record.
	async fn persist(&self, session: &mut Session) -> Result<(), AppError> {
		let block_timestamp = self.env.block_timestamp();
		let emitted = session.ledger.take_events();
		let mut events = session.history.clone();
		events.extend(emitted.iter().cloned().map(|event| EventRecord {
			block_timestamp,
			event,
		}));

		let record = LedgerRecord {
			snapshot: session.ledger.snapshot(),
			assets: session
				.assets
				.iter()
				.map(|handle| (handle.asset.address(), handle.asset.balances()))
				.collect(),
			events,
		};
		self.storage
			.store(
				StorageKey::Ledgers,
				&Self::storage_id(&session.ledger.address()),
				&record,
			)
			.await?;

		for event in &emitted {
			tracing::info!(%event, "committed");
		}
		session.history = record.events;
		Ok(())
	}

	async fn deploy(&self) -> Result<Session, AppError> {
		let address = self.ledger_address().await?;
		if self
			.storage
			.exists(StorageKey::Ledgers, &Self::storage_id(&address))
			.await?
		{
			return Err(AppError::AlreadyDeployed(address));
		}

		let settings = &self.config.ledger;
		let owner = self.deployment_owner().await?;
		let params = DeployParams {
			metadata: TokenMetadata {
				name: settings.name.clone(),
				symbol: settings.symbol.clone(),
				decimals: settings.decimals,
			},
			version: settings.version.clone(),
			max_supply: settings.max_supply_units()?,
			initial_supply: settings.initial_supply_units()?,
			owner,
			initial_holder: self
				.config
				.deployment
				.initial_holder_address()?
				.unwrap_or(owner),
			address,
		};

		tracing::info!(
			network = %self.config.network.name,
			chain_id = self.config.network.chain_id,
			%owner,
			%address,
			"deploying ledger"
		);
		let ledger = Ledger::deploy(params, self.env.clone())?;
		self.open(ledger, BTreeMap::new(), Vec::new())
	}

	fn amount(ledger: &Ledger, input: &str) -> Result<U256, AppError> {
		parse_token_amount(input, ledger.decimals())
			.map_err(|e| AppError::InvalidInput(e.to_string()))
	}

	fn display(ledger: &Ledger, amount: U256) -> String {
		format!(
			"{} {}",
			format_token_amount(&amount.to_string(), ledger.decimals()),
			ledger.symbol()
		)
	}

	fn asset<'a>(assets: &'a [AssetHandle], address: &Address) -> Result<&'a AssetHandle, AppError> {
		assets
			.iter()
			.find(|handle| handle.asset.address() == *address)
			.ok_or_else(|| LedgerError::UnknownAsset(*address).into())
	}

	fn asset_display(handle: &AssetHandle, amount: U256) -> String {
		format!(
			"{} {}",
			format_token_amount(&amount.to_string(), handle.decimals),
			handle.symbol
		)
	}

	/// Runs one command and returns what should be printed.
	pub async fn run(&self, command: Command) -> Result<String, AppError> {
		let mut session = match command {
			Command::Deploy => self.deploy().await?,
			_ => self.load(&self.ledger_address().await?).await?,
		};

		let output = self.execute(&mut session, &command).await?;
		if command.is_mutation() {
			self.persist(&mut session).await?;
		}
		Ok(output)
	}

	async fn execute(&self, session: &mut Session, command: &Command) -> Result<String, AppError> {
		let Session {
			ledger,
			assets,
			history,
		} = session;
		let output = match command {
			Command::Deploy => format!(
				"{} ({}) deployed at {}, owner {}",
				ledger.name(),
				ledger.symbol(),
				ledger.address(),
				ledger.owner()
			),
			Command::Info => [
				format!("address:          {}", ledger.address()),
				format!("name:             {}", ledger.name()),
				format!("symbol:           {}", ledger.symbol()),
				format!("decimals:         {}", ledger.decimals()),
				format!("total supply:     {}", Self::display(ledger, ledger.total_supply())),
				format!("max supply:       {}", Self::display(ledger, ledger.max_supply())),
				format!("owner:            {}", ledger.owner()),
				format!("chain id:         {}", self.env.chain_id()),
				format!("domain separator: {}", ledger.domain_separator()),
			]
			.join("\n"),
			Command::Balance { account } => Self::display(ledger, ledger.balance_of(account)),
			Command::AssetBalance { asset, account } => {
				let handle = Self::asset(assets.as_slice(), asset)?;
				Self::asset_display(handle, handle.asset.balance_of(account))
			},
			Command::Allowance { owner, spender } => {
				Self::display(ledger, ledger.allowance(owner, spender))
			},
			Command::Nonce { account } => ledger.nonces(account).to_string(),
			Command::Transfer { to, amount } => {
				let caller = self.account_address().await?;
				let amount = Self::amount(ledger, amount)?;
				ledger.transfer(caller, *to, amount)?;
				format!("transferred {} to {}", Self::display(ledger, amount), to)
			},
			Command::Approve { spender, amount } => {
				let caller = self.account_address().await?;
				let amount = Self::amount(ledger, amount)?;
				ledger.approve(caller, *spender, amount)?;
				format!("approved {} for {}", Self::display(ledger, amount), spender)
			},
			Command::TransferFrom { owner, to, amount } => {
				let caller = self.account_address().await?;
				let amount = Self::amount(ledger, amount)?;
				ledger.transfer_from(caller, *owner, *to, amount)?;
				format!(
					"transferred {} from {} to {}",
					Self::display(ledger, amount),
					owner,
					to
				)
			},
			Command::SignPermit {
				spender,
				amount,
				deadline,
			} => {
				let owner = self.account_address().await?;
				let value = Self::amount(ledger, amount)?;
				let deadline = deadline
					.unwrap_or_else(|| self.env.block_timestamp() + DEFAULT_PERMIT_LIFETIME_SECS);
				let permit = self
					.account()?
					.sign_permit(
						&ledger.domain_separator(),
						*spender,
						value,
						ledger.nonces(&owner),
						U256::from(deadline),
					)
					.await?;
				serde_json::to_string_pretty(&permit)
					.map_err(|e| AppError::InvalidInput(e.to_string()))?
			},
			Command::Permit {
				owner,
				spender,
				amount,
				deadline,
				signature,
			} => {
				let value = Self::amount(ledger, amount)?;
				ledger.permit(
					*owner,
					*spender,
					value,
					U256::from(*deadline),
					signature.v,
					signature.r,
					signature.s,
				)?;
				format!(
					"allowance of {} for {} set to {}",
					owner,
					spender,
					Self::display(ledger, value)
				)
			},
			Command::Recover { asset, to, amount } => {
				let caller = self.account_address().await?;
				let handle = assets.iter().find(|handle| handle.asset.address() == *asset);
				let decimals = handle.map_or(ledger.decimals(), |handle| handle.decimals);
				let amount = parse_token_amount(amount, decimals)
					.map_err(|e| AppError::InvalidInput(e.to_string()))?;
				ledger.recover(caller, *asset, *to, amount)?;
				let shown = match handle {
					Some(handle) => Self::asset_display(handle, amount),
					None => Self::display(ledger, amount),
				};
				format!("recovered {} to {}", shown, to)
			},
			Command::TransferOwnership { new_owner } => {
				let caller = self.account_address().await?;
				ledger.transfer_ownership(caller, *new_owner)?;
				format!("ownership transferred to {}", new_owner)
			},
			Command::RenounceOwnership => {
				let caller = self.account_address().await?;
				ledger.renounce_ownership(caller)?;
				"ownership renounced".to_string()
			},
			Command::Events => {
				history
					.iter()
					.map(|r| format!("[{}] {}", r.block_timestamp, r.event))
					.collect::<Vec<_>>()
					.join("\n")
			},
		};
		Ok(output)
	}
}
