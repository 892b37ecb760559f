//! Configuration module for the permit ledger.
//!
//! Configuration is read from TOML. String values may reference environment
//! variables as `${VAR}` or `${VAR:-default}`; the reference is replaced
//! before parsing, so secrets such as private keys stay out of the file.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

pub use loader::ConfigLoader;

use ledger_types::{parse_token_amount, Address, U256};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Token metadata and supply.
	#[serde(default)]
	pub ledger: LedgerConfig,
	/// Chain the ledger is deployed on.
	pub network: NetworkConfig,
	/// Deployment accounts.
	#[serde(default)]
	pub deployment: DeploymentConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the signing account. Only needed by commands that
	/// sign or act as an account.
	pub account: Option<AccountConfig>,
	/// Other tokens the ledger's own account may hold, keyed by symbol.
	#[serde(default)]
	pub assets: HashMap<String, AssetConfig>,
}

/// A token contract other than the ledger, recoverable by the owner.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetConfig {
	pub address: String,
	#[serde(default = "default_decimals")]
	pub decimals: u8,
	/// Whole tokens credited to the ledger's own account the first time the
	/// asset is seen. Later holdings come from storage.
	#[serde(default = "default_ledger_balance")]
	pub ledger_balance: String,
}

fn default_ledger_balance() -> String {
	"0".to_string()
}

impl AssetConfig {
	pub fn asset_address(&self) -> Result<Address, ConfigError> {
		self.address
			.parse::<Address>()
			.map_err(|e| ConfigError::Validation(format!("asset address '{}': {}", self.address, e)))
	}

	pub fn ledger_balance_units(&self) -> Result<U256, ConfigError> {
		parse_token_amount(&self.ledger_balance, self.decimals)
			.map_err(|e| ConfigError::Validation(format!("asset ledger_balance: {}", e)))
	}
}

/// Token metadata and supply.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	#[serde(default = "default_name")]
	pub name: String,
	#[serde(default = "default_symbol")]
	pub symbol: String,
	/// EIP-712 domain version.
	#[serde(default = "default_version")]
	pub version: String,
	#[serde(default = "default_decimals")]
	pub decimals: u8,
	/// Supply cap in whole tokens, e.g. `"1000000000"`.
	#[serde(default = "default_max_supply")]
	pub max_supply: String,
	/// Amount minted at deployment in whole tokens. Defaults to the cap.
	pub initial_supply: Option<String>,
}

impl Default for LedgerConfig {
	fn default() -> Self {
		Self {
			name: default_name(),
			symbol: default_symbol(),
			version: default_version(),
			decimals: default_decimals(),
			max_supply: default_max_supply(),
			initial_supply: None,
		}
	}
}

fn default_name() -> String {
	"SpecialToken".to_string()
}

fn default_symbol() -> String {
	"SPT".to_string()
}

fn default_version() -> String {
	"1".to_string()
}

fn default_decimals() -> u8 {
	18
}

fn default_max_supply() -> String {
	"1000000000".to_string()
}

impl LedgerConfig {
	/// Supply cap in base units.
	pub fn max_supply_units(&self) -> Result<U256, ConfigError> {
		parse_token_amount(&self.max_supply, self.decimals)
			.map_err(|e| ConfigError::Validation(format!("ledger.max_supply: {}", e)))
	}

	/// Initial mint in base units, if configured.
	pub fn initial_supply_units(&self) -> Result<Option<U256>, ConfigError> {
		self.initial_supply
			.as_deref()
			.map(|amount| {
				parse_token_amount(amount, self.decimals)
					.map_err(|e| ConfigError::Validation(format!("ledger.initial_supply: {}", e)))
			})
			.transpose()
	}
}

/// Chain the ledger is deployed on.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// Human readable network name, used in logs only.
	#[serde(default = "default_network_name")]
	pub name: String,
	pub chain_id: u64,
}

fn default_network_name() -> String {
	"local".to_string()
}

/// Deployment accounts. Unset addresses are derived from the signing
/// account at deploy time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeploymentConfig {
	/// Administrator. Defaults to the signing account.
	pub owner: Option<String>,
	/// Receives the initial mint. Defaults to the owner.
	pub initial_holder: Option<String>,
	/// The ledger's own address. Defaults to `CREATE(owner, deployer_nonce)`.
	pub address: Option<String>,
	#[serde(default)]
	pub deployer_nonce: u64,
}

impl DeploymentConfig {
	pub fn owner_address(&self) -> Result<Option<Address>, ConfigError> {
		parse_optional_address("deployment.owner", self.owner.as_deref())
	}

	pub fn initial_holder_address(&self) -> Result<Option<Address>, ConfigError> {
		parse_optional_address("deployment.initial_holder", self.initial_holder.as_deref())
	}

	pub fn ledger_address(&self) -> Result<Option<Address>, ConfigError> {
		parse_optional_address("deployment.address", self.address.as_deref())
	}
}

fn parse_optional_address(field: &str, value: Option<&str>) -> Result<Option<Address>, ConfigError> {
	value
		.map(|s| {
			s.parse::<Address>()
				.map_err(|e| ConfigError::Validation(format!("{}: invalid address '{}': {}", field, s, e)))
		})
		.transpose()
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}. Comment lines
/// are copied through untouched.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	for line in input.split_inclusive('\n') {
		if line.trim_start().starts_with('#') {
			result.push_str(line);
		} else {
			substitute_line(&re, line, &mut result)?;
		}
	}

	Ok(result)
}

fn substitute_line(re: &Regex, line: &str, out: &mut String) -> Result<(), ConfigError> {
	let mut last = 0;

	for cap in re.captures_iter(line) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		out.push_str(&line[last..full_match.start()]);
		out.push_str(&value);
		last = full_match.end();
	}
	out.push_str(&line[last..]);

	Ok(())
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		let ledger = &self.ledger;
		if ledger.name.trim().is_empty() {
			return Err(ConfigError::Validation("Ledger name cannot be empty".into()));
		}
		if ledger.symbol.trim().is_empty() {
			return Err(ConfigError::Validation("Ledger symbol cannot be empty".into()));
		}
		if ledger.version.trim().is_empty() {
			return Err(ConfigError::Validation("Ledger version cannot be empty".into()));
		}
		// 10^77 is the largest power of ten below 2^256
		if ledger.decimals > 77 {
			return Err(ConfigError::Validation(format!(
				"Ledger decimals must be at most 77, got {}",
				ledger.decimals
			)));
		}
		let max_supply = ledger.max_supply_units()?;
		if max_supply.is_zero() {
			return Err(ConfigError::Validation("Ledger max_supply must be greater than 0".into()));
		}
		if let Some(initial) = ledger.initial_supply_units()? {
			if initial > max_supply {
				return Err(ConfigError::Validation(format!(
					"Ledger initial_supply {} exceeds max_supply {}",
					ledger.initial_supply.as_deref().unwrap_or_default(),
					ledger.max_supply
				)));
			}
		}

		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation("Network chain_id must be greater than 0".into()));
		}

		for address in [
			self.deployment.owner_address()?,
			self.deployment.initial_holder_address()?,
			self.deployment.ledger_address()?,
		]
		.into_iter()
		.flatten()
		{
			if address.is_zero() {
				return Err(ConfigError::Validation(
					"Deployment addresses cannot be the zero address".into(),
				));
			}
		}

		let mut asset_addresses = HashSet::new();
		for (symbol, asset) in &self.assets {
			let address = asset.asset_address()?;
			if address.is_zero() {
				return Err(ConfigError::Validation(format!(
					"Asset '{}' cannot use the zero address",
					symbol
				)));
			}
			if !asset_addresses.insert(address) {
				return Err(ConfigError::Validation(format!(
					"Asset '{}' reuses address {}",
					symbol, address
				)));
			}
			asset.ledger_balance_units()?;
		}

		validate_implementations(
			"storage",
			&self.storage.primary,
			&self.storage.implementations,
		)?;
		if let Some(account) = &self.account {
			validate_implementations("account", &account.primary, &account.implementations)?;
		}

		Ok(())
	}
}

fn validate_implementations(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

/// Parses a TOML string, resolving environment variables and validating
/// the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
