//! Command-line front end for the permit ledger.
//!
//! Every invocation loads the configuration, opens the configured storage
//! backend and signing account, runs a single command against the stored
//! ledger and prints the result.

use clap::Parser;
use ledger_account::implementations::local::{create_account, LocalAccount};
use ledger_account::{AccountError, AccountFactory, AccountInterface, AccountService};
use ledger_config::Config;
use ledger_core::SystemEnvironment;
use ledger_storage::implementations::file::create_storage as create_file_storage;
use ledger_storage::implementations::memory::create_storage as create_memory_storage;
use ledger_storage::{StorageError, StorageFactory, StorageInterface, StorageService};
use ledger_types::SecretString;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

mod app;
mod commands;

use app::LedgerApp;
use commands::Command;

/// Command-line arguments for the ledger service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/ledger.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Signing key, overrides the configured account
	#[arg(long, env = "LEDGER_PRIVATE_KEY", hide_env_values = true)]
	private_key: Option<String>,

	#[command(subcommand)]
	command: Command,
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

type StorageFactories = HashMap<String, StorageFactory>;
type AccountFactories = HashMap<String, AccountFactory>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Config path is not valid UTF-8: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!(
		network = %config.network.name,
		chain_id = config.network.chain_id,
		"loaded configuration"
	);

	let app = build_app(config, args.private_key.map(SecretString::from))?;
	let output = app.run(args.command).await?;
	println!("{}", output);
	Ok(())
}

/// Builds the application with the storage backend and account selected by
/// the configuration.
fn build_app(
	config: Config,
	private_key: Option<SecretString>,
) -> Result<LedgerApp, Box<dyn std::error::Error>> {
	let storage_factories = create_factory_map!(
		StorageInterface,
		StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);
	let account_factories = create_factory_map!(
		AccountInterface,
		AccountError,
		"local" => create_account,
	);

	let storage = build_storage(&config, &storage_factories)?;
	let account = match private_key {
		Some(key) => Some(AccountService::new(Box::new(LocalAccount::new(&key)?))),
		None => build_account(&config, &account_factories)?,
	};
	let env = Arc::new(SystemEnvironment::new(config.network.chain_id));

	Ok(LedgerApp::new(config, storage, account, env))
}

fn build_storage(
	config: &Config,
	factories: &StorageFactories,
) -> Result<StorageService, StorageError> {
	let name = &config.storage.primary;
	let factory = factories.get(name).ok_or_else(|| {
		StorageError::Configuration(format!("Unknown storage implementation '{}'", name))
	})?;
	let implementation_config = config
		.storage
		.implementations
		.get(name)
		.ok_or_else(|| StorageError::Configuration(format!("Missing configuration for '{}'", name)))?;

	tracing::debug!(implementation = %name, "storage backend selected");
	Ok(StorageService::new(factory(implementation_config)?))
}

fn build_account(
	config: &Config,
	factories: &AccountFactories,
) -> Result<Option<AccountService>, AccountError> {
	let Some(account) = &config.account else {
		return Ok(None);
	};

	let name = &account.primary;
	let factory = factories
		.get(name)
		.ok_or_else(|| AccountError::Implementation(format!("Unknown account implementation '{}'", name)))?;
	let implementation_config = account
		.implementations
		.get(name)
		.ok_or_else(|| AccountError::Implementation(format!("Missing configuration for '{}'", name)))?;

	Ok(Some(AccountService::new(factory(implementation_config)?)))
}
