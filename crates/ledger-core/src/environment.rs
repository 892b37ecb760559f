//! Execution environment consumed by the ledger.
//!
//! The ledger never reads the wall clock or chain id on its own. It asks an
//! [`Environment`], which in production is the system clock and in tests is
//! a manually driven clock.

use std::sync::atomic::{AtomicU64, Ordering};

/// Supplies the block timestamp and chain identifier of the running chain.
pub trait Environment: Send + Sync {
	/// Current block timestamp in Unix seconds.
	fn block_timestamp(&self) -> u64;

	/// Identifier of the chain the ledger currently executes on.
	fn chain_id(&self) -> u64;
}

/// Environment backed by the system clock and a fixed chain id.
#[derive(Debug, Clone)]
pub struct SystemEnvironment {
	chain_id: u64,
}

impl SystemEnvironment {
	pub fn new(chain_id: u64) -> Self {
		Self { chain_id }
	}
}

impl Environment for SystemEnvironment {
	fn block_timestamp(&self) -> u64 {
		chrono::Utc::now().timestamp().max(0) as u64
	}

	fn chain_id(&self) -> u64 {
		self.chain_id
	}
}

/// Environment whose clock and chain id are set explicitly.
///
/// Used by tests and by deterministic replays of recorded commands.
#[derive(Debug)]
pub struct ManualEnvironment {
	timestamp: AtomicU64,
	chain_id: AtomicU64,
}

impl ManualEnvironment {
	pub fn new(timestamp: u64, chain_id: u64) -> Self {
		Self {
			timestamp: AtomicU64::new(timestamp),
			chain_id: AtomicU64::new(chain_id),
		}
	}

	pub fn set_timestamp(&self, timestamp: u64) {
		self.timestamp.store(timestamp, Ordering::SeqCst);
	}

	/// Moves the clock forward by `seconds`.
	pub fn advance(&self, seconds: u64) {
		self.timestamp.fetch_add(seconds, Ordering::SeqCst);
	}

	/// Simulates a chain fork by changing the reported chain id.
	pub fn set_chain_id(&self, chain_id: u64) {
		self.chain_id.store(chain_id, Ordering::SeqCst);
	}
}

impl Environment for ManualEnvironment {
	fn block_timestamp(&self) -> u64 {
		self.timestamp.load(Ordering::SeqCst)
	}

	fn chain_id(&self) -> u64 {
		self.chain_id.load(Ordering::SeqCst)
	}
}
