//! Storage-related types for the ledger.

/// Storage namespaces.
///
/// Replaces string literals in storage calls with strongly typed keys. Each
/// namespace is keyed by the ledger's own address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Ledger records: snapshot, external asset holdings and event history
	Ledgers,
}

impl StorageKey {
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Ledgers => "ledgers",
		}
	}
}
