//! Signing key material.
//!
//! Permit signing keys arrive from configuration, the `LEDGER_PRIVATE_KEY`
//! environment variable or the command line, often with a trailing newline.
//! The key is trimmed on the way in, zeroed when dropped and never shown in
//! logs or error messages.

use std::fmt;
use zeroize::Zeroizing;

/// Secret text that is zeroed on drop and never printed.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(s: String) -> Self {
		let raw = Zeroizing::new(s);
		Self(Zeroizing::new(raw.trim().to_string()))
	}

	/// Runs `f` against the secret without handing out a longer-lived borrow.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SecretString").field(&"<redacted>").finish()
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("<redacted>")
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	#[test]
	fn test_key_never_printed() {
		let secret = SecretString::from(KEY);
		let shown = format!("{:?} {}", secret, secret);
		assert!(!shown.contains("ac0974"));
		assert_eq!(shown, "SecretString(\"<redacted>\") <redacted>");
	}

	#[test]
	fn test_key_is_trimmed() {
		let secret = SecretString::from(format!("  {}\n", KEY));
		secret.with_exposed(|key| assert_eq!(key, KEY));

		assert!(!secret.is_empty());
		assert!(SecretString::from(" \n").is_empty());
	}
}
