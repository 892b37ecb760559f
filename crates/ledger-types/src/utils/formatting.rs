//! String formatting utilities.
//!
//! Conversion between raw base-unit amounts and human readable decimal
//! strings.

use alloy_primitives::U256;
use thiserror::Error;

/// Formats a raw token amount with decimal places for display.
///
/// `format_token_amount("1500000000000000000", 18)` yields `"1.5"`.
pub fn format_token_amount(amount: &str, decimals: u8) -> String {
	if decimals == 0 {
		return amount.to_string();
	}

	let decimal_places = decimals as usize;

	let (integer_part, decimal_part) = if amount.len() <= decimal_places {
		let decimal_str = format!("{:0>width$}", amount, width = decimal_places);
		("0".to_string(), decimal_str)
	} else {
		let split_pos = amount.len() - decimal_places;
		(
			amount[..split_pos].to_string(),
			amount[split_pos..].to_string(),
		)
	};

	let decimal_trimmed = decimal_part.trim_end_matches('0');

	if decimal_trimmed.is_empty() {
		integer_part
	} else {
		format!("{}.{}", integer_part, decimal_trimmed)
	}
}

/// Errors raised by [`parse_token_amount`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountParseError {
	#[error("Amount is empty")]
	Empty,
	#[error("Invalid amount '{0}'")]
	Invalid(String),
	#[error("Amount '{0}' has more than {1} decimal places")]
	TooPrecise(String, u8),
	#[error("Amount '{0}' overflows uint256")]
	Overflow(String),
}

/// Parses a human readable decimal amount into base units.
///
/// `parse_token_amount("1000", 18)` yields `1000 * 10^18`.
pub fn parse_token_amount(input: &str, decimals: u8) -> Result<U256, AmountParseError> {
	let input = input.trim().replace('_', "");
	if input.is_empty() {
		return Err(AmountParseError::Empty);
	}

	let (integer_part, fraction_part) = match input.split_once('.') {
		Some((i, f)) => (i, f),
		None => (input.as_str(), ""),
	};

	let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
	if (integer_part.is_empty() && fraction_part.is_empty())
		|| !all_digits(integer_part)
		|| !all_digits(fraction_part)
	{
		return Err(AmountParseError::Invalid(input));
	}
	if fraction_part.len() > decimals as usize {
		return Err(AmountParseError::TooPrecise(input, decimals));
	}

	let digits = format!(
		"{}{:0<width$}",
		integer_part,
		fraction_part,
		width = decimals as usize
	);
	let digits = digits.trim_start_matches('0');
	if digits.is_empty() {
		return Ok(U256::ZERO);
	}

	digits
		.parse::<U256>()
		.map_err(|_| AmountParseError::Overflow(input.clone()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_format_token_amount() {
		assert_eq!(format_token_amount("1000000000000000000", 18), "1");
		assert_eq!(format_token_amount("1500000000000000000", 18), "1.5");
		assert_eq!(format_token_amount("100000000000000000", 18), "0.1");
		assert_eq!(format_token_amount("1000", 0), "1000");
		assert_eq!(
			format_token_amount("1000000000000000000000000000", 18),
			"1000000000"
		);
	}

	#[test]
	fn test_parse_token_amount() {
		let ether = U256::from(10u64).pow(U256::from(18u64));

		assert_eq!(
			parse_token_amount("1000", 18).unwrap(),
			U256::from(1000u64) * ether
		);
		assert_eq!(
			parse_token_amount("1.5", 18).unwrap(),
			U256::from(15u64) * ether / U256::from(10u64)
		);
		assert_eq!(
			parse_token_amount("1_000_000_000", 18).unwrap(),
			U256::from(1_000_000_000u64) * ether
		);
		assert_eq!(parse_token_amount("0", 18).unwrap(), U256::ZERO);
		assert_eq!(parse_token_amount(".5", 1).unwrap(), U256::from(5u64));
		assert_eq!(parse_token_amount("42", 0).unwrap(), U256::from(42u64));
	}

	#[test]
	fn test_parse_token_amount_errors() {
		assert_eq!(parse_token_amount("  ", 18), Err(AmountParseError::Empty));
		assert!(matches!(
			parse_token_amount("1e18", 18),
			Err(AmountParseError::Invalid(_))
		));
		assert!(matches!(
			parse_token_amount(".", 18),
			Err(AmountParseError::Invalid(_))
		));
		assert!(matches!(
			parse_token_amount("0.123", 2),
			Err(AmountParseError::TooPrecise(_, 2))
		));
		assert!(matches!(
			parse_token_amount(&"9".repeat(80), 0),
			Err(AmountParseError::Overflow(_))
		));
	}
}
