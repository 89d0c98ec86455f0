//! String formatting utilities.
//!
//! Provides address normalization and truncation for log output.

/// Truncates an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 8 {
		id.to_string()
	} else {
		format!("{}..", &id[..8])
	}
}

/// Normalizes a token or user address for comparison and cache keys.
///
/// Addresses are compared case-insensitively, so the canonical form is the
/// trimmed, lower-cased string.
pub fn normalize_address(address: &str) -> String {
	address.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("0x1234"), "0x1234");
		assert_eq!(truncate_id("0x1234567890abcdef"), "0x123456..");
	}

	#[test]
	fn test_normalize_address() {
		assert_eq!(
			normalize_address(" 0xAbCdEF0123 "),
			"0xabcdef0123".to_string()
		);
	}
}
