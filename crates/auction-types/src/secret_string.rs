//! String wrapper for secrets such as private keys.
//!
//! The value is zeroed on drop and never printed by `Debug` or `Display`.
//! Access goes through [`SecretString::with_exposed`] so that borrowing the
//! secret is explicit at every call site.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

#[derive(Clone, Default)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(value: String) -> Self {
		Self(Zeroizing::new(value))
	}

	/// Runs `f` with the plain value.
	pub fn with_exposed<T>(&self, f: impl FnOnce(&str) -> T) -> T {
		f(self.0.as_str())
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("SecretString([REDACTED])")
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("[REDACTED]")
	}
}

impl Serialize for SecretString {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str("[REDACTED]")
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		String::deserialize(deserializer).map(Self::new)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_debug_and_display_are_redacted() {
		let secret = SecretString::from("0xdeadbeef");
		assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
		assert_eq!(format!("{}", secret), "[REDACTED]");
		secret.with_exposed(|s| assert_eq!(s, "0xdeadbeef"));
	}

	#[test]
	fn test_deserialize_from_toml() {
		#[derive(Deserialize)]
		struct Wrapper {
			key: SecretString,
		}
		let parsed: Wrapper = toml::from_str(r#"key = "0xabc""#).unwrap();
		assert!(!parsed.key.is_empty());
		parsed.key.with_exposed(|s| assert_eq!(s, "0xabc"));
	}
}
