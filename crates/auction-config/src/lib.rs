//! Configuration module for the auction client.
//!
//! Configuration is a TOML document. Any string may reference environment
//! variables as `${VAR}` or `${VAR:-default}`; they are resolved before the
//! document is parsed, so secrets such as private keys can stay out of the
//! file.

use auction_types::{Address, SecretString};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Wallet implementations known to the client.
pub const WALLET_IMPLEMENTATIONS: [&str; 2] = ["rpc", "local"];

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
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Chain endpoint.
	pub network: NetworkConfig,
	/// The deployed auction contract. Only `deploy` works without it.
	#[serde(default)]
	pub contract: Option<ContractConfig>,
	#[serde(default)]
	pub wallet: WalletConfig,
	/// Where the session is remembered between runs.
	#[serde(default)]
	pub storage: StorageConfig,
	#[serde(default)]
	pub client: ClientConfig,
	#[serde(default)]
	pub deploy: Option<DeployConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// HTTP endpoint of the wallet or node.
	pub rpc_url: String,
	/// Expected chain id. A wallet on another chain is reported, not refused.
	#[serde(default)]
	pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractConfig {
	pub address: Address,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WalletConfig {
	/// `rpc` or `local`.
	#[serde(default = "default_wallet_implementation")]
	pub implementation: String,
	/// Private key for the `local` wallet.
	#[serde(default, skip_serializing)]
	pub private_key: Option<SecretString>,
	/// Interval between account/chain polls of the `rpc` wallet.
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
}

impl Default for WalletConfig {
	fn default() -> Self {
		Self {
			implementation: default_wallet_implementation(),
			private_key: None,
			poll_interval_ms: default_poll_interval_ms(),
		}
	}
}

impl WalletConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}
}

fn default_wallet_implementation() -> String {
	"rpc".to_string()
}

fn default_poll_interval_ms() -> u64 {
	2_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Storage implementation name.
	#[serde(default = "default_storage_implementation")]
	pub implementation: String,
	/// Location of the session file for the `file` implementation.
	#[serde(default = "default_storage_path")]
	pub path: String,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			implementation: default_storage_implementation(),
			path: default_storage_path(),
		}
	}
}

fn default_storage_implementation() -> String {
	"file".to_string()
}

fn default_storage_path() -> String {
	"./data/session.json".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
	/// Number of auctions fetched concurrently.
	#[serde(default = "default_read_batch_size")]
	pub read_batch_size: usize,
	/// Gas limit attached to bids.
	#[serde(default = "default_bid_gas_limit")]
	pub bid_gas_limit: u64,
	/// Upper bound on waiting for a receipt. Unset waits indefinitely.
	#[serde(default)]
	pub confirmation_timeout_seconds: Option<u64>,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			read_batch_size: default_read_batch_size(),
			bid_gas_limit: default_bid_gas_limit(),
			confirmation_timeout_seconds: None,
		}
	}
}

impl ClientConfig {
	pub fn confirmation_timeout(&self) -> Option<Duration> {
		self.confirmation_timeout_seconds.map(Duration::from_secs)
	}
}

fn default_read_batch_size() -> usize {
	10
}

fn default_bid_gas_limit() -> u64 {
	500_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeployConfig {
	/// Path of the compiled contract artifact (Hardhat or Foundry JSON).
	pub artifact: String,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {e}")))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match (std::env::var(var_name.as_str()), default_value) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)))
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}

	result.push_str(&input[last..]);
	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		tracing::debug!(path = %path.display(), "Loading configuration");
		let contents = tokio::fs::read_to_string(path).await?;
		contents.parse()
	}

	/// The configured contract address, required by every contract command.
	pub fn contract_address(&self) -> Result<Address, ConfigError> {
		self.contract
			.as_ref()
			.map(|contract| contract.address)
			.ok_or_else(|| ConfigError::Validation("contract.address is not configured".into()))
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// - RPC URL is not empty
	/// - Contract address, when present, is not the zero address
	/// - Wallet implementation is known and `local` has a private key
	/// - Poll interval and read batch size are positive
	fn validate(&self) -> Result<(), ConfigError> {
		if self.network.rpc_url.trim().is_empty() {
			return Err(ConfigError::Validation("network.rpc_url cannot be empty".into()));
		}

		if let Some(contract) = &self.contract {
			if contract.address.is_zero() {
				return Err(ConfigError::Validation(
					"contract.address cannot be the zero address".into(),
				));
			}
		}

		if !WALLET_IMPLEMENTATIONS.contains(&self.wallet.implementation.as_str()) {
			return Err(ConfigError::Validation(format!(
				"Unknown wallet implementation '{}' (expected one of: {})",
				self.wallet.implementation,
				WALLET_IMPLEMENTATIONS.join(", ")
			)));
		}
		if self.wallet.implementation == "local"
			&& self
				.wallet
				.private_key
				.as_ref()
				.is_none_or(|key| key.is_empty())
		{
			return Err(ConfigError::Validation(
				"wallet.private_key is required for the local wallet".into(),
			));
		}
		if self.wallet.poll_interval_ms == 0 {
			return Err(ConfigError::Validation(
				"wallet.poll_interval_ms must be greater than 0".into(),
			));
		}

		if self.storage.implementation.trim().is_empty() {
			return Err(ConfigError::Validation(
				"storage.implementation cannot be empty".into(),
			));
		}

		if self.client.read_batch_size == 0 {
			return Err(ConfigError::Validation(
				"client.read_batch_size must be greater than 0".into(),
			));
		}
		if self.client.bid_gas_limit == 0 {
			return Err(ConfigError::Validation(
				"client.bid_gas_limit must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

/// Parses a TOML document. Environment variables are resolved and the
/// configuration is validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
[network]
rpc_url = "http://localhost:8545"

[contract]
address = "0x63C1C323a829E32e8CbCee395aB3d67083cA0b2D"
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("AUCTION_TEST_HOST", "localhost");
		std::env::set_var("AUCTION_TEST_PORT", "8545");

		let input = "url = \"http://${AUCTION_TEST_HOST}:${AUCTION_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8545\"");

		std::env::remove_var("AUCTION_TEST_HOST");
		std::env::remove_var("AUCTION_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${AUCTION_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${AUCTION_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.unwrap_err().to_string().contains("AUCTION_MISSING_VAR"));
	}

	#[test]
	fn test_lowercase_placeholders_are_left_alone() {
		let input = "value = \"${not_a_var}\"";
		assert_eq!(resolve_env_vars(input).unwrap(), input);
	}

	#[test]
	fn test_oversized_input_rejected() {
		let input = "#".repeat(1024 * 1024 + 1);
		assert!(matches!(
			resolve_env_vars(&input),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_defaults() {
		let config: Config = MINIMAL.parse().unwrap();
		assert_eq!(config.wallet.implementation, "rpc");
		assert_eq!(config.wallet.poll_interval(), Duration::from_secs(2));
		assert_eq!(config.storage.implementation, "file");
		assert_eq!(config.storage.path, "./data/session.json");
		assert_eq!(config.client.read_batch_size, 10);
		assert_eq!(config.client.bid_gas_limit, 500_000);
		assert_eq!(config.client.confirmation_timeout(), None);
		assert!(config.deploy.is_none());
		assert_eq!(
			config.contract_address().unwrap().to_string(),
			"0x63C1C323a829E32e8CbCee395aB3d67083cA0b2D"
		);
	}

	#[test]
	fn test_full_config_with_env_vars() {
		std::env::set_var(
			"AUCTION_TEST_KEY",
			"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
		);

		let config: Config = r#"
[network]
rpc_url = "${AUCTION_TEST_RPC:-http://127.0.0.1:8545}"
chain_id = 31337

[contract]
address = "0x63C1C323a829E32e8CbCee395aB3d67083cA0b2D"

[wallet]
implementation = "local"
private_key = "${AUCTION_TEST_KEY}"

[storage]
implementation = "memory"

[client]
read_batch_size = 4
confirmation_timeout_seconds = 120

[deploy]
artifact = "artifacts/Auction.json"
"#
		.parse()
		.unwrap();

		std::env::remove_var("AUCTION_TEST_KEY");

		assert_eq!(config.network.rpc_url, "http://127.0.0.1:8545");
		assert_eq!(config.network.chain_id, Some(31337));
		assert_eq!(config.wallet.implementation, "local");
		assert!(config.wallet.private_key.is_some());
		assert_eq!(config.client.read_batch_size, 4);
		assert_eq!(
			config.client.confirmation_timeout(),
			Some(Duration::from_secs(120))
		);
		assert_eq!(config.deploy.unwrap().artifact, "artifacts/Auction.json");
	}

	#[test]
	fn test_validation_failures() {
		let cases = [
			(
				"[network]\nrpc_url = \"\"",
				"network.rpc_url cannot be empty",
			),
			(
				"[network]\nrpc_url = \"http://x\"\n[contract]\naddress = \"0x0000000000000000000000000000000000000000\"",
				"zero address",
			),
			(
				"[network]\nrpc_url = \"http://x\"\n[wallet]\nimplementation = \"walletconnect\"",
				"Unknown wallet implementation",
			),
			(
				"[network]\nrpc_url = \"http://x\"\n[wallet]\nimplementation = \"local\"",
				"private_key is required",
			),
			(
				"[network]\nrpc_url = \"http://x\"\n[client]\nread_batch_size = 0",
				"read_batch_size",
			),
		];

		for (input, expected) in cases {
			let err = input.parse::<Config>().unwrap_err();
			assert!(
				err.to_string().contains(expected),
				"{input}: {err}"
			);
		}
	}

	#[test]
	fn test_missing_contract_is_reported_on_use() {
		let config: Config = "[network]\nrpc_url = \"http://x\"".parse().unwrap();
		assert!(config.contract_address().is_err());
	}

	#[tokio::test]
	async fn test_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("auction.toml");
		tokio::fs::write(&path, MINIMAL).await.unwrap();

		let config = Config::from_file(&path).await.unwrap();
		assert_eq!(config.network.rpc_url, "http://localhost:8545");

		assert!(matches!(
			Config::from_file(dir.path().join("missing.toml")).await,
			Err(ConfigError::Io(_))
		));
	}

	#[test]
	fn test_example_config_parses() {
		let config: Config = include_str!("../../../config/auction.example.toml")
			.parse()
			.unwrap();
		assert_eq!(config.wallet.implementation, "rpc");
		assert_eq!(config.storage.implementation, "file");
		assert_eq!(config.client.bid_gas_limit, 500_000);
		assert!(config.deploy.is_some());
	}
}
