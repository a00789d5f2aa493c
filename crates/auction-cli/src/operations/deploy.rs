//! Contract deployment operations
//!
//! Deploys the auction contract from a compiled artifact through the
//! connected wallet. Both Hardhat artifacts (`"bytecode": "0x..."`) and
//! Foundry artifacts (`"bytecode": { "object": "0x..." }`) are accepted.

use crate::Context;
use alloy_primitives::Bytes;
use anyhow::{anyhow, bail, Context as _, Result};
use auction_contract::{
	implementations::evm::alloy::deploy_contract, normalize_error, PreflightError,
};
use auction_types::{Address, CallResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Result of a deployment attempt.
#[derive(Debug, Clone)]
pub struct Deployment {
	pub result: CallResult,
	/// Address of the new contract, when the creation transaction succeeded.
	pub address: Option<Address>,
}

impl Deployment {
	fn failed(message: impl Into<String>) -> Self {
		Self {
			result: CallResult::failure(message),
			address: None,
		}
	}
}

pub struct DeployOps {
	ctx: Arc<Context>,
}

impl DeployOps {
	pub fn new(ctx: Arc<Context>) -> Self {
		Self { ctx }
	}

	/// Artifact to deploy: the explicit path, else `deploy.artifact`.
	pub fn artifact_path(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
		explicit
			.or_else(|| {
				self.ctx
					.config
					.deploy
					.as_ref()
					.map(|deploy| PathBuf::from(&deploy.artifact))
			})
			.ok_or_else(|| anyhow!("No artifact given. Pass --artifact or set deploy.artifact"))
	}

	/// Deploys the contract in `artifact` from the connected account.
	///
	/// # Errors
	/// Returns error if the artifact cannot be read or has no bytecode.
	/// Submission failures are reported in [`Deployment::result`].
	#[instrument(skip(self))]
	pub async fn deploy(&self, artifact: &Path) -> Result<Deployment> {
		let bytecode = load_artifact(artifact).await?;
		info!(
			artifact = %artifact.display(),
			size = bytecode.len(),
			"Loaded contract artifact"
		);

		self.ctx.restore_session().await;
		let session = self.ctx.session.snapshot().await;
		let Some(signer) = session.signer else {
			return Ok(Deployment::failed(PreflightError::NotConnected.to_string()));
		};

		let timeout = self.ctx.config.client.confirmation_timeout();
		let deployment = match deploy_contract(&signer, bytecode, timeout).await {
			Ok(outcome) => match (outcome.success, outcome.contract_address) {
				(true, Some(address)) => {
					info!(address = %address, tx_hash = %outcome.hash, "Contract deployed");
					Deployment {
						result: CallResult::success(format!("Contract deployed at {address}"))
							.with_tx_hash(outcome.hash),
						address: Some(address),
					}
				},
				_ => Deployment {
					result: CallResult::failure("Contract creation failed.")
						.with_tx_hash(outcome.hash),
					address: None,
				},
			},
			Err(e) => {
				tracing::warn!(error = %e, "Deployment failed");
				Deployment::failed(normalize_error(&e.to_failure()))
			},
		};
		Ok(deployment)
	}
}

/// Reads an artifact file and extracts its creation bytecode.
pub async fn load_artifact(path: &Path) -> Result<Bytes> {
	let contents = tokio::fs::read_to_string(path)
		.await
		.with_context(|| format!("Failed to read artifact {}", path.display()))?;
	let json: Value = serde_json::from_str(&contents)
		.with_context(|| format!("Artifact {} is not valid JSON", path.display()))?;
	parse_artifact(&json)
}

/// Extracts creation bytecode from a Hardhat or Foundry artifact.
pub fn parse_artifact(artifact: &Value) -> Result<Bytes> {
	let code = match artifact.get("bytecode") {
		Some(Value::String(code)) => code.as_str(),
		Some(Value::Object(fields)) => fields
			.get("object")
			.and_then(Value::as_str)
			.ok_or_else(|| anyhow!("Artifact bytecode has no 'object' field"))?,
		Some(_) => bail!("Artifact 'bytecode' must be a string or an object"),
		None => bail!("Artifact has no 'bytecode' field"),
	};

	if code.contains("__$") {
		bail!("Artifact bytecode has unlinked library references");
	}

	let bytecode: Bytes = code
		.parse()
		.map_err(|e| anyhow!("Artifact bytecode is not valid hex: {e}"))?;
	if bytecode.is_empty() {
		bail!("Artifact bytecode is empty; abstract contracts and interfaces cannot be deployed");
	}
	Ok(bytecode)
}
