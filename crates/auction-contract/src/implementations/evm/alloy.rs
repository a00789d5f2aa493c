//! Alloy-based implementation of the auction backend.
//!
//! Reads are plain `eth_call`s against the read provider. Writes are sent
//! through the signer's provider, which either signs locally or lets the
//! wallet sign `eth_sendTransaction`, and then wait for the receipt.

use crate::bindings::IAuctionContract;
use crate::{AuctionBackend, ContractError, ProviderFailure, TxOutcome};
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, Bytes, TxKind, U256};
use alloy_provider::{DynProvider, PendingTransactionError, Provider, WatchTxError};
use alloy_rpc_types::{BlockNumberOrTag, TransactionRequest};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use auction_types::AuctionRecord;
use auction_wallet::SignerHandle;
use std::time::Duration;

/// Auction contract reached through alloy providers.
pub struct AlloyAuctionBackend {
	/// Provider used for reads.
	provider: DynProvider,
	/// Address of the deployed contract.
	contract: Address,
	/// Upper bound on waiting for a receipt; `None` waits indefinitely.
	confirmation_timeout: Option<Duration>,
}

impl AlloyAuctionBackend {
	pub fn new(
		provider: DynProvider,
		contract: Address,
		confirmation_timeout: Option<Duration>,
	) -> Self {
		Self {
			provider,
			contract,
			confirmation_timeout,
		}
	}

	async fn read<C>(&self, call: C) -> Result<C::Return, ContractError>
	where
		C: SolCall + Send,
	{
		let request = TransactionRequest {
			to: Some(TxKind::Call(self.contract)),
			input: call.abi_encode().into(),
			..Default::default()
		};

		let data = self.provider.call(request).await.map_err(|e| {
			tracing::debug!(call = C::SIGNATURE, error = %e, "Contract read failed");
			ContractError::Network(format!("{} failed: {e}", C::SIGNATURE))
		})?;

		C::abi_decode_returns(&data)
			.map_err(|e| ContractError::Decode(format!("{}: {e}", C::SIGNATURE)))
	}

	async fn submit(
		&self,
		signer: &SignerHandle,
		input: Vec<u8>,
		value: Option<U256>,
		gas_limit: Option<u64>,
	) -> Result<TxOutcome, ContractError> {
		let request = TransactionRequest {
			from: Some(signer.address),
			to: Some(TxKind::Call(self.contract)),
			input: input.into(),
			value,
			gas: gas_limit,
			..Default::default()
		};

		send_and_confirm(&signer.provider, request, self.confirmation_timeout).await
	}
}

fn to_u64(value: U256, field: &str) -> Result<u64, ContractError> {
	u64::try_from(value)
		.map_err(|_| ContractError::Decode(format!("{field} does not fit in 64 bits: {value}")))
}

/// Sends `request` and waits for its receipt.
///
/// Submission failures keep every detail the provider reported so that the
/// message shown to the user can be picked from them.
pub async fn send_and_confirm(
	provider: &DynProvider,
	request: TransactionRequest,
	confirmation_timeout: Option<Duration>,
) -> Result<TxOutcome, ContractError> {
	tracing::debug!(
		from = ?request.from,
		to = ?request.to,
		value = ?request.value,
		gas_limit = ?request.gas,
		"Sending transaction"
	);

	let pending = provider.send_transaction(request).await.map_err(|e| {
		tracing::warn!(error = %e, "Transaction submission failed");
		ContractError::Rejected(ProviderFailure::from_transport(&e))
	})?;

	let hash = *pending.tx_hash();
	tracing::info!(tx_hash = %hash, "Transaction submitted, waiting for receipt");

	let receipt = pending
		.with_timeout(confirmation_timeout)
		.get_receipt()
		.await
		.map_err(|e| match e {
			PendingTransactionError::TxWatcher(WatchTxError::Timeout) => ContractError::Timeout(hash),
			PendingTransactionError::TransportError(e) => {
				ContractError::Rejected(ProviderFailure::from_transport(&e))
			},
			other => ContractError::Network(format!("Failed to confirm transaction: {other}")),
		})?;

	let outcome = TxOutcome {
		hash: receipt.transaction_hash,
		success: receipt.status(),
		contract_address: receipt.contract_address,
	};
	tracing::info!(tx_hash = %outcome.hash, success = outcome.success, "Transaction mined");
	Ok(outcome)
}

/// Deploys a contract from its creation bytecode.
///
/// The deployed address is in [`TxOutcome::contract_address`].
pub async fn deploy_contract(
	signer: &SignerHandle,
	bytecode: Bytes,
	confirmation_timeout: Option<Duration>,
) -> Result<TxOutcome, ContractError> {
	let request = TransactionRequest {
		from: Some(signer.address),
		..Default::default()
	}
	.with_deploy_code(bytecode);

	send_and_confirm(&signer.provider, request, confirmation_timeout).await
}

#[async_trait]
impl AuctionBackend for AlloyAuctionBackend {
	async fn auction_counter(&self) -> Result<u64, ContractError> {
		let count = self.read(IAuctionContract::auctionCounterCall {}).await?;
		to_u64(count, "auctionCounter")
	}

	async fn get_auction(&self, id: u64) -> Result<AuctionRecord, ContractError> {
		let auction = self
			.read(IAuctionContract::getAuctionCall {
				auctionId: U256::from(id),
			})
			.await?;

		Ok(AuctionRecord {
			seller: auction.seller,
			name: auction.name,
			description: auction.description,
			starting_price: auction.startingPrice,
			highest_bid: auction.highestBid,
			highest_bidder: auction.highestBidder,
			end_time: to_u64(auction.endTime, "endTime")?,
			ended: auction.ended,
		})
	}

	async fn get_user_bids(&self, account: Address) -> Result<Vec<u64>, ContractError> {
		let ids = self
			.read(IAuctionContract::getUserBidsCall { user: account })
			.await?;
		ids.into_iter().map(|id| to_u64(id, "auctionId")).collect()
	}

	async fn get_pending_return(&self, account: Address) -> Result<U256, ContractError> {
		self.read(IAuctionContract::getPendingReturnCall { user: account })
			.await
	}

	async fn owner(&self) -> Result<Address, ContractError> {
		self.read(IAuctionContract::ownerCall {}).await
	}

	async fn stopped(&self) -> Result<bool, ContractError> {
		self.read(IAuctionContract::stoppedCall {}).await
	}

	async fn latest_timestamp(&self) -> Result<u64, ContractError> {
		let block = self
			.provider
			.get_block_by_number(BlockNumberOrTag::Latest)
			.await
			.map_err(|e| ContractError::Network(format!("Failed to fetch latest block: {e}")))?
			.ok_or_else(|| ContractError::Network("Latest block not available".to_string()))?;
		Ok(block.header.timestamp)
	}

	async fn create_auction(
		&self,
		signer: &SignerHandle,
		name: &str,
		starting_price: U256,
		description: &str,
		duration: u64,
	) -> Result<TxOutcome, ContractError> {
		let call = IAuctionContract::createAuctionCall {
			name: name.to_string(),
			startingPrice: starting_price,
			description: description.to_string(),
			duration: U256::from(duration),
		};
		self.submit(signer, call.abi_encode(), None, None).await
	}

	async fn place_bid(
		&self,
		signer: &SignerHandle,
		id: u64,
		value: U256,
		gas_limit: u64,
	) -> Result<TxOutcome, ContractError> {
		let call = IAuctionContract::placeBidCall {
			auctionId: U256::from(id),
		};
		self.submit(signer, call.abi_encode(), Some(value), Some(gas_limit))
			.await
	}

	async fn end_auction(&self, signer: &SignerHandle, id: u64) -> Result<TxOutcome, ContractError> {
		let call = IAuctionContract::endAuctionCall {
			auctionId: U256::from(id),
		};
		self.submit(signer, call.abi_encode(), None, None).await
	}

	async fn withdraw(&self, signer: &SignerHandle) -> Result<TxOutcome, ContractError> {
		self.submit(signer, IAuctionContract::withdrawCall {}.abi_encode(), None, None)
			.await
	}
}
