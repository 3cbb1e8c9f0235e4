use sled::transaction as tx;

use dlc::{ContractId, ProtocolDecodingError};

/// All the errors the contract engine can produce.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
	/// An oracle announcement carries an invalid signature.
	#[error("invalid oracle announcement signature")]
	InvalidAnnouncementSignature,
	/// A counterparty signature failed verification.
	#[error("invalid signatures: {0}")]
	InvalidSignatures(String),
	/// A message or call is inconsistent with the contract's current state.
	#[error("illegal argument: {0}")]
	IllegalArgument(String),
	/// Not enough spendable funds to cover collateral plus fees.
	#[error("insufficient funds for collateral and fees")]
	InsufficientFunds,
	/// The offer is already being accepted by a concurrent call.
	#[error("offer with contract id {0} is already being accepted")]
	DuplicateOffer(ContractId),
	/// A wire message failed to decode.
	#[error("malformed message: {0}")]
	MalformedMessage(#[from] ProtocolDecodingError),
	#[error("storage error: {0}")]
	Storage(#[from] sled::Error),
	#[error("broadcast error: {0}")]
	Broadcast(String),
}

impl WalletError {
	pub(crate) fn illegal(msg: impl Into<String>) -> WalletError {
		WalletError::IllegalArgument(msg.into())
	}

	pub(crate) fn invalid_sigs(err: dlc::Error) -> WalletError {
		WalletError::InvalidSignatures(err.to_string())
	}
}

impl From<dlc::Error> for WalletError {
	fn from(e: dlc::Error) -> WalletError {
		match e {
			dlc::Error::InsufficientFunds => WalletError::InsufficientFunds,
			e => WalletError::IllegalArgument(e.to_string()),
		}
	}
}

impl From<tx::TransactionError<WalletError>> for WalletError {
	fn from(e: tx::TransactionError<WalletError>) -> WalletError {
		match e {
			tx::TransactionError::Abort(e) => e,
			tx::TransactionError::Storage(e) => WalletError::Storage(e),
		}
	}
}
