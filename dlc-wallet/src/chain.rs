//!
//! The seams between the contract engine and its surroundings: the
//! surrounding wallet holding keys and coins, and the chain used for
//! broadcasting and locktime checks.
//!

use async_trait::async_trait;
use bitcoin::{Amount, FeeRate, OutPoint, ScriptBuf, Transaction, Witness};
use bitcoin::secp256k1::Keypair;

use dlc::{ContractId, FundingInput};

use crate::error::WalletError;

/// The key and coin operations the engine needs from the surrounding wallet.
pub trait WalletBackend {
	/// Select utxos worth at least `amount` plus funding fees at `fee_rate`,
	/// skipping the given reserved outpoints.
	///
	/// Fails with [WalletError::InsufficientFunds] when the wallet can't
	/// cover the amount.
	fn select_utxos(
		&mut self,
		amount: Amount,
		fee_rate: FeeRate,
		exclude: &[OutPoint],
	) -> Result<Vec<FundingInput>, WalletError>;

	/// A fresh scriptPubkey to receive payouts or change.
	fn new_address_spk(&mut self) -> Result<ScriptBuf, WalletError>;

	/// The keypair used in the funding multisig of the given contract.
	///
	/// Must be deterministic in the contract id so it can be re-derived
	/// after a restart.
	fn contract_keypair(&self, id: ContractId) -> Result<Keypair, WalletError>;

	/// Sign one of our own inputs of the funding transaction.
	fn sign_funding_input(
		&self,
		fund_tx: &Transaction,
		input_index: usize,
		input: &FundingInput,
	) -> Result<Witness, WalletError>;

	/// Total value of our spendable utxos, skipping the given reserved
	/// outpoints.
	fn balance(&self, exclude: &[OutPoint]) -> Result<Amount, WalletError>;
}

/// Chain access for broadcasting contract transactions and for checking the
/// refund locktime.
#[async_trait]
pub trait ChainSource {
	async fn broadcast_tx(&self, tx: &Transaction) -> Result<(), WalletError>;

	async fn tip_height(&self) -> Result<u32, WalletError>;
}
