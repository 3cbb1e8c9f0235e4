
pub extern crate dlc;

#[macro_use] extern crate log;
#[macro_use] extern crate serde;

pub mod chain;
pub mod config;
pub mod database;
mod error;
mod gate;
mod state;

pub use crate::config::Config;
pub use crate::database::{Db, DlcRecord};
pub use crate::error::WalletError;
pub use crate::state::DlcState;

use std::sync::Mutex;

use bitcoin::{Amount, EcdsaSighashType, FeeRate, OutPoint, ScriptBuf, Transaction, Txid, Witness};
use bitcoin::secp256k1::{ecdsa, PublicKey};
use chrono::Utc;

use dlc::{verify, ContractId};
use dlc::messages::{AcceptDlc, ContractInfo, OfferDlc, OracleAttestation, SignDlc, PROTOCOL_VERSION};
use dlc::txbuilder::{self, DlcTransactions, PartyParams};

use crate::chain::{ChainSource, WalletBackend};
use crate::gate::AcceptGate;


/// The terms of a new contract offer.
#[derive(Debug, Clone)]
pub struct OfferTerms {
	pub contract_info: ContractInfo,
	/// The collateral we put up; the counterparty covers the rest of the
	/// total collateral.
	pub collateral: Amount,
	/// Fee rate for the contract transactions, the config fallback rate is
	/// used when not set.
	pub fee_rate: Option<FeeRate>,
	/// Locktime of every CET, the contract maturity.
	pub cet_locktime: u32,
	pub refund_locktime: u32,
}

/// A contract with everything we stored about it so far.
#[derive(Debug, Clone)]
pub struct DlcContract {
	pub record: DlcRecord,
	pub offer: OfferDlc,
	pub accept: Option<AcceptDlc>,
	pub sign: Option<SignDlc>,
}

fn offer_params(offer: &OfferDlc) -> PartyParams {
	PartyParams {
		fund_pubkey: offer.funding_pubkey,
		change_spk: offer.change_spk.clone(),
		payout_spk: offer.payout_spk.clone(),
		inputs: offer.funding_inputs.clone(),
		collateral: offer.collateral,
	}
}

fn accept_params(accept: &AcceptDlc) -> PartyParams {
	PartyParams {
		fund_pubkey: accept.funding_pubkey,
		change_spk: accept.change_spk.clone(),
		payout_spk: accept.payout_spk.clone(),
		inputs: accept.funding_inputs.clone(),
		collateral: accept.collateral,
	}
}

fn offer_fee_rate(offer: &OfferDlc) -> Result<FeeRate, WalletError> {
	FeeRate::from_sat_per_vb(offer.fee_rate_sat_per_vb)
		.ok_or_else(|| WalletError::illegal("offer fee rate overflows"))
}

/// Rebuild the deterministic transaction set of a negotiated contract.
///
/// Both parties arrive at byte-identical transactions from the exchanged
/// offer and accept messages; that is what makes the exchanged signatures
/// verifiable.
pub fn contract_transactions(
	offer: &OfferDlc,
	accept: &AcceptDlc,
) -> Result<DlcTransactions, WalletError> {
	let payouts = offer.contract_info.outcome_payouts()?
		.into_iter()
		.map(|(_, payout)| payout)
		.collect::<Vec<_>>();
	Ok(txbuilder::create_dlc_transactions(
		&offer_params(offer),
		&accept_params(accept),
		&payouts,
		offer.refund_locktime,
		offer_fee_rate(offer)?,
		0,
		offer.cet_locktime,
	)?)
}

/// The witness spending the funding output with both parties' signatures.
///
/// OP_CHECKMULTISIG requires the signatures in script key order, which is
/// the lexicographic order of the serialized pubkeys.
fn settlement_witness(
	funding_script: &ScriptBuf,
	a: (PublicKey, ecdsa::Signature),
	b: (PublicKey, ecdsa::Signature),
) -> Witness {
	fn push_sig(witness: &mut Witness, sig: ecdsa::Signature) {
		let mut bytes = sig.serialize_der().to_vec();
		bytes.push(EcdsaSighashType::All as u8);
		witness.push(bytes);
	}

	let (first, second) = if a.0.serialize() <= b.0.serialize() {
		(a.1, b.1)
	} else {
		(b.1, a.1)
	};
	let mut witness = Witness::new();
	// OP_CHECKMULTISIG pops one extra stack element.
	witness.push(&[] as &[u8]);
	push_sig(&mut witness, first);
	push_sig(&mut witness, second);
	witness.push(funding_script.as_bytes());
	witness
}

fn validate_offer(offer: &OfferDlc) -> Result<(), WalletError> {
	if offer.protocol_version != PROTOCOL_VERSION {
		return Err(WalletError::illegal(
			format!("unsupported protocol version {}", offer.protocol_version),
		));
	}
	offer.contract_info.validate()?;
	for ann in &offer.contract_info.oracle_announcements {
		verify::verify_announcement(ann)
			.map_err(|_| WalletError::InvalidAnnouncementSignature)?;
	}
	if offer.cet_locktime == 0 || offer.cet_locktime >= offer.refund_locktime {
		return Err(WalletError::illegal("refund locktime must be after contract maturity"));
	}
	offer.accept_collateral()?;
	offer_fee_rate(offer)?;
	if offer.funding_inputs.is_empty() {
		return Err(WalletError::illegal("offer without funding inputs"));
	}
	Ok(())
}


/// A wallet driving contracts through their negotiation and settlement
/// lifecycle.
///
/// Key and coin management is delegated to the [WalletBackend], chain access
/// to the [ChainSource]. All contract state lives in the [Db]. Every
/// operation takes `&self` so concurrent tasks can share one wallet; the
/// backend sits behind a mutex and contention on the same contract is
/// resolved by the accept gate and the store.
pub struct Wallet<B: WalletBackend, C: ChainSource> {
	config: Config,
	db: Db,
	backend: Mutex<B>,
	chain: C,
	accept_gate: AcceptGate,
}

impl<B: WalletBackend, C: ChainSource> Wallet<B, C> {
	/// Open the wallet, repairing the utxo reservation index against the
	/// stored contracts.
	pub fn open(config: Config, db: Db, backend: B, chain: C) -> Result<Wallet<B, C>, WalletError> {
		let (dropped, restored) = db.reconcile_reservations()?;
		if dropped != 0 || restored != 0 {
			info!("Reconciled utxo reservations: {} dropped, {} restored", dropped, restored);
		}
		Ok(Wallet {
			config, db, chain,
			backend: Mutex::new(backend),
			accept_gate: AcceptGate::new(),
		})
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	fn reserved_outpoints(&self) -> Result<Vec<OutPoint>, WalletError> {
		Ok(self.db.reserved_utxos()?.into_iter().map(|(o, _)| o).collect())
	}

	/// Our spendable balance, excluding utxos reserved for pending contracts.
	pub fn balance(&self) -> Result<Amount, WalletError> {
		let reserved = self.reserved_outpoints()?;
		self.backend.lock().unwrap().balance(&reserved)
	}

	/// The utxos currently locked into pending contracts.
	pub fn list_reserved_utxos(&self) -> Result<Vec<(OutPoint, ContractId)>, WalletError> {
		self.db.reserved_utxos()
	}

	pub fn find_dlc(&self, id: ContractId) -> Result<Option<DlcContract>, WalletError> {
		let record = match self.db.fetch_record(id)? {
			Some(r) => r,
			None => return Ok(None),
		};
		let offer = self.db.fetch_offer(id)?
			.ok_or_else(|| WalletError::illegal(format!("contract {} has no stored offer", id)))?;
		Ok(Some(DlcContract {
			record,
			offer,
			accept: self.db.fetch_accept(id)?,
			sign: self.db.fetch_sign(id)?,
		}))
	}

	pub fn list_dlcs(&self) -> Result<Vec<DlcRecord>, WalletError> {
		self.db.list_records()
	}

	fn require_contract(&self, id: ContractId) -> Result<DlcContract, WalletError> {
		self.find_dlc(id)?
			.ok_or_else(|| WalletError::illegal(format!("unknown contract {}", id)))
	}

	/// Create and store a new contract offer.
	///
	/// Reserves the selected utxos for this contract and puts the contract
	/// in [DlcState::Offered].
	pub fn create_offer(&self, terms: OfferTerms) -> Result<OfferDlc, WalletError> {
		terms.contract_info.validate()?;
		for ann in &terms.contract_info.oracle_announcements {
			verify::verify_announcement(ann)
				.map_err(|_| WalletError::InvalidAnnouncementSignature)?;
		}
		if terms.collateral > terms.contract_info.total_collateral {
			return Err(WalletError::illegal("collateral exceeds total collateral"));
		}
		if terms.cet_locktime == 0 || terms.cet_locktime >= terms.refund_locktime {
			return Err(WalletError::illegal("refund locktime must be after contract maturity"));
		}
		let fee_rate = match terms.fee_rate {
			Some(rate) => rate,
			None => FeeRate::from_sat_per_vb(self.config.fallback_fee_rate_sat_per_vb)
				.ok_or_else(|| WalletError::illegal("invalid fallback fee rate"))?,
		};

		let reserved = self.reserved_outpoints()?;
		let mut backend = self.backend.lock().unwrap();
		let inputs = backend.select_utxos(terms.collateral, fee_rate, &reserved)?;
		let contract_id = dlc::compute_contract_id(
			&inputs.iter().map(|i| i.outpoint).collect::<Vec<_>>(),
		)?;
		let keypair = backend.contract_keypair(contract_id)?;

		let offer = OfferDlc {
			protocol_version: PROTOCOL_VERSION,
			contract_info: terms.contract_info,
			funding_pubkey: keypair.public_key(),
			payout_spk: backend.new_address_spk()?,
			change_spk: backend.new_address_spk()?,
			collateral: terms.collateral,
			funding_inputs: inputs,
			fee_rate_sat_per_vb: fee_rate.to_sat_per_vb_floor(),
			cet_locktime: terms.cet_locktime,
			refund_locktime: terms.refund_locktime,
			unknown_tlvs: vec![],
		};
		// Make sure the selection actually covers collateral plus fees.
		offer_params(&offer).change_output_and_fees(fee_rate)?;

		for ann in &offer.contract_info.oracle_announcements {
			self.db.store_announcement(ann)?;
		}
		let now = Utc::now();
		self.db.create_contract(&DlcRecord {
			contract_id,
			state: DlcState::Offered,
			is_offerer: true,
			reserved_utxos: offer.funding_outpoints(),
			created_at: now,
			updated_at: now,
		}, &offer)?;
		info!("Offered contract {} with collateral {}", contract_id, terms.collateral);
		Ok(offer)
	}

	/// Accept a counterparty's offer, producing our accept message with
	/// signatures over every CET and over the refund transaction.
	///
	/// Accepting the same offer again returns the stored accept message.
	/// A concurrent accept of the same offer fails with
	/// [WalletError::DuplicateOffer].
	pub fn accept_offer(&self, offer: &OfferDlc) -> Result<AcceptDlc, WalletError> {
		let contract_id = offer.contract_id()?;
		let _claim = self.accept_gate.try_enter(contract_id)?;

		if let Some(record) = self.db.fetch_record(contract_id)? {
			if record.is_offerer {
				return Err(WalletError::illegal("cannot accept our own offer"));
			}
			let stored = self.db.fetch_offer(contract_id)?
				.ok_or_else(|| WalletError::illegal("contract without stored offer"))?;
			if stored != *offer {
				return Err(WalletError::illegal(
					format!("a different offer with contract id {} is already known", contract_id),
				));
			}
			let accept = self.db.fetch_accept(contract_id)?
				.ok_or_else(|| WalletError::illegal("contract without stored accept"))?;
			debug!("Replaying accept for contract {}", contract_id);
			return Ok(accept);
		}

		validate_offer(offer)?;
		let collateral = offer.accept_collateral()?;
		let fee_rate = offer_fee_rate(offer)?;

		let reserved = self.reserved_outpoints()?;
		let mut backend = self.backend.lock().unwrap();
		let inputs = backend.select_utxos(collateral, fee_rate, &reserved)?;
		let keypair = backend.contract_keypair(contract_id)?;
		let payout_spk = backend.new_address_spk()?;
		let change_spk = backend.new_address_spk()?;
		drop(backend);

		let payouts = offer.contract_info.outcome_payouts()?
			.into_iter()
			.map(|(_, payout)| payout)
			.collect::<Vec<_>>();
		let txs = txbuilder::create_dlc_transactions(
			&offer_params(offer),
			&PartyParams {
				fund_pubkey: keypair.public_key(),
				change_spk: change_spk.clone(),
				payout_spk: payout_spk.clone(),
				inputs: inputs.clone(),
				collateral,
			},
			&payouts,
			offer.refund_locktime,
			fee_rate,
			0,
			offer.cet_locktime,
		)?;
		let cet_signatures = txs.cets.iter()
			.map(|cet| verify::sign_contract_tx(
				cet, &txs.funding_script, txs.funding_value(), &keypair.secret_key(),
			))
			.collect::<Result<Vec<_>, _>>()?;
		let refund_signature = verify::sign_contract_tx(
			&txs.refund, &txs.funding_script, txs.funding_value(), &keypair.secret_key(),
		)?;

		let accept = AcceptDlc {
			protocol_version: PROTOCOL_VERSION,
			contract_id,
			collateral,
			funding_pubkey: keypair.public_key(),
			payout_spk,
			change_spk,
			funding_inputs: inputs,
			cet_signatures,
			refund_signature,
			unknown_tlvs: vec![],
		};

		for ann in &offer.contract_info.oracle_announcements {
			self.db.store_announcement(ann)?;
		}
		// Record, offer and accept are persisted in one transaction so a
		// crash can't leave an accepted contract missing its accept message.
		let now = Utc::now();
		self.db.create_accepted_contract(&DlcRecord {
			contract_id,
			state: DlcState::Accepted,
			is_offerer: false,
			reserved_utxos: accept.funding_inputs.iter().map(|i| i.outpoint).collect(),
			created_at: now,
			updated_at: now,
		}, offer, &accept)?;
		info!("Accepted contract {} with collateral {}", contract_id, collateral);
		Ok(accept)
	}

	/// Process the counterparty's accept message as the offering party.
	///
	/// Verifies every one of its CET signatures and its refund signature,
	/// then produces our sign message with our own signatures and the
	/// witnesses of our funding inputs. Moves the contract to
	/// [DlcState::Signed].
	pub fn sign_dlc(&self, accept: &AcceptDlc) -> Result<SignDlc, WalletError> {
		let id = accept.contract_id;
		let contract = self.require_contract(id)?;
		if !contract.record.is_offerer {
			return Err(WalletError::illegal("only the offering party signs a contract"));
		}

		// Replay of an accept we already processed.
		if contract.record.state != DlcState::Offered {
			match (&contract.accept, &contract.sign) {
				(Some(stored), Some(sign)) if stored == accept => {
					debug!("Replaying sign for contract {}", id);
					return Ok(sign.clone());
				},
				_ => return Err(WalletError::illegal(
					format!("contract {} is not awaiting an accept message", id),
				)),
			}
		}

		let offer = contract.offer;
		if accept.collateral != offer.accept_collateral()? {
			return Err(WalletError::illegal("accept collateral doesn't match the offer"));
		}

		let txs = contract_transactions(&offer, accept)?;
		verify::verify_cet_and_refund_sigs(
			&txs.cets,
			&txs.refund,
			&txs.funding_script,
			txs.funding_value(),
			&accept.funding_pubkey,
			&accept.cet_signatures,
			&accept.refund_signature,
		).map_err(WalletError::invalid_sigs)?;

		let backend = self.backend.lock().unwrap();
		let keypair = backend.contract_keypair(id)?;
		if keypair.public_key() != offer.funding_pubkey {
			return Err(WalletError::illegal("funding key doesn't match our offer"));
		}
		let cet_signatures = txs.cets.iter()
			.map(|cet| verify::sign_contract_tx(
				cet, &txs.funding_script, txs.funding_value(), &keypair.secret_key(),
			))
			.collect::<Result<Vec<_>, _>>()?;
		let refund_signature = verify::sign_contract_tx(
			&txs.refund, &txs.funding_script, txs.funding_value(), &keypair.secret_key(),
		)?;
		// Our inputs come first in the funding transaction, in offer order.
		let funding_signatures = offer.funding_inputs.iter().enumerate()
			.map(|(i, input)| backend.sign_funding_input(&txs.fund, i, input))
			.collect::<Result<Vec<_>, _>>()?;
		drop(backend);

		let sign = SignDlc {
			protocol_version: PROTOCOL_VERSION,
			contract_id: id,
			funding_signatures,
			cet_signatures,
			refund_signature,
			unknown_tlvs: vec![],
		};
		self.db.store_accept(id, accept)?;
		self.db.store_sign(id, &sign)?;
		info!("Signed contract {}", id);
		Ok(sign)
	}

	/// Process the offering party's sign message as the accepting party.
	///
	/// Verifies its CET, refund and funding input signatures and moves the
	/// contract to [DlcState::Signed], ready for funding broadcast.
	pub fn add_dlc_sigs(&self, sign: &SignDlc) -> Result<(), WalletError> {
		let id = sign.contract_id;
		let contract = self.require_contract(id)?;
		if contract.record.is_offerer {
			return Err(WalletError::illegal("the offering party doesn't take a sign message"));
		}
		if contract.record.state != DlcState::Accepted {
			if contract.sign.as_ref() == Some(sign) {
				debug!("Replaying sign message for contract {}", id);
				return Ok(());
			}
			return Err(WalletError::illegal(
				format!("contract {} is not awaiting a sign message", id),
			));
		}
		let offer = contract.offer;
		let accept = contract.accept
			.ok_or_else(|| WalletError::illegal("contract without stored accept"))?;

		if sign.funding_signatures.len() != offer.funding_inputs.len() {
			return Err(WalletError::illegal(
				"sign message doesn't cover the offer's funding input set",
			));
		}

		let txs = contract_transactions(&offer, &accept)?;
		verify::verify_cet_and_refund_sigs(
			&txs.cets,
			&txs.refund,
			&txs.funding_script,
			txs.funding_value(),
			&offer.funding_pubkey,
			&sign.cet_signatures,
			&sign.refund_signature,
		).map_err(WalletError::invalid_sigs)?;
		verify::verify_funding_sigs(&txs.fund, &offer.funding_inputs, &sign.funding_signatures)
			.map_err(WalletError::invalid_sigs)?;

		self.db.store_sign(id, sign)?;
		info!("Stored counterparty signatures for contract {}", id);
		Ok(())
	}

	/// Broadcast the funding transaction as the accepting party, moving the
	/// contract to [DlcState::Broadcast].
	pub async fn broadcast_funding_tx(&self, id: ContractId) -> Result<Txid, WalletError> {
		let contract = self.require_contract(id)?;
		if contract.record.state != DlcState::Signed {
			return Err(WalletError::illegal(
				format!("contract {} is not fully signed", id),
			));
		}
		if contract.record.is_offerer {
			return Err(WalletError::illegal(
				"the accepting party broadcasts the funding transaction",
			));
		}
		let offer = contract.offer;
		let accept = contract.accept
			.ok_or_else(|| WalletError::illegal("contract without stored accept"))?;
		let sign = contract.sign
			.ok_or_else(|| WalletError::illegal("contract without stored sign"))?;

		let txs = contract_transactions(&offer, &accept)?;
		let mut fund = txs.fund.clone();
		// The offerer's witnesses from the sign message cover the first
		// inputs, ours fill the rest.
		for (i, witness) in sign.funding_signatures.iter().enumerate() {
			fund.input[i].witness = witness.clone();
		}
		{
			// The backend lock must not be held across the broadcast await.
			let backend = self.backend.lock().unwrap();
			for (j, input) in accept.funding_inputs.iter().enumerate() {
				let index = offer.funding_inputs.len() + j;
				fund.input[index].witness = backend.sign_funding_input(&txs.fund, index, input)?;
			}
		}

		self.chain.broadcast_tx(&fund).await?;
		self.db.set_state(id, DlcState::Broadcast)?;
		let txid = fund.compute_txid();
		info!("Broadcast funding transaction {} for contract {}", txid, id);
		Ok(txid)
	}

	/// Record that the funding transaction of a signed contract made it
	/// on-chain, for the party that didn't broadcast it itself.
	pub fn mark_funding_broadcast(&self, id: ContractId) -> Result<(), WalletError> {
		self.db.set_state(id, DlcState::Broadcast)?;
		info!("Marked contract {} funding as broadcast", id);
		Ok(())
	}

	/// Settle a broadcast contract with an oracle attestation.
	///
	/// Verifies the attestation against the contract's announcement, picks
	/// the CET of the attested outcome, completes it with both parties'
	/// signatures and broadcasts it. Moves the contract to
	/// [DlcState::Confirmed].
	pub async fn execute_dlc(
		&self,
		id: ContractId,
		attestation: &OracleAttestation,
	) -> Result<Transaction, WalletError> {
		let contract = self.require_contract(id)?;
		if contract.record.state != DlcState::Broadcast {
			return Err(WalletError::illegal(
				format!("contract {} has no broadcast funding transaction", id),
			));
		}
		let offer = contract.offer;
		let ann = offer.contract_info.oracle_announcements.iter()
			.find(|a| a.event.event_id == attestation.event_id)
			.ok_or_else(|| WalletError::illegal("attestation is for an unrelated event"))?;
		verify::verify_attestation(ann, attestation)
			.map_err(WalletError::invalid_sigs)?;

		let index = offer.contract_info.outcome_payouts()?.iter()
			.position(|(outcome, _)| outcome.matches_attestation(&attestation.outcomes))
			.ok_or_else(|| WalletError::illegal("attested outcome is not covered by the contract"))?;

		let accept = contract.accept
			.ok_or_else(|| WalletError::illegal("contract without stored accept"))?;
		let sign = contract.sign
			.ok_or_else(|| WalletError::illegal("contract without stored sign"))?;
		let txs = contract_transactions(&offer, &accept)?;
		let mut cet = txs.cets[index].clone();

		let keypair = self.backend.lock().unwrap().contract_keypair(id)?;
		let our_sig = verify::sign_contract_tx(
			&cet, &txs.funding_script, txs.funding_value(), &keypair.secret_key(),
		)?;
		let (our_pubkey, their_pubkey, their_sig) = if contract.record.is_offerer {
			let sig = *accept.cet_signatures.get(index)
				.ok_or_else(|| WalletError::illegal("missing counterparty CET signature"))?;
			(offer.funding_pubkey, accept.funding_pubkey, sig)
		} else {
			let sig = *sign.cet_signatures.get(index)
				.ok_or_else(|| WalletError::illegal("missing counterparty CET signature"))?;
			(accept.funding_pubkey, offer.funding_pubkey, sig)
		};
		cet.input[0].witness = settlement_witness(
			&txs.funding_script,
			(our_pubkey, our_sig),
			(their_pubkey, their_sig),
		);

		self.chain.broadcast_tx(&cet).await?;
		self.db.set_state(id, DlcState::Confirmed)?;
		info!("Executed contract {} with outcome {:?}", id, attestation.outcomes);
		Ok(cet)
	}

	/// Reclaim the collateral of a broadcast contract whose refund locktime
	/// has passed. Moves the contract to [DlcState::Refunded].
	pub async fn execute_dlc_refund(&self, id: ContractId) -> Result<Transaction, WalletError> {
		let contract = self.require_contract(id)?;
		if contract.record.state != DlcState::Broadcast {
			return Err(WalletError::illegal(
				format!("contract {} has no broadcast funding transaction", id),
			));
		}
		let offer = contract.offer;
		let tip = self.chain.tip_height().await?;
		if tip < offer.refund_locktime {
			return Err(WalletError::illegal(format!(
				"refund locktime {} not reached at height {}", offer.refund_locktime, tip,
			)));
		}

		let accept = contract.accept
			.ok_or_else(|| WalletError::illegal("contract without stored accept"))?;
		let sign = contract.sign
			.ok_or_else(|| WalletError::illegal("contract without stored sign"))?;
		let txs = contract_transactions(&offer, &accept)?;
		let mut refund = txs.refund.clone();

		let keypair = self.backend.lock().unwrap().contract_keypair(id)?;
		let our_sig = verify::sign_contract_tx(
			&refund, &txs.funding_script, txs.funding_value(), &keypair.secret_key(),
		)?;
		let (our_pubkey, their_pubkey, their_sig) = if contract.record.is_offerer {
			(offer.funding_pubkey, accept.funding_pubkey, accept.refund_signature)
		} else {
			(accept.funding_pubkey, offer.funding_pubkey, sign.refund_signature)
		};
		refund.input[0].witness = settlement_witness(
			&txs.funding_script,
			(our_pubkey, our_sig),
			(their_pubkey, their_sig),
		);

		self.chain.broadcast_tx(&refund).await?;
		self.db.set_state(id, DlcState::Refunded)?;
		info!("Refunded contract {}", id);
		Ok(refund)
	}

	/// Cancel a contract that hasn't been broadcast yet, releasing its utxo
	/// reservations. The stored oracle announcements are kept.
	pub fn cancel_dlc(&self, id: ContractId) -> Result<(), WalletError> {
		let contract = self.require_contract(id)?;
		if !contract.record.state.is_cancellable() {
			return Err(WalletError::illegal(format!(
				"contract {} in state {} can no longer be canceled",
				id, contract.record.state,
			)));
		}
		self.db.delete_contract(id)?;
		info!("Canceled contract {}", id);
		Ok(())
	}
}
