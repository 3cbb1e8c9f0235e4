//!
//! Per-step signature verification.
//!
//! These checks are pure predicates over the negotiated contract; the
//! lifecycle engine calls them at fixed points of the handshake and none of
//! them may be skipped.
//!

use bitcoin::{Amount, EcdsaSighashType, ScriptBuf, Transaction, TxOut, WPubkeyHash, Witness};
use bitcoin::hashes::{hash160, Hash};
use bitcoin::sighash::SighashCache;
use bitcoin::secp256k1::{ecdsa, Message, PublicKey, SecretKey};

use crate::{Error, FundingInput, SECP};
use crate::messages::{OracleAnnouncement, OracleAttestation};


/// Validate the oracle's signature over an announcement's event.
pub fn verify_announcement(announcement: &OracleAnnouncement) -> Result<(), Error> {
	SECP.verify_schnorr(
		&announcement.signature,
		&announcement.signed_digest(),
		&announcement.oracle_pubkey,
	)?;
	Ok(())
}

/// Validate an attestation against the announcement it settles.
///
/// Checks the event binding, one Schnorr signature per attested outcome and
/// that every signature uses the nonce the oracle committed to.
pub fn verify_attestation(
	announcement: &OracleAnnouncement,
	attestation: &OracleAttestation,
) -> Result<(), Error> {
	if attestation.event_id != announcement.event.event_id {
		return Err(Error::InvalidArgument("attestation is for a different event"));
	}
	if attestation.oracle_pubkey != announcement.oracle_pubkey {
		return Err(Error::InvalidArgument("attestation is from a different oracle"));
	}
	if attestation.signatures.len() != attestation.outcomes.len()
		|| attestation.signatures.len() > announcement.event.nonces.len()
		|| attestation.signatures.is_empty()
	{
		return Err(Error::InvalidArgument("attestation signature count mismatch"));
	}

	let iter = attestation.signatures.iter()
		.zip(attestation.outcomes.iter())
		.zip(announcement.event.nonces.iter());
	for ((sig, outcome), nonce) in iter {
		// The signature must use the announced nonce, that is the whole
		// point of the oracle's commitment.
		if sig.serialize()[..32] != nonce.serialize() {
			return Err(Error::InvalidArgument("attestation signature doesn't use announced nonce"));
		}
		SECP.verify_schnorr(
			sig,
			&OracleAttestation::outcome_digest(outcome),
			&announcement.oracle_pubkey,
		)?;
	}
	Ok(())
}


/// The sighash message of a transaction spending the funding output.
///
/// CETs and the refund transaction spend it as input 0 with a p2wsh
/// 2-of-2 witness.
pub fn contract_tx_sighash(
	tx: &Transaction,
	funding_script: &ScriptBuf,
	funding_value: Amount,
) -> Result<Message, Error> {
	let sighash = SighashCache::new(tx)
		.p2wsh_signature_hash(0, funding_script, funding_value, EcdsaSighashType::All)
		.map_err(|_| Error::InvalidArgument("transaction has no input 0"))?;
	Ok(Message::from_digest(sighash.to_byte_array()))
}

/// Sign a CET or refund transaction with our funding key.
pub fn sign_contract_tx(
	tx: &Transaction,
	funding_script: &ScriptBuf,
	funding_value: Amount,
	funding_privkey: &SecretKey,
) -> Result<ecdsa::Signature, Error> {
	let msg = contract_tx_sighash(tx, funding_script, funding_value)?;
	Ok(SECP.sign_ecdsa(&msg, funding_privkey))
}

/// Verify a counterparty signature over a CET or refund transaction.
pub fn verify_contract_tx_sig(
	tx: &Transaction,
	funding_script: &ScriptBuf,
	funding_value: Amount,
	pubkey: &PublicKey,
	sig: &ecdsa::Signature,
) -> Result<(), Error> {
	let msg = contract_tx_sighash(tx, funding_script, funding_value)?;
	SECP.verify_ecdsa(&msg, sig, pubkey)?;
	Ok(())
}

/// Verify a counterparty's signatures over every CET and over the refund
/// transaction against its funding public key.
pub fn verify_cet_and_refund_sigs(
	cets: &[Transaction],
	refund: &Transaction,
	funding_script: &ScriptBuf,
	funding_value: Amount,
	counterparty_pubkey: &PublicKey,
	cet_sigs: &[ecdsa::Signature],
	refund_sig: &ecdsa::Signature,
) -> Result<(), Error> {
	if cet_sigs.len() != cets.len() {
		return Err(Error::InvalidArgument("wrong number of CET signatures"));
	}
	for (cet, sig) in cets.iter().zip(cet_sigs.iter()) {
		verify_contract_tx_sig(cet, funding_script, funding_value, counterparty_pubkey, sig)?;
	}
	verify_contract_tx_sig(refund, funding_script, funding_value, counterparty_pubkey, refund_sig)
}


/// Build the p2wpkh witness for a funding transaction input we own.
pub fn p2wpkh_witness(
	tx: &Transaction,
	input_index: usize,
	prev_output: &TxOut,
	privkey: &SecretKey,
) -> Result<Witness, Error> {
	let sighash = SighashCache::new(tx)
		.p2wpkh_signature_hash(
			input_index,
			&prev_output.script_pubkey,
			prev_output.value,
			EcdsaSighashType::All,
		)
		.map_err(|_| Error::InvalidArgument("invalid funding input index"))?;
	let msg = Message::from_digest(sighash.to_byte_array());
	let sig = SECP.sign_ecdsa(&msg, privkey);

	let mut sig_bytes = sig.serialize_der().to_vec();
	sig_bytes.push(EcdsaSighashType::All as u8);
	let pubkey = privkey.public_key(&SECP);
	Ok(Witness::from_slice(&[&sig_bytes[..], &pubkey.serialize()[..]]))
}

/// Verify one party's witnesses over its declared funding inputs.
///
/// Only p2wpkh inputs are supported; the witness key must hash to the
/// input's scriptPubKey and the signature must cover the funding
/// transaction's sighash for that input.
pub fn verify_funding_sigs(
	fund_tx: &Transaction,
	inputs: &[FundingInput],
	witnesses: &[Witness],
) -> Result<(), Error> {
	if witnesses.len() != inputs.len() {
		return Err(Error::InvalidArgument("wrong number of funding signatures"));
	}
	for (input, witness) in inputs.iter().zip(witnesses.iter()) {
		let index = fund_tx.input.iter()
			.position(|i| i.previous_output == input.outpoint)
			.ok_or(Error::InvalidArgument("funding input not in funding transaction"))?;
		verify_funding_input_sig(fund_tx, index, input, witness)?;
	}
	Ok(())
}

fn verify_funding_input_sig(
	fund_tx: &Transaction,
	input_index: usize,
	input: &FundingInput,
	witness: &Witness,
) -> Result<(), Error> {
	if witness.len() != 2 {
		return Err(Error::InvalidArgument("funding witness must have two elements"));
	}
	let sig_bytes = &witness[0];
	let pubkey = PublicKey::from_slice(&witness[1])?;

	if !input.prev_output.script_pubkey.is_p2wpkh() {
		return Err(Error::InvalidArgument("only p2wpkh funding inputs are supported"));
	}
	let pk_hash = hash160::Hash::hash(&pubkey.serialize());
	let expected_spk = ScriptBuf::new_p2wpkh(&WPubkeyHash::from_raw_hash(pk_hash));
	if input.prev_output.script_pubkey != expected_spk {
		return Err(Error::InvalidArgument("funding witness key doesn't match input script"));
	}

	let (der, hashtype) = sig_bytes.split_at(sig_bytes.len().saturating_sub(1));
	if hashtype != [EcdsaSighashType::All as u8] {
		return Err(Error::InvalidArgument("funding signature must use SIGHASH_ALL"));
	}
	let sig = ecdsa::Signature::from_der(der)?;

	let sighash = SighashCache::new(fund_tx)
		.p2wpkh_signature_hash(
			input_index,
			&input.prev_output.script_pubkey,
			input.prev_output.value,
			EcdsaSighashType::All,
		)
		.map_err(|_| Error::InvalidArgument("invalid funding input index"))?;
	SECP.verify_ecdsa(&Message::from_digest(sighash.to_byte_array()), &sig, &pubkey)?;
	Ok(())
}


#[cfg(test)]
mod test {
	use super::*;
	use bitcoin::{FeeRate, OutPoint};
	use bitcoin::secp256k1::Keypair;
	use bitcoin::secp256k1::rand::thread_rng;

	use crate::{txbuilder, Payout, P2WPKH_WITNESS_LEN};
	use crate::txbuilder::PartyParams;

	fn p2wpkh_spk(key: &Keypair) -> ScriptBuf {
		let pk_hash = hash160::Hash::hash(&key.public_key().serialize());
		ScriptBuf::new_p2wpkh(&WPubkeyHash::from_raw_hash(pk_hash))
	}

	fn party(key: &Keypair, utxo_key: &Keypair, collateral: Amount, vout: u32) -> PartyParams {
		PartyParams {
			fund_pubkey: key.public_key(),
			change_spk: ScriptBuf::from_bytes(vec![0x00, 0x14, 5, 5, 5, 5]),
			payout_spk: ScriptBuf::from_bytes(vec![0x00, 0x14, 6, 6, 6, 6]),
			inputs: vec![FundingInput {
				outpoint: OutPoint {
					txid: "f338d94399994750d07607e2984b38d967b91fcc0d05e5dd856d674832620ba6"
						.parse().unwrap(),
					vout,
				},
				prev_output: TxOut {
					value: Amount::from_sat(100_000),
					script_pubkey: p2wpkh_spk(utxo_key),
				},
				max_witness_len: P2WPKH_WITNESS_LEN,
			}],
			collateral,
		}
	}

	#[test]
	fn cet_and_refund_sigs_verify_and_tampering_fails() {
		let offer_key = Keypair::new(&*SECP, &mut thread_rng());
		let accept_key = Keypair::new(&*SECP, &mut thread_rng());
		let utxo_key = Keypair::new(&*SECP, &mut thread_rng());
		let total = Amount::from_sat(100_000);
		let payouts = vec![
			Payout { offer: total, accept: Amount::ZERO },
			Payout { offer: Amount::ZERO, accept: total },
		];
		let txs = txbuilder::create_dlc_transactions(
			&party(&offer_key, &utxo_key, Amount::from_sat(60_000), 0),
			&party(&accept_key, &utxo_key, Amount::from_sat(40_000), 1),
			&payouts, 1_001_000, FeeRate::from_sat_per_vb_unchecked(2), 0, 1_000_000,
		).unwrap();

		let cet_sigs = txs.cets.iter()
			.map(|cet| sign_contract_tx(
				cet, &txs.funding_script, txs.funding_value(), &accept_key.secret_key(),
			).unwrap())
			.collect::<Vec<_>>();
		let refund_sig = sign_contract_tx(
			&txs.refund, &txs.funding_script, txs.funding_value(), &accept_key.secret_key(),
		).unwrap();

		verify_cet_and_refund_sigs(
			&txs.cets, &txs.refund, &txs.funding_script, txs.funding_value(),
			&accept_key.public_key(), &cet_sigs, &refund_sig,
		).unwrap();

		// The wrong key must not verify.
		assert!(verify_cet_and_refund_sigs(
			&txs.cets, &txs.refund, &txs.funding_script, txs.funding_value(),
			&offer_key.public_key(), &cet_sigs, &refund_sig,
		).is_err());

		// A single flipped byte must not verify.
		let mut tampered = cet_sigs.clone();
		let mut bytes = tampered[0].serialize_compact();
		bytes[10] ^= 0x01;
		tampered[0] = ecdsa::Signature::from_compact(&bytes).unwrap();
		assert!(verify_cet_and_refund_sigs(
			&txs.cets, &txs.refund, &txs.funding_script, txs.funding_value(),
			&accept_key.public_key(), &tampered, &refund_sig,
		).is_err());
	}

	#[test]
	fn funding_sigs_verify() {
		let offer_key = Keypair::new(&*SECP, &mut thread_rng());
		let accept_key = Keypair::new(&*SECP, &mut thread_rng());
		let utxo_key = Keypair::new(&*SECP, &mut thread_rng());
		let total = Amount::from_sat(100_000);
		let offer_params = party(&offer_key, &utxo_key, Amount::from_sat(60_000), 0);
		let txs = txbuilder::create_dlc_transactions(
			&offer_params,
			&party(&accept_key, &utxo_key, Amount::from_sat(40_000), 1),
			&[Payout { offer: total, accept: Amount::ZERO },
			  Payout { offer: Amount::ZERO, accept: total }],
			1_001_000, FeeRate::from_sat_per_vb_unchecked(2), 0, 1_000_000,
		).unwrap();

		let witness = p2wpkh_witness(
			&txs.fund, 0, &offer_params.inputs[0].prev_output, &utxo_key.secret_key(),
		).unwrap();
		verify_funding_sigs(&txs.fund, &offer_params.inputs, &[witness.clone()]).unwrap();

		// A witness from another key fails.
		let wrong = p2wpkh_witness(
			&txs.fund, 0, &offer_params.inputs[0].prev_output, &offer_key.secret_key(),
		).unwrap();
		assert!(verify_funding_sigs(&txs.fund, &offer_params.inputs, &[wrong]).is_err());
	}

	#[test]
	fn attestation_nonce_binding() {
		use crate::messages::{EventDescriptor, OracleEvent};
		use bitcoin::secp256k1::Message;
		use bitcoin::hashes::sha256;

		let oracle = Keypair::new(&*SECP, &mut thread_rng());
		let outcome = "win";
		let att_sig = SECP.sign_schnorr(
			&OracleAttestation::outcome_digest(outcome), &oracle,
		);
		// The announced nonce is the R point of the attestation signature.
		let nonce = bitcoin::secp256k1::XOnlyPublicKey::from_slice(
			&att_sig.serialize()[..32],
		).unwrap();

		let event = OracleEvent {
			nonces: vec![nonce],
			event_maturity: 1_000_000,
			descriptor: EventDescriptor::Enumeration {
				outcomes: vec!["win".into(), "lose".into()],
			},
			event_id: "match-42".into(),
		};
		let digest = Message::from_digest(
			sha256::Hash::hash(&crate::ProtocolEncoding::serialize(&event)).to_byte_array(),
		);
		let announcement = OracleAnnouncement {
			signature: SECP.sign_schnorr(&digest, &oracle),
			oracle_pubkey: oracle.x_only_public_key().0,
			event,
		};
		verify_announcement(&announcement).unwrap();

		let attestation = OracleAttestation {
			event_id: "match-42".into(),
			oracle_pubkey: oracle.x_only_public_key().0,
			signatures: vec![att_sig],
			outcomes: vec![outcome.into()],
		};
		verify_attestation(&announcement, &attestation).unwrap();

		// An attestation signed with a fresh nonce must be rejected.
		let other = OracleAttestation {
			outcomes: vec!["lose".into()],
			signatures: vec![SECP.sign_schnorr(
				&OracleAttestation::outcome_digest("lose"), &oracle,
			)],
			..attestation.clone()
		};
		assert!(verify_attestation(&announcement, &other).is_err());
	}
}
