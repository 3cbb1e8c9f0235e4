//!
//! Construction of the funding, CET and refund transactions.
//!
//! Both parties build the exact same transactions from the negotiated
//! parameters; byte-for-byte determinism here is what makes the exchanged
//! signatures verifiable.
//!

use bitcoin::{
	absolute, opcodes, Amount, FeeRate, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut,
	Witness,
};
use bitcoin::script::Builder;
use bitcoin::secp256k1::PublicKey;

use crate::{Error, FundingInput, Payout, DUST_LIMIT, TX_VERSION};


/// The weight of a funding transaction without inputs and change outputs.
const FUND_TX_BASE_WEIGHT: u64 = 214;

/// The weight of a CET excluding payout outputs.
const CET_BASE_WEIGHT: u64 = 500;

/// The base weight of a transaction input: (outpoint(36) + sequence(4) +
/// scriptPubKeySize(1)) * 4.
const TX_INPUT_BASE_WEIGHT: u64 = 164;


/// The parameters one party contributes to the contract transactions.
///
/// These are the common fields between the offer and accept messages.
#[derive(Debug, Clone)]
pub struct PartyParams {
	/// The public key for the funding output multisig.
	pub fund_pubkey: PublicKey,
	pub change_spk: ScriptBuf,
	pub payout_spk: ScriptBuf,
	pub inputs: Vec<FundingInput>,
	pub collateral: Amount,
}

impl PartyParams {
	/// The sum of this party's input values, or [None] on overflow.
	pub fn input_amount(&self) -> Option<Amount> {
		self.inputs.iter().try_fold(Amount::ZERO, |acc, i| acc.checked_add(i.amount()))
	}

	/// Returns the change output for this party as well as the fees it pays
	/// for the funding transaction and for the CET or refund transaction.
	///
	/// The change value already accounts for the fees. Fails with
	/// [Error::InsufficientFunds] when the inputs don't cover
	/// collateral plus fees at the given fee rate.
	pub fn change_output_and_fees(
		&self,
		fee_rate: FeeRate,
	) -> Result<(TxOut, Amount, Amount), Error> {
		let inputs_weight = self.inputs.iter()
			.map(|i| TX_INPUT_BASE_WEIGHT + i.max_witness_len as u64)
			.sum::<u64>();

		// Change output scaled by 4 from vbytes to weight units.
		let change_weight = self.change_spk.len() as u64 * 4;

		// The base weight is split between the parties independently of the
		// inputs each contributes; the 36 extra units are this party's half
		// of the funding output.
		let fund_weight = FUND_TX_BASE_WEIGHT / 2 + inputs_weight + change_weight + 36;
		let fund_fee = weight_to_fee(fund_weight, fee_rate)?;

		let cet_weight = CET_BASE_WEIGHT / 2 + self.payout_spk.len() as u64 * 4;
		let cet_or_refund_fee = weight_to_fee(cet_weight, fee_rate)?;

		// The amounts are negotiated values, reject overflow as an error.
		let required = self.collateral.checked_add(fund_fee)
			.and_then(|a| a.checked_add(cet_or_refund_fee))
			.ok_or(Error::InvalidArgument("collateral and fees overflow"))?;
		let input_amount = self.input_amount()
			.ok_or(Error::InvalidArgument("funding input amounts overflow"))?;
		if input_amount < required {
			return Err(Error::InsufficientFunds);
		}

		let change_output = TxOut {
			value: input_amount - required,
			script_pubkey: self.change_spk.clone(),
		};
		Ok((change_output, fund_fee, cet_or_refund_fee))
	}

	fn unsigned_tx_inputs(&self, sequence: Sequence) -> Vec<TxIn> {
		self.inputs.iter()
			.map(|i| TxIn {
				previous_output: i.outpoint,
				script_sig: ScriptBuf::new(),
				sequence,
				witness: Witness::new(),
			})
			.collect()
	}
}

/// The transactions establishing a contract.
#[derive(Debug, Clone)]
pub struct DlcTransactions {
	/// The funding transaction locking both parties' collateral.
	pub fund: Transaction,
	/// One contract execution transaction per outcome, in canonical
	/// outcome order.
	pub cets: Vec<Transaction>,
	/// The refund transaction returning each party's collateral after the
	/// refund locktime.
	pub refund: Transaction,
	/// The funding output's 2-of-2 redeem script.
	pub funding_script: ScriptBuf,
}

impl DlcTransactions {
	/// The outpoint of the funding output spent by every CET and the refund.
	pub fn funding_outpoint(&self) -> OutPoint {
		OutPoint { txid: self.fund.compute_txid(), vout: 0 }
	}

	/// The value locked in the funding output.
	pub fn funding_value(&self) -> Amount {
		self.fund.output[0].value
	}
}

fn weight_to_fee(weight: u64, fee_rate: FeeRate) -> Result<Amount, Error> {
	let vb = (weight + 3) / 4;
	fee_rate.fee_vb(vb).ok_or(Error::InvalidArgument("fee computation overflow"))
}

fn sequence_for(lock_time: u32) -> Sequence {
	if lock_time == 0 {
		Sequence::MAX
	} else {
		Sequence::ENABLE_LOCKTIME_NO_RBF
	}
}

/// Create all the transactions for a contract based on the provided
/// parameters. Fails if any payout doesn't split the total collateral.
pub fn create_dlc_transactions(
	offer_params: &PartyParams,
	accept_params: &PartyParams,
	payouts: &[Payout],
	refund_lock_time: u32,
	fee_rate: FeeRate,
	fund_lock_time: u32,
	cet_lock_time: u32,
) -> Result<DlcTransactions, Error> {
	let total_collateral = offer_params.collateral.checked_add(accept_params.collateral)
		.ok_or(Error::InvalidArgument("collateral amounts overflow"))?;
	if payouts.is_empty() {
		return Err(Error::InvalidArgument("contract needs at least one payout"));
	}
	if payouts.iter().any(|p| p.total() != Some(total_collateral)) {
		return Err(Error::InvalidArgument("outcome payouts don't sum to total collateral"));
	}

	let (offer_change, _, offer_cet_fee) = offer_params.change_output_and_fees(fee_rate)?;
	let (accept_change, _, accept_cet_fee) = accept_params.change_output_and_fees(fee_rate)?;

	// The funding output carries the collateral plus the fee of the later
	// CET or refund spend.
	let fund_value = total_collateral.checked_add(offer_cet_fee)
		.and_then(|v| v.checked_add(accept_cet_fee))
		.ok_or(Error::InvalidArgument("collateral and fees overflow"))?;

	let fund_sequence = sequence_for(fund_lock_time);
	let offer_tx_ins = offer_params.unsigned_tx_inputs(fund_sequence);
	let accept_tx_ins = accept_params.unsigned_tx_inputs(fund_sequence);

	let funding_script =
		funding_redeemscript(&offer_params.fund_pubkey, &accept_params.fund_pubkey);

	let fund = create_funding_transaction(
		&funding_script,
		fund_value,
		offer_tx_ins,
		accept_tx_ins,
		offer_change,
		accept_change,
		fund_lock_time,
	);

	let fund_tx_in = TxIn {
		previous_output: OutPoint { txid: fund.compute_txid(), vout: 0 },
		script_sig: ScriptBuf::new(),
		sequence: sequence_for(cet_lock_time),
		witness: Witness::new(),
	};

	let cets = create_cets(
		&fund_tx_in,
		&offer_params.payout_spk,
		&accept_params.payout_spk,
		payouts,
		cet_lock_time,
	);

	let refund = create_refund_transaction(
		TxOut {
			value: offer_params.collateral,
			script_pubkey: offer_params.payout_spk.clone(),
		},
		TxOut {
			value: accept_params.collateral,
			script_pubkey: accept_params.payout_spk.clone(),
		},
		fund_tx_in,
		refund_lock_time,
	);

	Ok(DlcTransactions { fund, cets, refund, funding_script })
}

/// Create a contract execution transaction. Dust outputs are discarded.
pub fn create_cet(
	offer_output: TxOut,
	accept_output: TxOut,
	fund_tx_in: &TxIn,
	lock_time: u32,
) -> Transaction {
	let output = [offer_output, accept_output].into_iter()
		.filter(|o| o.value >= DUST_LIMIT)
		.collect();

	Transaction {
		version: TX_VERSION,
		lock_time: absolute::LockTime::from_consensus(lock_time),
		input: vec![fund_tx_in.clone()],
		output,
	}
}

/// Create one contract execution transaction per payout.
pub fn create_cets(
	fund_tx_in: &TxIn,
	offer_payout_spk: &ScriptBuf,
	accept_payout_spk: &ScriptBuf,
	payouts: &[Payout],
	lock_time: u32,
) -> Vec<Transaction> {
	payouts.iter()
		.map(|payout| {
			let offer_output = TxOut {
				value: payout.offer,
				script_pubkey: offer_payout_spk.clone(),
			};
			let accept_output = TxOut {
				value: payout.accept,
				script_pubkey: accept_payout_spk.clone(),
			};
			create_cet(offer_output, accept_output, fund_tx_in, lock_time)
		})
		.collect()
}

/// Create the funding transaction.
///
/// The funding output is always output 0; dust change outputs are dropped.
pub fn create_funding_transaction(
	funding_script: &ScriptBuf,
	fund_value: Amount,
	offer_inputs: Vec<TxIn>,
	accept_inputs: Vec<TxIn>,
	offer_change: TxOut,
	accept_change: TxOut,
	lock_time: u32,
) -> Transaction {
	let fund_output = TxOut {
		value: fund_value,
		script_pubkey: funding_script.to_p2wsh(),
	};
	let output = [fund_output, offer_change, accept_change].into_iter()
		.filter(|o| o.value >= DUST_LIMIT)
		.collect();

	let input = offer_inputs.into_iter().chain(accept_inputs).collect();

	Transaction {
		version: TX_VERSION,
		lock_time: absolute::LockTime::from_consensus(lock_time),
		input,
		output,
	}
}

/// Create the refund transaction. Dust payouts are discarded.
pub fn create_refund_transaction(
	offer_output: TxOut,
	accept_output: TxOut,
	funding_input: TxIn,
	lock_time: u32,
) -> Transaction {
	let output = [offer_output, accept_output].into_iter()
		.filter(|o| o.value >= DUST_LIMIT)
		.collect();

	Transaction {
		version: TX_VERSION,
		lock_time: absolute::LockTime::from_consensus(lock_time),
		input: vec![funding_input],
		output,
	}
}

/// The 2-of-2 multisig redeem script for the funding output.
///
/// Keys are ordered lexicographically by their serialization so both
/// parties derive the same script.
pub fn funding_redeemscript(a: &PublicKey, b: &PublicKey) -> ScriptBuf {
	let (first, second) = if a.serialize() <= b.serialize() { (a, b) } else { (b, a) };

	Builder::new()
		.push_opcode(opcodes::all::OP_PUSHNUM_2)
		.push_slice(&first.serialize())
		.push_slice(&second.serialize())
		.push_opcode(opcodes::all::OP_PUSHNUM_2)
		.push_opcode(opcodes::all::OP_CHECKMULTISIG)
		.into_script()
}


#[cfg(test)]
mod test {
	use super::*;
	use bitcoin::secp256k1::Keypair;
	use bitcoin::secp256k1::rand::thread_rng;

	use crate::{P2WPKH_WITNESS_LEN, SECP};

	fn dummy_input(value: Amount, vout: u32) -> FundingInput {
		FundingInput {
			outpoint: OutPoint {
				txid: "f338d94399994750d07607e2984b38d967b91fcc0d05e5dd856d674832620ba6"
					.parse().unwrap(),
				vout,
			},
			prev_output: TxOut {
				value,
				script_pubkey: ScriptBuf::from_bytes(vec![0x00, 0x14, 1, 2, 3, 4]),
			},
			max_witness_len: P2WPKH_WITNESS_LEN,
		}
	}

	fn params(collateral: Amount, input: Amount, vout: u32) -> PartyParams {
		PartyParams {
			fund_pubkey: Keypair::new(&*SECP, &mut thread_rng()).public_key(),
			change_spk: ScriptBuf::from_bytes(vec![0x00, 0x14, 5, 5, 5, 5]),
			payout_spk: ScriptBuf::from_bytes(vec![0x00, 0x14, 6, 6, 6, 6]),
			inputs: vec![dummy_input(input, vout)],
			collateral,
		}
	}

	fn even_payouts(total: Amount) -> Vec<Payout> {
		vec![
			Payout { offer: total, accept: Amount::ZERO },
			Payout { offer: Amount::ZERO, accept: total },
		]
	}

	#[test]
	fn transactions_balance() {
		let offer = params(Amount::from_sat(60_000), Amount::from_sat(100_000), 0);
		let accept = params(Amount::from_sat(40_000), Amount::from_sat(100_000), 1);
		let total = Amount::from_sat(100_000);
		let txs = create_dlc_transactions(
			&offer, &accept, &even_payouts(total), 1_001_000,
			FeeRate::from_sat_per_vb_unchecked(2), 0, 1_000_000,
		).unwrap();

		assert_eq!(txs.fund.input.len(), 2);
		// Funding output plus both changes.
		assert_eq!(txs.fund.output.len(), 3);
		assert!(txs.funding_value() > total);
		assert_eq!(txs.fund.output[0].script_pubkey, txs.funding_script.to_p2wsh());

		assert_eq!(txs.cets.len(), 2);
		for cet in &txs.cets {
			// All-or-nothing payouts leave a single above-dust output.
			assert_eq!(cet.output.len(), 1);
			assert_eq!(cet.input[0].previous_output, txs.funding_outpoint());
			assert_eq!(cet.lock_time.to_consensus_u32(), 1_000_000);
		}

		assert_eq!(txs.refund.output.len(), 2);
		assert_eq!(txs.refund.output[0].value, offer.collateral);
		assert_eq!(txs.refund.output[1].value, accept.collateral);
		assert_eq!(txs.refund.lock_time.to_consensus_u32(), 1_001_000);
	}

	#[test]
	fn bad_payout_sum_rejected() {
		let offer = params(Amount::from_sat(60_000), Amount::from_sat(100_000), 0);
		let accept = params(Amount::from_sat(40_000), Amount::from_sat(100_000), 1);
		let payouts = vec![Payout {
			offer: Amount::from_sat(1),
			accept: Amount::from_sat(2),
		}];
		assert!(create_dlc_transactions(
			&offer, &accept, &payouts, 1_001_000,
			FeeRate::from_sat_per_vb_unchecked(2), 0, 1_000_000,
		).is_err());
	}

	#[test]
	fn insufficient_inputs_rejected() {
		let poor = params(Amount::from_sat(60_000), Amount::from_sat(60_000), 0);
		assert!(matches!(
			poor.change_output_and_fees(FeeRate::from_sat_per_vb_unchecked(2)),
			Err(Error::InsufficientFunds),
		));
	}

	#[test]
	fn overflowing_collateral_rejected() {
		// Collaterals come off the wire, their sum overflowing is an error.
		let offer = params(Amount::from_sat(u64::MAX), Amount::from_sat(100_000), 0);
		let accept = params(Amount::from_sat(1), Amount::from_sat(100_000), 1);
		assert!(create_dlc_transactions(
			&offer, &accept, &even_payouts(Amount::from_sat(100_000)), 1_001_000,
			FeeRate::from_sat_per_vb_unchecked(2), 0, 1_000_000,
		).is_err());
	}

	#[test]
	fn one_sided_refund_drops_dust_output() {
		let offer = params(Amount::from_sat(100_000), Amount::from_sat(150_000), 0);
		let accept = params(Amount::ZERO, Amount::from_sat(10_000), 1);
		let total = Amount::from_sat(100_000);
		let txs = create_dlc_transactions(
			&offer, &accept, &even_payouts(total), 1_001_000,
			FeeRate::from_sat_per_vb_unchecked(2), 0, 1_000_000,
		).unwrap();
		// The accepter has no collateral so the refund pays out only the offerer.
		assert_eq!(txs.refund.output.len(), 1);
	}

	#[test]
	fn funding_script_is_symmetric() {
		let a = Keypair::new(&*SECP, &mut thread_rng()).public_key();
		let b = Keypair::new(&*SECP, &mut thread_rng()).public_key();
		assert_eq!(funding_redeemscript(&a, &b), funding_redeemscript(&b, &a));
	}
}
