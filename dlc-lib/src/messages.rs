//!
//! The contract model: oracle announcements, contract descriptors and the
//! offer/accept/sign wire messages.
//!
//! Messages are immutable once emitted. All of them implement
//! [ProtocolEncoding]; the three top-level handshake messages additionally
//! carry a trailing TLV extension stream for forward compatibility.
//!

use std::io;

use bitcoin::{Amount, OutPoint, ScriptBuf};
use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::{ecdsa, schnorr, Message, XOnlyPublicKey, PublicKey};

use crate::{numeric, ContractId, Error, FundingInput, Payout};
use crate::encode::{
	read_tlvs_to_end, write_tlvs, ProtocolDecodingError, ProtocolEncoding, ReadExt, TlvRecord,
	WriteExt,
};


/// The protocol version declared in every handshake message.
pub const PROTOCOL_VERSION: u8 = 1;

/// Upper bound on the number of CETs a contract may expand to.
///
/// A payout curve whose prefix expansion exceeds this is rejected rather
/// than signed one CET at a time.
pub const MAX_OUTCOME_COUNT: usize = 1 << 16;


/// The kind of outcome an oracle event attests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDescriptor {
	/// One outcome out of a fixed list of labels.
	Enumeration {
		outcomes: Vec<String>,
	},
	/// A numeric value attested digit by digit.
	DigitDecomposition {
		base: u16,
		nb_digits: u16,
	},
}

impl EventDescriptor {
	/// The number of nonces the oracle commits to for this event.
	pub fn nb_nonces(&self) -> usize {
		match self {
			Self::Enumeration { .. } => 1,
			Self::DigitDecomposition { nb_digits, .. } => *nb_digits as usize,
		}
	}
}

impl ProtocolEncoding for EventDescriptor {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		match self {
			Self::Enumeration { outcomes } => {
				w.emit_u8(0)?;
				outcomes.encode(w)
			},
			Self::DigitDecomposition { base, nb_digits } => {
				w.emit_u8(1)?;
				w.emit_u16(*base)?;
				w.emit_u16(*nb_digits)
			},
		}
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		match r.read_u8()? {
			0 => Ok(Self::Enumeration { outcomes: Vec::decode(r)? }),
			1 => Ok(Self::DigitDecomposition {
				base: r.read_u16()?,
				nb_digits: r.read_u16()?,
			}),
			t => Err(ProtocolDecodingError::invalid(
				format_args!("unknown event descriptor type {}", t),
			)),
		}
	}
}

/// The event an oracle commits to attest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleEvent {
	pub nonces: Vec<XOnlyPublicKey>,
	pub event_maturity: u32,
	pub descriptor: EventDescriptor,
	pub event_id: String,
}

impl ProtocolEncoding for OracleEvent {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		self.nonces.encode(w)?;
		w.emit_u32(self.event_maturity)?;
		self.descriptor.encode(w)?;
		self.event_id.encode(w)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		Ok(OracleEvent {
			nonces: Vec::decode(r)?,
			event_maturity: r.read_u32()?,
			descriptor: EventDescriptor::decode(r)?,
			event_id: String::decode(r)?,
		})
	}
}

/// An oracle's signed commitment to attest one of a fixed set of outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleAnnouncement {
	pub signature: schnorr::Signature,
	pub oracle_pubkey: XOnlyPublicKey,
	pub event: OracleEvent,
}

impl OracleAnnouncement {
	/// The digest the oracle signed: the hash of the serialized event.
	pub fn signed_digest(&self) -> Message {
		let hash = sha256::Hash::hash(&self.event.serialize());
		Message::from_digest(hash.to_byte_array())
	}

	/// Storage identifier of this announcement, independent of any contract.
	pub fn id(&self) -> sha256::Hash {
		sha256::Hash::hash(&self.serialize())
	}
}

impl ProtocolEncoding for OracleAnnouncement {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		self.signature.encode(w)?;
		self.oracle_pubkey.encode(w)?;
		self.event.encode(w)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		Ok(OracleAnnouncement {
			signature: ProtocolEncoding::decode(r)?,
			oracle_pubkey: ProtocolEncoding::decode(r)?,
			event: OracleEvent::decode(r)?,
		})
	}
}

/// An oracle's signed statement of the outcome of one of its events.
///
/// For enumerated events this holds a single signature and outcome label;
/// for digit-decomposed events one signature and one digit string per digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleAttestation {
	pub event_id: String,
	pub oracle_pubkey: XOnlyPublicKey,
	pub signatures: Vec<schnorr::Signature>,
	pub outcomes: Vec<String>,
}

impl OracleAttestation {
	/// The digest signed for a single outcome string.
	pub fn outcome_digest(outcome: &str) -> Message {
		let hash = sha256::Hash::hash(outcome.as_bytes());
		Message::from_digest(hash.to_byte_array())
	}

	/// Parse the attested outcome strings as digits.
	pub fn digits(&self) -> Result<Vec<u16>, Error> {
		self.outcomes.iter()
			.map(|o| o.parse::<u16>()
				.map_err(|_| Error::InvalidArgument("attested outcome is not a digit")))
			.collect()
	}
}

impl ProtocolEncoding for OracleAttestation {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		self.event_id.encode(w)?;
		self.oracle_pubkey.encode(w)?;
		self.signatures.encode(w)?;
		self.outcomes.encode(w)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		Ok(OracleAttestation {
			event_id: String::decode(r)?,
			oracle_pubkey: ProtocolEncoding::decode(r)?,
			signatures: Vec::decode(r)?,
			outcomes: Vec::decode(r)?,
		})
	}
}


/// The payout split attached to a single enumerated outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationPayout {
	pub outcome: String,
	pub payout: Payout,
}

impl ProtocolEncoding for EnumerationPayout {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		self.outcome.encode(w)?;
		self.payout.encode(w)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		Ok(EnumerationPayout {
			outcome: String::decode(r)?,
			payout: Payout::decode(r)?,
		})
	}
}

/// A point on the payout curve of a numeric contract.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PayoutPoint {
	pub event_outcome: u64,
	/// The offerer's payout at this outcome; the accepter gets the rest.
	pub offer_payout: Amount,
}

impl ProtocolEncoding for PayoutPoint {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		w.emit_u64(self.event_outcome)?;
		self.offer_payout.encode(w)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		Ok(PayoutPoint {
			event_outcome: r.read_u64()?,
			offer_payout: Amount::decode(r)?,
		})
	}
}

/// Payout description for a digit-decomposed numeric event.
///
/// The payout curve is piecewise linear between the given points, which must
/// be sorted by outcome and span the whole attestable domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericDescriptor {
	pub base: u16,
	pub nb_digits: u16,
	pub payout_points: Vec<PayoutPoint>,
}

impl NumericDescriptor {
	fn check_points(&self, total: Amount) -> Result<(), Error> {
		let max = numeric::max_value(self.base, self.nb_digits)
			.ok_or(Error::InvalidArgument("digit domain overflows u64"))?;
		if self.payout_points.len() < 2 {
			return Err(Error::InvalidArgument("numeric descriptor needs at least two payout points"));
		}
		if self.payout_points.first().unwrap().event_outcome != 0
			|| self.payout_points.last().unwrap().event_outcome != max - 1
		{
			return Err(Error::InvalidArgument("payout points must span the whole outcome domain"));
		}
		for w in self.payout_points.windows(2) {
			if w[0].event_outcome >= w[1].event_outcome {
				return Err(Error::InvalidArgument("payout points must be strictly increasing"));
			}
		}
		if self.payout_points.iter().any(|p| p.offer_payout > total) {
			return Err(Error::InvalidArgument("payout point exceeds total collateral"));
		}
		Ok(())
	}

	/// The offerer's payout at the given outcome value, by linear
	/// interpolation between the surrounding payout points.
	fn offer_payout_at(&self, value: u64) -> Amount {
		let points = &self.payout_points;
		let seg = points.windows(2)
			.find(|w| value >= w[0].event_outcome && value <= w[1].event_outcome)
			.expect("value within checked domain");
		let (x0, y0) = (seg[0].event_outcome as i128, seg[0].offer_payout.to_sat() as i128);
		let (x1, y1) = (seg[1].event_outcome as i128, seg[1].offer_payout.to_sat() as i128);
		let num = (value as i128 - x0) * (y1 - y0);
		let den = x1 - x0;
		// Round to nearest satoshi.
		let interp = y0 + (2 * num + den) / (2 * den);
		Amount::from_sat(interp.max(0) as u64)
	}

	/// Last value of the maximal run of constant payout starting at `start`.
	///
	/// The payout is monotone within each linear segment, so the run
	/// boundary is found by binary search per segment instead of walking
	/// every value of the domain.
	fn run_end(&self, start: u64, payout: Amount) -> u64 {
		let mut end = start;
		loop {
			let seg = match self.payout_points.windows(2)
				.find(|w| end >= w[0].event_outcome && end < w[1].event_outcome)
			{
				Some(w) => w,
				// Only the last domain value lies past every segment start.
				None => return end,
			};
			let (mut lo, mut hi) = (end, seg[1].event_outcome);
			while lo < hi {
				let mid = lo + (hi - lo + 1) / 2;
				if self.offer_payout_at(mid) == payout {
					lo = mid;
				} else {
					hi = mid - 1;
				}
			}
			if lo < seg[1].event_outcome {
				return lo;
			}
			// The run reaches the segment end, it may continue in the next.
			end = lo;
		}
	}

	/// Expand the payout curve into per-CET outcomes.
	///
	/// Runs of consecutive values with the same payout become digit-prefix
	/// outcomes. Expansions beyond [MAX_OUTCOME_COUNT] outcomes are
	/// rejected.
	fn outcome_payouts(&self, total: Amount) -> Result<Vec<(OutcomeSpec, Payout)>, Error> {
		self.check_points(total)?;
		let max = numeric::max_value(self.base, self.nb_digits).unwrap();

		let mut ret = Vec::new();
		let mut cur = 0u64;
		while cur < max {
			let offer = self.offer_payout_at(cur);
			let end = self.run_end(cur, offer);
			let accept = total.checked_sub(offer)
				.ok_or(Error::InvalidArgument("payout exceeds total collateral"))?;
			let payout = Payout { offer, accept };
			for prefix in numeric::prefix_cover(cur, end, self.base, self.nb_digits)? {
				ret.push((OutcomeSpec::Digits(prefix), payout));
			}
			if ret.len() > MAX_OUTCOME_COUNT {
				return Err(Error::InvalidArgument("payout curve expands to too many outcomes"));
			}
			cur = match end.checked_add(1) {
				Some(next) => next,
				None => break,
			};
		}
		Ok(ret)
	}
}

impl ProtocolEncoding for NumericDescriptor {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		w.emit_u16(self.base)?;
		w.emit_u16(self.nb_digits)?;
		self.payout_points.encode(w)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		Ok(NumericDescriptor {
			base: r.read_u16()?,
			nb_digits: r.read_u16()?,
			payout_points: Vec::decode(r)?,
		})
	}
}

/// How a contract maps oracle outcomes to payouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractDescriptor {
	Enumerated(Vec<EnumerationPayout>),
	Numeric(NumericDescriptor),
}

impl ContractDescriptor {
	/// Whether this descriptor can settle over the given oracle event.
	pub fn matches_event(&self, event: &EventDescriptor) -> bool {
		match (self, event) {
			(Self::Enumerated(payouts), EventDescriptor::Enumeration { outcomes }) => {
				payouts.len() == outcomes.len()
					&& payouts.iter().all(|p| outcomes.contains(&p.outcome))
			},
			(Self::Numeric(d), EventDescriptor::DigitDecomposition { base, nb_digits }) => {
				d.base == *base && d.nb_digits == *nb_digits
			},
			_ => false,
		}
	}

	/// Expand the descriptor into the outcome list backing the CET set.
	///
	/// For every returned outcome the payouts sum to the total collateral.
	pub fn outcome_payouts(&self, total: Amount) -> Result<Vec<(OutcomeSpec, Payout)>, Error> {
		match self {
			Self::Enumerated(payouts) => {
				if payouts.is_empty() {
					return Err(Error::InvalidArgument("enumerated descriptor without outcomes"));
				}
				payouts.iter().map(|p| {
					if p.payout.total() != Some(total) {
						return Err(Error::InvalidArgument(
							"outcome payouts don't sum to total collateral",
						));
					}
					Ok((OutcomeSpec::Enumeration(p.outcome.clone()), p.payout))
				}).collect()
			},
			Self::Numeric(d) => d.outcome_payouts(total),
		}
	}
}

impl ProtocolEncoding for ContractDescriptor {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		match self {
			Self::Enumerated(payouts) => {
				w.emit_u8(0)?;
				payouts.encode(w)
			},
			Self::Numeric(d) => {
				w.emit_u8(1)?;
				d.encode(w)
			},
		}
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		match r.read_u8()? {
			0 => Ok(Self::Enumerated(Vec::decode(r)?)),
			1 => Ok(Self::Numeric(NumericDescriptor::decode(r)?)),
			t => Err(ProtocolDecodingError::invalid(
				format_args!("unknown contract descriptor type {}", t),
			)),
		}
	}
}

/// A single settleable outcome of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutcomeSpec {
	/// An enumerated outcome label.
	Enumeration(String),
	/// A digit prefix; the empty prefix matches every attested value.
	Digits(Vec<u16>),
}

impl OutcomeSpec {
	/// The digests the oracle must have signed for this outcome to settle.
	///
	/// A digit prefix of length `k` only requires the first `k` digit
	/// signatures of the attestation.
	pub fn signed_digests(&self) -> Vec<Message> {
		match self {
			Self::Enumeration(outcome) => {
				vec![OracleAttestation::outcome_digest(outcome)]
			},
			Self::Digits(digits) => digits.iter()
				.map(|d| OracleAttestation::outcome_digest(&d.to_string()))
				.collect(),
		}
	}

	/// Whether an attestation's outcome strings settle this outcome.
	pub fn matches_attestation(&self, attested: &[String]) -> bool {
		match self {
			Self::Enumeration(outcome) => {
				attested.len() == 1 && attested[0] == *outcome
			},
			Self::Digits(prefix) => {
				let digits = attested.iter()
					.map(|o| o.parse::<u16>().ok())
					.collect::<Option<Vec<_>>>();
				match digits {
					Some(digits) => numeric::prefix_matches(prefix, &digits),
					None => false,
				}
			},
		}
	}
}

/// The contract terms shared by both parties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
	pub total_collateral: Amount,
	pub descriptor: ContractDescriptor,
	pub oracle_announcements: Vec<OracleAnnouncement>,
}

impl ContractInfo {
	/// Check internal consistency: at least one oracle, descriptor matching
	/// every announced event, and payouts summing to the total collateral.
	pub fn validate(&self) -> Result<(), Error> {
		if self.oracle_announcements.is_empty() {
			return Err(Error::InvalidArgument("contract needs at least one oracle"));
		}
		for ann in &self.oracle_announcements {
			if !self.descriptor.matches_event(&ann.event.descriptor) {
				return Err(Error::InvalidArgument("contract descriptor doesn't match oracle event"));
			}
			if ann.event.nonces.len() != ann.event.descriptor.nb_nonces() {
				return Err(Error::InvalidArgument("announcement nonce count doesn't match event"));
			}
		}
		// Also validates the payout sums.
		self.descriptor.outcome_payouts(self.total_collateral)?;
		Ok(())
	}

	/// The outcome list backing the CET set, in canonical order.
	pub fn outcome_payouts(&self) -> Result<Vec<(OutcomeSpec, Payout)>, Error> {
		self.descriptor.outcome_payouts(self.total_collateral)
	}
}

impl ProtocolEncoding for ContractInfo {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		self.total_collateral.encode(w)?;
		self.descriptor.encode(w)?;
		self.oracle_announcements.encode(w)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		Ok(ContractInfo {
			total_collateral: Amount::decode(r)?,
			descriptor: ContractDescriptor::decode(r)?,
			oracle_announcements: Vec::decode(r)?,
		})
	}
}


fn check_version(version: u8) -> Result<(), ProtocolDecodingError> {
	if version != PROTOCOL_VERSION {
		return Err(ProtocolDecodingError::invalid(
			format_args!("unsupported protocol version {}", version),
		));
	}
	Ok(())
}

/// The offering party's opening message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferDlc {
	pub protocol_version: u8,
	pub contract_info: ContractInfo,
	/// The offerer's key in the funding output multisig.
	pub funding_pubkey: PublicKey,
	pub payout_spk: ScriptBuf,
	pub change_spk: ScriptBuf,
	pub collateral: Amount,
	pub funding_inputs: Vec<FundingInput>,
	pub fee_rate_sat_per_vb: u64,
	/// Locktime of every CET, the contract maturity.
	pub cet_locktime: u32,
	pub refund_locktime: u32,
	pub unknown_tlvs: Vec<TlvRecord>,
}

impl OfferDlc {
	/// The outpoints of the offerer's funding inputs in declared order.
	pub fn funding_outpoints(&self) -> Vec<OutPoint> {
		self.funding_inputs.iter().map(|i| i.outpoint).collect()
	}

	/// The contract id this offer deterministically maps to.
	pub fn contract_id(&self) -> Result<ContractId, Error> {
		crate::compute_contract_id(&self.funding_outpoints())
	}

	/// The collateral the accepting party must contribute.
	pub fn accept_collateral(&self) -> Result<Amount, Error> {
		self.contract_info.total_collateral.checked_sub(self.collateral)
			.ok_or(Error::InvalidArgument("offer collateral exceeds total collateral"))
	}
}

impl ProtocolEncoding for OfferDlc {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		w.emit_u8(self.protocol_version)?;
		self.contract_info.encode(w)?;
		self.funding_pubkey.encode(w)?;
		self.payout_spk.encode(w)?;
		self.change_spk.encode(w)?;
		self.collateral.encode(w)?;
		self.funding_inputs.encode(w)?;
		w.emit_u64(self.fee_rate_sat_per_vb)?;
		w.emit_u32(self.cet_locktime)?;
		w.emit_u32(self.refund_locktime)?;
		write_tlvs(w, &self.unknown_tlvs)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let protocol_version = r.read_u8()?;
		check_version(protocol_version)?;
		Ok(OfferDlc {
			protocol_version,
			contract_info: ContractInfo::decode(r)?,
			funding_pubkey: ProtocolEncoding::decode(r)?,
			payout_spk: ProtocolEncoding::decode(r)?,
			change_spk: ProtocolEncoding::decode(r)?,
			collateral: Amount::decode(r)?,
			funding_inputs: Vec::decode(r)?,
			fee_rate_sat_per_vb: r.read_u64()?,
			cet_locktime: r.read_u32()?,
			refund_locktime: r.read_u32()?,
			unknown_tlvs: read_tlvs_to_end(r)?,
		})
	}
}

/// The accepting party's reply, carrying its collateral, inputs and its
/// signatures over every CET and over the refund transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptDlc {
	pub protocol_version: u8,
	pub contract_id: ContractId,
	pub collateral: Amount,
	pub funding_pubkey: PublicKey,
	pub payout_spk: ScriptBuf,
	pub change_spk: ScriptBuf,
	pub funding_inputs: Vec<FundingInput>,
	/// One signature per outcome, in canonical outcome order.
	pub cet_signatures: Vec<ecdsa::Signature>,
	pub refund_signature: ecdsa::Signature,
	pub unknown_tlvs: Vec<TlvRecord>,
}

impl ProtocolEncoding for AcceptDlc {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		w.emit_u8(self.protocol_version)?;
		self.contract_id.encode(w)?;
		self.collateral.encode(w)?;
		self.funding_pubkey.encode(w)?;
		self.payout_spk.encode(w)?;
		self.change_spk.encode(w)?;
		self.funding_inputs.encode(w)?;
		self.cet_signatures.encode(w)?;
		self.refund_signature.encode(w)?;
		write_tlvs(w, &self.unknown_tlvs)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let protocol_version = r.read_u8()?;
		check_version(protocol_version)?;
		Ok(AcceptDlc {
			protocol_version,
			contract_id: ContractId::decode(r)?,
			collateral: Amount::decode(r)?,
			funding_pubkey: ProtocolEncoding::decode(r)?,
			payout_spk: ProtocolEncoding::decode(r)?,
			change_spk: ProtocolEncoding::decode(r)?,
			funding_inputs: Vec::decode(r)?,
			cet_signatures: Vec::decode(r)?,
			refund_signature: ProtocolEncoding::decode(r)?,
			unknown_tlvs: read_tlvs_to_end(r)?,
		})
	}
}

/// The offering party's closing handshake message: its signatures over the
/// funding inputs, the CETs and the refund transaction, bound to the
/// contract id of the funding-input set it signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignDlc {
	pub protocol_version: u8,
	pub contract_id: ContractId,
	/// One witness per offerer funding input, in offer order.
	pub funding_signatures: Vec<bitcoin::Witness>,
	/// One signature per outcome, in canonical outcome order.
	pub cet_signatures: Vec<ecdsa::Signature>,
	pub refund_signature: ecdsa::Signature,
	pub unknown_tlvs: Vec<TlvRecord>,
}

impl ProtocolEncoding for SignDlc {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		w.emit_u8(self.protocol_version)?;
		self.contract_id.encode(w)?;
		self.funding_signatures.encode(w)?;
		self.cet_signatures.encode(w)?;
		self.refund_signature.encode(w)?;
		write_tlvs(w, &self.unknown_tlvs)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let protocol_version = r.read_u8()?;
		check_version(protocol_version)?;
		Ok(SignDlc {
			protocol_version,
			contract_id: ContractId::decode(r)?,
			funding_signatures: Vec::decode(r)?,
			cet_signatures: Vec::decode(r)?,
			refund_signature: ProtocolEncoding::decode(r)?,
			unknown_tlvs: read_tlvs_to_end(r)?,
		})
	}
}
