
pub extern crate bitcoin;

#[macro_use] extern crate lazy_static;
#[macro_use] extern crate serde;

pub mod encode;
pub mod messages;
pub mod numeric;
pub mod txbuilder;
pub mod verify;

pub use encode::{ProtocolEncoding, ProtocolDecodingError};


use std::{fmt, io};
use std::str::FromStr;

use bitcoin::{Amount, OutPoint, TxOut};
use bitcoin::hashes::{sha256, Hash, HashEngine};
use bitcoin::secp256k1;

use crate::encode::{ReadExt, WriteExt};

lazy_static! {
	/// Global secp context.
	pub static ref SECP: secp256k1::Secp256k1<secp256k1::All> = secp256k1::Secp256k1::new();
}

/// Value under which transaction outputs are discarded.
pub const DUST_LIMIT: Amount = Amount::from_sat(1000);

/// The version used for all contract transactions.
pub const TX_VERSION: bitcoin::transaction::Version = bitcoin::transaction::Version::TWO;

/// Witness weight of a p2wpkh spend.
pub const P2WPKH_WITNESS_LEN: u32 = 107;


/// Errors for pure protocol-level operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid argument: {0}")]
	InvalidArgument(&'static str),
	#[error("funding inputs don't cover collateral and fees")]
	InsufficientFunds,
	#[error("secp256k1 error: {0}")]
	Secp(#[from] secp256k1::Error),
}


/// The deterministic identifier of a contract.
///
/// Computed by hashing the offerer's funding outpoints in the order the
/// offerer declared them, see [compute_contract_id]. It is the join key for
/// every per-contract record on both sides of the negotiation.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContractId([u8; 32]);

impl ContractId {
	/// Size in bytes of an encoded [ContractId].
	pub const ENCODE_SIZE: usize = 32;

	pub fn from_slice(b: &[u8]) -> Result<ContractId, &'static str> {
		if b.len() == 32 {
			let mut ret = [0u8; 32];
			ret[..].copy_from_slice(&b[0..32]);
			Ok(Self(ret))
		} else {
			Err("invalid contract id length; must be 32 bytes")
		}
	}

	pub fn bytes(self) -> [u8; 32] {
		self.0
	}
}

impl AsRef<[u8]> for ContractId {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl fmt::Display for ContractId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use bitcoin::hex::DisplayHex;
		fmt::Display::fmt(&self.0.as_hex(), f)
	}
}

impl fmt::Debug for ContractId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl FromStr for ContractId {
	type Err = hex_conservative::HexToArrayError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		use hex_conservative::FromHex;
		Ok(ContractId(<[u8; 32]>::from_hex(s)?))
	}
}

impl serde::Serialize for ContractId {
	fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
		if s.is_human_readable() {
			s.collect_str(self)
		} else {
			s.serialize_bytes(self.as_ref())
		}
	}
}

impl<'de> serde::Deserialize<'de> for ContractId {
	fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
		struct Visitor;
		impl<'de> serde::de::Visitor<'de> for Visitor {
			type Value = ContractId;
			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "a ContractId")
			}
			fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
				ContractId::from_slice(v).map_err(serde::de::Error::custom)
			}
			fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
				ContractId::from_str(v).map_err(serde::de::Error::custom)
			}
		}
		if d.is_human_readable() {
			d.deserialize_str(Visitor)
		} else {
			d.deserialize_bytes(Visitor)
		}
	}
}

impl ProtocolEncoding for ContractId {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		w.emit_slice(&self.0)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let mut buf = [0; 32];
		r.read_slice(&mut buf)?;
		Ok(ContractId(buf))
	}
}

/// Compute the contract id from the offerer's funding outpoints.
///
/// The outpoints are hashed in the given order; both parties must use the
/// offerer-declared order regardless of how they later store the inputs.
/// Fails only on empty input.
pub fn compute_contract_id(funding_outpoints: &[OutPoint]) -> Result<ContractId, Error> {
	if funding_outpoints.is_empty() {
		return Err(Error::InvalidArgument("contract id requires at least one funding outpoint"));
	}
	let mut engine = sha256::Hash::engine();
	for outpoint in funding_outpoints {
		let mut buf = Vec::with_capacity(36);
		outpoint.encode(&mut buf).expect("buffers don't produce I/O errors");
		engine.input(&buf);
	}
	Ok(ContractId(sha256::Hash::from_engine(engine).to_byte_array()))
}


/// The payout for a single contract outcome, split between the two parties.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Payout {
	#[serde(with = "bitcoin::amount::serde::as_sat")]
	pub offer: Amount,
	#[serde(with = "bitcoin::amount::serde::as_sat")]
	pub accept: Amount,
}

impl Payout {
	/// The combined payout, or [None] when the amounts overflow.
	///
	/// The amounts come from the counterparty, so overflow is an input to
	/// reject, not a bug.
	pub fn total(&self) -> Option<Amount> {
		self.offer.checked_add(self.accept)
	}
}

impl ProtocolEncoding for Payout {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		self.offer.encode(w)?;
		self.accept.encode(w)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		Ok(Payout {
			offer: Amount::decode(r)?,
			accept: Amount::decode(r)?,
		})
	}
}


/// A wallet utxo contributed to the funding transaction by one party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingInput {
	pub outpoint: OutPoint,
	/// The output being spent, needed to verify funding signatures.
	pub prev_output: TxOut,
	/// Upper bound on the witness size of the spend, for fee computation.
	pub max_witness_len: u32,
}

impl FundingInput {
	pub fn amount(&self) -> Amount {
		self.prev_output.value
	}
}

impl ProtocolEncoding for FundingInput {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		self.outpoint.encode(w)?;
		self.prev_output.encode(w)?;
		w.emit_u32(self.max_witness_len)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		Ok(FundingInput {
			outpoint: ProtocolEncoding::decode(r)?,
			prev_output: ProtocolEncoding::decode(r)?,
			max_witness_len: r.read_u32()?,
		})
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn outpoints() -> Vec<OutPoint> {
		vec![
			"f338d94399994750d07607e2984b38d967b91fcc0d05e5dd856d674832620ba6:2".parse().unwrap(),
			"91cc47b491ae94ea71cd727959e1758cdc3c0d8b14432497122ba9c566794be2:0".parse().unwrap(),
			"0cd1965a17fec47521b619d56225abc6a33f73c6afac353048e5f386e10c6bf1:1".parse().unwrap(),
		]
	}

	#[test]
	fn contract_id_deterministic() {
		let id1 = compute_contract_id(&outpoints()).unwrap();
		let id2 = compute_contract_id(&outpoints()).unwrap();
		assert_eq!(id1, id2);
	}

	#[test]
	fn contract_id_order_sensitive() {
		let mut reordered = outpoints();
		reordered.swap(0, 2);
		let id1 = compute_contract_id(&outpoints()).unwrap();
		let id2 = compute_contract_id(&reordered).unwrap();
		assert_ne!(id1, id2);
	}

	#[test]
	fn contract_id_empty_input() {
		assert!(compute_contract_id(&[]).is_err());
	}

	#[test]
	fn contract_id_str_roundtrip() {
		let id = compute_contract_id(&outpoints()).unwrap();
		assert_eq!(id, ContractId::from_str(&id.to_string()).unwrap());
	}
}
