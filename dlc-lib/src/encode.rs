//!
//! Definitions of protocol encodings.
//!
//! Messages are encoded as fixed fields in declaration order, followed by an
//! optional stream of TLV extension records running to the end of the
//! message. Unknown TLV records are retained on decode so that re-encoding a
//! message is byte-for-byte identical to its input.
//!


use std::{fmt, io};

use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::{self, ecdsa, schnorr, PublicKey, XOnlyPublicKey};
use bitcoin::{Amount, ScriptBuf};


/// Error occuring during protocol decoding.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolDecodingError {
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),
	#[error("invalid protocol encoding: {message}")]
	Invalid {
		message: String,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
	},
}

impl ProtocolDecodingError {
	/// Create a new [ProtocolDecodingError::Invalid] with the given message.
	pub fn invalid(message: impl fmt::Display) -> Self {
		Self::Invalid {
			message: message.to_string(),
			source: None,
		}
	}

	/// Create a new [ProtocolDecodingError::Invalid] with the given message and source error.
	pub fn invalid_err<E>(source: E, message: impl fmt::Display) -> Self
	where
		E: std::error::Error + Send + Sync + 'static,
	{
		Self::Invalid {
			message: message.to_string(),
			source: Some(Box::new(source)),
		}
	}
}

impl From<bitcoin::consensus::encode::Error> for ProtocolDecodingError {
	fn from(e: bitcoin::consensus::encode::Error) -> Self {
		match e {
			bitcoin::consensus::encode::Error::Io(e) => Self::Io(e.into()),
			e => Self::invalid_err(e, "bitcoin protocol decoding error"),
		}
	}
}

impl From<bitcoin::io::Error> for ProtocolDecodingError {
	fn from(e: bitcoin::io::Error) -> Self {
	    Self::Io(e.into())
	}
}

/// Trait for encoding objects according to the DLC protocol encoding.
pub trait ProtocolEncoding: Sized {
	/// Encode the object into the writer.
	fn encode<W: io::Write + ?Sized>(&self, writer: &mut W) -> Result<(), io::Error>;

	/// Decode the object from the reader.
	fn decode<R: io::Read + ?Sized>(reader: &mut R) -> Result<Self, ProtocolDecodingError>;

	/// Serialize the object into a byte vector.
	fn serialize(&self) -> Vec<u8> {
		let mut buf = Vec::new();
		self.encode(&mut buf).expect("buffers don't produce I/O errors");
		buf
	}

	/// Deserialize object from the given byte slice.
	fn deserialize(mut byte_slice: &[u8]) -> Result<Self, ProtocolDecodingError> {
		Self::decode(&mut byte_slice)
	}

	/// Serialize the object to a lowercase hex string.
	fn serialize_hex(&self) -> String {
		use hex_conservative::Case::Lower;
		let mut buf = String::new();
		let mut writer = hex_conservative::display::HexWriter::new(&mut buf, Lower);
		self.encode(&mut writer).expect("no I/O errors for buffers");
		buf
	}

	/// Deserialize object from hex slice.
	fn deserialize_hex(hex_str: &str) -> Result<Self, ProtocolDecodingError> {
		let mut iter = hex_conservative::HexToBytesIter::new(hex_str).map_err(|e| {
			ProtocolDecodingError::Io(io::Error::new(io::ErrorKind::InvalidData, e))
		})?;
		Self::decode(&mut iter)
	}
}

/// Utility trait to write some primitive values into our encoding format.
pub trait WriteExt: io::Write {
	fn emit_u8(&mut self, v: u8) -> Result<(), io::Error> {
		self.write_all(&v.to_le_bytes())
	}
	fn emit_u16(&mut self, v: u16) -> Result<(), io::Error> {
		self.write_all(&v.to_le_bytes())
	}
	fn emit_u32(&mut self, v: u32) -> Result<(), io::Error> {
		self.write_all(&v.to_le_bytes())
	}
	fn emit_u64(&mut self, v: u64) -> Result<(), io::Error> {
		self.write_all(&v.to_le_bytes())
	}
	fn emit_slice(&mut self, slice: &[u8]) -> Result<(), io::Error> {
		self.write_all(slice)
	}
}

impl<W: io::Write + ?Sized> WriteExt for W {}

/// Utility trait to read some primitive values from our encoding format.
pub trait ReadExt: io::Read {
	fn read_u8(&mut self) -> Result<u8, io::Error> {
		let mut buf = [0; 1];
		self.read_exact(&mut buf[..])?;
		Ok(u8::from_le_bytes(buf))
	}
	fn read_u16(&mut self) -> Result<u16, io::Error> {
		let mut buf = [0; 2];
		self.read_exact(&mut buf[..])?;
		Ok(u16::from_le_bytes(buf))
	}
	fn read_u32(&mut self) -> Result<u32, io::Error> {
		let mut buf = [0; 4];
		self.read_exact(&mut buf[..])?;
		Ok(u32::from_le_bytes(buf))
	}
	fn read_u64(&mut self) -> Result<u64, io::Error> {
		let mut buf = [0; 8];
		self.read_exact(&mut buf[..])?;
		Ok(u64::from_le_bytes(buf))
	}
	fn read_slice(&mut self, slice: &mut [u8]) -> Result<(), io::Error> {
		self.read_exact(slice)
	}
}

impl<R: io::Read + ?Sized> ReadExt for R {}


impl ProtocolEncoding for PublicKey {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
	    w.emit_slice(&self.serialize())
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let mut buf = [0; secp256k1::constants::PUBLIC_KEY_SIZE];
		r.read_slice(&mut buf[..])?;
		PublicKey::from_slice(&buf).map_err(|e| {
			ProtocolDecodingError::invalid_err(e, "invalid public key")
		})
	}
}

impl ProtocolEncoding for XOnlyPublicKey {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
	    w.emit_slice(&self.serialize())
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let mut buf = [0; secp256k1::constants::SCHNORR_PUBLIC_KEY_SIZE];
		r.read_slice(&mut buf[..])?;
		XOnlyPublicKey::from_slice(&buf).map_err(|e| {
			ProtocolDecodingError::invalid_err(e, "invalid x-only public key")
		})
	}
}

impl ProtocolEncoding for schnorr::Signature {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
	    w.emit_slice(&self.serialize())
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let mut buf = [0; secp256k1::constants::SCHNORR_SIGNATURE_SIZE];
		r.read_slice(&mut buf[..])?;
		schnorr::Signature::from_slice(&buf).map_err(|e| {
			ProtocolDecodingError::invalid_err(e, "invalid schnorr signature")
		})
	}
}

impl ProtocolEncoding for ecdsa::Signature {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
	    w.emit_slice(&self.serialize_compact())
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let mut buf = [0; secp256k1::constants::COMPACT_SIGNATURE_SIZE];
		r.read_slice(&mut buf[..])?;
		ecdsa::Signature::from_compact(&buf).map_err(|e| {
			ProtocolDecodingError::invalid_err(e, "invalid compact ecdsa signature")
		})
	}
}

impl ProtocolEncoding for sha256::Hash {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
	    w.emit_slice(&self[..])
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let mut buf = [0; sha256::Hash::LEN];
		r.read_exact(&mut buf[..])?;
		Ok(sha256::Hash::from_byte_array(buf))
	}
}

impl ProtocolEncoding for Amount {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		w.emit_u64(self.to_sat())
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		Ok(Amount::from_sat(r.read_u64()?))
	}
}

impl ProtocolEncoding for String {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		w.emit_u32(self.len() as u32)?;
		w.emit_slice(self.as_bytes())
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let len = r.read_u32()? as usize;
		let mut buf = vec![0; len];
		r.read_slice(&mut buf)?;
		String::from_utf8(buf).map_err(|e| {
			ProtocolDecodingError::invalid_err(e, "invalid utf-8 string")
		})
	}
}

impl<T: ProtocolEncoding> ProtocolEncoding for Vec<T> {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		w.emit_u32(self.len() as u32)?;
		for item in self {
			item.encode(w)?;
		}
		Ok(())
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let len = r.read_u32()? as usize;
		// Don't trust the length prefix for the allocation size.
		let mut ret = Vec::with_capacity(len.min(1024));
		for _ in 0..len {
			ret.push(T::decode(r)?);
		}
		Ok(ret)
	}
}

/// A macro to implement our [ProtocolEncoding] for a rust-bitcoin type that
/// implements their `consensus::Encodable/Decodable` traits.
macro_rules! impl_bitcoin_encode {
	($name:ty) => {
		impl ProtocolEncoding for $name {
			fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
				let mut wrapped = bitcoin::io::FromStd::new(w);
				bitcoin::consensus::Encodable::consensus_encode(self, &mut wrapped)?;
				Ok(())
			}

			fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
				let mut wrapped = bitcoin::io::FromStd::new(r);
				let ret = bitcoin::consensus::Decodable::consensus_decode(&mut wrapped)?;
				Ok(ret)
			}
		}
	};
}

impl_bitcoin_encode!(bitcoin::OutPoint);
impl_bitcoin_encode!(bitcoin::TxOut);
impl_bitcoin_encode!(ScriptBuf);
impl_bitcoin_encode!(bitcoin::Witness);


/// A raw TLV extension record.
///
/// Records with types we don't understand are carried verbatim so that
/// re-encoding preserves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvRecord {
	pub typ: u16,
	pub value: Vec<u8>,
}

impl ProtocolEncoding for TlvRecord {
	fn encode<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), io::Error> {
		w.emit_u16(self.typ)?;
		w.emit_u32(self.value.len() as u32)?;
		w.emit_slice(&self.value)
	}

	fn decode<R: io::Read + ?Sized>(r: &mut R) -> Result<Self, ProtocolDecodingError> {
		let typ = r.read_u16()?;
		let len = r.read_u32()? as usize;
		let mut value = vec![0; len];
		r.read_slice(&mut value)?;
		Ok(TlvRecord { typ, value })
	}
}

/// Read a u16, returning [None] on a clean EOF before the first byte.
///
/// An EOF in the middle of the integer is an error.
fn read_u16_or_eof<R: io::Read + ?Sized>(r: &mut R) -> Result<Option<u16>, io::Error> {
	let mut buf = [0u8; 2];
	let mut n = 0;
	while n < buf.len() {
		match r.read(&mut buf[n..])? {
			0 if n == 0 => return Ok(None),
			0 => return Err(io::Error::new(
				io::ErrorKind::UnexpectedEof, "truncated tlv record type",
			)),
			k => n += k,
		}
	}
	Ok(Some(u16::from_le_bytes(buf)))
}

/// Read TLV extension records until the end of the message.
pub fn read_tlvs_to_end<R: io::Read + ?Sized>(
	r: &mut R,
) -> Result<Vec<TlvRecord>, ProtocolDecodingError> {
	let mut ret = Vec::new();
	while let Some(typ) = read_u16_or_eof(r)? {
		let len = r.read_u32()? as usize;
		let mut value = vec![0; len];
		r.read_slice(&mut value)?;
		ret.push(TlvRecord { typ, value });
	}
	Ok(ret)
}

/// Write TLV extension records at the end of a message.
pub fn write_tlvs<W: io::Write + ?Sized>(
	w: &mut W,
	tlvs: &[TlvRecord],
) -> Result<(), io::Error> {
	for tlv in tlvs {
		tlv.encode(w)?;
	}
	Ok(())
}


#[cfg(any(test, feature = "test-util"))]
pub mod test {
	use bitcoin::hex::DisplayHex;

	use super::*;

	/// Test that the object's encoding round-trips.
	pub fn encoding_roundtrip<T>(object: &T)
	where
		T: ProtocolEncoding + fmt::Debug + PartialEq,
	{
		let encoded = object.serialize();
		let decoded = T::deserialize(&encoded).unwrap();

		assert_eq!(*object, decoded);

		let re_encoded = decoded.serialize();
		assert_eq!(encoded.as_hex().to_string(), re_encoded.as_hex().to_string());
	}
}
