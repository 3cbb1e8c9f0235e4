use std::path::Path;

use bitcoin::OutPoint;
use chrono::{DateTime, Utc};
use sled::transaction::{self as tx, Transactional};

use dlc::{ContractId, ProtocolEncoding};
use dlc::messages::{AcceptDlc, OfferDlc, OracleAnnouncement, SignDlc};

use crate::error::WalletError;
use crate::state::DlcState;

// Trees

const CONTRACT_TREE: &str = "dlc_contracts";
const ANNOUNCEMENT_TREE: &str = "dlc_oracle_announcements";
const RESERVATION_TREE: &str = "dlc_reserved_utxos";

// The contract tree holds the record under the bare 32-byte contract id and
// the handshake messages under the id with a tag byte appended.

const OFFER_TAG: u8 = b'o';
const ACCEPT_TAG: u8 = b'a';
const SIGN_TAG: u8 = b's';

/// The stored metadata of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlcRecord {
	pub contract_id: ContractId,
	pub state: DlcState,
	/// Whether we are the offering party of this contract.
	pub is_offerer: bool,
	/// Our wallet utxos locked into the funding transaction.
	pub reserved_utxos: Vec<OutPoint>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

pub struct Db {
	db: sled::Db,
}

impl Db {
	pub fn open(path: &Path) -> Result<Db, WalletError> {
		Ok(Db { db: sled::open(path)? })
	}

	fn msg_key(id: ContractId, tag: u8) -> Vec<u8> {
		let mut key = id.bytes().to_vec();
		key.push(tag);
		key
	}

	fn outpoint_key(outpoint: &OutPoint) -> Vec<u8> {
		outpoint.serialize()
	}

	fn encode_record(record: &DlcRecord) -> Vec<u8> {
		let mut buf = Vec::new();
		ciborium::into_writer(record, &mut buf).unwrap();
		buf
	}

	fn decode_record(bytes: &[u8]) -> DlcRecord {
		ciborium::from_reader(bytes).expect("corrupt db: invalid contract record")
	}

	/// Store a fresh contract in [DlcState::Offered], its offer message and
	/// its utxo reservations, all atomically.
	///
	/// Fails when the contract already exists or when any of the utxos is
	/// already reserved for another contract.
	pub fn create_contract(
		&self,
		record: &DlcRecord,
		offer: &OfferDlc,
	) -> Result<(), WalletError> {
		debug_assert_eq!(record.state, DlcState::Offered);
		self.create_contract_with(record, offer, None)
	}

	/// Store a fresh accepted contract: its record in [DlcState::Accepted],
	/// the offer and accept messages and its utxo reservations, all in one
	/// transaction, so a crash can't leave an accepted contract without its
	/// accept message.
	pub fn create_accepted_contract(
		&self,
		record: &DlcRecord,
		offer: &OfferDlc,
		accept: &AcceptDlc,
	) -> Result<(), WalletError> {
		debug_assert_eq!(record.state, DlcState::Accepted);
		self.create_contract_with(record, offer, Some(accept))
	}

	fn create_contract_with(
		&self,
		record: &DlcRecord,
		offer: &OfferDlc,
		accept: Option<&AcceptDlc>,
	) -> Result<(), WalletError> {
		let contracts = self.db.open_tree(CONTRACT_TREE)?;
		let reservations = self.db.open_tree(RESERVATION_TREE)?;
		(&contracts, &reservations).transaction(|(contracts, reservations)| {
			let id = record.contract_id;
			if contracts.get(id.to_ivec())?.is_some() {
				return Err(tx::ConflictableTransactionError::Abort(
					WalletError::illegal(format!("contract {} already exists", id)),
				));
			}
			for outpoint in &record.reserved_utxos {
				let key = Db::outpoint_key(outpoint);
				if reservations.get(&key)?.is_some() {
					return Err(tx::ConflictableTransactionError::Abort(
						WalletError::illegal(format!("utxo {} is already reserved", outpoint)),
					));
				}
				reservations.insert(key, id.bytes().to_vec())?;
			}
			contracts.insert(id.to_ivec(), Db::encode_record(record))?;
			contracts.insert(Db::msg_key(id, OFFER_TAG), offer.serialize())?;
			if let Some(accept) = accept {
				contracts.insert(Db::msg_key(id, ACCEPT_TAG), accept.serialize())?;
			}
			Ok(())
		})?;
		Ok(())
	}

	/// Store a message payload and advance the contract state in one
	/// transaction, checking the transition is allowed.
	fn store_message(
		&self,
		id: ContractId,
		tag: u8,
		payload: Vec<u8>,
		next: DlcState,
	) -> Result<DlcRecord, WalletError> {
		let contracts = self.db.open_tree(CONTRACT_TREE)?;
		let record = contracts.transaction(|contracts| {
			let record = Db::checked_transition(contracts, id, next)?;
			contracts.insert(Db::msg_key(id, tag), payload.clone())?;
			Ok(record)
		})?;
		Ok(record)
	}

	fn checked_transition(
		contracts: &tx::TransactionalTree,
		id: ContractId,
		next: DlcState,
	) -> Result<DlcRecord, tx::ConflictableTransactionError<WalletError>> {
		let bytes = contracts.get(id.to_ivec())?.ok_or_else(|| {
			tx::ConflictableTransactionError::Abort(
				WalletError::illegal(format!("unknown contract {}", id)),
			)
		})?;
		let mut record = Db::decode_record(&bytes);
		if !record.state.can_transition_to(next) {
			return Err(tx::ConflictableTransactionError::Abort(WalletError::illegal(
				format!("contract {} can't move from {} to {}", id, record.state, next),
			)));
		}
		record.state = next;
		record.updated_at = Utc::now();
		contracts.insert(id.to_ivec(), Db::encode_record(&record))?;
		Ok(record)
	}

	/// Store the accept message and move the contract to [DlcState::Accepted].
	pub fn store_accept(&self, id: ContractId, accept: &AcceptDlc) -> Result<DlcRecord, WalletError> {
		self.store_message(id, ACCEPT_TAG, accept.serialize(), DlcState::Accepted)
	}

	/// Store the sign message and move the contract to [DlcState::Signed].
	pub fn store_sign(&self, id: ContractId, sign: &SignDlc) -> Result<DlcRecord, WalletError> {
		self.store_message(id, SIGN_TAG, sign.serialize(), DlcState::Signed)
	}

	/// Advance the contract state.
	///
	/// Moving to [DlcState::Broadcast] also drops the contract's utxo
	/// reservations, since the funding transaction now spends them on-chain.
	pub fn set_state(&self, id: ContractId, next: DlcState) -> Result<DlcRecord, WalletError> {
		let contracts = self.db.open_tree(CONTRACT_TREE)?;
		let reservations = self.db.open_tree(RESERVATION_TREE)?;
		let record = (&contracts, &reservations).transaction(|(contracts, reservations)| {
			let record = Db::checked_transition(contracts, id, next)?;
			if next == DlcState::Broadcast {
				for outpoint in &record.reserved_utxos {
					reservations.remove(Db::outpoint_key(outpoint))?;
				}
			}
			Ok(record)
		})?;
		Ok(record)
	}

	/// Remove the contract, its messages and its reservations atomically.
	///
	/// Oracle announcements are kept, they are not contract-specific.
	pub fn delete_contract(&self, id: ContractId) -> Result<(), WalletError> {
		let contracts = self.db.open_tree(CONTRACT_TREE)?;
		let reservations = self.db.open_tree(RESERVATION_TREE)?;
		(&contracts, &reservations).transaction(|(contracts, reservations)| {
			let bytes = contracts.remove(id.to_ivec())?.ok_or_else(|| {
				tx::ConflictableTransactionError::Abort(
					WalletError::illegal(format!("unknown contract {}", id)),
				)
			})?;
			let record = Db::decode_record(&bytes);
			for tag in [OFFER_TAG, ACCEPT_TAG, SIGN_TAG] {
				contracts.remove(Db::msg_key(id, tag))?;
			}
			for outpoint in &record.reserved_utxos {
				reservations.remove(Db::outpoint_key(outpoint))?;
			}
			Ok(())
		})?;
		Ok(())
	}

	pub fn fetch_record(&self, id: ContractId) -> Result<Option<DlcRecord>, WalletError> {
		Ok(self.db.open_tree(CONTRACT_TREE)?
			.get(id)?
			.map(|b| Db::decode_record(&b)))
	}

	pub fn list_records(&self) -> Result<Vec<DlcRecord>, WalletError> {
		self.db.open_tree(CONTRACT_TREE)?
			.iter()
			.filter(|v| match v {
				// Message keys carry a tag byte after the contract id.
				Ok((key, _)) => key.len() == ContractId::ENCODE_SIZE,
				Err(_) => true,
			})
			.map(|v| {
				let (_key, val) = v?;
				Ok(Db::decode_record(&val))
			})
			.collect()
	}

	fn fetch_message<T: ProtocolEncoding>(
		&self,
		id: ContractId,
		tag: u8,
	) -> Result<Option<T>, WalletError> {
		Ok(self.db.open_tree(CONTRACT_TREE)?
			.get(Db::msg_key(id, tag))?
			.map(|b| T::deserialize(&b).expect("corrupt db: invalid contract message")))
	}

	pub fn fetch_offer(&self, id: ContractId) -> Result<Option<OfferDlc>, WalletError> {
		self.fetch_message(id, OFFER_TAG)
	}

	pub fn fetch_accept(&self, id: ContractId) -> Result<Option<AcceptDlc>, WalletError> {
		self.fetch_message(id, ACCEPT_TAG)
	}

	pub fn fetch_sign(&self, id: ContractId) -> Result<Option<SignDlc>, WalletError> {
		self.fetch_message(id, SIGN_TAG)
	}

	/// Store an oracle announcement, keyed by its own id.
	pub fn store_announcement(&self, ann: &OracleAnnouncement) -> Result<(), WalletError> {
		use bitcoin::hashes::Hash;
		self.db.open_tree(ANNOUNCEMENT_TREE)?
			.insert(ann.id().to_byte_array(), ann.serialize())?;
		Ok(())
	}

	pub fn fetch_announcement(
		&self,
		id: bitcoin::hashes::sha256::Hash,
	) -> Result<Option<OracleAnnouncement>, WalletError> {
		use bitcoin::hashes::Hash;
		Ok(self.db.open_tree(ANNOUNCEMENT_TREE)?
			.get(id.to_byte_array())?
			.map(|b| OracleAnnouncement::deserialize(&b)
				.expect("corrupt db: invalid oracle announcement")))
	}

	/// All currently reserved utxos with the contract holding them.
	pub fn reserved_utxos(&self) -> Result<Vec<(OutPoint, ContractId)>, WalletError> {
		self.db.open_tree(RESERVATION_TREE)?
			.iter()
			.map(|v| {
				let (key, val) = v?;
				let outpoint = OutPoint::deserialize(&key)
					.expect("corrupt db: invalid reserved outpoint");
				let id = ContractId::from_slice(&val)
					.expect("corrupt db: invalid contract id in reservation");
				Ok((outpoint, id))
			})
			.collect()
	}

	/// Repair the reservation index against the contract records.
	///
	/// Drops reservations whose contract is gone or already past broadcast
	/// and restores missing reservations of live contracts. Returns the
	/// number of entries dropped and restored.
	pub fn reconcile_reservations(&self) -> Result<(usize, usize), WalletError> {
		let reservations = self.db.open_tree(RESERVATION_TREE)?;

		let mut dropped = 0;
		for (outpoint, id) in self.reserved_utxos()? {
			let live = self.fetch_record(id)?.map_or(false, |r| r.state.is_cancellable());
			if !live {
				reservations.remove(Db::outpoint_key(&outpoint))?;
				dropped += 1;
			}
		}

		let mut restored = 0;
		for record in self.list_records()? {
			if !record.state.is_cancellable() {
				continue;
			}
			for outpoint in &record.reserved_utxos {
				let key = Db::outpoint_key(outpoint);
				if reservations.get(&key)?.is_none() {
					reservations.insert(key, record.contract_id.bytes().to_vec())?;
					restored += 1;
				}
			}
		}
		Ok((dropped, restored))
	}

	#[cfg(test)]
	fn remove_reservation_entry(&self, outpoint: &OutPoint) -> Result<(), WalletError> {
		self.db.open_tree(RESERVATION_TREE)?.remove(Db::outpoint_key(outpoint))?;
		Ok(())
	}
}

trait ToIVec {
	fn to_ivec(&self) -> sled::IVec;
}

impl<T: AsRef<[u8]>> ToIVec for T {
	fn to_ivec(&self) -> sled::IVec {
		self.as_ref().into()
	}
}
