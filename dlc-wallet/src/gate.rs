use std::collections::HashSet;
use std::sync::Mutex;

use dlc::ContractId;

use crate::error::WalletError;

/// Tracks offers that are currently being accepted, so that two concurrent
/// accepts of the same offer cannot both proceed.
///
/// A finished acceptance is not tracked here; replaying it is resolved
/// against the store instead.
#[derive(Debug, Default)]
pub struct AcceptGate {
	in_flight: Mutex<HashSet<ContractId>>,
}

impl AcceptGate {
	pub fn new() -> AcceptGate {
		Default::default()
	}

	/// Claim an offer for acceptance.
	///
	/// Fails with [WalletError::DuplicateOffer] when another call currently
	/// holds the claim. The claim is released when the returned guard drops.
	pub fn try_enter(&self, id: ContractId) -> Result<AcceptClaim, WalletError> {
		let mut set = self.in_flight.lock().unwrap();
		if !set.insert(id) {
			return Err(WalletError::DuplicateOffer(id));
		}
		Ok(AcceptClaim { gate: self, id })
	}
}

/// Exclusive claim on accepting one offer, released on drop.
pub struct AcceptClaim<'a> {
	gate: &'a AcceptGate,
	id: ContractId,
}

impl<'a> Drop for AcceptClaim<'a> {
	fn drop(&mut self) {
		self.gate.in_flight.lock().unwrap().remove(&self.id);
	}
}
