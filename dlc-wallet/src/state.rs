use std::fmt;
use std::str::FromStr;

use crate::error::WalletError;

const OFFERED: &'static str = "Offered";
const ACCEPTED: &'static str = "Accepted";
const SIGNED: &'static str = "Signed";
const BROADCAST: &'static str = "Broadcast";
const CONFIRMED: &'static str = "Confirmed";
const REFUNDED: &'static str = "Refunded";

/// The lifecycle state of a contract.
///
/// States progress linearly from [DlcState::Offered] to
/// [DlcState::Broadcast], which then settles into either
/// [DlcState::Confirmed] or [DlcState::Refunded].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DlcState {
	Offered,
	Accepted,
	Signed,
	Broadcast,
	Confirmed,
	Refunded,
}

impl DlcState {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Offered => OFFERED,
			Self::Accepted => ACCEPTED,
			Self::Signed => SIGNED,
			Self::Broadcast => BROADCAST,
			Self::Confirmed => CONFIRMED,
			Self::Refunded => REFUNDED,
		}
	}

	/// Whether the state machine allows moving from this state to `next`.
	pub fn can_transition_to(self, next: DlcState) -> bool {
		match (self, next) {
			(Self::Offered, Self::Accepted) => true,
			(Self::Accepted, Self::Signed) => true,
			(Self::Signed, Self::Broadcast) => true,
			(Self::Broadcast, Self::Confirmed) => true,
			(Self::Broadcast, Self::Refunded) => true,
			_ => false,
		}
	}

	/// A contract can only be canceled before its funding transaction hits
	/// the chain.
	pub fn is_cancellable(self) -> bool {
		match self {
			Self::Offered | Self::Accepted | Self::Signed => true,
			Self::Broadcast | Self::Confirmed | Self::Refunded => false,
		}
	}
}

impl fmt::Display for DlcState {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for DlcState {
	type Err = WalletError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			OFFERED => Ok(Self::Offered),
			ACCEPTED => Ok(Self::Accepted),
			SIGNED => Ok(Self::Signed),
			BROADCAST => Ok(Self::Broadcast),
			CONFIRMED => Ok(Self::Confirmed),
			REFUNDED => Ok(Self::Refunded),
			s => Err(WalletError::illegal(format!("invalid DlcState: {}", s))),
		}
	}
}

impl serde::Serialize for DlcState {
	fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
		s.serialize_str(self.as_str())
	}
}

impl<'de> serde::Deserialize<'de> for DlcState {
	fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
		struct Visitor;
		impl<'de> serde::de::Visitor<'de> for Visitor {
			type Value = DlcState;
			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "a DlcState string")
			}
			fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
				DlcState::from_str(v).map_err(serde::de::Error::custom)
			}
		}
		d.deserialize_str(Visitor)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn convert_dlc_state_and_back() {
		for state in [
			DlcState::Offered, DlcState::Accepted, DlcState::Signed,
			DlcState::Broadcast, DlcState::Confirmed, DlcState::Refunded,
		] {
			assert_eq!(DlcState::from_str(state.as_str()).unwrap(), state);
		}
		assert!(DlcState::from_str("Settled").is_err());

		// If a compiler error occurs,
		// this is a reminder that you should update the test above
		match DlcState::Offered {
			DlcState::Offered => {},
			DlcState::Accepted => {},
			DlcState::Signed => {},
			DlcState::Broadcast => {},
			DlcState::Confirmed => {},
			DlcState::Refunded => {},
		}
	}

	#[test]
	fn transitions_are_linear() {
		use DlcState::*;
		assert!(Offered.can_transition_to(Accepted));
		assert!(Accepted.can_transition_to(Signed));
		assert!(Signed.can_transition_to(Broadcast));
		assert!(Broadcast.can_transition_to(Confirmed));
		assert!(Broadcast.can_transition_to(Refunded));

		assert!(!Offered.can_transition_to(Signed));
		assert!(!Accepted.can_transition_to(Broadcast));
		assert!(!Confirmed.can_transition_to(Refunded));
		assert!(!Broadcast.can_transition_to(Offered));
	}

	#[test]
	fn cancellable_states() {
		use DlcState::*;
		for state in [Offered, Accepted, Signed] {
			assert!(state.is_cancellable());
		}
		for state in [Broadcast, Confirmed, Refunded] {
			assert!(!state.is_cancellable());
		}
	}
}
