use bitcoin::Network;

/// Static configuration of a contract wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	pub network: Network,
	/// Fee rate used for offers that don't specify one, in sat/vB.
	pub fallback_fee_rate_sat_per_vb: u64,
}

impl Default for Config {
	fn default() -> Config {
		Config {
			network: Network::Signet,
			fallback_fee_rate_sat_per_vb: 2,
		}
	}
}
