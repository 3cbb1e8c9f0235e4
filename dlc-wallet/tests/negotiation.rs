//!
//! End-to-end negotiation tests driving two wallets through the full
//! offer/accept/sign handshake and on to settlement.
//!

use std::sync::{mpsc, Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use bitcoin::{Amount, FeeRate, OutPoint, ScriptBuf, Transaction, TxOut, Txid, WPubkeyHash, Witness};
use bitcoin::hashes::{hash160, sha256, Hash, HashEngine};
use bitcoin::secp256k1::{Keypair, Message, SecretKey, XOnlyPublicKey};
use bitcoin::secp256k1::rand::{thread_rng, Rng};

use dlc::{verify, ContractId, FundingInput, Payout, ProtocolEncoding, SECP};
use dlc::messages::{
	ContractDescriptor, ContractInfo, EnumerationPayout, EventDescriptor, OracleAnnouncement,
	OracleAttestation, OracleEvent,
};
use dlc_wallet::{Config, Db, DlcState, OfferTerms, Wallet, WalletError};
use dlc_wallet::chain::{ChainSource, WalletBackend};

const MATURITY: u32 = 1_000_000;
const REFUND_LOCKTIME: u32 = 1_001_000;
const TOTAL: Amount = Amount::from_sat(100_000);
const OFFER_COLLATERAL: Amount = Amount::from_sat(60_000);

fn p2wpkh_spk(key: &Keypair) -> ScriptBuf {
	let hash = hash160::Hash::hash(&key.public_key().serialize());
	ScriptBuf::new_p2wpkh(&WPubkeyHash::from_raw_hash(hash))
}

fn derived_key(seed: &[u8; 32], tag: &[u8]) -> Keypair {
	let mut engine = sha256::Hash::engine();
	engine.input(seed);
	engine.input(tag);
	let secret = SecretKey::from_slice(sha256::Hash::from_engine(engine).as_ref())
		.expect("hash output is a valid secret key");
	Keypair::from_secret_key(&SECP, &secret)
}

#[derive(Clone)]
struct TestBackend {
	seed: [u8; 32],
	utxos: Vec<(FundingInput, Keypair)>,
	address_counter: u32,
}

impl TestBackend {
	fn new(values: &[Amount]) -> TestBackend {
		let seed: [u8; 32] = thread_rng().gen();
		let utxos = values.iter().enumerate()
			.map(|(i, value)| {
				let key = derived_key(&seed, &[b'u', i as u8]);
				let mut engine = sha256::Hash::engine();
				engine.input(&seed);
				engine.input(b"txid");
				let input = FundingInput {
					outpoint: OutPoint {
						txid: Txid::from_byte_array(
							sha256::Hash::from_engine(engine).to_byte_array(),
						),
						vout: i as u32,
					},
					prev_output: TxOut {
						value: *value,
						script_pubkey: p2wpkh_spk(&key),
					},
					max_witness_len: dlc::P2WPKH_WITNESS_LEN,
				};
				(input, key)
			})
			.collect();
		TestBackend { seed, utxos, address_counter: 0 }
	}
}

impl WalletBackend for TestBackend {
	fn select_utxos(
		&mut self,
		amount: Amount,
		_fee_rate: FeeRate,
		exclude: &[OutPoint],
	) -> Result<Vec<FundingInput>, WalletError> {
		// Generous headroom for funding and CET fees.
		let target = amount + Amount::from_sat(10_000);
		let mut selected = Vec::new();
		let mut total = Amount::ZERO;
		for (input, _) in &self.utxos {
			if exclude.contains(&input.outpoint) {
				continue;
			}
			total += input.amount();
			selected.push(input.clone());
			if total >= target {
				return Ok(selected);
			}
		}
		Err(WalletError::InsufficientFunds)
	}

	fn new_address_spk(&mut self) -> Result<ScriptBuf, WalletError> {
		self.address_counter += 1;
		Ok(p2wpkh_spk(&derived_key(&self.seed, &[b'a', self.address_counter as u8])))
	}

	fn contract_keypair(&self, id: ContractId) -> Result<Keypair, WalletError> {
		Ok(derived_key(&self.seed, id.as_ref()))
	}

	fn sign_funding_input(
		&self,
		fund_tx: &Transaction,
		input_index: usize,
		input: &FundingInput,
	) -> Result<Witness, WalletError> {
		let key = self.utxos.iter()
			.find(|(i, _)| i.outpoint == input.outpoint)
			.map(|(_, k)| k)
			.ok_or_else(|| WalletError::IllegalArgument("not our utxo".into()))?;
		Ok(verify::p2wpkh_witness(fund_tx, input_index, &input.prev_output, &key.secret_key())?)
	}

	fn balance(&self, exclude: &[OutPoint]) -> Result<Amount, WalletError> {
		Ok(self.utxos.iter()
			.filter(|(i, _)| !exclude.contains(&i.outpoint))
			.map(|(i, _)| i.amount())
			.sum())
	}
}

/// A backend whose first coin selection parks until released, to hold one
/// `accept_offer` call mid-flight while another races it.
struct BlockingBackend {
	inner: TestBackend,
	armed: AtomicBool,
	entered: mpsc::Sender<()>,
	release: mpsc::Receiver<()>,
}

impl WalletBackend for BlockingBackend {
	fn select_utxos(
		&mut self,
		amount: Amount,
		fee_rate: FeeRate,
		exclude: &[OutPoint],
	) -> Result<Vec<FundingInput>, WalletError> {
		if self.armed.swap(false, Ordering::SeqCst) {
			self.entered.send(()).unwrap();
			self.release.recv().unwrap();
		}
		self.inner.select_utxos(amount, fee_rate, exclude)
	}

	fn new_address_spk(&mut self) -> Result<ScriptBuf, WalletError> {
		self.inner.new_address_spk()
	}

	fn contract_keypair(&self, id: ContractId) -> Result<Keypair, WalletError> {
		self.inner.contract_keypair(id)
	}

	fn sign_funding_input(
		&self,
		fund_tx: &Transaction,
		input_index: usize,
		input: &FundingInput,
	) -> Result<Witness, WalletError> {
		self.inner.sign_funding_input(fund_tx, input_index, input)
	}

	fn balance(&self, exclude: &[OutPoint]) -> Result<Amount, WalletError> {
		self.inner.balance(exclude)
	}
}

#[derive(Clone, Default)]
struct TestChain {
	inner: Arc<ChainInner>,
}

#[derive(Default)]
struct ChainInner {
	txs: Mutex<Vec<Transaction>>,
	tip: AtomicU32,
}

impl TestChain {
	fn new(tip: u32) -> TestChain {
		let chain = TestChain::default();
		chain.set_tip(tip);
		chain
	}

	fn set_tip(&self, height: u32) {
		self.inner.tip.store(height, Ordering::SeqCst);
	}

	fn broadcast_txs(&self) -> Vec<Transaction> {
		self.inner.txs.lock().unwrap().clone()
	}
}

#[async_trait]
impl ChainSource for TestChain {
	async fn broadcast_tx(&self, tx: &Transaction) -> Result<(), WalletError> {
		self.inner.txs.lock().unwrap().push(tx.clone());
		Ok(())
	}

	async fn tip_height(&self) -> Result<u32, WalletError> {
		Ok(self.inner.tip.load(Ordering::SeqCst))
	}
}

/// An enumeration oracle that pre-committed to attesting `attested`.
///
/// The announced nonce is extracted from the attestation signature, which is
/// produced first.
fn enum_oracle(outcomes: &[&str], attested: &str) -> (OracleAnnouncement, OracleAttestation) {
	let key = Keypair::new(&*SECP, &mut thread_rng());
	let att_sig = SECP.sign_schnorr(&OracleAttestation::outcome_digest(attested), &key);
	let nonce = XOnlyPublicKey::from_slice(&att_sig.serialize()[..32]).unwrap();

	let event = OracleEvent {
		nonces: vec![nonce],
		event_maturity: MATURITY,
		descriptor: EventDescriptor::Enumeration {
			outcomes: outcomes.iter().map(|s| s.to_string()).collect(),
		},
		event_id: "match-42".into(),
	};
	let digest = Message::from_digest(sha256::Hash::hash(&event.serialize()).to_byte_array());
	let announcement = OracleAnnouncement {
		signature: SECP.sign_schnorr(&digest, &key),
		oracle_pubkey: key.x_only_public_key().0,
		event,
	};
	let attestation = OracleAttestation {
		event_id: "match-42".into(),
		oracle_pubkey: key.x_only_public_key().0,
		signatures: vec![att_sig],
		outcomes: vec![attested.into()],
	};
	(announcement, attestation)
}

fn win_lose_contract(ann: OracleAnnouncement) -> ContractInfo {
	ContractInfo {
		total_collateral: TOTAL,
		descriptor: ContractDescriptor::Enumerated(vec![
			EnumerationPayout {
				outcome: "win".into(),
				payout: Payout { offer: TOTAL, accept: Amount::ZERO },
			},
			EnumerationPayout {
				outcome: "lose".into(),
				payout: Payout { offer: Amount::ZERO, accept: TOTAL },
			},
		]),
		oracle_announcements: vec![ann],
	}
}

fn offer_terms(ann: OracleAnnouncement) -> OfferTerms {
	OfferTerms {
		contract_info: win_lose_contract(ann),
		collateral: OFFER_COLLATERAL,
		fee_rate: None,
		cet_locktime: MATURITY,
		refund_locktime: REFUND_LOCKTIME,
	}
}

fn new_wallet(
	chain: &TestChain,
	utxos: &[Amount],
) -> (tempfile::TempDir, Wallet<TestBackend, TestChain>) {
	let dir = tempfile::tempdir().unwrap();
	let db = Db::open(dir.path()).unwrap();
	let wallet = Wallet::open(Config::default(), db, TestBackend::new(utxos), chain.clone())
		.unwrap();
	(dir, wallet)
}

fn state_of(wallet: &Wallet<TestBackend, TestChain>, id: ContractId) -> DlcState {
	wallet.find_dlc(id).unwrap().unwrap().record.state
}

#[tokio::test]
async fn full_lifecycle_execution() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (_d2, bob) = new_wallet(&chain, &[Amount::from_sat(80_000)]);
	let (ann, att) = enum_oracle(&["win", "lose"], "win");

	let offer = alice.create_offer(offer_terms(ann)).unwrap();
	let id = offer.contract_id().unwrap();
	assert_eq!(state_of(&alice, id), DlcState::Offered);
	assert!(!alice.list_reserved_utxos().unwrap().is_empty());
	// Reserved coins are out of the spendable balance.
	assert_eq!(alice.balance().unwrap(), Amount::ZERO);

	let accept = bob.accept_offer(&offer).unwrap();
	assert_eq!(accept.collateral, TOTAL - OFFER_COLLATERAL);
	assert_eq!(accept.contract_id, id);
	assert_eq!(state_of(&bob, id), DlcState::Accepted);

	let sign = alice.sign_dlc(&accept).unwrap();
	assert_eq!(sign.contract_id, id);
	assert_eq!(state_of(&alice, id), DlcState::Signed);
	assert_eq!(sign.funding_signatures.len(), offer.funding_inputs.len());

	bob.add_dlc_sigs(&sign).unwrap();
	assert_eq!(state_of(&bob, id), DlcState::Signed);

	let txid = bob.broadcast_funding_tx(id).await.unwrap();
	assert_eq!(state_of(&bob, id), DlcState::Broadcast);
	assert!(bob.list_reserved_utxos().unwrap().is_empty());
	let fund = chain.broadcast_txs().pop().unwrap();
	assert_eq!(fund.compute_txid(), txid);
	// Every input carries a witness.
	assert!(fund.input.iter().all(|i| !i.witness.is_empty()));

	alice.mark_funding_broadcast(id).unwrap();
	assert_eq!(state_of(&alice, id), DlcState::Broadcast);

	let cet = bob.execute_dlc(id, &att).await.unwrap();
	assert_eq!(state_of(&bob, id), DlcState::Confirmed);
	assert_eq!(cet.input[0].previous_output.txid, txid);
	assert_eq!(cet.input[0].witness.len(), 4);
	// "win" pays the whole collateral to the offering party.
	assert_eq!(cet.output.len(), 1);
	assert_eq!(cet.output[0].script_pubkey, offer.payout_spk);

	// The offering party settles to the exact same transaction.
	let cet2 = alice.execute_dlc(id, &att).await.unwrap();
	assert_eq!(cet2.compute_txid(), cet.compute_txid());
	assert_eq!(state_of(&alice, id), DlcState::Confirmed);
}

#[tokio::test]
async fn accept_replay_is_idempotent() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (_d2, bob) = new_wallet(&chain, &[Amount::from_sat(80_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	let offer = alice.create_offer(offer_terms(ann)).unwrap();
	let first = bob.accept_offer(&offer).unwrap();
	let second = bob.accept_offer(&offer).unwrap();
	assert_eq!(first, second);
	// Still a single contract with a single reservation set.
	assert_eq!(bob.list_dlcs().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_accept_of_same_offer() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");
	let offer = alice.create_offer(offer_terms(ann)).unwrap();
	let id = offer.contract_id().unwrap();

	let (entered_tx, entered_rx) = mpsc::channel();
	let (release_tx, release_rx) = mpsc::channel();
	let dir = tempfile::tempdir().unwrap();
	let bob = Arc::new(Wallet::open(
		Config::default(),
		Db::open(dir.path()).unwrap(),
		BlockingBackend {
			inner: TestBackend::new(&[Amount::from_sat(80_000)]),
			armed: AtomicBool::new(true),
			entered: entered_tx,
			release: release_rx,
		},
		chain.clone(),
	).unwrap());

	let slow = {
		let bob = bob.clone();
		let offer = offer.clone();
		tokio::task::spawn_blocking(move || bob.accept_offer(&offer))
	};
	// Wait until the first accept sits inside coin selection.
	entered_rx.recv().unwrap();
	assert!(matches!(
		bob.accept_offer(&offer),
		Err(WalletError::DuplicateOffer(dup)) if dup == id,
	));

	release_tx.send(()).unwrap();
	let accept = slow.await.unwrap().unwrap();
	assert_eq!(accept.contract_id, id);
	// With the winner done, accepting again replays its stored accept.
	assert_eq!(bob.accept_offer(&offer).unwrap(), accept);
	assert_eq!(bob.list_dlcs().unwrap().len(), 1);
}

#[tokio::test]
async fn cannot_accept_own_offer() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	let offer = alice.create_offer(offer_terms(ann)).unwrap();
	assert!(matches!(
		alice.accept_offer(&offer),
		Err(WalletError::IllegalArgument(_)),
	));
}

#[tokio::test]
async fn handshake_message_order_enforced() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (_d2, bob) = new_wallet(&chain, &[Amount::from_sat(80_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	let offer = alice.create_offer(offer_terms(ann)).unwrap();
	let id = offer.contract_id().unwrap();

	// Broadcasting before the contract is fully signed is rejected.
	let accept = bob.accept_offer(&offer).unwrap();
	assert!(matches!(
		bob.broadcast_funding_tx(id).await,
		Err(WalletError::IllegalArgument(_)),
	));

	// The accepting party never takes an accept message.
	assert!(matches!(
		bob.sign_dlc(&accept),
		Err(WalletError::IllegalArgument(_)),
	));

	// Settling before broadcast is rejected.
	let sign = alice.sign_dlc(&accept).unwrap();
	bob.add_dlc_sigs(&sign).unwrap();
	let (_, att) = enum_oracle(&["win", "lose"], "win");
	assert!(matches!(
		bob.execute_dlc(id, &att).await,
		Err(WalletError::IllegalArgument(_)),
	));
}

#[tokio::test]
async fn cancel_before_broadcast_only() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (_d2, bob) = new_wallet(&chain, &[Amount::from_sat(80_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	// Cancel as offerer releases the reservations.
	let offer = alice.create_offer(offer_terms(ann.clone())).unwrap();
	let id = offer.contract_id().unwrap();
	alice.cancel_dlc(id).unwrap();
	assert!(alice.find_dlc(id).unwrap().is_none());
	assert!(alice.list_reserved_utxos().unwrap().is_empty());
	assert_eq!(alice.balance().unwrap(), Amount::from_sat(100_000));

	// Cancel as accepter, then accept again from scratch.
	let offer = alice.create_offer(offer_terms(ann)).unwrap();
	let id = offer.contract_id().unwrap();
	bob.accept_offer(&offer).unwrap();
	bob.cancel_dlc(id).unwrap();
	assert!(bob.list_reserved_utxos().unwrap().is_empty());
	let accept = bob.accept_offer(&offer).unwrap();

	// After broadcast the contract can no longer be canceled.
	let sign = alice.sign_dlc(&accept).unwrap();
	bob.add_dlc_sigs(&sign).unwrap();
	bob.broadcast_funding_tx(id).await.unwrap();
	assert!(matches!(
		bob.cancel_dlc(id),
		Err(WalletError::IllegalArgument(_)),
	));
	assert_eq!(state_of(&bob, id), DlcState::Broadcast);
}

#[tokio::test]
async fn refund_after_locktime() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (_d2, bob) = new_wallet(&chain, &[Amount::from_sat(80_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	let offer = alice.create_offer(offer_terms(ann)).unwrap();
	let id = offer.contract_id().unwrap();
	let accept = bob.accept_offer(&offer).unwrap();
	let sign = alice.sign_dlc(&accept).unwrap();
	bob.add_dlc_sigs(&sign).unwrap();
	bob.broadcast_funding_tx(id).await.unwrap();
	alice.mark_funding_broadcast(id).unwrap();

	// The refund path is locked until the refund locktime.
	assert!(matches!(
		bob.execute_dlc_refund(id).await,
		Err(WalletError::IllegalArgument(_)),
	));
	assert_eq!(state_of(&bob, id), DlcState::Broadcast);

	chain.set_tip(REFUND_LOCKTIME);
	let refund = bob.execute_dlc_refund(id).await.unwrap();
	assert_eq!(state_of(&bob, id), DlcState::Refunded);
	assert_eq!(refund.lock_time.to_consensus_u32(), REFUND_LOCKTIME);
	assert_eq!(refund.output.len(), 2);
	assert_eq!(refund.output[0].value, offer.collateral);
	assert_eq!(refund.output[1].value, accept.collateral);

	let refund2 = alice.execute_dlc_refund(id).await.unwrap();
	assert_eq!(refund2.compute_txid(), refund.compute_txid());
	assert_eq!(state_of(&alice, id), DlcState::Refunded);
}

#[tokio::test]
async fn tampered_accept_signature_rejected() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (_d2, bob) = new_wallet(&chain, &[Amount::from_sat(80_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	let offer = alice.create_offer(offer_terms(ann)).unwrap();
	let accept = bob.accept_offer(&offer).unwrap();

	let mut tampered = accept.clone();
	let mut bytes = tampered.cet_signatures[0].serialize_compact();
	bytes[10] ^= 0x01;
	tampered.cet_signatures[0] =
		bitcoin::secp256k1::ecdsa::Signature::from_compact(&bytes).unwrap();
	assert!(matches!(
		alice.sign_dlc(&tampered),
		Err(WalletError::InvalidSignatures(_)),
	));

	// The contract is still waiting and the genuine accept goes through.
	assert_eq!(state_of(&alice, offer.contract_id().unwrap()), DlcState::Offered);
	alice.sign_dlc(&accept).unwrap();
}

#[tokio::test]
async fn tampered_announcement_rejected() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	let mut tampered = ann;
	tampered.event.event_maturity += 1;
	assert!(matches!(
		alice.create_offer(offer_terms(tampered)),
		Err(WalletError::InvalidAnnouncementSignature),
	));
	assert!(alice.list_dlcs().unwrap().is_empty());
}

#[tokio::test]
async fn insufficient_funds_rejected() {
	let chain = TestChain::new(MATURITY);
	let (_d1, poor) = new_wallet(&chain, &[Amount::from_sat(1_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	assert!(matches!(
		poor.create_offer(offer_terms(ann)),
		Err(WalletError::InsufficientFunds),
	));
	assert!(poor.list_reserved_utxos().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_accept_collateral_rejected() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (_d2, bob) = new_wallet(&chain, &[Amount::from_sat(80_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	let offer = alice.create_offer(offer_terms(ann)).unwrap();
	let mut accept = bob.accept_offer(&offer).unwrap();
	accept.collateral = accept.collateral - Amount::from_sat(1);
	assert!(matches!(
		alice.sign_dlc(&accept),
		Err(WalletError::IllegalArgument(_)),
	));
}

#[tokio::test]
async fn distinct_offers_get_distinct_ids() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(
		&chain,
		&[Amount::from_sat(100_000), Amount::from_sat(100_000)],
	);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	// Two offers over the same announcement still map to distinct contract
	// ids, the second offer can't reuse the reserved utxos of the first.
	let first = alice.create_offer(offer_terms(ann.clone())).unwrap();
	let second = alice.create_offer(offer_terms(ann)).unwrap();
	assert_ne!(first.contract_id().unwrap(), second.contract_id().unwrap());
	assert_eq!(alice.list_dlcs().unwrap().len(), 2);
}

#[tokio::test]
async fn state_survives_reopen() {
	let chain = TestChain::new(MATURITY);
	let (_d1, alice) = new_wallet(&chain, &[Amount::from_sat(100_000)]);
	let (ann, _) = enum_oracle(&["win", "lose"], "win");

	let dir = tempfile::tempdir().unwrap();
	let backend = TestBackend::new(&[Amount::from_sat(80_000)]);
	let bob = Wallet::open(
		Config::default(),
		Db::open(dir.path()).unwrap(),
		backend.clone(),
		chain.clone(),
	).unwrap();

	let offer = alice.create_offer(offer_terms(ann)).unwrap();
	let id = offer.contract_id().unwrap();
	let accept = bob.accept_offer(&offer).unwrap();
	drop(bob);

	let bob = Wallet::open(
		Config::default(),
		Db::open(dir.path()).unwrap(),
		backend,
		chain.clone(),
	).unwrap();
	assert_eq!(state_of(&bob, id), DlcState::Accepted);
	assert_eq!(bob.list_reserved_utxos().unwrap().len(), 1);
	// The stored accept replays identically after the restart.
	assert_eq!(bob.accept_offer(&offer).unwrap(), accept);

	let sign = alice.sign_dlc(&accept).unwrap();
	bob.add_dlc_sigs(&sign).unwrap();
	assert_eq!(state_of(&bob, id), DlcState::Signed);
}
