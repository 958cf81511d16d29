//! Fake collaborators for kmd-rewards
//!
//! Stand-ins for the Ledger device, the account discovery and the chain
//! explorer, with configurable results, delays and failures. Used for
//! testing where no device is plugged in.

#![warn(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::Txid;
use kmd_rewards::util::unix_time;
use kmd_rewards::{
    Account, AccountDiscovery, Amount, ChainSource, Error, HardwareDevice, RewardData,
    RewardDataSink, Utxo,
};
use tokio::sync::Notify;
use tokio::time::sleep;

/// Locktime used by [`fake_utxo`]
pub const FAKE_LOCKTIME: u64 = 1_600_000_000;
/// Height used by [`fake_utxo`], after the one month cap hardfork
pub const FAKE_HEIGHT: u64 = 1_500_000;

/// Deterministic txid for test outputs
pub fn fake_txid(n: u64) -> Txid {
    Txid::hash(&n.to_le_bytes())
}

/// Unspent output locked at [`FAKE_LOCKTIME`]
pub fn fake_utxo(n: u64, satoshis: u64) -> Utxo {
    Utxo {
        txid: fake_txid(n),
        vout: 0,
        address: format!("R-fake-address-{n}"),
        satoshis: Amount::from(satoshis),
        height: FAKE_HEIGHT,
        locktime: FAKE_LOCKTIME,
    }
}

/// Account holding the given outputs
pub fn fake_account(account_index: u32, utxos: Vec<Utxo>) -> Account {
    let addresses = utxos.iter().map(|utxo| utxo.address.clone()).collect();
    Account {
        account_index,
        xpub: format!("xpub-fake-{account_index}"),
        addresses,
        utxos,
    }
}

/// Fake hardware device
#[derive(Debug)]
pub struct FakeDevice {
    available: Result<bool, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeDevice {
    /// Device that is connected with the Komodo app open
    pub fn available() -> Self {
        Self::with_result(Ok(true))
    }

    /// Device that is not connected
    pub fn unavailable() -> Self {
        Self::with_result(Ok(false))
    }

    /// Device whose transport fails
    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(message.to_string()))
    }

    fn with_result(available: Result<bool, String>) -> Self {
        Self {
            available,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Delay every availability check
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of availability checks made
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HardwareDevice for FakeDevice {
    async fn is_available(&self) -> Result<bool, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        tracing::debug!("Fake device availability: {:?}", self.available);

        self.available.clone().map_err(Error::Transport)
    }
}

/// Fake account discovery
#[derive(Debug)]
pub struct FakeDiscovery {
    accounts: Result<Vec<Account>, String>,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
    started: AtomicUsize,
    completed: AtomicUsize,
}

impl FakeDiscovery {
    /// Discovery returning `accounts`
    pub fn new(accounts: Vec<Account>) -> Self {
        Self::with_result(Ok(accounts))
    }

    /// Discovery failing with `message`
    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(message.to_string()))
    }

    fn with_result(accounts: Result<Vec<Account>, String>) -> Self {
        Self {
            accounts,
            delay: None,
            gate: None,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Delay every discovery
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hold every discovery until `gate` is notified
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of discoveries started
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Number of discoveries that ran to completion
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountDiscovery for FakeDiscovery {
    async fn discover_accounts(&self) -> Result<Vec<Account>, Error> {
        self.started.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        self.completed.fetch_add(1, Ordering::SeqCst);

        self.accounts.clone().map_err(Error::Discovery)
    }
}

/// Fake chain explorer
#[derive(Debug)]
pub struct FakeChain {
    tip_time: Result<u64, String>,
    delay: Option<Duration>,
    completed: AtomicUsize,
}

impl FakeChain {
    /// Chain with its tip at `tip_time`
    pub fn new(tip_time: u64) -> Self {
        Self::with_result(Ok(tip_time))
    }

    /// Chain with its tip at the current time
    pub fn now() -> Self {
        Self::new(unix_time())
    }

    /// Chain whose tip request fails with `message`
    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(message.to_string()))
    }

    fn with_result(tip_time: Result<u64, String>) -> Self {
        Self {
            tip_time,
            delay: None,
            completed: AtomicUsize::new(0),
        }
    }

    /// Delay every tip request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of tip requests that ran to completion
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainSource for FakeChain {
    async fn tip_time(&self) -> Result<u64, Error> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        self.completed.fetch_add(1, Ordering::SeqCst);

        self.tip_time.clone().map_err(Error::TipTime)
    }
}

/// Sink keeping every published result
#[derive(Debug, Default)]
pub struct RecordingSink {
    published: Mutex<Vec<RewardData>>,
}

impl RecordingSink {
    /// Create a new [`RecordingSink`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first
    pub fn published(&self) -> Vec<RewardData> {
        self.lock().clone()
    }

    /// Last published result
    pub fn last(&self) -> Option<RewardData> {
        self.lock().last().cloned()
    }

    /// Number of publishes
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing was published
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RewardData>> {
        self.published
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RewardDataSink for RecordingSink {
    fn handle_reward_data(&self, data: RewardData) {
        self.lock().push(data);
    }
}
