//! Helpers for kmd-rewards integration tests

use std::sync::Arc;

use anyhow::Result;
use kmd_fake_device::{FakeChain, FakeDevice, FakeDiscovery, RecordingSink};
use kmd_rewards::{
    Amount, FeeSchedule, RewardFormula, RewardScanner, RewardScannerBuilder, Settings, Utxo,
};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber, once per process
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Formula paying the same reward for every output
pub fn fixed_reward(reward: u64) -> Arc<dyn RewardFormula> {
    Arc::new(move |_: &Utxo, _: u64| Amount::from(reward))
}

/// Scanner wired to fakes, with handles to inspect them
pub struct TestScanner {
    /// Scanner under test
    pub scanner: RewardScanner,
    /// Fake device
    pub device: Arc<FakeDevice>,
    /// Fake discovery
    pub discovery: Arc<FakeDiscovery>,
    /// Fake chain
    pub chain: Arc<FakeChain>,
    /// Everything the scanner published
    pub sink: Arc<RecordingSink>,
}

/// Builder for [`TestScanner`]
pub struct TestScannerBuilder {
    device: FakeDevice,
    discovery: FakeDiscovery,
    chain: FakeChain,
    formula: Option<Arc<dyn RewardFormula>>,
    fees: Option<FeeSchedule>,
    settings: Option<Settings>,
}

impl TestScannerBuilder {
    /// Start from the given discovery, with an available device and a chain tip
    /// one day after the fake locktime
    pub fn new(discovery: FakeDiscovery) -> Self {
        Self {
            device: FakeDevice::available(),
            discovery,
            chain: FakeChain::new(kmd_fake_device::FAKE_LOCKTIME + 86_400),
            formula: None,
            fees: None,
            settings: None,
        }
    }

    /// Use this device
    pub fn device(mut self, device: FakeDevice) -> Self {
        self.device = device;
        self
    }

    /// Use this chain
    pub fn chain(mut self, chain: FakeChain) -> Self {
        self.chain = chain;
        self
    }

    /// Use this formula instead of the Komodo one
    pub fn formula(mut self, formula: Arc<dyn RewardFormula>) -> Self {
        self.formula = Some(formula);
        self
    }

    /// Use this fee schedule
    pub fn fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = Some(fees);
        self
    }

    /// Use these settings
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the scanner
    pub fn build(self) -> Result<TestScanner> {
        let device = Arc::new(self.device);
        let discovery = Arc::new(self.discovery);
        let chain = Arc::new(self.chain);
        let sink = Arc::new(RecordingSink::new());

        let mut builder = RewardScannerBuilder::new()
            .device(device.clone())
            .discovery(discovery.clone())
            .chain(chain.clone())
            .sink(sink.clone());

        if let Some(formula) = self.formula {
            builder = builder.formula(formula);
        }
        if let Some(settings) = self.settings {
            builder = builder.settings(settings);
        }
        if let Some(fees) = self.fees {
            builder = builder.fees(fees);
        }

        Ok(TestScanner {
            scanner: builder.build()?,
            device,
            discovery,
            chain,
            sink,
        })
    }
}

/// Yield until `condition` holds
pub async fn wait_until<F>(condition: F)
where
    F: Fn() -> bool,
{
    while !condition() {
        tokio::task::yield_now().await;
    }
}
