//! Reward scan workflow
//!
//! A scan walks the user through the device steps and ends with the
//! enriched accounts published to a [`RewardDataSink`].
//!
//! # Flow
//!
//! ```text
//! start()
//!   ├─> publish empty result, reset state (running)
//!   ├─> Connect: device.is_available()
//!   ├─> Approve: discover_accounts() + tip_time() concurrently
//!   ├─> calculate_reward_data()
//!   └─> publish result, reset state (idle)
//! ```
//!
//! # Superseded runs
//!
//! Every call to [`RewardScanner::start`] gets a new run generation and
//! cancellation token. Starting again or calling [`RewardScanner::dismiss`]
//! cancels the in-flight run; any write it still attempts is discarded
//! because its generation is no longer the active one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::aggregator::calculate_reward_data;
use crate::chain::ChainSource;
use crate::device::{AccountDiscovery, HardwareDevice};
use crate::fees::FeeSchedule;
use crate::rewards::{KomodoRewards, RewardFormula};
use crate::settings::{ScanSettings, Settings};
use crate::sink::{RewardData, RewardDataSink};
use crate::Error;

pub mod state;

pub use self::state::{ScanView, Step, StepStatus, StepView, WorkflowState};

/// How a scan ended
#[derive(Debug)]
pub enum ScanOutcome {
    /// Rewards were computed and published
    Completed(RewardData),
    /// The device holds no accounts with funds
    NoBalances,
    /// A step failed
    Failed {
        /// Step that failed
        step: Step,
        /// Cause
        error: Error,
    },
    /// A newer run or a dismissal replaced this run
    Superseded,
}

impl ScanOutcome {
    /// Whether the scan published a result
    pub fn is_completed(&self) -> bool {
        matches!(self, ScanOutcome::Completed(_))
    }

    /// Whether starting again could give a different outcome
    pub fn is_retryable(&self) -> bool {
        match self {
            ScanOutcome::Failed { error, .. } => error.is_retryable(),
            ScanOutcome::Superseded => true,
            ScanOutcome::Completed(_) | ScanOutcome::NoBalances => false,
        }
    }
}

/// Identity of one run
#[derive(Debug, Clone)]
struct RunToken {
    generation: u64,
    operation_id: Uuid,
    cancel: CancellationToken,
}

impl RunToken {
    /// Await `fut` unless the run gets cancelled first, in which case `None`
    async fn guard<T, F>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = fut => Some(result),
        }
    }
}

struct ScannerInner {
    device: Arc<dyn HardwareDevice>,
    discovery: Arc<dyn AccountDiscovery>,
    chain: Arc<dyn ChainSource>,
    formula: Arc<dyn RewardFormula>,
    sink: Arc<dyn RewardDataSink>,
    fees: FeeSchedule,
    scan_settings: ScanSettings,
    state: watch::Sender<WorkflowState>,
    /// Generation of the active run
    generation: AtomicU64,
    /// Cancellation token of the active run
    active: Mutex<CancellationToken>,
    /// Serializes publishing with starting a new run
    publish_lock: Mutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives a hardware wallet reward scan
///
/// Cheap to clone; clones share the same workflow state.
#[derive(Clone)]
pub struct RewardScanner {
    inner: Arc<ScannerInner>,
}

impl std::fmt::Debug for RewardScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardScanner")
            .field("fees", &self.inner.fees)
            .field("generation", &self.inner.generation.load(Ordering::SeqCst))
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl RewardScanner {
    /// Run a scan.
    ///
    /// Never returns an error: failures are recorded on the failed step and
    /// in [`WorkflowState::error`], and reported through the outcome.
    pub async fn start(&self) -> ScanOutcome {
        let run = {
            let _publish = lock(&self.inner.publish_lock);
            self.inner.sink.handle_reward_data(RewardData::empty());
            self.begin_run()
        };

        let span = tracing::info_span!(
            "reward_scan",
            operation_id = %run.operation_id,
            generation = run.generation
        );

        self.execute(run).instrument(span).await
    }

    /// Reset the workflow state, abandoning any in-flight run.
    ///
    /// Results already published are left as they are.
    pub fn dismiss(&self) {
        let _publish = lock(&self.inner.publish_lock);

        self.inner.state.send_modify(|state| {
            let generation = self.supersede(CancellationToken::new());
            tracing::debug!("Dismissed scan, active generation is now {}", generation);
            *state = WorkflowState::initial();
        });
    }

    /// Snapshot of the workflow state
    pub fn state(&self) -> WorkflowState {
        self.inner.state.borrow().clone()
    }

    /// Receive every change of the workflow state
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.inner.state.subscribe()
    }

    /// Current state with the text a progress dialog shows
    pub fn view(&self) -> ScanView {
        let state = self.inner.state.borrow();
        ScanView::new(
            &self.inner.scan_settings.title,
            &self.inner.scan_settings.body,
            &state,
        )
    }

    /// Fee schedule applied to rewards
    pub fn fees(&self) -> &FeeSchedule {
        &self.inner.fees
    }

    async fn execute(&self, run: RunToken) -> ScanOutcome {
        tracing::info!("Starting reward scan");

        let step = Step::Connect;
        self.update_step(&run, step, StepStatus::Loading);
        let Some(available) = run.guard(self.inner.device.is_available()).await else {
            return self.abandon(step);
        };
        match available {
            Ok(true) => {}
            Ok(false) => return self.fail(&run, step, Error::DeviceUnavailable),
            Err(err) => return self.fail(&run, step, err),
        }
        self.update_step(&run, step, StepStatus::Succeeded);

        let step = Step::Approve;
        self.update_step(&run, step, StepStatus::Loading);

        // The first failure drops the other request
        let discovered = run
            .guard(async {
                tokio::try_join!(
                    self.inner.discovery.discover_accounts(),
                    self.inner.chain.tip_time()
                )
            })
            .await;

        let (accounts, tip_time) = match discovered {
            Some(Ok(discovered)) => discovered,
            Some(Err(err)) => return self.fail(&run, step, err),
            None => return self.abandon(step),
        };

        tracing::info!(
            "Discovered {} accounts at tip time {}",
            accounts.len(),
            tip_time
        );

        let accounts = calculate_reward_data(
            accounts,
            tip_time,
            self.inner.formula.as_ref(),
            &self.inner.fees,
        );

        if accounts.is_empty() {
            return self.fail(&run, step, Error::NoBalancesFound);
        }

        if !self.update_step(&run, step, StepStatus::Succeeded) {
            return ScanOutcome::Superseded;
        }

        let data = RewardData {
            accounts,
            tip_time: Some(tip_time),
        };

        if !self.finish(&run, &data) {
            return ScanOutcome::Superseded;
        }

        tracing::info!(
            "Reward scan complete: {} accounts, {} claimable",
            data.accounts.len(),
            data.total_claimable()
        );

        ScanOutcome::Completed(data)
    }

    /// Make a new run the active one and reset the state for it
    fn begin_run(&self) -> RunToken {
        let cancel = CancellationToken::new();
        let mut generation = 0;

        self.inner.state.send_modify(|state| {
            generation = self.supersede(cancel.clone());
            *state = WorkflowState::running();
        });

        RunToken {
            generation,
            operation_id: Uuid::new_v4(),
            cancel,
        }
    }

    /// Cancel the active run and return the next generation.
    ///
    /// Must be called with the state locked.
    fn supersede(&self, next: CancellationToken) -> u64 {
        let previous = std::mem::replace(&mut *lock(&self.inner.active), next);
        previous.cancel();
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, run: &RunToken) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == run.generation
    }

    /// Set the status of one step if `run` is still active
    fn update_step(&self, run: &RunToken, step: Step, status: StepStatus) -> bool {
        tracing::debug!("Step {} -> {:?}", step, status);

        self.inner.state.send_if_modified(|state| {
            if !self.is_current(run) {
                tracing::warn!("Discarding {} update from superseded run", step);
                return false;
            }
            state.set_status(step, status)
        })
    }

    fn abandon(&self, step: Step) -> ScanOutcome {
        tracing::info!("Scan cancelled during {} step", step);
        ScanOutcome::Superseded
    }

    fn fail(&self, run: &RunToken, step: Step, error: Error) -> ScanOutcome {
        let message = error.to_string();
        let recorded = self.inner.state.send_if_modified(|state| {
            if run.cancel.is_cancelled() || !self.is_current(run) {
                return false;
            }
            state.fail(step, message.clone())
        });

        if !recorded {
            tracing::warn!("Discarding failure of superseded run: {}", message);
            return ScanOutcome::Superseded;
        }

        match error {
            Error::NoBalancesFound => {
                tracing::warn!("Scan found no account balances");
                ScanOutcome::NoBalances
            }
            error => {
                tracing::error!("Scan failed at {} step: {}", step, error);
                ScanOutcome::Failed { step, error }
            }
        }
    }

    /// Publish the result and go back to idle if `run` is still active
    fn finish(&self, run: &RunToken, data: &RewardData) -> bool {
        let _publish = lock(&self.inner.publish_lock);

        if !self.is_current(run) {
            tracing::warn!("Discarding result of superseded run");
            return false;
        }

        self.inner.sink.handle_reward_data(data.clone());

        self.inner.state.send_if_modified(|state| {
            if !self.is_current(run) {
                return false;
            }
            *state = WorkflowState::initial();
            true
        });

        true
    }
}

/// Builder for [`RewardScanner`]
#[derive(Default)]
pub struct RewardScannerBuilder {
    device: Option<Arc<dyn HardwareDevice>>,
    discovery: Option<Arc<dyn AccountDiscovery>>,
    chain: Option<Arc<dyn ChainSource>>,
    formula: Option<Arc<dyn RewardFormula>>,
    sink: Option<Arc<dyn RewardDataSink>>,
    fees: Option<FeeSchedule>,
    settings: Option<Settings>,
}

impl RewardScannerBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Hardware device to check availability on
    pub fn device(mut self, device: Arc<dyn HardwareDevice>) -> Self {
        self.device = Some(device);
        self
    }

    /// Account discovery over the device
    pub fn discovery(mut self, discovery: Arc<dyn AccountDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Chain data source
    pub fn chain(mut self, chain: Arc<dyn ChainSource>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Reward formula, defaults to [`KomodoRewards`]
    pub fn formula(mut self, formula: Arc<dyn RewardFormula>) -> Self {
        self.formula = Some(formula);
        self
    }

    /// Where results are published
    pub fn sink(mut self, sink: Arc<dyn RewardDataSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Fee schedule, overrides the one from [`Self::settings`]
    pub fn fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = Some(fees);
        self
    }

    /// Settings
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the scanner
    pub fn build(self) -> Result<RewardScanner, Error> {
        let settings = self.settings.unwrap_or_default();
        let fees = self.fees.unwrap_or(settings.fees);
        fees.validate()?;

        let (state, _) = watch::channel(WorkflowState::initial());

        let inner = ScannerInner {
            device: self.device.ok_or(Error::MissingField("device"))?,
            discovery: self.discovery.ok_or(Error::MissingField("discovery"))?,
            chain: self.chain.ok_or(Error::MissingField("chain"))?,
            formula: self.formula.unwrap_or_else(|| Arc::new(KomodoRewards)),
            sink: self.sink.ok_or(Error::MissingField("sink"))?,
            fees,
            scan_settings: settings.scan,
            state,
            generation: AtomicU64::new(0),
            active: Mutex::new(CancellationToken::new()),
            publish_lock: Mutex::new(()),
        };

        Ok(RewardScanner {
            inner: Arc::new(inner),
        })
    }
}
