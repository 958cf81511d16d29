//! Workflow state of a reward scan.
//!
//! The state is what a progress dialog renders: one status per [`Step`],
//! a running flag and the error of the failed step, if any.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Interactive step of a scan, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Connect and unlock the device, open the Komodo app
    Connect,
    /// Approve the public key export requests
    Approve,
}

impl Step {
    /// All steps in display order
    pub const ALL: [Step; 2] = [Step::Connect, Step::Approve];

    /// Icon identifier
    pub fn icon(&self) -> &'static str {
        match self {
            Step::Connect => "fab fa-usb",
            Step::Approve => "fas fa-microchip",
        }
    }

    /// Instruction shown to the user
    pub fn description(&self) -> &'static str {
        match self {
            Step::Connect => {
                "Connect and unlock your Ledger, then open the Komodo app on your device."
            }
            Step::Approve => {
                "Approve all public key export requests on your device. There will be multiple requests."
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Connect => write!(f, "connect"),
            Step::Approve => write!(f, "approve"),
        }
    }
}

/// Status of a single step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum StepStatus {
    /// Not reached yet
    #[default]
    Unset,
    /// Waiting on the device or the network
    Loading,
    /// Done
    Succeeded,
    /// Failed with a message for the user
    Failed(String),
}

impl StepStatus {
    /// Whether moving to `next` keeps the step monotonic
    pub fn can_transition_to(&self, next: &StepStatus) -> bool {
        matches!(
            (self, next),
            (StepStatus::Unset, StepStatus::Loading)
                | (StepStatus::Loading, StepStatus::Succeeded)
                | (StepStatus::Loading, StepStatus::Failed(_))
        )
    }

    /// Whether the step has finished, either way
    pub fn is_final(&self) -> bool {
        matches!(self, StepStatus::Succeeded | StepStatus::Failed(_))
    }
}

/// State of the scan workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Whether a scan is in progress or its error is still displayed
    pub is_running: bool,
    /// Status of each step
    pub steps: BTreeMap<Step, StepStatus>,
    /// Message of the failure that ended the run
    pub error: Option<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::initial()
    }
}

impl WorkflowState {
    /// Idle state: nothing running, all steps unset
    pub fn initial() -> Self {
        Self {
            is_running: false,
            steps: Step::ALL
                .into_iter()
                .map(|step| (step, StepStatus::Unset))
                .collect(),
            error: None,
        }
    }

    /// Fresh state for a run that just started
    pub fn running() -> Self {
        Self {
            is_running: true,
            ..Self::initial()
        }
    }

    /// Status of a step
    pub fn status(&self, step: Step) -> &StepStatus {
        const UNSET: &StepStatus = &StepStatus::Unset;
        self.steps.get(&step).unwrap_or(UNSET)
    }

    /// Set the status of one step, leaving the others untouched.
    ///
    /// Returns false if the transition would go backwards.
    pub fn set_status(&mut self, step: Step, status: StepStatus) -> bool {
        let entry = self.steps.entry(step).or_default();
        if !entry.can_transition_to(&status) {
            tracing::warn!(
                "Ignoring {} step transition from {:?} to {:?}",
                step,
                entry,
                status
            );
            return false;
        }
        *entry = status;
        true
    }

    /// Mark `step` failed and record the message as the run error
    pub fn fail(&mut self, step: Step, message: String) -> bool {
        if !self.set_status(step, StepStatus::Failed(message.clone())) {
            return false;
        }
        self.error = Some(message);
        true
    }

    /// First step that failed
    pub fn failed_step(&self) -> Option<Step> {
        self.steps
            .iter()
            .find(|(_, status)| matches!(status, StepStatus::Failed(_)))
            .map(|(step, _)| *step)
    }

    /// Whether this is the idle state
    pub fn is_initial(&self) -> bool {
        *self == Self::initial()
    }
}

/// One step as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    /// Step
    pub step: Step,
    /// Icon identifier
    pub icon: &'static str,
    /// Instruction text
    pub description: &'static str,
    /// Current status
    pub status: StepStatus,
}

/// Everything a progress dialog needs to render a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanView {
    /// Dialog title
    pub title: String,
    /// Explanation shown above the steps
    pub body: String,
    /// Whether the dialog is shown
    pub is_running: bool,
    /// Error of the failed step
    pub error: Option<String>,
    /// Steps in display order
    pub steps: Vec<StepView>,
}

impl ScanView {
    pub(crate) fn new(title: &str, body: &str, state: &WorkflowState) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            is_running: state.is_running,
            error: state.error.clone(),
            steps: Step::ALL
                .into_iter()
                .map(|step| StepView {
                    step,
                    icon: step.icon(),
                    description: step.description(),
                    status: state.status(step).clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = WorkflowState::initial();
        assert!(!state.is_running);
        assert!(state.error.is_none());
        for step in Step::ALL {
            assert_eq!(state.status(step), &StepStatus::Unset);
        }
        assert!(WorkflowState::default().is_initial());
        assert!(!WorkflowState::running().is_initial());
    }

    #[test]
    fn test_set_status_only_touches_one_step() {
        let mut state = WorkflowState::running();
        assert!(state.set_status(Step::Connect, StepStatus::Loading));
        assert_eq!(state.status(Step::Connect), &StepStatus::Loading);
        assert_eq!(state.status(Step::Approve), &StepStatus::Unset);
    }

    #[test]
    fn test_transitions_are_monotonic() {
        let mut state = WorkflowState::running();
        assert!(!state.set_status(Step::Connect, StepStatus::Succeeded));
        assert!(state.set_status(Step::Connect, StepStatus::Loading));
        assert!(state.set_status(Step::Connect, StepStatus::Succeeded));
        assert!(!state.set_status(Step::Connect, StepStatus::Loading));
        assert!(!state.set_status(Step::Connect, StepStatus::Failed("late".to_string())));
        assert_eq!(state.status(Step::Connect), &StepStatus::Succeeded);
    }

    #[test]
    fn test_fail_records_error() {
        let mut state = WorkflowState::running();
        state.set_status(Step::Connect, StepStatus::Loading);
        assert!(state.fail(Step::Connect, "Ledger device is unavailable!".to_string()));

        assert_eq!(state.failed_step(), Some(Step::Connect));
        assert_eq!(state.error.as_deref(), Some("Ledger device is unavailable!"));
        assert!(state.status(Step::Connect).is_final());
    }

    #[test]
    fn test_steps_display_in_declaration_order() {
        let state = WorkflowState::initial();
        let order: Vec<Step> = state.steps.keys().copied().collect();
        assert_eq!(order, Step::ALL.to_vec());

        let view = ScanView::new("title", "body", &state);
        assert_eq!(view.steps[0].icon, "fab fa-usb");
        assert_eq!(view.steps[1].icon, "fas fa-microchip");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(StepStatus::Failed("boom".to_string())).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(StepStatus::Loading).unwrap();
        assert_eq!(json["status"], "loading");
    }
}
