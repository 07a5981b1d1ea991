//! Streaming progress tracker
//!
//! Phases simulate incremental work while a handler awaits the remote API.
//! Phases within one handler run are strictly sequential: a new phase begins
//! only after the previous one is terminal, and a failed phase ends the run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed enumeration of phase kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Processing,
    Keywords,
    Sources,
    Explanation,
    Visual,
    Finalizing,
    Quiz,
    Grading,
    Topics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Active,
    Completed,
    Error,
}

impl PhaseStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PhaseStatus::Completed | PhaseStatus::Error)
    }
}

/// One step of simulated or real asynchronous work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressPhase {
    pub id: u64,
    pub kind: PhaseKind,
    /// Short line shown while the phase runs
    pub label: String,
    /// Secondary descriptive text
    pub detail: String,
    pub status: PhaseStatus,
}

/// Static choreography entry: what to show and how long to dwell on it
#[derive(Debug, Clone, Copy)]
pub struct PhaseSpec {
    pub kind: PhaseKind,
    pub label: &'static str,
    pub detail: &'static str,
    pub delay: Duration,
}

/// Tracker for the current handler run.
///
/// `begin_run` clears the previous run; phases are never partially retained
/// across handlers. `collapse` is called exactly once per handler invocation,
/// on both success and failure paths.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    phases: Vec<ProgressPhase>,
    next_id: u64,
    collapsed: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            phases: Vec::new(),
            next_id: 1,
            collapsed: false,
        }
    }

    /// Start a fresh run, discarding any prior phases
    pub fn begin_run(&mut self) {
        self.phases.clear();
        self.collapsed = false;
    }

    /// Append an `Active` phase and return its id
    pub fn begin_phase(
        &mut self,
        kind: PhaseKind,
        label: impl Into<String>,
        detail: impl Into<String>,
    ) -> u64 {
        debug_assert!(!self.collapsed, "begin_phase after collapse");
        debug_assert!(
            self.phases
                .last()
                .is_none_or(|p| p.status == PhaseStatus::Completed),
            "begin_phase requires the previous phase to be completed"
        );

        let id = self.next_id;
        self.next_id += 1;
        self.phases.push(ProgressPhase {
            id,
            kind,
            label: label.into(),
            detail: detail.into(),
            status: PhaseStatus::Active,
        });
        id
    }

    /// Transition a phase to `Completed`, optionally replacing its label
    pub fn complete_phase(&mut self, phase_id: u64, final_label: Option<String>) {
        if let Some(phase) = self.phase_mut(phase_id) {
            phase.status = PhaseStatus::Completed;
            if let Some(label) = final_label {
                phase.label = label;
            }
        }
    }

    /// Transition a phase to `Error`. This phase ends the run's sequence.
    pub fn fail_phase(&mut self, phase_id: u64, error_label: impl Into<String>) {
        if let Some(phase) = self.phase_mut(phase_id) {
            phase.status = PhaseStatus::Error;
            phase.label = error_label.into();
        }
    }

    /// Fail whichever phase is still active, if any
    pub fn fail_active_phase(&mut self, error_label: impl Into<String>) {
        if let Some(phase) = self
            .phases
            .iter_mut()
            .find(|p| p.status == PhaseStatus::Active)
        {
            phase.status = PhaseStatus::Error;
            phase.label = error_label.into();
        }
    }

    /// Mark the run finished. The UI renders it as an already-completed,
    /// collapsible block.
    pub fn collapse(&mut self) {
        debug_assert!(!self.collapsed, "collapse called twice for one run");
        self.collapsed = true;
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn phases(&self) -> &[ProgressPhase] {
        &self.phases
    }

    pub fn phase(&self, phase_id: u64) -> Option<&ProgressPhase> {
        self.phases.iter().find(|p| p.id == phase_id)
    }

    /// True when no phase is left in `Active` state
    pub fn all_terminal(&self) -> bool {
        self.phases.iter().all(|p| p.status.is_terminal())
    }

    fn phase_mut(&mut self, phase_id: u64) -> Option<&mut ProgressPhase> {
        self.phases.iter_mut().find(|p| p.id == phase_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_progress_sequentially() {
        let mut tracker = ProgressTracker::new();
        tracker.begin_run();
        let a = tracker.begin_phase(PhaseKind::Processing, "Processing...", "");
        tracker.complete_phase(a, None);
        let b = tracker.begin_phase(PhaseKind::Keywords, "Extracting...", "");
        tracker.complete_phase(b, Some("Extracted 4 keywords".to_string()));
        assert!(tracker.all_terminal());
        assert_eq!(tracker.phase(b).unwrap().label, "Extracted 4 keywords");
    }

    #[test]
    fn begin_run_discards_previous_phases() {
        let mut tracker = ProgressTracker::new();
        tracker.begin_run();
        let a = tracker.begin_phase(PhaseKind::Quiz, "Creating quiz...", "");
        tracker.complete_phase(a, None);
        tracker.collapse();

        tracker.begin_run();
        assert!(tracker.phases().is_empty());
        assert!(!tracker.is_collapsed());
    }

    #[test]
    fn fail_active_phase_marks_the_in_flight_step() {
        let mut tracker = ProgressTracker::new();
        tracker.begin_run();
        let a = tracker.begin_phase(PhaseKind::Sources, "Searching...", "");
        tracker.complete_phase(a, None);
        tracker.begin_phase(PhaseKind::Explanation, "Generating...", "");
        tracker.fail_active_phase("Generating... - Error occurred");
        assert!(tracker.all_terminal());
        let last = tracker.phases().last().unwrap();
        assert_eq!(last.status, PhaseStatus::Error);
    }

    #[test]
    fn fail_active_phase_is_noop_without_active_phase() {
        let mut tracker = ProgressTracker::new();
        tracker.begin_run();
        tracker.fail_active_phase("nothing running");
        assert!(tracker.phases().is_empty());
    }
}
