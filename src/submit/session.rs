use crate::error::TransitionError;
use crate::state::wizard::{SubmitOutcome, Wizard};
use crate::submit::coordinator::{SubmissionCompletion, SubmissionCoordinator};
use log::warn;
use std::time::Duration;

/// One user's wizard plus the coordinator that delivers its submission.
pub struct WizardSession {
    wizard: Wizard,
    coordinator: SubmissionCoordinator,
}

impl WizardSession {
    pub fn new(wizard: Wizard, coordinator: SubmissionCoordinator) -> Self {
        Self {
            wizard,
            coordinator,
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard {
        &mut self.wizard
    }

    pub fn into_wizard(self) -> Wizard {
        self.wizard
    }

    pub fn confirm_submit(&mut self) -> Result<SubmitOutcome, TransitionError> {
        self.wizard.confirm_submit(&self.coordinator)
    }

    /// Starts delivery on a worker thread and returns the attempt number.
    /// Results are applied by [`poll`](Self::poll) or [`wait`](Self::wait).
    pub fn confirm_submit_async(&mut self) -> Result<u64, TransitionError> {
        let pending = self.wizard.begin_submit()?;
        self.coordinator.spawn(pending.attempt, pending.values);
        Ok(pending.attempt)
    }

    pub fn poll(&mut self) -> Vec<SubmitOutcome> {
        self.coordinator
            .drain_ready()
            .into_iter()
            .filter_map(|completion| self.apply(completion))
            .collect()
    }

    pub fn wait(&mut self, timeout: Duration) -> Option<SubmitOutcome> {
        let completion = self.coordinator.wait_next(timeout)?;
        self.apply(completion)
    }

    fn apply(&mut self, completion: SubmissionCompletion) -> Option<SubmitOutcome> {
        match self.wizard.finish_submit(completion.attempt, completion.result) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!("dropping submission completion: {err}");
                None
            }
        }
    }
}
