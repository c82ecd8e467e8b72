use crate::core::FieldId;
use crate::core::clock::{Clock, SystemClock};
use crate::core::value::FieldValues;
use crate::error::{SubmissionError, TransitionError};
use crate::schema::{SchemaRegistry, StepDefinition};
use crate::state::flow::{Flow, StepStatus};
use crate::submit::coordinator::SubmissionCoordinator;
use crate::validation::{FieldErrors, RuleContext, ValidationResult, validate_step};
use log::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardPhase {
    Collecting,
    ReviewPending,
    Submitting { attempt: u64 },
    SubmitFailed { attempt: u64, error: SubmissionError },
    Submitted,
}

impl WizardPhase {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Collecting => "collecting",
            Self::ReviewPending => "review_pending",
            Self::Submitting { .. } => "submitting",
            Self::SubmitFailed { .. } => "submit_failed",
            Self::Submitted => "submitted",
        }
    }

    /// Review, an in-flight submission and a failed one all keep the modal open.
    pub fn confirmation_open(&self) -> bool {
        matches!(
            self,
            Self::ReviewPending | Self::Submitting { .. } | Self::SubmitFailed { .. }
        )
    }

    fn in_review(&self) -> bool {
        matches!(self, Self::ReviewPending | Self::SubmitFailed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved { to: usize },
    ReviewOpened,
    Blocked(FieldErrors),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    Failed(SubmissionError),
}

/// A submission handed out by [`Wizard::begin_submit`]; report it back with
/// [`Wizard::finish_submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub attempt: u64,
    pub values: FieldValues,
}

pub struct Wizard {
    registry: SchemaRegistry,
    clock: Box<dyn Clock>,
    flow: Flow,
    values: FieldValues,
    errors: FieldErrors,
    phase: WizardPhase,
    attempts: u64,
}

impl Wizard {
    pub fn new(registry: SchemaRegistry) -> Self {
        let flow = Flow::new(registry.len());
        Self {
            registry,
            clock: Box::new(SystemClock),
            flow,
            values: FieldValues::new(),
            errors: FieldErrors::new(),
            phase: WizardPhase::Collecting,
            attempts: 0,
        }
    }

    pub fn checkout() -> Self {
        Self::new(SchemaRegistry::checkout())
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn phase(&self) -> &WizardPhase {
        &self.phase
    }

    pub fn current_step(&self) -> usize {
        self.flow.current()
    }

    pub fn total_steps(&self) -> usize {
        self.flow.len()
    }

    pub fn step_status(&self, position: usize) -> StepStatus {
        self.flow.status_at(position)
    }

    pub fn step_statuses(&self) -> &[StepStatus] {
        self.flow.statuses()
    }

    pub fn current_definition(&self) -> Result<&StepDefinition, TransitionError> {
        self.registry.step(self.flow.current())
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn confirmation_open(&self) -> bool {
        self.phase.confirmation_open()
    }

    pub fn update_field(&mut self, id: impl Into<FieldId>, value: impl Into<String>) {
        let id = id.into();
        debug!("field `{id}` updated");
        self.values.set(id, value);
    }

    /// Validates the current step and moves forward when it passes. A failed
    /// validation is not an error: the step stays put and `errors()` holds the
    /// messages.
    pub fn advance(&mut self) -> Result<Advance, TransitionError> {
        self.ensure_collecting()?;

        let step = self.flow.current();
        let definition = self.registry.step(step)?;
        let ctx = RuleContext::from_clock(self.clock.as_ref());

        match validate_step(definition, &self.values, &ctx) {
            ValidationResult::Invalid(errors) => {
                debug!("step {step} blocked by {} field error(s)", errors.len());
                self.errors = errors.clone();
                Ok(Advance::Blocked(errors))
            }
            ValidationResult::Valid => {
                self.errors.clear();
                if self.flow.advance() {
                    let to = self.flow.current();
                    info!("step {step} complete, moving to step {to}");
                    Ok(Advance::Moved { to })
                } else {
                    self.flow.complete_current();
                    info!("step {step} complete, opening review");
                    self.phase = WizardPhase::ReviewPending;
                    Ok(Advance::ReviewOpened)
                }
            }
        }
    }

    /// Steps back without validating. Returns the new position.
    pub fn retreat(&mut self) -> Result<usize, TransitionError> {
        self.ensure_collecting()?;

        if !self.flow.retreat() {
            return Err(TransitionError::NoPreviousStep);
        }
        self.errors.clear();
        let to = self.flow.current();
        debug!("retreated to step {to}");
        Ok(to)
    }

    pub fn cancel_review(&mut self) -> Result<(), TransitionError> {
        match self.phase {
            WizardPhase::ReviewPending | WizardPhase::SubmitFailed { .. } => {
                debug!("review cancelled, back to step {}", self.flow.current());
                self.phase = WizardPhase::Collecting;
                Ok(())
            }
            WizardPhase::Submitting { .. } => Err(TransitionError::SubmissionInProgress),
            WizardPhase::Submitted => Err(TransitionError::AlreadySubmitted),
            WizardPhase::Collecting => Err(TransitionError::NotInReview),
        }
    }

    /// Governed fields only, in registry order.
    pub fn snapshot(&self) -> FieldValues {
        self.registry
            .field_ids()
            .filter_map(|id| self.values.get(id).map(|value| (id, value)))
            .collect()
    }

    /// Validates every step again first. The first step that fails is
    /// reopened with its errors and nothing is handed out.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, TransitionError> {
        match self.phase {
            _ if self.phase.in_review() => {}
            WizardPhase::Submitting { .. } => return Err(TransitionError::SubmissionInProgress),
            WizardPhase::Submitted => return Err(TransitionError::AlreadySubmitted),
            _ => return Err(TransitionError::NotInReview),
        }

        if let Some((step, errors)) = self.first_invalid_step() {
            warn!("step {step} changed since review opened, reopening it");
            self.flow.rewind_to(step);
            self.errors = errors;
            self.phase = WizardPhase::Collecting;
            return Err(TransitionError::StepInvalid(step));
        }

        self.attempts = self.attempts.saturating_add(1);
        let attempt = self.attempts;
        self.phase = WizardPhase::Submitting { attempt };
        debug!("submission attempt {attempt} started");
        Ok(PendingSubmission {
            attempt,
            values: self.snapshot(),
        })
    }

    pub fn finish_submit(
        &mut self,
        attempt: u64,
        result: Result<(), SubmissionError>,
    ) -> Result<SubmitOutcome, TransitionError> {
        match self.phase {
            WizardPhase::Submitting { attempt: in_flight } if in_flight == attempt => {}
            _ => return Err(TransitionError::StaleSubmission(attempt)),
        }

        match result {
            Ok(()) => {
                info!("submission attempt {attempt} accepted");
                self.phase = WizardPhase::Submitted;
                Ok(SubmitOutcome::Submitted)
            }
            Err(error) => {
                warn!("submission attempt {attempt} failed: {error}");
                self.phase = WizardPhase::SubmitFailed {
                    attempt,
                    error: error.clone(),
                };
                Ok(SubmitOutcome::Failed(error))
            }
        }
    }

    /// Delivers the snapshot synchronously through `coordinator`.
    pub fn confirm_submit(
        &mut self,
        coordinator: &SubmissionCoordinator,
    ) -> Result<SubmitOutcome, TransitionError> {
        let pending = self.begin_submit()?;
        let result = coordinator.submit(&pending.values);
        self.finish_submit(pending.attempt, result)
    }

    /// Starts over from step 1 with nothing filled in.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        if let WizardPhase::Submitting { .. } = self.phase {
            return Err(TransitionError::SubmissionInProgress);
        }
        self.flow = Flow::new(self.registry.len());
        self.values.clear();
        self.errors.clear();
        self.phase = WizardPhase::Collecting;
        info!("wizard reset");
        Ok(())
    }

    fn first_invalid_step(&self) -> Option<(usize, FieldErrors)> {
        let ctx = RuleContext::from_clock(self.clock.as_ref());
        self.registry.steps().iter().find_map(|step| {
            match validate_step(step, &self.values, &ctx) {
                ValidationResult::Valid => None,
                ValidationResult::Invalid(errors) => Some((step.position(), errors)),
            }
        })
    }

    fn ensure_collecting(&self) -> Result<(), TransitionError> {
        match self.phase {
            WizardPhase::Collecting => Ok(()),
            WizardPhase::ReviewPending | WizardPhase::SubmitFailed { .. } => {
                Err(TransitionError::AlreadyAtReview)
            }
            WizardPhase::Submitting { .. } => Err(TransitionError::SubmissionInProgress),
            WizardPhase::Submitted => Err(TransitionError::AlreadySubmitted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Advance, SubmitOutcome, Wizard, WizardPhase};
    use crate::core::clock::FixedClock;
    use crate::core::value::FieldValues;
    use crate::error::{SubmissionError, TransitionError};
    use crate::state::flow::StepStatus;
    use crate::submit::coordinator::SubmissionCoordinator;
    use crate::submit::sink::MemorySink;
    use chrono::NaiveDate;
    use std::sync::Arc;

    const PERSONAL: [(&str, &str); 3] = [
        ("firstName", "Ada"),
        ("lastName", "Lovelace"),
        ("email", "ada@example.com"),
    ];
    const ADDRESS: [(&str, &str); 3] = [
        ("address", "12 St James's Square"),
        ("city", "London"),
        ("postalCode", "123456"),
    ];
    const PAYMENT: [(&str, &str); 3] = [
        ("cardNumber", "4111111111111111"),
        ("expiryDate", "12/30"),
        ("cvv", "123"),
    ];

    fn wizard() -> Wizard {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
        Wizard::checkout().with_clock(FixedClock(today))
    }

    fn fill(wizard: &mut Wizard, fields: &[(&str, &str)]) {
        for (id, value) in fields {
            wizard.update_field(*id, *value);
        }
    }

    fn at_review() -> Wizard {
        let mut wizard = wizard();
        for step in [&PERSONAL, &ADDRESS, &PAYMENT] {
            fill(&mut wizard, step);
            wizard.advance().expect("advance");
        }
        assert_eq!(wizard.phase(), &WizardPhase::ReviewPending);
        wizard
    }

    #[test]
    fn starts_fresh() {
        let wizard = wizard();
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(wizard.total_steps(), 3);
        assert!(wizard.values().is_empty());
        assert!(wizard.errors().is_empty());
        assert!(!wizard.confirmation_open());
    }

    #[test]
    fn empty_step_reports_every_required_field() {
        let mut wizard = wizard();
        let Advance::Blocked(errors) = wizard.advance().expect("advance") else {
            panic!("expected blocked");
        };
        assert_eq!(errors.field_ids().collect::<Vec<_>>(), vec!["firstName", "lastName", "email"]);
        assert_eq!(wizard.errors(), &errors);
        assert_eq!(wizard.current_step(), 1);
    }

    #[test]
    fn empty_later_steps_report_every_required_field() {
        let mut wizard = wizard();
        fill(&mut wizard, &PERSONAL);
        wizard.advance().expect("advance");

        let Advance::Blocked(errors) = wizard.advance().expect("advance") else {
            panic!("expected step 2 to block");
        };
        assert_eq!(errors.field_ids().collect::<Vec<_>>(), vec!["address", "city", "postalCode"]);
        assert_eq!(wizard.current_step(), 2);

        fill(&mut wizard, &ADDRESS);
        wizard.advance().expect("advance");
        let Advance::Blocked(errors) = wizard.advance().expect("advance") else {
            panic!("expected step 3 to block");
        };
        assert_eq!(errors.field_ids().collect::<Vec<_>>(), vec!["cardNumber", "expiryDate", "cvv"]);
        assert_eq!(wizard.current_step(), 3);
        assert!(!wizard.confirmation_open());
    }

    #[test]
    fn update_field_does_not_validate() {
        let mut wizard = wizard();
        wizard.update_field("email", "not-an-email");
        assert!(wizard.errors().is_empty());
        assert_eq!(wizard.values().get("email"), Some("not-an-email"));
    }

    #[test]
    fn valid_step_moves_forward_and_clears_errors() {
        let mut wizard = wizard();
        wizard.advance().expect("advance");
        assert!(!wizard.errors().is_empty());

        fill(&mut wizard, &PERSONAL);
        assert_eq!(wizard.advance(), Ok(Advance::Moved { to: 2 }));
        assert!(wizard.errors().is_empty());
        assert_eq!(wizard.step_status(1), StepStatus::Done);
        assert_eq!(wizard.phase(), &WizardPhase::Collecting);
        assert_eq!(wizard.current_step(), 2);
    }

    #[test]
    fn second_advance_validates_the_next_step_instead_of_skipping_it() {
        let mut wizard = wizard();
        fill(&mut wizard, &PERSONAL);
        assert_eq!(wizard.advance(), Ok(Advance::Moved { to: 2 }));

        let second = wizard.advance().expect("advance");
        assert!(matches!(second, Advance::Blocked(_)));
        assert_eq!(wizard.current_step(), 2);
    }

    #[test]
    fn failed_attempt_is_rerun_after_fix() {
        let mut wizard = wizard();
        fill(&mut wizard, &PERSONAL);
        wizard.update_field("email", "broken");
        assert!(matches!(wizard.advance(), Ok(Advance::Blocked(_))));
        assert!(matches!(wizard.advance(), Ok(Advance::Blocked(_))));

        wizard.update_field("email", "ada@example.com");
        assert_eq!(wizard.advance(), Ok(Advance::Moved { to: 2 }));
    }

    #[test]
    fn retreat_from_first_step_is_rejected_without_errors() {
        let mut wizard = wizard();
        assert_eq!(wizard.retreat(), Err(TransitionError::NoPreviousStep));
        assert_eq!(wizard.current_step(), 1);
        assert!(wizard.errors().is_empty());
    }

    #[test]
    fn retreat_skips_validation_and_clears_errors() {
        let mut wizard = wizard();
        fill(&mut wizard, &PERSONAL);
        wizard.advance().expect("advance");
        wizard.advance().expect("advance");
        assert!(!wizard.errors().is_empty());

        assert_eq!(wizard.retreat(), Ok(1));
        assert!(wizard.errors().is_empty());
        assert_eq!(wizard.values().get("firstName"), Some("Ada"));
    }

    #[test]
    fn revisiting_a_later_step_keeps_earlier_values() {
        let mut wizard = wizard();
        fill(&mut wizard, &PERSONAL);
        wizard.advance().expect("advance");
        fill(&mut wizard, &ADDRESS);
        wizard.advance().expect("advance");
        wizard.retreat().expect("retreat");
        wizard.update_field("city", "");
        assert!(matches!(wizard.advance(), Ok(Advance::Blocked(_))));
        assert_eq!(wizard.values().get("email"), Some("ada@example.com"));
        assert_eq!(wizard.step_status(1), StepStatus::Done);
    }

    #[test]
    fn last_step_opens_review() {
        let wizard = at_review();
        assert_eq!(wizard.current_step(), 3);
        assert!(wizard.confirmation_open());
    }

    #[test]
    fn advance_and_retreat_rejected_in_review() {
        let mut wizard = at_review();
        assert_eq!(wizard.advance(), Err(TransitionError::AlreadyAtReview));
        assert_eq!(wizard.retreat(), Err(TransitionError::AlreadyAtReview));
        assert_eq!(wizard.phase(), &WizardPhase::ReviewPending);
    }

    #[test]
    fn expired_card_blocks_review() {
        let mut wizard = wizard();
        fill(&mut wizard, &PERSONAL);
        wizard.advance().expect("advance");
        fill(&mut wizard, &ADDRESS);
        wizard.advance().expect("advance");
        fill(&mut wizard, &PAYMENT);
        wizard.update_field("expiryDate", "01/20");

        assert!(matches!(wizard.advance(), Ok(Advance::Blocked(_))));
        assert_eq!(wizard.errors().get("expiryDate"), Some("Card has expired"));
        assert!(!wizard.confirmation_open());
    }

    #[test]
    fn cancel_review_round_trip_keeps_values() {
        let mut wizard = at_review();
        let before = wizard.values().clone();

        wizard.cancel_review().expect("cancel");
        assert_eq!(wizard.phase(), &WizardPhase::Collecting);
        assert_eq!(wizard.current_step(), 3);
        assert!(!wizard.confirmation_open());

        assert_eq!(wizard.advance(), Ok(Advance::ReviewOpened));
        assert_eq!(wizard.values(), &before);
    }

    #[test]
    fn cancel_review_outside_review_is_rejected() {
        let mut wizard = wizard();
        assert_eq!(wizard.cancel_review(), Err(TransitionError::NotInReview));
    }

    #[test]
    fn confirm_delivers_union_of_all_steps() {
        let sink = Arc::new(MemorySink::new());
        let coordinator = SubmissionCoordinator::new(sink.clone());
        let mut wizard = at_review();
        wizard.update_field("promoCode", "not governed");

        assert_eq!(wizard.confirm_submit(&coordinator), Ok(SubmitOutcome::Submitted));
        assert_eq!(wizard.phase(), &WizardPhase::Submitted);

        let expected: FieldValues = PERSONAL
            .iter()
            .chain(ADDRESS.iter())
            .chain(PAYMENT.iter())
            .copied()
            .collect();
        assert_eq!(sink.delivered(), vec![expected]);
    }

    #[test]
    fn edit_during_review_reopens_the_owning_step_instead_of_submitting() {
        let sink = Arc::new(MemorySink::new());
        let coordinator = SubmissionCoordinator::new(sink.clone());
        let mut wizard = at_review();
        wizard.update_field("email", "not-an-email");
        wizard.update_field("cardNumber", "");

        assert_eq!(
            wizard.confirm_submit(&coordinator),
            Err(TransitionError::StepInvalid(1))
        );
        assert_eq!(sink.delivery_count(), 0);
        assert_eq!(wizard.phase(), &WizardPhase::Collecting);
        assert_eq!(wizard.current_step(), 1);
        assert_eq!(wizard.errors().get("email"), Some("Invalid email address"));
        assert!(!wizard.errors().contains("cardNumber"));
        assert_eq!(
            wizard.step_statuses(),
            &[StepStatus::Active, StepStatus::Pending, StepStatus::Pending]
        );

        wizard.update_field("email", "ada@example.com");
        assert_eq!(wizard.advance(), Ok(Advance::Moved { to: 2 }));
        assert_eq!(wizard.advance(), Ok(Advance::Moved { to: 3 }));
        assert!(matches!(wizard.advance(), Ok(Advance::Blocked(_))));
        assert_eq!(wizard.errors().get("cardNumber"), Some("Card number is required"));

        wizard.update_field("cardNumber", "4111111111111111");
        assert_eq!(wizard.advance(), Ok(Advance::ReviewOpened));
        assert_eq!(wizard.confirm_submit(&coordinator), Ok(SubmitOutcome::Submitted));
        let delivered = sink.delivered();
        assert_eq!(delivered[0].get("email"), Some("ada@example.com"));
        assert_eq!(delivered[0].get("cardNumber"), Some("4111111111111111"));
    }

    #[test]
    fn edit_after_failed_submission_is_revalidated_before_retry() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_next(SubmissionError::Timeout);
        let coordinator = SubmissionCoordinator::new(sink.clone());
        let mut wizard = at_review();
        wizard.confirm_submit(&coordinator).expect("first attempt");

        wizard.update_field("expiryDate", "01/20");
        assert_eq!(wizard.begin_submit(), Err(TransitionError::StepInvalid(3)));
        assert_eq!(wizard.current_step(), 3);
        assert_eq!(wizard.errors().get("expiryDate"), Some("Card has expired"));
        assert!(!wizard.confirmation_open());
        assert_eq!(sink.delivery_count(), 0);
    }

    #[test]
    fn confirm_requires_review() {
        let coordinator = SubmissionCoordinator::from_sink(MemorySink::new());
        let mut wizard = wizard();
        assert_eq!(
            wizard.confirm_submit(&coordinator),
            Err(TransitionError::NotInReview)
        );
    }

    #[test]
    fn failed_submission_keeps_values_and_allows_retry() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_next(SubmissionError::Timeout);
        let coordinator = SubmissionCoordinator::new(sink.clone());
        let mut wizard = at_review();
        let before = wizard.values().clone();

        assert_eq!(
            wizard.confirm_submit(&coordinator),
            Ok(SubmitOutcome::Failed(SubmissionError::Timeout))
        );
        assert!(matches!(wizard.phase(), WizardPhase::SubmitFailed { attempt: 1, .. }));
        assert!(wizard.confirmation_open());
        assert_eq!(wizard.values(), &before);

        assert_eq!(wizard.confirm_submit(&coordinator), Ok(SubmitOutcome::Submitted));
        assert_eq!(sink.delivery_count(), 1);
    }

    #[test]
    fn second_begin_while_in_flight_is_rejected() {
        let mut wizard = at_review();
        let pending = wizard.begin_submit().expect("begin");
        assert_eq!(pending.attempt, 1);
        assert_eq!(wizard.begin_submit(), Err(TransitionError::SubmissionInProgress));
        assert_eq!(wizard.cancel_review(), Err(TransitionError::SubmissionInProgress));
        assert_eq!(wizard.reset(), Err(TransitionError::SubmissionInProgress));

        assert_eq!(
            wizard.finish_submit(pending.attempt, Ok(())),
            Ok(SubmitOutcome::Submitted)
        );
    }

    #[test]
    fn stale_completion_is_rejected() {
        let mut wizard = at_review();
        let pending = wizard.begin_submit().expect("begin");
        assert_eq!(
            wizard.finish_submit(pending.attempt + 1, Ok(())),
            Err(TransitionError::StaleSubmission(pending.attempt + 1))
        );
        assert_eq!(
            wizard.phase(),
            &WizardPhase::Submitting {
                attempt: pending.attempt
            }
        );
    }

    #[test]
    fn submitted_wizard_is_terminal_until_reset() {
        let coordinator = SubmissionCoordinator::from_sink(MemorySink::new());
        let mut wizard = at_review();
        wizard.confirm_submit(&coordinator).expect("confirm");

        assert_eq!(wizard.advance(), Err(TransitionError::AlreadySubmitted));
        assert_eq!(
            wizard.confirm_submit(&coordinator),
            Err(TransitionError::AlreadySubmitted)
        );

        wizard.reset().expect("reset");
        assert_eq!(wizard.current_step(), 1);
        assert!(wizard.values().is_empty());
        assert_eq!(wizard.step_status(1), StepStatus::Active);
    }
}
