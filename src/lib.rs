pub mod core;
pub mod error;
pub mod schema;
pub mod state;
pub mod submit;
pub mod validation;

pub use crate::core::clock;
pub use crate::core::value;
pub use crate::core::FieldId;
pub use state::flow;
pub use state::view;
pub use state::wizard;

pub use error::{SchemaError, SubmissionError, TransitionError};
pub use schema::{SchemaRegistry, StepDefinition};
pub use state::wizard::{Advance, SubmitOutcome, Wizard, WizardPhase};
pub use submit::coordinator::SubmissionCoordinator;
pub use submit::session::WizardSession;
pub use submit::sink::{CheckoutSubmission, MemorySink, SubmissionSink};
pub use validation::{FieldErrors, ValidationResult};
