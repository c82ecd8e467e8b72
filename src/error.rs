use thiserror::Error;

/// Problems found while building a schema registry. These are fatal at startup.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("wizard must declare at least one step")]
    NoSteps,

    #[error("step `{step}` does not govern any field")]
    EmptyStep { step: String },

    #[error("field `{field}` is governed by both `{first}` and `{second}`")]
    DuplicateField {
        field: String,
        first: String,
        second: String,
    },

    #[error("invalid pattern for field `{field}`: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule `{rule}` on field `{field}` is misconfigured: {reason}")]
    InvalidRule {
        field: String,
        rule: &'static str,
        reason: String,
    },

    #[error("failed to parse wizard config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("failed to read wizard config: {0}")]
    Io(#[from] std::io::Error),
}

/// A transition was requested from a phase that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("step {0} does not exist")]
    UnknownStep(usize),

    #[error("review is already open")]
    AlreadyAtReview,

    #[error("already at the first step")]
    NoPreviousStep,

    #[error("review is not open")]
    NotInReview,

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("wizard has already been submitted")]
    AlreadySubmitted,

    #[error("step {0} no longer validates")]
    StepInvalid(usize),

    #[error("submission attempt {0} is not the one in flight")]
    StaleSubmission(u64),
}

/// Delivery failures reported by a submission sink. Always recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("sink unavailable: {0}")]
    Unavailable(String),

    #[error("submission timed out")]
    Timeout,

    #[error("submission is missing field `{0}`")]
    MissingField(String),

    #[error("submission worker stopped before reporting")]
    WorkerLost,
}
