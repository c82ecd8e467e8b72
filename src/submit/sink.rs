use crate::core::value::FieldValues;
use crate::error::SubmissionError;
use crate::schema::checkout::{
    ADDRESS, CARD_NUMBER, CITY, CVV, EMAIL, EXPIRY_DATE, FIRST_NAME, LAST_NAME, POSTAL_CODE,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Receives the accumulated values once the user confirms.
pub trait SubmissionSink: Send + Sync {
    fn deliver(&self, values: &FieldValues) -> Result<(), SubmissionError>;
}

impl<F> SubmissionSink for F
where
    F: Fn(&FieldValues) -> Result<(), SubmissionError> + Send + Sync,
{
    fn deliver(&self, values: &FieldValues) -> Result<(), SubmissionError> {
        self(values)
    }
}

/// Keeps every delivered snapshot. Failures can be queued ahead of time.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<FieldValues>>,
    failures: Mutex<VecDeque<SubmissionError>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next delivery fails with `error` instead of being recorded.
    pub fn fail_next(&self, error: SubmissionError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    pub fn delivered(&self) -> Vec<FieldValues> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl SubmissionSink for MemorySink {
    fn deliver(&self, values: &FieldValues) -> Result<(), SubmissionError> {
        let queued = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = queued {
            return Err(error);
        }
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(values.clone());
        Ok(())
    }
}

/// The checkout payload as the downstream service expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
}

impl TryFrom<&FieldValues> for CheckoutSubmission {
    type Error = SubmissionError;

    fn try_from(values: &FieldValues) -> Result<Self, Self::Error> {
        let take = |id: &str| {
            values
                .get(id)
                .map(str::to_string)
                .ok_or_else(|| SubmissionError::MissingField(id.to_string()))
        };
        Ok(Self {
            first_name: take(FIRST_NAME)?,
            last_name: take(LAST_NAME)?,
            email: take(EMAIL)?,
            address: take(ADDRESS)?,
            city: take(CITY)?,
            postal_code: take(POSTAL_CODE)?,
            card_number: take(CARD_NUMBER)?,
            expiry_date: take(EXPIRY_DATE)?,
            cvv: take(CVV)?,
        })
    }
}
