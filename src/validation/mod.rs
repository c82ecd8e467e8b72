pub mod validators;

use crate::core::FieldId;
use crate::core::clock::Clock;
use crate::core::value::FieldValues;
use crate::schema::StepDefinition;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

pub use validators::{ValidationError, Validator};

/// Inputs a rule may consult besides the field value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleContext {
    today: NaiveDate,
}

impl RuleContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self::new(clock.today())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }
}

/// One message per failing field, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    entries: IndexMap<FieldId, ValidationError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<FieldId>, message: impl Into<String>) {
        self.entries.insert(id.into(), message.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(FieldId::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(FieldErrors),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Valid => None,
            Self::Invalid(errors) => Some(errors),
        }
    }
}

/// Checks every field governed by `step`. Fields missing from `values` are
/// validated as empty strings.
pub fn validate_step(
    step: &StepDefinition,
    values: &FieldValues,
    ctx: &RuleContext,
) -> ValidationResult {
    let mut errors = FieldErrors::new();
    for field in step.fields() {
        let raw = values.text(field.id().as_str());
        if let Err(message) = validators::run_validators(field.validators(), raw, ctx) {
            errors.insert(field.id().clone(), message);
        }
    }

    if errors.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(errors)
    }
}
