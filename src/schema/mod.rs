pub mod checkout;
pub mod config;

use crate::core::FieldId;
use crate::error::{SchemaError, TransitionError};
use crate::validation::Validator;
use std::collections::HashMap;
use std::fmt;

pub struct FieldSchema {
    id: FieldId,
    label: String,
    validators: Vec<Validator>,
}

impl FieldSchema {
    pub fn new(id: impl Into<FieldId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            validators: Vec::new(),
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn id(&self) -> &FieldId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }
}

impl fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// One wizard step: its display position and the fields it validates.
#[derive(Debug)]
pub struct StepDefinition {
    position: usize,
    id: String,
    title: String,
    fields: Vec<FieldSchema>,
}

impl StepDefinition {
    pub fn builder(id: impl Into<String>, title: impl Into<String>) -> StepBuilder {
        StepBuilder::new(id, title)
    }

    /// 1-based; assigned by the registry.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.id.as_str() == id)
    }

    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.id.as_str())
    }

    pub fn governs(&self, id: &str) -> bool {
        self.field(id).is_some()
    }
}

pub struct StepBuilder {
    id: String,
    title: String,
    fields: Vec<FieldSchema>,
}

impl StepBuilder {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Shorthand for a field whose rules run in the given order.
    pub fn rules(
        mut self,
        id: impl Into<FieldId>,
        label: impl Into<String>,
        validators: impl IntoIterator<Item = Validator>,
    ) -> Self {
        let mut field = FieldSchema::new(id, label);
        field.validators.extend(validators);
        self.fields.push(field);
        self
    }

    pub fn build(self) -> StepDefinition {
        StepDefinition {
            position: 0,
            id: self.id,
            title: self.title,
            fields: self.fields,
        }
    }
}

/// Ordered, immutable table of step definitions keyed by position.
#[derive(Debug)]
pub struct SchemaRegistry {
    steps: Vec<StepDefinition>,
}

impl SchemaRegistry {
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, SchemaError> {
        if steps.is_empty() {
            return Err(SchemaError::NoSteps);
        }

        let mut owners: HashMap<&str, &str> = HashMap::new();
        for step in &steps {
            if step.fields.is_empty() {
                return Err(SchemaError::EmptyStep {
                    step: step.id.clone(),
                });
            }
            for field in &step.fields {
                if let Some(first) = owners.insert(field.id.as_str(), step.id.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        field: field.id.to_string(),
                        first: first.to_string(),
                        second: step.id.clone(),
                    });
                }
            }
        }

        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(index, mut step)| {
                step.position = index + 1;
                step
            })
            .collect();

        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, position: usize) -> Result<&StepDefinition, TransitionError> {
        position
            .checked_sub(1)
            .and_then(|index| self.steps.get(index))
            .ok_or(TransitionError::UnknownStep(position))
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step_for_field(&self, id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| step.governs(id))
    }

    /// Every governed field id, in step then declaration order.
    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().flat_map(StepDefinition::field_ids)
    }
}
