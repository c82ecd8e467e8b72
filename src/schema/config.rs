use crate::error::SchemaError;
use crate::schema::{FieldSchema, SchemaRegistry, StepDefinition};
use crate::validation::Validator;
use crate::validation::validators::{
    compile_pattern, digits, email, expiry_date, max_length, min_length, required,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WizardConfig {
    pub steps: Vec<StepConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    pub id: String,
    pub title: String,
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleConfig {
    Required {
        message: String,
    },
    Email {
        message: String,
    },
    Pattern {
        pattern: String,
        message: String,
    },
    Digits {
        lengths: Vec<usize>,
        message: String,
    },
    MinLength {
        min: usize,
        message: String,
    },
    MaxLength {
        max: usize,
        message: String,
    },
    ExpiryDate {
        format_message: String,
        expired_message: String,
    },
}

impl WizardConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, SchemaError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source)
    }
}

impl RuleConfig {
    fn compile(self, field: &str) -> Result<Validator, SchemaError> {
        let validator = match self {
            Self::Required { message } => required(message),
            Self::Email { message } => email(message),
            Self::Pattern { pattern, message } => compile_pattern(field, &pattern, message)?,
            Self::Digits { lengths, message } => {
                if lengths.is_empty() || lengths.contains(&0) {
                    return Err(SchemaError::InvalidRule {
                        field: field.to_string(),
                        rule: "digits",
                        reason: "lengths must be non-empty and positive".to_string(),
                    });
                }
                digits(&lengths, message)
            }
            Self::MinLength { min, message } => min_length(min, message),
            Self::MaxLength { max, message } => max_length(max, message),
            Self::ExpiryDate {
                format_message,
                expired_message,
            } => expiry_date(format_message, expired_message),
        };
        Ok(validator)
    }
}

impl StepConfig {
    fn compile(self) -> Result<StepDefinition, SchemaError> {
        let mut builder = StepDefinition::builder(self.id, self.title);
        for field in self.fields {
            let label = field.label.unwrap_or_else(|| field.id.clone());
            let mut schema = FieldSchema::new(field.id.as_str(), label);
            for rule in field.rules {
                schema = schema.with_validator(rule.compile(&field.id)?);
            }
            builder = builder.field(schema);
        }
        Ok(builder.build())
    }
}

impl SchemaRegistry {
    pub fn from_config(config: WizardConfig) -> Result<Self, SchemaError> {
        let steps = config
            .steps
            .into_iter()
            .map(StepConfig::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(steps)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, SchemaError> {
        Self::from_config(WizardConfig::from_yaml_str(source)?)
    }
}
