use crate::core::value::FieldValues;
use crate::state::flow::StepStatus;
use crate::state::wizard::{Wizard, WizardPhase};
use crate::validation::FieldErrors;
use serde::Serialize;

/// Everything the presentation layer needs to draw the current frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardView {
    pub state: &'static str,
    pub current_step: usize,
    pub total_steps: usize,
    pub step_id: String,
    pub step_title: String,
    pub statuses: Vec<StepStatus>,
    pub fields: Vec<FieldView>,
    pub errors: FieldErrors,
    pub confirmation_open: bool,
    pub values: FieldValues,
    pub submit_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub id: String,
    pub label: String,
    pub value: String,
    pub error: Option<String>,
}

impl Wizard {
    pub fn view(&self) -> WizardView {
        let (step_id, step_title, fields) = match self.current_definition() {
            Ok(step) => (
                step.id().to_string(),
                step.title().to_string(),
                step.fields()
                    .iter()
                    .map(|field| {
                        let id = field.id().as_str();
                        FieldView {
                            id: id.to_string(),
                            label: field.label().to_string(),
                            value: self.values().text(id).to_string(),
                            error: self.errors().get(id).map(str::to_string),
                        }
                    })
                    .collect(),
            ),
            Err(_) => (String::new(), String::new(), Vec::new()),
        };

        let submit_error = match self.phase() {
            WizardPhase::SubmitFailed { error, .. } => Some(error.to_string()),
            _ => None,
        };

        WizardView {
            state: self.phase().tag(),
            current_step: self.current_step(),
            total_steps: self.total_steps(),
            step_id,
            step_title,
            statuses: self.step_statuses().to_vec(),
            fields,
            errors: self.errors().clone(),
            confirmation_open: self.confirmation_open(),
            values: self.snapshot(),
            submit_error,
        }
    }
}

impl WizardView {
    pub fn to_json(&self) -> serde_json::Value {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                serde_json::json!({
                    "id": field.id,
                    "label": field.label,
                    "value": field.value,
                    "error": field.error,
                })
            })
            .collect::<Vec<_>>();

        serde_json::json!({
            "state": self.state,
            "step": {
                "current": self.current_step,
                "total": self.total_steps,
                "id": self.step_id,
                "title": self.step_title,
            },
            "statuses": self.statuses,
            "fields": fields,
            "confirmation_open": self.confirmation_open,
            "values": self.values.to_json(),
            "submit_error": self.submit_error,
        })
    }
}
