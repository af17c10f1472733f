//! Structural checks over a parsed step list.

use std::collections::HashSet;

use crate::error::SchemaError;

use super::step::{Step, StepKind};

/// A problem that leaves the step list usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaWarning {
    /// A choice step's `next` names no step. Selecting it halts the session.
    DanglingNext { step: String, target: String },
    /// A summary includes an id with no step. It renders as "(no response)".
    UnknownInclude { step: String, target: String },
    /// A submit or chat step without a webhook URL of its own.
    MissingWebhookUrl { step: String },
}

impl std::fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingNext { step, target } => {
                write!(f, "step {step}: next points to unknown step {target}")
            }
            Self::UnknownInclude { step, target } => {
                write!(f, "step {step}: summary includes unknown step {target}")
            }
            Self::MissingWebhookUrl { step } => {
                write!(f, "step {step}: no webhookUrl, the configured default is used")
            }
        }
    }
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, Default)]
pub struct SchemaReport {
    pub warnings: Vec<SchemaWarning>,
}

impl SchemaReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Check a step list. Duplicate ids are fatal; everything else is a warning.
pub fn validate_steps(steps: &[Step]) -> Result<SchemaReport, SchemaError> {
    let mut ids = HashSet::new();
    for step in steps {
        if !ids.insert(step.id.as_str()) {
            return Err(SchemaError::DuplicateId(step.id.clone()));
        }
    }

    let mut report = SchemaReport::default();
    for step in steps {
        match &step.kind {
            StepKind::Choice {
                next: Some(target), ..
            } if !ids.contains(target.as_str()) => {
                report.warnings.push(SchemaWarning::DanglingNext {
                    step: step.id.clone(),
                    target: target.clone(),
                });
            }
            StepKind::Summary { include } => {
                for target in include.iter().filter(|t| !ids.contains(t.as_str())) {
                    report.warnings.push(SchemaWarning::UnknownInclude {
                        step: step.id.clone(),
                        target: target.clone(),
                    });
                }
            }
            StepKind::Submit(cfg) if cfg.webhook_url.is_none() => {
                report.warnings.push(SchemaWarning::MissingWebhookUrl {
                    step: step.id.clone(),
                });
            }
            StepKind::Chat(cfg) if cfg.webhook_url.is_none() => {
                report.warnings.push(SchemaWarning::MissingWebhookUrl {
                    step: step.id.clone(),
                });
            }
            _ => {}
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(json: serde_json::Value) -> Vec<Step> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn clean_list_has_no_warnings() {
        let list = steps(serde_json::json!([
            {"id": "a", "type": "choice", "options": [{"label": "Yes", "value": "y"}], "next": "b"},
            {"id": "b", "type": "text_input"},
            {"id": "s", "type": "summary", "include": ["a", "b"]}
        ]));
        let report = validate_steps(&list).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn duplicate_ids_are_fatal() {
        let list = steps(serde_json::json!([
            {"id": "a", "type": "info"},
            {"id": "a", "type": "info"}
        ]));
        let err = validate_steps(&list).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn dangling_references_are_warnings() {
        let list = steps(serde_json::json!([
            {"id": "a", "type": "choice", "options": [], "next": "ghost"},
            {"id": "s", "type": "summary", "include": ["a", "missing"]},
            {"id": "t", "type": "ai_tutor_submit"}
        ]));
        let report = validate_steps(&list).unwrap();
        assert_eq!(
            report.warnings,
            vec![
                SchemaWarning::DanglingNext {
                    step: "a".into(),
                    target: "ghost".into()
                },
                SchemaWarning::UnknownInclude {
                    step: "s".into(),
                    target: "missing".into()
                },
                SchemaWarning::MissingWebhookUrl { step: "t".into() },
            ]
        );
        assert!(report.warnings[0].to_string().contains("ghost"));
    }

    #[test]
    fn empty_list_is_valid() {
        assert!(validate_steps(&[]).unwrap().is_clean());
    }
}
