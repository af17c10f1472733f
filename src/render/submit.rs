//! Renderers for the webhook submit steps and their result displays.

use crate::schema::{SessionType, Step, StepKind, StepKindTag};
use crate::webhook::response::{AssessmentResult, ResourceResult, TutorResult};
use crate::webhook::{ResultContent, WebhookResult};
use crate::wizard::SubmissionState;

use super::{Control, Element, Intent, RenderContext, StepRenderer, UserInput};

pub const MISSING_URL_NOTICE: &str = "Configuration error: Missing webhook URL";
pub const EMPTY_RESOURCE_NOTICE: &str =
    "Resource generated successfully, but no content to display.";

/// Submit button, inline error or typed result for one session type.
pub struct SubmitRenderer {
    session: SessionType,
}

impl SubmitRenderer {
    pub fn tutor() -> Self {
        Self {
            session: SessionType::AiTutor,
        }
    }

    pub fn assessment() -> Self {
        Self {
            session: SessionType::AiAssessment,
        }
    }

    pub fn resource() -> Self {
        Self {
            session: SessionType::AiResource,
        }
    }
}

impl StepRenderer for SubmitRenderer {
    fn kind(&self) -> StepKindTag {
        match self.session {
            SessionType::AiTutor => StepKindTag::TutorSubmit,
            SessionType::AiAssessment => StepKindTag::AssessmentSubmit,
            SessionType::AiResource => StepKindTag::ResourceSubmit,
        }
    }

    fn render(&self, step: &Step, ctx: &RenderContext<'_>) -> Vec<Element> {
        let StepKind::Submit(config) = &step.kind else {
            return Vec::new();
        };

        let url = config.webhook_url.as_deref().or(ctx.default_webhook_url);
        if url.is_none() {
            return vec![Element::error(MISSING_URL_NOTICE)];
        }

        let label = config
            .button_text
            .as_deref()
            .unwrap_or(self.session.default_button_text());

        match ctx.submission {
            None | Some(SubmissionState::Idle) => vec![Element::button(label, Control::Submit)],
            Some(SubmissionState::Failed(err)) => vec![
                Element::error(err.display_text()),
                Element::button(label, Control::Submit),
            ],
            Some(SubmissionState::Succeeded(result)) => {
                let mut body = vec![Element::disabled_button(label, Control::Submit)];
                body.extend(result_elements(result));
                body.push(Element::button(ctx.continue_label(), Control::Continue));
                body
            }
        }
    }

    fn on_input(&self, _step: &Step, input: UserInput) -> Vec<Intent> {
        match input {
            UserInput::Submit => vec![Intent::Submit],
            UserInput::Continue => vec![Intent::Advance],
            _ => Vec::new(),
        }
    }
}

/// Display elements for a successful webhook result.
pub fn result_elements(result: &WebhookResult) -> Vec<Element> {
    match &result.content {
        ResultContent::Tutor(tutor) => tutor_elements(tutor),
        ResultContent::Assessment(assessment) => assessment_elements(assessment),
        ResultContent::Resource(resource) => resource_elements(resource),
        ResultContent::Acknowledged { message } => vec![Element::info(message)],
    }
}

fn tutor_elements(tutor: &TutorResult) -> Vec<Element> {
    let mut body = vec![Element::heading("AI Tutor Session Results")];
    for (i, q) in tutor.questions.iter().flatten().enumerate() {
        body.push(Element::paragraph(format!("Q{}: {}", i + 1, q.question)));
        if !q.feedback.is_empty() {
            body.push(Element::paragraph(format!("Feedback: {}", q.feedback)));
        }
    }
    if let Some(summary) = &tutor.summary {
        body.push(Element::heading("Key Insights"));
        body.push(Element::paragraph(summary));
    }
    body
}

fn assessment_elements(assessment: &AssessmentResult) -> Vec<Element> {
    let mut body = vec![Element::heading("Assessment Results")];
    if let Some(score) = assessment.score_text() {
        body.push(Element::SummaryItem {
            label: "Your Score".to_string(),
            value: format!("{score}%"),
        });
    }
    for (i, q) in assessment.questions.iter().flatten().enumerate() {
        body.push(Element::paragraph(format!("Q{}: {}", i + 1, q.question)));
        if let Some(answer) = &q.user_answer {
            body.push(Element::paragraph(format!("Your answer: {answer}")));
        }
        if !q.feedback.is_empty() {
            body.push(Element::paragraph(format!("Feedback: {}", q.feedback)));
        }
    }
    if let Some(feedback) = &assessment.overall_feedback {
        body.push(Element::heading("Overall Feedback"));
        body.push(Element::paragraph(feedback));
    }
    if let Some(recommendations) = &assessment.recommendations {
        body.push(Element::heading("Recommendations"));
        body.push(Element::paragraph(recommendations));
    }
    body
}

fn resource_elements(resource: &ResourceResult) -> Vec<Element> {
    let title = resource
        .title
        .as_deref()
        .unwrap_or("Your Generated Resource");
    let mut body = vec![Element::heading(title)];

    let sections = resource.sections.as_deref().unwrap_or_default();
    if let Some(html) = &resource.html_content {
        body.push(Element::Html {
            content: html.clone(),
        });
    } else if !sections.is_empty() {
        for section in sections {
            body.push(Element::heading(&section.title));
            body.push(Element::Html {
                content: section.content.clone(),
            });
        }
    } else {
        body.push(Element::info(EMPTY_RESOURCE_NOTICE));
    }
    body
}
