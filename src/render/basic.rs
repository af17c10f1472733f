//! Renderers for the local step kinds: choice, free text, summary and the
//! unsupported-type fallback.

use crate::schema::{Step, StepKind, StepKindTag};

use super::{Control, Element, Intent, RenderContext, StepRenderer, UserInput};

pub const NO_RESPONSE: &str = "(no response)";

/// One button per option; picking one records its value and moves on.
pub struct ChoiceRenderer;

impl StepRenderer for ChoiceRenderer {
    fn kind(&self) -> StepKindTag {
        StepKindTag::Choice
    }

    fn render(&self, step: &Step, _ctx: &RenderContext<'_>) -> Vec<Element> {
        let StepKind::Choice { options, .. } = &step.kind else {
            return Vec::new();
        };
        options
            .iter()
            .enumerate()
            .map(|(index, option)| Element::button(&option.label, Control::Choose { index }))
            .collect()
    }

    fn on_input(&self, step: &Step, input: UserInput) -> Vec<Intent> {
        let StepKind::Choice { options, next } = &step.kind else {
            return Vec::new();
        };
        let UserInput::Choose { index } = input else {
            return Vec::new();
        };
        let Some(option) = options.get(index) else {
            return Vec::new();
        };

        let transition = match next {
            Some(target) => Intent::JumpTo(target.clone()),
            None => Intent::Advance,
        };
        vec![
            Intent::ResponseRecorded {
                step_id: step.id.clone(),
                value: option.value.clone(),
            },
            transition,
        ]
    }
}

/// A labelled text field; non-blank input is recorded, blank input skips.
pub struct TextRenderer {
    tag: StepKindTag,
    default_label: &'static str,
    multiline: bool,
}

impl TextRenderer {
    pub fn info() -> Self {
        Self {
            tag: StepKindTag::Info,
            default_label: "Please enter your response:",
            multiline: false,
        }
    }

    pub fn text_input() -> Self {
        Self {
            tag: StepKindTag::TextInput,
            default_label: "Enter your response:",
            multiline: false,
        }
    }

    pub fn long_text() -> Self {
        Self {
            tag: StepKindTag::LongText,
            default_label: "Please provide detailed input:",
            multiline: true,
        }
    }

    fn field(&self, step: &Step) -> (String, String) {
        let (label, placeholder) = match &step.kind {
            StepKind::Info => (step.description.as_deref(), None),
            StepKind::TextInput { label, placeholder }
            | StepKind::LongText { label, placeholder } => {
                (label.as_deref(), placeholder.as_deref())
            }
            _ => (None, None),
        };
        (
            label.unwrap_or(self.default_label).to_string(),
            placeholder.unwrap_or_default().to_string(),
        )
    }
}

impl StepRenderer for TextRenderer {
    fn kind(&self) -> StepKindTag {
        self.tag
    }

    fn render(&self, step: &Step, ctx: &RenderContext<'_>) -> Vec<Element> {
        let (label, placeholder) = self.field(step);
        vec![
            Element::TextField {
                label,
                placeholder,
                multiline: self.multiline,
            },
            Element::button(ctx.continue_label(), Control::Continue),
        ]
    }

    fn on_input(&self, step: &Step, input: UserInput) -> Vec<Intent> {
        let value = match input {
            UserInput::Text { value } => value,
            UserInput::Continue => String::new(),
            _ => return Vec::new(),
        };
        let value = value.trim();
        if value.is_empty() {
            return vec![Intent::Advance];
        }
        vec![
            Intent::ResponseRecorded {
                step_id: step.id.clone(),
                value: value.to_string(),
            },
            Intent::Advance,
        ]
    }
}

/// Read-only recap of earlier responses.
pub struct SummaryRenderer;

impl StepRenderer for SummaryRenderer {
    fn kind(&self) -> StepKindTag {
        StepKindTag::Summary
    }

    fn render(&self, step: &Step, ctx: &RenderContext<'_>) -> Vec<Element> {
        let StepKind::Summary { include } = &step.kind else {
            return Vec::new();
        };
        let mut body: Vec<Element> = include
            .iter()
            .map(|id| Element::SummaryItem {
                label: ctx
                    .find_step(id)
                    .and_then(|s| s.title.clone())
                    .unwrap_or_else(|| id.clone()),
                value: ctx.responses.get(id).unwrap_or(NO_RESPONSE).to_string(),
            })
            .collect();
        body.push(Element::button(ctx.continue_label(), Control::Continue));
        body
    }

    fn on_input(&self, _step: &Step, input: UserInput) -> Vec<Intent> {
        match input {
            UserInput::Continue => vec![Intent::Advance],
            _ => Vec::new(),
        }
    }
}

/// Anything the registry has no renderer for.
pub struct UnsupportedRenderer;

impl StepRenderer for UnsupportedRenderer {
    fn kind(&self) -> StepKindTag {
        StepKindTag::Unsupported
    }

    fn render(&self, step: &Step, ctx: &RenderContext<'_>) -> Vec<Element> {
        vec![
            Element::info(format!(
                "Unsupported step type: \"{}\"",
                step.kind.type_name()
            )),
            Element::button(ctx.continue_label(), Control::Continue),
        ]
    }

    fn on_input(&self, _step: &Step, input: UserInput) -> Vec<Intent> {
        match input {
            UserInput::Continue => vec![Intent::RetryOrAdvance],
            _ => Vec::new(),
        }
    }
}
