//! View model: what a front end draws for the current screen.

use serde::{Deserialize, Serialize};

use crate::webhook::ChatRole;

/// What a button does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Control {
    /// Pick option `index` of a choice step.
    Choose { index: usize },
    /// Continue past the current step.
    Continue,
    /// Post the step's responses to its webhook.
    Submit,
    /// Send the chat field's contents.
    Send,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// One element of a step body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Heading {
        text: String,
    },
    Paragraph {
        text: String,
    },
    /// Markup supplied by the webhook, passed through untouched.
    Html {
        content: String,
    },
    Notice {
        level: NoticeLevel,
        text: String,
    },
    Button {
        label: String,
        control: Control,
        enabled: bool,
    },
    TextField {
        label: String,
        placeholder: String,
        multiline: bool,
    },
    SummaryItem {
        label: String,
        value: String,
    },
    UsageBadge {
        label: String,
        value: String,
        low: bool,
    },
    ChatLine {
        role: ChatRole,
        content: String,
    },
}

impl Element {
    pub fn heading(text: impl Into<String>) -> Self {
        Self::Heading { text: text.into() }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    pub fn button(label: impl Into<String>, control: Control) -> Self {
        Self::Button {
            label: label.into(),
            control,
            enabled: true,
        }
    }

    pub fn disabled_button(label: impl Into<String>, control: Control) -> Self {
        Self::Button {
            label: label.into(),
            control,
            enabled: false,
        }
    }
}

/// A rendered step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub step_id: String,
    /// "Step i of N".
    pub progress: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub body: Vec<Element>,
}

impl View {
    pub fn buttons(&self) -> impl Iterator<Item = (&str, Control, bool)> {
        self.body.iter().filter_map(|e| match e {
            Element::Button {
                label,
                control,
                enabled,
            } => Some((label.as_str(), *control, *enabled)),
            _ => None,
        })
    }

    /// Whether an enabled button with `control` is on screen.
    pub fn has_control(&self, control: Control) -> bool {
        self.buttons().any(|(_, c, enabled)| enabled && c == control)
    }

    pub fn has_text_field(&self) -> bool {
        self.body
            .iter()
            .any(|e| matches!(e, Element::TextField { .. }))
    }

    /// Text of every error notice, in order.
    pub fn errors(&self) -> Vec<&str> {
        self.body
            .iter()
            .filter_map(|e| match e {
                Element::Notice {
                    level: NoticeLevel::Error,
                    text,
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn summary_value(&self, label: &str) -> Option<&str> {
        self.body.iter().find_map(|e| match e {
            Element::SummaryItem { label: l, value } if l == label => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Everything a front end may be asked to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Step(View),
    /// Past the last step.
    Complete {
        message: String,
        responses: Vec<SummaryLine>,
    },
    /// Transitions stopped by an unrecoverable navigation error.
    Halted { message: String },
    /// The kit documents never loaded, so there is no session to show.
    LoadFailed { message: String },
}

/// One line of the completion summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub step_id: String,
    pub label: String,
    pub value: String,
}

impl Screen {
    pub fn load_failed(error: impl std::fmt::Display) -> Self {
        Self::LoadFailed {
            message: format!("Error loading resources: {error}"),
        }
    }

    pub fn view(&self) -> Option<&View> {
        match self {
            Self::Step(view) => Some(view),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}
