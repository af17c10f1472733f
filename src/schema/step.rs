//! Step descriptors: the typed form of `steps.json`.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// One selectable option of a choice step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

/// Which automation flow a submit step starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    AiTutor,
    AiAssessment,
    AiResource,
}

impl SessionType {
    /// Response fields whose presence signals an implicit success.
    pub fn expected_fields(&self) -> &'static [&'static str] {
        match self {
            Self::AiTutor => &["questions", "summary"],
            Self::AiAssessment => &["score", "questions"],
            Self::AiResource => &["title", "sections", "htmlContent"],
        }
    }

    pub fn default_button_text(&self) -> &'static str {
        match self {
            Self::AiTutor => "Start AI Tutor Session",
            Self::AiAssessment => "Take Assessment",
            Self::AiResource => "Generate Resource",
        }
    }

    /// Message used when a reply carries none of the expected fields.
    pub fn empty_result_message(&self) -> &'static str {
        match self {
            Self::AiTutor => "No tutor results received from server",
            Self::AiAssessment => "No assessment results received from server",
            Self::AiResource => "No content received from server",
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AiTutor => "ai_tutor",
            Self::AiAssessment => "ai_assessment",
            Self::AiResource => "ai_resource",
        };
        write!(f, "{s}")
    }
}

/// Configuration shared by the webhook submit steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitConfig {
    pub session: SessionType,
    pub webhook_url: Option<String>,
    pub required_fields: Vec<String>,
    pub button_text: Option<String>,
    pub topic: Option<String>,
    pub resource_type: Option<String>,
}

/// Billing mode of a chat step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    #[default]
    Token,
    Attempt,
    Unlimited,
}

impl std::fmt::Display for UsageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Token => "token",
            Self::Attempt => "attempt",
            Self::Unlimited => "unlimited",
        };
        write!(f, "{s}")
    }
}

/// Configuration of an embedded, usage-limited chat step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub webhook_url: Option<String>,
    pub usage_type: UsageType,
    pub initial_tokens: i64,
    pub initial_attempts: i64,
    pub welcome_message: String,
    pub placeholder: Option<String>,
}

pub const DEFAULT_INITIAL_TOKENS: i64 = 50;
pub const DEFAULT_INITIAL_ATTEMPTS: i64 = 10;
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome! How can I help you today?";

/// What a step does, with only the fields that kind uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    Choice {
        options: Vec<ChoiceOption>,
        next: Option<String>,
    },
    Info,
    TextInput {
        label: Option<String>,
        placeholder: Option<String>,
    },
    LongText {
        label: Option<String>,
        placeholder: Option<String>,
    },
    Summary {
        include: Vec<String>,
    },
    Submit(SubmitConfig),
    Chat(ChatConfig),
    Unsupported {
        type_name: String,
    },
}

/// Registry key for a step kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKindTag {
    Choice,
    Info,
    TextInput,
    LongText,
    Summary,
    TutorSubmit,
    AssessmentSubmit,
    ResourceSubmit,
    Chat,
    Unsupported,
}

impl StepKind {
    pub fn tag(&self) -> StepKindTag {
        match self {
            Self::Choice { .. } => StepKindTag::Choice,
            Self::Info => StepKindTag::Info,
            Self::TextInput { .. } => StepKindTag::TextInput,
            Self::LongText { .. } => StepKindTag::LongText,
            Self::Summary { .. } => StepKindTag::Summary,
            Self::Submit(cfg) => match cfg.session {
                SessionType::AiTutor => StepKindTag::TutorSubmit,
                SessionType::AiAssessment => StepKindTag::AssessmentSubmit,
                SessionType::AiResource => StepKindTag::ResourceSubmit,
            },
            Self::Chat(_) => StepKindTag::Chat,
            Self::Unsupported { .. } => StepKindTag::Unsupported,
        }
    }

    /// The `type` string as written in the step document.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Choice { .. } => "choice",
            Self::Info => "info",
            Self::TextInput { .. } => "text_input",
            Self::LongText { .. } => "long_text",
            Self::Summary { .. } => "summary",
            Self::Submit(cfg) => match cfg.session {
                SessionType::AiTutor => "ai_tutor_submit",
                SessionType::AiAssessment => "ai_assessment_submit",
                SessionType::AiResource => "ai_resource_submit",
            },
            Self::Chat(_) => "ai_chat",
            Self::Unsupported { type_name } => type_name,
        }
    }
}

/// One page of the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawStep")]
pub struct Step {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Legacy retry policy for the fallback path.
    pub allow_retry: bool,
    pub kind: StepKind,
}

impl Step {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled Step")
    }
}

/// Flat, permissive shape of a step as it appears in JSON.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStep {
    id: String,
    #[serde(rename = "type", default)]
    step_type: String,
    title: Option<String>,
    description: Option<String>,
    options: Option<Vec<ChoiceOption>>,
    next: Option<String>,
    #[serde(default)]
    include: Vec<String>,
    webhook_url: Option<String>,
    #[serde(default)]
    required_fields: Vec<String>,
    button_text: Option<String>,
    topic: Option<String>,
    resource_type: Option<String>,
    #[serde(default)]
    allow_retry: bool,
    label: Option<String>,
    placeholder: Option<String>,
    usage_type: Option<UsageType>,
    initial_tokens: Option<i64>,
    initial_attempts: Option<i64>,
    welcome_message: Option<String>,
}

impl TryFrom<RawStep> for Step {
    type Error = SchemaError;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        let submit = |session: SessionType, raw: &RawStep| {
            StepKind::Submit(SubmitConfig {
                session,
                webhook_url: raw.webhook_url.clone().filter(|u| !u.trim().is_empty()),
                required_fields: raw.required_fields.clone(),
                button_text: raw.button_text.clone(),
                topic: raw.topic.clone(),
                resource_type: raw.resource_type.clone(),
            })
        };

        let kind = match raw.step_type.as_str() {
            "choice" => StepKind::Choice {
                options: raw.options.clone().ok_or_else(|| SchemaError::MissingField {
                    step: raw.id.clone(),
                    field: "options",
                })?,
                next: raw.next.clone(),
            },
            "info" => StepKind::Info,
            "text_input" => StepKind::TextInput {
                label: raw.label.clone(),
                placeholder: raw.placeholder.clone(),
            },
            "long_text" => StepKind::LongText {
                label: raw.label.clone(),
                placeholder: raw.placeholder.clone(),
            },
            "summary" => StepKind::Summary {
                include: raw.include.clone(),
            },
            "ai_tutor_submit" => submit(SessionType::AiTutor, &raw),
            "ai_assessment_submit" => submit(SessionType::AiAssessment, &raw),
            "ai_resource_submit" => submit(SessionType::AiResource, &raw),
            "ai_chat" => StepKind::Chat(ChatConfig {
                webhook_url: raw.webhook_url.clone().filter(|u| !u.trim().is_empty()),
                usage_type: raw.usage_type.unwrap_or_default(),
                initial_tokens: raw.initial_tokens.unwrap_or(DEFAULT_INITIAL_TOKENS),
                initial_attempts: raw.initial_attempts.unwrap_or(DEFAULT_INITIAL_ATTEMPTS),
                welcome_message: raw
                    .welcome_message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_WELCOME_MESSAGE.to_string()),
                placeholder: raw.placeholder.clone(),
            }),
            other => StepKind::Unsupported {
                type_name: other.to_string(),
            },
        };

        Ok(Step {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            allow_retry: raw.allow_retry,
            kind,
        })
    }
}
