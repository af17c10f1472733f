//! Classification and typed parsing of webhook replies.

use std::path::{Component, Path};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::InteractionError;
use crate::schema::SessionType;

/// Message carried by the implicit success of a reply that isn't JSON.
pub const NO_JSON_MESSAGE: &str = "no JSON response";

/// Filename used when a resource reply doesn't name one.
pub const DEFAULT_RESOURCE_FILENAME: &str = "generated-resource.html";

/// Raw body of a successful (2xx) webhook exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookReply {
    Json(Value),
    /// The server accepted the call but answered with something else,
    /// e.g. a plain `Accepted`.
    NotJson(String),
}

impl WebhookReply {
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::NotJson(body.to_string()),
        }
    }

    /// The reply as JSON; non-JSON bodies become the implicit success sentinel.
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::NotJson(_) => serde_json::json!({ "success": true, "message": NO_JSON_MESSAGE }),
        }
    }
}

/// Workflows send `null` for text they left out.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorQuestion {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub question: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub feedback: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TutorResult {
    #[serde(default)]
    pub questions: Option<Vec<TutorQuestion>>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentQuestion {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub question: String,
    #[serde(default)]
    pub user_answer: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub feedback: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    /// Number or string, depending on the workflow.
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub questions: Option<Vec<AssessmentQuestion>>,
    #[serde(default)]
    pub overall_feedback: Option<String>,
    #[serde(default)]
    pub recommendations: Option<String>,
}

impl AssessmentResult {
    pub fn score_text(&self) -> Option<String> {
        match self.score.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResourceSection {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub sections: Option<Vec<ResourceSection>>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl ResourceResult {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Generated Resource")
    }

    /// The suggested name as a bare file name. Absolute paths and names that
    /// climb out of the working directory fall back to the default.
    pub fn filename(&self) -> &str {
        self.filename
            .as_deref()
            .and_then(|f| bare_file_name(f.trim()))
            .unwrap_or(DEFAULT_RESOURCE_FILENAME)
    }

    /// Body markup: the HTML content, else the sections, else nothing.
    pub fn body_html(&self) -> String {
        if let Some(html) = &self.html_content {
            return html.clone();
        }
        self.sections
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|s| {
                format!(
                    "<div class=\"section\">\n<h2>{}</h2>\n<div class=\"section-content\">{}</div>\n</div>",
                    escape_html(&s.title),
                    s.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A standalone, printable HTML document for saving the resource.
    pub fn to_html_document(&self) -> String {
        let title = escape_html(self.display_title());
        let generated = chrono::Utc::now().format("%Y-%m-%d");
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; line-height: 1.6; }}
.section {{ margin-bottom: 30px; page-break-inside: avoid; }}
.section h2 {{ color: #333; border-bottom: 2px solid #eee; padding-bottom: 10px; }}
.section-content {{ margin-top: 15px; }}
@media print {{ body {{ margin: 0; }} }}
</style>
</head>
<body>
<h1>{title}</h1>
<p><em>Generated on {generated}</em></p>
{body}
</body>
</html>
"#,
            body = self.body_html()
        )
    }
}

fn bare_file_name(name: &str) -> Option<&str> {
    let path = Path::new(name);
    let escapes = path.components().any(|c| {
        matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
    });
    if escapes {
        return None;
    }
    path.file_name()?.to_str()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Typed content of a successful reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultContent {
    Tutor(TutorResult),
    Assessment(AssessmentResult),
    Resource(ResourceResult),
    /// Success without domain content (`success: true` or a non-JSON body).
    Acknowledged { message: String },
}

/// A successful webhook interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResult {
    pub session: SessionType,
    pub content: ResultContent,
    /// The reply as received, for diagnostics.
    pub raw: Value,
}

fn is_present(body: &Value, field: &str) -> bool {
    body.get(field).is_some_and(|v| !v.is_null())
}

fn reported_error(body: &Value) -> Option<&str> {
    body.get("error")
        .and_then(|e| e.as_str())
        .filter(|e| !e.trim().is_empty())
}

/// Classify a 2xx reply for `session`.
///
/// `success: false` and a bare `error` field are server-reported failures. A
/// reply without `success` must carry at least one of the session's expected
/// fields; this is a completeness heuristic, not schema validation.
pub fn parse_webhook_response(
    reply: WebhookReply,
    session: SessionType,
) -> Result<WebhookResult, InteractionError> {
    let body = reply.into_value();
    if !body.is_object() {
        return Err(InteractionError::response("Invalid response format from server"));
    }

    let success = body.get("success").and_then(|s| s.as_bool());

    if success == Some(false) {
        return Err(InteractionError::server_reported(
            reported_error(&body).or_else(|| body.get("message").and_then(|m| m.as_str())),
            body.get("details").cloned(),
        ));
    }

    if success.is_none()
        && let Some(message) = reported_error(&body)
    {
        return Err(InteractionError::server_reported(
            Some(message),
            body.get("details").cloned(),
        ));
    }

    let has_content = session
        .expected_fields()
        .iter()
        .any(|field| is_present(&body, field));

    if !has_content {
        if success.is_none() {
            return Err(InteractionError::response(session.empty_result_message())
                .with_details(serde_json::json!({ "missingFields": session.expected_fields() })));
        }
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Request accepted")
            .to_string();
        return Ok(WebhookResult {
            session,
            content: ResultContent::Acknowledged { message },
            raw: body,
        });
    }

    let invalid = |e: serde_json::Error| {
        InteractionError::response("Invalid response format from server")
            .with_details(serde_json::json!({ "parseError": e.to_string() }))
    };

    let content = match session {
        SessionType::AiTutor => {
            ResultContent::Tutor(serde_json::from_value(body.clone()).map_err(invalid)?)
        }
        SessionType::AiAssessment => {
            ResultContent::Assessment(serde_json::from_value(body.clone()).map_err(invalid)?)
        }
        SessionType::AiResource => {
            ResultContent::Resource(serde_json::from_value(body.clone()).map_err(invalid)?)
        }
    };

    Ok(WebhookResult {
        session,
        content,
        raw: body,
    })
}
