//! Request bodies posted to automation webhooks.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::loader::KitSelection;
use crate::schema::{SessionType, SubmitConfig, UsageType};
use crate::wizard::ResponseMap;

/// Resource type sent when a resource step doesn't set one.
pub const DEFAULT_RESOURCE_TYPE: &str = "guide";

/// Body of a submit-step webhook call. Built fresh for every submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub kit: String,
    pub module: String,
    pub responses: ResponseMap,
    pub session_type: SessionType,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
    pub fn new(config: &SubmitConfig, selection: &KitSelection, responses: &ResponseMap) -> Self {
        let resource_type = match config.session {
            SessionType::AiResource => Some(
                config
                    .resource_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_RESOURCE_TYPE.to_string()),
            ),
            _ => None,
        };

        Self {
            kit: selection.kit.clone(),
            module: selection.module.clone(),
            responses: responses.clone(),
            session_type: config.session,
            topic: config
                .topic
                .clone()
                .unwrap_or_else(|| selection.module.clone()),
            resource_type,
            timestamp: Utc::now(),
        }
    }
}

/// Body of one chat message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload<'a> {
    pub message: &'a str,
    pub user_id: &'a str,
    pub usage_type: UsageType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(session: SessionType) -> SubmitConfig {
        SubmitConfig {
            session,
            webhook_url: Some("http://hook".to_string()),
            required_fields: vec![],
            button_text: None,
            topic: None,
            resource_type: None,
        }
    }

    fn selection() -> KitSelection {
        KitSelection::new("growth", "pricing").unwrap()
    }

    #[test]
    fn tutor_payload_shape() {
        let mut responses = ResponseMap::new();
        responses.record("goal", "grow");
        let payload = WebhookPayload::new(&config(SessionType::AiTutor), &selection(), &responses);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["kit"], "growth");
        assert_eq!(json["module"], "pricing");
        assert_eq!(json["sessionType"], "ai_tutor");
        assert_eq!(json["topic"], "pricing");
        assert_eq!(json["responses"]["goal"], "grow");
        assert!(json.get("resourceType").is_none());
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn resource_payload_defaults_resource_type() {
        let payload = WebhookPayload::new(
            &config(SessionType::AiResource),
            &selection(),
            &ResponseMap::new(),
        );
        assert_eq!(payload.resource_type.as_deref(), Some("guide"));
    }

    #[test]
    fn explicit_topic_wins() {
        let mut cfg = config(SessionType::AiAssessment);
        cfg.topic = Some("positioning".to_string());
        let payload = WebhookPayload::new(&cfg, &selection(), &ResponseMap::new());
        assert_eq!(payload.topic, "positioning");
    }

    #[test]
    fn chat_payload_shape() {
        let payload = ChatPayload {
            message: "hello",
            user_id: "kit-user-abc",
            usage_type: UsageType::Attempt,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "hello", "userId": "kit-user-abc", "usageType": "attempt"})
        );
    }
}
