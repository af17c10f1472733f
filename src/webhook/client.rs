//! Webhook client: one POST per user action, under a deadline.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::DEFAULT_WEBHOOK_TIMEOUT;
use crate::error::InteractionError;
use crate::loader::KitSelection;
use crate::schema::SubmitConfig;
use crate::wizard::ResponseMap;

use super::payload::WebhookPayload;
use super::response::{WebhookReply, WebhookResult, parse_webhook_response};

/// Posts JSON to automation webhooks and classifies what comes back.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    timeout: Duration,
    default_url: Option<String>,
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new(DEFAULT_WEBHOOK_TIMEOUT, None)
    }
}

impl WebhookClient {
    pub fn new(timeout: Duration, default_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
            default_url,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fallback URL for steps that don't configure their own.
    pub fn default_url(&self) -> Option<&str> {
        self.default_url.as_deref()
    }

    /// The URL a step would post to, if any.
    pub fn resolve_url<'a>(&'a self, step_url: Option<&'a str>) -> Option<&'a str> {
        step_url
            .filter(|u| !u.trim().is_empty())
            .or(self.default_url())
    }

    /// POST `payload` as JSON to `url`.
    ///
    /// The whole exchange, body included, runs under the client timeout. On
    /// expiry the request future is dropped, which aborts the connection.
    pub async fn post<P: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &P,
    ) -> Result<WebhookReply, InteractionError> {
        debug!(url = %url, timeout_ms = self.timeout.as_millis() as u64, "Posting to webhook");

        let exchange = async {
            let resp = self
                .client
                .post(url)
                .json(payload)
                .send()
                .await
                .map_err(|e| classify_transport_error(e, self.timeout, url))?;

            let status = resp.status();
            if !status.is_success() {
                return Err(InteractionError::server_status(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or(""),
                    url,
                ));
            }

            let body = resp
                .text()
                .await
                .map_err(|e| classify_transport_error(e, self.timeout, url))?;
            Ok(WebhookReply::from_body(&body))
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(InteractionError::timeout(self.timeout, url)),
        }
    }

    /// Validate, post, and classify a submit step.
    ///
    /// Configuration and required responses are checked before any I/O.
    pub async fn submit_step(
        &self,
        config: &SubmitConfig,
        selection: &KitSelection,
        responses: &ResponseMap,
    ) -> Result<WebhookResult, InteractionError> {
        let url = self
            .resolve_url(config.webhook_url.as_deref())
            .ok_or_else(|| InteractionError::config(&["webhookUrl"]))?;

        validate_required_responses(responses, &config.required_fields)?;

        let payload = WebhookPayload::new(config, selection, responses);
        info!(
            session = %config.session,
            kit = %selection.kit,
            module = %selection.module,
            responses = responses.len(),
            "Submitting responses to webhook"
        );

        let reply = self.post(url, &payload).await?;
        let result = parse_webhook_response(reply, config.session)?;
        info!(session = %config.session, "Webhook submission succeeded");
        Ok(result)
    }
}

/// Fail with `VALIDATION_ERROR` when any required response is missing or blank.
pub fn validate_required_responses(
    responses: &ResponseMap,
    required: &[String],
) -> Result<(), InteractionError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|field| {
            responses
                .get(field.as_str())
                .is_none_or(|value| value.trim().is_empty())
        })
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(InteractionError::validation(&missing))
    }
}

fn classify_transport_error(err: reqwest::Error, timeout: Duration, url: &str) -> InteractionError {
    if err.is_timeout() {
        InteractionError::timeout(timeout, url)
    } else {
        InteractionError::network(err.to_string(), url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::SessionType;

    fn submit_config(url: Option<&str>) -> SubmitConfig {
        SubmitConfig {
            session: SessionType::AiAssessment,
            webhook_url: url.map(String::from),
            required_fields: vec![],
            button_text: None,
            topic: None,
            resource_type: None,
        }
    }

    #[test]
    fn step_url_wins_over_default() {
        let client = WebhookClient::new(
            Duration::from_secs(1),
            Some("http://default".to_string()),
        );
        assert_eq!(client.resolve_url(Some("http://step")), Some("http://step"));
        assert_eq!(client.resolve_url(None), Some("http://default"));
        assert_eq!(client.resolve_url(Some(" ")), Some("http://default"));
    }

    #[test]
    fn no_url_resolves_to_none() {
        let client = WebhookClient::default();
        assert_eq!(client.resolve_url(None), None);
        assert_eq!(client.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn required_responses_must_be_present_and_non_blank() {
        let mut responses = ResponseMap::new();
        responses.record("goal", "grow");
        responses.record("blank", "   ");

        let required = vec!["goal".to_string(), "blank".to_string(), "absent".to_string()];
        let err = validate_required_responses(&responses, &required).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
        assert_eq!(err.message, "Please complete all required fields: blank, absent");

        assert!(validate_required_responses(&responses, &["goal".to_string()]).is_ok());
        assert!(validate_required_responses(&responses, &[]).is_ok());
    }

    #[tokio::test]
    async fn missing_url_is_config_error() {
        let client = WebhookClient::default();
        let selection = KitSelection::new("k", "m").unwrap();
        let err = client
            .submit_step(&submit_config(None), &selection, &ResponseMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ConfigError);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = WebhookClient::new(Duration::from_secs(5), None);
        let err = client
            .post("http://127.0.0.1:9/hook", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NetworkError);
        assert_eq!(err.details.unwrap()["url"], "http://127.0.0.1:9/hook");
    }
}
