//! REST endpoints that expose one wizard session to a browser front end.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::render::{Screen, UserInput};
use crate::schema::Branding;
use crate::wizard::WizardEngine;

/// Shared state for wizard routes.
#[derive(Clone)]
pub enum WizardRouteState {
    Ready(Arc<Mutex<WizardEngine>>),
    /// The documents never loaded; every wizard route answers with this
    /// full-screen error.
    LoadFailed(Arc<Screen>),
}

impl WizardRouteState {
    pub fn new(engine: WizardEngine) -> Self {
        Self::Ready(Arc::new(Mutex::new(engine)))
    }

    pub fn load_failed(error: impl std::fmt::Display) -> Self {
        Self::LoadFailed(Arc::new(Screen::load_failed(error)))
    }
}

fn unavailable(screen: &Screen) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(screen)).into_response()
}

async fn health(State(state): State<WizardRouteState>) -> impl IntoResponse {
    let session = match state {
        WizardRouteState::Ready(_) => "ready",
        WizardRouteState::LoadFailed(_) => "load_failed",
    };
    Json(serde_json::json!({
        "status": "ok",
        "service": "easy-kit",
        "session": session
    }))
}

/// GET /api/wizard
///
/// The current screen.
async fn get_screen(State(state): State<WizardRouteState>) -> Response {
    match state {
        WizardRouteState::Ready(engine) => Json(engine.lock().await.render()).into_response(),
        WizardRouteState::LoadFailed(screen) => unavailable(&screen),
    }
}

/// POST /api/wizard/input
///
/// Apply one user action and return the resulting screen. The session lock is
/// held across any webhook call, so concurrent input waits for it.
async fn post_input(
    State(state): State<WizardRouteState>,
    Json(input): Json<UserInput>,
) -> Response {
    match state {
        WizardRouteState::Ready(engine) => {
            let mut engine = engine.lock().await;
            Json(engine.dispatch(input).await).into_response()
        }
        WizardRouteState::LoadFailed(screen) => unavailable(&screen),
    }
}

/// GET /api/wizard/responses
async fn get_responses(State(state): State<WizardRouteState>) -> Response {
    match state {
        WizardRouteState::Ready(engine) => {
            let engine = engine.lock().await;
            Json(serde_json::to_value(engine.responses()).unwrap_or_default()).into_response()
        }
        WizardRouteState::LoadFailed(_) => Json(serde_json::json!({})).into_response(),
    }
}

fn branding_json(branding: &Branding) -> serde_json::Value {
    let variables: serde_json::Map<String, serde_json::Value> = branding
        .theme_variables()
        .into_iter()
        .map(|(name, value)| (name.to_string(), serde_json::Value::from(value)))
        .collect();
    serde_json::json!({
        "variables": variables,
        "cta": branding.cta_label(),
    })
}

/// GET /api/branding
///
/// Theme variables to set on the document root plus the continue label.
/// Defaults when the documents never loaded.
async fn get_branding(State(state): State<WizardRouteState>) -> impl IntoResponse {
    match state {
        WizardRouteState::Ready(engine) => Json(branding_json(engine.lock().await.branding())),
        WizardRouteState::LoadFailed(_) => Json(branding_json(&Branding::default())),
    }
}

/// Build the wizard REST routes.
pub fn wizard_routes(state: WizardRouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/wizard", get(get_screen))
        .route("/api/wizard/input", post(post_input))
        .route("/api/wizard/responses", get(get_responses))
        .route("/api/branding", get(get_branding))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::loader::{KitDocuments, KitSelection};
    use crate::webhook::WebhookClient;

    fn app() -> Router {
        let documents = KitDocuments {
            branding: Branding {
                primary1: Some("#1D3B60".to_string()),
                primary_cta: Some("Next".to_string()),
                ..Default::default()
            },
            steps: serde_json::from_value(serde_json::json!([
                {"id": "a", "type": "choice", "title": "Ready?",
                 "options": [{"label": "Yes", "value": "y"}]},
                {"id": "s", "type": "summary", "include": ["a"]}
            ]))
            .unwrap(),
        };
        let engine = WizardEngine::new(
            documents,
            KitSelection::new("growth", "pricing").unwrap(),
            WebhookClient::default(),
        )
        .unwrap();
        wizard_routes(WizardRouteState::new(engine))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn current_screen_is_first_step() {
        let response = app()
            .oneshot(Request::builder().uri("/api/wizard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["screen"], "step");
        assert_eq!(json["step_id"], "a");
        assert_eq!(json["progress"], "Step 1 of 2");
        assert_eq!(json["body"][0]["label"], "Yes");
    }

    #[tokio::test]
    async fn input_advances_and_records() {
        let app = app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/wizard/input")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"action": "choose", "index": 0}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["step_id"], "s");
        assert_eq!(json["body"][0]["value"], "y");
        assert_eq!(json["body"][1]["label"], "Next");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/wizard/responses")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(response).await, serde_json::json!({"a": "y"}));
    }

    #[tokio::test]
    async fn malformed_input_is_rejected() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/wizard/input")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"action": "teleport"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn branding_exposes_theme_variables() {
        let response = app()
            .oneshot(Request::builder().uri("/api/branding").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["variables"]["--primary1"], "#1D3B60");
        assert_eq!(json["cta"], "Next");
        assert!(json["variables"].get("--accent-color").is_none());
    }

    #[tokio::test]
    async fn load_failure_is_served_as_full_screen_error() {
        let app = wizard_routes(WizardRouteState::load_failed("Could not fetch steps: HTTP 404"));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/wizard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["screen"], "load_failed");
        assert_eq!(json["message"], "Error loading resources: Could not fetch steps: HTTP 404");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/wizard/input")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"action": "continue"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["session"], "load_failed");
    }
}
