//! Wizard engine: owns one session and applies renderer intents to it.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::loader::{DocumentSource, KitDocuments, KitSelection, load_documents};
use crate::render::{
    Control, Intent, RenderContext, RendererRegistry, Screen, SummaryLine, UserInput, View,
};
use crate::schema::{Branding, Step, StepKind, validate_steps};
use crate::webhook::{ChatSession, SendOutcome, WebhookClient};

use super::responses::ResponseMap;
use super::state::{Position, SubmissionState, WizardState};

pub const COMPLETION_MESSAGE: &str = "All done!";

/// One wizard session over a loaded step list.
///
/// Rendering is synchronous; only [`WizardEngine::dispatch`] suspends, at the
/// webhook boundary. Since it takes `&mut self`, a submission in flight
/// excludes any other input on the same session.
pub struct WizardEngine {
    steps: Vec<Step>,
    branding: Branding,
    selection: KitSelection,
    client: WebhookClient,
    registry: RendererRegistry,
    state: WizardState,
    responses: ResponseMap,
    submissions: HashMap<String, SubmissionState>,
    chats: HashMap<String, ChatSession>,
    halted: Option<String>,
}

impl WizardEngine {
    pub fn new(
        documents: KitDocuments,
        selection: KitSelection,
        client: WebhookClient,
    ) -> Result<Self, SchemaError> {
        Self::with_registry(documents, selection, client, RendererRegistry::with_builtins())
    }

    /// Load both documents from `source` and start a session over them.
    pub async fn load(
        source: &dyn DocumentSource,
        selection: KitSelection,
        client: WebhookClient,
    ) -> crate::error::Result<Self> {
        let documents = load_documents(source, &selection).await?;
        Ok(Self::new(documents, selection, client)?)
    }

    pub fn with_registry(
        documents: KitDocuments,
        selection: KitSelection,
        client: WebhookClient,
        registry: RendererRegistry,
    ) -> Result<Self, SchemaError> {
        let KitDocuments { branding, steps } = documents;

        let report = validate_steps(&steps)?;
        for warning in &report.warnings {
            tracing::warn!(kit = %selection.kit, module = %selection.module, "{warning}");
        }

        let chats = steps
            .iter()
            .filter_map(|step| match &step.kind {
                StepKind::Chat(config) => Some((step.id.clone(), ChatSession::new(config.clone()))),
                _ => None,
            })
            .collect();

        tracing::info!(
            kit = %selection.kit,
            module = %selection.module,
            steps = steps.len(),
            "Wizard session started"
        );

        Ok(Self {
            state: WizardState::new(steps.len()),
            steps,
            branding,
            selection,
            client,
            registry,
            responses: ResponseMap::new(),
            submissions: HashMap::new(),
            chats,
            halted: None,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn selection(&self) -> &KitSelection {
        &self.selection
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    pub fn responses(&self) -> &ResponseMap {
        &self.responses
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.state.position.index().and_then(|i| self.steps.get(i))
    }

    pub fn submission(&self, step_id: &str) -> Option<&SubmissionState> {
        self.submissions.get(step_id)
    }

    pub fn chat(&self, step_id: &str) -> Option<&ChatSession> {
        self.chats.get(step_id)
    }

    /// The navigation error that stopped the session, if any.
    pub fn halt_message(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    /// Whether further input can change anything.
    pub fn is_finished(&self) -> bool {
        self.halted.is_some() || self.state.position.is_terminal()
    }

    pub fn render(&self) -> Screen {
        if let Some(message) = &self.halted {
            return Screen::Halted {
                message: message.clone(),
            };
        }
        match self.current_step() {
            Some(step) => Screen::Step(self.render_step(step)),
            None => Screen::Complete {
                message: COMPLETION_MESSAGE.to_string(),
                responses: self.summary_lines(),
            },
        }
    }

    fn render_step(&self, step: &Step) -> View {
        let ctx = RenderContext {
            steps: &self.steps,
            responses: &self.responses,
            branding: &self.branding,
            submission: self.submissions.get(&step.id),
            chat: self.chats.get(&step.id),
            default_webhook_url: self.client.default_url(),
        };
        let body = self.registry.get(step.kind.tag()).render(step, &ctx);
        View {
            step_id: step.id.clone(),
            progress: format!(
                "Step {} of {}",
                self.state.current_index() + 1,
                self.state.step_count()
            ),
            title: step.display_title().to_string(),
            description: step.description.clone(),
            body,
        }
    }

    fn summary_lines(&self) -> Vec<SummaryLine> {
        self.responses
            .iter()
            .map(|(id, value)| SummaryLine {
                step_id: id.to_string(),
                label: self
                    .steps
                    .iter()
                    .find(|s| s.id == id)
                    .and_then(|s| s.title.clone())
                    .unwrap_or_else(|| id.to_string()),
                value: value.to_string(),
            })
            .collect()
    }

    /// Apply one user action to the current step and re-render.
    ///
    /// Input on a finished session, or for a control the current screen does
    /// not offer, is ignored.
    pub async fn dispatch(&mut self, input: UserInput) -> Screen {
        if self.is_finished() {
            tracing::debug!(?input, "Ignoring input on finished session");
            return self.render();
        }
        let Some(view) = self.render().view().cloned() else {
            return self.render();
        };
        if !accepts(&view, &input) {
            tracing::debug!(step = %view.step_id, ?input, "Ignoring input not offered by step");
            return self.render();
        }

        let intents = match self.current_step() {
            Some(step) => self.registry.get(step.kind.tag()).on_input(step, input),
            None => Vec::new(),
        };

        for intent in intents {
            self.apply(intent).await;
            if self.halted.is_some() {
                break;
            }
        }
        self.render()
    }

    async fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::ResponseRecorded { step_id, value } => {
                tracing::debug!(step = %step_id, "Response recorded");
                self.responses.record(step_id, value);
            }
            Intent::Advance => {
                self.next_step();
            }
            Intent::JumpTo(target) => self.jump_to(&target),
            Intent::RetryOrAdvance => {
                let allow_retry = self.current_step().is_some_and(|s| s.allow_retry);
                if self.state.retry_or_advance(allow_retry) {
                    tracing::info!(retry = self.state.retry_count, "Repeating step");
                } else {
                    tracing::info!(position = %self.state.position, "Step advanced");
                }
            }
            Intent::Submit => self.submit_current().await,
            Intent::SendChat(message) => self.send_chat(&message).await,
        }
    }

    /// Move to the next step. Returns the new position; no-op when terminal
    /// or halted.
    pub fn next_step(&mut self) -> Position {
        if self.halted.is_some() {
            return self.state.position;
        }
        let position = self.state.advance();
        tracing::info!(%position, "Step advanced");
        position
    }

    /// Jump to the step with `id` and re-render.
    ///
    /// An unknown id halts the session with an inline error and leaves the
    /// position untouched.
    pub fn go_to_step(&mut self, id: &str) -> Screen {
        if !self.is_finished() {
            self.jump_to(id);
        }
        self.render()
    }

    fn jump_to(&mut self, id: &str) {
        let Some(index) = self.steps.iter().position(|s| s.id == id) else {
            tracing::warn!(target_step = %id, "Unknown next step, halting session");
            self.halted = Some(format!("Error: Unknown next step \"{id}\"."));
            return;
        };
        match self.state.jump(index) {
            Ok(position) => tracing::info!(%position, step = %id, "Jumped to step"),
            Err(e) => tracing::warn!(step = %id, "Jump rejected: {e}"),
        }
    }

    async fn submit_current(&mut self) {
        let Some(step) = self.current_step() else {
            return;
        };
        let StepKind::Submit(config) = &step.kind else {
            return;
        };
        if self
            .submissions
            .get(&step.id)
            .is_some_and(SubmissionState::is_succeeded)
        {
            return;
        }

        let step_id = step.id.clone();
        let outcome = self
            .client
            .submit_step(config, &self.selection, &self.responses)
            .await;

        let state = match outcome {
            Ok(result) => SubmissionState::Succeeded(result),
            Err(err) => {
                err.log(&serde_json::json!({
                    "stepId": step_id,
                    "kit": self.selection.kit,
                    "module": self.selection.module,
                }));
                SubmissionState::Failed(err)
            }
        };
        self.submissions.insert(step_id, state);
    }

    async fn send_chat(&mut self, message: &str) {
        let Some(step_id) = self.current_step().map(|s| s.id.clone()) else {
            return;
        };
        let Some(session) = self.chats.get_mut(&step_id) else {
            return;
        };
        let outcome = session.send(&self.client, message).await;
        if outcome == SendOutcome::Replied {
            tracing::debug!(step = %step_id, "Chat reply received");
        }
    }
}

/// Whether `view` offers the control `input` acts on.
fn accepts(view: &View, input: &UserInput) -> bool {
    match input {
        UserInput::Choose { index } => view.has_control(Control::Choose { index: *index }),
        UserInput::Text { .. } => view.has_text_field() && view.has_control(Control::Continue),
        UserInput::Continue => view.has_control(Control::Continue),
        UserInput::Submit => view.has_control(Control::Submit),
        UserInput::Send { .. } => view.has_text_field() && view.has_control(Control::Send),
    }
}
