//! Step renderers.
//!
//! A renderer is a pure function of a step and a read-only [`RenderContext`].
//! It draws the step body as [`Element`]s and turns user input into
//! [`Intent`]s; the engine owns all state and is the only thing that applies
//! them. Renderers are looked up by [`StepKindTag`] in a [`RendererRegistry`].

pub mod basic;
pub mod chat;
pub mod submit;
pub mod view;

pub use view::{Control, Element, NoticeLevel, Screen, SummaryLine, View};

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::schema::{Branding, Step, StepKindTag};
use crate::webhook::ChatSession;
use crate::wizard::{ResponseMap, SubmissionState};

/// A user action on the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserInput {
    Choose { index: usize },
    /// Continue with the contents of the step's text field.
    Text { value: String },
    Continue,
    Submit,
    Send { message: String },
}

/// What a renderer asks the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ResponseRecorded { step_id: String, value: String },
    Advance,
    JumpTo(String),
    /// Legacy fallback path: repeat the step while retries remain.
    RetryOrAdvance,
    Submit,
    SendChat(String),
}

/// Read-only view of engine state handed to renderers.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub steps: &'a [Step],
    pub responses: &'a ResponseMap,
    pub branding: &'a Branding,
    pub submission: Option<&'a SubmissionState>,
    pub chat: Option<&'a ChatSession>,
    pub default_webhook_url: Option<&'a str>,
}

impl<'a> RenderContext<'a> {
    pub fn find_step(&self, id: &str) -> Option<&'a Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn continue_label(&self) -> &'a str {
        self.branding.cta_label()
    }
}

/// Draws one kind of step and interprets input on it.
pub trait StepRenderer: Send + Sync {
    fn kind(&self) -> StepKindTag;

    fn render(&self, step: &Step, ctx: &RenderContext<'_>) -> Vec<Element>;

    fn on_input(&self, step: &Step, input: UserInput) -> Vec<Intent>;
}

/// Maps step kinds to renderers.
pub struct RendererRegistry {
    renderers: HashMap<StepKindTag, Arc<dyn StepRenderer>>,
    fallback: Arc<dyn StepRenderer>,
}

impl RendererRegistry {
    /// An empty registry; every kind renders through the fallback.
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
            fallback: Arc::new(basic::UnsupportedRenderer),
        }
    }

    /// A registry with a renderer for every built-in step kind.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(basic::ChoiceRenderer));
        registry.register(Arc::new(basic::TextRenderer::info()));
        registry.register(Arc::new(basic::TextRenderer::text_input()));
        registry.register(Arc::new(basic::TextRenderer::long_text()));
        registry.register(Arc::new(basic::SummaryRenderer));
        registry.register(Arc::new(submit::SubmitRenderer::tutor()));
        registry.register(Arc::new(submit::SubmitRenderer::assessment()));
        registry.register(Arc::new(submit::SubmitRenderer::resource()));
        registry.register(Arc::new(chat::ChatRenderer));
        registry.register(Arc::new(basic::UnsupportedRenderer));
        registry
    }

    /// Register a renderer, replacing any previous one for its kind.
    pub fn register(&mut self, renderer: Arc<dyn StepRenderer>) {
        let kind = renderer.kind();
        self.renderers.insert(kind, renderer);
        tracing::debug!(?kind, "Registered step renderer");
    }

    pub fn get(&self, kind: StepKindTag) -> Arc<dyn StepRenderer> {
        self.renderers
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn has(&self, kind: StepKindTag) -> bool {
        self.renderers.contains_key(&kind)
    }

    pub fn count(&self) -> usize {
        self.renderers.len()
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
