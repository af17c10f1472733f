//! Renderer for the embedded chat step.

use crate::schema::{Step, StepKindTag, UsageType};
use crate::webhook::ChatSession;
use crate::webhook::chat::{LOW_ATTEMPTS, LOW_TOKENS};

use super::{Control, Element, Intent, RenderContext, StepRenderer, UserInput};

pub struct ChatRenderer;

fn usage_badge(session: &ChatSession) -> Element {
    match session.usage_type() {
        UsageType::Token => Element::UsageBadge {
            label: "Credits".to_string(),
            value: session.tokens_left().to_string(),
            low: session.tokens_left() <= LOW_TOKENS,
        },
        UsageType::Attempt => Element::UsageBadge {
            label: "Attempts".to_string(),
            value: format!("{}/{}", session.attempts_left(), session.max_attempts()),
            low: session.attempts_left() <= LOW_ATTEMPTS,
        },
        UsageType::Unlimited => Element::UsageBadge {
            label: "Usage".to_string(),
            value: "Unlimited".to_string(),
            low: false,
        },
    }
}

impl StepRenderer for ChatRenderer {
    fn kind(&self) -> StepKindTag {
        StepKindTag::Chat
    }

    fn render(&self, _step: &Step, ctx: &RenderContext<'_>) -> Vec<Element> {
        let Some(session) = ctx.chat else {
            return vec![
                Element::error("Chat is unavailable for this step"),
                Element::button(ctx.continue_label(), Control::Continue),
            ];
        };

        let mut body = vec![usage_badge(session)];
        body.extend(session.transcript().iter().map(|m| Element::ChatLine {
            role: m.role,
            content: m.content.clone(),
        }));
        if let Some(err) = session.last_error() {
            body.push(Element::error(err.display_text()));
        }
        body.push(Element::TextField {
            label: "Message".to_string(),
            placeholder: session.placeholder().to_string(),
            multiline: false,
        });
        body.push(Element::button("Send", Control::Send));
        body.push(Element::button(ctx.continue_label(), Control::Continue));
        body
    }

    fn on_input(&self, _step: &Step, input: UserInput) -> Vec<Intent> {
        match input {
            UserInput::Send { message } => vec![Intent::SendChat(message)],
            UserInput::Continue => vec![Intent::Advance],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Branding, StepKind};
    use crate::webhook::ChatRole;
    use crate::wizard::ResponseMap;

    fn chat_step(usage: &str) -> Step {
        serde_json::from_value(serde_json::json!({
            "id": "c", "type": "ai_chat", "usageType": usage,
            "initialTokens": 4, "initialAttempts": 10
        }))
        .unwrap()
    }

    fn render(step: &Step, session: Option<&ChatSession>) -> Vec<Element> {
        let responses = ResponseMap::new();
        let branding = Branding::default();
        let steps = [step.clone()];
        let ctx = RenderContext {
            steps: &steps,
            responses: &responses,
            branding: &branding,
            submission: None,
            chat: session,
            default_webhook_url: None,
        };
        ChatRenderer.render(step, &ctx)
    }

    fn session_for(step: &Step) -> ChatSession {
        let StepKind::Chat(config) = &step.kind else {
            panic!("expected chat step");
        };
        ChatSession::new(config.clone())
    }

    #[test]
    fn token_badge_marks_low_credits() {
        let step = chat_step("token");
        let session = session_for(&step);
        let body = render(&step, Some(&session));
        assert_eq!(
            body[0],
            Element::UsageBadge {
                label: "Credits".to_string(),
                value: "4".to_string(),
                low: true
            }
        );
        assert!(matches!(&body[1], Element::ChatLine { role: ChatRole::System, .. }));
    }

    #[test]
    fn attempt_badge_shows_remaining_of_max() {
        let step = chat_step("attempt");
        let session = session_for(&step);
        let body = render(&step, Some(&session));
        assert_eq!(
            body[0],
            Element::UsageBadge {
                label: "Attempts".to_string(),
                value: "10/10".to_string(),
                low: false
            }
        );
    }

    #[test]
    fn offers_send_and_continue() {
        let step = chat_step("unlimited");
        let session = session_for(&step);
        let body = render(&step, Some(&session));
        assert!(body.contains(&Element::button("Send", Control::Send)));
        assert_eq!(body.last(), Some(&Element::button("Continue", Control::Continue)));
    }

    #[test]
    fn send_input_becomes_chat_intent() {
        let step = chat_step("token");
        assert_eq!(
            ChatRenderer.on_input(
                &step,
                UserInput::Send {
                    message: "hi".to_string()
                }
            ),
            vec![Intent::SendChat("hi".to_string())]
        );
    }
}
