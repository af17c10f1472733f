//! Wizard position state machine.

use serde::Serialize;

use crate::error::{InteractionError, NavigationError};
use crate::webhook::WebhookResult;

/// Continues a retry-enabled step re-renders before the engine moves on.
pub const MAX_RETRIES: u32 = 3;

/// Where the session is.
///
/// Progresses forward: Active(0) → Active(1) → … → Terminal. Jumps may move
/// to any existing index; nothing moves back out of Terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum Position {
    Active(usize),
    Terminal,
}

impl Position {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Active(i) => Some(*i),
            Self::Terminal => None,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active(i) => write!(f, "active({i})"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// Cursor of one wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardState {
    pub position: Position,
    pub retry_count: u32,
    step_count: usize,
}

impl WizardState {
    /// Start at the first step, or terminal for an empty list.
    pub fn new(step_count: usize) -> Self {
        let position = if step_count == 0 {
            Position::Terminal
        } else {
            Position::Active(0)
        };
        Self {
            position,
            retry_count: 0,
            step_count,
        }
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Index used for progress reporting; `step_count` once terminal.
    pub fn current_index(&self) -> usize {
        self.position.index().unwrap_or(self.step_count)
    }

    /// Move one step forward. Returns the new position; no-op when terminal.
    pub fn advance(&mut self) -> Position {
        if let Position::Active(i) = self.position {
            self.position = if i + 1 >= self.step_count {
                Position::Terminal
            } else {
                Position::Active(i + 1)
            };
        }
        self.position
    }

    /// Jump to `index`, resetting the retry counter.
    pub fn jump(&mut self, index: usize) -> Result<Position, NavigationError> {
        if self.position.is_terminal() {
            return Err(NavigationError::Finished);
        }
        if index >= self.step_count {
            return Err(NavigationError::OutOfRange {
                index,
                step_count: self.step_count,
            });
        }
        self.position = Position::Active(index);
        self.retry_count = 0;
        Ok(self.position)
    }

    /// Legacy retry policy: stay while under [`MAX_RETRIES`], then reset and
    /// advance. Returns true if the step is repeated.
    pub fn retry_or_advance(&mut self, allow_retry: bool) -> bool {
        if allow_retry && self.retry_count < MAX_RETRIES {
            self.retry_count += 1;
            true
        } else {
            self.retry_count = 0;
            self.advance();
            false
        }
    }
}

/// Outcome of the latest submission on a submit step.
#[derive(Debug, Clone, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Succeeded(WebhookResult),
    Failed(InteractionError),
}

impl SubmissionState {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_starts_terminal() {
        let state = WizardState::new(0);
        assert!(state.position.is_terminal());
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn advance_walks_to_terminal() {
        let mut state = WizardState::new(3);
        assert_eq!(state.position, Position::Active(0));
        assert_eq!(state.advance(), Position::Active(1));
        assert_eq!(state.advance(), Position::Active(2));
        assert_eq!(state.advance(), Position::Terminal);
        assert_eq!(state.advance(), Position::Terminal);
        assert_eq!(state.current_index(), 3);
    }

    #[test]
    fn index_never_decreases_under_advance() {
        let mut state = WizardState::new(5);
        let mut last = state.current_index();
        for _ in 0..10 {
            state.advance();
            assert!(state.current_index() >= last);
            last = state.current_index();
        }
    }

    #[test]
    fn jump_resets_retries() {
        let mut state = WizardState::new(4);
        state.retry_count = 2;
        assert_eq!(state.jump(3).unwrap(), Position::Active(3));
        assert_eq!(state.retry_count, 0);
    }

    #[test]
    fn jump_out_of_range_is_rejected() {
        let mut state = WizardState::new(2);
        assert_eq!(
            state.jump(2),
            Err(NavigationError::OutOfRange {
                index: 2,
                step_count: 2
            })
        );
        assert_eq!(state.position, Position::Active(0));
    }

    #[test]
    fn jump_from_terminal_is_rejected() {
        let mut state = WizardState::new(1);
        state.advance();
        assert_eq!(state.jump(0), Err(NavigationError::Finished));
        assert!(state.position.is_terminal());
    }

    #[test]
    fn retry_caps_then_advances() {
        let mut state = WizardState::new(2);
        for expected in 1..=MAX_RETRIES {
            assert!(state.retry_or_advance(true));
            assert_eq!(state.retry_count, expected);
            assert_eq!(state.position, Position::Active(0));
        }
        assert!(!state.retry_or_advance(true));
        assert_eq!(state.retry_count, 0);
        assert_eq!(state.position, Position::Active(1));
    }

    #[test]
    fn retry_disabled_advances_immediately() {
        let mut state = WizardState::new(2);
        assert!(!state.retry_or_advance(false));
        assert_eq!(state.position, Position::Active(1));
    }

    #[test]
    fn position_serializes_tagged() {
        assert_eq!(
            serde_json::to_value(Position::Active(2)).unwrap(),
            serde_json::json!({"state": "active", "index": 2})
        );
        assert_eq!(
            serde_json::to_value(Position::Terminal).unwrap(),
            serde_json::json!({"state": "terminal"})
        );
    }
}
