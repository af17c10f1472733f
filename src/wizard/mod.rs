//! Wizard session: response accumulation, position state and the engine that
//! drives both.

pub mod engine;
pub mod responses;
pub mod state;

pub use engine::{COMPLETION_MESSAGE, WizardEngine};
pub use responses::ResponseMap;
pub use state::{MAX_RETRIES, Position, SubmissionState, WizardState};
