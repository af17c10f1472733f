//! Step schema: the two JSON documents a wizard session is built from.
//!
//! `branding.json` carries optional theme overrides; `steps.json` is an
//! ordered list of step descriptors. Descriptors are parsed into a closed
//! [`StepKind`] enum so each step carries only the fields its kind uses.

pub mod branding;
pub mod step;
pub mod validate;

pub use branding::Branding;
pub use step::{
    ChatConfig, ChoiceOption, SessionType, Step, StepKind, StepKindTag, SubmitConfig, UsageType,
};
pub use validate::{SchemaReport, SchemaWarning, validate_steps};
