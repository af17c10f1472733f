//! Easy Kit: a configurable questionnaire wizard driven by kit/module step
//! documents, with webhook-backed AI steps.

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod render;
pub mod routes;
pub mod schema;
pub mod terminal;
pub mod webhook;
pub mod wizard;
