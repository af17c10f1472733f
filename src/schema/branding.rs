//! Branding document (`_data/branding.json`).

use serde::{Deserialize, Serialize};

/// Label of the engine's continue controls when no `primaryCTA` is set.
pub const DEFAULT_CTA: &str = "Continue";

/// Theme overrides for the wizard. Every field is optional; an absent field
/// leaves the front end's default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(rename = "primaryCTA", default, skip_serializing_if = "Option::is_none")]
    pub primary_cta: Option<String>,
}

impl Branding {
    /// CSS custom properties to set on the document root, in a stable order.
    pub fn theme_variables(&self) -> Vec<(&'static str, &str)> {
        [
            ("--font-family", self.font_family.as_deref()),
            ("--primary1", self.primary1.as_deref()),
            ("--primary2", self.primary2.as_deref()),
            ("--accent-color", self.accent_color.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }

    pub fn cta_label(&self) -> &str {
        self.primary_cta.as_deref().unwrap_or(DEFAULT_CTA)
    }
}
