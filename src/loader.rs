//! Document loading: fetches the branding and step documents for a kit/module.
//!
//! Documents come from a [`DocumentSource`]: either a served site
//! ([`HttpSource`]) or a local build directory ([`DirSource`]). Both documents
//! are fetched concurrently; either failing ends the session.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::schema::{Branding, Step};

/// Path of the branding document relative to the site root.
pub const BRANDING_PATH: &str = "_data/branding.json";

/// Which step document to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitSelection {
    pub kit: String,
    pub module: String,
}

impl KitSelection {
    /// Validate identifiers so they are safe to splice into a path or URL.
    pub fn new(kit: &str, module: &str) -> Result<Self, LoadError> {
        let kit = kit.trim();
        let module = module.trim();
        if kit.is_empty() || module.is_empty() {
            return Err(LoadError::MissingSelection);
        }
        check_segment("kit", kit)?;
        check_segment("module", module)?;
        Ok(Self {
            kit: kit.to_string(),
            module: module.to_string(),
        })
    }

    /// Path of the step document relative to the site root.
    pub fn steps_path(&self) -> String {
        format!("modules/{}/{}/steps.json", self.kit, self.module)
    }
}

fn check_segment(field: &'static str, value: &str) -> Result<(), LoadError> {
    let bad = value == "."
        || value.contains("..")
        || value.contains(['/', '\\', '?', '#'])
        || value.chars().any(char::is_control);
    if bad {
        return Err(LoadError::InvalidSelection {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Everything a wizard session needs from the site.
#[derive(Debug, Clone)]
pub struct KitDocuments {
    pub branding: Branding,
    pub steps: Vec<Step>,
}

/// Where documents are read from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Fetch the raw text of a document at `path` (relative to the site root).
    async fn fetch(&self, path: &str) -> Result<String, LoadError>;
}

/// Reads documents from a served site over HTTP.
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn fetch(&self, path: &str) -> Result<String, LoadError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| LoadError::Request {
                document: path.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(LoadError::Http {
                document: path.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.text().await.map_err(|e| LoadError::Request {
            document: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Reads documents from a local site directory.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentSource for DirSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn fetch(&self, path: &str) -> Result<String, LoadError> {
        tokio::fs::read_to_string(self.root.join(path))
            .await
            .map_err(|source| LoadError::Io {
                document: path.to_string(),
                source,
            })
    }
}

fn parse_document<T: DeserializeOwned>(document: &str, text: &str) -> Result<T, LoadError> {
    serde_json::from_str(text).map_err(|source| LoadError::Parse {
        document: document.to_string(),
        source,
    })
}

/// Fetch and parse both documents for `selection`.
pub async fn load_documents(
    source: &dyn DocumentSource,
    selection: &KitSelection,
) -> Result<KitDocuments, LoadError> {
    let steps_path = selection.steps_path();
    debug!(source = %source.describe(), steps = %steps_path, "Loading kit documents");

    let (branding_text, steps_text) =
        tokio::try_join!(source.fetch(BRANDING_PATH), source.fetch(&steps_path))?;

    let branding: Branding = parse_document(BRANDING_PATH, &branding_text)?;
    let steps: Vec<Step> = parse_document(&steps_path, &steps_text)?;

    info!(
        kit = %selection.kit,
        module = %selection.module,
        steps = steps.len(),
        "Kit documents loaded"
    );

    Ok(KitDocuments { branding, steps })
}
