//! Fixture-backed fetch collaborator
//!
//! Reads provider payloads previously saved to disk instead of calling the
//! provider APIs:
//!
//! ```text
//! DIR/<provider>/<service>.json       {"status": 200, "urls": [...], "body": ...}
//! DIR/gbif/count-<taxon_key>.json     same shape, body holds {"count": N}
//! ```
//!
//! A missing or unreadable file fails only the provider it belongs to.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use s2n_broker::{FetchKind, FetchRequest, FetchResponse, Fetcher, ProviderFailure};
use s2n_common::{Result, S2nError};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// On-disk form of one provider answer
#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default = "default_status")]
    status: u16,
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default)]
    body: Value,
}

fn default_status() -> u16 {
    200
}

#[derive(Debug, Clone)]
pub struct FixtureFetcher {
    root: PathBuf,
}

impl FixtureFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File answering `request`
    pub fn path_for(&self, request: &FetchRequest) -> PathBuf {
        let dir = self.root.join(request.provider.as_str());
        match &request.kind {
            FetchKind::Records(query) => dir.join(format!("{}.json", query.service)),
            FetchKind::TaxonOccurrenceCount { taxon_key } => dir.join(format!("count-{}.json", taxon_key)),
        }
    }

    async fn load(&self, path: &Path) -> Result<FetchResponse> {
        if !tokio::fs::try_exists(path).await? {
            return Err(S2nError::FixtureNotFound(path.display().to_string()));
        }
        let text = tokio::fs::read_to_string(path).await?;
        let fixture: FixtureFile = serde_json::from_str(&text)?;
        Ok(FetchResponse {
            status: fixture.status,
            urls: fixture.urls,
            body: fixture.body,
        })
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch(&self, request: &FetchRequest) -> std::result::Result<FetchResponse, ProviderFailure> {
        let path = self.path_for(request);
        debug!(provider = %request.provider, path = %path.display(), "Reading fixture");
        self.load(&path)
            .await
            .map_err(|e| ProviderFailure::fetch(request.provider.as_str(), e.to_string()))
    }
}
