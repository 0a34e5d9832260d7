//! Shared helpers for broker integration tests
//!
//! [`MockFetcher`] answers each provider from a scripted [`Outcome`] and can
//! hang, fail or panic on demand, so provider isolation can be exercised
//! without a network.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use s2n_broker::{FetchKind, FetchRequest, FetchResponse, Fetcher, ProviderCode, ProviderFailure};
use serde_json::Value;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn load_fixture(name: &str) -> Value {
    let path = fixture_path().join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("Fixture is not valid JSON")
}

/// Scripted answer for one provider
#[derive(Debug, Clone)]
pub enum Outcome {
    Respond(FetchResponse),
    Delayed(Duration, FetchResponse),
    Fail(ProviderFailure),
    /// Never answers; only a timeout ends the request
    Hang,
    Panic,
}

impl Outcome {
    pub fn fixture(name: &str) -> Self {
        Outcome::Respond(FetchResponse::ok(
            vec![format!("https://example.org/{}", name)],
            load_fixture(name),
        ))
    }

    pub fn body(body: Value) -> Self {
        Outcome::Respond(FetchResponse::ok(vec!["https://example.org/query".to_string()], body))
    }
}

#[derive(Debug, Default)]
pub struct MockFetcher {
    records: HashMap<ProviderCode, Outcome>,
    counts: HashMap<String, Outcome>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: ProviderCode, outcome: Outcome) -> Self {
        self.records.insert(provider, outcome);
        self
    }

    pub fn with_count(mut self, taxon_key: &str, outcome: Outcome) -> Self {
        self.counts.insert(taxon_key.to_string(), outcome);
        self
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, ProviderFailure> {
        let outcome = match &request.kind {
            FetchKind::Records(_) => self.records.get(&request.provider),
            FetchKind::TaxonOccurrenceCount { taxon_key } => self.counts.get(taxon_key),
        };
        match outcome.cloned() {
            Some(Outcome::Respond(response)) => Ok(response),
            Some(Outcome::Delayed(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            },
            Some(Outcome::Fail(failure)) => Err(failure),
            Some(Outcome::Hang) => std::future::pending().await,
            Some(Outcome::Panic) => panic!("malformed {} payload", request.provider),
            None => Err(ProviderFailure::fetch(request.provider.as_str(), "no scripted response")),
        }
    }
}
