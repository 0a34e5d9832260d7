//! Multi-provider aggregation
//!
//! The [`Aggregator`] runs one path per selected provider: fetch the native
//! payload through the [`Fetcher`] collaborator, unpack it, filter and
//! standardize its records, and wrap them in that provider's envelope. A
//! failing path, whether the fetch errors, times out, answers with a bad
//! status, returns an unexpected shape or panics, becomes a failure envelope
//! in that provider's slot. Only configuration defects abort the request.
//!
//! Paths may run concurrently. Results are collected per slot so the outer
//! envelope lists providers in the order they were requested.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::config::BrokerConfig;
use crate::diagnostics::{ErrInfo, ErrorEntry, Severity};
use crate::envelope::{AggregateEnvelope, OutputEnvelope};
use crate::error::{BrokerError, ProviderFailure, Result};
use crate::provider::ProviderCode;
use crate::query::{Query, QueryTarget};
use crate::schema::{CanonicalSchema, ProviderFieldMap, RecordKind, SchemaRegistry};
use crate::standardize::{StandardizedRecord, Standardizer, StandardizerTable};

/// What to fetch from a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
    /// Records answering a broker query
    Records(Query),
    /// Number of occurrences recorded for a taxon
    TaxonOccurrenceCount { taxon_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub provider: ProviderCode,
    pub kind: FetchKind,
}

impl FetchRequest {
    pub fn records(provider: ProviderCode, query: Query) -> Self {
        Self {
            provider,
            kind: FetchKind::Records(query),
        }
    }

    pub fn taxon_occurrence_count(provider: ProviderCode, taxon_key: impl Into<String>) -> Self {
        Self {
            provider,
            kind: FetchKind::TaxonOccurrenceCount {
                taxon_key: taxon_key.into(),
            },
        }
    }
}

/// A provider's native answer
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    /// HTTP-style status
    pub status: u16,
    /// URLs the request was sent to
    pub urls: Vec<String>,
    pub body: Value,
}

impl FetchResponse {
    pub fn ok(urls: Vec<String>, body: Value) -> Self {
        Self {
            status: 200,
            urls,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound calls to provider APIs
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> std::result::Result<FetchResponse, ProviderFailure>;
}

/// Everything one provider path needs, resolved before any fetch
struct ProviderPath<'r> {
    provider: ProviderCode,
    kind: RecordKind,
    standardizer: &'r dyn Standardizer,
    map: &'r ProviderFieldMap,
    schema: &'r CanonicalSchema,
}

pub struct Aggregator<'a> {
    registry: &'a SchemaRegistry,
    standardizers: &'a StandardizerTable,
    fetcher: &'a dyn Fetcher,
    config: &'a BrokerConfig,
}

impl<'a> Aggregator<'a> {
    /// Fails when a registered standardizer lacks a schema or field map
    pub fn new(
        registry: &'a SchemaRegistry,
        standardizers: &'a StandardizerTable,
        fetcher: &'a dyn Fetcher,
        config: &'a BrokerConfig,
    ) -> Result<Self> {
        standardizers.validate(registry)?;
        Ok(Self {
            registry,
            standardizers,
            fetcher,
            config,
        })
    }

    pub fn config(&self) -> &BrokerConfig {
        self.config
    }

    /// Standardize one raw record, fields in canonical order
    pub fn standardize(
        &self,
        provider: ProviderCode,
        raw: &Value,
        kind: RecordKind,
        query: &Query,
    ) -> Result<StandardizedRecord> {
        let schema = self.registry.get_canonical_fields(kind)?;
        let record = self
            .standardizers
            .standardize(self.registry, provider, raw, kind, &query.options)?;
        Ok(record.into_canonical_order(schema))
    }

    /// Providers to query for `requested` codes, with warnings for codes
    /// that cannot answer
    ///
    /// No valid code at all means every provider of the service.
    pub fn resolve_providers(requested: &[String], query: &Query) -> (Vec<ProviderCode>, ErrInfo) {
        let dataset_query = matches!(query.target, QueryTarget::DatasetKey(_));
        let valid: Vec<ProviderCode> = query
            .service
            .providers()
            .into_iter()
            .filter(|p| !dataset_query || p.descriptor().dataset_queries)
            .collect();

        let mut chosen = Vec::new();
        let mut rejected = Vec::new();
        for code in requested {
            let code = code.trim().to_lowercase();
            if code.is_empty() {
                continue;
            }
            match code.parse::<ProviderCode>() {
                Ok(provider) if valid.contains(&provider) => {
                    if !chosen.contains(&provider) {
                        chosen.push(provider);
                    }
                },
                _ => rejected.push(code),
            }
        }

        let mut warnings = ErrInfo::new();
        if !rejected.is_empty() {
            let options: Vec<&str> = valid.iter().map(ProviderCode::as_str).collect();
            warnings.push(
                Severity::Warning,
                format!(
                    "Value(s) {} for parameter provider not in valid options {}",
                    rejected.join(", "),
                    options.join(", ")
                ),
            );
        }
        if chosen.is_empty() {
            chosen = valid;
        }
        (chosen, warnings)
    }

    /// Resolve requested codes, then aggregate; resolution warnings go on
    /// the outer envelope
    pub async fn aggregate_requested(&self, query: &Query, requested: &[String]) -> Result<AggregateEnvelope> {
        let (providers, warnings) = Self::resolve_providers(requested, query);
        if !warnings.is_empty() {
            debug!(requested = ?requested, resolved = ?providers, "Provider list adjusted");
        }
        let envelope = self.aggregate(query, &providers).await?;
        Ok(envelope.with_errors(&warnings))
    }

    /// Query every provider in `providers`, in that order
    pub async fn aggregate(&self, query: &Query, providers: &[ProviderCode]) -> Result<AggregateEnvelope> {
        let kind = query.service.record_kind().ok_or_else(|| {
            BrokerError::configuration(format!("The {} service carries no records", query.service))
        })?;
        let paths = providers
            .iter()
            .map(|provider| self.path(*provider, query, kind))
            .collect::<Result<Vec<_>>>()?;

        info!(
            service = %query.service,
            query = %query.target.value(),
            providers = providers.len(),
            parallel = self.config.parallel,
            "Aggregating provider queries"
        );

        let envelopes = if self.config.parallel {
            join_all(paths.iter().map(|path| self.isolated(path, query))).await
        } else {
            let mut envelopes = Vec::with_capacity(paths.len());
            for path in &paths {
                envelopes.push(self.isolated(path, query).await);
            }
            envelopes
        };

        let failed = envelopes
            .iter()
            .filter(|envelope| envelope.errinfo().has_errors())
            .count();
        info!(
            service = %query.service,
            providers = envelopes.len(),
            failed,
            "Aggregation complete"
        );

        Ok(self.assemble(query, providers, envelopes))
    }

    /// Outer envelope enumerating one inner envelope per provider
    pub fn assemble(
        &self,
        query: &Query,
        providers: &[ProviderCode],
        envelopes: Vec<OutputEnvelope>,
    ) -> AggregateEnvelope {
        OutputEnvelope::new(query.service, self.config.broker_meta())
            .with_query_term(query.aggregate_term(providers))
            .with_record_format(query.service.record_format())
            .with_records(envelopes)
    }

    /// Build a provider's envelope from its fetched response
    ///
    /// Pure: the same response always yields the same envelope.
    pub fn envelope_from_response(
        &self,
        provider: ProviderCode,
        query: &Query,
        response: FetchResponse,
    ) -> Result<std::result::Result<OutputEnvelope, ProviderFailure>> {
        let kind = query.service.record_kind().ok_or_else(|| {
            BrokerError::configuration(format!("The {} service carries no records", query.service))
        })?;
        let path = self.path(provider, query, kind)?;
        Ok(self.build_envelope(&path, query, response))
    }

    fn path(&self, provider: ProviderCode, query: &Query, kind: RecordKind) -> Result<ProviderPath<'a>> {
        if !provider.descriptor().offers(query.service) {
            return Err(BrokerError::configuration(format!(
                "{} does not offer the {} service",
                provider, query.service
            )));
        }
        let standardizer = self.standardizers.get(provider).ok_or_else(|| {
            BrokerError::configuration(format!("No standardizer registered for {}", provider))
        })?;
        Ok(ProviderPath {
            provider,
            kind,
            standardizer,
            map: self.registry.get_provider_map(provider, kind)?,
            schema: self.registry.get_canonical_fields(kind)?,
        })
    }

    /// Run a provider path, turning a panic into that provider's failure
    async fn isolated(&self, path: &ProviderPath<'_>, query: &Query) -> OutputEnvelope {
        match AssertUnwindSafe(self.provider_envelope(path, query))
            .catch_unwind()
            .await
        {
            Ok(envelope) => envelope,
            Err(payload) => {
                let failure = ProviderFailure::Panicked {
                    provider: path.provider.to_string(),
                    message: panic_message(payload.as_ref()),
                };
                error!(provider = %path.provider, error = %failure, "Provider path panicked");
                self.failure_envelope(path, query, &failure)
            },
        }
    }

    async fn provider_envelope(&self, path: &ProviderPath<'_>, query: &Query) -> OutputEnvelope {
        let request = FetchRequest::records(path.provider, query.clone());
        let result = match self.fetch(&request).await {
            Ok(response) => self.build_envelope(path, query, response),
            Err(failure) => Err(failure),
        };

        match result {
            Ok(mut envelope) => {
                if query.options.gbif_count && !query.options.count_only {
                    self.add_occurrence_counts(path, &mut envelope).await;
                }
                debug!(
                    provider = %path.provider,
                    count = envelope.count(),
                    "Provider query complete"
                );
                envelope
            },
            Err(failure) => {
                warn!(provider = %path.provider, error = %failure, "Provider query failed");
                self.failure_envelope(path, query, &failure)
            },
        }
    }

    fn failure_envelope(&self, path: &ProviderPath<'_>, query: &Query, failure: &ProviderFailure) -> OutputEnvelope {
        OutputEnvelope::failure(
            query.service,
            self.config.provider_meta(path.provider),
            query.provider_term(),
            failure,
        )
        .with_record_format(path.standardizer.record_format(path.kind))
    }

    /// One fetch attempt bounded by the provider timeout
    async fn fetch(&self, request: &FetchRequest) -> std::result::Result<FetchResponse, ProviderFailure> {
        match tokio::time::timeout(self.config.provider_timeout(), self.fetcher.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderFailure::Timeout {
                provider: request.provider.to_string(),
                seconds: self.config.provider_timeout_secs,
            }),
        }
    }

    fn build_envelope(
        &self,
        path: &ProviderPath<'_>,
        query: &Query,
        response: FetchResponse,
    ) -> std::result::Result<OutputEnvelope, ProviderFailure> {
        check_status(path.provider, &response)?;

        let options = &query.options;
        let page = path.standardizer.unpack(path.kind, &response.body, options)?;
        let meta = self
            .config
            .provider_meta(path.provider)
            .with_status(response.status)
            .with_query_urls(response.urls);
        let envelope = OutputEnvelope::new(query.service, meta)
            .with_query_term(query.provider_term())
            .with_record_format(path.standardizer.record_format(path.kind));

        if options.count_only {
            return Ok(envelope.with_count_only(page.total));
        }

        let records = page
            .records
            .iter()
            .filter(|raw| path.standardizer.accept(path.kind, raw, options))
            .map(|raw| {
                path.standardizer
                    .standardize(path.map, raw, options)
                    .into_canonical_order(path.schema)
            })
            .collect();
        Ok(envelope.with_records(records))
    }

    /// Add GBIF occurrence counts to name records carrying a taxon key
    ///
    /// A failed count is a warning; the record stays.
    async fn add_occurrence_counts(&self, path: &ProviderPath<'_>, envelope: &mut OutputEnvelope) {
        let keys: Vec<(usize, String)> = envelope
            .records()
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                path.standardizer
                    .occurrence_count_key(record)
                    .map(|key| (index, key))
            })
            .collect();

        for (index, taxon_key) in keys {
            let request = FetchRequest::taxon_occurrence_count(path.provider, taxon_key.as_str());
            let counted = self
                .fetch(&request)
                .await
                .and_then(|response| occurrence_count(path.provider, response));

            match counted {
                Ok((count, urls)) => {
                    if let Some(record) = envelope.records_mut().get_mut(index) {
                        record.insert("s2n:gbif_occurrence_count", json!(count));
                        if let Some(url) = path.standardizer.occurrence_search_url(&taxon_key) {
                            record.insert("s2n:gbif_occurrence_url", Value::String(url));
                        }
                        *record = std::mem::take(record).into_canonical_order(path.schema);
                    }
                    for url in urls {
                        envelope.push_query_url(url);
                    }
                },
                Err(failure) => {
                    warn!(provider = %path.provider, taxon_key = %taxon_key, error = %failure, "Occurrence count failed");
                    envelope.push_error(ErrorEntry::warning(format!(
                        "Failed to count occurrences for taxon {}: {}",
                        taxon_key, failure
                    )));
                },
            }
        }
    }
}

fn check_status(provider: ProviderCode, response: &FetchResponse) -> std::result::Result<(), ProviderFailure> {
    if response.is_success() {
        return Ok(());
    }
    let message = match &response.body {
        Value::String(text) if !text.is_empty() => text.clone(),
        body => body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string(),
    };
    Err(ProviderFailure::Status {
        provider: provider.to_string(),
        status: response.status,
        message,
    })
}

fn occurrence_count(
    provider: ProviderCode,
    response: FetchResponse,
) -> std::result::Result<(u64, Vec<String>), ProviderFailure> {
    check_status(provider, &response)?;
    let count = response
        .body
        .get("count")
        .and_then(Value::as_u64)
        .or_else(|| response.body.as_u64())
        .ok_or_else(|| ProviderFailure::shape(provider.as_str(), "no occurrence count in response"))?;
    Ok((count, response.urls))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "provider path panicked".to_string()
    }
}
