//! Record standardization
//!
//! Each provider implements [`Standardizer`]: it knows how to unpack its
//! native response into raw records, which records pass the query filters,
//! and how to build its URLs. Turning a raw record into a
//! [`StandardizedRecord`] is shared and driven entirely by the provider's
//! [`ProviderFieldMap`].
//!
//! Standardization never fails. A field whose source is absent, or whose
//! derivation cannot be computed, is left out of the record.

mod derive;
mod gbif;
mod idigbio;
mod ipni;
mod itis;
mod lifemapper;
mod morphosource;
mod specify;
mod worms;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::{BrokerError, ProviderFailure, Result};
use crate::provider::ProviderCode;
use crate::query::QueryOptions;
use crate::schema::{Absence, CanonicalSchema, FieldRule, ProviderFieldMap, RecordKind, SchemaRegistry};

pub use derive::describe_issue;
pub use gbif::GbifStandardizer;
pub use idigbio::IdigbioStandardizer;
pub use ipni::IpniStandardizer;
pub use itis::ItisStandardizer;
pub use lifemapper::LifemapperStandardizer;
pub use morphosource::MorphoSourceStandardizer;
pub use specify::SpecifyStandardizer;
pub use worms::WormsStandardizer;

/// One provider record expressed in canonical fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandardizedRecord(IndexMap<String, Value>);

impl StandardizedRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Reorder fields by their declaration order in `schema`
    pub fn into_canonical_order(mut self, schema: &CanonicalSchema) -> Self {
        let rank = |field: &str| schema.position(field).unwrap_or(usize::MAX);
        self.0.sort_by(|a, _, b, _| rank(a.as_str()).cmp(&rank(b.as_str())));
        self
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.0
    }
}

/// Records unpacked from one provider response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderPage {
    /// Total the provider reports, may exceed `records.len()`
    pub total: u64,
    pub records: Vec<Value>,
}

impl ProviderPage {
    pub fn new(total: u64, records: Vec<Value>) -> Self {
        Self { total, records }
    }

    /// A page whose total is the number of records it holds
    pub fn complete(records: Vec<Value>) -> Self {
        Self::new(records.len() as u64, records)
    }
}

/// Per-provider standardization behavior
pub trait Standardizer: Send + Sync {
    fn provider(&self) -> ProviderCode;

    /// What counts as "no data" in this provider's records
    fn absence(&self) -> Absence {
        Absence::Missing
    }

    /// Schema identifier reported in this provider's envelopes
    fn record_format(&self, kind: RecordKind) -> &'static str;

    /// Split a native response body into raw records
    fn unpack(
        &self,
        kind: RecordKind,
        body: &Value,
        options: &QueryOptions,
    ) -> std::result::Result<ProviderPage, ProviderFailure>;

    /// Whether a raw record passes the query filters
    fn accept(&self, _kind: RecordKind, _raw: &Value, _options: &QueryOptions) -> bool {
        true
    }

    fn view_url(&self, _kind: RecordKind, _id: &str) -> Option<String> {
        None
    }

    fn api_url(&self, _kind: RecordKind, _id: &str) -> Option<String> {
        None
    }

    /// Taxon key to count occurrences for, when the provider supports it
    fn occurrence_count_key(&self, _record: &StandardizedRecord) -> Option<String> {
        None
    }

    /// Page listing the occurrences of a taxon
    fn occurrence_search_url(&self, _taxon_key: &str) -> Option<String> {
        None
    }

    fn standardize(
        &self,
        map: &ProviderFieldMap,
        raw: &Value,
        options: &QueryOptions,
    ) -> StandardizedRecord {
        apply_map(self, map, raw, options)
    }
}

/// Fill a record from `raw` following `map` in declaration order
pub fn apply_map<S: Standardizer + ?Sized>(
    standardizer: &S,
    map: &ProviderFieldMap,
    raw: &Value,
    options: &QueryOptions,
) -> StandardizedRecord {
    let absence = standardizer.absence();
    let mut record = StandardizedRecord::default();

    for mapping in map.entries() {
        let value = match &mapping.rule {
            FieldRule::Copy(sources) => sources
                .iter()
                .filter_map(|source| source.lookup(raw))
                .find(|value| !absence.is_absent(value))
                .cloned(),
            FieldRule::Derive(derivation) => {
                derive::derive(standardizer, map.kind(), derivation, raw, options)
            },
        };

        match value {
            Some(value) if !absence.is_absent(&value) => record.insert(mapping.target.as_str(), value),
            _ => trace!(
                provider = %map.provider(),
                field = %mapping.target,
                "Field omitted"
            ),
        }
    }
    record
}

/// Standardizers keyed by provider, built once at startup
#[derive(Default)]
pub struct StandardizerTable {
    entries: IndexMap<ProviderCode, Box<dyn Standardizer>>,
}

impl StandardizerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in providers
    pub fn with_defaults() -> Self {
        Self::new()
            .register(GbifStandardizer)
            .register(IdigbioStandardizer)
            .register(ItisStandardizer)
            .register(LifemapperStandardizer)
            .register(MorphoSourceStandardizer)
            .register(SpecifyStandardizer)
            .register(WormsStandardizer)
            .register(IpniStandardizer)
    }

    /// Add or replace the standardizer for its provider
    pub fn register(mut self, standardizer: impl Standardizer + 'static) -> Self {
        self.entries
            .insert(standardizer.provider(), Box::new(standardizer));
        self
    }

    pub fn get(&self, provider: ProviderCode) -> Option<&dyn Standardizer> {
        self.entries.get(&provider).map(|s| s.as_ref())
    }

    pub fn providers(&self) -> impl Iterator<Item = ProviderCode> + '_ {
        self.entries.keys().copied()
    }

    /// Every service a registered provider offers must have a field map
    pub fn validate(&self, registry: &SchemaRegistry) -> Result<()> {
        for provider in self.entries.keys() {
            for service in provider.descriptor().services {
                if let Some(kind) = service.record_kind() {
                    registry.get_canonical_fields(kind)?;
                    registry.get_provider_map(*provider, kind)?;
                }
            }
        }
        Ok(())
    }

    /// Standardize one raw record of `provider`
    pub fn standardize(
        &self,
        registry: &SchemaRegistry,
        provider: ProviderCode,
        raw: &Value,
        kind: RecordKind,
        options: &QueryOptions,
    ) -> Result<StandardizedRecord> {
        let standardizer = self.get(provider).ok_or_else(|| {
            BrokerError::configuration(format!("No standardizer registered for {}", provider))
        })?;
        let map = registry.get_provider_map(provider, kind)?;
        Ok(standardizer.standardize(map, raw, options))
    }
}

impl std::fmt::Debug for StandardizerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardizerTable")
            .field("providers", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// List stored under `key`, or an unexpected-shape failure
pub(crate) fn list_at(
    provider: ProviderCode,
    body: &Value,
    key: &str,
) -> std::result::Result<Vec<Value>, ProviderFailure> {
    body.get(key)
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| ProviderFailure::shape(provider.as_str(), format!("no '{}' list in response", key)))
}

pub(crate) fn count_at(body: &Value, key: &str) -> Option<u64> {
    body.get(key).and_then(Value::as_u64)
}

pub(crate) fn unsupported(provider: ProviderCode, kind: RecordKind) -> ProviderFailure {
    ProviderFailure::shape(
        provider.as_str(),
        format!("{} does not serve {} records", provider, kind),
    )
}
