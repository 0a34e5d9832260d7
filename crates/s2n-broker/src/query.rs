//! Validated broker queries
//!
//! A [`Query`] arrives already parsed and validated. It knows how to spell
//! itself back out as the `query_term` of provider and aggregate envelopes.

use serde::{Deserialize, Serialize};

use crate::provider::{ProviderCode, Service};

/// What a query looks up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTarget {
    /// Darwin Core occurrence identifier
    OccurrenceId(String),
    /// GBIF dataset key
    DatasetKey(String),
    /// Scientific name string
    Name(String),
}

impl QueryTarget {
    fn param(&self) -> (&'static str, &str) {
        match self {
            QueryTarget::OccurrenceId(id) => ("occid", id),
            QueryTarget::DatasetKey(key) => ("dataset_key", key),
            QueryTarget::Name(name) => ("namestr", name),
        }
    }

    pub fn value(&self) -> &str {
        self.param().1
    }
}

/// Per-endpoint option flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Restrict name results to accepted taxa
    pub is_accepted: bool,
    /// Add GBIF occurrence counts to GBIF name records
    pub gbif_count: bool,
    /// Report provider totals without records
    pub count_only: bool,
    /// Restrict name results to one kingdom
    pub kingdom: Option<String>,
    /// Projection scenarios to keep in map results, empty keeps all
    pub scenario_codes: Vec<String>,
    /// Map layer color passed through to clients
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub service: Service,
    pub target: QueryTarget,
    pub options: QueryOptions,
}

impl Query {
    pub fn new(service: Service, target: QueryTarget) -> Self {
        Self {
            service,
            target,
            options: QueryOptions::default(),
        }
    }

    pub fn occurrence(occid: impl Into<String>) -> Self {
        Self::new(Service::Occurrence, QueryTarget::OccurrenceId(occid.into()))
    }

    pub fn dataset(dataset_key: impl Into<String>) -> Self {
        Self::new(Service::Occurrence, QueryTarget::DatasetKey(dataset_key.into()))
    }

    pub fn name(namestr: impl Into<String>) -> Self {
        Self::new(Service::Name, QueryTarget::Name(namestr.into()))
    }

    pub fn map(namestr: impl Into<String>) -> Self {
        Self::new(Service::Map, QueryTarget::Name(namestr.into()))
    }

    pub fn resolve(occid: impl Into<String>) -> Self {
        Self::new(Service::Resolve, QueryTarget::OccurrenceId(occid.into()))
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Parameters after the target, in the order they are reported
    fn option_params(&self) -> Vec<(&'static str, String)> {
        let opts = &self.options;
        match self.service {
            Service::Occurrence => vec![("count_only", opts.count_only.to_string())],
            Service::Name => {
                let mut params = vec![
                    ("is_accepted", opts.is_accepted.to_string()),
                    ("gbif_count", opts.gbif_count.to_string()),
                ];
                if let Some(kingdom) = &opts.kingdom {
                    params.push(("kingdom", kingdom.clone()));
                }
                params
            },
            Service::Map => {
                let mut params = Vec::new();
                if !opts.scenario_codes.is_empty() {
                    params.push(("scenario_codes", opts.scenario_codes.join(",")));
                }
                if let Some(color) = &opts.color {
                    params.push(("color", color.clone()));
                }
                params
            },
            Service::Resolve | Service::Badge => Vec::new(),
        }
    }

    /// Query term of a single provider's envelope
    pub fn provider_term(&self) -> String {
        let (key, value) = self.target.param();
        let mut parts = vec![format!("{}={}", key, value)];
        parts.extend(self.option_params().into_iter().map(|(k, v)| format!("{}={}", k, v)));
        parts.join("&")
    }

    /// Query term of the aggregate envelope, including the provider list
    pub fn aggregate_term(&self, providers: &[ProviderCode]) -> String {
        let (key, value) = self.target.param();
        let codes: Vec<&str> = providers.iter().map(ProviderCode::as_str).collect();
        let mut parts = vec![
            format!("{}={}", key, value),
            format!("provider={}", codes.join(",")),
        ];
        parts.extend(self.option_params().into_iter().map(|(k, v)| format!("{}={}", k, v)));
        parts.join("&")
    }
}
