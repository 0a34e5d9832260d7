//! Specify Network broker core
//!
//! Turns raw payloads from independent biodiversity data providers (GBIF,
//! iDigBio, ITIS, MorphoSource, Specify, WoRMS, IPNI, Lifemapper) into one
//! canonical vocabulary and merges them into a single output envelope.
//!
//! The pieces, leaf first:
//!
//! - [`schema`]: canonical fields per record kind and the per-provider field maps
//! - [`standardize`]: one [`Standardizer`] per provider, driven by those maps
//! - [`envelope`]: the uniform [`OutputEnvelope`] result type
//! - [`diagnostics`]: severity-keyed error and warning merging
//! - [`aggregate`]: fans a [`Query`] out to providers and collects the envelopes
//! - [`table`]: a field-by-provider comparison view of an aggregate result
//!
//! Network access stays outside the crate behind the [`Fetcher`] trait.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod aggregate;
pub mod config;
pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod provider;
pub mod query;
pub mod schema;
pub mod standardize;
pub mod table;

pub use aggregate::{Aggregator, FetchKind, FetchRequest, FetchResponse, Fetcher};
pub use config::BrokerConfig;
pub use diagnostics::{ErrInfo, ErrorEntry, Severity};
pub use envelope::{AggregateEnvelope, OutputEnvelope, ProviderMeta};
pub use error::{BrokerError, EnvelopeError, ProviderFailure, Result};
pub use provider::{ProviderCode, ProviderDescriptor, Service};
pub use query::{Query, QueryOptions, QueryTarget};
pub use schema::{CanonicalField, CanonicalSchema, Namespace, RecordKind, SchemaRegistry};
pub use standardize::{StandardizedRecord, Standardizer, StandardizerTable};
pub use table::ComparisonTable;
