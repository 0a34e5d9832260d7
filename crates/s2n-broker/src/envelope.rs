//! The Output Envelope
//!
//! Every provider query produces one [`OutputEnvelope`] of standardized
//! records. The aggregator wraps those, unmodified, as the records of an
//! [`AggregateEnvelope`] describing the whole request.
//!
//! Fields are private. Scalars change through [`OutputEnvelope::set_field`],
//! the three list fields (`records`, `errors` and the provider's `query_url`)
//! only grow through [`OutputEnvelope::append`] or their typed counterparts.
//! `count` follows `records` unless the envelope reports a provider total
//! for a count-only query.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::diagnostics::{ErrInfo, ErrorEntry};
use crate::error::{EnvelopeError, ProviderFailure, Result};
use crate::provider::Service;
use crate::standardize::StandardizedRecord;

/// Top-level keys of every envelope response, in output order
pub const RESPONSE_KEYS: [&str; 7] = [
    "count",
    "query_term",
    "service",
    "provider",
    "record_format",
    "records",
    "errors",
];

/// Key added to records of an annotated response naming their provider
pub const PROVIDER_ANNOTATION_KEY: &str = "internal:provider";

/// Response metadata of whoever answered the query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMeta {
    pub code: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// URLs actually queried, in request order
    #[serde(default)]
    pub query_url: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ProviderMeta {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_query_urls(mut self, urls: impl IntoIterator<Item = String>) -> Self {
        self.query_url.extend(urls);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEnvelope<R = StandardizedRecord> {
    count: u64,
    query_term: String,
    service: Service,
    provider: ProviderMeta,
    record_format: String,
    records: Vec<R>,
    errors: Vec<ErrorEntry>,
}

/// Envelope whose records are the per-provider envelopes of one request
pub type AggregateEnvelope = OutputEnvelope<OutputEnvelope>;

impl<R> OutputEnvelope<R> {
    pub fn new(service: Service, provider: ProviderMeta) -> Self {
        Self {
            count: 0,
            query_term: String::new(),
            service,
            provider,
            record_format: String::new(),
            records: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_query_term(mut self, query_term: impl Into<String>) -> Self {
        self.query_term = query_term.into();
        self
    }

    pub fn with_record_format(mut self, record_format: impl Into<String>) -> Self {
        self.record_format = record_format.into();
        self
    }

    /// Replace the records, `count` becomes their number
    pub fn with_records(mut self, records: Vec<R>) -> Self {
        self.count = records.len() as u64;
        self.records = records;
        self
    }

    /// No records, `count` is the total the provider reported
    pub fn with_count_only(mut self, total: u64) -> Self {
        self.records.clear();
        self.count = total;
        self
    }

    pub fn with_errors(mut self, errors: &ErrInfo) -> Self {
        self.extend_errors(errors);
        self
    }

    /// Envelope for a provider whose path failed: no records, one error
    pub fn failure(
        service: Service,
        mut provider: ProviderMeta,
        query_term: impl Into<String>,
        failure: &ProviderFailure,
    ) -> Self {
        if let Some(status) = failure.status_code() {
            provider.status_code = Some(status);
        }
        let mut envelope = Self::new(service, provider).with_query_term(query_term);
        envelope.push_error(ErrorEntry::error(failure.to_string()));
        envelope
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn query_term(&self) -> &str {
        &self.query_term
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn provider(&self) -> &ProviderMeta {
        &self.provider
    }

    pub fn record_format(&self) -> &str {
        &self.record_format
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    /// Errors regrouped by severity
    pub fn errinfo(&self) -> ErrInfo {
        ErrInfo::from(self.errors.clone())
    }

    pub(crate) fn records_mut(&mut self) -> &mut [R] {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }

    /// Add a record, `count` becomes the number of records held
    pub fn push_record(&mut self, record: R) {
        self.records.push(record);
        self.count = self.records.len() as u64;
    }

    pub fn push_error(&mut self, entry: ErrorEntry) {
        self.errors.push(entry);
    }

    pub fn push_query_url(&mut self, url: impl Into<String>) {
        self.provider.query_url.push(url.into());
    }

    pub fn extend_errors(&mut self, errors: &ErrInfo) {
        self.errors.extend(errors.entries());
    }

    /// Replace a top-level scalar or a provider sub-field
    pub fn set_field(&mut self, name: &str, value: Value) -> std::result::Result<(), EnvelopeError> {
        match name {
            "count" => self.count = value.as_u64().ok_or_else(|| invalid(name, "a non-negative integer"))?,
            "query_term" => self.query_term = string(name, value)?,
            "service" => {
                self.service = serde_json::from_value(value).map_err(|_| invalid(name, "a service name"))?
            },
            "record_format" => self.record_format = string(name, value)?,
            "provider" => {
                self.provider = serde_json::from_value(value).map_err(|_| invalid(name, "a provider object"))?
            },
            "code" => self.provider.code = string(name, value)?,
            "label" => self.provider.label = string(name, value)?,
            "icon_url" => self.provider.icon_url = optional_string(name, value)?,
            "status_code" => {
                self.provider.status_code = match value {
                    Value::Null => None,
                    other => Some(
                        other
                            .as_u64()
                            .and_then(|n| u16::try_from(n).ok())
                            .ok_or_else(|| invalid(name, "an HTTP status code"))?,
                    ),
                }
            },
            "query_url" => {
                self.provider.query_url = match value {
                    Value::String(url) => vec![url],
                    other => serde_json::from_value(other).map_err(|_| invalid(name, "a list of URLs"))?,
                }
            },
            "records" | "errors" => return Err(EnvelopeError::NotSettable(name.to_string())),
            _ => return Err(EnvelopeError::UnknownField(name.to_string())),
        }
        Ok(())
    }
}

impl<R: Serialize + DeserializeOwned> OutputEnvelope<R> {
    /// Append to `records`, `errors` or the provider's `query_url`
    pub fn append(&mut self, name: &str, value: Value) -> std::result::Result<(), EnvelopeError> {
        match name {
            "records" => {
                let record = serde_json::from_value(value).map_err(|_| invalid(name, "a record object"))?;
                self.push_record(record);
            },
            "errors" => {
                let entry = serde_json::from_value(value)
                    .map_err(|_| invalid(name, "a single {severity: message} pair"))?;
                self.push_error(entry);
            },
            "query_url" => {
                let url = string(name, value)?;
                self.push_query_url(url);
            },
            "count" | "query_term" | "service" | "provider" | "record_format" | "code" | "label"
            | "icon_url" | "status_code" => return Err(EnvelopeError::NotAppendable(name.to_string())),
            _ => return Err(EnvelopeError::UnknownField(name.to_string())),
        }
        Ok(())
    }

    /// Plain JSON snapshot with exactly the canonical top-level keys
    pub fn response(&self) -> Result<Value> {
        let value = serde_json::to_value(self)?;
        validate_response(&value)?;
        Ok(value)
    }
}

impl AggregateEnvelope {
    /// Response whose records each name the provider that produced them
    pub fn annotated_response(&self) -> Result<Value> {
        let mut response = self.response()?;
        let inner_envelopes = response
            .get_mut("records")
            .and_then(Value::as_array_mut)
            .into_iter()
            .flatten();

        for (inner, envelope) in inner_envelopes.zip(&self.records) {
            let annotation = json!({
                "code": envelope.provider.code,
                "label": envelope.provider.label,
            });
            let records = inner
                .get_mut("records")
                .and_then(Value::as_array_mut)
                .into_iter()
                .flatten();
            for record in records {
                if let Some(fields) = record.as_object_mut() {
                    fields.insert(PROVIDER_ANNOTATION_KEY.to_string(), annotation.clone());
                }
            }
        }
        Ok(response)
    }

    /// Every inner record paired with the provider envelope it came from
    pub fn provider_records(&self) -> impl Iterator<Item = (&OutputEnvelope, &StandardizedRecord)> {
        self.records
            .iter()
            .flat_map(|envelope| envelope.records.iter().map(move |record| (envelope, record)))
    }
}

/// Check a response snapshot carries exactly the canonical top-level keys
pub fn validate_response(response: &Value) -> std::result::Result<(), EnvelopeError> {
    let object = response.as_object().ok_or_else(|| EnvelopeError::Protocol {
        missing: RESPONSE_KEYS.iter().map(|k| k.to_string()).collect(),
        extra: Vec::new(),
    })?;

    let missing: Vec<String> = RESPONSE_KEYS
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    let extra: Vec<String> = object
        .keys()
        .filter(|key| !RESPONSE_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(EnvelopeError::Protocol { missing, extra })
    }
}

fn invalid(field: &str, expected: &'static str) -> EnvelopeError {
    EnvelopeError::InvalidValue {
        field: field.to_string(),
        expected,
    }
}

fn string(field: &str, value: Value) -> std::result::Result<String, EnvelopeError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(invalid(field, "a string")),
    }
}

fn optional_string(field: &str, value: Value) -> std::result::Result<Option<String>, EnvelopeError> {
    match value {
        Value::Null => Ok(None),
        other => string(field, other).map(Some),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    fn gbif_envelope() -> OutputEnvelope {
        OutputEnvelope::new(Service::Occurrence, ProviderMeta::new("gbif", "GBIF"))
            .with_query_term("occid=abc&count_only=false")
            .with_record_format("https://www.gbif.org/developer/occurrence")
    }

    #[test]
    fn test_response_has_canonical_keys_in_order() {
        let response = gbif_envelope().response().unwrap();
        let keys: Vec<&str> = response.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, RESPONSE_KEYS);
        assert_eq!(response["service"], json!("occ"));
        assert_eq!(response["provider"], json!({"code": "gbif", "label": "GBIF", "query_url": []}));
    }

    #[test]
    fn test_validate_response_reports_missing_and_extra() {
        let mut response = gbif_envelope().response().unwrap();
        let object = response.as_object_mut().unwrap();
        object.remove("errors");
        object.insert("debug".to_string(), json!(true));

        let err = validate_response(&response).unwrap_err();
        assert_eq!(
            err,
            EnvelopeError::Protocol {
                missing: vec!["errors".to_string()],
                extra: vec!["debug".to_string()],
            }
        );
    }

    #[test]
    fn test_append_records_tracks_count() {
        let mut envelope = gbif_envelope();
        envelope
            .append("records", json!({"dwc:catalogNumber": "KU 1"}))
            .unwrap();
        envelope
            .append("records", json!({"dwc:catalogNumber": "KU 2"}))
            .unwrap();
        assert_eq!(envelope.count(), 2);
        assert_eq!(envelope.records().len(), 2);
    }

    #[test]
    fn test_append_only_to_list_fields() {
        let mut envelope = gbif_envelope();
        envelope.append("query_url", json!("https://api.gbif.org/v1/occurrence/search")).unwrap();
        envelope.append("errors", json!({"warning": "partial"})).unwrap();
        assert_eq!(envelope.provider().query_url.len(), 1);
        assert_eq!(envelope.errors(), [ErrorEntry::warning("partial")]);

        assert_eq!(
            envelope.append("count", json!(3)),
            Err(EnvelopeError::NotAppendable("count".to_string()))
        );
        assert_eq!(
            envelope.append("comments", json!("x")),
            Err(EnvelopeError::UnknownField("comments".to_string()))
        );
        assert!(matches!(
            envelope.append("errors", json!({"warning": "a", "error": "b"})),
            Err(EnvelopeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_set_field_scalars_and_provider_subfields() {
        let mut envelope = gbif_envelope();
        envelope.set_field("query_term", json!("occid=xyz")).unwrap();
        envelope.set_field("status_code", json!(200)).unwrap();
        envelope.set_field("icon_url", json!("https://example.org/gbif.png")).unwrap();
        envelope.set_field("service", json!("name")).unwrap();

        assert_eq!(envelope.query_term(), "occid=xyz");
        assert_eq!(envelope.provider().status_code, Some(200));
        assert_eq!(envelope.service(), Service::Name);

        assert_eq!(
            envelope.set_field("records", json!([])),
            Err(EnvelopeError::NotSettable("records".to_string()))
        );
        assert!(matches!(
            envelope.set_field("status_code", json!(70000)),
            Err(EnvelopeError::InvalidValue { .. })
        ));
        assert!(matches!(
            envelope.set_field("service", json!("weather")),
            Err(EnvelopeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_count_only_reports_provider_total() {
        let envelope = gbif_envelope()
            .with_records(vec![StandardizedRecord::default()])
            .with_count_only(4021);
        assert_eq!(envelope.count(), 4021);
        assert!(envelope.records().is_empty());
    }

    #[test]
    fn test_append_record_after_count_only() {
        let mut envelope = gbif_envelope().with_count_only(4021);
        envelope
            .append("records", json!({"dwc:catalogNumber": "KU 1"}))
            .unwrap();
        assert_eq!(envelope.count(), 1);
        assert_eq!(envelope.records().len(), 1);
    }

    #[test]
    fn test_failure_envelope() {
        let failure = ProviderFailure::Status {
            provider: "idb".to_string(),
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        let envelope: OutputEnvelope =
            OutputEnvelope::failure(Service::Occurrence, ProviderMeta::new("idb", "iDigBio"), "occid=abc", &failure);

        assert_eq!(envelope.count(), 0);
        assert!(envelope.records().is_empty());
        assert_eq!(envelope.provider().status_code, Some(503));
        assert_eq!(envelope.errinfo().get(Severity::Error), [failure.to_string()]);
    }

    #[test]
    fn test_annotated_response_marks_inner_records() {
        let mut record: StandardizedRecord =
            serde_json::from_value(json!({"dwc:catalogNumber": "KU 1"})).unwrap();
        record.insert("dwc:institutionCode", json!("KU"));
        let inner = gbif_envelope().with_records(vec![record]);
        let outer: AggregateEnvelope =
            OutputEnvelope::new(Service::Occurrence, ProviderMeta::new("specifynetwork", "Specify Network"))
                .with_records(vec![inner]);

        let plain = outer.response().unwrap();
        assert!(plain["records"][0]["records"][0].get(PROVIDER_ANNOTATION_KEY).is_none());

        let annotated = outer.annotated_response().unwrap();
        assert_eq!(
            annotated["records"][0]["records"][0][PROVIDER_ANNOTATION_KEY],
            json!({"code": "gbif", "label": "GBIF"})
        );
        validate_response(&annotated).unwrap();
    }
}
