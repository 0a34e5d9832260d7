//! WoRMS name-matching responses

use serde_json::Value;

use super::{unsupported, ProviderPage, Standardizer};
use crate::error::ProviderFailure;
use crate::provider::ProviderCode;
use crate::query::QueryOptions;
use crate::schema::RecordKind;

const API_URL: &str = "https://www.marinespecies.org/rest/AphiaRecordByAphiaID";

pub struct WormsStandardizer;

/// Flatten a list of matches, or a list of match lists, into records
pub(super) fn flatten_matches(provider: &str, body: &Value) -> Result<Vec<Value>, ProviderFailure> {
    let outer = body
        .as_array()
        .ok_or_else(|| ProviderFailure::shape(provider, "expected a list of matches"))?;
    let mut records = Vec::new();
    for item in outer {
        match item {
            Value::Array(inner) => records.extend(inner.iter().cloned()),
            Value::Object(_) => records.push(item.clone()),
            _ => {},
        }
    }
    Ok(records)
}

/// Only `accepted` records pass when accepted names are requested
fn status_is_accepted(raw: &Value, options: &QueryOptions) -> bool {
    !options.is_accepted
        || raw
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|status| status.eq_ignore_ascii_case("accepted"))
}

impl Standardizer for WormsStandardizer {
    fn provider(&self) -> ProviderCode {
        ProviderCode::Worms
    }

    fn record_format(&self, _kind: RecordKind) -> &'static str {
        "https://www.marinespecies.org/rest/"
    }

    fn unpack(
        &self,
        kind: RecordKind,
        body: &Value,
        _options: &QueryOptions,
    ) -> Result<ProviderPage, ProviderFailure> {
        if kind != RecordKind::Name {
            return Err(unsupported(self.provider(), kind));
        }
        // WoRMS answers 204 with no body when nothing matches
        if body.is_null() {
            return Ok(ProviderPage::default());
        }
        flatten_matches(self.provider().as_str(), body).map(ProviderPage::complete)
    }

    fn accept(&self, _kind: RecordKind, raw: &Value, options: &QueryOptions) -> bool {
        status_is_accepted(raw, options)
    }

    fn api_url(&self, _kind: RecordKind, id: &str) -> Option<String> {
        Some(format!("{}/{}", API_URL, id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unpack_flattens_nested_lists() {
        let body = json!([[{"AphiaID": 1}, {"AphiaID": 2}], [{"AphiaID": 3}]]);
        let page = WormsStandardizer
            .unpack(RecordKind::Name, &body, &QueryOptions::default())
            .unwrap();
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_unpack_no_content() {
        let page = WormsStandardizer
            .unpack(RecordKind::Name, &Value::Null, &QueryOptions::default())
            .unwrap();
        assert!(page.records.is_empty());
    }

    #[test]
    fn test_unpack_object_is_unexpected() {
        let err = WormsStandardizer
            .unpack(RecordKind::Name, &json!({"AphiaID": 1}), &QueryOptions::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("Unexpected worms response"));
    }

    #[test]
    fn test_accept_status() {
        let options = QueryOptions {
            is_accepted: true,
            ..Default::default()
        };
        assert!(WormsStandardizer.accept(RecordKind::Name, &json!({"status": "accepted"}), &options));
        assert!(!WormsStandardizer.accept(RecordKind::Name, &json!({"status": "unaccepted"}), &options));
        assert!(!WormsStandardizer.accept(RecordKind::Name, &json!({}), &options));
    }

    #[test]
    fn test_api_url() {
        assert_eq!(
            WormsStandardizer.api_url(RecordKind::Name, "141433").as_deref(),
            Some("https://www.marinespecies.org/rest/AphiaRecordByAphiaID/141433")
        );
    }
}
