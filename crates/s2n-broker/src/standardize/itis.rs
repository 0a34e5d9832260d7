//! ITIS Solr responses

use serde_json::Value;

use super::{count_at, list_at, unsupported, ProviderPage, Standardizer};
use crate::error::ProviderFailure;
use crate::provider::ProviderCode;
use crate::query::QueryOptions;
use crate::schema::RecordKind;

const REPORT_URL: &str = "https://www.itis.gov/servlet/SingleRpt/SingleRpt?search_topic=TSN&search_value=";
const SOLR_URL: &str = "https://services.itis.gov/?q=tsn:";

pub struct ItisStandardizer;

impl Standardizer for ItisStandardizer {
    fn provider(&self) -> ProviderCode {
        ProviderCode::Itis
    }

    fn record_format(&self, _kind: RecordKind) -> &'static str {
        "https://www.itis.gov/solr_documentation.html"
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
        let response = body
            .get("response")
            .ok_or_else(|| ProviderFailure::shape("itis", "no 'response' object"))?;
        let records = list_at(self.provider(), response, "docs")?;
        let total = count_at(response, "numFound").unwrap_or(records.len() as u64);
        Ok(ProviderPage::new(total, records))
    }

    fn accept(&self, _kind: RecordKind, raw: &Value, options: &QueryOptions) -> bool {
        if options.is_accepted {
            let usage = raw.get("usage").and_then(Value::as_str).unwrap_or_default();
            if !(usage.eq_ignore_ascii_case("valid") || usage.eq_ignore_ascii_case("accepted")) {
                return false;
            }
        }
        match &options.kingdom {
            Some(kingdom) => raw
                .get("kingdom")
                .and_then(Value::as_str)
                .is_some_and(|k| k.eq_ignore_ascii_case(kingdom)),
            None => true,
        }
    }

    fn view_url(&self, _kind: RecordKind, id: &str) -> Option<String> {
        Some(format!("{}{}", REPORT_URL, id))
    }

    fn api_url(&self, _kind: RecordKind, id: &str) -> Option<String> {
        Some(format!("{}{}", SOLR_URL, id))
    }
}
