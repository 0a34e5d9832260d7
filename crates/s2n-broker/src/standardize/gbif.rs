//! GBIF occurrence and species-match responses

use serde_json::Value;

use super::{count_at, list_at, unsupported, ProviderPage, StandardizedRecord, Standardizer};
use crate::error::ProviderFailure;
use crate::provider::ProviderCode;
use crate::query::QueryOptions;
use crate::schema::RecordKind;

const WEB_URL: &str = "https://www.gbif.org";
const API_URL: &str = "https://api.gbif.org/v1";

pub struct GbifStandardizer;

impl GbifStandardizer {
    fn resource(kind: RecordKind) -> Option<&'static str> {
        match kind {
            RecordKind::Occurrence => Some("occurrence"),
            RecordKind::Name => Some("species"),
            _ => None,
        }
    }

    /// The match itself, then its alternatives; `matchType: NONE` has no match
    fn match_candidates(body: &Value) -> Vec<Value> {
        let mut candidates = Vec::new();
        let matched = body
            .get("matchType")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.eq_ignore_ascii_case("NONE"));
        if matched || body.get("usageKey").is_some() {
            let mut main = body.clone();
            if let Some(object) = main.as_object_mut() {
                object.remove("alternatives");
            }
            candidates.push(main);
        }
        if let Some(alternatives) = body.get("alternatives").and_then(Value::as_array) {
            candidates.extend(alternatives.iter().cloned());
        }
        candidates
    }
}

impl Standardizer for GbifStandardizer {
    fn provider(&self) -> ProviderCode {
        ProviderCode::Gbif
    }

    fn record_format(&self, kind: RecordKind) -> &'static str {
        match kind {
            RecordKind::Name => "https://www.gbif.org/developer/species",
            _ => "https://www.gbif.org/developer/occurrence",
        }
    }

    fn unpack(
        &self,
        kind: RecordKind,
        body: &Value,
        options: &QueryOptions,
    ) -> Result<ProviderPage, ProviderFailure> {
        match kind {
            RecordKind::Occurrence => {
                let records = list_at(self.provider(), body, "results")?;
                let total = count_at(body, "count").unwrap_or(records.len() as u64);
                Ok(ProviderPage::new(total, records))
            },
            RecordKind::Name => {
                if !body.is_object() {
                    return Err(ProviderFailure::shape("gbif", "species match is not an object"));
                }
                let best = Self::match_candidates(body)
                    .into_iter()
                    .find(|candidate| self.accept(kind, candidate, options));
                Ok(ProviderPage::complete(best.into_iter().collect()))
            },
            _ => Err(unsupported(self.provider(), kind)),
        }
    }

    fn accept(&self, kind: RecordKind, raw: &Value, options: &QueryOptions) -> bool {
        if kind != RecordKind::Name || !options.is_accepted {
            return true;
        }
        raw.get("status")
            .and_then(Value::as_str)
            .is_some_and(|status| status.eq_ignore_ascii_case("ACCEPTED"))
    }

    fn view_url(&self, kind: RecordKind, id: &str) -> Option<String> {
        Self::resource(kind).map(|resource| format!("{}/{}/{}", WEB_URL, resource, id))
    }

    fn api_url(&self, kind: RecordKind, id: &str) -> Option<String> {
        Self::resource(kind).map(|resource| format!("{}/{}/{}", API_URL, resource, id))
    }

    fn occurrence_count_key(&self, record: &StandardizedRecord) -> Option<String> {
        match record.get("s2n:gbif_taxon_key")? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    fn occurrence_search_url(&self, taxon_key: &str) -> Option<String> {
        Some(format!("{}/occurrence/search?taxon_key={}", WEB_URL, taxon_key))
    }
}
