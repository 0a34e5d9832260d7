//! Lifemapper species distribution map layers

use serde_json::Value;

use super::{count_at, list_at, unsupported, ProviderPage, Standardizer};
use crate::error::ProviderFailure;
use crate::provider::ProviderCode;
use crate::query::QueryOptions;
use crate::schema::{Absence, RecordKind};

/// Lifemapper status of a finished computation
pub const COMPLETE_STATUS: u64 = 300;

const MAP_KEYS: [&str; 3] = ["endpoint", "mapName", "layerName"];

pub struct LifemapperStandardizer;

impl Standardizer for LifemapperStandardizer {
    fn provider(&self) -> ProviderCode {
        ProviderCode::Lifemapper
    }

    fn absence(&self) -> Absence {
        Absence::Falsy
    }

    fn record_format(&self, _kind: RecordKind) -> &'static str {
        "http://svc.lifemapper.org/api/v2/"
    }

    fn unpack(
        &self,
        kind: RecordKind,
        body: &Value,
        _options: &QueryOptions,
    ) -> Result<ProviderPage, ProviderFailure> {
        if kind != RecordKind::Map {
            return Err(unsupported(self.provider(), kind));
        }
        if let Some(layers) = body.as_array() {
            return Ok(ProviderPage::complete(layers.clone()));
        }
        let records = list_at(self.provider(), body, "results")?;
        let total = count_at(body, "count").unwrap_or(records.len() as u64);
        Ok(ProviderPage::new(total, records))
    }

    /// Complete layers with map information, in a requested scenario
    fn accept(&self, _kind: RecordKind, raw: &Value, options: &QueryOptions) -> bool {
        if raw.get("status").and_then(Value::as_u64) != Some(COMPLETE_STATUS) {
            return false;
        }
        let Some(map) = raw.get("map") else {
            return false;
        };
        if MAP_KEYS.iter().any(|key| map.get(*key).is_none()) {
            return false;
        }
        if options.scenario_codes.is_empty() {
            return true;
        }
        match raw.pointer("/projectionScenario/code").and_then(Value::as_str) {
            Some(code) => options.scenario_codes.iter().any(|wanted| wanted == code),
            None => true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer(status: u64, scenario: &str) -> Value {
        json!({
            "status": status,
            "map": {"endpoint": "https://lm/maps", "mapName": "prj_1", "layerName": "prj_1"},
            "projectionScenario": {"code": scenario}
        })
    }

    #[test]
    fn test_unpack_list_and_page() {
        let page = LifemapperStandardizer
            .unpack(RecordKind::Map, &json!([layer(300, "worldclim-curr")]), &QueryOptions::default())
            .unwrap();
        assert_eq!(page.total, 1);

        let body = json!({"count": 5, "results": [layer(300, "worldclim-curr")]});
        let page = LifemapperStandardizer
            .unpack(RecordKind::Map, &body, &QueryOptions::default())
            .unwrap();
        assert_eq!(page.total, 5);
    }

    #[test]
    fn test_accept_requires_complete_layer() {
        let options = QueryOptions::default();
        assert!(LifemapperStandardizer.accept(RecordKind::Map, &layer(300, "a"), &options));
        assert!(!LifemapperStandardizer.accept(RecordKind::Map, &layer(1000, "a"), &options));
        assert!(!LifemapperStandardizer.accept(RecordKind::Map, &json!({"status": 300}), &options));
    }

    #[test]
    fn test_accept_filters_scenarios() {
        let options = QueryOptions {
            scenario_codes: vec!["worldclim-curr".to_string()],
            ..Default::default()
        };
        assert!(LifemapperStandardizer.accept(RecordKind::Map, &layer(300, "worldclim-curr"), &options));
        assert!(!LifemapperStandardizer.accept(RecordKind::Map, &layer(300, "AR5-CCSM4-RCP8.5-2070"), &options));
    }
}
