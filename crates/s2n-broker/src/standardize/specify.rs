//! Specify portal records and GUID resolver entries

use serde_json::Value;

use super::{count_at, list_at, unsupported, ProviderPage, Standardizer};
use crate::error::ProviderFailure;
use crate::provider::ProviderCode;
use crate::query::QueryOptions;
use crate::schema::{Absence, RecordKind};

pub struct SpecifyStandardizer;

/// Wrap a single object record, `null` or `{}` meaning no record
fn single_record(body: &Value, what: &str) -> Result<ProviderPage, ProviderFailure> {
    match body {
        Value::Null => Ok(ProviderPage::default()),
        Value::Object(object) if object.is_empty() => Ok(ProviderPage::default()),
        Value::Object(_) => Ok(ProviderPage::complete(vec![body.clone()])),
        _ => Err(ProviderFailure::shape("specify", format!("{} is not an object", what))),
    }
}

impl Standardizer for SpecifyStandardizer {
    fn provider(&self) -> ProviderCode {
        ProviderCode::Specify
    }

    fn absence(&self) -> Absence {
        Absence::Falsy
    }

    fn record_format(&self, kind: RecordKind) -> &'static str {
        match kind {
            RecordKind::Resolved => "https://github.com/specify/specify_resolver",
            _ => "http://rs.tdwg.org/dwc.json",
        }
    }

    /// A portal answers with a single record, Specify 7 nests it under `core`
    fn unpack(
        &self,
        kind: RecordKind,
        body: &Value,
        _options: &QueryOptions,
    ) -> Result<ProviderPage, ProviderFailure> {
        match kind {
            RecordKind::Occurrence => match body.get("core") {
                Some(Value::Object(core)) if core.is_empty() => Ok(ProviderPage::default()),
                Some(Value::Object(_)) => Ok(ProviderPage::complete(vec![body.clone()])),
                Some(_) => Err(ProviderFailure::shape("specify", "core is not an object")),
                None => single_record(body, "record"),
            },
            RecordKind::Resolved => {
                if body.get("results").is_some() {
                    let records = list_at(self.provider(), body, "results")?;
                    let total = count_at(body, "count").unwrap_or(records.len() as u64);
                    Ok(ProviderPage::new(total, records))
                } else {
                    single_record(body, "resolver entry")
                }
            },
            _ => Err(unsupported(self.provider(), kind)),
        }
    }
}
