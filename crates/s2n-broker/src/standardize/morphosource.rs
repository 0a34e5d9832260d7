//! MorphoSource specimen search responses

use serde_json::Value;

use super::{count_at, list_at, unsupported, ProviderPage, Standardizer};
use crate::error::ProviderFailure;
use crate::provider::ProviderCode;
use crate::query::QueryOptions;
use crate::schema::{Absence, RecordKind};

const VIEW_URL: &str = "https://www.morphosource.org/concern/biological_specimens/";
const API_URL: &str = "https://ms1.morphosource.org/api/v1/find/specimens?start=0&limit=1000&q=occurrence_id%3A";

/// Specimen ids in page URLs are `S<id>` left padded with zeros
const SPECIMEN_ID_WIDTH: usize = 9;

pub struct MorphoSourceStandardizer;

impl Standardizer for MorphoSourceStandardizer {
    fn provider(&self) -> ProviderCode {
        ProviderCode::MorphoSource
    }

    fn absence(&self) -> Absence {
        Absence::Falsy
    }

    fn record_format(&self, _kind: RecordKind) -> &'static str {
        "https://www.morphosource.org/About/API"
    }

    fn unpack(
        &self,
        kind: RecordKind,
        body: &Value,
        _options: &QueryOptions,
    ) -> Result<ProviderPage, ProviderFailure> {
        if kind != RecordKind::Occurrence {
            return Err(unsupported(self.provider(), kind));
        }
        let records = list_at(self.provider(), body, "results")?;
        let total = count_at(body, "totalResults").unwrap_or(records.len() as u64);
        Ok(ProviderPage::new(total, records))
    }

    fn view_url(&self, _kind: RecordKind, id: &str) -> Option<String> {
        let specimen = format!("S{}", id);
        Some(format!(
            "{}{:0>width$}",
            VIEW_URL,
            specimen,
            width = SPECIMEN_ID_WIDTH
        ))
    }

    fn api_url(&self, _kind: RecordKind, id: &str) -> Option<String> {
        Some(format!("{}{}", API_URL, id))
    }
}
