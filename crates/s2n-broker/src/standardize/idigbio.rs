//! iDigBio search API responses

use serde_json::Value;

use super::{count_at, list_at, unsupported, ProviderPage, Standardizer};
use crate::error::ProviderFailure;
use crate::provider::ProviderCode;
use crate::query::QueryOptions;
use crate::schema::RecordKind;

const PORTAL_URL: &str = "https://www.idigbio.org/portal/records";
const SEARCH_URL: &str = "https://search.idigbio.org/v2/view/records";

pub struct IdigbioStandardizer;

impl Standardizer for IdigbioStandardizer {
    fn provider(&self) -> ProviderCode {
        ProviderCode::Idigbio
    }

    fn record_format(&self, _kind: RecordKind) -> &'static str {
        "https://github.com/iDigBio/idigbio-search-api/wiki"
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
        let records = list_at(self.provider(), body, "items")?;
        let total = count_at(body, "itemCount").unwrap_or(records.len() as u64);
        Ok(ProviderPage::new(total, records))
    }

    fn view_url(&self, _kind: RecordKind, id: &str) -> Option<String> {
        Some(format!("{}/{}", PORTAL_URL, id))
    }

    fn api_url(&self, _kind: RecordKind, id: &str) -> Option<String> {
        Some(format!("{}/{}", SEARCH_URL, id))
    }
}
