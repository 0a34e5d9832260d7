//! IPNI plant name search responses

use serde_json::Value;

use super::worms::flatten_matches;
use super::{count_at, list_at, unsupported, ProviderPage, Standardizer};
use crate::error::ProviderFailure;
use crate::provider::ProviderCode;
use crate::query::QueryOptions;
use crate::schema::RecordKind;

const WEB_URL: &str = "https://www.ipni.org";
const API_URL: &str = "https://beta.ipni.org/api/1/n";

pub struct IpniStandardizer;

impl Standardizer for IpniStandardizer {
    fn provider(&self) -> ProviderCode {
        ProviderCode::Ipni
    }

    fn record_format(&self, _kind: RecordKind) -> &'static str {
        "https://www.ipni.org/"
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
        if body.is_array() {
            return flatten_matches(self.provider().as_str(), body).map(ProviderPage::complete);
        }
        let records = list_at(self.provider(), body, "results")?;
        let total = count_at(body, "totalResults").unwrap_or(records.len() as u64);
        Ok(ProviderPage::new(total, records))
    }

    /// `id` is the site-relative path IPNI reports in `url`
    fn view_url(&self, _kind: RecordKind, id: &str) -> Option<String> {
        if id.starts_with("http") {
            return Some(id.to_string());
        }
        Some(format!("{}/{}", WEB_URL, id.trim_start_matches('/')))
    }

    fn api_url(&self, _kind: RecordKind, id: &str) -> Option<String> {
        Some(format!("{}/{}", API_URL, id))
    }
}
