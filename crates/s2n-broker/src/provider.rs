//! Provider descriptors and broker services
//!
//! The descriptor table is static data: one entry per upstream provider with
//! its parameter code, display label and the services it answers.

use serde::{Deserialize, Serialize};

use crate::error::BrokerError;
use crate::schema::RecordKind;

/// Parameter code of an upstream provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderCode {
    #[serde(rename = "gbif")]
    Gbif,
    #[serde(rename = "idb")]
    Idigbio,
    #[serde(rename = "itis")]
    Itis,
    #[serde(rename = "lm")]
    Lifemapper,
    #[serde(rename = "mopho")]
    MorphoSource,
    #[serde(rename = "specify")]
    Specify,
    #[serde(rename = "worms")]
    Worms,
    #[serde(rename = "ipni")]
    Ipni,
}

impl ProviderCode {
    pub const ALL: [ProviderCode; 8] = [
        ProviderCode::Gbif,
        ProviderCode::Idigbio,
        ProviderCode::Itis,
        ProviderCode::Lifemapper,
        ProviderCode::MorphoSource,
        ProviderCode::Specify,
        ProviderCode::Worms,
        ProviderCode::Ipni,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderCode::Gbif => "gbif",
            ProviderCode::Idigbio => "idb",
            ProviderCode::Itis => "itis",
            ProviderCode::Lifemapper => "lm",
            ProviderCode::MorphoSource => "mopho",
            ProviderCode::Specify => "specify",
            ProviderCode::Worms => "worms",
            ProviderCode::Ipni => "ipni",
        }
    }

    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        // Table order matches ALL
        &DESCRIPTORS[*self as usize]
    }
}

impl std::str::FromStr for ProviderCode {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        ProviderCode::ALL
            .into_iter()
            .find(|p| p.as_str() == code)
            .ok_or_else(|| BrokerError::UnknownProvider(s.to_string()))
    }
}

impl std::fmt::Display for ProviderCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint family answered by the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    #[serde(rename = "occ")]
    Occurrence,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "map")]
    Map,
    #[serde(rename = "resolve")]
    Resolve,
    #[serde(rename = "badge")]
    Badge,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Occurrence => "occ",
            Service::Name => "name",
            Service::Map => "map",
            Service::Resolve => "resolve",
            Service::Badge => "badge",
        }
    }

    /// Record kind carried by this service's envelopes, `None` for badge
    pub fn record_kind(&self) -> Option<RecordKind> {
        match self {
            Service::Occurrence => Some(RecordKind::Occurrence),
            Service::Name => Some(RecordKind::Name),
            Service::Map => Some(RecordKind::Map),
            Service::Resolve => Some(RecordKind::Resolved),
            Service::Badge => None,
        }
    }

    /// Record format of the outer envelope for this service
    pub fn record_format(&self) -> &'static str {
        match self {
            Service::Occurrence => "Broker occurrence service schema",
            Service::Name => "Broker name service schema",
            Service::Map => "Broker map service schema",
            Service::Resolve => "Broker GUID resolver service schema",
            Service::Badge => "image/png",
        }
    }

    /// Providers answering this service, in descriptor table order
    pub fn providers(&self) -> Vec<ProviderCode> {
        DESCRIPTORS
            .iter()
            .filter(|d| d.offers(*self))
            .map(|d| d.code)
            .collect()
    }
}

impl std::str::FromStr for Service {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "occ" | "occurrence" => Ok(Service::Occurrence),
            "name" => Ok(Service::Name),
            "map" => Ok(Service::Map),
            "resolve" => Ok(Service::Resolve),
            "badge" => Ok(Service::Badge),
            _ => Err(BrokerError::UnknownService(s.to_string())),
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static registry entry for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub code: ProviderCode,
    pub label: &'static str,
    pub services: &'static [Service],
    /// Whether the provider can be queried by dataset key
    pub dataset_queries: bool,
}

impl ProviderDescriptor {
    pub fn offers(&self, service: Service) -> bool {
        self.services.contains(&service)
    }

    /// Badge URL served by the broker's icon endpoint
    pub fn icon_url(&self, icon_api: &str) -> String {
        format!("{}?provider={}&icon_status=active", icon_api, self.code)
    }
}

pub static DESCRIPTORS: [ProviderDescriptor; 8] = [
    ProviderDescriptor {
        code: ProviderCode::Gbif,
        label: "GBIF",
        services: &[Service::Occurrence, Service::Name, Service::Badge],
        dataset_queries: true,
    },
    ProviderDescriptor {
        code: ProviderCode::Idigbio,
        label: "iDigBio",
        services: &[Service::Occurrence, Service::Badge],
        dataset_queries: false,
    },
    ProviderDescriptor {
        code: ProviderCode::Itis,
        label: "ITIS",
        services: &[Service::Name, Service::Badge],
        dataset_queries: false,
    },
    ProviderDescriptor {
        code: ProviderCode::Lifemapper,
        label: "Lifemapper",
        services: &[Service::Map, Service::Badge],
        dataset_queries: false,
    },
    ProviderDescriptor {
        code: ProviderCode::MorphoSource,
        label: "MorphoSource",
        services: &[Service::Occurrence, Service::Badge],
        dataset_queries: false,
    },
    ProviderDescriptor {
        code: ProviderCode::Specify,
        label: "Specify",
        services: &[Service::Occurrence, Service::Resolve, Service::Badge],
        dataset_queries: false,
    },
    ProviderDescriptor {
        code: ProviderCode::Worms,
        label: "WoRMS",
        services: &[Service::Name, Service::Badge],
        dataset_queries: false,
    },
    ProviderDescriptor {
        code: ProviderCode::Ipni,
        label: "IPNI",
        services: &[Service::Name, Service::Badge],
        dataset_queries: false,
    },
];

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_lookup_matches_code() {
        for code in ProviderCode::ALL {
            assert_eq!(code.descriptor().code, code);
        }
    }

    #[test]
    fn test_provider_code_from_str() {
        assert_eq!("IDB".parse::<ProviderCode>().unwrap(), ProviderCode::Idigbio);
        assert_eq!(" lm ".parse::<ProviderCode>().unwrap(), ProviderCode::Lifemapper);
        assert!("bison".parse::<ProviderCode>().is_err());
    }

    #[test]
    fn test_provider_code_serializes_as_param() {
        let json = serde_json::to_string(&ProviderCode::MorphoSource).unwrap();
        assert_eq!(json, "\"mopho\"");
    }

    #[test]
    fn test_service_providers_in_table_order() {
        assert_eq!(
            Service::Occurrence.providers(),
            vec![
                ProviderCode::Gbif,
                ProviderCode::Idigbio,
                ProviderCode::MorphoSource,
                ProviderCode::Specify
            ]
        );
        assert_eq!(
            Service::Name.providers(),
            vec![
                ProviderCode::Gbif,
                ProviderCode::Itis,
                ProviderCode::Worms,
                ProviderCode::Ipni
            ]
        );
        assert_eq!(Service::Badge.providers().len(), 8);
    }

    #[test]
    fn test_service_record_kinds() {
        assert_eq!(Service::Map.record_kind(), Some(RecordKind::Map));
        assert_eq!(Service::Resolve.record_kind(), Some(RecordKind::Resolved));
        assert_eq!(Service::Badge.record_kind(), None);
    }

    #[test]
    fn test_icon_url() {
        let url = ProviderCode::Gbif
            .descriptor()
            .icon_url("https://broker.spcoco.org/api/v1/badge");
        assert_eq!(
            url,
            "https://broker.spcoco.org/api/v1/badge?provider=gbif&icon_status=active"
        );
    }
}
