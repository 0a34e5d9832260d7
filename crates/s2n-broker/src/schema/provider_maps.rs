//! Field maps of the built-in providers
//!
//! Maps that mirror a provider's own Darwin Core naming are generated by
//! walking the canonical schema, so they follow its order.

use crate::provider::ProviderCode;
use crate::schema::{
    CanonicalSchema, Derivation, FieldSource, Namespace, ProviderFieldMap, RecordKind,
};

fn is_darwin_or_dublin_core(namespace: Namespace) -> bool {
    matches!(namespace, Namespace::Dwc | Namespace::Dcterms)
}

/// GBIF occurrence API records use bare Darwin Core names
pub fn gbif_occurrence(schema: &CanonicalSchema) -> ProviderFieldMap {
    let mut map = ProviderFieldMap::new(ProviderCode::Gbif, RecordKind::Occurrence);
    for field in schema.fields() {
        map = match field.as_str() {
            "s2n:view_url" => map.derive(field.as_str(), Derivation::ViewUrl(FieldSource::key("key"))),
            "s2n:api_url" => map.derive(field.as_str(), Derivation::ApiUrl(FieldSource::key("key"))),
            "s2n:issues" => map.derive(field.as_str(), Derivation::Issues(FieldSource::key("issues"))),
            _ if is_darwin_or_dublin_core(field.namespace())
                || field.namespace() == Namespace::Gbif =>
            {
                map.copy(field.as_str(), field.name())
            },
            _ => map,
        };
    }
    map
}

/// GBIF species match records
pub fn gbif_name() -> ProviderFieldMap {
    ProviderFieldMap::new(ProviderCode::Gbif, RecordKind::Name)
        .derive("s2n:view_url", Derivation::ViewUrl(FieldSource::key("usageKey")))
        .derive("s2n:api_url", Derivation::ApiUrl(FieldSource::key("usageKey")))
        .copy("s2n:status", "status")
        .copy("s2n:scientific_name", "scientificName")
        .copy("s2n:canonical_name", "canonicalName")
        .copy("s2n:kingdom", "kingdom")
        .copy("s2n:rank", "rank")
        .derive("s2n:hierarchy", Derivation::RankHierarchy)
        .copy("s2n:gbif_confidence", "confidence")
        .copy("s2n:gbif_taxon_key", "usageKey")
}

/// iDigBio keeps fully qualified Darwin Core names under `data`
pub fn idigbio_occurrence(schema: &CanonicalSchema) -> ProviderFieldMap {
    let mut map = ProviderFieldMap::new(ProviderCode::Idigbio, RecordKind::Occurrence);
    for field in schema.fields() {
        map = match field.as_str() {
            "s2n:view_url" => map.derive(field.as_str(), Derivation::ViewUrl(FieldSource::key("uuid"))),
            "s2n:api_url" => map.derive(field.as_str(), Derivation::ApiUrl(FieldSource::key("uuid"))),
            "s2n:issues" => map.derive(
                field.as_str(),
                Derivation::Issues(FieldSource::nested(&["indexTerms", "flags"])),
            ),
            "idigbio:uuid" => map.copy(field.as_str(), "uuid"),
            _ if is_darwin_or_dublin_core(field.namespace()) => map.copy_from(
                field.as_str(),
                vec![FieldSource::nested(&["data", field.as_str()])],
            ),
            _ => map,
        };
    }
    map
}

/// Specify 7 exports key values by term URI under `core`; cache records use
/// bare names
pub fn specify_occurrence(schema: &CanonicalSchema) -> ProviderFieldMap {
    let mut map = ProviderFieldMap::new(ProviderCode::Specify, RecordKind::Occurrence);
    for field in schema.fields() {
        let target = field.as_str();
        map = match (field.namespace(), field.term_uri()) {
            (_, Some(uri)) => {
                let sources = vec![
                    FieldSource::nested(&["core", uri.as_str()]),
                    FieldSource::key(field.name()),
                ];
                if matches!(field.name(), "year" | "month" | "day") {
                    map.derive(target, Derivation::Text(sources))
                } else {
                    map.copy_from(target, sources)
                }
            },
            (Namespace::S2n, None) => match field.name() {
                "view_url" | "api_url" => map.copy(target, field.name()),
                "specify_identifier" => map.copy(target, "identifier"),
                _ => map,
            },
            _ => map,
        };
    }
    map
}

/// Specify GUID resolver records
pub fn specify_resolved() -> ProviderFieldMap {
    ProviderFieldMap::new(ProviderCode::Specify, RecordKind::Resolved)
        .copy("s2n:ident", "id")
        .copy("s2n:dataset_guid", "dataset_guid")
        .copy("dwc:institutionCode", "who")
        .copy("dwc:basisOfRecord", "what")
        .copy("s2n:date", "when")
        .copy("s2n:ark", "where")
        .copy("s2n:api_url", "url")
}

pub fn morphosource_occurrence() -> ProviderFieldMap {
    ProviderFieldMap::new(ProviderCode::MorphoSource, RecordKind::Occurrence)
        .derive(
            "s2n:view_url",
            Derivation::ViewUrl(FieldSource::key("specimen.specimen_id")),
        )
        .derive(
            "s2n:api_url",
            Derivation::ApiUrl(FieldSource::key("specimen.occurrence_id")),
        )
        .copy("dwc:occurrenceID", "specimen.occurrence_id")
        .copy("dwc:institutionCode", "specimen.institution_code")
        .copy("dwc:catalogNumber", "specimen.catalog_number")
        .copy("idigbio:uuid", "specimen.uuid")
        .copy("mopho:specimen.specimen_id", "specimen.specimen_id")
}

/// ITIS Solr documents
pub fn itis_name() -> ProviderFieldMap {
    ProviderFieldMap::new(ProviderCode::Itis, RecordKind::Name)
        .derive("s2n:view_url", Derivation::ViewUrl(FieldSource::key("tsn")))
        .derive("s2n:api_url", Derivation::ApiUrl(FieldSource::key("tsn")))
        .copy("s2n:status", "usage")
        .copy("s2n:scientific_name", "nameWTaxonAuthor")
        .copy("s2n:canonical_name", "nameWOInd")
        .derive(
            "s2n:common_names",
            Derivation::VernacularNames(FieldSource::key("vernacular")),
        )
        .copy("s2n:kingdom", "kingdom")
        .copy("s2n:rank", "rank")
        .derive(
            "s2n:synonyms",
            Derivation::DelimitedNames(FieldSource::key("synonyms")),
        )
        .derive(
            "s2n:hierarchy",
            Derivation::EncodedHierarchy(FieldSource::key("hierarchySoFarWRanks")),
        )
        .copy("s2n:itis_tsn", "tsn")
        .copy("s2n:itis_credibility", "credibilityRating")
}

/// WoRMS Aphia records
pub fn worms_name() -> ProviderFieldMap {
    ProviderFieldMap::new(ProviderCode::Worms, RecordKind::Name)
        .copy("s2n:view_url", "url")
        .derive("s2n:api_url", Derivation::ApiUrl(FieldSource::key("valid_AphiaID")))
        .copy("s2n:status", "status")
        .derive(
            "s2n:scientific_name",
            Derivation::AuthoredName {
                valid_name: FieldSource::key("valid_name"),
                name: FieldSource::key("scientificname"),
                valid_authority: FieldSource::key("valid_authority"),
                authority: FieldSource::key("authority"),
            },
        )
        .derive(
            "s2n:canonical_name",
            Derivation::AcceptedName {
                valid: FieldSource::key("valid_name"),
                plain: FieldSource::key("scientificname"),
            },
        )
        .copy("s2n:kingdom", "kingdom")
        .copy("s2n:rank", "rank")
        .derive("s2n:hierarchy", Derivation::RankHierarchy)
        .copy("s2n:worms_aphia_id", "AphiaID")
        .copy("s2n:worms_match_type", "match_type")
}

/// IPNI name records
pub fn ipni_name() -> ProviderFieldMap {
    ProviderFieldMap::new(ProviderCode::Ipni, RecordKind::Name)
        .derive("s2n:view_url", Derivation::ViewUrl(FieldSource::key("url")))
        .derive("s2n:api_url", Derivation::ApiUrl(FieldSource::key("fqId")))
        .derive(
            "s2n:scientific_name",
            Derivation::AuthoredName {
                valid_name: FieldSource::key("valid_name"),
                name: FieldSource::key("name"),
                valid_authority: FieldSource::key("valid_authority"),
                authority: FieldSource::key("authors"),
            },
        )
        .derive(
            "s2n:canonical_name",
            Derivation::AcceptedName {
                valid: FieldSource::key("valid_name"),
                plain: FieldSource::key("name"),
            },
        )
        .copy("s2n:rank", "rank")
        .derive("s2n:hierarchy", Derivation::RankHierarchy)
}

/// Lifemapper projection records
pub fn lifemapper_map() -> ProviderFieldMap {
    ProviderFieldMap::new(ProviderCode::Lifemapper, RecordKind::Map)
        .copy("s2n:api_url", "url")
        .derive(
            "s2n:endpoint",
            Derivation::Joined {
                base: FieldSource::nested(&["map", "endpoint"]),
                tail: FieldSource::nested(&["map", "mapName"]),
            },
        )
        .derive(
            "s2n:data_link",
            Derivation::TrimSuffix {
                source: FieldSource::nested(&["spatialRaster", "dataUrl"]),
                suffix: "/gtiff",
            },
        )
        .copy_from(
            "s2n:sdm_projection_scenario_code",
            vec![FieldSource::nested(&["projectionScenario", "code"])],
        )
        .copy_from(
            "s2n:sdm_projection_scenario_link",
            vec![FieldSource::nested(&["projectionScenario", "metadataUrl"])],
        )
        .derive(
            "s2n:layer_type",
            Derivation::Classify(vec![
                (FieldSource::key("spatialRaster"), "raster"),
                (FieldSource::key("spatialVector"), "vector"),
            ]),
        )
        .copy_from(
            "s2n:layer_name",
            vec![FieldSource::nested(&["map", "layerName"])],
        )
        .copy_from(
            "s2n:point_count",
            vec![FieldSource::nested(&["spatialVector", "numFeatures"])],
        )
        .copy_from(
            "s2n:point_bbox",
            vec![FieldSource::nested(&["spatialVector", "bbox"])],
        )
        .copy("s2n:species_name", "speciesName")
        .copy("s2n:status", "status")
        .copy_from(
            "s2n:modtime",
            vec![FieldSource::key("statusModTime"), FieldSource::key("modtime")],
        )
        .derive("s2n:vendor_specific_parameters", Derivation::VendorParameters)
}
