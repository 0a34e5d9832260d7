//! Properties every provider and every aggregation must satisfy

mod common;

use std::time::Duration;

use common::{MockFetcher, Outcome};
use proptest::prelude::*;
use proptest::sample::select;
use s2n_broker::envelope::validate_response;
use s2n_broker::{
    Aggregator, BrokerConfig, FetchResponse, ProviderCode, Query, QueryOptions, SchemaRegistry,
    Service, StandardizerTable,
};
use serde_json::{json, Map, Value};

/// Keys providers actually send, so generated records hit real map sources
const NATIVE_KEYS: &[&str] = &[
    "key",
    "usageKey",
    "scientificName",
    "canonicalName",
    "kingdom",
    "Kingdom",
    "phylum",
    "Division",
    "family",
    "Genus",
    "species",
    "status",
    "rank",
    "confidence",
    "issues",
    "datasetKey",
    "catalogNumber",
    "uuid",
    "data",
    "indexTerms",
    "core",
    "tsn",
    "usage",
    "nameWTaxonAuthor",
    "vernacular",
    "synonyms",
    "hierarchySoFarWRanks",
    "valid_name",
    "valid_authority",
    "authority",
    "AphiaID",
    "match_type",
    "url",
    "fqId",
    "name",
    "authors",
    "map",
    "spatialRaster",
    "spatialVector",
    "specimen.specimen_id",
    "specimen.occurrence_id",
    "id",
    "who",
    "what",
    "when",
    "where",
];

fn raw_key() -> impl Strategy<Value = String> {
    prop_oneof![
        select(NATIVE_KEYS).prop_map(str::to_string),
        "[a-zA-Z_:.]{1,12}",
    ]
}

fn raw_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9:$ /]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(2, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(raw_key(), inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

fn raw_record() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(raw_key(), raw_value(), 0..12)
        .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<_, _>>()))
}

// ============================================================================
// Schema closure
// ============================================================================

#[test]
fn test_every_map_target_is_canonical() {
    let registry = SchemaRegistry::build().unwrap();
    let mut checked = 0;
    for map in registry.provider_maps() {
        let schema = registry.get_canonical_fields(map.kind()).unwrap();
        for target in map.targets() {
            assert!(
                schema.contains(target),
                "{} {} map targets non-canonical field {}",
                map.provider(),
                map.kind(),
                target
            );
        }
        checked += 1;
    }
    assert!(checked >= 9);
}

#[test]
fn test_every_offered_service_has_a_map() {
    let registry = SchemaRegistry::build().unwrap();
    for provider in ProviderCode::ALL {
        for service in provider.descriptor().services {
            if let Some(kind) = service.record_kind() {
                assert!(registry.has_map(provider, kind), "{} has no {} map", provider, kind);
            }
        }
    }
}

// ============================================================================
// No leakage
// ============================================================================

proptest! {
    #[test]
    fn property_standardized_keys_are_canonical(
        raw in raw_record(),
        is_accepted in any::<bool>(),
        color in proptest::option::of("#[0-9a-f]{6}"),
    ) {
        let registry = SchemaRegistry::build().unwrap();
        let table = StandardizerTable::with_defaults();
        let options = QueryOptions {
            is_accepted,
            color,
            ..Default::default()
        };

        for map in registry.provider_maps() {
            let schema = registry.get_canonical_fields(map.kind()).unwrap();
            let record = table
                .standardize(&registry, map.provider(), &raw, map.kind(), &options)
                .unwrap();
            for key in record.keys() {
                prop_assert!(
                    schema.contains(key),
                    "{} leaked {} into a {} record",
                    map.provider(),
                    key,
                    map.kind()
                );
                prop_assert!(map.get(key).is_some());
            }
        }
    }
}

// ============================================================================
// Order preservation
// ============================================================================

fn empty_page(provider: ProviderCode) -> Value {
    match provider {
        ProviderCode::Gbif => json!({"count": 0, "results": []}),
        ProviderCode::Specify => json!({}),
        ProviderCode::Idigbio => json!({"itemCount": 0, "items": []}),
        _ => json!({"totalResults": 0, "results": []}),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn property_aggregate_preserves_provider_order(
        providers in Just(Service::Occurrence.providers()).prop_shuffle(),
        delays in prop::collection::vec(0u64..5000, 4),
        parallel in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap();

        let mut fetcher = MockFetcher::new();
        for (provider, delay) in providers.iter().zip(&delays) {
            fetcher = fetcher.with(
                *provider,
                Outcome::Delayed(
                    Duration::from_millis(*delay),
                    FetchResponse::ok(Vec::new(), empty_page(*provider)),
                ),
            );
        }
        let registry = SchemaRegistry::build().unwrap();
        let table = StandardizerTable::with_defaults();
        let config = BrokerConfig {
            parallel,
            ..BrokerConfig::default()
        };
        let aggregator = Aggregator::new(&registry, &table, &fetcher, &config).unwrap();

        let outer = runtime
            .block_on(aggregator.aggregate(&Query::occurrence("abc"), &providers))
            .unwrap();

        let codes: Vec<&str> = outer.records().iter().map(|inner| inner.provider().code.as_str()).collect();
        let expected: Vec<&str> = providers.iter().map(ProviderCode::as_str).collect();
        prop_assert_eq!(codes, expected);
        for inner in outer.records() {
            prop_assert!(inner.errors().is_empty());
        }

        let response = outer.response().unwrap();
        prop_assert!(validate_response(&response).is_ok());
    }
}
