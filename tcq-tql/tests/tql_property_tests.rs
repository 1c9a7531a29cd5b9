//! Property-Based Tests for Indicator Detection and TQL Building
//!
//! Hex strings classify by length, plain text always lands inside a
//! `summary in (...)` clause, and URL encoding decodes back to its input.

use proptest::prelude::*;
use tcq_core::{SearchFilters, SearchKind};
use tcq_tql::{
    build_filtered_query, build_simple_query, detect_indicator_type, encode_for_url,
    validate_tql, IndicatorKind, QueryError,
};

proptest! {
    #[test]
    fn hex_digests_are_files(hex in "[a-f0-9]{32}|[a-f0-9]{40}|[a-f0-9]{64}") {
        prop_assert_eq!(detect_indicator_type(&hex), Some(IndicatorKind::File));
    }

    #[test]
    fn dotted_quads_are_addresses(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
        let ip = format!("{}.{}.{}.{}", a, b, c, d);
        prop_assert_eq!(detect_indicator_type(&ip), Some(IndicatorKind::Address));
    }

    #[test]
    fn simple_indicator_query_always_targets_summary(text in "[a-zA-Z0-9 ._@-]{1,40}") {
        let q = build_simple_query(&text, SearchKind::Indicators, true).unwrap();
        let summary_clause = format!("summary in (\"{}\")", text);
        prop_assert!(q.ends_with(&summary_clause));
    }

    #[test]
    fn simple_group_query_targets_name(text in "[a-zA-Z0-9 ]{1,40}") {
        let q = build_simple_query(&text, SearchKind::Groups, true).unwrap();
        prop_assert_eq!(q, format!("name in (\"{}\")", text));
    }

    #[test]
    fn simple_query_never_supports_both(text in ".{0,40}", auto in any::<bool>()) {
        let is_invalid = matches!(
            build_simple_query(&text, SearchKind::Both, auto),
            Err(QueryError::InvalidQuery(_))
        );
        prop_assert!(is_invalid);
    }

    #[test]
    fn tag_filters_produce_one_clause_per_tag(tags in prop::collection::hash_set("[a-z0-9]{1,12}", 1..6)) {
        let mut filters = SearchFilters::new();
        for tag in &tags {
            filters = filters.with_tag(tag.clone());
        }
        let q = build_filtered_query(None, &filters, SearchKind::Indicators).unwrap();
        prop_assert_eq!(q.matches("tag in (").count(), tags.len());
        prop_assert_eq!(q.matches(" and ").count(), tags.len() - 1);
    }

    #[test]
    fn built_queries_pass_validation(text in "[a-zA-Z0-9 ._@-]{1,40}", rating in 0.0f64..=5.0) {
        let base = build_simple_query(&text, SearchKind::Indicators, true).unwrap();
        let filters = SearchFilters::new().with_rating(Some(rating), None);
        let q = build_filtered_query(Some(&base), &filters, SearchKind::Indicators).unwrap();
        prop_assert!(validate_tql(&q).is_ok());
    }

    #[test]
    fn url_encoding_decodes_to_input(query in ".{0,80}") {
        let encoded = encode_for_url(&query);
        let decoded = urlencoding::decode(&encoded).unwrap();
        prop_assert_eq!(decoded.as_ref(), query.as_str());
    }
}
