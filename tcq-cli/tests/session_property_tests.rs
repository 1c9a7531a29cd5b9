//! Property-Based Tests for Search Sessions
//!
//! Paging stays inside the result window, page changes hit the backend with
//! the right offset, and back/forward replays visited views.

use proptest::prelude::*;
use std::sync::Arc;
use tcq_cli::history::{NavigationHistory, SearchHistory, SearchHistoryEntry};
use tcq_cli::session::{Location, Screen, SearchSession};
use tcq_client::{ItemRef, SearchEngine};
use tcq_core::{SearchKind, SearchRequest};
use tcq_test_utils::fixtures;
use tcq_test_utils::{MockGroupsEndpoint, MockIndicatorsEndpoint};

struct Harness {
    indicators: Arc<MockIndicatorsEndpoint>,
    groups: Arc<MockGroupsEndpoint>,
    session: SearchSession,
}

fn harness() -> Harness {
    let indicators = Arc::new(MockIndicatorsEndpoint::indicators());
    let groups = Arc::new(MockGroupsEndpoint::groups());
    let session = SearchSession::new(SearchEngine::new(indicators.clone(), groups.clone()));
    Harness {
        indicators,
        groups,
        session,
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_goto_page_without_search_is_none() {
    let mut h = harness();
    assert!(h.session.goto_page(0).await.unwrap().is_none());
    assert!(h.session.next_page().await.unwrap().is_none());
    assert!(h.session.previous_page().await.unwrap().is_none());
    assert!(h.indicators.calls().is_empty());
}

#[tokio::test]
async fn test_paging_through_results() {
    let mut h = harness();
    h.indicators.push_page(fixtures::indicator_items(1, 10), 25, 0, 10);
    h.indicators.push_page(fixtures::indicator_items(11, 10), 25, 10, 10);
    h.indicators.push_page(fixtures::indicator_items(21, 5), 25, 20, 10);

    let request = SearchRequest::paged("evil.com", SearchKind::Indicators, 0, 10).unwrap();
    let first = h.session.search(request).await.unwrap();
    assert_eq!(first.pagination.total_pages, 3);

    let second = h.session.next_page().await.unwrap().unwrap();
    assert_eq!(second.pagination.current_page, 1);
    let third = h.session.next_page().await.unwrap().unwrap();
    assert!(!third.pagination.has_next);
    assert!(h.session.next_page().await.unwrap().is_none());

    let starts: Vec<u64> = h
        .indicators
        .search_calls()
        .iter()
        .map(|c| c.result_start)
        .collect();
    assert_eq!(starts, vec![0, 10, 20]);
    assert_eq!(h.session.current_request().unwrap().page(), 2);
    assert_eq!(h.session.search_history().len(), 1);
}

#[tokio::test]
async fn test_previous_page_from_first_is_none() {
    let mut h = harness();
    h.groups.push_page(fixtures::group_items(1, 3), 3, 0, 10);

    let request = SearchRequest::paged("APT29", SearchKind::Groups, 0, 10).unwrap();
    h.session.search(request).await.unwrap();
    assert!(h.session.previous_page().await.unwrap().is_none());
    assert_eq!(h.groups.search_calls().len(), 1);
}

#[tokio::test]
async fn test_back_and_forward_replay_views() {
    let mut h = harness();
    h.indicators.insert(fixtures::address_indicator(7, "10.0.0.7"));
    h.indicators
        .push_page(vec![fixtures::address_indicator(7, "10.0.0.7").into()], 1, 0, 100);
    h.indicators
        .push_page(vec![fixtures::address_indicator(7, "10.0.0.7").into()], 1, 0, 100);

    let request = SearchRequest::new("10.0.0.7", SearchKind::Indicators);
    h.session.search(request).await.unwrap();
    let item = h.session.open(ItemRef::Indicator(7), false).await.unwrap();
    assert_eq!(item.label(), "10.0.0.7");
    assert_eq!(
        h.session.navigation().current(),
        Some(&Location::Details(ItemRef::Indicator(7)))
    );

    match h.session.back().await.unwrap() {
        Some(Screen::Results(result)) => assert_eq!(result.len(), 1),
        other => panic!("unexpected {:?}", other),
    }
    assert!(h.session.back().await.unwrap().is_none());

    match h.session.forward().await.unwrap() {
        Some(Screen::Details(item)) => assert_eq!(item.id(), 7),
        other => panic!("unexpected {:?}", other),
    }
    assert!(h.session.forward().await.unwrap().is_none());
    assert_eq!(h.indicators.search_calls().len(), 2);
}

#[tokio::test]
async fn test_failed_search_leaves_state_untouched() {
    let mut h = harness();
    let request = SearchRequest::paged("x", SearchKind::Both, 0, 1).unwrap();
    assert!(h.session.search(request).await.is_err());
    assert!(h.session.current_request().is_none());
    assert!(h.session.search_history().is_empty());
    assert!(h.session.navigation().is_empty());
}

proptest! {
    #[test]
    fn goto_page_respects_last_page(
        total in 0u64..500,
        page_size in 1u32..=50,
        target in 0u32..40,
    ) {
        let mut h = harness();
        h.indicators.push_page(fixtures::indicator_items(1, 1), total, 0, page_size);
        let request = SearchRequest::paged("evil.com", SearchKind::Indicators, 0, page_size).unwrap();
        let total_pages = total.div_ceil(u64::from(page_size));

        let rt = runtime();
        let moved = rt.block_on(async {
            h.session.search(request).await.unwrap();
            h.session.goto_page(target).await.unwrap().is_some()
        });

        prop_assert_eq!(moved, u64::from(target) < total_pages);
        let calls = h.indicators.search_calls();
        if moved {
            prop_assert_eq!(calls.len(), 2);
            prop_assert_eq!(calls[1].result_start, u64::from(target) * u64::from(page_size));
        } else {
            prop_assert_eq!(calls.len(), 1);
        }
    }

    #[test]
    fn search_history_never_exceeds_limit(queries in prop::collection::vec("[a-c]{1,2}", 0..120)) {
        let mut history = SearchHistory::new();
        for query in &queries {
            history.add(SearchHistoryEntry::new(query.clone(), SearchKind::Indicators, 0));
        }
        prop_assert!(history.len() <= 50);
        let entries: Vec<&SearchHistoryEntry> = history.entries().collect();
        for pair in entries.windows(2) {
            prop_assert_ne!(&pair[0].query, &pair[1].query);
        }
        if let Some(last) = queries.last() {
            prop_assert_eq!(&entries[entries.len() - 1].query, last);
        }
    }

    #[test]
    fn navigation_current_is_last_push(
        pushes in prop::collection::vec(0u32..1000, 1..150),
        backs in 0usize..10,
    ) {
        let mut nav = NavigationHistory::new();
        for (i, value) in pushes.iter().enumerate() {
            if i == pushes.len() / 2 {
                for _ in 0..backs {
                    nav.back();
                }
            }
            nav.push(*value);
        }
        prop_assert!(nav.len() <= 100);
        prop_assert_eq!(nav.current(), pushes.last());
        prop_assert!(!nav.can_go_forward());
    }
}
