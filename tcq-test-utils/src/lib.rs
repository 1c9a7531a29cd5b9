//! tcq Test Utilities
//!
//! Shared test infrastructure for the tcq workspace:
//! - Mock resource endpoints that record every call
//! - A scripted [`Transport`] for exercising the real endpoint code
//! - Wire-shaped JSON fixtures and decoded record fixtures
//! - Proptest generators for requests, filters and records

pub use tcq_client::{
    ApiError, ApiResult, AssociationScope, GroupsEndpoint, IndicatorsEndpoint, SearchParams,
    Transport,
};
pub use tcq_core::{
    GroupRecord, IndicatorRecord, PaginationInfo, RecordId, SearchFilters, SearchItem,
    SearchKind, SearchRequest, SearchResult,
};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// ============================================================================
// MOCK ENDPOINTS
// ============================================================================

/// A call observed by a mock endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointCall {
    Search(SearchParams),
    GetById {
        id: RecordId,
        include_tags: bool,
        include_attributes: bool,
    },
    Associations {
        id: RecordId,
        scope: AssociationScope,
    },
}

/// In-memory resource endpoint.
///
/// Search responses are served from a queue; once it runs dry every search
/// returns an empty page shaped by the request. Lookups are answered from
/// inserted records, `NotFound` otherwise.
pub struct MockEndpoint<R> {
    kind: SearchKind,
    searches: Mutex<VecDeque<ApiResult<SearchResult>>>,
    records: Mutex<HashMap<RecordId, R>>,
    associations: Mutex<Vec<Value>>,
    calls: Mutex<Vec<EndpointCall>>,
}

pub type MockIndicatorsEndpoint = MockEndpoint<IndicatorRecord>;
pub type MockGroupsEndpoint = MockEndpoint<GroupRecord>;

impl MockEndpoint<IndicatorRecord> {
    pub fn indicators() -> Self {
        Self::with_kind(SearchKind::Indicators)
    }

    pub fn insert(&self, record: IndicatorRecord) {
        self.records.lock().unwrap().insert(record.id(), record);
    }
}

impl MockEndpoint<GroupRecord> {
    pub fn groups() -> Self {
        Self::with_kind(SearchKind::Groups)
    }

    pub fn insert(&self, record: GroupRecord) {
        self.records.lock().unwrap().insert(record.id(), record);
    }
}

impl<R: Clone> MockEndpoint<R> {
    fn with_kind(kind: SearchKind) -> Self {
        Self {
            kind,
            searches: Mutex::new(VecDeque::new()),
            records: Mutex::new(HashMap::new()),
            associations: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue the next search response.
    pub fn push_search(&self, result: ApiResult<SearchResult>) {
        self.searches.lock().unwrap().push_back(result);
    }

    /// Queue a page holding `items` out of `total`, windowed like the request.
    pub fn push_page(&self, items: Vec<SearchItem>, total: u64, start: u64, limit: u32) {
        let result = SearchResult::new(
            items,
            PaginationInfo::from_window(total, start, limit),
            self.kind,
            "",
        );
        self.push_search(Ok(result));
    }

    pub fn set_associations(&self, associations: Vec<Value>) {
        *self.associations.lock().unwrap() = associations;
    }

    pub fn calls(&self) -> Vec<EndpointCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<SearchParams> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EndpointCall::Search(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    pub fn association_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, EndpointCall::Associations { .. }))
            .count()
    }

    fn record(&self, call: EndpointCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_search(&self, params: &SearchParams) -> ApiResult<SearchResult> {
        self.record(EndpointCall::Search(params.clone()));
        let queued = self.searches.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            Ok(SearchResult::new(
                Vec::new(),
                PaginationInfo::from_window(0, params.result_start, params.result_limit),
                self.kind,
                params.tql.clone().unwrap_or_default(),
            ))
        })
    }

    fn lookup(&self, id: RecordId, include_tags: bool, include_attributes: bool) -> ApiResult<R> {
        self.record(EndpointCall::GetById {
            id,
            include_tags,
            include_attributes,
        });
        self.records
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                body: format!("{} {} not found", self.kind, id),
            })
    }

    fn list_associations(&self, id: RecordId, scope: AssociationScope) -> ApiResult<Vec<Value>> {
        self.record(EndpointCall::Associations { id, scope });
        Ok(self.associations.lock().unwrap().clone())
    }
}

#[async_trait]
impl IndicatorsEndpoint for MockEndpoint<IndicatorRecord> {
    async fn search(&self, params: &SearchParams) -> ApiResult<SearchResult> {
        self.next_search(params)
    }

    async fn get_by_id(
        &self,
        id: RecordId,
        include_tags: bool,
        include_attributes: bool,
    ) -> ApiResult<IndicatorRecord> {
        self.lookup(id, include_tags, include_attributes)
    }

    async fn get_associations(&self, id: RecordId, scope: AssociationScope) -> ApiResult<Vec<Value>> {
        self.list_associations(id, scope)
    }
}

#[async_trait]
impl GroupsEndpoint for MockEndpoint<GroupRecord> {
    async fn search(&self, params: &SearchParams) -> ApiResult<SearchResult> {
        self.next_search(params)
    }

    async fn get_by_id(
        &self,
        id: RecordId,
        include_tags: bool,
        include_attributes: bool,
    ) -> ApiResult<GroupRecord> {
        self.lookup(id, include_tags, include_attributes)
    }

    async fn get_associations(&self, id: RecordId, scope: AssociationScope) -> ApiResult<Vec<Value>> {
        self.list_associations(id, scope)
    }
}

// ============================================================================
// SCRIPTED TRANSPORT
// ============================================================================

/// A request observed by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportCall {
    pub endpoint: String,
    pub params: Vec<(&'static str, String)>,
}

impl TransportCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport answering from a queue of canned JSON bodies or errors.
/// An empty queue answers with an empty list envelope.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResult<Value>>>,
    calls: Mutex<Vec<TransportCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, body: Value) {
        self.responses.lock().unwrap().push_back(Ok(body));
    }

    pub fn push_error(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, endpoint: &str, params: &[(&'static str, String)]) -> ApiResult<Value> {
        self.calls.lock().unwrap().push(TransportCall {
            endpoint: endpoint.to_string(),
            params: params.to_vec(),
        });
        let queued = self.responses.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| Ok(fixtures::list_body(Vec::new(), 0)))
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for tcq request and record types.

    use super::*;
    use proptest::prelude::*;
    use tcq_core::MAX_PAGE_SIZE;

    pub fn arb_search_kind() -> impl Strategy<Value = SearchKind> {
        prop_oneof![
            Just(SearchKind::Indicators),
            Just(SearchKind::Groups),
            Just(SearchKind::Both),
        ]
    }

    pub fn arb_single_kind() -> impl Strategy<Value = SearchKind> {
        prop_oneof![Just(SearchKind::Indicators), Just(SearchKind::Groups)]
    }

    pub fn arb_page_size() -> impl Strategy<Value = u32> {
        prop_oneof![1u32..=500, Just(MAX_PAGE_SIZE)]
    }

    /// Search text free of quotes, parentheses and spaces.
    pub fn arb_plain_query() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9._@-]{1,32}"
    }

    /// Filters within valid score ranges.
    pub fn arb_search_filters() -> impl Strategy<Value = SearchFilters> {
        (
            prop::option::of("[A-Z][a-z]{2,10}"),
            prop::option::of(0u8..=10),
            prop::option::of(0u8..=100),
            prop::collection::vec("[a-z0-9]{1,10}", 0..4),
        )
            .prop_map(|(owner, half_rating, confidence, tags)| {
                let mut filters = SearchFilters::new()
                    .with_rating(half_rating.map(|r| f64::from(r) / 2.0), None)
                    .with_confidence(confidence, None);
                filters.owner = owner;
                for tag in tags {
                    filters = filters.with_tag(tag);
                }
                filters
            })
    }

    pub fn arb_indicator_record() -> impl Strategy<Value = IndicatorRecord> {
        (1i64..1_000_000, "[a-z]{3,12}\\.(com|net|org)", 0u8..=10, 0i64..=100).prop_map(
            |(id, summary, half_rating, confidence)| {
                let mut body = fixtures::indicator_json(id, "Host", &summary);
                body["rating"] = Value::from(f64::from(half_rating) / 2.0);
                body["confidence"] = Value::from(confidence);
                serde_json::from_value(body).expect("generated indicator is valid")
            },
        )
    }

    pub fn arb_group_record() -> impl Strategy<Value = GroupRecord> {
        (1i64..1_000_000, "[A-Z][A-Za-z0-9 ]{2,20}").prop_map(|(id, name)| {
            serde_json::from_value(fixtures::group_json(id, "Adversary", &name))
                .expect("generated group is valid")
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Wire-shaped bodies and the records they decode to.

    use super::*;
    use serde_json::json;

    pub const FIXED_DATE: &str = "2024-01-01T00:00:00Z";

    /// An indicator as the API sends it.
    pub fn indicator_json(id: RecordId, type_name: &str, summary: &str) -> Value {
        json!({
            "id": id,
            "type": type_name,
            "summary": summary,
            "rating": 3.0,
            "confidence": 80,
            "dateAdded": FIXED_DATE,
            "lastModified": FIXED_DATE,
            "ownerId": 1,
            "ownerName": "Test Org",
            "webLink": format!("https://test.threatconnect.com/auth/indicators/details/{}", id),
        })
    }

    /// A group as the API sends it.
    pub fn group_json(id: RecordId, type_name: &str, name: &str) -> Value {
        json!({
            "id": id,
            "type": type_name,
            "name": name,
            "dateAdded": FIXED_DATE,
            "lastModified": FIXED_DATE,
            "ownerId": 1,
            "ownerName": "Test Org",
            "webLink": format!("https://test.threatconnect.com/auth/groups/details/{}", id),
        })
    }

    pub fn list_body(data: Vec<Value>, count: u64) -> Value {
        json!({ "data": data, "count": count, "status": "Success" })
    }

    pub fn item_body(data: Value) -> Value {
        json!({ "data": data, "status": "Success" })
    }

    pub fn address_indicator(id: RecordId, address: &str) -> IndicatorRecord {
        serde_json::from_value(indicator_json(id, "Address", address))
            .expect("fixture indicator is valid")
    }

    pub fn adversary_group(id: RecordId, name: &str) -> GroupRecord {
        serde_json::from_value(group_json(id, "Adversary", name)).expect("fixture group is valid")
    }

    /// `count` address indicators with consecutive ids starting at `first_id`.
    pub fn indicator_items(first_id: RecordId, count: usize) -> Vec<SearchItem> {
        (0..count)
            .map(|i| {
                let id = first_id + i as RecordId;
                address_indicator(id, &format!("10.0.{}.{}", id / 256 % 256, id % 256)).into()
            })
            .collect()
    }

    /// `count` adversary groups with consecutive ids starting at `first_id`.
    pub fn group_items(first_id: RecordId, count: usize) -> Vec<SearchItem> {
        (0..count)
            .map(|i| {
                let id = first_id + i as RecordId;
                adversary_group(id, &format!("Adversary {}", id)).into()
            })
            .collect()
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over search results.

    use super::*;

    /// Every indicator precedes every group.
    #[track_caller]
    pub fn assert_indicators_first(result: &SearchResult) {
        let first_group = result
            .items
            .iter()
            .position(|item| item.as_group().is_some())
            .unwrap_or(result.items.len());
        assert!(
            result.items[first_group..]
                .iter()
                .all(|item| item.as_group().is_some()),
            "indicator found after a group in {:?}",
            result.items.iter().map(SearchItem::label).collect::<Vec<_>>()
        );
    }

    /// Pagination agrees with its own total and page size.
    #[track_caller]
    pub fn assert_pagination_consistent(pagination: &PaginationInfo) {
        if pagination.page_size > 0 {
            assert_eq!(
                pagination.total_pages,
                pagination.total_results.div_ceil(u64::from(pagination.page_size)),
                "total_pages disagrees with total_results / page_size"
            );
        }
        assert_eq!(pagination.has_previous, pagination.current_page > 0);
    }
}

// ============================================================================
// TESTS
// ============================================================================
