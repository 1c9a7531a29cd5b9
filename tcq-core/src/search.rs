//! Search request and response models.

use crate::records::{GroupRecord, IndicatorRecord, SearchItem};
use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Which resource kind(s) a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Indicators,
    Groups,
    Both,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Indicators => "indicators",
            SearchKind::Groups => "groups",
            SearchKind::Both => "both",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indicators" | "indicator" => Ok(SearchKind::Indicators),
            "groups" | "group" => Ok(SearchKind::Groups),
            "both" => Ok(SearchKind::Both),
            other => Err(ValidationError::invalid(
                "search_kind",
                format!("unknown search kind '{}'", other),
            )),
        }
    }
}

// ============================================================================
// FILTERS
// ============================================================================

/// Structured filters layered on top of the query text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub owner: Option<String>,
    pub rating_min: Option<f64>,
    pub rating_max: Option<f64>,
    pub confidence_min: Option<u8>,
    pub confidence_max: Option<u8>,
    /// Opaque date strings, compared by the backend.
    pub date_added_after: Option<String>,
    pub date_added_before: Option<String>,
    pub tags: Vec<String>,
    pub indicator_types: Vec<String>,
    pub group_types: Vec<String>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_rating(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.rating_min = min;
        self.rating_max = max;
        self
    }

    pub fn with_confidence(mut self, min: Option<u8>, max: Option<u8>) -> Self {
        self.confidence_min = min;
        self.confidence_max = max;
        self
    }

    pub fn with_date_added(mut self, after: Option<String>, before: Option<String>) -> Self {
        self.date_added_after = after;
        self.date_added_before = before;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        push_unique(&mut self.tags, tag.into());
        self
    }

    pub fn with_indicator_type(mut self, type_name: impl Into<String>) -> Self {
        push_unique(&mut self.indicator_types, type_name.into());
        self
    }

    pub fn with_group_type(mut self, type_name: impl Into<String>) -> Self {
        push_unique(&mut self.group_types, type_name.into());
        self
    }

    /// True when any filter would narrow the search.
    pub fn is_filtered(&self) -> bool {
        self.owner.is_some()
            || self.rating_min.is_some()
            || self.rating_max.is_some()
            || self.confidence_min.is_some()
            || self.confidence_max.is_some()
            || self.date_added_after.is_some()
            || self.date_added_before.is_some()
            || !self.tags.is_empty()
            || !self.indicator_types.is_empty()
            || !self.group_types.is_empty()
    }

    /// Check score bounds. `min <= max` is left to the caller.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(min) = self.rating_min {
            ValidationError::check_range("rating_min", min, 0.0, 5.0)?;
        }
        if let Some(max) = self.rating_max {
            ValidationError::check_range("rating_max", max, 0.0, 5.0)?;
        }
        if let Some(min) = self.confidence_min {
            ValidationError::check_range("confidence_min", f64::from(min), 0.0, 100.0)?;
        }
        if let Some(max) = self.confidence_max {
            ValidationError::check_range("confidence_max", f64::from(max), 0.0, 100.0)?;
        }
        Ok(())
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

// ============================================================================
// REQUEST
// ============================================================================

/// A validated search request.
///
/// Construct with [`SearchRequest::new`] (page 0, default page size) or
/// [`SearchRequest::paged`]; the fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    query: String,
    kind: SearchKind,
    filters: Option<SearchFilters>,
    page: u32,
    page_size: u32,
    use_query_language: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, kind: SearchKind) -> Self {
        Self {
            query: query.into(),
            kind,
            filters: None,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            use_query_language: false,
        }
    }

    pub fn paged(
        query: impl Into<String>,
        kind: SearchKind,
        page: u32,
        page_size: u32,
    ) -> Result<Self, ValidationError> {
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ValidationError::OutOfRange {
                field: "page_size",
                value: f64::from(page_size),
                min: 1.0,
                max: f64::from(MAX_PAGE_SIZE),
            });
        }
        let mut request = Self::new(query, kind);
        request.page = page;
        request.page_size = page_size;
        Ok(request)
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Result<Self, ValidationError> {
        filters.validate()?;
        self.filters = Some(filters);
        Ok(self)
    }

    /// Mark the query text as a fully-formed query-language string.
    pub fn with_query_language(mut self, enabled: bool) -> Self {
        self.use_query_language = enabled;
        self
    }

    /// Same request on another page.
    pub fn at_page(&self, page: u32) -> Self {
        let mut request = self.clone();
        request.page = page;
        request
    }

    /// Same request against a single resource kind with a different page size.
    pub fn narrowed(&self, kind: SearchKind, page_size: u32) -> Result<Self, ValidationError> {
        let mut request = Self::paged(self.query.clone(), kind, self.page, page_size)?;
        request.filters = self.filters.clone();
        request.use_query_language = self.use_query_language;
        Ok(request)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub fn filters(&self) -> Option<&SearchFilters> {
        self.filters.as_ref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.filters.as_ref().and_then(|f| f.owner.as_deref())
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn use_query_language(&self) -> bool {
        self.use_query_language
    }

    /// Zero-based index of the first result on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }
}

// ============================================================================
// RESPONSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    #[serde(alias = "count")]
    pub total_results: u64,
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationInfo {
    /// Derive pagination from a `resultStart`/`resultLimit` window.
    pub fn from_window(total_results: u64, result_start: u64, result_limit: u32) -> Self {
        let limit = u64::from(result_limit);
        let (current_page, total_pages) = if limit > 0 {
            (result_start / limit, total_results.div_ceil(limit))
        } else {
            (0, 0)
        };
        Self {
            total_results,
            current_page: u32::try_from(current_page).unwrap_or(u32::MAX),
            page_size: result_limit,
            total_pages,
            has_next: result_start + limit < total_results,
            has_previous: result_start > 0,
        }
    }

    /// Merge two single-kind paginations into one for a combined search.
    pub fn merged(first: &Self, second: &Self, page: u32, page_size: u32) -> Self {
        let total_results = first.total_results + second.total_results;
        let total_pages = if page_size > 0 {
            total_results.div_ceil(u64::from(page_size))
        } else {
            0
        };
        Self {
            total_results,
            current_page: page,
            page_size,
            total_pages,
            has_next: first.has_next || second.has_next,
            has_previous: page > 0,
        }
    }

    pub fn empty(page_size: u32) -> Self {
        Self::from_window(0, 0, page_size)
    }

    pub fn result_start(&self) -> u64 {
        u64::from(self.current_page) * u64::from(self.page_size)
    }

    pub fn result_end(&self) -> u64 {
        ((u64::from(self.current_page) + 1) * u64::from(self.page_size)).min(self.total_results)
    }

    /// Highest valid zero-based page number, if there are any results.
    pub fn last_page(&self) -> Option<u32> {
        self.total_pages
            .checked_sub(1)
            .map(|p| u32::try_from(p).unwrap_or(u32::MAX))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub items: Vec<SearchItem>,
    pub pagination: PaginationInfo,
    pub kind: SearchKind,
    /// The query text actually executed.
    pub query: String,
}

impl SearchResult {
    pub fn new(
        items: Vec<SearchItem>,
        pagination: PaginationInfo,
        kind: SearchKind,
        query: impl Into<String>,
    ) -> Self {
        Self {
            items,
            pagination,
            kind,
            query: query.into(),
        }
    }

    pub fn indicators(&self) -> impl Iterator<Item = &IndicatorRecord> {
        self.items.iter().filter_map(SearchItem::as_indicator)
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupRecord> {
        self.items.iter().filter_map(SearchItem::as_group)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_kind_round_trips_through_str() {
        for kind in [SearchKind::Indicators, SearchKind::Groups, SearchKind::Both] {
            assert_eq!(kind.as_str().parse::<SearchKind>().unwrap(), kind);
        }
        assert!("everything".parse::<SearchKind>().is_err());
    }

    #[test]
    fn test_request_defaults() {
        let request = SearchRequest::new("evil.com", SearchKind::Indicators);
        assert_eq!(request.page(), 0);
        assert_eq!(request.page_size(), DEFAULT_PAGE_SIZE);
        assert!(!request.use_query_language());
        assert!(request.filters().is_none());
    }

    #[test]
    fn test_request_rejects_bad_page_size() {
        assert!(SearchRequest::paged("x", SearchKind::Groups, 0, 0).is_err());
        assert!(SearchRequest::paged("x", SearchKind::Groups, 0, MAX_PAGE_SIZE + 1).is_err());
        assert!(SearchRequest::paged("x", SearchKind::Groups, 3, MAX_PAGE_SIZE).is_ok());
        assert!(SearchRequest::paged("x", SearchKind::Groups, 3, 1).is_ok());
    }

    #[test]
    fn test_request_offset() {
        let request = SearchRequest::paged("x", SearchKind::Indicators, 2, 100).unwrap();
        assert_eq!(request.offset(), 200);
    }

    #[test]
    fn test_request_rejects_invalid_filters() {
        let filters = SearchFilters::new().with_rating(Some(7.5), None);
        assert!(SearchRequest::new("x", SearchKind::Indicators)
            .with_filters(filters)
            .is_err());

        let filters = SearchFilters::new().with_confidence(None, Some(150));
        assert!(SearchRequest::new("x", SearchKind::Indicators)
            .with_filters(filters)
            .is_err());
    }

    #[test]
    fn test_narrowed_keeps_query_and_filters() {
        let filters = SearchFilters::new().with_owner("Acme");
        let request = SearchRequest::paged("apt", SearchKind::Both, 4, 50)
            .unwrap()
            .with_filters(filters)
            .unwrap()
            .with_query_language(true);

        let narrowed = request.narrowed(SearchKind::Groups, 25).unwrap();
        assert_eq!(narrowed.kind(), SearchKind::Groups);
        assert_eq!(narrowed.page(), 4);
        assert_eq!(narrowed.page_size(), 25);
        assert_eq!(narrowed.owner(), Some("Acme"));
        assert!(narrowed.use_query_language());
    }

    #[test]
    fn test_filters_is_filtered() {
        assert!(!SearchFilters::new().is_filtered());
        assert!(SearchFilters::new().with_tag("c2").is_filtered());
        assert!(SearchFilters::new().with_owner("Acme").is_filtered());
    }

    #[test]
    fn test_filters_dedupe_tags_and_keep_order() {
        let filters = SearchFilters::new()
            .with_tag("malware")
            .with_tag("c2")
            .with_tag("malware");
        assert_eq!(filters.tags, vec!["malware".to_string(), "c2".to_string()]);
    }

    #[test]
    fn test_pagination_from_window() {
        let p = PaginationInfo::from_window(250, 200, 100);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_next);
        assert!(p.has_previous);
        assert_eq!(p.result_start(), 200);
        assert_eq!(p.result_end(), 250);
        assert_eq!(p.last_page(), Some(2));
    }

    #[test]
    fn test_pagination_first_page() {
        let p = PaginationInfo::from_window(250, 0, 100);
        assert_eq!(p.current_page, 0);
        assert!(p.has_next);
        assert!(!p.has_previous);
    }

    #[test]
    fn test_pagination_empty() {
        let p = PaginationInfo::empty(100);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.last_page(), None);
        assert!(!p.has_next);
    }

    #[test]
    fn test_pagination_merged() {
        let indicators = PaginationInfo::from_window(10, 0, 5);
        let groups = PaginationInfo::from_window(10, 0, 5);
        let merged = PaginationInfo::merged(&indicators, &groups, 0, 10);
        assert_eq!(merged.total_results, 20);
        assert_eq!(merged.total_pages, 2);
        assert!(merged.has_next);
        assert!(!merged.has_previous);
    }

    #[test]
    fn test_pagination_deserializes_count_alias() {
        let json = r#"{"count": 3, "current_page": 0, "page_size": 10, "total_pages": 1, "has_next": false, "has_previous": false}"#;
        let p: PaginationInfo = serde_json::from_str(json).unwrap();
        assert_eq!(p.total_results, 3);
    }
}
