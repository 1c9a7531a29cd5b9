//! Search orchestration.
//!
//! [`SearchEngine`] turns a [`SearchRequest`] into TQL, dispatches it to the
//! indicator endpoint, the group endpoint, or both, and returns a single
//! [`SearchResult`]. Every failure underneath is reported as one
//! [`SearchExecutionError`].
//!
//! TQL cannot span both resource kinds, so a combined search runs two
//! single-kind searches with half the page size each and concatenates them,
//! indicators first.

use crate::endpoints::{
    AssociationScope, GroupsApi, GroupsEndpoint, IndicatorsApi, IndicatorsEndpoint, SearchParams,
};
use crate::error::{SearchExecutionError, SearchFailure};
use crate::transport::Transport;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tcq_core::{
    PaginationInfo, RecordId, SearchItem, SearchKind, SearchRequest, SearchResult, ValidationError,
};
use tcq_tql::{build_filtered_query, build_simple_query, looks_like_tql, validate_tql, QueryResult};

/// Identifies one record for a detail lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    Indicator(RecordId),
    Group(RecordId),
}

impl ItemRef {
    pub fn id(&self) -> RecordId {
        match self {
            ItemRef::Indicator(id) | ItemRef::Group(id) => *id,
        }
    }

    pub fn kind(&self) -> SearchKind {
        match self {
            ItemRef::Indicator(_) => SearchKind::Indicators,
            ItemRef::Group(_) => SearchKind::Groups,
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Indicator(id) => write!(f, "indicator:{}", id),
            ItemRef::Group(id) => write!(f, "group:{}", id),
        }
    }
}

impl FromStr for ItemRef {
    type Err = ValidationError;

    /// Parses `indicator:<id>` or `group:<id>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| ValidationError::invalid("item", "expected <indicator|group>:<id>"))?;
        let id: RecordId = id
            .trim()
            .parse()
            .map_err(|_| ValidationError::invalid("item", format!("invalid id '{}'", id)))?;
        match kind.trim().parse::<SearchKind>()? {
            SearchKind::Indicators => Ok(ItemRef::Indicator(id)),
            SearchKind::Groups => Ok(ItemRef::Group(id)),
            SearchKind::Both => Err(ValidationError::invalid(
                "item",
                "a detail lookup needs a single kind",
            )),
        }
    }
}

pub struct SearchEngine {
    indicators: Arc<dyn IndicatorsEndpoint>,
    groups: Arc<dyn GroupsEndpoint>,
}

impl SearchEngine {
    pub fn new(indicators: Arc<dyn IndicatorsEndpoint>, groups: Arc<dyn GroupsEndpoint>) -> Self {
        Self { indicators, groups }
    }

    /// Engine backed by the real `/indicators` and `/groups` resources.
    pub fn from_transport(transport: Arc<dyn Transport>) -> Self {
        Self::new(
            Arc::new(IndicatorsApi::new(transport.clone())),
            Arc::new(GroupsApi::new(transport)),
        )
    }

    /// Execute a search.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, SearchExecutionError> {
        tracing::info!(
            kind = %request.kind(),
            query = %request.query(),
            page = request.page(),
            page_size = request.page_size(),
            use_query_language = request.use_query_language(),
            "Executing search"
        );

        let outcome = match request.kind() {
            SearchKind::Both => self.search_both(request).await,
            kind => self.search_single(request, kind).await,
        };

        outcome.map_err(|failure| {
            tracing::error!(error = %failure, "Search failed");
            SearchExecutionError::from(failure)
        })
    }

    /// Translate a request into the TQL sent for `kind`.
    ///
    /// Text flagged as TQL, or text that already reads like TQL, is only
    /// validated. Anything else becomes a simple query with type detection.
    /// Filters, when present, are layered on afterwards.
    pub fn build_query(&self, request: &SearchRequest, kind: SearchKind) -> QueryResult<String> {
        let query = request.query();
        let base = if request.use_query_language() || looks_like_tql(query) {
            validate_tql(query)?;
            query.to_string()
        } else {
            build_simple_query(query, kind, true)?
        };

        match request.filters() {
            Some(filters) => build_filtered_query(Some(&base), filters, kind),
            None => Ok(base),
        }
    }

    async fn search_single(
        &self,
        request: &SearchRequest,
        kind: SearchKind,
    ) -> Result<SearchResult, SearchFailure> {
        let tql = self.build_query(request, kind)?;
        tracing::debug!(kind = %kind, tql = %tql, "Built TQL");

        let params = SearchParams::new(tql, request.offset(), request.page_size())
            .with_owner(request.owner())
            .with_includes(true, false);

        let result = match kind {
            SearchKind::Indicators => self.indicators.search(&params).await,
            _ => self.groups.search(&params).await,
        };
        result.map_err(|source| SearchFailure::Endpoint { kind, source })
    }

    async fn search_both(&self, request: &SearchRequest) -> Result<SearchResult, SearchFailure> {
        let half = request.page_size() / 2;
        let indicator_request = request.narrowed(SearchKind::Indicators, half)?;
        let group_request = request.narrowed(SearchKind::Groups, half)?;

        let indicators = self
            .search_single(&indicator_request, SearchKind::Indicators)
            .await?;
        let groups = self.search_single(&group_request, SearchKind::Groups).await?;

        let pagination = PaginationInfo::merged(
            &indicators.pagination,
            &groups.pagination,
            request.page(),
            request.page_size(),
        );
        let mut items = indicators.items;
        items.extend(groups.items);

        Ok(SearchResult::new(
            items,
            pagination,
            SearchKind::Both,
            request.query(),
        ))
    }

    /// Fetch one record with tags and attributes.
    ///
    /// With `include_associations` the association listing is fetched as
    /// well, but it is not attached to the returned record.
    pub async fn get_item_details(
        &self,
        item: ItemRef,
        include_associations: bool,
    ) -> Result<SearchItem, SearchExecutionError> {
        tracing::info!(item = %item, include_associations, "Fetching item details");
        let kind = item.kind();
        let endpoint_failure = |source| SearchFailure::Endpoint { kind, source };

        let record = match item {
            ItemRef::Indicator(id) => self
                .indicators
                .get_by_id(id, true, true)
                .await
                .map(SearchItem::from),
            ItemRef::Group(id) => self
                .groups
                .get_by_id(id, true, true)
                .await
                .map(SearchItem::from),
        }
        .map_err(endpoint_failure)?;

        if include_associations {
            // TODO: attach associations once SearchItem carries them.
            let associations = match item {
                ItemRef::Indicator(id) => {
                    self.indicators
                        .get_associations(id, AssociationScope::All)
                        .await
                }
                ItemRef::Group(id) => self.groups.get_associations(id, AssociationScope::All).await,
            }
            .map_err(endpoint_failure)?;
            tracing::debug!(item = %item, count = associations.len(), "Associations fetched");
        }

        Ok(record)
    }
}
