//! Indicator, group and owner resource endpoints.
//!
//! All resources share one wire shape: list responses are
//! `{"data": [...], "count": N}` and single lookups are `{"data": {...}}`.

use crate::error::{ApiError, ApiResult};
use crate::transport::{QueryParams, Transport};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tcq_core::{
    GroupRecord, IndicatorRecord, Owner, PaginationInfo, RecordId, SearchItem, SearchKind,
    SearchResult,
};

/// Parameters for a paginated resource search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub tql: Option<String>,
    pub result_start: u64,
    pub result_limit: u32,
    pub owner: Option<String>,
    pub include_tags: bool,
    pub include_attributes: bool,
}

impl SearchParams {
    pub fn new(tql: impl Into<String>, result_start: u64, result_limit: u32) -> Self {
        Self {
            tql: Some(tql.into()),
            result_start,
            result_limit,
            owner: None,
            include_tags: false,
            include_attributes: false,
        }
    }

    pub fn with_owner(mut self, owner: Option<&str>) -> Self {
        self.owner = owner.map(str::to_string);
        self
    }

    pub fn with_includes(mut self, tags: bool, attributes: bool) -> Self {
        self.include_tags = tags;
        self.include_attributes = attributes;
        self
    }

    /// Wire parameters in the order they are signed.
    pub fn to_query(&self) -> QueryParams {
        let mut params: QueryParams = vec![
            ("resultStart", self.result_start.to_string()),
            ("resultLimit", self.result_limit.to_string()),
        ];
        if let Some(tql) = self.tql.as_deref().filter(|t| !t.is_empty()) {
            params.push(("tql", tql.to_string()));
        }
        if let Some(owner) = self.owner.as_deref().filter(|o| !o.is_empty()) {
            params.push(("owner", owner.to_string()));
        }
        params.extend(include_params(self.include_tags, self.include_attributes));
        params
    }
}

fn include_params(tags: bool, attributes: bool) -> QueryParams {
    let mut params = QueryParams::new();
    if tags {
        params.push(("includeTags", "true".to_string()));
    }
    if attributes {
        params.push(("includeAttributes", "true".to_string()));
    }
    params
}

/// Which association listing to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssociationScope {
    #[default]
    All,
    Groups,
    Indicators,
}

impl AssociationScope {
    fn path_segment(self) -> &'static str {
        match self {
            AssociationScope::All => "associations",
            AssociationScope::Groups => "groups",
            AssociationScope::Indicators => "indicators",
        }
    }
}

#[async_trait]
pub trait IndicatorsEndpoint: Send + Sync {
    async fn search(&self, params: &SearchParams) -> ApiResult<SearchResult>;

    async fn get_by_id(
        &self,
        id: RecordId,
        include_tags: bool,
        include_attributes: bool,
    ) -> ApiResult<IndicatorRecord>;

    /// Raw association entries, undecoded.
    async fn get_associations(&self, id: RecordId, scope: AssociationScope) -> ApiResult<Vec<Value>>;
}

#[async_trait]
pub trait GroupsEndpoint: Send + Sync {
    async fn search(&self, params: &SearchParams) -> ApiResult<SearchResult>;

    async fn get_by_id(
        &self,
        id: RecordId,
        include_tags: bool,
        include_attributes: bool,
    ) -> ApiResult<GroupRecord>;

    async fn get_associations(&self, id: RecordId, scope: AssociationScope) -> ApiResult<Vec<Value>>;
}

/// Owners visible to the signing credentials.
#[async_trait]
pub trait OwnersEndpoint: Send + Sync {
    async fn list(&self) -> ApiResult<Vec<Owner>>;
}

// ============================================================================
// WIRE ENVELOPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct ItemEnvelope<T> {
    data: Option<T>,
}

/// Shared search/lookup logic for one resource path.
#[derive(Clone)]
struct Resource {
    transport: Arc<dyn Transport>,
    path: &'static str,
    kind: SearchKind,
}

impl Resource {
    async fn search<R>(&self, params: &SearchParams) -> ApiResult<SearchResult>
    where
        R: DeserializeOwned + Into<SearchItem>,
    {
        let response = self.transport.get(self.path, &params.to_query()).await?;
        let envelope: ListEnvelope<R> = serde_json::from_value(response)?;

        let pagination =
            PaginationInfo::from_window(envelope.count, params.result_start, params.result_limit);
        tracing::debug!(
            resource = self.path,
            returned = envelope.data.len(),
            total = envelope.count,
            "Search page received"
        );

        Ok(SearchResult::new(
            envelope.data.into_iter().map(Into::into).collect(),
            pagination,
            self.kind,
            params.tql.clone().unwrap_or_default(),
        ))
    }

    async fn get_by_id<R: DeserializeOwned>(
        &self,
        id: RecordId,
        include_tags: bool,
        include_attributes: bool,
    ) -> ApiResult<R> {
        let endpoint = format!("{}/{}", self.path, id);
        let response = self
            .transport
            .get(&endpoint, &include_params(include_tags, include_attributes))
            .await?;
        let envelope: ItemEnvelope<R> = serde_json::from_value(response)?;
        envelope
            .data
            .ok_or_else(|| ApiError::InvalidResponse(format!("{} has no data object", endpoint)))
    }

    async fn get_associations(&self, id: RecordId, scope: AssociationScope) -> ApiResult<Vec<Value>> {
        let endpoint = format!("{}/{}/{}", self.path, id, scope.path_segment());
        let response = self.transport.get(&endpoint, &[]).await?;
        let envelope: ListEnvelope<Value> = serde_json::from_value(response)?;
        Ok(envelope.data)
    }
}

// ============================================================================
// CONCRETE ENDPOINTS
// ============================================================================

/// `/indicators` over any [`Transport`].
#[derive(Clone)]
pub struct IndicatorsApi {
    resource: Resource,
}

impl IndicatorsApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            resource: Resource {
                transport,
                path: "/indicators",
                kind: SearchKind::Indicators,
            },
        }
    }
}

#[async_trait]
impl IndicatorsEndpoint for IndicatorsApi {
    async fn search(&self, params: &SearchParams) -> ApiResult<SearchResult> {
        self.resource.search::<IndicatorRecord>(params).await
    }

    async fn get_by_id(
        &self,
        id: RecordId,
        include_tags: bool,
        include_attributes: bool,
    ) -> ApiResult<IndicatorRecord> {
        self.resource
            .get_by_id(id, include_tags, include_attributes)
            .await
    }

    async fn get_associations(&self, id: RecordId, scope: AssociationScope) -> ApiResult<Vec<Value>> {
        self.resource.get_associations(id, scope).await
    }
}

/// `/groups` over any [`Transport`].
#[derive(Clone)]
pub struct GroupsApi {
    resource: Resource,
}

impl GroupsApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            resource: Resource {
                transport,
                path: "/groups",
                kind: SearchKind::Groups,
            },
        }
    }
}

#[async_trait]
impl GroupsEndpoint for GroupsApi {
    async fn search(&self, params: &SearchParams) -> ApiResult<SearchResult> {
        self.resource.search::<GroupRecord>(params).await
    }

    async fn get_by_id(
        &self,
        id: RecordId,
        include_tags: bool,
        include_attributes: bool,
    ) -> ApiResult<GroupRecord> {
        self.resource
            .get_by_id(id, include_tags, include_attributes)
            .await
    }

    async fn get_associations(&self, id: RecordId, scope: AssociationScope) -> ApiResult<Vec<Value>> {
        self.resource.get_associations(id, scope).await
    }
}

/// `/security/owners` over any [`Transport`].
#[derive(Clone)]
pub struct OwnersApi {
    transport: Arc<dyn Transport>,
}

impl OwnersApi {
    pub const PATH: &'static str = "/security/owners";

    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl OwnersEndpoint for OwnersApi {
    async fn list(&self) -> ApiResult<Vec<Owner>> {
        let response = self.transport.get(Self::PATH, &[]).await?;
        let envelope: ListEnvelope<Owner> = serde_json::from_value(response)?;
        tracing::debug!(owners = envelope.data.len(), "Owners received");
        Ok(envelope.data)
    }
}
