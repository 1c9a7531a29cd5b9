//! tcq Client - ThreatConnect API access
//!
//! Layers, bottom up:
//! - [`signer`]: HMAC-SHA256 `Authorization` header construction
//! - [`transport`]: the [`Transport`] seam and its reqwest-backed [`RestClient`]
//! - [`endpoints`]: `/indicators` and `/groups` search and lookup, plus the
//!   owner listing
//! - [`orchestrator`]: [`SearchEngine`], which translates requests into TQL and
//!   merges combined searches

pub mod endpoints;
pub mod error;
pub mod orchestrator;
pub mod signer;
pub mod transport;

pub use endpoints::{
    AssociationScope, GroupsApi, GroupsEndpoint, IndicatorsApi, IndicatorsEndpoint, OwnersApi,
    OwnersEndpoint, SearchParams,
};
pub use error::{ApiError, ApiResult, SearchExecutionError, SearchFailure};
pub use orchestrator::{ItemRef, SearchEngine};
pub use signer::{canonical_message, HmacSigner, SignedHeaders};
pub use transport::{
    encode_query, map_status, ApiCredentials, QueryParams, RestClient, Transport,
    DEFAULT_API_VERSION, DEFAULT_TIMEOUT_MS,
};
