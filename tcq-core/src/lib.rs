//! tcq Core - Record and Search Types
//!
//! Pure data structures shared by every other crate in the workspace.
//! Nothing in here performs I/O; validation happens at construction.

pub mod error;
pub mod records;
pub mod search;
pub mod stats;

use chrono::{DateTime, Utc};

pub use error::ValidationError;
pub use records::{
    group_types, indicator_types, Association, Attribute, EmailGroupFields, FileIndicatorFields,
    GroupDetails, GroupRecord, IndicatorRecord, Owner, RecordMeta, SearchItem, Tag,
    FALSE_POSITIVE_TAG,
};
pub use search::{
    PaginationInfo, SearchFilters, SearchKind, SearchRequest, SearchResult, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use stats::{calculate_stats, group_indicators, IndicatorGroup, SearchStats};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Numeric identifier the backend assigns to indicators, groups and owners.
pub type RecordId = i64;
