//! tcq TQL - query-language translation
//!
//! Two pure layers:
//! - [`detector`]: classifies a raw indicator string (hash, URL, email, IP, host)
//! - [`builder`]: turns free text plus [`tcq_core::SearchFilters`] into a TQL string
//!   and sanity-checks TQL typed by the user

pub mod builder;
pub mod detector;
pub mod error;

pub use builder::{build_filtered_query, build_simple_query, encode_for_url, validate_tql};
pub use detector::{detect_indicator_type, looks_like_tql, IndicatorKind};
pub use error::{QueryError, QueryResult};
