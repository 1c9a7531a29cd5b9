//! TQL query building and validation.

use crate::detector::detect_indicator_type;
use crate::error::{QueryError, QueryResult};
use std::fmt;
use tcq_core::{SearchFilters, SearchKind};

/// A single AND-joined condition.
#[derive(Debug, Clone, PartialEq)]
enum Clause<'a> {
    /// Caller-supplied expression, parenthesized so its own `or`s stay scoped.
    Group(&'a str),
    /// `field in ("a", "b")`
    In {
        field: &'static str,
        values: Vec<&'a str>,
    },
    /// `field op value`
    Compare {
        field: &'static str,
        op: &'static str,
        value: Literal<'a>,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Literal<'a> {
    Float(f64),
    Int(u8),
    Quoted(&'a str),
}

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug keeps the decimal point: 3.0 rather than 3.
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Quoted(v) => write!(f, "\"{}\"", v),
        }
    }
}

impl fmt::Display for Clause<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Group(expr) => write!(f, "({})", expr),
            Clause::In { field, values } => {
                write!(f, "{} in (", field)?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "\"{}\"", value)?;
                }
                f.write_str(")")
            }
            Clause::Compare { field, op, value } => write!(f, "{} {} {}", field, op, value),
        }
    }
}

fn join(clauses: &[Clause<'_>]) -> String {
    clauses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Build a TQL query for plain search text.
///
/// Indicators search on `summary`, narrowed to the detected type when
/// `auto_detect` finds one; groups search on `name`. There is no single TQL
/// expression spanning both resource kinds, so [`SearchKind::Both`] is rejected.
///
/// ```
/// use tcq_core::SearchKind;
/// use tcq_tql::build_simple_query;
///
/// let tql = build_simple_query("192.168.1.1", SearchKind::Indicators, true).unwrap();
/// assert_eq!(tql, r#"typeName in ("Address") and summary in ("192.168.1.1")"#);
/// ```
pub fn build_simple_query(text: &str, kind: SearchKind, auto_detect: bool) -> QueryResult<String> {
    let clauses = match kind {
        SearchKind::Indicators => {
            let detected = auto_detect.then(|| detect_indicator_type(text)).flatten();
            let mut clauses = Vec::with_capacity(2);
            if let Some(indicator_kind) = detected {
                clauses.push(Clause::In {
                    field: "typeName",
                    values: vec![indicator_kind.as_str()],
                });
            }
            clauses.push(Clause::In {
                field: "summary",
                values: vec![text],
            });
            clauses
        }
        SearchKind::Groups => vec![Clause::In {
            field: "name",
            values: vec![text],
        }],
        SearchKind::Both => {
            return Err(QueryError::InvalidQuery(
                "cannot build a single query for both indicators and groups; \
                 build one query per resource kind"
                    .to_string(),
            ))
        }
    };
    Ok(join(&clauses))
}

/// AND a base query with every filter that applies to `kind`.
///
/// Clause order: base query, type restriction, rating, confidence, date
/// bounds, then one clause per tag. Type restrictions are skipped for
/// [`SearchKind::Both`] since indicator and group types never mix.
pub fn build_filtered_query(
    base_query: Option<&str>,
    filters: &SearchFilters,
    kind: SearchKind,
) -> QueryResult<String> {
    let mut clauses = Vec::new();

    if let Some(base) = base_query.filter(|b| !b.is_empty()) {
        clauses.push(Clause::Group(base));
    }

    let types = match kind {
        SearchKind::Indicators => filters.indicator_types.as_slice(),
        SearchKind::Groups => filters.group_types.as_slice(),
        SearchKind::Both => &[],
    };
    if !types.is_empty() {
        clauses.push(Clause::In {
            field: "typeName",
            values: types.iter().map(String::as_str).collect(),
        });
    }

    let compare = |field, op, value| Clause::Compare { field, op, value };

    if let Some(min) = filters.rating_min {
        clauses.push(compare("rating", ">=", Literal::Float(min)));
    }
    if let Some(max) = filters.rating_max {
        clauses.push(compare("rating", "<=", Literal::Float(max)));
    }
    if let Some(min) = filters.confidence_min {
        clauses.push(compare("confidence", ">=", Literal::Int(min)));
    }
    if let Some(max) = filters.confidence_max {
        clauses.push(compare("confidence", "<=", Literal::Int(max)));
    }
    if let Some(after) = filters.date_added_after.as_deref().filter(|d| !d.is_empty()) {
        clauses.push(compare("dateAdded", ">", Literal::Quoted(after)));
    }
    if let Some(before) = filters.date_added_before.as_deref().filter(|d| !d.is_empty()) {
        clauses.push(compare("dateAdded", "<", Literal::Quoted(before)));
    }
    for tag in &filters.tags {
        clauses.push(Clause::In {
            field: "tag",
            values: vec![tag.as_str()],
        });
    }

    if clauses.is_empty() {
        return Err(QueryError::BuildFailed(
            "no query or filters provided".to_string(),
        ));
    }
    Ok(join(&clauses))
}

/// Cheap syntax sanity check for user-typed TQL. Not a grammar parse.
pub fn validate_tql(query: &str) -> QueryResult<()> {
    if query.trim().is_empty() {
        return Err(QueryError::InvalidQuery("query cannot be empty".to_string()));
    }
    if query.matches('"').count() % 2 != 0 {
        return Err(QueryError::InvalidQuery("unmatched quotes in query".to_string()));
    }
    if query.matches('(').count() != query.matches(')').count() {
        return Err(QueryError::InvalidQuery(
            "unmatched parentheses in query".to_string(),
        ));
    }
    Ok(())
}

/// Percent-encode a TQL string for use as a URL query parameter value.
/// `/` is left as-is.
pub fn encode_for_url(query: &str) -> String {
    urlencoding::encode(query).replace("%2F", "/")
}

// =============================================================================
// TESTS
// =============================================================================
