//! Command-line arguments.

use crate::config::SearchConfig;
use clap::Parser;
use std::path::PathBuf;
use tcq_client::ItemRef;
use tcq_core::{group_types, SearchFilters, SearchKind, SearchRequest, ValidationError};

#[derive(Debug, Parser)]
#[command(name = "tcq")]
#[command(author, version, about = "Search ThreatConnect indicators and groups", long_about = None)]
pub struct Cli {
    /// Search text, or a TQL expression with --tql
    pub query: Option<String>,

    /// Resource kind: indicators, groups or both
    #[arg(short, long)]
    pub kind: Option<SearchKind>,

    /// Zero-based page number
    #[arg(short, long, default_value_t = 0)]
    pub page: u32,

    /// Results per page (defaults to the configured page size)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Treat the query as TQL instead of plain text
    #[arg(long)]
    pub tql: bool,

    /// Restrict results to one owner
    #[arg(long)]
    pub owner: Option<String>,

    #[arg(long)]
    pub rating_min: Option<f64>,

    #[arg(long)]
    pub rating_max: Option<f64>,

    #[arg(long)]
    pub confidence_min: Option<u8>,

    #[arg(long)]
    pub confidence_max: Option<u8>,

    /// Only items added after this date (e.g. 2024-01-01)
    #[arg(long)]
    pub added_after: Option<String>,

    /// Only items added before this date
    #[arg(long)]
    pub added_before: Option<String>,

    /// Require a tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Restrict to an indicator or group type (repeatable)
    #[arg(long = "type")]
    pub types: Vec<String>,

    /// Show one record instead of searching, as indicator:<id> or group:<id>
    #[arg(long, conflicts_with = "query")]
    pub details: Option<ItemRef>,

    /// Also fetch associations when showing details (with --details or --interactive)
    #[arg(long)]
    pub associations: bool,

    /// List the owners visible to these credentials
    #[arg(long, conflicts_with_all = ["query", "details"])]
    pub owners: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Interactive session with paging and history
    #[arg(short, long)]
    pub interactive: bool,

    /// Path to the TOML config file (falls back to TCQ_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn search_kind(&self, defaults: &SearchConfig) -> SearchKind {
        self.kind.unwrap_or(defaults.default_kind)
    }

    /// Flag combinations clap cannot express on its own.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.associations && self.details.is_none() && !self.interactive {
            return Err(ValidationError::invalid(
                "associations",
                "--associations needs --details or --interactive",
            ));
        }
        Ok(())
    }

    /// Build the search request for `query` at the `--page` given on the
    /// command line, falling back to configured defaults for kind, page size
    /// and owner.
    pub fn to_request(
        &self,
        query: &str,
        defaults: &SearchConfig,
    ) -> Result<SearchRequest, ValidationError> {
        self.request_at(query, defaults, self.page)
    }

    /// Same as [`Cli::to_request`] but always on the first page, for searches
    /// typed at the interactive prompt.
    pub fn to_first_page_request(
        &self,
        query: &str,
        defaults: &SearchConfig,
    ) -> Result<SearchRequest, ValidationError> {
        self.request_at(query, defaults, 0)
    }

    fn request_at(
        &self,
        query: &str,
        defaults: &SearchConfig,
        page: u32,
    ) -> Result<SearchRequest, ValidationError> {
        let kind = self.search_kind(defaults);
        let page_size = self.page_size.unwrap_or(defaults.page_size);
        let request =
            SearchRequest::paged(query, kind, page, page_size)?.with_query_language(self.tql);

        let filters = self.filters(kind, defaults)?;
        if filters.is_filtered() {
            request.with_filters(filters)
        } else {
            Ok(request)
        }
    }

    fn filters(
        &self,
        kind: SearchKind,
        defaults: &SearchConfig,
    ) -> Result<SearchFilters, ValidationError> {
        check_bounds("rating", self.rating_min, self.rating_max)?;
        check_bounds(
            "confidence",
            self.confidence_min.map(f64::from),
            self.confidence_max.map(f64::from),
        )?;

        let mut filters = SearchFilters::new()
            .with_rating(self.rating_min, self.rating_max)
            .with_confidence(self.confidence_min, self.confidence_max)
            .with_date_added(self.added_after.clone(), self.added_before.clone());
        if let Some(owner) = self.owner.as_ref().or(defaults.default_owner.as_ref()) {
            filters = filters.with_owner(owner.clone());
        }
        for tag in &self.tags {
            filters = filters.with_tag(tag.clone());
        }
        for type_name in &self.types {
            filters = match kind {
                SearchKind::Indicators => filters.with_indicator_type(type_name.clone()),
                SearchKind::Groups => filters.with_group_type(type_name.clone()),
                SearchKind::Both if group_types::is_group_type(type_name) => {
                    filters.with_group_type(type_name.clone())
                }
                SearchKind::Both => filters.with_indicator_type(type_name.clone()),
            };
        }
        Ok(filters)
    }
}

fn check_bounds(
    field: &'static str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), ValidationError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::invalid(
            field,
            format!("minimum {} is greater than maximum {}", min, max),
        )),
        _ => Ok(()),
    }
}
