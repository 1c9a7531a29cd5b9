//! Plain-text and JSON rendering of results and records.

use tcq_core::{
    calculate_stats, group_indicators, GroupDetails, Owner, PaginationInfo, SearchItem,
    SearchResult,
};

pub fn result_json(result: &SearchResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

pub fn item_json(item: &SearchItem) -> serde_json::Result<String> {
    serde_json::to_string_pretty(item)
}

pub fn owners_json(owners: &[Owner]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(owners)
}

/// Owners sorted by name, one per line.
pub fn owner_lines(owners: &[Owner]) -> Vec<String> {
    if owners.is_empty() {
        return vec!["No owners visible to these credentials".to_string()];
    }
    let mut sorted: Vec<&Owner> = owners.iter().collect();
    sorted.sort_by_key(|owner| owner.name.to_lowercase());
    sorted
        .into_iter()
        .map(|owner| format!("{:<8} {:<14} {}", owner.id, owner.type_name, owner.name))
        .collect()
}

/// One line per item, a summary of the page's indicators if it has any, then
/// a pagination footer.
pub fn result_lines(result: &SearchResult) -> Vec<String> {
    let mut lines: Vec<String> = result.items.iter().map(item_line).collect();
    if result.is_empty() {
        lines.push(format!("No {} found for '{}'", result.kind, result.query));
    }
    lines.extend(indicator_stats_line(result));
    lines.push(pagination_footer(&result.pagination));
    lines
}

pub fn indicator_stats_line(result: &SearchResult) -> Option<String> {
    let stats = calculate_stats(result.indicators());
    if stats.total_count == 0 {
        return None;
    }
    let distinct = group_indicators(result.indicators()).len();
    let rating = stats
        .avg_rating
        .map_or_else(|| "N/A".to_string(), |r| format!("{:.1}", r));
    Some(format!(
        "Indicators: {} ({} distinct)  Owners: {}  Avg rating: {}  Avg confidence: {:.1}%  Active: {}  False positives: {}",
        stats.total_count,
        distinct,
        stats.unique_owners,
        rating,
        stats.avg_confidence.unwrap_or_default(),
        stats.active_count,
        stats.false_positives
    ))
}

pub fn item_line(item: &SearchItem) -> String {
    match item {
        SearchItem::Indicator(indicator) => format!(
            "indicator:{:<10} {:<14} {}  (rating {:.1}, confidence {})",
            indicator.id(),
            indicator.type_name(),
            indicator.summary,
            indicator.rating,
            indicator.confidence
        ),
        SearchItem::Group(group) => format!(
            "group:{:<14} {:<14} {}  (owner {})",
            group.id(),
            group.type_name(),
            group.name,
            group.meta.owner_name
        ),
    }
}

pub fn pagination_footer(pagination: &PaginationInfo) -> String {
    if pagination.total_results == 0 {
        return "0 results".to_string();
    }
    let mut footer = format!(
        "Showing {}-{} of {} (page {} of {})",
        (pagination.result_start() + 1).min(pagination.total_results),
        pagination.result_end(),
        pagination.total_results,
        u64::from(pagination.current_page) + 1,
        pagination.total_pages
    );
    match (pagination.has_previous, pagination.has_next) {
        (true, true) => footer.push_str("  [prev | next]"),
        (true, false) => footer.push_str("  [prev]"),
        (false, true) => footer.push_str("  [next]"),
        (false, false) => {}
    }
    footer
}

/// Multi-line record view used for `--details` and `open`.
pub fn detail_lines(item: &SearchItem) -> Vec<String> {
    let meta = item.meta();
    let mut lines = vec![
        format!("{} {} ({})", item.type_name(), item.label(), item.id()),
        format!("Owner:    {}", meta.owner_name),
        format!("Added:    {}", meta.date_added.format("%Y-%m-%d %H:%M UTC")),
        format!("Modified: {}", meta.last_modified.format("%Y-%m-%d %H:%M UTC")),
    ];

    match item {
        SearchItem::Indicator(indicator) => {
            lines.push(format!(
                "Rating:   {:.1}  Confidence: {}  Active: {}",
                indicator.rating, indicator.confidence, indicator.active
            ));
            if let Some(file) = &indicator.file {
                let hashes = [
                    ("MD5:", &file.md5),
                    ("SHA1:", &file.sha1),
                    ("SHA256:", &file.sha256),
                ];
                for (label, hash) in hashes {
                    if let Some(hash) = hash {
                        lines.push(format!("{:<9} {}", label, hash));
                    }
                }
            }
        }
        SearchItem::Group(group) => match &group.details {
            GroupDetails::Event { event_date, status } => {
                if let Some(date) = event_date {
                    lines.push(format!("Event:    {}", date.format("%Y-%m-%d")));
                }
                if let Some(status) = status {
                    lines.push(format!("Status:   {}", status));
                }
            }
            GroupDetails::Document { file_name, .. } => {
                if let Some(name) = file_name {
                    lines.push(format!("File:     {}", name));
                }
            }
            GroupDetails::Email(email) => {
                if let Some(subject) = &email.subject {
                    lines.push(format!("Subject:  {}", subject));
                }
                if let Some(from) = &email.from {
                    lines.push(format!("From:     {}", from));
                }
            }
            GroupDetails::Signature { signature_type } => {
                if let Some(kind) = signature_type {
                    lines.push(format!("Format:   {}", kind));
                }
            }
            GroupDetails::General => {}
        },
    }

    if let Some(description) = meta.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("Description: {}", description));
    }
    if !meta.tags.is_empty() {
        let tags: Vec<&str> = meta.tags.iter().map(|t| t.name.as_str()).collect();
        lines.push(format!("Tags:     {}", tags.join(", ")));
    }
    for attribute in &meta.attributes {
        lines.push(format!("  {}: {}", attribute.type_name, attribute.value));
    }
    lines.push(format!("Link:     {}", meta.web_link));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcq_test_utils::fixtures;

    #[test]
    fn test_footer_middle_page() {
        let pagination = PaginationInfo::from_window(250, 100, 100);
        assert_eq!(
            pagination_footer(&pagination),
            "Showing 101-200 of 250 (page 2 of 3)  [prev | next]"
        );
    }

    #[test]
    fn test_footer_last_page() {
        let pagination = PaginationInfo::from_window(250, 200, 100);
        assert_eq!(
            pagination_footer(&pagination),
            "Showing 201-250 of 250 (page 3 of 3)  [prev]"
        );
    }

    fn result(items: Vec<SearchItem>) -> SearchResult {
        let total = items.len() as u64;
        SearchResult::new(
            items,
            PaginationInfo::from_window(total, 0, 100),
            tcq_core::SearchKind::Both,
            "x",
        )
    }

    #[test]
    fn test_stats_line_summarises_indicators() {
        let mut first = fixtures::address_indicator(1, "10.0.0.1");
        first.rating = 4.0;
        first.false_positive_flag = true;
        let mut second = fixtures::address_indicator(2, "10.0.0.1");
        second.rating = 0.0;
        second.confidence = 40;
        second.active = false;
        let items = vec![
            first.into(),
            second.into(),
            fixtures::adversary_group(3, "APT29").into(),
        ];

        let line = indicator_stats_line(&result(items)).unwrap();
        assert_eq!(
            line,
            "Indicators: 2 (1 distinct)  Owners: 1  Avg rating: 4.0  Avg confidence: 60.0%  Active: 1  False positives: 1"
        );
    }

    #[test]
    fn test_no_stats_line_without_indicators() {
        let r = result(fixtures::group_items(1, 2));
        assert!(indicator_stats_line(&r).is_none());
        assert_eq!(result_lines(&r).len(), 3);
    }

    #[test]
    fn test_owner_lines_sorted_by_name() {
        let owners = vec![
            Owner {
                id: 9,
                name: "zeta".to_string(),
                type_name: "Community".to_string(),
            },
            Owner {
                id: 1,
                name: "Acme".to_string(),
                type_name: "Organization".to_string(),
            },
        ];
        let lines = owner_lines(&owners);
        assert_eq!(lines[0], "1        Organization   Acme");
        assert!(lines[1].ends_with("zeta"));
        assert_eq!(owner_lines(&[]).len(), 1);
    }

    #[test]
    fn test_footer_empty() {
        assert_eq!(pagination_footer(&PaginationInfo::empty(100)), "0 results");
    }
}
