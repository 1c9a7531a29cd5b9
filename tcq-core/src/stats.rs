//! Summary figures over a page of indicators.
//!
//! Both entry points take any iterator of indicator references, so they work
//! directly on [`SearchResult::indicators`](crate::SearchResult::indicators).

use crate::records::IndicatorRecord;
use crate::Timestamp;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// GROUPING
// ============================================================================

/// Indicators sharing a summary, compared case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorGroup<'a> {
    /// Summary as spelled by the first member.
    pub summary: String,
    /// Type of the first member.
    pub type_name: String,
    pub indicators: Vec<&'a IndicatorRecord>,
}

impl IndicatorGroup<'_> {
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}

/// Group by lowercase summary. Groups come back ordered by that key and keep
/// their members in input order.
pub fn group_indicators<'a, I>(indicators: I) -> Vec<IndicatorGroup<'a>>
where
    I: IntoIterator<Item = &'a IndicatorRecord>,
{
    let mut by_summary: BTreeMap<String, Vec<&'a IndicatorRecord>> = BTreeMap::new();
    for indicator in indicators {
        by_summary
            .entry(indicator.summary.to_lowercase())
            .or_default()
            .push(indicator);
    }

    by_summary
        .into_values()
        .filter_map(|members| {
            let first = *members.first()?;
            Some(IndicatorGroup {
                summary: first.summary.clone(),
                type_name: first.type_name().to_string(),
                indicators: members,
            })
        })
        .collect()
}

// ============================================================================
// STATISTICS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchStats {
    pub total_count: usize,
    pub earliest_added: Option<Timestamp>,
    pub latest_modified: Option<Timestamp>,
    /// Mean of the non-zero ratings. An unrated indicator scores 0.
    pub avg_rating: Option<f64>,
    pub avg_confidence: Option<f64>,
    pub unique_owners: usize,
    pub active_count: usize,
    pub false_positives: usize,
}

pub fn calculate_stats<'a, I>(indicators: I) -> SearchStats
where
    I: IntoIterator<Item = &'a IndicatorRecord>,
{
    let mut stats = SearchStats::default();
    let mut owners = HashSet::new();
    let (mut rating_sum, mut rated) = (0.0, 0usize);
    let mut confidence_sum = 0u64;

    for indicator in indicators {
        stats.total_count += 1;
        let meta = &indicator.meta;
        stats.earliest_added = Some(match stats.earliest_added {
            Some(earliest) => earliest.min(meta.date_added),
            None => meta.date_added,
        });
        stats.latest_modified = Some(match stats.latest_modified {
            Some(latest) => latest.max(meta.last_modified),
            None => meta.last_modified,
        });
        owners.insert(meta.owner_name.as_str());

        if indicator.active {
            stats.active_count += 1;
        }
        if indicator.is_false_positive() {
            stats.false_positives += 1;
        }
        if indicator.rating > 0.0 {
            rating_sum += indicator.rating;
            rated += 1;
        }
        confidence_sum += u64::from(indicator.confidence);
    }

    stats.unique_owners = owners.len();
    stats.avg_rating = (rated > 0).then(|| rating_sum / rated as f64);
    stats.avg_confidence =
        (stats.total_count > 0).then(|| confidence_sum as f64 / stats.total_count as f64);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{RecordMeta, Tag};
    use chrono::{TimeZone, Utc};

    fn indicator(
        id: i64,
        type_name: &str,
        summary: &str,
        owner: &str,
        rating: f64,
        confidence: i64,
    ) -> IndicatorRecord {
        let meta = RecordMeta {
            id,
            type_name: type_name.to_string(),
            date_added: Utc.with_ymd_and_hms(2024, 1, id as u32, 0, 0, 0).unwrap(),
            last_modified: Utc.with_ymd_and_hms(2024, 2, id as u32, 0, 0, 0).unwrap(),
            owner_name: owner.to_string(),
            owner_id: 1,
            web_link: String::new(),
            description: None,
            tags: Vec::new(),
            attributes: Vec::new(),
            associated_groups: Vec::new(),
            associated_indicators: Vec::new(),
        };
        IndicatorRecord::new(meta, summary, rating, confidence).unwrap()
    }

    #[test]
    fn test_group_by_summary_ignores_case() {
        let records = [
            indicator(1, "Host", "bad.com", "Org", 1.0, 50),
            indicator(2, "Host", "bad.com", "Org", 1.0, 50),
            indicator(3, "Host", "Bad.com", "Org", 1.0, 50),
            indicator(4, "File", "EVIL.EXE", "Org", 1.0, 50),
        ];

        let groups = group_indicators(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].summary, "bad.com");
        assert_eq!(groups[0].type_name, "Host");
        assert_eq!(groups[0].len(), 3);
        let ids: Vec<i64> = groups[0].indicators.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(groups[1].summary, "EVIL.EXE");
        assert_eq!(groups[1].len(), 1);
    }

    #[test]
    fn test_group_empty() {
        let none: &[IndicatorRecord] = &[];
        assert!(group_indicators(none).is_empty());
    }

    #[test]
    fn test_stats() {
        let first = indicator(1, "Host", "a.com", "Org A", 4.0, 80);
        let mut second = indicator(2, "Host", "b.com", "Org B", 2.0, 60);
        second.active = false;
        second.false_positive_flag = true;
        let third = indicator(3, "Host", "c.com", "Org A", 0.0, 40);
        let mut fourth = indicator(4, "Host", "d.com", "Org A", 0.0, 50);
        fourth.meta.tags.push(Tag {
            name: "False Positive".to_string(),
            description: None,
        });

        let stats = calculate_stats(&[first, second, third, fourth]);
        assert_eq!(stats.total_count, 4);
        assert_eq!(stats.unique_owners, 2);
        assert_eq!(stats.active_count, 3);
        assert_eq!(stats.false_positives, 2);
        assert_eq!(stats.avg_rating, Some(3.0));
        assert_eq!(stats.avg_confidence, Some(57.5));
        assert_eq!(
            stats.earliest_added,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            stats.latest_modified,
            Some(Utc.with_ymd_and_hms(2024, 2, 4, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_stats_unrated() {
        let stats = calculate_stats(&[indicator(1, "Host", "a.com", "Org", 0.0, 0)]);
        assert_eq!(stats.avg_rating, None);
        assert_eq!(stats.avg_confidence, Some(0.0));
    }

    #[test]
    fn test_stats_empty() {
        let none: &[IndicatorRecord] = &[];
        assert_eq!(calculate_stats(none), SearchStats::default());
    }
}
