//! Property-Based Tests for Pagination Arithmetic
//!
//! For any window and total, derived pagination agrees with ceiling division
//! and the has-next/has-previous flags agree with the window position.

use proptest::prelude::*;
use tcq_core::{PaginationInfo, SearchKind, SearchRequest, MAX_PAGE_SIZE};

proptest! {
    #[test]
    fn total_pages_is_ceiling_division(total in 0u64..1_000_000, limit in 1u32..=MAX_PAGE_SIZE) {
        let p = PaginationInfo::from_window(total, 0, limit);
        let limit = u64::from(limit);
        prop_assert!(p.total_pages * limit >= total);
        if p.total_pages > 0 {
            prop_assert!((p.total_pages - 1) * limit < total);
        }
    }

    #[test]
    fn request_offset_matches_window(page in 0u32..10_000, size in 1u32..=MAX_PAGE_SIZE, total in 0u64..100_000_000) {
        let request = SearchRequest::paged("q", SearchKind::Indicators, page, size).unwrap();
        let p = PaginationInfo::from_window(total, request.offset(), size);
        prop_assert_eq!(p.current_page, page);
        prop_assert_eq!(p.has_previous, page > 0);
        prop_assert_eq!(p.has_next, request.offset() + u64::from(size) < total);
    }

    #[test]
    fn merged_total_is_sum(a in 0u64..1_000_000, b in 0u64..1_000_000, page in 0u32..100, size in 2u32..=MAX_PAGE_SIZE) {
        let half = size / 2;
        let first = PaginationInfo::from_window(a, u64::from(page) * u64::from(half), half);
        let second = PaginationInfo::from_window(b, u64::from(page) * u64::from(half), half);
        let merged = PaginationInfo::merged(&first, &second, page, size);
        prop_assert_eq!(merged.total_results, a + b);
        prop_assert_eq!(merged.total_pages, (a + b).div_ceil(u64::from(size)));
        prop_assert_eq!(merged.has_next, first.has_next || second.has_next);
        prop_assert_eq!(merged.has_previous, page > 0);
    }

    #[test]
    fn out_of_range_page_size_rejected(size in (MAX_PAGE_SIZE + 1)..u32::MAX) {
        prop_assert!(SearchRequest::paged("q", SearchKind::Groups, 0, size).is_err());
    }
}
