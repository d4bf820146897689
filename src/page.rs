//! Pagination calculator.
//!
//! Pure computation, no I/O: turns (total item count, requested page index)
//! into an offset/limit pair and a bounded window of page numbers for
//! display. Recomputed per request, never persisted.

use serde::{Deserialize, Serialize};

/// Largest number of entries in the display window.
const WINDOW_SIZE: u64 = 10;

/// Computed pagination for a given item count and requested page index.
///
/// `offset` and `limit` are both 0 exactly when `item_count` is 0 or the
/// requested index lies beyond the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub item_count: u64,
    pub page_size: u64,
    pub page_count: u64,
    /// Effective page index; resets to 1 when the request is out of range.
    pub page_index: u64,
    pub offset: u64,
    pub limit: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Page {
    /// Compute a page. A requested index or page size of 0 is treated as 1.
    pub fn new(item_count: u64, page_index: u64, page_size: u64) -> Self {
        let page_size = page_size.max(1);
        let requested = page_index.max(1);
        let page_count = item_count.div_ceil(page_size);

        let (page_index, offset, limit) = if item_count == 0 || requested > page_count {
            (1, 0, 0)
        } else {
            (requested, page_size * (requested - 1), page_size)
        };

        Self {
            item_count,
            page_size,
            page_count,
            page_index,
            offset,
            limit,
            has_next: page_index < page_count,
            has_previous: page_index > 1,
        }
    }

    /// Contiguous window of page numbers to render, at most
    /// 10 entries, always within `[1, page_count]`.
    ///
    /// For more than 10 pages the window is centered near the effective
    /// index and clamped to the ends; the clamps run in order and the
    /// high-end clamp overrides the low-end one.
    pub fn page_numbers(&self) -> Vec<u64> {
        if self.page_count <= WINDOW_SIZE {
            return (1..=self.page_count).collect();
        }

        let count = self.page_count as i64;
        let index = self.page_index as i64;
        let mut start = index - 4;
        let mut end = index + 5;
        if start < 1 {
            start = 1;
            end = WINDOW_SIZE as i64;
        }
        if end > count {
            end = count;
            start = count - (WINDOW_SIZE as i64 - 1);
        }
        (start as u64..=end as u64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let page = Page::new(0, 1, 10);
        assert_eq!(page.page_count, 0);
        assert_eq!(page.page_index, 1);
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, 0);
        assert!(!page.has_next);
        assert!(!page.has_previous);
        assert!(page.page_numbers().is_empty());
    }

    #[test]
    fn test_middle_page_short_window() {
        let page = Page::new(95, 3, 10);
        assert_eq!(page.page_count, 10);
        assert_eq!(page.offset, 20);
        assert_eq!(page.limit, 10);
        assert!(page.has_next);
        assert!(page.has_previous);
        // page_count <= 10: the whole range is the window
        assert_eq!(page.page_numbers(), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_middle_page_centered_window() {
        let page = Page::new(500, 15, 10);
        assert_eq!(page.page_count, 50);
        assert_eq!(page.offset, 140);
        assert_eq!(page.limit, 10);
        assert!(page.has_next);
        assert!(page.has_previous);
        assert_eq!(page.page_numbers(), (11..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_window_low_clamp() {
        let page = Page::new(500, 1, 10);
        assert_eq!(page.page_numbers(), (1..=10).collect::<Vec<_>>());
        assert!(!page.has_previous);
        assert!(page.has_next);
    }

    #[test]
    fn test_window_high_clamp() {
        let page = Page::new(500, 50, 10);
        assert_eq!(page.page_numbers(), (41..=50).collect::<Vec<_>>());
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn test_window_high_clamp_overrides_low() {
        // page_count just above the window size, index near the top: the
        // high-end clamp is the one that decides the final window.
        let page = Page::new(110, 11, 10);
        assert_eq!(page.page_count, 11);
        assert_eq!(page.page_numbers(), (2..=11).collect::<Vec<_>>());

        let page = Page::new(110, 8, 10);
        assert_eq!(page.page_numbers(), (2..=11).collect::<Vec<_>>());
    }

    #[test]
    fn test_out_of_range_index_resets() {
        let page = Page::new(30, 7, 10);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.page_index, 1);
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, 0);
    }

    #[test]
    fn test_zero_index_treated_as_first() {
        let page = Page::new(30, 0, 10);
        assert_eq!(page.page_index, 1);
        assert_eq!(page.offset, 0);
        assert_eq!(page.limit, 10);
    }

    #[test]
    fn test_last_partial_page() {
        let page = Page::new(25, 3, 10);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.offset, 20);
        assert_eq!(page.limit, 10);
        assert!(!page.has_next);
    }

    #[test]
    fn test_page_count_arithmetic() {
        assert_eq!(Page::new(1, 1, 10).page_count, 1);
        assert_eq!(Page::new(10, 1, 10).page_count, 1);
        assert_eq!(Page::new(11, 1, 10).page_count, 2);
        assert_eq!(Page::new(95, 1, 10).page_count, 10);
    }

    #[test]
    fn test_window_invariants_random() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let item_count = rng.gen_range(0..5000);
            let page_index = rng.gen_range(0..600);
            let page_size = rng.gen_range(1..50);
            let page = Page::new(item_count, page_index, page_size);

            assert_eq!(page.page_count, item_count.div_ceil(page_size));
            assert!(page.offset + page.limit <= item_count.div_ceil(page_size) * page_size);

            let window = page.page_numbers();
            assert!(window.len() <= 10);
            for pair in window.windows(2) {
                assert_eq!(pair[1], pair[0] + 1);
            }
            if let (Some(first), Some(last)) = (window.first(), window.last()) {
                assert!(*first >= 1);
                assert!(*last <= page.page_count);
            }
        }
    }
}
