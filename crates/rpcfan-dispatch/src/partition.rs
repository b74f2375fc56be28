//! Partitioning — split work into contiguous shards, one per worker.
//!
//! Chunks are sized `total / workers + 1`, which absorbs the division
//! remainder without a separate pass. The walk stops as soon as the extent
//! is covered, so fewer than `workers` chunks may come back, but none of
//! them is ever empty.

use std::ops::Range;

/// Ordered, disjoint, non-empty half-open shards covering one extent.
pub type BatchPlan<T> = Vec<Range<T>>;

/// Split indices `[0, total)` into at most `workers` chunks.
pub fn partition_by_count(total: usize, workers: usize) -> BatchPlan<usize> {
    let mut plan = Vec::new();
    if total == 0 || workers == 0 {
        return plan;
    }

    let chunk = total / workers + 1;
    let mut accum = 0;
    for _ in 0..workers {
        let next = (accum + chunk).min(total);
        plan.push(accum..next);
        accum = next;
        if accum == total {
            break;
        }
    }
    plan
}

/// Split the numeric range `[start, end)` into at most `workers` chunks.
pub fn partition_by_range(start: u64, end: u64, workers: usize) -> BatchPlan<u64> {
    let mut plan = Vec::new();
    if start >= end || workers == 0 {
        return plan;
    }

    let chunk = (end - start) / workers as u64 + 1;
    let mut accum = start;
    for _ in 0..workers {
        let next = accum.saturating_add(chunk).min(end);
        plan.push(accum..next);
        accum = next;
        if accum == end {
            break;
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Disjoint, contiguous, non-empty, and covering `[start, end)` exactly.
    fn assert_covers<T>(plan: &[Range<T>], start: T, end: T, workers: usize)
    where
        T: Copy + PartialEq + PartialOrd + std::fmt::Debug,
    {
        assert!(!plan.is_empty());
        assert!(plan.len() <= workers, "{} chunks for {workers} workers", plan.len());
        assert_eq!(plan[0].start, start);
        assert_eq!(plan[plan.len() - 1].end, end);
        for r in plan {
            assert!(r.start < r.end, "empty chunk {r:?}");
        }
        for pair in plan.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn count_cases() {
        for (total, workers) in [(3221, 5), (100, 5), (29311, 13), (7, 13), (100, 30), (1, 1), (10, 10)] {
            let plan = partition_by_count(total, workers);
            assert_covers(&plan, 0, total, workers);
            assert_eq!(plan.iter().map(|r| r.len()).sum::<usize>(), total);
        }
    }

    #[test]
    fn range_cases() {
        for (start, end, workers) in [(100, 200, 5), (111, 1281, 10), (100, 200, 30), (111, 121, 2)] {
            let plan = partition_by_range(start, end, workers);
            assert_covers(&plan, start, end, workers);
            assert_eq!(plan.iter().map(|r| r.end - r.start).sum::<u64>(), end - start);
        }
    }

    #[test]
    fn oversized_chunks_stop_early() {
        // 100 / 30 + 1 = 4 per chunk, so 25 chunks cover everything.
        assert_eq!(partition_by_count(100, 30).len(), 25);
        // 10 / 10 + 1 = 2 per chunk.
        assert_eq!(partition_by_count(10, 10).len(), 5);
    }

    #[test]
    fn range_split_across_two_workers() {
        assert_eq!(partition_by_range(111, 121, 2), vec![111..117, 117..121]);
    }

    #[test]
    fn fewer_items_than_workers() {
        assert_eq!(partition_by_count(3, 8), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn empty_inputs_yield_empty_plan() {
        assert!(partition_by_count(0, 4).is_empty());
        assert!(partition_by_count(10, 0).is_empty());
        assert!(partition_by_range(5, 5, 3).is_empty());
        assert!(partition_by_range(9, 5, 3).is_empty());
    }
}
