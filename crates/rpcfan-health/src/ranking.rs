//! Latency ranking — a binary min-heap of endpoints keyed by latency.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    // Field order matters: ordering is by latency first.
    latency: Duration,
    endpoint: String,
}

/// Min-heap over `(endpoint, latency)`; the fastest endpoint pops first.
#[derive(Debug, Default)]
pub struct LatencyHeap {
    heap: BinaryHeap<Reverse<Entry>>,
}

impl LatencyHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// O(log n).
    pub fn insert(&mut self, endpoint: impl Into<String>, latency: Duration) {
        self.heap.push(Reverse(Entry {
            latency,
            endpoint: endpoint.into(),
        }));
    }

    /// Remove and return the fastest entry.
    pub fn pop(&mut self) -> Option<(String, Duration)> {
        self.heap
            .pop()
            .map(|Reverse(entry)| (entry.endpoint, entry.latency))
    }

    pub fn peek(&self) -> Option<(&str, Duration)> {
        self.heap
            .peek()
            .map(|Reverse(entry)| (entry.endpoint.as_str(), entry.latency))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain every endpoint, fastest first.
    pub fn into_ordered_keys(mut self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.heap.len());
        while let Some((endpoint, _)) = self.pop() {
            keys.push(endpoint);
        }
        keys
    }
}

impl<S: Into<String>> FromIterator<(S, Duration)> for LatencyHeap {
    fn from_iter<I: IntoIterator<Item = (S, Duration)>>(iter: I) -> Self {
        let mut heap = LatencyHeap::new();
        for (endpoint, latency) in iter {
            heap.insert(endpoint, latency);
        }
        heap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_fastest_first() {
        let mut heap = LatencyHeap::new();
        heap.insert("b", Duration::from_secs(3));
        heap.insert("a", Duration::from_secs(2));
        heap.insert("c", Duration::from_secs(5));
        heap.insert("d", Duration::from_secs(15));
        heap.insert("e", Duration::from_secs(1));

        assert_eq!(heap.len(), 5);
        assert_eq!(heap.into_ordered_keys(), vec!["e", "a", "b", "c", "d"]);
    }

    #[test]
    fn peek_is_minimum() {
        let heap: LatencyHeap = [
            ("slow", Duration::from_millis(900)),
            ("fast", Duration::from_millis(12)),
            ("mid", Duration::from_millis(300)),
        ]
        .into_iter()
        .collect();

        assert_eq!(heap.peek(), Some(("fast", Duration::from_millis(12))));
    }

    #[test]
    fn equal_latencies_all_drained() {
        let heap: LatencyHeap = ["x", "y", "z"]
            .into_iter()
            .map(|e| (e, Duration::from_millis(5)))
            .collect();

        let mut keys = heap.into_ordered_keys();
        keys.sort();
        assert_eq!(keys, vec!["x", "y", "z"]);
    }

    #[test]
    fn empty_heap() {
        let mut heap = LatencyHeap::new();
        assert!(heap.is_empty());
        assert_eq!(heap.pop(), None);
        assert!(heap.into_ordered_keys().is_empty());
    }
}
