//! Bounded top-k selection
//!
//! Keeps the `k` best entries seen so far in a min-heap, so memory stays
//! O(k) however many chunks are offered. Higher scores rank first; equal
//! scores rank by ascending chunk id.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use veritas_domain::Chunk;

struct Entry {
    score: f32,
    chunk: Chunk,
}

impl Entry {
    fn rank(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.chunk.id.cmp(&self.chunk.id))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.rank(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank(other)
    }
}

/// Bounded heap of the best-scoring chunks
pub struct TopK {
    k: usize,
    heap: BinaryHeap<Reverse<Entry>>,
}

impl TopK {
    /// Create an empty selection of at most `k` chunks
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.min(1024) + 1),
        }
    }

    /// Offer a scored chunk
    pub fn push(&mut self, score: f32, chunk: Chunk) {
        if self.k == 0 || score.is_nan() {
            return;
        }
        let entry = Entry { score, chunk };
        if self.heap.len() < self.k {
            self.heap.push(Reverse(entry));
            return;
        }
        let beats_worst = self
            .heap
            .peek()
            .map_or(true, |Reverse(worst)| entry > *worst);
        if beats_worst {
            self.heap.pop();
            self.heap.push(Reverse(entry));
        }
    }

    /// Number of chunks held
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing has been kept
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Chunks with scores, best first
    pub fn into_scored(self) -> Vec<(f32, Chunk)> {
        let mut entries: Vec<Entry> = self.heap.into_iter().map(|Reverse(e)| e).collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries.into_iter().map(|e| (e.score, e.chunk)).collect()
    }

    /// Chunks, best first
    pub fn into_sorted(self) -> Vec<Chunk> {
        self.into_scored().into_iter().map(|(_, c)| c).collect()
    }
}
