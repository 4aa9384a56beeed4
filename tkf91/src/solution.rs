//! The output record of one alignment request.

use crate::ball::Ball;
use crate::dp::Tableau;
use num_bigint::BigUint;

/// A computed alignment together with its certificate state.
#[derive(Debug)]
pub struct Solution {
    /// Aligned row for the first sequence, over {A, C, G, T, -}.
    pub aligned_a: String,
    /// Aligned row for the second sequence.
    pub aligned_b: String,
    /// Enclosure of the alignment's log-probability, when available.
    pub log_probability: Option<Ball>,
    /// Whether a certified strategy proved global optimality.
    pub verified: bool,
    /// Exact number of co-optimal alignments, when counted.
    pub count: Option<BigUint>,
    /// The certified tableau, kept for checking and counting.
    pub tableau: Option<Tableau>,
}

impl Solution {
    /// Number of alignment columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aligned_a.len()
    }

    /// Whether the alignment has no columns (both inputs empty).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aligned_a.is_empty()
    }
}
