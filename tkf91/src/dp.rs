//! The dynamic-programming tableau: one flag byte per cell.
//!
//! The flags answer, for each cell: is the three-way max still
//! interesting, which of {m0, m1, m2} are live candidates for it, is
//! the cell a candidate for the optimal traceback, and the same two
//! questions for the two-way max over {m1, m2}. A quantity is
//! "interesting" if some later pass still needs its value.
//!
//! Everything bulky (balls, magnitude pairs, integer score vectors)
//! lives in strategy-owned ring buffers during the forward pass; the
//! tableau itself is the only dense per-cell state.

use crate::error::{Error, Result};
use crate::sequence::{encode, GAP};
use bitflags::bitflags;

bitflags! {
    /// Per-cell candidacy and relevance flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        /// The cell's three-way max is still interesting.
        const MAX3 = 0x01;
        /// The cell lies on the canonical or generalized traceback.
        const TRACE = 0x02;
        /// The top-neighbor recurrence is live for the 3-way max.
        const MAX3_M0 = 0x04;
        /// The diagonal recurrence is live for the 3-way max.
        const MAX3_M1 = 0x08;
        /// The left recurrence is live for the 3-way max.
        const MAX3_M2 = 0x10;
        /// The cell's two-way max is still interesting.
        const MAX2 = 0x20;
        /// The diagonal recurrence is live for the 2-way max.
        const MAX2_M1 = 0x40;
        /// The left recurrence is live for the 2-way max.
        const MAX2_M2 = 0x80;
    }
}

impl CellFlags {
    /// Whether m0 needs evaluating for this cell.
    #[must_use]
    pub fn m0_interesting(self) -> bool {
        self.contains(Self::MAX3 | Self::MAX3_M0)
    }

    /// Whether m1 needs evaluating for this cell.
    #[must_use]
    pub fn m1_interesting(self) -> bool {
        self.contains(Self::MAX3 | Self::MAX3_M1) || self.contains(Self::MAX2 | Self::MAX2_M1)
    }

    /// Whether m2 needs evaluating for this cell.
    #[must_use]
    pub fn m2_interesting(self) -> bool {
        self.contains(Self::MAX3 | Self::MAX3_M2) || self.contains(Self::MAX2 | Self::MAX2_M2)
    }
}

/// Dense matrix of cell flags, `(|A|+1) × (|B|+1)`.
#[derive(Clone, Debug)]
pub struct Tableau {
    data: Vec<CellFlags>,
    nrows: usize,
    ncols: usize,
}

impl Tableau {
    /// A fresh tableau with every candidate alive in every cell.
    #[must_use]
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![CellFlags::all(); nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[must_use]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// The flags of cell `(i, j)`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> CellFlags {
        self.data[i * self.ncols + j]
    }

    /// Mutable access to the flags of cell `(i, j)`.
    pub fn get_mut(&mut self, i: usize, j: usize) -> &mut CellFlags {
        &mut self.data[i * self.ncols + j]
    }

    /// The backward relevance pass: a generalized traceback from the
    /// bottom-right corner. Clears MAX2/MAX3/TRACE everywhere, marks
    /// the corner, then sweeps in reverse row-major order propagating
    /// relevance through the still-live candidate bits.
    pub fn backward(&mut self) {
        for flags in &mut self.data {
            *flags &= !(CellFlags::MAX3 | CellFlags::TRACE | CellFlags::MAX2);
        }
        let (nr, nc) = (self.nrows, self.ncols);
        *self.get_mut(nr - 1, nc - 1) |= CellFlags::MAX3 | CellFlags::TRACE;

        for i in (0..nr).rev() {
            for j in (0..nc).rev() {
                let mut flags = self.get(i, j);

                // The cell to the right reaches this cell through m2.
                if j < nc - 1 {
                    let y = self.get(i, j + 1);
                    if y.contains(CellFlags::TRACE | CellFlags::MAX3_M2) {
                        flags |= CellFlags::TRACE;
                    }
                    if y.m2_interesting() {
                        flags |= CellFlags::MAX2;
                    }
                }

                // The cell to the lower right reaches this cell through m1.
                if i < nr - 1 && j < nc - 1 {
                    let y = self.get(i + 1, j + 1);
                    if y.contains(CellFlags::TRACE | CellFlags::MAX3_M1) {
                        flags |= CellFlags::TRACE;
                    }
                    if y.m1_interesting() {
                        flags |= CellFlags::MAX3;
                    }
                }

                // The cell below reaches this cell through m0.
                if i < nr - 1 {
                    let y = self.get(i + 1, j);
                    if y.contains(CellFlags::TRACE | CellFlags::MAX3_M0) {
                        flags |= CellFlags::TRACE;
                    }
                    if y.m0_interesting() {
                        flags |= CellFlags::MAX3;
                    }
                }

                *self.get_mut(i, j) = flags;
            }
        }
    }

    /// Extracts the canonical alignment by walking from the bottom-right
    /// corner, preferring deletion over substitution over insertion.
    ///
    /// # Panics
    ///
    /// Panics if a visited cell has no direction bit set; that is a
    /// driver bug, not an input condition.
    #[must_use]
    pub fn canonical_alignment(&self, a: &[u8], b: &[u8]) -> (String, String) {
        let mut sa: Vec<char> = Vec::with_capacity(a.len() + b.len());
        let mut sb: Vec<char> = Vec::with_capacity(a.len() + b.len());
        let mut i = self.nrows - 1;
        let mut j = self.ncols - 1;
        while i > 0 || j > 0 {
            let x = self.get(i, j);
            if x.contains(CellFlags::MAX3_M0) {
                sa.push(encode(a[i - 1]));
                sb.push('-');
                i -= 1;
            } else if x.contains(CellFlags::MAX3_M1) {
                sa.push(encode(a[i - 1]));
                sb.push(encode(b[j - 1]));
                i -= 1;
                j -= 1;
            } else if x.contains(CellFlags::MAX3_M2) {
                sa.push('-');
                sb.push(encode(b[j - 1]));
                j -= 1;
            } else {
                panic!("lost the thread in the dynamic programming traceback");
            }
        }
        sa.reverse();
        sb.reverse();
        (sa.into_iter().collect(), sb.into_iter().collect())
    }

    /// Replays a caller-supplied alignment against the certified flags:
    /// `optimal` iff every observed direction is a live candidate, and
    /// `canonical` iff every observed direction equals the canonical
    /// preference.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidAlignment`] on a gap-gap column or when the rows
    /// do not spell a path through this tableau.
    pub fn check_alignment(&self, row_a: &[i8], row_b: &[i8]) -> Result<(bool, bool)> {
        let mut i = self.nrows - 1;
        let mut j = self.ncols - 1;
        let mut k = row_a.len();
        let mut optimal = true;
        let mut canonical = true;

        while i > 0 || j > 0 {
            if k == 0 {
                return Err(Error::InvalidAlignment(
                    "alignment is shorter than its sequences".to_string(),
                ));
            }
            k -= 1;
            let observed = match (row_a[k] != GAP, row_b[k] != GAP) {
                (true, false) => CellFlags::MAX3_M0,
                (true, true) => CellFlags::MAX3_M1,
                (false, true) => CellFlags::MAX3_M2,
                (false, false) => {
                    return Err(Error::InvalidAlignment(
                        "unexpected alignment column".to_string(),
                    ))
                }
            };

            let full = self.get(i, j);
            let preferred = if full.contains(CellFlags::MAX3_M0) {
                CellFlags::MAX3_M0
            } else if full.contains(CellFlags::MAX3_M1) {
                CellFlags::MAX3_M1
            } else if full.contains(CellFlags::MAX3_M2) {
                CellFlags::MAX3_M2
            } else {
                panic!("lost the thread in the dynamic programming traceback");
            };

            if observed != preferred {
                canonical = false;
            }
            if !full.contains(observed) {
                optimal = false;
                return Ok((optimal, canonical));
            }

            if observed == CellFlags::MAX3_M0 {
                i -= 1;
            } else if observed == CellFlags::MAX3_M1 {
                i -= 1;
                j -= 1;
            } else {
                j -= 1;
            }
        }
        Ok((optimal, canonical))
    }
}
