//! The real-ball forward strategy.
//!
//! Works in log space: each candidate is the neighbor's max plus a
//! per-generator log increment, kept as a real ball at the strategy's
//! precision level. Slower than the magnitude bounds but much tighter;
//! the escalation driver reruns it at increasing levels.

use crate::ball::Ball;
use crate::dp::{CellFlags, Tableau};
use crate::expr::ExprRegistry;
use crate::forward::Strategy;
use crate::generator_vecs::generator_log_scores;
use crate::generators::{GeneratorIndices, GeneratorValues};
use crate::matrix::IntMat;
use std::ops::ControlFlow;

/// A candidate log-score; `None` is −∞ (no path).
type Score = Option<Ball>;

fn score_add(base: &Score, incr: &Ball, prec: u64) -> Score {
    base.as_ref().map(|b| b.add(incr, prec))
}

/// Strictly less, treating `None` as −∞.
fn score_lt(a: &Score, b: &Score) -> bool {
    match (a, b) {
        (None, Some(_)) => true,
        (Some(x), Some(y)) => x.lt(y),
        _ => false,
    }
}

fn score_max(a: &Score, b: &Score) -> Score {
    match (a, b) {
        (None, other) | (other, None) => other.clone(),
        (Some(x), Some(y)) => Some(x.max(y)),
    }
}

/// Per-cell ball enclosures of the two maxima.
#[derive(Clone)]
pub struct BallCell {
    max2: Score,
    max3: Score,
}

/// Real-ball strategy state at one precision level.
pub struct BallStrategy<'s> {
    prec: u64,
    h: GeneratorValues<Ball>,
    a: &'s [u8],
    b: &'s [u8],
    corner: Option<Ball>,
}

impl<'s> BallStrategy<'s> {
    /// Computes per-generator log-score balls at `level` and readies
    /// the sweep.
    pub fn new(
        level: usize,
        gmat: &IntMat,
        reg: &mut ExprRegistry,
        g: &GeneratorIndices,
        a: &'s [u8],
        b: &'s [u8],
    ) -> Self {
        let scores = generator_log_scores(gmat, reg, level);
        let h = GeneratorValues::from_fn(g, |i| scores[i].clone());
        Self {
            prec: 1u64 << level,
            h,
            a,
            b,
            corner: None,
        }
    }

    /// The corner cell's three-way max enclosure, once swept past.
    #[must_use]
    pub fn corner(&self) -> Option<Ball> {
        self.corner.clone()
    }

    fn boundary(
        &self,
        i: usize,
        j: usize,
        top: Option<&BallCell>,
        left: Option<&BallCell>,
    ) -> [Score; 3] {
        let mut m: [Score; 3] = [None, None, None];
        match (i, j) {
            (0, 0) => m[1] = Some(self.h.m1_00.clone()),
            (1, 0) => m[0] = Some(self.h.m0_10.clone()),
            (0, 1) => m[2] = Some(self.h.m2_01.clone()),
            (0, _) => {
                let nt = usize::from(self.b[j - 1]);
                let p2 = left.expect("left neighbor on the top edge");
                m[2] = score_add(&p2.max2, &self.h.m2_0j_incr[nt], self.prec);
            }
            (_, 0) => {
                let nt = usize::from(self.a[i - 1]);
                let p0 = top.expect("top neighbor on the left edge");
                m[0] = score_add(&p0.max3, &self.h.m0_i0_incr[nt], self.prec);
            }
            _ => unreachable!(),
        }
        m
    }

    fn center(
        &self,
        flags: CellFlags,
        i: usize,
        j: usize,
        top: Option<&BallCell>,
        diag: Option<&BallCell>,
        left: Option<&BallCell>,
    ) -> [Score; 3] {
        let mut m: [Score; 3] = [None, None, None];
        let nta = usize::from(self.a[i - 1]);
        let ntb = usize::from(self.b[j - 1]);

        if flags.m0_interesting() {
            let p0 = top.expect("top neighbor in the body");
            m[0] = score_add(&p0.max3, &self.h.c0_incr[nta], self.prec);
        }
        if flags.m1_interesting() {
            let p1 = diag.expect("diagonal neighbor in the body");
            m[1] = score_add(&p1.max3, &self.h.c1_incr[nta * 4 + ntb], self.prec);
        }
        if flags.m2_interesting() {
            let p2 = left.expect("left neighbor in the body");
            m[2] = score_add(&p2.max2, &self.h.c2_incr[ntb], self.prec);
        }
        m
    }
}

impl Strategy for BallStrategy<'_> {
    type Cell = BallCell;

    fn blank(&self) -> BallCell {
        BallCell {
            max2: None,
            max3: None,
        }
    }

    fn visit(
        &mut self,
        tableau: &mut Tableau,
        i: usize,
        j: usize,
        curr: &mut BallCell,
        top: Option<&BallCell>,
        diag: Option<&BallCell>,
        left: Option<&BallCell>,
    ) -> ControlFlow<()> {
        let flags = tableau.get(i, j);
        let m = if i < 1 || j < 1 {
            self.boundary(i, j, top, left)
        } else {
            self.center(flags, i, j, top, diag, left)
        };

        if flags.contains(CellFlags::MAX2) {
            curr.max2 = None;
            if flags.contains(CellFlags::MAX2_M1) {
                curr.max2 = score_max(&curr.max2, &m[1]);
            }
            if flags.contains(CellFlags::MAX2_M2) {
                curr.max2 = score_max(&curr.max2, &m[2]);
            }
        }
        if flags.contains(CellFlags::MAX3) {
            curr.max3 = None;
            for (bit, k) in [
                (CellFlags::MAX3_M0, 0),
                (CellFlags::MAX3_M1, 1),
                (CellFlags::MAX3_M2, 2),
            ] {
                if flags.contains(bit) {
                    curr.max3 = score_max(&curr.max3, &m[k]);
                }
            }
        }

        // A candidate strictly below the new max is no longer live.
        let mut updated = flags;
        if flags.contains(CellFlags::MAX2) {
            if flags.contains(CellFlags::MAX2_M1) && score_lt(&m[1], &curr.max2) {
                updated.remove(CellFlags::MAX2_M1);
            }
            if flags.contains(CellFlags::MAX2_M2) && score_lt(&m[2], &curr.max2) {
                updated.remove(CellFlags::MAX2_M2);
            }
        }
        if flags.contains(CellFlags::MAX3) {
            for (bit, k) in [
                (CellFlags::MAX3_M0, 0),
                (CellFlags::MAX3_M1, 1),
                (CellFlags::MAX3_M2, 2),
            ] {
                if flags.contains(bit) && score_lt(&m[k], &curr.max3) {
                    updated.remove(bit);
                }
            }
        }
        *tableau.get_mut(i, j) = updated;

        if i == tableau.nrows() - 1 && j == tableau.ncols() - 1 {
            self.corner = curr.max3.clone();
        }
        ControlFlow::Continue(())
    }
}
