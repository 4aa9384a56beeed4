//! The magnitude-bounds forward strategy.
//!
//! Each cell keeps 30-bit lower and upper magnitude bounds for
//! `max(m1, m2)` and `max(m0, m1, m2)`. The bounds are fast and weak;
//! candidates whose upper bound falls strictly below the best lower
//! bound lose their flag bit.

use crate::ball::Ball;
use crate::dp::{CellFlags, Tableau};
use crate::expr::ExprRegistry;
use crate::forward::Strategy;
use crate::generator_vecs::generator_log_scores;
use crate::generators::{GeneratorIndices, GeneratorValues};
use crate::mag::Mag;
use crate::matrix::IntMat;
use std::ops::ControlFlow;

/// Ball level behind the magnitude bounds: 256-bit working precision
/// collapsed to 30-bit magnitudes.
pub const BOUND_LEVEL: usize = 8;

/// Per-cell bound pairs for the two maxima.
#[derive(Clone, Copy)]
pub struct BoundCell {
    lb2: Mag,
    ub2: Mag,
    lb3: Mag,
    ub3: Mag,
}

/// Magnitude-bounds strategy state.
pub struct BoundStrategy<'s> {
    lb: GeneratorValues<Mag>,
    ub: GeneratorValues<Mag>,
    a: &'s [u8],
    b: &'s [u8],
    corner: Option<(Mag, Mag)>,
}

impl<'s> BoundStrategy<'s> {
    /// Computes per-generator probability bounds and readies the sweep.
    pub fn new(
        gmat: &IntMat,
        reg: &mut ExprRegistry,
        g: &GeneratorIndices,
        a: &'s [u8],
        b: &'s [u8],
    ) -> Self {
        let prec = 1u64 << BOUND_LEVEL;
        let values: Vec<Ball> = generator_log_scores(gmat, reg, BOUND_LEVEL)
            .iter()
            .map(|score| score.exp(prec))
            .collect();
        let lb = GeneratorValues::from_fn(g, |i| Mag::lower_of(&values[i].lower()));
        let ub = GeneratorValues::from_fn(g, |i| Mag::upper_of(&values[i].upper()));
        Self {
            lb,
            ub,
            a,
            b,
            corner: None,
        }
    }

    /// Bounds of the corner cell's three-way max, once the sweep has
    /// passed it.
    #[must_use]
    pub fn corner(&self) -> Option<(Mag, Mag)> {
        self.corner
    }

    /// The six candidate bounds for a boundary cell.
    fn boundary(
        &self,
        i: usize,
        j: usize,
        top: Option<&BoundCell>,
        left: Option<&BoundCell>,
    ) -> [(Mag, Mag); 3] {
        let mut m = [(Mag::zero(), Mag::zero()); 3];
        match (i, j) {
            (0, 0) => m[1] = (self.lb.m1_00, self.ub.m1_00),
            (1, 0) => m[0] = (self.lb.m0_10, self.ub.m0_10),
            (0, 1) => m[2] = (self.lb.m2_01, self.ub.m2_01),
            (0, _) => {
                let nt = usize::from(self.b[j - 1]);
                let p2 = left.expect("left neighbor on the top edge");
                m[2] = (
                    p2.lb2.mul_lower(&self.lb.m2_0j_incr[nt]),
                    p2.ub2.mul_upper(&self.ub.m2_0j_incr[nt]),
                );
            }
            (_, 0) => {
                let nt = usize::from(self.a[i - 1]);
                let p0 = top.expect("top neighbor on the left edge");
                m[0] = (
                    p0.lb3.mul_lower(&self.lb.m0_i0_incr[nt]),
                    p0.ub3.mul_upper(&self.ub.m0_i0_incr[nt]),
                );
            }
            _ => unreachable!(),
        }
        m
    }

    /// The six candidate bounds for a body cell, honoring the flags.
    fn center(
        &self,
        flags: CellFlags,
        i: usize,
        j: usize,
        top: Option<&BoundCell>,
        diag: Option<&BoundCell>,
        left: Option<&BoundCell>,
    ) -> [(Mag, Mag); 3] {
        let mut m = [(Mag::zero(), Mag::zero()); 3];
        let nta = usize::from(self.a[i - 1]);
        let ntb = usize::from(self.b[j - 1]);

        if flags.m0_interesting() {
            let p0 = top.expect("top neighbor in the body");
            m[0] = (
                p0.lb3.mul_lower(&self.lb.c0_incr[nta]),
                p0.ub3.mul_upper(&self.ub.c0_incr[nta]),
            );
        }
        if flags.m1_interesting() {
            let p1 = diag.expect("diagonal neighbor in the body");
            m[1] = (
                p1.lb3.mul_lower(&self.lb.c1_incr[nta * 4 + ntb]),
                p1.ub3.mul_upper(&self.ub.c1_incr[nta * 4 + ntb]),
            );
        }
        if flags.m2_interesting() {
            let p2 = left.expect("left neighbor in the body");
            m[2] = (
                p2.lb2.mul_lower(&self.lb.c2_incr[ntb]),
                p2.ub2.mul_upper(&self.ub.c2_incr[ntb]),
            );
        }
        m
    }
}

impl Strategy for BoundStrategy<'_> {
    type Cell = BoundCell;

    fn blank(&self) -> BoundCell {
        BoundCell {
            lb2: Mag::zero(),
            ub2: Mag::zero(),
            lb3: Mag::zero(),
            ub3: Mag::zero(),
        }
    }

    fn visit(
        &mut self,
        tableau: &mut Tableau,
        i: usize,
        j: usize,
        curr: &mut BoundCell,
        top: Option<&BoundCell>,
        diag: Option<&BoundCell>,
        left: Option<&BoundCell>,
    ) -> ControlFlow<()> {
        let flags = tableau.get(i, j);
        let m = if i < 1 || j < 1 {
            self.boundary(i, j, top, left)
        } else {
            self.center(flags, i, j, top, diag, left)
        };

        // Update the bounds of whichever maxima are interesting.
        if flags.contains(CellFlags::MAX2) {
            curr.lb2 = Mag::zero();
            curr.ub2 = Mag::zero();
            if flags.contains(CellFlags::MAX2_M1) {
                curr.lb2 = curr.lb2.max(m[1].0);
                curr.ub2 = curr.ub2.max(m[1].1);
            }
            if flags.contains(CellFlags::MAX2_M2) {
                curr.lb2 = curr.lb2.max(m[2].0);
                curr.ub2 = curr.ub2.max(m[2].1);
            }
        }
        if flags.contains(CellFlags::MAX3) {
            curr.lb3 = Mag::zero();
            curr.ub3 = Mag::zero();
            for (bit, k) in [
                (CellFlags::MAX3_M0, 0),
                (CellFlags::MAX3_M1, 1),
                (CellFlags::MAX3_M2, 2),
            ] {
                if flags.contains(bit) {
                    curr.lb3 = curr.lb3.max(m[k].0);
                    curr.ub3 = curr.ub3.max(m[k].1);
                }
            }
        }

        // Prune candidates whose upper bound cannot reach the max.
        let mut updated = flags;
        if flags.contains(CellFlags::MAX2) {
            if flags.contains(CellFlags::MAX2_M1) && m[1].1 < curr.lb2 {
                updated.remove(CellFlags::MAX2_M1);
            }
            if flags.contains(CellFlags::MAX2_M2) && m[2].1 < curr.lb2 {
                updated.remove(CellFlags::MAX2_M2);
            }
        }
        if flags.contains(CellFlags::MAX3) {
            for (bit, k) in [
                (CellFlags::MAX3_M0, 0),
                (CellFlags::MAX3_M1, 1),
                (CellFlags::MAX3_M2, 2),
            ] {
                if flags.contains(bit) && m[k].1 < curr.lb3 {
                    updated.remove(bit);
                }
            }
        }
        *tableau.get_mut(i, j) = updated;

        if i == tableau.nrows() - 1 && j == tableau.ncols() - 1 {
            self.corner = Some((curr.lb3, curr.ub3));
        }
        ControlFlow::Continue(())
    }
}
