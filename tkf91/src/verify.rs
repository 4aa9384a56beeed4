//! The symbolic verification strategy.
//!
//! After the numeric passes have pruned everything they can, any cell
//! that still carries two or more live candidates holds a numerical
//! tie. This pass re-runs the recurrence over exact integer score
//! vectors in the rank-`r` Hermite basis and demands that all live
//! candidates in a cell be element-wise equal. A completed sweep proves
//! the surviving ties are algebraic, so no finite-precision rounding
//! can reorder them and the canonical traceback is globally optimal. A
//! detected inequality aborts the sweep; the driver reads that as "tie
//! not yet confirmed" and escalates precision.

use crate::dp::{CellFlags, Tableau};
use crate::forward::Strategy;
use crate::generators::{GeneratorIndices, GeneratorValues};
use crate::matrix::IntMat;
use itertools::izip;
use num_bigint::BigInt;
use std::ops::ControlFlow;

type Vector = Vec<BigInt>;

fn vec_add(base: &[BigInt], incr: &[BigInt]) -> Vector {
    izip!(base, incr).map(|(a, b)| a + b).collect()
}

/// Integer score vectors for the two maxima of one cell.
#[derive(Clone)]
pub struct VerifyCell {
    max2: Vector,
    max3: Vector,
}

/// Symbolic verification state.
pub struct VerifyStrategy<'s> {
    rank: usize,
    h: GeneratorValues<Vector>,
    a: &'s [u8],
    b: &'s [u8],
    corner: Option<Vector>,
}

impl<'s> VerifyStrategy<'s> {
    /// Builds the per-generator score vectors from the truncated
    /// inverse transform.
    #[must_use]
    pub fn new(
        g: &GeneratorIndices,
        v: &IntMat,
        rank: usize,
        a: &'s [u8],
        b: &'s [u8],
    ) -> Self {
        let h = crate::generator_vecs::score_vectors(g, v, rank);
        Self {
            rank,
            h,
            a,
            b,
            corner: None,
        }
    }

    /// The corner cell's three-way max score vector after a successful
    /// sweep.
    #[must_use]
    pub fn corner(&self) -> Option<&Vector> {
        self.corner.as_ref()
    }

    fn zero_vec(&self) -> Vector {
        vec![BigInt::from(0); self.rank]
    }

    fn boundary(
        &self,
        i: usize,
        j: usize,
        top: Option<&VerifyCell>,
        left: Option<&VerifyCell>,
    ) -> [Vector; 3] {
        let mut m = [self.zero_vec(), self.zero_vec(), self.zero_vec()];
        match (i, j) {
            (0, 0) => m[1].clone_from(&self.h.m1_00),
            (1, 0) => m[0].clone_from(&self.h.m0_10),
            (0, 1) => m[2].clone_from(&self.h.m2_01),
            (0, _) => {
                let nt = usize::from(self.b[j - 1]);
                let p2 = left.expect("left neighbor on the top edge");
                m[2] = vec_add(&p2.max2, &self.h.m2_0j_incr[nt]);
            }
            (_, 0) => {
                let nt = usize::from(self.a[i - 1]);
                let p0 = top.expect("top neighbor on the left edge");
                m[0] = vec_add(&p0.max3, &self.h.m0_i0_incr[nt]);
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
        top: Option<&VerifyCell>,
        diag: Option<&VerifyCell>,
        left: Option<&VerifyCell>,
    ) -> [Vector; 3] {
        let mut m = [self.zero_vec(), self.zero_vec(), self.zero_vec()];
        let nta = usize::from(self.a[i - 1]);
        let ntb = usize::from(self.b[j - 1]);

        if flags.m0_interesting() {
            let p0 = top.expect("top neighbor in the body");
            m[0] = vec_add(&p0.max3, &self.h.c0_incr[nta]);
        }
        if flags.m1_interesting() {
            let p1 = diag.expect("diagonal neighbor in the body");
            m[1] = vec_add(&p1.max3, &self.h.c1_incr[nta * 4 + ntb]);
        }
        if flags.m2_interesting() {
            let p2 = left.expect("left neighbor in the body");
            m[2] = vec_add(&p2.max2, &self.h.c2_incr[ntb]);
        }
        m
    }

    /// Every pair of live candidates must carry identical vectors.
    fn consensus(flags: CellFlags, m: &[Vector; 3]) -> bool {
        if flags.contains(CellFlags::MAX2)
            && flags.contains(CellFlags::MAX2_M1)
            && flags.contains(CellFlags::MAX2_M2)
            && m[1] != m[2]
        {
            return false;
        }
        if flags.contains(CellFlags::MAX3) {
            let pairs = [
                (CellFlags::MAX3_M0, CellFlags::MAX3_M1, 0, 1),
                (CellFlags::MAX3_M1, CellFlags::MAX3_M2, 1, 2),
                (CellFlags::MAX3_M2, CellFlags::MAX3_M0, 2, 0),
            ];
            for (ba, bb, ka, kb) in pairs {
                if flags.contains(ba) && flags.contains(bb) && m[ka] != m[kb] {
                    return false;
                }
            }
        }
        true
    }
}

impl Strategy for VerifyStrategy<'_> {
    type Cell = VerifyCell;

    fn blank(&self) -> VerifyCell {
        VerifyCell {
            max2: self.zero_vec(),
            max3: self.zero_vec(),
        }
    }

    fn visit(
        &mut self,
        tableau: &mut Tableau,
        i: usize,
        j: usize,
        curr: &mut VerifyCell,
        top: Option<&VerifyCell>,
        diag: Option<&VerifyCell>,
        left: Option<&VerifyCell>,
    ) -> ControlFlow<()> {
        let flags = tableau.get(i, j);
        let m = if i < 1 || j < 1 {
            self.boundary(i, j, top, left)
        } else {
            self.center(flags, i, j, top, diag, left)
        };

        if !Self::consensus(flags, &m) {
            return ControlFlow::Break(());
        }

        // All live candidates agree; store any of them.
        if flags.contains(CellFlags::MAX2) {
            if flags.contains(CellFlags::MAX2_M1) {
                curr.max2.clone_from(&m[1]);
            } else if flags.contains(CellFlags::MAX2_M2) {
                curr.max2.clone_from(&m[2]);
            }
        }
        if flags.contains(CellFlags::MAX3) {
            if flags.contains(CellFlags::MAX3_M0) {
                curr.max3.clone_from(&m[0]);
            } else if flags.contains(CellFlags::MAX3_M1) {
                curr.max3.clone_from(&m[1]);
            } else if flags.contains(CellFlags::MAX3_M2) {
                curr.max3.clone_from(&m[2]);
            }
        }

        if i == tableau.nrows() - 1 && j == tableau.ncols() - 1 {
            self.corner = Some(curr.max3.clone());
        }
        ControlFlow::Continue(())
    }
}
