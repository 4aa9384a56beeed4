//! Counting co-optimal alignments.
//!
//! Runs on a certified tableau: each cell accumulates the number of
//! distinct traceback paths reaching it through the live direction
//! bits, restricted to cells on the generalized traceback. The count at
//! the bottom-right corner is the answer.

use crate::dp::{CellFlags, Tableau};
use crate::forward::{forward, Strategy};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::ops::ControlFlow;

struct CountStrategy {
    total: BigUint,
}

impl Strategy for CountStrategy {
    type Cell = BigUint;

    fn blank(&self) -> BigUint {
        BigUint::zero()
    }

    fn visit(
        &mut self,
        tableau: &mut Tableau,
        i: usize,
        j: usize,
        curr: &mut BigUint,
        top: Option<&BigUint>,
        diag: Option<&BigUint>,
        left: Option<&BigUint>,
    ) -> ControlFlow<()> {
        let flags = tableau.get(i, j);
        *curr = BigUint::zero();
        if flags.contains(CellFlags::TRACE) {
            if i == 0 && j == 0 {
                *curr = BigUint::one();
            }
            if let Some(count) = top {
                if flags.contains(CellFlags::MAX3_M0) {
                    *curr += count;
                }
            }
            if let Some(count) = diag {
                if flags.contains(CellFlags::MAX3_M1) {
                    *curr += count;
                }
            }
            if let Some(count) = left {
                if flags.contains(CellFlags::MAX3_M2) {
                    *curr += count;
                }
            }
        }

        if i == tableau.nrows() - 1 && j == tableau.ncols() - 1 {
            self.total.clone_from(curr);
        }
        ControlFlow::Continue(())
    }
}

/// Counts the distinct optimal tracebacks recorded in the tableau.
#[must_use]
pub fn count_solutions(tableau: &mut Tableau) -> BigUint {
    let mut strategy = CountStrategy {
        total: BigUint::zero(),
    };
    let _ = forward(tableau, &mut strategy);
    strategy.total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_diagonal_path_counts_one() {
        let mut t = Tableau::new(2, 2);
        *t.get_mut(0, 0) = CellFlags::MAX3 | CellFlags::TRACE;
        *t.get_mut(0, 1) = CellFlags::empty();
        *t.get_mut(1, 0) = CellFlags::empty();
        *t.get_mut(1, 1) = CellFlags::MAX3 | CellFlags::MAX3_M1 | CellFlags::TRACE;
        assert_eq!(count_solutions(&mut t), BigUint::from(1u32));
    }

    #[test]
    fn two_paths_around_a_square() {
        // Both the delete-then-insert and insert-then-delete corners are
        // live; the diagonal is not.
        let mut t = Tableau::new(2, 2);
        *t.get_mut(0, 0) = CellFlags::MAX3 | CellFlags::MAX2 | CellFlags::TRACE;
        *t.get_mut(0, 1) =
            CellFlags::MAX3 | CellFlags::MAX3_M2 | CellFlags::MAX2 | CellFlags::TRACE;
        *t.get_mut(1, 0) = CellFlags::MAX3 | CellFlags::MAX3_M0 | CellFlags::TRACE;
        *t.get_mut(1, 1) =
            CellFlags::MAX3 | CellFlags::MAX3_M0 | CellFlags::MAX3_M2 | CellFlags::TRACE;
        assert_eq!(count_solutions(&mut t), BigUint::from(2u32));
    }

    #[test]
    fn off_trace_cells_do_not_contribute() {
        let mut t = Tableau::new(2, 2);
        *t.get_mut(0, 0) = CellFlags::MAX3 | CellFlags::TRACE;
        // Live bits but no TRACE mark: contributes zero.
        *t.get_mut(0, 1) = CellFlags::MAX3 | CellFlags::MAX3_M2;
        *t.get_mut(1, 0) = CellFlags::MAX3 | CellFlags::MAX3_M0 | CellFlags::TRACE;
        *t.get_mut(1, 1) =
            CellFlags::MAX3 | CellFlags::MAX3_M0 | CellFlags::MAX3_M2 | CellFlags::TRACE;
        assert_eq!(count_solutions(&mut t), BigUint::from(1u32));
    }

    #[test]
    fn empty_tableau_counts_one() {
        let mut t = Tableau::new(1, 1);
        *t.get_mut(0, 0) = CellFlags::MAX3 | CellFlags::TRACE;
        assert_eq!(count_solutions(&mut t), BigUint::from(1u32));
    }
}
