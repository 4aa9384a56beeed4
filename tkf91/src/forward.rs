//! Row-major forward driver over the tableau.
//!
//! The driver visits every cell whose flags still mark one of the two
//! maxima as interesting, handing the strategy the cell's own data slot
//! plus read-only views of the top, diagonal and left neighbors. Only
//! two rows of strategy data are alive at any time; the driver swaps
//! the row buffers as it advances. A strategy can abort the sweep by
//! breaking, which the certifying driver reads as "tie not confirmed".

use crate::dp::{CellFlags, Tableau};
use std::ops::ControlFlow;

/// One per-cell visitor with its own cell payload.
pub trait Strategy {
    /// The per-cell scratch the driver keeps two rows of.
    type Cell: Clone;

    /// A fresh, empty cell payload.
    fn blank(&self) -> Self::Cell;

    /// Visits cell `(i, j)`. Neighbor slots are `None` off-tableau.
    /// Breaking aborts the sweep immediately.
    fn visit(
        &mut self,
        tableau: &mut Tableau,
        i: usize,
        j: usize,
        curr: &mut Self::Cell,
        top: Option<&Self::Cell>,
        diag: Option<&Self::Cell>,
        left: Option<&Self::Cell>,
    ) -> ControlFlow<()>;
}

/// Runs one forward sweep. Returns `Break` if the strategy aborted.
pub fn forward<S: Strategy>(tableau: &mut Tableau, strategy: &mut S) -> ControlFlow<()> {
    let nrows = tableau.nrows();
    let ncols = tableau.ncols();

    let mut row: Vec<S::Cell> = (0..ncols).map(|_| strategy.blank()).collect();
    let mut alt: Vec<S::Cell> = (0..ncols).map(|_| strategy.blank()).collect();

    for i in 0..nrows {
        for j in 0..ncols {
            let flags = tableau.get(i, j);
            if !flags.intersects(CellFlags::MAX2 | CellFlags::MAX3) {
                continue;
            }
            let (before, rest) = row.split_at_mut(j);
            let curr = &mut rest[0];
            let left = before.last();
            let top = (i > 0).then(|| &alt[j]);
            let diag = (i > 0 && j > 0).then(|| &alt[j - 1]);
            strategy.visit(tableau, i, j, curr, top, diag, left)?;
        }
        std::mem::swap(&mut row, &mut alt);
    }
    ControlFlow::Continue(())
}
