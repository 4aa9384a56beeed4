//! Dense matrices of arbitrary-precision integers.

use num_bigint::BigInt;
use num_traits::{One, Zero};
use std::ops::{Index, IndexMut};

/// A dense row-major integer matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntMat {
    data: Vec<BigInt>,
    nrows: usize,
    ncols: usize,
}

impl IntMat {
    /// A zero matrix of the given shape.
    #[must_use]
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![BigInt::zero(); nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// The identity matrix of order `n`.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        let mut mat = Self::zeros(n, n);
        for i in 0..n {
            mat[(i, i)] = BigInt::one();
        }
        mat
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

    /// A whole row as a slice.
    #[must_use]
    pub fn row(&self, i: usize) -> &[BigInt] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    /// Whether row `i` is entirely zero.
    #[must_use]
    pub fn is_zero_row(&self, i: usize) -> bool {
        self.row(i).iter().all(Zero::is_zero)
    }

    /// Matrix product.
    ///
    /// # Panics
    ///
    /// Panics when the inner dimensions disagree.
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        assert_eq!(self.ncols, other.nrows, "matrix dimensions are incompatible");
        let mut out = Self::zeros(self.nrows, other.ncols);
        for i in 0..self.nrows {
            for k in 0..self.ncols {
                let a = &self[(i, k)];
                if a.is_zero() {
                    continue;
                }
                for j in 0..other.ncols {
                    let term = a * &other[(k, j)];
                    out[(i, j)] += term;
                }
            }
        }
        out
    }

    /// Swaps two rows.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.ncols {
            self.data
                .swap(a * self.ncols + j, b * self.ncols + j);
        }
    }

    /// Negates row `i`.
    pub fn negate_row(&mut self, i: usize) {
        for j in 0..self.ncols {
            let v = -std::mem::take(&mut self[(i, j)]);
            self[(i, j)] = v;
        }
    }

    /// Adds `factor` times row `src` to row `dst`.
    pub fn add_multiple_of_row(&mut self, dst: usize, src: usize, factor: &BigInt) {
        if factor.is_zero() {
            return;
        }
        for j in 0..self.ncols {
            let term = factor * &self[(src, j)];
            self[(dst, j)] += term;
        }
    }

    /// Scales the whole matrix by −1.
    pub fn negate(&mut self) {
        for v in &mut self.data {
            *v = -std::mem::take(v);
        }
    }

    /// Fraction-free (Bareiss) determinant of a square matrix.
    ///
    /// # Panics
    ///
    /// Panics when the matrix is not square.
    #[must_use]
    pub fn determinant(&self) -> BigInt {
        assert_eq!(self.nrows, self.ncols, "determinant of a non-square matrix");
        let n = self.nrows;
        if n == 0 {
            return BigInt::one();
        }
        let mut m = self.clone();
        let mut sign = BigInt::one();
        let mut prev = BigInt::one();
        for k in 0..n - 1 {
            if m[(k, k)].is_zero() {
                let Some(pivot) = (k + 1..n).find(|&i| !m[(i, k)].is_zero()) else {
                    return BigInt::zero();
                };
                m.swap_rows(k, pivot);
                sign = -sign;
            }
            for i in k + 1..n {
                for j in k + 1..n {
                    let numerator = &m[(k, k)] * &m[(i, j)] - &m[(i, k)] * &m[(k, j)];
                    m[(i, j)] = numerator / &prev;
                }
                m[(i, k)] = BigInt::zero();
            }
            prev = m[(k, k)].clone();
        }
        sign * m[(n - 1, n - 1)].clone()
    }
}

impl Index<(usize, usize)> for IntMat {
    type Output = BigInt;

    fn index(&self, (i, j): (usize, usize)) -> &BigInt {
        assert!(i < self.nrows && j < self.ncols);
        &self.data[i * self.ncols + j]
    }
}

impl IndexMut<(usize, usize)> for IntMat {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut BigInt {
        assert!(i < self.nrows && j < self.ncols);
        &mut self.data[i * self.ncols + j]
    }
}
