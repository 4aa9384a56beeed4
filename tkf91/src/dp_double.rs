//! Uncertified floating-point dynamic programming.
//!
//! One generic implementation covers the `float` and `double` fast
//! paths. The full dense recurrence runs in machine precision with no
//! flags, no backward pass and no verification; the traceback applies a
//! relative tolerance when deciding which candidates tie with the
//! maximum, preferring deletion over substitution over insertion.

use crate::expr::ExprRegistry;
use crate::generator_vecs::generator_log_scores;
use crate::generators::{GeneratorIndices, GeneratorValues};
use crate::matrix::IntMat;
use crate::sequence::encode;
use num_traits::Float;

/// Ball level the generator values are truncated from.
const VALUE_LEVEL: usize = 8;

struct FloatTableau<F> {
    data: Vec<[F; 3]>,
    ncols: usize,
}

impl<F: Float> FloatTableau<F> {
    fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![[F::neg_infinity(); 3]; nrows * ncols],
            ncols,
        }
    }

    fn get(&self, i: usize, j: usize) -> [F; 3] {
        self.data[i * self.ncols + j]
    }

    fn set(&mut self, i: usize, j: usize, cell: [F; 3]) {
        self.data[i * self.ncols + j] = cell;
    }
}

fn max3<F: Float>(cell: [F; 3]) -> F {
    cell[0].max(cell[1]).max(cell[2])
}

fn max2<F: Float>(cell: [F; 3]) -> F {
    cell[1].max(cell[2])
}

/// Runs the uncertified recurrence and extracts one alignment.
///
/// Returns the aligned rows and the corner log-score. `rtol` is the
/// relative tolerance for treating a candidate as tied with the
/// maximum during traceback; zero demands exact equality.
pub fn align_uncertified<F: Float + Into<f64>>(
    gmat: &IntMat,
    reg: &mut ExprRegistry,
    g: &GeneratorIndices,
    a: &[u8],
    b: &[u8],
    rtol: f64,
) -> (String, String, f64) {
    let scores = generator_log_scores(gmat, reg, VALUE_LEVEL);
    let h: GeneratorValues<F> =
        GeneratorValues::from_fn(g, |i| F::from(scores[i].to_f64()).unwrap());

    let nrows = a.len() + 1;
    let ncols = b.len() + 1;
    let mut mat = FloatTableau::<F>::new(nrows, ncols);

    // Corner.
    let mut corner = [F::neg_infinity(); 3];
    corner[1] = h.m1_00;
    mat.set(0, 0, corner);

    // Top edge.
    for j in 1..ncols {
        let ntb = usize::from(b[j - 1]);
        let mut cell = [F::neg_infinity(); 3];
        cell[2] = if j == 1 {
            h.m2_01
        } else {
            max2(mat.get(0, j - 1)) + h.m2_0j_incr[ntb]
        };
        mat.set(0, j, cell);
    }

    // Left edge.
    for i in 1..nrows {
        let nta = usize::from(a[i - 1]);
        let mut cell = [F::neg_infinity(); 3];
        cell[0] = if i == 1 {
            h.m0_10
        } else {
            max3(mat.get(i - 1, 0)) + h.m0_i0_incr[nta]
        };
        mat.set(i, 0, cell);
    }

    // Body, row-major.
    for i in 1..nrows {
        let nta = usize::from(a[i - 1]);
        let c0 = h.c0_incr[nta];
        let c1 = &h.c1_incr[nta * 4..nta * 4 + 4];
        for j in 1..ncols {
            let ntb = usize::from(b[j - 1]);
            let cell = [
                max3(mat.get(i - 1, j)) + c0,
                max3(mat.get(i - 1, j - 1)) + c1[ntb],
                max2(mat.get(i, j - 1)) + h.c2_incr[ntb],
            ];
            mat.set(i, j, cell);
        }
    }

    let score: f64 = max3(mat.get(nrows - 1, ncols - 1)).into();
    let (sa, sb) = traceback(&mat, a, b, rtol);
    (sa, sb, score)
}

/// Walks back from the corner, treating candidates within `rtol` of the
/// maximum as ties and picking the first of m0, m1, m2 among them.
fn traceback<F: Float + Into<f64>>(
    mat: &FloatTableau<F>,
    a: &[u8],
    b: &[u8],
    rtol: f64,
) -> (String, String) {
    let mut sa: Vec<char> = Vec::with_capacity(a.len() + b.len());
    let mut sb: Vec<char> = Vec::with_capacity(a.len() + b.len());
    let mut i = a.len();
    let mut j = b.len();
    let rtol = F::from(rtol).unwrap();

    while i > 0 || j > 0 {
        let cell = mat.get(i, j);
        let best = max3(cell);
        let slack = rtol * best.abs();
        let tied = |m: F| m.is_finite() && best - m <= slack;
        if i > 0 && tied(cell[0]) {
            sa.push(encode(a[i - 1]));
            sb.push('-');
            i -= 1;
        } else if i > 0 && j > 0 && tied(cell[1]) {
            sa.push(encode(a[i - 1]));
            sb.push(encode(b[j - 1]));
            i -= 1;
            j -= 1;
        } else if j > 0 && tied(cell[2]) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::Tkf91Expressions;
    use crate::generators::{build_tkf91_generators, GeneratorRegistry};
    use crate::params::tests::uniform_params;
    use crate::rationals::TkfRationals;
    use float_cmp::approx_eq;

    fn solve_double(a: &[u8], b: &[u8]) -> (String, String, f64) {
        let params = uniform_params();
        let r = TkfRationals::new(&params);
        let mut reg = ExprRegistry::new();
        let p = Tkf91Expressions::new(&mut reg, &r);
        let mut gens = GeneratorRegistry::new();
        let g = build_tkf91_generators(&mut gens, &mut reg, &r, &p, a, b).unwrap();
        let gmat = gens.finalize(&mut reg);
        align_uncertified::<f64>(&gmat, &mut reg, &g, a, b, 0.0)
    }

    #[test]
    fn equal_singletons_align_as_match() {
        let (sa, sb, score) = solve_double(&[0], &[0]);
        assert_eq!(sa, "A");
        assert_eq!(sb, "A");
        assert!(score < 0.0);
    }

    #[test]
    fn empty_second_sequence_is_all_deletions() {
        let (sa, sb, _) = solve_double(&[0, 1], &[]);
        assert_eq!(sa, "AC");
        assert_eq!(sb, "--");
    }

    #[test]
    fn empty_first_sequence_is_all_insertions() {
        let (sa, sb, _) = solve_double(&[], &[3, 2]);
        assert_eq!(sa, "--");
        assert_eq!(sb, "TG");
    }

    #[test]
    fn float_and_double_agree_on_unambiguous_inputs() {
        let params = uniform_params();
        let r = TkfRationals::new(&params);
        let mut reg = ExprRegistry::new();
        let p = Tkf91Expressions::new(&mut reg, &r);
        let a = [0, 1, 2, 3, 0, 1];
        let b = [0, 1, 2, 3, 0, 1];
        let mut gens = GeneratorRegistry::new();
        let g = build_tkf91_generators(&mut gens, &mut reg, &r, &p, &a, &b).unwrap();
        let gmat = gens.finalize(&mut reg);
        let (sa64, sb64, s64) = align_uncertified::<f64>(&gmat, &mut reg, &g, &a, &b, 0.0);
        let (sa32, sb32, s32) = align_uncertified::<f32>(&gmat, &mut reg, &g, &a, &b, 0.0);
        assert_eq!(sa64, sa32);
        assert_eq!(sb64, sb32);
        assert!(approx_eq!(f64, s64, s32, epsilon = 1e-3));
    }

    #[test]
    fn homopolymer_aligns_residue_by_residue() {
        let (sa, sb, _) = solve_double(&[0; 8], &[0; 8]);
        assert_eq!(sa, "AAAAAAAA");
        assert_eq!(sb, "AAAAAAAA");
    }
}
