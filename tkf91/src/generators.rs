//! Generators: the symbolic products the DP recurrence is built from.
//!
//! Each generator is a multiset of rational factors and expression
//! factors with integer exponents. Finalizing the registry runs factor
//! refinement over every rational numerator and denominator, registers
//! the coprime bases as constant expressions, and emits the integer
//! exponent matrix `G` (rows: generators, columns: expressions).

use crate::error::Result;
use crate::expr::{tenacious_strict_gt, ExprId, ExprRegistry};
use crate::expressions::Tkf91Expressions;
use crate::matrix::IntMat;
use crate::rationals::TkfRationals;
use crate::refine::{decompose, factor_refine};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;

struct GenEntry {
    rats: Vec<(BigRational, i64)>,
    exprs: Vec<(ExprId, i64)>,
}

/// Registry of generators under construction.
#[derive(Default)]
pub struct GeneratorRegistry {
    gens: Vec<GenEntry>,
}

impl GeneratorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of generators registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gens.len()
    }

    /// Whether no generator has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gens.is_empty()
    }

    /// Opens a new generator; the returned builder appends factors and
    /// yields the generator's index on [`GeneratorBuilder::finish`].
    pub fn begin(&mut self) -> GeneratorBuilder<'_> {
        self.gens.push(GenEntry {
            rats: Vec::new(),
            exprs: Vec::new(),
        });
        GeneratorBuilder {
            reg: self,
        }
    }

    /// Runs factor refinement over all rational factors, registers the
    /// refined bases as constant expressions, and produces the exponent
    /// matrix over the full expression registry.
    ///
    /// # Panics
    ///
    /// Panics if a rational factor is not positive or fails to reduce
    /// over the refined bases.
    #[must_use]
    pub fn finalize(self, reg: &mut ExprRegistry) -> IntMat {
        let mut pool: Vec<BigInt> = Vec::new();
        for gen in &self.gens {
            for (q, _) in &gen.rats {
                assert!(
                    q.is_positive(),
                    "generator rational factors must be positive"
                );
                pool.push(q.numer().clone());
                pool.push(q.denom().clone());
            }
        }
        let bases: Vec<BigInt> = factor_refine(&pool)
            .into_iter()
            .map(|(base, _)| base)
            .collect();
        let base_cols: Vec<usize> = bases
            .iter()
            .map(|base| reg.int(base.clone()).index())
            .collect();

        let mut mat = IntMat::zeros(self.gens.len(), reg.len());
        for (row, gen) in self.gens.iter().enumerate() {
            for (x, count) in &gen.exprs {
                mat[(row, x.index())] += BigInt::from(*count);
            }
            for (q, count) in &gen.rats {
                let numer =
                    decompose(q.numer(), &bases).expect("numerator could not be reduced");
                let denom =
                    decompose(q.denom(), &bases).expect("denominator could not be reduced");
                for (k, (ne, de)) in numer.iter().zip(&denom).enumerate() {
                    let exponent = BigInt::from(*count) * (BigInt::from(*ne) - BigInt::from(*de));
                    mat[(row, base_cols[k])] += exponent;
                }
            }
        }
        mat
    }
}

/// Appends factors to the generator most recently opened.
pub struct GeneratorBuilder<'a> {
    reg: &'a mut GeneratorRegistry,
}

impl GeneratorBuilder<'_> {
    fn entry(&mut self) -> &mut GenEntry {
        self.reg.gens.last_mut().expect("builder without an open generator")
    }

    /// Appends a rational factor with the given exponent.
    pub fn rat(&mut self, q: &BigRational, count: i64) {
        let q = q.clone();
        self.entry().rats.push((q, count));
    }

    /// Appends an expression factor with the given exponent.
    pub fn expr(&mut self, x: ExprId, count: i64) {
        self.entry().exprs.push((x, count));
    }

    /// Closes the generator, returning its index.
    ///
    /// # Panics
    ///
    /// Panics on an empty generator.
    #[must_use]
    pub fn finish(mut self) -> usize {
        let empty = {
            let entry = self.entry();
            entry.rats.is_empty() && entry.exprs.is_empty()
        };
        assert!(!empty, "empty generator entries are forbidden");
        self.reg.gens.len() - 1
    }
}

/// Stable positions of the named TKF91 generators in the registry.
#[derive(Clone, Debug)]
pub struct GeneratorIndices {
    /// Initial match cell value M1(0,0).
    pub m1_00: usize,
    /// First deletion-column value M0(1,0).
    pub m0_10: usize,
    /// Left-edge downward increments, per nucleotide.
    pub m0_i0_incr: [usize; 4],
    /// First insertion-column value M2(0,1).
    pub m2_01: usize,
    /// Top-edge rightward increments, per nucleotide.
    pub m2_0j_incr: [usize; 4],
    /// Body top-neighbor increments, per nucleotide.
    pub c0_incr: [usize; 4],
    /// Body diagonal increments, per (a, b) pair.
    pub c1_incr: [usize; 16],
    /// Body left-neighbor increments, per nucleotide.
    pub c2_incr: [usize; 4],
}

/// Per-generator values in the named-generator schema, for any payload
/// type a strategy carries (magnitude pairs, balls, score vectors).
#[derive(Clone, Debug)]
pub struct GeneratorValues<T> {
    /// Value for M1(0,0).
    pub m1_00: T,
    /// Value for M0(1,0).
    pub m0_10: T,
    /// Value for M2(0,1).
    pub m2_01: T,
    /// Left-edge increments.
    pub m0_i0_incr: [T; 4],
    /// Top-edge increments.
    pub m2_0j_incr: [T; 4],
    /// Body top increments.
    pub c0_incr: [T; 4],
    /// Body diagonal increments, row-major over (a, b).
    pub c1_incr: [T; 16],
    /// Body left increments.
    pub c2_incr: [T; 4],
}

impl<T> GeneratorValues<T> {
    /// Maps each named generator index through `f`.
    pub fn from_fn(g: &GeneratorIndices, mut f: impl FnMut(usize) -> T) -> Self {
        Self {
            m1_00: f(g.m1_00),
            m0_10: f(g.m0_10),
            m2_01: f(g.m2_01),
            m0_i0_incr: std::array::from_fn(|i| f(g.m0_i0_incr[i])),
            m2_0j_incr: std::array::from_fn(|i| f(g.m2_0j_incr[i])),
            c0_incr: std::array::from_fn(|i| f(g.c0_incr[i])),
            c1_incr: std::array::from_fn(|i| f(g.c1_incr[i])),
            c2_incr: std::array::from_fn(|i| f(g.c2_incr[i])),
        }
    }
}

fn add_p0_bar(g: &mut GeneratorBuilder<'_>, r: &TkfRationals, p: &Tkf91Expressions, k: i64) {
    g.rat(&r.mu, k);
    g.expr(p.beta, k);
}

fn add_gamma_0(g: &mut GeneratorBuilder<'_>, r: &TkfRationals, k: i64) {
    g.rat(&r.one_minus_lambda_div_mu, k);
}

fn add_gamma_1(g: &mut GeneratorBuilder<'_>, r: &TkfRationals, k: i64) {
    g.rat(&r.one_minus_lambda_div_mu, k);
    g.rat(&r.lambda_div_mu, k);
}

fn add_zeta_1(g: &mut GeneratorBuilder<'_>, p: &Tkf91Expressions, k: i64) {
    g.expr(p.one_minus_lambda_beta, k);
}

fn add_zeta_2(g: &mut GeneratorBuilder<'_>, r: &TkfRationals, p: &Tkf91Expressions, k: i64) {
    g.expr(p.one_minus_lambda_beta, k);
    g.rat(&r.lambda, k);
    g.expr(p.beta, k);
}

fn add_p1(g: &mut GeneratorBuilder<'_>, p: &Tkf91Expressions, k: i64) {
    g.expr(p.exp_neg_mu_tau, k);
    g.expr(p.one_minus_lambda_beta, k);
}

fn add_p1_bar(g: &mut GeneratorBuilder<'_>, p: &Tkf91Expressions, k: i64) {
    g.expr(p.the_long_beta_expression, k);
    g.expr(p.one_minus_lambda_beta, k);
}

/// Builds the named TKF91 generators.
///
/// The construction depends on the inputs in two ways: the two
/// initialization generators name the first character of each sequence,
/// and each diagonal increment chooses between two algebraic forms by a
/// tenacious strict comparison of `P_{a→b}·p1` against `π_b·p̄1`.
///
/// Empty sequences take nucleotide 0 as a placeholder in the boundary
/// generator they cannot reach.
///
/// # Errors
///
/// Propagates [`crate::Error::ComparisonExhausted`] from the tie
/// decisions.
pub fn build_tkf91_generators(
    gens: &mut GeneratorRegistry,
    reg: &mut ExprRegistry,
    r: &TkfRationals,
    p: &Tkf91Expressions,
    a: &[u8],
    b: &[u8],
) -> Result<GeneratorIndices> {
    let first_a = usize::from(a.first().copied().unwrap_or(0));
    let first_b = usize::from(b.first().copied().unwrap_or(0));

    // M1(0, 0) = gamma_0 * zeta_1
    let m1_00 = {
        let mut g = gens.begin();
        add_gamma_0(&mut g, r, 1);
        add_zeta_1(&mut g, p, 1);
        g.finish()
    };

    // M0(1, 0) = gamma_1 * zeta_1 * pi_{A_1} * p0_bar
    let m0_10 = {
        let mut g = gens.begin();
        add_gamma_1(&mut g, r, 1);
        add_zeta_1(&mut g, p, 1);
        g.rat(&r.pi[first_a], 1);
        add_p0_bar(&mut g, r, p, 1);
        g.finish()
    };

    // M0(i>1, 0) increments, one per nucleotide.
    let m0_i0_incr = build4(|i| {
        let mut g = gens.begin();
        g.rat(&r.lambda_div_mu, 1); // contribution from gamma
        g.rat(&r.lambda, 1); // contribution from zeta
        g.expr(p.beta, 1);
        g.rat(&r.pi[i], 1);
        add_p0_bar(&mut g, r, p, 1);
        g.finish()
    });

    // M2(0, 1) = gamma_0 * zeta_2 * pi_{B_1}
    let m2_01 = {
        let mut g = gens.begin();
        add_gamma_0(&mut g, r, 1);
        add_zeta_2(&mut g, r, p, 1);
        g.rat(&r.pi[first_b], 1);
        g.finish()
    };

    // M2(0, j>1) increments, one per nucleotide.
    let m2_0j_incr = build4(|j| {
        let mut g = gens.begin();
        g.rat(&r.lambda, 1); // contribution from zeta
        g.expr(p.beta, 1);
        g.rat(&r.pi[j], 1);
        g.finish()
    });

    // C0 multiplier for the M0(i, j) recursion.
    let c0_incr = build4(|i| {
        let mut g = gens.begin();
        g.rat(&r.lambda_div_mu, 1);
        g.rat(&r.pi[i], 1);
        add_p0_bar(&mut g, r, p, 1);
        g.finish()
    });

    // C1 multiplier for the M1(i, j) recursion. The algebraic form is a
    // precomputable argmax over P_{a->b}*p1 versus pi_b*p1_bar.
    let tmp_p1 = reg.mul(p.exp_neg_mu_tau, p.one_minus_lambda_beta);
    let tmp_p1_bar = reg.mul(p.the_long_beta_expression, p.one_minus_lambda_beta);
    let mut c1_incr = [0usize; 16];
    for j in 0..4 {
        let rhs = reg.mul(p.pi[j], tmp_p1_bar);
        for i in 0..4 {
            let lhs = if i == j {
                reg.mul(p.match_[j], tmp_p1)
            } else {
                reg.mul(p.mismatch[j], tmp_p1)
            };
            let substitution_dominates = tenacious_strict_gt(reg, lhs, rhs)?;

            let mut g = gens.begin();
            g.rat(&r.lambda_div_mu, 1);
            g.rat(&r.pi[i], 1);
            if substitution_dominates {
                if i == j {
                    g.expr(p.match_[j], 1);
                } else {
                    g.rat(&r.pi[j], 1);
                    g.expr(p.one_minus_exp_negdt, 1);
                }
                add_p1(&mut g, p, 1);
            } else {
                g.rat(&r.pi[j], 1);
                add_p1_bar(&mut g, p, 1);
            }
            c1_incr[i * 4 + j] = g.finish();
        }
    }

    // C2 multiplier for the M2(i, j) recursion.
    let c2_incr = build4(|i| {
        let mut g = gens.begin();
        g.rat(&r.pi[i], 1);
        g.rat(&r.lambda, 1);
        g.expr(p.beta, 1);
        g.finish()
    });

    Ok(GeneratorIndices {
        m1_00,
        m0_10,
        m0_i0_incr,
        m2_01,
        m2_0j_incr,
        c0_incr,
        c1_incr,
        c2_incr,
    })
}

fn build4(f: impl FnMut(usize) -> usize) -> [usize; 4] {
    std::array::from_fn(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::tests::uniform_params;

    fn setup() -> (ExprRegistry, IntMat, GeneratorIndices) {
        let params = uniform_params();
        let r = TkfRationals::new(&params);
        let mut reg = ExprRegistry::new();
        let p = Tkf91Expressions::new(&mut reg, &r);
        let mut gens = GeneratorRegistry::new();
        let g = build_tkf91_generators(&mut gens, &mut reg, &r, &p, &[0], &[1]).unwrap();
        let mat = gens.finalize(&mut reg);
        (reg, mat, g)
    }

    #[test]
    fn schema_has_fixed_size() {
        let (_, mat, g) = setup();
        assert_eq!(mat.nrows(), 35);
        assert_eq!(g.m1_00, 0);
        assert_eq!(g.m0_10, 1);
        assert_eq!(g.c2_incr[3], 34);
    }

    #[test]
    fn matrix_covers_all_expressions() {
        let (reg, mat, _) = setup();
        assert_eq!(mat.ncols(), reg.len());
    }

    #[test]
    #[should_panic(expected = "empty generator entries are forbidden")]
    fn empty_generator_panics() {
        let mut gens = GeneratorRegistry::new();
        let g = gens.begin();
        let _ = g.finish();
    }

    #[test]
    fn empty_sequences_use_placeholder_boundaries() {
        let params = uniform_params();
        let r = TkfRationals::new(&params);
        let mut reg = ExprRegistry::new();
        let p = Tkf91Expressions::new(&mut reg, &r);
        let mut gens = GeneratorRegistry::new();
        let g = build_tkf91_generators(&mut gens, &mut reg, &r, &p, &[], &[]).unwrap();
        assert_eq!(gens.len(), 35);
        assert_eq!(g.m1_00, 0);
    }

    #[test]
    fn refined_bases_join_the_registry() {
        let params = uniform_params();
        let r = TkfRationals::new(&params);
        let mut reg = ExprRegistry::new();
        let p = Tkf91Expressions::new(&mut reg, &r);
        let before = reg.len();
        let mut gens = GeneratorRegistry::new();
        let _ = build_tkf91_generators(&mut gens, &mut reg, &r, &p, &[0], &[1]).unwrap();
        let after_generators = reg.len();
        let mat = gens.finalize(&mut reg);
        // Finalize appended the coprime bases as new constant columns.
        assert!(reg.len() > after_generators);
        assert!(after_generators > before);
        assert_eq!(mat.ncols(), reg.len());
    }
}
