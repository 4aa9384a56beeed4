//! Numeric and symbolic views of the generator matrix.
//!
//! The bounding strategies need each generator's log-score as a real
//! ball (`G · log y`); the symbolic verifier needs each generator as an
//! integer vector over the rank-`r` Hermite basis (a truncated row of
//! `V`), plus the ball enclosures `H · log y` of that basis to score
//! the certified alignment.

use crate::ball::Ball;
use crate::expr::{ExprId, ExprRegistry};
use crate::generators::{GeneratorIndices, GeneratorValues};
use crate::matrix::IntMat;
use itertools::izip;
use num_bigint::BigInt;
use num_traits::Zero;

/// Dot product of an integer vector with a vector of balls.
#[must_use]
pub fn dot_int_vec(coeffs: &[BigInt], values: &[Ball], prec: u64) -> Ball {
    let mut acc = Ball::zero();
    for (k, v) in izip!(coeffs, values) {
        if k.is_zero() {
            continue;
        }
        acc = acc.add(&v.mul_int(k, prec), prec);
    }
    acc
}

/// Log of every registered expression at the given level.
fn expression_logs(reg: &mut ExprRegistry, level: usize) -> Vec<Ball> {
    let prec = 1u64 << level;
    (0..reg.len())
        .map(|i| reg.eval(ExprId::from_index(i), level).log(prec))
        .collect()
}

/// The per-generator log-scores `G · log y`, one ball per matrix row.
#[must_use]
pub fn generator_log_scores(gmat: &IntMat, reg: &mut ExprRegistry, level: usize) -> Vec<Ball> {
    let prec = 1u64 << level;
    let logs = expression_logs(reg, level);
    (0..gmat.nrows())
        .map(|i| dot_int_vec(gmat.row(i), &logs, prec))
        .collect()
}

/// The first `rank` entries of `H · log y`: ball enclosures of the
/// Hermite basis log-values.
#[must_use]
pub fn hermite_basis_logs(
    h: &IntMat,
    reg: &mut ExprRegistry,
    rank: usize,
    level: usize,
) -> Vec<Ball> {
    let prec = 1u64 << level;
    let logs = expression_logs(reg, level);
    (0..rank)
        .map(|i| dot_int_vec(h.row(i), &logs, prec))
        .collect()
}

/// Builds the named-generator table of rank-truncated score vectors
/// from the rows of `V`.
#[must_use]
pub fn score_vectors(
    g: &GeneratorIndices,
    v: &IntMat,
    rank: usize,
) -> GeneratorValues<Vec<BigInt>> {
    GeneratorValues::from_fn(g, |row| v.row(row)[..rank].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::Tkf91Expressions;
    use crate::generators::{build_tkf91_generators, GeneratorRegistry};
    use crate::hermite;
    use crate::params::tests::uniform_params;
    use crate::rationals::TkfRationals;

    const LEVEL: usize = 8;

    struct Fixture {
        reg: ExprRegistry,
        gmat: IntMat,
        g: GeneratorIndices,
    }

    fn fixture() -> Fixture {
        let params = uniform_params();
        let r = TkfRationals::new(&params);
        let mut reg = ExprRegistry::new();
        let p = Tkf91Expressions::new(&mut reg, &r);
        let mut gens = GeneratorRegistry::new();
        let g = build_tkf91_generators(&mut gens, &mut reg, &r, &p, &[0], &[1]).unwrap();
        let gmat = gens.finalize(&mut reg);
        Fixture {
            reg,
            gmat,
            g,
        }
    }

    #[test]
    fn log_scores_match_direct_products() {
        let mut fx = fixture();
        let scores = generator_log_scores(&fx.gmat, &mut fx.reg, LEVEL);

        // m1_00 = gamma_0 * zeta_1 = (1 - lambda/mu) * (1 - lambda*beta).
        // Rebuild it directly from the expression registry and compare in
        // log space.
        let params = uniform_params();
        let r = TkfRationals::new(&params);
        let mut reg = ExprRegistry::new();
        let p = Tkf91Expressions::new(&mut reg, &r);
        let prec = 1u64 << LEVEL;
        let gamma_0 = Ball::from_rational(&r.one_minus_lambda_div_mu, prec);
        let zeta_1 = reg.eval(p.one_minus_lambda_beta, LEVEL);
        let direct = gamma_0.mul(&zeta_1, prec).log(prec);
        assert!(scores[fx.g.m1_00].overlaps(&direct));
    }

    #[test]
    fn symbolic_scores_match_numeric_scores() {
        // For each named generator, the truncated V row dotted with
        // H·log y must enclose the same value as the direct G·log y row.
        let mut fx = fixture();
        let dec = hermite::decompose(&fx.gmat);
        let numeric = generator_log_scores(&fx.gmat, &mut fx.reg, LEVEL);
        let basis = hermite_basis_logs(&dec.h, &mut fx.reg, dec.rank, LEVEL);
        let vecs = score_vectors(&fx.g, &dec.v, dec.rank);
        let prec = 1u64 << LEVEL;

        let check = |row: usize, vec: &Vec<BigInt>| {
            let symbolic = dot_int_vec(vec, &basis, prec);
            assert!(
                symbolic.overlaps(&numeric[row]),
                "generator {row} disagrees between bases"
            );
        };
        check(fx.g.m1_00, &vecs.m1_00);
        check(fx.g.m0_10, &vecs.m0_10);
        check(fx.g.m2_01, &vecs.m2_01);
        for i in 0..4 {
            check(fx.g.c0_incr[i], &vecs.c0_incr[i]);
            check(fx.g.c2_incr[i], &vecs.c2_incr[i]);
            for j in 0..4 {
                check(fx.g.c1_incr[i * 4 + j], &vecs.c1_incr[i * 4 + j]);
            }
        }
    }

    #[test]
    fn rank_is_small_but_positive() {
        let fx = fixture();
        let dec = hermite::decompose(&fx.gmat);
        assert!(dec.rank > 0);
        assert!(dec.rank <= fx.gmat.nrows());
        let vecs = score_vectors(&fx.g, &dec.v, dec.rank);
        assert_eq!(vecs.m1_00.len(), dec.rank);
    }
}
