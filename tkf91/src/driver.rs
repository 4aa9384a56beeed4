//! The certifying driver: precision selection, single certified passes
//! and the escalation loop, plus the checking and counting entry
//! points.
//!
//! Escalation order: magnitude bounds at level 8, then real balls at
//! level 8, 9, 10, …, with a backward relevance pass after every
//! forward pass and a symbolic verification attempt after each ball
//! pass, until the verification completes or the level cap is hit.

use crate::ball::Ball;
use crate::count::count_solutions;
use crate::dp::Tableau;
use crate::dp_ball::BallStrategy;
use crate::dp_bound::{BoundStrategy, BOUND_LEVEL};
use crate::dp_double::align_uncertified;
use crate::dyadic::Dyadic;
use crate::error::{Error, Result};
use crate::expr::{ExprRegistry, CACHE_LEVELS};
use crate::expressions::Tkf91Expressions;
use crate::forward::forward;
use crate::generator_vecs::{dot_int_vec, hermite_basis_logs};
use crate::generators::{build_tkf91_generators, GeneratorIndices, GeneratorRegistry};
use crate::hermite::{decompose, Hermite};
use crate::matrix::IntMat;
use crate::params::ModelParams;
use crate::rationals::TkfRationals;
use crate::sequence::strip_gaps;
use crate::solution::Solution;
use crate::verify::VerifyStrategy;
use log::{debug, warn};
use num_bigint::BigUint;
use std::str::FromStr;
use std::time::Instant;

/// Which solver backs an alignment request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precision {
    /// Uncertified single-precision fast path.
    Float,
    /// Uncertified double-precision fast path.
    Double,
    /// Certified magnitude-bounds single pass.
    Mag,
    /// Certified real-ball single pass at 256-bit precision.
    Arb256,
    /// The escalation driver.
    High,
}

impl FromStr for Precision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "float" => Ok(Self::Float),
            "double" => Ok(Self::Double),
            "mag" => Ok(Self::Mag),
            "arb256" => Ok(Self::Arb256),
            "high" => Ok(Self::High),
            other => Err(Error::InvalidParameters(format!(
                "expected the precision string to be one of \
                 {{float | double | mag | arb256 | high}}, got {other:?}"
            ))),
        }
    }
}

/// Symbolic state shared by one request.
struct Workspace {
    reg: ExprRegistry,
    gmat: IntMat,
    g: GeneratorIndices,
}

fn prepare(params: &ModelParams, a: &[u8], b: &[u8]) -> Result<Workspace> {
    params.validate()?;
    let r = TkfRationals::new(params);
    let mut reg = ExprRegistry::new();
    let p = Tkf91Expressions::new(&mut reg, &r);
    let mut gens = GeneratorRegistry::new();
    let g = build_tkf91_generators(&mut gens, &mut reg, &r, &p, a, b)?;
    let gmat = gens.finalize(&mut reg);
    Ok(Workspace {
        reg,
        gmat,
        g,
    })
}

/// Outcome of a certified run: the pruned tableau plus certificate
/// material.
struct Certified {
    tableau: Tableau,
    verified: bool,
    log_probability: Option<Ball>,
}

fn run_certified(ws: &mut Workspace, a: &[u8], b: &[u8], mode: Precision) -> Result<Certified> {
    let mut tableau = Tableau::new(a.len() + 1, b.len() + 1);
    let dec = decompose(&ws.gmat);

    let mut corner_ball = None;
    let mut level = BOUND_LEVEL;

    match mode {
        Precision::Mag => {
            let started = Instant::now();
            let mut bounds = BoundStrategy::new(&ws.gmat, &mut ws.reg, &ws.g, a, b);
            let _ = forward(&mut tableau, &mut bounds);
            debug!("magnitude bounds pass: {:?}", started.elapsed());
            corner_ball = bounds.corner().and_then(|(lb, ub)| log_enclosure(&lb.to_dyadic(), &ub.to_dyadic()));
            tableau.backward();
        }
        Precision::Arb256 => {
            let started = Instant::now();
            let mut balls = BallStrategy::new(BOUND_LEVEL, &ws.gmat, &mut ws.reg, &ws.g, a, b);
            let _ = forward(&mut tableau, &mut balls);
            debug!("ball pass at level {BOUND_LEVEL}: {:?}", started.elapsed());
            corner_ball = balls.corner();
            tableau.backward();
        }
        Precision::High => {
            let started = Instant::now();
            let mut bounds = BoundStrategy::new(&ws.gmat, &mut ws.reg, &ws.g, a, b);
            let _ = forward(&mut tableau, &mut bounds);
            debug!("magnitude bounds pass: {:?}", started.elapsed());
            tableau.backward();

            let started = Instant::now();
            let mut balls = BallStrategy::new(BOUND_LEVEL, &ws.gmat, &mut ws.reg, &ws.g, a, b);
            let _ = forward(&mut tableau, &mut balls);
            debug!("ball pass at level {BOUND_LEVEL}: {:?}", started.elapsed());
            corner_ball = balls.corner();
            tableau.backward();
        }
        Precision::Float | Precision::Double => {
            unreachable!("uncertified precisions do not reach the certified driver")
        }
    }

    // Verification, escalating for the high driver only.
    let verified = loop {
        let started = Instant::now();
        let mut verifier = VerifyStrategy::new(&ws.g, &dec.v, dec.rank, a, b);
        let complete = forward(&mut tableau, &mut verifier).is_continue();
        debug!("symbolic verification: {:?}", started.elapsed());
        if complete {
            if let Some(corner) = verifier.corner() {
                corner_ball = Some(certified_log_probability(
                    corner, &dec, &mut ws.reg, level,
                ));
            }
            break true;
        }
        if mode != Precision::High {
            break false;
        }
        level += 1;
        if level >= CACHE_LEVELS {
            return Err(Error::EscalationExhausted);
        }
        warn!("tie not symbolically confirmed, escalating to level {level}");
        let started = Instant::now();
        let mut balls = BallStrategy::new(level, &ws.gmat, &mut ws.reg, &ws.g, a, b);
        let _ = forward(&mut tableau, &mut balls);
        debug!("ball pass at level {level}: {:?}", started.elapsed());
        tableau.backward();
    };

    Ok(Certified {
        tableau,
        verified,
        log_probability: corner_ball,
    })
}

/// Scores the certified corner vector against the Hermite basis logs.
fn certified_log_probability(
    corner: &[num_bigint::BigInt],
    dec: &Hermite,
    reg: &mut ExprRegistry,
    level: usize,
) -> Ball {
    let basis = hermite_basis_logs(&dec.h, reg, dec.rank, level);
    dot_int_vec(corner, &basis, 1u64 << level)
}

/// Encloses `[log lb, log ub]` for positive magnitude endpoints.
fn log_enclosure(lb: &Dyadic, ub: &Dyadic) -> Option<Ball> {
    if lb.signum() <= 0 {
        return None;
    }
    let prec = 64;
    let lo = Ball::exact(lb.clone()).log(prec);
    let hi = Ball::exact(ub.clone()).log(prec);
    Some(lo.hull(&hi))
}

/// Produces the canonical optimal alignment of `a` and `b`.
///
/// `rtol` only affects the uncertified fast paths, where it widens the
/// traceback's tie tolerance.
///
/// # Errors
///
/// Parameter validation errors, tie decisions that exhaust the
/// precision cap, and [`Error::EscalationExhausted`] from the `high`
/// driver.
pub fn align(
    params: &ModelParams,
    a: &[u8],
    b: &[u8],
    precision: Precision,
    rtol: f64,
) -> Result<Solution> {
    let mut ws = prepare(params, a, b)?;
    match precision {
        Precision::Float => {
            let (sa, sb, score) =
                align_uncertified::<f32>(&ws.gmat, &mut ws.reg, &ws.g, a, b, rtol);
            Ok(uncertified_solution(sa, sb, score))
        }
        Precision::Double => {
            let (sa, sb, score) =
                align_uncertified::<f64>(&ws.gmat, &mut ws.reg, &ws.g, a, b, rtol);
            Ok(uncertified_solution(sa, sb, score))
        }
        Precision::Mag | Precision::Arb256 | Precision::High => {
            let certified = run_certified(&mut ws, a, b, precision)?;
            let (aligned_a, aligned_b) = certified.tableau.canonical_alignment(a, b);
            Ok(Solution {
                aligned_a,
                aligned_b,
                log_probability: certified.log_probability,
                verified: certified.verified,
                count: None,
                tableau: Some(certified.tableau),
            })
        }
    }
}

fn uncertified_solution(aligned_a: String, aligned_b: String, score: f64) -> Solution {
    Solution {
        aligned_a,
        aligned_b,
        log_probability: Dyadic::from_f64(score).map(Ball::exact),
        verified: false,
        count: None,
        tableau: None,
    }
}

/// Report of the `check` operation; `None` means "undetermined".
#[derive(Debug)]
pub struct CheckReport {
    /// Whether the supplied alignment is optimal.
    pub optimal: Option<bool>,
    /// Whether the supplied alignment is the canonical representative.
    pub canonical: Option<bool>,
    /// Number of co-optimal alignments.
    pub count: Option<BigUint>,
}

/// Verifies a caller-supplied alignment under the model.
///
/// # Errors
///
/// Shape errors on the alignment rows and any error of [`align`] other
/// than escalation exhaustion, which degrades to an all-undetermined
/// report.
pub fn check(params: &ModelParams, row_a: &[i8], row_b: &[i8]) -> Result<CheckReport> {
    if row_a.len() != row_b.len() {
        return Err(Error::InvalidAlignment(
            "alignment rows have different lengths".to_string(),
        ));
    }
    let a = strip_gaps(row_a);
    let b = strip_gaps(row_b);
    let mut ws = prepare(params, &a, &b)?;
    match run_certified(&mut ws, &a, &b, Precision::High) {
        Ok(mut certified) => {
            let (optimal, canonical) = certified.tableau.check_alignment(row_a, row_b)?;
            let count = count_solutions(&mut certified.tableau);
            Ok(CheckReport {
                optimal: Some(optimal),
                canonical: Some(canonical),
                count: Some(count),
            })
        }
        Err(Error::EscalationExhausted) => Ok(CheckReport {
            optimal: None,
            canonical: None,
            count: None,
        }),
        Err(e) => Err(e),
    }
}

/// Counts the co-optimal alignments of two unaligned sequences.
///
/// # Errors
///
/// As for [`align`] with the `high` precision.
pub fn count_optimal_alignments(params: &ModelParams, a: &[u8], b: &[u8]) -> Result<BigUint> {
    let mut ws = prepare(params, a, b)?;
    let mut certified = run_certified(&mut ws, a, b, Precision::High)?;
    Ok(count_solutions(&mut certified.tableau))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::rational_from_parts;
    use crate::params::tests::uniform_params;
    use crate::sequence::{decode_alignment_row, decode_residues};

    fn residues(s: &str) -> Vec<u8> {
        decode_residues(s).unwrap()
    }

    #[test]
    fn trivial_equal_singletons() {
        // Scenario: single matching nucleotide on both sides.
        let params = uniform_params();
        let sol = align(&params, &residues("A"), &residues("A"), Precision::High, 0.0).unwrap();
        assert_eq!(sol.aligned_a, "A");
        assert_eq!(sol.aligned_b, "A");
        assert!(sol.verified);
        let count =
            count_optimal_alignments(&params, &residues("A"), &residues("A")).unwrap();
        assert_eq!(count, BigUint::from(1u32));
    }

    #[test]
    fn single_indel_against_empty_sequence() {
        let params = uniform_params();
        let sol = align(&params, &residues("A"), &[], Precision::High, 0.0).unwrap();
        assert_eq!(sol.aligned_a, "A");
        assert_eq!(sol.aligned_b, "-");
        assert!(sol.verified);
        let count = count_optimal_alignments(&params, &residues("A"), &[]).unwrap();
        assert_eq!(count, BigUint::from(1u32));
    }

    #[test]
    fn insertion_before_match() {
        let params = uniform_params();
        let sol = align(&params, &residues("A"), &residues("CA"), Precision::High, 0.0).unwrap();
        assert_eq!(sol.aligned_a, "-A");
        assert_eq!(sol.aligned_b, "CA");
        let count =
            count_optimal_alignments(&params, &residues("A"), &residues("CA")).unwrap();
        assert_eq!(count, BigUint::from(1u32));
    }

    #[test]
    fn uniform_tie_has_multiple_optima() {
        // Symmetric frequencies with AC against CA leave co-optimal
        // indel orderings.
        let params = ModelParams {
            lambda: rational_from_parts(1, 2).unwrap(),
            mu: rational_from_parts(1, 1).unwrap(),
            tau: rational_from_parts(1, 1).unwrap(),
            pi: std::array::from_fn(|_| rational_from_parts(1, 4).unwrap()),
        };
        let count =
            count_optimal_alignments(&params, &residues("AC"), &residues("CA")).unwrap();
        assert!(count >= BigUint::from(2u32));

        // The canonical alignment prefers deletion over insertion at
        // the first divergence.
        let sol = align(&params, &residues("AC"), &residues("CA"), Precision::High, 0.0).unwrap();
        assert!(sol.verified);
        let report = check(
            &params,
            &decode_alignment_row(&sol.aligned_a).unwrap(),
            &decode_alignment_row(&sol.aligned_b).unwrap(),
        )
        .unwrap();
        assert_eq!(report.optimal, Some(true));
        assert_eq!(report.canonical, Some(true));
    }

    #[test]
    fn long_homopolymer_certifies_at_mag_level() {
        let params = ModelParams {
            lambda: rational_from_parts(1, 1).unwrap(),
            mu: rational_from_parts(2, 1).unwrap(),
            tau: rational_from_parts(1, 10).unwrap(),
            pi: [
                rational_from_parts(27, 100).unwrap(),
                rational_from_parts(24, 100).unwrap(),
                rational_from_parts(26, 100).unwrap(),
                rational_from_parts(23, 100).unwrap(),
            ],
        };
        let a = residues("AAAAAAAA");
        let sol = align(&params, &a, &a, Precision::Mag, 0.0).unwrap();
        assert_eq!(sol.aligned_a, "AAAAAAAA");
        assert_eq!(sol.aligned_b, "AAAAAAAA");
        assert!(sol.verified);
        let count = count_optimal_alignments(&params, &a, &a).unwrap();
        assert_eq!(count, BigUint::from(1u32));
    }

    #[test]
    fn align_output_checks_as_optimal_and_canonical() {
        let params = uniform_params();
        let a = residues("ACGTAC");
        let b = residues("AGTACC");
        let sol = align(&params, &a, &b, Precision::High, 0.0).unwrap();
        assert!(sol.verified);
        let report = check(
            &params,
            &decode_alignment_row(&sol.aligned_a).unwrap(),
            &decode_alignment_row(&sol.aligned_b).unwrap(),
        )
        .unwrap();
        assert_eq!(report.optimal, Some(true));
        assert_eq!(report.canonical, Some(true));
        assert_eq!(report.count, Some(count_optimal_alignments(&params, &a, &b).unwrap()));
    }

    #[test]
    fn double_agrees_with_certified_on_unambiguous_input() {
        let params = uniform_params();
        let a = residues("ACGT");
        let b = residues("ACGT");
        let certified = align(&params, &a, &b, Precision::High, 0.0).unwrap();
        let fast = align(&params, &a, &b, Precision::Double, 0.0).unwrap();
        assert_eq!(certified.aligned_a, fast.aligned_a);
        assert_eq!(certified.aligned_b, fast.aligned_b);
        assert!(!fast.verified);
        assert!(fast.tableau.is_none());
    }

    #[test]
    fn near_critical_rates_still_certify() {
        // lambda close to mu makes the numeric landscape flat; the
        // escalation driver must still terminate with a certificate.
        let params = ModelParams {
            lambda: rational_from_parts(99, 100).unwrap(),
            mu: rational_from_parts(1, 1).unwrap(),
            tau: rational_from_parts(1, 2).unwrap(),
            pi: std::array::from_fn(|_| rational_from_parts(1, 4).unwrap()),
        };
        let a = residues("ACGTACGTGCAT");
        let b = residues("ACGTAGGTGCTT");
        let sol = align(&params, &a, &b, Precision::High, 0.0).unwrap();
        assert!(sol.verified);
        assert!(sol.log_probability.is_some());
    }

    #[test]
    fn both_sequences_empty() {
        let params = uniform_params();
        let sol = align(&params, &[], &[], Precision::High, 0.0).unwrap();
        assert!(sol.is_empty());
        assert!(sol.verified);
        let count = count_optimal_alignments(&params, &[], &[]).unwrap();
        assert_eq!(count, BigUint::from(1u32));
    }

    #[test]
    fn invalid_parameters_are_rejected_up_front() {
        let mut params = uniform_params();
        params.lambda = params.mu.clone();
        assert!(align(&params, &[0], &[0], Precision::Double, 0.0).is_err());
    }

    #[test]
    fn precision_strings_parse() {
        assert_eq!("float".parse::<Precision>().unwrap(), Precision::Float);
        assert_eq!("high".parse::<Precision>().unwrap(), Precision::High);
        assert!("quad".parse::<Precision>().is_err());
    }

    #[test]
    fn rerunning_align_is_deterministic() {
        let params = uniform_params();
        let a = residues("ACGTT");
        let b = residues("AGTTC");
        let first = align(&params, &a, &b, Precision::High, 0.0).unwrap();
        let second = align(&params, &a, &b, Precision::High, 0.0).unwrap();
        assert_eq!(first.aligned_a, second.aligned_a);
        assert_eq!(first.aligned_b, second.aligned_b);
        assert_eq!(first.verified, second.verified);
    }
}
