//! A registry of elementary real-number expressions with per-level
//! evaluation caches.
//!
//! Expressions form a DAG over dense integer handles; the registry owns
//! every node and bounds its lifetime. Evaluating a node at level `ℓ`
//! produces a real ball computed with `2^ℓ` bits of working precision;
//! the cache is filled level by level and never shrinks.

use crate::ball::Ball;
use crate::dyadic::Dyadic;
use crate::error::{Error, Result};
use num_bigint::BigInt;
use num_rational::BigRational;

/// Number of cache levels; level `ℓ` works at `2^ℓ` bits.
pub const CACHE_LEVELS: usize = 30;

/// Handle of an expression inside its registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExprId(usize);

impl ExprId {
    /// The registry index behind this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Rebuilds a handle from a registry index; columns of the generator
    /// matrix are exactly these indices.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// One elementary operation.
#[derive(Clone, Debug)]
enum Op {
    Int(BigInt),
    Rat(BigRational),
    ExpRat(BigRational),
    LogRat(BigRational),
    Exp(ExprId),
    Neg(ExprId),
    Log(ExprId),
    Log1p(ExprId),
    Log1m(ExprId),
    Complement(ExprId),
    Add(ExprId, ExprId),
    Sub(ExprId, ExprId),
    Mul(ExprId, ExprId),
    Div(ExprId, ExprId),
}

struct Node {
    op: Op,
    cache: Vec<Ball>,
}

/// Arena of expressions with stable insertion-order indices.
#[derive(Default)]
pub struct ExprRegistry {
    nodes: Vec<Node>,
}

impl ExprRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered expressions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, op: Op) -> ExprId {
        let id = ExprId(self.nodes.len());
        self.nodes.push(Node {
            op,
            cache: Vec::new(),
        });
        id
    }

    /// Registers an integer constant.
    pub fn int(&mut self, value: BigInt) -> ExprId {
        self.push(Op::Int(value))
    }

    /// Registers a rational constant.
    pub fn rat(&mut self, value: BigRational) -> ExprId {
        self.push(Op::Rat(value))
    }

    /// Registers `exp(q)` for a rational `q`.
    pub fn exp_rat(&mut self, value: BigRational) -> ExprId {
        self.push(Op::ExpRat(value))
    }

    /// Registers `log(q)` for a rational `q`.
    pub fn log_rat(&mut self, value: BigRational) -> ExprId {
        self.push(Op::LogRat(value))
    }

    /// Registers `exp(x)`.
    pub fn exp(&mut self, x: ExprId) -> ExprId {
        self.push(Op::Exp(x))
    }

    /// Registers `−x`.
    pub fn neg(&mut self, x: ExprId) -> ExprId {
        self.push(Op::Neg(x))
    }

    /// Registers `log(x)`.
    pub fn log(&mut self, x: ExprId) -> ExprId {
        self.push(Op::Log(x))
    }

    /// Registers `log(1 + x)`.
    pub fn log1p(&mut self, x: ExprId) -> ExprId {
        self.push(Op::Log1p(x))
    }

    /// Registers `log(1 − x)`.
    pub fn log1m(&mut self, x: ExprId) -> ExprId {
        self.push(Op::Log1m(x))
    }

    /// Registers `1 − x`.
    pub fn complement(&mut self, x: ExprId) -> ExprId {
        self.push(Op::Complement(x))
    }

    /// Registers `a + b`.
    pub fn add(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.push(Op::Add(a, b))
    }

    /// Registers `a − b`.
    pub fn sub(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.push(Op::Sub(a, b))
    }

    /// Registers `a · b`.
    pub fn mul(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.push(Op::Mul(a, b))
    }

    /// Registers `a / b`.
    pub fn div(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.push(Op::Div(a, b))
    }

    /// Evaluates an expression at the given precision level, topping up
    /// the cache through every intermediate level first.
    ///
    /// # Panics
    ///
    /// Panics if `level` is outside `[0, CACHE_LEVELS)`.
    pub fn eval(&mut self, id: ExprId, level: usize) -> Ball {
        assert!(level < CACHE_LEVELS, "invalid log2 prec bits level {level}");
        while self.nodes[id.0].cache.len() <= level {
            let next = self.nodes[id.0].cache.len();
            let value = self.eval_fresh(id, next);
            self.nodes[id.0].cache.push(value);
        }
        self.nodes[id.0].cache[level].clone()
    }

    /// Number of cached levels for a node, for diagnostics and tests.
    #[must_use]
    pub fn cached_levels(&self, id: ExprId) -> usize {
        self.nodes[id.0].cache.len()
    }

    fn eval_fresh(&mut self, id: ExprId, level: usize) -> Ball {
        let prec = 1u64 << level;
        let op = self.nodes[id.0].op.clone();
        match op {
            Op::Int(n) => Ball::exact(Dyadic::from_bigint(n)),
            Op::Rat(q) => Ball::from_rational(&q, prec),
            Op::ExpRat(q) => Ball::from_rational(&q, prec).exp(prec),
            Op::LogRat(q) => Ball::from_rational(&q, prec).log(prec),
            Op::Exp(x) => self.eval(x, level).exp(prec),
            Op::Neg(x) => self.eval(x, level).neg(),
            Op::Log(x) => self.eval(x, level).log(prec),
            Op::Log1p(x) => self.eval(x, level).log1p(prec),
            Op::Log1m(x) => self.eval(x, level).neg().log1p(prec),
            Op::Complement(x) => {
                let x = self.eval(x, level);
                Ball::one().sub(&x, prec)
            }
            Op::Add(a, b) => {
                let a = self.eval(a, level);
                let b = self.eval(b, level);
                a.add(&b, prec)
            }
            Op::Sub(a, b) => {
                let a = self.eval(a, level);
                let b = self.eval(b, level);
                a.sub(&b, prec)
            }
            Op::Mul(a, b) => {
                let a = self.eval(a, level);
                let b = self.eval(b, level);
                a.mul(&b, prec)
            }
            Op::Div(a, b) => {
                let a = self.eval(a, level);
                let b = self.eval(b, level);
                a.div(&b, prec)
            }
        }
    }
}

/// Tenacious strict greater-than: evaluates both sides at increasing
/// precision levels until their enclosures are disjoint, then compares.
/// Identical handles compare false immediately.
///
/// # Errors
///
/// [`Error::ComparisonExhausted`] if the balls still overlap at the last
/// level.
pub fn tenacious_strict_gt(reg: &mut ExprRegistry, a: ExprId, b: ExprId) -> Result<bool> {
    if a == b {
        return Ok(false);
    }
    for level in 0..CACHE_LEVELS {
        let x = reg.eval(a, level);
        let y = reg.eval(b, level);
        if !x.overlaps(&y) {
            return Ok(x.gt(&y));
        }
    }
    Err(Error::ComparisonExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn indices_follow_insertion_order() {
        let mut reg = ExprRegistry::new();
        let a = reg.rat(rat(1, 2));
        let b = reg.int(BigInt::from(3));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn cache_is_contiguous_and_monotone() {
        let mut reg = ExprRegistry::new();
        let q = reg.rat(rat(1, 3));
        let x = reg.exp(q);
        assert_eq!(reg.cached_levels(x), 0);
        let _ = reg.eval(x, 5);
        assert_eq!(reg.cached_levels(x), 6);
        // A lower level is answered from cache without growth.
        let _ = reg.eval(x, 2);
        assert_eq!(reg.cached_levels(x), 6);
        // Children are topped up alongside the parent.
        assert_eq!(reg.cached_levels(q), 6);
    }

    #[test]
    #[should_panic(expected = "invalid log2 prec bits level")]
    fn level_out_of_range_is_fatal() {
        let mut reg = ExprRegistry::new();
        let q = reg.rat(rat(1, 3));
        let _ = reg.eval(q, CACHE_LEVELS);
    }

    #[test]
    fn dag_evaluation_encloses_truth() {
        let mut reg = ExprRegistry::new();
        // 1 - exp(-1/2) computed two ways.
        let half = reg.rat(rat(-1, 2));
        let e = reg.exp(half);
        let c = reg.complement(e);
        let direct = reg.exp_rat(rat(-1, 2));
        let d = reg.complement(direct);
        let x = reg.eval(c, 8);
        let y = reg.eval(d, 8);
        assert!(x.overlaps(&y));
        let expected = 1.0 - (-0.5f64).exp();
        assert!((x.to_f64() - expected).abs() < 1e-12);
    }

    #[test]
    fn log_variants_agree() {
        let mut reg = ExprRegistry::new();
        let x = reg.rat(rat(-1, 8));
        let log1m = reg.log1m(x);
        let direct = reg.log_rat(rat(9, 8));
        let a = reg.eval(log1m, 8);
        let b = reg.eval(direct, 8);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn tenacious_comparison_separates() {
        let mut reg = ExprRegistry::new();
        // exp(1/1000) > 1 + 1/1000, a genuinely close pair.
        let e = reg.exp_rat(rat(1, 1000));
        let q = reg.rat(rat(1001, 1000));
        assert!(tenacious_strict_gt(&mut reg, e, q).unwrap());
        assert!(!tenacious_strict_gt(&mut reg, q, e).unwrap());
    }

    #[test]
    fn tenacious_comparison_of_identical_handles_is_false() {
        let mut reg = ExprRegistry::new();
        let e = reg.exp_rat(rat(1, 7));
        assert!(!tenacious_strict_gt(&mut reg, e, e).unwrap());
    }

    #[test]
    fn neg_negates() {
        let mut reg = ExprRegistry::new();
        let q = reg.rat(rat(2, 5));
        let n = reg.neg(q);
        assert!(reg.eval(n, 6).contains_rational(&rat(-2, 5)));
    }
}
