//! Midpoint–radius real-ball arithmetic over exact dyadic numbers.
//!
//! Every operation takes a working precision in bits and returns a ball
//! that encloses the exact result. Addition and multiplication of the
//! underlying dyadics are exact, so rounding error enters only through
//! the explicit truncation in [`Ball::round`] and through the series
//! tails of the transcendental functions, both of which are folded into
//! the radius.

use crate::dyadic::Dyadic;
use num_bigint::BigInt;
use num_rational::BigRational;

/// A real ball: the closed interval `[mid − rad, mid + rad]`.
#[derive(Clone, Debug)]
pub struct Ball {
    mid: Dyadic,
    rad: Dyadic,
}

/// Bits of headroom used for intermediate series arithmetic.
const GUARD_BITS: u64 = 32;

/// Radius mantissas are kept to this many bits (rounded up).
const RADIUS_BITS: u64 = 32;

impl Ball {
    /// A ball of radius zero.
    #[must_use]
    pub fn exact(mid: Dyadic) -> Self {
        Self {
            mid,
            rad: Dyadic::zero(),
        }
    }

    /// Zero.
    #[must_use]
    pub fn zero() -> Self {
        Self::exact(Dyadic::zero())
    }

    /// One.
    #[must_use]
    pub fn one() -> Self {
        Self::exact(Dyadic::one())
    }

    /// The tightest `prec`-bit ball around an exact rational.
    #[must_use]
    pub fn from_rational(q: &BigRational, prec: u64) -> Self {
        let lo = Dyadic::from_rational_floor(q, prec + 2);
        let hi = Dyadic::from_rational_ceil(q, prec + 2);
        Self::from_dyadic_endpoints(&lo, &hi)
    }

    fn from_dyadic_endpoints(lo: &Dyadic, hi: &Dyadic) -> Self {
        debug_assert!(lo <= hi);
        Self {
            mid: lo.add(hi).mul_pow2(-1),
            rad: hi.sub(lo).mul_pow2(-1),
        }
    }

    fn from_rational_endpoints(lo: &BigRational, hi: &BigRational, prec: u64) -> Self {
        let lo = Dyadic::from_rational_floor(lo, prec + 2);
        let hi = Dyadic::from_rational_ceil(hi, prec + 2);
        Self::from_dyadic_endpoints(&lo, &hi)
    }

    /// Midpoint.
    #[must_use]
    pub fn mid(&self) -> &Dyadic {
        &self.mid
    }

    /// Radius.
    #[must_use]
    pub fn rad(&self) -> &Dyadic {
        &self.rad
    }

    /// Exact lower endpoint.
    #[must_use]
    pub fn lower(&self) -> Dyadic {
        self.mid.sub(&self.rad)
    }

    /// Exact upper endpoint.
    #[must_use]
    pub fn upper(&self) -> Dyadic {
        self.mid.add(&self.rad)
    }

    /// An upper bound on `|x|` over the ball.
    #[must_use]
    pub fn abs_upper(&self) -> Dyadic {
        self.mid.abs().add(&self.rad)
    }

    /// Rounds the midpoint to `prec` bits, folding the truncation error
    /// into the radius.
    #[must_use]
    pub fn round(&self, prec: u64) -> Self {
        let (mid, err) = self.mid.truncate_floor(prec);
        let mut rad = self.rad.clone();
        if let Some(ulp) = err {
            rad = rad.add(&ulp);
        }
        Self {
            mid,
            rad: rad.truncate_ceil(RADIUS_BITS),
        }
    }

    fn widen(&self, extra: &Dyadic) -> Self {
        Self {
            mid: self.mid.clone(),
            rad: self.rad.add(extra).truncate_ceil(RADIUS_BITS),
        }
    }

    /// Negation. Exact.
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            mid: self.mid.neg(),
            rad: self.rad.clone(),
        }
    }

    /// Addition.
    #[must_use]
    pub fn add(&self, other: &Self, prec: u64) -> Self {
        Self {
            mid: self.mid.add(&other.mid),
            rad: self.rad.add(&other.rad),
        }
        .round(prec)
    }

    /// Subtraction.
    #[must_use]
    pub fn sub(&self, other: &Self, prec: u64) -> Self {
        self.add(&other.neg(), prec)
    }

    /// Multiplication.
    #[must_use]
    pub fn mul(&self, other: &Self, prec: u64) -> Self {
        let rad = self
            .mid
            .abs()
            .mul(&other.rad)
            .add(&other.mid.abs().mul(&self.rad))
            .add(&self.rad.mul(&other.rad));
        Self {
            mid: self.mid.mul(&other.mid),
            rad,
        }
        .round(prec)
    }

    /// Multiplication by an exact integer.
    #[must_use]
    pub fn mul_int(&self, k: &BigInt, prec: u64) -> Self {
        let factor = Dyadic::from_bigint(k.clone());
        Self {
            mid: self.mid.mul(&factor),
            rad: self.rad.mul(&factor.abs()),
        }
        .round(prec)
    }

    /// Multiplication by `2^k`. Exact.
    #[must_use]
    pub fn mul_pow2(&self, k: i64) -> Self {
        Self {
            mid: self.mid.mul_pow2(k),
            rad: self.rad.mul_pow2(k),
        }
    }

    /// Division. The divisor interval must not contain zero.
    #[must_use]
    pub fn div(&self, other: &Self, prec: u64) -> Self {
        let dl = other.lower();
        let du = other.upper();
        assert!(
            dl.signum() > 0 || du.signum() < 0,
            "division by an interval containing zero"
        );
        let nl = self.lower().to_rational();
        let nu = self.upper().to_rational();
        let dl = dl.to_rational();
        let du = du.to_rational();
        let quotients = [&nl / &dl, &nl / &du, &nu / &dl, &nu / &du];
        let lo = quotients.iter().min().unwrap();
        let hi = quotients.iter().max().unwrap();
        Self::from_rational_endpoints(lo, hi, prec)
    }

    /// Division by a positive machine integer.
    #[must_use]
    pub fn div_int(&self, n: u32, prec: u64) -> Self {
        assert!(n > 0);
        let n = BigRational::from_integer(BigInt::from(n));
        let lo = self.lower().to_rational() / &n;
        let hi = self.upper().to_rational() / &n;
        Self::from_rational_endpoints(&lo, &hi, prec)
    }

    /// Exponential function.
    #[must_use]
    pub fn exp(&self, prec: u64) -> Self {
        let wp = prec + GUARD_BITS;
        // Halve the argument until it lies within [-1/2, 1/2], then undo
        // with repeated squaring.
        let halvings = (self.abs_upper().log2_upper_bound() + 1).max(0);
        let x = self.mul_pow2(-halvings);
        let threshold = Dyadic::power_of_two(-i64::try_from(wp).unwrap());

        let mut sum = Self::one();
        let mut term = Self::one();
        for n in 1..=u32::MAX {
            term = term.mul(&x, wp).div_int(n, wp);
            sum = sum.add(&term, wp);
            if term.abs_upper() <= threshold {
                break;
            }
        }
        // Tail of the series is below twice the last term.
        let mut result = sum.widen(&threshold.mul_pow2(1));
        for _ in 0..halvings {
            result = result.mul(&result.clone(), wp);
        }
        result.round(prec)
    }

    /// Natural logarithm. The ball must be strictly positive.
    #[must_use]
    pub fn log(&self, prec: u64) -> Self {
        assert!(
            self.lower().signum() > 0,
            "log of an interval that is not strictly positive"
        );
        let wp = prec + GUARD_BITS;
        // Scale the midpoint into [1, 2) and recover e·log 2 afterwards.
        let e2 = self.mid.log2_upper_bound() - 1;
        let y = self.mul_pow2(-e2);
        let t = y.sub(&Self::one(), wp).div(&y.add(&Self::one(), wp), wp);
        let result = atanh_series(&t, wp).mul_pow2(1);
        let result = if e2 == 0 {
            result
        } else {
            result.add(&ln2(wp).mul_int(&BigInt::from(e2), wp), wp)
        };
        result.round(prec)
    }

    /// `log(1 + x)`, accurate near zero. Requires `1 + x > 0`.
    #[must_use]
    pub fn log1p(&self, prec: u64) -> Self {
        let wp = prec + GUARD_BITS;
        let shifted = self.add(&Self::one(), wp);
        assert!(
            shifted.lower().signum() > 0,
            "log1p of an interval reaching -1"
        );
        let two = Self::exact(Dyadic::from_i64(2));
        let t = self.div(&self.add(&two, wp), wp);
        atanh_series(&t, wp).mul_pow2(1).round(prec)
    }

    /// Strictly less: every point of `self` is below every point of
    /// `other`.
    #[must_use]
    pub fn lt(&self, other: &Self) -> bool {
        self.upper() < other.lower()
    }

    /// Strictly greater.
    #[must_use]
    pub fn gt(&self, other: &Self) -> bool {
        other.lt(self)
    }

    /// Whether the two intervals share at least one point.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.lt(other) && !other.lt(self)
    }

    /// An upper bound for the pointwise maximum: picks the larger ball
    /// when they are ordered, otherwise combines midpoints and radii.
    #[must_use]
    pub fn max(&self, other: &Self) -> Self {
        if self.lt(other) {
            other.clone()
        } else if other.lt(self) {
            self.clone()
        } else {
            Self {
                mid: self.mid.clone().max(other.mid.clone()),
                rad: self.rad.clone().max(other.rad.clone()),
            }
        }
    }

    /// The interval hull of two balls.
    #[must_use]
    pub fn hull(&self, other: &Self) -> Self {
        let lo = self.lower().min(other.lower());
        let hi = self.upper().max(other.upper());
        Self::from_dyadic_endpoints(&lo, &hi)
    }

    /// Whether the ball contains the exact rational `q`.
    #[must_use]
    pub fn contains_rational(&self, q: &BigRational) -> bool {
        self.lower().to_rational() <= *q && *q <= self.upper().to_rational()
    }

    /// The midpoint as an `f64`.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.mid.to_f64()
    }
}

/// Enclosure of `atanh(t)` by its odd Taylor series. Callers arrange
/// `|t| ≤ ~0.6`; the tail bound stays valid up to `|t|² < 8/9`.
fn atanh_series(t: &Ball, wp: u64) -> Ball {
    debug_assert!(t.abs_upper() < Dyadic::new(BigInt::from(15), -4));
    let threshold = Dyadic::power_of_two(-i64::try_from(wp).unwrap());
    let tsq = t.mul(t, wp);
    let mut sum = t.clone();
    let mut power = t.clone();
    let mut n = 1u32;
    loop {
        n += 2;
        power = power.mul(&tsq, wp);
        sum = sum.add(&power.div_int(n, wp), wp);
        if power.abs_upper() <= threshold {
            break;
        }
    }
    // Remaining terms form a geometric series with ratio t².
    sum.widen(&threshold.mul_pow2(3))
}

/// Enclosure of log 2 as `2·atanh(1/3)`.
fn ln2(wp: u64) -> Ball {
    let third = BigRational::new(BigInt::from(1), BigInt::from(3));
    atanh_series(&Ball::from_rational(&third, wp), wp).mul_pow2(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    const PREC: u64 = 64;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn from_rational_encloses() {
        let third = rat(1, 3);
        let b = Ball::from_rational(&third, PREC);
        assert!(b.contains_rational(&third));
        assert!(b.rad() <= &Dyadic::power_of_two(-(PREC as i64)));
    }

    #[test]
    fn arithmetic_encloses() {
        let a = Ball::from_rational(&rat(1, 3), PREC);
        let b = Ball::from_rational(&rat(1, 7), PREC);
        assert!(a.add(&b, PREC).contains_rational(&rat(10, 21)));
        assert!(a.mul(&b, PREC).contains_rational(&rat(1, 21)));
        assert!(a.div(&b, PREC).contains_rational(&rat(7, 3)));
        assert!(a.sub(&b, PREC).contains_rational(&rat(4, 21)));
    }

    #[test]
    fn exp_of_zero_is_one() {
        let b = Ball::zero().exp(PREC);
        assert!(b.contains_rational(&rat(1, 1)));
        assert!((b.to_f64() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn exp_matches_f64() {
        let b = Ball::one().exp(PREC);
        assert!((b.to_f64() - std::f64::consts::E).abs() < 1e-12);
        let c = Ball::from_rational(&rat(-3, 2), PREC).exp(PREC);
        assert!((c.to_f64() - (-1.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn log_matches_f64() {
        let two = Ball::exact(Dyadic::from_i64(2));
        assert!((two.log(PREC).to_f64() - std::f64::consts::LN_2).abs() < 1e-12);
        let b = Ball::from_rational(&rat(7, 5), PREC).log(PREC);
        assert!((b.to_f64() - 1.4f64.ln()).abs() < 1e-12);
        let small = Ball::from_rational(&rat(1, 1000), PREC).log(PREC);
        assert!((small.to_f64() - 0.001f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn log_exp_round_trip() {
        let x = Ball::from_rational(&rat(-5, 4), PREC);
        let back = x.exp(PREC).log(PREC);
        assert!(back.contains_rational(&rat(-5, 4)));
    }

    #[test]
    fn log1p_agrees_with_log() {
        let x = Ball::from_rational(&rat(-1, 64), PREC);
        let via_log = x.add(&Ball::one(), PREC).log(PREC);
        assert!(x.log1p(PREC).overlaps(&via_log));
    }

    #[test]
    fn strict_order_and_overlap() {
        let a = Ball::from_rational(&rat(1, 3), PREC);
        let b = Ball::from_rational(&rat(2, 3), PREC);
        assert!(a.lt(&b));
        assert!(b.gt(&a));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&a.clone()));
    }

    #[test]
    fn max_and_hull() {
        let a = Ball::from_rational(&rat(1, 3), PREC);
        let b = Ball::from_rational(&rat(2, 3), PREC);
        assert!((a.max(&b).to_f64() - b.to_f64()).abs() < 1e-12);
        let h = a.hull(&b);
        assert!(h.contains_rational(&rat(1, 3)));
        assert!(h.contains_rational(&rat(1, 2)));
        assert!(h.contains_rational(&rat(2, 3)));
    }
}
