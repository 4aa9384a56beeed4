//! Exact binary floating-point numbers, `mantissa · 2^exponent`.
//!
//! Addition, subtraction and multiplication are exact; precision only
//! enters through explicit truncation, which reports the error it
//! introduced. The ball layer builds its midpoint–radius arithmetic on
//! top of these guarantees.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;

/// An exact dyadic rational. The mantissa is odd (or zero) so every
/// value has one representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dyadic {
    man: BigInt,
    exp: i64,
}

impl Dyadic {
    /// Builds `man · 2^exp`, normalizing the representation.
    #[must_use]
    pub fn new(man: BigInt, exp: i64) -> Self {
        if man.is_zero() {
            return Self {
                man,
                exp: 0,
            };
        }
        let shift = man.trailing_zeros().unwrap_or(0);
        Self {
            man: man >> usize::try_from(shift).unwrap(),
            exp: exp + i64::try_from(shift).unwrap(),
        }
    }

    /// Zero.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(BigInt::zero(), 0)
    }

    /// One.
    #[must_use]
    pub fn one() -> Self {
        Self::new(BigInt::one(), 0)
    }

    /// An integer as a dyadic value.
    #[must_use]
    pub fn from_bigint(value: BigInt) -> Self {
        Self::new(value, 0)
    }

    /// A machine integer as a dyadic value.
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self::new(BigInt::from(value), 0)
    }

    /// `2^exp`.
    #[must_use]
    pub fn power_of_two(exp: i64) -> Self {
        Self::new(BigInt::one(), exp)
    }

    /// Exact conversion from a finite `f64`.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let (man, exp, sign) = num_traits::Float::integer_decode(value);
        let mut man = BigInt::from(man);
        if sign < 0 {
            man = -man;
        }
        Some(Self::new(man, i64::from(exp)))
    }

    /// Whether the value is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.man.is_zero()
    }

    /// Sign of the value: −1, 0 or +1.
    #[must_use]
    pub fn signum(&self) -> i32 {
        match self.man.sign() {
            num_bigint::Sign::Minus => -1,
            num_bigint::Sign::NoSign => 0,
            num_bigint::Sign::Plus => 1,
        }
    }

    /// Negation. Exact.
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            man: -&self.man,
            exp: self.exp,
        }
    }

    /// Absolute value. Exact.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            man: self.man.abs(),
            exp: self.exp,
        }
    }

    /// Addition. Exact.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        let exp = self.exp.min(other.exp);
        let a = &self.man << usize::try_from(self.exp - exp).unwrap();
        let b = &other.man << usize::try_from(other.exp - exp).unwrap();
        Self::new(a + b, exp)
    }

    /// Subtraction. Exact.
    #[must_use]
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Multiplication. Exact.
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        Self::new(&self.man * &other.man, self.exp + other.exp)
    }

    /// Multiplication by `2^k`. Exact.
    #[must_use]
    pub fn mul_pow2(&self, k: i64) -> Self {
        if self.is_zero() {
            return self.clone();
        }
        Self {
            man: self.man.clone(),
            exp: self.exp + k,
        }
    }

    /// Number of significant mantissa bits.
    #[must_use]
    pub fn bits(&self) -> u64 {
        self.man.bits()
    }

    /// The normalized mantissa.
    #[must_use]
    pub fn mantissa(&self) -> &BigInt {
        &self.man
    }

    /// The exponent of the normalized representation.
    #[must_use]
    pub fn exponent(&self) -> i64 {
        self.exp
    }

    /// An exponent `e` with `|self| < 2^e` (tight to one bit). Zero maps
    /// to `i64::MIN`.
    #[must_use]
    pub fn log2_upper_bound(&self) -> i64 {
        if self.is_zero() {
            return i64::MIN;
        }
        i64::try_from(self.bits()).unwrap() + self.exp
    }

    /// Truncates the mantissa toward −∞ to at most `prec` bits,
    /// reporting an upper bound on the discarded amount.
    #[must_use]
    pub fn truncate_floor(&self, prec: u64) -> (Self, Option<Self>) {
        if self.bits() <= prec {
            return (self.clone(), None);
        }
        let shift = self.bits() - prec;
        let ushift = usize::try_from(shift).unwrap();
        let floored = &self.man >> ushift;
        let exact = (&floored << ushift) == self.man;
        let exp = self.exp + i64::try_from(shift).unwrap();
        let value = Self::new(floored, exp);
        if exact {
            (value, None)
        } else {
            (value, Some(Self::power_of_two(exp)))
        }
    }

    /// Truncates the mantissa toward +∞ to at most `prec` bits. The
    /// result is always ≥ the exact value.
    #[must_use]
    pub fn truncate_ceil(&self, prec: u64) -> Self {
        if self.bits() <= prec {
            return self.clone();
        }
        let shift = self.bits() - prec;
        let ushift = usize::try_from(shift).unwrap();
        let ceiled = -((-&self.man) >> ushift);
        Self::new(ceiled, self.exp + i64::try_from(shift).unwrap())
    }

    /// The exact value as a rational.
    #[must_use]
    pub fn to_rational(&self) -> BigRational {
        if self.exp >= 0 {
            BigRational::from_integer(&self.man << usize::try_from(self.exp).unwrap())
        } else {
            BigRational::new(
                self.man.clone(),
                BigInt::one() << usize::try_from(-self.exp).unwrap(),
            )
        }
    }

    /// Nearest `f64`, saturating to ±∞ far outside the exponent range.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let bits = self.bits();
        let (man, exp) = if bits > 53 {
            let shift = bits - 53;
            (
                &self.man >> usize::try_from(shift).unwrap(),
                self.exp + i64::try_from(shift).unwrap(),
            )
        } else {
            (self.man.clone(), self.exp)
        };
        let man = man.to_f64().unwrap_or(0.0);
        if exp > 1100 {
            man.signum() * f64::INFINITY
        } else if exp < -1200 {
            0.0
        } else {
            man * 2f64.powi(i32::try_from(exp).unwrap())
        }
    }

    /// Largest dyadic with at most `prec` significant bits that is ≤
    /// the rational `q`.
    #[must_use]
    pub fn from_rational_floor(q: &BigRational, prec: u64) -> Self {
        let scale = Self::rational_scale(q, prec);
        let scaled = q.numer() << usize::try_from(scale).unwrap();
        Self::new(scaled.div_floor(q.denom()), -i64::try_from(scale).unwrap())
    }

    /// Smallest dyadic with at most `prec` significant bits that is ≥
    /// the rational `q`.
    #[must_use]
    pub fn from_rational_ceil(q: &BigRational, prec: u64) -> Self {
        let scale = Self::rational_scale(q, prec);
        let scaled = q.numer() << usize::try_from(scale).unwrap();
        let ceiled = -((-scaled).div_floor(q.denom()));
        Self::new(ceiled, -i64::try_from(scale).unwrap())
    }

    fn rational_scale(q: &BigRational, prec: u64) -> u64 {
        // Enough fractional bits that the scaled numerator keeps prec
        // significant bits after the division.
        prec + q.denom().bits() + 2
    }
}

impl PartialOrd for Dyadic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dyadic {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.signum(), other.signum()) {
            (a, b) if a != b => a.cmp(&b),
            (0, 0) => Ordering::Equal,
            _ => {
                let diff = self.sub(other);
                diff.signum().cmp(&0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dy(man: i64, exp: i64) -> Dyadic {
        Dyadic::new(BigInt::from(man), exp)
    }

    #[test]
    fn normalization_strips_trailing_zeros() {
        assert_eq!(dy(8, 0), dy(1, 3));
        assert_eq!(dy(12, -2), dy(3, 0));
        assert!(dy(0, 5).is_zero());
    }

    #[test]
    fn exact_arithmetic() {
        // 1.5 + 0.25 = 1.75
        assert_eq!(dy(3, -1).add(&dy(1, -2)), dy(7, -2));
        // 1.5 * 0.25 = 0.375
        assert_eq!(dy(3, -1).mul(&dy(1, -2)), dy(3, -3));
        assert_eq!(dy(5, 0).sub(&dy(5, 0)), Dyadic::zero());
    }

    #[test]
    fn ordering() {
        assert!(dy(-1, 10) < dy(1, -10));
        assert!(dy(3, -1) > dy(1, 0));
        assert_eq!(dy(4, 0).cmp(&dy(1, 2)), Ordering::Equal);
    }

    #[test]
    fn truncation_directions() {
        let x = dy(0b10111, 0); // 23
        let (lo, err) = x.truncate_floor(3);
        assert_eq!(lo, dy(0b101, 2)); // 20
        assert_eq!(err.unwrap(), dy(1, 2)); // one ulp
        assert_eq!(x.truncate_ceil(3), dy(0b110, 2)); // 24
        // Exact fits report no error.
        assert_eq!(x.truncate_floor(10), (x.clone(), None));
    }

    #[test]
    fn rational_conversions_bracket() {
        let q = BigRational::new(BigInt::from(1), BigInt::from(3));
        let lo = Dyadic::from_rational_floor(&q, 20);
        let hi = Dyadic::from_rational_ceil(&q, 20);
        assert!(lo.to_rational() <= q);
        assert!(hi.to_rational() >= q);
        let gap = hi.sub(&lo);
        assert!(gap <= Dyadic::power_of_two(-20));
    }

    #[test]
    fn f64_round_trip() {
        assert!((dy(3, -1).to_f64() - 1.5).abs() < 1e-15);
        assert!((dy(1, -3).to_f64() - 0.125).abs() < 1e-15);
    }
}
