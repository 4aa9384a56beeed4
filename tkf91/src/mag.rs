//! Low-precision magnitude bounds: a 30-bit unsigned mantissa with a
//! wide exponent.
//!
//! These are the working values of the fast bounding strategy. A `Mag`
//! is either an upper or a lower bound on a nonnegative quantity,
//! depending on which rounding direction produced it; multiplication
//! comes in the matching two flavors.

use crate::dyadic::Dyadic;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::cmp::Ordering;

const MAG_BITS: u32 = 30;
const MAG_ONE: u64 = 1 << MAG_BITS;

/// A nonnegative magnitude `man · 2^exp` with `man` normalized to
/// 30 bits (or zero).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mag {
    man: u32,
    exp: i64,
}

impl Mag {
    /// Zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            man: 0,
            exp: 0,
        }
    }

    /// Whether the magnitude is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.man == 0
    }

    fn normalize(mut man: u64, mut exp: i64, round_up: bool) -> Self {
        if man == 0 {
            return Self::zero();
        }
        let mut inexact = false;
        while man >= MAG_ONE {
            inexact |= man & 1 != 0;
            man >>= 1;
            exp += 1;
        }
        if round_up && inexact {
            man += 1;
            if man >= MAG_ONE {
                man >>= 1;
                exp += 1;
            }
        }
        while man < MAG_ONE / 2 {
            man <<= 1;
            exp -= 1;
        }
        Self {
            man: u32::try_from(man).unwrap(),
            exp,
        }
    }

    fn from_dyadic(d: &Dyadic, round_up: bool) -> Self {
        debug_assert!(d.signum() >= 0);
        if d.is_zero() {
            return Self::zero();
        }
        let kept = if round_up {
            d.truncate_ceil(u64::from(MAG_BITS))
        } else {
            d.truncate_floor(u64::from(MAG_BITS)).0
        };
        // The kept mantissa fits in 30 bits by construction.
        let (man, exp) = dyadic_parts(&kept);
        Self::normalize(man, exp, false)
    }

    /// An upper magnitude bound on a nonnegative dyadic value.
    #[must_use]
    pub fn upper_of(d: &Dyadic) -> Self {
        Self::from_dyadic(d, true)
    }

    /// A lower magnitude bound on a nonnegative dyadic value; negative
    /// inputs clamp to zero.
    #[must_use]
    pub fn lower_of(d: &Dyadic) -> Self {
        if d.signum() <= 0 {
            return Self::zero();
        }
        Self::from_dyadic(d, false)
    }

    /// Product, rounded up.
    #[must_use]
    pub fn mul_upper(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        Self::normalize(
            u64::from(self.man) * u64::from(other.man),
            self.exp + other.exp,
            true,
        )
    }

    /// Product, rounded down.
    #[must_use]
    pub fn mul_lower(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        Self::normalize(
            u64::from(self.man) * u64::from(other.man),
            self.exp + other.exp,
            false,
        )
    }

    /// The larger of two magnitudes.
    #[must_use]
    pub fn max(&self, other: &Self) -> Self {
        if self < other {
            *other
        } else {
            *self
        }
    }

    /// The exact dyadic value of this magnitude.
    #[must_use]
    pub fn to_dyadic(&self) -> Dyadic {
        Dyadic::new(BigInt::from(self.man), self.exp)
    }
}

fn dyadic_parts(d: &Dyadic) -> (u64, i64) {
    // The mantissa has at most 31 bits here, so it converts losslessly.
    let man = d.mantissa().magnitude().to_u64().unwrap();
    (man, d.exponent())
}

impl PartialOrd for Mag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mag {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            // Both mantissas are normalized to [2^29, 2^30).
            (false, false) => (self.exp, self.man).cmp(&(other.exp, other.man)),
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
    fn bounds_bracket_the_value() {
        let d = dy(0xABCDEF12345, -20);
        let lo = Mag::lower_of(&d);
        let hi = Mag::upper_of(&d);
        assert!(lo.to_dyadic() <= d);
        assert!(hi.to_dyadic() >= d);
        assert!(lo <= hi);
    }

    #[test]
    fn small_values_convert_exactly() {
        let d = dy(12345, -7);
        assert_eq!(Mag::lower_of(&d).to_dyadic(), d);
        assert_eq!(Mag::upper_of(&d).to_dyadic(), d);
    }

    #[test]
    fn multiplication_directions() {
        let a = Mag::upper_of(&dy(0x3FFFFFFF, 0));
        let product_up = a.mul_upper(&a);
        let product_down = a.mul_lower(&a);
        let exact = dy(0x3FFFFFFF, 0).mul(&dy(0x3FFFFFFF, 0));
        assert!(product_down.to_dyadic() <= exact);
        assert!(product_up.to_dyadic() >= exact);
        assert!(product_down <= product_up);
    }

    #[test]
    fn ordering_spans_exponents() {
        let small = Mag::upper_of(&dy(1, -100));
        let large = Mag::upper_of(&dy(1, 100));
        assert!(small < large);
        assert!(Mag::zero() < small);
        assert_eq!(small.max(large), large);
    }

    #[test]
    fn zero_is_absorbing() {
        let a = Mag::upper_of(&dy(7, 3));
        assert!(Mag::zero().mul_upper(&a).is_zero());
        assert!(a.mul_lower(&Mag::zero()).is_zero());
    }
}
