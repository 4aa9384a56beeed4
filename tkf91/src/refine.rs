//! Coprime factor refinement.
//!
//! Given positive integers, computes pairwise coprime bases ≥ 2 such
//! that every input is a monomial with integer exponents over the
//! bases. This is the Bach–Driscoll–Shallit refinement; no factoring is
//! performed, only gcd splitting.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;

/// A refined factor: a base together with the accumulated exponent of
/// the input multiset over it.
pub type Factor = (BigInt, BigInt);

/// Refines a list of positive integers into coprime bases.
///
/// The output order is emergence order; callers must rely only on the
/// coprimality and product-preservation properties.
///
/// # Panics
///
/// Panics if any input is not positive.
#[must_use]
pub fn factor_refine(inputs: &[BigInt]) -> Vec<Factor> {
    let one = BigInt::one();
    let mut bases: Vec<Factor> = Vec::new();
    for x in inputs {
        assert!(x > &BigInt::from(0), "factor refinement needs positive inputs");
        if x.is_one() {
            continue;
        }
        bases.push((x.clone(), BigInt::one()));
        refine_pairs(&mut bases);
    }
    bases.retain(|(base, _)| base != &one);
    bases
}

/// Splits entries until all bases are pairwise coprime: any pair with
/// gcd g becomes (a/g, e_a), (b/g, e_b) and a new entry (g, e_a + e_b).
fn refine_pairs(bases: &mut Vec<Factor>) {
    loop {
        let mut changed = false;
        let mut fresh: Vec<Factor> = Vec::new();
        for i in 0..bases.len() {
            if bases[i].0.is_one() {
                continue;
            }
            for j in (i + 1)..bases.len() {
                if bases[j].0.is_one() {
                    continue;
                }
                let g = bases[i].0.gcd(&bases[j].0);
                if !g.is_one() {
                    let qi = &bases[i].0 / &g;
                    let qj = &bases[j].0 / &g;
                    let e = &bases[i].1 + &bases[j].1;
                    bases[i].0 = qi;
                    bases[j].0 = qj;
                    fresh.push((g, e));
                    changed = true;
                }
            }
        }
        bases.append(&mut fresh);
        bases.retain(|(base, _)| !base.is_one());
        if !changed {
            return;
        }
    }
}

/// Expresses `value` over refined `bases` by repeated division,
/// returning the exponent per base. Returns `None` when the value has a
/// factor outside the basis.
#[must_use]
pub fn decompose(value: &BigInt, bases: &[BigInt]) -> Option<Vec<u64>> {
    let mut rest = value.clone();
    let mut exponents = vec![0u64; bases.len()];
    for (k, base) in bases.iter().enumerate() {
        while rest.is_multiple_of(base) {
            rest = &rest / base;
            exponents[k] += 1;
        }
    }
    rest.is_one().then_some(exponents)
}
