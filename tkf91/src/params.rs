//! Model parameters of the TKF91 process and their validation.

use crate::error::{Error, Result};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Builds a canonical rational from a numerator/denominator pair,
/// normalizing the sign so the denominator is positive.
pub fn rational_from_parts(num: i64, denom: i64) -> Result<BigRational> {
    if denom == 0 {
        return Err(Error::InvalidParameters(
            "rational with zero denominator".to_string(),
        ));
    }
    Ok(BigRational::new(BigInt::from(num), BigInt::from(denom)))
}

/// The rational inputs of one alignment request: birth rate λ, death
/// rate μ, divergence time τ and the stationary frequencies π.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelParams {
    /// Birth rate λ.
    pub lambda: BigRational,
    /// Death rate μ.
    pub mu: BigRational,
    /// Divergence time τ.
    pub tau: BigRational,
    /// Stationary nucleotide frequencies, indexed A, C, G, T.
    pub pi: [BigRational; 4],
}

impl ModelParams {
    /// Validates every constraint the model places on its parameters:
    /// all quantities strictly positive, λ < μ, and Σπ = 1.
    pub fn validate(&self) -> Result<()> {
        let named = [
            (&self.lambda, "lambda"),
            (&self.mu, "mu"),
            (&self.tau, "tau"),
            (&self.pi[0], "pa"),
            (&self.pi[1], "pc"),
            (&self.pi[2], "pg"),
            (&self.pi[3], "pt"),
        ];
        for (value, name) in named {
            if !value.is_positive() {
                return Err(Error::InvalidParameters(format!(
                    "{name} must be positive and well defined"
                )));
            }
        }
        if self.lambda >= self.mu {
            return Err(Error::InvalidParameters(
                "lambda must be less than mu".to_string(),
            ));
        }
        let total: BigRational = self.pi.iter().sum();
        if !total.is_one() {
            return Err(Error::InvalidParameters(
                "probabilities must sum to 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `1 − Σπᵢ²`, the substitution-rate normalizer. Positive for any
    /// valid parameter set.
    #[must_use]
    pub fn pi_normalizer(&self) -> BigRational {
        let mut result = BigRational::one();
        for p in &self.pi {
            result -= p * p;
        }
        debug_assert!(!result.is_zero());
        result
    }
}
