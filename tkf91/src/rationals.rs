//! Exact rational quantities derived from the model parameters.
//!
//! These are the closed-form rational pieces of the TKF91 transition
//! probabilities; everything transcendental is deferred to the
//! expression registry.

use crate::params::ModelParams;
use num_rational::BigRational;
use num_traits::One;

/// Derived rational bundle, computed once per alignment request.
#[derive(Clone, Debug)]
pub struct TkfRationals {
    /// Birth rate λ.
    pub lambda: BigRational,
    /// Death rate μ.
    pub mu: BigRational,
    /// Divergence time τ.
    pub tau: BigRational,
    /// Stationary frequencies π.
    pub pi: [BigRational; 4],
    /// Complements 1 − πᵢ.
    pub qi: [BigRational; 4],
    /// −τ / (1 − Σπᵢ²), the substitution exponent.
    pub negdt: BigRational,
    /// λ/μ.
    pub lambda_div_mu: BigRational,
    /// 1 − λ/μ.
    pub one_minus_lambda_div_mu: BigRational,
    /// (λ − μ)·τ, the exponent inside β.
    pub beta_exponent: BigRational,
    /// −μ·τ.
    pub neg_mu_tau: BigRational,
}

impl TkfRationals {
    /// Derives the bundle from validated model parameters.
    #[must_use]
    pub fn new(params: &ModelParams) -> Self {
        let lambda = params.lambda.clone();
        let mu = params.mu.clone();
        let tau = params.tau.clone();
        let pi = params.pi.clone();
        let qi = std::array::from_fn(|i| BigRational::one() - &pi[i]);

        let negdt = -(&tau / params.pi_normalizer());
        let lambda_div_mu = &lambda / &mu;
        let one_minus_lambda_div_mu = BigRational::one() - &lambda_div_mu;
        let beta_exponent = (&lambda - &mu) * &tau;
        let neg_mu_tau = -(&mu * &tau);

        Self {
            lambda,
            mu,
            tau,
            pi,
            qi,
            negdt,
            lambda_div_mu,
            one_minus_lambda_div_mu,
            beta_exponent,
            neg_mu_tau,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::rational_from_parts;
    use crate::params::tests::uniform_params;

    #[test]
    fn derived_values_for_uniform_parameters() {
        let r = TkfRationals::new(&uniform_params());
        assert_eq!(r.lambda_div_mu, rational_from_parts(1, 2).unwrap());
        assert_eq!(r.one_minus_lambda_div_mu, rational_from_parts(1, 2).unwrap());
        // dt = (1/10) / (1 - 4/16) = 2/15
        assert_eq!(r.negdt, rational_from_parts(-2, 15).unwrap());
        assert_eq!(r.beta_exponent, rational_from_parts(-1, 10).unwrap());
        assert_eq!(r.neg_mu_tau, rational_from_parts(-1, 5).unwrap());
        for q in &r.qi {
            assert_eq!(*q, rational_from_parts(3, 4).unwrap());
        }
    }
}
