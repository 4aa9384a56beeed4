//! The named TKF91 expressions, registered once per alignment request.
//!
//! The names in this structure are aliases into the expression
//! registry; repeated π values share a single node so that equal
//! frequencies stay symbolically identical.

use crate::expr::{ExprId, ExprRegistry};
use crate::rationals::TkfRationals;

/// Named handles for every expression the generators draw on.
#[derive(Clone, Debug)]
pub struct Tkf91Expressions {
    /// λ/μ.
    pub lambda_div_mu: ExprId,
    /// 1 − λ/μ.
    pub one_minus_lambda_div_mu: ExprId,
    /// πᵢ, with aliasing for repeated values.
    pub pi: [ExprId; 4],
    /// exp(−μτ).
    pub exp_neg_mu_tau: ExprId,
    /// β = (1 − exp((λ−μ)τ)) / (μ − λ·exp((λ−μ)τ)).
    pub beta: ExprId,
    /// λβ.
    pub lambda_beta: ExprId,
    /// 1 − λβ.
    pub one_minus_lambda_beta: ExprId,
    /// μβ.
    pub mu_beta: ExprId,
    /// 1 − exp(−μτ) − μβ.
    pub the_long_beta_expression: ExprId,
    /// 1 − exp(−dt).
    pub one_minus_exp_negdt: ExprId,
    /// Per-nucleotide match probability exp(−dt) + πᵢ(1 − exp(−dt)).
    pub match_: [ExprId; 4],
    /// Per-nucleotide mismatch probability πᵢ(1 − exp(−dt)).
    pub mismatch: [ExprId; 4],
}

impl Tkf91Expressions {
    /// Registers the whole expression family for one parameter bundle.
    #[must_use]
    pub fn new(reg: &mut ExprRegistry, r: &TkfRationals) -> Self {
        // Factors related to sequence length equilibrium frequency.
        let lambda_div_mu = reg.rat(r.lambda_div_mu.clone());
        let one_minus_lambda_div_mu = reg.rat(r.one_minus_lambda_div_mu.clone());

        // Factors related to sequence composition.
        let mut pi = [lambda_div_mu; 4];
        for i in 0..4 {
            let alias = (0..i).find(|&j| r.pi[i] == r.pi[j]);
            pi[i] = match alias {
                Some(j) => pi[j],
                None => reg.rat(r.pi[i].clone()),
            };
        }

        // Factors related to the indel process involving beta.
        let x_mu = reg.rat(r.mu.clone());
        let x_lambda = reg.rat(r.lambda.clone());
        let a = reg.exp_rat(r.beta_exponent.clone());
        let num = reg.complement(a);
        let b = reg.mul(x_lambda, a);
        let den = reg.sub(x_mu, b);
        let exp_neg_mu_tau = reg.exp_rat(r.neg_mu_tau.clone());
        let beta = reg.div(num, den);
        let lambda_beta = reg.mul(x_lambda, beta);
        let one_minus_lambda_beta = reg.complement(lambda_beta);
        let mu_beta = reg.mul(x_mu, beta);
        let c = reg.add(exp_neg_mu_tau, mu_beta);
        let the_long_beta_expression = reg.complement(c);

        // Factors related to point substitutions.
        let exp_negdt = reg.exp_rat(r.negdt.clone());
        let one_minus_exp_negdt = reg.complement(exp_negdt);
        let mut match_ = [exp_negdt; 4];
        let mut mismatch = [exp_negdt; 4];
        for i in 0..4 {
            let alias = (0..i).find(|&j| r.pi[i] == r.pi[j]);
            if let Some(j) = alias {
                match_[i] = match_[j];
                mismatch[i] = mismatch[j];
            } else {
                let a = reg.mul(pi[i], one_minus_exp_negdt);
                match_[i] = reg.add(exp_negdt, a);
                mismatch[i] = a;
            }
        }

        Self {
            lambda_div_mu,
            one_minus_lambda_div_mu,
            pi,
            exp_neg_mu_tau,
            beta,
            lambda_beta,
            one_minus_lambda_beta,
            mu_beta,
            the_long_beta_expression,
            one_minus_exp_negdt,
            match_,
            mismatch,
        }
    }
}
