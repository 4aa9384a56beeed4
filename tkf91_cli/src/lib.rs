#![allow(clippy::missing_errors_doc)]

//! Shared request/response plumbing for the tkf91 executables.
//!
//! Every executable reads one JSON object, answers with one JSON
//! object, and exits nonzero on validation failure. Unknown keys are
//! rejected everywhere.

use anyhow::{Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tkf91::params::rational_from_parts;
use tkf91::ModelParams;

/// A rational number on the wire.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRational {
    /// Numerator.
    pub num: i64,
    /// Denominator; a negative value normalizes into the numerator.
    pub denom: i64,
}

/// The shared model-parameter object.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JsonParameters {
    /// Stationary frequency of A.
    pub pa: JsonRational,
    /// Stationary frequency of C.
    pub pc: JsonRational,
    /// Stationary frequency of G.
    pub pg: JsonRational,
    /// Stationary frequency of T.
    pub pt: JsonRational,
    /// Birth rate λ.
    pub lambda: JsonRational,
    /// Death rate μ.
    pub mu: JsonRational,
    /// Divergence time τ.
    pub tau: JsonRational,
}

impl JsonParameters {
    /// Converts and validates into the model's exact parameters.
    pub fn to_model(self) -> Result<ModelParams> {
        let q = |r: JsonRational| rational_from_parts(r.num, r.denom);
        let params = ModelParams {
            lambda: q(self.lambda)?,
            mu: q(self.mu)?,
            tau: q(self.tau)?,
            pi: [q(self.pa)?, q(self.pc)?, q(self.pg)?, q(self.pt)?],
        };
        params.validate()?;
        Ok(params)
    }
}

/// Stream overrides shared by all executables.
#[derive(Args, Debug)]
pub struct StreamOpts {
    /// Read the JSON request from a file instead of standard input.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Write the JSON response to a file instead of standard output.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Reads and parses the single JSON request object.
pub fn read_request<T: DeserializeOwned>(input: Option<&Path>) -> Result<T> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read standard input")?;
            text
        }
    };
    serde_json::from_str(&text).context("invalid request object")
}

/// Emits the single JSON response object.
pub fn write_response<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    let mut text = serde_json::to_string(value).context("failed to encode the response")?;
    text.push('\n');
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{text}"),
    }
    Ok(())
}
