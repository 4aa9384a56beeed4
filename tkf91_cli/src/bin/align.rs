#![allow(missing_docs)]

//! Align two sequences and report whether the result is certified.

use anyhow::{bail, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tkf91::sequence::decode_residues;
use tkf91::{align, Precision};
use tkf91_cli::{read_request, write_response, JsonParameters, StreamOpts};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Request {
    parameters: JsonParameters,
    sequence_a: String,
    sequence_b: String,
    precision: String,
    rtol: f64,
}

#[derive(Serialize)]
struct Response {
    parameters: JsonParameters,
    sequence_a: String,
    sequence_b: String,
    verified: bool,
}

#[derive(Parser)]
#[command(about = "Align two sequences under the TKF91 model", version)]
struct Opts {
    #[command(flatten)]
    io: StreamOpts,
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();
    let req: Request = read_request(opts.io.input.as_deref())?;
    let params = req.parameters.to_model()?;
    let precision: Precision = req.precision.parse()?;
    if precision == Precision::High {
        bail!("expected the precision string to be one of {{float | double | mag | arb256}}");
    }
    let a = decode_residues(&req.sequence_a)?;
    let b = decode_residues(&req.sequence_b)?;

    let solution = align(&params, &a, &b, precision, req.rtol)?;

    write_response(
        opts.io.output.as_deref(),
        &Response {
            parameters: req.parameters,
            sequence_a: solution.aligned_a,
            sequence_b: solution.aligned_b,
            verified: solution.verified,
        },
    )
}
