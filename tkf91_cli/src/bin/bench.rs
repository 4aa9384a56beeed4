#![allow(missing_docs)]

//! Benchmark an alignment strategy: repeat the same request and report
//! per-sample timings in clock ticks. The last sample's solution
//! provides the aligned rows in the output.

use anyhow::{bail, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tkf91::sequence::decode_residues;
use tkf91::{align, Precision, Solution};
use tkf91_cli::{read_request, write_response, JsonParameters, StreamOpts};

const TICKS_PER_SECOND: u64 = 1_000_000;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Request {
    parameters: JsonParameters,
    sequence_a: String,
    sequence_b: String,
    samples: u64,
    #[serde(default)]
    rtol: f64,
    precision: Option<String>,
}

#[derive(Serialize)]
struct Response {
    ticks_per_second: u64,
    elapsed_ticks: Vec<u64>,
    sequence_a: String,
    sequence_b: String,
}

#[derive(Parser)]
#[command(about = "Benchmark a TKF91 alignment strategy", version)]
struct Opts {
    #[command(flatten)]
    io: StreamOpts,
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();
    let req: Request = read_request(opts.io.input.as_deref())?;
    let params = req.parameters.to_model()?;
    if req.samples < 1 {
        bail!("samples must be at least 1");
    }
    // No precision string selects the escalation driver.
    let precision: Precision = req
        .precision
        .as_deref()
        .map_or(Ok(Precision::High), str::parse)?;
    let a = decode_residues(&req.sequence_a)?;
    let b = decode_residues(&req.sequence_b)?;

    let mut elapsed_ticks = Vec::with_capacity(usize::try_from(req.samples)?);
    let mut last: Option<Solution> = None;
    for _ in 0..req.samples {
        let started = Instant::now();
        let solution = align(&params, &a, &b, precision, req.rtol)?;
        let micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        elapsed_ticks.push(micros);
        last = Some(solution);
    }
    let last = last.expect("at least one sample ran");

    write_response(
        opts.io.output.as_deref(),
        &Response {
            ticks_per_second: TICKS_PER_SECOND,
            elapsed_ticks,
            sequence_a: last.aligned_a,
            sequence_b: last.aligned_b,
        },
    )
}
