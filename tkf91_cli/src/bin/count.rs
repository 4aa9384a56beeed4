#![allow(missing_docs)]

//! Count the co-optimal alignments of two sequences.

use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tkf91::count_optimal_alignments;
use tkf91::sequence::decode_residues;
use tkf91_cli::{read_request, write_response, JsonParameters, StreamOpts};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Request {
    parameters: JsonParameters,
    sequence_a: String,
    sequence_b: String,
}

#[derive(Serialize)]
struct Response {
    // A decimal string: the count overflows JSON integer capacity.
    number_of_optimal_alignments: String,
}

#[derive(Parser)]
#[command(about = "Count the optimal TKF91 alignments of two sequences", version)]
struct Opts {
    #[command(flatten)]
    io: StreamOpts,
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();
    let req: Request = read_request(opts.io.input.as_deref())?;
    let params = req.parameters.to_model()?;
    let a = decode_residues(&req.sequence_a)?;
    let b = decode_residues(&req.sequence_b)?;

    let count = count_optimal_alignments(&params, &a, &b)?;

    write_response(
        opts.io.output.as_deref(),
        &Response {
            number_of_optimal_alignments: count.to_string(),
        },
    )
}
