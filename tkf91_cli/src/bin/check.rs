#![allow(missing_docs)]

//! Check the status of a given alignment under the TKF91 model.
//!
//! Each of the three reported fields independently degrades to
//! `"undetermined"` when the certifying driver runs out of precision
//! levels.

use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tkf91::check;
use tkf91::sequence::decode_alignment_row;
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
    alignment_is_optimal: String,
    alignment_is_canonical: String,
    number_of_optimal_alignments: String,
}

#[derive(Parser)]
#[command(about = "Check whether an alignment is optimal and canonical", version)]
struct Opts {
    #[command(flatten)]
    io: StreamOpts,
}

fn verdict(value: Option<bool>) -> String {
    match value {
        Some(true) => "yes".to_string(),
        Some(false) => "no".to_string(),
        None => "undetermined".to_string(),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::parse();
    let req: Request = read_request(opts.io.input.as_deref())?;
    let params = req.parameters.to_model()?;
    let row_a = decode_alignment_row(&req.sequence_a)?;
    let row_b = decode_alignment_row(&req.sequence_b)?;

    let report = check(&params, &row_a, &row_b)?;

    write_response(
        opts.io.output.as_deref(),
        &Response {
            alignment_is_optimal: verdict(report.optimal),
            alignment_is_canonical: verdict(report.canonical),
            number_of_optimal_alignments: report
                .count
                .map_or_else(|| "undetermined".to_string(), |c| c.to_string()),
        },
    )
}
