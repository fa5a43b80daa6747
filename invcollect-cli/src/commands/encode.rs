//! `invcollect encode` command handler

use std::io::Write;

use serde::Serialize;

use invcollect_core::params::{encode_params, parse_plain_pairs};

use crate::cli::EncodeArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `encode` command.
pub fn execute(args: EncodeArgs, writer: &OutputWriter) -> Result<(), CliError> {
    let report = encode(&args.pairs)?;
    writer.render(&report)
}

/// Build the run-parameter blob for a plain `key,value#key,value` list.
pub fn encode(pairs: &str) -> Result<EncodeReport, CliError> {
    let pairs = parse_plain_pairs(pairs)?;
    Ok(EncodeReport {
        keys: pairs.iter().map(|(k, _)| k.clone()).collect(),
        blob: encode_params(pairs),
    })
}

/// Encoded run parameters.
#[derive(Debug, Serialize)]
pub struct EncodeReport {
    /// Keys in input order (values are not echoed)
    pub keys: Vec<String>,
    pub blob: String,
}

impl Render for EncodeReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", self.blob)
    }
}
