// src/config.rs
use anyhow::{Context, Result};
use clap::Parser;
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Rewrite the nanosecond-epoch `time` column of CSV files as readable timestamps.
#[derive(Parser, Debug)]
#[command(name = "timefix", version)]
pub struct Args {
    /// CSV files or glob patterns to convert
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Directory for `<name>_fixed.csv` outputs (defaults to each input's directory)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Format timestamps in UTC instead of the local time zone
    #[arg(long)]
    pub utc: bool,

    /// Print one JSON status object per input
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub inputs: Vec<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub utc: bool,
    pub json: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self> {
        Ok(Self {
            inputs: resolve_inputs(&args.inputs)?,
            out_dir: args.out_dir,
            utc: args.utc,
            json: args.json,
        })
    }

    /// Where the converted copy of `input` goes.
    pub fn output_dir_for<'a>(&'a self, input: &'a Path) -> &'a Path {
        match &self.out_dir {
            Some(d) => d,
            None => input.parent().unwrap_or_else(|| Path::new("")),
        }
    }
}

/// Expand glob patterns. A pattern matching nothing is kept as a literal
/// path so its read error surfaces per file.
pub fn resolve_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for pattern in patterns {
        let matches: Vec<PathBuf> = glob(pattern)
            .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
            .filter_map(|entry| entry.ok())
            .collect();
        debug!(pattern = %pattern, matched = matches.len(), "resolved input");
        if matches.is_empty() {
            out.push(PathBuf::from(pattern));
        } else {
            out.extend(matches);
        }
    }
    Ok(out)
}
