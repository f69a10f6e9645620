use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use timefix::{
    config::{Args, Config},
    process::RowTimeConverter,
    session::{ConversionSession, SelectedFile, Status},
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Serialize)]
struct Report<'a> {
    input: String,
    #[serde(flatten)]
    status: &'a Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // ─── 2) configure ────────────────────────────────────────────────
    let cfg = Config::from_args(Args::parse())?;
    info!(inputs = cfg.inputs.len(), utc = cfg.utc, "startup");

    // ─── 3) convert every input through one session ──────────────────
    let failures = if cfg.utc {
        run(&cfg, ConversionSession::new(RowTimeConverter::new(Utc)))?
    } else {
        run(&cfg, ConversionSession::local())?
    };

    info!(failures, "all done");
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn run<Tz: TimeZone>(cfg: &Config, mut session: ConversionSession<Tz>) -> Result<usize> {
    let mut failures = 0;
    for input in &cfg.inputs {
        let mut status = session.select_file(Some(SelectedFile::from_path(input)));
        let mut output = None;
        if let Some(artifact) = session.artifact() {
            match artifact.persist_in(cfg.output_dir_for(input)) {
                Ok(path) => output = Some(path),
                Err(e) => {
                    error!(input = %input.display(), "{:#}", e);
                    status = Status::error(format!("Error saving output: {:#}", e));
                }
            }
        }
        if status.is_error() {
            failures += 1;
        }

        let report = Report {
            input: input.display().to_string(),
            status: &status,
            output,
        };
        if cfg.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            match &report.output {
                Some(out) => println!(
                    "{}: {} → {}",
                    report.input,
                    report.status.message,
                    out.display()
                ),
                None => println!("{}: {}", report.input, report.status.message),
            }
        }
    }
    session.release();
    Ok(failures)
}
