//! `cfs-sim`: run the event-driven CFS simulation over an input file and
//! print the resulting trace.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use cfs_sim::error::SimError;
use cfs_sim::{loader, printer, Engine};

#[derive(Debug, clap::Parser)]
#[command(
    name = "cfs-sim",
    about = "Deterministic event-driven simulator for a weighted fair scheduler across multiple CPUs"
)]
struct Opts {
    /// Path to the input file (`num_cpu num_processes` header, then one
    /// `pid niceness arrival burst` record per line).
    input: PathBuf,

    /// Where to write the trace. Defaults to stdout.
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    /// Minimum severity of diagnostic log lines written to stderr.
    #[clap(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&opts.log_level))
        .init();

    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            let code = err
                .downcast_ref::<SimError>()
                .map(|e| e.exit_code())
                .unwrap_or(2);
            ExitCode::from(code as u8)
        }
    }
}

fn run(opts: Opts) -> Result<()> {
    let file = File::open(&opts.input)
        .with_context(|| format!("failed to open input file {}", opts.input.display()))?;
    let loaded = loader::load(BufReader::new(file)).context("failed to parse input file")?;
    info!(
        "loaded {} process(es) across {} cpu(s) from {}",
        loaded.processes.len(),
        loaded.num_cpu,
        opts.input.display()
    );

    let engine = Engine::new(loaded.processes, loaded.num_cpu).context("failed to build engine")?;
    let trace = engine.run().context("simulation failed")?;
    info!("simulation produced {} trace line(s)", trace.len());

    match opts.output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create output file {}", path.display()))?;
            printer::write_trace(BufWriter::new(file), &trace).context("failed to write trace")?;
        }
        None => {
            let stdout = io::stdout();
            printer::write_trace(stdout.lock(), &trace).context("failed to write trace")?;
        }
    }

    Ok(())
}
