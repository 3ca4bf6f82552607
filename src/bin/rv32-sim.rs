use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use rv32i_rs::{
    config::log_filter,
    run,
    trace::{load_machine_code, render, TraceFormat},
    SimConfig,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run RV32I-subset machine code and write its register trace"
)]
struct Opts {
    /// Machine code, one 32-digit binary word per line
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
    /// Also write a decimal trace here
    #[arg(value_name = "READABLE_OUTPUT")]
    readable: Option<PathBuf>,
    /// JSON file overriding `SimConfig` defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = TraceFormat::Binary)]
    format: TraceFormat,
    #[arg(long)]
    max_steps: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    let opts = Opts::parse();
    let mut cfg = match &opts.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if opts.max_steps.is_some() {
        cfg.max_steps = opts.max_steps;
    }

    let text = load_machine_code(&opts.input)?;
    let result = run(&text, &cfg).with_context(|| format!("simulating {}", opts.input.display()))?;

    if !result.skipped.is_empty() {
        warn!(count = result.skipped.len(), "skipped words with unknown opcodes");
    }

    let out = render(&result, opts.format)?;
    std::fs::write(&opts.output, out)
        .with_context(|| format!("writing {}", opts.output.display()))?;
    if let Some(path) = &opts.readable {
        std::fs::write(path, render(&result, TraceFormat::Decimal)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
