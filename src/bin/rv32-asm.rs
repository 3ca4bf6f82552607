use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rv32i_rs::{config::log_filter, trace::write_machine_code, Assembler};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assemble RV32I-subset source into one binary word per line"
)]
struct Opts {
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
    /// Terminate the program with a `halt` word if it does not end in one
    #[arg(long)]
    append_halt: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref()))
        .init();

    let opts = Opts::parse();
    let words = Assembler::new()
        .append_halt(opts.append_halt)
        .assemble_file(&opts.input)
        .with_context(|| format!("assembling {}", opts.input.display()))?;
    write_machine_code(&opts.output, &words)?;

    info!(words = words.len(), output = %opts.output.display(), "assembled");
    Ok(())
}
