use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use std::fmt::Write as _;
use std::path::PathBuf;

use rv32_disasm::{build_report, load_machine_code, render_listing, Report};

#[derive(Parser, Debug)]
#[command(author, version, about = "RV32I-subset disassembler CLI", long_about = None)]
struct Cli {
    /// Address of the first word (hex or dec)
    #[arg(long, default_value = "0", value_parser = parse_u32)]
    base: u32,
    /// Machine-code file, one 32-digit binary word per line
    #[arg(value_name = "FILE")]
    input: PathBuf,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Disassemble every word in the file
    List {
        /// Name branch and jump targets so the listing re-assembles
        #[arg(long)]
        labels: bool,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Recover control-flow edges and labels from entry points
    Analyze {
        /// Entry addresses (hex or dec). Repeat flag to add multiple entries.
        #[arg(long = "entry", value_name = "ADDR", value_parser = parse_u32)]
        entries: Vec<u32>,
        /// Maximum instructions to decode before stopping
        #[arg(long, default_value_t = 100_000usize)]
        max_instr: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write analysis output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

fn render_text(report: &Report) -> String {
    let mut buf = String::new();
    let _ = writeln!(buf, "Analysis summary:");
    let entries: Vec<String> = report.entries.iter().map(|a| format!("{a:#010x}")).collect();
    let _ = writeln!(buf, "  entries   : {entries:?}");
    let _ = writeln!(buf, "  insts     : {}", report.instructions);
    let _ = writeln!(buf, "  blocks    : {}", report.blocks.len());
    let _ = writeln!(buf, "  edges     : {}", report.edges.len());
    let _ = writeln!(buf, "  functions : {}", report.functions.len());
    let _ = writeln!(buf, "Edges:");
    for e in &report.edges {
        let _ = writeln!(buf, "  {:#010x} -> {:#010x} ({})", e.from, e.to, e.kind.short());
    }
    let _ = writeln!(buf, "Labels:");
    for l in &report.labels {
        let _ = writeln!(buf, "  {:#010x} {}", l.addr, l.name);
    }
    buf
}

fn emit(out: Option<PathBuf>, text: String) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, text)?,
        None => print!("{text}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let img = load_machine_code(&cli.input, cli.base)?;

    match cli.cmd {
        Command::List { labels, out } => emit(out, render_listing(&img, labels)),
        Command::Analyze {
            mut entries,
            max_instr,
            format,
            out,
        } => {
            // default seed: first word
            if entries.is_empty() {
                entries.push(img.base);
            }
            entries.sort_unstable();
            entries.dedup();
            let report = build_report(&img, &entries, max_instr);
            let text = match format {
                OutputFormat::Text => render_text(&report),
                OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
            };
            emit(out, text)
        }
    }
}
