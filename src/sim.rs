//! The decode-execute loop and its trace.

use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn, Level};

use crate::config::SimConfig;
use crate::cpu::{fetch, Cpu, Trap};
use crate::decoder::Decoder;
use crate::disasm::fmt_decoded;
use crate::exec::{Executor, IntExecutor};
use crate::isa::rv32i::Rv32iDecoder;
use crate::memory::{Bus, DataMemory};

/// Architectural state after one step: `pc` then all 32 registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pc: u32,
    pub registers: [i32; 32],
}

impl Snapshot {
    pub fn of(cpu: &Cpu) -> Self {
        Self {
            pc: cpu.pc,
            registers: cpu.regs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    /// The halt sentinel was fetched.
    Sentinel,
    /// `pc` ran one word past the last instruction.
    FellOff,
    /// `pc` landed somewhere that is not an instruction.
    InvalidPc,
    /// The configured step limit was reached.
    StepLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub trace: Vec<Snapshot>,
    /// Addresses of words skipped for an unknown opcode, in execution order.
    pub skipped: Vec<u32>,
    /// The reserved region, `(address, word)` in address order.
    pub dump: Vec<(u32, u32)>,
    pub halt: HaltReason,
    pub cpu: Cpu,
    pub memory: DataMemory,
}

/// Runs `text` from address 0 on fresh state built from `cfg`.
pub fn run(text: &[u32], cfg: &SimConfig) -> Result<RunResult, Trap> {
    let mut cpu = Cpu::new(cfg.cpu);
    let mut memory = DataMemory::reserved(cfg.dump_base, cfg.dump_words);
    let mut skipped = Vec::new();
    let (trace, halt) = run_with(
        text,
        &mut cpu,
        &mut memory,
        &Rv32iDecoder::new(),
        &IntExecutor,
        cfg.max_steps,
        &mut skipped,
    )?;
    let dump = memory.dump(cfg.dump_base, cfg.dump_words);
    Ok(RunResult {
        trace,
        skipped,
        dump,
        halt,
        cpu,
        memory,
    })
}

/// Steps `cpu` until a terminal condition, recording one snapshot per step.
///
/// Unknown opcodes are reported and skipped; their addresses go to `skipped`.
/// Only bus failures are fatal.
pub fn run_with<B: Bus, D: Decoder, X: Executor>(
    text: &[u32],
    cpu: &mut Cpu,
    bus: &mut B,
    dec: &D,
    exec: &X,
    max_steps: Option<u64>,
    skipped: &mut Vec<u32>,
) -> Result<(Vec<Snapshot>, HaltReason), Trap> {
    let end = text.len() as u64 * 4;
    let mut snapshots = Vec::new();
    let mut steps = 0u64;

    let halt = loop {
        if max_steps.is_some_and(|limit| steps >= limit) {
            break HaltReason::StepLimit;
        }
        if tracing::enabled!(Level::TRACE) {
            if let Some(d) = fetch(text, cpu.pc).and_then(|raw| dec.decode(raw)) {
                trace!(pc = format_args!("{:#010x}", cpu.pc), "{}", fmt_decoded(&d));
            }
        }
        match cpu.step(text, bus, dec, exec) {
            Ok(()) => {}
            Err(Trap::Halt { .. }) => {
                snapshots.push(Snapshot::of(cpu));
                break HaltReason::Sentinel;
            }
            Err(Trap::InvalidInstruction { pc, raw }) => {
                warn!("invalid opcode {:#09b} in {raw:#034b} at {pc:#010x}; skipped", raw & 0x7F);
                skipped.push(pc);
            }
            Err(Trap::PcOutOfRange { pc }) if pc as u64 == end => break HaltReason::FellOff,
            Err(Trap::PcOutOfRange { pc }) => {
                warn!("pc {pc:#010x} does not address an instruction; stopping");
                break HaltReason::InvalidPc;
            }
            Err(e) => return Err(e),
        }
        steps += 1;
        snapshots.push(Snapshot::of(cpu));
    };

    info!(steps = snapshots.len(), skipped = skipped.len(), ?halt, "run finished");
    Ok((snapshots, halt))
}
