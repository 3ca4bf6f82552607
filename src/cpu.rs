use anyhow::Error;
use serde::{Deserialize, Serialize};

use crate::decoder::Decoder;
use crate::exec::Executor;
use crate::memory::Bus;

/// Register index of the stack pointer.
pub const SP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Initial value of `sp` (x2) on creation and on `rst`.
    pub stack_pointer: i32,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self { stack_pointer: 380 }
    }
}

/// Architectural state of the hart: 32 registers and the program counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: u32,
    pub regs: [i32; 32], // regs[0] is never written
    pub cfg: CpuConfig,
}

#[derive(thiserror::Error, Debug)]
pub enum Trap {
    #[error("Invalid instruction {raw:#034b} at {pc:#010x}")]
    InvalidInstruction { pc: u32, raw: u32 },
    #[error("Program counter {pc:#010x} is outside the program")]
    PcOutOfRange { pc: u32 },
    #[error("Bus error at {addr:#010x}: {source}")]
    Bus {
        addr: u32,
        #[source]
        source: Error,
    },
    #[error("Halt at {pc:#010x}")]
    Halt { pc: u32 },
}

impl Cpu {
    pub fn new(cfg: CpuConfig) -> Self {
        let mut cpu = Self {
            pc: 0,
            regs: [0; 32],
            cfg,
        };
        cpu.reset_registers();
        cpu
    }

    pub fn reset(&mut self, reset_pc: u32) {
        self.pc = reset_pc;
        self.reset_registers();
    }

    /// Zeroes every register except the stack-pointer seed.
    pub fn reset_registers(&mut self) {
        self.regs = [0; 32];
        self.regs[SP] = self.cfg.stack_pointer;
    }

    pub fn reg(&self, r: u8) -> i32 {
        match r {
            0 => 0,
            r => self.regs[r as usize & 0x1F],
        }
    }

    /// Writes to x0 are discarded.
    pub fn set_reg(&mut self, r: u8, val: i32) {
        if r != 0 {
            self.regs[r as usize & 0x1F] = val;
        }
    }

    /// Fetches, decodes and executes the word at `pc`.
    ///
    /// Undecodable words still advance `pc` by 4 before the
    /// [`Trap::InvalidInstruction`] is returned, so callers may keep going.
    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        text: &[u32],
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<(), Trap> {
        let pc = self.pc;
        let raw32 = fetch(text, pc).ok_or(Trap::PcOutOfRange { pc })?;
        self.pc = pc.wrapping_add(4);
        let d = dec
            .decode(raw32)
            .ok_or(Trap::InvalidInstruction { pc, raw: raw32 })?;
        exec.exec(self, bus, pc, d)
    }
}

/// The instruction word at byte address `pc`, if `pc` indexes one.
pub fn fetch(text: &[u32], pc: u32) -> Option<u32> {
    if pc % 4 != 0 {
        return None;
    }
    text.get((pc / 4) as usize).copied()
}
