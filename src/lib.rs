pub mod asm;
pub mod codec;
pub mod config;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod instructions;
pub mod memory;
pub mod sim;
pub mod trace;

pub mod isa {
    pub mod rv32i; // RV32I integer subset
}

pub use asm::{assemble, AsmError, AsmErrorKind, Assembler};
pub use config::SimConfig;
pub use cpu::{Cpu, CpuConfig, Trap};
pub use memory::{Bus, DataMemory};
pub use sim::{run, HaltReason, RunResult, Snapshot};
