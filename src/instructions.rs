use serde::{Deserialize, Serialize};

use crate::codec::{
    Fields, Format, OPCODE_AUIPC, OPCODE_BRANCH, OPCODE_JAL, OPCODE_JALR, OPCODE_LOAD, OPCODE_LUI,
    OPCODE_OP, OPCODE_OP_IMM, OPCODE_STORE,
};

use AddrMode as M;
use Format as F;

/// `rst`: the all-zero word.
pub const RST_WORD: u32 = 0x0000_0000;
/// `halt`: the `beq zero, zero, 0` self-loop the run loop stops on.
pub const HALT_WORD: u32 = 0x0000_0063;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Or,
    And,
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Lw,
    Jalr,
    Sw,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Lui,
    Auipc,
    Jal,
    Rst,
    Halt,
}

/// Operand shape of a mnemonic, as written in assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// `rd, rs1, rs2`
    Reg,
    /// `rd, rs1, imm`
    RegImm,
    /// `rd, rs1, shamt` (low 5 bits only)
    Shamt,
    /// `rd, rs1, imm` with the immediate taken as unsigned 12 bits
    UnsignedImm,
    /// `rd, off(rs1)`
    Load,
    /// `rd, rs1, imm` or `rd, off(rs1)`
    Jalr,
    /// `rs2, off(rs1)`
    Store,
    /// `rs1, rs2, label|offset`
    PcRel,
    /// `rd, imm`
    Upper,
    /// `rd, label|offset`
    Jump,
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Op,
    pub mnemonic: &'static str,
    pub format: Format,
    pub mode: AddrMode,
    pub opcode: u8,
    pub funct3: u8,
    pub funct7: u8,
}

const fn desc(
    op: Op,
    mnemonic: &'static str,
    format: Format,
    mode: AddrMode,
    opcode: u8,
    funct3: u8,
    funct7: u8,
) -> InstrDesc {
    InstrDesc {
        op,
        mnemonic,
        format,
        mode,
        opcode,
        funct3,
        funct7,
    }
}

pub const TABLE: &[InstrDesc] = &[
    desc(Op::Add, "add", F::R, M::Reg, OPCODE_OP, 0b000, 0b000_0000),
    desc(Op::Sub, "sub", F::R, M::Reg, OPCODE_OP, 0b000, 0b010_0000),
    desc(Op::Sll, "sll", F::R, M::Reg, OPCODE_OP, 0b001, 0b000_0000),
    desc(Op::Slt, "slt", F::R, M::Reg, OPCODE_OP, 0b010, 0b000_0000),
    desc(Op::Sltu, "sltu", F::R, M::Reg, OPCODE_OP, 0b011, 0b000_0000),
    desc(Op::Xor, "xor", F::R, M::Reg, OPCODE_OP, 0b100, 0b000_0000),
    desc(Op::Srl, "srl", F::R, M::Reg, OPCODE_OP, 0b101, 0b000_0000),
    desc(Op::Or, "or", F::R, M::Reg, OPCODE_OP, 0b110, 0b000_0000),
    desc(Op::And, "and", F::R, M::Reg, OPCODE_OP, 0b111, 0b000_0000),
    desc(Op::Addi, "addi", F::I, M::RegImm, OPCODE_OP_IMM, 0b000, 0),
    desc(Op::Slli, "slli", F::I, M::Shamt, OPCODE_OP_IMM, 0b001, 0),
    desc(Op::Slti, "slti", F::I, M::RegImm, OPCODE_OP_IMM, 0b010, 0),
    desc(Op::Sltiu, "sltiu", F::I, M::UnsignedImm, OPCODE_OP_IMM, 0b011, 0),
    desc(Op::Xori, "xori", F::I, M::RegImm, OPCODE_OP_IMM, 0b100, 0),
    desc(Op::Srli, "srli", F::I, M::Shamt, OPCODE_OP_IMM, 0b101, 0),
    desc(Op::Ori, "ori", F::I, M::RegImm, OPCODE_OP_IMM, 0b110, 0),
    desc(Op::Andi, "andi", F::I, M::RegImm, OPCODE_OP_IMM, 0b111, 0),
    desc(Op::Lw, "lw", F::I, M::Load, OPCODE_LOAD, 0b010, 0),
    desc(Op::Jalr, "jalr", F::I, M::Jalr, OPCODE_JALR, 0b000, 0),
    desc(Op::Sw, "sw", F::S, M::Store, OPCODE_STORE, 0b010, 0),
    desc(Op::Beq, "beq", F::B, M::PcRel, OPCODE_BRANCH, 0b000, 0),
    desc(Op::Bne, "bne", F::B, M::PcRel, OPCODE_BRANCH, 0b001, 0),
    desc(Op::Blt, "blt", F::B, M::PcRel, OPCODE_BRANCH, 0b100, 0),
    desc(Op::Bge, "bge", F::B, M::PcRel, OPCODE_BRANCH, 0b101, 0),
    desc(Op::Bltu, "bltu", F::B, M::PcRel, OPCODE_BRANCH, 0b110, 0),
    desc(Op::Bgeu, "bgeu", F::B, M::PcRel, OPCODE_BRANCH, 0b111, 0),
    desc(Op::Lui, "lui", F::U, M::Upper, OPCODE_LUI, 0, 0),
    desc(Op::Auipc, "auipc", F::U, M::Upper, OPCODE_AUIPC, 0, 0),
    desc(Op::Jal, "jal", F::J, M::Jump, OPCODE_JAL, 0, 0),
];

/// Table entry for a lowercase mnemonic. Sentinels are not in the table.
pub fn lookup(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic == mnemonic)
}

/// Table entry for an op. `None` for the sentinels.
pub fn describe(op: Op) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.op == op)
}

/// Table entry whose fixed fields match an unpacked word.
pub fn find_by_fields(format: Format, f: &Fields) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| {
        d.format == format
            && d.opcode == f.opcode
            && (!format.has_funct3() || d.funct3 == f.funct3)
            && (format != Format::R || d.funct7 == f.funct7)
    })
}

impl Op {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Rst => "rst",
            Op::Halt => "halt",
            op => describe(op).map_or("?", |d| d.mnemonic),
        }
    }
}

/// ABI names indexed by register number.
pub const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Register number for `x0`..`x31`, an ABI alias, or `fp`.
pub fn parse_reg(name: &str) -> Option<u8> {
    if name == "fp" {
        return Some(8);
    }
    if let Some(num) = name.strip_prefix('x') {
        if num.is_empty() || !num.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        return num.parse::<u8>().ok().filter(|&n| n < 32);
    }
    ABI_NAMES.iter().position(|&abi| abi == name).map(|n| n as u8)
}
