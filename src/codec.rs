//! Instruction word codec.
//!
//! Every bit position of the six RV32I formats lives here. The assembler packs
//! [`Fields`] into words with [`pack`]; the decoder recovers them with
//! [`unpack`]. Nothing else in the crate shifts instruction bits around.

use core::ops::Range;
use serde::{Deserialize, Serialize};

pub const OPCODE_OP: u8 = 0b011_0011;
pub const OPCODE_OP_IMM: u8 = 0b001_0011;
pub const OPCODE_LOAD: u8 = 0b000_0011;
pub const OPCODE_JALR: u8 = 0b110_0111;
pub const OPCODE_STORE: u8 = 0b010_0011;
pub const OPCODE_BRANCH: u8 = 0b110_0011;
pub const OPCODE_LUI: u8 = 0b011_0111;
pub const OPCODE_AUIPC: u8 = 0b001_0111;
pub const OPCODE_JAL: u8 = 0b110_1111;

/// Bit-field layout class of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
}

impl Format {
    /// The layout used by words carrying `opcode` in their low 7 bits.
    pub fn of_opcode(opcode: u8) -> Option<Format> {
        match opcode {
            OPCODE_OP => Some(Format::R),
            OPCODE_OP_IMM | OPCODE_LOAD | OPCODE_JALR => Some(Format::I),
            OPCODE_STORE => Some(Format::S),
            OPCODE_BRANCH => Some(Format::B),
            OPCODE_LUI | OPCODE_AUIPC => Some(Format::U),
            OPCODE_JAL => Some(Format::J),
            _ => None,
        }
    }

    /// Inclusive bounds an immediate must satisfy before packing.
    ///
    /// U-format immediates are whole 32-bit values of which only bits 31..12
    /// survive, so both signed and unsigned spellings are accepted.
    pub fn imm_range(self) -> Option<(i64, i64)> {
        match self {
            Format::R => None,
            Format::I | Format::S => Some((-2048, 2047)),
            Format::B => Some((-4096, 4095)),
            Format::U => Some((i32::MIN as i64, u32::MAX as i64)),
            Format::J => Some((-1_048_576, 1_048_575)),
        }
    }

    /// Whether the format carries a funct3 field.
    pub fn has_funct3(self) -> bool {
        !matches!(self, Format::U | Format::J)
    }
}

/// Field values of one instruction word.
///
/// `imm` holds the immediate as the instruction means it: sign-extended for
/// I/S/B/J, and the full 32-bit value (low 12 bits zero) for U.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fields {
    pub opcode: u8,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub funct3: u8,
    pub funct7: u8,
    pub imm: i32,
}

/// Isolates `range` of `num`, shifted down to bit 0.
pub const fn bits(num: u32, range: Range<u8>) -> u32 {
    (num >> range.start) & !(u32::MAX << (range.end - range.start))
}

/// Sign-extends the low `width` bits of `v`.
pub const fn sign_ext(v: u32, width: u32) -> i32 {
    let s = 32 - width;
    ((v << s) as i32) >> s
}

/// Primary opcode of a word.
pub const fn opcode(word: u32) -> u8 {
    bits(word, 0..7) as u8
}

/// Packs `f` into a word laid out as `format`.
///
/// Fields are masked to their widths; range checking is the caller's job.
pub fn pack(format: Format, f: &Fields) -> u32 {
    let opcode = f.opcode as u32 & 0x7F;
    let rd = (f.rd as u32 & 0x1F) << 7;
    let funct3 = (f.funct3 as u32 & 0x7) << 12;
    let rs1 = (f.rs1 as u32 & 0x1F) << 15;
    let rs2 = (f.rs2 as u32 & 0x1F) << 20;
    let imm = f.imm as u32;
    match format {
        Format::R => (f.funct7 as u32 & 0x7F) << 25 | rs2 | rs1 | funct3 | rd | opcode,
        Format::I => bits(imm, 0..12) << 20 | rs1 | funct3 | rd | opcode,
        Format::S => bits(imm, 5..12) << 25 | rs2 | rs1 | funct3 | bits(imm, 0..5) << 7 | opcode,
        Format::B => {
            bits(imm, 12..13) << 31
                | bits(imm, 5..11) << 25
                | rs2
                | rs1
                | funct3
                | bits(imm, 1..5) << 8
                | bits(imm, 11..12) << 7
                | opcode
        }
        Format::U => imm & 0xFFFF_F000 | rd | opcode,
        Format::J => {
            bits(imm, 20..21) << 31
                | bits(imm, 1..11) << 21
                | bits(imm, 11..12) << 20
                | bits(imm, 12..20) << 12
                | rd
                | opcode
        }
    }
}

/// Splits a word into its format and fields. `None` for unknown opcodes.
///
/// Only the fields the format defines are filled in; the rest stay zero.
pub fn unpack(word: u32) -> Option<(Format, Fields)> {
    let opcode = opcode(word);
    let format = Format::of_opcode(opcode)?;
    let rd = bits(word, 7..12) as u8;
    let funct3 = bits(word, 12..15) as u8;
    let rs1 = bits(word, 15..20) as u8;
    let rs2 = bits(word, 20..25) as u8;
    let mut f = Fields {
        opcode,
        ..Fields::default()
    };
    match format {
        Format::R => {
            f.rd = rd;
            f.funct3 = funct3;
            f.rs1 = rs1;
            f.rs2 = rs2;
            f.funct7 = bits(word, 25..32) as u8;
        }
        Format::I => {
            f.rd = rd;
            f.funct3 = funct3;
            f.rs1 = rs1;
            f.imm = sign_ext(bits(word, 20..32), 12);
        }
        Format::S => {
            f.funct3 = funct3;
            f.rs1 = rs1;
            f.rs2 = rs2;
            f.imm = sign_ext(bits(word, 25..32) << 5 | bits(word, 7..12), 12);
        }
        Format::B => {
            f.funct3 = funct3;
            f.rs1 = rs1;
            f.rs2 = rs2;
            f.imm = sign_ext(
                bits(word, 31..32) << 12
                    | bits(word, 7..8) << 11
                    | bits(word, 25..31) << 5
                    | bits(word, 8..12) << 1,
                13,
            );
        }
        Format::U => {
            f.rd = rd;
            f.imm = (word & 0xFFFF_F000) as i32;
        }
        Format::J => {
            f.rd = rd;
            f.imm = sign_ext(
                bits(word, 31..32) << 20
                    | bits(word, 12..20) << 12
                    | bits(word, 20..21) << 11
                    | bits(word, 21..31) << 1,
                21,
            );
        }
    }
    Some((format, f))
}
