use crate::codec;
use crate::decoder::{Decoded, Decoder};
use crate::instructions::{self, AddrMode, Op, HALT_WORD, RST_WORD};

/// Decoder for the supported RV32I subset plus the `rst`/`halt` sentinels.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rv32iDecoder;

impl Rv32iDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for Rv32iDecoder {
    fn decode(&self, raw32: u32) -> Option<Decoded> {
        // Sentinels win over the table: HALT_WORD is also a valid beq.
        match raw32 {
            HALT_WORD => return Some(Decoded::bare(Op::Halt)),
            RST_WORD => return Some(Decoded::bare(Op::Rst)),
            _ => {}
        }

        let (format, f) = codec::unpack(raw32)?;
        let desc = instructions::find_by_fields(format, &f)?;
        let imm = match desc.mode {
            // Upper 7 bits of a shift immediate must be zero (no srai here).
            AddrMode::Shamt if f.imm & !0x1F != 0 => return None,
            AddrMode::UnsignedImm => f.imm & 0xFFF,
            _ => f.imm,
        };
        Some(Decoded {
            op: desc.op,
            rd: f.rd,
            rs1: f.rs1,
            rs2: f.rs2,
            imm,
        })
    }
}
