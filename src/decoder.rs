use serde::{Deserialize, Serialize};

use crate::instructions::Op;

/// A decoded instruction, independent of its bit layout.
///
/// `imm` is the value the executor consumes: sign-extended offsets, the
/// zero-extended immediate for `sltiu`, the shift amount for shifts, and the
/// whole upper value for `lui`/`auipc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Op,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: i32,
}

impl Decoded {
    /// An operand-less instruction (the sentinels).
    pub fn bare(op: Op) -> Self {
        Self {
            op,
            rd: 0,
            rs1: 0,
            rs2: 0,
            imm: 0,
        }
    }
}

pub trait Decoder {
    fn decode(&self, raw32: u32) -> Option<Decoded>;
}
