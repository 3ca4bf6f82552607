use crate::decoder::Decoded;
use crate::instructions::{describe, AddrMode, Op};

/// Renders `d` in assembler syntax, with pc-relative targets as byte offsets.
pub fn fmt_decoded(d: &Decoded) -> String {
    fmt_decoded_labeled(d, None)
}

/// Like [`fmt_decoded`], but prints `target` in place of the branch/jump offset.
pub fn fmt_decoded_labeled(d: &Decoded, target: Option<&str>) -> String {
    let Some(desc) = describe(d.op) else {
        return d.op.mnemonic().to_string();
    };
    let mn = desc.mnemonic;
    let off = || target.map_or_else(|| d.imm.to_string(), str::to_string);
    match desc.mode {
        AddrMode::Reg => format!("{mn} x{}, x{}, x{}", d.rd, d.rs1, d.rs2),
        AddrMode::RegImm | AddrMode::Shamt | AddrMode::UnsignedImm => {
            format!("{mn} x{}, x{}, {}", d.rd, d.rs1, d.imm)
        }
        AddrMode::Load | AddrMode::Jalr => format!("{mn} x{}, {}(x{})", d.rd, d.imm, d.rs1),
        AddrMode::Store => format!("{mn} x{}, {}(x{})", d.rs2, d.imm, d.rs1),
        AddrMode::PcRel => format!("{mn} x{}, x{}, {}", d.rs1, d.rs2, off()),
        AddrMode::Upper => format!("{mn} x{}, {:#x}", d.rd, d.imm as u32),
        AddrMode::Jump => format!("{mn} x{}, {}", d.rd, off()),
    }
}

/// Whether `op` transfers control to `pc + imm`.
pub fn is_pc_relative(op: Op) -> bool {
    matches!(
        op,
        Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu | Op::Bgeu | Op::Jal
    )
}
