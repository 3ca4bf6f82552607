use rv32i_rs::asm::{encode_instruction, SymbolTable};
use rv32i_rs::decoder::{Decoded, Decoder};
use rv32i_rs::disasm::fmt_decoded;
use rv32i_rs::instructions::{AddrMode, Op, TABLE};
use rv32i_rs::isa::rv32i::Rv32iDecoder;

/// Assembler text for `mnemonic` with the given operands.
fn source(mnemonic: &str, mode: AddrMode, rd: u8, rs1: u8, rs2: u8, imm: i64) -> String {
    match mode {
        AddrMode::Reg => format!("{mnemonic} x{rd}, x{rs1}, x{rs2}"),
        AddrMode::RegImm | AddrMode::Shamt | AddrMode::UnsignedImm => {
            format!("{mnemonic} x{rd}, x{rs1}, {imm}")
        }
        AddrMode::Load | AddrMode::Jalr => format!("{mnemonic} x{rd}, {imm}(x{rs1})"),
        AddrMode::Store => format!("{mnemonic} x{rs2}, {imm}(x{rs1})"),
        AddrMode::PcRel => format!("{mnemonic} x{rs1}, x{rs2}, {imm}"),
        AddrMode::Upper => format!("{mnemonic} x{rd}, {imm}"),
        AddrMode::Jump => format!("{mnemonic} x{rd}, {imm}"),
    }
}

/// Immediates to try for each addressing mode, boundaries included.
fn immediates(mode: AddrMode) -> Vec<i64> {
    match mode {
        AddrMode::Reg => vec![0],
        AddrMode::RegImm | AddrMode::Load | AddrMode::Jalr | AddrMode::Store => {
            vec![-2048, -1, 0, 1, 2047]
        }
        AddrMode::Shamt => vec![0, 1, 31],
        AddrMode::UnsignedImm => vec![0, 1, 2047, 4095],
        AddrMode::PcRel => vec![-4096, -8, 2, 4094],
        AddrMode::Upper => vec![-0x8000_0000, -4096, 0, 0x1000, 0x7FFF_F000],
        AddrMode::Jump => vec![-1048576, -4, 0, 2048, 1048574],
    }
}

fn expected(op: Op, mode: AddrMode, rd: u8, rs1: u8, rs2: u8, imm: i64) -> Decoded {
    let mut d = Decoded::bare(op);
    match mode {
        AddrMode::Reg => (d.rd, d.rs1, d.rs2) = (rd, rs1, rs2),
        AddrMode::RegImm
        | AddrMode::Shamt
        | AddrMode::UnsignedImm
        | AddrMode::Load
        | AddrMode::Jalr => (d.rd, d.rs1) = (rd, rs1),
        AddrMode::Store | AddrMode::PcRel => (d.rs1, d.rs2) = (rs1, rs2),
        AddrMode::Upper | AddrMode::Jump => d.rd = rd,
    }
    if mode != AddrMode::Reg {
        d.imm = imm as i32;
    }
    d
}

#[test]
fn every_instruction_decodes_to_what_was_assembled() {
    let dec = Rv32iDecoder::new();
    let symbols = SymbolTable::default();
    let mut checked = 0;

    for desc in TABLE {
        for r in 0u8..32 {
            let (rd, rs1, rs2) = (r, (r + 7) % 32, (r + 13) % 32);
            for imm in immediates(desc.mode) {
                let text = source(desc.mnemonic, desc.mode, rd, rs1, rs2, imm);
                let word = encode_instruction(&text, 0, &symbols)
                    .unwrap_or_else(|e| panic!("{text}: {e}"));
                let want = expected(desc.op, desc.mode, rd, rs1, rs2, imm);
                let got = dec.decode(word).unwrap_or_else(|| panic!("{text}: {word:#034b}"));
                assert_eq!(got, want, "{text}");
                checked += 1;
            }
        }
    }
    assert!(checked > 1000);
}

#[test]
fn disassembly_reassembles_to_the_same_word() {
    let dec = Rv32iDecoder::new();
    let symbols = SymbolTable::default();
    let words = [
        0x0050_0093u32, // addi x1, x0, 5
        0x0020_81B3,    // add x3, x1, x2
        0x4020_81B3,    // sub x3, x1, x2
        0x0030_2023,    // sw x3, 0(x0)
        0xFFF1_3093,    // sltiu x1, x2, 4095
        0x1234_50B7,    // lui x1, 0x12345000
        0xFE62_8CE3,    // beq x5, x6, -8
        0x0000_8067,    // jalr x0, 0(x1)
        0x0000_0063,    // halt
        0x0000_0000,    // rst
    ];
    for w in words {
        let text = fmt_decoded(&dec.decode(w).unwrap());
        assert_eq!(encode_instruction(&text, 0, &symbols).unwrap(), w, "{text}");
    }
}
