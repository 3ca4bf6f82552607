use pretty_assertions::assert_eq;

use rv32i_rs::asm::{encode_instruction, SymbolTable};
use rv32i_rs::{assemble, AsmErrorKind, Assembler};

fn one(src: &str) -> u32 {
    let words = assemble(src).unwrap();
    assert_eq!(words.len(), 1, "{src}");
    words[0]
}

fn kind(src: &str) -> AsmErrorKind {
    assemble(src).unwrap_err().kind().cloned().unwrap()
}

#[test]
fn example_program_words() {
    let src = "\
main:
    addi x1, x0, 5
    addi x2, x0, 3
    add  x3, x1, x2
    sw   x3, 0(x0)
    halt
";
    let words = assemble(src).unwrap();
    assert_eq!(
        words,
        vec![
            0b000000000101_00000_000_00001_0010011,
            0b000000000011_00000_000_00010_0010011,
            0b0000000_00010_00001_000_00011_0110011,
            0b0000000_00011_00000_010_00000_0100011,
            0x0000_0063,
        ]
    );
}

#[test]
fn i_immediate_sign_extension() {
    assert_eq!(one("addi x1, x0, -1") >> 20, 0b111111111111);
    assert_eq!(one("addi x1, x0, 2047") >> 20, 0b011111111111);
    assert_eq!(one("addi x1, x0, -2048") >> 20, 0b100000000000);
    assert_eq!(
        kind("addi x1, x0, 2048"),
        AsmErrorKind::ImmediateOutOfRange {
            value: 2048,
            min: -2048,
            max: 2047
        }
    );
}

#[test]
fn backward_branch_to_label() {
    let src = "\
loop:
    addi t0, t0, 1
    addi t1, t1, -1
    beq  t0, t1, loop
";
    let words = assemble(src).unwrap();
    // beq t0, t1, -8
    assert_eq!(words[2], 0b1_111111_00110_00101_000_1100_1_1100011);

    let d = rv32i_rs::codec::unpack(words[2]).unwrap().1;
    assert_eq!(d.imm, -8);
    assert_eq!(d.imm & 1, 0);
}

#[test]
fn forward_jump_and_memory_label() {
    let src = "\
    jal ra, done
    lw a0, data(zero)
data:
    addi x0, x0, 0
done:
    halt
";
    let words = assemble(src).unwrap();
    // jal ra, +12
    assert_eq!(words[0], 0b0_0000000110_0_00000000_00001_1101111);
    // lw a0, 8(zero)
    assert_eq!(words[1], 0b000000001000_00000_010_01010_0000011);
}

#[test]
fn shifts_and_sltiu_mask_their_immediates() {
    // slli x1, x1, 33 keeps the low 5 bits
    assert_eq!(one("slli x1, x1, 33"), 0b0000000_00001_00001_001_00001_0010011);
    assert_eq!(one("srli x1, x1, 31"), 0b0000000_11111_00001_101_00001_0010011);
    assert_eq!(one("sltiu x1, x2, -1"), 0b111111111111_00010_011_00001_0010011);
}

#[test]
fn upper_and_jalr_forms() {
    assert_eq!(one("lui x1, 0x12345000"), 0x1234_50B7);
    assert_eq!(one("lui x1, -4096"), 0xFFFF_F0B7);
    assert_eq!(one("auipc x5, 0x1000"), 0x0000_1297);
    assert_eq!(one("jalr ra, 4(t0)"), one("jalr ra, t0, 4"));
    assert_eq!(one("jalr x0, 0(x1)"), 0x0000_8067);
}

#[test]
fn mnemonics_are_case_insensitive() {
    assert_eq!(one("ADD x3, x1, x2"), one("add x3, x1, x2"));
    assert_eq!(kind("add X3, x1, x2"), AsmErrorKind::UnknownRegister("X3".into()));
}

#[test]
fn abi_aliases_match_numbers() {
    assert_eq!(one("add fp, sp, ra"), one("add x8, x2, x1"));
    assert_eq!(one("add s0, a7, t6"), one("add x8, x17, x31"));
    assert_eq!(one("add s11, t3, gp"), one("add x27, x28, x3"));
}

#[test]
fn sentinels() {
    assert_eq!(one("rst"), 0);
    assert_eq!(one("halt"), 0x63);
    assert_eq!(one("beq zero, zero, 0"), 0x63);
    assert!(matches!(kind("halt x1"), AsmErrorKind::MalformedOperand(_)));
}

#[test]
fn errors_carry_line_numbers() {
    let src = "addi x1, x0, 1\n# comment\nfoo x1, x2, x3\n";
    let err = assemble(src).unwrap_err();
    assert_eq!(err.line(), Some(3));
    assert_eq!(err.kind(), Some(&AsmErrorKind::UnknownInstruction("foo".into())));
    assert_eq!(err.to_string(), "line 3: unknown instruction `foo`: foo x1, x2, x3");

    let err = assemble("a:\naddi x1, x0, 1\na: halt\n").unwrap_err();
    assert_eq!(err.line(), Some(3));
    assert_eq!(err.kind(), Some(&AsmErrorKind::DuplicateLabel("a".into())));

    assert_eq!(kind("jal x0, nowhere"), AsmErrorKind::UndefinedLabel("nowhere".into()));
    assert_eq!(kind("add x1, x2, x99"), AsmErrorKind::UnknownRegister("x99".into()));
    assert!(matches!(kind("add x1, x2"), AsmErrorKind::MalformedOperand(_)));
    assert!(matches!(kind("lw x1, 4[x2]"), AsmErrorKind::MalformedOperand(_)));
    assert!(matches!(kind("addi x1, x0, 0x-5"), AsmErrorKind::MalformedOperand(_)));
    assert!(matches!(kind("addi x1, x0, -0x-5"), AsmErrorKind::MalformedOperand(_)));
}

#[test]
fn labels_are_case_sensitive_and_must_exist() {
    let err = assemble("Loop:\n    beq x1, x2, loop\n").unwrap_err();
    assert_eq!(err.line(), Some(2));
    assert_eq!(err.kind(), Some(&AsmErrorKind::UndefinedLabel("loop".into())));
    assert_eq!(one("Loop:\n    beq x1, x2, Loop\n"), 0x0020_8063);

    assert_eq!(kind("lw a0, nowhere(zero)"), AsmErrorKind::UndefinedLabel("nowhere".into()));
    assert_eq!(kind("sw a0, nowhere(sp)"), AsmErrorKind::UndefinedLabel("nowhere".into()));
}

#[test]
fn branch_and_jump_ranges() {
    assert!(matches!(
        kind("bne x1, x2, 4096"),
        AsmErrorKind::ImmediateOutOfRange { min: -4096, max: 4095, .. }
    ));
    assert!(assemble("bne x1, x2, -4096").is_ok());
    assert!(matches!(
        kind("jal x1, 1048576"),
        AsmErrorKind::ImmediateOutOfRange { min: -1048576, max: 1048575, .. }
    ));
    assert!(matches!(
        kind("sw x1, 2048(x2)"),
        AsmErrorKind::ImmediateOutOfRange { min: -2048, max: 2047, .. }
    ));
}

#[test]
fn first_bad_line_aborts_the_run() {
    let symbols = SymbolTable::default();
    assert!(encode_instruction("bogus x1", 4, &symbols).is_err());
    let err = assemble("addi x1, x0, 1\nbogus x1\nend: jal x0, end\n").unwrap_err();
    assert_eq!(err.line(), Some(2));
}

#[test]
fn append_halt_option() {
    let asm = Assembler::new().append_halt(true);
    assert_eq!(asm.assemble("addi x1, x0, 1").unwrap(), vec![0x0010_0093, 0x63]);
    assert_eq!(asm.assemble("halt").unwrap(), vec![0x63]);
    assert_eq!(assemble("addi x1, x0, 1").unwrap(), vec![0x0010_0093]);
}
