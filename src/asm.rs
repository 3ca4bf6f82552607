//! Two-pass assembler for the supported RV32I subset.
//!
//! Pass 1 walks the source once to give every label the byte address of the
//! instruction that follows it. Pass 2 encodes each instruction through the
//! shared codec, resolving label operands against that table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codec::{self, Fields, Format};
use crate::instructions::{self, parse_reg, AddrMode, HALT_WORD, RST_WORD};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmErrorKind {
    #[error("duplicate label `{0}`")]
    DuplicateLabel(String),
    #[error("undefined label `{0}`")]
    UndefinedLabel(String),
    #[error("unknown register `{0}`")]
    UnknownRegister(String),
    #[error("unknown instruction `{0}`")]
    UnknownInstruction(String),
    #[error("malformed operand: {0}")]
    MalformedOperand(String),
    #[error("immediate {value} out of range [{min}, {max}]")]
    ImmediateOutOfRange { value: i64, min: i64, max: i64 },
}

#[derive(thiserror::Error, Debug)]
pub enum AsmError {
    #[error("line {line}: {kind}: {text}")]
    Line {
        line: usize,
        text: String,
        kind: AsmErrorKind,
    },
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AsmError {
    pub fn kind(&self) -> Option<&AsmErrorKind> {
        match self {
            AsmError::Line { kind, .. } => Some(kind),
            AsmError::Io { .. } => None,
        }
    }

    /// 1-based source line of the failure.
    pub fn line(&self) -> Option<usize> {
        match self {
            AsmError::Line { line, .. } => Some(*line),
            AsmError::Io { .. } => None,
        }
    }
}

/// Label name to byte address. Built by pass 1, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    labels: HashMap<String, u32>,
}

impl SymbolTable {
    pub fn get(&self, name: &str) -> Option<u32> {
        self.labels.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.labels.iter().map(|(k, &v)| (k.as_str(), v))
    }

    fn define(&mut self, name: &str, addr: u32) -> Result<(), AsmErrorKind> {
        if self.labels.contains_key(name) {
            return Err(AsmErrorKind::DuplicateLabel(name.to_string()));
        }
        self.labels.insert(name.to_string(), addr);
        Ok(())
    }
}

/// One non-blank source line after comment stripping.
#[derive(Debug, Clone, Copy)]
struct SourceLine<'a> {
    number: usize,
    text: &'a str,
    label: Option<&'a str>,
    body: Option<&'a str>,
}

impl SourceLine<'_> {
    fn error(&self, kind: AsmErrorKind) -> AsmError {
        AsmError::Line {
            line: self.number,
            text: self.text.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler {
    append_halt: bool,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminate the output with a `halt` word unless it already ends in one.
    pub fn append_halt(mut self, yes: bool) -> Self {
        self.append_halt = yes;
        self
    }

    pub fn assemble(&self, source: &str) -> Result<Vec<u32>, AsmError> {
        let lines = split_lines(source)?;
        let symbols = collect_labels(&lines)?;

        let mut words = Vec::with_capacity(lines.len());
        for line in &lines {
            let Some(body) = line.body else { continue };
            let addr = (words.len() as u32).wrapping_mul(4);
            let word = encode_instruction(body, addr, &symbols).map_err(|kind| line.error(kind))?;
            words.push(word);
        }

        if self.append_halt && words.last() != Some(&HALT_WORD) {
            words.push(HALT_WORD);
        }
        Ok(words)
    }

    pub fn assemble_file(&self, path: &Path) -> Result<Vec<u32>, AsmError> {
        let source = std::fs::read_to_string(path).map_err(|source| AsmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.assemble(&source)
    }
}

/// Assembles `source` with default options.
pub fn assemble(source: &str) -> Result<Vec<u32>, AsmError> {
    Assembler::new().assemble(source)
}

fn split_lines(source: &str) -> Result<Vec<SourceLine<'_>>, AsmError> {
    let mut out = Vec::new();
    for (idx, raw) in source.lines().enumerate() {
        let code = raw.split('#').next().unwrap_or("").trim();
        if code.is_empty() {
            continue;
        }
        let mut line = SourceLine {
            number: idx + 1,
            text: raw.trim(),
            label: None,
            body: Some(code),
        };
        if let Some((label, rest)) = code.split_once(':') {
            let label = label.trim();
            if !is_label_name(label) {
                return Err(line.error(AsmErrorKind::MalformedOperand(format!(
                    "invalid label name `{label}`"
                ))));
            }
            let rest = rest.trim();
            line.label = Some(label);
            line.body = (!rest.is_empty()).then_some(rest);
        }
        out.push(line);
    }
    Ok(out)
}

fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn collect_labels(lines: &[SourceLine<'_>]) -> Result<SymbolTable, AsmError> {
    let mut symbols = SymbolTable::default();
    let mut addr = 0u32;
    for line in lines {
        if let Some(label) = line.label {
            symbols.define(label, addr).map_err(|kind| line.error(kind))?;
        }
        if line.body.is_some() {
            addr = addr.wrapping_add(4);
        }
    }
    debug!(
        count = symbols.len(),
        labels = ?symbols.iter().map(|(name, _)| name).collect::<Vec<_>>(),
        "collected labels"
    );
    Ok(symbols)
}

/// Encodes one instruction located at byte address `addr`.
pub fn encode_instruction(
    body: &str,
    addr: u32,
    symbols: &SymbolTable,
) -> Result<u32, AsmErrorKind> {
    let (mnemonic, rest) = match body.split_once(char::is_whitespace) {
        Some((m, r)) => (m, r.trim()),
        None => (body, ""),
    };
    let mnemonic = mnemonic.to_ascii_lowercase();
    let ops: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };

    match mnemonic.as_str() {
        "rst" => return expect_operands(&ops, 0, "").map(|_| RST_WORD),
        "halt" => return expect_operands(&ops, 0, "").map(|_| HALT_WORD),
        _ => {}
    }

    let desc = instructions::lookup(&mnemonic)
        .ok_or_else(|| AsmErrorKind::UnknownInstruction(mnemonic.clone()))?;
    let mut f = Fields {
        opcode: desc.opcode,
        funct3: desc.funct3,
        funct7: desc.funct7,
        ..Fields::default()
    };

    match desc.mode {
        AddrMode::Reg => {
            expect_operands(&ops, 3, "rd, rs1, rs2")?;
            f.rd = reg(ops[0])?;
            f.rs1 = reg(ops[1])?;
            f.rs2 = reg(ops[2])?;
        }
        AddrMode::RegImm => {
            expect_operands(&ops, 3, "rd, rs1, imm")?;
            f.rd = reg(ops[0])?;
            f.rs1 = reg(ops[1])?;
            f.imm = in_range(Format::I, int(ops[2])?)?;
        }
        AddrMode::Shamt => {
            expect_operands(&ops, 3, "rd, rs1, shamt")?;
            f.rd = reg(ops[0])?;
            f.rs1 = reg(ops[1])?;
            f.imm = (int(ops[2])? & 0x1F) as i32;
        }
        AddrMode::UnsignedImm => {
            expect_operands(&ops, 3, "rd, rs1, imm")?;
            f.rd = reg(ops[0])?;
            f.rs1 = reg(ops[1])?;
            f.imm = (int(ops[2])? & 0xFFF) as i32;
        }
        AddrMode::Load => {
            expect_operands(&ops, 2, "rd, offset(rs1)")?;
            f.rd = reg(ops[0])?;
            let (off, base) = mem_operand(ops[1], symbols)?;
            f.rs1 = base;
            f.imm = in_range(Format::I, off)?;
        }
        AddrMode::Jalr => match ops.len() {
            2 => {
                f.rd = reg(ops[0])?;
                let (off, base) = mem_operand(ops[1], symbols)?;
                f.rs1 = base;
                f.imm = in_range(Format::I, off)?;
            }
            3 => {
                f.rd = reg(ops[0])?;
                f.rs1 = reg(ops[1])?;
                f.imm = in_range(Format::I, int(ops[2])?)?;
            }
            n => return Err(operand_count("rd, rs1, imm", n)),
        },
        AddrMode::Store => {
            expect_operands(&ops, 2, "rs2, offset(rs1)")?;
            f.rs2 = reg(ops[0])?;
            let (off, base) = mem_operand(ops[1], symbols)?;
            f.rs1 = base;
            f.imm = in_range(Format::S, off)?;
        }
        AddrMode::PcRel => {
            expect_operands(&ops, 3, "rs1, rs2, target")?;
            f.rs1 = reg(ops[0])?;
            f.rs2 = reg(ops[1])?;
            f.imm = in_range(Format::B, relative(ops[2], addr, symbols)?)? & !1;
        }
        AddrMode::Upper => {
            expect_operands(&ops, 2, "rd, imm")?;
            f.rd = reg(ops[0])?;
            f.imm = in_range(Format::U, int(ops[1])?)?;
        }
        AddrMode::Jump => {
            expect_operands(&ops, 2, "rd, target")?;
            f.rd = reg(ops[0])?;
            f.imm = in_range(Format::J, relative(ops[1], addr, symbols)?)? & !1;
        }
    }

    Ok(codec::pack(desc.format, &f))
}

fn expect_operands(ops: &[&str], n: usize, shape: &str) -> Result<(), AsmErrorKind> {
    if ops.len() != n || ops.iter().any(|o| o.is_empty()) {
        return Err(operand_count(shape, ops.len()));
    }
    Ok(())
}

fn operand_count(shape: &str, got: usize) -> AsmErrorKind {
    if shape.is_empty() {
        return AsmErrorKind::MalformedOperand(format!("expected no operands, got {got}"));
    }
    AsmErrorKind::MalformedOperand(format!("expected `{shape}`, got {got} operand(s)"))
}

fn reg(name: &str) -> Result<u8, AsmErrorKind> {
    parse_reg(name).ok_or_else(|| AsmErrorKind::UnknownRegister(name.to_string()))
}

fn int(s: &str) -> Result<i64, AsmErrorKind> {
    parse_int(s).ok_or_else(|| AsmErrorKind::MalformedOperand(format!("expected integer, got `{s}`")))
}

/// Decimal or `0x` hexadecimal, optionally signed.
pub fn parse_int(s: &str) -> Option<i64> {
    let t = s.trim();
    let (neg, t) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let v = if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        i64::from_str_radix(hex, 16).ok()?
    } else if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) {
        t.parse::<i64>().ok()?
    } else {
        return None;
    };
    Some(if neg { -v } else { v })
}

fn in_range(format: Format, value: i64) -> Result<i32, AsmErrorKind> {
    if let Some((min, max)) = format.imm_range() {
        if value < min || value > max {
            return Err(AsmErrorKind::ImmediateOutOfRange { value, min, max });
        }
    }
    // U immediates may be spelled unsigned; keep the low 32 bits.
    Ok(value as u32 as i32)
}

/// A branch/jump target: literal byte offset or `label - addr`.
fn relative(target: &str, addr: u32, symbols: &SymbolTable) -> Result<i64, AsmErrorKind> {
    if let Some(v) = parse_int(target) {
        return Ok(v);
    }
    symbols
        .get(target)
        .map(|label| label as i64 - addr as i64)
        .ok_or_else(|| AsmErrorKind::UndefinedLabel(target.to_string()))
}

/// `offset(reg)`, where offset is an integer, a label address, or empty.
fn mem_operand(s: &str, symbols: &SymbolTable) -> Result<(i64, u8), AsmErrorKind> {
    let malformed = || AsmErrorKind::MalformedOperand(format!("expected `offset(reg)`, got `{s}`"));
    let (off, rest) = s.split_once('(').ok_or_else(malformed)?;
    let base = rest.strip_suffix(')').ok_or_else(malformed)?.trim();
    let off = off.trim();
    let off = if off.is_empty() {
        0
    } else if let Some(v) = parse_int(off) {
        v
    } else {
        symbols
            .get(off)
            .map(i64::from)
            .ok_or_else(|| AsmErrorKind::UndefinedLabel(off.to_string()))?
    };
    Ok((off, reg(base)?))
}
