use crate::cpu::{Cpu, Trap};
use crate::decoder::Decoded;
use crate::instructions::Op;
use crate::memory::Bus;

pub trait Executor {
    /// Executes `d`, fetched from `pc`. On entry `cpu.pc` is already `pc + 4`.
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, pc: u32, d: Decoded) -> Result<(), Trap>;
}

/// Integer executor for the supported RV32I subset.
pub struct IntExecutor;

impl Executor for IntExecutor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, pc: u32, d: Decoded) -> Result<(), Trap> {
        let a = cpu.reg(d.rs1);
        let b = cpu.reg(d.rs2);
        match d.op {
            Op::Add => cpu.set_reg(d.rd, a.wrapping_add(b)),
            Op::Sub => cpu.set_reg(d.rd, a.wrapping_sub(b)),
            Op::Sll => cpu.set_reg(d.rd, ((a as u32) << (b as u32 & 0x1F)) as i32),
            Op::Slt => cpu.set_reg(d.rd, (a < b) as i32),
            Op::Sltu => cpu.set_reg(d.rd, ((a as u32) < (b as u32)) as i32),
            Op::Xor => cpu.set_reg(d.rd, a ^ b),
            Op::Srl => cpu.set_reg(d.rd, ((a as u32) >> (b as u32 & 0x1F)) as i32),
            Op::Or => cpu.set_reg(d.rd, a | b),
            Op::And => cpu.set_reg(d.rd, a & b),
            Op::Addi => cpu.set_reg(d.rd, a.wrapping_add(d.imm)),
            Op::Slti => cpu.set_reg(d.rd, (a < d.imm) as i32),
            // imm is already zero-extended to 12 bits
            Op::Sltiu => cpu.set_reg(d.rd, ((a as u32) < (d.imm as u32)) as i32),
            Op::Xori => cpu.set_reg(d.rd, a ^ d.imm),
            Op::Ori => cpu.set_reg(d.rd, a | d.imm),
            Op::Andi => cpu.set_reg(d.rd, a & d.imm),
            Op::Slli => cpu.set_reg(d.rd, ((a as u32) << (d.imm as u32 & 0x1F)) as i32),
            Op::Srli => cpu.set_reg(d.rd, ((a as u32) >> (d.imm as u32 & 0x1F)) as i32),
            Op::Lw => {
                let addr = a.wrapping_add(d.imm) as u32;
                let val = bus
                    .read_u32(addr)
                    .map_err(|source| Trap::Bus { addr, source })?;
                cpu.set_reg(d.rd, val as i32);
            }
            Op::Sw => {
                let addr = a.wrapping_add(d.imm) as u32;
                bus.write_u32(addr, b as u32)
                    .map_err(|source| Trap::Bus { addr, source })?;
            }
            Op::Jalr => {
                // Target first: rd may alias rs1.
                let target = (a.wrapping_add(d.imm) as u32) & !1;
                cpu.set_reg(d.rd, pc.wrapping_add(4) as i32);
                cpu.pc = target;
            }
            Op::Jal => {
                cpu.set_reg(d.rd, pc.wrapping_add(4) as i32);
                cpu.pc = pc.wrapping_add(d.imm as u32);
            }
            Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu | Op::Bgeu => {
                let taken = match d.op {
                    Op::Beq => a == b,
                    Op::Bne => a != b,
                    Op::Blt => a < b,
                    Op::Bge => a >= b,
                    Op::Bltu => (a as u32) < (b as u32),
                    _ => (a as u32) >= (b as u32),
                };
                if taken {
                    cpu.pc = pc.wrapping_add(d.imm as u32);
                }
            }
            Op::Lui => cpu.set_reg(d.rd, d.imm),
            Op::Auipc => cpu.set_reg(d.rd, pc.wrapping_add(d.imm as u32) as i32),
            Op::Rst => cpu.reset_registers(),
            Op::Halt => {
                cpu.pc = pc;
                return Err(Trap::Halt { pc });
            }
        }
        Ok(())
    }
}
