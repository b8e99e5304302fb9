//! Arithmetic handlers: ADD/SUB/MUL/DIV/MOD/INC/DEC/NEG/CMP/ADDC/SUBC.
//!
//! Two-operand forms read `a = R[reg1]` and `b` via the addressing-mode operand, then write the
//! result back into `reg1` (CMP is the exception: it updates flags only). Unary forms (INC/DEC/
//! NEG) consult only `a = R[reg1]` and ignore the second operand entirely.

use super::Vm;
use crate::addressing::operand_value;
use crate::alu;
use crate::consts::SR_C;
use crate::error::InterpreterError;
use crate::instruction::Instruction;
use crate::opcodes::arithmetic::*;

pub(super) fn dispatch(vm: &mut Vm, instr: &Instruction) -> Result<(), InterpreterError> {
    let reg1 = instr.reg1 as usize;
    let a = vm.reg(reg1);

    match instr.opcode {
        ADD => {
            let b = operand_value(instr, vm.registers(), vm.memory())?;
            let out = alu::add(a, b);
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        SUB => {
            let b = operand_value(instr, vm.registers(), vm.memory())?;
            let out = alu::sub(a, b);
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        MUL => {
            let b = operand_value(instr, vm.registers(), vm.memory())?;
            let out = alu::mul(a, b);
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        DIV => {
            let b = operand_value(instr, vm.registers(), vm.memory())?;
            let out = alu::div(a, b).ok_or(InterpreterError::DivisionByZero)?;
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        MOD => {
            let b = operand_value(instr, vm.registers(), vm.memory())?;
            let out = alu::rem(a, b).ok_or(InterpreterError::DivisionByZero)?;
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        INC => {
            let out = alu::inc(a);
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        DEC => {
            let out = alu::dec(a);
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        NEG => {
            let out = alu::neg(a);
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        CMP => {
            let b = operand_value(instr, vm.registers(), vm.memory())?;
            let out = alu::cmp(a, b);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        ADDC => {
            let b = operand_value(instr, vm.registers(), vm.memory())?;
            let carry_in = vm.flag(SR_C);
            let out = alu::addc(a, b, carry_in);
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        SUBC => {
            let b = operand_value(instr, vm.registers(), vm.memory())?;
            let carry_in = vm.flag(SR_C);
            let out = alu::subc(a, b, carry_in);
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        other => Err(InterpreterError::InvalidInstruction {
            pc: vm.fault_pc(),
            detail: format!("unassigned arithmetic opcode {other:#x}"),
        }),
    }
}
