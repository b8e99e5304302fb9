//! Data transfer handlers: NOP/LOAD/LOADB/LOADW/STORE/STOREB/STOREW/MOVE/LEA.

use super::Vm;
use crate::addressing::{effective_address, operand_value};
use crate::error::{AccessKind, InterpreterError};
use crate::instruction::Instruction;
use crate::opcodes::data_transfer::*;

pub(super) fn dispatch(vm: &mut Vm, instr: &Instruction) -> Result<(), InterpreterError> {
    match instr.opcode {
        NOP => Ok(()),

        LOAD => {
            let value = operand_value(instr, vm.registers(), vm.memory())?;
            vm.set_reg(instr.reg1 as usize, value);
            Ok(())
        }

        LOADB => {
            let addr = effective_address(instr, vm.registers(), vm.fault_pc())?;
            let value = vm.memory().read_byte(addr, AccessKind::Read)?;
            vm.set_reg(instr.reg1 as usize, value as u32);
            Ok(())
        }

        LOADW => {
            let addr = effective_address(instr, vm.registers(), vm.fault_pc())?;
            let value = vm.memory().read_word(addr, AccessKind::Read)?;
            vm.set_reg(instr.reg1 as usize, value as u32);
            Ok(())
        }

        STORE => {
            let addr = effective_address(instr, vm.registers(), vm.fault_pc())?;
            let value = vm.reg(instr.reg1 as usize);
            vm.memory_mut().write_dword(addr, value, AccessKind::Write)
        }

        STOREB => {
            let addr = effective_address(instr, vm.registers(), vm.fault_pc())?;
            let value = vm.reg(instr.reg1 as usize) as u8;
            vm.memory_mut().write_byte(addr, value, AccessKind::Write)
        }

        STOREW => {
            let addr = effective_address(instr, vm.registers(), vm.fault_pc())?;
            let value = vm.reg(instr.reg1 as usize) as u16;
            vm.memory_mut().write_word(addr, value, AccessKind::Write)
        }

        MOVE => {
            let value = operand_value(instr, vm.registers(), vm.memory())?;
            vm.set_reg(instr.reg1 as usize, value);
            Ok(())
        }

        LEA => {
            let addr = effective_address(instr, vm.registers(), vm.fault_pc())?;
            vm.set_reg(instr.reg1 as usize, addr);
            Ok(())
        }

        other => Err(InterpreterError::InvalidInstruction {
            pc: vm.fault_pc(),
            detail: format!("unassigned data-transfer opcode {other:#x}"),
        }),
    }
}
