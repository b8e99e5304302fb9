//! Memory control handlers: ALLOC/FREE/MEMCPY/MEMSET/PROTECT.

use super::Vm;
use crate::addressing::operand_value;
use crate::error::InterpreterError;
use crate::instruction::Instruction;
use crate::opcodes::memory_control::*;

pub(super) fn dispatch(vm: &mut Vm, instr: &Instruction) -> Result<(), InterpreterError> {
    let reg1 = instr.reg1 as usize;

    match instr.opcode {
        ALLOC => {
            let size = operand_value(instr, vm.registers(), vm.memory())?;
            let ptr = vm.memory_mut().allocate(size)?;
            vm.set_reg(reg1, ptr);
            Ok(())
        }

        FREE => vm.memory_mut().free(vm.reg(reg1)),

        MEMCPY => {
            let dst = vm.reg(reg1);
            let src = vm.reg(instr.reg2 as usize);
            vm.memory_mut().mem_copy(dst, src, instr.immediate as u32)
        }

        MEMSET => {
            let dst = vm.reg(reg1);
            let value = vm.reg(instr.reg2 as usize) as u8;
            vm.memory_mut().mem_set(dst, value, instr.immediate as u32)
        }

        PROTECT => {
            let ptr = vm.reg(reg1);
            vm.memory_mut().protect(ptr, instr.immediate as u8)
        }

        other => Err(InterpreterError::InvalidInstruction {
            pc: vm.fault_pc(),
            detail: format!("unassigned memory-control opcode {other:#x}"),
        }),
    }
}
