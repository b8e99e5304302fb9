//! Control flow handlers: JMP family, CALL/RET, LOOP, SYSCALL.

use super::Vm;
use crate::addressing::resolve_primary;
use crate::consts::{REG_PC, SR_C, SR_N, SR_O, SR_Z};
use crate::error::InterpreterError;
use crate::instruction::Instruction;
use crate::opcodes::control_flow::*;
use crate::syscall;

/// Jump targets have no destination register competing for `reg1`, so REG mode reads it directly
/// rather than through `reg2` the way ordinary operands do.
fn jump_target(vm: &Vm, instr: &Instruction) -> Result<u32, InterpreterError> {
    resolve_primary(instr, vm.registers(), vm.memory())
}

pub(super) fn dispatch(vm: &mut Vm, instr: &Instruction) -> Result<(), InterpreterError> {
    match instr.opcode {
        JMP => {
            let target = jump_target(vm, instr)?;
            vm.set_reg(REG_PC, target);
            Ok(())
        }

        JZ => conditional_jump(vm, instr, vm.flag(SR_Z)),
        JNZ => conditional_jump(vm, instr, !vm.flag(SR_Z)),
        JN => conditional_jump(vm, instr, vm.flag(SR_N)),
        JP => conditional_jump(vm, instr, !vm.flag(SR_N) && !vm.flag(SR_Z)),
        JO => conditional_jump(vm, instr, vm.flag(SR_O)),
        JC => conditional_jump(vm, instr, vm.flag(SR_C)),
        JBE => conditional_jump(vm, instr, vm.flag(SR_C) || vm.flag(SR_Z)),
        JA => conditional_jump(vm, instr, !vm.flag(SR_C) && !vm.flag(SR_Z)),

        CALL => {
            let target = jump_target(vm, instr)?;
            let return_addr = vm.reg(REG_PC);
            vm.stack_push(return_addr)?;
            vm.set_reg(REG_PC, target);
            Ok(())
        }

        RET => {
            let return_addr = vm.stack_pop()?;
            vm.set_reg(REG_PC, return_addr);
            if instr.immediate > 0 {
                let sp = vm.reg(crate::consts::REG_SP);
                vm.set_reg(crate::consts::REG_SP, sp.wrapping_add(instr.immediate as u32));
            }
            Ok(())
        }

        LOOP => {
            let reg1 = instr.reg1 as usize;
            let count = vm.reg(reg1).wrapping_sub(1);
            vm.set_reg(reg1, count);
            if count != 0 {
                let target = jump_target(vm, instr)?;
                vm.set_reg(REG_PC, target);
            }
            Ok(())
        }

        SYSCALL => syscall::dispatch(vm, instr.immediate as u32),

        other => Err(InterpreterError::InvalidInstruction {
            pc: vm.fault_pc(),
            detail: format!("unassigned control-flow opcode {other:#x}"),
        }),
    }
}

fn conditional_jump(vm: &mut Vm, instr: &Instruction, take: bool) -> Result<(), InterpreterError> {
    if take {
        let target = jump_target(vm, instr)?;
        vm.set_reg(REG_PC, target);
    }
    Ok(())
}
