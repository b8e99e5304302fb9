//! Stack/frame handlers: PUSH/POP/PUSHF/POPF/PUSHA/POPA/ENTER/LEAVE.

use super::Vm;
use crate::addressing::resolve_primary;
use crate::consts::{REG_BP, REG_SP, REGISTER_COUNT};
use crate::error::InterpreterError;
use crate::instruction::Instruction;
use crate::opcodes::stack_frame::*;

pub(super) fn dispatch(vm: &mut Vm, instr: &Instruction) -> Result<(), InterpreterError> {
    match instr.opcode {
        PUSH => {
            let value = resolve_primary(instr, vm.registers(), vm.memory())?;
            vm.stack_push(value)
        }

        POP => {
            let value = vm.stack_pop()?;
            vm.set_reg(instr.reg1 as usize, value);
            Ok(())
        }

        PUSHF => vm.stack_push(vm.sr()),

        POPF => {
            let value = vm.stack_pop()?;
            vm.set_sr(value);
            Ok(())
        }

        PUSHA => pusha(vm),
        POPA => popa(vm),
        ENTER => enter(vm, instr),
        LEAVE => leave(vm),

        other => Err(InterpreterError::InvalidInstruction {
            pc: vm.fault_pc(),
            detail: format!("unassigned stack-frame opcode {other:#x}"),
        }),
    }
}

/// Pushes R0..R15 in ascending order, substituting the pre-sequence SP for the SP slot itself —
/// the live SP has already moved by the time that slot is reached.
fn pusha(vm: &mut Vm) -> Result<(), InterpreterError> {
    let original_sp = vm.reg(REG_SP);
    for i in 0..REGISTER_COUNT {
        let value = if i == REG_SP { original_sp } else { vm.reg(i) };
        vm.stack_push(value)?;
    }
    Ok(())
}

/// Reverses `pusha`: pops R15..R0 in descending order, discarding the value destined for the SP
/// slot rather than overwriting the stack pointer mid-restore.
fn popa(vm: &mut Vm) -> Result<(), InterpreterError> {
    for i in (0..REGISTER_COUNT).rev() {
        let value = vm.stack_pop()?;
        if i != REG_SP {
            vm.set_reg(i, value);
        }
    }
    Ok(())
}

fn enter(vm: &mut Vm, instr: &Instruction) -> Result<(), InterpreterError> {
    let saved_sp = vm.reg(REG_SP);
    let saved_bp = vm.reg(REG_BP);

    let attempt = (|| -> Result<(), InterpreterError> {
        vm.stack_push(saved_bp)?;
        vm.set_reg(REG_BP, vm.reg(REG_SP));
        let locals_size = instr.immediate as u32;
        let new_sp = vm.reg(REG_SP).wrapping_sub(locals_size);
        if new_sp < vm.memory().stack_base() || new_sp > vm.reg(REG_SP) {
            return Err(InterpreterError::StackOverflow);
        }
        vm.set_reg(REG_SP, new_sp);
        Ok(())
    })();

    if attempt.is_err() {
        vm.set_reg(REG_SP, saved_sp);
        vm.set_reg(REG_BP, saved_bp);
    }
    attempt
}

fn leave(vm: &mut Vm) -> Result<(), InterpreterError> {
    vm.set_reg(REG_SP, vm.reg(REG_BP));
    let bp = vm.stack_pop()?;
    vm.set_reg(REG_BP, bp);
    Ok(())
}
