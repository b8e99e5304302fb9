//! System handlers: HALT/CLI/STI/INT/IRET/IN/OUT/CPUID/RESET/DEBUG.

use super::Vm;
use crate::consts::{REG_PC, REG_SR, SR_I, SR_T};
use crate::error::InterpreterError;
use crate::instruction::Instruction;
use crate::interrupt;
use crate::opcodes::system::*;

const CPUID_VENDOR: u32 = 0x5633_3256; // "V32V" — arbitrary but stable across resets.
const CPUID_VERSION: u32 = 0x0001_0000;
const CPUID_FEATURES: u32 = 0;

pub(super) fn dispatch(vm: &mut Vm, instr: &Instruction) -> Result<(), InterpreterError> {
    match instr.opcode {
        HALT => {
            vm.set_halted(true);
            Ok(())
        }

        CLI => {
            vm.set_flag(SR_I, false);
            Ok(())
        }

        STI => {
            vm.set_flag(SR_I, true);
            Ok(())
        }

        INT => deliver_interrupt(vm, instr.immediate as u32),

        IRET => {
            let sr = vm.stack_pop()?;
            let pc = vm.stack_pop()?;
            vm.set_sr(sr);
            vm.set_reg(REG_PC, pc);
            Ok(())
        }

        IN => {
            let port = instr.immediate as u16;
            let value = vm.io_mut().read(port)?;
            vm.set_reg(instr.reg1 as usize, value);
            Ok(())
        }

        OUT => {
            let port = instr.immediate as u16;
            let value = vm.reg(instr.reg1 as usize);
            vm.io_mut().write(port, value)
        }

        CPUID => {
            match vm.reg(crate::consts::REG_ACC) {
                0 => {
                    vm.set_reg(crate::consts::REG_ACC, CPUID_VENDOR);
                    vm.set_reg(5, CPUID_VERSION);
                    vm.set_reg(6, CPUID_FEATURES);
                    vm.set_reg(7, 0);
                }
                1 => {
                    let [code_base, data_base, stack_base, heap_base] =
                        vm.memory().segment_layout().map(|(base, _)| base);
                    vm.set_reg(crate::consts::REG_ACC, code_base);
                    vm.set_reg(5, data_base);
                    vm.set_reg(6, stack_base);
                    vm.set_reg(7, heap_base);
                }
                _ => {
                    vm.set_reg(crate::consts::REG_ACC, 0);
                    vm.set_reg(5, 0);
                    vm.set_reg(6, 0);
                    vm.set_reg(7, 0);
                }
            }
            Ok(())
        }

        RESET => {
            vm.reset();
            Ok(())
        }

        DEBUG => {
            vm.set_flag(SR_T, true);
            vm.set_debug(true);
            Ok(())
        }

        other => Err(InterpreterError::InvalidInstruction {
            pc: vm.fault_pc(),
            detail: format!("unassigned system opcode {other:#x}"),
        }),
    }
}

/// `INT vector` pushes PC then SR, clears I to mask nested delivery, and jumps to the resolved
/// handler. With `strict_interrupts` on, delivering while I is already clear raises
/// `NESTED_INTERRUPT` instead of proceeding.
fn deliver_interrupt(vm: &mut Vm, vector: u32) -> Result<(), InterpreterError> {
    if vm.config().strict_interrupts && !vm.flag(SR_I) {
        return Err(InterpreterError::NestedInterrupt);
    }

    let handler = interrupt::lookup_handler(vm.memory(), vm.config().vector_table_base, vector)?;

    let pc = vm.reg(REG_PC);
    let sr = vm.reg(REG_SR);
    vm.stack_push(pc)?;
    vm.stack_push(sr)?;
    vm.set_flag(SR_I, false);
    vm.set_reg(REG_PC, handler);
    Ok(())
}
