//! Logical/shift/rotate handlers: AND/OR/XOR/NOT/SHL/SHR/SAR/ROL/ROR/TEST.

use super::Vm;
use crate::addressing::operand_value;
use crate::alu;
use crate::error::InterpreterError;
use crate::instruction::Instruction;
use crate::opcodes::logical::*;

pub(super) fn dispatch(vm: &mut Vm, instr: &Instruction) -> Result<(), InterpreterError> {
    let reg1 = instr.reg1 as usize;
    let a = vm.reg(reg1);

    macro_rules! binary_op {
        ($f:path) => {{
            let b = operand_value(instr, vm.registers(), vm.memory())?;
            let out = $f(a, b);
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }};
    }

    match instr.opcode {
        AND => binary_op!(alu::and),
        OR => binary_op!(alu::or),
        XOR => binary_op!(alu::xor),

        NOT => {
            let out = alu::not(a);
            vm.set_reg(reg1, out.result);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        SHL => binary_op!(alu::shl),
        SHR => binary_op!(alu::shr),
        SAR => binary_op!(alu::sar),
        ROL => binary_op!(alu::rol),
        ROR => binary_op!(alu::ror),

        TEST => {
            let b = operand_value(instr, vm.registers(), vm.memory())?;
            let out = alu::test(a, b);
            vm.apply_alu_flags(&out);
            Ok(())
        }

        other => Err(InterpreterError::InvalidInstruction {
            pc: vm.fault_pc(),
            detail: format!("unassigned logical opcode {other:#x}"),
        }),
    }
}
