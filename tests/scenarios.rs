//! End-to-end scenarios assembling short raw programs and stepping a `Vm`.

use vm32::consts::{SR_C, SR_N, SR_O, SR_Z};
use vm32::instruction::{AddressingMode, Instruction};
use vm32::loader::LoadedImage;
use vm32::prelude::*;

fn instr(opcode: u8, mode: AddressingMode, reg1: u8, reg2: u8, immediate: u16) -> Instruction {
    Instruction { opcode, mode, reg1, reg2, immediate }
}

fn load_program(words: &[Instruction]) -> Vm {
    let mut vm = Vm::with_default_config();
    let code_base = vm.memory().code_base();
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for w in words {
        bytes.extend_from_slice(&w.encode().to_le_bytes());
    }
    let image = LoadedImage {
        entry_point: code_base,
        code_base,
        code: bytes,
        data_base: vm.memory().data_base(),
        data: Vec::new(),
        symbols: Vec::new(),
    };
    vm.load(&image).unwrap();
    vm
}

#[test]
fn print_h_then_halt() {
    let mut vm = load_program(&[
        instr(0x01, AddressingMode::Imm, 0, 0, 0x48), // LOAD R0, #'H'
        instr(0x6C, AddressingMode::Imm, 0, 0, 0),    // SYSCALL 0 (print char)
        instr(0xA0, AddressingMode::Imm, 0, 0, 0),    // HALT
    ]);

    vm.run(None).unwrap();

    assert!(vm.halted());
    assert_eq!(vm.instruction_count(), 3);
    assert_eq!(vm.console_output(), b"H");
}

#[test]
fn sum_two_and_three() {
    let mut vm = load_program(&[
        instr(0x01, AddressingMode::Imm, 0, 0, 2), // LOAD R0, #2
        instr(0x20, AddressingMode::Imm, 0, 0, 3), // ADD R0, #3
        instr(0xA0, AddressingMode::Imm, 0, 0, 0), // HALT
    ]);

    vm.run(None).unwrap();

    assert_eq!(vm.reg(0), 5);
    assert!(!vm.flag(SR_Z));
    assert!(!vm.flag(SR_N));
    assert!(!vm.flag(SR_C));
    assert!(!vm.flag(SR_O));
}

#[test]
fn divide_by_zero_faults_without_clobbering_the_dividend() {
    let mut vm = load_program(&[
        instr(0x01, AddressingMode::Imm, 1, 0, 0), // LOAD R1, #0
        instr(0x23, AddressingMode::Reg, 0, 1, 0), // DIV R0, R1
    ]);
    vm.set_reg(0, 42);

    vm.step().unwrap(); // LOAD
    let fault_pc = vm.reg(vm32::consts::REG_PC);
    let err = vm.step().unwrap_err();

    assert_eq!(err.code(), ErrorCode::DivisionByZero);
    assert_eq!(vm.reg(0), 42);
    assert_eq!(vm.fault_pc(), fault_pc);
}

#[test]
fn repeated_push_past_stack_base_overflows_and_restores_sp() {
    let mut vm = load_program(&[
        instr(0x80, AddressingMode::Reg, 0, 0, 0), // PUSH R0
        instr(0x80, AddressingMode::Reg, 0, 0, 0), // PUSH R0
    ]);
    vm.set_reg(vm32::consts::REG_SP, vm.memory().stack_base() + 4);

    vm.step().unwrap(); // fits exactly at STACK_BASE
    assert_eq!(vm.reg(vm32::consts::REG_SP), vm.memory().stack_base());

    let sp_before = vm.reg(vm32::consts::REG_SP);
    let err = vm.step().unwrap_err();

    assert_eq!(err.code(), ErrorCode::StackOverflow);
    assert_eq!(vm.reg(vm32::consts::REG_SP), sp_before);
}

#[test]
fn alloc_store_free_then_use_after_free_segfaults() {
    let mut vm = load_program(&[
        instr(0xC0, AddressingMode::Imm, 1, 0, 16),        // ALLOC R1, #16
        instr(0x04, AddressingMode::RegIndirect, 0, 1, 0), // STORE R0, [R1]
        instr(0xC1, AddressingMode::Reg, 1, 0, 0),         // FREE R1
        instr(0x01, AddressingMode::RegIndirect, 2, 1, 0), // LOAD R2, [R1]
    ]);

    vm.step().unwrap();
    vm.step().unwrap();
    vm.step().unwrap();
    let err = vm.step().unwrap_err();

    assert_eq!(err.code(), ErrorCode::SegmentationFault);
}

#[test]
fn call_then_ret_restores_sp_and_lands_after_the_call() {
    let mut vm = Vm::with_default_config();
    let base = vm.memory().code_base();
    let initial_sp = vm.reg(vm32::consts::REG_SP);

    // At base: CALL base+8. At base+4: HALT. At base+8: RET.
    let words = [
        instr(0x69, AddressingMode::Imm, 0, 0, 0), // placeholder, immediate patched below
        instr(0xA0, AddressingMode::Imm, 0, 0, 0), // HALT
        instr(0x6A, AddressingMode::Imm, 0, 0, 0), // RET
    ];
    let call = Instruction { immediate: (base + 8) as u16, ..words[0] };
    let bytes: Vec<u8> = [call, words[1], words[2]].iter().flat_map(|w| w.encode().to_le_bytes()).collect();
    let image = LoadedImage {
        entry_point: base,
        code_base: base,
        code: bytes,
        data_base: vm.memory().data_base(),
        data: Vec::new(),
        symbols: Vec::new(),
    };
    vm.load(&image).unwrap();

    vm.step().unwrap(); // CALL
    vm.step().unwrap(); // RET
    vm.step().unwrap(); // HALT

    assert!(vm.halted());
    assert_eq!(vm.reg(vm32::consts::REG_SP), initial_sp);
    assert_eq!(vm.fault_pc(), base + 4);
}
