//! Interrupt delivery/return and stack-frame opcode behavior.

use vm32::consts::{REG_PC, REG_SP, SR_I};
use vm32::error::AccessKind;
use vm32::instruction::{AddressingMode, Instruction};
use vm32::loader::LoadedImage;
use vm32::prelude::*;

fn instr(opcode: u8, mode: AddressingMode, reg1: u8, reg2: u8, immediate: u16) -> Instruction {
    Instruction { opcode, mode, reg1, reg2, immediate }
}

fn load_program(words: &[Instruction]) -> Vm {
    let mut vm = Vm::with_default_config();
    let code_base = vm.memory().code_base();
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.encode().to_le_bytes()).collect();
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
fn int_jumps_to_the_installed_handler_and_iret_returns() {
    let mut vm = load_program(&[
        instr(0xA3, AddressingMode::Imm, 0, 0, 2), // INT 2
        instr(0xA0, AddressingMode::Imm, 0, 0, 0), // HALT (return site)
    ]);
    let handler_addr = vm.memory().code_base() + 64;
    vm.memory_mut()
        .write_dword(vm.vector_table_base() + 2 * 4, handler_addr, AccessKind::Write)
        .unwrap();
    // Handler: IRET, placed at handler_addr.
    let iret = instr(0xA4, AddressingMode::Imm, 0, 0, 0);
    for (i, byte) in iret.encode().to_le_bytes().iter().enumerate() {
        vm.memory_mut().load_bytes(handler_addr + i as u32, *byte).unwrap();
    }

    let sr_before = vm.sr();
    vm.step().unwrap(); // INT
    assert_eq!(vm.reg(REG_PC), handler_addr);
    assert!(!vm.flag(SR_I));

    vm.step().unwrap(); // IRET
    assert_eq!(vm.reg(REG_PC), vm.memory().code_base() + 4);
    assert_eq!(vm.sr() & SR_I, sr_before & SR_I);
}

#[test]
fn unset_vector_raises_unhandled_interrupt() {
    let mut vm = load_program(&[instr(0xA3, AddressingMode::Imm, 0, 0, 9)]);
    let err = vm.step().unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnhandledInterrupt);
}

#[test]
fn pusha_then_popa_round_trips_general_registers() {
    let mut vm = load_program(&[
        instr(0x84, AddressingMode::Imm, 0, 0, 0), // PUSHA
        instr(0x85, AddressingMode::Imm, 0, 0, 0), // POPA
    ]);
    for r in 5..=14 {
        vm.set_reg(r, r as u32 * 11);
    }
    let sp_before = vm.reg(REG_SP);
    let snapshot: Vec<u32> = (0..16).map(|r| vm.reg(r)).collect();

    vm.step().unwrap(); // PUSHA
    assert_eq!(vm.reg(REG_SP), sp_before - 16 * 4);

    vm.step().unwrap(); // POPA
    assert_eq!(vm.reg(REG_SP), sp_before);
    for r in 5..=14 {
        assert_eq!(vm.reg(r), snapshot[r]);
    }
}

#[test]
fn enter_then_leave_restores_the_frame() {
    let mut vm = load_program(&[
        instr(0x86, AddressingMode::Imm, 0, 0, 16), // ENTER #16
        instr(0x87, AddressingMode::Imm, 0, 0, 0),  // LEAVE
    ]);
    let sp_before = vm.reg(REG_SP);
    let bp_before = vm.reg(vm32::consts::REG_BP);

    vm.step().unwrap(); // ENTER
    assert_eq!(vm.reg(vm32::consts::REG_BP), sp_before - 4);
    assert_eq!(vm.reg(REG_SP), sp_before - 4 - 16);

    vm.step().unwrap(); // LEAVE
    assert_eq!(vm.reg(REG_SP), sp_before);
    assert_eq!(vm.reg(vm32::consts::REG_BP), bp_before);
}
