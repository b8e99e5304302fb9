//! Property tests over the decoder and the ALU's flag discipline.

use quickcheck_macros::quickcheck;
use vm32::instruction::{AddressingMode, Instruction};

fn mode_from_tag(tag: u8) -> AddressingMode {
    AddressingMode::from_nibble(tag % 7).unwrap()
}

#[quickcheck]
fn decode_encode_round_trip(mode_tag: u8, reg1: u8, reg2: u8, immediate: u16, opcode: u8) -> bool {
    let mode = mode_from_tag(mode_tag);
    let reg1 = reg1 & 0xF;
    let reg2 = reg2 & 0xF;
    let immediate = if mode.widens_immediate() { immediate } else { immediate & 0x0FFF };

    let instr = Instruction { opcode, mode, reg1, reg2, immediate };
    let decoded = Instruction::decode(instr.encode(), 0).unwrap();

    decoded.opcode == instr.opcode
        && decoded.mode == instr.mode
        && decoded.reg1 == instr.reg1
        && decoded.immediate == instr.immediate
}

#[quickcheck]
fn little_endian_dword_round_trip(value: u32) -> bool {
    let mut mem = vm32::memory::Memory::default_layout();
    let addr = mem.data_base();
    mem.write_dword(addr, value, vm32::error::AccessKind::Write).unwrap();
    mem.read_dword(addr, vm32::error::AccessKind::Read).unwrap() == value
}

#[quickcheck]
fn add_is_commutative(a: u32, b: u32) -> bool {
    vm32::alu::add(a, b).result == vm32::alu::add(b, a).result
}

#[quickcheck]
fn zero_flag_matches_result(a: u32, b: u32) -> bool {
    let out = vm32::alu::add(a, b);
    (out.flags & vm32::consts::SR_Z != 0) == (out.result == 0)
}

#[quickcheck]
fn negative_flag_matches_sign_bit(a: u32, b: u32) -> bool {
    let out = vm32::alu::sub(a, b);
    (out.flags & vm32::consts::SR_N != 0) == (out.result & 0x8000_0000 != 0)
}
