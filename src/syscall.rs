//! Syscall table, entered via the SYSCALL opcode with the syscall number in the immediate field.
//! Arguments travel in R0/R5/R6/R7; the return value replaces R0; R5 carries a secondary error
//! indicator (0 = success). Numbers are grouped by range: 0-9 console, 10-19 file, 20-29 memory,
//! 30-39 process, 40-49 RNG.

use crate::interpreter::Vm;
use crate::consts::REG_ACC;
use crate::error::{AccessKind, InterpreterError};

const R5: usize = 5;
const R6: usize = 6;

pub(crate) fn dispatch(vm: &mut Vm, number: u32) -> Result<(), InterpreterError> {
    match number {
        0 => print_char(vm),
        1 => print_decimal(vm),
        2 => print_c_string(vm),
        3 => read_char(vm),
        4 => read_line(vm),
        5 => print_hex(vm),
        6 => print_based(vm),
        7 => print_fixed_point(vm),
        8 => clear_screen(vm),
        9 => set_colors(vm),

        10..=19 => {
            vm.set_reg(REG_ACC, 0);
            vm.set_reg(R5, 0);
            Ok(())
        }

        20 => allocate(vm),
        21 => free(vm),
        22 => copy(vm),
        23 => memory_info(vm),

        30 => exit(vm),
        31 => sleep(vm),
        32 => millis(vm),
        33 => instruction_count(vm),

        40 => uniform(vm),
        41 => seed(vm),

        other => Err(InterpreterError::InvalidSyscall { number: other }),
    }
}

fn ok(vm: &mut Vm, result: u32) -> Result<(), InterpreterError> {
    vm.set_reg(REG_ACC, result);
    vm.set_reg(R5, 0);
    Ok(())
}

/* Console I/O */

fn print_char(vm: &mut Vm) -> Result<(), InterpreterError> {
    let byte = vm.reg(REG_ACC) as u8;
    vm.console_mut().push(byte);
    ok(vm, byte as u32)
}

fn print_decimal(vm: &mut Vm) -> Result<(), InterpreterError> {
    let value = vm.reg(REG_ACC) as i32;
    vm.console_mut().extend(value.to_string().bytes());
    ok(vm, vm.reg(REG_ACC))
}

fn print_c_string(vm: &mut Vm) -> Result<(), InterpreterError> {
    let mut addr = vm.reg(REG_ACC);
    let mut len = 0u32;
    loop {
        let byte = vm.memory().read_byte(addr, AccessKind::Read)?;
        if byte == 0 {
            break;
        }
        vm.console_mut().push(byte);
        addr = addr.wrapping_add(1);
        len += 1;
    }
    ok(vm, len)
}

fn read_char(vm: &mut Vm) -> Result<(), InterpreterError> {
    match vm.input_mut().pop_front() {
        Some(byte) => ok(vm, byte as u32),
        None => {
            vm.set_reg(REG_ACC, u32::MAX);
            vm.set_reg(R5, 1);
            Ok(())
        }
    }
}

fn read_line(vm: &mut Vm) -> Result<(), InterpreterError> {
    let buffer = vm.reg(REG_ACC);
    let max = vm.reg(R5);
    let mut written = 0u32;
    while written < max {
        let Some(byte) = vm.input_mut().pop_front() else { break };
        if byte == b'\n' {
            break;
        }
        vm.memory_mut().write_byte(buffer + written, byte, AccessKind::Write)?;
        written += 1;
    }
    ok(vm, written)
}

fn print_hex(vm: &mut Vm) -> Result<(), InterpreterError> {
    let value = vm.reg(REG_ACC);
    vm.console_mut().extend(format!("{value:08X}").bytes());
    ok(vm, value)
}

const RADIX_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn print_based(vm: &mut Vm) -> Result<(), InterpreterError> {
    let value = vm.reg(REG_ACC);
    let base = vm.reg(R5);
    if !(2..=36).contains(&base) {
        vm.set_reg(R5, 1);
        return Ok(());
    }
    let mut digits = Vec::new();
    let mut n = value;
    if n == 0 {
        digits.push(RADIX_DIGITS[0]);
    }
    while n > 0 {
        digits.push(RADIX_DIGITS[(n % base) as usize]);
        n /= base;
    }
    digits.reverse();
    vm.console_mut().extend(digits);
    ok(vm, value)
}

fn print_fixed_point(vm: &mut Vm) -> Result<(), InterpreterError> {
    let raw = vm.reg(REG_ACC) as i32;
    let negative = raw < 0;
    let magnitude = raw.unsigned_abs();
    let whole = magnitude >> 16;
    let frac = ((magnitude & 0xFFFF) as u64 * 10_000) / 65_536;
    let rendered = format!("{}{}.{:04}", if negative { "-" } else { "" }, whole, frac);
    vm.console_mut().extend(rendered.bytes());
    ok(vm, vm.reg(REG_ACC))
}

fn clear_screen(vm: &mut Vm) -> Result<(), InterpreterError> {
    vm.console_mut().extend(b"\x1b[2J\x1b[H");
    ok(vm, 0)
}

fn set_colors(vm: &mut Vm) -> Result<(), InterpreterError> {
    let packed = vm.reg(REG_ACC);
    let fg = (packed & 0xFF) as u8;
    let bg = ((packed >> 8) & 0xFF) as u8;
    let rendered = if fg == 0xFF || bg == 0xFF {
        "\x1b[0;39;49m".to_string()
    } else {
        format!("\x1b[0;{};{}m", 30 + fg as u32, 40 + bg as u32)
    };
    vm.console_mut().extend(rendered.bytes());
    ok(vm, 0)
}

/* Memory */

fn allocate(vm: &mut Vm) -> Result<(), InterpreterError> {
    let size = vm.reg(REG_ACC);
    let ptr = vm.memory_mut().allocate(size)?;
    ok(vm, ptr)
}

fn free(vm: &mut Vm) -> Result<(), InterpreterError> {
    let ptr = vm.reg(REG_ACC);
    vm.memory_mut().free(ptr)?;
    ok(vm, 0)
}

fn copy(vm: &mut Vm) -> Result<(), InterpreterError> {
    let dst = vm.reg(REG_ACC);
    let src = vm.reg(R5);
    let len = vm.reg(R6);
    vm.memory_mut().mem_copy(dst, src, len)?;
    ok(vm, len)
}

/// Writes total size then (base, size) for CODE/DATA/STACK/HEAP as nine little-endian u32 words
/// at the buffer address supplied in R0, returning the byte count written.
fn memory_info(vm: &mut Vm) -> Result<(), InterpreterError> {
    let buffer = vm.reg(REG_ACC);
    let total = vm.memory().size();
    let layout = vm.memory().segment_layout();

    let mut words = Vec::with_capacity(9);
    words.push(total);
    for (base, size) in layout {
        words.push(base);
        words.push(size);
    }

    for (i, word) in words.iter().enumerate() {
        vm.memory_mut().write_dword(buffer + i as u32 * 4, *word, AccessKind::Write)?;
    }
    ok(vm, (words.len() * 4) as u32)
}

/* Process */

fn exit(vm: &mut Vm) -> Result<(), InterpreterError> {
    vm.set_halted(true);
    ok(vm, vm.reg(REG_ACC))
}

fn sleep(vm: &mut Vm) -> Result<(), InterpreterError> {
    let millis = vm.reg(REG_ACC);
    std::thread::sleep(std::time::Duration::from_millis(millis as u64));
    ok(vm, 0)
}

fn millis(vm: &mut Vm) -> Result<(), InterpreterError> {
    let value = vm.millis_since_start() as u32;
    ok(vm, value)
}

fn instruction_count(vm: &mut Vm) -> Result<(), InterpreterError> {
    let value = vm.instruction_count() as u32;
    ok(vm, value)
}

/* RNG */

fn uniform(vm: &mut Vm) -> Result<(), InterpreterError> {
    let max = vm.reg(REG_ACC);
    let value = vm.rng_mut().uniform(max);
    ok(vm, value)
}

fn seed(vm: &mut Vm) -> Result<(), InterpreterError> {
    let value = vm.reg(REG_ACC) as u64;
    vm.rng_mut().seed(value);
    ok(vm, 0)
}
