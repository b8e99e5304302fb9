//! VM parameters: register roles, status flags, segment layout.

/// Total number of general-purpose + reserved registers.
pub const REGISTER_COUNT: usize = 16;

/// Accumulator: syscall argument/return value.
pub const REG_ACC: usize = 0x0;

/// Frame base pointer.
pub const REG_BP: usize = 0x1;

/// Stack pointer (grows downward).
pub const REG_SP: usize = 0x2;

/// Program counter: address of the next instruction to fetch.
pub const REG_PC: usize = 0x3;

/// Status register (flags, see below).
pub const REG_SR: usize = 0x4;

/// First general-purpose register (R5..=R14 are general purpose).
pub const REG_GP_FIRST: usize = 0x5;

/// Last general-purpose register.
pub const REG_GP_LAST: usize = 0xE;

/// Link register.
pub const REG_LR: usize = 0xF;

/* Status register flag bits */

/// Zero flag.
pub const SR_Z: u32 = 0x01;
/// Negative flag.
pub const SR_N: u32 = 0x02;
/// Carry flag.
pub const SR_C: u32 = 0x04;
/// Overflow flag.
pub const SR_O: u32 = 0x08;
/// Interrupt-enable flag.
pub const SR_I: u32 = 0x10;
/// Direction flag (reserved for string-style memory ops).
pub const SR_D: u32 = 0x20;
/// Single-step flag (reserved).
pub const SR_S: u32 = 0x40;
/// Trap/debug flag.
pub const SR_T: u32 = 0x80;

/* Memory layout */

/// Default segment size: 16 KiB.
pub const DEFAULT_SEGMENT_SIZE: u32 = 16 * 1024;

/// Default total memory size: 64 KiB.
pub const DEFAULT_MEMORY_SIZE: u32 = 4 * DEFAULT_SEGMENT_SIZE;

/// Code segment base.
pub const CODE_BASE: u32 = 0x0000;
/// Data segment base.
pub const DATA_BASE: u32 = 0x4000;
/// Stack segment base.
pub const STACK_BASE: u32 = 0x8000;
/// Heap segment base.
pub const HEAP_BASE: u32 = 0xC000;

/// Width of one machine word, in bytes.
pub const WORD_SIZE: u32 = 4;

/// Size of a decoded instruction, in bytes.
pub const INSTRUCTION_SIZE: u32 = 4;

/* Heap block header */

/// Magic value stamped in every heap block header.
pub const HEAP_BLOCK_MAGIC: u16 = 0xABCD;

/// Size of a heap block header, in bytes (magic:2, size:2, is_free:1, prot:1, next:2).
pub const HEAP_HEADER_SIZE: u32 = 8;

/// Minimum payload size of a heap block (post rounding).
pub const HEAP_MIN_PAYLOAD: u32 = 8;

/// Block protection bits.
pub const PROT_R: u8 = 0x1;
pub const PROT_W: u8 = 0x2;
pub const PROT_X: u8 = 0x4;

/* Interrupts */

/// Number of entries in the interrupt vector table.
pub const INTERRUPT_VECTOR_COUNT: usize = 16;

/// Default base address of the interrupt vector table (start of DATA).
pub const DEFAULT_VECTOR_TABLE_BASE: u32 = DATA_BASE;

/* Stack/frame record sizes */

/// Bytes pushed by PUSHA (16 registers).
pub const PUSHA_SIZE: u32 = REGISTER_COUNT as u32 * WORD_SIZE;
