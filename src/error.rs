//! Error taxonomy and the in-VM last-error mirror.

use thiserror::Error;

/// Stable integer error codes, reproduced in image/protocol documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    None = 0,
    InvalidInstruction = 1,
    SegmentationFault = 2,
    StackOverflow = 3,
    StackUnderflow = 4,
    DivisionByZero = 5,
    InvalidAddress = 6,
    InvalidSyscall = 7,
    MemoryAllocation = 8,
    InvalidAlignment = 9,
    UnhandledInterrupt = 10,
    IoError = 11,
    ProtectionFault = 12,
    NestedInterrupt = 13,
}

impl ErrorCode {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Runtime interpreter error variants. Every fallible core method returns this as its error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterpreterError {
    #[error("invalid instruction at {pc:#06x}: {detail}")]
    InvalidInstruction { pc: u32, detail: String },

    #[error("segmentation fault accessing {addr:#06x} ({len} bytes): {detail}")]
    SegmentationFault { addr: u32, len: u32, detail: String },

    #[error("stack overflow: sp would fall below stack base")]
    StackOverflow,

    #[error("stack underflow: sp would exceed stack top")]
    StackUnderflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid address {addr:#06x}: {detail}")]
    InvalidAddress { addr: u32, detail: String },

    #[error("invalid syscall number {number}")]
    InvalidSyscall { number: u32 },

    #[error("memory allocation failed: {detail}")]
    MemoryAllocation { detail: String },

    #[error("invalid alignment at {addr:#06x}")]
    InvalidAlignment { addr: u32 },

    #[error("unhandled interrupt vector {vector}")]
    UnhandledInterrupt { vector: u32 },

    #[error("I/O error on port {port:#06x}: {detail}")]
    IoError { port: u16, detail: String },

    #[error("protection fault accessing {addr:#06x}: missing {required:?}")]
    ProtectionFault { addr: u32, required: AccessKind },

    #[error("nested interrupt with interrupts already disabled")]
    NestedInterrupt,
}

impl InterpreterError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInstruction { .. } => ErrorCode::InvalidInstruction,
            Self::SegmentationFault { .. } => ErrorCode::SegmentationFault,
            Self::StackOverflow => ErrorCode::StackOverflow,
            Self::StackUnderflow => ErrorCode::StackUnderflow,
            Self::DivisionByZero => ErrorCode::DivisionByZero,
            Self::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            Self::InvalidSyscall { .. } => ErrorCode::InvalidSyscall,
            Self::MemoryAllocation { .. } => ErrorCode::MemoryAllocation,
            Self::InvalidAlignment { .. } => ErrorCode::InvalidAlignment,
            Self::UnhandledInterrupt { .. } => ErrorCode::UnhandledInterrupt,
            Self::IoError { .. } => ErrorCode::IoError,
            Self::ProtectionFault { .. } => ErrorCode::ProtectionFault,
            Self::NestedInterrupt => ErrorCode::NestedInterrupt,
        }
    }

    /// Short formatted diagnostic for the fixed-size in-VM message buffer. Readers must only
    /// parse `code()`, never this string.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// The kind of memory access that a protection check failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
    Execute,
}
