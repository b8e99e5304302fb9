//! 32-bit register-based virtual machine core: fetch-decode-execute loop, segmented memory with
//! a protected heap allocator, interrupt and syscall layers, and a port-keyed I/O router.
//!
//! The command-line front-end, disassembler, debug-symbol loader, and binary-file reader that
//! populates segments from disk are out of scope here; [`loader::load_image`] accepts an
//! already-read byte buffer and hands back a validated [`loader::LoadedImage`].

#![deny(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]

pub mod addressing;
pub mod alu;
pub mod consts;
pub mod error;
pub mod instruction;
pub mod interpreter;
pub mod interrupt;
pub mod io;
pub mod loader;
pub mod memory;
pub mod opcodes;
pub mod rng;
pub mod syscall;

pub mod prelude {
    //! Re-exports covering the surface a host front-end needs to load an image, drive the
    //! execution loop, and interpret faults.
    pub use crate::error::{AccessKind, ErrorCode, InterpreterError};
    pub use crate::instruction::{AddressingMode, Instruction};
    pub use crate::interpreter::{StepOutcome, Vm, VmConfig};
    pub use crate::io::{ConsoleDevice, Device, IoRouter, TimerDevice};
    pub use crate::loader::{load_image, LoadedImage, LoaderError};
    pub use crate::memory::{Memory, SegmentKind};
}
