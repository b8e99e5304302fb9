//! [`Vm`] implementation: the fetch-decode-execute loop and the register/memory/IO state it
//! threads through every handler.

mod arithmetic;
mod control_flow;
mod data_transfer;
mod logical;
mod memory_control;
mod stack_frame;
mod system;

use crate::consts::*;
use crate::error::{AccessKind, ErrorCode, InterpreterError};
use crate::instruction::Instruction;
use crate::io::{ConsoleDevice, Device, IoRouter, TimerDevice};
use crate::loader::LoadedImage;
use crate::memory::Memory;
use crate::opcodes::OpcodeFamily;
use crate::rng::Lcg;

use std::ops::RangeInclusive;
use tracing::{debug, trace};

/// Configuration threaded through a [`Vm`] at construction time — no global mutable state,
/// everything lives on the value.
#[derive(Debug)]
pub struct VmConfig {
    pub memory_size: u32,
    pub vector_table_base: u32,
    /// When set, delivering `INT` while `SR.I` is already clear raises `NESTED_INTERRUPT`
    /// instead of silently proceeding.
    pub strict_interrupts: bool,
    /// Devices registered into the `Vm`'s `IoRouter` at construction time, each keyed by the
    /// port range it answers. `Default` installs a console at ports 0-1 and a timer at 8-9, so a
    /// fresh `Vm` can run `IN`/`OUT` against the minimum I/O surface without extra setup.
    pub io_devices: Vec<(RangeInclusive<u16>, Box<dyn Device>)>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            vector_table_base: DEFAULT_VECTOR_TABLE_BASE,
            strict_interrupts: false,
            io_devices: vec![
                (0..=1, Box::new(ConsoleDevice::default()) as Box<dyn Device>),
                (8..=9, Box::new(TimerDevice::default()) as Box<dyn Device>),
            ],
        }
    }
}

/// Outcome of a single `step()`. Most instructions produce `Proceed`; a few terminal ones are
/// surfaced distinctly so a host loop can react without inspecting registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Proceed,
    Halted,
}

/// The VM interpreter: registers, memory, halt/debug flags, instruction counter, and the
/// last-fault diagnostics mirror a front-end uses for post-mortem disassembly.
#[derive(Debug)]
pub struct Vm {
    registers: [u32; REGISTER_COUNT],
    memory: Memory,
    halted: bool,
    debug: bool,
    instruction_count: u64,
    last_instruction: Option<Instruction>,
    last_error: Option<InterpreterError>,
    fault_pc: u32,
    io: IoRouter,
    config: VmConfig,
    rng: Lcg,
    /// Bytes written by the console syscalls. A host front-end drains this or mirrors it to
    /// stdout; the core never touches stdio directly.
    console: Vec<u8>,
    /// Bytes available to the read-char/read-line syscalls. A host front-end feeds this from
    /// stdin before calling `run`/`step`; the core never touches stdio directly.
    input: std::collections::VecDeque<u8>,
    started_at: std::time::Instant,
}

impl Vm {
    pub fn new(mut config: VmConfig) -> Self {
        let memory = Memory::new(config.memory_size);
        let mut io = IoRouter::new();
        for (range, device) in config.io_devices.drain(..) {
            io.register(range, device);
        }
        let mut vm = Self {
            registers: [0; REGISTER_COUNT],
            memory,
            halted: false,
            debug: false,
            instruction_count: 0,
            last_instruction: None,
            last_error: None,
            fault_pc: 0,
            io,
            config,
            rng: Lcg::default(),
            console: Vec::new(),
            input: std::collections::VecDeque::new(),
            started_at: std::time::Instant::now(),
        };
        vm.reset();
        vm
    }

    pub fn with_default_config() -> Self {
        Self::new(VmConfig::default())
    }

    /// Install a validated memory image and set `PC` to its entry point.
    pub fn load(&mut self, image: &LoadedImage) -> Result<(), InterpreterError> {
        for (i, byte) in image.code.iter().enumerate() {
            self.memory.load_bytes(image.code_base + i as u32, *byte)?;
        }
        for (i, byte) in image.data.iter().enumerate() {
            self.memory.load_bytes(image.data_base + i as u32, *byte)?;
        }
        self.registers[REG_PC] = image.entry_point;
        Ok(())
    }

    /// Re-zero registers and memory, reinitializing the heap free-list, without resizing.
    pub fn reset(&mut self) {
        self.registers = [0; REGISTER_COUNT];
        self.memory.reset();
        self.registers[REG_SP] = self.memory.stack_top();
        self.registers[REG_BP] = self.memory.stack_top();
        self.registers[REG_PC] = self.memory.code_base();
        self.halted = false;
        self.debug = false;
        self.instruction_count = 0;
        self.last_instruction = None;
        self.last_error = None;
        self.fault_pc = 0;
        self.rng = Lcg::default();
        self.console.clear();
        self.input.clear();
    }

    pub fn registers(&self) -> &[u32; REGISTER_COUNT] {
        &self.registers
    }

    pub fn reg(&self, index: usize) -> u32 {
        self.registers[index]
    }

    pub fn set_reg(&mut self, index: usize, value: u32) {
        // R0..R15 are all writable; only the dispatcher decides which indices a given opcode may
        // target. Writes to PC/SP/BP through ordinary instructions are legal (e.g. MOVE into SP).
        self.registers[index] = value;
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn io_mut(&mut self) -> &mut IoRouter {
        &mut self.io
    }

    pub fn console_output(&self) -> &[u8] {
        &self.console
    }

    /// Queue bytes for the read-char/read-line syscalls to consume, as if typed at a host
    /// terminal.
    pub fn feed_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn debug_flag(&self) -> bool {
        self.debug
    }

    pub(crate) fn set_halted(&mut self, value: bool) {
        self.halted = value;
    }

    pub(crate) fn set_debug(&mut self, value: bool) {
        self.debug = value;
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    pub fn fault_pc(&self) -> u32 {
        self.fault_pc
    }

    pub fn last_error(&self) -> Option<&InterpreterError> {
        self.last_error.as_ref()
    }

    pub fn last_error_code(&self) -> ErrorCode {
        self.last_error.as_ref().map(|e| e.code()).unwrap_or(ErrorCode::None)
    }

    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instruction
    }

    pub fn millis_since_start(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /* Status register flag helpers */

    pub fn sr(&self) -> u32 {
        self.registers[REG_SR]
    }

    pub fn set_sr(&mut self, value: u32) {
        self.registers[REG_SR] = value;
    }

    pub fn flag(&self, bit: u32) -> bool {
        self.registers[REG_SR] & bit != 0
    }

    pub fn set_flag(&mut self, bit: u32, on: bool) {
        if on {
            self.registers[REG_SR] |= bit;
        } else {
            self.registers[REG_SR] &= !bit;
        }
    }

    /// Replace only the status bits `outcome.mask` names with `outcome.flags`, leaving every
    /// other bit — including C/O on ops that never declare them — exactly as it was.
    pub(crate) fn apply_alu_flags(&mut self, outcome: &crate::alu::AluOutcome) {
        let preserved = self.registers[REG_SR] & !outcome.mask;
        self.registers[REG_SR] = preserved | (outcome.flags & outcome.mask);
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Lcg {
        &mut self.rng
    }

    pub(crate) fn console_mut(&mut self) -> &mut Vec<u8> {
        &mut self.console
    }

    pub(crate) fn input_mut(&mut self) -> &mut std::collections::VecDeque<u8> {
        &mut self.input
    }

    pub(crate) fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn vector_table_base(&self) -> u32 {
        self.config.vector_table_base
    }

    /// The fetch-decode-execute step procedure.
    pub fn step(&mut self) -> Result<StepOutcome, InterpreterError> {
        if self.halted {
            return Ok(StepOutcome::Halted);
        }

        let pc = self.registers[REG_PC];
        self.fault_pc = pc;

        let result = self.step_inner(pc);

        match &result {
            Ok(_) => {
                self.instruction_count += 1;
                self.last_error = None;
            }
            Err(e) => {
                self.last_error = Some(e.clone());
                trace!(pc, error = %e, "instruction faulted");
            }
        }

        result
    }

    fn step_inner(&mut self, pc: u32) -> Result<StepOutcome, InterpreterError> {
        let word = self.memory.fetch_instruction_word(pc)?;
        let instr = Instruction::decode(word, pc)?;
        self.last_instruction = Some(instr);

        self.registers[REG_PC] = pc.wrapping_add(INSTRUCTION_SIZE);

        let family = OpcodeFamily::classify(instr.opcode).ok_or_else(|| InterpreterError::InvalidInstruction {
            pc,
            detail: format!("opcode {:#x} is not in any dispatch range", instr.opcode),
        })?;

        debug!(pc, opcode = instr.opcode, ?family, "dispatch");

        match family {
            OpcodeFamily::DataTransfer => data_transfer::dispatch(self, &instr)?,
            OpcodeFamily::Arithmetic => arithmetic::dispatch(self, &instr)?,
            OpcodeFamily::Logical => logical::dispatch(self, &instr)?,
            OpcodeFamily::ControlFlow => control_flow::dispatch(self, &instr)?,
            OpcodeFamily::StackFrame => stack_frame::dispatch(self, &instr)?,
            OpcodeFamily::System => system::dispatch(self, &instr)?,
            OpcodeFamily::MemoryControl => memory_control::dispatch(self, &instr)?,
        }

        Ok(if self.halted { StepOutcome::Halted } else { StepOutcome::Proceed })
    }

    /// Run until `HALT`, an instruction budget is exhausted, or a handler errors. A host may cap
    /// the number of instructions executed by passing `max_instructions` and polling
    /// `instruction_count` across calls.
    pub fn run(&mut self, max_instructions: Option<u64>) -> Result<StepOutcome, InterpreterError> {
        loop {
            if let Some(max) = max_instructions {
                if self.instruction_count >= max {
                    return Ok(StepOutcome::Proceed);
                }
            }
            match self.step()? {
                StepOutcome::Halted => return Ok(StepOutcome::Halted),
                StepOutcome::Proceed => continue,
            }
        }
    }

    /* Stack push/pop */

    pub(crate) fn stack_push(&mut self, value: u32) -> Result<(), InterpreterError> {
        let new_sp = self.registers[REG_SP].wrapping_sub(WORD_SIZE);
        if new_sp < self.memory.stack_base() || new_sp > self.registers[REG_SP] {
            return Err(InterpreterError::StackOverflow);
        }
        self.memory.write_dword(new_sp, value, AccessKind::Write)?;
        self.registers[REG_SP] = new_sp;
        Ok(())
    }

    pub(crate) fn stack_pop(&mut self) -> Result<u32, InterpreterError> {
        let sp = self.registers[REG_SP];
        let new_sp = sp.wrapping_add(WORD_SIZE);
        if new_sp > self.memory.stack_top() {
            return Err(InterpreterError::StackUnderflow);
        }
        let value = self.memory.read_dword(sp, AccessKind::Read)?;
        self.registers[REG_SP] = new_sp;
        Ok(value)
    }
}
