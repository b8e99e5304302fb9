//! I/O device router: dispatches IN/OUT opcodes to registered devices keyed by port range.

use crate::error::InterpreterError;
use std::collections::VecDeque;
use std::ops::RangeInclusive;

/// A port-range-addressable device. Kept as a trait object rather than a closed enum of device
/// kinds so hosts can register custom devices beyond the built-in console/timer.
pub trait Device: std::fmt::Debug {
    /// Read a word from `port`, already translated to be device-relative.
    fn read(&mut self, port: u16) -> u32;
    /// Write a word to `port`, already translated to be device-relative.
    fn write(&mut self, port: u16, value: u32);
}

#[derive(Debug)]
struct Registration {
    range: RangeInclusive<u16>,
    device: Box<dyn Device>,
}

/// Registration table mapping contiguous port ranges to devices.
#[derive(Debug, Default)]
pub struct IoRouter {
    devices: Vec<Registration>,
}

impl IoRouter {
    pub fn new() -> Self {
        Self { devices: Vec::new() }
    }

    pub fn register(&mut self, range: RangeInclusive<u16>, device: Box<dyn Device>) {
        self.devices.push(Registration { range, device });
    }

    pub fn read(&mut self, port: u16) -> Result<u32, InterpreterError> {
        let reg = self
            .devices
            .iter_mut()
            .find(|r| r.range.contains(&port))
            .ok_or_else(|| InterpreterError::IoError { port, detail: "no device registered for port".into() })?;
        let relative = port - reg.range.start();
        Ok(reg.device.read(relative))
    }

    pub fn write(&mut self, port: u16, value: u32) -> Result<(), InterpreterError> {
        let reg = self
            .devices
            .iter_mut()
            .find(|r| r.range.contains(&port))
            .ok_or_else(|| InterpreterError::IoError { port, detail: "no device registered for port".into() })?;
        let relative = port - reg.range.start();
        reg.device.write(relative, value);
        Ok(())
    }
}

/// Sentinel returned by `ConsoleDevice::read` port 0 when the input queue is empty, mirroring
/// `getchar()`'s `EOF` (-1) widened to `u32`.
pub const CONSOLE_EOF: u32 = u32::MAX;

/// Console device covering ports 0-1: port 0 is stdin/stdout, port 1 is status on read (always
/// ready) and stderr on write. Matches the port layout a host installs by default; bytes flow
/// through explicit queues rather than real stdio, so tests can drive and capture them.
#[derive(Debug, Default)]
pub struct ConsoleDevice {
    input: VecDeque<u8>,
    output: Vec<u8>,
    output_err: Vec<u8>,
}

impl ConsoleDevice {
    /// Queue bytes as if typed at a host terminal, for port-0 `IN` to consume.
    pub fn feed_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    /// Bytes written to port 0 (stdout) so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Bytes written to port 1 (stderr) so far.
    pub fn output_err(&self) -> &[u8] {
        &self.output_err
    }
}

impl Device for ConsoleDevice {
    fn read(&mut self, port: u16) -> u32 {
        match port {
            0 => self.input.pop_front().map(u32::from).unwrap_or(CONSOLE_EOF),
            1 => 1, // status: always ready
            _ => 0,
        }
    }

    fn write(&mut self, port: u16, value: u32) {
        match port {
            0 => self.output.push(value as u8),
            1 => self.output_err.push(value as u8),
            _ => {}
        }
    }
}

/// Timer device covering ports 0-1 (relative): port 0 reads/sets a free-running counter value,
/// port 1 is a control register where writing `2` resets the counter to 0. There is no real
/// ticking thread; a host front-end advances the counter by writing port 0 itself.
#[derive(Debug, Default)]
pub struct TimerDevice {
    value: u32,
}

impl Device for TimerDevice {
    fn read(&mut self, port: u16) -> u32 {
        match port {
            0 => self.value,
            _ => 0,
        }
    }

    fn write(&mut self, port: u16, value: u32) {
        match port {
            0 => self.value = value,
            1 if value == 2 => self.value = 0,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_is_io_error() {
        let mut router = IoRouter::new();
        assert!(router.read(5).is_err());
    }

    #[test]
    fn console_round_trip() {
        let mut router = IoRouter::new();
        router.register(0..=1, Box::new(ConsoleDevice::default()));
        router.write(0, 0x41).unwrap();
        // Port 0 is stdin on read, not an echo of the last stdout write.
        assert_eq!(router.read(0).unwrap(), CONSOLE_EOF);
        assert_eq!(router.read(1).unwrap(), 1);
    }

    #[test]
    fn console_reads_fed_input_then_eof() {
        let mut console = ConsoleDevice::default();
        console.feed_input(b"hi");
        let mut router = IoRouter::new();
        router.register(0..=1, Box::new(console));
        assert_eq!(router.read(0).unwrap(), b'h' as u32);
        assert_eq!(router.read(0).unwrap(), b'i' as u32);
        assert_eq!(router.read(0).unwrap(), CONSOLE_EOF);
    }

    #[test]
    fn timer_holds_value_until_written() {
        let mut router = IoRouter::new();
        router.register(8..=9, Box::new(TimerDevice::default()));
        assert_eq!(router.read(8).unwrap(), 0);
        router.write(8, 42).unwrap();
        assert_eq!(router.read(8).unwrap(), 42);
        router.write(9, 2).unwrap(); // control: reset
        assert_eq!(router.read(8).unwrap(), 0);
    }
}
