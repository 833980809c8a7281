//! Register transport: byte-addressed multi-byte reads and writes on one I2C slave.

use crate::consts;
use i2cdev::core::I2CDevice;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError};
use log::{debug, trace, warn};
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Byte-addressed register access on a single bound slave.
///
/// Implementations retry transient failures themselves; an `Err` means the
/// retry budget is exhausted.
pub trait RegisterBus {
    /// Reads `buf.len()` consecutive registers starting at `offset`.
    fn read_registers(&mut self, offset: u8, buf: &mut [u8]) -> io::Result<()>;
    /// Writes `data` to consecutive registers starting at `offset`.
    fn write_registers(&mut self, offset: u8, data: &[u8]) -> io::Result<()>;
}

/// How often a failed transfer is repeated before giving up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: consts::RETRY_TIMES,
            delay: Duration::from_millis(consts::RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no delay. Used for bus probing.
    pub fn once() -> Self {
        RetryPolicy {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }

    /// Runs `op` until it succeeds or the attempt budget is spent.
    pub fn run<T, E, F>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if attempt < attempts => {
                    warn!("{} failed (attempt {}/{}): {}", what, attempt, attempts, e);
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    debug!("{} failed after {} attempt(s): {}", what, attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

/// A board slave on a Linux `/dev/i2c-N` character device.
pub struct LinuxI2cBus {
    device: LinuxI2CDevice,
    address: u8,
    retry: RetryPolicy,
}

impl std::fmt::Debug for LinuxI2cBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinuxI2cBus")
            .field("address", &format_args!("0x{:02X}", self.address))
            .field("retry", &self.retry)
            .finish()
    }
}

impl LinuxI2cBus {
    /// Opens `path` and binds it to the 7-bit slave `address`.
    pub fn open(path: impl AsRef<Path>, address: u8, retry: RetryPolicy) -> io::Result<Self> {
        let path = path.as_ref();
        let device = LinuxI2CDevice::new(path, u16::from(address)).map_err(io::Error::from)?;
        debug!("Opened {} for slave 0x{:02X}", path.display(), address);
        Ok(LinuxI2cBus {
            device,
            address,
            retry,
        })
    }

    /// Bound 7-bit slave address.
    pub fn address(&self) -> u8 {
        self.address
    }
}

impl RegisterBus for LinuxI2cBus {
    fn read_registers(&mut self, offset: u8, buf: &mut [u8]) -> io::Result<()> {
        let device = &mut self.device;
        let what = format!("I2C read 0x{:02X}[0x{:02X}; {}]", self.address, offset, buf.len());
        self.retry
            .run(&what, || -> Result<(), LinuxI2CError> {
                // Register pointer write, then a separate read transfer (STOP in between).
                device.write(&[offset])?;
                device.read(buf)
            })
            .map_err(io::Error::from)?;
        trace!("{} -> {:02X?}", what, buf);
        Ok(())
    }

    fn write_registers(&mut self, offset: u8, data: &[u8]) -> io::Result<()> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(offset);
        frame.extend_from_slice(data);
        trace!(
            "I2C write 0x{:02X}[0x{:02X}] <- {:02X?}",
            self.address,
            offset,
            data
        );
        let device = &mut self.device;
        let what = format!("I2C write 0x{:02X}[0x{:02X}; {}]", self.address, offset, data.len());
        self.retry
            .run(&what, || device.write(&frame))
            .map_err(io::Error::from)
    }
}

/// In-memory register image of one board.
///
/// Stands in for the hardware in tests and dry runs: reads and writes go to a
/// 256-byte array, every transfer is counted, and failures can be injected.
/// Registers with side effects on real firmware (set/clear, reset triggers,
/// separate get/set pairs) are plain storage here.
#[derive(Debug, Clone)]
pub struct MemoryBus {
    memory: [u8; 256],
    reads: usize,
    writes: usize,
    fail_transfers: bool,
}

impl Default for MemoryBus {
    fn default() -> Self {
        MemoryBus {
            memory: [0; 256],
            reads: 0,
            writes: 0,
            fail_transfers: false,
        }
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preloads registers without counting a transfer.
    ///
    /// # Panics
    ///
    /// Panics if `offset + bytes.len()` runs past the 256-byte map.
    pub fn preload(&mut self, offset: u8, bytes: &[u8]) {
        let start = usize::from(offset);
        assert!(
            start + bytes.len() <= self.memory.len(),
            "preload 0x{:02X}+{} past end of map",
            offset,
            bytes.len()
        );
        self.memory[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Inspects registers without counting a transfer.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len` runs past the 256-byte map.
    pub fn peek(&self, offset: u8, len: usize) -> &[u8] {
        let start = usize::from(offset);
        assert!(
            start + len <= self.memory.len(),
            "peek 0x{:02X}+{} past end of map",
            offset,
            len
        );
        &self.memory[start..start + len]
    }

    /// Number of read transfers performed.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Number of write transfers performed.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Total transfers in either direction.
    pub fn transfers(&self) -> usize {
        self.reads + self.writes
    }

    /// Makes every following transfer fail as a NACK would.
    pub fn set_failing(&mut self, failing: bool) {
        self.fail_transfers = failing;
    }

    fn check(&self, offset: u8, len: usize) -> io::Result<std::ops::Range<usize>> {
        if self.fail_transfers {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "simulated NACK",
            ));
        }
        let start = usize::from(offset);
        let end = start + len;
        if end > self.memory.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("register range 0x{:02X}+{} past end of map", offset, len),
            ));
        }
        Ok(start..end)
    }
}

impl RegisterBus for MemoryBus {
    fn read_registers(&mut self, offset: u8, buf: &mut [u8]) -> io::Result<()> {
        self.reads += 1;
        let range = self.check(offset, buf.len())?;
        buf.copy_from_slice(&self.memory[range]);
        Ok(())
    }

    fn write_registers(&mut self, offset: u8, data: &[u8]) -> io::Result<()> {
        self.writes += 1;
        let range = self.check(offset, data.len())?;
        self.memory[range].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 10);
        assert_eq!(policy.delay, Duration::from_millis(2));
    }

    #[test]
    fn test_retry_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            attempts: 5,
            delay: Duration::ZERO,
        };
        let result: Result<u8, String> = policy.run("op", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err("busy".to_string())
            } else {
                Ok(7)
            }
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_gives_up_after_budget() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            attempts: 4,
            delay: Duration::ZERO,
        };
        let result: Result<(), String> = policy.run("op", || {
            calls.set(calls.get() + 1);
            Err("nack".to_string())
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 4);

        calls.set(0);
        let _ = RetryPolicy {
            attempts: 0,
            delay: Duration::ZERO,
        }
        .run("op", || -> Result<(), String> {
            calls.set(calls.get() + 1);
            Err("nack".to_string())
        });
        assert_eq!(calls.get(), 1, "zero attempts still tries once");
    }

    #[test]
    fn test_memory_bus_counts_and_fails() {
        let mut bus = MemoryBus::new();
        bus.write_registers(0x10, &[1, 2, 3]).unwrap();
        let mut buf = [0u8; 3];
        bus.read_registers(0x10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!((bus.reads(), bus.writes()), (1, 1));

        bus.set_failing(true);
        assert!(bus.read_registers(0x10, &mut buf).is_err());
        assert!(bus.read_registers(0xFF, &mut [0u8; 2]).is_err());
    }

    #[test]
    fn test_memory_bus_helpers_reach_last_register() {
        let mut bus = MemoryBus::new();
        bus.preload(0xFE, &[0x12, 0x34]);
        assert_eq!(bus.peek(0xFE, 2), &[0x12, 0x34]);
        assert_eq!(bus.transfers(), 0);
    }

    #[test]
    #[should_panic(expected = "past end of map")]
    fn test_memory_bus_preload_past_end_panics() {
        MemoryBus::new().preload(0xFF, &[0, 0]);
    }

    #[test]
    #[should_panic(expected = "past end of map")]
    fn test_memory_bus_peek_past_end_panics() {
        let _ = MemoryBus::new().peek(0xF0, 17);
    }
}
