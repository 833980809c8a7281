//! Board handle: stack addressing and typed register access.

use crate::bus::{LinuxI2cBus, RegisterBus, RetryPolicy};
use crate::consts::{self, Register};
use crate::error::{Error, Result};
use log::{debug, trace};
use std::fmt;
use std::path::Path;

/// Stack level of a board (0-7), selected with the address jumpers.
/// Use `StackId::new(level)` to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackId(u8);

impl StackId {
    /// Creates a stack id, checking validity (0-7).
    pub fn new(level: u8) -> Result<Self> {
        if level <= consts::STACK_ID_MAX {
            Ok(StackId(level))
        } else {
            Err(Error::InvalidStack(level))
        }
    }

    /// Iterates over every possible stack level.
    pub fn all() -> impl Iterator<Item = StackId> {
        (0..=consts::STACK_ID_MAX).map(StackId)
    }

    /// Returns the stack level.
    #[inline]
    pub fn level(&self) -> u8 {
        self.0
    }

    /// 7-bit I2C address: `(level + BASE_ADDRESS) ^ 0x07`.
    #[inline]
    pub fn i2c_address(&self) -> u8 {
        (self.0 + consts::BASE_ADDRESS) ^ consts::STACK_ADDRESS_XOR
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stack {} (0x{:02X})", self.0, self.i2c_address())
    }
}

/// Firmware revision reported by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

/// A handle to one Sixteen Inputs board.
///
/// Feature accessors are spread over the `inputs`, `led`, `opto`, `rs485` and
/// `wdt` modules. Read-modify-write accessors are not atomic: two processes
/// updating the same register concurrently can lose one of the updates.
/// **Note:** All bus access goes through `&mut self`; share a board between
/// threads only behind a lock.
#[derive(Debug)]
pub struct Board<B: RegisterBus = LinuxI2cBus> {
    stack: StackId,
    bus: B,
}

impl Board<LinuxI2cBus> {
    /// Opens the board at `level` on the default bus with the default retry policy.
    pub fn open(level: u8) -> Result<Self> {
        Self::open_on(consts::DEFAULT_I2C_BUS, level, RetryPolicy::default())
    }

    /// Opens the board at `level` on a specific bus device.
    /// The stack level is validated before the bus is touched.
    pub fn open_on(path: impl AsRef<Path>, level: u8, retry: RetryPolicy) -> Result<Self> {
        let stack = StackId::new(level)?;
        let path = path.as_ref();
        let address = stack.i2c_address();
        let bus = LinuxI2cBus::open(path, address, retry).map_err(|source| Error::BusOpen {
            path: path.display().to_string(),
            address,
            source,
        })?;
        Ok(Board { stack, bus })
    }
}

impl<B: RegisterBus> Board<B> {
    /// Wraps an already bound transport.
    pub fn with_bus(stack: StackId, bus: B) -> Self {
        Board { stack, bus }
    }

    pub fn stack(&self) -> StackId {
        self.stack
    }

    pub fn address(&self) -> u8 {
        self.stack.i2c_address()
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    // --- Register Access ---
    // Wrap transport errors with register context
    pub(crate) fn read_bytes<const N: usize>(&mut self, reg: Register, offset: u8) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.bus
            .read_registers(offset, &mut buf)
            .map_err(|source| Error::Transport {
                address: self.stack.i2c_address(),
                register: offset,
                name: reg.name,
                source,
            })?;
        trace!("Read {} @0x{:02X}: {:02X?}", reg.name, offset, buf);
        Ok(buf)
    }

    pub(crate) fn write_bytes(&mut self, reg: Register, offset: u8, data: &[u8]) -> Result<()> {
        trace!("Write {} @0x{:02X}: {:02X?}", reg.name, offset, data);
        self.bus
            .write_registers(offset, data)
            .map_err(|source| Error::Transport {
                address: self.stack.i2c_address(),
                register: offset,
                name: reg.name,
                source,
            })
    }

    pub(crate) fn read_u8(&mut self, reg: Register) -> Result<u8> {
        let [b] = self.read_bytes::<1>(reg, reg.offset)?;
        Ok(b)
    }

    pub(crate) fn read_u16(&mut self, reg: Register) -> Result<u16> {
        self.read_u16_at(reg, reg.offset)
    }

    pub(crate) fn read_u16_at(&mut self, reg: Register, offset: u8) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_bytes::<2>(reg, offset)?))
    }

    pub(crate) fn read_u32(&mut self, reg: Register) -> Result<u32> {
        self.read_u32_at(reg, reg.offset)
    }

    pub(crate) fn read_u32_at(&mut self, reg: Register, offset: u8) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_bytes::<4>(reg, offset)?))
    }

    pub(crate) fn write_u8(&mut self, reg: Register, value: u8) -> Result<()> {
        self.write_bytes(reg, reg.offset, &[value])
    }

    pub(crate) fn write_u16(&mut self, reg: Register, value: u16) -> Result<()> {
        self.write_bytes(reg, reg.offset, &value.to_le_bytes())
    }

    pub(crate) fn write_u32(&mut self, reg: Register, value: u32) -> Result<()> {
        self.write_bytes(reg, reg.offset, &value.to_le_bytes())
    }

    /// Checks that a board answers by reading its input port.
    pub fn probe(&mut self) -> Result<()> {
        self.read_bytes::<2>(consts::reg::INPUTS, consts::reg::INPUTS.offset)
            .map(|_| ())
    }

    /// Reads the firmware revision.
    pub fn firmware_version(&mut self) -> Result<FirmwareVersion> {
        let [major, minor] =
            self.read_bytes::<2>(consts::reg::REVISION_MAJOR, consts::reg::REVISION_MAJOR.offset)?;
        debug!("{}: firmware {}.{:02}", self.stack, major, minor);
        Ok(FirmwareVersion { major, minor })
    }
}

/// Probes all eight stack levels on `path` and returns those that answer.
/// Each probe is a single attempt; absent boards are expected to NACK.
pub fn discover(path: impl AsRef<Path>) -> Vec<StackId> {
    let path = path.as_ref();
    StackId::all()
        .filter(|&stack| {
            match Board::open_on(path, stack.level(), RetryPolicy::once())
                .and_then(|mut board| board.probe())
            {
                Ok(()) => true,
                Err(e) => {
                    debug!("No board at {}: {}", stack, e);
                    false
                }
            }
        })
        .collect()
}
