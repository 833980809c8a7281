//! # sm16inpind
//!
//! A Rust crate for reading and configuring the Sixteen LV Digital Inputs
//! stackable card for Raspberry Pi over the Linux I²C bus.
//!
//! This crate uses the `i2cdev` crate for `/dev/i2c-N` access. Up to eight
//! cards can share one bus; each is selected by its stack level (0-7).
//!
//! ## Features
//!
//! *   Board discovery (`discover`) and firmware version readout.
//! *   Digital (legacy port) inputs: all 16 at once or one channel.
//! *   General purpose LEDs:
//!     *   State read/write (mask or single LED through set/clear registers).
//!     *   Per-LED mode (auto/manual) and power LED mode.
//! *   Optocoupled inputs:
//!     *   State, counted edges (none/rising/falling/both) and edge counters.
//!     *   Quadrature encoder mode on channel pairs with signed counts.
//!     *   Signal frequency (Hz) and PWM fill factor (%).
//!     *   Interrupt generation on change, per channel or as a bitmap.
//! *   RS485 port: Modbus RTU slave settings (packed 5-byte block).
//! *   Raspberry Pi power watchdog: reload, periods, off interval, repower count.
//!
//! ## Channel numbering
//!
//! Channels are 1-based everywhere: inputs and opto channels 1-16, LEDs 1-8,
//! encoders 1-8 (encoder `n` uses opto channels `2n - 1` and `2n`). Out-of-range
//! channels and values are rejected before any bus traffic; see
//! [`Error::is_range_error`].
//!
//! ## Basic Usage
//!
//! ```no_run
//! use sm16inpind::{Board, EdgeMode, Result};
//!
//! fn main() -> Result<()> {
//!     // Optional: Initialize logging
//!     // env_logger::init();
//!
//!     let mut board = Board::open(0)?;
//!     println!("Firmware {}", board.firmware_version()?);
//!
//!     let inputs = board.inputs_read()?;
//!     println!("Inputs: 0x{:04X}", inputs);
//!
//!     board.set_opto_edge(2, EdgeMode::Rising)?;
//!     println!("Opto 2 count: {}", board.opto_count(2)?);
//!
//!     board.watchdog_reload()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! A [`Board`] is driven through `&mut self` and is meant for one thread.
//! Read-modify-write accessors (LED modes, edge configuration, encoder and
//! interrupt enables) are not atomic against other processes using the same
//! card: the last writer wins.
//!
//! ## Hardware Setup Notes
//!
//! *   Enable I²C on the Raspberry Pi (`raspi-config`); the default bus is `/dev/i2c-1`.
//! *   The user needs read/write access to the bus device (group `i2c`).

pub mod board;
pub mod bus;
pub mod channel;
pub mod consts;
mod error;
mod inputs;
mod led;
mod opto;
mod rs485;
mod wdt;

pub use board::{discover, Board, FirmwareVersion, StackId};
pub use bus::{LinuxI2cBus, MemoryBus, RegisterBus, RetryPolicy};
pub use channel::{EdgeMode, PwmFill};
pub use error::{Error, Result};
pub use led::LedMode;
pub use rs485::{ModbusSettings, Parity};
