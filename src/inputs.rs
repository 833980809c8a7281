//! Digital (legacy port) inputs.

use crate::board::Board;
use crate::bus::RegisterBus;
use crate::channel::{self, INPUT};
use crate::consts::reg;
use crate::error::Result;
use log::debug;

impl<B: RegisterBus> Board<B> {
    /// Reads all 16 inputs as one word; bit `c - 1` is set when input `c` is closed.
    ///
    /// The port is active-low, so the raw bytes are inverted before use.
    pub fn inputs_read(&mut self) -> Result<u16> {
        let raw = self.read_bytes::<2>(reg::INPUTS, reg::INPUTS.offset)?;
        let state = channel::decode_active_low(raw);
        debug!("{}: inputs raw={:02X?} state=0x{:04X}", self.stack(), raw, state);
        Ok(state)
    }

    /// Reads one input (1-16). `true` means closed / energized.
    pub fn input_read(&mut self, channel: u8) -> Result<bool> {
        let ch = INPUT.channel(channel)?;
        let state = self.inputs_read()?;
        Ok(channel::bit(state, ch))
    }
}
