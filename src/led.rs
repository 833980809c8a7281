//! General purpose LEDs, LED modes and the power LED.

use crate::board::Board;
use crate::bus::RegisterBus;
use crate::channel::{self, LED};
use crate::consts::{self, reg};
use crate::error::{out_of_range, Result};
use log::{debug, trace};

/// Width of one LED mode field in `LED_MODE`.
const LED_MODE_FIELD_BITS: u8 = 2;

/// Who drives a general purpose LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedMode {
    /// Firmware mirrors the matching input (0).
    Auto,
    /// Host controls the LED with `led_write` (1).
    Manual,
    /// Firmware-defined mode 2, accepted by the board but not documented.
    Reserved,
    /// Any other field value the firmware reports. Never written.
    Other(u8),
}

impl LedMode {
    /// Validates a mode given as a number (0-2).
    pub fn new(raw: u8) -> Result<Self> {
        match Self::from_raw(raw) {
            LedMode::Other(v) => Err(out_of_range(format!(
                "Led mode {} out of range [0..{}]",
                v,
                consts::LED_MODE_MAX
            ))),
            mode => Ok(mode),
        }
    }

    /// Decodes a register field without validation.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => LedMode::Auto,
            1 => LedMode::Manual,
            2 => LedMode::Reserved,
            other => LedMode::Other(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            LedMode::Auto => 0,
            LedMode::Manual => 1,
            LedMode::Reserved => 2,
            LedMode::Other(v) => v,
        }
    }
}

impl<B: RegisterBus> Board<B> {
    /// Reads all 8 LEDs; bit `n - 1` is LED `n`.
    pub fn leds_read(&mut self) -> Result<u8> {
        self.read_u8(reg::LEDS)
    }

    /// Reads one LED (1-8).
    pub fn led_read(&mut self, led: u8) -> Result<bool> {
        let ch = LED.channel(led)?;
        let leds = self.leds_read()?;
        Ok(channel::bit(u16::from(leds), ch))
    }

    /// Writes all 8 LEDs at once.
    pub fn leds_write(&mut self, mask: u8) -> Result<()> {
        debug!("{}: LEDs <- 0x{:02X}", self.stack(), mask);
        self.write_u8(reg::LEDS, mask)
    }

    /// Turns one LED (1-8) on or off through the set/clear registers, which take
    /// the LED number and leave the other LEDs alone.
    pub fn led_write(&mut self, led: u8, on: bool) -> Result<()> {
        let ch = LED.channel(led)?;
        let target = if on { reg::LED_SET } else { reg::LED_CLR };
        trace!("{}: {} <- {}", self.stack(), target.name, ch.number());
        self.write_u8(target, ch.number())
    }

    /// Reads the mode of one LED (1-8).
    pub fn led_mode(&mut self, led: u8) -> Result<LedMode> {
        let ch = LED.channel(led)?;
        let word = self.read_u16(reg::LED_MODE)?;
        Ok(LedMode::from_raw(channel::field(word, ch, LED_MODE_FIELD_BITS)))
    }

    /// Sets the mode of one LED (1-8), preserving the other LEDs' modes.
    /// `LedMode::Other` is rejected.
    pub fn set_led_mode(&mut self, led: u8, mode: LedMode) -> Result<()> {
        let ch = LED.channel(led)?;
        let mode = LedMode::new(mode.raw())?.raw();
        let current = self.read_u16(reg::LED_MODE)?;
        let updated = channel::with_field(current, ch, LED_MODE_FIELD_BITS, mode);
        debug!(
            "{}: led {} mode {} (0x{:04X} -> 0x{:04X})",
            self.stack(),
            ch.number(),
            mode,
            current,
            updated
        );
        self.write_u16(reg::LED_MODE, updated)
    }

    /// Reads the power LED mode (0-3).
    pub fn power_led_mode(&mut self) -> Result<u8> {
        self.read_u8(reg::PWR_LED_MODE)
    }

    /// Sets the power LED mode (0-3).
    pub fn set_power_led_mode(&mut self, mode: u8) -> Result<()> {
        if mode > consts::PWR_LED_MODE_MAX {
            return Err(out_of_range(format!(
                "Power led mode {} out of range [0..{}]",
                mode,
                consts::PWR_LED_MODE_MAX
            )));
        }
        self.write_u8(reg::PWR_LED_MODE, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::StackId;
    use crate::bus::MemoryBus;

    fn board() -> Board<MemoryBus> {
        Board::with_bus(StackId::new(1).unwrap(), MemoryBus::new())
    }

    #[test]
    fn test_led_mode_round_trip_preserves_siblings() {
        for led in 1..=consts::LED_CH_NO {
            for mode in 0..=consts::LED_MODE_MAX {
                let mut board = board();
                board.bus_mut().preload(reg::LED_MODE.offset, &0xAAAAu16.to_le_bytes());
                let mode = LedMode::new(mode).unwrap();
                board.set_led_mode(led, mode).unwrap();
                assert_eq!(board.led_mode(led).unwrap(), mode);

                let word = u16::from_le_bytes(
                    board.bus().peek(reg::LED_MODE.offset, 2).try_into().unwrap(),
                );
                let shift = 2 * (led - 1);
                let others = !(0x03u16 << shift);
                assert_eq!(word & others, 0xAAAA & others, "led {} mode {:?}", led, mode);
            }
        }
    }

    #[test]
    fn test_led_mode_rejects_bad_values_without_io() {
        let mut board = board();
        assert!(board
            .set_led_mode(1, LedMode::Other(3))
            .unwrap_err()
            .is_range_error());
        assert!(board
            .set_led_mode(0, LedMode::Manual)
            .unwrap_err()
            .is_range_error());
        assert!(board
            .set_led_mode(9, LedMode::Manual)
            .unwrap_err()
            .is_range_error());
        assert!(LedMode::new(3).unwrap_err().is_range_error());
        assert_eq!(board.bus().transfers(), 0);
    }

    #[test]
    fn test_led_write_uses_set_and_clear_registers() {
        let mut board = board();
        board.led_write(5, true).unwrap();
        assert_eq!(board.bus().peek(reg::LED_SET.offset, 1), &[5]);
        board.led_write(3, false).unwrap();
        assert_eq!(board.bus().peek(reg::LED_CLR.offset, 1), &[3]);
    }

    #[test]
    fn test_led_read() {
        let mut board = board();
        board.leds_write(0b1000_0101).unwrap();
        assert_eq!(board.leds_read().unwrap(), 0x85);
        assert!(board.led_read(1).unwrap());
        assert!(!board.led_read(2).unwrap());
        assert!(board.led_read(8).unwrap());
    }

    #[test]
    fn test_power_led_mode_writes_requested_value() {
        let mut board = board();
        board.set_power_led_mode(2).unwrap();
        assert_eq!(board.power_led_mode().unwrap(), 2);
        assert!(board.set_power_led_mode(4).unwrap_err().is_range_error());
        assert_eq!(board.bus().writes(), 1);
    }

    #[test]
    fn test_every_settable_mode_reads_back_as_written() {
        let mut board = board();
        for mode in [LedMode::Auto, LedMode::Manual, LedMode::Reserved] {
            board.set_led_mode(4, mode).unwrap();
            assert_eq!(board.led_mode(4).unwrap(), mode);
        }
        board
            .bus_mut()
            .preload(reg::LED_MODE.offset, &0x00C0u16.to_le_bytes());
        assert_eq!(board.led_mode(4).unwrap(), LedMode::Other(3));
    }
}
