//! Optocoupled inputs: state, edge counting, quadrature encoders, frequency and
//! PWM fill measurement, interrupt generation.

use crate::board::Board;
use crate::bus::RegisterBus;
use crate::channel::{self, EdgeMode, PwmFill, OPTO, OPTO_ENCODER};
use crate::consts::reg;
use crate::error::Result;
use log::{debug, trace};

impl<B: RegisterBus> Board<B> {
    // --- Input state ---
    /// Reads all 16 opto inputs (active-high); bit `c - 1` is channel `c`.
    pub fn opto_read(&mut self) -> Result<u16> {
        self.read_u16(reg::OPTO)
    }

    /// Reads one opto input (1-16).
    pub fn opto_channel_read(&mut self, channel: u8) -> Result<bool> {
        let ch = OPTO.channel(channel)?;
        let word = self.opto_read()?;
        Ok(channel::bit(word, ch))
    }

    // --- Edge counting ---
    /// Reads which edges channel (1-16) counts.
    pub fn opto_edge(&mut self, channel: u8) -> Result<EdgeMode> {
        let ch = OPTO.channel(channel)?;
        let block = self.read_bytes::<4>(reg::OPTO_IT_RISING, reg::OPTO_IT_RISING.offset)?;
        Ok(EdgeMode::decode(block, ch))
    }

    /// Selects which edges channel (1-16) counts.
    ///
    /// The rising and falling enable words are read and written back together;
    /// other channels keep their configuration.
    pub fn set_opto_edge(&mut self, channel: u8, mode: EdgeMode) -> Result<()> {
        let ch = OPTO.channel(channel)?;
        let block = self.read_bytes::<4>(reg::OPTO_IT_RISING, reg::OPTO_IT_RISING.offset)?;
        let updated = mode.apply(block, ch);
        debug!(
            "{}: opto {} edges {:?} ({:02X?} -> {:02X?})",
            self.stack(),
            ch.number(),
            mode,
            block,
            updated
        );
        self.write_bytes(reg::OPTO_IT_RISING, reg::OPTO_IT_RISING.offset, &updated)
    }

    /// Reads the edge counter of channel (1-16).
    pub fn opto_count(&mut self, channel: u8) -> Result<u32> {
        let ch = OPTO.channel(channel)?;
        self.read_u32_at(reg::OPTO_EDGE_COUNT, ch.offset_in(reg::OPTO_EDGE_COUNT))
    }

    /// Zeroes the edge counter of channel (1-16); the firmware resets the
    /// counter whose number is written to the reset register.
    pub fn reset_opto_count(&mut self, channel: u8) -> Result<()> {
        let ch = OPTO.channel(channel)?;
        self.write_u8(reg::OPTO_CNT_RST, ch.number())
    }

    // --- Quadrature encoders ---
    /// Reports whether encoder (1-8) is enabled. Encoder `n` uses opto
    /// channels `2n - 1` and `2n`.
    pub fn opto_encoder_enabled(&mut self, encoder: u8) -> Result<bool> {
        let ch = OPTO_ENCODER.channel(encoder)?;
        let enabled = self.read_u8(reg::OPTO_ENC_ENABLE)?;
        Ok(channel::bit(u16::from(enabled), ch))
    }

    /// Enables or disables encoder (1-8).
    pub fn set_opto_encoder_enabled(&mut self, encoder: u8, enable: bool) -> Result<()> {
        let ch = OPTO_ENCODER.channel(encoder)?;
        let current = self.read_u8(reg::OPTO_ENC_ENABLE)?;
        let updated = channel::with_bit(u16::from(current), ch, enable) as u8;
        if updated != current {
            debug!("{}: encoder {} enable {}", self.stack(), ch.number(), enable);
        } else {
            trace!("{}: encoder {} already {}", self.stack(), ch.number(), enable);
        }
        self.write_u8(reg::OPTO_ENC_ENABLE, updated)
    }

    /// Reads the signed count of encoder (1-8).
    pub fn opto_encoder_count(&mut self, encoder: u8) -> Result<i32> {
        let ch = OPTO_ENCODER.channel(encoder)?;
        let raw = self.read_u32_at(reg::OPTO_ENC_COUNT, ch.offset_in(reg::OPTO_ENC_COUNT))?;
        Ok(raw as i32)
    }

    /// Zeroes the count of encoder (1-8).
    pub fn reset_opto_encoder_count(&mut self, encoder: u8) -> Result<()> {
        let ch = OPTO_ENCODER.channel(encoder)?;
        self.write_u8(reg::OPTO_ENC_CNT_RST, ch.number())
    }

    // --- Signal measurement ---
    /// Frequency in Hz of the signal on channel (1-16).
    pub fn opto_frequency(&mut self, channel: u8) -> Result<u16> {
        let ch = OPTO.channel(channel)?;
        self.read_u16_at(reg::IN_FREQUENCY, ch.offset_in(reg::IN_FREQUENCY))
    }

    /// PWM fill factor of the signal on channel (1-16).
    pub fn opto_pwm_fill(&mut self, channel: u8) -> Result<PwmFill> {
        let ch = OPTO.channel(channel)?;
        let raw = self.read_u16_at(reg::PWM_IN_FILL, ch.offset_in(reg::PWM_IN_FILL))?;
        Ok(PwmFill { raw })
    }

    // --- Interrupt generation ---
    /// Reads the interrupt enable bitmap of all 16 channels.
    pub fn opto_interrupt_mask(&mut self) -> Result<u16> {
        self.read_u16(reg::EXTI_EN)
    }

    /// Overwrites the whole interrupt enable bitmap. No read-back, no per-channel
    /// validation: every 16-bit value is a valid bitmap.
    pub fn set_opto_interrupt_mask(&mut self, mask: u16) -> Result<()> {
        debug!("{}: interrupt enable <- 0x{:04X}", self.stack(), mask);
        self.write_u16(reg::EXTI_EN, mask)
    }

    /// Reports whether channel (1-16) generates interrupts on change.
    pub fn opto_interrupt_enabled(&mut self, channel: u8) -> Result<bool> {
        let ch = OPTO.channel(channel)?;
        let mask = self.opto_interrupt_mask()?;
        Ok(channel::bit(mask, ch))
    }

    /// Enables or disables interrupt generation for one channel (1-16).
    pub fn set_opto_interrupt(&mut self, channel: u8, enable: bool) -> Result<()> {
        let ch = OPTO.channel(channel)?;
        let current = self.opto_interrupt_mask()?;
        let updated = channel::with_bit(current, ch, enable);
        self.write_u16(reg::EXTI_EN, updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::StackId;
    use crate::bus::MemoryBus;
    use approx::assert_relative_eq;

    fn board() -> Board<MemoryBus> {
        Board::with_bus(StackId::new(3).unwrap(), MemoryBus::new())
    }

    #[test]
    fn test_opto_read_is_active_high_little_endian() {
        let mut board = board();
        board.bus_mut().preload(reg::OPTO.offset, &[0x01, 0x80]);
        assert_eq!(board.opto_read().unwrap(), 0x8001);
        assert!(board.opto_channel_read(1).unwrap());
        assert!(board.opto_channel_read(16).unwrap());
        assert!(!board.opto_channel_read(2).unwrap());
    }

    #[test]
    fn test_counter_uses_per_channel_stride() {
        let mut board = board();
        let offset = reg::OPTO_EDGE_COUNT.offset + 4 * 2;
        board.bus_mut().preload(offset, &0x0102_0304u32.to_le_bytes());
        assert_eq!(board.opto_count(3).unwrap(), 0x0102_0304);
        assert_eq!(board.opto_count(2).unwrap(), 0);
    }

    #[test]
    fn test_counter_reset_writes_channel_number() {
        let mut board = board();
        board.reset_opto_count(12).unwrap();
        assert_eq!(board.bus().peek(reg::OPTO_CNT_RST.offset, 1), &[12]);
        board.reset_opto_encoder_count(4).unwrap();
        assert_eq!(board.bus().peek(reg::OPTO_ENC_CNT_RST.offset, 1), &[4]);
    }

    #[test]
    fn test_encoder_count_is_signed() {
        let mut board = board();
        let offset = reg::OPTO_ENC_COUNT.offset + 4 * 7;
        board.bus_mut().preload(offset, &(-42i32).to_le_bytes());
        assert_eq!(board.opto_encoder_count(8).unwrap(), -42);
        assert!(board.opto_encoder_count(9).unwrap_err().is_range_error());
    }

    #[test]
    fn test_encoder_enable_bits() {
        let mut board = board();
        board.bus_mut().preload(reg::OPTO_ENC_ENABLE.offset, &[0b0000_0001]);
        board.set_opto_encoder_enabled(8, true).unwrap();
        board.set_opto_encoder_enabled(1, false).unwrap();
        assert_eq!(board.bus().peek(reg::OPTO_ENC_ENABLE.offset, 1), &[0x80]);
        assert!(board.opto_encoder_enabled(8).unwrap());
        assert!(!board.opto_encoder_enabled(1).unwrap());
    }

    #[test]
    fn test_frequency_and_pwm_fill() {
        let mut board = board();
        board
            .bus_mut()
            .preload(reg::IN_FREQUENCY.offset + 2, &1000u16.to_le_bytes());
        board
            .bus_mut()
            .preload(reg::PWM_IN_FILL.offset + 2 * 15, &5000u16.to_le_bytes());
        assert_eq!(board.opto_frequency(2).unwrap(), 1000);
        let fill = board.opto_pwm_fill(16).unwrap();
        assert_eq!(fill.raw, 5000);
        assert_relative_eq!(fill.percent(), 50.0);
        assert_eq!(fill.to_string(), "50.00");
    }

    #[test]
    fn test_interrupt_single_and_bulk_paths() {
        let mut board = board();
        board.set_opto_interrupt_mask(0xF00F).unwrap();
        board.set_opto_interrupt(1, false).unwrap();
        board.set_opto_interrupt(5, true).unwrap();
        assert_eq!(board.opto_interrupt_mask().unwrap(), 0xF01E);
        assert!(board.opto_interrupt_enabled(16).unwrap());
        assert!(!board.opto_interrupt_enabled(1).unwrap());
    }
}
