//! Channel numbering and the bit-level codec shared by the feature accessors.
//!
//! Channels are 1-based everywhere in the public API. Channel `c` maps to bit
//! `c - 1` of a bitmask register, to the 2-bit field at shift `2 * (c - 1)` of a
//! field register, and to element `c - 1` of an array register.

use crate::consts::{self, Register};
use crate::error::{Error, Result};

/// Channel range of one board feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelKind {
    /// Name used in error messages.
    pub name: &'static str,
    /// Number of channels; valid channels are `1..=count`.
    pub count: u8,
}

/// 16 digital (legacy port) inputs.
pub const INPUT: ChannelKind = ChannelKind {
    name: "Input",
    count: consts::IN_CH_NO,
};
/// 8 general purpose LEDs.
pub const LED: ChannelKind = ChannelKind {
    name: "Led",
    count: consts::LED_CH_NO,
};
/// 16 optocoupled inputs.
pub const OPTO: ChannelKind = ChannelKind {
    name: "Optocoupled",
    count: consts::OPTO_CH_NO,
};
/// 8 quadrature encoders, each built from two opto inputs.
pub const OPTO_ENCODER: ChannelKind = ChannelKind {
    name: "Optocoupled encoder",
    count: consts::OPTO_ENC_CH_NO,
};

impl ChannelKind {
    /// Validates a 1-based channel number. Does no I/O.
    pub fn channel(&self, number: u8) -> Result<Channel> {
        if (consts::MIN_CH_NO..=self.count).contains(&number) {
            Ok(Channel(number))
        } else {
            Err(Error::ChannelOutOfRange {
                feature: self.name,
                channel: number,
                min: consts::MIN_CH_NO,
                max: self.count,
            })
        }
    }
}

/// A validated 1-based channel number.
/// Use [`ChannelKind::channel`] to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Returns the 1-based channel number.
    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Returns the zero-based bit / element index.
    #[inline]
    pub fn index(&self) -> u8 {
        self.0 - 1
    }

    /// Returns the bit mask (1 << index) for bitmask registers.
    #[inline]
    pub fn mask(&self) -> u16 {
        1u16 << self.index()
    }

    /// Offset of this channel's element inside an array register.
    #[inline]
    pub fn offset_in(&self, register: Register) -> u8 {
        register.element(self.index())
    }
}

/// Reassembles an active-low input port into logical states (1 = closed).
#[inline]
pub fn decode_active_low(raw: [u8; 2]) -> u16 {
    u16::from(!raw[0]) | (u16::from(!raw[1]) << 8)
}

#[inline]
pub fn bit(word: u16, channel: Channel) -> bool {
    word & channel.mask() != 0
}

/// Returns `word` with the channel's bit set or cleared; other bits untouched.
#[inline]
pub fn with_bit(word: u16, channel: Channel, on: bool) -> u16 {
    if on {
        word | channel.mask()
    } else {
        word & !channel.mask()
    }
}

/// Extracts the `width`-bit field of `channel` from a packed register.
#[inline]
pub fn field(word: u16, channel: Channel, width: u8) -> u8 {
    let shift = width * channel.index();
    let mask = (1u16 << width) - 1;
    ((word >> shift) & mask) as u8
}

/// Replaces the `width`-bit field of `channel`, preserving sibling fields.
/// Bits of `value` beyond `width` are discarded.
#[inline]
pub fn with_field(word: u16, channel: Channel, width: u8, value: u8) -> u16 {
    let shift = width * channel.index();
    let mask = ((1u16 << width) - 1) << shift;
    (word & !mask) | ((u16::from(value) << shift) & mask)
}

/// Which input transitions an opto channel counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMode {
    /// Counting disabled.
    None,
    Rising,
    Falling,
    Both,
}

impl EdgeMode {
    /// Decodes the numeric form used on the command line (0-3).
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(EdgeMode::None),
            1 => Ok(EdgeMode::Rising),
            2 => Ok(EdgeMode::Falling),
            3 => Ok(EdgeMode::Both),
            other => Err(Error::ArgumentOutOfRange(format!(
                "Invalid edge counting type {} [0..3]",
                other
            ))),
        }
    }

    /// Numeric form: bit 0 = rising, bit 1 = falling.
    pub fn bits(self) -> u8 {
        match self {
            EdgeMode::None => 0,
            EdgeMode::Rising => 1,
            EdgeMode::Falling => 2,
            EdgeMode::Both => 3,
        }
    }

    #[inline]
    pub fn rising(self) -> bool {
        self.bits() & 0x01 != 0
    }

    #[inline]
    pub fn falling(self) -> bool {
        self.bits() & 0x02 != 0
    }

    /// Reads the channel's mode out of the 4-byte rising/falling block.
    pub fn decode(block: [u8; 4], channel: Channel) -> Self {
        let (rising, falling) = split_edge_block(block);
        match (bit(rising, channel), bit(falling, channel)) {
            (false, false) => EdgeMode::None,
            (true, false) => EdgeMode::Rising,
            (false, true) => EdgeMode::Falling,
            (true, true) => EdgeMode::Both,
        }
    }

    /// Writes the channel's mode into the 4-byte rising/falling block.
    pub fn apply(self, block: [u8; 4], channel: Channel) -> [u8; 4] {
        let (rising, falling) = split_edge_block(block);
        let rising = with_bit(rising, channel, self.rising());
        let falling = with_bit(falling, channel, self.falling());
        join_edge_block(rising, falling)
    }
}

impl std::str::FromStr for EdgeMode {
    type Err = Error;

    /// Accepts `none`, `up`/`rising`, `down`/`falling`, `both` (any case) or 0-3.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "none" => Ok(EdgeMode::None),
            "up" | "rising" => Ok(EdgeMode::Rising),
            "down" | "falling" => Ok(EdgeMode::Falling),
            "both" => Ok(EdgeMode::Both),
            _ => match lower.parse::<u8>() {
                Ok(bits) => EdgeMode::from_bits(bits),
                Err(_) => Err(Error::ArgumentOutOfRange(format!(
                    "Invalid edge counting type '{}' [0..3]",
                    s
                ))),
            },
        }
    }
}

fn split_edge_block(block: [u8; 4]) -> (u16, u16) {
    (
        u16::from_le_bytes([block[0], block[1]]),
        u16::from_le_bytes([block[2], block[3]]),
    )
}

fn join_edge_block(rising: u16, falling: u16) -> [u8; 4] {
    let r = rising.to_le_bytes();
    let f = falling.to_le_bytes();
    [r[0], r[1], f[0], f[1]]
}

/// Measured PWM fill factor of an opto input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmFill {
    /// Register value, `PWM_FILL_FULL_SCALE` means 100 %.
    pub raw: u16,
}

impl PwmFill {
    /// Fill factor in percent.
    pub fn percent(&self) -> f32 {
        f32::from(self.raw) * 100.0 / f32::from(consts::PWM_FILL_FULL_SCALE)
    }
}

impl std::fmt::Display for PwmFill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_range_validation() {
        assert!(OPTO.channel(0).is_err());
        assert!(OPTO.channel(1).is_ok());
        assert!(OPTO.channel(16).is_ok());
        assert!(OPTO.channel(17).is_err());
        assert!(OPTO_ENCODER.channel(8).is_ok());
        assert!(OPTO_ENCODER.channel(9).is_err());
        assert!(LED.channel(9).is_err());
        match INPUT.channel(17) {
            Err(Error::ChannelOutOfRange {
                channel, min, max, ..
            }) => {
                assert_eq!((channel, min, max), (17, 1, 16));
            }
            other => panic!("Expected ChannelOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_channel_helpers() {
        let ch = OPTO.channel(16).unwrap();
        assert_eq!(ch.number(), 16);
        assert_eq!(ch.index(), 15);
        assert_eq!(ch.mask(), 0x8000);
        assert_eq!(
            ch.offset_in(consts::reg::OPTO_EDGE_COUNT),
            consts::reg::OPTO_EDGE_COUNT.offset + 60
        );
    }

    #[test]
    fn test_active_low_decode() {
        assert_eq!(decode_active_low([0xFE, 0xFF]), 0x0001);
        assert_eq!(decode_active_low([0xFF, 0x7F]), 0x8000);
        assert_eq!(decode_active_low([0x00, 0x00]), 0xFFFF);
        assert_eq!(decode_active_low([0xFF, 0xFF]), 0x0000);
    }

    #[test]
    fn test_two_bit_fields() {
        let ch3 = LED.channel(3).unwrap();
        let word = with_field(0xAAAA, ch3, 2, 1);
        assert_eq!(word, 0xAA9A);
        assert_eq!(field(word, ch3, 2), 1);
        // Oversized values are clipped to the field.
        assert_eq!(with_field(0x0000, ch3, 2, 0xFF), 0x0030);
    }

    #[test]
    fn test_edge_mode_parsing() {
        assert_eq!("NONE".parse::<EdgeMode>().unwrap(), EdgeMode::None);
        assert_eq!("up".parse::<EdgeMode>().unwrap(), EdgeMode::Rising);
        assert_eq!("Falling".parse::<EdgeMode>().unwrap(), EdgeMode::Falling);
        assert_eq!("3".parse::<EdgeMode>().unwrap(), EdgeMode::Both);
        assert!("4".parse::<EdgeMode>().is_err());
        assert!("sideways".parse::<EdgeMode>().is_err());
    }

    #[test]
    fn test_edge_block_apply() {
        let ch2 = OPTO.channel(2).unwrap();
        let block = EdgeMode::Both.apply([0, 0, 0, 0], ch2);
        assert_eq!(block, [0x02, 0x00, 0x02, 0x00]);
        let block = EdgeMode::Falling.apply(block, ch2);
        assert_eq!(block, [0x00, 0x00, 0x02, 0x00]);
        assert_eq!(EdgeMode::decode(block, ch2), EdgeMode::Falling);
    }

    #[test]
    fn test_pwm_fill_display() {
        assert_eq!(PwmFill { raw: 5000 }.to_string(), "50.00");
        assert_eq!(PwmFill { raw: 10_000 }.to_string(), "100.00");
        assert_eq!(PwmFill { raw: 1234 }.to_string(), "12.34");
    }
}
