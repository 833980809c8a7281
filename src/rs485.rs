//! RS485 port / Modbus RTU slave configuration.

use crate::board::Board;
use crate::bus::RegisterBus;
use crate::consts::{modbus, reg};
use crate::error::{out_of_range, Result};
use log::debug;
use std::fmt;

/// Serial parity of the Modbus link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl Parity {
    pub fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Parity::None),
            1 => Ok(Parity::Odd),
            2 => Ok(Parity::Even),
            other => Err(out_of_range(format!(
                "Parity {} must be [0/1/2]; 0=none, 1=odd, 2=even",
                other
            ))),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Parity::None => 0,
            Parity::Odd => 1,
            Parity::Even => 2,
        }
    }
}

/// Contents of the 5-byte Modbus settings block.
///
/// Field widths: baud 24 bits, type 4 bits, parity 2 bits, stop bits 2 bits,
/// slave address 8 bits. With `mb_type == 0` the RS485 transceiver is released
/// to the Raspberry Pi serial port and the remaining fields are firmware defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModbusSettings {
    pub mb_type: u8,
    pub baud: u32,
    pub parity: u8,
    pub stop_bits: u8,
    pub address: u8,
}

impl ModbusSettings {
    /// Settings that hand the port over to the host.
    pub fn disabled() -> Self {
        ModbusSettings {
            mb_type: modbus::TYPE_DISABLED,
            baud: modbus::DEFAULT_BAUD,
            parity: modbus::DEFAULT_PARITY,
            stop_bits: modbus::DEFAULT_STOP_BITS,
            address: modbus::DEFAULT_ADDRESS,
        }
    }

    /// Modbus RTU slave settings, validated.
    pub fn rtu(address: u8, baud: u32, stop_bits: u8, parity: Parity) -> Result<Self> {
        let settings = ModbusSettings {
            mb_type: modbus::TYPE_RTU,
            baud,
            parity: parity.raw(),
            stop_bits,
            address,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn is_enabled(&self) -> bool {
        self.mb_type != modbus::TYPE_DISABLED
    }

    /// Checks the fields the firmware accepts. Disabled settings are not checked.
    pub fn validate(&self) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        if self.mb_type != modbus::TYPE_RTU {
            return Err(out_of_range(format!(
                "Modbus mode {} must be [0/1]; 0=disable, 1=Modbus RTU",
                self.mb_type
            )));
        }
        if !(modbus::ADDRESS_MIN..=modbus::ADDRESS_MAX).contains(&self.address) {
            return Err(out_of_range(format!(
                "Modbus ID {} must be [{}..{}]",
                self.address,
                modbus::ADDRESS_MIN,
                modbus::ADDRESS_MAX
            )));
        }
        if !(modbus::BAUD_MIN..=modbus::BAUD_MAX).contains(&self.baud) {
            return Err(out_of_range(format!(
                "Baudrate {} must be [{}..{}]",
                self.baud,
                modbus::BAUD_MIN,
                modbus::BAUD_MAX
            )));
        }
        if !(modbus::STOP_BITS_MIN..=modbus::STOP_BITS_MAX).contains(&self.stop_bits) {
            return Err(out_of_range(format!(
                "Stop bits {} must be [1/2]",
                self.stop_bits
            )));
        }
        Parity::from_raw(self.parity)?;
        Ok(())
    }

    /// Packs the settings into the on-device block. Oversized fields are
    /// truncated to their bit width.
    pub fn encode(&self) -> [u8; 5] {
        let baud = (self.baud & modbus::BAUD_MASK).to_le_bytes();
        let flags = (self.mb_type & modbus::TYPE_MASK)
            | ((self.parity & modbus::PARITY_MASK) << modbus::PARITY_SHIFT)
            | ((self.stop_bits & modbus::STOP_BITS_MASK) << modbus::STOP_BITS_SHIFT);
        [baud[0], baud[1], baud[2], flags, self.address]
    }

    /// Unpacks the on-device block.
    pub fn decode(raw: [u8; 5]) -> Self {
        let flags = raw[3];
        ModbusSettings {
            baud: u32::from_le_bytes([raw[0], raw[1], raw[2], 0]),
            mb_type: flags & modbus::TYPE_MASK,
            parity: (flags >> modbus::PARITY_SHIFT) & modbus::PARITY_MASK,
            stop_bits: (flags >> modbus::STOP_BITS_SHIFT) & modbus::STOP_BITS_MASK,
            address: raw[4],
        }
    }
}

impl fmt::Display for ModbusSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_enabled() {
            write!(
                f,
                "Modbus RTU slave enabled,Id: {}, BR: {}, stopB: {}, parity: {}",
                self.address, self.baud, self.stop_bits, self.parity
            )
        } else {
            write!(
                f,
                "RS485 port disconnected from local processor and can be used with Raspberry Pi Serial port"
            )
        }
    }
}

impl<B: RegisterBus> Board<B> {
    /// Reads the RS485 / Modbus configuration.
    pub fn modbus_settings(&mut self) -> Result<ModbusSettings> {
        let raw = self.read_bytes::<5>(reg::MODBUS_SETTINGS, reg::MODBUS_SETTINGS.offset)?;
        Ok(ModbusSettings::decode(raw))
    }

    /// Writes the RS485 / Modbus configuration after validating it.
    pub fn set_modbus_settings(&mut self, settings: &ModbusSettings) -> Result<()> {
        settings.validate()?;
        let raw = settings.encode();
        debug!("{}: modbus {:?} -> {:02X?}", self.stack(), settings, raw);
        self.write_bytes(reg::MODBUS_SETTINGS, reg::MODBUS_SETTINGS.offset, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout() {
        let settings = ModbusSettings {
            mb_type: 1,
            baud: 19_200,
            parity: 2,
            stop_bits: 1,
            address: 5,
        };
        // 19200 = 0x004B00; flags = 1 | 2 << 4 | 1 << 6 = 0x61
        assert_eq!(settings.encode(), [0x00, 0x4B, 0x00, 0x61, 0x05]);
        assert_eq!(ModbusSettings::decode(settings.encode()), settings);
    }

    #[test]
    fn test_max_baud_uses_all_three_bytes() {
        let settings = ModbusSettings::rtu(254, 115_200, 2, Parity::Odd).unwrap();
        let raw = settings.encode();
        assert_eq!(&raw[..3], &[0x00, 0xC2, 0x01]);
        assert_eq!(raw[3], 0x01 | (1 << 4) | (2 << 6));
        assert_eq!(ModbusSettings::decode(raw), settings);
    }

    #[test]
    fn test_validation() {
        assert!(ModbusSettings::rtu(0, 9600, 1, Parity::None).is_err());
        assert!(ModbusSettings::rtu(255, 9600, 1, Parity::None).is_err());
        assert!(ModbusSettings::rtu(1, 1199, 1, Parity::None).is_err());
        assert!(ModbusSettings::rtu(1, 115_201, 1, Parity::None).is_err());
        assert!(ModbusSettings::rtu(1, 9600, 3, Parity::None).is_err());
        assert!(ModbusSettings::rtu(1, 9600, 2, Parity::Even).is_ok());
        assert!(ModbusSettings::disabled().validate().is_ok());
        assert!(Parity::from_raw(3).is_err());
    }

    #[test]
    fn test_display() {
        assert!(ModbusSettings::disabled()
            .to_string()
            .starts_with("RS485 port disconnected"));
        let rtu = ModbusSettings::rtu(1, 9600, 1, Parity::None).unwrap();
        assert_eq!(
            rtu.to_string(),
            "Modbus RTU slave enabled,Id: 1, BR: 9600, stopB: 1, parity: 0"
        );
    }
}
