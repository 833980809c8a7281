//! Raspberry Pi power watchdog.
//!
//! Once kicked, the watchdog must be reloaded within its period or it cuts the
//! Pi's power for the off interval and restores it afterwards. The init period
//! applies to the first expiry after power is restored.

use crate::board::Board;
use crate::bus::RegisterBus;
use crate::consts::{self, reg};
use crate::error::{out_of_range, Result};
use log::{debug, info};

impl<B: RegisterBus> Board<B> {
    /// Reloads (and enables) the watchdog.
    pub fn watchdog_reload(&mut self) -> Result<()> {
        debug!("{}: watchdog reload", self.stack());
        self.write_u8(reg::WDT_RESET, consts::WDT_RESET_SIGNATURE)
    }

    /// Active period in seconds.
    pub fn watchdog_period(&mut self) -> Result<u16> {
        self.read_u16(reg::WDT_INTERVAL_GET)
    }

    pub fn set_watchdog_period(&mut self, seconds: u16) -> Result<()> {
        if seconds == 0 {
            return Err(out_of_range("Watchdog period must be greater than 0 s"));
        }
        self.write_u16(reg::WDT_INTERVAL_SET, seconds)
    }

    /// Period in seconds used after the Pi has been repowered.
    pub fn watchdog_init_period(&mut self) -> Result<u16> {
        self.read_u16(reg::WDT_INIT_INTERVAL_GET)
    }

    pub fn set_watchdog_init_period(&mut self, seconds: u16) -> Result<()> {
        if seconds == 0 {
            return Err(out_of_range(
                "Watchdog initial period must be greater than 0 s",
            ));
        }
        self.write_u16(reg::WDT_INIT_INTERVAL_SET, seconds)
    }

    /// How long the Pi stays unpowered after an expiry, in seconds.
    pub fn watchdog_off_period(&mut self) -> Result<u32> {
        self.read_u32(reg::WDT_POWER_OFF_INTERVAL_GET)
    }

    /// Sets the off interval, 1 s up to `WDT_MAX_OFF_INTERVAL_S`.
    pub fn set_watchdog_off_period(&mut self, seconds: u32) -> Result<()> {
        if !(1..=consts::WDT_MAX_OFF_INTERVAL_S).contains(&seconds) {
            return Err(out_of_range(format!(
                "Watchdog off period {} s out of range [1..{}]",
                seconds,
                consts::WDT_MAX_OFF_INTERVAL_S
            )));
        }
        self.write_u32(reg::WDT_POWER_OFF_INTERVAL_SET, seconds)
    }

    /// Number of times the watchdog has repowered the Pi.
    pub fn watchdog_reset_count(&mut self) -> Result<u16> {
        self.read_u16(reg::WDT_RESET_COUNT)
    }

    pub fn clear_watchdog_reset_count(&mut self) -> Result<()> {
        info!("{}: clearing watchdog reset count", self.stack());
        self.write_u8(
            reg::WDT_CLEAR_RESET_COUNT,
            consts::WDT_RESET_COUNT_SIGNATURE,
        )
    }
}
