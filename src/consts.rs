//! Board register map: I2C addressing, register offsets, widths and strides,
//! magic signatures and value limits.

// --- Addressing ---
/// Hardware base address of the first board in a stack (before XOR folding).
pub const BASE_ADDRESS: u8 = 0x20;
/// Stack id is folded into the address with this XOR mask.
pub const STACK_ADDRESS_XOR: u8 = 0x07;
/// Highest stack level that can be selected with the address jumpers.
pub const STACK_ID_MAX: u8 = 7;

/// Default Linux I2C bus device on a Raspberry Pi (GPIO 2/3).
pub const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";
/// Bounded retry count for transient bus failures.
pub const RETRY_TIMES: u32 = 10;
/// Pause between retries, in milliseconds.
pub const RETRY_DELAY_MS: u64 = 2;

// --- Channel counts ---
pub const MIN_CH_NO: u8 = 1;
pub const IN_CH_NO: u8 = 16;
pub const LED_CH_NO: u8 = 8;
pub const OPTO_CH_NO: u8 = 16;
pub const OPTO_ENC_CH_NO: u8 = OPTO_CH_NO / 2;

// --- Element sizes of array-style registers ---
pub const COUNTER_SIZE: u8 = 4;
pub const OPTO_FREQUENCY_DATA_SIZE: u8 = 2;
pub const MODBUS_SETTINGS_SIZE: u8 = 5;

/// One entry of the on-device register table.
///
/// `stride` is zero for scalar registers; array registers hold one element of
/// `width` bytes per channel at `offset + stride * (channel - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub name: &'static str,
    pub offset: u8,
    pub width: u8,
    pub stride: u8,
}

impl Register {
    const fn scalar(name: &'static str, offset: u8, width: u8) -> Self {
        Register {
            name,
            offset,
            width,
            stride: 0,
        }
    }

    const fn array(name: &'static str, offset: u8, width: u8) -> Self {
        Register {
            name,
            offset,
            width,
            stride: width,
        }
    }

    /// Offset of the element belonging to `index0` (zero-based).
    #[inline]
    pub const fn element(&self, index0: u8) -> u8 {
        self.offset + self.stride * index0
    }
}

/// Register offsets. The firmware packs registers back to back, so each offset
/// is derived from the previous register and its size.
pub mod reg {
    use super::*;

    // Legacy input port, active-low, two bytes.
    pub const INPUTS: Register = Register::scalar("inputs", 0x00, 2);
    pub const OPTO: Register = Register::scalar("opto", INPUTS.offset + 2, 2);
    pub const OPTO_IT_RISING: Register = Register::scalar("opto_it_rising", OPTO.offset + 2, 2);
    pub const OPTO_IT_FALLING: Register =
        Register::scalar("opto_it_falling", OPTO_IT_RISING.offset + 2, 2);
    pub const LED_MODE: Register = Register::scalar("led_mode", OPTO_IT_FALLING.offset + 2, 2);
    pub const LEDS: Register = Register::scalar("leds", LED_MODE.offset + 2, 1);
    pub const LED_SET: Register = Register::scalar("led_set", LEDS.offset + 1, 1);
    pub const LED_CLR: Register = Register::scalar("led_clr", LED_SET.offset + 1, 1);
    pub const PWR_LED_MODE: Register = Register::scalar("pwr_led_mode", LED_CLR.offset + 1, 1);
    pub const OPTO_ENC_ENABLE: Register =
        Register::scalar("opto_enc_enable", PWR_LED_MODE.offset + 1, 1);
    pub const OPTO_CNT_RST: Register =
        Register::scalar("opto_cnt_rst", OPTO_ENC_ENABLE.offset + 1, 1);
    pub const OPTO_ENC_CNT_RST: Register =
        Register::scalar("opto_enc_cnt_rst", OPTO_CNT_RST.offset + 1, 1);
    pub const EXTI_EN: Register = Register::scalar("exti_en", OPTO_ENC_CNT_RST.offset + 1, 2);

    pub const WDT_RESET: Register = Register::scalar("wdt_reset", EXTI_EN.offset + 2, 1);
    pub const WDT_INTERVAL_SET: Register =
        Register::scalar("wdt_interval_set", WDT_RESET.offset + 1, 2);
    pub const WDT_INTERVAL_GET: Register =
        Register::scalar("wdt_interval_get", WDT_INTERVAL_SET.offset + 2, 2);
    pub const WDT_INIT_INTERVAL_SET: Register =
        Register::scalar("wdt_init_interval_set", WDT_INTERVAL_GET.offset + 2, 2);
    pub const WDT_INIT_INTERVAL_GET: Register =
        Register::scalar("wdt_init_interval_get", WDT_INIT_INTERVAL_SET.offset + 2, 2);
    pub const WDT_RESET_COUNT: Register =
        Register::scalar("wdt_reset_count", WDT_INIT_INTERVAL_GET.offset + 2, 2);
    pub const WDT_CLEAR_RESET_COUNT: Register =
        Register::scalar("wdt_clear_reset_count", WDT_RESET_COUNT.offset + 2, 1);
    pub const WDT_POWER_OFF_INTERVAL_SET: Register =
        Register::scalar("wdt_power_off_interval_set", WDT_CLEAR_RESET_COUNT.offset + 1, 4);
    pub const WDT_POWER_OFF_INTERVAL_GET: Register = Register::scalar(
        "wdt_power_off_interval_get",
        WDT_POWER_OFF_INTERVAL_SET.offset + 4,
        4,
    );

    pub const OPTO_EDGE_COUNT: Register = Register::array(
        "opto_edge_count",
        WDT_POWER_OFF_INTERVAL_GET.offset + 4,
        COUNTER_SIZE,
    );
    pub const OPTO_ENC_COUNT: Register = Register::array(
        "opto_enc_count",
        OPTO_EDGE_COUNT.offset + COUNTER_SIZE * OPTO_CH_NO,
        COUNTER_SIZE,
    );
    pub const IN_FREQUENCY: Register = Register::array(
        "in_frequency",
        OPTO_ENC_COUNT.offset + COUNTER_SIZE * OPTO_ENC_CH_NO,
        OPTO_FREQUENCY_DATA_SIZE,
    );
    pub const PWM_IN_FILL: Register = Register::array(
        "pwm_in_fill",
        IN_FREQUENCY.offset + OPTO_FREQUENCY_DATA_SIZE * OPTO_CH_NO,
        OPTO_FREQUENCY_DATA_SIZE,
    );
    pub const MODBUS_SETTINGS: Register = Register::scalar(
        "modbus_settings",
        PWM_IN_FILL.offset + OPTO_FREQUENCY_DATA_SIZE * OPTO_CH_NO,
        MODBUS_SETTINGS_SIZE,
    );
    pub const REVISION_MAJOR: Register = Register::scalar(
        "revision_major",
        MODBUS_SETTINGS.offset + MODBUS_SETTINGS_SIZE,
        1,
    );
    pub const REVISION_MINOR: Register =
        Register::scalar("revision_minor", REVISION_MAJOR.offset + 1, 1);
}

// --- Magic values ---
/// Written to `WDT_RESET` to kick (and enable) the watchdog.
pub const WDT_RESET_SIGNATURE: u8 = 0xCA;
/// Written to `WDT_CLEAR_RESET_COUNT` to zero the repower counter.
pub const WDT_RESET_COUNT_SIGNATURE: u8 = 0xBE;

// --- Value limits ---
/// Longest accepted watchdog off interval in seconds (2^20 s, about 12.1 days).
pub const WDT_MAX_OFF_INTERVAL_S: u32 = 1 << 20;
pub const LED_MODE_MAX: u8 = 2;
pub const PWR_LED_MODE_MAX: u8 = 3;
/// Raw PWM fill value that corresponds to a 100 % duty cycle.
pub const PWM_FILL_FULL_SCALE: u16 = 10_000;

pub mod modbus {
    pub const TYPE_DISABLED: u8 = 0;
    pub const TYPE_RTU: u8 = 1;
    pub const ADDRESS_MIN: u8 = 1;
    pub const ADDRESS_MAX: u8 = 254;
    pub const BAUD_MIN: u32 = 1200;
    pub const BAUD_MAX: u32 = 115_200;
    pub const STOP_BITS_MIN: u8 = 1;
    pub const STOP_BITS_MAX: u8 = 2;
    pub const PARITY_MAX: u8 = 2;

    // Values the firmware expects when the port is released to the host.
    pub const DEFAULT_BAUD: u32 = 38_400;
    pub const DEFAULT_STOP_BITS: u8 = 1;
    pub const DEFAULT_PARITY: u8 = 0;
    pub const DEFAULT_ADDRESS: u8 = 1;

    // Bit layout of the packed block: byte 0..3 baud (24-bit LE),
    // byte 3 = type[3:0] | parity[5:4] | stop bits[7:6], byte 4 = address.
    pub const BAUD_MASK: u32 = 0x00FF_FFFF;
    pub const TYPE_MASK: u8 = 0x0F;
    pub const PARITY_SHIFT: u8 = 4;
    pub const PARITY_MASK: u8 = 0x03;
    pub const STOP_BITS_SHIFT: u8 = 6;
    pub const STOP_BITS_MASK: u8 = 0x03;
}
