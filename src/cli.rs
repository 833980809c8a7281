//! Command line front end: clap envelope, command table and verb handlers.
//!
//! The envelope only separates `--bus` from the legacy argument vector
//! (`<stack> <verb> [args]` or `<-h|-v|-warranty|-list>`); the vector itself is
//! dispatched through [`COMMANDS`].

use log::debug;
use sm16inpind::consts;
use sm16inpind::{
    discover, Board, EdgeMode, Error, LedMode, ModbusSettings, RegisterBus, RetryPolicy, StackId,
};
use std::io::{self, Write};
use std::str::FromStr;
use thiserror::Error;

pub const PROGRAM_NAME: &str = "16inpind";

/// Environment variable that overrides the default bus device.
pub const BUS_ENV: &str = "SM16INPIND_I2C_BUS";

const WARRANTY: &str = "\
       Copyright (c) 2016-2025 Sequent Microsystems

This program is free software; you can redistribute it and/or modify
it under the terms of the GNU Lesser General Public License as published
by the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Lesser General Public License for more details.

You should have received a copy of the GNU Lesser General Public License
along with this program. If not, see <http://www.gnu.org/licenses/>.";

#[derive(Error, Debug)]
pub enum CliError {
    #[error("No command given")]
    NoCommand,
    #[error("Invalid command option")]
    UnknownCommand,
    #[error("Invalid number of arguments for {command}")]
    ArgCount {
        command: &'static str,
        usage: &'static str,
    },
    #[error("Option \"{0}\" not found")]
    HelpNotFound(String),
    #[error("Invalid {what}: '{value}'")]
    InvalidNumber { what: &'static str, value: String },
    #[error(transparent)]
    Device(#[from] Error),
    #[error("Unable to write output: {0}")]
    Output(#[from] io::Error),
}

/// Outer argument parser.
pub fn command() -> clap::Command {
    clap::Command::new(PROGRAM_NAME)
        .bin_name(PROGRAM_NAME)
        .version(clap::crate_version!())
        .about("Sixteen LV Digital Inputs card for Raspberry Pi")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            clap::Arg::new("bus")
                .long("bus")
                .value_name("DEVICE")
                .env(BUS_ENV)
                .default_value(consts::DEFAULT_I2C_BUS)
                .help("I2C bus device the cards are attached to"),
        )
        .arg(
            clap::Arg::new("command")
                .value_name("ARGS")
                .num_args(1..)
                .allow_hyphen_values(true)
                .trailing_var_arg(true)
                .help("<stack> <command> [args...] or -h | -v | -warranty | -list"),
        )
}

/// Everything a command can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Version,
    Warranty,
    List,
    Board,
    Read,
    LedRead,
    LedWrite,
    LedModeRead,
    LedModeWrite,
    PowerLedModeRead,
    PowerLedModeWrite,
    OptoRead,
    OptoEdgeRead,
    OptoEdgeWrite,
    OptoCountRead,
    OptoCountReset,
    OptoEncoderRead,
    OptoEncoderWrite,
    OptoEncoderCountRead,
    OptoEncoderCountReset,
    OptoFrequencyRead,
    OptoPwmRead,
    OptoInterruptRead,
    OptoInterruptWrite,
    Rs485Read,
    Rs485Write,
    WdtReload,
    WdtPeriodRead,
    WdtPeriodWrite,
    WdtInitPeriodRead,
    WdtInitPeriodWrite,
    WdtOffPeriodRead,
    WdtOffPeriodWrite,
    WdtResetCountRead,
    WdtResetCountClear,
}

/// One row of the command table.
#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    /// 1 for global options (`16inpind -list`), 2 for board verbs (`16inpind 0 rd`).
    pub name_pos: usize,
    pub command: Command,
    /// Accepted numbers of arguments after the name.
    pub arity: &'static [usize],
    pub help: &'static str,
    pub usage: &'static str,
    pub example: &'static str,
}

const GLOBAL: usize = 1;
const VERB: usize = 2;

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "-v",
        name_pos: GLOBAL,
        command: Command::Version,
        arity: &[0],
        help: "  -v               Display the 16inpind command version number",
        usage: "  Usage:           16inpind -v",
        example: "  Example:         16inpind -v  Display the version number",
    },
    CommandSpec {
        name: "-h",
        name_pos: GLOBAL,
        command: Command::Help,
        arity: &[0, 1],
        help: "  -h               Display the list of command options or one command option details",
        usage: "  Usage:           16inpind -h    Display command options list\n\
                \x20 Usage:           16inpind -h <param>   Display help for <param> command option",
        example: "  Example:         16inpind -h rd    Display help for \"rd\" command option",
    },
    CommandSpec {
        name: "-warranty",
        name_pos: GLOBAL,
        command: Command::Warranty,
        arity: &[0],
        help: "  -warranty        Display the warranty",
        usage: "  Usage:           16inpind -warranty",
        example: "  Example:         16inpind -warranty  Display the warranty text",
    },
    CommandSpec {
        name: "-list",
        name_pos: GLOBAL,
        command: Command::List,
        arity: &[0],
        help: "  -list            List all 16inpind boards connected, the # of boards and the stack level of every board",
        usage: "  Usage:           16inpind -list",
        example: "  Example:         16inpind -list display: 1 board(s) detected / Id: 0",
    },
    CommandSpec {
        name: "board",
        name_pos: VERB,
        command: Command::Board,
        arity: &[0],
        help: "  board            Display the card firmware version",
        usage: "  Usage:           16inpind <stack> board",
        example: "  Example:         16inpind 0 board  Display firmware version of board #0",
    },
    CommandSpec {
        name: "rd",
        name_pos: VERB,
        command: Command::Read,
        arity: &[0, 1],
        help: "  rd               Read digital inputs state",
        usage: "  Usage:           16inpind <stack> rd <channel[1..16]>\n\
                \x20 Usage:           16inpind <stack> rd",
        example: "  Example:         16inpind 0 rd 2  Read input #2 on board #0",
    },
    CommandSpec {
        name: "ledrd",
        name_pos: VERB,
        command: Command::LedRead,
        arity: &[0, 1],
        help: "  ledrd            Display the state of general purpose LEDs on the card",
        usage: "  Usage:           16inpind <stack> ledrd <led[1..8]>\n\
                \x20 Usage:           16inpind <stack> ledrd",
        example: "  Example:         16inpind 0 ledrd 2  Get the state of LED #2 on board #0",
    },
    CommandSpec {
        name: "ledwr",
        name_pos: VERB,
        command: Command::LedWrite,
        arity: &[1, 2],
        help: "  ledwr            Set the state of general purpose LEDs on the card",
        usage: "  Usage:           16inpind <stack> ledwr <led[1..8]> <state(0/1)>\n\
                \x20 Usage:           16inpind <stack> ledwr <mask[0..255]>",
        example: "  Example:         16inpind 0 ledwr 2 1  Turn ON LED #2 on board #0",
    },
    CommandSpec {
        name: "ledmrd",
        name_pos: VERB,
        command: Command::LedModeRead,
        arity: &[1],
        help: "  ledmrd           Read LED mode: auto<0>; manual<1>",
        usage: "  Usage:           16inpind <stack> ledmrd <led[1..8]>",
        example: "  Example:         16inpind 0 ledmrd 2  Read the mode of LED #2 on board #0",
    },
    CommandSpec {
        name: "ledmwr",
        name_pos: VERB,
        command: Command::LedModeWrite,
        arity: &[2],
        help: "  ledmwr           Write LED mode: auto<0>; manual<1>",
        usage: "  Usage:           16inpind <stack> ledmwr <led[1..8]> <mode[0..2]>",
        example: "  Example:         16inpind 0 ledmwr 2 1  Set LED #2 on board #0 to manual",
    },
    CommandSpec {
        name: "ledplrd",
        name_pos: VERB,
        command: Command::PowerLedModeRead,
        arity: &[0],
        help: "  ledplrd          Read power LED mode: blink<0>; solid<1>; off<2>",
        usage: "  Usage:           16inpind <stack> ledplrd",
        example: "  Example:         16inpind 0 ledplrd  Read the power LED mode on board #0",
    },
    CommandSpec {
        name: "ledplwr",
        name_pos: VERB,
        command: Command::PowerLedModeWrite,
        arity: &[1],
        help: "  ledplwr          Write power LED mode: blink<0>; solid<1>; off<2>",
        usage: "  Usage:           16inpind <stack> ledplwr <mode[0..3]>",
        example: "  Example:         16inpind 0 ledplwr 1  Set the power LED on board #0 to solid",
    },
    CommandSpec {
        name: "optrd",
        name_pos: VERB,
        command: Command::OptoRead,
        arity: &[0, 1],
        help: "  optrd            Read optocoupled inputs status",
        usage: "  Usage:           16inpind <stack> optrd <channel[1..16]>\n\
                \x20 Usage:           16inpind <stack> optrd",
        example: "  Example:         16inpind 0 optrd 2  Read opto input #2 on board #0",
    },
    CommandSpec {
        name: "optedgerd",
        name_pos: VERB,
        command: Command::OptoEdgeRead,
        arity: &[1],
        help: "  optedgerd        Read counted edges: 0 - none; 1 - rising; 2 - falling; 3 - both",
        usage: "  Usage:           16inpind <stack> optedgerd <channel[1..16]>",
        example: "  Example:         16inpind 0 optedgerd 2  Read counted edges of opto input #2 on board #0",
    },
    CommandSpec {
        name: "optedgewr",
        name_pos: VERB,
        command: Command::OptoEdgeWrite,
        arity: &[2],
        help: "  optedgewr        Set counted edges: none|0, rising|up|1, falling|down|2, both|3",
        usage: "  Usage:           16inpind <stack> optedgewr <channel[1..16]> <edges>",
        example: "  Example:         16inpind 0 optedgewr 2 rising  Count rising edges on opto input #2 on board #0",
    },
    CommandSpec {
        name: "optcntrd",
        name_pos: VERB,
        command: Command::OptoCountRead,
        arity: &[1],
        help: "  optcntrd         Read the edge counter of one opto input",
        usage: "  Usage:           16inpind <stack> optcntrd <channel[1..16]>",
        example: "  Example:         16inpind 0 optcntrd 2  Read the counter of opto input #2 on board #0",
    },
    CommandSpec {
        name: "optcntrst",
        name_pos: VERB,
        command: Command::OptoCountReset,
        arity: &[1],
        help: "  optcntrst        Reset the edge counter of one opto input",
        usage: "  Usage:           16inpind <stack> optcntrst <channel[1..16]>",
        example: "  Example:         16inpind 0 optcntrst 2  Reset the counter of opto input #2 on board #0",
    },
    CommandSpec {
        name: "optencrd",
        name_pos: VERB,
        command: Command::OptoEncoderRead,
        arity: &[1],
        help: "  optencrd         Read quadrature encoder state: 0 - disabled; 1 - enabled",
        usage: "  Usage:           16inpind <stack> optencrd <encoder[1..8]>",
        example: "  Example:         16inpind 0 optencrd 2  Read the state of encoder #2 on board #0",
    },
    CommandSpec {
        name: "optencwr",
        name_pos: VERB,
        command: Command::OptoEncoderWrite,
        arity: &[2],
        help: "  optencwr         Enable/disable a quadrature encoder; encoder 1 uses opto inputs 1 and 2, encoder 2 inputs 3 and 4 ...",
        usage: "  Usage:           16inpind <stack> optencwr <encoder[1..8]> <0/1>",
        example: "  Example:         16inpind 0 optencwr 2 1  Enable the encoder on opto inputs 3/4 on board #0",
    },
    CommandSpec {
        name: "optcntencrd",
        name_pos: VERB,
        command: Command::OptoEncoderCountRead,
        arity: &[1],
        help: "  optcntencrd      Read the count of one quadrature encoder",
        usage: "  Usage:           16inpind <stack> optcntencrd <encoder[1..8]>",
        example: "  Example:         16inpind 0 optcntencrd 2  Read the count of encoder #2 on board #0",
    },
    CommandSpec {
        name: "optcntencrst",
        name_pos: VERB,
        command: Command::OptoEncoderCountReset,
        arity: &[1],
        help: "  optcntencrst     Reset the count of one quadrature encoder",
        usage: "  Usage:           16inpind <stack> optcntencrst <encoder[1..8]>",
        example: "  Example:         16inpind 0 optcntencrst 2  Reset the count of encoder #2 on board #0",
    },
    CommandSpec {
        name: "optfrd",
        name_pos: VERB,
        command: Command::OptoFrequencyRead,
        arity: &[1],
        help: "  optfrd           Read the signal frequency (Hz) on one opto input",
        usage: "  Usage:           16inpind <stack> optfrd <channel[1..16]>",
        example: "  Example:         16inpind 0 optfrd 2  Read the frequency on opto input #2 on board #0",
    },
    CommandSpec {
        name: "optpwmrd",
        name_pos: VERB,
        command: Command::OptoPwmRead,
        arity: &[1],
        help: "  optpwmrd         Read the signal PWM fill factor (%) on one opto input",
        usage: "  Usage:           16inpind <stack> optpwmrd <channel[1..16]>",
        example: "  Example:         16inpind 0 optpwmrd 2  Read the fill factor on opto input #2 on board #0",
    },
    CommandSpec {
        name: "optintrd",
        name_pos: VERB,
        command: Command::OptoInterruptRead,
        arity: &[0, 1],
        help: "  optintrd         Display interrupt generation settings for opto inputs",
        usage: "  Usage:           16inpind <stack> optintrd <channel[1..16]>\n\
                \x20 Usage:           16inpind <stack> optintrd",
        example: "  Example:         16inpind 0 optintrd 2  Interrupt setting of opto input #2 on board #0",
    },
    CommandSpec {
        name: "optintwr",
        name_pos: VERB,
        command: Command::OptoInterruptWrite,
        arity: &[1, 2],
        help: "  optintwr         Enable/disable interrupt generation on opto input change",
        usage: "  Usage:           16inpind <stack> optintwr <channel[1..16]> <0/1>\n\
                \x20 Usage:           16inpind <stack> optintwr <bitmap[0..65535]>",
        example: "  Example:         16inpind 0 optintwr 2 1  Enable interrupts on opto input #2 on board #0",
    },
    CommandSpec {
        name: "cfg485rd",
        name_pos: VERB,
        command: Command::Rs485Read,
        arity: &[0],
        help: "  cfg485rd         Display the RS485 port settings",
        usage: "  Usage:           16inpind <stack> cfg485rd",
        example: "  Example:         16inpind 0 cfg485rd  Display the RS485 settings of board #0",
    },
    CommandSpec {
        name: "cfg485wr",
        name_pos: VERB,
        command: Command::Rs485Write,
        arity: &[1, 5],
        help: "  cfg485wr         Set the RS485 port parameters",
        usage: "  Usage:           16inpind <stack> cfg485wr <modbus(0/1)> <id[1..254]> <baudrate[1200..115200]> <stop bits(1/2)> <parity(0/1/2)>\n\
                \x20 Usage:           16inpind <stack> cfg485wr 0",
        example: "  Example:         16inpind 0 cfg485wr 1 1 9600 1 0  Modbus RTU, id 1, 9600bps, one stop bit, no parity",
    },
    CommandSpec {
        name: "wdtr",
        name_pos: VERB,
        command: Command::WdtReload,
        arity: &[0],
        help: "  wdtr             Reload the watchdog timer and enable the watchdog if it is disabled",
        usage: "  Usage:           16inpind <stack> wdtr",
        example: "  Example:         16inpind 0 wdtr  Reload the watchdog on board #0",
    },
    CommandSpec {
        name: "wdtprd",
        name_pos: VERB,
        command: Command::WdtPeriodRead,
        arity: &[0],
        help: "  wdtprd           Get the watchdog period in seconds; reload within it to keep the Raspberry Pi powered",
        usage: "  Usage:           16inpind <stack> wdtprd",
        example: "  Example:         16inpind 0 wdtprd  Get the watchdog period on board #0",
    },
    CommandSpec {
        name: "wdtpwr",
        name_pos: VERB,
        command: Command::WdtPeriodWrite,
        arity: &[1],
        help: "  wdtpwr           Set the watchdog period in seconds; reload within it to keep the Raspberry Pi powered",
        usage: "  Usage:           16inpind <stack> wdtpwr <seconds[1..65535]>",
        example: "  Example:         16inpind 0 wdtpwr 10  Set the watchdog period on board #0 to 10 seconds",
    },
    CommandSpec {
        name: "wdtiprd",
        name_pos: VERB,
        command: Command::WdtInitPeriodRead,
        arity: &[0],
        help: "  wdtiprd          Get the watchdog initial period in seconds, loaded after a power cycle",
        usage: "  Usage:           16inpind <stack> wdtiprd",
        example: "  Example:         16inpind 0 wdtiprd  Get the watchdog initial period on board #0",
    },
    CommandSpec {
        name: "wdtipwr",
        name_pos: VERB,
        command: Command::WdtInitPeriodWrite,
        arity: &[1],
        help: "  wdtipwr          Set the watchdog initial period in seconds, loaded after a power cycle",
        usage: "  Usage:           16inpind <stack> wdtipwr <seconds[1..65535]>",
        example: "  Example:         16inpind 0 wdtipwr 60  Set the watchdog initial period on board #0 to 60 seconds",
    },
    CommandSpec {
        name: "wdtoprd",
        name_pos: VERB,
        command: Command::WdtOffPeriodRead,
        arity: &[0],
        help: "  wdtoprd          Get the watchdog off period in seconds, how long the Raspberry Pi is kept off",
        usage: "  Usage:           16inpind <stack> wdtoprd",
        example: "  Example:         16inpind 0 wdtoprd  Get the watchdog off period on board #0",
    },
    CommandSpec {
        name: "wdtopwr",
        name_pos: VERB,
        command: Command::WdtOffPeriodWrite,
        arity: &[1],
        help: "  wdtopwr          Set the watchdog off period in seconds, how long the Raspberry Pi is kept off",
        usage: "  Usage:           16inpind <stack> wdtopwr <seconds[1..1048576]>",
        example: "  Example:         16inpind 0 wdtopwr 10  Set the watchdog off period on board #0 to 10 seconds",
    },
    CommandSpec {
        name: "wdtrcrd",
        name_pos: VERB,
        command: Command::WdtResetCountRead,
        arity: &[0],
        help: "  wdtrcrd          Get the number of repowers performed by the watchdog",
        usage: "  Usage:           16inpind <stack> wdtrcrd",
        example: "  Example:         16inpind 0 wdtrcrd  Get the watchdog reset count on board #0",
    },
    CommandSpec {
        name: "wdtrcclr",
        name_pos: VERB,
        command: Command::WdtResetCountClear,
        arity: &[0],
        help: "  wdtrcclr         Clear the watchdog reset count",
        usage: "  Usage:           16inpind <stack> wdtrcclr",
        example: "  Example:         16inpind 0 wdtrcclr  Clear the watchdog reset count on board #0",
    },
];

/// Looks a command up by name (any case) at the given argument position.
pub fn find(name: &str, name_pos: usize) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name_pos == name_pos && spec.name.eq_ignore_ascii_case(name))
}

/// A resolved argument vector.
#[derive(Debug)]
pub enum Invocation<'a> {
    Global {
        spec: &'static CommandSpec,
        args: &'a [String],
    },
    Board {
        spec: &'static CommandSpec,
        stack: StackId,
        args: &'a [String],
    },
}

/// Matches the argument vector against the table and checks the argument
/// count and stack level. Nothing here touches the bus.
pub fn resolve(argv: &[String]) -> Result<Invocation<'_>, CliError> {
    let (first, rest) = argv.split_first().ok_or(CliError::NoCommand)?;
    if let Some(spec) = find(first, GLOBAL) {
        check_arity(spec, rest.len())?;
        return Ok(Invocation::Global { spec, args: rest });
    }
    let (verb, args) = rest.split_first().ok_or(CliError::UnknownCommand)?;
    let spec = find(verb, VERB).ok_or(CliError::UnknownCommand)?;
    check_arity(spec, args.len())?;
    let stack = StackId::new(number("stack level", first)?)?;
    Ok(Invocation::Board { spec, stack, args })
}

fn check_arity(spec: &'static CommandSpec, count: usize) -> Result<(), CliError> {
    if spec.arity.contains(&count) {
        Ok(())
    } else {
        Err(arg_count(spec))
    }
}

fn arg_count(spec: &'static CommandSpec) -> CliError {
    CliError::ArgCount {
        command: spec.name,
        usage: spec.usage,
    }
}

/// Resolves and runs one invocation against the cards on `bus`.
pub fn run(bus: &str, argv: &[String], out: &mut impl Write) -> Result<(), CliError> {
    match resolve(argv)? {
        Invocation::Global { spec, args } => run_global(spec, args, || discover(bus), out),
        Invocation::Board { spec, stack, args } => {
            debug!("{} on {} via {}", spec.name, stack, bus);
            let mut board = Board::open_on(bus, stack.level(), RetryPolicy::default())?;
            execute(spec, &mut board, args, out)
        }
    }
}

/// Runs a command that needs no board handle. `scan` is only called by `-list`.
pub fn run_global<F>(
    spec: &'static CommandSpec,
    args: &[String],
    scan: F,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    F: FnOnce() -> Vec<StackId>,
{
    match (spec.command, args) {
        (Command::Help, []) => {
            for spec in COMMANDS {
                writeln!(out, "{}", spec.help)?;
            }
        }
        (Command::Help, [name]) => {
            let spec = COMMANDS
                .iter()
                .find(|spec| spec.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| CliError::HelpNotFound(name.clone()))?;
            writeln!(out, "{}\n{}\n{}", spec.help, spec.usage, spec.example)?;
        }
        (Command::Version, []) => {
            writeln!(
                out,
                "{} command line interface v{} Copyright (c) 2016 - 2025 Sequent Microsystems",
                PROGRAM_NAME,
                clap::crate_version!()
            )?;
            writeln!(out, "\nThis is free software with ABSOLUTELY NO WARRANTY.")?;
            writeln!(out, "For details type: {} -warranty", PROGRAM_NAME)?;
        }
        (Command::Warranty, []) => writeln!(out, "{}", WARRANTY)?,
        (Command::List, []) => {
            let found = scan();
            writeln!(out, "{} board(s) detected", found.len())?;
            if !found.is_empty() {
                write!(out, "Id:")?;
                for stack in found.iter().rev() {
                    write!(out, " {}", stack.level())?;
                }
                writeln!(out)?;
            }
        }
        _ => return Err(arg_count(spec)),
    }
    Ok(())
}

/// Runs a board verb. Reads print one line; writes print nothing on success.
pub fn execute<B: RegisterBus>(
    spec: &'static CommandSpec,
    board: &mut Board<B>,
    args: &[String],
    out: &mut impl Write,
) -> Result<(), CliError> {
    match (spec.command, args) {
        (Command::Board, []) => writeln!(
            out,
            "Sixteen LV Digital Inputs firmware version {}",
            board.firmware_version()?
        )?,

        // --- Digital inputs ---
        (Command::Read, []) => writeln!(out, "{}", board.inputs_read()?)?,
        (Command::Read, [ch]) => {
            let state = board.input_read(number("channel", ch)?)?;
            writeln!(out, "{}", u8::from(state))?
        }

        // --- LEDs ---
        (Command::LedRead, []) => {
            let leds = board.leds_read()?;
            let states: Vec<String> = (0..consts::LED_CH_NO)
                .map(|i| ((leds >> i) & 1).to_string())
                .collect();
            writeln!(out, "{}", states.join(" "))?
        }
        (Command::LedRead, [led]) => {
            let state = board.led_read(number("led", led)?)?;
            writeln!(out, "{}", u8::from(state))?
        }
        (Command::LedWrite, [mask]) => board.leds_write(number("mask", mask)?)?,
        (Command::LedWrite, [led, state]) => {
            board.led_write(number("led", led)?, switch("state", state)?)?
        }
        (Command::LedModeRead, [led]) => {
            let mode: LedMode = board.led_mode(number("led", led)?)?;
            writeln!(out, "{}", mode.raw())?
        }
        (Command::LedModeWrite, [led, mode]) => {
            board.set_led_mode(number("led", led)?, LedMode::new(number("mode", mode)?)?)?
        }
        (Command::PowerLedModeRead, []) => writeln!(out, "{}", board.power_led_mode()?)?,
        (Command::PowerLedModeWrite, [mode]) => board.set_power_led_mode(number("mode", mode)?)?,

        // --- Opto inputs ---
        (Command::OptoRead, []) => writeln!(out, "{}", board.opto_read()?)?,
        (Command::OptoRead, [ch]) => {
            let state = board.opto_channel_read(number("channel", ch)?)?;
            writeln!(out, "{}", u8::from(state))?
        }
        (Command::OptoEdgeRead, [ch]) => {
            writeln!(out, "{}", board.opto_edge(number("channel", ch)?)?.bits())?
        }
        (Command::OptoEdgeWrite, [ch, edges]) => {
            let ch = number("channel", ch)?;
            let mode: EdgeMode = edges.parse()?;
            board.set_opto_edge(ch, mode)?
        }
        (Command::OptoCountRead, [ch]) => {
            writeln!(out, "{}", board.opto_count(number("channel", ch)?)?)?
        }
        (Command::OptoCountReset, [ch]) => board.reset_opto_count(number("channel", ch)?)?,
        (Command::OptoEncoderRead, [enc]) => {
            let enabled = board.opto_encoder_enabled(number("encoder", enc)?)?;
            writeln!(out, "{}", u8::from(enabled))?
        }
        (Command::OptoEncoderWrite, [enc, state]) => {
            board.set_opto_encoder_enabled(number("encoder", enc)?, switch("state", state)?)?
        }
        (Command::OptoEncoderCountRead, [enc]) => {
            writeln!(out, "{}", board.opto_encoder_count(number("encoder", enc)?)?)?
        }
        (Command::OptoEncoderCountReset, [enc]) => {
            board.reset_opto_encoder_count(number("encoder", enc)?)?
        }
        (Command::OptoFrequencyRead, [ch]) => {
            writeln!(out, "{}", board.opto_frequency(number("channel", ch)?)?)?
        }
        (Command::OptoPwmRead, [ch]) => {
            writeln!(out, "{}", board.opto_pwm_fill(number("channel", ch)?)?)?
        }
        (Command::OptoInterruptRead, []) => writeln!(out, "{}", board.opto_interrupt_mask()?)?,
        (Command::OptoInterruptRead, [ch]) => {
            let enabled = board.opto_interrupt_enabled(number("channel", ch)?)?;
            writeln!(out, "{}", u8::from(enabled))?
        }
        (Command::OptoInterruptWrite, [bitmap]) => {
            let bitmap: u32 = number("bitmap", bitmap)?;
            board.set_opto_interrupt_mask((bitmap & 0xFFFF) as u16)?
        }
        (Command::OptoInterruptWrite, [ch, state]) => {
            board.set_opto_interrupt(number("channel", ch)?, switch("state", state)?)?
        }

        // --- RS485 ---
        (Command::Rs485Read, []) => writeln!(out, "{}", board.modbus_settings()?)?,
        (Command::Rs485Write, [mode, rest @ ..]) => {
            let settings = match (number::<u8>("modbus mode", mode)?, rest) {
                (consts::modbus::TYPE_DISABLED, _) => ModbusSettings::disabled(),
                (_, []) => return Err(arg_count(spec)),
                (mb_type, [address, baud, stop_bits, parity]) => ModbusSettings {
                    mb_type,
                    address: number("modbus id", address)?,
                    baud: number("baudrate", baud)?,
                    stop_bits: number("stop bits", stop_bits)?,
                    parity: number("parity", parity)?,
                },
                _ => return Err(arg_count(spec)),
            };
            board.set_modbus_settings(&settings)?
        }

        // --- Watchdog ---
        (Command::WdtReload, []) => board.watchdog_reload()?,
        (Command::WdtPeriodRead, []) => writeln!(out, "{}", board.watchdog_period()?)?,
        (Command::WdtPeriodWrite, [seconds]) => {
            board.set_watchdog_period(seconds_u16("period", seconds)?)?
        }
        (Command::WdtInitPeriodRead, []) => writeln!(out, "{}", board.watchdog_init_period()?)?,
        (Command::WdtInitPeriodWrite, [seconds]) => {
            board.set_watchdog_init_period(seconds_u16("initial period", seconds)?)?
        }
        (Command::WdtOffPeriodRead, []) => writeln!(out, "{}", board.watchdog_off_period()?)?,
        (Command::WdtOffPeriodWrite, [seconds]) => {
            board.set_watchdog_off_period(number("off period", seconds)?)?
        }
        (Command::WdtResetCountRead, []) => writeln!(out, "{}", board.watchdog_reset_count()?)?,
        (Command::WdtResetCountClear, []) => board.clear_watchdog_reset_count()?,

        _ => return Err(arg_count(spec)),
    }
    Ok(())
}

/// Prints the diagnostic for a failed invocation, plus usage where it helps.
pub fn report(err: &CliError, w: &mut impl Write) -> io::Result<()> {
    writeln!(w, "{}", err)?;
    match err {
        CliError::NoCommand | CliError::UnknownCommand => write_usage(w),
        CliError::ArgCount { usage, .. } => writeln!(w, "{}", usage),
        _ => Ok(()),
    }
}

/// Usage lines of every command.
pub fn write_usage(w: &mut impl Write) -> io::Result<()> {
    for spec in COMMANDS {
        writeln!(w, "{}", spec.usage)?;
    }
    writeln!(w, "Where: <stack> = Board stack level id = 0..7")?;
    writeln!(w, "Type {} -h <command> for more help", PROGRAM_NAME)
}

fn number<T: FromStr>(what: &'static str, value: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::InvalidNumber {
        what,
        value: value.to_string(),
    })
}

fn switch(what: &'static str, value: &str) -> Result<bool, CliError> {
    match number::<u8>(what, value)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::ArgumentOutOfRange(format!("{} {} must be 0 or 1", what, other)).into()),
    }
}

fn seconds_u16(what: &'static str, value: &str) -> Result<u16, CliError> {
    let seconds: u32 = number(what, value)?;
    u16::try_from(seconds).map_err(|_| {
        Error::ArgumentOutOfRange(format!(
            "Watchdog {} {} s out of range [1..{}]",
            what,
            seconds,
            u16::MAX
        ))
        .into()
    })
}
