use std::{thread, time::Duration};
use sm16inpind::{Board, Result};

const STACK_LEVEL: u8 = 0;
// Seconds the Pi may go without a reload before it is power cycled
const WATCHDOG_PERIOD_S: u16 = 30;
const OFF_PERIOD_S: u32 = 10;

fn main() -> Result<()> {
    env_logger::init();
    let mut board = Board::open(STACK_LEVEL)?;

    board.set_watchdog_period(WATCHDOG_PERIOD_S)?;
    board.set_watchdog_off_period(OFF_PERIOD_S)?;
    println!(
        "Watchdog period {} s, off period {} s, {} repower(s) so far",
        board.watchdog_period()?,
        board.watchdog_off_period()?,
        board.watchdog_reset_count()?
    );

    // Reload at a third of the period.
    let interval = Duration::from_secs(u64::from(WATCHDOG_PERIOD_S) / 3);
    println!("Reloading every {:?} (Press Ctrl+C to stop)", interval);
    loop {
        board.watchdog_reload()?;
        thread::sleep(interval);
    }
}
