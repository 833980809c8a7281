use std::{thread, time::Duration};
use sm16inpind::{Board, Result};

// Stack level selected with the address jumpers
const STACK_LEVEL: u8 = 0;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    env_logger::init();
    println!("Opening board at stack level {}...", STACK_LEVEL);
    let mut board = Board::open(STACK_LEVEL)?;
    println!(
        "Board opened at 0x{:02X}, firmware {}",
        board.address(),
        board.firmware_version()?
    );

    let mut last = board.inputs_read()?;
    println!("Initial inputs: {:016b}", last);
    println!("Watching inputs (Press Ctrl+C to stop)");
    loop {
        thread::sleep(POLL_INTERVAL);
        let now = board.inputs_read()?;
        let changed = now ^ last;
        if changed == 0 {
            continue;
        }
        for ch in 1..=16u8 {
            let mask = 1u16 << (ch - 1);
            if changed & mask != 0 {
                let state = if now & mask != 0 { "closed" } else { "open" };
                println!("Input {:2} {}", ch, state);
            }
        }
        last = now;
    }
}
