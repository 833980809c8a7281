use sm16inpind::consts;
use std::io::{self, Write};
use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    // Diagnostics go to stderr; RUST_LOG=debug shows register traffic.
    env_logger::init();

    let matches = cli::command().get_matches();
    let bus = matches
        .get_one::<String>("bus")
        .map(String::as_str)
        .unwrap_or(consts::DEFAULT_I2C_BUS);
    let argv: Vec<String> = matches
        .get_many::<String>("command")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = cli::run(bus, &argv, &mut out);
    let _ = out.flush();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = cli::report(&e, &mut io::stderr().lock());
            ExitCode::FAILURE
        }
    }
}
