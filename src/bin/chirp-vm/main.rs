// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Runs a Chip-8 ROM headless, then prints what ended up on the screen

use chirp_vm::*;
use gumdrop::*;
use log::info;
use owo_colors::OwoColorize;
use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

#[derive(Clone, Debug, PartialEq, PartialOrd, Options)]
struct Arguments {
    #[options(help = "Load a ROM to run.", required, free)]
    pub file: PathBuf,
    #[options(help = "Print this help message.")]
    help: bool,
    #[options(help = "Enable live disassembly.")]
    pub debug: bool,
    #[options(help = "Wait this many microseconds between instructions.", meta = "US")]
    pub pace: Option<u64>,
    #[options(
        help = "Stop after this many seconds. If unspecified, run until the program halts.",
        meta = "SECS"
    )]
    pub time: Option<f64>,
    #[options(help = "Dump the registers once stopped.")]
    pub regs: bool,
}

pub fn main() -> Result<()> {
    let options = Arguments::parse_args_default_or_exit();
    env_logger::init();

    let mut cpu = CPU::new(Flags {
        debug: options.debug,
        pace: options.pace.map(Duration::from_micros),
        ..Default::default()
    });
    cpu.load_program(&options.file)?;
    cpu.on_tone(|on| info!("tone {}", if on { "on" } else { "off" }));

    let screen = cpu.screen();
    let stop = cpu.stop_handle();
    let deadline = options
        .time
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .and_then(|limit| Instant::now().checked_add(limit));

    let runner = thread::Builder::new()
        .name("chirp-vm".into())
        .spawn(move || {
            let result = cpu.run();
            (result, cpu)
        })?;
    while !runner.is_finished() {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            stop.stop();
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    let Ok((result, cpu)) = runner.join() else {
        eprintln!("{}", "interpreter thread panicked".bold().red());
        return Ok(());
    };

    screen.print_screen();
    if options.regs {
        cpu.dump();
    }
    if let Err(e) = result {
        eprintln!("{}", e.bold().red());
    }
    Ok(())
}
