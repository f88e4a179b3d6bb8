use std::error::Error;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use chip8vm::config::Config;
use chip8vm::display::MonoTermDisplay;
use chip8vm::environment::{Environment, RunOutcome};
use chip8vm::framebuffer::{SCREEN_HEIGHT, SCREEN_WIDTH};
use chip8vm::input::TermInput;
use chip8vm::sound::{Mute, SimpleBeep, Sound};
use chip8vm::{Chip8Interpreter, Machine};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// logs go to a file if asked, since the terminal belongs to the display;
/// otherwise only warnings and worse reach stderr
fn init_logging(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match log_file {
        Some(path) => {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(File::create(path)?))
                .init();
        }
        None => {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

/// the terminal is restored as display and input drop on the way out
fn run_in_terminal(
    config: &Config,
    interpreter: Chip8Interpreter,
) -> Result<RunOutcome, Box<dyn Error>> {
    let mut display = MonoTermDisplay::new(SCREEN_WIDTH, SCREEN_HEIGHT)?;
    let mut input = TermInput::new(config.keymap, config.key_hold())?;
    let mut sound: Box<dyn Sound> = if config.mute {
        Box::new(Mute::new())
    } else {
        match SimpleBeep::new(config.tone_hz) {
            Ok(speaker) => Box::new(speaker),
            Err(e) => {
                warn!(error = %e, "console speaker unavailable; running without sound");
                Box::new(Mute::new())
            }
        }
    };
    let mut env = Environment::new(
        interpreter,
        &mut display,
        &mut input,
        sound.as_mut(),
        config.cycle_delay(),
    );
    Ok(env.run(config.max_cycles)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::parse();
    init_logging(config.log_file.as_deref())?;

    // load a program
    let mut f = File::open(&config.rom)?;
    let machine = Machine::load(&mut f)?;
    info!(rom = %config.rom.display(), "loaded");
    let interpreter = match config.seed {
        Some(seed) => Chip8Interpreter::seeded(machine, seed),
        None => Chip8Interpreter::new(machine),
    };

    match run_in_terminal(&config, interpreter)? {
        RunOutcome::Quit { cycles } => println!("quit after {} cycles", cycles),
        RunOutcome::CycleLimit { cycles } => println!("stopped after {} cycles", cycles),
    }
    Ok(())
}
