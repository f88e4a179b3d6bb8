use crate::input::Keymap;
use crate::sound::DEFAULT_TONE_HZ;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Run a CHIP-8 program in the terminal.
#[derive(Debug, Parser)]
#[command(name = "chip8vm", version)]
pub struct Config {
    /// program image to load at 0x200
    pub rom: PathBuf,

    /// pause after each instruction, in microseconds
    #[arg(long, default_value_t = 1200)]
    pub cycle_delay_us: u64,

    /// how long a key stays down after the terminal last reported it
    #[arg(long, default_value_t = 120)]
    pub key_hold_ms: u64,

    /// stop after this many cycles
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// seed for the random number instruction
    #[arg(long)]
    pub seed: Option<u64>,

    /// don't use the console speaker
    #[arg(long)]
    pub mute: bool,

    /// pitch of the tone while the sound timer runs
    #[arg(long, default_value_t = DEFAULT_TONE_HZ)]
    pub tone_hz: u16,

    /// which keyboard keys drive the hex keypad
    #[arg(long, value_enum, default_value_t = Keymap::Conventional)]
    pub keymap: Keymap,

    /// write logs here; otherwise only warnings go to stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn cycle_delay(&self) -> Duration {
        Duration::from_micros(self.cycle_delay_us)
    }

    pub fn key_hold(&self) -> Duration {
        Duration::from_millis(self.key_hold_ms)
    }
}
