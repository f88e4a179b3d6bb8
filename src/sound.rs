use beep::beep;
use std::error::Error;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use tracing::debug;

/// Something that can make the machine's single tone. The environment calls
/// `beep` when the sound timer becomes non-zero and `stop` when it runs out.
pub trait Sound {
    fn beep(&mut self) -> Result<(), Box<dyn Error>>;
    fn stop(&mut self) -> Result<(), Box<dyn Error>>;
}

/// C7, close enough to the VIP's buzzer
pub const DEFAULT_TONE_HZ: u16 = 2093;

const CONSOLE: &str = "/dev/console";

/// tone from the console speaker. needs access to the linux console
pub struct SimpleBeep {
    pitch: u16,
}

impl SimpleBeep {
    /// fails if the console can't be opened, which the `beep` crate would
    /// otherwise turn into a panic on the first tone
    pub fn new(pitch: u16) -> io::Result<Self> {
        Self::on_console(pitch, Path::new(CONSOLE))
    }

    fn on_console(pitch: u16, console: &Path) -> io::Result<Self> {
        OpenOptions::new().append(true).open(console)?;
        Ok(SimpleBeep { pitch })
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        debug!(hz = self.pitch, "tone on");
        beep(self.pitch)?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        debug!("tone off");
        // zero hertz silences the speaker
        beep(0)?;
        Ok(())
    }
}

/// silence
#[derive(Default)]
pub struct Mute;

impl Mute {
    pub fn new() -> Self {
        Mute
    }
}

impl Sound for Mute {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
}
