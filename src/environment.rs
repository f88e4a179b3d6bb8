//! The environment owns the interpreter and its peripherals and runs the main
//! loop:
//!
//! ```text
//! loop {
//!     interpreter.step()            // one instruction, or a blocked FX0A
//!     feed key events into the machine; stop on quit
//!     if redraw pending { display.draw(); clear_redraw() }
//!     beep while the sound timer is non-zero
//!     sleep(cycle_delay)
//! }
//! ```
//!
//! NB. sleeping a fixed time per instruction is not authentic COSMAC VIP
//! timing, but it's what most programs expect
use crate::display::Display;
use crate::error::FatalError;
use crate::input::{Input, InputEvent};
use crate::interpreter::Chip8Interpreter;
use crate::sound::Sound;
use rand::rngs::StdRng;
use rand::Rng;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// why the main loop returned normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// the user asked to stop
    Quit { cycles: u64 },
    /// the configured cycle budget ran out
    CycleLimit { cycles: u64 },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Fatal(#[from] FatalError),

    #[error("display or input failed: {0}")]
    Io(#[from] io::Error),
}

pub struct Environment<'a, R = StdRng> {
    interpreter: Chip8Interpreter<R>,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    cycle_delay: Duration,
    beeping: bool,
    sound_failed: bool,
}

impl<'a, R: Rng> Environment<'a, R> {
    pub fn new(
        interpreter: Chip8Interpreter<R>,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        cycle_delay: Duration,
    ) -> Self {
        Environment {
            interpreter,
            display,
            input,
            sound,
            cycle_delay,
            beeping: false,
            sound_failed: false,
        }
    }

    pub fn interpreter(&self) -> &Chip8Interpreter<R> {
        &self.interpreter
    }

    /// run until quit, a fatal error, or `max_cycles` steps. the tone is
    /// always switched off on the way out, error or not
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<RunOutcome, RunError> {
        let result = self.run_loop(max_cycles);
        self.silence();
        match &result {
            Ok(outcome) => info!(?outcome, "run finished"),
            Err(e) => error!(error = %e, "run stopped"),
        }
        result
    }

    fn run_loop(&mut self, max_cycles: Option<u64>) -> Result<RunOutcome, RunError> {
        let mut cycles = 0;
        loop {
            if max_cycles.is_some_and(|max| cycles >= max) {
                return Ok(RunOutcome::CycleLimit { cycles });
            }
            self.interpreter.step()?;
            cycles += 1;

            if self.apply_input()? {
                return Ok(RunOutcome::Quit { cycles });
            }
            self.refresh_display()?;
            self.gate_sound();

            if !self.cycle_delay.is_zero() {
                spin_sleep::sleep(self.cycle_delay);
            }
        }
    }

    /// feed key events to the machine; true if the user wants out
    fn apply_input(&mut self) -> Result<bool, RunError> {
        for event in self.input.poll_events()? {
            match event {
                InputEvent::Key { key, pressed } => {
                    debug!(key, pressed, "key");
                    self.interpreter.set_key(key, pressed);
                }
                InputEvent::Quit => return Ok(true),
            }
        }
        Ok(false)
    }

    fn refresh_display(&mut self) -> Result<(), RunError> {
        if self.interpreter.redraw_pending() {
            self.display.draw(self.interpreter.framebuffer_view())?;
            self.interpreter.clear_redraw();
        }
        Ok(())
    }

    /// switch the tone only when the sound timer crosses zero. a broken
    /// speaker is logged once and then left alone; the program keeps running
    fn gate_sound(&mut self) {
        if self.sound_failed {
            return;
        }
        let (_, sound) = self.interpreter.timer_snapshot();
        match (sound > 0, self.beeping) {
            (true, false) => match self.sound.beep() {
                Ok(()) => self.beeping = true,
                Err(e) => {
                    warn!(error = %e, "could not start the tone; carrying on without sound");
                    self.sound_failed = true;
                }
            },
            (false, true) => self.silence(),
            _ => {}
        }
    }

    fn silence(&mut self) {
        if self.beeping {
            self.beeping = false;
            if let Err(e) = self.sound.stop() {
                error!(error = %e, "could not stop the tone");
                self.sound_failed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::input::DummyInput;
    use crate::machine::Machine;
    use crate::sound::Mute;
    use std::error::Error;

    /// counts tone switches
    #[derive(Default)]
    struct Recorder {
        beeps: usize,
        stops: usize,
    }

    impl Sound for Recorder {
        fn beep(&mut self) -> Result<(), Box<dyn Error>> {
            self.beeps += 1;
            Ok(())
        }
        fn stop(&mut self) -> Result<(), Box<dyn Error>> {
            self.stops += 1;
            Ok(())
        }
    }

    fn interpreter(prog: &[u8]) -> Chip8Interpreter {
        Chip8Interpreter::seeded(Machine::initialize(prog).unwrap(), 1)
    }

    #[test]
    fn test_cycle_limit() -> Result<(), RunError> {
        let mut display = DummyDisplay::new(64, 32);
        let mut input = DummyInput::new(vec![]);
        let mut sound = Mute::new();
        let mut env = Environment::new(
            interpreter(&[0x12, 0x00]),
            &mut display,
            &mut input,
            &mut sound,
            Duration::ZERO,
        );
        assert_eq!(env.run(Some(10))?, RunOutcome::CycleLimit { cycles: 10 });
        Ok(())
    }

    #[test]
    fn test_quit_stops_run() -> Result<(), RunError> {
        let mut display = DummyDisplay::new(64, 32);
        let mut input = DummyInput::new(vec![vec![], vec![], vec![InputEvent::Quit]]);
        let mut sound = Mute::new();
        let mut env = Environment::new(
            interpreter(&[0x12, 0x00]),
            &mut display,
            &mut input,
            &mut sound,
            Duration::ZERO,
        );
        assert_eq!(env.run(None)?, RunOutcome::Quit { cycles: 3 });
        Ok(())
    }

    #[test]
    fn test_draws_only_on_redraw() -> Result<(), RunError> {
        let mut display = DummyDisplay::new(64, 32);
        let mut input = DummyInput::new(vec![]);
        let mut sound = Mute::new();
        {
            // clear screen, draw glyph 0, then spin
            let mut env = Environment::new(
                interpreter(&[0x00, 0xe0, 0xd0, 0x05, 0x12, 0x04]),
                &mut display,
                &mut input,
                &mut sound,
                Duration::ZERO,
            );
            env.run(Some(20))?;
            assert!(!env.interpreter().redraw_pending());
        }
        assert_eq!(display.frames.len(), 2);
        assert!(display.frames[0].iter().all(|&p| p == 0));
        assert_eq!(display.frames[1][..4], [1, 1, 1, 1]);
        Ok(())
    }

    #[test]
    fn test_keys_reach_wait_instruction() -> Result<(), RunError> {
        let mut display = DummyDisplay::new(64, 32);
        // key 7 goes down after the third cycle
        let mut input = DummyInput::new(vec![
            vec![],
            vec![],
            vec![InputEvent::Key {
                key: 7,
                pressed: true,
            }],
        ]);
        let mut sound = Mute::new();
        let mut env = Environment::new(
            interpreter(&[0xf5, 0x0a, 0x12, 0x02]),
            &mut display,
            &mut input,
            &mut sound,
            Duration::ZERO,
        );
        env.run(Some(4))?;
        let m = env.interpreter().machine();
        assert_eq!(m.registers()[5], 7);
        assert_eq!(m.program_counter(), 0x202);
        Ok(())
    }

    #[test]
    fn test_sound_follows_timer() -> Result<(), RunError> {
        let mut display = DummyDisplay::new(64, 32);
        let mut input = DummyInput::new(vec![]);
        let mut sound = Recorder::default();
        {
            // V0 = 3; sound = V0; spin
            let mut env = Environment::new(
                interpreter(&[0x60, 0x03, 0xf0, 0x18, 0x12, 0x04]),
                &mut display,
                &mut input,
                &mut sound,
                Duration::ZERO,
            );
            env.run(Some(10))?;
        }
        assert_eq!(sound.beeps, 1);
        assert_eq!(sound.stops, 1);
        Ok(())
    }

    #[test]
    fn test_fatal_error_ends_run() {
        let mut display = DummyDisplay::new(64, 32);
        let mut input = DummyInput::new(vec![]);
        let mut sound = Mute::new();
        let mut env = Environment::new(
            interpreter(&[0x60, 0x01, 0x00, 0xf1]),
            &mut display,
            &mut input,
            &mut sound,
            Duration::ZERO,
        );
        match env.run(None) {
            Err(RunError::Fatal(e)) => assert_eq!(
                e,
                FatalError::UnknownOpcode {
                    pc: 0x202,
                    opcode: 0x00f1
                }
            ),
            other => panic!("expected a fatal error, got {:?}", other),
        }
    }

    #[test]
    fn test_fatal_error_switches_tone_off() {
        let mut display = DummyDisplay::new(64, 32);
        let mut input = DummyInput::new(vec![]);
        let mut sound = Recorder::default();
        {
            // V0 = 0x40; sound = V0; unknown opcode
            let mut env = Environment::new(
                interpreter(&[0x60, 0x40, 0xf0, 0x18, 0x00, 0xf1]),
                &mut display,
                &mut input,
                &mut sound,
                Duration::ZERO,
            );
            assert!(matches!(env.run(None), Err(RunError::Fatal(_))));
        }
        assert_eq!(sound.beeps, 1);
        assert_eq!(sound.stops, sound.beeps);
    }

    /// a speaker that can't be opened
    #[derive(Default)]
    struct Broken {
        attempts: usize,
    }

    impl Sound for Broken {
        fn beep(&mut self) -> Result<(), Box<dyn Error>> {
            self.attempts += 1;
            Err("permission denied".into())
        }
        fn stop(&mut self) -> Result<(), Box<dyn Error>> {
            Err("permission denied".into())
        }
    }

    #[test]
    fn test_broken_speaker_does_not_stop_run() -> Result<(), RunError> {
        let mut display = DummyDisplay::new(64, 32);
        let mut input = DummyInput::new(vec![]);
        let mut sound = Broken::default();
        {
            // V0 = 0x40; sound = V0; spin
            let mut env = Environment::new(
                interpreter(&[0x60, 0x40, 0xf0, 0x18, 0x12, 0x04]),
                &mut display,
                &mut input,
                &mut sound,
                Duration::ZERO,
            );
            assert_eq!(env.run(Some(100))?, RunOutcome::CycleLimit { cycles: 100 });
        }
        // given up on after the first failure
        assert_eq!(sound.attempts, 1);
        Ok(())
    }
}
