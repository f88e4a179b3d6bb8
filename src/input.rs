use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::machine::KEY_COUNT;

/// map of characters typed to the hex key they stand for, where '1' => 0x01
/// and 'a' => 0x0a
const CHIP8_LITERAL_KEYMAP: [(char, u8); 16] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// ditto using left-hand side of qwerty keyboard, laid out like the COSMAC
/// VIP keypad
///   1 2 3 4      1 2 3 C
///   q w e r  =>  4 5 6 D
///   a s d f      7 8 9 E
///   z x c v      A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// which characters drive the hex keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Keymap {
    /// 1234/qwer/asdf/zxcv in the keypad's 4x4 layout
    Conventional,
    /// 0-9 and a-f type their own value
    Literal,
}

impl Keymap {
    fn table(self) -> HashMap<char, u8> {
        match self {
            Keymap::Conventional => HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            Keymap::Literal => HashMap::from(CHIP8_LITERAL_KEYMAP),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// hex key 0-F went down or came up
    Key { key: u8, pressed: bool },
    /// the user asked to stop
    Quit,
}

/// reads keypresses
pub trait Input {
    /// everything that happened since the last poll. must not block
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error>;
}

/// Keypad read from the terminal with crossterm. Terminals mostly report
/// presses and auto-repeats but not releases, so a key counts as held until
/// `hold` passes without another press of it.
pub struct TermInput {
    keymap: HashMap<char, u8>,
    hold: Duration,
    held_until: [Option<Instant>; KEY_COUNT],
}

impl TermInput {
    pub fn new(keymap: Keymap, hold: Duration) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keymap: keymap.table(),
            hold,
            held_until: [None; KEY_COUNT],
        })
    }

    /// turn one crossterm key event into keypad events
    fn key_event(&mut self, evt: KeyEvent, now: Instant, out: &mut Vec<InputEvent>) {
        match evt.code {
            KeyCode::Esc => out.push(InputEvent::Quit),
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                out.push(InputEvent::Quit)
            }
            KeyCode::Char(c) => match self.keymap.get(&c.to_ascii_lowercase()) {
                Some(&key) => {
                    let held = &mut self.held_until[key as usize];
                    if held.is_none() {
                        out.push(InputEvent::Key { key, pressed: true });
                    }
                    *held = Some(now + self.hold);
                }
                None => debug!(?c, "key not mapped to the keypad"),
            },
            _ => debug!(code = ?evt.code, "ignoring key"),
        }
    }

    /// release any key whose hold has run out
    fn expire(&mut self, now: Instant, out: &mut Vec<InputEvent>) {
        for (key, held) in self.held_until.iter_mut().enumerate() {
            if matches!(*held, Some(until) if until <= now) {
                *held = None;
                out.push(InputEvent::Key {
                    key: key as u8,
                    pressed: false,
                });
            }
        }
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!(error = %e, "could not leave raw mode");
        }
    }
}

impl Input for TermInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        let mut out = Vec::new();
        while poll(Duration::from_millis(0))? {
            let now = Instant::now();
            match read()? {
                Event::Key(evt) => self.key_event(evt, now, &mut out),
                _ => debug!("ignoring non-key event"),
            }
        }
        self.expire(Instant::now(), &mut out);
        Ok(out)
    }
}

/// dummy Input implementation for testing: hands out one scripted batch of
/// events per poll, then nothing
pub struct DummyInput {
    script: VecDeque<Vec<InputEvent>>,
}

impl DummyInput {
    pub fn new(script: Vec<Vec<InputEvent>>) -> Self {
        DummyInput {
            script: script.into(),
        }
    }
}

impl Input for DummyInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // builds a TermInput without touching the terminal
    fn term_input(keymap: Keymap) -> TermInput {
        TermInput {
            keymap: keymap.table(),
            hold: Duration::from_millis(100),
            held_until: [None; KEY_COUNT],
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_keymaps_cover_every_key() {
        for keymap in [Keymap::Conventional, Keymap::Literal] {
            let mut keys: Vec<u8> = keymap.table().values().copied().collect();
            keys.sort();
            assert_eq!(keys, (0..16).collect::<Vec<u8>>());
        }
    }

    #[test]
    fn test_conventional_layout() {
        let t = Keymap::Conventional.table();
        assert_eq!(t[&'x'], 0x0);
        assert_eq!(t[&'4'], 0xc);
        assert_eq!(t[&'v'], 0xf);
    }

    #[test]
    fn test_press_then_expire() {
        let mut input = term_input(Keymap::Conventional);
        let t0 = Instant::now();
        let mut out = Vec::new();
        input.key_event(key(KeyCode::Char('W')), t0, &mut out);
        assert_eq!(out, vec![InputEvent::Key { key: 5, pressed: true }]);

        // repeat while held: no second press
        out.clear();
        input.key_event(key(KeyCode::Char('w')), t0 + Duration::from_millis(50), &mut out);
        assert!(out.is_empty());

        // hold extended by the repeat
        input.expire(t0 + Duration::from_millis(120), &mut out);
        assert!(out.is_empty());
        input.expire(t0 + Duration::from_millis(150), &mut out);
        assert_eq!(out, vec![InputEvent::Key { key: 5, pressed: false }]);
    }

    #[test]
    fn test_quit_keys() {
        let mut input = term_input(Keymap::Literal);
        let mut out = Vec::new();
        input.key_event(key(KeyCode::Esc), Instant::now(), &mut out);
        input.key_event(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Instant::now(),
            &mut out,
        );
        assert_eq!(out, vec![InputEvent::Quit, InputEvent::Quit]);
    }

    #[test]
    fn test_unmapped_key_ignored() {
        let mut input = term_input(Keymap::Literal);
        let mut out = Vec::new();
        input.key_event(key(KeyCode::Char('z')), Instant::now(), &mut out);
        input.key_event(key(KeyCode::Tab), Instant::now(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_dummy_input_replays_script() -> Result<(), io::Error> {
        let mut input = DummyInput::new(vec![vec![InputEvent::Quit]]);
        assert_eq!(input.poll_events()?, vec![InputEvent::Quit]);
        assert!(input.poll_events()?.is_empty());
        Ok(())
    }
}
