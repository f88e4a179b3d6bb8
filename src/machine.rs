//! # machine state
//!
//! Everything the interpreter reads or writes lives in one owned aggregate:
//!  * 4K memory with the glyph table at 0x000 and the program at 0x200
//!  * V0-VF byte registers; VF doubles as the carry/borrow/collision flag
//!  * I, a 16-bit address register
//!  * the program counter, starting at 0x200
//!  * a 16 deep call stack of return addresses
//!  * delay and sound timers
//!  * the 64x32 framebuffer and its redraw flag
//!  * 16 key states, written only by the input side
use crate::error::LoadError;
use crate::framebuffer::Framebuffer;
use crate::memory::{Chip8Memory, CHIP8_PROGRAM_ADDR};
use crate::timer::Timers;
use std::io;
use tracing::info;

pub const REGISTER_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;
pub const KEY_COUNT: usize = 16;

/// index of the flag register
pub const VF: usize = 0xf;

#[derive(Clone)]
pub struct Machine {
    pub(crate) memory: Chip8Memory,
    pub(crate) v: [u8; REGISTER_COUNT],
    pub(crate) i: u16,
    pub(crate) pc: u16,
    pub(crate) stack: [u16; STACK_DEPTH],
    pub(crate) sp: usize,
    pub(crate) timers: Timers,
    pub(crate) framebuffer: Framebuffer,
    pub(crate) keys: [bool; KEY_COUNT],
}

impl Machine {
    /// blank machine: glyphs loaded, no program, everything else zeroed
    fn blank() -> Self {
        Machine {
            memory: Chip8Memory::new(),
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: CHIP8_PROGRAM_ADDR,
            stack: [0; STACK_DEPTH],
            sp: 0,
            timers: Timers::default(),
            framebuffer: Framebuffer::new(),
            keys: [false; KEY_COUNT],
        }
    }

    /// build a ready-to-run machine from a program image. images longer than
    /// 0xe00 bytes are truncated; an empty image is an error
    pub fn initialize(program: &[u8]) -> Result<Machine, LoadError> {
        if program.is_empty() {
            return Err(LoadError::Empty);
        }
        let mut m = Machine::blank();
        let loaded = m.memory.load_program(program);
        info!(bytes = loaded, "machine initialised");
        Ok(m)
    }

    /// as `initialize`, reading the image from wherever the caller got it
    pub fn load(reader: &mut impl io::Read) -> Result<Machine, LoadError> {
        let program = Chip8Memory::read_program(reader)?;
        Machine::initialize(&program)
    }

    pub fn memory(&self) -> &Chip8Memory {
        &self.memory
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.v
    }

    pub fn index_register(&self) -> u16 {
        self.i
    }

    pub fn program_counter(&self) -> u16 {
        self.pc
    }

    /// return addresses currently on the stack, oldest first
    pub fn call_stack(&self) -> &[u16] {
        &self.stack[..self.sp]
    }

    pub fn stack_pointer(&self) -> usize {
        self.sp
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn redraw_pending(&self) -> bool {
        self.framebuffer.redraw_pending()
    }

    pub fn clear_redraw(&mut self) {
        self.framebuffer.clear_redraw();
    }

    /// (delay, sound)
    pub fn timer_snapshot(&self) -> (u8, u8) {
        self.timers.snapshot()
    }

    /// record a key going down or up. keys outside 0-F are ignored
    pub fn set_key(&mut self, key: u8, pressed: bool) {
        if let Some(k) = self.keys.get_mut(key as usize) {
            *k = pressed;
        }
    }

    pub fn is_key_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    /// lowest-numbered key currently held, if any
    pub fn first_pressed_key(&self) -> Option<u8> {
        self.keys.iter().position(|&k| k).map(|k| k as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryMap, CHIP8_FONT};

    #[test]
    fn test_initialize_layout() -> Result<(), LoadError> {
        let m = Machine::initialize(&[0x00, 0xe0, 0x12, 0x00])?;
        assert_eq!(m.program_counter(), 0x200);
        assert_eq!(m.stack_pointer(), 0);
        assert_eq!(m.index_register(), 0);
        assert_eq!(m.registers(), &[0; 16]);
        assert_eq!(m.timer_snapshot(), (0, 0));
        assert_eq!(m.first_pressed_key(), None);
        assert_eq!(m.memory().as_slice()[..80], CHIP8_FONT);
        assert_eq!(
            m.memory().get_ro_slice(0x200, 4).unwrap(),
            &[0x00, 0xe0, 0x12, 0x00]
        );
        Ok(())
    }

    #[test]
    fn test_initialize_empty_fails() {
        assert!(matches!(Machine::initialize(&[]), Err(LoadError::Empty)));
    }

    #[test]
    fn test_initialize_truncates_oversize() -> Result<(), LoadError> {
        let prog = vec![0x11; 0x1000];
        let m = Machine::initialize(&prog)?;
        assert_eq!(m.memory().as_slice().len(), 4096);
        assert!(m.memory().as_slice()[0x200..].iter().all(|&b| b == 0x11));
        Ok(())
    }

    #[test]
    fn test_load_from_reader() -> Result<(), LoadError> {
        let mut src: &[u8] = &[0x60, 0x01];
        let m = Machine::load(&mut src)?;
        assert_eq!(m.memory().get_word(0x200).unwrap(), 0x6001);
        Ok(())
    }

    #[test]
    fn test_load_reader_failure() {
        struct Broken;
        impl io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "gone"))
            }
        }
        assert!(matches!(Machine::load(&mut Broken), Err(LoadError::Io(_))));
    }

    #[test]
    fn test_set_key() -> Result<(), LoadError> {
        let mut m = Machine::initialize(&[0x00, 0xe0])?;
        m.set_key(0xb, true);
        m.set_key(0x4, true);
        assert!(m.is_key_pressed(0xb));
        assert_eq!(m.first_pressed_key(), Some(0x4));
        m.set_key(0x4, false);
        assert_eq!(m.first_pressed_key(), Some(0xb));
        // out of range is a no-op
        m.set_key(0x10, true);
        assert!(!m.is_key_pressed(0x10));
        Ok(())
    }
}
