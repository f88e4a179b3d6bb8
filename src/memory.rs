use crate::error::MemoryError;
use std::io;
use std::io::Read;
use tracing::{debug, warn};

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the addressable memory of the machine. Every access is bounds
/// checked; nothing here panics on a bad address.
pub trait MemoryMap {
    /// write as much of `data` as fits at `addr`, returning how many bytes
    /// landed. the rest is silently dropped
    fn write_truncated(&mut self, data: &[u8], addr: u16) -> usize {
        let room = self.size().saturating_sub(addr as usize);
        let len = data.len().min(room);
        match self.write(&data[..len], addr) {
            Ok(()) => len,
            Err(_) => 0,
        }
    }

    /// write a chunk of bytes; fails without writing anything if it doesn't fit
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), MemoryError> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// get a big-endian two-byte word (instruction fetch)
    fn get_word(&self, addr: u16) -> Result<u16, MemoryError> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], MemoryError>;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], MemoryError>;

    /// total addressable bytes
    fn size(&self) -> usize;
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded, and where execution starts
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// largest program image that fits; anything longer is truncated
pub const CHIP8_MAX_PROGRAM_BYTES: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

/// where the hex digit glyphs live; FX29 relies on this being zero
pub const CHIP8_FONT_ADDR: u16 = 0x000;

/// bytes per glyph
pub const CHIP8_GLYPH_BYTES: u16 = 5;

/// Defines the CHIP-8 memory map
///   0x0000-0x004f  glyph table
///   0x0050-0x01ff  reserved (never executed)
///   0x0200-0x0fff  program and its data
///
/// the stack, registers and display live outside addressable memory here
#[derive(Clone)]
pub struct Chip8Memory {
    bytes: Box<[u8; CHIP8_RAM_SIZE_BYTES]>,
}

impl MemoryMap for Chip8Memory {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], MemoryError> {
        let a = addr as usize;
        self.bytes
            .get_mut(a..a + len)
            .ok_or(MemoryError { addr: a, len })
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], MemoryError> {
        let a = addr as usize;
        self.bytes.get(a..a + len).ok_or(MemoryError { addr: a, len })
    }

    fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl Chip8Memory {
    /// zeroed memory with the glyph table baked in
    pub fn new() -> Self {
        let mut bytes = Box::new([0u8; CHIP8_RAM_SIZE_BYTES]);
        let font = CHIP8_FONT_ADDR as usize;
        bytes[font..font + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Chip8Memory { bytes }
    }

    /// copy a program image to 0x200, truncating anything past the end of RAM
    pub fn load_program(&mut self, program: &[u8]) -> usize {
        let written = self.write_truncated(program, CHIP8_PROGRAM_ADDR);
        if written < program.len() {
            warn!(
                len = program.len(),
                kept = written,
                "program image larger than memory; truncated"
            );
        }
        debug!(bytes = written, "program loaded at {:#05x}", CHIP8_PROGRAM_ADDR);
        written
    }

    /// read a program image of unknown length from a reader. reads at most
    /// one byte more than fits, enough for `load_program` to see it's too big
    pub fn read_program(reader: &mut impl Read) -> Result<Vec<u8>, io::Error> {
        let mut buf = Vec::new();
        reader
            .take(CHIP8_MAX_PROGRAM_BYTES as u64 + 1)
            .read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// raw view of all of memory
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl Default for Chip8Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// 4x5 hex digit glyphs, one row per byte, high nibble used
pub const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
