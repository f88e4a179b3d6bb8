use std::io;
use thiserror::Error;

/// Failure to produce an initialised machine from a program image.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read program image: {0}")]
    Io(#[from] io::Error),

    #[error("program image is empty")]
    Empty,
}

/// An access that falls outside the 4K address space.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("access of {len} byte(s) at {addr:#05x} is outside memory")]
pub struct MemoryError {
    pub addr: usize,
    pub len: usize,
}

/// Conditions that stop the interpreter. Each carries the program counter of
/// the instruction that raised it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FatalError {
    #[error("unknown opcode {opcode:#06x} at {pc:#05x}")]
    UnknownOpcode { pc: u16, opcode: u16 },

    #[error("stack overflow: {opcode:#06x} at {pc:#05x} called with 16 frames in use")]
    StackOverflow { pc: u16, opcode: u16 },

    #[error("stack underflow: {opcode:#06x} at {pc:#05x} returned with an empty stack")]
    StackUnderflow { pc: u16, opcode: u16 },

    #[error("out of bounds at {pc:#05x}: {len} byte(s) at {addr:#06x}")]
    OutOfBounds { pc: u16, addr: usize, len: usize },
}

impl FatalError {
    /// program counter of the faulting instruction
    pub fn pc(&self) -> u16 {
        match *self {
            FatalError::UnknownOpcode { pc, .. }
            | FatalError::StackOverflow { pc, .. }
            | FatalError::StackUnderflow { pc, .. }
            | FatalError::OutOfBounds { pc, .. } => pc,
        }
    }

    pub(crate) fn out_of_bounds(pc: u16, err: MemoryError) -> Self {
        FatalError::OutOfBounds {
            pc,
            addr: err.addr,
            len: err.len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_error_reports_pc() {
        let e = FatalError::UnknownOpcode {
            pc: 0x204,
            opcode: 0x00f1,
        };
        assert_eq!(e.pc(), 0x204);
        assert_eq!(e.to_string(), "unknown opcode 0x00f1 at 0x204");
    }

    #[test]
    fn test_memory_error_converts() {
        let e = FatalError::out_of_bounds(0x300, MemoryError { addr: 0xfff, len: 2 });
        assert_eq!(
            e,
            FatalError::OutOfBounds {
                pc: 0x300,
                addr: 0xfff,
                len: 2
            }
        );
    }

    #[test]
    fn test_load_error_from_io() {
        let e: LoadError = io::Error::new(io::ErrorKind::NotFound, "nope").into();
        assert!(matches!(e, LoadError::Io(_)));
    }
}
