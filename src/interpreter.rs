//! # interpreter
//!
//! One call to `step` is one full fetch/decode/execute cycle:
//!  1. fetch the big-endian word at pc
//!  2. decode it into an `Instruction`; anything unrecognised stops the run
//!  3. apply it to the machine and move pc on
//!  4. tick the timers, unless the cycle was an FX0A wait with no key held
//!
//! All bounds checks happen before anything is written, so a fatal error
//! leaves the machine as it was before the failing step.
use crate::error::FatalError;
use crate::instruction::Instruction;
use crate::machine::{Machine, STACK_DEPTH, VF};
use crate::memory::{MemoryMap, CHIP8_FONT_ADDR, CHIP8_GLYPH_BYTES};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, trace};

/// what a successful cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// an instruction ran to completion and the timers ticked
    Executed,
    /// FX0A found no key held; pc and timers are unchanged
    Blocked,
}

/// where pc goes after an instruction
enum Flow {
    Next,
    Skip,
    Goto(u16),
    Block,
}

impl Flow {
    fn skip_if(cond: bool) -> Flow {
        if cond {
            Flow::Skip
        } else {
            Flow::Next
        }
    }
}

/// Execute exactly one instruction against `machine`, drawing CXNN randoms
/// from `rng`.
pub fn step(machine: &mut Machine, rng: &mut impl Rng) -> Result<Cycle, FatalError> {
    cycle(machine, rng).map_err(|e| {
        error!(error = %e, "interpreter stopped");
        e
    })
}

fn cycle(machine: &mut Machine, rng: &mut impl Rng) -> Result<Cycle, FatalError> {
    let pc = machine.pc;
    let opcode = machine
        .memory
        .get_word(pc)
        .map_err(|e| FatalError::out_of_bounds(pc, e))?;
    let instruction =
        Instruction::decode(opcode).ok_or(FatalError::UnknownOpcode { pc, opcode })?;

    match execute(machine, rng, instruction, pc, opcode)? {
        Flow::Next => machine.pc = pc.wrapping_add(2),
        Flow::Skip => machine.pc = pc.wrapping_add(4),
        Flow::Goto(addr) => machine.pc = addr,
        Flow::Block => {
            trace!(pc, "waiting for a key");
            return Ok(Cycle::Blocked);
        }
    }
    machine.timers.tick();
    Ok(Cycle::Executed)
}

fn execute(
    m: &mut Machine,
    rng: &mut impl Rng,
    instruction: Instruction,
    pc: u16,
    opcode: u16,
) -> Result<Flow, FatalError> {
    use Instruction::*;

    let oob = |e| FatalError::out_of_bounds(pc, e);

    let flow = match instruction {
        ClearScreen => {
            m.framebuffer.clear();
            Flow::Next
        }
        Return => {
            if m.sp == 0 {
                return Err(FatalError::StackUnderflow { pc, opcode });
            }
            m.sp -= 1;
            // the stack holds the address of the call itself
            Flow::Goto(m.stack[m.sp].wrapping_add(2))
        }
        Jump(addr) => Flow::Goto(addr),
        Call(addr) => {
            if m.sp == STACK_DEPTH {
                return Err(FatalError::StackOverflow { pc, opcode });
            }
            m.stack[m.sp] = pc;
            m.sp += 1;
            Flow::Goto(addr)
        }
        SkipIfEqConst { x, nn } => Flow::skip_if(m.v[x] == nn),
        SkipIfNeConst { x, nn } => Flow::skip_if(m.v[x] != nn),
        SkipIfEqReg { x, y } => Flow::skip_if(m.v[x] == m.v[y]),
        SkipIfNeReg { x, y } => Flow::skip_if(m.v[x] != m.v[y]),
        SetConst { x, nn } => {
            m.v[x] = nn;
            Flow::Next
        }
        AddConst { x, nn } => {
            m.v[x] = m.v[x].wrapping_add(nn);
            Flow::Next
        }
        Assign { x, y } => {
            m.v[x] = m.v[y];
            Flow::Next
        }
        Or { x, y } => {
            m.v[x] |= m.v[y];
            Flow::Next
        }
        And { x, y } => {
            m.v[x] &= m.v[y];
            Flow::Next
        }
        Xor { x, y } => {
            m.v[x] ^= m.v[y];
            Flow::Next
        }
        // flag results are written last so VF as a destination ends up
        // holding the flag
        AddReg { x, y } => {
            let (sum, carry) = m.v[x].overflowing_add(m.v[y]);
            m.v[x] = sum;
            m.v[VF] = carry as u8;
            Flow::Next
        }
        SubReg { x, y } => {
            let (diff, borrow) = m.v[x].overflowing_sub(m.v[y]);
            m.v[x] = diff;
            m.v[VF] = !borrow as u8;
            Flow::Next
        }
        SubFromReg { x, y } => {
            let (diff, borrow) = m.v[y].overflowing_sub(m.v[x]);
            m.v[x] = diff;
            m.v[VF] = !borrow as u8;
            Flow::Next
        }
        ShiftRight { x } => {
            let old = m.v[x];
            m.v[x] = old >> 1;
            m.v[VF] = old & 0x01;
            Flow::Next
        }
        ShiftLeft { x } => {
            let old = m.v[x];
            m.v[x] = old << 1;
            m.v[VF] = old >> 7;
            Flow::Next
        }
        SetIndex(addr) => {
            m.i = addr;
            Flow::Next
        }
        JumpOffset(addr) => Flow::Goto(addr + m.v[0] as u16),
        Random { x, nn } => {
            m.v[x] = rng.random::<u8>() & nn;
            Flow::Next
        }
        Draw { x, y, n } => {
            let rows = m.memory.get_ro_slice(m.i, n as usize).map_err(oob)?;
            let collision = m.framebuffer.draw_sprite(m.v[x], m.v[y], rows);
            m.v[VF] = collision as u8;
            Flow::Next
        }
        SkipIfKey { x } => Flow::skip_if(m.is_key_pressed(m.v[x])),
        SkipIfNotKey { x } => Flow::skip_if(!m.is_key_pressed(m.v[x])),
        GetDelay { x } => {
            m.v[x] = m.timers.delay;
            Flow::Next
        }
        WaitKey { x } => match m.first_pressed_key() {
            Some(key) => {
                m.v[x] = key;
                Flow::Next
            }
            None => Flow::Block,
        },
        SetDelay { x } => {
            m.timers.delay = m.v[x];
            Flow::Next
        }
        SetSound { x } => {
            m.timers.sound = m.v[x];
            Flow::Next
        }
        AddIndex { x } => {
            let (sum, overflow) = m.i.overflowing_add(m.v[x] as u16);
            m.i = sum;
            m.v[VF] = overflow as u8;
            Flow::Next
        }
        GlyphAddress { x } => {
            m.i = CHIP8_FONT_ADDR + m.v[x] as u16 * CHIP8_GLYPH_BYTES;
            Flow::Next
        }
        StoreBcd { x } => {
            let value = m.v[x];
            let digits = m.memory.get_rw_slice(m.i, 3).map_err(oob)?;
            digits.copy_from_slice(&[value / 100, (value / 10) % 10, value % 10]);
            Flow::Next
        }
        StoreRegisters { x } => {
            let dst = m.memory.get_rw_slice(m.i, x + 1).map_err(oob)?;
            dst.copy_from_slice(&m.v[..=x]);
            Flow::Next
        }
        LoadRegisters { x } => {
            let src = m.memory.get_ro_slice(m.i, x + 1).map_err(oob)?;
            m.v[..=x].copy_from_slice(src);
            Flow::Next
        }
    };
    Ok(flow)
}

/// A machine paired with the random source its CXNN instructions draw from.
pub struct Chip8Interpreter<R = StdRng> {
    machine: Machine,
    rng: R,
}

impl Chip8Interpreter<StdRng> {
    /// randomness seeded from the OS
    pub fn new(machine: Machine) -> Self {
        Chip8Interpreter::with_rng(machine, StdRng::from_os_rng())
    }

    /// reproducible randomness
    pub fn seeded(machine: Machine, seed: u64) -> Self {
        Chip8Interpreter::with_rng(machine, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Chip8Interpreter<R> {
    pub fn with_rng(machine: Machine, rng: R) -> Self {
        Chip8Interpreter { machine, rng }
    }

    /// run one fetch/decode/execute cycle
    pub fn step(&mut self) -> Result<Cycle, FatalError> {
        step(&mut self.machine, &mut self.rng)
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.machine.set_key(key, pressed);
    }

    /// row-major 64x32 pixels, one byte each
    pub fn framebuffer_view(&self) -> &[u8] {
        self.machine.framebuffer().pixels()
    }

    pub fn redraw_pending(&self) -> bool {
        self.machine.redraw_pending()
    }

    pub fn clear_redraw(&mut self) {
        self.machine.clear_redraw();
    }

    /// (delay, sound)
    pub fn timer_snapshot(&self) -> (u8, u8) {
        self.machine.timer_snapshot()
    }
}
