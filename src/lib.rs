//! A CHIP-8 interpreter.
//!
//! ## Design
//!
//! * the core is pure: a `Machine` aggregate plus a `step` function that runs
//!   exactly one instruction against it. no globals, no I/O, no sleeping
//! * arithmetic wraps explicitly; VF gets the carry/borrow/collision flag and
//!   always wins when it's also the destination
//! * anything the original COSMAC VIP would have choked on (unknown opcode,
//!   stack over/underflow, touching memory past 0xfff) stops the run with a
//!   `FatalError` naming the pc. no attempt is made to carry on
//! * FX0A doesn't block a thread; the cycle just doesn't advance pc and the
//!   timers don't tick until a key is held
//! * display, input and sound sit behind traits so the interpreter doesn't
//!   need to know how they work; the terminal versions use TUI, crossterm and
//!   the console beeper
//!
//! Model
//!
//! ```text
//! Environment
//!  |-- display, input, sound
//!  |-- interpreter(machine, rng)
//!  |    |-- machine: memory(glyphs, program), registers, stack, timers,
//!  |    |            framebuffer, keys
//!  |    `-- instruction decode
//!  `-- main loop
//!       |-- interpreter.step()
//!       |-- feed key events into the machine
//!       |-- draw if the framebuffer changed
//!       |-- beep while the sound timer runs
//!       `-- sleep(cycle delay)
//! ```
pub mod config;
pub mod display;
pub mod environment;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod machine;
pub mod memory;
pub mod sound;
pub mod timer;

pub use error::{FatalError, LoadError};
pub use interpreter::{step, Chip8Interpreter, Cycle};
pub use machine::Machine;
