// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE.txt for details)

//! This crate implements a Chip-8 interpreter as a small virtual machine:
//! a 4 KiB memory with the hex glyphs preloaded, sixteen 8-bit registers,
//! a 64x32 XOR framebuffer, and two 60Hz timers which tick on their own
//! threads while the interpreter runs.
//!
//! Input arrives asynchronously through a shared [io::Keypad], which also
//! provides the rendezvous used by the blocking "wait for key" instruction.

pub mod cpu;
pub mod error;
pub mod io;
pub mod screen;
pub mod timer;

pub use cpu::{
    flags::Flags,
    instruction::{
        disassembler::{Dis, Disassembler},
        Insn,
    },
    mem::{Mem, Region},
    Registers, State, StopHandle, CPU,
};
pub use error::{Error, Result};
pub use io::Keypad;
pub use screen::{Screen, ScreenView};
pub use timer::Timer;

/// Common imports for chirp-vm
pub mod prelude {
    pub use super::*;
    pub use super::cpu::mem::{ReadWrite, Region::*};
}
