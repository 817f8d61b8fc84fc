// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Error type for Chirp

use thiserror::Error;

/// Result type, equivalent to [std::result::Result]<T, [enum@Error]>
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Chirp.
#[derive(Debug, Error)]
pub enum Error {
    /// Represents an opcode which matches no instruction pattern
    #[error("opcode {word:04x} not recognized at {addr:03x} (program offset {offset:+})")]
    UnimplementedInstruction {
        /// The offending word
        word: u16,
        /// The absolute address of the word
        addr: u16,
        /// The address of the word relative to the start of the program
        offset: i32,
    },
    /// A call was made with all sixteen stack slots in use
    #[error("stack overflow: call at {addr:03x} with a full stack")]
    StackOverflow {
        /// Address of the offending call
        addr: u16,
    },
    /// A return was made with nothing on the stack
    #[error("stack underflow: return at {addr:03x} with an empty stack")]
    StackUnderflow {
        /// Address of the offending return
        addr: u16,
    },
    /// Tried to press a key that doesn't exist
    #[error("tried to press key {key:X} which does not exist")]
    InvalidKey {
        /// The offending key
        key: usize,
    },
    /// Tried to get/set an out-of-bounds register
    #[error("tried to access register v{reg:X} which does not exist")]
    InvalidRegister {
        /// The offending register
        reg: usize,
    },
    /// The program does not fit between the load address and the end of memory
    #[error("program of {len} bytes does not fit in {max} bytes of program memory")]
    ProgramTooLarge {
        /// Length of the rejected program
        len: usize,
        /// Space available for programs
        max: usize,
    },
    /// A blocking wait for input was cancelled by the host
    #[error("wait for key interrupted")]
    Interrupted,
    /// Error originated in [std::io]
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
