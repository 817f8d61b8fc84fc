// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The Mem represents the CPU's memory
//!
//! All addressing wraps modulo [MEM_SIZE], so nothing the interpreter does
//! with `I` or the program counter can index out of bounds.

use crate::error::{Error, Result};
use std::{
    fmt::{Display, Formatter},
    ops::Range,
};

/// The size of the Chip-8's memory, in bytes.
pub const MEM_SIZE: usize = 0x1000;
/// The address where programs are loaded.
pub const PROG_START: u16 = 0x200;
/// Height, in bytes, of a single hex glyph
pub const GLYPH_HEIGHT: u16 = 5;

/// The hex digit glyphs 0-F, five rows each
#[rustfmt::skip]
pub const CHARSET: [[u8; GLYPH_HEIGHT as usize]; 16] = [
    [0xf0, 0x90, 0x90, 0x90, 0xf0], // 0
    [0x20, 0x60, 0x20, 0x20, 0x70], // 1
    [0xf0, 0x10, 0xf0, 0x80, 0xf0], // 2
    [0xf0, 0x10, 0xf0, 0x10, 0xf0], // 3
    [0x90, 0x90, 0xf0, 0x10, 0x10], // 4
    [0xf0, 0x80, 0xf0, 0x10, 0xf0], // 5
    [0xf0, 0x80, 0xf0, 0x90, 0xf0], // 6
    [0xf0, 0x10, 0x20, 0x40, 0x40], // 7
    [0xf0, 0x90, 0xf0, 0x90, 0xf0], // 8
    [0xf0, 0x90, 0xf0, 0x10, 0xf0], // 9
    [0xf0, 0x90, 0xf0, 0x90, 0x90], // A
    [0xe0, 0x90, 0xe0, 0x90, 0xe0], // B
    [0xf0, 0x80, 0x80, 0x80, 0xf0], // C
    [0xe0, 0x90, 0x90, 0x90, 0xe0], // D
    [0xf0, 0x80, 0xf0, 0x80, 0xf0], // E
    [0xf0, 0x80, 0xf0, 0x80, 0x80], // F
];

/// Reads and writes a `T` at a wrapping address.
///
/// Multi-byte values are big-endian, and each byte's address wraps
/// independently, so a word at `0xfff` is made of `0xfff` and `0x000`.
pub trait ReadWrite<T> {
    /// Reads a T from address `addr`
    fn read(&self, addr: impl Into<usize>) -> T;
    /// Writes a T to address `addr`
    fn write(&mut self, addr: impl Into<usize>, data: T);
}

/// Represents a named region in memory
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    /// Character ROM (but writable!)
    Charset,
    /// Program memory
    Program,
}

impl Region {
    /// The range of addresses covered by this region
    pub fn range(self) -> Range<usize> {
        match self {
            Region::Charset => 0..CHARSET.len() * GLYPH_HEIGHT as usize,
            Region::Program => PROG_START as usize..MEM_SIZE,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Charset => "Charset",
                Region::Program => "Program",
            }
        )
    }
}

/// Stores the 4 KiB of Chip-8 memory
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mem {
    memory: Vec<u8>,
}

impl Default for Mem {
    fn default() -> Self {
        Mem::new()
    }
}

impl Mem {
    /// Constructs a new mem, with the charset loaded at address 0
    /// # Examples
    /// ```rust
    ///# use chirp_vm::prelude::*;
    /// let mem = Mem::new();
    /// assert_eq!(0x1000, mem.len());
    /// // The glyph for `0` starts at address 0
    /// assert_eq!(0xf0, ReadWrite::<u8>::read(&mem, 0usize));
    /// ```
    pub fn new() -> Self {
        let mut mem = Mem {
            memory: vec![0; MEM_SIZE],
        };
        mem.load_charset();
        mem
    }

    /// Gets the length of the backing memory
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if the backing memory contains no elements
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Gets the address of the glyph for hex digit `digit`
    ///
    /// Values above `0xf` are not masked, and land past the end of the charset.
    pub fn glyph(digit: u8) -> u16 {
        digit as u16 * GLYPH_HEIGHT
    }

    /// Gets the whole of memory as a slice
    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }

    /// Gets a slice of a named [Region] of memory
    pub fn get_region(&self, name: Region) -> &[u8] {
        &self.memory[name.range()]
    }

    /// Gets a mutable slice of a named [Region] of memory
    pub fn get_region_mut(&mut self, name: Region) -> &mut [u8] {
        &mut self.memory[name.range()]
    }

    /// Fills a [Region] with zeroes
    pub fn clear_region(&mut self, name: Region) -> &mut Self {
        self.get_region_mut(name).fill(0);
        self
    }

    /// Loads data into the start of a named [Region]
    ///
    /// Returns [Error::ProgramTooLarge] if the data does not fit.
    /// # Examples
    /// ```rust
    ///# use chirp_vm::prelude::*;
    ///# fn main() -> Result<()> {
    /// let mut mem = Mem::new();
    /// mem.load_region(Program, b"\x12\x00")?;
    /// let word: u16 = mem.read(0x200usize);
    /// assert_eq!(0x1200, word);
    ///#    Ok(())
    ///# }
    /// ```
    pub fn load_region(&mut self, name: Region, data: &[u8]) -> Result<&mut Self> {
        let region = self.get_region_mut(name);
        let max = region.len();
        region
            .get_mut(..data.len())
            .ok_or(Error::ProgramTooLarge {
                len: data.len(),
                max,
            })?
            .copy_from_slice(data);
        Ok(self)
    }

    /// Copies `data` into memory starting at `addr`, wrapping at the end of memory
    pub fn write_slice(&mut self, addr: u16, data: &[u8]) {
        for (offset, &byte) in data.iter().enumerate() {
            ReadWrite::<u8>::write(self, addr as usize + offset, byte);
        }
    }

    /// Reads `len` bytes starting at `addr`, wrapping at the end of memory
    pub fn read_slice(&self, addr: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|offset| ReadWrite::<u8>::read(self, addr as usize + offset))
            .collect()
    }

    fn load_charset(&mut self) {
        for (glyph, rows) in self
            .get_region_mut(Region::Charset)
            .chunks_exact_mut(GLYPH_HEIGHT as usize)
            .zip(CHARSET.iter())
        {
            glyph.copy_from_slice(rows);
        }
    }
}

impl ReadWrite<u8> for Mem {
    #[inline(always)]
    fn read(&self, addr: impl Into<usize>) -> u8 {
        self.memory[addr.into() % MEM_SIZE]
    }
    #[inline(always)]
    fn write(&mut self, addr: impl Into<usize>, data: u8) {
        self.memory[addr.into() % MEM_SIZE] = data;
    }
}

impl ReadWrite<u16> for Mem {
    /// Chip-8 is a big-endian system
    #[inline(always)]
    fn read(&self, addr: impl Into<usize>) -> u16 {
        let addr = addr.into();
        u16::from_be_bytes([
            ReadWrite::<u8>::read(self, addr),
            ReadWrite::<u8>::read(self, addr + 1),
        ])
    }
    #[inline(always)]
    fn write(&mut self, addr: impl Into<usize>, data: u16) {
        let addr = addr.into();
        let [high, low] = data.to_be_bytes();
        ReadWrite::<u8>::write(self, addr, high);
        ReadWrite::<u8>::write(self, addr + 1, low);
    }
}
