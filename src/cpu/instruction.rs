// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The Chip-8 instruction set, decoded from big-endian words
// the generated decoder masks fields which may be all zero
#![allow(clippy::bad_bit_mask)]

pub mod disassembler;

use imperative_rs::InstructionSet;
use std::fmt::Display;

/// One decoded Chip-8 instruction.
///
/// Field names follow the opcode patterns: `x` and `y` name registers,
/// `B` is an immediate byte, `A` a 12-bit address and `n` a row count.
#[allow(non_camel_case_types, non_snake_case, missing_docs)]
#[derive(Clone, Copy, Debug, InstructionSet, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Insn {
    /// `00E0`: blank the screen
    #[opcode = "0x00e0"]
    cls,
    /// `00EE`: pop a return address
    #[opcode = "0x00ee"]
    ret,
    /// `1AAA`: continue at A
    #[opcode = "0x1AAA"]
    jmp { A: u16 },
    /// `2AAA`: push the current address, continue at A
    #[opcode = "0x2AAA"]
    call { A: u16 },
    /// `3xBB`: skip if vX equals B
    #[opcode = "0x3xBB"]
    seb { B: u8, x: usize },
    /// `4xBB`: skip unless vX equals B
    #[opcode = "0x4xBB"]
    sneb { B: u8, x: usize },
    /// `5xy0`: skip if vX equals vY
    #[opcode = "0x5xy0"]
    se { y: usize, x: usize },
    /// `6xBB`: vX = B
    #[opcode = "0x6xBB"]
    movb { B: u8, x: usize },
    /// `7xBB`: vX += B, no carry
    #[opcode = "0x7xBB"]
    addb { B: u8, x: usize },
    /// `8xy0`: vX = vY
    #[opcode = "0x8xy0"]
    mov { x: usize, y: usize },
    /// `8xy1`: vX |= vY
    #[opcode = "0x8xy1"]
    or { y: usize, x: usize },
    /// `8xy2`: vX &= vY
    #[opcode = "0x8xy2"]
    and { y: usize, x: usize },
    /// `8xy3`: vX ^= vY
    #[opcode = "0x8xy3"]
    xor { y: usize, x: usize },
    /// `8xy4`: vX += vY, carry in vF
    #[opcode = "0x8xy4"]
    add { y: usize, x: usize },
    /// `8xy5`: vX -= vY, no-borrow in vF
    #[opcode = "0x8xy5"]
    sub { y: usize, x: usize },
    /// `8xy6`: vX >>= 1, lost bit in vF
    #[opcode = "0x8xy6"]
    shr { y: usize, x: usize },
    /// `8xy7`: vX = vY - vX, no-borrow in vF
    #[opcode = "0x8xy7"]
    bsub { y: usize, x: usize },
    /// `8xyE`: vX <<= 1, lost bit in vF
    #[opcode = "0x8xye"]
    shl { y: usize, x: usize },
    /// `9xy0`: skip unless vX equals vY
    #[opcode = "0x9xy0"]
    sne { y: usize, x: usize },
    /// `AAAA`: I = A
    #[opcode = "0xaAAA"]
    movI { A: u16 },
    /// `BAAA`: continue at A + v0
    #[opcode = "0xbAAA"]
    jmpr { A: u16 },
    /// `CxBB`: vX = random & B
    #[opcode = "0xcxBB"]
    rand { B: u8, x: usize },
    /// `Dxyn`: XOR the n-row sprite at I onto the screen at (vX, vY)
    #[opcode = "0xdxyn"]
    draw { y: usize, x: usize, n: u8 },
    /// `Ex9E`: skip if key vX is down
    #[opcode = "0xex9e"]
    sek { x: usize },
    /// `ExA1`: skip if key vX is up
    #[opcode = "0xexa1"]
    snek { x: usize },
    /// `Fx07`: vX = delay timer
    #[opcode = "0xfx07"]
    getdt { x: usize },
    /// `Fx0A`: block until a key is pressed, then vX = key
    #[opcode = "0xfx0a"]
    waitk { x: usize },
    /// `Fx15`: delay timer = vX
    #[opcode = "0xfx15"]
    setdt { x: usize },
    /// `Fx18`: sound timer = vX
    #[opcode = "0xfx18"]
    movst { x: usize },
    /// `Fx1E`: I += vX, carry in vF
    #[opcode = "0xfx1e"]
    addI { x: usize },
    /// `Fx29`: I = address of the glyph for vX
    #[opcode = "0xfx29"]
    font { x: usize },
    /// `Fx33`: write vX as three decimal digits at I
    #[opcode = "0xfx33"]
    bcd { x: usize },
    /// `Fx55`: copy v0..=vX out to memory at I
    #[opcode = "0xfx55"]
    dmao { x: usize },
    /// `Fx65`: copy memory at I into v0..=vX
    #[opcode = "0xfx65"]
    dmai { x: usize },
}

impl Insn {
    /// Decodes a single big-endian instruction word
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// assert_eq!(Some(Insn::jmp { A: 0x208 }), Insn::from_word(0x1208));
    /// assert_eq!(None, Insn::from_word(0x0150));
    /// ```
    pub fn from_word(word: u16) -> Option<Insn> {
        Insn::decode(&word.to_be_bytes())
            .ok()
            .map(|(_, insn)| insn)
    }
}

impl Display for Insn {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Insn::cls               => write!(f, "cls    "),
            Insn::ret               => write!(f, "ret    "),
            Insn::jmp { A }         => write!(f, "jmp    {A:03x}"),
            Insn::call { A }        => write!(f, "call   {A:03x}"),
            Insn::seb { B, x }      => write!(f, "se     #{B:02x}, v{x:X}"),
            Insn::sneb { B, x }     => write!(f, "sne    #{B:02x}, v{x:X}"),
            Insn::se { y, x }       => write!(f, "se     v{y:X}, v{x:X}"),
            Insn::movb { B, x }     => write!(f, "mov    #{B:02x}, v{x:X}"),
            Insn::addb { B, x }     => write!(f, "add    #{B:02x}, v{x:X}"),
            Insn::mov { x, y }      => write!(f, "mov    v{y:X}, v{x:X}"),
            Insn::or { y, x }       => write!(f, "or     v{y:X}, v{x:X}"),
            Insn::and { y, x }      => write!(f, "and    v{y:X}, v{x:X}"),
            Insn::xor { y, x }      => write!(f, "xor    v{y:X}, v{x:X}"),
            Insn::add { y, x }      => write!(f, "add    v{y:X}, v{x:X}"),
            Insn::sub { y, x }      => write!(f, "sub    v{y:X}, v{x:X}"),
            Insn::shr { y, x }      => write!(f, "shr    v{y:X}, v{x:X}"),
            Insn::bsub { y, x }     => write!(f, "bsub   v{y:X}, v{x:X}"),
            Insn::shl { y, x }      => write!(f, "shl    v{y:X}, v{x:X}"),
            Insn::sne { y, x }      => write!(f, "sne    v{y:X}, v{x:X}"),
            Insn::movI { A }        => write!(f, "mov    ${A:03x}, I"),
            Insn::jmpr { A }        => write!(f, "jmp    ${A:03x}+v0"),
            Insn::rand { B, x }     => write!(f, "rand   #{B:02x}, v{x:X}"),
            Insn::draw { y, x, n }  => write!(f, "draw   #{n:x}, v{x:X}, v{y:X}"),
            Insn::sek { x }         => write!(f, "sek    v{x:X}"),
            Insn::snek { x }        => write!(f, "snek   v{x:X}"),
            Insn::getdt { x }       => write!(f, "mov    DT, v{x:X}"),
            Insn::waitk { x }       => write!(f, "waitk  v{x:X}"),
            Insn::setdt { x }       => write!(f, "mov    v{x:X}, DT"),
            Insn::movst { x }       => write!(f, "mov    v{x:X}, ST"),
            Insn::addI { x }        => write!(f, "add    v{x:X}, I"),
            Insn::font { x }        => write!(f, "font   v{x:X}, I"),
            Insn::bcd { x }         => write!(f, "bcd    v{x:X}, &I"),
            Insn::dmao { x }        => write!(f, "dmao   v{x:X}"),
            Insn::dmai { x }        => write!(f, "dmai   v{x:X}"),
        }
    }
}
