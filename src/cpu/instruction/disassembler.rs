// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! A disassembler for Chip-8 opcodes
use super::Insn;
use owo_colors::{OwoColorize, Style};

/// Disassembles Chip-8 instructions
pub trait Disassembler {
    /// Disassemble a single instruction
    fn once(&self, insn: u16) -> String;

    /// Disassembles every aligned word of `rom`, as if it were loaded at `addr`.
    ///
    /// Each line is `addr: mnemonic word`. A trailing odd byte is ignored.
    fn listing(&self, addr: u16, rom: &[u8]) -> Vec<String> {
        rom.chunks_exact(2)
            .zip((addr as usize..).step_by(2))
            .map(|(word, addr)| {
                let word = u16::from_be_bytes([word[0], word[1]]);
                format!("{:03x}: {:<36} {word:04x}", addr & 0xfff, self.once(word))
            })
            .collect()
    }
}

/// Disassembles Chip-8 instructions, printing them in the provided [owo_colors::Style]s
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dis {
    /// Styles invalid instructions
    pub invalid: Style,
    /// Styles valid instruction
    pub normal: Style,
}

impl Dis {
    /// A disassembler which emits no escape codes
    pub fn plain() -> Self {
        Self {
            invalid: Style::new(),
            normal: Style::new(),
        }
    }
}

impl Default for Dis {
    fn default() -> Self {
        Self {
            invalid: Style::new().bold().red(),
            normal: Style::new().green(),
        }
    }
}

impl Disassembler for Dis {
    fn once(&self, insn: u16) -> String {
        match Insn::from_word(insn) {
            Some(insn) => format!("{}", insn.style(self.normal)),
            None => format!("{}", format_args!("inval  {insn:04x}").style(self.invalid)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once() {
        let dis = Dis::plain();
        assert_eq!("jmp    208", dis.once(0x1208));
        assert_eq!("draw   #5, v1, v2", dis.once(0xd125));
        assert_eq!("inval  0150", dis.once(0x0150));
    }

    #[test]
    fn listing() {
        let lines = Dis::plain().listing(0x200, b"\x00\xe0\x12\x00\xff");
        assert_eq!(2, lines.len());
        assert!(lines[0].starts_with("200: cls"));
        assert!(lines[1].starts_with("202: jmp    200"));
        assert!(lines[1].ends_with("1200"));
    }
}
