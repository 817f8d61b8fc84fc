// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Disassembles a Chip-8 ROM, one line per instruction word

use chirp_vm::{Dis, Disassembler, Result};
use gumdrop::*;
use std::{fs::read, path::PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Show help text")]
    help: bool,
    #[options(help = "Load a ROM to disassemble", free, required)]
    pub file: PathBuf,
    #[options(
        help = "Load address, in hex (usually 200)",
        parse(try_from_str = "parse_hex"),
        default = "200",
        meta = "ADDR"
    )]
    pub loadaddr: u16,
    #[options(help = "Start disassembling at offset...")]
    pub offset: usize,
    #[options(help = "Disable colored output")]
    pub plain: bool,
}

fn parse_hex(value: &str) -> std::result::Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(value.trim_start_matches("0x"), 16)
}

fn main() -> Result<()> {
    let options = Arguments::parse_args_default_or_exit();
    env_logger::init();
    let contents = read(&options.file)?;
    let disassembler = if options.plain {
        Dis::plain()
    } else {
        Dis::default()
    };
    let rom = contents.get(options.offset..).unwrap_or_default();
    let start = options.loadaddr.wrapping_add(options.offset as u16);
    log::debug!("disassembling {} bytes from {start:03x}", rom.len());
    for line in disassembler.listing(start, rom) {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_prefix() {
        assert_eq!(Ok(0x200), parse_hex("200"));
        assert_eq!(Ok(0x600), parse_hex("0x600"));
        assert!(parse_hex("zz").is_err());
    }
}
