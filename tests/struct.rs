//! Testing methods on chirp-vm's structs
use chirp_vm::prelude::*;
use std::{collections::hash_map::DefaultHasher, hash::Hash, time::Duration};

#[test]
fn cpu() {
    let cpu = CPU::default(); // Default
    println!("{cpu:?}"); // Debug
    cpu.dump();
}

#[test]
fn error() {
    let errors = [
        Error::UnimplementedInstruction {
            word: 0x1234,
            addr: 0x1fe,
            offset: -2,
        },
        Error::StackOverflow { addr: 0x2a0 },
        Error::StackUnderflow { addr: 0x2a0 },
        Error::InvalidKey { key: 0x21 },
        Error::InvalidRegister { reg: 0x21 },
        Error::ProgramTooLarge {
            len: 0x1000,
            max: 0xe00,
        },
        Error::Interrupted,
        std::io::Error::from(std::io::ErrorKind::NotFound).into(),
    ];
    for error in errors {
        println!("{error} {error:?}");
    }
    assert!(Error::UnimplementedInstruction {
        word: 0x1234,
        addr: 0x1fe,
        offset: -2
    }
    .to_string()
    .contains("-2"));
}

mod region {
    use super::*;
    #[test]
    #[allow(clippy::clone_on_copy)]
    fn copy_clone() {
        let r1 = Program;
        let r2 = r1;
        assert_eq!(r1, r2.clone());
    }
    #[test]
    fn display() {
        assert_eq!("CharsetProgram", format!("{Charset}{Program}"));
    }
    #[test]
    fn debug() {
        println!("{Charset:?}{Program:?}");
    }
    #[test]
    fn ord() {
        assert_eq!(Program, Charset.max(Program));
        assert!(Charset < Program);
    }
    #[test]
    fn hash() {
        let mut hasher = DefaultHasher::new();
        Program.hash(&mut hasher);
        println!("{hasher:?}");
    }
    #[test]
    fn ranges() {
        assert_eq!(0..0x50, Charset.range());
        assert_eq!(0x200..0x1000, Program.range());
    }
}

mod flags {
    use super::*;
    #[test]
    fn default() {
        let flags = Flags::default();
        assert!(!flags.debug);
        assert_eq!(None, flags.pace);
        assert_eq!(Duration::from_nanos(16_666_666), flags.timer_period);
    }
    #[test]
    #[allow(clippy::redundant_clone)]
    fn clone_eq_hash() {
        let mut flags = Flags::default();
        flags.debug();
        let cloned = flags.clone();
        assert_eq!(flags, cloned);
        assert_ne!(Flags::default(), cloned);
        let mut hasher = DefaultHasher::new();
        flags.hash(&mut hasher);
        println!("{flags:?} {hasher:?}");
    }
}

mod insn {
    use super::*;
    #[test]
    fn display() {
        assert_eq!("cls    ", Insn::cls.to_string());
        assert_eq!("call   2a0", Insn::call { A: 0x2a0 }.to_string());
        assert_eq!("mov    #41, v4", Insn::movb { B: 0x41, x: 4 }.to_string());
        assert_eq!("draw   #5, v0, v1", Insn::draw { x: 0, y: 1, n: 5 }.to_string());
    }
    #[test]
    fn from_word() {
        assert_eq!(Some(Insn::ret), Insn::from_word(0x00ee));
        assert_eq!(Some(Insn::shl { x: 3, y: 4 }), Insn::from_word(0x834e));
        assert_eq!(Some(Insn::dmai { x: 0xf }), Insn::from_word(0xff65));
        assert_eq!(None, Insn::from_word(0x8008));
    }
}

mod dis {
    use super::*;
    #[test]
    fn styles() {
        let dis = Dis::default();
        assert_ne!(dis, Dis::plain());
        // styled text still contains the mnemonic
        assert!(dis.once(0xa123).contains("mov    $123, I"));
        assert!(dis.once(0xffff).contains("inval  ffff"));
    }
}

mod registers {
    use super::*;
    #[test]
    fn snapshot() -> Result<()> {
        let mut cpu = CPU::default();
        cpu.load_program_bytes(b"\x6e\x01\xa3\x45\x22\x08")?;
        cpu.tick()?.tick()?.tick()?;
        let regs = cpu.registers();
        assert_eq!(0x01, regs.v[0xe]);
        assert_eq!(0x345, regs.i);
        assert_eq!(0x208, regs.pc);
        assert_eq!(1, regs.sp);
        assert_eq!(0x204, regs.stack[0]);
        let copy = regs;
        assert_eq!(regs, copy);
        Ok(())
    }
}

mod screen {
    use super::*;
    #[test]
    fn view_display() {
        let mut screen = Screen::default();
        let view = screen.view();
        screen.draw_sprite(62, 0, &[0xff]);
        let text = view.to_string();
        let first = text.lines().next().unwrap_or_default();
        // wraps around from the right edge
        assert!(first.starts_with("|██████ "));
        assert!(first.ends_with("██|"));
        println!("{view:?} {screen:?}");
    }
}

mod keypad {
    use super::*;
    #[test]
    fn shared() {
        let cpu = CPU::default();
        let keypad = cpu.keypad();
        assert!(keypad.press(0xf).unwrap());
        assert!(cpu.keypad().is_pressed(0xf));
        assert!(matches!(keypad.press(0x10), Err(Error::InvalidKey { key: 0x10 })));
        println!("{keypad:?}");
    }
}

#[cfg(feature = "serde")]
mod serde_snapshot {
    use super::*;
    fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}
    #[test]
    fn snapshot_types_serialize() {
        assert_serde::<Insn>();
        assert_serde::<Mem>();
        assert_serde::<Region>();
        assert_serde::<Registers>();
        assert_serde::<State>();
    }
}
