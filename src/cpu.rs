// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Decodes and runs instructions
//!
//! The [CPU] owns memory, the screen, and the registers outright. The keypad
//! and both timers are shared with other threads: an input source presses
//! keys through [CPU::keypad], and each timer counts down on its own clock.


pub mod behavior;
pub mod flags;
pub mod instruction;
pub mod mem;

use self::{
    flags::Flags,
    instruction::{
        disassembler::{Dis, Disassembler},
        Insn,
    },
    mem::{Mem, ReadWrite, Region::*, PROG_START},
};
use crate::{
    error::{Error, Result},
    io::Keypad,
    screen::{Screen, ScreenView},
    timer::Timer,
};
use log::{debug, error, info};
use owo_colors::OwoColorize;
use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

type Reg = usize;
type Adr = u16;
type Nib = u8;

/// Addresses wrap at the end of the 4 KiB address space
const ADDR_MASK: Adr = 0xfff;
/// The number of return addresses the stack can hold
pub const STACK_DEPTH: usize = 16;

/// Whether the [CPU] can still execute instructions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum State {
    /// Instructions are being fetched and executed
    #[default]
    Running,
    /// Execution stopped, by a fault or by request. Only [CPU::reset] leaves this state.
    Halted,
}

/// A copy of the CPU's registers at some instant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    /// General purpose registers v0..=vF
    pub v: [u8; 16],
    /// The index register
    pub i: Adr,
    /// The program counter
    pub pc: Adr,
    /// The call stack. Only `stack[..sp]` is meaningful.
    pub stack: [Adr; STACK_DEPTH],
    /// The stack pointer, counting return addresses on the stack
    pub sp: usize,
}

/// Asks a running [CPU] to stop, from any thread
///
/// # Examples
/// ```rust
/// # use chirp_vm::*;
/// # fn main() -> Result<()> {
/// let mut cpu = CPU::default();
/// // wait for a key, forever
/// cpu.load_program_bytes(b"\xf0\x0a\x12\x00")?;
/// let stop = cpu.stop_handle();
/// let runner = std::thread::spawn(move || {
///     cpu.run()?;
///     Ok::<_, Error>(cpu)
/// });
/// stop.stop();
/// let cpu = runner.join().unwrap()?;
/// assert_eq!(State::Halted, cpu.state());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
    keypad: Arc<Keypad>,
}

impl StopHandle {
    /// Requests a stop. A CPU blocked waiting for a key is woken.
    pub fn stop(&self) {
        info!("stop requested");
        self.stop.store(true, Ordering::Release);
        self.keypad.interrupt();
    }

    /// Returns true if a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

/// Represents the internal state of the CPU interpreter
pub struct CPU {
    /// Flags that control how the CPU behaves, but which aren't inherent to the
    /// chip-8. Includes debug output and pacing.
    pub flags: Flags,
    // memory
    mem: Mem,
    screen: Screen,
    stack: [Adr; STACK_DEPTH],
    sp: usize,
    // registers
    pc: Adr,
    i: Adr,
    v: [u8; 16],
    delay: Timer,
    sound: Timer,
    // I/O
    keypad: Arc<Keypad>,
    // Execution data
    state: State,
    cycle: usize,
    stop: Arc<AtomicBool>,
    disassembler: Dis,
}

// public interface
impl CPU {
    /// Constructs a new CPU with blank memory, taking all configurable parameters.
    ///
    /// Both timers start their clocks immediately.
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// let cpu = CPU::new(Flags::default());
    /// assert_eq!(0x200, cpu.pc());
    /// assert_eq!(State::Running, cpu.state());
    /// ```
    pub fn new(flags: Flags) -> Self {
        debug!("new cpu: {flags:?}");
        CPU {
            mem: Mem::new(),
            screen: Screen::new(),
            stack: [0; STACK_DEPTH],
            sp: 0,
            pc: PROG_START,
            i: 0,
            v: [0; 16],
            delay: Timer::with_period("delay", flags.timer_period),
            sound: Timer::with_period("sound", flags.timer_period),
            keypad: Arc::new(Keypad::new()),
            state: State::Running,
            cycle: 0,
            stop: Arc::new(AtomicBool::new(false)),
            disassembler: Dis::default(),
            flags,
        }
    }

    /// Loads a program into the CPU's program space
    pub fn load_program(&mut self, rom: impl AsRef<std::path::Path>) -> Result<&mut Self> {
        let rom = rom.as_ref();
        info!("loading {}", rom.display());
        self.load_program_bytes(&std::fs::read(rom)?)
    }

    /// Loads bytes into the CPU's program space, replacing whatever was there.
    ///
    /// Returns [Error::ProgramTooLarge] if `rom` doesn't fit between `0x200` and
    /// the end of memory, leaving the program space cleared.
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// let mut cpu = CPU::default();
    /// assert!(cpu.load_program_bytes(&[0; 0xe00]).is_ok());
    /// assert!(cpu.load_program_bytes(&[0; 0xe01]).is_err());
    /// ```
    pub fn load_program_bytes(&mut self, rom: &[u8]) -> Result<&mut Self> {
        self.mem.clear_region(Program);
        self.mem.load_region(Program, rom)?;
        debug!("loaded {} bytes at {PROG_START:03x}", rom.len());
        Ok(self)
    }

    /// Sets a general purpose register in the CPU.
    /// If the register doesn't exist, returns [Error::InvalidRegister]
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// // Create a new CPU, and set v4 to 0x41
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x4, 0x41).unwrap();
    /// assert_eq!(0x41, cpu.v()[4]);
    /// assert!(cpu.set_v(0x10, 0).is_err());
    /// ```
    pub fn set_v(&mut self, reg: Reg, value: u8) -> Result<()> {
        if let Some(gpr) = self.v.get_mut(reg) {
            *gpr = value;
            Ok(())
        } else {
            Err(Error::InvalidRegister { reg })
        }
    }

    /// Gets a slice of the entire general purpose registers
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x0, 0x41).unwrap();
    /// assert_eq!(
    ///     cpu.v(),
    ///     [0x41, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    /// )
    /// ```
    pub fn v(&self) -> &[u8] {
        self.v.as_slice()
    }

    /// Gets the program counter
    pub fn pc(&self) -> Adr {
        self.pc
    }

    /// Sets the program counter, wrapping it into the address space
    pub fn set_pc(&mut self, pc: Adr) {
        self.pc = pc & ADDR_MASK;
    }

    /// Gets the I register
    pub fn i(&self) -> Adr {
        self.i
    }

    /// Sets the I register
    pub fn set_i(&mut self, i: Adr) {
        self.i = i;
    }

    /// Gets the stack pointer
    pub fn sp(&self) -> usize {
        self.sp
    }

    /// Gets the return addresses currently on the stack, oldest first
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// # fn main() -> Result<()> {
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(b"\x23\x00")?;
    /// cpu.tick()?;
    /// assert_eq!(&[0x200], cpu.stack());
    /// # Ok(())
    /// # }
    /// ```
    pub fn stack(&self) -> &[Adr] {
        &self.stack[..self.sp]
    }

    /// Gets the value in the Delay Timer register
    pub fn delay(&self) -> u8 {
        self.delay.get()
    }

    /// Gets the value in the Sound Timer register
    pub fn sound(&self) -> u8 {
        self.sound.get()
    }

    /// Gets the number of cycles the CPU has executed
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Gets the current [State]
    pub fn state(&self) -> State {
        self.state
    }

    /// Gets the CPU's memory
    pub fn mem(&self) -> &Mem {
        &self.mem
    }

    /// Gets the CPU's memory, mutably
    pub fn mem_mut(&mut self) -> &mut Mem {
        &mut self.mem
    }

    /// Gets a read-only view of the screen, which may be sent to another thread
    pub fn screen(&self) -> ScreenView {
        self.screen.view()
    }

    /// Gets a handle to the keypad, for an input source to press keys on
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// let cpu = CPU::default();
    /// let keypad = cpu.keypad();
    /// assert!(keypad.press(0x7).unwrap());
    /// assert!(cpu.keypad().is_pressed(0x7));
    /// ```
    pub fn keypad(&self) -> Arc<Keypad> {
        Arc::clone(&self.keypad)
    }

    /// Gets a [StopHandle] for this CPU
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop: Arc::clone(&self.stop),
            keypad: Arc::clone(&self.keypad),
        }
    }

    /// Installs a callback which hears `true` when the sound timer starts
    /// counting and `false` when it runs out. This is where a tone goes.
    /// If the tone is already on, the callback hears `true` right away.
    pub fn on_tone(&self, tone: impl FnMut(bool) + Send + 'static) {
        self.sound.observe(tone);
    }

    /// Takes a snapshot of the registers
    pub fn registers(&self) -> Registers {
        Registers {
            v: self.v,
            i: self.i,
            pc: self.pc,
            stack: self.stack,
            sp: self.sp,
        }
    }

    /// Resets the emulator, making it runnable again.
    ///
    /// Touches the registers, stack, timers, keypad, screen, state, stop
    /// request, and cycle count.
    ///
    /// Does not touch [Flags], [Dis], or memory.
    pub fn reset(&mut self) {
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        self.pc = PROG_START;
        self.i = 0;
        self.v = [0; 16];
        self.delay.set(0);
        self.sound.set(0);
        self.keypad.reset();
        self.screen.clear();
        self.state = State::Running;
        self.stop.store(false, Ordering::Release);
        self.cycle = 0;
        debug!("cpu reset");
    }

    /// Executes a single instruction
    ///
    /// Does nothing once the CPU has [halted](State::Halted).
    ///
    /// Returns [Error::UnimplementedInstruction] if the word at `pc` is not an
    /// instruction, and passes on any error from executing it. Either way,
    /// the CPU halts with its registers as they were before the tick.
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// cpu.tick()
    ///     .expect("0x00e0 (cls) should be a valid opcode.");
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(1, cpu.cycle());
    /// ```
    /// Returns [Error::UnimplementedInstruction] if the instruction is not implemented.
    /// ```rust
    /// # use chirp_vm::*;
    /// let mut cpu = CPU::default();
    /// # cpu.flags.debug = true;        // enable live disassembly
    /// cpu.load_program_bytes(&[
    ///     0xff, 0xff, // invalid!
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ]).unwrap();
    /// dbg!(cpu.tick())
    ///     .expect_err("Should return Error::UnimplementedInstruction { 0xffff }");
    /// assert_eq!(State::Halted, cpu.state());
    /// ```
    pub fn tick(&mut self) -> Result<&mut Self> {
        if self.state == State::Halted {
            return Ok(self);
        }
        self.cycle += 1;
        // fetch opcode
        let word: u16 = self.mem.read(self.pc);

        // Print opcode disassembly:
        if self.flags.debug {
            std::println!(
                "{:3} {:03x}: {:<36}",
                self.cycle.bright_black(),
                self.pc,
                self.disassembler.once(word)
            );
        }

        // decode opcode
        let Some(insn) = Insn::from_word(word) else {
            self.state = State::Halted;
            let addr = self.pc;
            error!("halted: opcode {word:04x} not recognized at {addr:03x}");
            return Err(Error::UnimplementedInstruction {
                word,
                addr,
                offset: addr as i32 - PROG_START as i32,
            });
        };

        if let Err(e) = self.execute(insn) {
            self.state = State::Halted;
            match e {
                Error::Interrupted => info!("halted while waiting for a key"),
                ref e => error!("halted: {e}"),
            }
            return Err(e);
        }
        self.pc = self.pc.wrapping_add(2) & ADDR_MASK;
        Ok(self)
    }

    /// Runs until the CPU halts or is asked to stop.
    ///
    /// Returns `Ok(())` when stopped through a [StopHandle], and the fault
    /// otherwise. Between instructions, sleeps for [Flags::pace] if set.
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// let mut cpu = CPU::default();
    /// // the first word is not an instruction
    /// cpu.load_program_bytes(b"\x01\x50").unwrap();
    /// assert!(cpu.run().is_err());
    /// ```
    pub fn run(&mut self) -> Result<()> {
        info!("running from {:03x}", self.pc);
        while self.state == State::Running {
            if self.stop.load(Ordering::Acquire) {
                self.state = State::Halted;
                break;
            }
            match self.tick().map(drop) {
                Err(Error::Interrupted) if self.stop.load(Ordering::Acquire) => break,
                Err(e) => return Err(e),
                Ok(_) => {}
            }
            if let Some(pace) = self.flags.pace {
                std::thread::sleep(pace);
            }
        }
        info!("stopped after {} cycles", self.cycle);
        Ok(())
    }

    /// Stops both timer clocks and waits for their threads to exit.
    ///
    /// Called on drop. The timers keep their last values.
    pub fn shutdown(&mut self) {
        self.delay.cancel();
        self.sound.cancel();
    }

    /// Dumps the current state of all CPU registers, and the cycle count
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.dump();
    /// ```
    /// outputs
    /// ```text
    /// PC: 0200, SP: 00, I: 0000
    /// v0: 00 v1: 00 v2: 00 v3: 00
    /// v4: 00 v5: 00 v6: 00 v7: 00
    /// v8: 00 v9: 00 vA: 00 vB: 00
    /// vC: 00 vD: 00 vE: 00 vF: 00
    /// DLY: 0, SND: 0, CYC:      0
    /// ```
    pub fn dump(&self) {
        std::println!(
            "PC: {:04x}, SP: {:02x}, I: {:04x}\n{}DLY: {}, SND: {}, CYC: {:6}",
            self.pc,
            self.sp,
            self.i,
            self.v
                .into_iter()
                .enumerate()
                .map(|(i, gpr)| {
                    format!(
                        "v{i:X}: {gpr:02x} {}",
                        match i % 4 {
                            3 => "\n",
                            _ => "",
                        }
                    )
                })
                .collect::<String>(),
            self.delay(),
            self.sound(),
            self.cycle,
        );
    }
}

impl Drop for CPU {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Debug for CPU {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CPU")
            .field("flags", &self.flags)
            .field("state", &self.state)
            .field("stack", &self.stack())
            .field("pc", &self.pc)
            .field("i", &self.i)
            .field("v", &self.v)
            .field("delay", &self.delay)
            .field("sound", &self.sound)
            .field("keypad", &self.keypad)
            .field("cycle", &self.cycle)
            .field("screen", &self.screen)
            .finish_non_exhaustive()
    }
}

impl Default for CPU {
    /// Constructs a new CPU with default [Flags]
    ///
    /// # Examples
    /// ```rust
    /// use chirp_vm::*;
    /// let mut cpu = CPU::default();
    /// ```
    fn default() -> Self {
        CPU::new(Flags::default())
    }
}
