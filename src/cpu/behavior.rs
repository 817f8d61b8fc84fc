// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Contains implementations for each Chip-8 [Insn]
//!
//! Every instruction leaves `pc` two bytes short of where execution should
//! continue, since [CPU::tick] always advances past the instruction it ran.
//! Jumps and calls therefore store `target - 2`.

use super::*;
use rand::random;

impl CPU {
    /// Executes a single [Insn]
    #[rustfmt::skip]
    #[inline(always)]
    pub(super) fn execute(&mut self, instruction: Insn) -> Result<()> {
        match instruction {
            Insn::cls               => self.clear_screen(),
            Insn::ret               => self.ret()?,
            Insn::jmp   {       A } => self.jump(A),
            Insn::call  {       A } => self.call(A)?,
            Insn::seb   {    x, B } => self.skip_equals_immediate(x, B),
            Insn::sneb  {    x, B } => self.skip_not_equals_immediate(x, B),
            Insn::se    { y, x    } => self.skip_equals(x, y),
            Insn::movb  {    x, B } => self.load_immediate(x, B),
            Insn::addb  {    x, B } => self.add_immediate(x, B),
            Insn::mov   { y, x    } => self.load(x, y),
            Insn::or    { y, x    } => self.or(x, y),
            Insn::and   { y, x    } => self.and(x, y),
            Insn::xor   { y, x    } => self.xor(x, y),
            Insn::add   { y, x    } => self.add(x, y),
            Insn::sub   { y, x    } => self.sub(x, y),
            Insn::shr   { y, x    } => self.shift_right(x, y),
            Insn::bsub  { y, x    } => self.backwards_sub(x, y),
            Insn::shl   { y, x    } => self.shift_left(x, y),
            Insn::sne   { y, x    } => self.skip_not_equals(x, y),
            Insn::movI  {       A } => self.load_i_immediate(A),
            Insn::jmpr  {       A } => self.jump_indexed(A),
            Insn::rand  {    x, B } => self.rand(x, B),
            Insn::draw  { y, x, n } => self.draw(x, y, n),
            Insn::sek   {    x    } => self.skip_key_equals(x),
            Insn::snek  {    x    } => self.skip_key_not_equals(x),
            Insn::getdt {    x    } => self.load_delay_timer(x),
            Insn::waitk {    x    } => self.wait_for_key(x)?,
            Insn::setdt {    x    } => self.store_delay_timer(x),
            Insn::movst {    x    } => self.store_sound_timer(x),
            Insn::addI  {    x    } => self.add_i(x),
            Insn::font  {    x    } => self.load_sprite(x),
            Insn::bcd   {    x    } => self.bcd_convert(x),
            Insn::dmao  {    x    } => self.store_dma(x),
            Insn::dmai  {    x    } => self.load_dma(x),
        }
        Ok(())
    }

    /// Skips the next instruction
    #[inline(always)]
    fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2) & ADDR_MASK;
    }

    /// Sets up a transfer of control to `a`, accounting for the advance in [CPU::tick]
    #[inline(always)]
    fn branch(&mut self, a: Adr) {
        self.pc = a.wrapping_sub(2) & ADDR_MASK;
    }
}

/// |`0aaa`| Issues a "System call" (ML routine)
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`00e0`| Clear screen memory to all 0       |
/// |`00ee`| Return from subroutine             |
impl CPU {
    /// |`00e0`| Clears the screen memory to 0
    #[inline(always)]
    pub(super) fn clear_screen(&mut self) {
        self.screen.clear();
    }
    /// |`00ee`| Returns from subroutine
    ///
    /// Returns [Error::StackUnderflow] if there's nowhere to return to.
    #[inline(always)]
    pub(super) fn ret(&mut self) -> Result<()> {
        if self.sp == 0 {
            return Err(Error::StackUnderflow { addr: self.pc });
        }
        self.sp -= 1;
        // resumes at the instruction after the call
        self.pc = self.stack[self.sp];
        Ok(())
    }
}

/// |`1aaa`| Sets pc to an absolute address
impl CPU {
    /// |`1aaa`| Sets the program counter to an absolute address
    #[inline(always)]
    pub(super) fn jump(&mut self, a: Adr) {
        self.branch(a);
    }
}

/// |`2aaa`| Pushes pc onto the stack, then jumps to a
impl CPU {
    /// |`2aaa`| Pushes pc onto the stack, then jumps to a
    ///
    /// Returns [Error::StackOverflow] if the stack is already full.
    #[inline(always)]
    pub(super) fn call(&mut self, a: Adr) -> Result<()> {
        let slot = self
            .stack
            .get_mut(self.sp)
            .ok_or(Error::StackOverflow { addr: self.pc })?;
        *slot = self.pc;
        self.sp += 1;
        self.branch(a);
        Ok(())
    }
}

/// |`3xbb`| Skips next instruction if register X == b
impl CPU {
    /// |`3xbb`| Skips the next instruction if register X == b
    #[inline(always)]
    pub(super) fn skip_equals_immediate(&mut self, x: Reg, b: u8) {
        if self.v[x] == b {
            self.skip();
        }
    }
}

/// |`4xbb`| Skips next instruction if register X != b
impl CPU {
    /// |`4xbb`| Skips the next instruction if register X != b
    #[inline(always)]
    pub(super) fn skip_not_equals_immediate(&mut self, x: Reg, b: u8) {
        if self.v[x] != b {
            self.skip();
        }
    }
}

/// |`5xyn`| Performs a register-register comparison
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`5XY0`| Skip next instruction if vX == vY  |
impl CPU {
    /// |`5xy0`| Skips the next instruction if register X == register Y
    #[inline(always)]
    pub(super) fn skip_equals(&mut self, x: Reg, y: Reg) {
        if self.v[x] == self.v[y] {
            self.skip();
        }
    }
}

/// |`6xbb`| Loads immediate byte b into register vX
impl CPU {
    /// |`6xbb`| Loads immediate byte b into register vX
    #[inline(always)]
    pub(super) fn load_immediate(&mut self, x: Reg, b: u8) {
        self.v[x] = b;
    }
}

/// |`7xbb`| Adds immediate byte b to register vX
impl CPU {
    /// |`7xbb`| Adds immediate byte b to register vX. vF is untouched.
    #[inline(always)]
    pub(super) fn add_immediate(&mut self, x: Reg, b: u8) {
        self.v[x] = self.v[x].wrapping_add(b);
    }
}

/// |`8xyn`| Performs ALU operation
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`8xy0`| X = Y                              |
/// |`8xy1`| X = X \| Y                         |
/// |`8xy2`| X = X & Y                          |
/// |`8xy3`| X = X ^ Y                          |
/// |`8xy4`| X = X + Y; Set vF=carry            |
/// |`8xy5`| X = X - Y; Set vF=!borrow          |
/// |`8xy6`| X = X >> 1; Set vF=shifted out bit |
/// |`8xy7`| X = Y - X; Set vF=!borrow          |
/// |`8xyE`| X = X << 1; Set vF=shifted out bit |
///
/// vF is written before vX, so with X = F the result is what remains.
impl CPU {
    /// |`8xy0`| Loads the value of y into x
    #[inline(always)]
    pub(super) fn load(&mut self, x: Reg, y: Reg) {
        self.v[x] = self.v[y];
    }
    /// |`8xy1`| Performs bitwise or of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn or(&mut self, x: Reg, y: Reg) {
        self.v[x] |= self.v[y];
    }
    /// |`8xy2`| Performs bitwise and of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn and(&mut self, x: Reg, y: Reg) {
        self.v[x] &= self.v[y];
    }
    /// |`8xy3`| Performs bitwise xor of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn xor(&mut self, x: Reg, y: Reg) {
        self.v[x] ^= self.v[y];
    }
    /// |`8xy4`| Performs addition of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn add(&mut self, x: Reg, y: Reg) {
        let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
        self.v[0xf] = carry.into();
        self.v[x] = sum;
    }
    /// |`8xy5`| Performs subtraction of vX and vY, and stores the result in vX
    ///
    /// vF is set when no borrow occurs, including when vX == vY.
    #[inline(always)]
    pub(super) fn sub(&mut self, x: Reg, y: Reg) {
        let (diff, borrow) = self.v[x].overflowing_sub(self.v[y]);
        self.v[0xf] = (!borrow).into();
        self.v[x] = diff;
    }
    /// |`8xy6`| Performs bitwise right shift of vX
    ///
    /// vY is ignored.
    #[inline(always)]
    pub(super) fn shift_right(&mut self, x: Reg, _y: Reg) {
        let value = self.v[x];
        self.v[0xf] = value & 1;
        self.v[x] = value >> 1;
    }
    /// |`8xy7`| Performs subtraction of vY and vX, and stores the result in vX
    #[inline(always)]
    pub(super) fn backwards_sub(&mut self, x: Reg, y: Reg) {
        let (diff, borrow) = self.v[y].overflowing_sub(self.v[x]);
        self.v[0xf] = (!borrow).into();
        self.v[x] = diff;
    }
    /// |`8xyE`| Performs bitwise left shift of vX
    ///
    /// vY is ignored.
    #[inline(always)]
    pub(super) fn shift_left(&mut self, x: Reg, _y: Reg) {
        let value = self.v[x];
        self.v[0xf] = value >> 7;
        self.v[x] = value << 1;
    }
}

/// |`9xyn`| Performs a register-register comparison
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`9XY0`| Skip next instruction if vX != vY  |
impl CPU {
    /// |`9xy0`| Skip next instruction if X != y
    #[inline(always)]
    pub(super) fn skip_not_equals(&mut self, x: Reg, y: Reg) {
        if self.v[x] != self.v[y] {
            self.skip();
        }
    }
}

/// |`Aaaa`| Load address #a into register I
impl CPU {
    /// |`Aadr`| Load address #adr into register I
    #[inline(always)]
    pub(super) fn load_i_immediate(&mut self, a: Adr) {
        self.i = a;
    }
}

/// |`Baaa`| Jump to &adr + v0
impl CPU {
    /// |`Badr`| Jump to &adr + v0
    ///
    /// The target wraps at the end of memory: `bfff` with v0 = `ff` lands on `0fe`.
    #[inline(always)]
    pub(super) fn jump_indexed(&mut self, a: Adr) {
        self.branch(a.wrapping_add(self.v[0] as Adr));
    }
}

/// |`Cxbb`| Stores a random number & the provided byte into vX
impl CPU {
    /// |`Cxbb`| Stores a random number & the provided byte into vX
    #[inline(always)]
    pub(super) fn rand(&mut self, x: Reg, b: u8) {
        self.v[x] = random::<u8>() & b;
    }
}

/// |`Dxyn`| Draws n-byte sprite to the screen at coordinates (vX, vY)
impl CPU {
    /// |`Dxyn`| Draws n-byte sprite to the screen at coordinates (vX, vY)
    ///
    /// The sprite is read from memory starting at I. Sets vF if any pixel
    /// was turned off, and clears it otherwise.
    #[inline(always)]
    pub(super) fn draw(&mut self, x: Reg, y: Reg, n: Nib) {
        let sprite = self.mem.read_slice(self.i, n as usize);
        let collision = self.screen.draw_sprite(self.v[x], self.v[y], &sprite);
        self.v[0xf] = collision.into();
    }
}

/// |`Exbb`| Skips instruction on value of keypress
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`eX9e`| Skip next instruction if key == vX |
/// |`eXa1`| Skip next instruction if key != vX |
impl CPU {
    /// |`Ex9E`| Skip next instruction if key == vX
    #[inline(always)]
    pub(super) fn skip_key_equals(&mut self, x: Reg) {
        if self.keypad.is_pressed(self.v[x]) {
            self.skip();
        }
    }
    /// |`ExA1`| Skip next instruction if key != vX
    #[inline(always)]
    pub(super) fn skip_key_not_equals(&mut self, x: Reg) {
        if !self.keypad.is_pressed(self.v[x]) {
            self.skip();
        }
    }
}

/// |`Fxbb`| Performs IO
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`fX07`| Set vX to value in delay timer     |
/// |`fX0a`| Wait for input, store key in vX    |
/// |`fX15`| Set delay timer to the value in vX |
/// |`fX18`| Set sound timer to the value in vX |
/// |`fX1e`| Add vX to I                        |
/// |`fX29`| Load sprite for character x into I |
/// |`fX33`| BCD convert X into I[0..3]         |
/// |`fX55`| DMA Stor from I to registers 0..=X |
/// |`fX65`| DMA Load from I to registers 0..=X |
impl CPU {
    /// |`Fx07`| Get the current DT, and put it in vX
    /// ```py
    /// vX = DT
    /// ```
    #[inline(always)]
    pub(super) fn load_delay_timer(&mut self, x: Reg) {
        self.v[x] = self.delay.get();
    }
    /// |`Fx0A`| Wait for key, then vX = K
    ///
    /// Blocks the calling thread. Only a press made after this starts waiting
    /// is accepted. Returns [Error::Interrupted] if the wait is cut short,
    /// leaving vX alone.
    #[inline(always)]
    pub(super) fn wait_for_key(&mut self, x: Reg) -> Result<()> {
        debug!("waiting for key");
        self.v[x] = self.keypad.wait_for_key()?;
        Ok(())
    }
    /// |`Fx15`| Load vX into DT
    /// ```py
    /// DT = vX
    /// ```
    #[inline(always)]
    pub(super) fn store_delay_timer(&mut self, x: Reg) {
        self.delay.set(self.v[x]);
    }
    /// |`Fx18`| Load vX into ST
    /// ```py
    /// ST = vX;
    /// ```
    ///
    /// # Quirk
    /// A value of exactly 1 is ignored.
    #[inline(always)]
    pub(super) fn store_sound_timer(&mut self, x: Reg) {
        if self.v[x] != 1 {
            self.sound.set(self.v[x]);
        }
    }
    /// |`Fx1e`| Add vX to I, setting vF on overflow past `ffff`
    /// ```py
    /// I += vX;
    /// ```
    #[inline(always)]
    pub(super) fn add_i(&mut self, x: Reg) {
        let (i, carry) = self.i.overflowing_add(self.v[x] as Adr);
        self.v[0xf] = carry.into();
        self.i = i;
    }
    /// |`Fx29`| Load sprite for character x into I
    /// ```py
    /// I = sprite(X);
    /// ```
    #[inline(always)]
    pub(super) fn load_sprite(&mut self, x: Reg) {
        self.i = Mem::glyph(self.v[x]);
    }
    /// |`Fx33`| BCD convert X into I`[0..3]`
    #[inline(always)]
    pub(super) fn bcd_convert(&mut self, x: Reg) {
        let x = self.v[x];
        self.mem.write_slice(self.i, &[x / 100 % 10, x / 10 % 10, x % 10]);
    }
    /// |`Fx55`| DMA Stor from I to registers 0..=X
    ///
    /// I is left unchanged.
    #[inline(always)]
    pub(super) fn store_dma(&mut self, x: Reg) {
        let i = self.i;
        self.mem.write_slice(i, &self.v[..=x]);
    }
    /// |`Fx65`| DMA Load from I to registers 0..=X
    ///
    /// I is left unchanged.
    #[inline(always)]
    pub(super) fn load_dma(&mut self, x: Reg) {
        let values = self.mem.read_slice(self.i, x + 1);
        self.v[..=x].copy_from_slice(&values);
    }
}
