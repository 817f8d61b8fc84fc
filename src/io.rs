// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The Chip-8 keypad, shared between the interpreter and an input source
//!
//! Key-down flags are plain atomics. The "wait for key" rendezvous is a
//! single-slot latch behind a [Mutex], with a [Condvar] to park the
//! interpreter. Clearing the latch and waiting on it happen under one lock,
//! so a press can't slip in between them unnoticed.

use crate::error::{Error, Result};
use std::{
    fmt::{Debug, Formatter},
    sync::{
        atomic::{AtomicBool, Ordering},
        Condvar, Mutex, MutexGuard, PoisonError,
    },
};

/// The number of keys on the Chip-8 keypad
pub const KEYS: usize = 16;

#[derive(Clone, Copy, Debug, Default)]
struct Latch {
    key: u8,
    ready: bool,
    interrupted: bool,
}

/// The sixteen-key hex keypad
///
/// # Examples
/// ```rust
/// # use chirp_vm::*;
/// # fn main() -> Result<()> {
/// let keypad = std::sync::Arc::new(Keypad::new());
/// let input = std::sync::Arc::clone(&keypad);
/// let waiter = std::thread::spawn(move || keypad.wait_for_key());
/// // keep pressing until the waiter has armed the latch and picked it up
/// while !waiter.is_finished() {
///     input.press(0xa)?;
///     input.release(0xa)?;
///     std::thread::yield_now();
/// }
/// assert_eq!(0xa, waiter.join().unwrap()?);
/// # Ok(())
/// # }
/// ```
pub struct Keypad {
    keys: [AtomicBool; KEYS],
    latch: Mutex<Latch>,
    pressed: Condvar,
}

impl Default for Keypad {
    fn default() -> Self {
        Keypad::new()
    }
}

impl Keypad {
    /// Constructs a keypad with no keys held
    pub fn new() -> Self {
        Keypad {
            keys: Default::default(),
            latch: Mutex::new(Latch::default()),
            pressed: Condvar::new(),
        }
    }

    /// Presses a key, and reports whether the key's state changed.
    /// If key does not exist, returns [Error::InvalidKey].
    ///
    /// A key going down is offered to the latch. Only the first press after
    /// the latch is cleared is kept; the rest are dropped.
    pub fn press(&self, key: usize) -> Result<bool> {
        let flag = self.keys.get(key).ok_or(Error::InvalidKey { key })?;
        if flag.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        let mut latch = self.lock();
        if !latch.ready {
            latch.key = key as u8;
            latch.ready = true;
            self.pressed.notify_all();
        }
        Ok(true)
    }

    /// Releases a key, and reports whether the key's state changed.
    /// If key is outside range `0..=0xF`, returns [Error::InvalidKey].
    pub fn release(&self, key: usize) -> Result<bool> {
        let flag = self.keys.get(key).ok_or(Error::InvalidKey { key })?;
        Ok(flag.swap(false, Ordering::AcqRel))
    }

    /// Returns whether the given key is held. Only the low nibble of `key` is used.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xf) as usize].load(Ordering::Acquire)
    }

    /// Clears the latch, then blocks until the next key press and returns that key.
    ///
    /// Returns [Error::Interrupted] if [Keypad::interrupt] is called first.
    pub fn wait_for_key(&self) -> Result<u8> {
        let mut latch = self.lock();
        latch.ready = false;
        let latch = self
            .pressed
            .wait_while(latch, |l| !l.ready && !l.interrupted)
            .unwrap_or_else(PoisonError::into_inner);
        if latch.interrupted {
            return Err(Error::Interrupted);
        }
        Ok(latch.key)
    }

    /// Wakes any pending [Keypad::wait_for_key] with [Error::Interrupted].
    ///
    /// Waits keep failing until [Keypad::reset] is called.
    pub fn interrupt(&self) {
        self.lock().interrupted = true;
        self.pressed.notify_all();
    }

    /// Returns true if the keypad has been interrupted
    pub fn is_interrupted(&self) -> bool {
        self.lock().interrupted
    }

    /// Releases every key and clears the latch and any interruption
    pub fn reset(&self) {
        for key in &self.keys {
            key.store(false, Ordering::Release);
        }
        *self.lock() = Latch::default();
    }

    fn lock(&self) -> MutexGuard<'_, Latch> {
        self.latch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for Keypad {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let held: Vec<usize> = (0..KEYS).filter(|&k| self.is_pressed(k as u8)).collect();
        f.debug_struct("Keypad")
            .field("held", &held)
            .field("latch", &*self.lock())
            .finish()
    }
}
