// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Host-side settings for the interpreter

use crate::timer::PERIOD;
use std::time::Duration;

/// Represents flags that aid in operation, but aren't inherent to the CPU
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Flags {
    /// Set when debug (live disassembly) mode enabled
    pub debug: bool,
    /// Fixed delay between instructions, if any.
    ///
    /// This only paces execution for the host; it never changes the result.
    pub pace: Option<Duration>,
    /// The tick period of the delay and sound timers
    pub timer_period: Duration,
}

impl Default for Flags {
    fn default() -> Self {
        Flags {
            debug: false,
            pace: None,
            timer_period: PERIOD,
        }
    }
}

impl Flags {
    /// Toggles debug mode
    ///
    /// # Examples
    /// ```rust
    /// # use chirp_vm::*;
    /// let mut flags = Flags::default();
    /// assert_eq!(false, flags.debug);
    /// // Toggle debug mode
    /// flags.debug();
    /// assert_eq!(true, flags.debug);
    /// ```
    pub fn debug(&mut self) {
        self.debug = !self.debug
    }
}
