// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! A 60Hz countdown timer running on its own thread.
//!
//! The counter lives behind a [Mutex] shared by the interpreter and the clock
//! thread. While the counter is zero the clock thread sleeps on a [Condvar]
//! and does not tick; writing a nonzero value wakes it.

use log::{debug, error, trace};
use std::{
    fmt::{Debug, Formatter},
    io,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

/// The nominal tick period of a Chip-8 timer (1/60 s)
pub const PERIOD: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Called with `true` when a timer starts counting down, and `false` when it reaches zero
pub type Observer = Box<dyn FnMut(bool) + Send>;

#[derive(Default)]
struct State {
    value: u8,
    /// Set while the clock is counting down
    active: bool,
    stopped: bool,
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
    observer: Mutex<Option<Observer>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observer(&self) -> MutexGuard<'_, Option<Observer>> {
        self.observer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a start/stop and reports it to the observer.
    ///
    /// Both happen under the observer lock, so an observer installed
    /// concurrently sees each transition exactly once.
    fn transition(&self, active: bool) {
        trace!("timer {}", if active { "started" } else { "idle" });
        let mut observer = self.observer();
        self.lock().active = active;
        if let Some(observer) = observer.as_mut() {
            observer(active)
        }
    }
}

/// An autonomous countdown timer
///
/// # Examples
/// ```rust
/// # use chirp_vm::*;
/// let timer = Timer::new("delay");
/// timer.set(2);
/// assert!(timer.get() <= 2);
/// std::thread::sleep(std::time::Duration::from_millis(100));
/// assert_eq!(0, timer.get());
/// ```
pub struct Timer {
    name: &'static str,
    shared: Arc<Shared>,
    clock: Option<JoinHandle<()>>,
}

impl Timer {
    /// Starts a new timer ticking at 60Hz
    pub fn new(name: &'static str) -> Self {
        Timer::with_period(name, PERIOD)
    }

    /// Starts a new timer ticking once every `period`
    ///
    /// If the clock thread cannot be spawned, the timer is returned already
    /// cancelled: it holds whatever is written to it but never counts down.
    /// Check [Timer::is_cancelled] to detect this.
    pub fn with_period(name: &'static str, period: Duration) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            wake: Condvar::new(),
            observer: Mutex::new(None),
        });
        let clock = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(format!("{name} timer"))
                .spawn(move || run_clock(&shared, period))
        };
        Timer::with_clock(name, shared, clock)
    }

    fn with_clock(
        name: &'static str,
        shared: Arc<Shared>,
        clock: io::Result<JoinHandle<()>>,
    ) -> Self {
        let clock = match clock {
            Ok(clock) => {
                debug!("{name} timer started");
                Some(clock)
            }
            Err(e) => {
                error!("could not start {name} timer: {e}");
                shared.lock().stopped = true;
                None
            }
        };
        Timer {
            name,
            shared,
            clock,
        }
    }

    /// Gets the current value of the counter
    pub fn get(&self) -> u8 {
        self.shared.lock().value
    }

    /// Sets the counter. A nonzero value wakes an idle clock.
    pub fn set(&self, value: u8) {
        let mut state = self.shared.lock();
        state.value = value;
        self.shared.wake.notify_all();
    }

    /// Installs a callback for the timer's idle/active transitions.
    ///
    /// The callback runs on the clock thread, and must not block for long.
    /// If the timer is already counting down, it is first called with `true`
    /// on the current thread.
    pub fn observe(&self, observer: impl FnMut(bool) + Send + 'static) {
        let mut slot = self.shared.observer();
        let mut observer: Observer = Box::new(observer);
        let active = self.shared.lock().active;
        if active {
            observer(true);
        }
        *slot = Some(observer);
    }

    /// Stops the clock thread and waits for it to exit.
    ///
    /// The counter keeps its last value, and no longer decrements.
    pub fn cancel(&mut self) {
        self.shared.lock().stopped = true;
        self.shared.wake.notify_all();
        if let Some(clock) = self.clock.take() {
            if clock.join().is_err() {
                error!("{} timer thread panicked", self.name);
            }
            debug!("{} timer stopped", self.name);
        }
    }

    /// Returns true once [Timer::cancel] has been called, or if the clock
    /// thread never started
    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().stopped
    }
}

fn run_clock(shared: &Shared, period: Duration) {
    let mut deadline = Instant::now() + period;
    let mut state = shared.lock();
    loop {
        if state.stopped {
            return;
        }
        if state.value == 0 {
            if state.active {
                drop(state);
                shared.transition(false);
                state = shared.lock();
                continue;
            }
            state = shared
                .wake
                .wait_while(state, |s| s.value == 0 && !s.stopped)
                .unwrap_or_else(PoisonError::into_inner);
            deadline = Instant::now() + period;
            continue;
        }
        if !state.active {
            drop(state);
            shared.transition(true);
            state = shared.lock();
            continue;
        }
        let now = Instant::now();
        if now < deadline {
            // Writes don't end the wait early; only cancellation does
            state = shared
                .wake
                .wait_timeout_while(state, deadline - now, |s| !s.stopped)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
            continue;
        }
        state.value -= 1;
        // after a late wakeup, do not burn through missed ticks back to back
        deadline = (deadline + period).max(now + period / 2);
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Debug for Timer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.name)
            .field("value", &self.get())
            .field("running", &self.clock.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn starts_at_zero() {
        let timer = Timer::new("test");
        assert_eq!(0, timer.get());
        thread::sleep(PERIOD * 3);
        assert_eq!(0, timer.get());
    }

    #[test]
    fn counts_down_to_zero_and_stays() {
        let timer = Timer::new("test");
        timer.set(240);
        thread::sleep(Duration::from_secs(2));
        let mid = timer.get();
        assert!(0 < mid && mid < 240, "mid-decay value was {mid}");
        thread::sleep(Duration::from_millis(2500));
        assert_eq!(0, timer.get());
        thread::sleep(PERIOD * 3);
        assert_eq!(0, timer.get());
    }

    #[test]
    fn resumes_after_idle() {
        let timer = Timer::with_period("test", Duration::from_millis(1));
        timer.set(3);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(0, timer.get());
        timer.set(200);
        thread::sleep(Duration::from_millis(20));
        let value = timer.get();
        assert!(value < 200, "timer did not resume: {value}");
    }

    #[test]
    fn cancel_stops_ticking() {
        let mut timer = Timer::with_period("test", Duration::from_millis(1));
        timer.set(200);
        timer.cancel();
        assert!(timer.is_cancelled());
        let value = timer.get();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(value, timer.get());
        // cancelling twice is fine
        timer.cancel();
    }

    #[test]
    fn observer_sees_transitions() {
        let timer = Timer::with_period("test", Duration::from_millis(1));
        let (tx, rx) = mpsc::channel();
        timer.observe(move |active| {
            tx.send(active).ok();
        });
        timer.set(5);
        assert_eq!(Ok(true), rx.recv_timeout(Duration::from_secs(1)));
        assert_eq!(Ok(false), rx.recv_timeout(Duration::from_secs(1)));
    }

    #[test]
    fn observer_installed_mid_count() {
        let timer = Timer::with_period("test", Duration::from_millis(2));
        timer.set(100);
        thread::sleep(Duration::from_millis(20));
        let (tx, rx) = mpsc::channel();
        timer.observe(move |active| {
            tx.send(active).ok();
        });
        assert_eq!(Ok(true), rx.recv_timeout(Duration::from_secs(1)));
        assert_eq!(Ok(false), rx.recv_timeout(Duration::from_secs(2)));
    }

    #[test]
    fn observer_installed_while_idle() {
        let timer = Timer::with_period("test", Duration::from_millis(1));
        let (tx, rx) = mpsc::channel();
        timer.observe(move |active| {
            tx.send(active).ok();
        });
        assert!(rx.recv_timeout(Duration::from_millis(20)).is_err());
        timer.set(3);
        assert_eq!(Ok(true), rx.recv_timeout(Duration::from_secs(1)));
        assert_eq!(Ok(false), rx.recv_timeout(Duration::from_secs(1)));
    }

    #[test]
    fn clock_spawn_failure() {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            wake: Condvar::new(),
            observer: Mutex::new(None),
        });
        let failed = Err(io::Error::new(io::ErrorKind::Other, "no threads"));
        let mut timer = Timer::with_clock("test", shared, failed);
        assert!(timer.is_cancelled());
        timer.set(5);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(5, timer.get());
        assert!(format!("{timer:?}").contains("running: false"));
        timer.cancel();
    }
}
