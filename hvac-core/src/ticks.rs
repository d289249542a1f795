//! 64-bit tick count with one pending deadline
//!
//! Advanced from the timer interrupt and read from thread mode. Both words
//! live behind a critical section, so a read never observes half an update
//! and the interrupt never waits on thread mode.

use core::cell::Cell;

use critical_section::Mutex;

/// Deadline value meaning "nothing armed"
const DISARMED: u64 = u64::MAX;

struct ClockState {
    ticks: Cell<u64>,
    deadline: Cell<u64>,
}

/// Monotonic tick counter with a single deadline
pub struct TickClock {
    state: Mutex<ClockState>,
}

impl TickClock {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Clock whose count starts at `ticks`
    pub const fn starting_at(ticks: u64) -> Self {
        Self {
            state: Mutex::new(ClockState {
                ticks: Cell::new(ticks),
                deadline: Cell::new(DISARMED),
            }),
        }
    }

    pub fn now(&self) -> u64 {
        critical_section::with(|cs| self.state.borrow(cs).ticks.get())
    }

    /// Advance one tick. Returns `true` once when the armed deadline is
    /// reached; the deadline is disarmed at the same time.
    pub fn advance(&self) -> bool {
        critical_section::with(|cs| {
            let state = self.state.borrow(cs);
            let now = state.ticks.get().wrapping_add(1);
            state.ticks.set(now);

            if state.deadline.get() <= now {
                state.deadline.set(DISARMED);
                true
            } else {
                false
            }
        })
    }

    /// Arm the deadline. Returns `false` without arming when `at` has
    /// already passed.
    pub fn arm(&self, at: u64) -> bool {
        critical_section::with(|cs| {
            let state = self.state.borrow(cs);
            if at <= state.ticks.get() {
                state.deadline.set(DISARMED);
                false
            } else {
                state.deadline.set(at);
                true
            }
        })
    }

    pub fn is_armed(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).deadline.get() != DISARMED)
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}
