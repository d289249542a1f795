//! Embassy time driver on the SysTick counter, single alarm

use core::cell::Cell;

use critical_section::Mutex;
use embassy_time_driver::{AlarmHandle, Driver};
use hvac_core::TickClock;
use portable_atomic::{AtomicBool, Ordering};

type AlarmCallback = Option<(fn(*mut ()), *mut ())>;

/// Tick counter advanced by the SysTick interrupt
pub struct TickDriver {
    clock: TickClock,
    allocated: AtomicBool,
    callback: Mutex<Cell<AlarmCallback>>,
}

// The callback context is only touched inside a critical section
unsafe impl Sync for TickDriver {}

impl TickDriver {
    const fn new() -> Self {
        Self {
            clock: TickClock::new(),
            allocated: AtomicBool::new(false),
            callback: Mutex::new(Cell::new(None)),
        }
    }

    /// Advance one tick and fire the alarm once it is due
    fn tick(&self) {
        if !self.clock.advance() {
            return;
        }
        let callback = critical_section::with(|cs| self.callback.borrow(cs).get());
        if let Some((callback, ctx)) = callback {
            callback(ctx);
        }
    }
}

impl Driver for TickDriver {
    fn now(&self) -> u64 {
        self.clock.now()
    }

    unsafe fn allocate_alarm(&self) -> Option<AlarmHandle> {
        if self.allocated.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(AlarmHandle::new(0))
        }
    }

    fn set_alarm_callback(&self, _alarm: AlarmHandle, callback: fn(*mut ()), ctx: *mut ()) {
        critical_section::with(|cs| {
            self.callback.borrow(cs).set(Some((callback, ctx)));
        });
    }

    fn set_alarm(&self, _alarm: AlarmHandle, timestamp: u64) -> bool {
        // Already due: the caller handles it
        self.clock.arm(timestamp)
    }
}

embassy_time_driver::time_driver_impl!(static DRIVER: TickDriver = TickDriver::new());

/// SysTick interrupt body, one call per 32.768 kHz tick
pub fn on_systick() {
    DRIVER.tick();
}

// Critical section implementation for single-core RISC-V
critical_section::set_impl!(RiscvCriticalSection);

struct RiscvCriticalSection;

unsafe impl critical_section::Impl for RiscvCriticalSection {
    unsafe fn acquire() -> u8 {
        let mut mstatus: usize;
        core::arch::asm!("csrrci {}, mstatus, 8", out(reg) mstatus);
        (mstatus & 8) as u8
    }

    unsafe fn release(was_active: u8) {
        if was_active != 0 {
            core::arch::asm!("csrsi mstatus, 8");
        }
    }
}
