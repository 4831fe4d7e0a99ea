//! Platform hook surface (HK).
//!
//! Grounded on the function-pointer typedefs in `note.h`
//! (`serialResetFn`/`serialTransmitFn`/`serialAvailableFn`/`serialReceiveFn`,
//! `i2cResetFn`/`i2cTransmitFn`/`i2cReceiveFn`, `mutexFn`, `delayMsFn`,
//! `getMsFn`, `debugOutputFn`, `heartbeatFn`) and the Design Notes
//! instruction (spec §9) that function-pointer polymorphism over U/I
//! becomes a small sum type.
//!
//! `mallocFn`/`freeFn` have no counterpart here: the host language manages
//! memory, so the allocator hook pair is simply absent from this port.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// The physical UART and I²C primitives a host must supply live on
/// [`crate::transport::uart::SerialIo`] and [`crate::transport::i2c::I2cIo`]
/// instead of here: at most one of UART/I²C is active at a time, so they
/// travel with the active [`crate::transport::Transport`] variant rather
/// than sitting alongside the hooks below.
type VoidHook = Arc<dyn Fn() + Send + Sync>;
type DebugHook = Arc<dyn Fn(&str) + Send + Sync>;
type TransactionStartHook = Arc<dyn Fn(u32) -> bool + Send + Sync>;
type GetMsHook = Arc<dyn Fn() -> u32 + Send + Sync>;
type DelayMsHook = Arc<dyn Fn(u32) + Send + Sync>;
/// `bool heartbeatFn(const char *heartbeatJson, void *context)` in `note.h`;
/// the `void *context` half of that signature is simply whatever the
/// closure itself captures in a Rust port. By convention here, returning
/// `false` asks the in-flight receive loop to abort early.
type HeartbeatHook = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// All optional platform hooks except the physical I/O (which is carried
/// by [`crate::transport::Transport`] instead, since at most one of
/// UART/I²C is active at a time).
///
/// Default-constructed `Hooks` already has working `get_ms`/`delay_ms`
/// (backed by `std::time`/`std::thread::sleep`, which a hosted Rust build
/// always has, unlike a `no_std` target) — only the mutex, debug and
/// transaction start/stop hooks default to no-ops, per the "degrade
/// safely" contract in spec §4.1.
#[derive(Clone)]
pub struct Hooks {
    pub get_ms: GetMsHook,
    pub delay_ms: DelayMsHook,
    pub debug: Option<DebugHook>,
    pub lock_i2c: Option<VoidHook>,
    pub unlock_i2c: Option<VoidHook>,
    pub lock_note: Option<VoidHook>,
    pub unlock_note: Option<VoidHook>,
    pub transaction_start: Option<TransactionStartHook>,
    pub transaction_stop: Option<VoidHook>,
    pub heartbeat: Option<HeartbeatHook>,
}

fn monotonic_epoch() -> &'static Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now)
}

fn default_get_ms() -> u32 {
    monotonic_epoch().elapsed().as_millis() as u32
}

fn default_delay_ms(ms: u32) {
    std::thread::sleep(std::time::Duration::from_millis(ms as u64));
}

impl Default for Hooks {
    fn default() -> Self {
        Hooks {
            get_ms: Arc::new(default_get_ms),
            delay_ms: Arc::new(default_delay_ms),
            debug: None,
            lock_i2c: None,
            unlock_i2c: None,
            lock_note: None,
            unlock_note: None,
            transaction_start: None,
            transaction_stop: None,
            heartbeat: None,
        }
    }
}

impl Hooks {
    pub fn get_ms(&self) -> u32 {
        (self.get_ms)()
    }

    pub fn delay_ms(&self, ms: u32) {
        (self.delay_ms)(ms)
    }

    pub fn debug(&self, text: &str) {
        if let Some(f) = &self.debug {
            f(text);
        }
    }

    pub fn lock_i2c(&self) {
        if let Some(f) = &self.lock_i2c {
            f();
        }
    }

    pub fn unlock_i2c(&self) {
        if let Some(f) = &self.unlock_i2c {
            f();
        }
    }

    /// Acquires the bus mutex (if one is installed) and returns a guard that
    /// releases it on drop, so every exit path out of an I2C transport
    /// operation unlocks exactly as many times as it locked (spec §8:
    /// "`#locks == #unlocks` at the end of every public entry point on
    /// every exit path").
    pub fn bus_lock(&self) -> BusGuard<'_> {
        self.lock_i2c();
        BusGuard { hooks: self }
    }

    pub fn lock_note(&self) {
        if let Some(f) = &self.lock_note {
            f();
        }
    }

    pub fn unlock_note(&self) {
        if let Some(f) = &self.unlock_note {
            f();
        }
    }

    /// Returns `true` (proceed) when no transaction-start hook is set,
    /// matching "degrade safely" for hosts that don't need to wake the
    /// device before each exchange.
    pub fn transaction_start(&self, timeout_ms: u32) -> bool {
        match &self.transaction_start {
            Some(f) => f(timeout_ms),
            None => true,
        }
    }

    pub fn transaction_stop(&self) {
        if let Some(f) = &self.transaction_stop {
            f();
        }
    }

    /// Invoked periodically while a response is still arriving, so a host
    /// can service a watchdog or other housekeeping during a long poll.
    /// Returns `true` (keep waiting) when no heartbeat sink is installed,
    /// matching "degrade safely".
    pub fn heartbeat(&self, in_progress_json: &str) -> bool {
        match &self.heartbeat {
            Some(f) => f(in_progress_json),
            None => true,
        }
    }
}

/// RAII guard for the bus mutex (spec §4.1: "the bus mutex protects the
/// physical bus shared with non-Notecard devices"). Released via
/// [`Hooks::unlock_i2c`] on drop.
pub struct BusGuard<'a> {
    hooks: &'a Hooks,
}

impl Drop for BusGuard<'_> {
    fn drop(&mut self) {
        self.hooks.unlock_i2c();
    }
}

/// Unsigned, wraparound-tolerant elapsed time, per spec §4.1: "the engine
/// MUST tolerate wraparound; all elapsed computations use unsigned
/// subtraction."
pub fn elapsed_ms(start: u32, now: u32) -> u32 {
    now.wrapping_sub(start)
}
