//! Host-side transport and request engine for the Blues.io Notecard.
//!
//! Protocol for transmitting: <https://dev.blues.io/notecard/notecard-guides/serial-over-i2c-protocol/>
//! API: <https://dev.blues.io/reference/notecard-api/introduction/>
//!
//! All durable state (the active transport, hooks, user agent, sequence
//! number, CRC support flag) lives behind a single process-wide [`Engine`],
//! mirroring note-c's static globals. [`Notecard`] is a zero-sized handle
//! onto that state; constructing more than one is harmless since they all
//! refer to the same engine.

pub mod card;
pub mod crc;
pub mod dfu;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod hub;
pub mod json_ext;
pub mod limits;
pub mod note;
pub mod ntn;
pub mod transport;
pub mod web;

pub use error::{NoteError, NoteErrorKind};
pub use hooks::Hooks;
pub use transport::{I2cIo, SerialIo};

use card::Card;
use dfu::Dfu;
use hub::Hub;
use note::Note;
use ntn::Ntn;
use web::Web;

/// The driver handle. Carries no state of its own; every method forwards
/// to the process-wide [`engine`]. Cloning or constructing additional
/// handles is always safe.
#[derive(Debug, Default, Clone, Copy)]
pub struct Notecard;

impl Notecard {
    /// Creates a new handle. No interface is selected until
    /// [`Notecard::set_fn_serial`] or [`Notecard::set_fn_i2c`] is called.
    pub fn new() -> Self {
        Notecard
    }

    /// Selects a UART/serial transport.
    pub fn set_fn_serial(&self, io: Box<dyn SerialIo>) {
        engine::set_fn_serial(io)
    }

    /// Selects an I2C transport. `address == 0` uses the Notecard default
    /// address; `max_segment == 0` uses the protocol default chunk size.
    pub fn set_fn_i2c(&self, io: Box<dyn I2cIo>, address: u16, max_segment: usize) {
        engine::set_fn_i2c(io, address, max_segment)
    }

    /// Clears the active interface; subsequent transactions fail with
    /// [`NoteErrorKind::Io`].
    pub fn set_fn_disabled(&self) {
        engine::set_fn_disabled()
    }

    /// Replaces the platform hook bundle wholesale.
    pub fn set_hooks(&self, hooks: Hooks) {
        engine::set_hooks(hooks)
    }

    /// Mutates the installed hook bundle in place.
    pub fn with_hooks(&self, f: impl FnOnce(&mut Hooks)) {
        engine::with_hooks(f)
    }

    /// Sets the wall-clock budget (in seconds) for `*_with_retry` calls.
    /// Returns the previous value. `0` disables the wall-clock bound.
    pub fn set_request_timeout(&self, seconds: u32) -> u32 {
        engine::set_request_timeout(seconds)
    }

    /// Overrides the `req`-piggybacked user agent string outright.
    pub fn set_user_agent(&self, agent: impl Into<String>) {
        engine::set_user_agent(agent)
    }

    /// Records host OS identity used to compose the default user agent.
    pub fn set_user_agent_os(
        &self,
        name: impl Into<String>,
        platform: impl Into<String>,
        family: impl Into<String>,
        version: impl Into<String>,
    ) {
        engine::set_user_agent_os(name, platform, family, version)
    }

    /// Records host CPU identity used to compose the default user agent.
    pub fn set_user_agent_cpu(
        &self,
        arch: impl Into<String>,
        cores: u32,
        mem: u32,
        mhz: u32,
        vendor: impl Into<String>,
        name: impl Into<String>,
    ) {
        engine::set_user_agent_cpu(arch, cores, mem, mhz, vendor, name)
    }

    /// Suspends the `{transaction-start}`/`{transaction-stop}` debug hook
    /// calls around each transaction, e.g. while a caller drives its own
    /// serial console session concurrently (spec §4.6).
    pub fn suspend_transaction_debug(&self) {
        engine::suspend_transaction_debug()
    }

    /// Resumes transaction-debug hook calls after
    /// [`Notecard::suspend_transaction_debug`].
    pub fn resume_transaction_debug(&self) {
        engine::resume_transaction_debug()
    }

    /// `true` if the active transport's most recent transaction returned
    /// `{io}` and a reset is recommended before retrying.
    pub fn reset_required(&self) -> bool {
        engine::reset_required()
    }

    /// Resets the active transport's line discipline (resync on UART,
    /// drain-and-resync on I2C).
    pub fn reset(&self) -> bool {
        engine::reset()
    }

    /// Runs a raw request or command document through the orchestrator.
    /// `Ok(None)` only for a `cmd`-style document.
    pub fn request_response(&self, req: serde_json::Value) -> Result<Option<serde_json::Value>, NoteError> {
        engine::request_response(req)
    }

    /// Like [`Notecard::request_response`] but reports success as a bool
    /// (absence of an `err` field) rather than the document itself.
    pub fn request(&self, req: serde_json::Value) -> Result<bool, NoteError> {
        engine::request(req)
    }

    /// Retries [`Notecard::request`] until it succeeds or `timeout_s`
    /// elapses.
    pub fn request_with_retry(&self, req: serde_json::Value, timeout_s: u32) -> Result<bool, NoteError> {
        engine::request_with_retry(req, timeout_s)
    }

    /// Retries [`Notecard::request_response`] until it succeeds or
    /// `timeout_s` elapses.
    pub fn request_response_with_retry(
        &self,
        req: serde_json::Value,
        timeout_s: u32,
    ) -> Result<Option<serde_json::Value>, NoteError> {
        engine::request_response_with_retry(req, timeout_s)
    }

    /// Starts a blank `req` document for `action`.
    pub fn new_request(&self, action: &str) -> serde_json::Value {
        engine::new_request(action)
    }

    /// Starts a blank `cmd` document for `action`.
    pub fn new_command(&self, action: &str) -> serde_json::Value {
        engine::new_command(action)
    }

    /// The `card.*` convenience wrapper.
    pub fn card(&self) -> Card {
        Card
    }

    /// The `hub.*` convenience wrapper.
    pub fn hub(&self) -> Hub {
        Hub
    }

    /// The `note.*` convenience wrapper.
    pub fn note(&self) -> Note {
        Note
    }

    /// The `web.*` convenience wrapper.
    pub fn web(&self) -> Web {
        Web
    }

    /// The `dfu.*` convenience wrapper.
    pub fn dfu(&self) -> Dfu {
        Dfu
    }

    /// The `ntn.*` convenience wrapper (Notecard Cellular+NTN firmware).
    pub fn ntn(&self) -> Ntn {
        Ntn
    }
}
