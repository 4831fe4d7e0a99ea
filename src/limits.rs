//! Compile-time protocol constants (spec §6.3).
//!
//! Grounded on `n_const.h`'s `NOTE_I2C_*`/`NOTE_TRANSACTION_TIMEOUT_SEC`/
//! `CARD_REQUEST_*` macros in the original note-c library; values are
//! carried over unchanged since they are bit-exact protocol requirements,
//! not tuning knobs.

/// Default I2C device address (`NOTE_I2C_ADDR_DEFAULT`).
pub const I2C_ADDR_DEFAULT: u16 = 0x17;

/// Default per-segment max byte count for I2C writes/reads when the caller
/// passes `0` (`NOTE_I2C_MAX_DEFAULT`). note-c resolves this to a
/// conservative 30-byte segment rather than the protocol ceiling; the
/// teacher's own I2C driver segments at the same 30-byte size.
pub const I2C_MAX_DEFAULT: usize = 30;

/// Hard protocol ceiling on any I2C segment, regardless of what the caller
/// requests (`NOTE_I2C_MAX_MAX`).
pub const I2C_MAX_PROTOCOL: usize = 255;

/// How long to drain during I2C reset before giving up on an attempt.
pub const CARD_RESET_DRAIN_MS: u32 = 250;

/// Number of resync attempts `I2c::reset` makes before giving up.
pub const CARD_RESET_SYNC_RETRIES: u32 = 10;

/// Backoff after an I2C transmit NACK before retrying.
pub const CARD_REQUEST_I2C_NACK_WAIT_MS: u32 = 1000;

/// Delay between successive I2C segment writes/reads.
pub const CARD_REQUEST_I2C_SEGMENT_DELAY_MS: u32 = 250;

/// Max bytes per UART segment (`CARD_REQUEST_SERIAL_SEGMENT_MAX_LEN`).
pub const CARD_REQUEST_SERIAL_SEGMENT_MAX_LEN: usize = 250;

/// Delay between successive UART segment writes.
pub const CARD_REQUEST_SERIAL_SEGMENT_DELAY_MS: u32 = 250;

/// Default per-transaction timeout when no per-request override is given
/// and [`crate::engine::set_request_timeout`] has not been used
/// (`CARD_INTER_TRANSACTION_TIMEOUT_SEC`).
pub const CARD_INTER_TRANSACTION_TIMEOUT_SEC: u32 = 30;

/// How long a UART reset waits, after sending two newlines, for the device
/// to go quiet.
pub const CARD_RESET_DRAIN_SERIAL_MS: u32 = 500;

/// Number of UART resync attempts before giving up.
pub const CARD_RESET_SERIAL_RETRIES: u32 = 10;

/// Bounded retries for a single orchestrator transaction
/// (`CARD_REQUEST_RETRIES_ALLOWED`).
pub const CARD_REQUEST_RETRIES_ALLOWED: u32 = 3;

/// Wait between orchestrator retries (`RETRY_DELAY_MS`).
pub const RETRY_DELAY_MS: u32 = 500;

/// Starting size of the doubling response arena in the chunked-I/O
/// dispatcher.
pub const RESPONSE_BUF_INITIAL: usize = 256;

/// Upper bound the doubling response arena will grow to.
pub const RESPONSE_BUF_MAX: usize = 18 * 1024;
