//! Chunked I/O dispatcher (D) and the U/I transport sum type.
//!
//! Grounded on `n_ioflow.c` (the `NoteChunkedTransmit`/`NoteChunkedReceive`/
//! `NoteJSONTransaction` dispatch over function-pointer slots) and the
//! Design Notes instruction (spec §9) that "function-pointer polymorphism
//! over U/I becomes a small sum type... dispatch is exhaustive."
//!
//! The still-arriving-response loop in [`Transport::json_transaction`] is
//! also where the optional heartbeat sink (spec §4.1's "periodic progress
//! callback with arbitrary context") fires, once per receive iteration
//! while more of the response remains outstanding — the natural host
//! analogue of `note-c`'s `heartbeatFn`, whose only call site wasn't among
//! the retrieved `note-c` sources (only its getter/setter were).

pub mod i2c;
pub mod uart;

use crate::error::NoteError;
use crate::hooks::Hooks;
use crate::limits::{RESPONSE_BUF_INITIAL, RESPONSE_BUF_MAX};

pub use i2c::I2cTransport;
pub use uart::UartTransport;

/// The currently active transport, or none. Mirrors the process-wide
/// `{none, serial, i2c}` interface-state enum of spec §3.
pub enum Transport {
    None,
    Uart(UartTransport),
    I2c(I2cTransport),
}

impl Transport {
    /// `D.reset()`: calls the active transport's reset; `true` when no
    /// active interface (spec §4.4: "returns true when no active
    /// interface").
    pub fn reset(&mut self, hooks: &Hooks) -> bool {
        match self {
            Transport::None => true,
            Transport::Uart(u) => u.reset(hooks),
            Transport::I2c(i) => i.reset(hooks),
        }
    }

    fn chunked_transmit(&mut self, hooks: &Hooks, buf: &[u8], delay: bool) -> Result<(), NoteError> {
        match self {
            Transport::None => Err(NoteError::NoInterface),
            Transport::Uart(u) => u.chunked_transmit(hooks, buf, delay),
            Transport::I2c(i) => i.chunked_transmit(hooks, buf, delay),
        }
    }

    /// `D.chunked_receive`: one receive iteration. Returns the bytes read
    /// and the transport's post-iteration `available` estimate.
    fn chunked_receive(
        &mut self,
        hooks: &Hooks,
        buf: &mut [u8],
        delay: bool,
        timeout_ms: u32,
        available_in: u32,
    ) -> Result<(usize, u32), NoteError> {
        match self {
            Transport::None => Err(NoteError::NoInterface),
            Transport::Uart(u) => u.chunked_receive(hooks, buf, delay, timeout_ms),
            Transport::I2c(i) => i.chunked_receive(hooks, buf, delay, timeout_ms, available_in),
        }
    }

    /// `D.json_transaction(req, out_rsp?, timeout_ms)`.
    ///
    /// `req` must already end in `\n`. If `want_response` is `false` (a
    /// `cmd`), returns `Ok(None)` once the transmit completes. Otherwise
    /// grows a heap buffer by doubling (spec §4.4) until `available == 0`
    /// and the last byte received is `\n`, bounded by `timeout_ms` across
    /// all receive iterations.
    pub fn json_transaction(
        &mut self,
        hooks: &Hooks,
        req: &[u8],
        want_response: bool,
        timeout_ms: u32,
    ) -> Result<Option<String>, NoteError> {
        if matches!(self, Transport::None) {
            return Err(NoteError::NoInterfaceJson);
        }

        self.chunked_transmit(hooks, req, true)?;

        if !want_response {
            return Ok(None);
        }

        let start = hooks.get_ms();
        let mut out: Vec<u8> = Vec::with_capacity(RESPONSE_BUF_INITIAL);
        let mut available = 0u32;
        let mut cap = RESPONSE_BUF_INITIAL;

        loop {
            if timeout_ms != 0 && crate::hooks::elapsed_ms(start, hooks.get_ms()) > timeout_ms {
                return Err(NoteError::timeout("transaction timeout"));
            }

            if out.len() >= cap {
                cap = cap.saturating_mul(2).min(RESPONSE_BUF_MAX).max(out.len() + 1);
            }
            let mut chunk = vec![0u8; cap - out.len()];
            let (n, avail) = self.chunked_receive(hooks, &mut chunk, true, timeout_ms, available)?;
            out.extend_from_slice(&chunk[..n]);
            available = avail;

            let done = available == 0 && out.last() == Some(&b'\n');
            if done {
                break;
            }
            if available > 0 && !hooks.heartbeat(&String::from_utf8_lossy(&out)) {
                return Err(NoteError::io("response aborted by heartbeat sink"));
            }
            if out.len() >= RESPONSE_BUF_MAX {
                return Err(NoteError::io("response exceeded maximum buffer size"));
            }
            if n == 0 && available == 0 {
                break;
            }
        }

        String::from_utf8(out).map(Some).map_err(|_| NoteError::io("response was not valid utf-8"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::i2c::I2cIo;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Replies to the priming query with `available = 2`, then to a
    /// 2-byte sized read with the closing `}\n` and `available = 0`, so
    /// the response spans two `chunked_receive` iterations.
    struct TwoChunkI2c {
        reads: Arc<Mutex<VecDeque<Vec<u8>>>>,
    }

    impl I2cIo for TwoChunkI2c {
        fn reset(&mut self) {}
        fn transmit(&mut self, _address: u16, _buffer: &[u8]) -> Option<String> {
            None
        }
        fn receive(&mut self, _address: u16, buffer: &mut [u8], _requested: u8) -> Option<String> {
            let frame = self.reads.lock().unwrap().pop_front()?;
            buffer[..frame.len()].copy_from_slice(&frame);
            None
        }
    }

    fn two_chunk_transport() -> Transport {
        let reads = Arc::new(Mutex::new(VecDeque::from(vec![vec![2, 0], vec![0, 2, b'}', b'\n']])));
        Transport::I2c(I2cTransport::new(Box::new(TwoChunkI2c { reads }), 0x17, 32))
    }

    fn accelerated_clock_hooks() -> Hooks {
        let clock = Arc::new(AtomicU32::new(0));
        let get_clock = clock.clone();
        Hooks { get_ms: Arc::new(move || get_clock.fetch_add(10, Ordering::Relaxed)), delay_ms: Arc::new(|_| {}), ..Hooks::default() }
    }

    #[test]
    fn heartbeat_fires_once_while_more_of_the_response_is_outstanding() {
        let mut t = two_chunk_transport();
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let mut hooks = accelerated_clock_hooks();
        hooks.heartbeat = Some(Arc::new(move |_json: &str| {
            c.fetch_add(1, Ordering::Relaxed);
            true
        }));
        let resp = t.json_transaction(&hooks, b"{}\n", true, 1000).unwrap();
        assert_eq!(resp.as_deref(), Some("}\n"));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn heartbeat_returning_false_aborts_the_receive_loop() {
        let mut t = two_chunk_transport();
        let mut hooks = accelerated_clock_hooks();
        hooks.heartbeat = Some(Arc::new(|_json: &str| false));
        let err = t.json_transaction(&hooks, b"{}\n", true, 1000).unwrap_err();
        assert_eq!(err.kind(), Some(crate::error::NoteErrorKind::Io));
    }
}
