//! I2C transport (I): the serial-over-I2C protocol (spec §4.3).
//!
//! Grounded on `n_i2c.c` (`i2cNoteReset`/`i2cNoteTransmit`/
//! `i2cNoteReceive` and the `[available, sent]` + payload read-frame
//! shape). Per spec §9's open question, this port follows the fixture
//! interpretation: the first response byte is bytes still available after
//! this frame, the second is bytes enclosed in this frame (see
//! DESIGN.md).
//!
//! Each public entry point (`reset`, `chunked_transmit`, `chunked_receive`)
//! holds the optional bus mutex (spec §4.1's "bus mutex protects the
//! physical bus shared with non-Notecard devices") for its own duration via
//! [`Hooks::bus_lock`], mirroring `NoteLockI2C`/`NoteUnlockI2C` wrapping
//! `i2cNoteReset`/`i2cNoteTransmit`/`i2cNoteReceive` one-for-one in note-c.

use crate::error::NoteError;
use crate::hooks::{elapsed_ms, Hooks};
use crate::limits::{
    CARD_REQUEST_I2C_NACK_WAIT_MS, CARD_REQUEST_I2C_SEGMENT_DELAY_MS, CARD_RESET_DRAIN_MS,
    CARD_RESET_SYNC_RETRIES, I2C_ADDR_DEFAULT, I2C_MAX_DEFAULT, I2C_MAX_PROTOCOL,
};

/// Host-supplied I2C primitives (mirrors the `i2c*Fn` trio of spec §4.1).
pub trait I2cIo: Send {
    fn reset(&mut self);

    /// Writes a single-byte count header `N` followed by `N` payload
    /// bytes. Returns `Some(error)` on NACK/bus failure.
    fn transmit(&mut self, address: u16, buffer: &[u8]) -> Option<String>;

    /// Writes the two-byte read header `[0, requested]`, then reads
    /// `requested + 2` bytes into `buffer`: `[available, sent, ...payload]`.
    /// Returns `Some(error)` on failure.
    fn receive(&mut self, address: u16, buffer: &mut [u8], requested: u8) -> Option<String>;
}

pub struct I2cTransport {
    io: Box<dyn I2cIo>,
    address: u16,
    max_segment: usize,
}

impl I2cTransport {
    pub fn new(io: Box<dyn I2cIo>, address: u16, max_segment: usize) -> Self {
        let address = if address == 0 { I2C_ADDR_DEFAULT } else { address };
        let max_segment = if max_segment == 0 {
            I2C_MAX_DEFAULT
        } else {
            max_segment.min(I2C_MAX_PROTOCOL)
        };
        I2cTransport { io, address, max_segment }
    }

    /// A priming query: a read with `requested == 0`, used to learn how
    /// many bytes the device currently has buffered without consuming any.
    fn priming_query(&mut self, hooks: &Hooks) -> Result<u32, NoteError> {
        let mut header = [0u8; 2];
        self.io
            .receive(self.address, &mut header, 0)
            .map(|e| NoteError::io(e))
            .map_or(Ok(()), Err)?;
        let _ = hooks;
        Ok(header[0] as u32)
    }

    /// Delay one segment period, platform-reset, then up to
    /// [`CARD_RESET_SYNC_RETRIES`] attempts: transmit a lone newline (NACK
    /// backs off and retries), then drain reads until only `\r`/`\n` bytes
    /// remain or [`CARD_RESET_DRAIN_MS`] elapses.
    pub fn reset(&mut self, hooks: &Hooks) -> bool {
        let _bus = hooks.bus_lock();
        hooks.delay_ms(CARD_REQUEST_I2C_SEGMENT_DELAY_MS);
        self.io.reset();

        for _ in 0..CARD_RESET_SYNC_RETRIES {
            if let Some(_err) = self.io.transmit(self.address, b"\n") {
                hooks.delay_ms(CARD_REQUEST_I2C_NACK_WAIT_MS);
                continue;
            }

            let available = match self.priming_query(hooks) {
                Ok(a) => a,
                Err(_) => continue,
            };

            let start = hooks.get_ms();
            let mut remaining = available;
            let mut saw_payload = false;
            while remaining > 0 && elapsed_ms(start, hooks.get_ms()) < CARD_RESET_DRAIN_MS {
                let want = (remaining as usize).min(self.max_segment).min(255) as u8;
                let mut buf = vec![0u8; want as usize + 2];
                if self.io.receive(self.address, &mut buf, want).is_some() {
                    break;
                }
                let sent = buf[1] as usize;
                for &b in &buf[2..2 + sent.min(buf.len() - 2)] {
                    if b != b'\r' && b != b'\n' {
                        saw_payload = true;
                    }
                }
                remaining = buf[0] as u32;
            }

            if !saw_payload {
                return true;
            }
        }
        false
    }

    /// Partitions `buf` into chunks of at most `max_segment` bytes; a
    /// chunk failure triggers a transport reset and returns an `{io}`
    /// error (spec §4.3 invariant: never transmit again after a NACK
    /// without a pacing delay).
    pub fn chunked_transmit(&mut self, hooks: &Hooks, buf: &[u8], delay: bool) -> Result<(), NoteError> {
        let mut failed: Option<String> = None;
        {
            let _bus = hooks.bus_lock();
            for chunk in buf.chunks(self.max_segment) {
                if let Some(err) = self.io.transmit(self.address, chunk) {
                    failed = Some(err);
                    break;
                }
                if delay {
                    hooks.delay_ms(CARD_REQUEST_I2C_SEGMENT_DELAY_MS);
                }
            }
        }
        // `reset()` takes the bus lock itself, so it must run after the
        // guard above has been dropped to avoid locking twice from one
        // thread (the lock hook is host-supplied and need not be reentrant).
        if let Some(err) = failed {
            hooks.delay_ms(CARD_REQUEST_I2C_NACK_WAIT_MS);
            self.reset(hooks);
            return Err(NoteError::io(format!("i2c transmit failed: {err}")));
        }
        Ok(())
    }

    /// One receive iteration. If `available_in == 0`, issues a priming
    /// query and returns `(0, available_out)`. Otherwise issues a sized
    /// read of `min(available_in, buf.len(), max_segment)` bytes.
    pub fn chunked_receive(
        &mut self,
        hooks: &Hooks,
        buf: &mut [u8],
        delay: bool,
        _timeout_ms: u32,
        available_in: u32,
    ) -> Result<(usize, u32), NoteError> {
        if delay {
            hooks.delay_ms(CARD_REQUEST_I2C_SEGMENT_DELAY_MS);
        }

        let _bus = hooks.bus_lock();

        if available_in == 0 {
            let available = self.priming_query(hooks)?;
            return Ok((0, available));
        }

        let want = (available_in as usize).min(buf.len()).min(self.max_segment).min(255) as u8;
        let mut frame = vec![0u8; want as usize + 2];
        self.io
            .receive(self.address, &mut frame, want)
            .map(NoteError::io)
            .map_or(Ok(()), Err)?;

        let available_out = frame[0] as u32;
        let sent = (frame[1] as usize).min(buf.len());
        buf[..sent].copy_from_slice(&frame[2..2 + sent]);
        Ok((sent, available_out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct MockI2c {
        reads: Arc<Mutex<VecDeque<Vec<u8>>>>,
        nack_next_write: bool,
    }

    impl I2cIo for MockI2c {
        fn reset(&mut self) {}

        fn transmit(&mut self, _address: u16, _buffer: &[u8]) -> Option<String> {
            if self.nack_next_write {
                self.nack_next_write = false;
                Some("nack".into())
            } else {
                None
            }
        }

        fn receive(&mut self, _address: u16, buffer: &mut [u8], _requested: u8) -> Option<String> {
            match self.reads.lock().unwrap().pop_front() {
                Some(frame) => {
                    buffer[..frame.len()].copy_from_slice(&frame);
                    None
                }
                None => Some("no more fixture frames".into()),
            }
        }
    }

    fn hooks() -> Hooks {
        use std::sync::atomic::{AtomicU32, Ordering};
        let clock = Arc::new(AtomicU32::new(0));
        let get_clock = clock.clone();
        Hooks {
            get_ms: Arc::new(move || get_clock.fetch_add(10, Ordering::Relaxed)),
            delay_ms: Arc::new(|_| {}),
            ..Hooks::default()
        }
    }

    /// Hooks with counted bus-mutex calls, for asserting `#locks == #unlocks`
    /// (spec §8).
    fn hooks_with_bus_counters() -> (Hooks, Arc<std::sync::atomic::AtomicU32>, Arc<std::sync::atomic::AtomicU32>) {
        use std::sync::atomic::{AtomicU32, Ordering};
        let locks = Arc::new(AtomicU32::new(0));
        let unlocks = Arc::new(AtomicU32::new(0));
        let (l, u) = (locks.clone(), unlocks.clone());
        let clock = Arc::new(AtomicU32::new(0));
        let get_clock = clock.clone();
        let h = Hooks {
            get_ms: Arc::new(move || get_clock.fetch_add(10, Ordering::Relaxed)),
            delay_ms: Arc::new(|_| {}),
            lock_i2c: Some(Arc::new(move || {
                l.fetch_add(1, Ordering::Relaxed);
            })),
            unlock_i2c: Some(Arc::new(move || {
                u.fetch_add(1, Ordering::Relaxed);
            })),
            ..Hooks::default()
        };
        (h, locks, unlocks)
    }

    #[test]
    fn bus_mutex_locks_and_unlocks_match_on_reset() {
        let reads = Arc::new(Mutex::new(VecDeque::from(vec![vec![0, 0]])));
        let mut t = I2cTransport::new(Box::new(MockI2c { reads, nack_next_write: false }), 0x17, 32);
        let (h, locks, unlocks) = hooks_with_bus_counters();
        assert!(t.reset(&h));
        let locks = locks.load(std::sync::atomic::Ordering::Relaxed);
        assert!(locks > 0);
        assert_eq!(locks, unlocks.load(std::sync::atomic::Ordering::Relaxed));
    }

    #[test]
    fn bus_mutex_locks_and_unlocks_match_on_failed_transmit() {
        let reads = Arc::new(Mutex::new(VecDeque::from(vec![vec![0, 0]])));
        let mut t = I2cTransport::new(Box::new(MockI2c { reads, nack_next_write: true }), 0x17, 32);
        let (h, locks, unlocks) = hooks_with_bus_counters();
        // First chunk NACKs; chunked_transmit releases its own lock before
        // calling reset(), which re-acquires and releases its own.
        let _ = t.chunked_transmit(&h, b"{}\n", true);
        let locks = locks.load(std::sync::atomic::Ordering::Relaxed);
        assert!(locks > 0);
        assert_eq!(locks, unlocks.load(std::sync::atomic::Ordering::Relaxed));
    }

    #[test]
    fn reset_succeeds_when_drain_is_quiet() {
        let reads = Arc::new(Mutex::new(VecDeque::from(vec![
            vec![0, 0], // priming query: nothing available
        ])));
        let mut t = I2cTransport::new(
            Box::new(MockI2c { reads, nack_next_write: false }),
            0x17,
            32,
        );
        assert!(t.reset(&hooks()));
    }

    #[test]
    fn reset_retries_after_nack() {
        let reads = Arc::new(Mutex::new(VecDeque::from(vec![vec![0, 0]])));
        let mut t = I2cTransport::new(
            Box::new(MockI2c { reads, nack_next_write: true }),
            0x17,
            32,
        );
        assert!(t.reset(&hooks()));
    }

    #[test]
    fn chunked_receive_priming_then_sized_read() {
        let reads = Arc::new(Mutex::new(VecDeque::from(vec![
            vec![5, 0], // priming: 5 bytes available
            {
                let mut f = vec![0u8, 5];
                f.extend_from_slice(b"hello");
                f
            },
        ])));
        let mut t = I2cTransport::new(
            Box::new(MockI2c { reads, nack_next_write: false }),
            0x17,
            32,
        );
        let h = hooks();
        let mut buf = [0u8; 32];
        let (n0, avail0) = t.chunked_receive(&h, &mut buf, false, 1000, 0).unwrap();
        assert_eq!(n0, 0);
        assert_eq!(avail0, 5);
        let (n1, avail1) = t.chunked_receive(&h, &mut buf, false, 1000, avail0).unwrap();
        assert_eq!(&buf[..n1], b"hello");
        assert_eq!(avail1, 0);
    }

    #[test]
    fn max_segment_clamped_to_protocol_max() {
        let reads = Arc::new(Mutex::new(VecDeque::new()));
        let t = I2cTransport::new(Box::new(MockI2c { reads, nack_next_write: false }), 0x17, 9000);
        assert_eq!(t.max_segment, I2C_MAX_PROTOCOL);
    }
}
