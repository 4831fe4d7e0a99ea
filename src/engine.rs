//! The request orchestrator (R), JSON transaction entry (J), and public
//! request API (P).
//!
//! Grounded on `n_request.c` (`NoteRequest`/`NoteRequestResponse`/
//! `NoteTransaction`/`NoteNewRequest`/`NoteNewCommand`) and
//! `n_requestn.c` (the raw newline-pipeline entry point), per spec §§4.6-
//! 4.8. Process-wide state (hooks, active transport, sequence number,
//! reset-required flag, firmware-supports-CRC sticky flag, the
//! request-timeout override, the transaction-debug suppression counter,
//! and the user-agent fields) lives in a single [`Engine`] struct behind
//! a process-wide lock, per spec §9/§10.3.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{error, info, info_span, trace, warn};

use crate::crc::{self, CrcCheck};
use crate::error::{NoteError, NoteErrorKind};
use crate::hooks::Hooks;
use crate::json_ext::{j_contains_string, j_get_string, j_is_exact_string, j_is_present};
use crate::limits::{CARD_INTER_TRANSACTION_TIMEOUT_SEC, CARD_REQUEST_RETRIES_ALLOWED, RETRY_DELAY_MS};
use crate::transport::i2c::I2cIo;
use crate::transport::uart::SerialIo;
use crate::transport::{I2cTransport, Transport, UartTransport};

/// The `body` fields composed during `hub.set` piggyback, mirroring
/// `n_ua.c`'s field set (spec §11 / `n_ua.c`).
#[derive(Default, Clone)]
pub struct UserAgent {
    pub agent: Option<String>,
    pub os_name: Option<String>,
    pub os_platform: Option<String>,
    pub os_family: Option<String>,
    pub os_version: Option<String>,
    pub cpu_arch: Option<String>,
    pub cpu_cores: Option<u32>,
    pub cpu_mem: Option<u32>,
    pub cpu_mhz: Option<u32>,
    pub cpu_vendor: Option<String>,
    pub cpu_name: Option<String>,
    pub live: Option<bool>,
}

impl UserAgent {
    fn to_value(&self) -> Value {
        let mut body = serde_json::Map::new();
        macro_rules! put {
            ($field:ident) => {
                if let Some(v) = &self.$field {
                    body.insert(stringify!($field).to_string(), json!(v));
                }
            };
        }
        put!(agent);
        put!(os_name);
        put!(os_platform);
        put!(os_family);
        put!(os_version);
        put!(cpu_arch);
        put!(cpu_cores);
        put!(cpu_mem);
        put!(cpu_mhz);
        put!(cpu_vendor);
        put!(cpu_name);
        put!(live);
        Value::Object(body)
    }
}

/// The single process-wide engine struct (spec §3/§9/§10.3).
pub struct Engine {
    hooks: Hooks,
    transport: Transport,
    seqno: u16,
    reset_required: bool,
    firmware_supports_crc: bool,
    request_timeout_s: u32,
    debug_suspend_count: u32,
    user_agent: Option<UserAgent>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine {
            hooks: Hooks::default(),
            transport: Transport::None,
            seqno: 0,
            reset_required: false,
            firmware_supports_crc: false,
            request_timeout_s: 0,
            debug_suspend_count: 0,
            user_agent: None,
        }
    }
}

static ENGINE: Lazy<Mutex<Engine>> = Lazy::new(|| Mutex::new(Engine::default()));

/// Activates the UART transport, mirroring `set_fn_serial`/
/// `NoteSetFnSerial`.
pub fn set_fn_serial(io: Box<dyn SerialIo>) {
    ENGINE.lock().transport = Transport::Uart(UartTransport::new(io));
}

/// Activates the I2C transport, mirroring `set_fn_i2c`/`NoteSetFnI2C`.
/// `address == 0` selects the protocol default; `max_segment == 0`
/// selects the conservative default (both per spec §3).
pub fn set_fn_i2c(io: Box<dyn I2cIo>, address: u16, max_segment: usize) {
    ENGINE.lock().transport = Transport::I2c(I2cTransport::new(io, address, max_segment));
}

/// Returns to the `none` interface state, mirroring `set_fn_disabled`.
pub fn set_fn_disabled() {
    ENGINE.lock().transport = Transport::None;
}

/// Installs the optional platform hooks (delay/get_ms overrides, debug
/// sink, bus/device mutex, transaction start/stop). Replaces the whole
/// [`Hooks`] value; callers that only want to override one hook should
/// read-modify-write via [`with_hooks`].
pub fn set_hooks(hooks: Hooks) {
    ENGINE.lock().hooks = hooks;
}

/// Read-modify-write access to the installed hooks.
pub fn with_hooks(f: impl FnOnce(&mut Hooks)) {
    f(&mut ENGINE.lock().hooks);
}

/// Sets the transaction-timeout override in seconds; `0` restores the
/// built-in default. Returns the previous effective value, mirroring
/// `NoteSetTransactionTimeout`.
pub fn set_request_timeout(seconds: u32) -> u32 {
    let mut e = ENGINE.lock();
    let prev = if e.request_timeout_s == 0 {
        CARD_INTER_TRANSACTION_TIMEOUT_SEC
    } else {
        e.request_timeout_s
    };
    e.request_timeout_s = seconds;
    prev
}

/// Sets the `agent` field of the user-agent piggyback body.
pub fn set_user_agent(agent: impl Into<String>) {
    ENGINE.lock().user_agent.get_or_insert_with(UserAgent::default).agent = Some(agent.into());
}

/// Sets the OS-identifying fields of the user-agent piggyback body.
pub fn set_user_agent_os(name: impl Into<String>, platform: impl Into<String>, family: impl Into<String>, version: impl Into<String>) {
    let mut e = ENGINE.lock();
    let ua = e.user_agent.get_or_insert_with(UserAgent::default);
    ua.os_name = Some(name.into());
    ua.os_platform = Some(platform.into());
    ua.os_family = Some(family.into());
    ua.os_version = Some(version.into());
}

/// Sets the CPU-identifying fields of the user-agent piggyback body.
pub fn set_user_agent_cpu(
    arch: impl Into<String>,
    cores: u32,
    mem: u32,
    mhz: u32,
    vendor: impl Into<String>,
    name: impl Into<String>,
) {
    let mut e = ENGINE.lock();
    let ua = e.user_agent.get_or_insert_with(UserAgent::default);
    ua.cpu_arch = Some(arch.into());
    ua.cpu_cores = Some(cores);
    ua.cpu_mem = Some(mem);
    ua.cpu_mhz = Some(mhz);
    ua.cpu_vendor = Some(vendor.into());
    ua.cpu_name = Some(name.into());
}

/// Increments the transaction-debug suppression counter, mirroring
/// `NoteSuspendTransactionDebug`.
pub fn suspend_transaction_debug() {
    ENGINE.lock().debug_suspend_count += 1;
}

/// Decrements the transaction-debug suppression counter, mirroring
/// `NoteResumeTransactionDebug`.
pub fn resume_transaction_debug() {
    let mut e = ENGINE.lock();
    e.debug_suspend_count = e.debug_suspend_count.saturating_sub(1);
}

/// `P.new_request`: a fresh `{"req":action}` document.
pub fn new_request(action: &str) -> Value {
    json!({ "req": action })
}

/// `P.new_command`: a fresh `{"cmd":action}` document.
pub fn new_command(action: &str) -> Value {
    json!({ "cmd": action })
}

fn resolved_timeout_ms(e: &Engine, req: &Value) -> u32 {
    let from_request_ms = req.get("milliseconds").and_then(Value::as_u64);
    let from_request_s = req.get("seconds").and_then(Value::as_u64).map(|s| s * 1000);
    if let Some(ms) = from_request_ms {
        return ms as u32;
    }
    if let Some(ms) = from_request_s {
        return ms as u32;
    }
    let seconds = if e.request_timeout_s != 0 {
        e.request_timeout_s
    } else {
        CARD_INTER_TRANSACTION_TIMEOUT_SEC
    };
    seconds * 1000
}

fn is_request_doc(doc: &Value) -> Option<bool> {
    let has_req = j_is_present(doc, "req");
    let has_cmd = j_is_present(doc, "cmd");
    match (has_req, has_cmd) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

fn synthesize_error(kind: NoteErrorKind, message: &str, id: Option<&Value>) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("err".to_string(), json!(format!("{message} {}", kind.tag())));
    obj.insert("src".to_string(), json!("note-c"));
    if let Some(id) = id {
        obj.insert("id".to_string(), id.clone());
    }
    Value::Object(obj)
}

fn should_piggyback(doc: &Value, e: &Engine) -> bool {
    cfg!(feature = "user_agent")
        && !cfg!(feature = "low_mem")
        && j_is_exact_string(doc, "req", "hub.set")
        && j_is_present(doc, "product")
        && !j_is_present(doc, "body")
        && e.user_agent.is_some()
}

/// The orchestrator's transaction state machine (R), spec §4.6.
///
/// Returns `Ok(None)` only for a successful `cmd` with nothing to report,
/// `Ok(Some(doc))` for a successful `req`'s response, a successful `cmd`'s
/// empty `{}` acknowledgement, or a synthesized error document for a
/// failed `req`. Returns `Err` only for the structural failures that
/// precede any transport activity (malformed request shape, no interface
/// selected).
pub fn transaction(mut doc: Value) -> Result<Option<Value>, NoteError> {
    let is_request = is_request_doc(&doc).ok_or(NoteError::MalformedRequest)?;
    let id = doc.get("id").cloned();

    let mut e = ENGINE.lock();

    if should_piggyback(&doc, &e) {
        if let Some(ua) = e.user_agent.clone() {
            if let Value::Object(map) = &mut doc {
                map.insert("body".to_string(), ua.to_value());
            }
        }
    }

    let serialized = serde_json::to_string(&doc).map_err(|_| NoteError::mem("failed to serialize request"))?;
    let timeout_ms = resolved_timeout_ms(&e, &doc);

    let span = info_span!("note_transaction", seq = e.seqno);
    let _enter = span.enter();

    if !e.hooks.transaction_start(timeout_ms) {
        return if is_request {
            Ok(Some(synthesize_error(NoteErrorKind::Io, "unable to start transaction", id.as_ref())))
        } else {
            Ok(None)
        };
    }

    if e.reset_required {
        let ok = e.transport.reset(&e.hooks);
        if !ok {
            e.hooks.transaction_stop();
            return if is_request {
                Ok(Some(synthesize_error(NoteErrorKind::Io, "i/o error during reset", id.as_ref())))
            } else {
                Ok(None)
            };
        }
        e.reset_required = false;
    }

    e.hooks.lock_note();
    let result = run_retry_loop(&mut e, &serialized, is_request, timeout_ms, id.as_ref());
    e.seqno = e.seqno.wrapping_add(1);
    e.hooks.unlock_note();
    e.hooks.transaction_stop();

    result
}

fn run_retry_loop(
    e: &mut Engine,
    serialized: &str,
    is_request: bool,
    timeout_ms: u32,
    id: Option<&Value>,
) -> Result<Option<Value>, NoteError> {
    let crc_applied = is_request && cfg!(not(feature = "low_mem"));
    let wire = if crc_applied {
        crc::crc_add(serialized, e.seqno).unwrap_or_else(|| serialized.to_string())
    } else {
        serialized.to_string()
    };

    let debug = e.debug_suspend_count == 0;
    if debug {
        info!(request = %wire, "note transaction request");
        e.hooks.debug(&wire);
    }

    let mut last_err = NoteError::io("transaction failed");

    for attempt in 0..CARD_REQUEST_RETRIES_ALLOWED {
        trace!(attempt, "note transaction attempt");

        let mut framed = wire.clone().into_bytes();
        framed.push(b'\n');

        let outcome = e.transport.json_transaction(&e.hooks, &framed, is_request, timeout_ms);

        match outcome {
            Err(err) if err.contains(NoteErrorKind::Io) => {
                e.reset_required = true;
                warn!(error = %err, "transport io error, retrying");
                last_err = err;
                e.hooks.delay_ms(RETRY_DELAY_MS);
                continue;
            }
            Err(err) => {
                error!(error = %err, "transport error, aborting");
                return if is_request {
                    Ok(Some(synthesize_error(err.kind().unwrap_or(NoteErrorKind::Io), &err.to_string(), id)))
                } else {
                    Ok(None)
                };
            }
            Ok(None) => {
                if !is_request {
                    return Ok(Some(json!({})));
                }
                e.reset_required = true;
                last_err = NoteError::io("no response received");
                e.hooks.delay_ms(RETRY_DELAY_MS);
                continue;
            }
            Ok(Some(mut response_text)) => {
                if crc_applied {
                    let check = crc::crc_strip_and_check(&mut response_text, e.seqno, &mut e.firmware_supports_crc);
                    if check == CrcCheck::Mismatch {
                        warn!("crc mismatch, retrying");
                        e.reset_required = true;
                        last_err = NoteError::io("crc mismatch");
                        e.hooks.delay_ms(RETRY_DELAY_MS);
                        continue;
                    }
                }

                let parsed: Value = match serde_json::from_str(&response_text) {
                    Ok(v) => v,
                    Err(_) => {
                        warn!("response did not parse as json, retrying");
                        e.reset_required = true;
                        last_err = NoteError::io("response did not parse as json");
                        e.hooks.delay_ms(RETRY_DELAY_MS);
                        continue;
                    }
                };

                if debug {
                    info!(response = %response_text, "note transaction response");
                    e.hooks.debug(&response_text);
                }

                if j_is_present(&parsed, "err") {
                    let errstr = j_get_string(&parsed, "err");
                    let not_supported = errstr.contains("{not-supported}");
                    if errstr.contains("{bad-bin}") {
                        error!(error = errstr, "bad-bin error, not retrying");
                        return Ok(Some(parsed));
                    }
                    if errstr.contains("{io}") && !not_supported {
                        warn!(error = errstr, "device reported io error, retrying");
                        e.reset_required = true;
                        last_err = NoteError::io(errstr);
                        e.hooks.delay_ms(RETRY_DELAY_MS);
                        continue;
                    }
                }

                return Ok(Some(parsed));
            }
        }
    }

    e.reset_required = true;
    if is_request {
        Ok(Some(synthesize_error(last_err.kind().unwrap_or(NoteErrorKind::Io), &last_err.to_string(), id)))
    } else {
        Ok(None)
    }
}

/// `J`: accepts a raw newline-terminated (possibly multi-item) JSON byte
/// sequence, dispatching each item directly without building a DOM for
/// the whole pipeline. Mirrors `NoteRequestResponseJSON`/
/// `NoteJSONTransaction` pipelining behavior (spec §4.7).
pub fn json_transaction_raw(input: &str) -> Result<Option<String>, NoteError> {
    if input.is_empty() {
        return Err(NoteError::bad("empty input"));
    }

    let mut e = ENGINE.lock();
    if matches!(e.transport, Transport::None) {
        return Err(NoteError::NoInterfaceJson);
    }

    let timeout_ms = {
        let seconds = if e.request_timeout_s != 0 { e.request_timeout_s } else { CARD_INTER_TRANSACTION_TIMEOUT_SEC };
        seconds * 1000
    };

    if !e.hooks.transaction_start(timeout_ms) {
        return Err(NoteError::io("unable to start transaction"));
    }
    e.hooks.lock_note();

    let mut rest = input;
    let mut response: Option<String> = None;

    loop {
        let (segment, remainder) = match rest.find('\n') {
            Some(idx) => (&rest[..=idx], &rest[idx + 1..]),
            None => (rest, ""),
        };
        if segment.is_empty() {
            break;
        }

        let segment_owned;
        let segment: &str = if segment.ends_with('\n') {
            segment
        } else {
            segment_owned = format!("{segment}\n");
            &segment_owned
        };

        let is_cmd = segment.contains("\"cmd\":");

        if is_cmd {
            let parsed: Result<Value, _> = serde_json::from_str(segment.trim_end());
            if parsed.is_err() {
                response = None;
                break;
            }
            if let Err(err) = e.transport.json_transaction(&e.hooks, segment.as_bytes(), false, timeout_ms) {
                warn!(error = %err, "command in pipeline failed");
            }
            response = None;
        } else {
            let id = serde_json::from_str::<Value>(segment.trim_end()).ok().and_then(|v| v.get("id").cloned());
            match e.transport.json_transaction(&e.hooks, segment.as_bytes(), true, timeout_ms) {
                Ok(Some(rsp)) => response = Some(rsp),
                Ok(None) => response = None,
                Err(err) => {
                    e.reset_required = true;
                    let doc = synthesize_error(err.kind().unwrap_or(NoteErrorKind::Io), &err.to_string(), id.as_ref());
                    response = Some(serde_json::to_string(&doc).unwrap_or_default());
                }
            }
            break;
        }

        if remainder.is_empty() {
            break;
        }
        rest = remainder;
    }

    e.hooks.unlock_note();
    e.hooks.transaction_stop();
    Ok(response)
}

/// `P.request`: runs the orchestrator, returns whether the response
/// carries no `err` field.
pub fn request(req: Value) -> Result<bool, NoteError> {
    let rsp = transaction(req)?;
    Ok(!response_has_error(&rsp))
}

/// `P.request_response`: runs the orchestrator and returns the response
/// document.
pub fn request_response(req: Value) -> Result<Option<Value>, NoteError> {
    transaction(req)
}

/// `P.transaction`: alias for [`transaction`] with default locking, kept
/// as a distinct name to mirror `NoteTransaction`'s call site naming.
pub fn run_transaction(req: Value) -> Result<Option<Value>, NoteError> {
    transaction(req)
}

/// Runs a request and deserializes its response into `T`, converting a
/// device-side `err` field into [`NoteError::Transport`]. Used by the
/// convenience-wrapper layer (`card`/`hub`/`note`/`web`/`dfu`/`ntn`) so
/// each call site is a single expression instead of the
/// transaction/check-err/deserialize dance repeated by hand.
pub fn call<T: serde::de::DeserializeOwned>(doc: Value) -> Result<T, NoteError> {
    let rsp = transaction(doc)?.ok_or_else(|| NoteError::Protocol("no response for request".into()))?;
    if let Some(err) = rsp.get("err").and_then(Value::as_str) {
        if !err.is_empty() {
            return Err(NoteError::Transport(err.to_string()));
        }
    }
    serde_json::from_value(rsp).map_err(NoteError::from)
}

fn response_has_error(rsp: &Option<Value>) -> bool {
    match rsp {
        Some(v) => j_is_present(v, "err") && !j_get_string(v, "err").is_empty(),
        None => false,
    }
}

fn io_retryable_error(rsp: &Option<Value>) -> bool {
    match rsp {
        None => true,
        Some(v) => {
            let errstr = j_get_string(v, "err");
            !errstr.is_empty() && j_contains_string(v, "err", "{io}") && !j_contains_string(v, "err", "{not-supported}")
        }
    }
}

/// `P.request_with_retry`: like [`request`], but retries the *whole*
/// transaction (sharing one wall-clock budget, wraparound-tolerant) while
/// the response is absent or carries a retryable `{io}` error.
pub fn request_with_retry(req: Value, timeout_s: u32) -> Result<bool, NoteError> {
    let hooks_get_ms = ENGINE.lock().hooks.clone();
    let start = hooks_get_ms.get_ms();
    let budget_ms = timeout_s.saturating_mul(1000);

    loop {
        let rsp = transaction(req.clone())?;
        if !io_retryable_error(&rsp) {
            return Ok(!response_has_error(&rsp));
        }
        if crate::hooks::elapsed_ms(start, hooks_get_ms.get_ms()) >= budget_ms {
            return Ok(!response_has_error(&rsp));
        }
        hooks_get_ms.delay_ms(RETRY_DELAY_MS);
    }
}

/// `P.request_response_with_retry`: combination of
/// [`request_with_retry`] and [`request_response`].
pub fn request_response_with_retry(req: Value, timeout_s: u32) -> Result<Option<Value>, NoteError> {
    let hooks_get_ms = ENGINE.lock().hooks.clone();
    let start = hooks_get_ms.get_ms();
    let budget_ms = timeout_s.saturating_mul(1000);

    loop {
        let rsp = transaction(req.clone())?;
        if !io_retryable_error(&rsp) {
            return Ok(rsp);
        }
        if crate::hooks::elapsed_ms(start, hooks_get_ms.get_ms()) >= budget_ms {
            return Ok(rsp);
        }
        hooks_get_ms.delay_ms(RETRY_DELAY_MS);
    }
}

/// `true` if the process-wide reset-required latch is set. Exposed for
/// hosts and tests that want to observe the engine's internal state.
pub fn reset_required() -> bool {
    ENGINE.lock().reset_required
}

/// Forces a transport reset outside of a transaction, mirroring what a
/// host calls right after `set_fn_i2c`/`set_fn_serial`.
pub fn reset() -> bool {
    let mut e = ENGINE.lock();
    let ok = e.transport.reset(&e.hooks);
    if ok {
        e.reset_required = false;
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::i2c::I2cIo;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};

    struct FixtureI2c {
        writes: Arc<StdMutex<Vec<Vec<u8>>>>,
        reads: Arc<StdMutex<VecDeque<Vec<u8>>>>,
    }

    impl I2cIo for FixtureI2c {
        fn reset(&mut self) {}
        fn transmit(&mut self, _address: u16, buffer: &[u8]) -> Option<String> {
            self.writes.lock().unwrap().push(buffer.to_vec());
            None
        }
        fn receive(&mut self, _address: u16, buffer: &mut [u8], _requested: u8) -> Option<String> {
            match self.reads.lock().unwrap().pop_front() {
                Some(frame) => {
                    buffer[..frame.len()].copy_from_slice(&frame);
                    None
                }
                None => Some("exhausted fixture".into()),
            }
        }
    }

    /// The engine is one process-wide singleton; serialize tests that
    /// touch it so they don't interleave on cargo test's default
    /// multi-threaded runner.
    static TEST_LOCK: StdMutex<()> = StdMutex::new(());

    fn reset_engine_for_test() -> std::sync::MutexGuard<'static, ()> {
        let guard = TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        *ENGINE.lock() = Engine::default();
        guard
    }

    fn install_fixture(reads: Vec<Vec<u8>>) -> (Arc<StdMutex<Vec<Vec<u8>>>>, std::sync::MutexGuard<'static, ()>) {
        let guard = reset_engine_for_test();
        let writes = Arc::new(StdMutex::new(Vec::new()));
        let reads = Arc::new(StdMutex::new(VecDeque::from(reads)));
        set_fn_i2c(Box::new(FixtureI2c { writes: writes.clone(), reads }), 0x17, 32);
        (writes, guard)
    }

    /// A priming-query frame reporting `available` bytes pending.
    fn priming_frame(available: usize) -> Vec<u8> {
        vec![available as u8, 0]
    }

    /// A sized-read frame carrying all of `json` plus its trailing newline
    /// in one shot (the dispatcher only accepts a response once
    /// `available==0` and the last byte received is `\n`).
    fn response_frame(json: &str) -> Vec<u8> {
        let mut f = vec![0u8, (json.len() + 1) as u8];
        f.extend_from_slice(json.as_bytes());
        f.push(b'\n');
        f
    }

    #[test]
    fn happy_path_request_returns_response_and_advances_seqno() {
        let rsp = r#"{"version":"notecard-1.0.0"}"#;
        let (_writes, _guard) = install_fixture(vec![priming_frame(rsp.len() + 1), response_frame(rsp)]);

        let before = ENGINE.lock().seqno;
        let out = transaction(new_request("card.version")).unwrap().unwrap();
        assert_eq!(out.get("version").and_then(Value::as_str), Some("notecard-1.0.0"));
        assert!(!j_is_present(&out, "err"));
        assert_eq!(ENGINE.lock().seqno, before.wrapping_add(1));
    }

    #[test]
    fn command_success_returns_empty_object() {
        let (_writes, _guard) = install_fixture(vec![]);
        let out = transaction(new_command("card.sleep")).unwrap();
        assert_eq!(out, Some(json!({})));
    }

    #[test]
    fn malformed_request_is_rejected() {
        let _guard = reset_engine_for_test();
        assert!(matches!(transaction(json!({})), Err(NoteError::MalformedRequest)));
        assert!(matches!(
            transaction(json!({"req": "a", "cmd": "b"})),
            Err(NoteError::MalformedRequest)
        ));
    }

    #[test]
    fn no_interface_selected_synthesizes_io_error_for_request() {
        let _guard = reset_engine_for_test();
        set_fn_disabled();
        let out = transaction(new_request("card.version")).unwrap().unwrap();
        assert!(j_get_string(&out, "err").contains("{io}"));
    }

    #[test]
    fn no_interface_selected_returns_none_for_command() {
        let _guard = reset_engine_for_test();
        set_fn_disabled();
        let out = transaction(new_command("card.sleep")).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn bad_bin_error_does_not_retry() {
        let rsp = r#"{"err":"corrupt {bad-bin}"}"#;
        let (_writes, _guard) = install_fixture(vec![priming_frame(rsp.len() + 1), response_frame(rsp)]);
        let out = transaction(new_request("card.version")).unwrap().unwrap();
        assert!(j_get_string(&out, "err").contains("{bad-bin}"));
    }

    #[test]
    fn user_agent_not_attached_without_product() {
        let _guard = reset_engine_for_test();
        set_user_agent("note-rs");
        let doc = new_request("hub.set");
        let e = ENGINE.lock();
        assert!(!should_piggyback(&doc, &e));
    }

    #[test]
    fn debug_sink_receives_request_and_response_text() {
        let rsp = r#"{"version":"notecard-1.0.0"}"#;
        let (_writes, _guard) = install_fixture(vec![priming_frame(rsp.len() + 1), response_frame(rsp)]);

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let s = seen.clone();
        with_hooks(move |h| h.debug = Some(Arc::new(move |line: &str| s.lock().unwrap().push(line.to_string()))));

        transaction(new_request("card.version")).unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.iter().any(|l| l.contains("card.version")));
        assert!(seen.iter().any(|l| l.contains("notecard-1.0.0")));
    }

    #[test]
    fn debug_sink_is_silent_while_transaction_debug_is_suspended() {
        let rsp = r#"{"version":"notecard-1.0.0"}"#;
        let (_writes, _guard) = install_fixture(vec![priming_frame(rsp.len() + 1), response_frame(rsp)]);

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let s = seen.clone();
        with_hooks(move |h| h.debug = Some(Arc::new(move |line: &str| s.lock().unwrap().push(line.to_string()))));

        suspend_transaction_debug();
        transaction(new_request("card.version")).unwrap();
        resume_transaction_debug();

        assert!(seen.lock().unwrap().is_empty());
    }
}
