//! Structured error type for the engine.
//!
//! `note-c` threads errors through `static const char *` return values with
//! embedded `{tag}` tokens (see `n_request.c`'s `_errDoc` and the error
//! taxonomy in the specification). This module keeps the tags but gives them
//! a real shape: [`NoteError`] is the thing Rust code matches on, and
//! [`NoteErrorKind::tag`] renders a kind back to the wire token when the
//! orchestrator has to synthesize a response document.

use thiserror::Error;

/// One row of the error taxonomy. Each kind corresponds to exactly one
/// `{tag}` token that may appear in a device- or engine-produced `err`
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteErrorKind {
    Io,
    BadBin,
    NotSupported,
    Mem,
    Bad,
    Timeout,
}

impl NoteErrorKind {
    /// The literal `{tag}` token this kind renders as on the wire.
    pub const fn tag(self) -> &'static str {
        match self {
            NoteErrorKind::Io => "{io}",
            NoteErrorKind::BadBin => "{bad-bin}",
            NoteErrorKind::NotSupported => "{not-supported}",
            NoteErrorKind::Mem => "{mem}",
            NoteErrorKind::Bad => "{bad}",
            NoteErrorKind::Timeout => "{timeout}",
        }
    }
}

/// Errors produced by the engine.
///
/// `Tagged` carries both a human message and the taxonomy kind so that
/// `NoteError::kind()` and `response_error_contains`-style checks have
/// something to match on without re-parsing the message string.
#[derive(Error, Debug)]
pub enum NoteError {
    #[error("{message} {}", .kind.tag())]
    Tagged {
        kind: NoteErrorKind,
        message: String,
    },

    #[error("a valid interface must be selected")]
    NoInterface,

    #[error("i2c or serial interface must be selected")]
    NoInterfaceJson,

    #[error("request must contain exactly one of req/cmd")]
    MalformedRequest,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl NoteError {
    pub fn io(message: impl Into<String>) -> Self {
        NoteError::Tagged {
            kind: NoteErrorKind::Io,
            message: message.into(),
        }
    }

    pub fn bad_bin(message: impl Into<String>) -> Self {
        NoteError::Tagged {
            kind: NoteErrorKind::BadBin,
            message: message.into(),
        }
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        NoteError::Tagged {
            kind: NoteErrorKind::NotSupported,
            message: message.into(),
        }
    }

    pub fn mem(message: impl Into<String>) -> Self {
        NoteError::Tagged {
            kind: NoteErrorKind::Mem,
            message: message.into(),
        }
    }

    pub fn bad(message: impl Into<String>) -> Self {
        NoteError::Tagged {
            kind: NoteErrorKind::Bad,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        NoteError::Tagged {
            kind: NoteErrorKind::Timeout,
            message: message.into(),
        }
    }

    /// The taxonomy kind of this error, if it carries one.
    pub fn kind(&self) -> Option<NoteErrorKind> {
        match self {
            NoteError::Tagged { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// `true` if this error's rendered form contains `tag`'s token.
    ///
    /// Mirrors `NoteErrorContains`/`NoteResponseErrorContains`: callers
    /// often need to ask about a tag that did not originate in this
    /// process (it arrived verbatim from the device in an `err` string),
    /// so this is a substring check rather than a `kind()` comparison.
    pub fn contains(&self, kind: NoteErrorKind) -> bool {
        self.to_string().contains(kind.tag())
    }

    /// Strips all `{tag}` tokens (and the space before them) from a raw
    /// error string, leaving only the human-readable message.
    ///
    /// Grounded on `NoteErrorClean` in `n_request.c`.
    pub fn clean_message(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '{' {
                if let Some(end) = raw[i..].find('}') {
                    let skip_to = i + end + 1;
                    while let Some(&(j, _)) = chars.peek() {
                        if j < skip_to {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    while out.ends_with(' ') {
                        out.pop();
                    }
                    continue;
                }
            }
            out.push(c);
        }
        out.trim().to_string()
    }
}

/// Checks whether a raw error string (as returned verbatim by a device, or
/// synthesized by this engine) contains the given tag. Free-function form
/// of [`NoteError::contains`] for checking strings that never became a
/// `NoteError` (e.g. a response document's `err` field).
pub fn error_contains(errstr: &str, tag: &str) -> bool {
    errstr.contains(tag)
}
