//! `ntn.*` requests: <https://dev.blues.io/api-reference/notecard-api/ntn-requests/>

use serde::{Deserialize, Serialize};

use crate::engine;
use crate::error::NoteError;

/// The `ntn.*` convenience wrapper (Notecard Cellular+NTN firmware).
#[derive(Debug, Default, Clone, Copy)]
pub struct Ntn;

#[derive(Debug, Clone, Copy)]
pub enum NtnSetGps {
    /// Use the Notecard's GPS on the Starnote as well.
    Notecard,

    /// Use Starnote's own GPS (default).
    Starnote,
}

fn to_doc(req: impl Serialize) -> Result<serde_json::Value, NoteError> {
    serde_json::to_value(req).map_err(NoteError::from)
}

impl Ntn {
    /// Once a Notecard is connected to a Starnote device, the presence of
    /// a physical Starnote is stored in a permanent configuration that is
    /// not affected by a `card.restore` request. This request clears
    /// that configuration and allows testing NTN mode over cellular or
    /// Wi-Fi again.
    pub fn reset(&self) -> Result<res::Empty, NoteError> {
        engine::call(engine::new_request("ntn.reset"))
    }

    /// Gets and sets the background download status of MCU host or
    /// Notecard firmware updates.
    pub fn status(&self) -> Result<res::Status, NoteError> {
        engine::call(engine::new_request("ntn.status"))
    }

    /// Determines whether a Notecard should override a paired Starnote's
    /// GPS/GNSS location with its own. The paired Starnote uses its own
    /// GPS/GNSS location by default.
    pub fn gps(&self, gps: Option<NtnSetGps>) -> Result<res::Gps, NoteError> {
        let doc = to_doc(req::Gps {
            req: "ntn.gps",
            on: gps.map(|g| matches!(g, NtnSetGps::Notecard)),
            off: gps.map(|g| matches!(g, NtnSetGps::Starnote)),
        })?;
        engine::call(doc)
    }
}

pub mod req {
    use super::*;

    #[derive(Deserialize, Serialize, Debug, Default)]
    pub struct Gps {
        pub req: &'static str,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub on: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub off: Option<bool>,
    }
}

pub mod res {
    use super::*;

    #[derive(Deserialize, Debug)]
    pub struct Empty {}

    #[derive(Deserialize, Serialize, Debug, Default)]
    pub struct Gps {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub on: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub off: Option<bool>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Status {
        pub err: Option<String>,
        pub status: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gps_request_sets_on_for_notecard_variant() {
        let doc = req::Gps { req: "ntn.gps", on: Some(true), off: None };
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["on"], true);
        assert!(v.get("off").is_none());
    }

    #[test]
    fn status_response_parses_err_field() {
        let r = r#"{"err":"no Starnote paired","status":"unpaired"}"#;
        let s: res::Status = serde_json::from_str(r).unwrap();
        assert_eq!(s.err.as_deref(), Some("no Starnote paired"));
    }
}
