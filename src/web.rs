//! `web.*` requests: <https://dev.blues.io/api-reference/notecard-api/web-requests>

use serde::Serialize;

use crate::engine;
use crate::error::NoteError;

/// The `web.*` convenience wrapper.
#[derive(Debug, Default, Clone, Copy)]
pub struct Web;

fn to_doc(req: impl Serialize) -> Result<serde_json::Value, NoteError> {
    serde_json::to_value(req).map_err(NoteError::from)
}

impl Web {
    /// Performs a simple HTTP or HTTPS POST request against an external
    /// endpoint, and returns the response to the Notecard.
    pub fn post<T: Serialize>(
        &self,
        file: Option<&str>,
        note: Option<&str>,
        body: Option<T>,
        payload: Option<&str>,
        sync: bool,
    ) -> Result<res::Add, NoteError> {
        let doc = to_doc(req::Add::<T> {
            req: "web.post",
            file: file.map(String::from),
            note: note.map(String::from),
            body,
            payload: payload.map(String::from),
            sync: Some(sync),
            ..Default::default()
        })?;
        engine::call(doc)
    }
}

mod req {
    use super::*;

    #[derive(serde::Deserialize, Serialize, Default)]
    pub struct Add<T: Serialize> {
        pub req: &'static str,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub file: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub note: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub body: Option<T>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub payload: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub sync: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub key: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub verify: Option<bool>,
    }
}

pub mod res {
    use super::*;

    #[derive(serde::Deserialize, Debug)]
    pub struct Add {
        pub total: Option<u32>,
        pub template: Option<bool>,
    }
}
