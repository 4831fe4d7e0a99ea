//! `note.*` requests: <https://dev.blues.io/reference/notecard-api/note-requests/>

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::engine;
use crate::error::NoteError;

/// The `note.*` convenience wrapper.
#[derive(Debug, Default, Clone, Copy)]
pub struct Note;

fn to_doc(req: impl Serialize) -> Result<serde_json::Value, NoteError> {
    serde_json::to_value(req).map_err(NoteError::from)
}

impl Note {
    /// Adds a note to a Notefile, creating the Notefile if it doesn't yet
    /// exist. When sending this request to the Notecard, if a Notefile
    /// name is specified, the file must either be a DB Notefile or
    /// outbound queue file (.qo/.qos). When sending this request to
    /// Notehub, the file must either be a DB Notefile or an inbound queue
    /// file (.qi/.qis).
    ///
    /// The size of the payload seems to be 250 bytes maximum.
    pub fn add<T: Serialize>(
        &self,
        file: Option<&str>,
        note: Option<&str>,
        body: Option<T>,
        payload: Option<&str>,
        sync: bool,
    ) -> Result<res::Add, NoteError> {
        let doc = to_doc(req::Add::<T> {
            req: "note.add",
            file: file.map(String::from),
            note: note.map(String::from),
            body,
            payload: payload.map(String::from),
            sync: Some(sync),
            ..Default::default()
        })?;
        engine::call(doc)
    }

    /// Updates a Note in a DB Notefile by its ID, replacing the existing
    /// body and/or payload.
    pub fn update<T: Serialize>(
        &self,
        file: &str,
        note: &str,
        body: Option<T>,
        payload: Option<&str>,
        verify: bool,
    ) -> Result<res::Empty, NoteError> {
        let doc = to_doc(req::Update::<T> {
            req: "note.update",
            file: file.to_string(),
            note: note.to_string(),
            body,
            payload: payload.map(String::from),
            verify,
        })?;
        engine::call(doc)
    }

    /// Retrieves a Note from a Notefile.
    ///
    /// * When sending this request to the Notecard, the file must either
    ///   be a DB Notefile (.db or .dbx) or inbound queue file (.qi/.qis).
    /// * When sending this request to Notehub, the file must be a DB
    ///   Notefile (.db).
    ///
    /// .qo/.qos Notes must be read from the Notehub event table using the
    /// Notehub Event API.
    pub fn get<T: DeserializeOwned>(&self, file: &str, note: &str, delete: bool, deleted: bool) -> Result<res::Get<T>, NoteError> {
        let doc = to_doc(req::Get { req: "note.get", file: file.to_string(), note: note.to_string(), delete, deleted })?;
        engine::call(doc)
    }

    /// Using `note.template` with any .qo/.qos Notefile, a caller
    /// provides the Notecard with a schema of sorts to apply to future
    /// Notes added to the Notefile. This template acts as a hint that
    /// allows the Notecard to internally store data as fixed-length
    /// binary records rather than as flexible JSON objects which require
    /// much more memory. Using templated Notes in place of regular Notes
    /// increases the storage and sync capability of the Notecard by an
    /// order of magnitude.
    ///
    /// See
    /// <https://dev.blues.io/notecard/notecard-walkthrough/low-bandwidth-design/#understanding-template-data-types>
    /// for the format and values of the template.
    pub fn template<T: Serialize>(&self, file: Option<&str>, body: Option<T>, length: Option<u32>) -> Result<res::Template, NoteError> {
        let doc = to_doc(req::Template::<T> { req: "note.template", file: file.map(String::from), body, length })?;
        engine::call(doc)
    }
}

mod req {
    use super::*;

    #[derive(Deserialize, Serialize, Default)]
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

    #[derive(Deserialize, Serialize, Default)]
    pub struct Update<T: Serialize> {
        pub req: &'static str,

        pub file: String,
        pub note: String,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub body: Option<T>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub payload: Option<String>,

        pub verify: bool,
    }

    #[derive(Deserialize, Serialize, Default)]
    pub struct Get {
        pub req: &'static str,

        pub file: String,
        pub note: String,

        pub delete: bool,
        pub deleted: bool,
    }

    #[derive(Deserialize, Serialize, Default)]
    pub struct Template<T: Serialize> {
        pub req: &'static str,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub file: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub body: Option<T>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub length: Option<u32>,
    }
}

pub mod res {
    use super::*;

    #[derive(Deserialize, Debug)]
    pub struct Empty {}

    #[derive(Deserialize, Debug)]
    pub struct Get<T> {
        pub body: Option<T>,
        pub payload: Option<String>,
        pub time: u32,
    }

    #[derive(Deserialize, Debug)]
    pub struct Add {
        pub total: Option<u32>,
        pub template: Option<bool>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Template {
        pub bytes: u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_with_template() {
        let r = r##"{"template":true}"##;
        serde_json::from_str::<res::Add>(r).unwrap();
    }

    #[test]
    fn add_request_shape() {
        let add = req::Add::<()> {
            req: "note.add",
            file: Some("data.qo".to_string()),
            note: Some("?".to_string()),
            body: None,
            payload: Some("aGVsbG8=".to_string()),
            sync: Some(false),
            ..Default::default()
        };

        let v = serde_json::to_value(&add).unwrap();
        assert_eq!(v["req"], "note.add");
        assert_eq!(v["file"], "data.qo");
        assert_eq!(v["payload"], "aGVsbG8=");
        assert!(v.get("body").is_none());
    }

    #[test]
    fn get_response_with_typed_body() {
        #[derive(Deserialize, Serialize, Debug, PartialEq)]
        struct Payload {
            reading: f32,
        }

        let r = r##"{"body":{"reading":12.5},"time":1700000000}"##;
        let parsed: res::Get<Payload> = serde_json::from_str(r).unwrap();
        assert_eq!(parsed.body, Some(Payload { reading: 12.5 }));
        assert_eq!(parsed.time, 1700000000);
    }
}
