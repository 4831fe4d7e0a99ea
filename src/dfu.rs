//! `dfu.*` requests: <https://dev.blues.io/api-reference/notecard-api/dfu-requests/>

use serde::{Deserialize, Serialize};

use crate::engine;
use crate::error::NoteError;

/// The `dfu.*` convenience wrapper.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dfu;

fn to_doc(req: impl Serialize) -> Result<serde_json::Value, NoteError> {
    serde_json::to_value(req).map_err(NoteError::from)
}

impl Dfu {
    /// Retrieves downloaded firmware data from the Notecard. Functional
    /// only when the Notecard has been set to dfu mode with a `hub.set`,
    /// `mode:dfu` request.
    pub fn get(&self, length: usize, offset: Option<usize>) -> Result<res::Get, NoteError> {
        let doc = to_doc(req::Get { req: "dfu.get", length, offset })?;
        engine::call(doc)
    }

    /// Gets and sets the background download status of MCU host or
    /// Notecard firmware updates.
    #[allow(clippy::too_many_arguments)]
    pub fn status(
        &self,
        name: Option<req::StatusName>,
        stop: Option<bool>,
        status: Option<&str>,
        version: Option<&str>,
        vvalue: Option<&str>,
        on: Option<bool>,
        err: Option<&str>,
    ) -> Result<res::Status, NoteError> {
        let doc = to_doc(req::Status::new(name, stop, status, version, vvalue, on, err))?;
        engine::call(doc)
    }
}

pub mod req {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, Default)]
    pub struct Get {
        pub req: &'static str,

        pub length: usize,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub offset: Option<usize>,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
    #[serde(rename_all = "lowercase")]
    pub enum StatusName {
        User,
        Card,
    }

    #[derive(Serialize, Deserialize, Debug)]
    pub struct Version<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub org: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub product: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub firmware: Option<&'a str>,
        pub version: &'a str,
        pub ver_major: u32,
        pub ver_minor: u32,
        pub ver_patch: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub ver_build: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub built: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub builder: Option<&'a str>,
    }

    #[derive(Serialize, Deserialize, Debug, Default)]
    pub struct Status<'a> {
        pub req: &'static str,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<StatusName>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub stop: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub status: Option<&'a str>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub version: Option<&'a str>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub vvalue: Option<&'a str>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub on: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub off: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub err: Option<&'a str>,
    }

    impl Status<'_> {
        pub fn new<'a>(
            name: Option<StatusName>,
            stop: Option<bool>,
            status: Option<&'a str>,
            version: Option<&'a str>,
            vvalue: Option<&'a str>,
            on: Option<bool>,
            err: Option<&'a str>,
        ) -> Status<'a> {
            // `on`/`off` are mutually exclusive on the wire.
            Status {
                req: "dfu.status",
                name,
                stop,
                status,
                version,
                vvalue,
                on: on.and_then(|v| v.then_some(true)),
                off: on.and_then(|v| (!v).then_some(true)),
                err,
            }
        }
    }
}

pub mod res {
    use super::*;

    #[derive(Deserialize, Debug)]
    pub struct Get {
        pub payload: String,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum StatusMode {
        Idle,
        Error,
        Downloading,
        Ready,
    }

    #[derive(Deserialize, Debug)]
    pub struct StatusBody {
        pub crc32: Option<u32>,
        pub created: Option<u32>,
        pub length: Option<usize>,
        pub md5: Option<String>,
        pub modified: Option<u32>,
        pub name: Option<String>,
        pub notes: Option<String>,
        pub source: Option<String>,
        #[serde(rename = "type")]
        pub bin_type: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Status {
        pub mode: StatusMode,
        pub status: Option<String>,
        pub on: Option<bool>,
        pub off: Option<bool>,
        pub pending: Option<bool>,
        pub body: Option<StatusBody>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get() {
        let res: res::Get = serde_json::from_str(r#"{"payload":"THISISALOTOFBINARYDATA="}"#).unwrap();
        assert_eq!(res.payload, r#"THISISALOTOFBINARYDATA="#);
    }

    #[test]
    fn test_status_name() {
        let res = serde_json::to_string(&req::StatusName::Card).unwrap();
        assert_eq!(res, r#""card""#);
        let res = serde_json::to_string(&req::StatusName::User).unwrap();
        assert_eq!(res, r#""user""#);
    }

    #[test]
    fn test_status_req() {
        let req = req::Status::new(None, None, None, None, None, None, None);
        let res = serde_json::to_string(&req).unwrap();
        assert_eq!(res, r#"{"req":"dfu.status"}"#);

        let ver = req::Version {
            org: Some("Organization"),
            product: Some("Product"),
            description: Some("Firmware Description"),
            firmware: Some("Firmware Name"),
            version: "Firmware Version 1.0.0",
            ver_major: 1,
            ver_minor: 0,
            ver_patch: 0,
            ver_build: Some(12345),
            built: Some("Some Sunny Day In December"),
            builder: Some("The Compnay"),
        };
        let ver_str = serde_json::to_string(&ver).unwrap();
        let req = req::Status::new(
            Some(req::StatusName::User),
            Some(true),
            Some("test status"),
            Some(ver_str.as_str()),
            Some("usb:1;high:1;normal:1;low:0;dead:0"),
            Some(true),
            Some("test error"),
        );
        let res = serde_json::to_string(&req).unwrap();
        assert_eq!(res, r#"{"req":"dfu.status","name":"user","stop":true,"status":"test status","version":"{\"org\":\"Organization\",\"product\":\"Product\",\"description\":\"Firmware Description\",\"firmware\":\"Firmware Name\",\"version\":\"Firmware Version 1.0.0\",\"ver_major\":1,\"ver_minor\":0,\"ver_patch\":0,\"ver_build\":12345,\"built\":\"Some Sunny Day In December\",\"builder\":\"The Compnay\"}","vvalue":"usb:1;high:1;normal:1;low:0;dead:0","on":true,"err":"test error"}"#);

        let req = req::Status::new(None, None, None, None, None, Some(false), None);
        let res = serde_json::to_string(&req).unwrap();
        assert_eq!(res, r#"{"req":"dfu.status","off":true}"#);
    }

    #[test]
    fn test_status_mode() {
        let res: res::StatusMode = serde_json::from_str(r#""downloading""#).unwrap();
        assert_eq!(res, res::StatusMode::Downloading);
        let res: res::StatusMode = serde_json::from_str(r#""error""#).unwrap();
        assert_eq!(res, res::StatusMode::Error);
        let res: res::StatusMode = serde_json::from_str(r#""idle""#).unwrap();
        assert_eq!(res, res::StatusMode::Idle);
        let res: res::StatusMode = serde_json::from_str(r#""ready""#).unwrap();
        assert_eq!(res, res::StatusMode::Ready);
    }

    #[test]
    fn test_status() {
        let res: res::Status = serde_json::from_str(
            r#"{
            "mode": "ready",
            "status": "successfully downloaded",
            "on": true,
            "body": {
                "crc32": 2525287425,
                "created": 1599163431,
                "info": {},
                "length": 42892,
                "md5": "5a3f73a7f1b4bc8917b12b36c2532969",
                "modified": 1599163431,
                "name": "stm32-new-firmware$20200903200351.bin",
                "notes": "Latest prod firmware",
                "source": "stm32-new-firmware.bin",
                "type": "firmware"
            }
        }"#,
        )
        .unwrap();

        assert_eq!(res.mode, res::StatusMode::Ready);
        assert_eq!(res.status.unwrap(), "successfully downloaded");
        assert!(res.on.unwrap());
        let body = res.body.unwrap();
        assert_eq!(body.crc32.unwrap(), 2525287425);
        assert_eq!(body.created.unwrap(), 1599163431);
        assert_eq!(body.length.unwrap(), 42892);
        assert_eq!(body.md5.unwrap(), "5a3f73a7f1b4bc8917b12b36c2532969");
        assert_eq!(body.modified.unwrap(), 1599163431);
        assert_eq!(body.name.unwrap(), "stm32-new-firmware$20200903200351.bin");
        assert_eq!(body.notes.unwrap(), "Latest prod firmware");
        assert_eq!(body.source.unwrap(), "stm32-new-firmware.bin");
        assert_eq!(body.bin_type.unwrap(), "firmware");
    }
}
