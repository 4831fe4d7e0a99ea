//! `hub.*` requests: <https://dev.blues.io/reference/notecard-api/hub-requests/>

use serde::{Deserialize, Serialize};

use crate::engine;
use crate::error::NoteError;

/// The `hub.*` convenience wrapper.
#[derive(Debug, Default, Clone, Copy)]
pub struct Hub;

fn to_doc(req: impl Serialize) -> Result<serde_json::Value, NoteError> {
    serde_json::to_value(req).map_err(NoteError::from)
}

impl Hub {
    /// Adds a "device health" log message to send to Notehub on the next
    /// sync.
    pub fn log(&self, text: &str, alert: bool, sync: bool) -> Result<res::Empty, NoteError> {
        let doc = to_doc(req::HubLog { req: "hub.log", text: text.to_string(), alert, sync })?;
        engine::call(doc)
    }

    /// [hub.get](https://dev.blues.io/api-reference/notecard-api/hub-requests/#hub-get):
    /// retrieves the current Notehub configuration for the Notecard.
    pub fn get(&self) -> Result<res::Hub, NoteError> {
        engine::call(engine::new_request("hub.get"))
    }

    /// [hub.set](https://dev.blues.io/reference/notecard-api/hub-requests/#hub-set):
    /// the primary method for controlling the Notecard's Notehub
    /// connection and sync behavior.
    #[allow(clippy::too_many_arguments)]
    pub fn set(
        &self,
        product: Option<&str>,
        host: Option<&str>,
        mode: Option<req::HubMode>,
        sn: Option<&str>,
        outbound: Option<u32>,
        duration: Option<u32>,
        voutbound: Option<&str>,
        inbound: Option<u32>,
        vinbound: Option<&str>,
        align: Option<bool>,
        sync: Option<bool>,
    ) -> Result<res::Empty, NoteError> {
        let doc = to_doc(req::HubSet {
            req: "hub.set",
            product: product.map(String::from),
            host: host.map(String::from),
            mode,
            sn: sn.map(String::from),
            outbound,
            duration,
            voutbound: voutbound.map(String::from),
            inbound,
            vinbound: vinbound.map(String::from),
            align,
            sync,
        })?;
        engine::call(doc)
    }

    /// Manually initiates a sync with Notehub. `allow` can be set to
    /// `true` to remove the Notecard from any penalty boxes.
    pub fn sync(&self, allow: bool) -> Result<res::Empty, NoteError> {
        let doc = to_doc(req::HubSync { req: "hub.sync", allow: if allow { Some(true) } else { None } })?;
        engine::call(doc)
    }

    /// Checks on the status of a recently triggered or previous sync.
    pub fn sync_status(&self) -> Result<res::SyncStatus, NoteError> {
        engine::call(engine::new_request("hub.sync.status"))
    }
}

pub mod req {
    use super::*;

    #[derive(Deserialize, Serialize, Debug, Default)]
    pub struct HubSync {
        pub req: &'static str,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub allow: Option<bool>,
    }

    #[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum HubMode {
        Periodic,
        Continuous,
        Minimum,
        Off,
        DFU,
    }

    #[derive(Deserialize, Serialize, Debug, Default)]
    pub struct HubSet {
        pub req: &'static str,

        pub product: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub host: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub mode: Option<HubMode>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub sn: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub outbound: Option<u32>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub duration: Option<u32>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub voutbound: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub inbound: Option<u32>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub vinbound: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub align: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub sync: Option<bool>,
    }

    #[derive(Deserialize, Serialize, Debug, Default)]
    pub struct HubLog {
        pub req: &'static str,
        pub text: String,
        pub alert: bool,
        pub sync: bool,
    }
}

pub mod res {
    use super::*;

    #[derive(Deserialize, Debug)]
    pub struct Empty {}

    #[derive(Deserialize, Debug)]
    pub struct Hub {
        pub device: Option<String>,
        pub product: Option<String>,
        pub mode: Option<self::req::HubMode>,
        pub outbound: Option<u32>,
        pub voutbound: Option<f32>,
        pub inbound: Option<u32>,
        pub vinbound: Option<f32>,
        pub host: Option<String>,
        pub sn: Option<String>,
        pub sync: Option<bool>,
    }

    #[derive(Deserialize, Debug)]
    pub struct SyncStatus {
        pub status: Option<String>,
        pub time: Option<u32>,
        pub sync: Option<bool>,
        pub completed: Option<u32>,
        pub requested: Option<u32>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        serde_json::from_str::<res::Empty>(r#"{}"#).unwrap();
    }

    #[test]
    fn hub_get() {
        let r = r##"{
    "device": "dev:000000000000000",
    "product": "testprod",
    "mode": "periodic",
    "outbound": 60,
    "inbound": 240,
    "host": "a.notefile.net",
    "sn": "test-serial"
}"##;
        serde_json::from_str::<res::Hub>(r).unwrap();
    }

    #[test]
    fn hub_set_some() {
        let hb = req::HubSet {
            req: "hub.set",
            product: Some("testprod".to_string()),
            host: Some("testhost".to_string()),
            mode: Some(req::HubMode::Periodic),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_string(&hb).unwrap(),
            r#"{"req":"hub.set","product":"testprod","host":"testhost","mode":"periodic"}"#
        );
    }
}
