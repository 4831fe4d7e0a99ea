//! `card.*` requests: <https://dev.blues.io/reference/notecard-api/card-requests/>

use serde::{Deserialize, Serialize};

use crate::engine;
use crate::error::NoteError;

/// <https://dev.blues.io/api-reference/notecard-api/card-requests/latest/#card-transport>
pub enum Transport {
    Reset,
    WifiCell,
    Wifi,
    Cell,
    NTN,
    WifiNTN,
    CellNTN,
    WifiCellNTN,
}

impl Transport {
    pub fn str(&self) -> &'static str {
        use Transport::*;

        match self {
            Reset => "-",
            WifiCell => "wifi-cell",
            Wifi => "wifi",
            Cell => "cell",
            NTN => "ntn",
            WifiNTN => "wifi-ntn",
            CellNTN => "cell-ntn",
            WifiCellNTN => "wifi-cell-ntn",
        }
    }
}

/// The `card.*` convenience wrapper. Stateless: every method is a single
/// transaction against the process-wide engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct Card;

fn to_doc(req: impl Serialize) -> Result<serde_json::Value, NoteError> {
    serde_json::to_value(req).map_err(NoteError::from)
}

impl Card {
    /// Retrieves current date and time information. Upon power-up, the
    /// Notecard must complete a sync to Notehub in order to obtain time and
    /// location data. Before the time is obtained, this request will
    /// return `{"zone":"UTC,Unknown"}`.
    pub fn time(&self) -> Result<res::Time, NoteError> {
        engine::call(engine::new_request("card.time"))
    }

    /// Returns general information about the Notecard's operating status.
    pub fn status(&self) -> Result<res::Status, NoteError> {
        engine::call(engine::new_request("card.status"))
    }

    /// Performs a firmware restart of the Notecard.
    pub fn restart(&self) -> Result<res::Empty, NoteError> {
        engine::call(engine::new_request("card.restart"))
    }

    /// Retrieves the current location of the Notecard.
    pub fn location(&self) -> Result<res::Location, NoteError> {
        engine::call(engine::new_request("card.location"))
    }

    /// Sets location-related configuration settings. Retrieves the current
    /// location mode when passed with no argument.
    #[allow(clippy::too_many_arguments)]
    pub fn location_mode(
        &self,
        mode: Option<&str>,
        seconds: Option<u32>,
        vseconds: Option<&str>,
        delete: Option<bool>,
        max: Option<u32>,
        lat: Option<f32>,
        lon: Option<f32>,
        minutes: Option<u32>,
    ) -> Result<res::LocationMode, NoteError> {
        let doc = to_doc(req::LocationMode {
            req: "card.location.mode",
            mode: mode.map(String::from),
            seconds,
            vseconds: vseconds.map(String::from),
            delete,
            max,
            lat,
            lon,
            minutes,
        })?;
        engine::call(doc)
    }

    /// Store location data in a Notefile at the `periodic` interval, or
    /// using specified `heartbeat`. Only available when
    /// `card.location.mode` has been set to `periodic`.
    pub fn location_track(
        &self,
        start: bool,
        heartbeat: bool,
        sync: bool,
        hours: Option<i32>,
        file: Option<&str>,
    ) -> Result<res::LocationTrack, NoteError> {
        let doc = to_doc(req::LocationTrack {
            req: "card.location.track",
            start: start.then_some(true),
            stop: (!start).then_some(true),
            heartbeat: heartbeat.then_some(true),
            sync: sync.then_some(true),
            hours,
            file: file.map(String::from),
        })?;
        engine::call(doc)
    }

    pub fn wireless(
        &self,
        mode: Option<&str>,
        apn: Option<&str>,
        method: Option<&str>,
        hours: Option<u32>,
    ) -> Result<res::Wireless, NoteError> {
        let doc = to_doc(req::Wireless {
            req: "card.wireless",
            mode: mode.map(String::from),
            method: method.map(String::from),
            apn: apn.map(String::from),
            hours,
        })?;
        engine::call(doc)
    }

    /// Returns firmware version information for the Notecard.
    pub fn version(&self) -> Result<res::Version, NoteError> {
        engine::call(engine::new_request("card.version"))
    }

    /// Configure Notecard Outboard Firmware Update feature. Added in
    /// v3.5.1 Notecard firmware.
    pub fn dfu(&self, name: Option<req::DFUName>, on: Option<bool>, stop: Option<bool>) -> Result<res::DFU, NoteError> {
        let doc = to_doc(req::DFU::new(name, on, stop))?;
        engine::call(doc)
    }

    pub fn transport(&self, method: Transport, allow: Option<bool>, umin: Option<bool>) -> Result<res::Transport, NoteError> {
        let doc = to_doc(req::Transport { req: "card.transport", method: method.str(), allow, umin })?;
        engine::call(doc)
    }
}

pub mod req {
    use super::*;

    #[derive(Deserialize, Serialize, Debug, Default)]
    pub struct Transport {
        pub req: &'static str,

        pub method: &'static str,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub allow: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub umin: Option<bool>,
    }

    #[derive(Deserialize, Serialize, Debug, Default)]
    pub struct Wireless {
        pub req: &'static str,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub mode: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub apn: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub method: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub hours: Option<u32>,
    }

    #[derive(Deserialize, Serialize, Debug, Default)]
    pub struct LocationTrack {
        pub req: &'static str,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub start: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub heartbeat: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub sync: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub stop: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub hours: Option<i32>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub file: Option<String>,
    }

    #[derive(Deserialize, Serialize, Debug, Default)]
    pub struct LocationMode {
        pub req: &'static str,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub mode: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub seconds: Option<u32>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub vseconds: Option<String>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub delete: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub max: Option<u32>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub lat: Option<f32>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub lon: Option<f32>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub minutes: Option<u32>,
    }

    #[derive(Deserialize, Serialize, PartialEq, Debug)]
    #[serde(rename_all = "lowercase")]
    pub enum DFUName {
        Esp32,
        Stm32,
        #[serde(rename = "stm32-bi")]
        Stm32Bi,
        McuBoot,
        #[serde(rename = "-")]
        Reset,
    }

    #[derive(Deserialize, Serialize, Debug)]
    pub struct DFU {
        pub req: &'static str,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub name: Option<req::DFUName>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub on: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub off: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub stop: Option<bool>,

        #[serde(skip_serializing_if = "Option::is_none")]
        pub start: Option<bool>,
    }

    impl DFU {
        pub fn new(name: Option<req::DFUName>, on: Option<bool>, stop: Option<bool>) -> Self {
            // `on`/`off` and `stop`/`start` are mutually exclusive on the
            // wire, so at most one of each pair is ever `Some`.
            Self {
                req: "card.dfu",
                name,
                on: on.and_then(|v| if v { Some(true) } else { None }),
                off: on.and_then(|v| if v { None } else { Some(true) }),
                stop: stop.and_then(|v| if v { Some(true) } else { None }),
                start: stop.and_then(|v| if v { None } else { Some(true) }),
            }
        }
    }
}

pub mod res {
    use super::*;

    #[derive(Deserialize, Debug)]
    pub struct Empty {}

    #[derive(Deserialize, Debug)]
    pub struct LocationTrack {
        pub start: Option<bool>,
        pub stop: Option<bool>,
        pub heartbeat: Option<bool>,
        pub seconds: Option<u32>,
        pub hours: Option<i32>,
        pub file: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct LocationMode {
        pub mode: String,
        pub seconds: Option<u32>,
        pub vseconds: Option<String>,
        pub max: Option<u32>,
        pub lat: Option<f64>,
        pub lon: Option<f64>,
        pub minutes: Option<u32>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Location {
        pub status: String,
        pub mode: String,
        pub lat: Option<f64>,
        pub lon: Option<f64>,
        pub time: Option<u32>,
        pub max: Option<u32>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Time {
        pub time: Option<u32>,
        pub area: Option<String>,
        pub zone: Option<String>,
        pub minutes: Option<i32>,
        pub lat: Option<f64>,
        pub lon: Option<f64>,
        pub country: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Status {
        pub status: String,
        #[serde(default)]
        pub usb: bool,
        pub storage: usize,
        pub time: Option<u64>,
        #[serde(default)]
        pub connected: bool,
    }

    #[derive(Deserialize, Debug)]
    pub struct WirelessNet {
        pub iccid: Option<String>,
        pub imsi: Option<String>,
        pub imei: Option<String>,
        pub modem: Option<String>,
        pub band: Option<String>,
        pub rat: Option<String>,
        pub rssir: Option<i32>,
        pub rssi: Option<i32>,
        pub rsrp: Option<i32>,
        pub sinr: Option<i32>,
        pub rsrq: Option<i32>,
        pub bars: Option<i32>,
        pub mcc: Option<i32>,
        pub mnc: Option<i32>,
        pub lac: Option<i32>,
        pub cid: Option<i32>,
        pub updated: Option<u32>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Wireless {
        pub status: String,
        pub mode: Option<String>,
        pub count: Option<u8>,
        pub net: Option<WirelessNet>,
    }

    #[derive(Deserialize, Debug)]
    pub struct VersionInner {
        pub org: String,
        pub product: String,
        pub version: String,
        pub ver_major: u8,
        pub ver_minor: u8,
        pub ver_patch: u8,
        pub ver_build: u32,
        pub built: String,
        pub target: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Version {
        pub body: VersionInner,
        pub version: String,
        pub device: String,
        pub name: String,
        pub board: String,
        pub sku: String,
        pub api: Option<u16>,
        pub cell: Option<bool>,
        pub gps: Option<bool>,
        pub ordering_code: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct DFU {
        pub name: req::DFUName,
    }

    #[derive(Deserialize, Debug)]
    pub struct Transport {
        pub method: String,
    }
}
