use crate::errors::Result;
use crate::models::Preferences;
use serde::{Deserialize, Serialize};

/// Observer -> host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "sw/skipWaiting")]
    SkipWaiting,
    #[serde(rename = "timer/requestStatus")]
    RequestStatus,
    #[serde(rename = "timer/start")]
    Start { duration: f64 },
    #[serde(rename = "timer/stop")]
    Stop,
    #[serde(rename = "preferences/notificationEnabled", rename_all = "camelCase")]
    SetNotificationEnabled { notification_enabled: bool },
    #[serde(other)]
    Unknown,
}

/// Host -> observer(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControllerMessage {
    /// A new version finished installing.
    #[serde(rename = "sw/install")]
    Installed,
    /// A new version was already waiting when this observer attached.
    #[serde(rename = "sw/waiting")]
    Waiting,
    /// A new version took over; the observer must reload.
    #[serde(rename = "sw/activate")]
    Activated,
    #[serde(rename = "timer/start")]
    Started,
    #[serde(rename = "timer/stop")]
    Stopped,
    #[serde(rename = "timer/tick")]
    Tick { remaining: i64 },
    #[serde(rename = "timer/alarm")]
    Alarm,
    #[serde(rename = "timer/status")]
    Status {
        running: bool,
        remaining: i64,
        preferences: Preferences,
    },
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ControllerMessage {
    pub fn decode(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
