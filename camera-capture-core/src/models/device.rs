use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a host media device, as reported by the host inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaDeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
    /// Combined audio/video capture endpoint (e.g. a capture card).
    AudioVideoInput,
}

/// An entry of the host's device inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub label: String,
    pub kind: MediaDeviceKind,
}

impl MediaDeviceInfo {
    pub fn video(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind: MediaDeviceKind::VideoInput,
        }
    }

    pub fn is_video_input(&self) -> bool {
        self.kind == MediaDeviceKind::VideoInput
    }
}

/// A video capture device available to the session.
///
/// Serialized as `{ "deviceId": ..., "label": ... }`. The label may be empty
/// until the host has granted capture access.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub device_id: String,
    pub label: String,
}

impl From<MediaDeviceInfo> for DeviceDescriptor {
    fn from(info: MediaDeviceInfo) -> Self {
        Self {
            device_id: info.device_id,
            label: info.label,
        }
    }
}

/// Video part of the constraints submitted with a track request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
    /// Exact device to open; `None` lets the host pick.
    pub device_id: Option<String>,
}

/// Constraints submitted when requesting a track set from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConstraints {
    pub audio: bool,
    pub video: VideoConstraints,
}

impl StreamConstraints {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            audio: false,
            video: VideoConstraints {
                width,
                height,
                device_id: None,
            },
        }
    }

    /// Constraints accepting any camera at any resolution, used to probe access.
    pub fn any_video() -> Self {
        Self::new(0, 0)
    }

    pub fn device_id(&self) -> Option<&str> {
        self.video.device_id.as_deref()
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.video.device_id = Some(device_id.into());
        self
    }
}

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSessionDiagnostics {
    pub acquisitions: u64,
    pub releases: u64,
    pub stale_acquisitions: u64,
    pub decoded_updates: u64,
    pub frames_emitted: u64,
    pub encode_failures: u64,
    pub last_frame_at: Option<DateTime<Utc>>,
}
