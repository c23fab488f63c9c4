use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// Largest accepted raster edge, in pixels.
pub const MAX_DIMENSION: u32 = 8192;

/// Configuration for a capture session and the view wrapping it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureConfiguration {
    /// Requested stream width and still-frame raster width (default: 640).
    pub width: u32,

    /// Requested stream height and still-frame raster height (default: 360).
    pub height: u32,

    /// Invoke the frame sink on decoded updates (default: true).
    pub emit_frames: bool,

    /// Default camera, or None for the first enumerated device.
    pub device_id: Option<String>,

    /// Start streaming right after (re)initialization (default: false).
    pub autostart: bool,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "dimensions must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(format!(
                "dimensions exceed {}px: {}x{}",
                MAX_DIMENSION, self.width, self.height
            ));
        }
        if matches!(self.device_id.as_deref(), Some("")) {
            return Err("device id must not be empty".into());
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("invalid config: {}", e)))?;
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let json = fs::read_to_string(path).map_err(|e| {
            CaptureError::ConfigurationFailed(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            emit_frames: true,
            device_id: None,
            autostart: false,
        }
    }
}
