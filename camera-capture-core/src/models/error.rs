use thiserror::Error;

/// Errors that can occur during camera capture operations.
///
/// Capability checks (`DeviceDirectory::request_access`) never surface these;
/// they collapse every failure into `false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("permission unavailable: host refused device enumeration")]
    PermissionUnavailable,

    #[error("device not available")]
    DeviceUnavailable,

    #[error("acquisition failed: {0}")]
    AcquisitionFailed(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A newer start/stop/switch replaced this request before it completed.
    #[error("superseded by a newer request")]
    Superseded,

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Normalizes a host error raised while acquiring tracks.
    pub(crate) fn into_acquisition_failure(self) -> Self {
        match self {
            Self::AcquisitionFailed(_) => self,
            other => Self::AcquisitionFailed(other.to_string()),
        }
    }
}
