use async_trait::async_trait;

use crate::models::device::DeviceDescriptor;
use crate::models::error::CaptureError;

/// Capability set shared by the capture session and UI-facing wrappers.
#[async_trait]
pub trait CameraControl: Send + Sync {
    /// Start streaming `device_id`, or the default camera when `None`.
    async fn start(&self, device_id: Option<&str>) -> Result<(), CaptureError>;

    /// Stop streaming and release the camera. Idempotent.
    async fn stop(&self) -> Result<(), CaptureError>;

    /// Switch to another camera; no-op when it is already streaming.
    async fn change_device(&self, device_id: &str) -> Result<(), CaptureError>;

    /// Try to secure capture access. Denial is `false`, never an error.
    async fn camera_access(&self) -> bool;

    /// Video capture devices in host order.
    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, CaptureError>;

    /// Encoded snapshot of the current frame, if streaming.
    async fn current_frame(&self) -> Result<Option<String>, CaptureError>;

    /// Release everything. Safe to call repeatedly.
    async fn dispose(&self);
}
