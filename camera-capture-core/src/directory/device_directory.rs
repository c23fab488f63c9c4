//! Video device enumeration and capture-access probing.
//!
//! Stateless apart from the host it queries: every call re-reads the host
//! inventory, and descriptors are never cached.

use std::sync::Arc;

use crate::models::device::{DeviceDescriptor, StreamConstraints};
use crate::models::error::CaptureError;
use crate::traits::media_host::MediaHost;

/// Video device directory backed by a `MediaHost`.
pub struct DeviceDirectory<H: MediaHost> {
    host: Arc<H>,
}

impl<H: MediaHost> Clone for DeviceDirectory<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
        }
    }
}

impl<H: MediaHost> DeviceDirectory<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// List video capture devices in host enumeration order.
    ///
    /// Audio-only and combined audio/video endpoints are filtered out. Labels
    /// may be empty when access has not been granted yet.
    pub async fn list_video_devices(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        let inventory = self.host.enumerate_devices().await.map_err(|e| match e {
            CaptureError::PermissionDenied | CaptureError::PermissionUnavailable => {
                CaptureError::PermissionUnavailable
            }
            other => other,
        })?;

        let devices: Vec<DeviceDescriptor> = inventory
            .into_iter()
            .filter(|d| d.is_video_input())
            .map(DeviceDescriptor::from)
            .collect();

        log::debug!("Enumerated {} video device(s)", devices.len());
        Ok(devices)
    }

    /// First video device, used when a start names no device.
    pub async fn default_device(&self) -> Result<DeviceDescriptor, CaptureError> {
        self.list_video_devices()
            .await?
            .into_iter()
            .next()
            .ok_or(CaptureError::DeviceUnavailable)
    }

    /// Try to secure a capture grant from the host.
    ///
    /// Acquires a probe track set and releases it straight away. Denial and
    /// every lower-level fault come back as `false`.
    pub async fn request_access(&self) -> bool {
        match self.host.acquire_tracks(&StreamConstraints::any_video()).await {
            Ok(probe) => {
                probe.release();
                true
            }
            Err(e) => {
                log::debug!("Camera access unavailable: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::{MediaDeviceInfo, MediaDeviceKind};
    use crate::testing::MockHost;

    fn inventory() -> Vec<MediaDeviceInfo> {
        vec![
            MediaDeviceInfo {
                device_id: "mic0".into(),
                label: "Built-in Microphone".into(),
                kind: MediaDeviceKind::AudioInput,
            },
            MediaDeviceInfo::video("cam1", "Front"),
            MediaDeviceInfo {
                device_id: "capture-card".into(),
                label: "HDMI Capture".into(),
                kind: MediaDeviceKind::AudioVideoInput,
            },
            MediaDeviceInfo {
                device_id: "spk0".into(),
                label: "Speakers".into(),
                kind: MediaDeviceKind::AudioOutput,
            },
            MediaDeviceInfo::video("cam2", ""),
        ]
    }

    #[tokio::test]
    async fn lists_only_video_inputs_in_host_order() {
        let directory = DeviceDirectory::new(MockHost::with_inventory(inventory()));
        let devices = directory.list_video_devices().await.unwrap();

        let ids: Vec<&str> = devices.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["cam1", "cam2"]);
        assert_eq!(devices[1].label, "");
    }

    #[tokio::test]
    async fn every_call_requeries_the_host() {
        let host = MockHost::with_inventory(vec![MediaDeviceInfo::video("cam1", "Front")]);
        let directory = DeviceDirectory::new(Arc::clone(&host));
        assert_eq!(directory.list_video_devices().await.unwrap().len(), 1);

        host.set_inventory(inventory());
        assert_eq!(directory.list_video_devices().await.unwrap().len(), 2);
        assert_eq!(host.enumerations(), 2);
    }

    #[tokio::test]
    async fn denied_enumeration_is_permission_unavailable() {
        let host = MockHost::with_inventory(inventory());
        host.deny_enumeration();
        let directory = DeviceDirectory::new(host);

        assert_eq!(
            directory.list_video_devices().await,
            Err(CaptureError::PermissionUnavailable)
        );
    }

    #[tokio::test]
    async fn default_device_is_first_video_input() {
        let directory = DeviceDirectory::new(MockHost::with_inventory(inventory()));
        assert_eq!(directory.default_device().await.unwrap().device_id, "cam1");

        let empty = DeviceDirectory::new(MockHost::with_inventory(Vec::new()));
        assert_eq!(empty.default_device().await, Err(CaptureError::DeviceUnavailable));
    }

    #[tokio::test]
    async fn request_access_releases_probe() {
        let host = MockHost::with_inventory(inventory());
        let directory = DeviceDirectory::new(Arc::clone(&host));

        assert!(directory.request_access().await);
        assert_eq!(host.acquisitions(), 1);
        assert_eq!(host.live_tracks(), 0);
    }

    #[tokio::test]
    async fn request_access_normalizes_failures_to_false() {
        let host = MockHost::with_inventory(inventory());
        host.fail_all(CaptureError::PermissionDenied);
        assert!(!DeviceDirectory::new(Arc::clone(&host)).request_access().await);

        host.fail_all(CaptureError::Unknown("no camera api".into()));
        assert!(!DeviceDirectory::new(host).request_access().await);
    }
}
