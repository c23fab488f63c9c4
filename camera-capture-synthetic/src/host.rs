//! Software media host with a configurable camera inventory.
//!
//! Models the behaviour of a real host closely enough to exercise the
//! session: labels hidden until access is granted, denial at enumeration or
//! acquisition time, and acquisitions that take a while to resolve.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use camera_capture_core::models::device::{MediaDeviceInfo, StreamConstraints};
use camera_capture_core::models::error::CaptureError;
use camera_capture_core::traits::media_host::{MediaHost, MediaTrack, TrackSet};

/// How the host answers permission-gated calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionMode {
    /// Everything allowed, labels visible.
    #[default]
    Granted,
    /// Labels hidden until the first successful acquisition, which grants access.
    Prompt,
    /// Enumeration works (without labels); acquisition is denied.
    Denied,
    /// Both enumeration and acquisition are denied.
    Blocked,
}

/// Counts tracks handed out and stopped, shared with every issued track.
#[derive(Debug, Default)]
pub struct TrackLedger {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl TrackLedger {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Tracks acquired and not yet stopped.
    pub fn live(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }
}

/// A generated video track. Stopping it twice counts once.
pub struct SyntheticTrack {
    id: String,
    stopped: bool,
    ledger: Arc<TrackLedger>,
}

impl MediaTrack for SyntheticTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.stopped {
            self.stopped = true;
            self.ledger.released.fetch_add(1, Ordering::SeqCst);
            log::debug!("Stopped synthetic track {}", self.id);
        }
        Ok(())
    }
}

/// `MediaHost` backed by an in-memory camera list.
pub struct SyntheticHost {
    devices: Mutex<Vec<MediaDeviceInfo>>,
    permission: Mutex<PermissionMode>,
    latency: Mutex<Option<Duration>>,
    ledger: Arc<TrackLedger>,
    next_track: AtomicU64,
}

impl SyntheticHost {
    pub fn new(devices: Vec<MediaDeviceInfo>) -> Arc<Self> {
        Arc::new(Self {
            devices: Mutex::new(devices),
            permission: Mutex::new(PermissionMode::Granted),
            latency: Mutex::new(None),
            ledger: Arc::new(TrackLedger::default()),
            next_track: AtomicU64::new(0),
        })
    }

    /// Host with one video input per `(id, label)` pair.
    pub fn with_cameras(cameras: &[(&str, &str)]) -> Arc<Self> {
        Self::new(
            cameras
                .iter()
                .map(|(id, label)| MediaDeviceInfo::video(*id, *label))
                .collect(),
        )
    }

    pub fn set_devices(&self, devices: Vec<MediaDeviceInfo>) {
        *self.devices.lock() = devices;
    }

    pub fn permission(&self) -> PermissionMode {
        *self.permission.lock()
    }

    pub fn set_permission(&self, mode: PermissionMode) {
        *self.permission.lock() = mode;
    }

    /// Delay every acquisition by `latency` (device warm-up, permission prompt).
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    pub fn ledger(&self) -> &Arc<TrackLedger> {
        &self.ledger
    }

    fn resolve(&self, device_id: Option<&str>) -> Result<MediaDeviceInfo, CaptureError> {
        let devices = self.devices.lock();
        let mut cameras = devices.iter().filter(|d| d.is_video_input());
        let found = match device_id {
            Some(id) => cameras.find(|d| d.device_id == id),
            None => cameras.next(),
        };
        found.cloned().ok_or(CaptureError::DeviceUnavailable)
    }
}

#[async_trait]
impl MediaHost for SyntheticHost {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, CaptureError> {
        let devices = self.devices.lock().clone();
        match self.permission() {
            PermissionMode::Blocked => Err(CaptureError::PermissionDenied),
            PermissionMode::Granted => Ok(devices),
            PermissionMode::Prompt | PermissionMode::Denied => Ok(devices
                .into_iter()
                .map(|d| MediaDeviceInfo {
                    label: String::new(),
                    ..d
                })
                .collect()),
        }
    }

    async fn acquire_tracks(&self, constraints: &StreamConstraints) -> Result<TrackSet, CaptureError> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match self.permission() {
            PermissionMode::Denied | PermissionMode::Blocked => {
                return Err(CaptureError::PermissionDenied)
            }
            PermissionMode::Prompt => {
                log::info!("Synthetic host: camera access granted");
                self.set_permission(PermissionMode::Granted);
            }
            PermissionMode::Granted => {}
        }

        let device = self.resolve(constraints.device_id())?;
        let n = self.next_track.fetch_add(1, Ordering::SeqCst);
        let track = SyntheticTrack {
            id: format!("{}#video{}", device.device_id, n),
            stopped: false,
            ledger: Arc::clone(&self.ledger),
        };
        self.ledger.acquired.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "Synthetic host: issued {} at {}x{}",
            track.id,
            constraints.video.width,
            constraints.video.height
        );
        Ok(TrackSet::new(device.device_id, vec![Box::new(track)]))
    }
}
