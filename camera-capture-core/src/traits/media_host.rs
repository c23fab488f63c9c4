use async_trait::async_trait;

use crate::models::device::{MediaDeviceInfo, StreamConstraints};
use crate::models::error::CaptureError;

/// A live hardware media line handed out by the host.
pub trait MediaTrack: Send {
    /// Host-assigned track identifier.
    fn id(&self) -> &str;

    /// Stop the track and release the hardware behind it.
    fn stop(&mut self) -> Result<(), CaptureError>;
}

/// Interface to the host media environment.
///
/// Implemented by:
/// - `SyntheticHost` (camera-capture-synthetic)
/// - Future: V4L2, AVFoundation and Media Foundation backends
#[async_trait]
pub trait MediaHost: Send + Sync + 'static {
    /// Query the host's full device inventory (all kinds), in host order.
    ///
    /// Returns `PermissionDenied` or `PermissionUnavailable` when the host
    /// refuses enumeration.
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, CaptureError>;

    /// Acquire a track set satisfying `constraints`.
    ///
    /// May suspend for as long as the host needs (permission prompt, device
    /// warm-up); the session imposes no timeout.
    async fn acquire_tracks(&self, constraints: &StreamConstraints) -> Result<TrackSet, CaptureError>;
}

/// Tracks obtained by one acquisition.
///
/// `release` consumes the set, so a set can only be released once. A set that
/// is dropped without being released stops its tracks anyway and logs it.
pub struct TrackSet {
    device_id: String,
    tracks: Vec<Box<dyn MediaTrack>>,
}

impl TrackSet {
    pub fn new(device_id: impl Into<String>, tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        Self {
            device_id: device_id.into(),
            tracks,
        }
    }

    /// Device the tracks were acquired from.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn tracks(&self) -> &[Box<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Stop every track. Returns how many stopped cleanly.
    ///
    /// Failures are logged and do not prevent the remaining tracks from stopping.
    pub fn release(mut self) -> usize {
        self.stop_all()
    }

    fn stop_all(&mut self) -> usize {
        let mut stopped = 0;
        for mut track in self.tracks.drain(..) {
            match track.stop() {
                Ok(()) => stopped += 1,
                Err(e) => log::warn!(
                    "Failed to stop track {} of {}: {}",
                    track.id(),
                    self.device_id,
                    e
                ),
            }
        }
        stopped
    }
}

impl Drop for TrackSet {
    fn drop(&mut self) {
        if !self.tracks.is_empty() {
            log::warn!(
                "Track set for {} dropped without release, stopping {} track(s)",
                self.device_id,
                self.tracks.len()
            );
            self.stop_all();
        }
    }
}

impl std::fmt::Debug for TrackSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.tracks.iter().map(|t| t.id()).collect();
        f.debug_struct("TrackSet")
            .field("device_id", &self.device_id)
            .field("tracks", &ids)
            .finish()
    }
}
