//! Offscreen render surface that "decodes" generated test-pattern frames.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use image::{imageops, Rgba, RgbaImage};
use parking_lot::Mutex;

use camera_capture_core::models::error::CaptureError;
use camera_capture_core::traits::media_host::TrackSet;
use camera_capture_core::traits::render_surface::{FrameUpdateHandler, RenderSurface, SubscriptionId};

struct SurfaceState {
    source: Option<String>,
    playing: bool,
    autoplay_blocked: bool,
    frame: Option<RgbaImage>,
    frames_decoded: u64,
    handlers: Vec<(SubscriptionId, FrameUpdateHandler)>,
    next_subscription: u64,
}

/// `RenderSurface` with a fixed native resolution.
///
/// Each `push_frame` renders a test pattern derived from the attached
/// device and the frame index, then fires the decoded-update handlers.
pub struct SyntheticSurface {
    width: u32,
    height: u32,
    state: Mutex<SurfaceState>,
}

impl SyntheticSurface {
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self {
            width,
            height,
            state: Mutex::new(SurfaceState {
                source: None,
                playing: false,
                autoplay_blocked: false,
                frame: None,
                frames_decoded: 0,
                handlers: Vec::new(),
                next_subscription: 0,
            }),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Make `play` fail, like a browser refusing autoplay.
    pub fn set_autoplay_blocked(&self, blocked: bool) {
        self.state.lock().autoplay_blocked = blocked;
    }

    pub fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn frames_decoded(&self) -> u64 {
        self.state.lock().frames_decoded
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.lock().handlers.len()
    }

    /// Decode the next frame if a source is attached and playing.
    ///
    /// Handlers run after the surface lock is released. Returns whether a
    /// frame was decoded.
    pub fn push_frame(&self) -> bool {
        let handlers: Vec<FrameUpdateHandler> = {
            let mut s = self.state.lock();
            let Some(source) = s.source.clone() else {
                return false;
            };
            if !s.playing {
                return false;
            }
            let index = s.frames_decoded;
            s.frame = Some(test_pattern(&source, index, self.width, self.height));
            s.frames_decoded += 1;
            s.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        for handler in &handlers {
            handler();
        }
        true
    }
}

#[async_trait]
impl RenderSurface for SyntheticSurface {
    fn attach(&self, tracks: &TrackSet) {
        let mut s = self.state.lock();
        s.source = Some(tracks.device_id().to_string());
        s.playing = false;
        s.frame = None;
    }

    fn detach(&self) {
        let mut s = self.state.lock();
        s.source = None;
        s.playing = false;
        s.frame = None;
    }

    async fn play(&self) -> Result<(), CaptureError> {
        let mut s = self.state.lock();
        if s.autoplay_blocked {
            return Err(CaptureError::PermissionDenied);
        }
        if s.source.is_none() {
            return Err(CaptureError::InvalidState("no source attached".into()));
        }
        s.playing = true;
        Ok(())
    }

    fn pause(&self) {
        self.state.lock().playing = false;
    }

    fn subscribe_decoded(&self, handler: FrameUpdateHandler) -> SubscriptionId {
        let mut s = self.state.lock();
        s.next_subscription += 1;
        let id = SubscriptionId(s.next_subscription);
        s.handlers.push((id, handler));
        id
    }

    fn unsubscribe_decoded(&self, id: SubscriptionId) {
        self.state.lock().handlers.retain(|(sub, _)| *sub != id);
    }

    fn draw_current_frame(&self, target: &mut RgbaImage) -> bool {
        let s = self.state.lock();
        match &s.frame {
            Some(frame) => {
                imageops::replace(target, frame, 0, 0);
                true
            }
            None => false,
        }
    }
}

/// Solid per-device background with a white bar sweeping left to right.
fn test_pattern(device_id: &str, index: u64, width: u32, height: u32) -> RgbaImage {
    let mut hasher = DefaultHasher::new();
    device_id.hash(&mut hasher);
    let [r, g, b, ..] = hasher.finish().to_le_bytes();
    let background = Rgba([r, g, b, 255]);
    let bar = Rgba([255, 255, 255, 255]);

    let bar_width = (width / 16).max(1);
    let bar_x = ((index * u64::from(bar_width)) % u64::from(width.max(1))) as u32;
    RgbaImage::from_fn(width, height, |x, _| {
        if x >= bar_x && x < bar_x + bar_width {
            bar
        } else {
            background
        }
    })
}
