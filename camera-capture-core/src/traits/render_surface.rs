use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;

use crate::models::error::CaptureError;
use crate::traits::media_host::TrackSet;

/// Callback invoked by a surface each time it has decoded a new media frame.
///
/// Fired by the host's media pipeline, not by a timer, on whatever thread
/// decodes the frame. The surface must not hold its own locks while invoking
/// it: handlers call back into the surface to draw the current frame. An
/// update racing a stop is dropped; the session never delivers a frame after
/// its stop has returned.
pub type FrameUpdateHandler = Arc<dyn Fn() + Send + Sync + 'static>;

/// Token returned by `RenderSurface::subscribe_decoded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A playable, drawable media sink owned by the caller (e.g. a video element).
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Make `tracks` the surface's media source.
    fn attach(&self, tracks: &TrackSet);

    /// Drop the media source.
    fn detach(&self);

    /// Begin playback of the attached source.
    async fn play(&self) -> Result<(), CaptureError>;

    /// Pause playback. The last decoded frame stays visible.
    fn pause(&self);

    /// Register a decoded-frame handler.
    fn subscribe_decoded(&self, handler: FrameUpdateHandler) -> SubscriptionId;

    /// Unregister a handler. Unknown ids are ignored.
    fn unsubscribe_decoded(&self, id: SubscriptionId);

    /// Draw the currently visible frame into `target` at its origin.
    ///
    /// Returns `false` when no frame has been decoded yet.
    fn draw_current_frame(&self, target: &mut RgbaImage) -> bool;
}
