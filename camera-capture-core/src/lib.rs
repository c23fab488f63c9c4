//! # camera-capture-core
//!
//! Platform-agnostic camera capture core library.
//!
//! Provides device discovery, the capture-session state machine, and the
//! still-frame pipeline that turns decoded video updates into PNG data URLs.
//! Backends implement the `MediaHost` and `RenderSurface` traits and plug into
//! the generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! camera-capture-core (this crate)
//! ├── traits/       ← MediaHost, RenderSurface, FrameSink, CaptureDelegate, CameraControl
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, device descriptors
//! ├── directory/    ← DeviceDirectory (enumeration, access probe)
//! ├── processing/   ← still encoder (raster → PNG → data URL)
//! └── session/      ← CaptureSession (state machine), CameraView
//! ```

pub mod directory;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use directory::device_directory::DeviceDirectory;
pub use models::config::CaptureConfiguration;
pub use models::device::{
    CaptureSessionDiagnostics, DeviceDescriptor, MediaDeviceInfo, MediaDeviceKind, StreamConstraints,
    VideoConstraints,
};
pub use models::error::CaptureError;
pub use models::state::CaptureState;
pub use session::capture::CaptureSession;
pub use session::view::{CameraView, RenderedHook};
pub use traits::camera_control::CameraControl;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::frame_sink::FrameSink;
pub use traits::media_host::{MediaHost, MediaTrack, TrackSet};
pub use traits::render_surface::{FrameUpdateHandler, RenderSurface, SubscriptionId};
