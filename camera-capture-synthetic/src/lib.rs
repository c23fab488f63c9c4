//! # camera-capture-synthetic
//!
//! Software backend for camera-capture-kit.
//!
//! Provides:
//! - `SyntheticHost`: in-memory camera inventory with permission modes and acquisition latency
//! - `SyntheticSurface`: offscreen surface rendering a per-device test pattern
//! - `FrameClock`: tokio task pushing frames into a surface at a fixed rate
//!
//! ## Usage
//! ```ignore
//! use camera_capture_core::{CaptureConfiguration, CaptureSession};
//! use camera_capture_synthetic::{FrameClock, SyntheticHost, SyntheticSurface};
//!
//! let host = SyntheticHost::with_cameras(&[("cam1", "Front")]);
//! let surface = SyntheticSurface::new(640, 360);
//! let session = CaptureSession::new(host);
//! session.initialize(surface.clone(), &CaptureConfiguration::default(), Some(sink)).await?;
//! session.start(None).await?;
//! let clock = FrameClock::start(surface, Duration::from_millis(33));
//! ```

pub mod clock;
pub mod host;
pub mod surface;

pub use clock::FrameClock;
pub use host::{PermissionMode, SyntheticHost, SyntheticTrack, TrackLedger};
pub use surface::SyntheticSurface;
