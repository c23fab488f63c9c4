use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::{Mutex, MutexGuard, ReentrantMutex};
use uuid::Uuid;

use crate::directory::device_directory::DeviceDirectory;
use crate::models::config::CaptureConfiguration;
use crate::models::device::{CaptureSessionDiagnostics, DeviceDescriptor, StreamConstraints};
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::processing::still_encoder;
use crate::traits::camera_control::CameraControl;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::frame_sink::FrameSink;
use crate::traits::media_host::{MediaHost, TrackSet};
use crate::traits::render_surface::{FrameUpdateHandler, RenderSurface, SubscriptionId};

/// Internal mutable session state, protected by `parking_lot::Mutex`.
///
/// The lock is never held across an `.await`. Every caller intent that
/// invalidates in-flight work (start, stop, switch, re-init, dispose) bumps
/// `generation`; async resume points compare against it.
struct SessionInner {
    state: CaptureState,
    surface: Option<Arc<dyn RenderSurface>>,
    tracks: Option<TrackSet>,
    constraints: Option<StreamConstraints>,
    sink: Option<Weak<dyn FrameSink>>,
    emit_frames: bool,
    subscription: Option<SubscriptionId>,
    generation: u64,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    diagnostics: CaptureSessionDiagnostics,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            state: CaptureState::Uninitialized,
            surface: None,
            tracks: None,
            constraints: None,
            sink: None,
            emit_frames: false,
            subscription: None,
            generation: 0,
            delegate: None,
            diagnostics: CaptureSessionDiagnostics::default(),
        }
    }

    fn is_current_stream(&self, generation: u64) -> bool {
        self.generation == generation && self.state.is_streaming()
    }

    fn advance(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Fails when `generation` is no longer the latest intent.
    fn ensure_current(&self, generation: u64) -> Result<(), CaptureError> {
        if self.state.is_disposed() {
            Err(CaptureError::InvalidState("session disposed while starting".into()))
        } else if self.generation != generation {
            Err(CaptureError::Superseded)
        } else {
            Ok(())
        }
    }

    fn release_tracks(&mut self, tracks: TrackSet) {
        let device = tracks.device_id().to_string();
        let stopped = tracks.release();
        self.diagnostics.releases += 1;
        log::debug!("Released {} track(s) of {}", stopped, device);
    }

    /// Pause the surface, drop the frame trigger and release the active tracks.
    ///
    /// Returns whether a stream was live or being bound.
    fn release_stream(&mut self) -> bool {
        let was_streaming = self.state.is_streaming();
        if let Some(surface) = &self.surface {
            if let Some(id) = self.subscription.take() {
                surface.unsubscribe_decoded(id);
            }
            if self.tracks.is_some() {
                surface.pause();
            }
        }
        let had_tracks = match self.tracks.take() {
            Some(tracks) => {
                self.release_tracks(tracks);
                true
            }
            None => false,
        };
        was_streaming || had_tracks
    }

    /// Release the stream and every caller-supplied reference.
    fn teardown(&mut self) {
        self.release_stream();
        if let Some(surface) = self.surface.take() {
            surface.detach();
        }
        self.sink = None;
        self.constraints = None;
        self.emit_frames = false;
    }

    fn set_state(&mut self, next: CaptureState, notifier: &mut Notifier) {
        if self.state != next {
            log::debug!("State {} -> {}", self.state, next);
            self.state = next.clone();
            notifier.state(next);
        }
    }

    fn notifier(&self) -> Notifier {
        Notifier {
            delegate: self.delegate.clone(),
            events: Vec::new(),
        }
    }
}

/// Session state plus the guard that serializes frame delivery against teardown.
///
/// Decoded-update handlers may run on any thread. A delivery holds `emission`
/// from its final currency check until the sink returns; every operation that
/// ends a stream waits for that guard after releasing `state`, so no sink call
/// is in progress or can begin once it returns. The guard is reentrant so a
/// sink may call back into the session from its own thread.
struct SessionShared {
    state: Mutex<SessionInner>,
    emission: ReentrantMutex<()>,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(SessionInner::new()),
            emission: ReentrantMutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.state.lock()
    }

    /// Block until any in-flight sink delivery has returned.
    ///
    /// Must be called without holding `state`.
    fn wait_for_emission(&self) {
        drop(self.emission.lock());
    }
}

enum SessionEvent {
    State(CaptureState),
    Error(CaptureError),
}

/// Delegate notifications collected under the lock and delivered after it.
struct Notifier {
    delegate: Option<Arc<dyn CaptureDelegate>>,
    events: Vec<SessionEvent>,
}

impl Notifier {
    fn state(&mut self, state: CaptureState) {
        if self.delegate.is_some() {
            self.events.push(SessionEvent::State(state));
        }
    }

    fn error(&mut self, error: CaptureError) {
        if self.delegate.is_some() {
            self.events.push(SessionEvent::Error(error));
        }
    }

    fn flush(self) {
        let Some(delegate) = self.delegate else {
            return;
        };
        for event in self.events {
            match event {
                SessionEvent::State(state) => delegate.on_state_changed(&state),
                SessionEvent::Error(error) => delegate.on_error(&error),
            }
        }
    }
}

/// Camera capture session: binds one camera to one render surface.
///
/// Owns the state machine and the active track set, and emits an encoded
/// still to the frame sink for every frame the surface decodes while
/// streaming. All operations take `&self`, so overlapping calls from the
/// same task (or several) are serialized by generation checks rather than
/// by exclusive borrows:
///
/// ```text
/// start(A) ──acquire──────────────────────────▶ resolves: stale → release A
/// start(B) ─────────acquire──▶ attach → play → Streaming(B)
/// ```
pub struct CaptureSession<H: MediaHost> {
    id: Uuid,
    directory: DeviceDirectory<H>,
    inner: Arc<SessionShared>,
}

impl<H: MediaHost> CaptureSession<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self {
            id: Uuid::new_v4(),
            directory: DeviceDirectory::new(host),
            inner: Arc::new(SessionShared::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn directory(&self) -> &DeviceDirectory<H> {
        &self.directory
    }

    pub fn set_delegate(&self, delegate: Arc<dyn CaptureDelegate>) {
        self.inner.lock().delegate = Some(delegate);
    }

    pub fn state(&self) -> CaptureState {
        self.inner.lock().state.clone()
    }

    pub fn diagnostics(&self) -> CaptureSessionDiagnostics {
        self.inner.lock().diagnostics.clone()
    }

    /// Device currently streaming, if any.
    pub fn bound_device(&self) -> Option<String> {
        self.inner.lock().state.device_id().map(str::to_owned)
    }

    /// Constraints used for the latest acquisition.
    pub fn constraints(&self) -> Option<StreamConstraints> {
        self.inner.lock().constraints.clone()
    }

    /// Bind a surface, stream size and optional frame sink.
    ///
    /// Re-initializing a bound session first tears the previous binding down,
    /// releasing its tracks. Transitions: any (except disposed) → initialized.
    pub async fn initialize(
        &self,
        surface: Arc<dyn RenderSurface>,
        config: &CaptureConfiguration,
        sink: Option<Arc<dyn FrameSink>>,
    ) -> Result<(), CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let notifier = {
            let mut inner = self.inner.lock();
            if inner.state.is_disposed() {
                return Err(CaptureError::InvalidState("session is disposed".into()));
            }
            let mut notifier = inner.notifier();

            if inner.state.is_bound() {
                log::debug!("Session {}: re-initializing, releasing previous binding", self.id);
                inner.advance();
                inner.teardown();
            }

            inner.surface = Some(surface);
            inner.constraints = Some(StreamConstraints::new(config.width, config.height));
            inner.sink = sink.as_ref().map(Arc::downgrade);
            inner.emit_frames = config.emit_frames && sink.is_some();
            inner.set_state(CaptureState::Initialized, &mut notifier);
            notifier
        };
        notifier.flush();
        self.inner.wait_for_emission();

        log::info!(
            "Session {}: initialized at {}x{}",
            self.id,
            config.width,
            config.height
        );
        Ok(())
    }

    /// Start streaming `device_id`, or the first enumerated camera when `None`.
    ///
    /// Any live stream is released before the new acquisition. Transitions:
    /// initialized/idle/streaming → streaming, once playback has begun.
    pub async fn start(&self, device_id: Option<&str>) -> Result<(), CaptureError> {
        let (generation, notifier) = {
            let mut inner = self.inner.lock();
            match inner.state {
                CaptureState::Uninitialized => {
                    return Err(CaptureError::InvalidState("start before initialize".into()))
                }
                CaptureState::Disposed => {
                    return Err(CaptureError::InvalidState("session is disposed".into()))
                }
                _ => {}
            }
            let mut notifier = inner.notifier();
            let generation = inner.advance();
            if inner.release_stream() {
                inner.set_state(CaptureState::Idle, &mut notifier);
            }
            (generation, notifier)
        };
        notifier.flush();
        self.inner.wait_for_emission();

        let result = self.acquire_and_bind(generation, device_id).await;
        if let Err(e) = &result {
            match e {
                CaptureError::Superseded => {
                    log::debug!("Session {}: start superseded", self.id)
                }
                other => {
                    log::warn!("Session {}: start failed: {}", self.id, other);
                    let mut notifier = self.inner.lock().notifier();
                    notifier.error(other.clone());
                    notifier.flush();
                }
            }
        }
        result
    }

    async fn acquire_and_bind(
        &self,
        generation: u64,
        device_id: Option<&str>,
    ) -> Result<(), CaptureError> {
        let resolved = match device_id {
            Some(id) => Ok(id.to_string()),
            None => self.directory.default_device().await.map(|d| d.device_id),
        };

        let (device_id, constraints) = {
            let mut inner = self.inner.lock();
            inner.ensure_current(generation)?;
            let device_id = resolved?;
            let constraints = inner
                .constraints
                .as_mut()
                .ok_or_else(|| CaptureError::InvalidState("no stream constraints bound".into()))?;
            constraints.video.device_id = Some(device_id.clone());
            (device_id, constraints.clone())
        };

        log::info!("Session {}: acquiring {}", self.id, device_id);
        let acquired = self.directory.host().acquire_tracks(&constraints).await;

        let surface = {
            let mut inner = self.inner.lock();
            if acquired.is_ok() {
                inner.diagnostics.acquisitions += 1;
            }
            if let Err(stale) = inner.ensure_current(generation) {
                if let Ok(tracks) = acquired {
                    log::warn!(
                        "Session {}: acquisition of {} finished after it was superseded, releasing",
                        self.id,
                        device_id
                    );
                    inner.diagnostics.stale_acquisitions += 1;
                    inner.release_tracks(tracks);
                }
                return Err(stale);
            }

            let tracks = acquired.map_err(CaptureError::into_acquisition_failure)?;
            let surface = match inner.surface.clone() {
                Some(surface) => surface,
                None => {
                    inner.release_tracks(tracks);
                    return Err(CaptureError::InvalidState("no surface bound".into()));
                }
            };
            surface.attach(&tracks);
            inner.tracks = Some(tracks);
            surface
        };

        let played = surface.play().await;

        let notifier = {
            let mut inner = self.inner.lock();
            // A newer intent has already released the tracks stored above.
            inner.ensure_current(generation)?;

            if let Err(e) = played {
                inner.release_stream();
                return Err(CaptureError::AcquisitionFailed(format!(
                    "playback of {} failed: {}",
                    device_id, e
                )));
            }

            let handler = frame_handler(Arc::downgrade(&self.inner), generation, self.id);
            inner.subscription = Some(surface.subscribe_decoded(handler));

            let mut notifier = inner.notifier();
            inner.set_state(
                CaptureState::Streaming {
                    device_id: device_id.clone(),
                },
                &mut notifier,
            );
            notifier
        };
        notifier.flush();

        log::info!("Session {}: streaming {}", self.id, device_id);
        Ok(())
    }

    /// Pause playback, release the tracks and detach the frame trigger.
    ///
    /// Also cancels any start still in flight. Once this returns the sink is
    /// not being called and will not be called again for the stopped stream.
    /// Idempotent; a no-op on an uninitialized or disposed session.
    /// Transitions: streaming → idle.
    pub async fn stop(&self) -> Result<(), CaptureError> {
        let notifier = {
            let mut inner = self.inner.lock();
            let mut notifier = inner.notifier();
            if inner.state.is_bound() {
                inner.advance();
                if inner.release_stream() {
                    inner.set_state(CaptureState::Idle, &mut notifier);
                    log::info!("Session {}: stopped", self.id);
                }
            }
            notifier
        };
        notifier.flush();
        self.inner.wait_for_emission();
        Ok(())
    }

    /// Switch to `device_id`. A no-op when that camera is already streaming.
    pub async fn change_device(&self, device_id: &str) -> Result<(), CaptureError> {
        {
            let inner = self.inner.lock();
            if !inner.state.is_bound() {
                return Err(CaptureError::InvalidState(format!(
                    "cannot change device while {}",
                    inner.state
                )));
            }
            if inner.state.device_id() == Some(device_id) {
                log::debug!("Session {}: already streaming {}", self.id, device_id);
                return Ok(());
            }
        }
        self.start(Some(device_id)).await
    }

    /// Try to secure camera access. Never errors.
    pub async fn camera_access(&self) -> bool {
        self.directory.request_access().await
    }

    pub async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        self.directory.list_video_devices().await
    }

    /// Encode the frame currently shown on the surface, without waiting for a trigger.
    ///
    /// `Ok(None)` unless streaming with at least one decoded frame.
    pub async fn current_frame(&self) -> Result<Option<String>, CaptureError> {
        let (surface, width, height) = {
            let inner = self.inner.lock();
            if inner.state.is_disposed() {
                return Err(CaptureError::InvalidState("session is disposed".into()));
            }
            if !inner.state.is_streaming() {
                return Ok(None);
            }
            match (&inner.surface, &inner.constraints) {
                (Some(surface), Some(c)) => (Arc::clone(surface), c.video.width, c.video.height),
                _ => return Ok(None),
            }
        };
        still_encoder::capture_still(surface.as_ref(), width, height)
    }

    /// Release everything and enter the terminal state.
    ///
    /// Safe to call repeatedly and before `initialize`. A start still in
    /// flight releases whatever it acquires when it resumes.
    pub async fn dispose(&self) {
        self.dispose_now();
    }

    fn dispose_now(&self) {
        let notifier = {
            let mut inner = self.inner.lock();
            if inner.state.is_disposed() {
                return;
            }
            let mut notifier = inner.notifier();
            inner.advance();
            inner.teardown();
            inner.set_state(CaptureState::Disposed, &mut notifier);
            notifier
        };
        notifier.flush();
        self.inner.wait_for_emission();
        log::info!("Session {}: disposed", self.id);
    }
}

impl<H: MediaHost> Drop for CaptureSession<H> {
    fn drop(&mut self) {
        self.dispose_now();
    }
}

#[async_trait::async_trait]
impl<H: MediaHost> CameraControl for CaptureSession<H> {
    async fn start(&self, device_id: Option<&str>) -> Result<(), CaptureError> {
        CaptureSession::start(self, device_id).await
    }

    async fn stop(&self) -> Result<(), CaptureError> {
        CaptureSession::stop(self).await
    }

    async fn change_device(&self, device_id: &str) -> Result<(), CaptureError> {
        CaptureSession::change_device(self, device_id).await
    }

    async fn camera_access(&self) -> bool {
        CaptureSession::camera_access(self).await
    }

    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        CaptureSession::list_devices(self).await
    }

    async fn current_frame(&self) -> Result<Option<String>, CaptureError> {
        CaptureSession::current_frame(self).await
    }

    async fn dispose(&self) {
        CaptureSession::dispose(self).await
    }
}

/// Build the decoded-update handler registered while streaming.
///
/// Holds the session weakly: a surface that outlives the session cannot keep
/// it alive or make it emit.
fn frame_handler(
    inner: Weak<SessionShared>,
    generation: u64,
    session_id: Uuid,
) -> FrameUpdateHandler {
    Arc::new(move || {
        if let Some(inner) = inner.upgrade() {
            emit_frame(&inner, generation, session_id);
        }
    })
}

/// Core frame emission: raster → copy surface frame → PNG data URL → sink.
///
/// Runs synchronously inside the surface's update callback; the next update
/// cannot be handled until the sink returns. Encoding runs unlocked, so the
/// stream is checked again under the emission guard before delivery.
fn emit_frame(inner: &SessionShared, generation: u64, session_id: Uuid) {
    let (surface, sink, width, height, delegate) = {
        let mut s = inner.lock();
        if !s.is_current_stream(generation) {
            return;
        }
        s.diagnostics.decoded_updates += 1;
        if !s.emit_frames {
            return;
        }
        let Some(sink) = s.sink.as_ref().and_then(|sink| sink.upgrade()) else {
            return;
        };
        let (Some(surface), Some(c)) = (&s.surface, &s.constraints) else {
            return;
        };
        (
            Arc::clone(surface),
            sink,
            c.video.width,
            c.video.height,
            s.delegate.clone(),
        )
    };

    match still_encoder::capture_still(surface.as_ref(), width, height) {
        Ok(Some(payload)) => {
            let _delivery = inner.emission.lock();
            if !inner.lock().is_current_stream(generation) {
                log::debug!("Session {}: stream ended while encoding, frame dropped", session_id);
                return;
            }
            sink.on_frame(&payload);
            let mut s = inner.lock();
            s.diagnostics.frames_emitted += 1;
            s.diagnostics.last_frame_at = Some(Utc::now());
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Session {}: failed to encode frame: {}", session_id, e);
            inner.lock().diagnostics.encode_failures += 1;
            if let Some(delegate) = delegate {
                delegate.on_error(&e);
            }
        }
    }
}
