//! Test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::models::device::{MediaDeviceInfo, StreamConstraints};
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::frame_sink::FrameSink;
use crate::traits::media_host::{MediaHost, MediaTrack, TrackSet};
use crate::traits::render_surface::{FrameUpdateHandler, RenderSurface, SubscriptionId};

/// Which tracks exist and how often each was stopped.
#[derive(Default)]
pub(crate) struct Ledger {
    stops: Mutex<HashMap<String, usize>>,
    devices: Mutex<HashMap<String, String>>,
}

impl Ledger {
    fn issue(&self, track_id: &str, device_id: &str) {
        self.stops.lock().insert(track_id.to_string(), 0);
        self.devices.lock().insert(track_id.to_string(), device_id.to_string());
    }

    fn stop(&self, track_id: &str) {
        *self.stops.lock().entry(track_id.to_string()).or_default() += 1;
    }
}

struct MockTrack {
    id: String,
    ledger: Arc<Ledger>,
}

impl MediaTrack for MockTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.ledger.stop(&self.id);
        Ok(())
    }
}

/// Scriptable `MediaHost`: inventory, per-device failures and held acquisitions.
pub(crate) struct MockHost {
    inventory: Mutex<Vec<MediaDeviceInfo>>,
    deny_enumeration: Mutex<bool>,
    failures: Mutex<HashMap<String, CaptureError>>,
    fail_all: Mutex<Option<CaptureError>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    requests: Mutex<Vec<StreamConstraints>>,
    ledger: Arc<Ledger>,
    enumerations: AtomicUsize,
    next_track: AtomicU64,
}

impl MockHost {
    pub fn with_inventory(inventory: Vec<MediaDeviceInfo>) -> Arc<Self> {
        Arc::new(Self {
            inventory: Mutex::new(inventory),
            deny_enumeration: Mutex::new(false),
            failures: Mutex::new(HashMap::new()),
            fail_all: Mutex::new(None),
            gates: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            ledger: Arc::new(Ledger::default()),
            enumerations: AtomicUsize::new(0),
            next_track: AtomicU64::new(0),
        })
    }

    /// Host with one video device per `(id, label)` pair.
    pub fn with_cameras(cameras: &[(&str, &str)]) -> Arc<Self> {
        Self::with_inventory(
            cameras
                .iter()
                .map(|(id, label)| MediaDeviceInfo::video(*id, *label))
                .collect(),
        )
    }

    pub fn set_inventory(&self, inventory: Vec<MediaDeviceInfo>) {
        *self.inventory.lock() = inventory;
    }

    pub fn deny_enumeration(&self) {
        *self.deny_enumeration.lock() = true;
    }

    pub fn fail_device(&self, device_id: &str, error: CaptureError) {
        self.failures.lock().insert(device_id.to_string(), error);
    }

    pub fn fail_all(&self, error: CaptureError) {
        *self.fail_all.lock() = Some(error);
    }

    /// Make the next acquisition of `device_id` wait until the sender fires.
    pub fn hold(&self, device_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(device_id.to_string(), rx);
        tx
    }

    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    /// Successful acquisitions so far.
    pub fn acquisitions(&self) -> usize {
        self.ledger.stops.lock().len()
    }

    /// Constraints of every acquisition attempt, in order.
    pub fn requests(&self) -> Vec<StreamConstraints> {
        self.requests.lock().clone()
    }

    pub fn live_tracks(&self) -> usize {
        self.ledger.stops.lock().values().filter(|&&n| n == 0).count()
    }

    /// Devices whose tracks are still live.
    pub fn live_devices(&self) -> Vec<String> {
        let stops = self.ledger.stops.lock();
        let devices = self.ledger.devices.lock();
        let mut live: Vec<String> = stops
            .iter()
            .filter(|(_, n)| **n == 0)
            .filter_map(|(track, _)| devices.get(track).cloned())
            .collect();
        live.sort();
        live
    }

    /// Largest number of stop calls any single track received.
    pub fn max_stops_per_track(&self) -> usize {
        self.ledger.stops.lock().values().copied().max().unwrap_or(0)
    }
}

#[async_trait]
impl MediaHost for MockHost {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, CaptureError> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if *self.deny_enumeration.lock() {
            return Err(CaptureError::PermissionDenied);
        }
        Ok(self.inventory.lock().clone())
    }

    async fn acquire_tracks(&self, constraints: &StreamConstraints) -> Result<TrackSet, CaptureError> {
        self.requests.lock().push(constraints.clone());
        let device_id = constraints.device_id().unwrap_or("default").to_string();

        let gate = self.gates.lock().remove(&device_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if let Some(error) = self.fail_all.lock().clone() {
            return Err(error);
        }
        if let Some(error) = self.failures.lock().get(&device_id).cloned() {
            return Err(error);
        }

        let n = self.next_track.fetch_add(1, Ordering::SeqCst);
        let track_id = format!("{}-video{}", device_id, n);
        self.ledger.issue(&track_id, &device_id);
        let track = MockTrack {
            id: track_id,
            ledger: Arc::clone(&self.ledger),
        };
        Ok(TrackSet::new(device_id, vec![Box::new(track)]))
    }
}

#[derive(Default)]
struct SurfaceState {
    source: Option<String>,
    playing: bool,
    has_frame: bool,
    handlers: Vec<(SubscriptionId, FrameUpdateHandler)>,
    next_id: u64,
    pauses: usize,
    detaches: usize,
    fail_play: bool,
    play_gate: Option<oneshot::Receiver<()>>,
}

/// Blocks one draw until released; see `MockSurface::hold_draw`.
pub(crate) struct DrawGate {
    pub entered: mpsc::Receiver<()>,
    pub release: mpsc::Sender<()>,
}

/// `RenderSurface` whose decoded updates are fired by hand.
#[derive(Default)]
pub(crate) struct MockSurface {
    state: Mutex<SurfaceState>,
    draw_gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
}

impl MockSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_play(&self) {
        self.state.lock().fail_play = true;
    }

    /// Make the next `play` wait until the sender fires.
    pub fn hold_play(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().play_gate = Some(rx);
        tx
    }

    /// Make the next `draw_current_frame` signal `entered` and then block
    /// until `release` fires.
    pub fn hold_draw(&self) -> DrawGate {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.draw_gate.lock() = Some((entered_tx, release_rx));
        DrawGate {
            entered: entered_rx,
            release: release_tx,
        }
    }

    /// Simulate the media pipeline decoding a frame. Returns how many handlers ran.
    pub fn decode_frame(&self) -> usize {
        let handlers: Vec<FrameUpdateHandler> = {
            let mut s = self.state.lock();
            if s.source.is_some() && s.playing {
                s.has_frame = true;
            }
            s.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        for handler in &handlers {
            handler();
        }
        handlers.len()
    }

    pub fn handler_count(&self) -> usize {
        self.state.lock().handlers.len()
    }

    pub fn source(&self) -> Option<String> {
        self.state.lock().source.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn pauses(&self) -> usize {
        self.state.lock().pauses
    }

    pub fn detaches(&self) -> usize {
        self.state.lock().detaches
    }
}

#[async_trait]
impl RenderSurface for MockSurface {
    fn attach(&self, tracks: &TrackSet) {
        let mut s = self.state.lock();
        s.source = Some(tracks.device_id().to_string());
        s.playing = false;
        s.has_frame = false;
    }

    fn detach(&self) {
        let mut s = self.state.lock();
        s.source = None;
        s.playing = false;
        s.detaches += 1;
    }

    async fn play(&self) -> Result<(), CaptureError> {
        let gate = self.state.lock().play_gate.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let mut s = self.state.lock();
        if s.fail_play || s.source.is_none() {
            return Err(CaptureError::Unknown("nothing to play".into()));
        }
        s.playing = true;
        Ok(())
    }

    fn pause(&self) {
        let mut s = self.state.lock();
        s.playing = false;
        s.pauses += 1;
    }

    fn subscribe_decoded(&self, handler: FrameUpdateHandler) -> SubscriptionId {
        let mut s = self.state.lock();
        s.next_id += 1;
        let id = SubscriptionId(s.next_id);
        s.handlers.push((id, handler));
        id
    }

    fn unsubscribe_decoded(&self, id: SubscriptionId) {
        self.state.lock().handlers.retain(|(sub, _)| *sub != id);
    }

    fn draw_current_frame(&self, target: &mut RgbaImage) -> bool {
        let gate = self.draw_gate.lock().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.recv();
        }
        if !self.state.lock().has_frame {
            return false;
        }
        for pixel in target.pixels_mut() {
            *pixel = Rgba([32, 96, 160, 255]);
        }
        true
    }
}

/// Sink that records every payload it receives.
#[derive(Default)]
pub(crate) struct RecordingSink {
    frames: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().clone()
    }
}

impl FrameSink for RecordingSink {
    fn on_frame(&self, payload: &str) {
        self.frames.lock().push(payload.to_string());
    }
}

/// Delegate that records state changes and errors.
#[derive(Default)]
pub(crate) struct RecordingDelegate {
    states: Mutex<Vec<CaptureState>>,
    errors: Mutex<Vec<CaptureError>>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states(&self) -> Vec<CaptureState> {
        self.states.lock().clone()
    }

    pub fn errors(&self) -> Vec<CaptureError> {
        self.errors.lock().clone()
    }
}

impl CaptureDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        self.states.lock().push(state.clone());
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }
}
