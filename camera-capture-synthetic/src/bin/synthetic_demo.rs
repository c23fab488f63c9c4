//! Runs a camera view against the synthetic backend and logs emitted frames.
//!
//! Usage: `synthetic-demo [config.json]`. Set `RUST_LOG=debug` for state
//! transitions.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use camera_capture_core::{CameraControl, CameraView, CaptureConfiguration, CaptureError, FrameSink};
use camera_capture_synthetic::{FrameClock, SyntheticHost, SyntheticSurface};

const FRAME_INTERVAL: Duration = Duration::from_millis(100);
const RUN_PER_CAMERA: Duration = Duration::from_millis(500);

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CaptureError> {
    let config = match std::env::args().nth(1) {
        Some(path) => CaptureConfiguration::load(Path::new(&path))?,
        None => CaptureConfiguration::default(),
    };
    log::info!("Using {}x{}", config.width, config.height);

    let host = SyntheticHost::with_cameras(&[
        ("synthetic-front", "Front Camera"),
        ("synthetic-back", "Back Camera"),
    ]);
    let surface = SyntheticSurface::new(config.width, config.height);
    let view = CameraView::new(Arc::clone(&host), config)?;

    let emitted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&emitted);
    let sink: Arc<dyn FrameSink> = Arc::new(move |payload: &str| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!("Frame {}: {} bytes", n, payload.len());
    });

    if !view.camera_access().await {
        return Err(CaptureError::PermissionDenied);
    }
    let devices = view.list_devices().await?;
    for device in &devices {
        log::info!("Camera {} ({})", device.device_id, device.label);
    }

    view.reload(surface.clone(), Some(Arc::clone(&sink))).await?;
    if !view.session().state().is_streaming() {
        view.start(None).await?;
    }

    let clock = FrameClock::start(Arc::clone(&surface), FRAME_INTERVAL);
    tokio::time::sleep(RUN_PER_CAMERA).await;

    if let Some(next) = devices.get(1) {
        view.change_device(&next.device_id).await?;
        tokio::time::sleep(RUN_PER_CAMERA).await;
    }

    if let Some(still) = view.current_frame().await? {
        log::info!("Snapshot: {} bytes", still.len());
    }

    view.stop().await?;
    clock.stop();
    view.dispose().await;

    log::info!(
        "Done: {} frame(s) emitted, {} track(s) still live, {:?}",
        emitted.load(Ordering::SeqCst),
        host.ledger().live(),
        view.session().diagnostics()
    );
    Ok(())
}
