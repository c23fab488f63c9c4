//! Drives a `SyntheticSurface` at a fixed frame rate.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::surface::SyntheticSurface;

/// Background task that pushes one frame per tick until stopped.
///
/// Must be started from within a tokio runtime. Decoded-update handlers run
/// on the clock task, so a slow sink delays the next tick.
pub struct FrameClock {
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: JoinHandle<()>,
}

impl FrameClock {
    pub fn start(surface: Arc<SyntheticSurface>, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));

        let task_running = Arc::clone(&running);
        let task_ticks = Arc::clone(&ticks);
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            while task_running.load(Ordering::SeqCst) {
                timer.tick().await;
                if !task_running.load(Ordering::SeqCst) {
                    break;
                }
                surface.push_frame();
                task_ticks.fetch_add(1, Ordering::SeqCst);
            }
            log::debug!("Frame clock stopped");
        });

        log::debug!("Frame clock started at {:?} per frame", interval);
        Self {
            running,
            ticks,
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ticks delivered so far, whether or not the surface decoded a frame.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.handle.abort();
    }
}

impl Drop for FrameClock {
    fn drop(&mut self) {
        self.stop();
    }
}
