use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::CaptureConfiguration;
use crate::models::device::DeviceDescriptor;
use crate::models::error::CaptureError;
use crate::traits::camera_control::CameraControl;
use crate::traits::frame_sink::FrameSink;
use crate::traits::media_host::MediaHost;
use crate::traits::render_surface::RenderSurface;

use super::capture::CaptureSession;

/// Callback run once, after the first successful `CameraView::reload`.
pub type RenderedHook = Arc<dyn Fn() + Send + Sync + 'static>;

/// UI-facing camera component: a session plus the configuration it is
/// (re)initialized from.
///
/// Remembers the camera the user last switched to successfully, so a plain
/// `start(None)` or a reload with `autostart` resumes on that camera.
pub struct CameraView<H: MediaHost> {
    session: CaptureSession<H>,
    config: Mutex<CaptureConfiguration>,
    on_rendered: Mutex<Option<RenderedHook>>,
    rendered: AtomicBool,
}

impl<H: MediaHost> CameraView<H> {
    pub fn new(host: Arc<H>, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(Self {
            session: CaptureSession::new(host),
            config: Mutex::new(config),
            on_rendered: Mutex::new(None),
            rendered: AtomicBool::new(false),
        })
    }

    pub fn session(&self) -> &CaptureSession<H> {
        &self.session
    }

    pub fn config(&self) -> CaptureConfiguration {
        self.config.lock().clone()
    }

    /// Camera used when `start` is called without an explicit id.
    pub fn default_device(&self) -> Option<String> {
        self.config.lock().device_id.clone()
    }

    /// Register the hook run after the first successful reload.
    pub fn set_on_rendered(&self, hook: RenderedHook) {
        *self.on_rendered.lock() = Some(hook);
    }

    /// Bind a (new) surface and sink, starting the default camera when
    /// `autostart` is set.
    pub async fn reload(
        &self,
        surface: Arc<dyn RenderSurface>,
        sink: Option<Arc<dyn FrameSink>>,
    ) -> Result<(), CaptureError> {
        let config = self.config();
        self.session.initialize(surface, &config, sink).await?;
        if config.autostart {
            log::debug!("Session {}: autostart", self.session.id());
            CameraControl::start(self, None).await?;
        }

        if !self.rendered.swap(true, Ordering::SeqCst) {
            let hook = self.on_rendered.lock().clone();
            if let Some(hook) = hook {
                hook();
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<H: MediaHost> CameraControl for CameraView<H> {
    async fn start(&self, device_id: Option<&str>) -> Result<(), CaptureError> {
        let device_id = device_id.map(str::to_owned).or_else(|| self.default_device());
        self.session.start(device_id.as_deref()).await
    }

    async fn stop(&self) -> Result<(), CaptureError> {
        self.session.stop().await
    }

    async fn change_device(&self, device_id: &str) -> Result<(), CaptureError> {
        self.session.change_device(device_id).await?;
        self.config.lock().device_id = Some(device_id.to_string());
        Ok(())
    }

    async fn camera_access(&self) -> bool {
        self.session.camera_access().await
    }

    async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        self.session.list_devices().await
    }

    async fn current_frame(&self) -> Result<Option<String>, CaptureError> {
        self.session.current_frame().await
    }

    async fn dispose(&self) {
        self.session.dispose().await
    }
}
