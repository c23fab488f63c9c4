pub mod camera_control;
pub mod capture_delegate;
pub mod frame_sink;
pub mod media_host;
pub mod render_surface;
