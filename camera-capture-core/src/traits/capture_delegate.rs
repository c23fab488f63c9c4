use crate::models::error::CaptureError;
use crate::models::state::CaptureState;

/// Event delegate for capture session notifications.
///
/// Invoked outside the session's internal lock, on whichever task drove the
/// transition.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called when a start or switch fails, or a frame cannot be encoded.
    fn on_error(&self, error: &CaptureError);
}
