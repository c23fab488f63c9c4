/// Consumer of emitted still frames.
///
/// Receives one encoded payload (`data:image/png;base64,...`) per emitted
/// frame. Called synchronously from the surface's decoded-frame handler, so a
/// slow sink directly lowers the emission rate. Stopping the session waits
/// for a call in progress, so a sink may call back into the session from its
/// own thread but must not block on another thread that does.
pub trait FrameSink: Send + Sync {
    fn on_frame(&self, payload: &str);
}

impl<F> FrameSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_frame(&self, payload: &str) {
        self(payload)
    }
}
