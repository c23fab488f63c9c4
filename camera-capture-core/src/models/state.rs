use std::fmt;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// uninitialized → initialized → streaming ⇄ idle
///        └──────────────┴────────────┴───────┴──→ disposed (terminal)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Uninitialized,
    Initialized,
    Streaming { device_id: String },
    Idle,
    Disposed,
}

impl CaptureState {
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming { .. })
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed)
    }

    /// Whether `initialize` has bound a surface that has not been torn down.
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Initialized | Self::Streaming { .. } | Self::Idle)
    }

    /// The device currently streaming, if any.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::Streaming { device_id } => Some(device_id),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Streaming { .. } => "streaming",
            Self::Idle => "idle",
            Self::Disposed => "disposed",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming { device_id } => write!(f, "streaming({})", device_id),
            other => f.write_str(other.name()),
        }
    }
}
