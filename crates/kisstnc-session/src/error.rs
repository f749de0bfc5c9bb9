use crate::state::SessionState;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (opening or cloning the link).
    #[error("transport error: {0}")]
    Transport(#[from] kisstnc_transport::TransportError),

    /// Frame-level error while reading or writing.
    #[error("frame error: {0}")]
    Frame(#[from] kisstnc_frame::FrameError),

    /// The operation is not valid in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// A TNC command could not be written; a connect sequence stops at the first failure.
    #[error("writing TNC command {command:?} failed: {source}")]
    ConfigurationFailed {
        command: &'static str,
        #[source]
        source: kisstnc_frame::FrameError,
    },

    /// The session lost its link.
    #[error("session disconnected: {0}")]
    Disconnected(String),
}

impl SessionError {
    /// True when the failure came from the link itself rather than from misuse.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Frame(_)
                | Self::ConfigurationFailed { .. }
                | Self::Disconnected(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
