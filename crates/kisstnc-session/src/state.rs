use std::fmt;

/// Lifecycle of a TNC session.
///
/// `Disconnected -> Connecting -> Configured -> Active`, with any transport
/// failure or [`disconnect`](crate::Session::disconnect) returning to `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No link is open.
    #[default]
    Disconnected,
    /// Link open, configuration commands in flight.
    Connecting,
    /// TNC configured but not exchanging KISS data frames.
    Configured,
    /// TNC in KISS mode; data frames flow both ways.
    Active,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Configured => "configured",
            Self::Active => "active",
        }
    }

    /// True while a link is held open.
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
