/// Result alias used across the crate.
pub type CardResult<T> = Result<T, CardError>;

/// Why a fetch of a remote asset failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchFailure {
    /// The fetch did not complete within the configured timeout.
    Timeout,
    /// The remote end could not be reached (connection refused, DNS, IO).
    Unreachable,
    /// The asset does not exist.
    NotFound,
    /// The remote answered with a non-2xx status.
    Status(u16),
}

impl FetchFailure {
    fn is_transient(self) -> bool {
        match self {
            Self::Timeout | Self::Unreachable => true,
            Self::NotFound => false,
            Self::Status(code) => code >= 500 || code == 408 || code == 429,
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Unreachable => f.write_str("unreachable"),
            Self::NotFound => f.write_str("not found"),
            Self::Status(code) => write!(f, "status {code}"),
        }
    }
}

/// Coarse classification callers use to decide between retry and reject-and-report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The payload or its assets are wrong; retrying the same request fails again.
    Input,
    /// A network condition that may clear on retry.
    Transient,
    /// A failure inside the compositor itself.
    Internal,
}

#[derive(thiserror::Error, Debug)]
pub enum CardError {
    #[error("fetch error ({failure}) for '{url}': {reason}")]
    Fetch {
        url: String,
        failure: FetchFailure,
        reason: String,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("mask parse error: {0}")]
    MaskParse(String),

    #[error("payload error: {0}")]
    Payload(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("render cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardError {
    pub fn fetch(url: impl Into<String>, failure: FetchFailure, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            failure,
            reason: reason.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn mask_parse(msg: impl Into<String>) -> Self {
        Self::MaskParse(msg.into())
    }

    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Fetch { failure, .. } if failure.is_transient() => ErrorClass::Transient,
            Self::Fetch { .. }
            | Self::Decode(_)
            | Self::Geometry(_)
            | Self::MaskParse(_)
            | Self::Payload(_) => ErrorClass::Input,
            Self::Encode(_) | Self::Render(_) | Self::Cancelled | Self::Other(_) => {
                ErrorClass::Internal
            }
        }
    }

    /// `true` when the same request may succeed if issued again.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
