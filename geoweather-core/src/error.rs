use thiserror::Error;

/// Fixed message for a geocode lookup that matched nothing.
pub const NO_MATCH_MESSAGE: &str = "Please enter correct city name";

/// Failure talking to the weather service. `Display` is the upstream message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Network(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Parse(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the api key; keep it out of messages.
        ApiError::Network(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Transport(#[from] ApiError),

    #[error("{}", NO_MATCH_MESSAGE)]
    NoMatch,

    #[error("Geocoding result has no coordinate")]
    MissingCoordinate,

    /// A newer resolution started before this one finished.
    #[error("Resolution superseded by a newer request")]
    Superseded,
}
