use crate::endpoint::Endpoint;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Network {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: Endpoint },

    #[error("error decoding JSON response from {endpoint}: {source}")]
    MalformedResponse {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected API response code from {endpoint}: {code}, reason: {message}")]
    Api {
        endpoint: Endpoint,
        code: i64,
        message: String,
    },
}

impl ApiError {
    pub fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn network(endpoint: Endpoint, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Network { endpoint, source }
        }
    }

    pub fn malformed(endpoint: Endpoint, source: serde_json::Error) -> Self {
        Self::MalformedResponse { endpoint, source }
    }

    /// Whether the request was cut short by a deadline or client timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Short, stable name for the error class, suitable for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "uri",
            Self::Client(_) => "client",
            Self::Network { .. } | Self::Timeout { .. } => "network",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Api { .. } => "api",
        }
    }
}
