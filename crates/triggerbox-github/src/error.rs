use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid repository '{0}': expected owner/repo")]
    InvalidRepository(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl GithubError {
    /// HTTP status of an unsuccessful response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            GithubError::Status { status, .. } => Some(*status),
            GithubError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
