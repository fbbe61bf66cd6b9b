/// Failures talking to the advertising platform.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Transport failure. The request URL is stripped before wrapping so
    /// query-string credentials never reach logs.
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),
    #[error("Graph API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Http(e.without_url())
    }
}
