//! Page source error type.

/// Error reported by a browser driver (headless_chrome reports `anyhow::Error`).
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to start, use, or release a page source. Not retried; a failed
/// fetch aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("not an absolute URL: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to start browser")]
    Launch(#[source] DriverError),

    #[error("failed to load {url}")]
    Navigate {
        url: String,
        #[source]
        source: DriverError,
    },

    #[error("failed to configure HTTP client")]
    Client(#[source] curl::Error),

    #[error("request for {url} failed")]
    Transfer {
        url: String,
        #[source]
        source: curl::Error,
    },

    #[error("GET {url} returned HTTP {code}")]
    Http { url: String, code: u32 },

    #[error("failed to release page source")]
    Close(#[source] DriverError),
}
