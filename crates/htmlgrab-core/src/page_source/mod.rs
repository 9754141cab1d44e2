//! Page sources: the collaborator that turns a URL into page HTML.
//!
//! A source is an expensive, stateful resource (a browser process, an HTTP
//! connection pool). The fetcher acquires one per run, uses it serially, and
//! releases it exactly once through [`PageSession`].

mod chrome;
mod error;
mod http;
mod session;

pub use chrome::ChromePageSource;
pub use error::{DriverError, FetchError};
pub use http::HttpPageSource;
pub use session::PageSession;

use crate::config::{Backend, HtmlgrabConfig};

/// Retrieves page HTML for a URL.
pub trait PageSource {
    /// Loads `url` and returns the page source. Blocks until the page is
    /// loaded or the backend's own timeout fires.
    fn page_source(&mut self, url: &str) -> Result<String, FetchError>;

    /// Releases the underlying resource. Called once, at the end of a run.
    fn close(&mut self) -> Result<(), FetchError> {
        Ok(())
    }
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn page_source(&mut self, url: &str) -> Result<String, FetchError> {
        (**self).page_source(url)
    }

    fn close(&mut self) -> Result<(), FetchError> {
        (**self).close()
    }
}

/// Rejects anything that is not an absolute URL before it reaches a backend.
pub(crate) fn check_url(url: &str) -> Result<(), FetchError> {
    url::Url::parse(url)
        .map(|_| ())
        .map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })
}

/// Opens the page source selected by `backend`, configured from `cfg`.
pub fn open_backend(backend: Backend, cfg: &HtmlgrabConfig) -> Result<Box<dyn PageSource>, FetchError> {
    tracing::debug!(?backend, "opening page source");
    Ok(match backend {
        Backend::Chrome => Box::new(ChromePageSource::launch(&cfg.chrome)?),
        Backend::Http => Box::new(HttpPageSource::new(&cfg.http)?),
    })
}
