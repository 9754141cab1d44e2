//! RAII guard that releases a page source exactly once.

use super::{FetchError, PageSource};

/// Owns a page source for the length of a run. `close` releases it and
/// reports the outcome; dropping an unclosed session releases it too
/// (early return, `?`, panic unwind), logging any failure.
pub struct PageSession<S: PageSource> {
    source: S,
    released: bool,
}

impl<S: PageSource> PageSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            released: false,
        }
    }

    pub fn page_source(&mut self, url: &str) -> Result<String, FetchError> {
        self.source.page_source(url)
    }

    /// Releases the source and returns the result of doing so.
    pub fn close(mut self) -> Result<(), FetchError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), FetchError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        tracing::debug!("releasing page source");
        self.source.close()
    }
}

impl<S: PageSource> Drop for PageSession<S> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("page source release failed: {e}");
        }
    }
}
