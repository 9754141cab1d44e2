//! Plain HTTP page source (libcurl GET, no script execution).
//!
//! Returns the HTML exactly as served. Suitable for sites that render
//! server-side, and for tests that cannot start a browser.

use curl::easy::Easy;
use std::time::Duration;

use super::{check_url, FetchError, PageSource};
use crate::config::HttpConfig;

/// One reused curl handle, so connections are kept alive between pages.
pub struct HttpPageSource {
    easy: Easy,
}

impl HttpPageSource {
    pub fn new(cfg: &HttpConfig) -> Result<Self, FetchError> {
        let mut easy = Easy::new();
        Self::configure(&mut easy, cfg).map_err(FetchError::Client)?;
        Ok(Self { easy })
    }

    fn configure(easy: &mut Easy, cfg: &HttpConfig) -> Result<(), curl::Error> {
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))?;
        easy.timeout(Duration::from_secs(cfg.timeout_secs))?;
        // Empty string: accept every encoding libcurl can decode.
        easy.accept_encoding("")?;
        if let Some(agent) = &cfg.user_agent {
            easy.useragent(agent)?;
        }
        Ok(())
    }
}

impl PageSource for HttpPageSource {
    fn page_source(&mut self, url: &str) -> Result<String, FetchError> {
        check_url(url)?;
        let transfer_err = |source: curl::Error| FetchError::Transfer {
            url: url.to_string(),
            source,
        };

        self.easy.url(url).map_err(&transfer_err)?;
        self.easy.get(true).map_err(&transfer_err)?;

        let mut body = Vec::new();
        {
            let mut transfer = self.easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(&transfer_err)?;
            transfer.perform().map_err(&transfer_err)?;
        }

        let code = self.easy.response_code().map_err(&transfer_err)?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http {
                url: url.to_string(),
                code,
            });
        }

        tracing::debug!(url, code, bytes = body.len(), "GET complete");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
