//! URL modeling and output path derivation.
//!
//! Maps a page URL to the relative file path its HTML is stored under:
//! the scheme and domain are dropped, the remaining segments are kept, and
//! either `.html` is appended or a trailing `/` becomes `index.html`.

mod path;
mod sanitize;

use serde::{Deserialize, Serialize};

pub use path::{domain_for, path_for, HTML_SUFFIX, INDEX_FILE};
pub use sanitize::sanitize_segment;

/// How path segments are carried over from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    /// Segments are copied unchanged (`Category:Foo` stays `Category:Foo`).
    #[default]
    Verbatim,
    /// Each segment goes through [`sanitize_segment`] first.
    Portable,
}

/// URL to relative path mapper. Stateless; cheap to copy and share.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMapper {
    style: PathStyle,
}

impl PathMapper {
    pub fn new(style: PathStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    /// Relative path for `url`, or an empty string when the URL has no path
    /// beyond its domain.
    pub fn path_for(&self, url: &str) -> String {
        path::map_path(url, self.style)
    }
}
