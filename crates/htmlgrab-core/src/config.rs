use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dataset::{DEFAULT_DATASET_FILE, DEFAULT_URL_COLUMN};
use crate::url_model::PathStyle;

/// Page source backend: a real browser (rendered DOM) or a plain HTTP GET (raw HTML).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Chrome,
    Http,
}

/// Headless Chrome settings (`[chrome]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    /// Run without a visible window.
    pub headless: bool,
    /// Browser executable; None = let headless_chrome locate one.
    pub binary: Option<PathBuf>,
    /// Per-page navigation timeout in seconds.
    pub navigation_timeout_secs: u64,
    /// Extra wait after navigation for scripts to finish rendering, in milliseconds.
    pub settle_millis: u64,
    /// Browser is shut down after this many idle seconds.
    pub idle_timeout_secs: u64,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            binary: None,
            navigation_timeout_secs: 60,
            settle_millis: 0,
            idle_timeout_secs: 300,
        }
    }
}

/// Plain HTTP settings (`[http]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 120,
            user_agent: None,
        }
    }
}

/// Global configuration loaded from `~/.config/htmlgrab/config.toml`.
/// Every key is optional; missing keys take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlgrabConfig {
    /// Dataset file name inside the dataset directory.
    pub dataset_file: String,
    /// Header of the column holding the URLs.
    pub url_column: String,
    pub backend: Backend,
    /// "verbatim" keeps URL segments as is; "portable" sanitizes them.
    pub path_style: PathStyle,
    pub chrome: ChromeConfig,
    pub http: HttpConfig,
}

impl Default for HtmlgrabConfig {
    fn default() -> Self {
        Self {
            dataset_file: DEFAULT_DATASET_FILE.to_string(),
            url_column: DEFAULT_URL_COLUMN.to_string(),
            backend: Backend::default(),
            path_style: PathStyle::default(),
            chrome: ChromeConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("htmlgrab")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from `path`, writing a default file there if none exists.
pub fn load_or_init_at(path: &Path) -> Result<HtmlgrabConfig> {
    if !path.exists() {
        let default_cfg = HtmlgrabConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("failed to write default config {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: HtmlgrabConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HtmlgrabConfig> {
    load_or_init_at(&config_path()?)
}
