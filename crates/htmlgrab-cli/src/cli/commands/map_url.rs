//! `htmlgrab map-url <URL>...` – show where each URL would be stored.

use anyhow::Result;
use htmlgrab_core::url_model::{domain_for, PathMapper, PathStyle};

fn describe(mapper: &PathMapper, url: &str) -> String {
    let path = mapper.path_for(url);
    let path = if path.is_empty() { "(no file)" } else { path.as_str() };
    format!("{}\t{}\t{}", url, domain_for(url), path)
}

pub fn run_map_url(urls: &[String], portable: bool) -> Result<()> {
    let style = if portable {
        PathStyle::Portable
    } else {
        PathStyle::Verbatim
    };
    let mapper = PathMapper::new(style);
    for url in urls {
        println!("{}", describe(&mapper, url));
    }
    Ok(())
}
