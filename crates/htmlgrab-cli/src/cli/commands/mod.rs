//! CLI command handlers, one per file.

mod completions;
mod fetch;
mod map_url;

pub use completions::{run_completions, run_man};
pub use fetch::run_fetch;
#[cfg(test)]
pub use fetch::fetch_dataset;
pub use map_url::run_map_url;
