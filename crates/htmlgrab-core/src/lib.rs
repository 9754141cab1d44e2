pub mod config;
pub mod logging;

pub mod dataset;
pub mod fetcher;
pub mod page_source;
pub mod storage;
pub mod url_model;
