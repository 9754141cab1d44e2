//! `htmlgrab <DATASET_DIR>` – fetch every URL of a dataset.

use anyhow::{Context, Result};
use htmlgrab_core::config::HtmlgrabConfig;
use htmlgrab_core::dataset;
use htmlgrab_core::fetcher::{FetchProgress, FetchSummary, Fetcher, RecordOutcome};
use htmlgrab_core::page_source;
use htmlgrab_core::url_model::PathMapper;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// First Ctrl-C sets `stop`; the loop finishes the current page, then the
/// browser is released. A second Ctrl-C exits immediately.
fn spawn_interrupt_listener(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("Interrupted; stopping after the current page (Ctrl-C again to abort).");
        stop.store(true, Ordering::Relaxed);
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

fn print_progress(p: &FetchProgress) {
    match &p.outcome {
        RecordOutcome::Fetched { path, bytes } => {
            println!("[{}/{}] {} -> {} ({} bytes)", p.index, p.total, p.url, path.display(), bytes);
        }
        RecordOutcome::Unsafe => {
            println!("[{}/{}] {} skipped: path leaves the dataset directory", p.index, p.total, p.url);
        }
        RecordOutcome::AlreadyPresent { .. } | RecordOutcome::NoPath => {}
    }
}

pub async fn run_fetch(cfg: HtmlgrabConfig, dataset_dir: PathBuf) -> Result<FetchSummary> {
    let stop = Arc::new(AtomicBool::new(false));
    spawn_interrupt_listener(Arc::clone(&stop));

    let summary = fetch_dataset(cfg, dataset_dir, stop, print_progress).await?;
    println!("{summary}");
    Ok(summary)
}

/// Loads the dataset and runs the blocking fetch loop, handing each progress
/// event to `on_progress`. Every event sent before a failure is delivered
/// before the failure is returned.
pub async fn fetch_dataset<F>(
    cfg: HtmlgrabConfig,
    dataset_dir: PathBuf,
    stop: Arc<AtomicBool>,
    mut on_progress: F,
) -> Result<FetchSummary>
where
    F: FnMut(&FetchProgress) + Send + 'static,
{
    if !dataset_dir.is_dir() {
        anyhow::bail!("dataset directory not found: {}", dataset_dir.display());
    }
    let records = dataset::load_dataset(&dataset_dir, &cfg.dataset_file, &cfg.url_column)?;
    tracing::info!(
        dir = %dataset_dir.display(),
        records = records.len(),
        backend = ?cfg.backend,
        "starting fetch run"
    );

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<FetchProgress>(16);
    let progress_handle = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            on_progress(&progress);
        }
    });

    let fetcher = Fetcher::new(dataset_dir)
        .with_mapper(PathMapper::new(cfg.path_style))
        .with_progress(progress_tx)
        .with_stop_token(stop);

    // The browser and the fetch loop block; keep them off the async workers.
    let result = tokio::task::spawn_blocking(move || -> Result<FetchSummary> {
        let source = page_source::open_backend(cfg.backend, &cfg)?;
        fetcher.run(&records, source)
    })
    .await;

    // The sender is dropped with the fetcher, so the printer drains and ends.
    let _ = progress_handle.await;

    result.context("fetch task failed")?
}
