//! Sequential fetch loop: dataset records in, HTML files out.
//!
//! For each record the target path is derived with the [`PathMapper`]; an
//! existing file means the record is done, otherwise the page is fetched
//! and written. Records are processed strictly one after another.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::dataset::UrlRecord;
use crate::page_source::{PageSession, PageSource};
use crate::storage;
use crate::url_model::PathMapper;

/// Where a URL's HTML goes, relative to the dataset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The URL has no path beyond its domain; nothing is written.
    NoPath,
    /// The mapped path would leave the dataset root (`..` or a drive prefix).
    Unsafe(String),
    File(PathBuf),
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Fetched { path: PathBuf, bytes: u64 },
    AlreadyPresent { path: PathBuf },
    NoPath,
    Unsafe,
}

/// Progress event sent after each record.
#[derive(Debug, Clone)]
pub struct FetchProgress {
    /// 1-based position of the record in the dataset.
    pub index: usize,
    pub total: usize,
    pub url: String,
    pub outcome: RecordOutcome,
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub total: usize,
    pub fetched: usize,
    pub skipped_existing: usize,
    pub skipped_no_path: usize,
    pub skipped_unsafe: usize,
    pub bytes_written: u64,
    /// The stop token was set before every record was processed.
    pub stopped: bool,
}

impl FetchSummary {
    fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Fetched { bytes, .. } => {
                self.fetched += 1;
                self.bytes_written += bytes;
            }
            RecordOutcome::AlreadyPresent { .. } => self.skipped_existing += 1,
            RecordOutcome::NoPath => self.skipped_no_path += 1,
            RecordOutcome::Unsafe => self.skipped_unsafe += 1,
        }
    }
}

impl fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} record(s): {} fetched, {} already present, {} without path",
            self.total, self.fetched, self.skipped_existing, self.skipped_no_path
        )?;
        if self.skipped_unsafe > 0 {
            write!(f, ", {} unsafe", self.skipped_unsafe)?;
        }
        if self.stopped {
            write!(f, " (stopped early)")?;
        }
        Ok(())
    }
}

/// Joins `rel` under `root` component by component. `.` and a leading `/`
/// are ignored; `..` or a platform prefix rejects the path.
fn join_under(root: &Path, rel: &str) -> Option<PathBuf> {
    let mut out = root.to_path_buf();
    let mut pushed = false;
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                pushed = true;
            }
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }
    pushed.then_some(out)
}

/// Fetches every record of a dataset into files under `root`.
pub struct Fetcher {
    root: PathBuf,
    mapper: PathMapper,
    progress: Option<mpsc::Sender<FetchProgress>>,
    stop: Option<Arc<AtomicBool>>,
}

impl Fetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mapper: PathMapper::default(),
            progress: None,
            stop: None,
        }
    }

    pub fn with_mapper(mut self, mapper: PathMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Sends a [`FetchProgress`] per record. Must be used from a blocking
    /// context (e.g. `spawn_blocking`), never from inside an async task.
    pub fn with_progress(mut self, tx: mpsc::Sender<FetchProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Checked before each record; once set, the run stops and the page
    /// source is still released. A fetch that fails after the token was set
    /// also ends the run as stopped instead of as an error.
    pub fn with_stop_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.stop = Some(token);
        self
    }

    /// Resolves the output file for `url`.
    pub fn target_for(&self, url: &str) -> Target {
        let rel = self.mapper.path_for(url);
        if rel.is_empty() {
            return Target::NoPath;
        }
        match join_under(&self.root, &rel) {
            Some(path) => Target::File(path),
            None => Target::Unsafe(rel),
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|token| token.load(Ordering::Relaxed))
    }

    /// Processes `records` in order with `source`, then releases it.
    ///
    /// The source is released on every exit path. A fetch or write failure
    /// aborts the run; pages written before it stay on disk and are skipped
    /// by the next run.
    pub fn run<S: PageSource>(&self, records: &[UrlRecord], source: S) -> Result<FetchSummary> {
        let mut session = PageSession::new(source);
        match self.run_records(records, &mut session) {
            Ok(summary) => {
                session.close().context("failed to release page source")?;
                Ok(summary)
            }
            Err(err) => {
                if let Err(close_err) = session.close() {
                    tracing::warn!("page source release failed after error: {close_err}");
                }
                Err(err)
            }
        }
    }

    fn run_records<S: PageSource>(
        &self,
        records: &[UrlRecord],
        session: &mut PageSession<S>,
    ) -> Result<FetchSummary> {
        let mut summary = FetchSummary {
            total: records.len(),
            ..Default::default()
        };

        for (i, record) in records.iter().enumerate() {
            if self.stop_requested() {
                tracing::info!(remaining = records.len() - i, "stop requested");
                summary.stopped = true;
                break;
            }

            let outcome = match self.process(record, session) {
                Ok(outcome) => outcome,
                // An interrupt can reach the browser too and fail the page in flight.
                Err(err) if self.stop_requested() => {
                    tracing::info!(url = %record.url, "fetch interrupted by stop request: {err:#}");
                    summary.stopped = true;
                    break;
                }
                Err(err) => return Err(err),
            };
            summary.record(&outcome);

            if let Some(tx) = &self.progress {
                let event = FetchProgress {
                    index: i + 1,
                    total: records.len(),
                    url: record.url.clone(),
                    outcome,
                };
                // A closed receiver only means nobody is watching.
                let _ = tx.blocking_send(event);
            }
        }

        tracing::info!(%summary, "fetch run finished");
        Ok(summary)
    }

    fn process<S: PageSource>(
        &self,
        record: &UrlRecord,
        session: &mut PageSession<S>,
    ) -> Result<RecordOutcome> {
        let url = record.url.as_str();
        let path = match self.target_for(url) {
            Target::NoPath => {
                tracing::debug!(url, "no path beyond domain, nothing to write");
                return Ok(RecordOutcome::NoPath);
            }
            Target::Unsafe(rel) => {
                tracing::warn!(url, path = %rel, "mapped path leaves the dataset root, skipping");
                return Ok(RecordOutcome::Unsafe);
            }
            Target::File(path) => path,
        };

        if path.exists() {
            tracing::debug!(url, path = %path.display(), "already fetched");
            return Ok(RecordOutcome::AlreadyPresent { path });
        }

        let html = session
            .page_source(url)
            .with_context(|| format!("failed to fetch {url}"))?;
        let bytes = storage::write_page(&path, &html)
            .with_context(|| format!("failed to save {url}"))?;
        tracing::info!(url, path = %path.display(), bytes, "fetched");

        Ok(RecordOutcome::Fetched { path, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_source::FetchError;
    use crate::url_model::PathStyle;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        fetched: Vec<String>,
        closes: u32,
    }

    /// In-memory source: returns canned HTML, fails on URLs listed in `fail_on`.
    struct FakeSource {
        calls: Rc<RefCell<Calls>>,
        fail_on: Vec<String>,
    }

    impl FakeSource {
        fn new() -> (Self, Rc<RefCell<Calls>>) {
            let calls = Rc::new(RefCell::new(Calls::default()));
            (
                FakeSource {
                    calls: Rc::clone(&calls),
                    fail_on: Vec::new(),
                },
                calls,
            )
        }

        fn failing_on(mut self, url: &str) -> Self {
            self.fail_on.push(url.to_string());
            self
        }
    }

    impl PageSource for FakeSource {
        fn page_source(&mut self, url: &str) -> Result<String, FetchError> {
            if self.fail_on.iter().any(|u| u == url) {
                return Err(FetchError::Http {
                    url: url.to_string(),
                    code: 503,
                });
            }
            self.calls.borrow_mut().fetched.push(url.to_string());
            Ok(format!("<html><body>{url}</body></html>"))
        }

        fn close(&mut self) -> Result<(), FetchError> {
            self.calls.borrow_mut().closes += 1;
            Ok(())
        }
    }

    fn records(urls: &[&str]) -> Vec<UrlRecord> {
        urls.iter()
            .map(|u| UrlRecord { url: u.to_string() })
            .collect()
    }

    const WIKI: [&str; 4] = [
        "https://en.wikipedia.org/wiki/Abbasiya",
        "http://en.wikipedia.org/wiki/Category:Jurassic_crustaceans",
        "https://en.wikipedia.org/wiki/",
        "https://en.wikipedia.org",
    ];

    #[test]
    fn writes_pages_at_mapped_paths() {
        let dir = tempfile::tempdir().unwrap();
        let (source, calls) = FakeSource::new();

        let summary = Fetcher::new(dir.path()).run(&records(&WIKI), source).unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.skipped_no_path, 1);
        assert!(!summary.stopped);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("wiki/Abbasiya.html")).unwrap(),
            "<html><body>https://en.wikipedia.org/wiki/Abbasiya</body></html>"
        );
        assert!(dir.path().join("wiki/Category:Jurassic_crustaceans.html").exists());
        assert!(dir.path().join("wiki/index.html").exists());
        assert_eq!(calls.borrow().fetched.len(), 3);
        assert_eq!(calls.borrow().closes, 1);
    }

    #[test]
    fn second_run_fetches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::new(dir.path());

        let (first, _) = FakeSource::new();
        fetcher.run(&records(&WIKI), first).unwrap();
        let before = std::fs::read_to_string(dir.path().join("wiki/Abbasiya.html")).unwrap();

        let (second, calls) = FakeSource::new();
        let summary = fetcher.run(&records(&WIKI), second).unwrap();

        assert_eq!(summary.fetched, 0);
        assert_eq!(summary.skipped_existing, 3);
        assert!(calls.borrow().fetched.is_empty());
        assert_eq!(calls.borrow().closes, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("wiki/Abbasiya.html")).unwrap(),
            before
        );
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("wiki")).unwrap();
        std::fs::write(dir.path().join("wiki/Abbasiya.html"), "kept").unwrap();
        let (source, calls) = FakeSource::new();

        Fetcher::new(dir.path())
            .run(&records(&WIKI[..1]), source)
            .unwrap();

        assert!(calls.borrow().fetched.is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("wiki/Abbasiya.html")).unwrap(),
            "kept"
        );
    }

    #[test]
    fn fetch_failure_aborts_and_keeps_written_pages() {
        let dir = tempfile::tempdir().unwrap();
        let urls = [
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/c",
        ];
        let (source, calls) = FakeSource::new();
        let source = source.failing_on("https://example.com/b");

        let err = Fetcher::new(dir.path())
            .run(&records(&urls), source)
            .unwrap_err();

        assert!(format!("{err:#}").contains("https://example.com/b"));
        assert!(dir.path().join("a.html").exists());
        assert!(!dir.path().join("b.html").exists());
        assert!(!dir.path().join("c.html").exists());
        assert_eq!(calls.borrow().fetched, ["https://example.com/a"]);
        assert_eq!(calls.borrow().closes, 1);

        // Resuming only fetches what is missing.
        let (retry, calls) = FakeSource::new();
        let summary = Fetcher::new(dir.path()).run(&records(&urls), retry).unwrap();
        assert_eq!(summary.skipped_existing, 1);
        assert_eq!(
            calls.borrow().fetched,
            ["https://example.com/b", "https://example.com/c"]
        );
    }

    #[test]
    fn stop_token_halts_before_next_record_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let token = Arc::new(AtomicBool::new(true));
        let (source, calls) = FakeSource::new();

        let summary = Fetcher::new(dir.path())
            .with_stop_token(Arc::clone(&token))
            .run(&records(&WIKI), source)
            .unwrap();

        assert!(summary.stopped);
        assert_eq!(summary.fetched, 0);
        assert!(calls.borrow().fetched.is_empty());
        assert_eq!(calls.borrow().closes, 1);
    }

    /// Sets the stop token and then fails, like a browser that received the same SIGINT.
    struct InterruptedSource {
        token: Arc<AtomicBool>,
        closes: Rc<RefCell<u32>>,
    }

    impl PageSource for InterruptedSource {
        fn page_source(&mut self, url: &str) -> Result<String, FetchError> {
            self.token.store(true, Ordering::Relaxed);
            Err(FetchError::Navigate {
                url: url.to_string(),
                source: "connection closed".into(),
            })
        }

        fn close(&mut self) -> Result<(), FetchError> {
            *self.closes.borrow_mut() += 1;
            Ok(())
        }
    }

    #[test]
    fn failure_after_stop_request_ends_run_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let token = Arc::new(AtomicBool::new(false));
        let closes = Rc::new(RefCell::new(0));
        let source = InterruptedSource {
            token: Arc::clone(&token),
            closes: Rc::clone(&closes),
        };

        let summary = Fetcher::new(dir.path())
            .with_stop_token(token)
            .run(&records(&WIKI), source)
            .unwrap();

        assert!(summary.stopped);
        assert_eq!(summary.fetched, 0);
        assert!(!dir.path().join("wiki/Abbasiya.html").exists());
        assert_eq!(*closes.borrow(), 1);
    }

    #[test]
    fn parent_segments_never_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("dataset");
        let (source, calls) = FakeSource::new();

        let summary = Fetcher::new(&root)
            .run(&records(&["https://example.com/../escape"]), source)
            .unwrap();

        assert_eq!(summary.skipped_unsafe, 1);
        assert!(calls.borrow().fetched.is_empty());
        assert!(!dir.path().join("escape.html").exists());
    }

    #[test]
    fn portable_mapper_sanitizes_written_paths() {
        let dir = tempfile::tempdir().unwrap();
        let (source, _) = FakeSource::new();

        Fetcher::new(dir.path())
            .with_mapper(PathMapper::new(PathStyle::Portable))
            .run(&records(&WIKI[1..2]), source)
            .unwrap();

        assert!(dir
            .path()
            .join("wiki/Category_Jurassic_crustaceans.html")
            .exists());
    }

    #[test]
    fn target_resolution() {
        let fetcher = Fetcher::new("/data/wiki");
        assert_eq!(fetcher.target_for("https://en.wikipedia.org"), Target::NoPath);
        assert_eq!(
            fetcher.target_for("https://en.wikipedia.org/wiki/A"),
            Target::File(PathBuf::from("/data/wiki/wiki/A.html"))
        );
        // A doubled slash yields a leading "/", which stays under the root.
        assert_eq!(
            fetcher.target_for("https://example.com//x"),
            Target::File(PathBuf::from("/data/wiki/x.html"))
        );
        assert_eq!(
            fetcher.target_for("https://example.com/a/../../b"),
            Target::Unsafe("a/../../b.html".to_string())
        );
    }

    #[test]
    fn progress_events_follow_dataset_order() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(16);
        let (source, _) = FakeSource::new();

        Fetcher::new(dir.path())
            .with_progress(tx)
            .run(&records(&WIKI), source)
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].index, 1);
        assert_eq!(events[3].total, 4);
        assert!(matches!(events[0].outcome, RecordOutcome::Fetched { .. }));
        assert_eq!(events[3].outcome, RecordOutcome::NoPath);
    }

    #[test]
    fn summary_display() {
        let summary = FetchSummary {
            total: 5,
            fetched: 2,
            skipped_existing: 1,
            skipped_no_path: 1,
            skipped_unsafe: 1,
            bytes_written: 10,
            stopped: true,
        };
        assert_eq!(
            summary.to_string(),
            "5 record(s): 2 fetched, 1 already present, 1 without path, 1 unsafe (stopped early)"
        );
    }
}
