//! Parallel file parsing for directory loads.
//!
//! This module sits underneath [`crate::ingestion`] and provides:
//!
//! - Parallel per-file parsing on a dedicated rayon pool
//! - A bound on how many files are parsed at once (memory backpressure)
//! - Real-time metrics + observer hooks for monitoring
//!
//! Output is identical to a sequential load: results are collected in file order before they are
//! concatenated.

mod observer;
mod semaphore;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;
use serde::Deserialize;

use crate::config::OdColumns;
use crate::error::IngestionResult;
use crate::ingestion::unified::assemble;
use crate::ingestion::{discover_files, ingest_file, IngestionFormat, LoadOptions};
use crate::types::{RawRecord, UnifiedTable};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, TracingExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on files parsed concurrently.
    ///
    /// Every in-flight file holds its parsed rows in memory, so this bounds peak memory on top of
    /// `num_threads`.
    pub max_in_flight_files: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = available_threads();
        Self {
            num_threads: Some(n),
            max_in_flight_files: n,
        }
    }
}

/// Parses many OD files in parallel.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    ///
    /// Zero values for `num_threads` or `max_in_flight_files` are raised to one.
    pub fn new(opts: ExecutionOptions) -> Self {
        let n_threads = opts.num_threads.unwrap_or_else(available_threads).max(1);
        let opts = ExecutionOptions {
            num_threads: Some(n_threads),
            max_in_flight_files: opts.max_in_flight_files.max(1),
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .expect("failed to build rayon thread pool");

        Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Load a directory like [`crate::ingestion::load_with_options`], parsing files in parallel.
    ///
    /// `options.execution` is ignored; this engine's options apply.
    pub fn load_dir(&self, directory: impl AsRef<Path>, options: &LoadOptions) -> UnifiedTable {
        let files = discover_files(directory.as_ref(), options);
        let results = self.ingest_files(&files, &options.columns);
        assemble(files, results, options)
    }

    /// Parse `files` in parallel. Results are returned in input order.
    pub fn ingest_files(
        &self,
        files: &[(PathBuf, IngestionFormat)],
        columns: &OdColumns,
    ) -> Vec<IngestionResult<Vec<RawRecord>>> {
        self.pool.install(|| self.ingest_files_impl(files, columns))
    }

    fn ingest_files_impl(
        &self,
        files: &[(PathBuf, IngestionFormat)],
        columns: &OdColumns,
    ) -> Vec<IngestionResult<Vec<RawRecord>>> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted { files: files.len() });

        let sem = Semaphore::new(self.opts.max_in_flight_files);

        let results: Vec<IngestionResult<Vec<RawRecord>>> = files
            .par_iter()
            .map(|(path, fmt)| {
                let permit = sem.acquire();
                if permit.waited > Duration::ZERO {
                    self.metrics.on_throttle_wait(permit.waited);
                    self.emit(ExecutionEvent::ThrottleWaited {
                        duration: permit.waited,
                    });
                }

                self.metrics.on_file_start();
                self.emit(ExecutionEvent::FileStarted { path: path.clone() });

                let result = ingest_file(path, columns, Some(*fmt));
                let rows = result.as_ref().ok().map(Vec::len);

                self.emit(ExecutionEvent::FileFinished {
                    path: path.clone(),
                    rows,
                });
                self.metrics.on_file_end(rows);
                drop(permit);
                result
            })
            .collect();

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        results
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn available_threads() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::{ExecutionEngine, ExecutionOptions};
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::execution::{ExecutionEvent, ExecutionObserver, TracingExecutionObserver};
    use crate::ingestion::{load_with_options, LoadOptions};

    fn write_month(dir: &Path, name: &str, rows: usize) {
        let mut text = String::from("date,hour,entry_station,exit_station,passenger_count\n");
        for i in 0..rows {
            text.push_str(&format!("2024-01-01,{},A,B,{}\n", i % 24, i + 1));
        }
        fs::write(dir.join(name), text).unwrap();
    }

    fn scratch_dir(files: usize) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..files {
            write_month(dir.path(), &format!("2024{:02}.csv", i + 1), 5 + i);
        }
        fs::write(dir.path().join("broken.csv"), "date,hour\n2024-01-01,1\n").unwrap();
        dir
    }

    struct ConcurrencyObserver {
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl ExecutionObserver for ConcurrencyObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            match event {
                ExecutionEvent::FileStarted { .. } => {
                    let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                    let _ = self.max_active.fetch_max(now, Ordering::SeqCst);
                }
                ExecutionEvent::FileFinished { .. } => {
                    let _ = self.active.fetch_sub(1, Ordering::SeqCst);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn parallel_load_matches_sequential_load() {
        let dir = scratch_dir(8);
        let sequential = load_with_options(dir.path(), &LoadOptions::default());

        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(4),
            max_in_flight_files: 4,
        });
        let parallel = engine.load_dir(dir.path(), &LoadOptions::default());

        assert_eq!(parallel, sequential);
        assert_eq!(parallel.report.loaded.len(), 8);
        assert_eq!(parallel.report.skipped.len(), 1);
    }

    #[test]
    fn max_in_flight_files_throttles_concurrency() {
        let dir = scratch_dir(12);
        let observer = Arc::new(ConcurrencyObserver {
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        });
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(4),
            max_in_flight_files: 1,
        })
        .with_observer(obs_trait);

        let table = engine.load_dir(dir.path(), &LoadOptions::default());

        assert_eq!(table.report.loaded.len(), 12);
        assert_eq!(observer.max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn metrics_are_available_after_run() {
        let dir = scratch_dir(3);
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(2),
            max_in_flight_files: 1,
        })
        .with_observer(Arc::new(TracingExecutionObserver));
        let metrics = engine.metrics();

        let table = engine.load_dir(dir.path(), &LoadOptions::default());

        let snap = metrics.snapshot();
        assert_eq!(snap.run_id, 1);
        assert_eq!(snap.files_started, 4);
        assert_eq!(snap.files_finished, 4);
        assert_eq!(snap.files_failed, 1);
        assert_eq!(snap.rows_ingested, table.row_count() as u64);
        assert_eq!(snap.max_active_files, 1);
        assert!(snap.elapsed.is_some());
    }

    #[test]
    fn zero_limits_are_raised_to_one() {
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(0),
            max_in_flight_files: 0,
        });
        assert_eq!(engine.opts.num_threads, Some(1));
        assert_eq!(engine.opts.max_in_flight_files, 1);
    }
}
