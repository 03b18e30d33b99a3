use crate::{
    aggregate,
    config::Config,
    engine::Engine,
    postprocess::Cleaner,
    process::{plan_outputs, process_file, ProcessingResult, WorkItem},
    report::{self, BatchResult},
    sample::select_inputs,
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{anyhow, Result};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, info, warn};

pub struct Pipeline<E: Engine> {
    cfg: Config,
    engine: E,
    cleaner: Cleaner,
}

/// Everything a finished batch wrote, plus the in-memory summary.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub result: BatchResult,
    pub combined_path: PathBuf,
    pub training_path: PathBuf,
    pub results_path: PathBuf,
    pub index_path: Option<PathBuf>,
    /// Successful items whose markdown could not be re-read for the combined document.
    pub skipped: Vec<String>,
}

impl<E: Engine> Pipeline<E> {
    pub fn new(cfg: &Config, engine: E) -> Result<Self> {
        let cleaner = Cleaner::new(cfg)?;
        Ok(Self {
            cfg: cfg.clone(),
            engine,
            cleaner,
        })
    }

    pub fn workers(&self) -> usize {
        resolve_workers(self.cfg.batch.max_workers, self.cfg.batch.max_workers_ceiling)
    }

    pub fn run(&self, input_dir: &Path, out_dir: &Path) -> Result<BatchRun> {
        let started = now_rfc3339();
        ensure_dir(out_dir)?;

        let (total, selected) = select_inputs(&self.cfg, input_dir)?;
        let workers = self.workers();

        if total == 0 {
            info!("no {} files found in {}", self.cfg.discovery.extension, input_dir.display());
        } else {
            info!("found {total} files; selected {} for processing", selected.len());
            for (i, f) in selected.iter().enumerate() {
                info!("  {}. {}", i + 1, f.name);
            }
            info!("processing with {workers} worker threads");
        }

        let mut reserved = vec![
            self.cfg.output.combined_filename.as_str(),
            self.cfg.output.training_filename.as_str(),
            self.cfg.output.results_filename.as_str(),
        ];
        if self.cfg.output.write_index {
            reserved.push(self.cfg.output.index_filename.as_str());
        }
        let items = plan_outputs(&selected, &reserved);

        let processed = run_pool(&self.engine, &self.cleaner, &items, out_dir, workers)?;

        let combined_path = out_dir.join(&self.cfg.output.combined_filename);
        let combined = aggregate::build_combined(&processed);
        aggregate::write_combined(&combined_path, &combined)?;
        info!("combined file created: {}", combined_path.display());

        let training_path = out_dir.join(&self.cfg.output.training_filename);
        aggregate::write_training_example(&self.cfg, &combined_path, &training_path)?;
        info!("training example created: {}", training_path.display());

        let result = BatchResult::new(
            processed,
            total,
            out_dir,
            workers,
            self.cfg.batch.sample_size,
            started,
            now_rfc3339(),
        );

        let index_path = if self.cfg.output.write_index {
            let path = out_dir.join(&self.cfg.output.index_filename);
            report::write_index(&path, &result)?;
            Some(path)
        } else {
            None
        };

        let results_path = out_dir.join(&self.cfg.output.results_filename);
        report::write_results(&results_path, &result)?;

        Ok(BatchRun {
            result,
            combined_path,
            training_path,
            results_path,
            index_path,
            skipped: combined.skipped,
        })
    }
}

/// `0` means auto: `min(ceiling, available_parallelism)`. Always within `1..=ceiling`.
pub fn resolve_workers(requested: usize, ceiling: usize) -> usize {
    let ceiling = ceiling.max(1);
    let n = if requested == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        requested
    };
    n.clamp(1, ceiling)
}

/// Runs `process_file` for every item on a pool of `workers` OS threads and
/// returns once every task has finished, sorted by original name. At most
/// `workers` conversions are in flight at once.
pub fn run_pool(
    engine: &dyn Engine,
    cleaner: &Cleaner,
    items: &[WorkItem],
    out_dir: &Path,
    workers: usize,
) -> Result<Vec<ProcessingResult>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("pdf-harvest-worker-{i}"))
        .build()
        .map_err(|e| anyhow!("failed to build worker pool: {e}"))?;

    let (tx, rx) = mpsc::channel::<ProcessingResult>();

    pool.scope(|s| {
        for item in items {
            let tx = tx.clone();
            s.spawn(move |_| {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    process_file(engine, cleaner, item, out_dir)
                }))
                .unwrap_or_else(|payload| {
                    let msg = panic_message(payload.as_ref());
                    warn!("✗ unexpected error processing {}: {msg}", item.input.name);
                    ProcessingResult::failed(&item.input, Some(msg))
                });
                // The receiver outlives the scope.
                let _ = tx.send(result);
            });
        }
    });
    drop(tx);

    let mut results: Vec<ProcessingResult> = rx.into_iter().collect();
    debug!("collected {} of {} results", results.len(), items.len());

    // A task that never reported still owes a record.
    if results.len() < items.len() {
        for item in items {
            if !results.iter().any(|r| r.source_path == item.input.path) {
                results.push(ProcessingResult::failed(
                    &item.input,
                    Some("worker exited without a result".to_string()),
                ));
            }
        }
    }

    results.sort_by(|a, b| a.original_name.cmp(&b.original_name));
    Ok(results)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: unknown payload".to_string()
    }
}
