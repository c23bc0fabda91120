use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use sweeper_scanner::error::{Result, SweepError};
use sweeper_scanner::events::{EventSink, SweepEvent};
use sweeper_scanner::persist::OutputTree;
use sweeper_scanner::result::SweepOutcome;
use sweeper_scanner::scope::parse_seed;
use sweeper_scanner::{SweepConfig, Sweeper};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "offline_pages";

/// Options for a single sweep
#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub seed: String,
    pub output_dir: PathBuf,
    pub config: SweepConfig,
}

impl SweepOptions {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            config: SweepConfig::default(),
        }
    }
}

/// A finished sweep, ready for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub id: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub output_dir: PathBuf,
    pub outcome: SweepOutcome,
}

impl SweepReport {
    pub fn index_path(&self) -> PathBuf {
        OutputTree::new(&self.output_dir).index_path()
    }

    pub fn working_count(&self) -> usize {
        self.outcome.audit.working_count()
    }

    pub fn broken_count(&self) -> usize {
        self.outcome.audit.broken_count()
    }

    /// 0 when every visited URL works, 1 when at least one is broken.
    pub fn exit_code(&self) -> i32 {
        if self.broken_count() == 0 { 0 } else { 1 }
    }
}

/// Runs at most one sweep at a time in a background task.
#[derive(Debug, Clone, Default)]
pub struct SweepCoordinator {
    busy: Arc<AtomicBool>,
}

/// Releases the coordinator's slot however the sweep task ends.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SweepCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Validate the seed and start a sweep in the background.
    ///
    /// Fails with `InvalidInput` before anything is touched, or with `Busy`
    /// while another sweep is still running.
    pub fn start(&self, options: SweepOptions) -> Result<SweepHandle> {
        parse_seed(&options.seed)?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected sweep of {}: another sweep is running", options.seed);
            return Err(SweepError::Busy);
        }
        let guard = BusyGuard(self.busy.clone());

        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task_id = id.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            run_sweep(task_id, options, EventSink::new(tx), task_cancel).await
        });

        Ok(SweepHandle {
            id,
            events: rx,
            cancel,
            task,
        })
    }
}

async fn run_sweep(
    id: String,
    options: SweepOptions,
    events: EventSink,
    cancel: CancellationToken,
) -> Result<SweepReport> {
    let started_at = Local::now();
    info!("Sweep {} started for {}", id, options.seed);

    let sweeper = Sweeper::new(options.config, OutputTree::new(&options.output_dir))?
        .with_events(events)
        .with_cancellation(cancel);
    let outcome = sweeper.run(&options.seed).await?;

    Ok(SweepReport {
        id,
        started_at,
        finished_at: Local::now(),
        output_dir: options.output_dir,
        outcome,
    })
}

/// Caller's side of a running sweep.
pub struct SweepHandle {
    id: String,
    events: UnboundedReceiver<SweepEvent>,
    cancel: CancellationToken,
    task: JoinHandle<Result<SweepReport>>,
}

impl SweepHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Next event, or `None` once the sweep task has finished.
    pub async fn next_event(&mut self) -> Option<SweepEvent> {
        self.events.recv().await
    }

    /// Request cancellation. Takes effect at the next page, resource or audit unit.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the sweep to end and return its single terminal result.
    pub async fn wait(self) -> Result<SweepReport> {
        self.task.await?
    }
}
