use super::result::EquityResult;
use super::workers::lock;
use super::workers::Scheduler;
use super::workers::SharedState;
use crate::api::request::JobRequest;
use crate::api::request::OPT_MULTITHREADING;
use crate::api::request::OPT_SIMD;
use crate::cards::hole::Hole;
use crate::error::EngineError;
use crate::evaluation::evaluator::Algorithm;
use crate::evaluation::evaluator::Evaluator;
use crate::telemetry::writer::TelemetryWriter;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

/// minimum counter delta between hands_processed publishes
pub const UPDATE_FREQUENCY: u64 = 1000;

/// invoked after each hand with (fraction done, live equity per name)
pub type ProgressCallback = Box<dyn Fn(f64, &BTreeMap<String, f64>) + Send>;

/// Range-equity driver. One engine runs one job: it loops over the
/// named hands, schedules each across the worker pool, folds the
/// per-opponent-class tallies into per-hand summaries, and keeps the
/// telemetry segment and the progress callback up to date.
pub struct Engine {
    evaluator: Evaluator,
    workers: usize,
    simd: bool,
    state: Mutex<SharedState>,
    processed: AtomicU64,
    last_update: AtomicU64,
    progress: Option<ProgressCallback>,
}

impl Engine {
    /// Resolve a request into a runnable engine. A missing telemetry
    /// segment is not fatal: the job runs without telemetry.
    pub fn new(
        request: &JobRequest,
        hand_ranks: &Path,
        job_id: Option<&str>,
    ) -> Result<Self, EngineError> {
        let algorithm = Algorithm::try_from(request.algorithm())?;
        let evaluator = Evaluator::new(algorithm, hand_ranks)?;
        let workers = match (
            request.optimization(OPT_MULTITHREADING),
            request.num_workers as usize,
        ) {
            (true, 0) => std::thread::available_parallelism().map_or(1, |n| n.get()),
            (true, n) => n,
            (false, 0) => 1,
            (false, n) => n,
        };
        let simd = request.optimization(OPT_SIMD) && evaluator.batched();
        let writer = job_id.and_then(|id| match TelemetryWriter::create(id) {
            Ok(writer) => Some(writer),
            Err(e) => {
                log::warn!("job {} continues without telemetry: {}", id, e);
                None
            }
        });
        Ok(Self {
            evaluator,
            workers,
            simd,
            state: Mutex::new(SharedState::new(writer)),
            processed: AtomicU64::new(0),
            last_update: AtomicU64::new(0),
            progress: None,
        })
    }

    pub fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.progress = Some(callback);
    }

    /// Run the whole range. Returns the publish map: every opponent
    /// class observed (latest hand wins the key) plus one summary entry
    /// per hand in the range.
    pub fn calculate_range_equity(
        &self,
        request: &JobRequest,
    ) -> Result<BTreeMap<String, EquityResult>, EngineError> {
        request.validate()?;
        let per_hand = request.num_simulations / request.range_spec.len() as u64;

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| self.drive(request, per_hand)));
        match outcome {
            Ok(results) => {
                let mut guard = lock(&self.state);
                if let Some(writer) = guard.writer.take() {
                    writer.update_hands(self.processed.load(Ordering::Relaxed));
                    writer.set_status(crate::telemetry::layout::STATUS_COMPLETED);
                }
                Ok(results)
            }
            Err(panic) => {
                let mut guard = lock(&self.state);
                if let Some(writer) = guard.writer.take() {
                    writer.set_status(crate::telemetry::layout::STATUS_FAILED);
                }
                let message = panic
                    .downcast_ref::<String>()
                    .cloned()
                    .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
                    .unwrap_or_else(|| "worker panicked".to_string());
                Err(EngineError::Fatal(message))
            }
        }
    }

    fn drive(&self, request: &JobRequest, per_hand: u64) -> BTreeMap<String, EquityResult> {
        let scheduler = Scheduler {
            evaluator: &self.evaluator,
            workers: self.workers,
            simd: self.simd,
            update_frequency: UPDATE_FREQUENCY,
        };
        let total_hands = request.range_spec.len();

        for (idx, (name, cards)) in request.range_spec.iter().enumerate() {
            let hole = Hole::from((cards[0], cards[1]));
            let per_class = scheduler.run_hand(
                &hole,
                &request.board,
                request.num_opponents as usize,
                per_hand,
                &self.state,
                &self.processed,
                &self.last_update,
            );

            // the hand's summary aggregates only its own opponent-class
            // tallies; entries stored by earlier hands never re-count
            let mut overall = EquityResult::named(name);
            for result in per_class.values() {
                overall.absorb(result, true);
            }
            overall.refresh();

            let live = {
                let mut guard = lock(&self.state);
                guard.results.insert(name.clone(), overall);
                let expected = (idx as u64 + 1) * per_hand;
                self.processed.fetch_max(expected, Ordering::Relaxed);
                let count = self.processed.load(Ordering::Relaxed);
                if let Some(writer) = &guard.writer {
                    writer.update_hands(count);
                    writer.update_results(&guard.results);
                }
                guard
                    .results
                    .iter()
                    .map(|(name, result)| (name.clone(), result.equity))
                    .collect::<BTreeMap<String, f64>>()
            };

            if let Some(callback) = &self.progress {
                callback((idx + 1) as f64 / total_hands as f64, &live);
            }
        }

        let guard = lock(&self.state);
        guard.results.clone()
    }
}
