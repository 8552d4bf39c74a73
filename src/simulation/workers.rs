use super::result::EquityResult;
use super::trial;
use crate::cards::card::Card;
use crate::cards::hole::Hole;
use crate::evaluation::batch::LANES;
use crate::evaluation::evaluator::Evaluator;
use crate::telemetry::writer::TelemetryWriter;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

/// trials between bookkeeping checks inside a worker
pub const UPDATE_INTERVAL: u64 = 1000;

/// Everything the merge lock protects: the cross-hand publish map, the
/// current hand's accumulation, and the telemetry writer. Exactly one
/// mutex guards all three, so a periodic merge and its snapshot publish
/// are a single critical section.
pub struct SharedState {
    /// publish map: opponent classes from every hand so far, plus one
    /// summary entry per finished hand
    pub results: BTreeMap<String, EquityResult>,
    /// the hand currently being simulated, keyed by opponent class
    pub tally: BTreeMap<String, EquityResult>,
    pub writer: Option<TelemetryWriter>,
}

impl SharedState {
    pub fn new(writer: Option<TelemetryWriter>) -> Self {
        Self {
            results: BTreeMap::new(),
            tally: BTreeMap::new(),
            writer,
        }
    }
}

/// a poisoned merge lock still holds consistent tallies; recover it
pub fn lock(state: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Splits one hand's simulation budget across worker threads and
/// merges their private tallies under the shared lock.
pub struct Scheduler<'a> {
    pub evaluator: &'a Evaluator,
    pub workers: usize,
    pub simd: bool,
    pub update_frequency: u64,
}

impl Scheduler<'_> {
    /// Run `budget` trials of one hand. Workers 0..W-1 take the floor
    /// share, the last takes the remainder, so the totals are exact.
    /// Returns the merged per-opponent-class tallies of this hand.
    pub fn run_hand(
        &self,
        hole: &Hole,
        board: &[Card],
        num_opponents: usize,
        budget: u64,
        state: &Mutex<SharedState>,
        processed: &AtomicU64,
        last_update: &AtomicU64,
    ) -> BTreeMap<String, EquityResult> {
        lock(state).tally.clear();

        let workers = self.workers.max(1) as u64;
        let share = budget / workers;
        std::thread::scope(|scope| {
            for w in 0..workers {
                let quota = if w == workers - 1 {
                    budget - share * (workers - 1)
                } else {
                    share
                };
                scope.spawn(move || {
                    self.worker(quota, hole, board, num_opponents, state, processed, last_update)
                });
            }
        });

        let mut guard = lock(state);
        for result in guard.tally.values_mut() {
            result.refresh();
        }
        guard.tally.clone()
    }

    fn worker(
        &self,
        quota: u64,
        hole: &Hole,
        board: &[Card],
        num_opponents: usize,
        state: &Mutex<SharedState>,
        processed: &AtomicU64,
        last_update: &AtomicU64,
    ) {
        let ref mut rng = SmallRng::from_entropy();
        let mut local: BTreeMap<String, EquityResult> = BTreeMap::new();
        let mut flushed: BTreeMap<String, Flushed> = BTreeMap::new();
        let mut done = 0u64;

        while done < quota {
            if self.simd && quota - done >= LANES as u64 {
                for t in trial::simulate_batch(self.evaluator, hole, board, num_opponents, rng) {
                    local
                        .entry(t.opp_class.clone())
                        .or_insert_with(|| EquityResult::named(&t.opp_class))
                        .record(&t);
                }
                done += LANES as u64;
                processed.fetch_add(LANES as u64, Ordering::Relaxed);
            } else {
                let t = trial::simulate(self.evaluator, hole, board, num_opponents, rng);
                local
                    .entry(t.opp_class.clone())
                    .or_insert_with(|| EquityResult::named(&t.opp_class))
                    .record(&t);
                done += 1;
                processed.fetch_add(1, Ordering::Relaxed);
            }

            if done % UPDATE_INTERVAL == 0 {
                let total = processed.load(Ordering::Relaxed);
                if total - last_update.load(Ordering::Relaxed) >= self.update_frequency {
                    self.merge(&local, &mut flushed, state, false);
                    last_update.store(total, Ordering::Relaxed);
                }
            }
        }
        self.merge(&local, &mut flushed, state, true);
    }

    /// Merge the delta since the last flush into the shared tally and
    /// publish a snapshot. Matrices ride along only on the final merge.
    fn merge(
        &self,
        local: &BTreeMap<String, EquityResult>,
        flushed: &mut BTreeMap<String, Flushed>,
        state: &Mutex<SharedState>,
        last: bool,
    ) {
        let mut guard = lock(state);
        let SharedState {
            results,
            tally,
            writer,
        } = &mut *guard;

        for (class, result) in local {
            let seen = flushed.entry(class.clone()).or_default();
            let slot = tally
                .entry(class.clone())
                .or_insert_with(|| EquityResult::named(class));
            slot.wins += result.wins - seen.wins;
            slot.ties += result.ties - seen.ties;
            slot.losses += result.losses - seen.losses;
            slot.simulations += result.simulations - seen.simulations;
            if last {
                slot.absorb_matrices(result);
            }
            *seen = Flushed::of(result);
        }
        for result in tally.values_mut() {
            result.refresh();
        }
        for (class, result) in tally.iter() {
            results.insert(class.clone(), result.clone());
        }
        if !last {
            if let Some(writer) = writer {
                writer.update_results(results);
            }
        }
    }
}

/// counters already merged upstream, per opponent class
#[derive(Default, Clone, Copy)]
struct Flushed {
    wins: u32,
    ties: u32,
    losses: u32,
    simulations: u32,
}

impl Flushed {
    fn of(result: &EquityResult) -> Self {
        Self {
            wins: result.wins,
            ties: result.ties,
            losses: result.losses,
            simulations: result.simulations,
        }
    }
}
