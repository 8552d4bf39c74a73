criterion_group! {
    name = benches;
    config = Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.001)
        .sample_size(100)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        evaluating_seven_cards,
        evaluating_batched_lanes,
        simulating_trials,
}
criterion_main!(benches);

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use equipoker::cards::card::Card;
use equipoker::cards::hole::Hole;
use equipoker::evaluation::batch::HandBatch;
use equipoker::evaluation::batch::LANES;
use equipoker::evaluation::evaluator::Evaluator;
use equipoker::simulation::trial;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn random_hands(n: usize) -> Vec<[Card; 7]> {
    let ref mut rng = SmallRng::seed_from_u64(99);
    let mut deck: Vec<u8> = (0..52).collect();
    (0..n)
        .map(|_| {
            deck.shuffle(rng);
            let cards: Vec<Card> = deck[0..7].iter().map(|&c| Card::from(c)).collect();
            cards.try_into().unwrap()
        })
        .collect()
}

fn evaluating_seven_cards(c: &mut Criterion) {
    let hands = random_hands(256);
    let mut group = c.benchmark_group("Seven Card Evaluation");
    for (name, evaluator) in [
        ("naive", Evaluator::Naive),
        ("cactus_kev", Evaluator::CactusKev),
        ("ph_evaluator", Evaluator::PerfectHash),
        ("omp_eval", Evaluator::OmpEval),
    ] {
        group.bench_function(BenchmarkId::new("score_7", name), |b| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % hands.len();
                evaluator.score_7(&hands[i])
            })
        });
    }
    group.finish();
}

fn evaluating_batched_lanes(c: &mut Criterion) {
    let hands = random_hands(LANES);
    let mut batch = HandBatch::new();
    for (lane, cards) in hands.iter().enumerate() {
        batch.load(lane, cards);
    }
    let evaluator = Evaluator::OmpEval;
    let mut group = c.benchmark_group("Batched Evaluation");
    group.bench_function(BenchmarkId::new("score_batch", "omp_eval"), |b| {
        let mut out = [0; LANES];
        b.iter(|| {
            evaluator.score_batch(&batch, &mut out);
            out[0]
        })
    });
    group.finish();
}

fn simulating_trials(c: &mut Criterion) {
    let ref mut rng = SmallRng::seed_from_u64(7);
    let hole = Hole::from((
        Card::try_from("As").unwrap(),
        Card::try_from("Kd").unwrap(),
    ));
    let evaluator = Evaluator::PerfectHash;
    let mut group = c.benchmark_group("Monte Carlo Trials");
    group.bench_function(BenchmarkId::new("simulate", "AKo vs 2"), |b| {
        b.iter(|| trial::simulate(&evaluator, &hole, &[], 2, rng))
    });
    group.finish();
}
