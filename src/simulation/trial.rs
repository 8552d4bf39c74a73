use super::result::Trial;
use crate::cards::card::Card;
use crate::cards::deck::Deck;
use crate::cards::hole::Hole;
use crate::evaluation::batch::HandBatch;
use crate::evaluation::batch::LANES;
use crate::evaluation::evaluator::Evaluator;
use crate::evaluation::score::HandType;
use crate::evaluation::score::Score;
use rand::Rng;

/// One Monte Carlo trial: complete the board, deal the opponents,
/// score everyone, compare against the best opponent. Any bad deal
/// (duplicate request cards, deck underflow) degrades to a neutral
/// trial instead of failing the job.
pub fn simulate<R: Rng>(
    evaluator: &Evaluator,
    hole: &Hole,
    board: &[Card],
    num_opponents: usize,
    rng: &mut R,
) -> Trial {
    let Some(deal) = Deal::deal(hole, board, num_opponents, rng) else {
        return Trial::neutral();
    };

    let our_score = evaluator.score_7(&deal.ours);
    let mut best_score = Score::MIN;
    let mut best_index = 0;
    for (i, opponent) in deal.opponents.iter().enumerate() {
        let score = evaluator.score_7(opponent);
        if score > best_score {
            best_score = score;
            best_index = i;
        }
    }
    deal.resolve(our_score, best_score, best_index)
}

/// LANES trials at once through the batched entry point. Used only
/// when the selected evaluator has a genuine vector fast path.
pub fn simulate_batch<R: Rng>(
    evaluator: &Evaluator,
    hole: &Hole,
    board: &[Card],
    num_opponents: usize,
    rng: &mut R,
) -> Vec<Trial> {
    // failed lanes still need seven distinct cards so the evaluator
    // sees a well-formed hand; their scores are discarded below
    let filler: [Card; 7] = std::array::from_fn(|i| Card::from(i as u8));

    let mut deals = Vec::with_capacity(LANES);
    let mut ours = HandBatch::new();
    for lane in 0..LANES {
        match Deal::deal(hole, board, num_opponents, rng) {
            Some(deal) => {
                ours.load(lane, &deal.ours);
                deals.push(Some(deal));
            }
            None => {
                ours.load(lane, &filler);
                deals.push(None);
            }
        }
    }

    let mut our_scores = [0; LANES];
    evaluator.score_batch(&ours, &mut our_scores);

    // one batch per opponent seat across all lanes
    let mut opp_scores = vec![[Score::MIN; LANES]; num_opponents];
    let mut seats = HandBatch::new();
    for (seat, scores) in opp_scores.iter_mut().enumerate() {
        for (lane, deal) in deals.iter().enumerate() {
            match deal {
                Some(deal) => seats.load(lane, &deal.opponents[seat]),
                None => seats.load(lane, &filler),
            }
        }
        evaluator.score_batch(&seats, scores);
    }

    deals
        .into_iter()
        .enumerate()
        .map(|(lane, deal)| match deal {
            None => Trial::neutral(),
            Some(deal) => {
                let mut best_score = Score::MIN;
                let mut best_index = 0;
                for (seat, scores) in opp_scores.iter().enumerate() {
                    if scores[lane] > best_score {
                        best_score = scores[lane];
                        best_index = seat;
                    }
                }
                deal.resolve(our_scores[lane], best_score, best_index)
            }
        })
        .collect()
}

/// a completed deal: our seven cards plus each opponent's seven
struct Deal {
    ours: [Card; 7],
    opponents: Vec<[Card; 7]>,
    holes: Vec<Hole>,
}

impl Deal {
    fn deal<R: Rng>(
        hole: &Hole,
        board: &[Card],
        num_opponents: usize,
        rng: &mut R,
    ) -> Option<Self> {
        let mut deck = Deck::new();
        for card in hole.cards().iter().chain(board.iter()) {
            if !deck.contains(*card) {
                return None;
            }
            deck.remove(*card);
        }

        let mut community = [hole.0; 5];
        community[..board.len()].copy_from_slice(board);
        for slot in community.iter_mut().skip(board.len()) {
            *slot = deck.draw(rng)?;
        }

        let mut holes = Vec::with_capacity(num_opponents);
        for _ in 0..num_opponents {
            holes.push(deck.hole(rng)?);
        }

        let seven = |pair: [Card; 2]| {
            let mut cards = [pair[0]; 7];
            cards[1] = pair[1];
            cards[2..].copy_from_slice(&community);
            cards
        };
        Some(Self {
            ours: seven(hole.cards()),
            opponents: holes.iter().map(|h| seven(h.cards())).collect(),
            holes,
        })
    }

    fn resolve(&self, ours: Score, best: Score, best_index: usize) -> Trial {
        // an unopposed hand wins by definition
        if self.holes.is_empty() {
            return Trial {
                outcome: 1,
                our_type: HandType::from(ours),
                opp_type: HandType::HighCard,
                opp_class: crate::cards::hole::UNKNOWN_CLASS.to_string(),
            };
        }
        Trial {
            outcome: match ours.cmp(&best) {
                std::cmp::Ordering::Greater => 1,
                std::cmp::Ordering::Equal => 0,
                std::cmp::Ordering::Less => -1,
            },
            our_type: HandType::from(ours),
            opp_type: HandType::from(best),
            opp_class: self.holes[best_index].class(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::evaluator::Evaluator;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn hole(a: &str, b: &str) -> Hole {
        Hole::from((Card::try_from(a).unwrap(), Card::try_from(b).unwrap()))
    }

    #[test]
    fn duplicate_request_card_is_neutral() {
        let ref mut rng = SmallRng::seed_from_u64(3);
        let board = vec![Card::try_from("As").unwrap()];
        let trial = simulate(&Evaluator::OmpEval, &hole("As", "Ah"), &board, 1, rng);
        assert_eq!(trial.outcome, 0);
        assert_eq!(trial.opp_class, "??");
    }

    #[test]
    fn too_many_opponents_is_neutral() {
        let ref mut rng = SmallRng::seed_from_u64(4);
        let trial = simulate(&Evaluator::OmpEval, &hole("As", "Ah"), &[], 30, rng);
        assert_eq!(trial.outcome, 0);
        assert_eq!(trial.opp_class, "??");
    }

    #[test]
    fn trials_resolve_against_the_best_opponent() {
        let ref mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..200 {
            let trial = simulate(&Evaluator::OmpEval, &hole("As", "Ah"), &[], 3, rng);
            assert!(trial.opp_class.len() >= 2);
            assert!((-1..=1).contains(&trial.outcome));
        }
    }

    #[test]
    fn batch_trials_have_full_lanes() {
        let ref mut rng = SmallRng::seed_from_u64(6);
        let trials = simulate_batch(&Evaluator::OmpEval, &hole("Ks", "Kd"), &[], 2, rng);
        assert_eq!(trials.len(), LANES);
        for trial in trials {
            assert_ne!(trial.opp_class, "??");
        }
    }
}
