use super::batch;
use super::batch::HandBatch;
use super::batch::LANES;
use super::cactus;
use super::machine::TwoPlusTwo;
use super::naive;
use super::perfect;
use super::score::Score;
use crate::cards::card::Card;
use crate::error::EngineError;
use std::path::Path;

/// The evaluator kinds a job can select, with their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Naive,
    CactusKev,
    PerfectHash,
    TwoPlusTwo,
    OmpEval,
}

impl TryFrom<&str> for Algorithm {
    type Error = EngineError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "naive" => Ok(Algorithm::Naive),
            "cactus_kev" => Ok(Algorithm::CactusKev),
            "ph_evaluator" => Ok(Algorithm::PerfectHash),
            "two_plus_two" => Ok(Algorithm::TwoPlusTwo),
            "omp_eval" => Ok(Algorithm::OmpEval),
            // legacy engine modes accepted for older clients
            "cpp_naive" | "cpp_base" | "base_python" => Ok(Algorithm::Naive),
            "cpp_simd" | "cpp_threaded" => Ok(Algorithm::OmpEval),
            "senzee" => Ok(Algorithm::CactusKev),
            _ => Err(EngineError::Validation(format!("unknown algorithm: {}", s))),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Algorithm::Naive => write!(f, "naive"),
            Algorithm::CactusKev => write!(f, "cactus_kev"),
            Algorithm::PerfectHash => write!(f, "ph_evaluator"),
            Algorithm::TwoPlusTwo => write!(f, "two_plus_two"),
            Algorithm::OmpEval => write!(f, "omp_eval"),
        }
    }
}

/// Closed variant over the five evaluators. A job picks one at start;
/// the hot path dispatches over this enum, no dynamic dispatch.
pub enum Evaluator {
    Naive,
    CactusKev,
    PerfectHash,
    TwoPlusTwo(TwoPlusTwo),
    OmpEval,
}

impl Evaluator {
    pub fn new(algorithm: Algorithm, hand_ranks: &Path) -> Result<Self, EngineError> {
        Ok(match algorithm {
            Algorithm::Naive => Evaluator::Naive,
            Algorithm::CactusKev => Evaluator::CactusKev,
            Algorithm::PerfectHash => Evaluator::PerfectHash,
            Algorithm::TwoPlusTwo => Evaluator::TwoPlusTwo(TwoPlusTwo::load(hand_ranks)?),
            Algorithm::OmpEval => Evaluator::OmpEval,
        })
    }

    pub fn score_7(&self, cards: &[Card; 7]) -> Score {
        match self {
            Evaluator::Naive => naive::score_7(cards),
            Evaluator::CactusKev => cactus::score_7(cards),
            Evaluator::PerfectHash => perfect::score_7(cards),
            Evaluator::TwoPlusTwo(table) => table.score_7(cards),
            Evaluator::OmpEval => batch::score_7(cards),
        }
    }

    /// whether the batched entry point is a genuine fast path here
    pub fn batched(&self) -> bool {
        matches!(self, Evaluator::OmpEval)
    }

    /// Score a full batch. Only the OmpEval variant vectorises; the
    /// others run their scalar evaluation per lane, which agrees by the
    /// evaluator interchange property.
    pub fn score_batch(&self, hands: &HandBatch, out: &mut [Score; LANES]) {
        match self {
            Evaluator::OmpEval => batch::score_batch(hands, out),
            _ => {
                for (lane, slot) in out.iter_mut().enumerate() {
                    let mut cards = [Card::from(0u8); 7];
                    for (i, card) in cards.iter_mut().enumerate() {
                        *card =
                            Card::from((hands.ranks[i][lane] * 4 + hands.suits[i][lane]) as u8);
                    }
                    *slot = self.score_7(&cards);
                }
            }
        }
    }
}
