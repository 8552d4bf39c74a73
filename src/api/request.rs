use crate::cards::card::Card;
use crate::error::EngineError;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;

fn default_opponents() -> u32 {
    1
}
fn default_simulations() -> u64 {
    100_000
}
fn default_mode() -> String {
    "cpp_naive".to_string()
}

/// A range-equity job as submitted over the wire. Unknown keys are
/// ignored; only range_spec is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub range_spec: BTreeMap<String, [Card; 2]>,
    #[serde(default)]
    pub board: Vec<Card>,
    #[serde(default = "default_opponents")]
    pub num_opponents: u32,
    #[serde(default = "default_simulations")]
    pub num_simulations: u64,
    #[serde(default = "default_mode")]
    pub mode: String,
    /// empty means fall back to the legacy mode field
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub optimizations: Vec<String>,
    #[serde(default)]
    pub num_workers: u32,
}

/// optimization flags a request may turn on
pub const OPT_MULTITHREADING: &str = "multithreading";
pub const OPT_SIMD: &str = "simd";
pub const OPT_PERFECT_HASH: &str = "perfect_hash";
pub const OPT_PREFETCHING: &str = "prefetching";

impl JobRequest {
    /// algorithm selection, falling back to the legacy mode field
    pub fn algorithm(&self) -> &str {
        if self.algorithm.is_empty() {
            &self.mode
        } else {
            &self.algorithm
        }
    }

    pub fn optimization(&self, flag: &str) -> bool {
        self.optimizations.iter().any(|o| o == flag)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.range_spec.is_empty() {
            return Err(EngineError::Validation("range_spec is empty".to_string()));
        }
        if self.num_opponents < 1 {
            return Err(EngineError::Validation(
                "num_opponents must be at least 1".to_string(),
            ));
        }
        if self.board.len() > 5 {
            return Err(EngineError::Validation(format!(
                "board has {} cards, at most 5 allowed",
                self.board.len()
            )));
        }
        let mut board_mask = 0u64;
        for card in &self.board {
            let bit = u64::from(*card);
            if board_mask & bit != 0 {
                return Err(EngineError::Validation(format!(
                    "card {} appears twice on the board",
                    card
                )));
            }
            board_mask |= bit;
        }
        for (name, cards) in &self.range_spec {
            if cards[0] == cards[1] {
                return Err(EngineError::Validation(format!(
                    "hand {} holds {} twice",
                    name, cards[0]
                )));
            }
            let hole = u64::from(cards[0]) | u64::from(cards[1]);
            if board_mask & hole != 0 {
                return Err(EngineError::Validation(format!(
                    "hand {} shares a card with the board",
                    name
                )));
            }
        }
        for flag in &self.optimizations {
            if ![
                OPT_MULTITHREADING,
                OPT_SIMD,
                OPT_PERFECT_HASH,
                OPT_PREFETCHING,
            ]
            .contains(&flag.as_str())
            {
                return Err(EngineError::Validation(format!(
                    "unknown optimization: {}",
                    flag
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_request_fills_defaults() {
        let request: JobRequest = serde_json::from_str(
            r#"{"range_spec": {"AA": [{"rank":14,"suit":0},{"rank":14,"suit":1}]}}"#,
        )
        .unwrap();
        assert_eq!(request.num_opponents, 1);
        assert_eq!(request.num_simulations, 100_000);
        // no explicit algorithm falls back to the legacy default mode
        assert_eq!(request.algorithm(), "cpp_naive");
        assert_eq!(request.num_workers, 0);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let request: JobRequest = serde_json::from_str(
            r#"{"range_spec": {"AA": [{"rank":14,"suit":0},{"rank":14,"suit":1}]}, "frobnicate": 9}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn empty_range_is_rejected() {
        let request: JobRequest = serde_json::from_str(r#"{"range_spec": {}}"#).unwrap();
        assert!(matches!(
            request.validate(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_hole_card_is_rejected() {
        let request: JobRequest = serde_json::from_str(
            r#"{"range_spec": {"AA": [{"rank":14,"suit":0},{"rank":14,"suit":0}]}}"#,
        )
        .unwrap();
        assert!(matches!(
            request.validate(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn board_overlapping_a_hand_is_rejected() {
        let request: JobRequest = serde_json::from_str(
            r#"{"range_spec": {"AA": [{"rank":14,"suit":0},{"rank":14,"suit":1}]},
                "board": [{"rank":14,"suit":0}]}"#,
        )
        .unwrap();
        assert!(matches!(
            request.validate(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn repeated_board_card_is_rejected() {
        let request: JobRequest = serde_json::from_str(
            r#"{"range_spec": {"AA": [{"rank":14,"suit":0},{"rank":14,"suit":1}]},
                "board": [{"rank":2,"suit":2},{"rank":2,"suit":2}]}"#,
        )
        .unwrap();
        assert!(matches!(
            request.validate(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn oversized_board_is_rejected() {
        let board: Vec<String> = ["2c", "3c", "4c", "5c", "6c", "7c"]
            .iter()
            .map(|c| {
                let card = Card::try_from(*c).unwrap();
                serde_json::to_string(&card).unwrap()
            })
            .collect();
        let json = format!(
            r#"{{"range_spec": {{"AA": [{{"rank":14,"suit":0}},{{"rank":14,"suit":1}}]}}, "board": [{}]}}"#,
            board.join(",")
        );
        let request: JobRequest = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            request.validate(),
            Err(EngineError::Validation(_))
        ));
    }
}
