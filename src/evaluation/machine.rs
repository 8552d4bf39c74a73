use super::score::Score;
use crate::cards::card::Card;
use crate::error::EngineError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// default location of the generated table, overridable via config
pub const HAND_RANKS_FILE: &str = "HandRanks.dat";

/// entries before the first state's transitions
const BASE: usize = 53;

/// 2+2 state-machine evaluator.
///
/// The table is a dense array of i32 transitions generated offline by
/// the `tables` binary and memory mapped here. Evaluation is seven
/// dependent loads: start at the base state and follow one transition
/// per card (cards are indexed 1..=52); the seventh transition lands on
/// the final score, already on the unified scale.
#[derive(Debug)]
pub struct TwoPlusTwo {
    map: Mmap,
}

impl TwoPlusTwo {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let file = File::open(path).map_err(|e| {
            EngineError::Resource(format!("open {}: {}", path.display(), e))
        })?;
        let map = unsafe { Mmap::map(&file) }
            .map_err(|e| EngineError::Resource(format!("map {}: {}", path.display(), e)))?;
        if map.len() < BASE * 4 || map.len() % 4 != 0 {
            return Err(EngineError::Resource(format!(
                "{} is not a transition table ({} bytes)",
                path.display(),
                map.len()
            )));
        }
        Ok(Self { map })
    }

    fn table(&self) -> &[i32] {
        // the mapping is page aligned and a whole number of i32s, checked at load
        unsafe {
            std::slice::from_raw_parts(self.map.as_ptr() as *const i32, self.map.len() / 4)
        }
    }

    pub fn score_7(&self, cards: &[Card; 7]) -> Score {
        let hr = self.table();
        let mut p = BASE;
        for &card in cards {
            p = hr[p + u8::from(card) as usize + 1] as usize;
        }
        p as Score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::naive;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    // Exercised only when the offline generator has produced the table;
    // keeps the suite green on fresh checkouts.
    fn table() -> Option<TwoPlusTwo> {
        TwoPlusTwo::load(Path::new(HAND_RANKS_FILE)).ok()
    }

    #[test]
    fn missing_table_is_a_resource_error() {
        let err = TwoPlusTwo::load(Path::new("no-such-table.dat")).unwrap_err();
        assert!(matches!(err, EngineError::Resource(_)));
    }

    #[test]
    fn agrees_with_naive_when_present() {
        let Some(eval) = table() else { return };
        let ref mut rng = SmallRng::seed_from_u64(22);
        let mut deck: Vec<u8> = (0..52).collect();
        for _ in 0..1000 {
            deck.shuffle(rng);
            let cards: Vec<Card> = deck[0..7].iter().map(|&n| Card::from(n)).collect();
            let cards: [Card; 7] = cards.try_into().unwrap();
            assert_eq!(eval.score_7(&cards), naive::score_7(&cards), "{:?}", cards);
        }
    }
}
