use super::score::Score;
use super::tables::Tables;
use crate::cards::card::Card;

/// Combinatorial-index evaluator.
///
/// Two table lookups cover every 7-card hand: flush hands key the
/// flush suit's 13-bit rank mask into the flush table, everything else
/// keys the colex index of the sorted rank multiset into the rank
/// table. The tables live in a process-global singleton.
pub fn score_7(cards: &[Card; 7]) -> Score {
    let tables = Tables::get();

    let mut suit_counts = [0u8; 4];
    let mut suit_masks = [0u16; 4];
    for card in cards {
        let s = u8::from(card.suit()) as usize;
        suit_counts[s] += 1;
        suit_masks[s] |= u16::from(card.rank());
    }
    if let Some(suit) = suit_counts.iter().position(|&n| n >= 5) {
        return tables.flush[suit_masks[suit] as usize];
    }

    let mut ranks = [0u8; 7];
    for (slot, card) in ranks.iter_mut().zip(cards.iter()) {
        *slot = u8::from(card.rank());
    }
    ranks.sort_unstable();
    tables.rank[tables.colex(&ranks)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::naive;
    use crate::evaluation::score::encode;
    use crate::evaluation::score::HandType;

    fn seven(s: &str) -> [Card; 7] {
        let cards: Vec<Card> = s
            .split_whitespace()
            .map(|c| Card::try_from(c).unwrap())
            .collect();
        cards.try_into().unwrap()
    }

    #[test]
    fn six_suited_cards_keep_their_straight_flush() {
        // the straight flush hides unless the whole suit mask is scanned
        let score = score_7(&seven("9h 8h 7h 6h 5h Ah 2c"));
        assert_eq!(score, encode(HandType::StraightFlush, &[9]));
    }

    #[test]
    fn agrees_with_naive_on_fixtures() {
        for fixture in [
            "As Ks Qs Js Ts 2d 3c",
            "5h 4h 3h 2h Ah 7c Tc",
            "Ah Ac As Ad 2h 3c 4d",
            "Ah Ac As 2d 2h 3c 4d",
            "Ah 2h 5h 7h 9h Kd Qc",
            "9s 8c 7d 6h 5s 2d 2c",
            "Ah 3c 5d 7h 9c Jd Ks",
            "9h 9c 9s 8d 8h 8c Ad",
            "Ah Ac Kd Kh Qs Qc Jd",
        ] {
            let cards = seven(fixture);
            assert_eq!(score_7(&cards), naive::score_7(&cards), "{}", fixture);
        }
    }
}
