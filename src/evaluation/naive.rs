use super::score::encode;
use super::score::straight_high;
use super::score::HandType;
use super::score::Score;
use crate::cards::card::Card;

/// Reference evaluator: enumerate all C(7,5) = 21 five-card subsets,
/// classify each by rank histogram plus flush and straight tests, and
/// keep the best. No tables, no tricks; the other evaluators are
/// measured against this one.
pub fn score_7(cards: &[Card; 7]) -> Score {
    let mut best = 0;
    for i in 0..7 {
        for j in i + 1..7 {
            let mut five = [cards[0]; 5];
            let mut n = 0;
            for (k, &card) in cards.iter().enumerate() {
                if k != i && k != j {
                    five[n] = card;
                    n += 1;
                }
            }
            best = best.max(score_5(&five));
        }
    }
    best
}

/// score of exactly five cards
pub fn score_5(cards: &[Card; 5]) -> Score {
    let mut counts = [0u8; 13];
    let mut mask = 0u16;
    for card in cards {
        counts[u8::from(card.rank()) as usize] += 1;
        mask |= u16::from(card.rank());
    }
    let flush = cards.iter().all(|c| c.suit() as u8 == cards[0].suit() as u8);
    let straight = straight_high(mask);

    if let Some(high) = straight {
        if flush {
            return if high == 14 {
                encode(HandType::RoyalFlush, &[14, 13, 12, 11, 10])
            } else {
                encode(HandType::StraightFlush, &[high])
            };
        }
    }

    // group ranks by multiplicity, high to low
    let mut quad = None;
    let mut trip = None;
    let mut pairs = Vec::new();
    let mut singles = Vec::new();
    for r in (0..13u8).rev() {
        let face = r + 2;
        match counts[r as usize] {
            4 => quad = Some(face),
            3 => trip = Some(face),
            2 => pairs.push(face),
            1 => singles.push(face),
            _ => {}
        }
    }

    if let Some(q) = quad {
        return encode(HandType::FourOfAKind, &[q, singles[0]]);
    }
    if let (Some(t), Some(&p)) = (trip, pairs.first()) {
        return encode(HandType::FullHouse, &[t, p]);
    }
    if flush {
        return encode(HandType::Flush, &singles);
    }
    if let Some(high) = straight {
        return encode(HandType::Straight, &[high]);
    }
    if let Some(t) = trip {
        return encode(HandType::ThreeOfAKind, &[t, singles[0], singles[1]]);
    }
    if pairs.len() == 2 {
        return encode(HandType::TwoPair, &[pairs[0], pairs[1], singles[0]]);
    }
    if pairs.len() == 1 {
        return encode(
            HandType::OnePair,
            &[pairs[0], singles[0], singles[1], singles[2]],
        );
    }
    encode(HandType::HighCard, &singles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seven(s: &str) -> [Card; 7] {
        let cards: Vec<Card> = s
            .split_whitespace()
            .map(|c| Card::try_from(c).unwrap())
            .collect();
        cards.try_into().unwrap()
    }

    #[test]
    fn royal_flush_tops_the_scale() {
        let score = score_7(&seven("As Ks Qs Js Ts 2d 3c"));
        assert_eq!(HandType::from(score), HandType::RoyalFlush);
        assert!(score >= 9_000_000);
    }

    #[test]
    fn steel_wheel_is_five_high() {
        let score = score_7(&seven("5h 4h 3h 2h Ah 7c Tc"));
        assert_eq!(HandType::from(score), HandType::StraightFlush);
        assert_eq!(score, encode(HandType::StraightFlush, &[5]));
    }

    #[test]
    fn quads_use_best_kicker() {
        let score = score_7(&seven("Ah Ac As Ad 2h 3c 4d"));
        assert_eq!(score, encode(HandType::FourOfAKind, &[14, 4]));
    }

    #[test]
    fn two_trips_make_a_full_house() {
        let score = score_7(&seven("9h 9c 9s 8d 8h 8c Ad"));
        assert_eq!(score, encode(HandType::FullHouse, &[9, 8]));
    }

    #[test]
    fn flush_takes_top_five() {
        let score = score_7(&seven("Ah 2h 5h 7h 9h Kd Qc"));
        assert_eq!(score, encode(HandType::Flush, &[14, 9, 7, 5, 2]));
    }

    #[test]
    fn wheel_straight_loses_to_six_high() {
        let wheel = score_7(&seven("Ah 2c 3d 4h 5s Td Tc"));
        let six = score_7(&seven("2h 3c 4d 5h 6s Td Tc"));
        assert_eq!(wheel, encode(HandType::Straight, &[5]));
        assert!(six > wheel);
    }

    #[test]
    fn three_pairs_keep_best_two_and_kicker() {
        let score = score_7(&seven("Ah Ac Kd Kh Qs Qc Jd"));
        assert_eq!(score, encode(HandType::TwoPair, &[14, 13, 12]));
    }

    #[test]
    fn high_card_reads_top_five() {
        let score = score_7(&seven("Ah 3c 5d 7h 9c Jd Ks"));
        assert_eq!(score, encode(HandType::HighCard, &[14, 13, 11, 9, 7]));
    }
}
