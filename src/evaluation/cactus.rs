use super::score::encode;
use super::score::straight_high;
use super::score::top_ranks;
use super::score::HandType;
use super::score::Score;
use crate::cards::card::Card;
use crate::cards::card::CardCactus;

/// Cactus Kev evaluator.
///
/// Cards are pre-encoded as CardCactus words so the hot loop runs on
/// bare integers: a flush is the AND of the four suit bits, straights
/// fall out of the ORed rank mask, and multiplicities come from the
/// rank nibbles. Scores land on the same scale as every other
/// evaluator.
pub fn score_7(cards: &[Card; 7]) -> Score {
    let mut encoded = [0u32; 7];
    for (i, &card) in cards.iter().enumerate() {
        encoded[i] = CardCactus::from(card).0;
    }
    let mut best = 0;
    for i in 0..7 {
        for j in i + 1..7 {
            let mut five = [0u32; 5];
            let mut n = 0;
            for (k, &word) in encoded.iter().enumerate() {
                if k != i && k != j {
                    five[n] = word;
                    n += 1;
                }
            }
            best = best.max(score_5(&five));
        }
    }
    best
}

/// score of five encoded cards
pub fn score_5(c: &[u32; 5]) -> Score {
    let flush = c[0] & c[1] & c[2] & c[3] & c[4] & 0xF000 != 0;
    let mask = ((c[0] | c[1] | c[2] | c[3] | c[4]) >> 16) as u16;
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

    // five distinct ranks carry no multiplicities
    if mask.count_ones() == 5 {
        if flush {
            return encode(HandType::Flush, &top_ranks(mask, 5));
        }
        if let Some(high) = straight {
            return encode(HandType::Straight, &[high]);
        }
        return encode(HandType::HighCard, &top_ranks(mask, 5));
    }

    let mut counts = [0u8; 13];
    for &word in c {
        counts[((word >> 8) & 0xF) as usize] += 1;
    }
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
    if let Some(t) = trip {
        return encode(HandType::ThreeOfAKind, &[t, singles[0], singles[1]]);
    }
    if pairs.len() == 2 {
        return encode(HandType::TwoPair, &[pairs[0], pairs[1], singles[0]]);
    }
    encode(
        HandType::OnePair,
        &[pairs[0], singles[0], singles[1], singles[2]],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::naive;

    fn seven(s: &str) -> [Card; 7] {
        let cards: Vec<Card> = s
            .split_whitespace()
            .map(|c| Card::try_from(c).unwrap())
            .collect();
        cards.try_into().unwrap()
    }

    #[test]
    fn flush_detection_is_an_and() {
        let suited = seven("Ah 2h 5h 7h 9h Kd Qc");
        assert_eq!(
            score_7(&suited),
            encode(HandType::Flush, &[14, 9, 7, 5, 2])
        );
    }

    #[test]
    fn agrees_with_naive_on_fixtures() {
        for fixture in [
            "As Ks Qs Js Ts 2d 3c",
            "5h 4h 3h 2h Ah 7c Tc",
            "Ah Ac As Ad 2h 3c 4d",
            "Ah Ac As 2d 2h 3c 4d",
            "9s 8c 7d 6h 5s 2d 2c",
            "Ah 3c 5d 7h 9c Jd Ks",
        ] {
            let cards = seven(fixture);
            assert_eq!(score_7(&cards), naive::score_7(&cards), "{}", fixture);
        }
    }
}
