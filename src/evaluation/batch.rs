use super::score::encode;
use super::score::straight_high;
use super::score::top_ranks;
use super::score::HandType;
use super::score::Score;
use crate::cards::card::Card;

/// lanes per batch; one AVX2 register of u32s
pub const LANES: usize = 8;

/// Struct-of-arrays batch of seven-card hands, 32-byte aligned for
/// vector loads. ranks hold 0..=12 indices, suits 0..=3.
#[repr(C, align(32))]
#[derive(Debug, Clone)]
pub struct HandBatch {
    pub ranks: [[u32; LANES]; 7],
    pub suits: [[u32; LANES]; 7],
}

impl HandBatch {
    pub fn new() -> Self {
        Self {
            ranks: [[0; LANES]; 7],
            suits: [[0; LANES]; 7],
        }
    }

    pub fn load(&mut self, lane: usize, cards: &[Card; 7]) {
        for (i, card) in cards.iter().enumerate() {
            self.ranks[i][lane] = u8::from(card.rank()) as u32;
            self.suits[i][lane] = u8::from(card.suit()) as u32;
        }
    }

    fn lane(&self, lane: usize) -> [Card; 7] {
        let mut cards = [Card::from(0u8); 7];
        for (i, slot) in cards.iter_mut().enumerate() {
            *slot = Card::from((self.ranks[i][lane] * 4 + self.suits[i][lane]) as u8);
        }
        cards
    }
}

impl Default for HandBatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Direct 7-card evaluation without subset enumeration. This is the
/// scalar contract the batched path must reproduce bit for bit.
pub fn score_7(cards: &[Card; 7]) -> Score {
    let mut rank_mask = 0u16;
    let mut suit_masks = [0u16; 4];
    let mut suit_counts = [0u8; 4];
    let mut rank_counts = [0u8; 13];
    for card in cards {
        let r = u8::from(card.rank());
        let s = u8::from(card.suit()) as usize;
        rank_mask |= 1 << r;
        suit_masks[s] |= 1 << r;
        suit_counts[s] += 1;
        rank_counts[r as usize] += 1;
    }
    finish(rank_mask, &suit_masks, &suit_counts, &rank_counts)
}

/// Score all lanes of a batch. Dispatches to the AVX2 kernel when the
/// host supports it; otherwise runs the scalar loop. Both paths return
/// identical values.
pub fn score_batch(batch: &HandBatch, out: &mut [Score; LANES]) {
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx2") {
            unsafe { score_batch_avx2(batch, out) };
            return;
        }
    }
    score_batch_scalar(batch, out);
}

pub fn score_batch_scalar(batch: &HandBatch, out: &mut [Score; LANES]) {
    for (lane, slot) in out.iter_mut().enumerate() {
        *slot = score_7(&batch.lane(lane));
    }
}

/// AVX2 kernel: the per-card mask and count accumulation runs eight
/// lanes wide; classification finishes scalar per lane through the same
/// `finish` used by the scalar path, which is what keeps the two paths
/// bit-identical.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn score_batch_avx2(batch: &HandBatch, out: &mut [Score; LANES]) {
    use std::arch::x86_64::*;

    let ones = _mm256_set1_epi32(1);
    let mut rank_masks = _mm256_setzero_si256();
    let mut suit_masks = [_mm256_setzero_si256(); 4];
    let mut suit_counts = [_mm256_setzero_si256(); 4];

    for i in 0..7 {
        let ranks = _mm256_load_si256(batch.ranks[i].as_ptr() as *const __m256i);
        let suits = _mm256_load_si256(batch.suits[i].as_ptr() as *const __m256i);
        let bits = _mm256_sllv_epi32(ones, ranks);
        rank_masks = _mm256_or_si256(rank_masks, bits);
        for s in 0..4 {
            let here = _mm256_cmpeq_epi32(suits, _mm256_set1_epi32(s as i32));
            suit_masks[s] = _mm256_or_si256(suit_masks[s], _mm256_and_si256(here, bits));
            suit_counts[s] =
                _mm256_sub_epi32(suit_counts[s], here); // cmpeq yields -1 per hit
        }
    }

    let mut rank_lanes = [0u32; LANES];
    let mut suit_mask_lanes = [[0u32; LANES]; 4];
    let mut suit_count_lanes = [[0u32; LANES]; 4];
    _mm256_storeu_si256(rank_lanes.as_mut_ptr() as *mut __m256i, rank_masks);
    for s in 0..4 {
        _mm256_storeu_si256(
            suit_mask_lanes[s].as_mut_ptr() as *mut __m256i,
            suit_masks[s],
        );
        _mm256_storeu_si256(
            suit_count_lanes[s].as_mut_ptr() as *mut __m256i,
            suit_counts[s],
        );
    }

    for lane in 0..LANES {
        let mut rank_counts = [0u8; 13];
        for i in 0..7 {
            rank_counts[batch.ranks[i][lane] as usize] += 1;
        }
        let suit_masks = [
            suit_mask_lanes[0][lane] as u16,
            suit_mask_lanes[1][lane] as u16,
            suit_mask_lanes[2][lane] as u16,
            suit_mask_lanes[3][lane] as u16,
        ];
        let suit_counts = [
            suit_count_lanes[0][lane] as u8,
            suit_count_lanes[1][lane] as u8,
            suit_count_lanes[2][lane] as u8,
            suit_count_lanes[3][lane] as u8,
        ];
        out[lane] = finish(
            rank_lanes[lane] as u16,
            &suit_masks,
            &suit_counts,
            &rank_counts,
        );
    }
}

/// classification over precomputed masks and counts
fn finish(
    rank_mask: u16,
    suit_masks: &[u16; 4],
    suit_counts: &[u8; 4],
    rank_counts: &[u8; 13],
) -> Score {
    if let Some(suit) = suit_counts.iter().position(|&n| n >= 5) {
        let mask = suit_masks[suit];
        return match straight_high(mask) {
            Some(14) => encode(HandType::RoyalFlush, &[14, 13, 12, 11, 10]),
            Some(high) => encode(HandType::StraightFlush, &[high]),
            None => encode(HandType::Flush, &top_ranks(mask, 5)),
        };
    }

    let mut quad = None;
    let mut trips = Vec::new();
    let mut pairs = Vec::new();
    let mut singles = Vec::new();
    for r in (0..13u8).rev() {
        let face = r + 2;
        match rank_counts[r as usize] {
            4 => quad = Some(face),
            3 => trips.push(face),
            2 => pairs.push(face),
            1 => singles.push(face),
            _ => {}
        }
    }

    if let Some(q) = quad {
        let kicker = trips
            .first()
            .into_iter()
            .chain(pairs.first())
            .chain(singles.first())
            .copied()
            .max()
            .expect("seven cards leave a kicker beside quads");
        return encode(HandType::FourOfAKind, &[q, kicker]);
    }
    if let Some(&t) = trips.first() {
        let pair = trips.get(1).into_iter().chain(pairs.first()).copied().max();
        if let Some(p) = pair {
            return encode(HandType::FullHouse, &[t, p]);
        }
    }
    if let Some(high) = straight_high(rank_mask) {
        return encode(HandType::Straight, &[high]);
    }
    if let Some(&t) = trips.first() {
        return encode(HandType::ThreeOfAKind, &[t, singles[0], singles[1]]);
    }
    if pairs.len() >= 2 {
        let kicker = pairs
            .get(2)
            .into_iter()
            .chain(singles.first())
            .copied()
            .max()
            .expect("seven cards leave a kicker beside two pairs");
        return encode(HandType::TwoPair, &[pairs[0], pairs[1], kicker]);
    }
    if pairs.len() == 1 {
        return encode(
            HandType::OnePair,
            &[pairs[0], singles[0], singles[1], singles[2]],
        );
    }
    encode(HandType::HighCard, &singles[0..5])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::naive;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn random_seven(rng: &mut SmallRng) -> [Card; 7] {
        let mut deck: Vec<u8> = (0..52).collect();
        deck.shuffle(rng);
        let cards: Vec<Card> = deck[0..7].iter().map(|&n| Card::from(n)).collect();
        cards.try_into().unwrap()
    }

    #[test]
    fn direct_seven_matches_subset_enumeration() {
        let ref mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..2000 {
            let cards = random_seven(rng);
            assert_eq!(score_7(&cards), naive::score_7(&cards), "{:?}", cards);
        }
    }

    #[test]
    fn batched_lanes_match_scalar() {
        let ref mut rng = SmallRng::seed_from_u64(8);
        for _ in 0..100 {
            let mut batch = HandBatch::new();
            let mut hands = Vec::new();
            for lane in 0..LANES {
                let cards = random_seven(rng);
                batch.load(lane, &cards);
                hands.push(cards);
            }
            let mut out = [0; LANES];
            score_batch(&batch, &mut out);
            let mut scalar = [0; LANES];
            score_batch_scalar(&batch, &mut scalar);
            assert_eq!(out, scalar);
            for (lane, cards) in hands.iter().enumerate() {
                assert_eq!(out[lane], score_7(cards));
            }
        }
    }
}
