use super::score::encode;
use super::score::straight_high;
use super::score::top_ranks;
use super::score::HandType;
use super::score::Score;
use once_cell::sync::Lazy;

/// 13-bit rank masks over one suit
pub const FLUSH_TABLE_SIZE: usize = 8192;
/// colex indices of 7-rank multisets over [0,12]
pub const RANK_TABLE_SIZE: usize = 50388;

/// Lookup tables for the combinatorial-index evaluator, built once per
/// process and read-only afterwards. Roughly 228 KB.
pub struct Tables {
    /// hash[i][j] = C(j + i, i + 1), the colex weight of value j at slot i
    pub hash: [[u32; 13]; 7],
    /// scores for flush hands keyed by the flush suit's rank mask
    pub flush: Vec<Score>,
    /// scores for non-flush hands keyed by the colex index of the rank multiset
    pub rank: Vec<Score>,
}

static TABLES: Lazy<Tables> = Lazy::new(Tables::build);

impl Tables {
    pub fn get() -> &'static Tables {
        &TABLES
    }

    /// colex index of seven rank indices sorted ascending
    pub fn colex(&self, ranks: &[u8; 7]) -> usize {
        debug_assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
        ranks
            .iter()
            .enumerate()
            .map(|(i, &r)| self.hash[i][r as usize] as usize)
            .sum()
    }

    pub fn build() -> Self {
        let hash = Self::binomials();
        Self {
            flush: Self::flushes(),
            rank: Self::ranks(&hash),
            hash,
        }
    }

    fn binomial(n: u32, k: u32) -> u32 {
        if k > n {
            return 0;
        }
        let k = k.min(n - k);
        let mut result = 1u64;
        for i in 0..k as u64 {
            result = result * (n as u64 - i) / (i + 1);
        }
        result as u32
    }

    fn binomials() -> [[u32; 13]; 7] {
        let mut hash = [[0u32; 13]; 7];
        for (i, row) in hash.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = Self::binomial((j + i) as u32, i as u32 + 1);
            }
        }
        hash
    }

    /// Sweep all 8192 rank masks. Masks with fewer than five cards can
    /// never be looked up and stay zero. Straight detection runs over
    /// the whole mask, so six or seven suited cards still surface their
    /// straight flush before kicker truncation.
    fn flushes() -> Vec<Score> {
        let mut table = vec![0; FLUSH_TABLE_SIZE];
        for (mask, slot) in table.iter_mut().enumerate() {
            let mask = mask as u16;
            if mask.count_ones() < 5 {
                continue;
            }
            *slot = match straight_high(mask) {
                Some(14) => encode(HandType::RoyalFlush, &[14, 13, 12, 11, 10]),
                Some(high) => encode(HandType::StraightFlush, &[high]),
                None => encode(HandType::Flush, &top_ranks(mask, 5)),
            };
        }
        table
    }

    /// Enumerate all 7-multisets over [0,12] in colexicographic order
    /// and score each at its hash index.
    fn ranks(hash: &[[u32; 13]; 7]) -> Vec<Score> {
        let mut table = vec![0; RANK_TABLE_SIZE];
        let mut multiset = [0u8; 7];
        loop {
            let index: usize = multiset
                .iter()
                .enumerate()
                .map(|(i, &r)| hash[i][r as usize] as usize)
                .sum();
            table[index] = score_multiset(&multiset);
            if !next_colex(&mut multiset) {
                break;
            }
        }
        table
    }
}

/// advance to the next multiset in colex order; false once exhausted
fn next_colex(multiset: &mut [u8; 7]) -> bool {
    let Some(i) = multiset.iter().rposition(|&r| r < 12) else {
        return false;
    };
    multiset[i] += 1;
    let value = multiset[i];
    for slot in multiset.iter_mut().skip(i + 1) {
        *slot = value;
    }
    true
}

/// Score of a 7-rank multiset with no flush present. Multisets the deck
/// cannot produce (five or more of one rank) still get a value so the
/// table has no holes; real lookups never reach them.
fn score_multiset(multiset: &[u8; 7]) -> Score {
    let mut counts = [0u8; 13];
    let mut mask = 0u16;
    for &r in multiset {
        counts[r as usize] += 1;
        mask |= 1 << r;
    }

    let mut quads = Vec::new();
    let mut trips = Vec::new();
    let mut pairs = Vec::new();
    let mut singles = Vec::new();
    for r in (0..13u8).rev() {
        let face = r + 2;
        match counts[r as usize] {
            0 => {}
            1 => singles.push(face),
            2 => pairs.push(face),
            3 => trips.push(face),
            _ => quads.push(face),
        }
    }

    if let Some(&q) = quads.first() {
        // best kicker is the highest remaining rank of any multiplicity
        let kicker = trips
            .first()
            .into_iter()
            .chain(pairs.first())
            .chain(singles.first())
            .chain(quads.get(1))
            .copied()
            .max();
        return match kicker {
            Some(k) => encode(HandType::FourOfAKind, &[q, k]),
            None => encode(HandType::FourOfAKind, &[q]),
        };
    }
    if let Some(&t) = trips.first() {
        let pair = trips.get(1).into_iter().chain(pairs.first()).copied().max();
        if let Some(p) = pair {
            return encode(HandType::FullHouse, &[t, p]);
        }
    }
    if let Some(high) = straight_high(mask) {
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
            .expect("seven ranks leave a kicker beside two pairs");
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

    #[test]
    fn binomial_recurrence_matches_pascal() {
        let tables = Tables::build();
        assert_eq!(tables.hash[0][0], 0); // C(0,1)
        assert_eq!(tables.hash[0][1], 1); // C(1,1)
        assert_eq!(tables.hash[1][2], 3); // C(3,2)
        assert_eq!(tables.hash[6][12], Tables::binomial(18, 7));
    }

    #[test]
    fn colex_enumeration_is_dense_and_deterministic() {
        let a = Tables::build();
        let b = Tables::build();
        assert_eq!(a.flush, b.flush);
        assert_eq!(a.rank, b.rank);
        assert_eq!(a.hash, b.hash);
        // first and last multisets land on the table edges
        assert_eq!(a.colex(&[0; 7]), 0);
        assert_eq!(a.colex(&[12; 7]), RANK_TABLE_SIZE - 1);
    }

    #[test]
    fn flush_table_knows_the_wheel() {
        let tables = Tables::get();
        assert_eq!(
            tables.flush[0x100F],
            encode(HandType::StraightFlush, &[5])
        );
        assert_eq!(
            tables.flush[0x1F00],
            encode(HandType::RoyalFlush, &[14, 13, 12, 11, 10])
        );
    }

    #[test]
    fn sparse_masks_stay_empty() {
        let tables = Tables::get();
        assert_eq!(tables.flush[0b1111], 0);
    }
}
