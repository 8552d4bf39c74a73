use super::cactus;
use super::score::Score;
use crate::error::EngineError;
use byteorder::LittleEndian;
use byteorder::WriteBytesExt;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

/// Offline generator for the 2+2 state-machine table.
///
/// States are canonical card multisets: suits are stripped from a card
/// as soon as fewer than numcards - 2 cards share its suit, at which
/// point suit can no longer decide the hand. Stripped states collapse
/// transpositions, which is what keeps the table near 130 MB instead of
/// combinatorial blowup. IDs pack up to seven rank/suit bytes sorted
/// descending, so an ID with more cards always compares greater and the
/// enumeration can append while it scans.
pub struct Generator {
    ids: Vec<i64>,
    hr: Vec<i32>,
}

const PRIMES: [u32; 13] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];

/// canonical successor of a state when dealt card 1..=52;
/// returns (0, n) for duplicate or impossible deals
fn make_id(id_in: i64, new_card: u8) -> (i64, usize) {
    let mut suit_count = [0i32; 5];
    let mut rank_count = [0i32; 14];
    let mut wk = [0i64; 8];

    for i in 0..6 {
        wk[i + 1] = (id_in >> (8 * i)) & 0xFF;
    }
    let n = (new_card - 1) as i64;
    wk[0] = (((n >> 2) + 1) << 4) + (n & 3) + 1;

    let mut numcards = 0;
    let mut duplicate = false;
    while numcards < 8 && wk[numcards] != 0 {
        suit_count[(wk[numcards] & 0xF) as usize] += 1;
        rank_count[((wk[numcards] >> 4) & 0xF) as usize] += 1;
        if numcards != 0 && wk[0] == wk[numcards] {
            duplicate = true;
        }
        numcards += 1;
    }
    if duplicate {
        return (0, numcards);
    }
    if numcards > 4 && rank_count[1..14].iter().any(|&c| c > 4) {
        return (0, numcards);
    }

    let needsuited = numcards as i64 - 2;
    if needsuited > 1 {
        for card in wk.iter_mut().take(numcards) {
            if (suit_count[(*card & 0xF) as usize] as i64) < needsuited {
                *card &= 0xF0;
            }
        }
    }

    // sorting network, largest card first
    const SWAPS: [(usize, usize); 16] = [
        (0, 4),
        (1, 5),
        (2, 6),
        (0, 2),
        (1, 3),
        (4, 6),
        (2, 4),
        (3, 5),
        (0, 1),
        (2, 3),
        (4, 5),
        (1, 4),
        (3, 6),
        (1, 2),
        (3, 4),
        (5, 6),
    ];
    for (i, j) in SWAPS {
        if wk[i] < wk[j] {
            wk.swap(i, j);
        }
    }

    let id = (0..7).fold(0i64, |acc, i| acc | (wk[i] << (8 * i)));
    (id, numcards)
}

/// unified score of a canonical state's best hand
fn evaluate(id: i64) -> Score {
    let mut hold = [0i64; 8];
    let mut mainsuit = 20i64;
    let mut count = 0;
    for i in 0..7 {
        hold[i] = (id >> (8 * i)) & 0xFF;
        if hold[i] == 0 {
            break;
        }
        count += 1;
        let suit = hold[i] & 0xF;
        if suit != 0 {
            mainsuit = suit;
        }
    }

    // hand stripped suits arbitrary suits that avoid phantom flushes
    let mut suititerator = 1i64;
    let mut wk = [0u32; 7];
    for i in 0..count {
        let rank = ((hold[i] >> 4) - 1) as u32;
        let mut suit = hold[i] & 0xF;
        if suit == 0 {
            suit = suititerator;
            suititerator += 1;
            if suititerator == 5 {
                suititerator = 1;
            }
            if suit == mainsuit {
                suit = suititerator;
                suititerator += 1;
                if suititerator == 5 {
                    suititerator = 1;
                }
            }
        }
        wk[i] = PRIMES[rank as usize] | (rank << 8) | (1 << (suit + 11)) | (1 << (16 + rank));
    }

    match count {
        5 => cactus::score_5(&[wk[0], wk[1], wk[2], wk[3], wk[4]]),
        6 => {
            let mut best = 0;
            for skip in 0..6 {
                let mut five = [0u32; 5];
                let mut n = 0;
                for (k, &word) in wk.iter().take(6).enumerate() {
                    if k != skip {
                        five[n] = word;
                        n += 1;
                    }
                }
                best = best.max(cactus::score_5(&five));
            }
            best
        }
        7 => {
            let mut best = 0;
            for i in 0..7 {
                for j in i + 1..7 {
                    let mut five = [0u32; 5];
                    let mut n = 0;
                    for (k, &word) in wk.iter().enumerate() {
                        if k != i && k != j {
                            five[n] = word;
                            n += 1;
                        }
                    }
                    best = best.max(cactus::score_5(&five));
                }
            }
            best
        }
        _ => 0,
    }
}

impl Generator {
    pub fn new() -> Self {
        Self {
            ids: vec![0],
            hr: Vec::new(),
        }
    }

    fn save(&mut self, id: i64) -> usize {
        if id == 0 {
            return 0;
        }
        match self.ids.binary_search(&id) {
            Ok(i) => i,
            Err(i) => {
                self.ids.insert(i, id);
                i
            }
        }
    }

    /// pass one: breadth-first enumeration of every canonical state
    pub fn enumerate(&mut self) -> usize {
        let spinner = crate::spinner("enumerating card states");
        let mut idnum = 0;
        while idnum < self.ids.len() {
            for card in 1..=52u8 {
                let (id, numcards) = make_id(self.ids[idnum], card);
                if numcards < 7 {
                    self.save(id);
                }
            }
            idnum += 1;
            if idnum % 10_000 == 0 {
                spinner.set_message(format!("{} states", self.ids.len()));
            }
        }
        spinner.finish_with_message(format!("{} states", self.ids.len()));
        self.ids.len()
    }

    /// pass two: fill transitions with either the child state's slot or,
    /// for completed hands, the final score
    pub fn fill(&mut self) {
        self.hr = vec![0; self.ids.len() * 53 + 53];
        let progress = crate::progress(self.ids.len());
        for idnum in 0..self.ids.len() {
            let mut last_numcards = 0;
            for card in 1..=52u8 {
                let (id, numcards) = make_id(self.ids[idnum], card);
                last_numcards = numcards;
                let slot = if numcards < 7 {
                    (self.save(id) * 53 + 53) as i32
                } else {
                    evaluate(id)
                };
                self.hr[idnum * 53 + card as usize + 53] = slot;
            }
            if last_numcards == 6 || last_numcards == 7 {
                self.hr[idnum * 53 + 53] = evaluate(self.ids[idnum]);
            }
            progress.inc(1);
        }
        progress.finish();
    }

    /// write the populated prefix as little-endian i32
    pub fn write(&self, path: &Path) -> Result<(), EngineError> {
        let file = std::fs::File::create(path)
            .map_err(|e| EngineError::Resource(format!("create {}: {}", path.display(), e)))?;
        let mut out = BufWriter::new(file);
        for &cell in &self.hr {
            out.write_i32::<LittleEndian>(cell)
                .map_err(|e| EngineError::Resource(e.to_string()))?;
        }
        out.flush()
            .map_err(|e| EngineError::Resource(e.to_string()))?;
        Ok(())
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_states_keep_their_suits() {
        // suit stripping only starts once four cards are on board
        let (id, numcards) = make_id(0, 1);
        assert_eq!(numcards, 1);
        assert_eq!(id >> 4, 1);
        assert_eq!(id & 0xF, 1);
        assert_ne!(make_id(0, 2).0, id);
    }

    #[test]
    fn duplicate_deal_is_rejected() {
        // the same physical card cannot be dealt twice
        let (state, _) = make_id(0, 49);
        let (redeal, _) = make_id(state, 49);
        assert_eq!(redeal, 0);
    }

    #[test]
    fn canonical_ids_sort_by_card_count() {
        let (one, _) = make_id(0, 52);
        let (two, _) = make_id(one, 1);
        assert!(two > one);
    }

    #[test]
    fn evaluate_scores_a_royal_flush() {
        // build As Ks Qs Js Ts 2d 3c as a raw 7-card state;
        // rank is 1..=13 in the high nibble, suit 1..=4 in the low
        let cards: [i64; 7] = [
            (13 << 4) | 1, // A of suit 1
            (12 << 4) | 1,
            (11 << 4) | 1,
            (10 << 4) | 1,
            (9 << 4) | 1, // T of suit 1
            (1 << 4) | 2, // 2 of suit 2
            (2 << 4) | 3, // 3 of suit 3
        ];
        let id = cards
            .iter()
            .enumerate()
            .fold(0i64, |acc, (i, &c)| acc | (c << (8 * i)));
        use crate::evaluation::score::HandType;
        assert_eq!(HandType::from(evaluate(id)), HandType::RoyalFlush);
    }
}
