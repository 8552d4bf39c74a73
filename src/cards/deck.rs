use super::card::Card;
use rand::Rng;

/// Deck is an unordered set of Cards stored as a 52-bit bitstring.
/// Removal is O(1); random selection walks the set bits so sampling
/// never allocates. Randomness comes from a caller-supplied RNG so each
/// worker thread can own one without contention.
#[derive(Debug, Clone, Copy)]
pub struct Deck(u64);

impl Deck {
    const FULL: u64 = (1 << 52) - 1;

    pub fn new() -> Self {
        Self(Self::FULL)
    }

    pub fn size(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn contains(&self, card: Card) -> bool {
        self.0 & u64::from(card) != 0
    }

    /// remove a specific card from the deck
    pub fn remove(&mut self, card: Card) {
        self.0 &= !u64::from(card);
    }

    /// remove a uniformly random card from the deck
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<Card> {
        let n = self.size();
        if n == 0 {
            return None;
        }
        let i = rng.gen_range(0..n);
        let mut bits = self.0;
        for _ in 0..i {
            bits &= bits - 1;
        }
        let card = Card::from(bits.trailing_zeros() as u8);
        self.remove(card);
        Some(card)
    }

    /// draw n cards without replacement
    pub fn sample<R: Rng>(&mut self, rng: &mut R, n: usize) -> Option<Vec<Card>> {
        if self.size() < n {
            return None;
        }
        Some((0..n).filter_map(|_| self.draw(rng)).collect())
    }

    /// deal two cards as a Hole
    pub fn hole<R: Rng>(&mut self, rng: &mut R) -> Option<super::hole::Hole> {
        if self.size() < 2 {
            return None;
        }
        let a = self.draw(rng)?;
        let b = self.draw(rng)?;
        Some(super::hole::Hole::from((a, b)))
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn fresh_deck_has_52() {
        assert_eq!(Deck::new().size(), 52);
    }

    #[test]
    fn removal_is_idempotent() {
        let mut deck = Deck::new();
        let card = Card::try_from("As").unwrap();
        deck.remove(card);
        deck.remove(card);
        assert_eq!(deck.size(), 51);
        assert!(!deck.contains(card));
    }

    #[test]
    fn draw_never_repeats() {
        let ref mut rng = SmallRng::seed_from_u64(1);
        let mut deck = Deck::new();
        let mut seen = std::collections::HashSet::new();
        while let Some(card) = deck.draw(rng) {
            assert!(seen.insert(card));
        }
        assert_eq!(seen.len(), 52);
        assert_eq!(deck.size(), 0);
        assert!(deck.draw(rng).is_none());
    }

    #[test]
    fn sample_fails_when_short() {
        let ref mut rng = SmallRng::seed_from_u64(2);
        let mut deck = Deck::new();
        for _ in 0..51 {
            deck.draw(rng);
        }
        assert!(deck.sample(rng, 2).is_none());
    }
}
