use super::card::Card;

/// Hole represents the two private cards of one player.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Hole(pub Card, pub Card);

impl From<(Card, Card)> for Hole {
    fn from((a, b): (Card, Card)) -> Self {
        Self(a, b)
    }
}

impl Hole {
    pub fn cards(&self) -> [Card; 2] {
        [self.0, self.1]
    }

    /// canonical starting-hand class: pocket pairs "AA", suited "AKs",
    /// offsuit "72o", with the higher rank first
    pub fn class(&self) -> String {
        let hi = self.0.rank().max(self.1.rank());
        let lo = self.0.rank().min(self.1.rank());
        if hi == lo {
            format!("{}{}", hi, lo)
        } else if self.0.suit() == self.1.suit() {
            format!("{}{}s", hi, lo)
        } else {
            format!("{}{}o", hi, lo)
        }
    }
}

/// degenerate class for failed deals
pub const UNKNOWN_CLASS: &str = "??";

impl std::fmt::Display for Hole {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole(a: &str, b: &str) -> Hole {
        Hole::from((Card::try_from(a).unwrap(), Card::try_from(b).unwrap()))
    }

    #[test]
    fn pocket_pair() {
        assert_eq!(hole("As", "Ah").class(), "AA");
    }

    #[test]
    fn suited_orders_high_first() {
        assert_eq!(hole("Ks", "As").class(), "AKs");
    }

    #[test]
    fn offsuit() {
        assert_eq!(hole("2c", "7d").class(), "72o");
    }
}
