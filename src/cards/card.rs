use super::rank::Rank;
use super::suit::Suit;
use serde::de::Error as _;
use serde::Deserialize;
use serde::Serialize;

/// Card represents a playing card
/// it is a tuple of Rank and Suit packed into one byte
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Card(u8);

impl Card {
    pub fn rank(&self) -> Rank {
        Rank::from(self.0 / 4)
    }
    pub fn suit(&self) -> Suit {
        Suit::from(self.0 % 4)
    }
}

/// (Rank, Suit) isomorphism
impl From<(Rank, Suit)> for Card {
    fn from((r, s): (Rank, Suit)) -> Self {
        Self(u8::from(r) * 4 + u8::from(s))
    }
}

/// u8 isomorphism
/// each card is mapped to its location in a sorted deck 0-51
impl From<Card> for u8 {
    fn from(c: Card) -> u8 {
        c.0
    }
}
impl From<u8> for Card {
    fn from(n: u8) -> Self {
        assert!(n < 52);
        Self(n)
    }
}

/// u64 injection
/// each card is just one bit turned on. this is a one-way morphism
impl From<Card> for u64 {
    fn from(c: Card) -> u64 {
        1 << c.0
    }
}

/// str isomorphism
impl TryFrom<&str> for Card {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.len() != 2 {
            return Err(format!("invalid card str: {}", s));
        }
        let rank = Rank::try_from(&s[0..1])?;
        let suit = Suit::try_from(&s[1..2])?;
        Ok(Card::from((rank, suit)))
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}", self.rank(), self.suit())
    }
}

/// wire form used by the submission JSON: {"rank": 2-14, "suit": 0-3}
#[derive(Serialize, Deserialize)]
struct Wire {
    rank: u8,
    suit: u8,
}

impl Serialize for Card {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Wire {
            rank: self.rank().value(),
            suit: u8::from(self.suit()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Wire::deserialize(deserializer)?;
        if !(2..=14).contains(&wire.rank) {
            return Err(D::Error::custom(format!("rank out of range: {}", wire.rank)));
        }
        if wire.suit > 3 {
            return Err(D::Error::custom(format!("suit out of range: {}", wire.suit)));
        }
        Ok(Card::from((Rank::from(wire.rank - 2), Suit::from(wire.suit))))
    }
}

/// Card encoding for the Cactus Kev style evaluators
///
/// xxxbbbbb bbbbbbbb cdhsrrrr xxpppppp
/// p = prime number of rank, r = rank index, cdhs = suit one-hot, b = rank one-hot
#[derive(Default, Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct CardCactus(pub u32);

pub const PRIMES: [u32; 13] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];

impl From<Card> for CardCactus {
    fn from(n: Card) -> Self {
        let rank = u8::from(n.rank()) as u32;
        let suit = u8::from(n.suit()) as u32;
        let cactus_suit = 1u32 << (3 - suit);
        CardCactus((1u32 << rank) << 16 | cactus_suit << 12 | rank << 8 | PRIMES[rank as usize])
    }
}

impl From<CardCactus> for Card {
    fn from(c: CardCactus) -> Self {
        let rank = (c.0 >> 8) & 0xF;
        let suit = 3 - ((c.0 >> 12) & 0xF).trailing_zeros();
        Card((rank * 4 + suit) as u8)
    }
}
