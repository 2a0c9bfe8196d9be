//! Fixed card catalog and shuffled deals.

use std::fmt;

use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

/// Number of distinct pairs in the catalog.
pub const PAIR_COUNT: usize = 10;
/// Number of physical cards in a full deal.
pub const CARD_COUNT: usize = PAIR_COUNT * 2;

/// Which face a card shows once flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CardKind {
    /// Picture side of a pair.
    Image,
    /// Written name side of a pair.
    Label,
}

/// Stable identifier of a physical card, unique across the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CardId(pub u8);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single immutable card from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    /// Identity of the physical card.
    pub id: CardId,
    /// Face kind.
    pub kind: CardKind,
    /// Display payload: an icon for image cards, a name for label cards.
    pub content: &'static str,
    /// Key shared by exactly two cards forming a pair.
    pub pair_key: &'static str,
}

impl Card {
    /// Two cards form a pair when they share a key and show different faces.
    pub fn pairs_with(&self, other: &Card) -> bool {
        self.pair_key == other.pair_key && self.kind != other.kind
    }
}

struct CatalogEntry {
    pair_key: &'static str,
    icon: &'static str,
    label: &'static str,
}

const CATALOG: [CatalogEntry; PAIR_COUNT] = [
    CatalogEntry { pair_key: "firebase", icon: "{FB}", label: "Firebase" },
    CatalogEntry { pair_key: "flutter", icon: "<FL>", label: "Flutter" },
    CatalogEntry { pair_key: "java", icon: "[JV]", label: "Java" },
    CatalogEntry { pair_key: "kotlin", icon: "(KT)", label: "Kotlin" },
    CatalogEntry { pair_key: "python", icon: "~PY~", label: "Python" },
    CatalogEntry { pair_key: "react", icon: "@RX@", label: "React" },
    CatalogEntry { pair_key: "ruby", icon: "<RB>", label: "Ruby" },
    CatalogEntry { pair_key: "sql", icon: "|DB|", label: "SQL" },
    CatalogEntry { pair_key: "swift", icon: ">SW>", label: "Swift" },
    CatalogEntry { pair_key: "vsc", icon: "</>", label: "VS Code" },
];

/// Build the full catalog in its canonical order: image then label for each key.
pub fn catalog() -> Vec<Card> {
    CATALOG
        .iter()
        .enumerate()
        .flat_map(|(index, entry)| {
            let base = (index * 2) as u8;
            [
                Card {
                    id: CardId(base + 1),
                    kind: CardKind::Image,
                    content: entry.icon,
                    pair_key: entry.pair_key,
                },
                Card {
                    id: CardId(base + 2),
                    kind: CardKind::Label,
                    content: entry.label,
                    pair_key: entry.pair_key,
                },
            ]
        })
        .collect()
}

/// Layout of one round: every catalog card exactly once, in dealt order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Cards in dealt order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards in the layout.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether nothing has been dealt yet.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Look up a card by id.
    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Card at a layout position.
    pub fn at(&self, position: usize) -> Option<&Card> {
        self.cards.get(position)
    }
}

/// Deal a fresh layout: the catalog under a uniform Fisher-Yates shuffle.
pub fn new_deal<R: Rng + ?Sized>(rng: &mut R) -> Deck {
    let mut cards = catalog();
    cards.shuffle(rng);
    Deck { cards }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn deal_contains_every_pair_once_per_kind() {
        let mut rng = StdRng::seed_from_u64(11);
        let deck = new_deal(&mut rng);
        assert_eq!(deck.len(), CARD_COUNT);

        let mut kinds: HashMap<&str, Vec<CardKind>> = HashMap::new();
        for card in deck.cards() {
            kinds.entry(card.pair_key).or_default().push(card.kind);
        }
        assert_eq!(kinds.len(), PAIR_COUNT);
        for (key, faces) in kinds {
            assert_eq!(faces.len(), 2, "{key} should appear twice");
            assert!(faces.contains(&CardKind::Image), "{key} lacks an image");
            assert!(faces.contains(&CardKind::Label), "{key} lacks a label");
        }
    }

    #[test]
    fn deal_is_a_permutation_of_the_catalog() {
        let mut rng = StdRng::seed_from_u64(3);
        let deck = new_deal(&mut rng);
        let dealt: BTreeSet<CardId> = deck.cards().iter().map(|card| card.id).collect();
        let expected: BTreeSet<CardId> = catalog().iter().map(|card| card.id).collect();
        assert_eq!(dealt, expected);
        assert_eq!(dealt.len(), CARD_COUNT);
    }

    #[test]
    fn first_position_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 20_000;
        let mut counts: HashMap<CardId, usize> = HashMap::new();
        for _ in 0..trials {
            let deck = new_deal(&mut rng);
            *counts.entry(deck.cards()[0].id).or_default() += 1;
        }

        assert_eq!(counts.len(), CARD_COUNT, "every card must be able to lead");
        let expected = trials / CARD_COUNT;
        for (id, count) in counts {
            assert!(
                count > expected * 8 / 10 && count < expected * 12 / 10,
                "card {id} led {count} times, expected about {expected}"
            );
        }
    }

    #[test]
    fn pairing_requires_matching_key_and_different_faces() {
        let cards = catalog();
        let image = &cards[0];
        let label = &cards[1];
        let other = &cards[2];
        assert!(image.pairs_with(label));
        assert!(label.pairs_with(image));
        assert!(!image.pairs_with(other));

        let twin = Card {
            id: CardId(99),
            ..image.clone()
        };
        assert!(!image.pairs_with(&twin));
    }

    #[test]
    fn lookup_by_id_and_position() {
        let mut rng = StdRng::seed_from_u64(5);
        let deck = new_deal(&mut rng);
        let first = deck.at(0).cloned().expect("dealt card");
        assert_eq!(deck.get(first.id), Some(&first));
        assert!(deck.get(CardId(0)).is_none());
        assert!(deck.at(CARD_COUNT).is_none());
    }
}
