//! Medicine cards: the fixed set of medicines a dose can be logged for.
//!
//! The set comes from `[cards] names` in the config; the built-in default is
//! used when nothing is configured.

use crate::config::CardsConfig;
use crate::types::MedicineCard;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default card set - built once and reused
static DEFAULT_CARDS: Lazy<Vec<MedicineCard>> = Lazy::new(|| {
    ["Aspirin", "Ibuprofen", "Paracetamol"]
        .into_iter()
        .map(MedicineCard::new)
        .collect()
});

/// Get a reference to the built-in card list
pub fn default_cards() -> &'static [MedicineCard] {
    &DEFAULT_CARDS
}

/// Ordered set of medicine cards
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardSet {
    cards: Vec<MedicineCard>,
}

impl Default for CardSet {
    fn default() -> Self {
        Self {
            cards: default_cards().to_vec(),
        }
    }
}

impl CardSet {
    pub fn new(cards: Vec<MedicineCard>) -> Self {
        Self { cards }
    }

    /// Build the card set from configuration, keeping the configured order
    pub fn from_config(config: &CardsConfig) -> Self {
        Self {
            cards: config
                .names
                .iter()
                .map(|name| MedicineCard::new(name.trim()))
                .collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cards.iter().map(|card| card.name.as_str())
    }

    /// Whether `medicine` names one of the cards
    pub fn contains(&self, medicine: &str) -> bool {
        self.cards.iter().any(|card| card.name == medicine)
    }

    /// Validate the card set, returning every problem found
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (index, card) in self.cards.iter().enumerate() {
            if card.name.is_empty() {
                errors.push(format!("Card {} has an empty name", index + 1));
                continue;
            }
            if !seen.insert(card.name.as_str()) {
                errors.push(format!("Card '{}' is listed more than once", card.name));
            }
        }

        errors
    }
}
