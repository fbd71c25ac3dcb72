//! Data models for card sets and cards
//!
//! Field names on the wire match the two hosted tables:
//! `cardSets {id, title, user, quantity, created}` and
//! `cards {id, front, back, cardSet, ai, index}`. The local slots store
//! the same JSON shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix marking a card set id
pub const SET_ID_PREFIX: &str = "cdst";
/// Prefix marking a card id
pub const CARD_ID_PREFIX: &str = "cd";

/// Generate a fresh card set id (`cdst` + random v4 UUID)
pub fn new_set_id() -> String {
    format!("{}{}", SET_ID_PREFIX, Uuid::new_v4())
}

/// Generate a fresh card id (`cd` + random v4 UUID)
pub fn new_card_id() -> String {
    format!("{}{}", CARD_ID_PREFIX, Uuid::new_v4())
}

/// A named collection of flashcards owned by zero or one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSet {
    pub id: String,
    pub title: String,
    /// Owning user id, `None` for anonymous and demo sets
    #[serde(rename = "user", default)]
    pub owner: Option<String>,
    /// Number of cards at creation time
    #[serde(default)]
    pub quantity: i32,
    #[serde(rename = "created", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl CardSet {
    pub fn new(title: String, owner: Option<String>, quantity: i32) -> Self {
        Self {
            id: new_set_id(),
            title,
            owner,
            quantity,
            created_at: Utc::now(),
        }
    }
}

/// A flashcard with question (front) and answer (back)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub front: String,
    pub back: String,
    #[serde(rename = "cardSet")]
    pub set_id: String,
    /// Cached AI elaboration of the front text
    #[serde(rename = "ai", default)]
    pub elaboration: Option<String>,
    /// Display order within the set
    #[serde(rename = "index", default)]
    pub position: i32,
}

impl Card {
    pub fn new(set_id: String, front: String, back: String, position: i32) -> Self {
        Self {
            id: new_card_id(),
            front,
            back,
            set_id,
            elaboration: None,
            position,
        }
    }
}

/// An unsaved front/back pair in the set editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftCard {
    pub front: String,
    pub back: String,
}

impl DraftCard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

/// Which side of a draft card to edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardSide {
    Front,
    Back,
}

/// Build the card rows for a new set, numbering positions in submission order
pub fn cards_for_set(set_id: &str, drafts: &[DraftCard]) -> Vec<Card> {
    drafts
        .iter()
        .enumerate()
        .map(|(i, d)| Card::new(set_id.to_string(), d.front.clone(), d.back.clone(), i as i32))
        .collect()
}
