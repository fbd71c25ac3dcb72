//! Local (demo mode) storage for card sets
//!
//! Directory structure:
//! ```text
//! {data-dir}/
//! ├── cardSets.json   # Array of all card sets
//! └── cards.json      # Array of all cards
//! ```
//!
//! Each operation reads the slots it needs whole, mutates in memory and
//! writes them back whole.

use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CardStore, During, PersistenceError, Result, StoreFailure};
use crate::flashcards::{cards_for_set, Card, CardSet, DraftCard};

/// Slot holding the serialized card sets
pub const SETS_SLOT: &str = "cardSets";
/// Slot holding the serialized cards
pub const CARDS_SLOT: &str = "cards";

/// Single-tenant store backed by two JSON slots
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slot))
    }

    fn read_slot<T: DeserializeOwned>(&self, slot: &str) -> std::result::Result<Vec<T>, StoreFailure> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_slot<T: Serialize>(&self, slot: &str, items: &[T]) -> std::result::Result<(), StoreFailure> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.slot_path(slot), serde_json::to_string_pretty(items)?)?;
        Ok(())
    }
}

#[async_trait]
impl CardStore for LocalStore {
    async fn create_set(&self, title: &str, owner: Option<&str>, drafts: &[DraftCard]) -> Result<String> {
        let mut sets: Vec<CardSet> = self.read_slot(SETS_SLOT).during("createSet")?;
        let mut cards: Vec<Card> = self.read_slot(CARDS_SLOT).during("createSet")?;

        let set = CardSet::new(title.to_string(), owner.map(str::to_string), drafts.len() as i32);
        let id = set.id.clone();
        let existing = cards.len();
        cards.extend(cards_for_set(&id, drafts));
        sets.push(set);

        self.write_slot(CARDS_SLOT, &cards).during("createSet")?;
        if let Err(e) = self.write_slot(SETS_SLOT, &sets) {
            log::error!("Writing local set {} failed, removing its cards: {}", id, e);
            cards.truncate(existing);
            if let Err(cleanup) = self.write_slot(CARDS_SLOT, &cards) {
                log::warn!("Failed to remove cards of unsaved set {}: {}", id, cleanup);
            }
            return Err(PersistenceError::new("createSet", e));
        }

        log::info!("Created local set {} with {} cards", id, drafts.len());
        Ok(id)
    }

    async fn list_sets(&self, _owner: Option<&str>) -> Result<Vec<CardSet>> {
        self.read_slot(SETS_SLOT).during("listSets")
    }

    async fn get_set(&self, id: &str) -> Result<Option<CardSet>> {
        let sets: Vec<CardSet> = self.read_slot(SETS_SLOT).during("getSet")?;
        Ok(sets.into_iter().find(|s| s.id == id))
    }

    async fn list_cards(&self, set_id: &str) -> Result<Vec<Card>> {
        let cards: Vec<Card> = self.read_slot(CARDS_SLOT).during("listCards")?;
        let mut cards: Vec<Card> = cards.into_iter().filter(|c| c.set_id == set_id).collect();
        cards.sort_by_key(|c| c.position);
        Ok(cards)
    }

    async fn update_card_elaboration(&self, card_id: &str, text: &str) -> Result<()> {
        let mut cards: Vec<Card> = self.read_slot(CARDS_SLOT).during("updateCardElaboration")?;
        match cards.iter_mut().find(|c| c.id == card_id) {
            Some(card) => card.elaboration = Some(text.to_string()),
            None => {
                log::debug!("No local card {} to attach an elaboration to", card_id);
                return Ok(());
            }
        }
        self.write_slot(CARDS_SLOT, &cards).during("updateCardElaboration")
    }

    async fn delete_set(&self, id: &str) -> Result<()> {
        let mut cards: Vec<Card> = self.read_slot(CARDS_SLOT).during("deleteSet")?;
        cards.retain(|c| c.set_id != id);
        self.write_slot(CARDS_SLOT, &cards).during("deleteSet")?;

        let mut sets: Vec<CardSet> = self.read_slot(SETS_SLOT).during("deleteSet")?;
        sets.retain(|s| s.id != id);
        self.write_slot(SETS_SLOT, &sets).during("deleteSet")?;

        log::info!("Deleted local set {}", id);
        Ok(())
    }
}
