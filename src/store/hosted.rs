//! Hosted storage for card sets
//!
//! Two remote tables, `cardSets` and `cards`, reached through a [`TableApi`].
//! Creating a set is two inserts with no transaction around them; if the
//! card insert fails the set is removed again by compensating deletes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::{CardStore, During, PersistenceError, Result, StoreFailure};
use crate::flashcards::{cards_for_set, Card, CardSet, DraftCard};

pub const SETS_TABLE: &str = "cardSets";
pub const CARDS_TABLE: &str = "cards";

/// Column equality filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: &'static str,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// Row-level access to remote tables
#[async_trait]
pub trait TableApi: Send + Sync {
    async fn insert(&self, table: &str, rows: Vec<Value>) -> std::result::Result<(), StoreFailure>;

    /// Rows matching every filter, ascending by `order_by` when given
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order_by: Option<&str>,
    ) -> std::result::Result<Vec<Value>, StoreFailure>;

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> std::result::Result<(), StoreFailure>;

    async fn delete(&self, table: &str, filter: &Filter) -> std::result::Result<(), StoreFailure>;
}

/// Multi-tenant store over the hosted tables
pub struct HostedStore {
    tables: Arc<dyn TableApi>,
}

impl HostedStore {
    pub fn new(tables: Arc<dyn TableApi>) -> Self {
        Self { tables }
    }

    async fn insert_cards(&self, cards: &[Card]) -> std::result::Result<(), StoreFailure> {
        let rows = cards
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.tables.insert(CARDS_TABLE, rows).await
    }

    /// Best-effort removal of a half-created set
    async fn rollback_set(&self, set_id: &str) {
        if let Err(e) = self.tables.delete(CARDS_TABLE, &Filter::eq("cardSet", set_id)).await {
            log::warn!("Rollback: failed to delete cards of set {}: {}", set_id, e);
        }
        if let Err(e) = self.tables.delete(SETS_TABLE, &Filter::eq("id", set_id)).await {
            log::warn!("Rollback: failed to delete set {}: {}", set_id, e);
        }
    }
}

fn parse_rows<T: DeserializeOwned>(rows: Vec<Value>) -> std::result::Result<Vec<T>, StoreFailure> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreFailure::from))
        .collect()
}

#[async_trait]
impl CardStore for HostedStore {
    async fn create_set(&self, title: &str, owner: Option<&str>, drafts: &[DraftCard]) -> Result<String> {
        let set = CardSet::new(title.to_string(), owner.map(str::to_string), drafts.len() as i32);
        let row = serde_json::to_value(&set).during("createSet")?;
        self.tables.insert(SETS_TABLE, vec![row]).await.during("createSet")?;

        let cards = cards_for_set(&set.id, drafts);
        if let Err(e) = self.insert_cards(&cards).await {
            log::error!("Inserting cards for set {} failed, rolling back: {}", set.id, e);
            self.rollback_set(&set.id).await;
            return Err(PersistenceError::new("createSet", e));
        }

        log::info!("Created set {} with {} cards", set.id, cards.len());
        Ok(set.id)
    }

    async fn list_sets(&self, owner: Option<&str>) -> Result<Vec<CardSet>> {
        let filters: Vec<Filter> = owner.map(|o| Filter::eq("user", o)).into_iter().collect();
        let rows = self
            .tables
            .select(SETS_TABLE, &filters, Some("created"))
            .await
            .during("listSets")?;
        parse_rows(rows).during("listSets")
    }

    async fn get_set(&self, id: &str) -> Result<Option<CardSet>> {
        let rows = self
            .tables
            .select(SETS_TABLE, &[Filter::eq("id", id)], None)
            .await
            .during("getSet")?;
        let mut sets: Vec<CardSet> = parse_rows(rows).during("getSet")?;
        Ok(if sets.is_empty() { None } else { Some(sets.swap_remove(0)) })
    }

    async fn list_cards(&self, set_id: &str) -> Result<Vec<Card>> {
        let rows = self
            .tables
            .select(CARDS_TABLE, &[Filter::eq("cardSet", set_id)], Some("index"))
            .await
            .during("listCards")?;
        parse_rows(rows).during("listCards")
    }

    async fn update_card_elaboration(&self, card_id: &str, text: &str) -> Result<()> {
        self.tables
            .update(CARDS_TABLE, &Filter::eq("id", card_id), json!({ "ai": text }))
            .await
            .during("updateCardElaboration")
    }

    async fn delete_set(&self, id: &str) -> Result<()> {
        self.tables
            .delete(CARDS_TABLE, &Filter::eq("cardSet", id))
            .await
            .during("deleteSet")?;
        self.tables
            .delete(SETS_TABLE, &Filter::eq("id", id))
            .await
            .during("deleteSet")?;
        log::info!("Deleted set {}", id);
        Ok(())
    }
}
