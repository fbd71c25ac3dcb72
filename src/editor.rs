//! Set editor: an ordered draft of front/back pairs with a title
//!
//! The draft never has fewer than one card. Submitting validates locally
//! and only then hands the draft to the store.

use thiserror::Error;

use crate::flashcards::{CardSide, DraftCard};
use crate::store::{CardStore, PersistenceError};

pub const BLANK_TITLE_MESSAGE: &str = "Please enter a title for your set.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{}", BLANK_TITLE_MESSAGE)]
    BlankTitle,

    #[error("Card {number} needs both a front and a back.")]
    BlankCard { number: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("No card at position {0}")]
    OutOfRange(usize),

    #[error("A set needs at least one card")]
    LastCard,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Error creating flashcard set.")]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone)]
pub struct SetEditor {
    title: String,
    cards: Vec<DraftCard>,
}

impl Default for SetEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl SetEditor {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            cards: vec![DraftCard::default()],
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn cards(&self) -> &[DraftCard] {
        &self.cards
    }

    /// Add a blank pair at the end
    pub fn append(&mut self) {
        self.cards.push(DraftCard::default());
    }

    pub fn edit(&mut self, index: usize, side: CardSide, value: impl Into<String>) -> Result<(), EditorError> {
        let card = self.cards.get_mut(index).ok_or(EditorError::OutOfRange(index))?;
        match side {
            CardSide::Front => card.front = value.into(),
            CardSide::Back => card.back = value.into(),
        }
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<DraftCard, EditorError> {
        if index >= self.cards.len() {
            return Err(EditorError::OutOfRange(index));
        }
        if self.cards.len() == 1 {
            return Err(EditorError::LastCard);
        }
        Ok(self.cards.remove(index))
    }

    /// Move one card from `from` to `to`, shifting the cards in between
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
        let len = self.cards.len();
        if from >= len {
            return Err(EditorError::OutOfRange(from));
        }
        if to >= len {
            return Err(EditorError::OutOfRange(to));
        }
        let card = self.cards.remove(from);
        self.cards.insert(to, card);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        if let Some(i) = self
            .cards
            .iter()
            .position(|c| c.front.trim().is_empty() || c.back.trim().is_empty())
        {
            return Err(ValidationError::BlankCard { number: i + 1 });
        }
        Ok(())
    }

    /// Validate and create the set. On success the draft is cleared back to
    /// one blank pair; on failure it is left as it was.
    ///
    /// The editor stays mutably borrowed until the store answers, so a second
    /// submission of the same draft cannot start meanwhile.
    pub async fn submit(&mut self, store: &dyn CardStore, owner: Option<&str>) -> Result<String, SubmitError> {
        self.validate()?;

        match store.create_set(&self.title, owner, &self.cards).await {
            Ok(id) => {
                *self = Self::new();
                Ok(id)
            }
            Err(e) => {
                log::error!("Creating set '{}' failed: {}", self.title, e);
                Err(e.into())
            }
        }
    }
}
