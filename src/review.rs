//! Review session for one card set
//!
//! Holds the fetched card order (`base`), the order being shown (`active`,
//! possibly shuffled), the current position and which face is up. Shuffling
//! never touches `base`, so unshuffling always restores the fetched order.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::flashcards::Card;

/// What the elaboration panel shows for the current card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "camelCase")]
pub enum ElaborationView<'a> {
    Cached(&'a str),
    NoneYet,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    base: Vec<Card>,
    active: Vec<Card>,
    position: usize,
    face_up: bool,
    shuffled: bool,
}

impl ReviewSession {
    pub fn new(cards: Vec<Card>) -> Self {
        let mut session = Self::default();
        session.load(cards);
        session
    }

    /// Replace the cards and start over at the first card, front up
    pub fn load(&mut self, cards: Vec<Card>) {
        self.active = cards.clone();
        self.base = cards;
        self.position = 0;
        self.face_up = true;
        self.shuffled = false;
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// True while the front is showing
    pub fn face_up(&self) -> bool {
        self.face_up
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    pub fn can_go_back(&self) -> bool {
        !self.is_empty() && self.position > 0
    }

    pub fn can_go_forward(&self) -> bool {
        !self.is_empty() && self.position < self.len() - 1
    }

    pub fn current(&self) -> Option<&Card> {
        self.active.get(self.position)
    }

    /// Text of the face currently showing
    pub fn visible_text(&self) -> Option<&str> {
        self.current().map(|c| if self.face_up { c.front.as_str() } else { c.back.as_str() })
    }

    /// Cards in the order being reviewed
    pub fn cards(&self) -> &[Card] {
        &self.active
    }

    /// Cards in fetched order
    pub fn base_order(&self) -> &[Card] {
        &self.base
    }

    pub fn next(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.position += 1;
        self.face_up = true;
        true
    }

    pub fn previous(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.position -= 1;
        self.face_up = true;
        true
    }

    pub fn flip(&mut self) {
        self.face_up = !self.face_up;
    }

    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.position = index;
        self.face_up = true;
        true
    }

    pub fn toggle_shuffle(&mut self) {
        self.toggle_shuffle_with(&mut rand::thread_rng());
    }

    /// Shuffle or restore the fetched order. Sets of fewer than two cards
    /// are left alone.
    pub fn toggle_shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.len() < 2 {
            return;
        }

        if self.shuffled {
            self.active = self.base.clone();
            self.shuffled = false;
        } else {
            let mut order = self.base.clone();
            order.shuffle(rng);
            self.active = order;
            self.shuffled = true;
        }
        self.position = 0;
        self.face_up = true;
        log::debug!("Review session shuffled: {}", self.shuffled);
    }

    pub fn current_elaboration(&self) -> Option<ElaborationView<'_>> {
        self.current().map(|c| match c.elaboration.as_deref() {
            Some(text) => ElaborationView::Cached(text),
            None => ElaborationView::NoneYet,
        })
    }

    /// Record a fresh elaboration for a card in both orders
    pub fn apply_elaboration(&mut self, card_id: &str, text: &str) {
        for card in self.base.iter_mut().chain(self.active.iter_mut()) {
            if card.id == card_id {
                card.elaboration = Some(text.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cards(n: usize) -> Vec<Card> {
        (0..n)
            .map(|i| Card::new("cdstT".to_string(), format!("Q{}", i + 1), format!("A{}", i + 1), i as i32))
            .collect()
    }

    fn ids(cards: &[Card]) -> Vec<String> {
        cards.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn test_load_shows_first_front() {
        let session = ReviewSession::new(cards(2));
        assert_eq!(session.position(), 0);
        assert!(session.face_up());
        assert_eq!(session.visible_text(), Some("Q1"));
        assert!(!session.can_go_back());
        assert!(session.can_go_forward());
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut session = ReviewSession::new(cards(3));

        assert!(!session.previous());
        assert_eq!(session.position(), 0);

        assert!(session.next());
        assert!(session.next());
        assert!(!session.can_go_forward());
        assert!(!session.next());
        assert_eq!(session.position(), 2);

        assert!(session.previous());
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn test_moving_resets_face() {
        let mut session = ReviewSession::new(cards(2));
        session.flip();
        assert_eq!(session.visible_text(), Some("A1"));
        session.next();
        assert!(session.face_up());
        assert_eq!(session.visible_text(), Some("Q2"));
    }

    #[test]
    fn test_flip_keeps_position() {
        let mut session = ReviewSession::new(cards(3));
        session.jump_to(2);
        session.flip();
        session.flip();
        assert_eq!(session.position(), 2);
        assert!(session.face_up());
    }

    #[test]
    fn test_jump_to_rejects_out_of_range() {
        let mut session = ReviewSession::new(cards(2));
        session.flip();
        assert!(!session.jump_to(2));
        assert!(!session.face_up());
        assert!(session.jump_to(1));
        assert!(session.face_up());
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn test_empty_session_is_inert() {
        let mut session = ReviewSession::new(Vec::new());
        assert!(!session.can_go_back());
        assert!(!session.can_go_forward());
        assert!(!session.next());
        assert!(!session.previous());
        assert!(!session.jump_to(0));
        session.flip();
        session.toggle_shuffle();
        assert!(session.current().is_none());
        assert!(session.visible_text().is_none());
        assert!(session.current_elaboration().is_none());
    }

    #[test]
    fn test_double_toggle_restores_order() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 0..8 {
            let mut session = ReviewSession::new(cards(n));
            let original = ids(session.cards());

            session.toggle_shuffle_with(&mut rng);
            session.toggle_shuffle_with(&mut rng);

            assert_eq!(ids(session.cards()), original);
            assert!(!session.is_shuffled());
        }
    }

    #[test]
    fn test_shuffle_keeps_base_and_resets_position() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut session = ReviewSession::new(cards(6));
        let original = ids(session.base_order());
        session.jump_to(4);

        session.toggle_shuffle_with(&mut rng);

        assert!(session.is_shuffled());
        assert_eq!(session.position(), 0);
        assert_eq!(ids(session.base_order()), original);
        let mut shuffled = ids(session.cards());
        shuffled.sort();
        let mut sorted = original.clone();
        sorted.sort();
        assert_eq!(shuffled, sorted);
    }

    #[test]
    fn test_single_card_shuffle_is_noop() {
        let mut session = ReviewSession::new(cards(1));
        session.toggle_shuffle();
        assert!(!session.is_shuffled());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_elaboration_cache() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = ReviewSession::new(cards(3));
        assert_eq!(session.current_elaboration(), Some(ElaborationView::NoneYet));

        let id = session.current().unwrap().id.clone();
        session.apply_elaboration(&id, "explained");
        assert_eq!(session.current_elaboration(), Some(ElaborationView::Cached("explained")));

        session.toggle_shuffle_with(&mut rng);
        session.toggle_shuffle_with(&mut rng);
        assert_eq!(session.base_order()[0].elaboration.as_deref(), Some("explained"));
        assert_eq!(session.base_order()[1].elaboration, None);
    }
}
