use super::model::InsightCard;
use crate::error::{KomorebiError, Result};
use crate::storage::{StorageAdapter, keys};
use crate::user::UserContext;

/// Stored insight cards (`insight-cards`).
#[derive(Clone)]
pub struct InsightGallery {
    storage: StorageAdapter,
}

impl InsightGallery {
    pub fn new(storage: StorageAdapter) -> Self {
        Self { storage }
    }

    /// Pinned cards first, then newest first.
    pub fn list(&self, user: &UserContext) -> Vec<InsightCard> {
        let mut cards = self.load(user);
        cards.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        cards
    }

    pub fn find(&self, user: &UserContext, id: &str) -> Option<InsightCard> {
        self.load(user).into_iter().find(|c| c.id == id)
    }

    pub fn save(&self, user: &UserContext, card: InsightCard) -> Result<()> {
        let mut cards = self.load(user);
        cards.push(card);
        self.storage.try_set(user, keys::INSIGHT_CARDS, &cards)
    }

    /// Flips the pin on a card and returns the new state.
    pub fn toggle_pin(&self, user: &UserContext, id: &str) -> Result<bool> {
        let mut cards = self.load(user);
        let card = cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| KomorebiError::not_found("InsightCard", id))?;
        card.is_pinned = !card.is_pinned;
        let pinned = card.is_pinned;
        self.storage.try_set(user, keys::INSIGHT_CARDS, &cards)?;
        Ok(pinned)
    }

    pub fn delete(&self, user: &UserContext, id: &str) -> Result<()> {
        let mut cards = self.load(user);
        let before = cards.len();
        cards.retain(|c| c.id != id);
        if cards.len() == before {
            return Err(KomorebiError::not_found("InsightCard", id));
        }
        self.storage.try_set(user, keys::INSIGHT_CARDS, &cards)
    }

    fn load(&self, user: &UserContext) -> Vec<InsightCard> {
        self.storage.get(user, keys::INSIGHT_CARDS).unwrap_or_default()
    }
}
