// src/limits.rs
// Per-plan ceilings on items and cards. Both checks are read-then-decide:
// the caller counts what is stored, then asks whether the batch still fits.

use crate::defs::{DEFAULT_MAX_CARDS_FREE, DEFAULT_MAX_CARDS_PER_REQUEST, DEFAULT_MAX_ITEMS_PER_GAME};
use crate::error::{BingoError, BingoResult};
use crate::models::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub max_items_per_game: usize,
    pub max_cards_free: usize,
    pub max_cards_per_request: usize,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            max_items_per_game: DEFAULT_MAX_ITEMS_PER_GAME,
            max_cards_free: DEFAULT_MAX_CARDS_FREE,
            max_cards_per_request: DEFAULT_MAX_CARDS_PER_REQUEST,
        }
    }
}

impl PlanLimits {
    /// Card ceiling for a tier; `None` means unlimited
    pub fn card_ceiling(&self, tier: Tier) -> Option<usize> {
        match tier {
            Tier::Free => Some(self.max_cards_free),
            Tier::Pro => None,
        }
    }

    pub fn check_item_limit(&self, existing: usize, incoming: usize) -> BingoResult<()> {
        if existing.saturating_add(incoming) > self.max_items_per_game {
            return Err(BingoError::limit(format!(
                "Item limit reached: the game has {existing} items and adding {incoming} would exceed the maximum of {}",
                self.max_items_per_game
            )));
        }
        Ok(())
    }

    /// Bounds a single generation request regardless of tier
    pub fn check_request_quantity(&self, quantity: usize) -> BingoResult<()> {
        if quantity == 0 {
            return Err(BingoError::validation("Quantity must be at least 1"));
        }
        if quantity > self.max_cards_per_request {
            return Err(BingoError::validation(format!(
                "Quantity {quantity} is too large: at most {} cards can be generated per request",
                self.max_cards_per_request
            )));
        }
        Ok(())
    }

    pub fn check_card_limit(&self, tier: Tier, existing: usize, requested: usize) -> BingoResult<()> {
        if let Some(ceiling) = self.card_ceiling(tier) {
            if existing.saturating_add(requested) > ceiling {
                return Err(BingoError::limit(format!(
                    "Card limit exceeded: the game has {existing} cards and {requested} more would exceed the {} plan maximum of {ceiling}",
                    tier.as_str()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_limit_boundaries() {
        let limits = PlanLimits::default();
        assert!(limits.check_item_limit(73, 2).is_ok());
        assert!(limits.check_item_limit(0, 75).is_ok());

        let err = limits.check_item_limit(74, 2).unwrap_err();
        assert!(matches!(err, BingoError::LimitReached(_)));
        assert!(err.to_string().contains("Item limit reached"));
    }

    #[test]
    fn test_card_limit_free_tier() {
        let limits = PlanLimits::default();
        assert!(limits.check_card_limit(Tier::Free, 45, 5).is_ok());

        let err = limits.check_card_limit(Tier::Free, 48, 5).unwrap_err();
        assert!(err.to_string().contains("Card limit exceeded"));
    }

    #[test]
    fn test_card_limit_pro_tier_is_unbounded() {
        let limits = PlanLimits::default();
        assert_eq!(limits.card_ceiling(Tier::Pro), None);
        assert!(limits.check_card_limit(Tier::Pro, 500, 500).is_ok());
    }

    #[test]
    fn test_custom_ceilings() {
        let limits = PlanLimits { max_items_per_game: 10, max_cards_free: 3, max_cards_per_request: 2 };
        assert!(limits.check_item_limit(9, 2).is_err());
        assert!(limits.check_card_limit(Tier::Free, 1, 2).is_ok());
        assert!(limits.check_card_limit(Tier::Free, 2, 2).is_err());
        assert!(limits.check_request_quantity(2).is_ok());
        assert!(limits.check_request_quantity(3).is_err());
    }

    #[test]
    fn test_request_quantity_bounds() {
        let limits = PlanLimits::default();
        assert!(limits.check_request_quantity(1).is_ok());
        assert!(limits.check_request_quantity(DEFAULT_MAX_CARDS_PER_REQUEST).is_ok());

        for quantity in [0, DEFAULT_MAX_CARDS_PER_REQUEST + 1, usize::MAX] {
            let err = limits.check_request_quantity(quantity).unwrap_err();
            assert!(matches!(err, BingoError::Validation(_)), "quantity {quantity}: {err}");
        }
    }
}
