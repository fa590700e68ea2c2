// src/actions.rs
// Server operations over the store. Each method is one request's worth of
// work: it reads what it needs, decides, and writes. Limit checks are
// read-then-decide without isolation, so two concurrent batches for the same
// game can both pass and jointly exceed a ceiling.

use rand::Rng;

use crate::card::{CardGenerator, GenerateOptions};
use crate::defs::MAX_LABEL_LEN;
use crate::error::{BingoError, BingoResult};
use crate::limits::PlanLimits;
use crate::logging::{log_debug, log_info};
use crate::models::{Card, Game, Item, ItemUpdate, NewItem, Profile, Tier};
use crate::store::Database;
use crate::variant::GridVariant;

pub struct BingoService {
    db: Database,
    limits: PlanLimits,
}

fn clean_label(label: &str) -> BingoResult<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(BingoError::validation("Item label is required"));
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(BingoError::validation(format!(
            "Item label is too long (maximum {MAX_LABEL_LEN} characters)"
        )));
    }
    Ok(label.to_string())
}

fn clean_image_url(url: Option<&str>) -> Option<String> {
    url.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string)
}

impl BingoService {
    pub fn new(db: Database, limits: PlanLimits) -> Self {
        Self { db, limits }
    }

    pub fn limits(&self) -> PlanLimits {
        self.limits
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn require_game(&self, game_id: &str) -> BingoResult<Game> {
        self.db
            .find_game(game_id)?
            .ok_or_else(|| BingoError::not_found(format!("Game '{game_id}' not found")))
    }

    // ------------------------------------------------------------------
    // Games
    // ------------------------------------------------------------------

    pub fn create_game(&self, owner_id: &str, title: &str, variant: &str) -> BingoResult<Game> {
        let (title, variant) = (title.trim(), variant.trim());
        if title.is_empty() || variant.is_empty() {
            return Err(BingoError::validation("Title and variant required"));
        }
        let grid = GridVariant::parse(variant)?;

        self.db.ensure_profile(owner_id)?;
        let game = self.db.insert_game(owner_id, title, variant)?;
        log_info(&format!("Created game {} '{}' ({grid}) for {owner_id}", game.id, game.title));
        Ok(game)
    }

    pub fn list_games(&self, owner_id: &str) -> BingoResult<Vec<Game>> {
        self.db.list_games(owner_id)
    }

    pub fn get_game(&self, game_id: &str) -> BingoResult<Game> {
        self.require_game(game_id)
    }

    /// Removes the game together with its items and cards
    pub fn delete_game(&self, game_id: &str) -> BingoResult<()> {
        if !self.db.delete_game(game_id)? {
            return Err(BingoError::not_found(format!("Game '{game_id}' not found")));
        }
        log_info(&format!("Deleted game {game_id} with its items and cards"));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    pub fn create_items(&self, game_id: &str, items: &[NewItem]) -> BingoResult<Vec<Item>> {
        if items.is_empty() {
            return Err(BingoError::validation("No items provided"));
        }
        self.require_game(game_id)?;

        let cleaned = items
            .iter()
            .map(|item| {
                Ok(NewItem {
                    label: clean_label(&item.label)?,
                    image_url: clean_image_url(item.image_url.as_deref()),
                    is_mandatory: Some(item.is_mandatory.unwrap_or(false)),
                })
            })
            .collect::<BingoResult<Vec<_>>>()?;

        let existing = self.db.count_items(game_id)?;
        self.limits.check_item_limit(existing, cleaned.len())?;

        let created = self.db.insert_items(game_id, &cleaned)?;
        log_info(&format!("Added {} items to game {game_id} ({} total)", created.len(), existing + created.len()));
        Ok(created)
    }

    pub fn list_items(&self, game_id: &str) -> BingoResult<Vec<Item>> {
        self.require_game(game_id)?;
        self.db.list_items(game_id)
    }

    pub fn update_item(&self, item_id: &str, update: &ItemUpdate) -> BingoResult<Item> {
        let update = ItemUpdate {
            label: update.label.as_deref().map(clean_label).transpose()?,
            image_url: update.image_url.as_deref().map(|u| u.trim().to_string()),
            is_mandatory: update.is_mandatory,
        };
        self.db
            .update_item(item_id, &update)?
            .ok_or_else(|| BingoError::not_found(format!("Item '{item_id}' not found")))
    }

    pub fn delete_item(&self, item_id: &str) -> BingoResult<()> {
        if !self.db.delete_item(item_id)? {
            return Err(BingoError::not_found(format!("Item '{item_id}' not found")));
        }
        log_debug(&format!("Deleted item {item_id}"));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cards
    // ------------------------------------------------------------------

    pub fn generate_cards(&self, game_id: &str, quantity: usize, options: GenerateOptions) -> BingoResult<Vec<Card>> {
        self.generate_cards_with(game_id, quantity, options, &mut rand::rng())
    }

    /// Card generation with a caller-supplied random source
    pub fn generate_cards_with<R: Rng + ?Sized>(
        &self,
        game_id: &str,
        quantity: usize,
        options: GenerateOptions,
        rng: &mut R,
    ) -> BingoResult<Vec<Card>> {
        self.limits.check_request_quantity(quantity)?;

        let game = self.require_game(game_id)?;
        let profile = self
            .db
            .find_profile(&game.owner_id)?
            .ok_or_else(|| BingoError::not_found(format!("Profile not found for user '{}'", game.owner_id)))?;

        let existing = self.db.count_cards(game_id)?;
        self.limits.check_card_limit(profile.membership, existing, quantity)?;

        let items = self.db.list_items(game_id)?;
        if items.is_empty() {
            return Err(BingoError::not_found("No items found for this game"));
        }

        let generator = CardGenerator::new(game.grid()?, options);
        let layouts = generator.generate_cards(&items, quantity, rng)?;
        let cards = self.db.insert_cards(game_id, &layouts)?;

        log_info(&format!(
            "Generated {} cards for game {game_id} ({} grid, free space: {})",
            cards.len(),
            generator.grid(),
            generator.free_space_index().is_some()
        ));
        Ok(cards)
    }

    pub fn list_cards(&self, game_id: &str) -> BingoResult<Vec<Card>> {
        self.require_game(game_id)?;
        self.db.list_cards(game_id)
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    pub fn get_profile(&self, user_id: &str) -> BingoResult<Profile> {
        self.db
            .find_profile(user_id)?
            .ok_or_else(|| BingoError::not_found(format!("Profile not found for user '{user_id}'")))
    }

    pub fn set_membership(&self, user_id: &str, membership: Tier) -> BingoResult<Profile> {
        let profile = self.db.upsert_profile(user_id, membership)?;
        log_info(&format!("Membership for {user_id} set to {}", membership.as_str()));
        Ok(profile)
    }
}
