//! SQLite store
//!
//! Games own items and cards through `ON DELETE CASCADE` foreign keys, so
//! deleting a game removes everything generated for it. Profiles carry the
//! membership tier consulted by the card ceiling.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use crate::error::BingoResult;
use crate::models::{Card, CardLayout, Game, Item, ItemUpdate, NewItem, Profile, Tier};

const GAME_COLUMNS: &str = "id, user_id, title, variant, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, game_id, label, image_url, is_mandatory, created_at, updated_at";
const CARD_COLUMNS: &str = "id, game_id, card_data, created_at, updated_at";

pub struct Database {
    conn: Mutex<Connection>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn to_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn row_to_game(row: &Row) -> rusqlite::Result<Game> {
    Ok(Game {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        variant: row.get(3)?,
        created_at: from_millis(row.get(4)?),
        updated_at: from_millis(row.get(5)?),
    })
}

fn row_to_item(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        game_id: row.get(1)?,
        label: row.get(2)?,
        image_url: row.get(3)?,
        is_mandatory: row.get(4)?,
        created_at: from_millis(row.get(5)?),
        updated_at: from_millis(row.get(6)?),
    })
}

struct CardRow {
    id: String,
    game_id: String,
    card_data: String,
    created_at: i64,
    updated_at: i64,
}

impl CardRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(CardRow {
            id: row.get(0)?,
            game_id: row.get(1)?,
            card_data: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn into_card(self) -> BingoResult<Card> {
        Ok(Card {
            id: self.id,
            game_id: self.game_id,
            layout: CardLayout::from_json(&self.card_data)?,
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
        })
    }
}

fn row_to_profile(row: &Row) -> rusqlite::Result<(String, String, i64, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn build_profile((user_id, membership, created_at, updated_at): (String, String, i64, i64)) -> BingoResult<Profile> {
    Ok(Profile {
        user_id,
        membership: Tier::parse(&membership)?,
        created_at: from_millis(created_at),
        updated_at: from_millis(updated_at),
    })
}

impl Database {
    /// Open (or create) the database file and run migrations
    pub fn open<P: AsRef<Path>>(path: P) -> BingoResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Private in-memory database, used by tests
    pub fn open_in_memory() -> BingoResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> BingoResult<Self> {
        run_migrations(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    // A panic while holding the lock leaves SQLite itself consistent
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ------------------------------------------------------------------
    // Games
    // ------------------------------------------------------------------

    pub fn insert_game(&self, owner_id: &str, title: &str, variant: &str) -> BingoResult<Game> {
        let now = Utc::now();
        let game = Game {
            id: new_id(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            variant: variant.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.conn().execute(
            "INSERT INTO bingo_games (id, user_id, title, variant, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![game.id, game.owner_id, game.title, game.variant, to_millis(now), to_millis(now)],
        )?;

        Ok(game)
    }

    pub fn list_games(&self, owner_id: &str) -> BingoResult<Vec<Game>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {GAME_COLUMNS} FROM bingo_games WHERE user_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let games = stmt
            .query_map(params![owner_id], row_to_game)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(games)
    }

    pub fn find_game(&self, game_id: &str) -> BingoResult<Option<Game>> {
        let game = self
            .conn()
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM bingo_games WHERE id = ?1"),
                params![game_id],
                row_to_game,
            )
            .optional()?;
        Ok(game)
    }

    /// Returns false when no such game exists
    pub fn delete_game(&self, game_id: &str) -> BingoResult<bool> {
        let affected = self.conn().execute("DELETE FROM bingo_games WHERE id = ?1", params![game_id])?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    pub fn count_items(&self, game_id: &str) -> BingoResult<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM bingo_items WHERE game_id = ?1",
            params![game_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Insert a batch of items in one transaction
    pub fn insert_items(&self, game_id: &str, new_items: &[NewItem]) -> BingoResult<Vec<Item>> {
        let now = Utc::now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut created = Vec::with_capacity(new_items.len());

        {
            let mut stmt = tx.prepare(
                "INSERT INTO bingo_items (id, game_id, label, image_url, is_mandatory, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for new_item in new_items {
                let item = Item {
                    id: new_id(),
                    game_id: game_id.to_string(),
                    label: new_item.label.clone(),
                    image_url: new_item.image_url.clone(),
                    is_mandatory: new_item.is_mandatory.unwrap_or(false),
                    created_at: now,
                    updated_at: now,
                };
                stmt.execute(params![
                    item.id,
                    item.game_id,
                    item.label,
                    item.image_url,
                    item.is_mandatory,
                    to_millis(now),
                    to_millis(now)
                ])?;
                created.push(item);
            }
        }

        tx.commit()?;
        Ok(created)
    }

    pub fn list_items(&self, game_id: &str) -> BingoResult<Vec<Item>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM bingo_items WHERE game_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let items = stmt
            .query_map(params![game_id], row_to_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn find_item(&self, item_id: &str) -> BingoResult<Option<Item>> {
        let item = self
            .conn()
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM bingo_items WHERE id = ?1"),
                params![item_id],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    /// Apply a partial update; `None` when the item does not exist
    pub fn update_item(&self, item_id: &str, update: &ItemUpdate) -> BingoResult<Option<Item>> {
        let Some(mut item) = self.find_item(item_id)? else {
            return Ok(None);
        };

        if let Some(label) = &update.label {
            item.label = label.clone();
        }
        if let Some(image_url) = &update.image_url {
            item.image_url = if image_url.is_empty() { None } else { Some(image_url.clone()) };
        }
        if let Some(is_mandatory) = update.is_mandatory {
            item.is_mandatory = is_mandatory;
        }
        item.updated_at = Utc::now();

        self.conn().execute(
            "UPDATE bingo_items SET label = ?1, image_url = ?2, is_mandatory = ?3, updated_at = ?4 WHERE id = ?5",
            params![item.label, item.image_url, item.is_mandatory, to_millis(item.updated_at), item.id],
        )?;

        Ok(Some(item))
    }

    /// Returns false when no such item exists
    pub fn delete_item(&self, item_id: &str) -> BingoResult<bool> {
        let affected = self.conn().execute("DELETE FROM bingo_items WHERE id = ?1", params![item_id])?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Cards
    // ------------------------------------------------------------------

    pub fn count_cards(&self, game_id: &str) -> BingoResult<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM bingo_cards WHERE game_id = ?1",
            params![game_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Persist a whole batch of layouts or nothing
    pub fn insert_cards(&self, game_id: &str, layouts: &[CardLayout]) -> BingoResult<Vec<Card>> {
        let now = Utc::now();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut created = Vec::with_capacity(layouts.len());

        {
            let mut stmt = tx.prepare(
                "INSERT INTO bingo_cards (id, game_id, card_data, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for layout in layouts {
                let card = Card {
                    id: new_id(),
                    game_id: game_id.to_string(),
                    layout: layout.clone(),
                    created_at: now,
                    updated_at: now,
                };
                stmt.execute(params![card.id, card.game_id, layout.to_json()?, to_millis(now), to_millis(now)])?;
                created.push(card);
            }
        }

        tx.commit()?;
        Ok(created)
    }

    pub fn list_cards(&self, game_id: &str) -> BingoResult<Vec<Card>> {
        let rows = {
            let conn = self.conn();
            let mut stmt = conn.prepare(&format!(
                "SELECT {CARD_COLUMNS} FROM bingo_cards WHERE game_id = ?1 ORDER BY created_at, rowid"
            ))?;
            stmt.query_map(params![game_id], CardRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter().map(CardRow::into_card).collect()
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    pub fn find_profile(&self, user_id: &str) -> BingoResult<Option<Profile>> {
        let raw = self
            .conn()
            .query_row(
                "SELECT user_id, membership, created_at, updated_at FROM profiles WHERE user_id = ?1",
                params![user_id],
                row_to_profile,
            )
            .optional()?;
        raw.map(build_profile).transpose()
    }

    pub fn upsert_profile(&self, user_id: &str, membership: Tier) -> BingoResult<Profile> {
        let now = to_millis(Utc::now());
        self.conn().execute(
            "INSERT INTO profiles (user_id, membership, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(user_id) DO UPDATE SET membership = excluded.membership, updated_at = excluded.updated_at",
            params![user_id, membership.as_str(), now],
        )?;
        self.require_profile(user_id)
    }

    /// Create a free profile unless one already exists
    pub fn ensure_profile(&self, user_id: &str) -> BingoResult<Profile> {
        let now = to_millis(Utc::now());
        self.conn().execute(
            "INSERT OR IGNORE INTO profiles (user_id, membership, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![user_id, Tier::Free.as_str(), now],
        )?;
        self.require_profile(user_id)
    }

    fn require_profile(&self, user_id: &str) -> BingoResult<Profile> {
        self.find_profile(user_id)?
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }
}

fn run_migrations(conn: &Connection) -> BingoResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS profiles (
            user_id TEXT PRIMARY KEY,
            membership TEXT NOT NULL DEFAULT 'free',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bingo_games (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            variant TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bingo_items (
            id TEXT PRIMARY KEY,
            game_id TEXT NOT NULL REFERENCES bingo_games(id) ON DELETE CASCADE,
            label TEXT NOT NULL,
            image_url TEXT,
            is_mandatory INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bingo_cards (
            id TEXT PRIMARY KEY,
            game_id TEXT NOT NULL REFERENCES bingo_games(id) ON DELETE CASCADE,
            card_data TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_games_user ON bingo_games(user_id);
        CREATE INDEX IF NOT EXISTS idx_items_game ON bingo_items(game_id);
        CREATE INDEX IF NOT EXISTS idx_cards_game ON bingo_cards(game_id);",
    )?;
    Ok(())
}
