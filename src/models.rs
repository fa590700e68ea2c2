// src/models.rs
// Records persisted by the store and the payloads exchanged with clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defs::{FREE_SPACE_ID, FREE_SPACE_LABEL};
use crate::error::{BingoError, BingoResult};
use crate::variant::GridVariant;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub variant: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn grid(&self) -> BingoResult<GridVariant> {
        GridVariant::parse(&self.variant)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub game_id: String,
    pub label: String,
    pub image_url: Option<String>,
    pub is_mandatory: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id.clone(),
            label: self.label.clone(),
            image_url: self.image_url.clone(),
            is_mandatory: self.is_mandatory,
        }
    }
}

/// Incoming item definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub label: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_mandatory: Option<bool>,
}

impl NewItem {
    pub fn new(label: &str, is_mandatory: bool) -> Self {
        Self {
            label: label.to_string(),
            image_url: None,
            is_mandatory: Some(is_mandatory),
        }
    }
}

/// Partial update of an item; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_mandatory: Option<bool>,
}

/// Copy of an item taken when a card is generated or a caller session starts.
/// Later edits to the live item never reach a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub is_mandatory: bool,
}

impl ItemSnapshot {
    pub fn free_space() -> Self {
        Self {
            id: FREE_SPACE_ID.to_string(),
            label: FREE_SPACE_LABEL.to_string(),
            image_url: None,
            is_mandatory: false,
        }
    }

    pub fn is_free_space(&self) -> bool {
        self.id == FREE_SPACE_ID
    }
}

/// Ordered cells of a card, row by row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardLayout {
    pub items: Vec<ItemSnapshot>,
}

impl CardLayout {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_json(&self) -> BingoResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> BingoResult<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub game_id: String,
    pub layout: CardLayout,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership tier used for limit decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Restricted: card ceiling applies
    #[default]
    Free,
    /// Unrestricted
    Pro,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
        }
    }

    pub fn parse(value: &str) -> BingoResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            other => Err(BingoError::validation(format!("Unknown membership '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub membership: Tier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ----------------------------------------------------------------------
// Request payloads shared by the server and the HTTP clients
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub title: String,
    pub variant: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemsRequest {
    pub items: Vec<NewItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCardsRequest {
    pub quantity: usize,
    #[serde(default)]
    pub include_free_space: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub membership: Tier,
}
