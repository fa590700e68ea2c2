// src/clients/api_client.rs
// Typed calls for each bingo server operation

use std::error::Error;

use super::common::{expect_data, expect_success, Connection};
use crate::models::{
    Card, CreateGameRequest, CreateItemsRequest, Game, GenerateCardsRequest, Item, ItemUpdate,
    MembershipRequest, NewItem, Profile, Tier,
};

pub async fn get_profile(conn: &Connection) -> Result<Profile, Box<dyn Error>> {
    expect_data(conn.get("/profile").await?)
}

pub async fn set_membership(conn: &Connection, membership: Tier) -> Result<Profile, Box<dyn Error>> {
    expect_data(conn.put("/profile", &MembershipRequest { membership }).await?)
}

pub async fn create_game(conn: &Connection, title: &str, variant: &str) -> Result<Game, Box<dyn Error>> {
    let request = CreateGameRequest {
        title: title.to_string(),
        variant: variant.to_string(),
    };
    expect_data(conn.post("/games", &request).await?)
}

pub async fn list_games(conn: &Connection) -> Result<Vec<Game>, Box<dyn Error>> {
    expect_data(conn.get("/games").await?)
}

pub async fn get_game(conn: &Connection, game_id: &str) -> Result<Game, Box<dyn Error>> {
    expect_data(conn.get(&format!("/games/{game_id}")).await?)
}

pub async fn delete_game(conn: &Connection, game_id: &str) -> Result<String, Box<dyn Error>> {
    expect_success(conn.delete(&format!("/games/{game_id}")).await?)
}

pub async fn create_items(conn: &Connection, game_id: &str, items: Vec<NewItem>) -> Result<Vec<Item>, Box<dyn Error>> {
    expect_data(conn.post(&format!("/games/{game_id}/items"), &CreateItemsRequest { items }).await?)
}

pub async fn list_items(conn: &Connection, game_id: &str) -> Result<Vec<Item>, Box<dyn Error>> {
    expect_data(conn.get(&format!("/games/{game_id}/items")).await?)
}

pub async fn update_item(conn: &Connection, item_id: &str, update: &ItemUpdate) -> Result<Item, Box<dyn Error>> {
    expect_data(conn.patch(&format!("/items/{item_id}"), update).await?)
}

pub async fn delete_item(conn: &Connection, item_id: &str) -> Result<String, Box<dyn Error>> {
    expect_success(conn.delete(&format!("/items/{item_id}")).await?)
}

pub async fn generate_cards(
    conn: &Connection,
    game_id: &str,
    quantity: usize,
    include_free_space: bool,
) -> Result<Vec<Card>, Box<dyn Error>> {
    let request = GenerateCardsRequest {
        quantity,
        include_free_space,
    };
    expect_data(conn.post(&format!("/games/{game_id}/cards"), &request).await?)
}

pub async fn list_cards(conn: &Connection, game_id: &str) -> Result<Vec<Card>, Box<dyn Error>> {
    expect_data(conn.get(&format!("/games/{game_id}/cards")).await?)
}

/// Server status as reported by /health, or an error when unreachable.
pub async fn server_status(conn: &Connection) -> Result<String, Box<dyn Error>> {
    let body = conn.health().await?;
    let status = body.get("status").and_then(|s| s.as_str()).unwrap_or("unknown");
    let version = body.get("version").and_then(|v| v.as_str()).unwrap_or("unknown");
    Ok(format!("{status} (version {version})"))
}
