// src/bingo_client.rs
//
// Command line client for managing bingo games, items and cards.
//
// Every command talks to the server configured in conf/client.conf. The
// acting user is sent in the X-User-ID header and can be overridden with
// --user.

use std::error::Error;

use clap::{Parser, Subcommand};

use bingo::clients::api_client;
use bingo::clients::common::Connection;
use bingo::config::ClientConfig;
use bingo::models::{ItemUpdate, NewItem, Tier};
use bingo::print::render_cards;

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Bingo client - manage games, items and cards")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Acting user ID (default from config)
    #[arg(short, long)]
    user: Option<String>,

    /// Server URL, e.g. http://127.0.0.1:3000 (default from config)
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show server health
    Status,
    /// List your games
    Games,
    /// Create a game
    NewGame {
        title: String,
        /// Grid description such as "5x5 Standard"
        #[arg(long, default_value = "5x5 Standard")]
        variant: String,
    },
    /// Delete a game with its items and cards
    DeleteGame { game_id: String },
    /// List the items of a game
    Items { game_id: String },
    /// Add one or more items to a game
    AddItems {
        game_id: String,
        /// Item labels
        #[arg(required = true)]
        labels: Vec<String>,
        /// Mark the added items as mandatory
        #[arg(long)]
        mandatory: bool,
        /// Image URL applied to every added item
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Change an item
    UpdateItem {
        item_id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        mandatory: Option<bool>,
    },
    /// Delete an item
    DeleteItem { item_id: String },
    /// Generate cards for a game
    Generate {
        game_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: usize,
        /// Put a FREE SPACE in the center cell
        #[arg(long)]
        free_space: bool,
    },
    /// Print the stored cards of a game
    Cards { game_id: String },
    /// Show your membership
    Profile,
    /// Change your membership tier (free or pro)
    Membership { tier: String },
}

async fn run(conn: &Connection, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Status => {
            println!("Server {}: {}", conn.base_url(), api_client::server_status(conn).await?);
        }
        Command::Games => {
            let games = api_client::list_games(conn).await?;
            if games.is_empty() {
                println!("No games yet.");
            }
            for game in games {
                println!("{}  {}  [{}]  {}", game.id, game.title, game.variant, game.created_at.format("%Y-%m-%d %H:%M"));
            }
        }
        Command::NewGame { title, variant } => {
            let game = api_client::create_game(conn, &title, &variant).await?;
            println!("✅ Created game '{}' ({})", game.title, game.id);
        }
        Command::DeleteGame { game_id } => {
            println!("✅ {}", api_client::delete_game(conn, &game_id).await?);
        }
        Command::Items { game_id } => {
            let items = api_client::list_items(conn, &game_id).await?;
            println!("{} items", items.len());
            for item in items {
                let marker = if item.is_mandatory { "*" } else { " " };
                println!("{marker} {}  {}", item.id, item.label);
            }
        }
        Command::AddItems { game_id, labels, mandatory, image_url } => {
            let items = labels
                .iter()
                .map(|label| NewItem {
                    image_url: image_url.clone(),
                    ..NewItem::new(label, mandatory)
                })
                .collect();
            let created = api_client::create_items(conn, &game_id, items).await?;
            println!("✅ Added {} items", created.len());
        }
        Command::UpdateItem { item_id, label, image_url, mandatory } => {
            let update = ItemUpdate {
                label,
                image_url,
                is_mandatory: mandatory,
            };
            let item = api_client::update_item(conn, &item_id, &update).await?;
            println!("✅ Updated item '{}'", item.label);
        }
        Command::DeleteItem { item_id } => {
            println!("✅ {}", api_client::delete_item(conn, &item_id).await?);
        }
        Command::Generate { game_id, quantity, free_space } => {
            let cards = api_client::generate_cards(conn, &game_id, quantity, free_space).await?;
            println!("✅ Generated {} cards", cards.len());
        }
        Command::Cards { game_id } => {
            let game = api_client::get_game(conn, &game_id).await?;
            let columns = game.grid()?.cols;
            let cards = api_client::list_cards(conn, &game_id).await?;
            let layouts: Vec<_> = cards.into_iter().map(|card| card.layout).collect();
            println!("{} - {}\n", game.title, game.variant);
            println!("{}", render_cards(&layouts, columns));
        }
        Command::Profile => {
            let profile = api_client::get_profile(conn).await?;
            println!("{}: {}", profile.user_id, profile.membership.as_str());
        }
        Command::Membership { tier } => {
            let tier = Tier::parse(&tier)?;
            let profile = api_client::set_membership(conn, tier).await?;
            println!("✅ {} is now on the {} tier", profile.user_id, profile.membership.as_str());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = ClientConfig::load_or_default();

    let server_url = args.server.unwrap_or_else(|| config.server_url());
    let user_id = args.user.unwrap_or_else(|| config.user_id.clone());

    let conn = match Connection::new(&server_url, &user_id, config.timeout) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("❌ Failed to create HTTP client: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&conn, args.command).await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
