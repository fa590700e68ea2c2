// src/bingo_caller.rs
//
// Interactive caller: draws the items of a game one at a time in random
// order. The session survives restarts; it is stored per game in the state
// file configured in conf/client.conf.
//
// CLI Options:
// - --gameid: Game to call (required)
// - --reset: Discard the stored session and start over
// - --exit: Show the current session once and exit

use std::error::Error;

use clap::Parser;

use bingo::caller::{CallOutcome, CallerState, FileStore};
use bingo::clients::common::Connection;
use bingo::clients::{api_client, terminal};
use bingo::clients::terminal::UserAction;
use bingo::config::ClientConfig;
use bingo::models::ItemSnapshot;

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Bingo caller - draw the items of a game in random order")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Game ID to call
    #[arg(long)]
    gameid: String,

    /// Acting user ID (default from config)
    #[arg(short, long)]
    user: Option<String>,

    /// Start a new session, discarding the stored one
    #[arg(long)]
    reset: bool,

    /// Display the current session once and exit
    #[arg(long)]
    exit: bool,
}

async fn run(args: Args, config: ClientConfig) -> Result<(), Box<dyn Error>> {
    let user_id = args.user.unwrap_or_else(|| config.user_id.clone());
    let conn = Connection::new(&config.server_url(), &user_id, config.timeout)?;

    let game = api_client::get_game(&conn, &args.gameid).await?;
    let items: Vec<ItemSnapshot> = api_client::list_items(&conn, &game.id)
        .await?
        .iter()
        .map(|item| item.snapshot())
        .collect();

    let store = FileStore::new(&config.state_path);

    let mut state = if args.reset {
        CallerState::clear(&store, &game.id)?;
        CallerState::new(items.clone())
    } else {
        CallerState::restore(&store, &game.id, items.clone())
    };
    state.save(&store, &game.id)?;

    print!("\x1Bc");
    terminal::show_caller(&game.title, &state);
    if args.exit {
        return Ok(());
    }

    let mut rng = rand::rng();
    loop {
        match terminal::wait_for_user_action()? {
            UserAction::Exit => {
                println!("Exiting the caller. Progress is saved.\n");
                break;
            }
            UserAction::Reset => {
                state.reset(items.clone());
                state.save(&store, &game.id)?;
                terminal::show_caller(&game.title, &state);
                println!("Started a new session.");
            }
            UserAction::CallNext => {
                let outcome = state.call_next(&mut rng);
                state.save(&store, &game.id)?;
                terminal::show_caller(&game.title, &state);
                if outcome == CallOutcome::Exhausted {
                    println!("\x1b[1;33mAll items have been called!\x1b[0m");
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = ClientConfig::load_or_default();

    if let Err(e) = run(args, config).await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
