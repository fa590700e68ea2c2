// lib.rs
// Library modules for the bingo card service

pub mod defs;
pub mod logging;
pub mod config;
pub mod error;
pub mod variant;
pub mod models;
pub mod limits;
pub mod card;
pub mod store;
pub mod caller;
pub mod actions;
pub mod api_handlers;
pub mod server;
pub mod print;
pub mod clients;
