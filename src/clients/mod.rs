// src/clients/mod.rs
// Client-side helpers shared by the bingo command line tools
//
// - common: HTTP plumbing and decoding of the uniform result envelope
// - api_client: typed calls for each server operation
// - terminal: key handling and caller display

pub mod common;
pub mod api_client;
pub mod terminal;
