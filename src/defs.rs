// src/defs.rs
// Shared constants for the bingo card manager.

/// Default ceiling on the number of items a single game may hold.
pub const DEFAULT_MAX_ITEMS_PER_GAME: usize = 75;

/// Default ceiling on the number of cards a free-tier game may hold.
pub const DEFAULT_MAX_CARDS_FREE: usize = 50;

/// Default ceiling on the cards produced by one generation request, any tier.
pub const DEFAULT_MAX_CARDS_PER_REQUEST: usize = 100;

/// Reserved item id used for the synthetic free space cell.
pub const FREE_SPACE_ID: &str = "free-space";
pub const FREE_SPACE_LABEL: &str = "FREE SPACE";

/// Grid used when a variant does not spell out its dimensions.
pub const DEFAULT_GRID_ROWS: usize = 5;
pub const DEFAULT_GRID_COLS: usize = 5;
pub const MAX_GRID_SIDE: usize = 10;

/// Header carrying the caller's identity on every API request.
pub const USER_ID_HEADER: &str = "X-User-ID";

// Caller session storage keys, suffixed with the game id
pub const CALLED_ITEMS_KEY: &str = "bingo-called-items";
pub const UNCALLED_ITEMS_KEY: &str = "bingo-uncalled-items";

/// Longest accepted item label, in characters
pub const MAX_LABEL_LEN: usize = 200;
