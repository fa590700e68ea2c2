use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{BingoError, BingoResult};
use crate::models::{CardLayout, Item, ItemSnapshot};
use crate::variant::GridVariant;

/// Options accepted with a card generation request
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
    #[serde(default)]
    pub include_free_space: bool,
}

/// Builds card layouts for one grid shape.
///
/// Every card gets all mandatory items plus a uniform random sample of the
/// optional ones, shuffled across the grid. With the free space enabled on a
/// grid that has a true center, the center cell is reserved for the sentinel
/// and the remaining cells are filled from the item set.
#[derive(Debug, Clone)]
pub struct CardGenerator {
    grid: GridVariant,
    free_space_index: Option<usize>,
}

impl CardGenerator {
    pub fn new(grid: GridVariant, options: GenerateOptions) -> Self {
        let free_space_index = if options.include_free_space {
            grid.center_index()
        } else {
            None
        };
        Self { grid, free_space_index }
    }

    pub fn grid(&self) -> GridVariant {
        self.grid
    }

    pub fn free_space_index(&self) -> Option<usize> {
        self.free_space_index
    }

    /// Cells that must be filled with real items.
    ///
    /// With the free space on, the center is reserved up front rather than
    /// overwritten after the shuffle, so a game needs only S−1 items and a
    /// mandatory item can never be displaced by the sentinel.
    pub fn item_slots(&self) -> usize {
        let cells = self.grid.cell_count();
        if self.free_space_index.is_some() { cells - 1 } else { cells }
    }

    /// Reject item sets that cannot fill exactly one grid
    pub fn validate(&self, mandatory: usize, optional: usize) -> BingoResult<()> {
        let slots = self.item_slots();
        if mandatory > slots {
            return Err(BingoError::validation(format!(
                "Too many mandatory items: {mandatory} mandatory items do not fit in the {slots} available cells of a {} card",
                self.grid
            )));
        }
        if mandatory + optional < slots {
            return Err(BingoError::validation(format!(
                "Insufficient items: a {} card needs {slots} items but the game has only {}",
                self.grid,
                mandatory + optional
            )));
        }
        Ok(())
    }

    /// Build one layout. Inputs must already have passed `validate`.
    pub fn generate_layout<R: Rng + ?Sized>(
        &self,
        mandatory: &[ItemSnapshot],
        optional: &[ItemSnapshot],
        rng: &mut R,
    ) -> CardLayout {
        let slots = self.item_slots();

        // Step 1: every mandatory item, in order
        let mut cells: Vec<ItemSnapshot> = mandatory.to_vec();

        // Step 2: fill the remaining slots with a prefix of a fresh shuffle of the optional pool
        if cells.len() < slots {
            let mut pool: Vec<&ItemSnapshot> = optional.iter().collect();
            pool.shuffle(rng);
            let missing = slots - cells.len();
            cells.extend(pool.into_iter().take(missing).cloned());
        }

        // Step 3: spread the cells uniformly over the grid
        cells.shuffle(rng);

        // Step 4: the free space takes the center cell
        if let Some(center) = self.free_space_index {
            cells.insert(center.min(cells.len()), ItemSnapshot::free_space());
        }

        CardLayout { items: cells }
    }

    /// Build `quantity` independent layouts from a game's full item set
    pub fn generate_cards<R: Rng + ?Sized>(
        &self,
        items: &[Item],
        quantity: usize,
        rng: &mut R,
    ) -> BingoResult<Vec<CardLayout>> {
        if quantity == 0 {
            return Err(BingoError::validation("Quantity must be at least 1"));
        }
        if items.is_empty() {
            return Err(BingoError::not_found("No items found for this game"));
        }

        let (mandatory, optional): (Vec<ItemSnapshot>, Vec<ItemSnapshot>) = {
            let (m, o): (Vec<&Item>, Vec<&Item>) = items.iter().partition(|item| item.is_mandatory);
            (
                m.into_iter().map(Item::snapshot).collect(),
                o.into_iter().map(Item::snapshot).collect(),
            )
        };

        self.validate(mandatory.len(), optional.len())?;

        Ok((0..quantity)
            .map(|_| self.generate_layout(&mandatory, &optional, &mut *rng))
            .collect())
    }
}
