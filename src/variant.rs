// src/variant.rs
// Grid shape derived from a game's free-text variant, e.g. "5×5 Standard".

use serde::{Deserialize, Serialize};

use crate::defs::{DEFAULT_GRID_COLS, DEFAULT_GRID_ROWS, MAX_GRID_SIDE};
use crate::error::{BingoError, BingoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridVariant {
    pub rows: usize,
    pub cols: usize,
}

impl Default for GridVariant {
    fn default() -> Self {
        Self { rows: DEFAULT_GRID_ROWS, cols: DEFAULT_GRID_COLS }
    }
}

impl GridVariant {
    pub fn new(rows: usize, cols: usize) -> BingoResult<Self> {
        if rows == 0 || cols == 0 || rows > MAX_GRID_SIDE || cols > MAX_GRID_SIDE {
            return Err(BingoError::validation(format!(
                "Unsupported grid size {rows}x{cols} (each side must be 1 to {MAX_GRID_SIDE})"
            )));
        }
        Ok(Self { rows, cols })
    }

    /// Read the first `RxC` dimensions out of a variant description.
    /// Descriptions without dimensions map to the standard 5×5 grid.
    pub fn parse(variant: &str) -> BingoResult<Self> {
        match find_dimensions(variant) {
            Some((rows, cols)) => Self::new(rows, cols),
            None => Ok(Self::default()),
        }
    }

    /// Number of cells on a card (S)
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Index of the true center cell; only square grids with an odd side have one
    pub fn center_index(&self) -> Option<usize> {
        if self.rows == self.cols && self.rows % 2 == 1 {
            Some(self.cell_count() / 2)
        } else {
            None
        }
    }
}

impl std::fmt::Display for GridVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, 'x' | 'X' | '×' | '*')
}

fn find_dimensions(text: &str) -> Option<(usize, usize)> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let (rows, after_rows) = read_number(&chars, i);
        let mut j = skip_spaces(&chars, after_rows);
        if j < chars.len() && is_separator(chars[j]) {
            j = skip_spaces(&chars, j + 1);
            if j < chars.len() && chars[j].is_ascii_digit() {
                let (cols, _) = read_number(&chars, j);
                return Some((rows, cols));
            }
        }
        i = after_rows;
    }

    None
}

fn read_number(chars: &[char], start: usize) -> (usize, usize) {
    let mut end = start;
    let mut value: usize = 0;
    while end < chars.len() {
        match chars[end].to_digit(10) {
            Some(d) => {
                value = value.saturating_mul(10).saturating_add(d as usize);
                end += 1;
            }
            None => break,
        }
    }
    (value, end)
}

fn skip_spaces(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && chars[pos] == ' ' {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_variants() {
        assert_eq!(GridVariant::parse("5×5 Standard").unwrap(), GridVariant { rows: 5, cols: 5 });
        assert_eq!(GridVariant::parse("3x3").unwrap(), GridVariant { rows: 3, cols: 3 });
        assert_eq!(GridVariant::parse("Party 4 X 4").unwrap(), GridVariant { rows: 4, cols: 4 });
        assert_eq!(GridVariant::parse("Office 2025 edition, 3*5").unwrap(), GridVariant { rows: 3, cols: 5 });
    }

    #[test]
    fn test_parse_without_dimensions_uses_standard_grid() {
        assert_eq!(GridVariant::parse("Standard").unwrap(), GridVariant::default());
        assert_eq!(GridVariant::parse("").unwrap().cell_count(), 25);
    }

    #[test]
    fn test_parse_rejects_oversized_grid() {
        assert!(matches!(GridVariant::parse("12x12"), Err(BingoError::Validation(_))));
        assert!(matches!(GridVariant::parse("0x5"), Err(BingoError::Validation(_))));
    }

    #[test]
    fn test_center_index() {
        assert_eq!(GridVariant::parse("5x5").unwrap().center_index(), Some(12));
        assert_eq!(GridVariant::parse("3x3").unwrap().center_index(), Some(4));
        assert_eq!(GridVariant::parse("4x4").unwrap().center_index(), None);
        assert_eq!(GridVariant::parse("3x5").unwrap().center_index(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(GridVariant::parse("5 × 5").unwrap().to_string(), "5x5");
    }
}
