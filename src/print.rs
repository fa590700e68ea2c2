// src/print.rs
// Plain-text rendering of bingo cards for terminal output and printing.

use crate::models::{CardLayout, ItemSnapshot};

/// Width of a single cell, excluding the border characters.
pub const CELL_WIDTH: usize = 14;

fn cell_text(item: &ItemSnapshot) -> String {
    let mut text = if item.is_mandatory && !item.is_free_space() {
        format!("*{}", item.label)
    } else {
        item.label.clone()
    };
    if text.chars().count() > CELL_WIDTH {
        text = text.chars().take(CELL_WIDTH - 1).collect();
        text.push('~');
    }
    text
}

fn separator(columns: usize) -> String {
    let mut line = String::from("+");
    for _ in 0..columns {
        line.push_str(&"-".repeat(CELL_WIDTH + 2));
        line.push('+');
    }
    line
}

/// Renders one card as a boxed grid with `columns` cells per row.
///
/// Mandatory items are prefixed with `*`. Labels longer than the cell are
/// cut and end with `~`. A short last row is padded with empty cells.
pub fn render_card(index: usize, layout: &CardLayout, columns: usize) -> String {
    let columns = columns.max(1);
    let mut out = format!("Card {index}\n");
    let sep = separator(columns);
    out.push_str(&sep);
    out.push('\n');

    for row in layout.items.chunks(columns) {
        out.push('|');
        for col in 0..columns {
            let text = row.get(col).map(cell_text).unwrap_or_default();
            out.push_str(&format!(" {text:^width$} |", width = CELL_WIDTH));
        }
        out.push('\n');
        out.push_str(&sep);
        out.push('\n');
    }
    out
}

/// Renders a set of cards separated by blank lines, numbered from 1.
pub fn render_cards(layouts: &[CardLayout], columns: usize) -> String {
    layouts
        .iter()
        .enumerate()
        .map(|(i, layout)| render_card(i + 1, layout, columns))
        .collect::<Vec<_>>()
        .join("\n")
}
