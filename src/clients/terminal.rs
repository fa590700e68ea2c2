// src/clients/terminal.rs
// Terminal input and display for the interactive caller.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};

use crate::caller::CallerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    CallNext,
    Reset,
    Exit,
}

/// Maps a pressed key to a caller action; unrelated keys are ignored.
pub fn action_for_key(code: KeyCode) -> Option<UserAction> {
    match code {
        KeyCode::Enter | KeyCode::Char(' ') => Some(UserAction::CallNext),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(UserAction::Reset),
        KeyCode::Esc | KeyCode::Char('q') => Some(UserAction::Exit),
        _ => None,
    }
}

pub fn wait_for_user_action() -> io::Result<UserAction> {
    println!("\nENTER: call next item | R: reset | ESC: exit");

    enable_raw_mode()?;

    // Drop keys pressed while the previous item was being shown
    while event::poll(Duration::from_millis(0))? {
        event::read()?;
    }

    let result = loop {
        match event::read() {
            Ok(Event::Key(key_event)) if key_event.kind == KeyEventKind::Press => {
                if let Some(action) = action_for_key(key_event.code) {
                    break Ok(action);
                }
            }
            Ok(_) => {}
            Err(e) => break Err(e),
        }
    };

    disable_raw_mode()?;
    print!("\x1Bc"); // Clear the screen
    result
}

/// Last called items, most recent first.
pub fn recent_calls(state: &CallerState, n: usize) -> Vec<String> {
    state
        .called()
        .iter()
        .rev()
        .take(n)
        .map(|item| item.label.clone())
        .collect()
}

pub fn show_caller(title: &str, state: &CallerState) {
    println!("\x1b[1m{title}\x1b[0m\n");

    match state.last_called() {
        Some(item) => println!("Last called: \x1b[1;32m{}\x1b[0m", item.label),
        None => println!("No items called yet."),
    }

    let previous: Vec<String> = recent_calls(state, 4).into_iter().skip(1).collect();
    if !previous.is_empty() {
        println!("Previous: {}", previous.join(", "));
    }

    println!(
        "\nCalled {} / {} ({} remaining)",
        state.called().len(),
        state.called().len() + state.remaining(),
        state.remaining()
    );

    if !state.called().is_empty() {
        println!("\nCalled items:");
        for item in state.called() {
            println!("  \x1b[1;33m{}\x1b[0m", item.label);
        }
    }
    println!();
}
