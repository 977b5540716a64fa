//! Terminal helpers.

use colored::Colorize;
use concierge_core::types::MemoryNote;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Numbered note list, 1-based to match `memory remove`.
pub fn print_notes(title: &str, notes: &[MemoryNote]) {
    println!("{} ({})", title.cyan().bold(), notes.len());
    if notes.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }
    for (i, note) in notes.iter().enumerate() {
        let keywords = if note.keywords.is_empty() {
            String::new()
        } else {
            format!(" [{}]", note.keywords.join(", "))
        };
        println!(
            "  {}. {} {}{}",
            i + 1,
            note.text,
            note.last_update_date.dimmed(),
            keywords.dimmed()
        );
    }
}
