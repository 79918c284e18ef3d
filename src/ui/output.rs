use anyhow::{Context, Result};
use crossterm::style::{self, Color, Stylize};
use serde::Serialize;
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

const PANEL_WIDTH: usize = 68;
const LABEL_WIDTH: usize = 16;

/// Get display width of a string (accounts for wide chars like emojis)
fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// One `label: value` line of a panel, with an optional dimmed note.
pub struct PanelRow {
    pub label: String,
    pub value: String,
    pub note: Option<String>,
}

impl PanelRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            note: None,
        }
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Render rows in a styled box
pub fn render_panel(title: &str, rows: &[PanelRow], color: Color) -> Result<()> {
    let width = PANEL_WIDTH;
    let title = format!(" {} ", title);
    let mut stdout = io::stdout();

    // Top border
    print_colored(&format!("╭{}╮", "─".repeat(width)), color)?;
    println!();

    // Title line
    print_colored("│", color)?;
    print_colored(&title, color)?;
    print!("{}", " ".repeat(width.saturating_sub(display_width(&title))));
    print_colored("│", color)?;
    println!();

    // Separator
    print_colored(&format!("├{}┤", "─".repeat(width)), color)?;
    println!();

    for row in rows {
        let label = format!("  {:<w$}", format!("{}:", row.label), w = LABEL_WIDTH);
        let note = row
            .note
            .as_ref()
            .map(|n| format!(" ({})", n))
            .unwrap_or_default();
        let room = width
            .saturating_sub(display_width(&label))
            .saturating_sub(display_width(&note))
            .saturating_sub(1);
        let value = truncate(&row.value, room);

        print_colored("│", color)?;
        print_colored(&label, Color::DarkGrey)?;
        print!("{}", value.clone().white().bold());
        print_colored(&note, Color::DarkGrey)?;
        let used = display_width(&label) + display_width(&value) + display_width(&note);
        print!("{}", " ".repeat(width.saturating_sub(used)));
        print_colored("│", color)?;
        println!();
    }

    // Bottom border
    print_colored(&format!("╰{}╯", "─".repeat(width)), color)?;
    println!();

    stdout.flush()?;
    Ok(())
}

/// Pretty-print a value as JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

fn print_colored(text: &str, color: Color) -> Result<()> {
    print!("{}", style::style(text).with(color));
    Ok(())
}

fn truncate(s: &str, max_width: usize) -> String {
    if display_width(s) <= max_width {
        s.to_string()
    } else {
        let mut result = String::new();
        let mut current_width = 0;
        for c in s.chars() {
            let char_width = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if current_width + char_width + 3 > max_width {
                break;
            }
            result.push(c);
            current_width += char_width;
        }
        result.push_str("...");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate("main", 10), "main");
    }

    #[test]
    fn test_truncate_long_string() {
        let out = truncate("https://dev.azure.com/some-very-long-organization", 20);
        assert!(out.ends_with("..."));
        assert!(display_width(&out) <= 20);
    }

    #[test]
    fn test_truncate_counts_wide_chars() {
        let out = truncate("🐞🐞🐞🐞🐞🐞", 8);
        assert!(display_width(&out) <= 8);
    }
}
