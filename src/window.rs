use anyhow::{Context, Result};
use ratatui::crossterm::{execute, terminal::SetTitle};
use tracing::debug;

/// Set the terminal window/tab title.
pub fn set_title(title: &str) -> Result<()> {
  debug!(title = %title, "window title");
  execute!(std::io::stdout(), SetTitle(title)).context("Failed to set terminal title")
}
