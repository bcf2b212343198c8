//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` and parsed once on first access.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Window title
  pub app_title: String,
  pub detail_title_prefix: String,

  // Catalog
  pub catalog_base_url: String,
  pub connect_timeout_secs: u64,

  // Search
  pub debounce_ms: u64,
  pub initial_query: String,

  // Watched list
  pub watched_file: String,
  pub max_rating: u8,

  // Event loop
  pub poll_interval_ms: u64,
  pub error_expiry_secs: u64,
}

impl Constants {
  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time and covered by the test below.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
