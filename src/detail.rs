use chrono::Utc;
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::{Catalog, MovieDetail, has_poster};
use crate::constants::constants;
use crate::lifecycle::FetchLifecycle;
use crate::watched::WatchedEntry;

/// Which movie is open in the detail pane, and the requests that fill it.
pub struct DetailController {
  selected: Option<String>,
  fetch: FetchLifecycle<MovieDetail>,
  poster: FetchLifecycle<DynamicImage>,
  posters_enabled: bool,
  user_rating: u8,
}

impl DetailController {
  pub fn new(posters_enabled: bool) -> Self {
    Self {
      selected: None,
      fetch: FetchLifecycle::new("detail"),
      poster: FetchLifecycle::new("poster"),
      posters_enabled,
      user_rating: 0,
    }
  }

  pub fn is_open(&self) -> bool {
    self.selected.is_some()
  }

  pub fn selected_id(&self) -> Option<&str> {
    self.selected.as_deref()
  }

  /// Open `id`, superseding whatever was selected before. Re-selecting the open id
  /// only retries when its fetch failed.
  pub fn select<C: Catalog>(&mut self, id: &str, catalog: &Arc<C>) {
    if self.selected.as_deref() == Some(id) && self.fetch.error().is_none() {
      return;
    }
    info!(id = %id, "detail: select");
    self.fetch.clear();
    self.poster.clear();
    self.user_rating = 0;
    self.selected = Some(id.to_string());

    let catalog = Arc::clone(catalog);
    let id = id.to_string();
    self.fetch.start(async move { catalog.detail(&id).await });
  }

  /// Back to the watched summary. In-flight requests are cancelled.
  pub fn clear(&mut self) {
    if let Some(id) = self.selected.take() {
      debug!(id = %id, "detail: clear");
    }
    self.fetch.clear();
    self.poster.clear();
    self.user_rating = 0;
  }

  /// Commit finished requests; a freshly loaded detail kicks off its poster download.
  pub fn tick<C: Catalog>(&mut self, catalog: &Arc<C>) -> bool {
    let detail_changed = self.fetch.poll();
    if detail_changed {
      self.start_poster(catalog);
    }
    self.poster.poll() || detail_changed
  }

  fn start_poster<C: Catalog>(&mut self, catalog: &Arc<C>) {
    if !self.posters_enabled {
      return;
    }
    let Some(detail) = self.fetch.value() else { return };
    if !has_poster(&detail.poster_url) {
      return;
    }
    let catalog = Arc::clone(catalog);
    let url = detail.poster_url.clone();
    self.poster.start(async move { catalog.poster(&url).await });
  }

  pub fn set_posters_enabled<C: Catalog>(&mut self, enabled: bool, catalog: &Arc<C>) {
    if self.posters_enabled == enabled {
      return;
    }
    self.posters_enabled = enabled;
    if enabled {
      self.start_poster(catalog);
    } else {
      self.poster.clear();
    }
  }

  pub fn detail(&self) -> Option<&MovieDetail> {
    self.fetch.value()
  }

  pub fn poster(&self) -> Option<&DynamicImage> {
    self.poster.value()
  }

  pub fn is_loading(&self) -> bool {
    self.fetch.is_loading()
  }

  pub fn error(&self) -> Option<&str> {
    self.fetch.error()
  }

  /// Terminal title: the movie while its detail is shown, the app name otherwise.
  pub fn window_title(&self) -> String {
    match self.detail() {
      Some(detail) if !detail.title.is_empty() => format!("{} | {}", constants().detail_title_prefix, detail.title),
      _ => constants().app_title.clone(),
    }
  }

  pub fn user_rating(&self) -> u8 {
    self.user_rating
  }

  pub fn set_rating(&mut self, rating: u8) {
    self.user_rating = rating.min(constants().max_rating);
  }

  pub fn adjust_rating(&mut self, delta: i8) {
    let next = (self.user_rating as i16 + delta as i16).clamp(0, constants().max_rating as i16);
    self.user_rating = next as u8;
  }

  /// The entry to hand to the watched store, once a detail is loaded and rated.
  pub fn build_entry(&self) -> Option<WatchedEntry> {
    if self.user_rating == 0 {
      return None;
    }
    let detail = self.detail()?;
    WatchedEntry::from_detail(detail, self.user_rating, Utc::now()).ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::fake::{FakeCatalog, detail};
  use std::time::Duration;

  async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
  }

  #[tokio::test(start_paused = true)]
  async fn loads_detail_and_sets_title() {
    let catalog = Arc::new(FakeCatalog::default().with_detail("tt1", 20, Some(detail("tt1", "Inception"))));
    let mut d = DetailController::new(false);
    assert_eq!(d.window_title(), "PopcornMeter");
    d.select("tt1", &catalog);
    assert!(d.is_loading());
    assert_eq!(d.window_title(), "PopcornMeter");
    advance(30).await;
    assert!(d.tick(&catalog));
    assert_eq!(d.detail().map(|m| m.title.as_str()), Some("Inception"));
    assert_eq!(d.window_title(), "Movie | Inception");
  }

  #[tokio::test(start_paused = true)]
  async fn second_selection_wins() {
    let catalog = Arc::new(
      FakeCatalog::default()
        .with_detail("tt1", 200, Some(detail("tt1", "First")))
        .with_detail("tt2", 50, Some(detail("tt2", "Second"))),
    );
    let mut d = DetailController::new(false);
    d.select("tt1", &catalog);
    advance(10).await;
    d.select("tt2", &catalog);
    advance(60).await;
    d.tick(&catalog);
    assert_eq!(d.detail().map(|m| m.id.as_str()), Some("tt2"));
    advance(500).await;
    assert!(!d.tick(&catalog));
    assert_eq!(d.detail().map(|m| m.id.as_str()), Some("tt2"));
    assert_eq!(d.window_title(), "Movie | Second");
  }

  #[tokio::test(start_paused = true)]
  async fn slow_first_selection_never_displays() {
    let catalog = Arc::new(
      FakeCatalog::default()
        .with_detail("tt1", 50, Some(detail("tt1", "First")))
        .with_detail("tt2", 300, Some(detail("tt2", "Second"))),
    );
    let mut d = DetailController::new(false);
    d.select("tt1", &catalog);
    d.select("tt2", &catalog);
    advance(100).await;
    assert!(!d.tick(&catalog));
    assert!(d.detail().is_none());
    assert!(d.is_loading());
  }

  #[tokio::test(start_paused = true)]
  async fn escape_clears_and_cancels() {
    let catalog = Arc::new(
      FakeCatalog::default()
        .with_detail("tt1", 10, Some(detail("tt1", "Heat")))
        .with_detail("tt2", 100, Some(detail("tt2", "Ronin"))),
    );
    let mut d = DetailController::new(false);
    d.select("tt1", &catalog);
    advance(20).await;
    d.tick(&catalog);
    assert_eq!(d.window_title(), "Movie | Heat");

    d.clear();
    assert!(!d.is_open());
    assert_eq!(d.window_title(), "PopcornMeter");

    d.select("tt2", &catalog);
    d.clear();
    advance(200).await;
    assert!(!d.tick(&catalog));
    assert!(d.detail().is_none());
    assert_eq!(d.window_title(), "PopcornMeter");
  }

  #[tokio::test(start_paused = true)]
  async fn not_found_detail_shows_message() {
    let catalog = Arc::new(FakeCatalog::default().with_detail("bad", 5, None));
    let mut d = DetailController::new(false);
    d.select("bad", &catalog);
    advance(10).await;
    d.tick(&catalog);
    assert_eq!(d.error(), Some("Movie not found"));
    assert_eq!(d.window_title(), "PopcornMeter");
  }

  #[tokio::test(start_paused = true)]
  async fn reselect_retries_only_after_failure() {
    let catalog = Arc::new(FakeCatalog::default().with_detail("tt1", 5, Some(detail("tt1", "Alien"))));
    let mut d = DetailController::new(false);
    d.select("tt1", &catalog);
    advance(10).await;
    d.tick(&catalog);
    d.select("tt1", &catalog);
    assert!(!d.is_loading());
    assert_eq!(catalog.detail_log.lock().unwrap().len(), 1);

    let failing = Arc::new(FakeCatalog::default().with_detail("tt2", 5, None));
    d.select("tt2", &failing);
    advance(10).await;
    d.tick(&failing);
    assert_eq!(d.error(), Some("Movie not found"));
    d.select("tt2", &failing);
    assert!(d.is_loading());
    assert!(d.error().is_none());
    assert_eq!(*failing.detail_log.lock().unwrap(), vec!["tt2".to_string(), "tt2".to_string()]);
  }

  #[tokio::test(start_paused = true)]
  async fn poster_follows_detail() {
    let mut with_poster = detail("tt1", "Alien");
    with_poster.poster_url = "https://img/alien.jpg".to_string();
    let catalog = Arc::new(FakeCatalog::default().with_detail("tt1", 5, Some(with_poster)));
    let mut d = DetailController::new(true);
    d.select("tt1", &catalog);
    advance(10).await;
    d.tick(&catalog);
    advance(1).await;
    d.tick(&catalog);
    assert!(d.poster().is_some());

    d.set_posters_enabled(false, &catalog);
    assert!(d.poster().is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn rating_and_entry() {
    let catalog = Arc::new(FakeCatalog::default().with_detail("tt1", 5, Some(detail("tt1", "Alien"))));
    let mut d = DetailController::new(false);
    d.select("tt1", &catalog);
    d.set_rating(7);
    assert!(d.build_entry().is_none());
    advance(10).await;
    d.tick(&catalog);
    // Rating resets with each selection, not when the detail lands.
    assert_eq!(d.user_rating(), 7);
    let entry = d.build_entry().unwrap();
    assert_eq!(entry.user_rating, 7);
    assert_eq!(entry.id, "tt1");

    d.set_rating(0);
    assert!(d.build_entry().is_none());
    d.adjust_rating(-1);
    assert_eq!(d.user_rating(), 0);
    d.set_rating(42);
    assert_eq!(d.user_rating(), 10);
    d.adjust_rating(3);
    assert_eq!(d.user_rating(), 10);
  }
}
