use image::DynamicImage;
use ratatui::{layout::Rect, widgets::ListState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::catalog::{Catalog, OmdbClient};
use crate::config::Config;
use crate::constants::constants;
use crate::detail::DetailController;
use crate::input::char_to_byte_index;
use crate::poster::PosterMode;
use crate::search::SearchController;
use crate::theme::{THEMES, Theme, theme_index};
use crate::watched::WatchedStore;

/// Which pane receives keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Search,
  Results,
  /// The right-hand pane: the detail view when a movie is open, the watched list otherwise.
  Side,
}

impl Focus {
  pub fn next(self) -> Self {
    match self {
      Focus::Search => Focus::Results,
      Focus::Results => Focus::Side,
      Focus::Side => Focus::Search,
    }
  }

  pub fn prev(self) -> Self {
    match self {
      Focus::Search => Focus::Side,
      Focus::Results => Focus::Search,
      Focus::Side => Focus::Results,
    }
  }
}

/// Poster fitted to the last area it was drawn in, keyed by movie id.
pub struct PosterCache {
  pub id: String,
  pub area: Rect,
  pub mode: PosterMode,
  pub image: DynamicImage,
}

pub struct App<C: Catalog = OmdbClient> {
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub focus: Focus,
  pub theme_index: usize,
  pub poster_mode: PosterMode,
  pub search: SearchController,
  pub detail: DetailController,
  pub watched: WatchedStore,
  pub results_state: ListState,
  pub watched_state: ListState,
  pub last_error: Option<String>,
  /// Informational message, lower priority than errors.
  pub info_message: Option<String>,
  pub should_quit: bool,
  pub poster_cache: Option<PosterCache>,
  catalog: Arc<C>,
  config: Config,
  /// Title last written to the terminal.
  title_shown: Option<String>,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl<C: Catalog> App<C> {
  pub fn new(catalog: Arc<C>, watched: WatchedStore, config: Config, poster_mode: PosterMode) -> Self {
    let theme_index = theme_index(config.theme_name.as_deref());
    let search = SearchController::with_query(constants().initial_query.clone());
    let cursor_position = search.query().chars().count();
    let mut watched_state = ListState::default();
    if !watched.is_empty() {
      watched_state.select(Some(0));
    }

    Self {
      cursor_position,
      input_scroll: 0,
      focus: Focus::Search,
      theme_index,
      poster_mode,
      search,
      detail: DetailController::new(poster_mode.enabled()),
      watched,
      results_state: ListState::default(),
      watched_state,
      last_error: None,
      info_message: None,
      should_quit: false,
      poster_cache: None,
      catalog,
      config,
      title_shown: None,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index is bounded by theme_index() and the modulo in next_theme().
    &THEMES[self.theme_index]
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_expiry_secs)
    {
      self.clear_error();
    }
  }

  fn save_config(&mut self) {
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.poster_mode = Some(self.poster_mode.label().to_string());
    self.config.save();
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  pub fn next_poster_mode(&mut self) {
    self.poster_mode = self.poster_mode.next();
    self.poster_cache = None;
    self.detail.set_posters_enabled(self.poster_mode.enabled(), &self.catalog);
    self.info_message = Some(format!("Posters: {}", self.poster_mode.label()));
    self.save_config();
  }

  // --- Lifecycles ---

  /// Drive debounce timers and commit finished requests.
  pub fn tick(&mut self) -> bool {
    let search_changed = self.search.tick(&self.catalog);
    if search_changed && !self.search.is_loading() {
      self.reset_results_selection();
    }
    let detail_changed = self.detail.tick(&self.catalog);
    if detail_changed && self.detail.poster().is_none() {
      self.poster_cache = None;
    }
    self.expire_error();
    search_changed || detail_changed
  }

  /// A committed result set starts at its first row.
  fn reset_results_selection(&mut self) {
    let first = (!self.search.results().is_empty()).then_some(0);
    self.results_state.select(first);
    *self.results_state.offset_mut() = 0;
  }

  fn clamp_watched_selection(&mut self) {
    let count = self.watched.len();
    match self.watched_state.selected() {
      _ if count == 0 => self.watched_state.select(None),
      Some(i) if i >= count => self.watched_state.select(Some(count - 1)),
      None => self.watched_state.select(Some(0)),
      Some(_) => {}
    }
  }

  /// The window title if it differs from what was last written.
  pub fn take_title_change(&mut self) -> Option<String> {
    let title = self.detail.window_title();
    if self.title_shown.as_deref() == Some(title.as_str()) {
      return None;
    }
    self.title_shown = Some(title.clone());
    Some(title)
  }

  // --- Search input ---

  /// Apply an edit to the query text; the search controller sees it only if it changed.
  pub fn edit_query(&mut self, edit: impl FnOnce(&mut String, &mut usize)) {
    let mut query = self.search.query().to_string();
    let mut cursor = self.cursor_position;
    edit(&mut query, &mut cursor);
    self.cursor_position = cursor.min(query.chars().count());
    if query != self.search.query() {
      self.search.set_query(query);
    }
  }

  pub fn insert_char(&mut self, c: char) {
    self.edit_query(|query, cursor| {
      let byte_idx = char_to_byte_index(query, *cursor);
      query.insert(byte_idx, c);
      *cursor += 1;
    });
  }

  pub fn delete_before_cursor(&mut self) {
    self.edit_query(|query, cursor| {
      if *cursor > 0 {
        *cursor -= 1;
        let byte_idx = char_to_byte_index(query, *cursor);
        query.remove(byte_idx);
      }
    });
  }

  pub fn delete_at_cursor(&mut self) {
    self.edit_query(|query, cursor| {
      if *cursor < query.chars().count() {
        let byte_idx = char_to_byte_index(query, *cursor);
        query.remove(byte_idx);
      }
    });
  }

  pub fn clear_query(&mut self) {
    self.edit_query(|query, cursor| {
      query.clear();
      *cursor = 0;
    });
    self.input_scroll = 0;
  }

  // --- Selection ---

  pub fn selected_result_id(&self) -> Option<String> {
    let i = self.results_state.selected()?;
    self.search.results().get(i).map(|item| item.id.clone())
  }

  pub fn open_selected_result(&mut self) {
    let Some(id) = self.selected_result_id() else { return };
    self.clear_error();
    self.poster_cache = None;
    self.detail.select(&id, &self.catalog);
    self.focus = Focus::Side;
  }

  /// Back action and Escape while a detail is open.
  pub fn close_detail(&mut self) {
    self.detail.clear();
    self.poster_cache = None;
  }

  /// Whether the open movie is already in the watched list.
  pub fn open_movie_watched_rating(&self) -> Option<u8> {
    self.detail.selected_id().and_then(|id| self.watched.user_rating(id))
  }

  /// Hand the rated detail to the watched store, then return to the summary.
  pub fn add_open_movie_to_watched(&mut self) {
    if self.open_movie_watched_rating().is_some() {
      return;
    }
    let Some(entry) = self.detail.build_entry() else { return };
    let title = entry.title.clone();
    match self.watched.add(entry) {
      Ok(()) => {
        self.info_message = Some(format!("Added '{}' to your list", title));
      }
      Err(e) => {
        warn!(err = %e, path = %self.watched.path().display(), "watched: add failed");
        self.set_error(format!("{}", e));
      }
    }
    self.clamp_watched_selection();
    self.close_detail();
  }

  pub fn delete_selected_watched(&mut self) {
    let Some(i) = self.watched_state.selected() else { return };
    let Some(id) = self.watched.entries().get(i).map(|e| e.id.clone()) else { return };
    if let Err(e) = self.watched.remove(&id) {
      warn!(err = %e, path = %self.watched.path().display(), "watched: remove failed");
      self.set_error(format!("{}", e));
    }
    info!(id = %id, remaining = self.watched.len(), "watched entry deleted");
    self.clamp_watched_selection();
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::catalog::fake::{FakeCatalog, detail, item};

  pub(crate) fn test_app(catalog: FakeCatalog, dir: &std::path::Path) -> App<FakeCatalog> {
    let store = WatchedStore::open(dir.join("watched.json"));
    App::new(Arc::new(catalog), store, Config::default(), PosterMode::Off)
  }

  pub(crate) async fn advance(ms: u64) {
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
  }

  #[tokio::test(start_paused = true)]
  async fn starts_with_initial_query() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default().with_search("int", 5, Some(vec![item("tt1", "Interstellar")]));
    let mut app = test_app(catalog, dir.path());
    assert_eq!(app.search.query(), "int");
    assert_eq!(app.cursor_position, 3);
    advance(500).await;
    app.tick();
    advance(10).await;
    assert!(app.tick());
    assert_eq!(app.results_state.selected(), Some(0));
    assert_eq!(app.selected_result_id().as_deref(), Some("tt1"));
  }

  #[tokio::test(start_paused = true)]
  async fn editing_query_restarts_debounce() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(FakeCatalog::default(), dir.path());
    app.clear_query();
    assert_eq!(app.search.query(), "");
    for c in "héat".chars() {
      app.insert_char(c);
    }
    assert_eq!(app.search.query(), "héat");
    app.cursor_position = 1;
    app.delete_at_cursor();
    assert_eq!(app.search.query(), "hat");
    app.delete_before_cursor();
    assert_eq!(app.search.query(), "at");
    assert_eq!(app.cursor_position, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn add_to_watched_then_back_to_summary() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
      .with_search("int", 1, Some(vec![item("tt1", "Inception")]))
      .with_detail("tt1", 1, Some(detail("tt1", "Inception")));
    let mut app = test_app(catalog, dir.path());
    advance(500).await;
    app.tick();
    advance(5).await;
    app.tick();

    app.open_selected_result();
    assert_eq!(app.focus, Focus::Side);
    advance(5).await;
    app.tick();
    assert_eq!(app.take_title_change().as_deref(), Some("Movie | Inception"));
    assert_eq!(app.take_title_change(), None);

    app.detail.set_rating(7);
    app.add_open_movie_to_watched();
    assert!(!app.detail.is_open());
    assert_eq!(app.watched.len(), 1);
    assert_eq!(app.watched.user_rating("tt1"), Some(7));
    assert_eq!(app.watched_state.selected(), Some(0));
    assert_eq!(app.take_title_change().as_deref(), Some("PopcornMeter"));

    // Reopening shows the stored rating and refuses a second add.
    app.open_selected_result();
    advance(5).await;
    app.tick();
    assert_eq!(app.open_movie_watched_rating(), Some(7));
    app.detail.set_rating(3);
    app.add_open_movie_to_watched();
    assert_eq!(app.watched.len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn add_requires_a_rating() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
      .with_search("int", 1, Some(vec![item("tt1", "Inception")]))
      .with_detail("tt1", 1, Some(detail("tt1", "Inception")));
    let mut app = test_app(catalog, dir.path());
    advance(500).await;
    app.tick();
    advance(5).await;
    app.tick();
    app.open_selected_result();
    advance(5).await;
    app.tick();
    app.add_open_movie_to_watched();
    assert!(app.watched.is_empty());
    assert!(app.detail.is_open());
  }

  #[tokio::test(start_paused = true)]
  async fn delete_keeps_selection_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(FakeCatalog::default(), dir.path());
    for id in ["a", "b"] {
      let entry = crate::watched::WatchedEntry::from_detail(&detail(id, id), 5, chrono::Utc::now()).unwrap();
      app.watched.add(entry).unwrap();
    }
    app.watched_state.select(Some(1));
    app.delete_selected_watched();
    assert_eq!(app.watched.len(), 1);
    assert_eq!(app.watched_state.selected(), Some(0));
    app.delete_selected_watched();
    assert!(app.watched.is_empty());
    assert_eq!(app.watched_state.selected(), None);
    app.delete_selected_watched();
  }

  #[tokio::test(start_paused = true)]
  async fn new_result_set_starts_at_first_row() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
      .with_search("int", 1, Some(vec![item("tt1", "Inception"), item("tt2", "Interstellar"), item("tt3", "Insomnia")]))
      .with_search("heat", 1, Some(vec![item("tt4", "Heat"), item("tt5", "Heat Wave")]));
    let mut app = test_app(catalog, dir.path());
    advance(500).await;
    app.tick();
    advance(5).await;
    app.tick();
    app.results_state.select(Some(2));
    *app.results_state.offset_mut() = 1;

    app.clear_query();
    for c in "heat".chars() {
      app.insert_char(c);
    }
    app.search.submit();
    app.tick();
    advance(5).await;
    assert!(app.tick());
    assert_eq!(app.results_state.selected(), Some(0));
    assert_eq!(app.results_state.offset(), 0);
    assert_eq!(app.selected_result_id().as_deref(), Some("tt4"));
  }

  #[tokio::test(start_paused = true)]
  async fn failed_write_reports_error_and_keeps_list_usable() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
      .with_search("int", 1, Some(vec![item("tt1", "Inception")]))
      .with_detail("tt1", 1, Some(detail("tt1", "Inception")));
    // A directory where the file should be: every write fails.
    let store = WatchedStore::open(dir.path());
    let mut app = App::new(Arc::new(catalog), store, Config::default(), PosterMode::Off);
    advance(500).await;
    app.tick();
    advance(5).await;
    app.tick();
    app.open_selected_result();
    advance(5).await;
    app.tick();

    app.detail.set_rating(8);
    app.add_open_movie_to_watched();
    assert!(app.last_error.is_some());
    assert!(app.info_message.is_none());
    assert!(!app.detail.is_open());
    assert_eq!(app.watched.user_rating("tt1"), Some(8));
    assert_eq!(app.watched_state.selected(), Some(0));

    app.clear_error();
    app.delete_selected_watched();
    assert!(app.watched.is_empty());
    assert!(app.last_error.is_some());
  }

  #[test]
  fn focus_cycles() {
    assert_eq!(Focus::Search.next(), Focus::Results);
    assert_eq!(Focus::Side.next(), Focus::Search);
    assert_eq!(Focus::Search.prev(), Focus::Side);
  }
}
