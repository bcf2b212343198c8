use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, Focus};
use crate::catalog::Catalog;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

fn select_next(state: &mut ratatui::widgets::ListState, count: usize) {
  if count > 0 {
    let i = state.selected().map_or(0, |i| (i + 1) % count);
    state.select(Some(i));
  }
}

fn select_prev(state: &mut ratatui::widgets::ListState, count: usize) {
  if count > 0 {
    let i = state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
    state.select(Some(i));
  }
}

// --- Event Handling ---

pub fn handle_key_event<C: Catalog>(app: &mut App<C>, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => {
        app.should_quit = true;
        return;
      }
      KeyCode::Char('t') => {
        app.next_theme();
        return;
      }
      KeyCode::Char('p') => {
        app.next_poster_mode();
        return;
      }
      _ => {}
    }
  }

  // Escape belongs to the detail view for as long as one is open.
  if app.detail.is_open() && key.code == KeyCode::Esc {
    app.close_detail();
    return;
  }

  match key.code {
    KeyCode::Tab => {
      app.focus = app.focus.next();
      return;
    }
    KeyCode::BackTab => {
      app.focus = app.focus.prev();
      return;
    }
    _ => {}
  }

  app.info_message = None;
  match app.focus {
    Focus::Search => handle_search_key(app, key),
    Focus::Results => handle_results_key(app, key),
    Focus::Side if app.detail.is_open() => handle_detail_key(app, key),
    Focus::Side => handle_watched_key(app, key),
  }
}

fn handle_search_key<C: Catalog>(app: &mut App<C>, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.search.submit();
      app.focus = Focus::Results;
    }
    KeyCode::Char(c) => app.insert_char(c),
    KeyCode::Backspace => app.delete_before_cursor(),
    KeyCode::Delete => app.delete_at_cursor(),
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.search.query().chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.search.query().chars().count();
    }
    KeyCode::Esc => {
      if !app.search.query().is_empty() {
        app.clear_query();
      } else if !app.search.results().is_empty() {
        app.focus = Focus::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.search.results().is_empty() {
        app.focus = Focus::Results;
      }
    }
    _ => {}
  }
}

fn handle_results_key<C: Catalog>(app: &mut App<C>, key: event::KeyEvent) {
  let count = app.search.results().len();
  match key.code {
    KeyCode::Enter => app.open_selected_result(),
    KeyCode::Down | KeyCode::Char('j') => select_next(&mut app.results_state, count),
    KeyCode::Up | KeyCode::Char('k') => select_prev(&mut app.results_state, count),
    KeyCode::Esc | KeyCode::Char('/') => app.focus = Focus::Search,
    KeyCode::Char('q') => app.should_quit = true,
    _ => {}
  }
}

fn handle_detail_key<C: Catalog>(app: &mut App<C>, key: event::KeyEvent) {
  match key.code {
    KeyCode::Backspace => app.close_detail(),
    KeyCode::Left | KeyCode::Char('h') => app.detail.adjust_rating(-1),
    KeyCode::Right | KeyCode::Char('l') => app.detail.adjust_rating(1),
    KeyCode::Char('0') => app.detail.set_rating(10),
    KeyCode::Char(c @ '1'..='9') => app.detail.set_rating(c as u8 - b'0'),
    KeyCode::Enter | KeyCode::Char('a') => app.add_open_movie_to_watched(),
    KeyCode::Char('q') => app.should_quit = true,
    _ => {}
  }
}

fn handle_watched_key<C: Catalog>(app: &mut App<C>, key: event::KeyEvent) {
  let count = app.watched.len();
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => select_next(&mut app.watched_state, count),
    KeyCode::Up | KeyCode::Char('k') => select_prev(&mut app.watched_state, count),
    KeyCode::Delete | KeyCode::Char('d') => app.delete_selected_watched(),
    KeyCode::Esc => app.focus = Focus::Search,
    KeyCode::Char('q') => app.should_quit = true,
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::tests::{advance, test_app};
  use crate::catalog::fake::{FakeCatalog, detail, item};
  use ratatui::crossterm::event::KeyEvent;

  fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5);
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日";
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  // --- key dispatch ---

  #[tokio::test(start_paused = true)]
  async fn escape_closes_detail_from_any_focus() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default()
      .with_search("int", 1, Some(vec![item("tt1", "Inception")]))
      .with_detail("tt1", 100, Some(detail("tt1", "Inception")));
    let mut app = test_app(catalog, dir.path());
    advance(500).await;
    app.tick();
    advance(5).await;
    app.tick();

    handle_key_event(&mut app, press(KeyCode::Tab));
    assert_eq!(app.focus, Focus::Results);
    handle_key_event(&mut app, press(KeyCode::Enter));
    assert!(app.detail.is_open());

    app.focus = Focus::Search;
    handle_key_event(&mut app, press(KeyCode::Esc));
    assert!(!app.detail.is_open());
    // The query was left alone; Escape went to the detail view.
    assert_eq!(app.search.query(), "int");

    // The cancelled request never lands.
    advance(200).await;
    app.tick();
    assert!(app.detail.detail().is_none());
    assert_eq!(app.take_title_change().as_deref(), Some("PopcornMeter"));

    // Without a detail open, Escape in the search box clears the query again.
    handle_key_event(&mut app, press(KeyCode::Esc));
    assert_eq!(app.search.query(), "");
  }

  #[tokio::test(start_paused = true)]
  async fn rating_keys_and_add() {
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

    handle_key_event(&mut app, press(KeyCode::Char('6')));
    handle_key_event(&mut app, press(KeyCode::Right));
    assert_eq!(app.detail.user_rating(), 7);
    handle_key_event(&mut app, press(KeyCode::Char('0')));
    assert_eq!(app.detail.user_rating(), 10);
    handle_key_event(&mut app, press(KeyCode::Char('h')));
    handle_key_event(&mut app, press(KeyCode::Enter));
    assert_eq!(app.watched.user_rating("tt1"), Some(9));
    assert!(!app.detail.is_open());

    // Focus stays on the side pane, which is now the watched list.
    handle_key_event(&mut app, press(KeyCode::Char('d')));
    assert!(app.watched.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn escape_in_search_clears_then_moves_then_quits() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::default().with_search("int", 1, Some(vec![item("tt1", "Inception")]));
    let mut app = test_app(catalog, dir.path());
    advance(500).await;
    app.tick();
    advance(5).await;
    app.tick();

    handle_key_event(&mut app, press(KeyCode::Esc));
    assert_eq!(app.search.query(), "");
    assert_eq!(app.focus, Focus::Search);
    assert!(!app.should_quit);

    // Last results are still on screen.
    handle_key_event(&mut app, press(KeyCode::Esc));
    assert_eq!(app.focus, Focus::Results);
    assert!(!app.should_quit);

    // A blank query commits an empty list; Esc in an empty box then quits.
    advance(500).await;
    app.tick();
    assert!(app.search.results().is_empty());
    app.focus = Focus::Search;
    handle_key_event(&mut app, press(KeyCode::Esc));
    assert!(app.should_quit);
  }

  #[tokio::test(start_paused = true)]
  async fn typing_goes_to_query() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(FakeCatalog::default(), dir.path());
    handle_key_event(&mut app, press(KeyCode::Char('o')));
    assert_eq!(app.search.query(), "into");
    handle_key_event(&mut app, press(KeyCode::Home));
    handle_key_event(&mut app, press(KeyCode::Delete));
    assert_eq!(app.search.query(), "nto");
    handle_key_event(&mut app, press(KeyCode::Enter));
    assert_eq!(app.focus, Focus::Results);
  }
}
