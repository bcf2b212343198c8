use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, Focus, PosterCache};
use crate::catalog::Catalog;
use crate::constants::constants;
use crate::poster::PosterWidget;
use crate::search::SearchPhase;
use crate::summary::{WatchedSummary, format_average};
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn pane<'a>(theme: &Theme, title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
  let color = if focused { theme.accent } else { theme.border };
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(color))
    .padding(Padding::horizontal(1))
}

fn loader(theme: &Theme) -> Paragraph<'static> {
  Paragraph::new(vec![
    Line::from(""),
    Line::from(Span::styled("Loading...", Style::default().fg(theme.status).add_modifier(Modifier::BOLD))),
  ])
  .alignment(Alignment::Center)
}

fn error_line(theme: &Theme, message: &str) -> Paragraph<'static> {
  Paragraph::new(vec![
    Line::from(""),
    Line::from(Span::styled(format!("⛔ {}", message), Style::default().fg(theme.error))),
  ])
  .alignment(Alignment::Center)
}

/// `★★★★☆☆☆☆☆☆` for a rating out of `max`.
pub fn stars(rating: u8, max: u8) -> String {
  let filled = rating.min(max) as usize;
  format!("{}{}", "★".repeat(filled), "☆".repeat(max as usize - filled))
}

// --- UI Rendering ---

pub fn ui<C: Catalog>(frame: &mut Frame, app: &mut App<C>) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(5),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  let [left_area, right_area] =
    Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(main_area);

  render_header(frame, app, header_area);
  render_results(frame, app, left_area);
  if app.detail.is_open() {
    render_detail(frame, app, right_area);
  } else {
    render_watched(frame, app, right_area);
  }
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header<C: Catalog>(frame: &mut Frame, app: &App<C>, area: Rect) {
  let theme = app.theme();
  let mut spans =
    vec![Span::styled(" 🍿 PopcornMeter ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  if app.search.phase() == SearchPhase::Success {
    spans.push(Span::styled(
      format!("  Found {} results", app.search.results().len()),
      Style::default().fg(theme.muted),
    ));
  }
  frame.render_widget(Line::from(spans), area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_results<C: Catalog>(frame: &mut Frame, app: &mut App<C>, area: Rect) {
  let theme = app.theme();
  let block = pane(theme, " Results ", app.focus == Focus::Results);

  if app.search.is_loading() {
    frame.render_widget(loader(theme).block(block), area);
    return;
  }
  if let Some(message) = app.search.error() {
    frame.render_widget(error_line(theme, message).block(block), area);
    return;
  }
  if app.search.results().is_empty() {
    let hint = if app.search.phase() == SearchPhase::Debouncing { "" } else { "Type a title to search the catalog." };
    frame.render_widget(
      Paragraph::new(Line::from(Span::styled(hint, Style::default().fg(theme.muted)))).block(block),
      area,
    );
    return;
  }

  // Inner width: borders, padding and the highlight symbol.
  let inner_w = area.width.saturating_sub(6) as usize;
  let selected = app.results_state.selected();
  let items: Vec<ListItem> = app
    .search
    .results()
    .iter()
    .enumerate()
    .map(|(i, movie)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      let fg = if Some(i) == selected { theme.highlight_fg } else { theme.fg };
      let year = format!("📅 {}", movie.year);
      let year_w = display_width(&year, year.chars().count());
      let title = truncate_str(&movie.title, inner_w.saturating_sub(year_w + 2));
      let gap = inner_w.saturating_sub(display_width(&title, title.chars().count()) + year_w);
      ListItem::new(Line::from(vec![
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(year, Style::default().fg(theme.muted)),
      ]))
      .bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, area, &mut app.results_state);
}

fn render_detail<C: Catalog>(frame: &mut Frame, app: &mut App<C>, area: Rect) {
  let theme = app.theme();
  let block = pane(theme, " ← Movie ", app.focus == Focus::Side);

  if app.detail.is_loading() {
    frame.render_widget(loader(theme).block(block), area);
    return;
  }
  if let Some(message) = app.detail.error() {
    frame.render_widget(error_line(theme, message).block(block), area);
    return;
  }
  let Some(movie) = app.detail.detail().cloned() else {
    frame.render_widget(block, area);
    return;
  };

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [top_area, body_area] = Layout::vertical([Constraint::Length(8), Constraint::Min(0)]).areas(inner);
  let poster_w = if app.poster_mode.enabled() && app.detail.poster().is_some() { 12 } else { 0 };
  let [poster_area, overview_area] =
    Layout::horizontal([Constraint::Length(poster_w), Constraint::Min(0)]).spacing(1).areas(top_area);

  if poster_w > 0 {
    render_poster(frame, app, &movie.id, poster_area);
  }

  let label = Style::default().fg(theme.muted);
  let value = Style::default().fg(theme.fg);
  let rating = movie.catalog_rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "N/A".to_string());
  let overview = vec![
    Line::from(Span::styled(movie.title.clone(), value.add_modifier(Modifier::BOLD))),
    Line::from(Span::styled(format!("{} | {}", movie.released, movie.runtime), label)),
    Line::from(Span::styled(movie.genre.clone(), label)),
    Line::from(""),
    Line::from(vec![Span::styled("⭐ ", Style::default().fg(theme.star)), Span::styled(rating, value), Span::styled(" IMDb rating", label)]),
  ];
  frame.render_widget(Paragraph::new(overview).wrap(Wrap { trim: true }), overview_area);

  let mut body = Vec::new();
  match app.open_movie_watched_rating() {
    Some(rated) => {
      body.push(Line::from(vec![
        Span::styled(format!("You rated this movie {} ", rated), value),
        Span::styled("🌟", Style::default().fg(theme.star)),
      ]));
    }
    None => {
      let current = app.detail.user_rating();
      let max = constants().max_rating;
      let mut spans = vec![
        Span::styled(stars(current, max), Style::default().fg(theme.star)),
        Span::styled(format!("  {}", if current > 0 { current.to_string() } else { String::new() }), value),
      ];
      if current > 0 {
        spans.push(Span::styled("   Enter ", Style::default().fg(theme.key_fg).bg(theme.key_bg)));
        spans.push(Span::styled(" + Add to list", Style::default().fg(theme.accent)));
      }
      body.push(Line::from(spans));
    }
  }
  body.push(Line::from(""));
  body.push(Line::from(Span::styled(movie.plot.clone(), value.add_modifier(Modifier::ITALIC))));
  body.push(Line::from(""));
  body.push(Line::from(vec![Span::styled("Starring: ", label), Span::styled(movie.actors.clone(), value)]));
  body.push(Line::from(vec![Span::styled("Directed by: ", label), Span::styled(movie.director.clone(), value)]));
  frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: true }), body_area);
}

fn render_poster<C: Catalog>(frame: &mut Frame, app: &mut App<C>, id: &str, area: Rect) {
  let mode = app.poster_mode;
  let stale = match &app.poster_cache {
    Some(cache) => cache.id != id || cache.area != area || cache.mode != mode,
    None => true,
  };
  if stale && let Some(image) = app.detail.poster() {
    app.poster_cache = Some(PosterCache { id: id.to_string(), area, mode, image: mode.fit(image, area) });
  }
  if let Some(cache) = &app.poster_cache {
    frame.render_widget(PosterWidget { image: &cache.image, mode }, area);
  }
}

fn render_watched<C: Catalog>(frame: &mut Frame, app: &mut App<C>, area: Rect) {
  let theme = app.theme();
  let [summary_area, list_area] = Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);

  let summary = WatchedSummary::compute(app.watched.entries());
  let muted = Style::default().fg(theme.muted);
  let value = Style::default().fg(theme.fg);
  let runtime = format_average(summary.avg_runtime);
  let lines = vec![
    Line::from(Span::styled("MOVIES YOU WATCHED", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(vec![
      Span::styled("🎞 ", muted),
      Span::styled(format!("{} movies", summary.count), value),
      Span::styled("   ⭐ ", Style::default().fg(theme.star)),
      Span::styled(format_average(summary.avg_catalog_rating), value),
      Span::styled("   🌟 ", Style::default().fg(theme.star)),
      Span::styled(format_average(summary.avg_user_rating), value),
      Span::styled("   ⏳ ", muted),
      Span::styled(if runtime.is_empty() { runtime } else { format!("{} min", runtime) }, value),
    ]),
  ];
  let summary_block = Block::bordered()
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1));
  frame.render_widget(Paragraph::new(lines).block(summary_block), summary_area);

  let block = pane(theme, " Watched ", app.focus == Focus::Side);
  if app.watched.is_empty() {
    frame.render_widget(
      Paragraph::new(Line::from(Span::styled("Rate a movie to start your list.", muted))).block(block),
      list_area,
    );
    return;
  }

  let inner_w = list_area.width.saturating_sub(6) as usize;
  let items: Vec<ListItem> = app
    .watched
    .entries()
    .iter()
    .enumerate()
    .map(|(i, entry)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      let catalog = entry.catalog_rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "–".to_string());
      let runtime = entry.runtime_minutes.map(|m| format!("{} min", m)).unwrap_or_else(|| "–".to_string());
      let when = entry.watched_at.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_default();
      ListItem::new(vec![
        Line::from(Span::styled(truncate_str(&entry.title, inner_w), value.add_modifier(Modifier::BOLD))),
        Line::from(vec![
          Span::styled("⭐ ", Style::default().fg(theme.star)),
          Span::styled(catalog, value),
          Span::styled("  🌟 ", Style::default().fg(theme.star)),
          Span::styled(entry.user_rating.to_string(), value),
          Span::styled("  ⏳ ", muted),
          Span::styled(runtime, value),
          Span::styled(format!("  {}", when), muted),
        ]),
      ])
      .bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, list_area, &mut app.watched_state);
}

fn render_status<C: Catalog>(frame: &mut Frame, app: &App<C>, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ✓ {}", info), Style::default().fg(theme.status))
  } else {
    match app.search.phase() {
      SearchPhase::Debouncing => (" …".to_string(), Style::default().fg(theme.muted)),
      SearchPhase::Fetching => (format!(" ⏳ Searching '{}'…", app.search.query().trim()), Style::default().fg(theme.status)),
      _ => (" Ready".to_string(), Style::default().fg(theme.muted)),
    }
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input<C: Catalog>(frame: &mut Frame, app: &mut App<C>, area: Rect) {
  let theme = app.theme();
  let focused = app.focus == Focus::Search;
  let border_color = if focused { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search movies ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let query = app.search.query();
  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(query, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = query
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = if query.is_empty() {
    Paragraph::new(Span::styled("Search movies...", Style::default().fg(theme.muted)))
  } else {
    Paragraph::new(visible).style(Style::default().fg(theme.fg))
  };
  frame.render_widget(paragraph.block(input_block), area);

  if focused {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer<C: Catalog>(frame: &mut Frame, app: &App<C>, area: Rect) {
  let theme = app.theme();
  let mut keys: Vec<(&str, &str)> = match app.focus {
    Focus::Search => vec![("Enter", "Search"), ("Esc", "Clear")],
    Focus::Results => vec![("Enter", "Open"), ("j/k", "Navigate")],
    Focus::Side if app.detail.is_open() => {
      let mut k = vec![("←/→", "Rate")];
      if app.detail.user_rating() > 0 && app.open_movie_watched_rating().is_none() {
        k.push(("Enter", "Add"));
      }
      k
    }
    Focus::Side => vec![("j/k", "Navigate"), ("d", "Delete")],
  };
  if app.detail.is_open() {
    keys.push(("Esc", "Back"));
  }
  keys.push(("Tab", "Focus"));
  keys.push(("^t", "Theme"));
  keys.push(("^p", "Posters"));

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();
  frame.render_widget(Line::from(spans), area);

  let label = format!("{} · {} ", theme.name, app.poster_mode.label());
  let right = Line::from(Span::styled(&label, Style::default().fg(theme.muted)));
  let width = label.chars().count() as u16;
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width, ..area };
  frame.render_widget(right, right_area);
}
