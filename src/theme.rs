use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub star: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "popcorn",
    bg: Color::Rgb(33, 37, 41),
    fg: Color::Rgb(222, 226, 230),
    accent: Color::Rgb(103, 65, 217),
    muted: Color::Rgb(134, 142, 150),
    border: Color::Rgb(73, 80, 87),
    highlight_fg: Color::Rgb(248, 249, 250),
    highlight_bg: Color::Rgb(52, 58, 64),
    stripe_bg: Color::Rgb(43, 48, 53),
    status: Color::Rgb(132, 94, 247),
    error: Color::Rgb(250, 82, 82),
    star: Color::Rgb(252, 196, 25),
    key_fg: Color::Rgb(33, 37, 41),
    key_bg: Color::Rgb(151, 117, 250),
  },
  Theme {
    name: "matinee",
    bg: Color::Rgb(253, 246, 227),
    fg: Color::Rgb(88, 110, 117),
    accent: Color::Rgb(203, 75, 22),
    muted: Color::Rgb(147, 161, 161),
    border: Color::Rgb(211, 203, 183),
    highlight_fg: Color::Rgb(253, 246, 227),
    highlight_bg: Color::Rgb(203, 75, 22),
    stripe_bg: Color::Rgb(238, 232, 213),
    status: Color::Rgb(38, 139, 210),
    error: Color::Rgb(220, 50, 47),
    star: Color::Rgb(181, 137, 0),
    key_fg: Color::Rgb(253, 246, 227),
    key_bg: Color::Rgb(88, 110, 117),
  },
  Theme {
    name: "terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    accent: Color::Magenta,
    muted: Color::DarkGray,
    border: Color::Gray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Magenta,
    stripe_bg: Color::Reset,
    status: Color::Cyan,
    error: Color::Red,
    star: Color::Yellow,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Index of the theme called `name`, falling back to the first one.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|name| THEMES.iter().position(|t| t.name == name)).unwrap_or(0)
}
