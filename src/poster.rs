//! Movie poster rendering inside a ratatui buffer.
//!
//! Two cell-based renderers: true-color half blocks (two pixels per cell, `▀` with
//! fg = upper pixel, bg = lower pixel) and a grayscale ASCII ramp.

use clap::ValueEnum;
use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliPosterMode {
  Auto,
  Color,
  Ascii,
  Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterMode {
  HalfBlock,
  Ascii,
  Off,
}

impl PosterMode {
  pub const ALL: [PosterMode; 3] = [PosterMode::HalfBlock, PosterMode::Ascii, PosterMode::Off];

  pub fn label(self) -> &'static str {
    match self {
      PosterMode::HalfBlock => "color",
      PosterMode::Ascii => "ascii",
      PosterMode::Off => "off",
    }
  }

  pub fn from_config(s: &str) -> Option<Self> {
    match s.to_lowercase().as_str() {
      "color" => Some(PosterMode::HalfBlock),
      "ascii" => Some(PosterMode::Ascii),
      "off" => Some(PosterMode::Off),
      _ => None,
    }
  }

  pub fn next(self) -> Self {
    let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
    Self::ALL[(idx + 1) % Self::ALL.len()]
  }

  pub fn enabled(self) -> bool {
    self != PosterMode::Off
  }

  /// Pixel size an image should be resized to so it fits `area` in this mode.
  pub fn pixel_size(self, area: Rect) -> (u32, u32) {
    match self {
      PosterMode::HalfBlock => (area.width as u32, area.height as u32 * 2),
      PosterMode::Ascii | PosterMode::Off => (area.width as u32, area.height as u32),
    }
  }

  /// Resize keeping the aspect ratio, fitted inside `area`.
  pub fn fit(self, image: &DynamicImage, area: Rect) -> DynamicImage {
    let (w, h) = self.pixel_size(area);
    // Terminal cells are about twice as tall as wide; ASCII gets one pixel per cell.
    let source = if self == PosterMode::Ascii {
      image.resize_exact(image.width(), (image.height() / 2).max(1), FilterType::Triangle)
    } else {
      image.clone()
    };
    source.resize(w.max(1), h.max(1), FilterType::Lanczos3)
  }
}

/// Detect the best poster mode the terminal supports.
///
/// - Half-block: `COLORTERM` is `truecolor` or `24bit`
/// - Ascii: fallback
pub fn detect_poster_mode() -> PosterMode {
  let colorterm = std::env::var("COLORTERM").unwrap_or_default().to_lowercase();
  if colorterm == "truecolor" || colorterm == "24bit" {
    return PosterMode::HalfBlock;
  }
  PosterMode::Ascii
}

pub fn resolve_poster_mode(cli: CliPosterMode, saved: Option<&str>) -> PosterMode {
  match cli {
    CliPosterMode::Auto => saved.and_then(PosterMode::from_config).unwrap_or_else(detect_poster_mode),
    CliPosterMode::Color => PosterMode::HalfBlock,
    CliPosterMode::Ascii => PosterMode::Ascii,
    CliPosterMode::Off => PosterMode::Off,
  }
}

// --- Poster Widget ---

pub struct PosterWidget<'a> {
  /// Already fitted to the target area with [`PosterMode::fit`].
  pub image: &'a DynamicImage,
  pub mode: PosterMode,
}

const ASCII_RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for PosterWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.mode {
      PosterMode::HalfBlock => render_half_block(self.image, area, buf),
      PosterMode::Ascii => render_ascii(self.image, area, buf),
      PosterMode::Off => {}
    }
  }
}

fn cell(area: Rect, x: u32, y: u32) -> (u16, u16) {
  (area.x.saturating_add(x.min(u16::MAX as u32) as u16), area.y.saturating_add(y.min(u16::MAX as u32) as u16))
}

fn render_half_block(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let img_w = rgb.width().min(area.width as u32);
  let img_h = rgb.height();
  let rows = img_h.div_ceil(2).min(area.height as u32);

  for y in 0..rows {
    for x in 0..img_w {
      let upper = rgb.get_pixel(x, y * 2);
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = if y * 2 + 1 < img_h {
        let lower = rgb.get_pixel(x, y * 2 + 1);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      let (cx, cy) = cell(area, x, y);
      buf.set_string(cx, cy, "▀", Style::default().fg(fg).bg(bg));
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let img_w = luma.width().min(area.width as u32);
  let img_h = luma.height().min(area.height as u32);

  for y in 0..img_h {
    for x in 0..img_w {
      let (cx, cy) = cell(area, x, y);
      buf.set_string(cx, cy, ascii_char(luma.get_pixel(x, y)[0]), Style::default());
    }
  }
}

fn ascii_char(luma: u8) -> &'static str {
  let idx = ((luma as f32 / 255.0) * (ASCII_RAMP.len() - 1) as f32).round() as usize;
  ASCII_RAMP[idx.min(ASCII_RAMP.len() - 1)]
}
