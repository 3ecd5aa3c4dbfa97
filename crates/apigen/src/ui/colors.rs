use std::io::IsTerminal;

use clap::{
  ValueEnum,
  builder::styling::{Color as ClapColor, RgbColor, Style, Styles},
};
use comfy_table::Color as ComfyColor;
use crossterm::style::Color;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
  Always,
  Auto,
  Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThemeMode {
  Dark,
  Light,
  Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
  Dark,
  Light,
}

/// What a piece of output is, independent of how it is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  Timestamp,
  Primary,
  Accent,
  Info,
  Success,
  Label,
  Value,
}

impl Role {
  const fn rgb(self, theme: Theme) -> (u8, u8, u8) {
    match (self, theme) {
      (Self::Timestamp, Theme::Dark) => (120, 144, 156),
      (Self::Timestamp, Theme::Light) => (84, 96, 110),
      (Self::Primary, Theme::Dark) => (152, 195, 121),
      (Self::Primary, Theme::Light) => (46, 94, 40),
      (Self::Accent, Theme::Dark) => (224, 108, 117),
      (Self::Accent, Theme::Light) => (176, 48, 60),
      (Self::Info, Theme::Dark) => (97, 175, 239),
      (Self::Info, Theme::Light) => (30, 96, 160),
      (Self::Success, Theme::Dark) => (86, 182, 194),
      (Self::Success, Theme::Light) => (20, 120, 110),
      (Self::Label, Theme::Dark) => (198, 120, 221),
      (Self::Label, Theme::Light) => (120, 60, 150),
      (Self::Value, Theme::Dark) => (229, 192, 123),
      (Self::Value, Theme::Light) => (150, 100, 20),
    }
  }
}

/// Terminal palette. Every role paints as `Reset` when color output is off.
#[derive(Debug, Clone, Copy)]
pub struct Colors {
  enabled: bool,
  theme: Theme,
}

impl Colors {
  pub const fn new(enabled: bool, theme: Theme) -> Self {
    Self { enabled, theme }
  }

  pub const fn get(&self, role: Role) -> Color {
    if !self.enabled {
      return Color::Reset;
    }
    let (r, g, b) = role.rgb(self.theme);
    Color::Rgb { r, g, b }
  }

  pub const fn timestamp(&self) -> Color {
    self.get(Role::Timestamp)
  }

  pub const fn primary(&self) -> Color {
    self.get(Role::Primary)
  }

  pub const fn accent(&self) -> Color {
    self.get(Role::Accent)
  }

  pub const fn info(&self) -> Color {
    self.get(Role::Info)
  }

  pub const fn success(&self) -> Color {
    self.get(Role::Success)
  }

  pub const fn label(&self) -> Color {
    self.get(Role::Label)
  }

  pub const fn value(&self) -> Color {
    self.get(Role::Value)
  }

  /// The same role, as a table cell color.
  pub const fn cell(&self, role: Role) -> ComfyColor {
    match self.get(role) {
      Color::Rgb { r, g, b } => ComfyColor::Rgb { r, g, b },
      _ => ComfyColor::Reset,
    }
  }

  /// Help-output styles, always painted with the dark palette.
  pub fn clap_styles() -> Styles {
    let paint = |role: Role| {
      let (r, g, b) = role.rgb(Theme::Dark);
      Some(ClapColor::Rgb(RgbColor(r, g, b)))
    };

    Styles::styled()
      .header(Style::new().bold().underline().fg_color(paint(Role::Label)))
      .usage(Style::new().bold().fg_color(paint(Role::Label)))
      .literal(Style::new().fg_color(paint(Role::Success)))
      .placeholder(Style::new().fg_color(paint(Role::Info)))
      .error(Style::new().bold().fg_color(paint(Role::Accent)))
      .valid(Style::new().fg_color(paint(Role::Success)))
      .invalid(Style::new().bold().fg_color(paint(Role::Accent)))
  }
}

pub fn colors_enabled(mode: ColorMode) -> bool {
  match mode {
    ColorMode::Always => true,
    ColorMode::Never => false,
    ColorMode::Auto => std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
  }
}

pub fn detect_theme(mode: ThemeMode) -> Theme {
  match mode {
    ThemeMode::Dark => Theme::Dark,
    ThemeMode::Light => Theme::Light,
    ThemeMode::Auto => theme_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref()).unwrap_or(Theme::Dark),
  }
}

/// `COLORFGBG` is `fg;bg`; background indices 8 and up are light.
fn theme_from_colorfgbg(value: Option<&str>) -> Option<Theme> {
  let background = value?.split(';').next_back()?.parse::<u8>().ok()?;
  Some(if background >= 8 { Theme::Light } else { Theme::Dark })
}
