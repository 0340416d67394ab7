//! Color theme and glyphs for Studyspot TUI.
//!
//! Uses Kanagawa Wave for surfaces and text, with the campus navy as the
//! brand color. An optional high-contrast palette overrides everything.

use ratatui::style::{Color, Modifier, Style};

use studyspot_engine::UiOptions;

/// Kanagawa Wave color palette constants.
mod colors {
    use super::Color;

    // === Backgrounds (Sumi Ink) ===
    pub const BG_DARK: Color = Color::Rgb(22, 22, 29); // sumiInk0
    pub const BG_PANEL: Color = Color::Rgb(31, 31, 40); // sumiInk3
    pub const BG_HIGHLIGHT: Color = Color::Rgb(42, 42, 55); // sumiInk4
    pub const BG_BORDER: Color = Color::Rgb(84, 84, 109); // sumiInk6

    // === Foregrounds (Fuji) ===
    pub const TEXT_PRIMARY: Color = Color::Rgb(220, 215, 186); // fujiWhite
    pub const TEXT_SECONDARY: Color = Color::Rgb(200, 192, 147); // oldWhite
    pub const TEXT_MUTED: Color = Color::Rgb(114, 113, 105); // fujiGray

    // === Brand ===
    pub const NAVY: Color = Color::Rgb(0, 39, 76); // #00274C
    pub const MAIZE: Color = Color::Rgb(255, 203, 5); // #FFCB05

    // === Accent Colors ===
    pub const CYAN: Color = Color::Rgb(127, 180, 202); // springBlue
    pub const GREEN: Color = Color::Rgb(152, 187, 108); // springGreen
    pub const YELLOW: Color = Color::Rgb(230, 195, 132); // carpYellow
    pub const ORANGE: Color = Color::Rgb(255, 160, 102); // surimiOrange
    pub const RED: Color = Color::Rgb(255, 93, 98); // peachRed
}

/// Resolved theme palette used by the UI.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_dark: Color,
    pub bg_panel: Color,
    pub bg_highlight: Color,
    pub bg_border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    /// Banner background.
    pub brand: Color,
    /// Banner text and highlighted keys.
    pub brand_accent: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub peach: Color,
}

impl Palette {
    #[must_use]
    pub fn standard() -> Self {
        Self {
            bg_dark: colors::BG_DARK,
            bg_panel: colors::BG_PANEL,
            bg_highlight: colors::BG_HIGHLIGHT,
            bg_border: colors::BG_BORDER,
            text_primary: colors::TEXT_PRIMARY,
            text_secondary: colors::TEXT_SECONDARY,
            text_muted: colors::TEXT_MUTED,
            brand: colors::NAVY,
            brand_accent: colors::MAIZE,
            accent: colors::CYAN,
            success: colors::GREEN,
            warning: colors::YELLOW,
            error: colors::RED,
            peach: colors::ORANGE,
        }
    }

    #[must_use]
    pub fn high_contrast() -> Self {
        Self {
            bg_dark: Color::Black,
            bg_panel: Color::Black,
            bg_highlight: Color::DarkGray,
            bg_border: Color::Gray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            text_muted: Color::Gray,
            brand: Color::Black,
            brand_accent: Color::White,
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            peach: Color::Yellow,
        }
    }
}

#[must_use]
pub fn palette(options: UiOptions) -> Palette {
    if options.high_contrast {
        Palette::high_contrast()
    } else {
        Palette::standard()
    }
}

/// ASCII/Unicode glyphs for icons and spinners.
#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub expanded: &'static str,
    pub collapsed: &'static str,
    pub selected: &'static str,
    pub bullet: &'static str,
    pub camera: &'static str,
    pub ok: &'static str,
    pub err: &'static str,
    pub denied: &'static str,
    pub status_ready: &'static str,
    pub status_missing: &'static str,
    pub separator: &'static str,
    pub bar_full: &'static str,
    pub bar_empty: &'static str,
    pub spinner_frames: &'static [&'static str],
}

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_FRAMES_ASCII: &[&str] = &["|", "/", "-", "\\"];

#[must_use]
pub fn glyphs(options: UiOptions) -> Glyphs {
    if options.ascii_only {
        Glyphs {
            expanded: "v",
            collapsed: ">",
            selected: ">",
            bullet: "*",
            camera: "[o]",
            ok: "OK",
            err: "ERR",
            denied: "X",
            status_ready: "*",
            status_missing: "o",
            separator: "|",
            bar_full: "#",
            bar_empty: ".",
            spinner_frames: SPINNER_FRAMES_ASCII,
        }
    } else {
        Glyphs {
            expanded: "▾",
            collapsed: "▸",
            selected: "▶",
            bullet: "•",
            camera: "◉",
            ok: "✓",
            err: "✗",
            denied: "⊘",
            status_ready: "●",
            status_missing: "○",
            separator: "│",
            bar_full: "█",
            bar_empty: "░",
            spinner_frames: SPINNER_FRAMES,
        }
    }
}

/// Frame for an animation tick (one tick per rendered frame).
#[must_use]
pub fn spinner_frame(tick: usize, options: UiOptions) -> &'static str {
    let frames = glyphs(options).spinner_frames;
    frames[tick % frames.len()]
}

/// Pre-defined styles for common UI elements.
pub mod styles {
    use super::{Modifier, Palette, Style};

    #[must_use]
    pub fn banner(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.brand_accent)
            .bg(palette.brand)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn library_name(palette: &Palette, selected: bool) -> Style {
        let style = Style::default()
            .fg(palette.text_primary)
            .add_modifier(Modifier::BOLD);
        if selected {
            style.bg(palette.bg_highlight)
        } else {
            style
        }
    }

    #[must_use]
    pub fn count(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.success)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_hint(palette: &Palette) -> Style {
        Style::default().fg(palette.text_muted)
    }

    #[must_use]
    pub fn key_highlight(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.peach)
            .add_modifier(Modifier::BOLD)
    }
}
