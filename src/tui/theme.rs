//! Theme and color definitions

use ratatui::style::Color;

use crate::core::config::ThemeKind;

/// Color theme for the application
#[derive(Clone, Copy)]
pub struct Theme {
    /// Primary text color
    pub text: Color,
    /// Secondary/muted text color (timestamps, hints, day headers)
    pub text_muted: Color,
    /// Accent color for interactive elements (chips, selection)
    pub accent: Color,
    /// User bubble border
    pub user_border: Color,
    /// Assistant bubble border
    pub assistant_border: Color,
    /// Overlay/panel border
    pub panel_border: Color,
    /// Success color
    pub success: Color,
    /// Error color
    pub error: Color,
    /// Upload gauge fill
    pub gauge: Color,
}

impl Theme {
    pub fn of(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::Dark => Self::dark(),
            ThemeKind::Light => Self::light(),
        }
    }

    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            text: Color::Rgb(0xcc, 0xcc, 0xcc),
            text_muted: Color::DarkGray,
            accent: Color::Cyan,
            user_border: Color::Blue,
            assistant_border: Color::DarkGray,
            panel_border: Color::Gray,
            success: Color::Green,
            error: Color::Red,
            gauge: Color::Cyan,
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            text: Color::Rgb(0x1e, 0x1e, 0x1e),
            text_muted: Color::Gray,
            accent: Color::Blue,
            user_border: Color::Blue,
            assistant_border: Color::Gray,
            panel_border: Color::DarkGray,
            success: Color::Rgb(0x16, 0x82, 0x5d),
            error: Color::Rgb(0xd3, 0x2f, 0x2f),
            gauge: Color::Blue,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
