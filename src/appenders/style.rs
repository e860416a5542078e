//! Terminal styling for human-readable output

use crate::core::Level;
use colored::{Color, Colorize};

/// Foreground color and text attributes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
    pub italic: bool,
}

impl Style {
    pub const PLAIN: Style = Style {
        fg: None,
        bold: false,
        dim: false,
        italic: false,
    };

    pub const fn fg(color: Color) -> Self {
        Style {
            fg: Some(color),
            bold: false,
            dim: false,
            italic: false,
        }
    }

    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub const fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    #[must_use]
    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Default style for a level label. Intermediate values use the style
    /// of the nearest defined level.
    pub fn for_level(level: Level) -> Self {
        match Level::from_raw(level.raw()) {
            Level::TRACE => Style::fg(Color::BrightBlack).dim(),
            Level::VERBOSE => Style::fg(Color::BrightBlack),
            Level::DEBUG => Style::fg(Color::Blue),
            Level::INFO => Style::fg(Color::Green),
            Level::SUCCESS => Style::fg(Color::BrightGreen).bold(),
            Level::NOTICE => Style::fg(Color::Cyan),
            Level::DEPRECATED => Style::fg(Color::Magenta).italic(),
            Level::WARN => Style::fg(Color::Yellow),
            Level::ERROR => Style::fg(Color::Red),
            Level::BUG => Style::fg(Color::Red).bold(),
            Level::FATAL => Style::fg(Color::BrightRed).bold(),
            _ => Style::fg(Color::White).bold(),
        }
    }
}

/// Wrap `text` in the escape codes for `style`
pub fn render(text: &str, style: &Style) -> String {
    if *style == Style::PLAIN {
        return text.to_string();
    }

    let mut styled = text.normal();
    if let Some(fg) = style.fg {
        styled = styled.color(fg);
    }
    if style.bold {
        styled = styled.bold();
    }
    if style.dim {
        styled = styled.dimmed();
    }
    if style.italic {
        styled = styled.italic();
    }
    styled.to_string()
}
