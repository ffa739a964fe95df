use crossterm::style::Color;

/// Color theme for the kiosk
#[derive(Debug, Clone)]
pub struct Theme {
    /// Puzzle titles and banners
    pub title: Color,
    /// Formulas, element symbols, condition ids
    pub accent: Color,
    /// Wrong code
    pub error: Color,
    /// Solved puzzle, lab stabilized
    pub success: Color,
    /// Timer and status line
    pub info: Color,
    /// Typed commands (`hint`, `quit`)
    pub key: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            title: Color::Rgb { r: 120, g: 220, b: 255 },
            accent: Color::Rgb { r: 80, g: 180, b: 255 },
            error: Color::Rgb { r: 255, g: 90, b: 90 },
            success: Color::Rgb { r: 90, g: 255, b: 130 },
            info: Color::Rgb { r: 160, g: 165, b: 185 },
            key: Color::Rgb { r: 255, g: 210, b: 100 },
        }
    }

    /// High contrast theme for projectors
    pub fn high_contrast() -> Self {
        Self {
            title: Color::White,
            accent: Color::Cyan,
            error: Color::Red,
            success: Color::Green,
            info: Color::Grey,
            key: Color::Yellow,
        }
    }
}
