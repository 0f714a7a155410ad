use clap::ValueEnum;
use ratatui::style::Color;

/// Color schemes for the rendered LED matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatrixTheme {
    /// Classic amber LED panel
    Amber,
    /// Green monochrome display
    Emerald,
    /// Cool blue-white
    Ice,
    HighContrast,
}

pub struct ThemeColors {
    pub background: Color,
    pub border: Color,
    pub text: Color,
    pub accent: Color,
    pub paddle: Color,
    pub ball: Color,
    pub marker: Color,
}

impl MatrixTheme {
    pub fn colors(&self) -> ThemeColors {
        match self {
            MatrixTheme::Amber => ThemeColors {
                background: Color::Reset,
                border: Color::Rgb(120, 70, 20),
                text: Color::Rgb(255, 196, 110),
                accent: Color::Rgb(255, 160, 40),
                paddle: Color::Rgb(255, 176, 60),
                ball: Color::Rgb(255, 220, 130),
                marker: Color::Rgb(180, 110, 40),
            },
            MatrixTheme::Emerald => ThemeColors {
                background: Color::Reset,
                border: Color::Rgb(30, 90, 40),
                text: Color::Rgb(160, 230, 160),
                accent: Color::Rgb(80, 200, 100),
                paddle: Color::Rgb(90, 220, 110),
                ball: Color::Rgb(190, 255, 190),
                marker: Color::Rgb(50, 140, 70),
            },
            MatrixTheme::Ice => ThemeColors {
                background: Color::Reset,
                border: Color::Rgb(70, 100, 140),
                text: Color::Rgb(200, 220, 240),
                accent: Color::Rgb(120, 170, 220),
                paddle: Color::Rgb(140, 190, 240),
                ball: Color::Rgb(230, 245, 255),
                marker: Color::Rgb(90, 120, 160),
            },
            MatrixTheme::HighContrast => ThemeColors {
                background: Color::Black,
                border: Color::White,
                text: Color::White,
                accent: Color::Yellow,
                paddle: Color::Rgb(0, 255, 255),
                ball: Color::Rgb(255, 0, 0),
                marker: Color::Rgb(0, 255, 0),
            },
        }
    }
}
