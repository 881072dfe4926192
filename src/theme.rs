use crate::dream_entry::Mood;
use clap::ValueEnum;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn background(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(0xF3, 0xF4, 0xF6),
            Theme::Dark => Color::Rgb(0x11, 0x18, 0x27),
        }
    }

    pub fn foreground(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(0x11, 0x18, 0x27),
            Theme::Dark => Color::Rgb(0xF3, 0xF4, 0xF6),
        }
    }

    pub fn muted(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(0x4B, 0x55, 0x63),
            Theme::Dark => Color::Rgb(0xD1, 0xD5, 0xDB),
        }
    }

    pub fn accent(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(0x8B, 0x5C, 0xF6),
            Theme::Dark => Color::Rgb(0xA7, 0x8B, 0xFA),
        }
    }

    pub fn tag(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(0x6D, 0x28, 0xD9),
            Theme::Dark => Color::Rgb(0xC4, 0xB5, 0xFD),
        }
    }

    pub fn star(self, filled: bool) -> Color {
        match (self, filled) {
            (Theme::Light, true) => Color::Rgb(0xEA, 0xB3, 0x08),
            (Theme::Dark, true) => Color::Rgb(0xFA, 0xCC, 0x15),
            (Theme::Light, false) => Color::Rgb(0xD1, 0xD5, 0xDB),
            (Theme::Dark, false) => Color::Rgb(0x4B, 0x55, 0x63),
        }
    }

    pub fn lucid(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(0x85, 0x4D, 0x0E),
            Theme::Dark => Color::Rgb(0xFE, 0xF0, 0x8A),
        }
    }

    /// Color of background particles.
    pub fn particle(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(0xC8, 0xC9, 0xCC),
            Theme::Dark => Color::Rgb(0x3A, 0x3F, 0x4B),
        }
    }

    /// Color of galaxy bubble labels.
    pub fn label(self) -> Color {
        match self {
            Theme::Light => Color::Rgb(0x33, 0x33, 0x33),
            Theme::Dark => Color::Rgb(0xE0, 0xE1, 0xDD),
        }
    }

    pub fn mood(self, mood: Mood) -> MoodPalette {
        MoodPalette::of(mood, self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodPalette {
    pub bg: Color,
    pub text: Color,
    pub accent: Color,
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl MoodPalette {
    const fn new(bg: u32, text: u32, accent: u32) -> Self {
        MoodPalette {
            bg: rgb(bg),
            text: rgb(text),
            accent: rgb(accent),
        }
    }

    pub fn of(mood: Mood, theme: Theme) -> Self {
        match (mood, theme) {
            (Mood::Calm, Theme::Light) => Self::new(0xE3F2FD, 0x0D47A1, 0x64B5F6),
            (Mood::Calm, Theme::Dark) => Self::new(0x0D1B2A, 0xE0E1DD, 0x415A77),
            (Mood::Happy, Theme::Light) => Self::new(0xE8F5E9, 0x1B5E20, 0x66BB6A),
            (Mood::Happy, Theme::Dark) => Self::new(0x1B263B, 0xE0E1DD, 0x778DA9),
            (Mood::Anxious, Theme::Light) => Self::new(0xFFF8E1, 0xFF6F00, 0xFFCA28),
            (Mood::Anxious, Theme::Dark) => Self::new(0x3D0000, 0xFFD6D6, 0x950000),
            (Mood::Scary, Theme::Light) => Self::new(0xFCE4EC, 0x880E4F, 0xEC407A),
            (Mood::Scary, Theme::Dark) => Self::new(0x1A001A, 0xFFCCFF, 0x660066),
        }
    }
}
