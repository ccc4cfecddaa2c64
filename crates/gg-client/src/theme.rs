//! Light and dark palettes. The active theme travels inside
//! [`crate::ClientSettings`] rather than living in a global.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub card: &'static str,
    pub border: &'static str,
    pub text_primary: &'static str,
    pub text_secondary: &'static str,
    pub accent: &'static str,
    pub danger: &'static str,
    pub success: &'static str,
}

const DARK: Palette = Palette {
    background: "#020617",
    card: "#0f172a",
    border: "#1e293b",
    text_primary: "#f8fafc",
    text_secondary: "#94a3b8",
    accent: "#38bdf8",
    danger: "#fb7185",
    success: "#34d399",
};

const LIGHT: Palette = Palette {
    background: "#f8fafc",
    card: "#ffffff",
    border: "#e2e8f0",
    text_primary: "#0f172a",
    text_secondary: "#475569",
    accent: "#0284c7",
    danger: "#e11d48",
    success: "#059669",
};

impl ThemeName {
    pub fn palette(self) -> &'static Palette {
        match self {
            ThemeName::Dark => &DARK,
            ThemeName::Light => &LIGHT,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeName::Dark => ThemeName::Light,
            ThemeName::Light => ThemeName::Dark,
        }
    }
}
