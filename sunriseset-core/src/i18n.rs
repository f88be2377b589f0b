//! Display locales and their string resources.

use std::{convert::TryFrom, env, fmt};

/// Languages the screen can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

/// String resource keys used by the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    SunriseTime,
    SunsetTime,
    ChineseButton,
    EnglishButton,
    QuitButton,
    Prompt,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }

    pub const fn all() -> &'static [Locale] {
        &[Locale::En, Locale::Zh]
    }

    /// Pick the locale from the process environment, falling back to English.
    pub fn from_system() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.is_empty())
            .map(|value| Self::from_posix(&value))
            .unwrap_or_default()
    }

    /// Interpret a POSIX locale string such as `zh_CN.UTF-8`.
    pub fn from_posix(value: &str) -> Self {
        if value.to_lowercase().starts_with("zh") {
            Locale::Zh
        } else {
            Locale::En
        }
    }

    /// Meridiem markers for 12-hour times, `(before noon, after noon)`.
    pub fn meridiem(&self) -> (&'static str, &'static str) {
        match self {
            Locale::En => ("AM", "PM"),
            Locale::Zh => ("上午", "下午"),
        }
    }

    pub fn text(&self, key: Key) -> &'static str {
        match (self, key) {
            (Locale::En, Key::SunriseTime) => "Sunrise time:",
            (Locale::En, Key::SunsetTime) => "Sunset time:",
            (Locale::En, Key::Prompt) => "Language",
            (Locale::Zh, Key::SunriseTime) => "日出时间：",
            (Locale::Zh, Key::SunsetTime) => "日落时间：",
            (Locale::Zh, Key::Prompt) => "语言",
            // Buttons carry their own language's name regardless of the active locale.
            (_, Key::ChineseButton) => "中文",
            (_, Key::EnglishButton) => "English",
            (Locale::En, Key::QuitButton) => "Quit",
            (Locale::Zh, Key::QuitButton) => "退出",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Locale {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "zh" => Ok(Locale::Zh),
            _ => Err(anyhow::anyhow!(
                "Unknown locale '{value}'. Supported locales: en, zh."
            )),
        }
    }
}
