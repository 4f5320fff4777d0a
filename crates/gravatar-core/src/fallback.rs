//! Per-call default-image overrides.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;

/// Built-in images Gravatar can serve when no avatar is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    MysteryPerson,
    Identicon,
    MonsterId,
    Wavatar,
    Retro,
    Robohash,
    Blank,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::MysteryPerson => "mp",
            Theme::Identicon => "identicon",
            Theme::MonsterId => "monsterid",
            Theme::Wavatar => "wavatar",
            Theme::Retro => "retro",
            Theme::Robohash => "robohash",
            Theme::Blank => "blank",
        }
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // Gravatar renamed "mm" to "mp"; keep the old keyword working.
            "mp" | "mm" => Ok(Theme::MysteryPerson),
            "identicon" => Ok(Theme::Identicon),
            "monsterid" => Ok(Theme::MonsterId),
            "wavatar" => Ok(Theme::Wavatar),
            "retro" => Ok(Theme::Retro),
            "robohash" => Ok(Theme::Robohash),
            "blank" => Ok(Theme::Blank),
            _ => Err(()),
        }
    }
}

/// A validated default image: a themed keyword or an absolute image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    Theme(Theme),
    Url(String),
}

impl Fallback {
    /// Accepts a themed keyword (`mm` is read as `mp`) or an absolute URL
    /// with a host and a path. Returns `None` for anything else.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if let Ok(theme) = value.parse::<Theme>() {
            return Some(Fallback::Theme(theme));
        }
        is_image_url(value).then(|| Fallback::Url(value.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Fallback::Theme(theme) => theme.as_str(),
            Fallback::Url(url) => url,
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_image_url(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Ok(url) = Url::parse(value) else {
        return false;
    };
    if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
        return false;
    }

    // Url normalizes a missing path to "/", so look at the raw text.
    let Some((_, rest)) = value.split_once("://") else {
        return false;
    };
    let authority_and_path = rest.split(['?', '#']).next().unwrap_or_default();
    authority_and_path.contains('/')
}
