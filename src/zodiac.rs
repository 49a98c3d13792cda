use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The twelve tropical signs, in zodiac order starting at Aries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Sign at `index` in zodiac order, wrapping past Pisces.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Aries => "Aries",
            Self::Taurus => "Taurus",
            Self::Gemini => "Gemini",
            Self::Cancer => "Cancer",
            Self::Leo => "Leo",
            Self::Virgo => "Virgo",
            Self::Libra => "Libra",
            Self::Scorpio => "Scorpio",
            Self::Sagittarius => "Sagittarius",
            Self::Capricorn => "Capricorn",
            Self::Aquarius => "Aquarius",
            Self::Pisces => "Pisces",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Aries => "♈",
            Self::Taurus => "♉",
            Self::Gemini => "♊",
            Self::Cancer => "♋",
            Self::Leo => "♌",
            Self::Virgo => "♍",
            Self::Libra => "♎",
            Self::Scorpio => "♏",
            Self::Sagittarius => "♐",
            Self::Capricorn => "♑",
            Self::Aquarius => "♒",
            Self::Pisces => "♓",
        }
    }

    /// Lowercase identifier used in the settings file.
    pub fn key(self) -> String {
        self.name().to_ascii_lowercase()
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown zodiac sign: {0}")]
pub struct ParseSignError(pub String);

impl FromStr for ZodiacSign {
    type Err = ParseSignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|sign| sign.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseSignError(s.to_string()))
    }
}

/// Parses a stored sign value, treating blank as "not selected".
pub fn parse_optional(value: &str) -> Option<ZodiacSign> {
    if value.trim().is_empty() {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("leo".parse::<ZodiacSign>(), Ok(ZodiacSign::Leo));
        assert_eq!(" SAGITTARIUS ".parse::<ZodiacSign>(), Ok(ZodiacSign::Sagittarius));
        assert!("ophiuchus".parse::<ZodiacSign>().is_err());
    }

    #[test]
    fn order_starts_at_aries() {
        assert_eq!(ZodiacSign::from_index(0), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_index(11), ZodiacSign::Pisces);
        assert_eq!(ZodiacSign::from_index(12), ZodiacSign::Aries);
    }

    #[test]
    fn blank_stored_value_is_unselected() {
        assert_eq!(parse_optional(""), None);
        assert_eq!(parse_optional("   "), None);
        assert_eq!(parse_optional("virgo"), Some(ZodiacSign::Virgo));
    }

    #[test]
    fn key_round_trips_through_parse() {
        for sign in ZodiacSign::ALL {
            assert_eq!(sign.key().parse::<ZodiacSign>(), Ok(sign));
        }
    }
}
