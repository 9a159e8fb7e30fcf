//! Zodiac sign derivation from birth dates.
//!
//! Tropical (western) sign boundaries; the API speaks ASCII-folded
//! Portuguese identifiers and prompts use accented display names.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A western zodiac sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ZodiacSign {
    /// 21/03 - 19/04.
    Aries,
    /// 20/04 - 20/05.
    Taurus,
    /// 21/05 - 20/06.
    Gemini,
    /// 21/06 - 22/07.
    Cancer,
    /// 23/07 - 22/08.
    Leo,
    /// 23/08 - 22/09.
    Virgo,
    /// 23/09 - 22/10.
    Libra,
    /// 23/10 - 21/11.
    Scorpio,
    /// 22/11 - 21/12.
    Sagittarius,
    /// 22/12 - 19/01.
    Capricorn,
    /// 20/01 - 18/02.
    Aquarius,
    /// 19/02 - 20/03.
    Pisces,
}

impl ZodiacSign {
    /// Every sign, in zodiacal order.
    pub const ALL: [Self; 12] = [
        Self::Aries,
        Self::Taurus,
        Self::Gemini,
        Self::Cancer,
        Self::Leo,
        Self::Virgo,
        Self::Libra,
        Self::Scorpio,
        Self::Sagittarius,
        Self::Capricorn,
        Self::Aquarius,
        Self::Pisces,
    ];

    /// Determine the sign for a birth date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        match (date.month(), date.day()) {
            (1, 1..=19) | (12, 22..=31) => Self::Capricorn,
            (1, _) | (2, 1..=18) => Self::Aquarius,
            (2, _) | (3, 1..=20) => Self::Pisces,
            (3, _) | (4, 1..=19) => Self::Aries,
            (4, _) | (5, 1..=20) => Self::Taurus,
            (5, _) | (6, 1..=20) => Self::Gemini,
            (6, _) | (7, 1..=22) => Self::Cancer,
            (7, _) | (8, 1..=22) => Self::Leo,
            (8, _) | (9, 1..=22) => Self::Virgo,
            (9, _) | (10, 1..=22) => Self::Libra,
            (10, _) | (11, 1..=21) => Self::Scorpio,
            // Remaining Nov/Dec days.
            _ => Self::Sagittarius,
        }
    }

    /// Stable ASCII identifier used in the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aries => "aries",
            Self::Taurus => "touro",
            Self::Gemini => "gemeos",
            Self::Cancer => "cancer",
            Self::Leo => "leao",
            Self::Virgo => "virgem",
            Self::Libra => "libra",
            Self::Scorpio => "escorpiao",
            Self::Sagittarius => "sagitario",
            Self::Capricorn => "capricornio",
            Self::Aquarius => "aquario",
            Self::Pisces => "peixes",
        }
    }

    /// Accented Portuguese display name, used in prompts and responses.
    #[must_use]
    pub const fn name_pt(&self) -> &'static str {
        match self {
            Self::Aries => "Áries",
            Self::Taurus => "Touro",
            Self::Gemini => "Gêmeos",
            Self::Cancer => "Câncer",
            Self::Leo => "Leão",
            Self::Virgo => "Virgem",
            Self::Libra => "Libra",
            Self::Scorpio => "Escorpião",
            Self::Sagittarius => "Sagitário",
            Self::Capricorn => "Capricórnio",
            Self::Aquarius => "Aquário",
            Self::Pisces => "Peixes",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZodiacSign {
    type Err = UnknownSign;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sign| sign.as_str() == s)
            .ok_or_else(|| UnknownSign(s.to_string()))
    }
}

impl TryFrom<String> for ZodiacSign {
    type Error = UnknownSign;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ZodiacSign> for String {
    fn from(sign: ZodiacSign) -> Self {
        sign.as_str().to_string()
    }
}

/// Error returned when parsing an unknown sign identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown zodiac sign: {0}")]
pub struct UnknownSign(pub String);
