//! Reading artifacts and the mystic tool catalog.
//!
//! Each successful generation produces one immutable `Reading`; the fixed
//! point cost of each tool lives here so the store, the handlers, and the
//! tests all agree on prices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ReadingId, UserId};

/// A generated reading delivered to a user.
///
/// Readings are immutable once written. `fallback` marks content that came
/// from the canned template because the oracle answered blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Unique reading ID (ULID for time-ordering).
    pub id: ReadingId,

    /// The user who requested the reading.
    pub user_id: UserId,

    /// Which tool produced it.
    pub tool: ToolKind,

    /// The delivered text, in Portuguese.
    pub content: String,

    /// Points charged for this reading.
    pub cost_points: i64,

    /// Whether the content is the canned fallback rather than a generation.
    pub fallback: bool,

    /// Echo of the request fields the prompt was built from
    /// (question, drawn cards, sign, dream text, ...).
    pub input: serde_json::Value,

    /// When the reading was created.
    pub created_at: DateTime<Utc>,
}

impl Reading {
    /// Create a reading for a finished generation.
    #[must_use]
    pub fn new(
        user_id: UserId,
        tool: ToolKind,
        content: String,
        fallback: bool,
        input: serde_json::Value,
    ) -> Self {
        Self {
            id: ReadingId::generate(),
            user_id,
            tool,
            content,
            cost_points: tool.cost_points(),
            fallback,
            input,
            created_at: Utc::now(),
        }
    }
}

/// The mystic tools users can spend points on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Three-card tarot spread answering a question.
    Tarot,

    /// Single card of the day. Limited to one per day.
    DailyCard,

    /// Horoscope of the day for the user's sign. Limited to one per day.
    DailyHoroscope,

    /// Full birth-chart interpretation.
    BirthChart,

    /// Destiny-number numerology report.
    Numerology,

    /// Dream interpretation.
    DreamInterpretation,
}

impl ToolKind {
    /// Every tool, in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Tarot,
        Self::DailyCard,
        Self::DailyHoroscope,
        Self::BirthChart,
        Self::Numerology,
        Self::DreamInterpretation,
    ];

    /// Fixed price of one use, in points.
    #[must_use]
    pub const fn cost_points(&self) -> i64 {
        match self {
            Self::Tarot => 7,
            Self::DailyCard | Self::DailyHoroscope => 2,
            Self::BirthChart => 10,
            Self::Numerology | Self::DreamInterpretation => 5,
        }
    }

    /// Whether the tool is limited to one use per calendar day
    /// (Brasília time).
    #[must_use]
    pub const fn daily_limited(&self) -> bool {
        matches!(self, Self::DailyCard | Self::DailyHoroscope)
    }

    /// Stable identifier used in the API and in store keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tarot => "tarot",
            Self::DailyCard => "daily_card",
            Self::DailyHoroscope => "daily_horoscope",
            Self::BirthChart => "birth_chart",
            Self::Numerology => "numerology",
            Self::DreamInterpretation => "dream_interpretation",
        }
    }

    /// Portuguese display label.
    #[must_use]
    pub const fn label_pt(&self) -> &'static str {
        match self {
            Self::Tarot => "Tarot do Amor",
            Self::DailyCard => "Carta do Dia",
            Self::DailyHoroscope => "Horóscopo do Dia",
            Self::BirthChart => "Mapa Astral",
            Self::Numerology => "Numerologia",
            Self::DreamInterpretation => "Interpretação de Sonhos",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tarot" => Ok(Self::Tarot),
            "daily_card" => Ok(Self::DailyCard),
            "daily_horoscope" => Ok(Self::DailyHoroscope),
            "birth_chart" => Ok(Self::BirthChart),
            "numerology" => Ok(Self::Numerology),
            "dream_interpretation" => Ok(Self::DreamInterpretation),
            _ => Err(UnknownTool(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown tool identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tool: {0}")]
pub struct UnknownTool(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_costs() {
        assert_eq!(ToolKind::Tarot.cost_points(), 7);
        assert_eq!(ToolKind::DailyCard.cost_points(), 2);
        assert_eq!(ToolKind::DailyHoroscope.cost_points(), 2);
        assert_eq!(ToolKind::BirthChart.cost_points(), 10);
        assert_eq!(ToolKind::Numerology.cost_points(), 5);
        assert_eq!(ToolKind::DreamInterpretation.cost_points(), 5);
    }

    #[test]
    fn only_daily_tools_are_limited() {
        for tool in ToolKind::ALL {
            let expected = matches!(tool, ToolKind::DailyCard | ToolKind::DailyHoroscope);
            assert_eq!(tool.daily_limited(), expected, "{tool}");
        }
    }

    #[test]
    fn tool_str_roundtrip() {
        for tool in ToolKind::ALL {
            let parsed: ToolKind = tool.as_str().parse().unwrap();
            assert_eq!(parsed, tool);
        }
        assert!("crystal_ball".parse::<ToolKind>().is_err());
    }

    #[test]
    fn reading_takes_cost_from_tool() {
        let user_id = UserId::generate();
        let reading = Reading::new(
            user_id,
            ToolKind::Tarot,
            "As cartas falam...".into(),
            false,
            serde_json::json!({ "question": "ele volta?" }),
        );

        assert_eq!(reading.cost_points, 7);
        assert!(!reading.fallback);
        assert_eq!(reading.user_id, user_id);
    }
}
