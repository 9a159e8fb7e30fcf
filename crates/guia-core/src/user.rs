//! User account types.
//!
//! A user record tracks the cosmic-point balance, lifetime counters, and the
//! onboarding profile that personalizes generated readings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Points granted to every account on first sign-in.
pub const WELCOME_BONUS_POINTS: i64 = 10;

/// A user account.
///
/// The account tracks the point balance, lifetime counters, the onboarding
/// state, and the Stripe customer ID once one exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID (from the auth provider).
    pub user_id: UserId,

    /// Current cosmic-point balance.
    pub balance_points: i64,

    /// Lifetime points bought through checkout or PIX.
    pub lifetime_purchased_points: i64,

    /// Lifetime points granted (welcome bonus, refunds, support credits).
    pub lifetime_granted_points: i64,

    /// Lifetime points spent on readings.
    pub lifetime_spent_points: i64,

    /// Whether the user completed the onboarding questionnaire.
    ///
    /// Reading endpoints refuse to generate until this is set; the prompts
    /// lean on the profile answers.
    pub onboarding_complete: bool,

    /// Personalization answers collected during onboarding.
    pub profile: UserProfile,

    /// Stripe customer ID, created lazily on first checkout.
    pub stripe_customer_id: Option<String>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new account with zero balance and an empty profile.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance_points: 0,
            lifetime_purchased_points: 0,
            lifetime_granted_points: 0,
            lifetime_spent_points: 0,
            onboarding_complete: false,
            profile: UserProfile::default(),
            stripe_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account has enough points for a deduction.
    #[must_use]
    pub fn has_sufficient_points(&self, amount_points: i64) -> bool {
        self.balance_points >= amount_points
    }
}

/// Personalization answers used when building prompts.
///
/// Every field is optional; prompts degrade gracefully when answers are
/// missing. None of this affects billing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Name the guide addresses the user by.
    pub display_name: Option<String>,

    /// Birth date, used for the zodiac sign and the birth chart.
    pub birth_date: Option<NaiveDate>,

    /// Birth time as entered ("HH:MM"), used by the birth chart.
    pub birth_time: Option<String>,

    /// Birth city/place as entered, used by the birth chart.
    pub birth_place: Option<String>,

    /// Relationship status as entered ("solteira", "casada", ...).
    pub relationship_status: Option<String>,

    /// The life area the user wants guidance on.
    pub focus: Option<FocusArea>,

    /// Free-text context from onboarding ("o que te trouxe aqui?").
    pub context: Option<String>,
}

/// Life areas offered by the onboarding questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    /// Love and relationships.
    Love,
    /// Career and money.
    Career,
    /// Spiritual growth.
    Spirituality,
    /// Family matters.
    Family,
    /// Health and wellbeing.
    Health,
    /// Self-knowledge.
    SelfKnowledge,
}

impl FocusArea {
    /// Portuguese label used inside prompts.
    #[must_use]
    pub const fn label_pt(&self) -> &'static str {
        match self {
            Self::Love => "amor e relacionamentos",
            Self::Career => "carreira e dinheiro",
            Self::Spirituality => "crescimento espiritual",
            Self::Family => "família",
            Self::Health => "saúde e bem-estar",
            Self::SelfKnowledge => "autoconhecimento",
        }
    }
}
