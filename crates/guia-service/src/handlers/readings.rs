//! Reading handlers: the six mystic tools plus history.
//!
//! Every tool handler runs the same gate sequence before any points move:
//! input validation, onboarding, the per-user in-flight permit, an
//! optimistic balance check, and the daily limit for once-per-day tools.
//! Only then is the oracle called; a failed generation therefore never
//! charges. The definitive balance and daily-limit checks happen once more
//! inside `record_reading`, atomically with the deduction.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use guia_core::tarot::TarotCard;
use guia_core::{numerology, tarot, time, PointTransaction, Reading, ToolKind, User, ZodiacSign};
use guia_oracle::{prompt, GenerationRequest, Prompt};
use guia_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Longest accepted tarot question.
const MAX_QUESTION_CHARS: usize = 500;

/// Longest accepted dream description.
const MAX_DREAM_CHARS: usize = 2000;

/// Cards in the tarot spread.
const SPREAD_SIZE: usize = 3;

/// API view of a reading.
#[derive(Debug, Serialize)]
pub struct ReadingResponse {
    /// Reading ID.
    pub id: String,
    /// The tool that produced it.
    pub tool: ToolKind,
    /// Reading text, in Portuguese.
    pub content: String,
    /// Points charged.
    pub cost_points: i64,
    /// Whether the text is the canned fallback.
    pub fallback: bool,
    /// Tool input context (question, cards, sign, ...).
    pub input: serde_json::Value,
    /// Creation time (RFC 3339).
    pub created_at: String,
}

impl From<&Reading> for ReadingResponse {
    fn from(reading: &Reading) -> Self {
        Self {
            id: reading.id.to_string(),
            tool: reading.tool,
            content: reading.content.clone(),
            cost_points: reading.cost_points,
            fallback: reading.fallback,
            input: reading.input.clone(),
            created_at: reading.created_at.to_rfc3339(),
        }
    }
}

/// A freshly generated reading plus the balance it left behind.
#[derive(Debug, Serialize)]
pub struct GeneratedReadingResponse {
    /// The reading.
    #[serde(flatten)]
    pub reading: ReadingResponse,
    /// Balance after the charge.
    pub balance_points: i64,
}

/// Request body for a tarot reading.
#[derive(Debug, Deserialize)]
pub struct TarotRequest {
    /// The question to consult the cards about.
    pub question: String,
    /// Card names already revealed by the frontend animation. Absent cards
    /// are drawn server-side.
    #[serde(default)]
    pub cards: Option<Vec<String>>,
}

/// `POST /v1/readings/tarot` - Three-card love tarot.
pub async fn request_tarot(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<TarotRequest>,
) -> Result<Json<GeneratedReadingResponse>, ApiError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question is required".into()));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(ApiError::BadRequest(format!(
            "question must be at most {MAX_QUESTION_CHARS} characters"
        )));
    }

    let cards = match req.cards {
        Some(names) => resolve_cards(&names)?,
        None => tarot::draw(SPREAD_SIZE),
    };

    let user = onboarded_user(&state, &auth)?;
    let prompt = prompt::tarot(question, &cards, &user.profile);
    let input = json!({
        "question": question,
        "cards": cards.iter().map(|c| c.name).collect::<Vec<_>>(),
    });

    generate_reading(&state, &user, ToolKind::Tarot, input, prompt).await
}

/// `POST /v1/readings/tarot/daily` - The once-a-day single card.
pub async fn request_daily_card(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<GeneratedReadingResponse>, ApiError> {
    let user = onboarded_user(&state, &auth)?;
    let today = time::brasilia_today();
    let card = tarot::draw_one();

    let prompt = prompt::daily_card(card, today, &user.profile);
    let input = json!({ "card": card.name, "date": today });

    generate_reading(&state, &user, ToolKind::DailyCard, input, prompt).await
}

/// Request body for the daily horoscope.
#[derive(Debug, Default, Deserialize)]
pub struct HoroscopeRequest {
    /// Sign to read for; defaults to the sign of the profile birth date.
    #[serde(default)]
    pub sign: Option<String>,
}

/// `POST /v1/readings/horoscope/daily` - The once-a-day horoscope.
pub async fn request_daily_horoscope(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    body: Option<Json<HoroscopeRequest>>,
) -> Result<Json<GeneratedReadingResponse>, ApiError> {
    let user = onboarded_user(&state, &auth)?;

    let requested = body.and_then(|Json(req)| req.sign);
    let sign = match requested {
        Some(name) => name
            .parse::<ZodiacSign>()
            .map_err(|_| ApiError::BadRequest(format!("unknown zodiac sign: {name}")))?,
        None => user
            .profile
            .birth_date
            .map(ZodiacSign::from_date)
            .ok_or_else(|| {
                ApiError::BadRequest("sign is required when the profile has no birth date".into())
            })?,
    };

    let today = time::brasilia_today();
    let prompt = prompt::daily_horoscope(sign, today, &user.profile);
    let input = json!({ "sign": sign.as_str(), "date": today });

    generate_reading(&state, &user, ToolKind::DailyHoroscope, input, prompt).await
}

/// Request body for a birth chart. Every field falls back to the profile.
#[derive(Debug, Default, Deserialize)]
pub struct BirthChartRequest {
    /// Birth date override.
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    /// Birth time override ("HH:MM").
    #[serde(default)]
    pub birth_time: Option<String>,
    /// Birth place override.
    #[serde(default)]
    pub birth_place: Option<String>,
}

/// `POST /v1/readings/birth-chart` - Birth chart from birth data.
pub async fn request_birth_chart(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    body: Option<Json<BirthChartRequest>>,
) -> Result<Json<GeneratedReadingResponse>, ApiError> {
    let user = onboarded_user(&state, &auth)?;
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let birth_date = req
        .birth_date
        .or(user.profile.birth_date)
        .ok_or_else(|| {
            ApiError::BadRequest(
                "birth_date is required when the profile has no birth date".into(),
            )
        })?;
    let birth_time = req.birth_time.or_else(|| user.profile.birth_time.clone());
    let birth_place = req.birth_place.or_else(|| user.profile.birth_place.clone());

    let prompt = prompt::birth_chart(
        birth_date,
        birth_time.as_deref(),
        birth_place.as_deref(),
        &user.profile,
    );
    let input = json!({
        "birth_date": birth_date,
        "birth_time": birth_time,
        "birth_place": birth_place,
    });

    generate_reading(&state, &user, ToolKind::BirthChart, input, prompt).await
}

/// Request body for a numerology reading.
#[derive(Debug, Deserialize)]
pub struct NumerologyRequest {
    /// Full name, as used for the destiny number.
    pub full_name: String,
    /// Birth date override for the life-path number.
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

/// `POST /v1/readings/numerology` - Numerology from name and birth date.
pub async fn request_numerology(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NumerologyRequest>,
) -> Result<Json<GeneratedReadingResponse>, ApiError> {
    let full_name = req.full_name.trim();
    let destiny = numerology::destiny_number(full_name)
        .ok_or_else(|| ApiError::BadRequest("full_name must contain letters".into()))?;

    let user = onboarded_user(&state, &auth)?;

    let birth_date = req.birth_date.or(user.profile.birth_date);
    let life_path = birth_date.map(numerology::life_path_number);

    let prompt = prompt::numerology(full_name, destiny, life_path, &user.profile);
    let input = json!({
        "full_name": full_name,
        "destiny_number": destiny,
        "life_path_number": life_path,
    });

    generate_reading(&state, &user, ToolKind::Numerology, input, prompt).await
}

/// Request body for a dream interpretation.
#[derive(Debug, Deserialize)]
pub struct DreamRequest {
    /// The dream, in the user's words.
    pub description: String,
}

/// `POST /v1/readings/dreams` - Dream interpretation.
pub async fn request_dream(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<DreamRequest>,
) -> Result<Json<GeneratedReadingResponse>, ApiError> {
    let description = req.description.trim();
    if description.is_empty() {
        return Err(ApiError::BadRequest("description is required".into()));
    }
    if description.chars().count() > MAX_DREAM_CHARS {
        return Err(ApiError::BadRequest(format!(
            "description must be at most {MAX_DREAM_CHARS} characters"
        )));
    }

    let user = onboarded_user(&state, &auth)?;
    let prompt = prompt::dream(description, &user.profile);
    let input = json!({ "description": description });

    generate_reading(&state, &user, ToolKind::DreamInterpretation, input, prompt).await
}

/// Query parameters for reading history.
#[derive(Debug, Deserialize)]
pub struct ListReadingsQuery {
    /// Maximum number of readings to return (capped at 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Number of readings to skip.
    #[serde(default)]
    pub offset: usize,
}

const fn default_limit() -> usize {
    20
}

/// Reading list response.
#[derive(Debug, Serialize)]
pub struct ReadingListResponse {
    /// Readings, newest first.
    pub readings: Vec<ReadingResponse>,
    /// Whether more readings exist past this page.
    pub has_more: bool,
}

/// `GET /v1/readings` - Paginated reading history, newest first.
pub async fn list_readings(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListReadingsQuery>,
) -> Result<Json<ReadingListResponse>, ApiError> {
    let limit = query.limit.clamp(1, 100);

    let mut readings = state
        .store
        .list_readings_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = readings.len() > limit;
    readings.truncate(limit);

    Ok(Json(ReadingListResponse {
        readings: readings.iter().map(ReadingResponse::from).collect(),
        has_more,
    }))
}

/// `GET /v1/readings/{id}` - Fetch one reading. Owner only; readings of
/// other users answer 404 rather than 403.
pub async fn get_reading(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ReadingResponse>, ApiError> {
    let reading_id = id
        .parse::<guia_core::ReadingId>()
        .map_err(|_| ApiError::BadRequest("invalid reading id".into()))?;

    let reading = state
        .store
        .get_reading(&reading_id)?
        .filter(|r| r.user_id == auth.user_id)
        .ok_or_else(|| ApiError::NotFound("reading".into()))?;

    Ok(Json(ReadingResponse::from(&reading)))
}

/// Load the user and refuse pre-onboarding reading requests.
fn onboarded_user(state: &AppState, auth: &AuthUser) -> Result<User, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("user".into()))?;

    if !user.onboarding_complete {
        return Err(ApiError::OnboardingRequired);
    }

    Ok(user)
}

/// Resolve client-revealed card names against the deck.
fn resolve_cards(names: &[String]) -> Result<Vec<&'static TarotCard>, ApiError> {
    if names.len() != SPREAD_SIZE {
        return Err(ApiError::BadRequest(format!(
            "cards must name exactly {SPREAD_SIZE} cards"
        )));
    }

    let mut cards = Vec::with_capacity(SPREAD_SIZE);
    for name in names {
        let card = tarot::find(name)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown card: {name}")))?;
        if cards.iter().any(|c: &&TarotCard| c.number == card.number) {
            return Err(ApiError::BadRequest(format!("duplicate card: {name}")));
        }
        cards.push(card);
    }

    Ok(cards)
}

/// Run the charge-gated generation pipeline for one tool request.
async fn generate_reading(
    state: &Arc<AppState>,
    user: &User,
    tool: ToolKind,
    input: serde_json::Value,
    prompt: Prompt,
) -> Result<Json<GeneratedReadingResponse>, ApiError> {
    let oracle = state
        .oracle
        .as_ref()
        .ok_or_else(|| ApiError::GenerationFailed("oracle is not configured".into()))?;

    // One reading per user at a time; released on every exit path.
    let _permit = state
        .inflight
        .acquire(user.user_id)
        .ok_or(ApiError::ReadingInProgress)?;

    let cost = tool.cost_points();
    if !user.has_sufficient_points(cost) {
        return Err(ApiError::InsufficientPoints {
            balance: user.balance_points,
            required: cost,
        });
    }

    let today = time::brasilia_today();
    if tool.daily_limited() && state.store.has_daily_reading(&user.user_id, tool, today)? {
        return Err(ApiError::DailyLimitReached { tool });
    }

    // The oracle is only consulted once all gates pass; an Err here
    // propagates before any write, so nothing is charged.
    let generation = oracle.generate(&GenerationRequest::new(tool, prompt)).await?;

    let reading = Reading::new(
        user.user_id,
        tool,
        generation.content,
        generation.fallback,
        input,
    );
    let transaction = PointTransaction::tool_usage(
        user.user_id,
        cost,
        user.balance_points - cost,
        tool,
        reading.id,
    );
    let balance = state.store.record_reading(&reading, &transaction, today)?;

    tracing::info!(
        user_id = %user.user_id,
        tool = %tool,
        reading_id = %reading.id,
        cost_points = cost,
        fallback = reading.fallback,
        balance_points = balance,
        "Reading delivered"
    );

    Ok(Json(GeneratedReadingResponse {
        reading: ReadingResponse::from(&reading),
        balance_points: balance,
    }))
}
