//! Wire types exchanged with the backend.
//!
//! # Design
//! Records mirror the backend JSON field for field (`camelCase`, optional
//! fields omitted when absent). The SDK never derives or recomputes numeric
//! fields such as capacities, pulse or scores; whatever the backend computed
//! is what callers see.
//!
//! Enums whose value sets are owned by the scoring engine (`CapacityType`,
//! `Confidence`, `LevelBand`) keep unknown values in an `Other` variant so a
//! newer backend never breaks decoding.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Athlete,
    Coach,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Athlete => "ATHLETE",
            UserRole::Coach => "COACH",
            UserRole::Admin => "ADMIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LevelBand {
    Beginner,
    Pro,
    Athlete,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementPattern {
    Squat,
    Hinge,
    Push,
    Pull,
    Carry,
    Core,
    Locomotion,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementUnit {
    Reps,
    Meters,
    Seconds,
    Calories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkoutType {
    Amrap,
    Emom,
    Fortime,
    Intervals,
    Blocks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkoutVisibility {
    Community,
    GymsOnly,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreType {
    Reps,
    Meters,
    Time,
    RoundsMeters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleCode {
    Rx,
    Scaled,
}

impl ScaleCode {
    pub const ALL: [ScaleCode; 2] = [ScaleCode::Rx, ScaleCode::Scaled];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleCode::Rx => "RX",
            ScaleCode::Scaled => "SCALED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Work,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadRule {
    Fixed,
    AthleteChoice,
    ScaleReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    Draft,
    Submitted,
    Validated,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapacityType {
    Strength,
    MuscularEndurance,
    RelativeStrength,
    WorkCapacity,
    #[serde(untagged)]
    Other(String),
}

impl CapacityType {
    /// The capacities a workout distributes its weight over.
    pub const WEIGHTED: [CapacityType; 4] = [
        CapacityType::Strength,
        CapacityType::MuscularEndurance,
        CapacityType::RelativeStrength,
        CapacityType::WorkCapacity,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Med,
    High,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaderboardScope {
    Community,
    Gym,
}

impl LeaderboardScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardScope::Community => "COMMUNITY",
            LeaderboardScope::Gym => "GYM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderboardPeriod {
    #[serde(rename = "ALL_TIME")]
    AllTime,
    #[serde(rename = "D30")]
    D30,
}

impl LeaderboardPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardPeriod::AllTime => "ALL_TIME",
            LeaderboardPeriod::D30 => "D30",
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// The backend may or may not rotate the refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteCreateRequest {
    pub email: String,
    pub gym_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteCreateResponse {
    pub invitation_id: String,
    pub token: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteProfileInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFromInviteRequest {
    pub token: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub athlete: AthleteProfileInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFromInviteResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Catalog and workouts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: String,
    pub name: String,
    pub pattern: MovementPattern,
    pub unit_primary: MovementUnit,
    pub requires_load: bool,
    pub requires_bodyweight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummary {
    pub id: String,
    pub title: String,
    pub is_test: bool,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub visibility: WorkoutVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_type: Option<ScoreType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// Coach-side listing rows share the public summary shape.
pub type CoachWorkoutSummary = WorkoutSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutScale {
    pub code: ScaleCode,
    pub label: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub reference_loads: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutBlockMovement {
    pub id: String,
    pub ord: u32,
    pub movement: Movement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meters: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<i64>,
    pub load_rule: LoadRule,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_height_cm: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutBlock {
    pub id: String,
    pub ord: u32,
    pub name: String,
    pub block_type: BlockType,
    pub repeat_int: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_seconds: Option<u32>,
    pub movements: Vec<WorkoutBlockMovement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityWeight {
    pub capacity_type: CapacityType,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDetail {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub is_test: bool,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub visibility: WorkoutVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_type: Option<ScoreType>,
    pub scales: Vec<WorkoutScale>,
    pub blocks: Vec<WorkoutBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_weights: Option<Vec<CapacityWeight>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutScaleInput {
    pub code: ScaleCode,
    pub label: String,
    pub notes: String,
    pub reference_loads: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutBlockMovementInput {
    pub ord: u32,
    pub movement_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meters: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<i64>,
    pub load_rule: LoadRule,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_height_cm: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutBlockInput {
    pub ord: u32,
    pub name: String,
    pub block_type: BlockType,
    pub repeat_int: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_seconds: Option<u32>,
    pub movements: Vec<WorkoutBlockMovementInput>,
}

/// Body of both create and update workout calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutUpsertRequest {
    pub title: String,
    pub description: String,
    pub is_test: bool,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub visibility: WorkoutVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_type: Option<ScoreType>,
    pub scales: Vec<WorkoutScaleInput>,
    pub blocks: Vec<WorkoutBlockInput>,
    pub capacity_weights: Vec<CapacityWeight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutMutationResponse {
    pub id: String,
    pub title: String,
    pub is_test: bool,
    #[serde(rename = "type")]
    pub workout_type: WorkoutType,
    pub visibility: WorkoutVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_type: Option<ScoreType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateWorkoutResponse {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdealScoreUpsertRequest {
    pub ideal_score_base: f64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdealScoreEntry {
    pub ideal_score_base: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymIdealScoreEntry {
    pub gym_id: String,
    pub gym_name: String,
    pub ideal_score_base: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealScores {
    #[serde(default)]
    pub community: Option<IdealScoreEntry>,
    pub gyms: Vec<GymIdealScoreEntry>,
}

// ---------------------------------------------------------------------------
// Attempts
// ---------------------------------------------------------------------------

/// Arguments of `ApiClient::create_attempt`; only `scaleCode` goes in the body.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAttemptRequest {
    pub workout_id: String,
    pub assignment_id: Option<String>,
    pub scale_code: ScaleCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttemptResponse {
    pub attempt_id: String,
    pub status: AttemptStatus,
}

/// Headline result of an attempt, tagged by score type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimaryResult {
    Reps {
        #[serde(rename = "repsTotal")]
        reps_total: i64,
    },
    Meters {
        #[serde(rename = "metersTotal")]
        meters_total: i64,
    },
    Time {
        #[serde(rename = "timeSeconds")]
        time_seconds: i64,
    },
    RoundsMeters {
        rounds: i64,
        meters: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultRequest {
    pub primary_result: PrimaryResult,
    #[serde(default)]
    pub inputs: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub athlete_id: String,
    pub workout_id: String,
    pub performed_at: String,
    pub scale_code: ScaleCode,
    pub status: AttemptStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_norm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectAttemptRequest {
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Dashboard and rankings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    #[serde(rename = "type")]
    pub capacity_type: CapacityType,
    pub value: f64,
    pub confidence: Confidence,
    pub last_updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_fill: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseExplainItem {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pulse {
    pub value: f64,
    pub confidence: Confidence,
    pub computed_at: String,
    pub explain: Vec<PulseExplainItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteCounts {
    pub tests7d: i64,
    pub tests30d: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityTrend {
    #[serde(rename = "type")]
    pub capacity_type: CapacityType,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteDashboard {
    pub athlete_id: String,
    pub gym_id: String,
    pub level: i64,
    pub level_band: LevelBand,
    pub pulse: Pulse,
    pub capacities: Vec<Capacity>,
    pub counts: AthleteCounts,
    #[serde(rename = "trends30d")]
    pub trends_30d: Vec<CapacityTrend>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardQuery {
    pub workout_id: String,
    pub scale_code: ScaleCode,
    pub scope: LeaderboardScope,
    pub period: LeaderboardPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub athlete_id: String,
    pub display_name: String,
    pub best_score_norm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub scope: LeaderboardScope,
    pub period: LeaderboardPeriod,
    pub workout_id: String,
    pub scale_code: ScaleCode,
    pub entries: Vec<LeaderboardEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_rank: Option<i64>,
}

// ---------------------------------------------------------------------------
// Coach and admin
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachOverview {
    pub gym_id: String,
    pub athletes_count: i64,
    pub pending_submissions: i64,
    pub validated_today: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachAthlete {
    pub athlete_id: String,
    pub user_id: String,
    pub email: String,
    pub level: i64,
    pub level_band: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachAthleteDetail {
    pub athlete_id: String,
    pub user_id: String,
    pub email: String,
    pub gym_id: String,
    pub level: i64,
    pub level_band: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateMovementRequest {
    pub name: String,
    pub pattern: MovementPattern,
    pub unit_primary: MovementUnit,
    pub requires_load: bool,
    pub requires_bodyweight: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminChangeGymRequest {
    pub gym_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminChangeGymResponse {
    pub athlete_id: String,
    #[serde(default)]
    pub previous_gym_id: Option<String>,
    pub current_gym_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecomputeRankingsResponse {
    pub status: String,
    pub recomputed: i64,
}
