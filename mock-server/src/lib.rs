//! In-memory stand-in for the fitness-testing backend.
//!
//! Serves the subset of `/api/v1` the SDK integration tests exercise, with
//! the same token semantics as the real service: opaque bearer access
//! tokens, refresh tokens rotated on every refresh, and `{"detail": ...}`
//! error bodies. `MockControl` lets a test expire or revoke tokens while
//! the server is running.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/v1";

pub const ATHLETE_EMAIL: &str = "athlete@local.com";
pub const ATHLETE_PASSWORD: &str = "Athlete123!";
pub const COACH_EMAIL: &str = "coach@local.com";
pub const COACH_PASSWORD: &str = "Coach123!";
pub const ADMIN_EMAIL: &str = "admin@local.com";
pub const ADMIN_PASSWORD: &str = "Admin123!";

/// Every timestamp the mock emits.
const MOCK_NOW: &str = "2026-01-01T00:00:00Z";
const CAPACITIES: [&str; 4] = ["STRENGTH", "MUSCULAR_ENDURANCE", "RELATIVE_STRENGTH", "WORK_CAPACITY"];

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: String,
    pub name: String,
    pub pattern: String,
    pub unit_primary: String,
    pub requires_load: bool,
    pub requires_bodyweight: bool,
}

#[derive(Clone, Debug)]
struct User {
    id: String,
    email: String,
    password: String,
    role: &'static str,
    gym_id: String,
    athlete_id: Option<String>,
}

#[derive(Clone, Debug)]
struct Invitation {
    email: String,
    gym_id: String,
    accepted: bool,
}

/// Stored in detail form; summaries are projected from it.
#[derive(Clone, Debug)]
struct Workout {
    detail: Value,
    published_at: Option<String>,
}

impl Workout {
    fn summary(&self) -> Value {
        let mut summary = json!({
            "id": self.detail["id"],
            "title": self.detail["title"],
            "isTest": self.detail["isTest"],
            "type": self.detail["type"],
            "visibility": self.detail["visibility"],
        });
        if let Some(score_type) = self.detail.get("scoreType") {
            summary["scoreType"] = score_type.clone();
        }
        if let Some(published_at) = &self.published_at {
            summary["publishedAt"] = json!(published_at);
        }
        summary
    }

    fn has_scale(&self, code: &str) -> bool {
        self.detail["scales"]
            .as_array()
            .is_some_and(|scales| scales.iter().any(|s| s["code"] == code))
    }
}

#[derive(Debug, Default)]
struct MockState {
    gym_id: String,
    users: Vec<User>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    invitations: HashMap<String, Invitation>,
    movements: Vec<Movement>,
    workouts: Vec<Workout>,
    attempts: HashMap<String, Value>,
    refresh_calls: usize,
}

/// Error response with a FastAPI-style `detail` body.
#[derive(Debug)]
pub struct Problem {
    status: StatusCode,
    detail: String,
}

impl Problem {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn unauthorized(detail: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail)
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Insufficient role")
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    fn unprocessable(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, Problem>;

fn token() -> String {
    Uuid::new_v4().to_string()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl MockState {
    fn seeded() -> Self {
        let gym_id = token();
        let user = |email: &str, password: &str, role: &'static str, athlete: bool| User {
            id: token(),
            email: email.to_string(),
            password: password.to_string(),
            role,
            gym_id: gym_id.clone(),
            athlete_id: athlete.then(token),
        };
        let users = vec![
            user(ADMIN_EMAIL, ADMIN_PASSWORD, "ADMIN", false),
            user(COACH_EMAIL, COACH_PASSWORD, "COACH", false),
            user(ATHLETE_EMAIL, ATHLETE_PASSWORD, "ATHLETE", true),
        ];

        let movements = [
            ("Air Squat", "SQUAT", "REPS", false, true),
            ("Back Squat", "SQUAT", "REPS", true, false),
            ("Strict Press", "PUSH", "REPS", true, false),
            ("DB Push Press", "PUSH", "REPS", true, false),
            ("Deadlift", "HINGE", "REPS", true, false),
            ("Pull-up strict", "PULL", "REPS", false, true),
            ("Hollow Hold", "CORE", "SECONDS", false, true),
            ("Farmer Carry", "CARRY", "METERS", true, false),
            ("Sled Push", "LOCOMOTION", "METERS", true, false),
            ("Burpee", "LOCOMOTION", "REPS", false, true),
            ("Row Erg", "PULL", "METERS", false, false),
        ]
        .into_iter()
        .map(|(name, pattern, unit, requires_load, requires_bodyweight)| Movement {
            id: token(),
            name: name.to_string(),
            pattern: pattern.to_string(),
            unit_primary: unit.to_string(),
            requires_load,
            requires_bodyweight,
        })
        .collect();

        let mut state = Self {
            gym_id,
            users,
            movements,
            ..Self::default()
        };

        let squat_id = state.movement_id("Back Squat").unwrap_or_default();
        let seed = json!({
            "title": "Test Squat",
            "description": "Test de squat 10min",
            "isTest": true,
            "type": "AMRAP",
            "visibility": "COMMUNITY",
            "scoreType": "REPS",
            "scales": [
                {"code": "RX", "label": "RX", "notes": "", "referenceLoads": {}},
                {"code": "SCALED", "label": "Scaled", "notes": "", "referenceLoads": {}}
            ],
            "blocks": [{
                "ord": 1, "name": "Main", "blockType": "WORK", "repeatInt": 1, "timeSeconds": 600,
                "movements": [{"ord": 1, "movementId": squat_id, "reps": 8, "loadRule": "ATHLETE_CHOICE", "notes": ""}]
            }],
            "capacityWeights": [
                {"capacityType": "STRENGTH", "weight": 0.4},
                {"capacityType": "MUSCULAR_ENDURANCE", "weight": 0.6}
            ]
        });
        if let Ok(detail) = state.expand_workout(token(), &seed) {
            state.workouts.push(Workout {
                detail,
                published_at: Some(MOCK_NOW.to_string()),
            });
        }
        state
    }

    fn movement_id(&self, name: &str) -> Option<String> {
        self.movements
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .map(|m| m.id.clone())
    }

    fn authorize(&self, headers: &HeaderMap, roles: &[&str]) -> Result<User, Problem> {
        let token = bearer(headers).ok_or_else(|| Problem::unauthorized("Missing bearer token"))?;
        let user_id = self
            .access_tokens
            .get(token)
            .ok_or_else(|| Problem::unauthorized("Token expired"))?;
        let user = self
            .users
            .iter()
            .find(|u| &u.id == user_id)
            .ok_or_else(|| Problem::unauthorized("User not found"))?;
        if !roles.is_empty() && !roles.contains(&user.role) {
            return Err(Problem::forbidden());
        }
        Ok(user.clone())
    }

    fn issue_tokens(&mut self, user_id: &str) -> (String, String) {
        let access = token();
        let refresh = token();
        self.access_tokens.insert(access.clone(), user_id.to_string());
        self.refresh_tokens.insert(refresh.clone(), user_id.to_string());
        (access, refresh)
    }

    fn workout(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.detail["id"] == id)
    }

    /// Turn an upsert body into the detail shape: ids on blocks and block
    /// movements, catalog movements inlined.
    fn expand_workout(&self, id: String, body: &Value) -> Result<Value, Problem> {
        let title = body["title"].as_str().map(str::trim).unwrap_or_default();
        if title.is_empty() {
            return Err(Problem::unprocessable("Title is required"));
        }
        let blocks = body["blocks"]
            .as_array()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Problem::unprocessable("At least one block is required"))?;

        let mut expanded = Vec::with_capacity(blocks.len());
        for block in blocks {
            let mut movements = Vec::new();
            for item in block["movements"].as_array().into_iter().flatten() {
                let movement_id = item["movementId"].as_str().unwrap_or_default();
                let movement = self
                    .movements
                    .iter()
                    .find(|m| m.id == movement_id)
                    .ok_or_else(|| Problem::unprocessable(format!("Unknown movement {movement_id}")))?;
                let mut entry = item.clone();
                if let Some(map) = entry.as_object_mut() {
                    map.remove("movementId");
                    map.insert("id".into(), json!(token()));
                    map.insert("movement".into(), json!(movement));
                }
                movements.push(entry);
            }
            let mut entry = block.clone();
            entry["id"] = json!(token());
            entry["movements"] = Value::Array(movements);
            expanded.push(entry);
        }

        let mut detail = body.clone();
        detail["id"] = json!(id);
        detail["title"] = json!(title);
        detail["blocks"] = Value::Array(expanded);
        if detail.get("description").is_none() {
            detail["description"] = json!("");
        }
        Ok(detail)
    }
}

/// Shared handle on the server state, for tests that need to manipulate
/// sessions while the server runs.
#[derive(Clone, Debug)]
pub struct MockControl {
    state: Arc<RwLock<MockState>>,
}

impl Default for MockControl {
    fn default() -> Self {
        Self::new()
    }
}

impl MockControl {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState::seeded())),
        }
    }

    /// Invalidate every issued access token; refresh tokens stay valid.
    pub async fn expire_access_tokens(&self) {
        self.state.write().await.access_tokens.clear();
    }

    pub async fn revoke_refresh_tokens(&self) {
        self.state.write().await.refresh_tokens.clear();
    }

    /// Number of `/auth/refresh` calls received, successful or not.
    pub async fn refresh_calls(&self) -> usize {
        self.state.read().await.refresh_calls
    }

    pub async fn gym_id(&self) -> String {
        self.state.read().await.gym_id.clone()
    }

    pub async fn movement_id(&self, name: &str) -> Option<String> {
        self.state.read().await.movement_id(name)
    }
}

pub fn app() -> Router {
    router(MockControl::new())
}

pub fn router(control: MockControl) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/invitations", post(create_invitation))
        .route("/auth/register-from-invite", post(register_from_invite))
        .route("/me", get(me))
        .route("/health", get(health))
        .route("/movements", get(list_movements))
        .route("/workouts", get(list_workouts))
        .route("/workouts/{id}", get(get_workout))
        .route("/athlete/dashboard", get(athlete_dashboard))
        .route("/athlete/workouts/{id}/attempt", post(create_attempt))
        .route("/coach/overview", get(coach_overview))
        .route("/coach/workouts", get(coach_workouts).post(create_workout))
        .route("/coach/workouts/{id}/publish", post(publish_workout));
    Router::new().nest(API_PREFIX, api).with_state(control)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, MockControl::new()).await
}

pub async fn serve(listener: TcpListener, control: MockControl) -> Result<(), std::io::Error> {
    axum::serve(listener, router(control)).await
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshInput {
    pub refresh_token: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogoutInput {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationInput {
    pub email: String,
    pub gym_id: String,
}

#[derive(Deserialize)]
pub struct RegisterInput {
    pub token: String,
    pub password: String,
}

async fn login(State(control): State<MockControl>, Json(input): Json<LoginInput>) -> ApiResult {
    let mut state = control.state.write().await;
    let user = state
        .users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(&input.email) && u.password == input.password)
        .cloned()
        .ok_or_else(|| Problem::unauthorized("Invalid credentials"))?;
    let (access, refresh) = state.issue_tokens(&user.id);
    info!(email = %user.email, role = user.role, "login");
    Ok(Json(json!({ "accessToken": access, "refreshToken": refresh, "role": user.role })))
}

async fn refresh(State(control): State<MockControl>, Json(input): Json<RefreshInput>) -> ApiResult {
    let mut state = control.state.write().await;
    state.refresh_calls += 1;
    let user_id = state
        .refresh_tokens
        .remove(&input.refresh_token)
        .ok_or_else(|| Problem::unauthorized("Invalid refresh token"))?;
    let (access, refresh) = state.issue_tokens(&user_id);
    debug!(user_id = %user_id, "refresh token rotated");
    Ok(Json(json!({ "accessToken": access, "refreshToken": refresh })))
}

async fn logout(
    State(control): State<MockControl>,
    headers: HeaderMap,
    Json(input): Json<LogoutInput>,
) -> ApiResult {
    let mut state = control.state.write().await;
    let user = state.authorize(&headers, &[])?;
    match input.refresh_token {
        Some(token) => {
            if state.refresh_tokens.get(&token).is_some_and(|owner| owner != &user.id) {
                return Err(Problem::new(StatusCode::FORBIDDEN, "Refresh token does not belong to user"));
            }
            state.refresh_tokens.remove(&token);
        }
        None => state.refresh_tokens.retain(|_, owner| *owner != user.id),
    }
    Ok(Json(json!({ "status": "ok" })))
}

async fn create_invitation(
    State(control): State<MockControl>,
    headers: HeaderMap,
    Json(input): Json<InvitationInput>,
) -> ApiResult {
    let mut state = control.state.write().await;
    let coach = state.authorize(&headers, &["COACH"])?;
    if input.gym_id != coach.gym_id {
        return Err(Problem::new(StatusCode::FORBIDDEN, "Coach can only invite to own gym"));
    }
    let invitation_id = token();
    let invite_token = token();
    state.invitations.insert(
        invite_token.clone(),
        Invitation {
            email: input.email.to_lowercase(),
            gym_id: input.gym_id,
            accepted: false,
        },
    );
    Ok(Json(json!({
        "invitationId": invitation_id,
        "token": invite_token,
        "expiresAt": MOCK_NOW,
    })))
}

async fn register_from_invite(State(control): State<MockControl>, Json(input): Json<RegisterInput>) -> ApiResult {
    let mut state = control.state.write().await;
    let invitation = state
        .invitations
        .get(&input.token)
        .cloned()
        .ok_or_else(|| Problem::unprocessable("Invalid invitation token"))?;
    if invitation.accepted {
        return Err(Problem::new(StatusCode::CONFLICT, "Invitation already used"));
    }
    if state.users.iter().any(|u| u.email == invitation.email) {
        return Err(Problem::new(StatusCode::CONFLICT, "Email already registered"));
    }

    let user = User {
        id: token(),
        email: invitation.email,
        password: input.password,
        role: "ATHLETE",
        gym_id: invitation.gym_id,
        athlete_id: Some(token()),
    };
    let user_id = user.id.clone();
    state.users.push(user);
    if let Some(invitation) = state.invitations.get_mut(&input.token) {
        invitation.accepted = true;
    }
    let (access, refresh) = state.issue_tokens(&user_id);
    Ok(Json(json!({ "accessToken": access, "refreshToken": refresh, "role": "ATHLETE" })))
}

async fn me(State(control): State<MockControl>, headers: HeaderMap) -> ApiResult {
    let user = control.state.read().await.authorize(&headers, &[])?;
    Ok(Json(json!({
        "id": user.id,
        "email": user.email,
        "role": user.role,
        "status": "ACTIVE",
    })))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Catalog and workouts
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct MovementQuery {
    pub query: Option<String>,
}

async fn list_movements(
    State(control): State<MockControl>,
    headers: HeaderMap,
    Query(params): Query<MovementQuery>,
) -> Result<Json<Vec<Movement>>, Problem> {
    let state = control.state.read().await;
    state.authorize(&headers, &[])?;
    let needle = params.query.unwrap_or_default().trim().to_lowercase();
    let movements = state
        .movements
        .iter()
        .filter(|m| needle.is_empty() || m.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    Ok(Json(movements))
}

async fn list_workouts(State(control): State<MockControl>, headers: HeaderMap) -> ApiResult {
    let state = control.state.read().await;
    state.authorize(&headers, &[])?;
    let published: Vec<Value> = state
        .workouts
        .iter()
        .filter(|w| w.published_at.is_some())
        .map(Workout::summary)
        .collect();
    Ok(Json(Value::Array(published)))
}

async fn get_workout(State(control): State<MockControl>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult {
    let state = control.state.read().await;
    state.authorize(&headers, &[])?;
    let workout = state.workout(&id).ok_or_else(|| Problem::not_found("Workout"))?;
    Ok(Json(workout.detail.clone()))
}

// ---------------------------------------------------------------------------
// Athlete
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptInput {
    pub scale_code: String,
}

async fn athlete_dashboard(State(control): State<MockControl>, headers: HeaderMap) -> ApiResult {
    let user = control.state.read().await.authorize(&headers, &["ATHLETE"])?;
    let capacities: Vec<Value> = CAPACITIES
        .iter()
        .map(|c| json!({"type": c, "value": 0, "confidence": "LOW", "lastUpdatedAt": MOCK_NOW, "percentFill": 0}))
        .collect();
    let trends: Vec<Value> = CAPACITIES.iter().map(|c| json!({"type": c, "delta": 0})).collect();
    Ok(Json(json!({
        "athleteId": user.athlete_id.unwrap_or_default(),
        "gymId": user.gym_id,
        "level": 1,
        "levelBand": "BEGINNER",
        "pulse": {
            "value": 0,
            "confidence": "LOW",
            "computedAt": MOCK_NOW,
            "explain": [{"key": "no_data", "message": "No validated tests yet"}]
        },
        "capacities": capacities,
        "counts": {"tests7d": 0, "tests30d": 0},
        "trends30d": trends,
    })))
}

async fn create_attempt(
    State(control): State<MockControl>,
    headers: HeaderMap,
    Path(workout_id): Path<String>,
    Json(input): Json<AttemptInput>,
) -> ApiResult {
    let mut state = control.state.write().await;
    let user = state.authorize(&headers, &["ATHLETE"])?;
    let workout = state
        .workout(&workout_id)
        .filter(|w| w.published_at.is_some())
        .ok_or_else(|| Problem::not_found("Workout"))?;
    if !workout.has_scale(&input.scale_code) {
        return Err(Problem::unprocessable("Invalid scale code for workout"));
    }
    let attempt_id = token();
    state.attempts.insert(
        attempt_id.clone(),
        json!({
            "id": attempt_id,
            "athleteId": user.athlete_id.unwrap_or_default(),
            "workoutId": workout_id,
            "performedAt": MOCK_NOW,
            "scaleCode": input.scale_code,
            "status": "DRAFT",
        }),
    );
    Ok(Json(json!({ "attemptId": attempt_id, "status": "DRAFT" })))
}

// ---------------------------------------------------------------------------
// Coach
// ---------------------------------------------------------------------------

async fn coach_overview(State(control): State<MockControl>, headers: HeaderMap) -> ApiResult {
    let state = control.state.read().await;
    let coach = state.authorize(&headers, &["COACH"])?;
    let athletes = state
        .users
        .iter()
        .filter(|u| u.role == "ATHLETE" && u.gym_id == coach.gym_id)
        .count();
    Ok(Json(json!({
        "gymId": coach.gym_id,
        "athletesCount": athletes,
        "pendingSubmissions": 0,
        "validatedToday": 0,
    })))
}

async fn coach_workouts(State(control): State<MockControl>, headers: HeaderMap) -> ApiResult {
    let state = control.state.read().await;
    state.authorize(&headers, &["COACH", "ADMIN"])?;
    let all: Vec<Value> = state.workouts.iter().map(Workout::summary).collect();
    Ok(Json(Value::Array(all)))
}

async fn create_workout(State(control): State<MockControl>, headers: HeaderMap, Json(body): Json<Value>) -> ApiResult {
    let mut state = control.state.write().await;
    state.authorize(&headers, &["COACH", "ADMIN"])?;
    let detail = state.expand_workout(token(), &body)?;
    let workout = Workout {
        detail,
        published_at: None,
    };
    let mut response = workout.summary();
    response["updatedAt"] = json!(MOCK_NOW);
    state.workouts.push(workout);
    Ok(Json(response))
}

async fn publish_workout(
    State(control): State<MockControl>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult {
    let mut state = control.state.write().await;
    state.authorize(&headers, &["COACH", "ADMIN"])?;
    let workout = state
        .workouts
        .iter_mut()
        .find(|w| w.detail["id"] == id.as_str())
        .ok_or_else(|| Problem::not_found("Workout"))?;
    workout.published_at.get_or_insert_with(|| MOCK_NOW.to_string());
    Ok(Json(workout.summary()))
}
