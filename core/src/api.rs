//! Typed operations of the fitness-testing backend.
//!
//! # Design
//! `ApiClient` maps each domain operation onto one `HttpClient::request`
//! call. It adds no retries and no validation; its only logic is path and
//! query construction, plus persisting the token pair returned by `login`,
//! `refresh` and `register_from_invite`.
//!
//! Path roots live in `Endpoints` and can be overridden per deployment;
//! parameterized paths are derived from those roots. Identifiers are
//! percent-encoded before interpolation.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::client::HttpClient;
use crate::config::SdkConfig;
use crate::error::ApiError;
use crate::http::RequestOptions;
use crate::storage::{TokenPair, TokenStorage};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    AdminChangeGymRequest, AdminChangeGymResponse, AdminCreateMovementRequest, Attempt, AthleteDashboard,
    CoachAthlete, CoachAthleteDetail, CoachOverview, CoachWorkoutSummary, CreateAttemptRequest, CreateAttemptResponse,
    DuplicateWorkoutResponse, IdealScoreUpsertRequest, IdealScores, InviteCreateRequest, InviteCreateResponse,
    Leaderboard, LeaderboardQuery, LoginRequest, LoginResponse, LogoutRequest, MeResponse, Movement,
    RecomputeRankingsResponse, RefreshRequest, RefreshResponse, RegisterFromInviteRequest, RegisterFromInviteResponse,
    RejectAttemptRequest, StatusResponse, SubmitResultRequest, WorkoutDetail, WorkoutMutationResponse, WorkoutSummary,
    WorkoutUpsertRequest,
};

/// Path roots of the REST API, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub refresh: String,
    pub logout: String,
    pub invitations: String,
    pub register_from_invite: String,
    pub me: String,
    pub health: String,
    pub movements: String,
    pub workouts: String,
    pub rankings: String,
    pub athlete: String,
    pub coach: String,
    pub admin: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            refresh: "/auth/refresh".to_string(),
            logout: "/auth/logout".to_string(),
            invitations: "/auth/invitations".to_string(),
            register_from_invite: "/auth/register-from-invite".to_string(),
            me: "/me".to_string(),
            health: "/health".to_string(),
            movements: "/movements".to_string(),
            workouts: "/workouts".to_string(),
            rankings: "/rankings".to_string(),
            athlete: "/athlete".to_string(),
            coach: "/coach".to_string(),
            admin: "/admin".to_string(),
        }
    }
}

fn seg(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

impl Endpoints {
    pub fn workout_detail(&self, workout_id: &str) -> String {
        format!("{}/{}", self.workouts, seg(workout_id))
    }

    pub fn create_attempt(&self, workout_id: &str) -> String {
        format!("{}/workouts/{}/attempt", self.athlete, seg(workout_id))
    }

    pub fn submit_result(&self, attempt_id: &str) -> String {
        format!("{}/attempts/{}/submit-result", self.athlete, seg(attempt_id))
    }

    pub fn athlete_dashboard(&self) -> String {
        format!("{}/dashboard", self.athlete)
    }

    pub fn coach_overview(&self) -> String {
        format!("{}/overview", self.coach)
    }

    pub fn coach_athletes(&self) -> String {
        format!("{}/athletes", self.coach)
    }

    pub fn coach_athlete_detail(&self, athlete_id: &str) -> String {
        format!("{}/athletes/{}", self.coach, seg(athlete_id))
    }

    pub fn coach_workouts(&self) -> String {
        format!("{}/workouts", self.coach)
    }

    pub fn coach_workout(&self, workout_id: &str) -> String {
        format!("{}/workouts/{}", self.coach, seg(workout_id))
    }

    pub fn duplicate_workout(&self, workout_id: &str) -> String {
        format!("{}/duplicate", self.coach_workout(workout_id))
    }

    pub fn publish_workout(&self, workout_id: &str) -> String {
        format!("{}/publish", self.coach_workout(workout_id))
    }

    pub fn ideal_scores(&self, workout_id: &str) -> String {
        format!("{}/ideal-scores", self.coach_workout(workout_id))
    }

    pub fn community_ideal_score(&self, workout_id: &str) -> String {
        format!("{}/community", self.ideal_scores(workout_id))
    }

    pub fn gym_ideal_score(&self, workout_id: &str, gym_id: &str) -> String {
        format!("{}/gym/{}", self.ideal_scores(workout_id), seg(gym_id))
    }

    pub fn validate_attempt(&self, attempt_id: &str) -> String {
        format!("{}/attempts/{}/validate", self.coach, seg(attempt_id))
    }

    pub fn reject_attempt(&self, attempt_id: &str) -> String {
        format!("{}/attempts/{}/reject", self.coach, seg(attempt_id))
    }

    pub fn admin_movements(&self) -> String {
        format!("{}/movements", self.admin)
    }

    pub fn admin_change_gym(&self, athlete_id: &str) -> String {
        format!("{}/athletes/{}/change-gym", self.admin, seg(athlete_id))
    }

    pub fn admin_recompute_rankings(&self) -> String {
        format!("{}/rankings/recompute", self.admin)
    }
}

/// Build `path?k=v&...` with percent-encoded values.
fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{query}")
}

#[derive(Debug)]
pub struct ApiClient {
    http: HttpClient,
    endpoints: Endpoints,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn TokenStorage>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            http: HttpClient::new(base_url, transport, storage)?,
            endpoints: Endpoints::default(),
        })
    }

    /// Compose a client that talks to the configured backend over reqwest.
    pub fn from_config(config: &SdkConfig, storage: Arc<dyn TokenStorage>) -> Result<Self, ApiError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Self::new(&config.base_url, transport, storage)
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn storage(&self) -> &Arc<dyn TokenStorage> {
        self.http.storage()
    }

    /// Escape hatch for endpoints without a typed method.
    pub async fn request<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T, ApiError> {
        self.http.request(path, options).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.http.request(path, RequestOptions::get()).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.http.request(path, RequestOptions::post(None).with_json(body)?).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.http.request(path, RequestOptions::post(None)).await
    }

    async fn put<T: DeserializeOwned, B: serde::Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.http
            .request(path, RequestOptions::put(Value::Null).with_json(body)?)
            .await
    }

    // -- session ------------------------------------------------------------

    pub async fn set_tokens(&self, access_token: &str, refresh_token: &str) -> Result<(), ApiError> {
        self.storage().set_tokens(access_token, refresh_token).await?;
        Ok(())
    }

    pub async fn current_tokens(&self) -> Result<Option<TokenPair>, ApiError> {
        Ok(self.storage().tokens().await?)
    }

    pub async fn login(&self, payload: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let response: LoginResponse = self.post(&self.endpoints.login, payload).await?;
        self.set_tokens(&response.access_token, &response.refresh_token).await?;
        info!(role = response.role.as_str(), "signed in");
        Ok(response)
    }

    /// Exchange a refresh token explicitly. The stored refresh token is kept
    /// unless the backend rotates it.
    pub async fn refresh(&self, payload: &RefreshRequest) -> Result<RefreshResponse, ApiError> {
        let response: RefreshResponse = self.post(&self.endpoints.refresh, payload).await?;
        let refresh_token = response.refresh_token.as_deref().unwrap_or(&payload.refresh_token);
        self.set_tokens(&response.access_token, refresh_token).await?;
        Ok(response)
    }

    /// Notify the backend (best effort) and always clear local tokens.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let refresh_token = self.storage().refresh_token().await?;
        if let Some(refresh_token) = refresh_token {
            let body = LogoutRequest {
                refresh_token: Some(refresh_token),
            };
            if let Err(e) = self.post::<Value, _>(&self.endpoints.logout, &body).await {
                debug!(error = %e, "logout notification failed; clearing tokens anyway");
            }
        }
        self.storage().clear().await?;
        info!("signed out");
        Ok(())
    }

    pub async fn create_invitation(&self, payload: &InviteCreateRequest) -> Result<InviteCreateResponse, ApiError> {
        self.post(&self.endpoints.invitations, payload).await
    }

    pub async fn register_from_invite(
        &self,
        payload: &RegisterFromInviteRequest,
    ) -> Result<RegisterFromInviteResponse, ApiError> {
        let response: RegisterFromInviteResponse = self.post(&self.endpoints.register_from_invite, payload).await?;
        self.set_tokens(&response.access_token, &response.refresh_token).await?;
        info!("registered from invitation");
        Ok(response)
    }

    pub async fn me(&self) -> Result<MeResponse, ApiError> {
        self.get(&self.endpoints.me).await
    }

    pub async fn health(&self) -> Result<StatusResponse, ApiError> {
        self.get(&self.endpoints.health).await
    }

    // -- catalog and workouts ------------------------------------------------

    /// A blank query lists the whole catalog.
    pub async fn list_movements(&self, query: Option<&str>) -> Result<Vec<Movement>, ApiError> {
        let path = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => with_query(&self.endpoints.movements, &[("query", q)]),
            None => self.endpoints.movements.clone(),
        };
        self.get(&path).await
    }

    pub async fn list_workouts(&self) -> Result<Vec<WorkoutSummary>, ApiError> {
        self.get(&self.endpoints.workouts).await
    }

    pub async fn get_workout_detail(&self, workout_id: &str) -> Result<WorkoutDetail, ApiError> {
        self.get(&self.endpoints.workout_detail(workout_id)).await
    }

    // -- athlete ---------------------------------------------------------------

    pub async fn create_attempt(&self, payload: &CreateAttemptRequest) -> Result<CreateAttemptResponse, ApiError> {
        let body = json!({ "scaleCode": payload.scale_code });
        self.post(&self.endpoints.create_attempt(&payload.workout_id), &body).await
    }

    pub async fn submit_result(&self, attempt_id: &str, payload: &SubmitResultRequest) -> Result<Attempt, ApiError> {
        self.post(&self.endpoints.submit_result(attempt_id), payload).await
    }

    pub async fn athlete_dashboard(&self) -> Result<AthleteDashboard, ApiError> {
        self.get(&self.endpoints.athlete_dashboard()).await
    }

    pub async fn leaderboard(&self, query: &LeaderboardQuery) -> Result<Leaderboard, ApiError> {
        let path = with_query(
            &self.endpoints.rankings,
            &[
                ("workoutId", query.workout_id.as_str()),
                ("scaleCode", query.scale_code.as_str()),
                ("scope", query.scope.as_str()),
                ("period", query.period.as_str()),
            ],
        );
        self.get(&path).await
    }

    // -- coach ------------------------------------------------------------------

    pub async fn coach_overview(&self) -> Result<CoachOverview, ApiError> {
        self.get(&self.endpoints.coach_overview()).await
    }

    pub async fn coach_athletes(&self) -> Result<Vec<CoachAthlete>, ApiError> {
        self.get(&self.endpoints.coach_athletes()).await
    }

    pub async fn coach_athlete_detail(&self, athlete_id: &str) -> Result<CoachAthleteDetail, ApiError> {
        self.get(&self.endpoints.coach_athlete_detail(athlete_id)).await
    }

    pub async fn coach_workouts(&self) -> Result<Vec<CoachWorkoutSummary>, ApiError> {
        self.get(&self.endpoints.coach_workouts()).await
    }

    pub async fn validate_attempt(&self, attempt_id: &str) -> Result<Attempt, ApiError> {
        self.post_empty(&self.endpoints.validate_attempt(attempt_id)).await
    }

    pub async fn reject_attempt(&self, attempt_id: &str, reason: &str) -> Result<Attempt, ApiError> {
        let body = RejectAttemptRequest {
            reason: reason.to_string(),
        };
        self.post(&self.endpoints.reject_attempt(attempt_id), &body).await
    }

    pub async fn create_workout(&self, payload: &WorkoutUpsertRequest) -> Result<WorkoutMutationResponse, ApiError> {
        self.post(&self.endpoints.coach_workouts(), payload).await
    }

    pub async fn update_workout(
        &self,
        workout_id: &str,
        payload: &WorkoutUpsertRequest,
    ) -> Result<WorkoutMutationResponse, ApiError> {
        self.put(&self.endpoints.coach_workout(workout_id), payload).await
    }

    pub async fn duplicate_workout(&self, workout_id: &str) -> Result<DuplicateWorkoutResponse, ApiError> {
        self.post_empty(&self.endpoints.duplicate_workout(workout_id)).await
    }

    pub async fn publish_workout(&self, workout_id: &str) -> Result<WorkoutSummary, ApiError> {
        self.post_empty(&self.endpoints.publish_workout(workout_id)).await
    }

    pub async fn get_ideal_scores(&self, workout_id: &str) -> Result<IdealScores, ApiError> {
        self.get(&self.endpoints.ideal_scores(workout_id)).await
    }

    pub async fn set_community_ideal_score(
        &self,
        workout_id: &str,
        payload: &IdealScoreUpsertRequest,
    ) -> Result<(), ApiError> {
        self.put::<Value, _>(&self.endpoints.community_ideal_score(workout_id), payload)
            .await
            .map(drop)
    }

    pub async fn set_gym_ideal_score(
        &self,
        workout_id: &str,
        gym_id: &str,
        payload: &IdealScoreUpsertRequest,
    ) -> Result<(), ApiError> {
        self.put::<Value, _>(&self.endpoints.gym_ideal_score(workout_id, gym_id), payload)
            .await
            .map(drop)
    }

    // -- admin ------------------------------------------------------------------

    pub async fn admin_create_movement(&self, payload: &AdminCreateMovementRequest) -> Result<Movement, ApiError> {
        self.post(&self.endpoints.admin_movements(), payload).await
    }

    pub async fn admin_change_gym(&self, athlete_id: &str, gym_id: &str) -> Result<AdminChangeGymResponse, ApiError> {
        let body = AdminChangeGymRequest {
            gym_id: gym_id.to_string(),
        };
        self.post(&self.endpoints.admin_change_gym(athlete_id), &body).await
    }

    pub async fn admin_recompute_rankings(&self) -> Result<RecomputeRankingsResponse, ApiError> {
        self.post_empty(&self.endpoints.admin_recompute_rankings()).await
    }
}
