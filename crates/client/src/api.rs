use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use trailblazer_shared::geo::Coordinates;
use trailblazer_shared::models::{
    Ack, Activity, Credentials, FavoriteStatus, NewActivity, NewPost, NewReview, OfflineStatus,
    Park, Post, Profile, ProfileUpdate, Progress, Registration, Review, Token, Trail,
};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::Session;

/// Error body the service attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Join a base URL and an absolute path, tolerating a trailing slash on the
/// base.
fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Query string for the nearby endpoints: `near=lat,lon&radius=km`.
fn nearby_query(center: Coordinates, radius_km: f64) -> Vec<(&'static str, String)> {
    vec![
        ("near", center.near_param()),
        ("radius", radius_km.to_string()),
    ]
}

/// Timezone-less ISO-8601, the format the service emits and accepts.
fn iso(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Filters for the community feed.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub trail_id: Option<i64>,
    pub author_id: Option<i64>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            trail_id: None,
            author_id: None,
            limit: 50,
            offset: 0,
        }
    }
}

fn post_query(query: &PostQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("limit", query.limit.to_string()),
        ("offset", query.offset.to_string()),
    ];
    if let Some(trail_id) = query.trail_id {
        params.push(("trail_id", trail_id.to_string()));
    }
    if let Some(author_id) = query.author_id {
        params.push(("author_id", author_id.to_string()));
    }
    params
}

/// Filters for the caller's activity history.
#[derive(Debug, Clone, Default)]
pub struct ActivityQuery {
    pub trail_id: Option<i64>,
    pub date_from: Option<NaiveDateTime>,
    pub date_to: Option<NaiveDateTime>,
}

fn activity_query(query: &ActivityQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(trail_id) = query.trail_id {
        params.push(("trail_id", trail_id.to_string()));
    }
    if let Some(from) = &query.date_from {
        params.push(("date_from", iso(from)));
    }
    if let Some(to) = &query.date_to {
        params.push(("date_to", iso(to)));
    }
    params
}

/// Typed client for the trail service.
///
/// Holds one connection pool for the process. Authenticated endpoints send
/// the session's bearer token; without a session the service's 401 comes
/// back as [`ApiError::Api`], nothing is pre-validated client-side.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<Session>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session {
            Some(session) => req.bearer_auth(session.token()),
            None => req,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let req = self.authorize(self.http.get(join_url(&self.base_url, path)).query(query));
        Self::decode(path, req.send().await?).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.authorize(self.http.post(join_url(&self.base_url, path)).json(body));
        Self::decode(path, req.send().await?).await
    }

    /// POST without a body, for toggle-style endpoints.
    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.authorize(self.http.post(join_url(&self.base_url, path)));
        Self::decode(path, req.send().await?).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.authorize(self.http.patch(join_url(&self.base_url, path)).json(body));
        Self::decode(path, req.send().await?).await
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        // Validation failures arrive as structured bodies that don't fit
        // ErrorBody; fall back to the status line.
        let detail = match resp.json::<ErrorBody>().await {
            Ok(body) => body.detail,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        tracing::warn!(path, status = status.as_u16(), %detail, "api request rejected");
        Err(ApiError::Api {
            status: status.as_u16(),
            detail,
        })
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub async fn register(&self, registration: &Registration) -> Result<Token, ApiError> {
        self.post("/auth/register", registration).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Token, ApiError> {
        self.post("/auth/login", credentials).await
    }

    // -----------------------------------------------------------------------
    // Trails
    // -----------------------------------------------------------------------

    /// Trails within `radius_km` of `center`, best-rated first.
    pub async fn trails_nearby(
        &self,
        center: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<Trail>, ApiError> {
        if !center.in_bounds() {
            tracing::warn!(%center, "proximity center outside WGS84 bounds");
        }
        self.get("/trails/", &nearby_query(center, radius_km)).await
    }

    /// Name search (case-insensitive partial match), optionally
    /// distance-sorted around `near`.
    pub async fn search_trails(
        &self,
        q: &str,
        near: Option<Coordinates>,
        limit: u32,
    ) -> Result<Vec<Trail>, ApiError> {
        let mut query = vec![("q", q.to_string()), ("limit", limit.to_string())];
        if let Some(center) = near {
            query.push(("near", center.near_param()));
        }
        self.get("/trails/search", &query).await
    }

    pub async fn trail(&self, trail_id: i64) -> Result<Trail, ApiError> {
        self.get(&format!("/trails/{trail_id}"), &[]).await
    }

    pub async fn trail_reviews(&self, trail_id: i64) -> Result<Vec<Review>, ApiError> {
        self.get(&format!("/trails/{trail_id}/reviews"), &[]).await
    }

    pub async fn add_review(&self, trail_id: i64, review: &NewReview) -> Result<Ack, ApiError> {
        self.post(&format!("/trails/{trail_id}/reviews"), review)
            .await
    }

    // -----------------------------------------------------------------------
    // Parks (secondary proximity source)
    // -----------------------------------------------------------------------

    pub async fn parks_nearby(
        &self,
        center: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<Park>, ApiError> {
        self.get("/parks/", &nearby_query(center, radius_km)).await
    }

    // -----------------------------------------------------------------------
    // Community feed
    // -----------------------------------------------------------------------

    pub async fn posts(&self, query: &PostQuery) -> Result<Vec<Post>, ApiError> {
        self.get("/posts/", &post_query(query)).await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post, ApiError> {
        self.post("/posts/", post).await
    }

    // -----------------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------------

    pub async fn my_profile(&self) -> Result<Profile, ApiError> {
        self.get("/profiles/me", &[]).await
    }

    pub async fn update_my_profile(&self, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        self.patch("/profiles/me", update).await
    }

    pub async fn profile(&self, user_id: i64) -> Result<Profile, ApiError> {
        self.get(&format!("/profiles/{user_id}"), &[]).await
    }

    // -----------------------------------------------------------------------
    // Activities & progress
    // -----------------------------------------------------------------------

    pub async fn log_activity(
        &self,
        trail_id: i64,
        activity: &NewActivity,
    ) -> Result<Activity, ApiError> {
        self.post(&format!("/trails/{trail_id}/activities"), activity)
            .await
    }

    pub async fn my_activities(&self, query: &ActivityQuery) -> Result<Vec<Activity>, ApiError> {
        self.get("/activities/me", &activity_query(query)).await
    }

    pub async fn my_progress(&self) -> Result<Progress, ApiError> {
        self.get("/progress/me", &[]).await
    }

    // -----------------------------------------------------------------------
    // Offline list & favorites
    // -----------------------------------------------------------------------

    /// Toggle a trail on/off the caller's offline list; the response says
    /// which way it went.
    pub async fn toggle_offline(&self, trail_id: i64) -> Result<OfflineStatus, ApiError> {
        self.post_empty(&format!("/offline/trails/{trail_id}"))
            .await
    }

    pub async fn offline_trails(&self) -> Result<Vec<Trail>, ApiError> {
        self.get("/offline/trails", &[]).await
    }

    pub async fn toggle_favorite(&self, trail_id: i64) -> Result<FavoriteStatus, ApiError> {
        self.post_empty(&format!("/trails/{trail_id}/favorite"))
            .await
    }

    pub async fn favorite_trails(&self) -> Result<Vec<Trail>, ApiError> {
        self.get("/me/favorites", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- URL and query builders ---

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:8000", "/trails/"),
            "http://localhost:8000/trails/"
        );
    }

    #[test]
    fn test_join_url_trailing_slash_base() {
        assert_eq!(
            join_url("https://trails.example.com/", "/profiles/me"),
            "https://trails.example.com/profiles/me"
        );
    }

    #[test]
    fn test_nearby_query() {
        let params = nearby_query(Coordinates::new(40.7128, -74.0060), 50.0);
        assert_eq!(params[0], ("near", "40.7128,-74.006".to_string()));
        assert_eq!(params[1], ("radius", "50".to_string()));
    }

    #[test]
    fn test_post_query_defaults() {
        let params = post_query(&PostQuery::default());
        assert_eq!(
            params,
            vec![
                ("limit", "50".to_string()),
                ("offset", "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_post_query_with_filters() {
        let params = post_query(&PostQuery {
            trail_id: Some(7),
            author_id: Some(2),
            limit: 10,
            offset: 20,
        });
        assert!(params.contains(&("trail_id", "7".to_string())));
        assert!(params.contains(&("author_id", "2".to_string())));
        assert!(params.contains(&("limit", "10".to_string())));
        assert!(params.contains(&("offset", "20".to_string())));
    }

    #[test]
    fn test_activity_query_empty() {
        assert!(activity_query(&ActivityQuery::default()).is_empty());
    }

    #[test]
    fn test_activity_query_date_range() {
        let from = NaiveDateTime::parse_from_str("2024-05-01T00:00:00", "%Y-%m-%dT%H:%M:%S")
            .unwrap();
        let to = NaiveDateTime::parse_from_str("2024-05-31T23:59:59", "%Y-%m-%dT%H:%M:%S")
            .unwrap();
        let params = activity_query(&ActivityQuery {
            trail_id: None,
            date_from: Some(from),
            date_to: Some(to),
        });
        assert_eq!(
            params,
            vec![
                ("date_from", "2024-05-01T00:00:00".to_string()),
                ("date_to", "2024-05-31T23:59:59".to_string()),
            ]
        );
    }

    // --- Error body ---

    #[test]
    fn test_error_body_deserializes() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Trail not found"}"#).unwrap();
        assert_eq!(body.detail, "Trail not found");
    }

    #[test]
    fn test_error_body_rejects_validation_shape() {
        // FastAPI 422s carry a list of objects under "detail"; those fall
        // back to the status line instead.
        let parsed = serde_json::from_str::<ErrorBody>(
            r#"{"detail":[{"loc":["query","near"],"msg":"invalid"}]}"#,
        );
        assert!(parsed.is_err());
    }

    // --- Response fixtures ---

    #[test]
    fn test_trail_list_fixture_deserializes() {
        let json = r#"[{"id":1,"name":"Forest Loop","difficulty":"easy","length_km":4.2,"elevation_gain_m":null,"lat":40.7,"lon":-74.0,"accessible":false,"has_waterfall":false,"has_viewpoint":true,"avg_rating":4.1,"ratings_count":3}]"#;
        let trails: Vec<Trail> = serde_json::from_str(json).unwrap();
        assert_eq!(trails.len(), 1);
        assert_eq!(trails[0].name, "Forest Loop");
    }

    #[test]
    fn test_park_list_fixture_deserializes() {
        let json = r#"[{"id":9,"name":"Gateway NRA","state":"NY","lat":40.6,"lon":-73.8}]"#;
        let parks: Vec<Park> = serde_json::from_str(json).unwrap();
        assert_eq!(parks[0].name, "Gateway NRA");
        assert!(parks[0].coordinates().is_some());
    }

    // --- Client construction ---

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = ApiClient::new(&ClientConfig::new("http://localhost:8000/")).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_client_session_attach() {
        let client = ApiClient::new(&ClientConfig::default())
            .unwrap()
            .with_session(Session::new("tok"));
        assert_eq!(client.session().unwrap().token(), "tok");
    }
}
