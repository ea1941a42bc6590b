use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Moderate,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Moderate => write!(f, "Moderate"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// A trail as returned by the trail service. Coordinates are optional at the
/// wire level; entities without them never reach the map core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trail {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub length_km: Option<f64>,
    pub elevation_gain_m: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub accessible: bool,
    #[serde(default)]
    pub has_waterfall: bool,
    #[serde(default)]
    pub has_viewpoint: bool,
    #[serde(default)]
    pub avg_rating: f64,
    #[serde(default)]
    pub ratings_count: i64,
}

impl Trail {
    /// Both coordinates, or nothing.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

/// A park from the secondary proximity source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Park {
    pub id: i64,
    pub name: String,
    pub state: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Park {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub trail_id: i64,
    pub user_id: i64,
    pub rating: u8,
    pub body: Option<String>,
}

/// Payload for posting a review. The service enforces 1..=5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// A community feed entry, joined with its author's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub trail_id: Option<i64>,
    pub title: String,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: i64,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub home_state: Option<String>,
    pub home_lat: Option<f64>,
    pub home_lon: Option<f64>,
}

/// PATCH payload for the caller's own profile. Unset fields are omitted so
/// the service only touches what was edited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_lon: Option<f64>,
}

/// A logged hike on a trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub trail_id: i64,
    pub distance_km: f64,
    pub duration_min: Option<f64>,
    pub elevation_gain_m: Option<f64>,
    pub date: NaiveDateTime,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivity {
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_gain_m: Option<f64>,
    /// Defaults to the upload time server-side when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,
}

/// Aggregated hiking stats for the current user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub total_distance_km: f64,
    pub total_activities: i64,
    pub unique_trails: i64,
    pub avg_distance_km: f64,
    pub avg_duration_min: Option<f64>,
    pub last_activity_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineStatus {
    pub ok: bool,
    pub is_offline: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteStatus {
    pub ok: bool,
    pub is_favorite: bool,
    pub message: String,
}

/// Generic acknowledgement envelope for mutations without a richer response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
    pub message: String,
}

/// Bearer token issued by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub display_name: String,
    pub email: String,
    pub password: String,
}
