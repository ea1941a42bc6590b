use std::sync::Arc;

use async_trait::async_trait;

use trailblazer_shared::geo::Coordinates;
use trailblazer_shared::models::{Park, Trail};

use crate::api::ApiClient;
use crate::error::ApiError;

/// A renderable proximity result. Unlike the wire types, coordinates are
/// always present; entities without them are dropped before this point.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Two ranked proximity providers over the same center/radius. `secondary`
/// is a lower-resolution backstop consulted only when `primary` yields
/// nothing usable.
#[async_trait]
pub trait PointSource: Send + Sync {
    async fn primary(&self, center: Coordinates, radius_km: f64) -> Result<Vec<Point>, ApiError>;

    async fn secondary(&self, center: Coordinates, radius_km: f64) -> Result<Vec<Point>, ApiError>;
}

/// Trail-service adapter: trails are the primary source, parks the
/// backstop for areas where trail coverage is sparse.
pub struct ApiPointSource {
    api: Arc<ApiClient>,
}

impl ApiPointSource {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PointSource for ApiPointSource {
    async fn primary(&self, center: Coordinates, radius_km: f64) -> Result<Vec<Point>, ApiError> {
        Ok(trail_points(self.api.trails_nearby(center, radius_km).await?))
    }

    async fn secondary(
        &self,
        center: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<Point>, ApiError> {
        Ok(park_points(self.api.parks_nearby(center, radius_km).await?))
    }
}

fn trail_points(trails: Vec<Trail>) -> Vec<Point> {
    trails
        .into_iter()
        .filter_map(|trail| {
            let coords = trail.coordinates()?;
            Some(Point {
                id: trail.id.to_string(),
                name: trail.name,
                lat: coords.lat,
                lng: coords.lon,
            })
        })
        .collect()
}

fn park_points(parks: Vec<Park>) -> Vec<Point> {
    parks
        .into_iter()
        .filter_map(|park| {
            let coords = park.coordinates()?;
            Some(Point {
                id: park.id.to_string(),
                name: park.name,
                lat: coords.lat,
                lng: coords.lon,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail(id: i64, name: &str, lat: Option<f64>, lon: Option<f64>) -> Trail {
        Trail {
            id,
            name: name.to_string(),
            difficulty: Default::default(),
            length_km: None,
            elevation_gain_m: None,
            lat,
            lon,
            accessible: false,
            has_waterfall: false,
            has_viewpoint: false,
            avg_rating: 0.0,
            ratings_count: 0,
        }
    }

    #[test]
    fn test_trail_points_drop_missing_coordinates() {
        let points = trail_points(vec![
            trail(1, "Forest Loop", Some(40.7), Some(-74.0)),
            trail(2, "Unmapped Spur", None, None),
            trail(3, "Half Mapped", Some(40.8), None),
        ]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, "1");
        assert_eq!(points[0].name, "Forest Loop");
        assert!((points[0].lng + 74.0).abs() < 1e-9);
    }

    #[test]
    fn test_park_points_drop_missing_coordinates() {
        let parks = vec![
            Park {
                id: 10,
                name: "Liberty State Park".to_string(),
                state: Some("NJ".to_string()),
                lat: Some(40.7046),
                lon: Some(-74.0523),
            },
            Park {
                id: 11,
                name: "Unlocated Park".to_string(),
                state: None,
                lat: None,
                lon: None,
            },
        ];
        let points = park_points(parks);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, "10");
    }

    #[test]
    fn test_point_ids_are_stringly() {
        let points = trail_points(vec![trail(42, "Ridge Walk", Some(41.0), Some(-74.2))]);
        assert_eq!(points[0].id, "42");
    }
}
