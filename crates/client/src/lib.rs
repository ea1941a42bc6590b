//! Client core for the Trailblazer trail-discovery service.
//!
//! The UI shell (screens, navigation, map rendering) lives elsewhere; this
//! crate is everything underneath it: a typed API client over the trail
//! service plus the proximity map core (the view-state controller and the
//! marker correlation table).

pub mod api;
pub mod config;
pub mod error;
pub mod map;
pub mod session;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use map::controller::{ProximityController, ProximityQuery, ViewState};
pub use map::markers::MarkerTable;
pub use map::source::{ApiPointSource, Point, PointSource};
pub use session::Session;
