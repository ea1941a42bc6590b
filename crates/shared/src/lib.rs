pub mod geo;
pub mod models;

pub use geo::Coordinates;
