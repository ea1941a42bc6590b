//! The map core: proximity loading with local filtering, and marker-to-id
//! correlation. Rendering is an external sink (see `MarkerTable::rebuild`).

pub mod controller;
pub mod markers;
pub mod source;
