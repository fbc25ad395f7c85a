//! Core data models for the scene search API.

pub mod scene;

pub use scene::{GeoPoint, SceneRecord};
