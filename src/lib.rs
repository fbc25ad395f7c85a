//! Landsat scene metadata search API backed by Elasticsearch.
//!
//! This library provides the query translation and geospatial containment
//! pipeline used by the `api` binary.

pub mod config;
pub mod elasticsearch;
pub mod error;
pub mod footprint;
pub mod models;
pub mod search;

pub use config::Config;
pub use error::ApiError;
pub use models::{GeoPoint, SceneRecord};
