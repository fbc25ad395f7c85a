//! Elasticsearch client and operations.

mod client;

pub use client::EsClient;
