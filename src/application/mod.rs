//! Application layer: entity reads, profile resolution, dashboard
//! aggregation, and the client façade binding them to the cache.

pub mod client;
pub mod content;
pub mod dashboard;
pub mod profiles;
