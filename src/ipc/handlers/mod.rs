pub mod analytics;
pub mod core;
pub mod doubts;
pub mod ingest;
pub mod quiz;
