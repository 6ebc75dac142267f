//! Core matching and migration logic

pub mod compose;
pub mod engine;
pub mod manifest;
pub mod matcher;
pub mod review;
pub mod units;

pub use engine::MigrationEngine;
pub use matcher::VolumeMatcher;
