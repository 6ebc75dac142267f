//! Shared test support

pub mod fixtures;

pub use fixtures::TestFixtures;
