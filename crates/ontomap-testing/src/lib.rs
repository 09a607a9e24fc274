//! Testing utilities for OntoMap
//!
//! This crate provides deterministic fixtures:
//! - A sample Digital Buildings schema (AHU, VAV, FCU)
//! - A stub scoring model driven by a point → probability table
//! - Scenario builders pairing point records with their stub scores
//! - A seeded sample-history generator

pub mod history;
pub mod model;
pub mod scenarios;
pub mod schema;

pub use history::{DataPattern, HistoryGenerator};
pub use model::StubModel;
pub use scenarios::{Scenario, ScenarioBuilder};
pub use schema::sample_schema;
