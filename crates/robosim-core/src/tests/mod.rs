//! Scenario and determinism tests for the full engine.
//!
//! - `scenarios.rs`: end-to-end behavior of agents, arena and replay log
//! - `determinism.rs`: same seed and inputs produce identical logs
//! - `properties.rs`: movement properties checked with proptest
//! - `helpers.rs`: factory functions shared by the suites

mod determinism;
mod helpers;
