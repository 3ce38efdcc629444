//! Crate-level scenario tests.
//!
//! - `determinism.rs`: same seed and inputs give the same world
//! - `integration.rs`: multi-tick scenarios across physics, behavior and perception
//! - `properties.rs`: randomized checks of index, collision and damping invariants
//! - `helpers.rs`: fixtures shared with the per-module unit tests

mod determinism;
pub mod helpers;
mod integration;
