//! Testing utilities for Waybill.
//!
//! Fixtures for memory-backed managers with generated issuer keys, proptest
//! generators for names and payloads, and golden digest vectors.

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::TestFixture;
pub use vectors::{golden_vectors, GoldenVector};
