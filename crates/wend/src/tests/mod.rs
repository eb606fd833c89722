//! Crate-level integration tests for the walker.
