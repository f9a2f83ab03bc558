//! Property-based tests over random operation sequences.

pub mod strategies;
