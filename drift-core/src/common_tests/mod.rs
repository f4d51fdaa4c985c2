//! Reusable test drivers, generic over the arena.
//!
//! Downstream arena crates run the same concurrency suites against their own
//! arena implementations.
