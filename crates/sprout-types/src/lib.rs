//! Shared domain types for the Sprout skill-genome engine.
//!
//! This crate contains the data shapes consumed by the engine: the genome
//! document (milestone nodes, progression edges, gates), activities with
//! their target links, and per-learner facts (achievements, skill states).
//!
//! Zero engine logic and zero I/O -- only serde, chrono, uuid, thiserror.
//! The serde derives are the external interface: collaborators that load
//! genome/activity JSON deserialize straight into these types.

pub mod activity;
pub mod error;
pub mod genome;
pub mod learner;
