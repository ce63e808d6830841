#![doc = "ci-harvest-core: engine library for ci-harvest."]

//! This crate contains the incremental, checkpointed harvester of CI build
//! metadata: data model, transport and store traits, the per-component
//! logic, and the top-level [`harvest::harvest`] run.
//!
//! The concrete HTTP client lives in the `ci-harvest` binary crate; anything
//! implementing [`contract::CiTransport`] can drive the engine.
//!
//! # Modules
//! - [`project`]: job enumeration and latest-build lookup
//! - [`artifact`]: size and fingerprint resolution per artifact
//! - [`version`]: version label inference
//! - [`fetch`]: one build number to one record (or nothing)
//! - [`schedule`]: bounded concurrent fetch of the unprobed range, merge
//! - [`store`]: JSON state files and the combined export
//! - [`harvest`]: the whole run

pub mod artifact;
pub mod config;
pub mod contract;
pub mod fetch;
pub mod harvest;
pub mod project;
pub mod schedule;
pub mod store;
pub mod version;
