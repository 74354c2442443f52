//! cairn-lib: Core types and logic for cairn
//!
//! This crate turns a declarative dependency recipe into build descriptors:
//! - `Recipe`: the immutable project declaration (`cairn.toml`)
//! - `RequirementSet` / `SettingsContext`: resolver inputs
//! - `Resolver`: computes a conflict-free `DependencyGraph` from a `MetadataSource`
//! - `GeneratorKind`: renders CMake and pkg-config descriptors from the graph
//! - `pipeline`: the end-to-end install flow with structured errors

pub mod consts;
pub mod generate;
pub mod metadata;
pub mod pipeline;
pub mod platform;
pub mod recipe;
pub mod requirements;
pub mod resolve;
pub mod settings;
pub mod util;
