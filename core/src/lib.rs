//! fogweave-core — compiles a zone-to-zone traversal graph into script
//! and scene patches for a proprietary bytecode format.
//!
//! Every graph edge becomes a working teleport trigger; every trigger
//! reports a disambiguated tracking flag; enemy actors are re-scaled to
//! their graph-assigned difficulty tier. Deterministic, single-pass,
//! fail-fast: a build fully succeeds or fully fails.
//!
//! The external build driver owns file handles and container packing;
//! this crate only ever sees in-memory documents keyed by name.

pub mod alloc;
pub mod build;
pub mod codec;
pub mod compiler;
pub mod error;
pub mod flags;
pub mod gates;
pub mod model;
pub mod scaling;
pub mod scene;
pub mod script;
pub mod store;
pub mod templates;
pub mod types;
