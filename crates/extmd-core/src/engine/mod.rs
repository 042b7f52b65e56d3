//! The stateful layer: an external engine, the file layout it owns, and the
//! lazy snapshots it hands out.
//!
//! An [`ExternalEngine`](external::ExternalEngine) owns one frame-store
//! reader behind a shared core; every
//! [`ExternalMdSnapshot`](snapshot::ExternalMdSnapshot) it creates keeps only
//! a weak handle to that core, so snapshots never keep an engine alive.

pub mod config;
pub mod error;
pub mod external;
pub mod ids;
pub mod naming;
pub mod outcome;
pub mod progress;
pub mod snapshot;
pub mod store;
