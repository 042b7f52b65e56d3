//! # extmd Core Library
//!
//! Drives an external molecular-dynamics program (GROMACS) as a coprocess and
//! exposes the frames it writes as lightweight, lazily loaded snapshots.
//!
//! ## Architectural Philosophy
//!
//! The filesystem is the only synchronization medium between the simulation
//! binary and this library. The coprocess appends frames to a trajectory
//! segment file while the caller polls that same file; every poll resolves to
//! one of three outcomes (pending, corrupt, ready), which is what lets a
//! consumer read a growing file without any lock.
//!
//! - **[`core`]: The Foundation.** Stateless pieces: the [`Frame`](core::models::frame::Frame)
//!   model, the TRR frame store adapter, and the process launcher.
//!
//! - **[`engine`]: The Logic Core.** The stateful [`ExternalEngine`](engine::external::ExternalEngine),
//!   its file-naming policy, the single-slot frame store cache, and
//!   [`ExternalMdSnapshot`](engine::snapshot::ExternalMdSnapshot).
//!
//! - **[`workflows`]: The Public API.** A reference polling loop that runs one
//!   simulation segment until a stop condition accepts a frame.

pub mod core;
pub mod engine;
pub mod workflows;
