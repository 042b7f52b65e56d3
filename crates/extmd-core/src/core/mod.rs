//! # Core Module
//!
//! Stateless building blocks shared by the engine layer.
//!
//! - **Frame Representation** ([`models`]) - Positions, velocities and box vectors of one frame
//! - **Trajectory I/O** ([`io`]) - Frame store traits and the GROMACS TRR codec
//! - **Process Management** ([`process`]) - Launching the simulation binary in its own session

pub mod io;
pub mod models;
pub mod process;
