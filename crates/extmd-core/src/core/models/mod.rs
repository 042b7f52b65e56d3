//! # Core Models Module
//!
//! Data structures describing the physical state carried by one trajectory frame.
//!
//! - [`frame`] - A single simulation frame with coordinates, velocities and box vectors

pub mod frame;
