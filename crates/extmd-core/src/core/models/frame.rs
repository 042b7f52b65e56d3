use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum FrameError {
    #[error("Velocity count {velocities} does not match atom count {atoms}")]
    VelocityCountMismatch { atoms: usize, velocities: usize },
}

/// The physical state of the system at one point of a trajectory.
///
/// Values are kept in single precision, which is what the trajectory files
/// store, so a frame written and read back compares equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Atomic positions, one point per atom.
    pub coordinates: Vec<Point3<f32>>,
    /// Atomic velocities. Empty when the source carried no velocity block.
    pub velocities: Vec<Vector3<f32>>,
    /// Periodic box; each row is one box vector.
    pub box_vectors: Matrix3<f32>,
}

impl Frame {
    pub fn new(
        coordinates: Vec<Point3<f32>>,
        velocities: Vec<Vector3<f32>>,
        box_vectors: Matrix3<f32>,
    ) -> Self {
        Self {
            coordinates,
            velocities,
            box_vectors,
        }
    }

    /// Creates a frame of `n_atoms` atoms at the origin, at rest, in a zero box.
    pub fn zeros(n_atoms: usize) -> Self {
        Self {
            coordinates: vec![Point3::origin(); n_atoms],
            velocities: vec![Vector3::zeros(); n_atoms],
            box_vectors: Matrix3::zeros(),
        }
    }

    #[inline]
    pub fn n_atoms(&self) -> usize {
        self.coordinates.len()
    }

    #[inline]
    pub fn has_velocities(&self) -> bool {
        !self.velocities.is_empty()
    }

    /// Returns the `i`-th box vector (`0..3`).
    pub fn box_vector(&self, i: usize) -> Vector3<f32> {
        self.box_vectors.row(i).transpose()
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        if self.has_velocities() && self.velocities.len() != self.coordinates.len() {
            return Err(FrameError::VelocityCountMismatch {
                atoms: self.coordinates.len(),
                velocities: self.velocities.len(),
            });
        }
        Ok(())
    }
}
