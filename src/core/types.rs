//! Fixed-size vector and matrix aliases used throughout the filter

use nalgebra::{SMatrix, SVector};

use super::constants::{NUM_MEASUREMENT_DOF, NUM_STATE_DOF};

/// 12-dimensional state: [position, orientation, position rate, orientation rate]
pub type StateVector = SVector<f64, NUM_STATE_DOF>;
/// 6-dimensional pose: [x, y, z, yaw, pitch, roll]
pub type PoseVector = SVector<f64, NUM_MEASUREMENT_DOF>;

pub type StateMatrix = SMatrix<f64, NUM_STATE_DOF, NUM_STATE_DOF>;
pub type MeasureMatrix = SMatrix<f64, NUM_MEASUREMENT_DOF, NUM_MEASUREMENT_DOF>;
pub type StateToMeasureMatrix = SMatrix<f64, NUM_MEASUREMENT_DOF, NUM_STATE_DOF>;
pub type MeasureToStateMatrix = SMatrix<f64, NUM_STATE_DOF, NUM_MEASUREMENT_DOF>;

/// Pose in the host's raw layout
pub type PoseArray = [f64; NUM_MEASUREMENT_DOF];

/// Which block of the pose an axis index belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    Position,
    Rotation,
}

impl AxisKind {
    /// Classify a pose axis index (0..6)
    pub fn of(axis: usize) -> Self {
        if axis < super::constants::NUM_POSITION_AXES {
            AxisKind::Position
        } else {
            AxisKind::Rotation
        }
    }
}

/// True when every component is finite
pub fn pose_is_finite(pose: &PoseVector) -> bool {
    pose.iter().all(|v| v.is_finite())
}
