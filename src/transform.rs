// Rigid motions used to place surfaces in a model
use crate::error::{GeometryError, Result};
use crate::Point;
use nalgebra::{IsometryMatrix3, Matrix3, Point3, Rotation3, Translation3};

/// Largest deviation of `mᵀm` from identity accepted as a rotation matrix.
const ORTHOGONALITY_TOLERANCE: f64 = 1e-9;

/// Rotation followed by a translation: `x ↦ R x + t`.
///
/// ```
/// use quadric_box::{Point, Surface, Transformation};
///
/// let shift = Transformation::from_translation(Point::new(0.0, 0.0, 2.0));
/// let sphere = Surface::sphere_at_origin(1.0, 1, None).transform(&shift);
/// assert_eq!(sphere.value(&Point::new(0.0, 0.0, 2.0)), -1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformation {
    iso: IsometryMatrix3<f64>,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformation {
    pub fn identity() -> Self {
        Transformation {
            iso: IsometryMatrix3::identity(),
        }
    }

    pub fn new(rotation: Rotation3<f64>, translation: Point) -> Self {
        Transformation {
            iso: IsometryMatrix3::from_parts(Translation3::from(translation), rotation),
        }
    }

    pub fn from_translation(translation: Point) -> Self {
        Self::new(Rotation3::identity(), translation)
    }

    /// Rotation given by roll, pitch and yaw (radians), then `translation`.
    pub fn from_euler_angles(roll: f64, pitch: f64, yaw: f64, translation: Point) -> Self {
        Self::new(Rotation3::from_euler_angles(roll, pitch, yaw), translation)
    }

    /// Build from an explicit rotation matrix, which must be proper
    /// orthogonal within a small tolerance.
    pub fn from_matrix(rotation: Matrix3<f64>, translation: Point) -> Result<Self> {
        if rotation.iter().any(|c| !c.is_finite()) || translation.iter().any(|c| !c.is_finite()) {
            return Err(GeometryError::InvalidParameter(
                "transformation entries must be finite".to_string(),
            ));
        }
        let deviation = (rotation.transpose() * rotation - Matrix3::identity()).norm();
        if deviation > ORTHOGONALITY_TOLERANCE || rotation.determinant() <= 0.0 {
            return Err(GeometryError::InvalidParameter(format!(
                "matrix is not a rotation (orthogonality error {:e})",
                deviation
            )));
        }
        Ok(Self::new(Rotation3::from_matrix_unchecked(rotation), translation))
    }

    pub fn rotation(&self) -> &Matrix3<f64> {
        self.iso.rotation.matrix()
    }

    pub fn translation(&self) -> Point {
        self.iso.translation.vector
    }

    pub fn inverse(&self) -> Self {
        Transformation {
            iso: self.iso.inverse(),
        }
    }

    /// `self` followed by `next`.
    pub fn then(&self, next: &Transformation) -> Self {
        Transformation {
            iso: next.iso * self.iso,
        }
    }

    pub fn apply_point(&self, p: &Point) -> Point {
        self.iso.transform_point(&Point3::from(*p)).coords
    }

    /// Rotate a direction; translation does not apply.
    pub fn apply_vector(&self, v: &Point) -> Point {
        self.iso.transform_vector(v)
    }

    /// Map the plane `normal · x + offset = 0` to its image.
    pub fn apply_plane(&self, normal: &Point, offset: f64) -> (Point, f64) {
        let normal = self.apply_vector(normal);
        let offset = offset - normal.dot(&self.translation());
        (normal, offset)
    }
}
