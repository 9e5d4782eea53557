//! Side-of-surface classification of oriented boxes.
//!
//! A box is first judged by the signs of the surface function at its eight
//! corners. Disagreeing corners settle the question at once, and so does any
//! plane. For curved surfaces agreeing corners are not enough, since an
//! extremum may hide inside the box: a bounded local search is started from
//! every corner looking for a point of the opposite sign.

use crate::bounding_box::BoundingBox;
use crate::config::Config;
use crate::optimize::{Goal, LocalOptimizer, ProjectedGradient};
use crate::surface::Surface;
use crate::Point;
use rayon::prelude::*;

/// Position of a box relative to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    /// The surface function is negative throughout the box
    Negative = -1,
    /// The surface passes through the box
    Crossing = 0,
    /// The surface function is positive throughout the box
    Positive = 1,
}

impl Sense {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    fn from_sign(sign: i32) -> Self {
        match sign {
            s if s < 0 => Sense::Negative,
            s if s > 0 => Sense::Positive,
            _ => Sense::Crossing,
        }
    }
}

impl From<Sense> for i32 {
    fn from(sense: Sense) -> i32 {
        sense.as_i32()
    }
}

/// Box classifier parameterised by the local search it uses for curved
/// surfaces.
#[derive(Debug, Clone)]
pub struct Classifier<O: LocalOptimizer = ProjectedGradient> {
    config: Config,
    optimizer: O,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(Config::default())
    }
}

impl Classifier {
    pub fn new(config: Config) -> Self {
        Classifier {
            config,
            optimizer: ProjectedGradient::default(),
        }
    }
}

impl<O: LocalOptimizer> Classifier<O> {
    pub fn with_optimizer(config: Config, optimizer: O) -> Self {
        Classifier { config, optimizer }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sign of a corner value: 0 when it is within the sign tolerance of the
    /// surface.
    fn corner_sign(&self, value: f64) -> i32 {
        if value.abs() <= self.config.sign_tolerance {
            0
        } else if value > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Classify `bbox` against `surface`.
    ///
    /// Corners lying on the surface (within `sign_tolerance`) touch it
    /// without deciding the side. When the local search cannot finish within
    /// its budget, or the surface function is not finite, the box is reported
    /// as `Crossing`.
    pub fn classify(&self, surface: &Surface, bbox: &BoundingBox) -> Sense {
        let mut mins = 1;
        let mut maxs = -1;
        for corner in bbox.corners.iter() {
            let value = surface.value(corner);
            if value.is_nan() {
                log::debug!("surface {} is not finite at a corner of box {}", surface.name, bbox.subdiv);
                return Sense::Crossing;
            }
            let s = self.corner_sign(value);
            mins = mins.min(s);
            maxs = maxs.max(s);
        }
        log::trace!(
            "surface {} box {}: corner signs span [{}, {}]",
            surface.name,
            bbox.subdiv,
            mins,
            maxs
        );

        if mins < 0 && maxs > 0 {
            return Sense::Crossing;
        }
        // Touching corners take the side of the others
        let sign = if maxs > 0 { maxs } else { mins };
        if sign == 0 {
            return Sense::Crossing;
        }
        if surface.is_plane() {
            return Sense::from_sign(sign);
        }

        if let Some(points) = surface.special_points() {
            if bbox.test_points(points).iter().any(|&inside| inside) {
                log::debug!(
                    "surface {}: torus axis point inside box {}",
                    surface.name,
                    bbox.subdiv
                );
                return Sense::Crossing;
            }
        }

        let goal = if sign > 0 { Goal::Minimize } else { Goal::Maximize };
        let frame = bbox.frame();
        for corner in bbox.corners.iter() {
            let objective = |t: &Point, grad: Option<&mut Point>| {
                let x = bbox.to_global(t);
                match grad {
                    Some(g) => {
                        let mut gx = Point::zeros();
                        let value = surface.eval(&x, Some(&mut gx));
                        *g = frame * gx;
                        value
                    }
                    None => surface.eval(&x, None),
                }
            };
            let start = bbox.to_local(corner);
            let outcome = self.optimizer.optimize(
                objective,
                goal,
                &bbox.lb,
                &bbox.ub,
                &start,
                &self.config,
            );
            if f64::from(sign) * outcome.value < 0.0 {
                log::trace!(
                    "surface {} box {}: opposite sign {} found after {} evaluations",
                    surface.name,
                    bbox.subdiv,
                    outcome.value,
                    outcome.evaluations
                );
                return Sense::Crossing;
            }
            if !outcome.status.is_conclusive() {
                log::debug!(
                    "surface {} box {}: local search ended with {:?}, assuming crossing",
                    surface.name,
                    bbox.subdiv,
                    outcome.status
                );
                return Sense::Crossing;
            }
        }
        Sense::from_sign(sign)
    }
}

impl<O: LocalOptimizer + Sync> Classifier<O> {
    /// Classify many boxes against one surface in parallel. Results follow
    /// the order of `boxes`.
    pub fn test_boxes(&self, surface: &Surface, boxes: &[BoundingBox]) -> Vec<Sense> {
        boxes
            .par_iter()
            .map(|bbox| self.classify(surface, bbox))
            .collect()
    }

    /// Classify one box against many surfaces in parallel. Results follow
    /// the order of `surfaces`.
    pub fn classify_surfaces(&self, surfaces: &[Surface], bbox: &BoundingBox) -> Vec<Sense> {
        surfaces
            .par_iter()
            .map(|surface| self.classify(surface, bbox))
            .collect()
    }
}

impl Surface {
    /// Classify a box with the default classifier.
    pub fn test_box(&self, bbox: &BoundingBox) -> Sense {
        Classifier::<ProjectedGradient>::default().classify(self, bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::{OptimizeOutcome, OptimizeStatus};
    use crate::NDIM;

    fn cube(half: f64) -> BoundingBox {
        BoundingBox::from_bounds([-half, -half, -half], [half, half, half]).unwrap()
    }

    #[test]
    fn test_plane_outside_cube() {
        let plane = Surface::x_plane(2.0, 1, None);
        assert_eq!(plane.test_box(&cube(1.0)), Sense::Negative);
        let plane = Surface::x_plane(-2.0, 1, None);
        assert_eq!(plane.test_box(&cube(1.0)), Sense::Positive);
    }

    #[test]
    fn test_plane_through_cube() {
        let plane = Surface::new_plane(Point::new(1.0, 1.0, 1.0), -0.5, 1, None);
        assert_eq!(plane.test_box(&cube(1.0)), Sense::Crossing);
    }

    #[test]
    fn test_plane_on_face_takes_other_side() {
        let plane = Surface::x_plane(1.0, 1, None);
        assert_eq!(plane.test_box(&cube(1.0)), Sense::Negative);
    }

    #[test]
    fn test_small_sphere_inside_cube() {
        let sphere = Surface::sphere_at_origin(0.5, 1, None);
        assert_eq!(sphere.test_box(&cube(1.0)), Sense::Crossing);
    }

    #[test]
    fn test_cube_inside_large_sphere() {
        let sphere = Surface::sphere_at_origin(10.0, 1, None);
        assert_eq!(sphere.test_box(&cube(1.0)), Sense::Negative);
    }

    #[test]
    fn test_sphere_away_from_cube() {
        let sphere = Surface::new_sphere(Point::new(5.0, 0.0, 0.0), 1.0, 1, None);
        assert_eq!(sphere.test_box(&cube(1.0)), Sense::Positive);
    }

    #[test]
    fn test_sphere_bulging_into_face() {
        // All corners are outside, but the sphere reaches the middle of the x = 1 face
        let sphere = Surface::new_sphere(Point::new(2.0, 0.0, 0.0), 1.2, 1, None);
        let bbox = cube(1.0);
        assert!(bbox.corners.iter().all(|c| sphere.value(c) > 0.0));
        assert_eq!(sphere.test_box(&bbox), Sense::Crossing);
    }

    #[test]
    fn test_cylinder_beside_box() {
        let cylinder = Surface::z_cylinder(0.0, 0.0, 0.5, 1, None);
        let bbox = BoundingBox::from_bounds([1.0, 1.0, -1.0], [2.0, 2.0, 1.0]).unwrap();
        assert_eq!(cylinder.test_box(&bbox), Sense::Positive);
    }

    #[test]
    fn test_cylinder_through_box() {
        let cylinder = Surface::z_cylinder(0.0, 0.0, 0.5, 1, None);
        assert_eq!(cylinder.test_box(&cube(1.0)), Sense::Crossing);
    }

    #[test]
    fn test_cone_apex_inside_box() {
        // The apex is the only point of the cone in a box small enough to
        // keep every corner on the outer side
        let cone = Surface::new_cone(Point::zeros(), Point::z(), 0.01, 0, 1, None);
        let bbox = BoundingBox::from_bounds([-1.0, -1.0, -0.5], [1.0, 1.0, 0.5]).unwrap();
        assert!(bbox.corners.iter().all(|c| cone.value(c) > 0.0));
        assert_eq!(cone.test_box(&bbox), Sense::Crossing);
    }

    #[test]
    fn test_cone_unused_nappe() {
        let bbox = BoundingBox::from_bounds([-0.2, -0.2, -3.0], [0.2, 0.2, -2.0]).unwrap();
        let both = Surface::new_cone(Point::zeros(), Point::z(), 1.0, 0, 1, None);
        let upper = Surface::new_cone(Point::zeros(), Point::z(), 1.0, 1, 2, None);
        let lower = Surface::new_cone(Point::zeros(), Point::z(), 1.0, -1, 3, None);
        assert_eq!(both.test_box(&bbox), Sense::Negative);
        assert_eq!(upper.test_box(&bbox), Sense::Positive);
        assert_eq!(lower.test_box(&bbox), Sense::Negative);
    }

    #[test]
    fn test_torus_special_point_in_box() {
        // b > radius, so the tube crosses the axis at z = ±a·sqrt(1 - (R/b)²)
        let torus = Surface::new_torus(Point::zeros(), Point::z(), 0.5, 1.0, 1.0, 1, None);
        let points = *torus.special_points().unwrap();
        let z = points[0][2].abs();
        let bbox = BoundingBox::from_bounds([-1.0, -1.0, z - 0.1], [1.0, 1.0, z + 0.1]).unwrap();
        assert!(bbox.corners.iter().all(|c| torus.value(c) > 0.0));
        assert_eq!(torus.test_box(&bbox), Sense::Crossing);
    }

    #[test]
    fn test_box_inside_torus_tube() {
        let torus = Surface::new_torus(Point::zeros(), Point::z(), 3.0, 1.0, 1.0, 1, None);
        let bbox = BoundingBox::from_bounds([2.8, -0.2, -0.2], [3.2, 0.2, 0.2]).unwrap();
        assert_eq!(torus.test_box(&bbox), Sense::Negative);
    }

    #[test]
    fn test_box_in_torus_hole() {
        let torus = Surface::new_torus(Point::zeros(), Point::z(), 3.0, 1.0, 1.0, 1, None);
        let bbox = BoundingBox::from_bounds([-0.5, -0.5, -0.5], [0.5, 0.5, 0.5]).unwrap();
        assert_eq!(torus.test_box(&bbox), Sense::Positive);
    }

    #[test]
    fn test_general_quadric_ellipsoid() {
        // x² + 4y² + 9z² - 1
        let m = nalgebra::Matrix3::from_diagonal(&Point::new(1.0, 4.0, 9.0));
        let ellipsoid = Surface::new_quadric(m, Point::zeros(), -1.0, 1, None);
        assert_eq!(ellipsoid.test_box(&cube(1.0)), Sense::Crossing);
        assert_eq!(ellipsoid.test_box(&cube(0.1)), Sense::Negative);
        let far = BoundingBox::from_bounds([2.0, 2.0, 2.0], [3.0, 3.0, 3.0]).unwrap();
        assert_eq!(ellipsoid.test_box(&far), Sense::Positive);
    }

    #[test]
    fn test_rotated_box() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let bbox = BoundingBox::new(
            Point::new(0.0, 0.0, 0.0),
            Point::new(s, s, 0.0),
            Point::new(-s, s, 0.0),
            Point::z(),
            2.0,
            2.0,
            2.0,
        )
        .unwrap();
        // The rotated cube reaches x = sqrt(2) along its diagonal
        assert_eq!(Surface::x_plane(1.3, 1, None).test_box(&bbox), Sense::Crossing);
        assert_eq!(Surface::x_plane(1.5, 1, None).test_box(&bbox), Sense::Negative);
        assert_eq!(Surface::sphere_at_origin(1.0, 1, None).test_box(&bbox), Sense::Crossing);
    }

    #[test]
    fn test_sign_tolerance_touching_corner() {
        let sphere = Surface::sphere_at_origin(3.0_f64.sqrt(), 1, None);
        let config = Config::new().with_sign_tolerance(1e-9);
        let classifier = Classifier::new(config);
        // Every corner lies on the sphere, leaving no side to vote for
        assert_eq!(classifier.classify(&sphere, &cube(1.0)), Sense::Crossing);
    }

    #[test]
    fn test_exhausted_budget_is_conservative() {
        let cylinder = Surface::z_cylinder(0.0, 0.0, 0.5, 1, None);
        let bbox = BoundingBox::from_bounds([1.0, 1.0, -1.0], [2.0, 2.0, 1.0]).unwrap();
        let classifier = Classifier::new(Config::new().with_max_evaluations(1));
        assert_eq!(classifier.classify(&cylinder, &bbox), Sense::Crossing);
    }

    struct Stubborn(OptimizeStatus);

    impl LocalOptimizer for Stubborn {
        fn optimize<F>(
            &self,
            mut objective: F,
            _goal: Goal,
            _lb: &[f64; NDIM],
            _ub: &[f64; NDIM],
            start: &Point,
            _config: &Config,
        ) -> OptimizeOutcome
        where
            F: FnMut(&Point, Option<&mut Point>) -> f64,
        {
            OptimizeOutcome {
                x: *start,
                value: objective(start, None),
                evaluations: 1,
                status: self.0,
            }
        }
    }

    #[test]
    fn test_custom_optimizer() {
        let sphere = Surface::sphere_at_origin(10.0, 1, None);
        let trusting = Classifier::with_optimizer(Config::new(), Stubborn(OptimizeStatus::Converged));
        assert_eq!(trusting.classify(&sphere, &cube(1.0)), Sense::Negative);
        let failing = Classifier::with_optimizer(Config::new(), Stubborn(OptimizeStatus::Failed));
        assert_eq!(failing.classify(&sphere, &cube(1.0)), Sense::Crossing);
        // Planes never reach the optimizer
        assert_eq!(failing.classify(&Surface::x_plane(2.0, 2, None), &cube(1.0)), Sense::Negative);
    }

    #[test]
    fn test_parallel_batches_keep_order() {
        let sphere = Surface::sphere_at_origin(2.0, 1, None);
        let boxes: Vec<BoundingBox> = (0..8)
            .map(|i| {
                let x = i as f64;
                BoundingBox::from_bounds([x - 0.25, -0.25, -0.25], [x + 0.25, 0.25, 0.25]).unwrap()
            })
            .collect();
        let classifier: Classifier = Classifier::default();
        let senses = classifier.test_boxes(&sphere, &boxes);
        let serial: Vec<Sense> = boxes.iter().map(|b| classifier.classify(&sphere, b)).collect();
        assert_eq!(senses, serial);
        assert_eq!(senses[0], Sense::Negative);
        assert_eq!(senses[2], Sense::Crossing);
        assert_eq!(senses[7], Sense::Positive);

        let surfaces = vec![
            Surface::x_plane(2.0, 1, None),
            Surface::sphere_at_origin(0.5, 2, None),
            Surface::sphere_at_origin(10.0, 3, None),
        ];
        let senses = classifier.classify_surfaces(&surfaces, &cube(1.0));
        assert_eq!(senses, vec![Sense::Negative, Sense::Crossing, Sense::Negative]);
    }

    #[test]
    fn test_sense_as_i32() {
        assert_eq!(Sense::Negative.as_i32(), -1);
        assert_eq!(Sense::Crossing.as_i32(), 0);
        assert_eq!(i32::from(Sense::Positive), 1);
    }
}
