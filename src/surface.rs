use crate::transform::Transformation;
use crate::Point;
use nalgebra::Matrix3;

/// Boundary modifier attached to a surface card.
///
/// The modifier is carried with the surface for the model driver; it never
/// changes the surface function or its sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Modifier {
    #[default]
    Ordinary,
    /// Mirror boundary (`*` card prefix)
    Reflective,
    /// White boundary (`+` card prefix)
    White,
}

impl Modifier {
    /// Parse a modifier from its card prefix or name, returning None for invalid strings
    pub fn from_str_option(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "ordinary" => Some(Modifier::Ordinary),
            "*" | "reflective" => Some(Modifier::Reflective),
            "+" | "white" => Some(Modifier::White),
            _ => None,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Modifier::Ordinary => "",
            Modifier::Reflective => "*",
            Modifier::White => "+",
        }
    }
}

/// An implicit quadric-family surface.
///
/// Points with a negative surface function lie on the negative side
/// (inside spheres, cylinders and tori; below planes along their normal).
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    pub name: u32,
    pub modifier: Modifier,
    pub kind: SurfaceKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceKind {
    /// `normal · x + offset` with unit `normal`
    Plane { normal: Point, offset: f64 },
    /// `|x - center|² - radius²`
    Sphere { center: Point, radius: f64 },
    /// Infinite circular cylinder through `point` along unit `axis`
    Cylinder { point: Point, axis: Point, radius: f64 },
    /// Cone with apex `apex`, unit `axis` and squared half-angle tangent
    /// `ta`. `sheet` is 0 for both nappes, +1 for the nappe along `axis`
    /// and -1 for the one against it.
    Cone {
        apex: Point,
        axis: Point,
        ta: f64,
        sheet: i8,
    },
    /// Elliptic torus: `a` is the tube semi-axis along `axis`, `b` the one
    /// perpendicular to it, `radius` the distance from the axis to the tube
    /// center. `special_points` exists only when `b > radius`.
    Torus {
        center: Point,
        axis: Point,
        radius: f64,
        a: f64,
        b: f64,
        special_points: Option<[Point; 2]>,
    },
    /// `v · x + xᵀ M x + k` with symmetric `m`
    GeneralQuadric { m: Matrix3<f64>, v: Point, k: f64 },
}

impl Surface {
    /// The normal is normalized and the offset scaled with it, so the
    /// value is the signed distance to the plane. A zero normal is kept as is.
    pub fn new_plane(normal: Point, offset: f64, name: u32, modifier: Option<Modifier>) -> Self {
        let norm = normal.norm();
        let (normal, offset) = if norm > 0.0 {
            (normal / norm, offset / norm)
        } else {
            (normal, offset)
        };
        Surface {
            name,
            modifier: modifier.unwrap_or_default(),
            kind: SurfaceKind::Plane { normal, offset },
        }
    }

    pub fn new_sphere(center: Point, radius: f64, name: u32, modifier: Option<Modifier>) -> Self {
        Surface {
            name,
            modifier: modifier.unwrap_or_default(),
            kind: SurfaceKind::Sphere { center, radius },
        }
    }

    /// The axis is normalized.
    pub fn new_cylinder(
        point: Point,
        axis: Point,
        radius: f64,
        name: u32,
        modifier: Option<Modifier>,
    ) -> Self {
        Surface {
            name,
            modifier: modifier.unwrap_or_default(),
            kind: SurfaceKind::Cylinder {
                point,
                axis: axis.normalize(),
                radius,
            },
        }
    }

    /// The axis is normalized. `ta` is the squared tangent of the half-angle.
    /// Only the sign of `sheet` matters; 0 keeps both nappes.
    pub fn new_cone(
        apex: Point,
        axis: Point,
        ta: f64,
        sheet: i8,
        name: u32,
        modifier: Option<Modifier>,
    ) -> Self {
        Surface {
            name,
            modifier: modifier.unwrap_or_default(),
            kind: SurfaceKind::Cone {
                apex,
                axis: axis.normalize(),
                ta,
                sheet: sheet.signum(),
            },
        }
    }

    /// The axis is normalized. When the perpendicular semi-axis `b` exceeds
    /// `radius` the tube crosses the axis, and the two points where the
    /// surface meets the axis are stored for the classifier.
    pub fn new_torus(
        center: Point,
        axis: Point,
        radius: f64,
        a: f64,
        b: f64,
        name: u32,
        modifier: Option<Modifier>,
    ) -> Self {
        let axis = axis.normalize();
        let special_points = if b > radius {
            let offset = a * (1.0 - (radius / b).powi(2)).sqrt();
            Some([center + axis * offset, center - axis * offset])
        } else {
            None
        };
        Surface {
            name,
            modifier: modifier.unwrap_or_default(),
            kind: SurfaceKind::Torus {
                center,
                axis,
                radius,
                a,
                b,
                special_points,
            },
        }
    }

    /// `m` is symmetrized, so `xᵀ m x` is unchanged and the gradient is `v + 2 m x`.
    pub fn new_quadric(m: Matrix3<f64>, v: Point, k: f64, name: u32, modifier: Option<Modifier>) -> Self {
        Surface {
            name,
            modifier: modifier.unwrap_or_default(),
            kind: SurfaceKind::GeneralQuadric {
                m: (m + m.transpose()) * 0.5,
                v,
                k,
            },
        }
    }

    /// Plane `x = x0`, positive side towards +x
    pub fn x_plane(x0: f64, name: u32, modifier: Option<Modifier>) -> Self {
        Self::new_plane(Point::x(), -x0, name, modifier)
    }

    pub fn y_plane(y0: f64, name: u32, modifier: Option<Modifier>) -> Self {
        Self::new_plane(Point::y(), -y0, name, modifier)
    }

    pub fn z_plane(z0: f64, name: u32, modifier: Option<Modifier>) -> Self {
        Self::new_plane(Point::z(), -z0, name, modifier)
    }

    pub fn sphere_at_origin(radius: f64, name: u32, modifier: Option<Modifier>) -> Self {
        Self::new_sphere(Point::zeros(), radius, name, modifier)
    }

    /// Cylinder parallel to the X axis through `(0, y0, z0)`
    pub fn x_cylinder(y0: f64, z0: f64, radius: f64, name: u32, modifier: Option<Modifier>) -> Self {
        Self::new_cylinder(Point::new(0.0, y0, z0), Point::x(), radius, name, modifier)
    }

    pub fn y_cylinder(x0: f64, z0: f64, radius: f64, name: u32, modifier: Option<Modifier>) -> Self {
        Self::new_cylinder(Point::new(x0, 0.0, z0), Point::y(), radius, name, modifier)
    }

    /// Create a cylinder oriented along the Z axis, centered at (x0, y0)
    pub fn z_cylinder(x0: f64, y0: f64, radius: f64, name: u32, modifier: Option<Modifier>) -> Self {
        Self::new_cylinder(Point::new(x0, y0, 0.0), Point::z(), radius, name, modifier)
    }

    pub fn is_plane(&self) -> bool {
        matches!(self.kind, SurfaceKind::Plane { .. })
    }

    /// Points on the torus axis where the surface is singular, if any.
    pub fn special_points(&self) -> Option<&[Point; 2]> {
        match &self.kind {
            SurfaceKind::Torus { special_points, .. } => special_points.as_ref(),
            _ => None,
        }
    }

    /// Evaluate the surface function at `x`, writing the gradient into `grad`
    /// when one is supplied.
    ///
    /// On a torus axis (`sq = 0`) the radial part of the gradient is not
    /// defined and is left out.
    pub fn eval(&self, x: &Point, grad: Option<&mut Point>) -> f64 {
        match &self.kind {
            SurfaceKind::Plane { normal, offset } => {
                if let Some(g) = grad {
                    g.copy_from(normal);
                }
                normal.dot(x) + offset
            }
            SurfaceKind::Sphere { center, radius } => {
                let delta = x - center;
                if let Some(g) = grad {
                    *g = delta * 2.0;
                }
                delta.dot(&delta) - radius * radius
            }
            SurfaceKind::Cylinder { point, axis, radius } => {
                let a = x - point;
                let an = a.dot(axis);
                if let Some(g) = grad {
                    g.copy_from(&a);
                    g.axpy(-an, axis, 1.0);
                    *g *= 2.0;
                }
                a.dot(&a) - an * an - radius * radius
            }
            SurfaceKind::Cone {
                apex,
                axis,
                ta,
                sheet,
            } => {
                let a = x - apex;
                let an = a.dot(axis);
                // Beyond the apex on the unused side: squared distance to the apex
                if an * f64::from(*sheet) < 0.0 {
                    if let Some(g) = grad {
                        *g = a * 2.0;
                    }
                    return a.dot(&a);
                }
                if let Some(g) = grad {
                    g.copy_from(&a);
                    g.axpy(-an * (1.0 + ta), axis, 1.0);
                    *g *= 2.0;
                }
                a.dot(&a) - an * an * (1.0 + ta)
            }
            SurfaceKind::Torus {
                center,
                axis,
                radius,
                a,
                b,
                ..
            } => {
                let p = x - center;
                let pn = p.dot(axis);
                let pp = p.dot(&p);
                let sq = (pp - pn * pn).max(0.0).sqrt();
                if let Some(g) = grad {
                    g.fill(0.0);
                    if sq > 0.0 {
                        let radial = 2.0 * (sq - radius) / (b * b * sq);
                        g.axpy(radial, &p, 0.0);
                        g.axpy(-radial * pn, axis, 1.0);
                    }
                    g.axpy(2.0 * pn / (a * a), axis, 1.0);
                }
                (pn / a).powi(2) + ((sq - radius) / b).powi(2) - 1.0
            }
            SurfaceKind::GeneralQuadric { m, v, k } => {
                let mx = m * x;
                if let Some(g) = grad {
                    g.copy_from(v);
                    g.axpy(2.0, &mx, 1.0);
                }
                v.dot(x) + x.dot(&mx) + k
            }
        }
    }

    /// Image of this surface under `tr`: the returned surface takes at
    /// `tr.apply_point(x)` the value this one takes at `x`.
    pub fn transform(&self, tr: &Transformation) -> Surface {
        let name = self.name;
        let modifier = Some(self.modifier);
        match &self.kind {
            SurfaceKind::Plane { normal, offset } => {
                let (normal, offset) = tr.apply_plane(normal, *offset);
                Surface::new_plane(normal, offset, name, modifier)
            }
            SurfaceKind::Sphere { center, radius } => {
                Surface::new_sphere(tr.apply_point(center), *radius, name, modifier)
            }
            SurfaceKind::Cylinder { point, axis, radius } => Surface::new_cylinder(
                tr.apply_point(point),
                tr.apply_vector(axis),
                *radius,
                name,
                modifier,
            ),
            SurfaceKind::Cone {
                apex,
                axis,
                ta,
                sheet,
            } => Surface::new_cone(
                tr.apply_point(apex),
                tr.apply_vector(axis),
                *ta,
                *sheet,
                name,
                modifier,
            ),
            SurfaceKind::Torus {
                center,
                axis,
                radius,
                a,
                b,
                ..
            } => Surface::new_torus(
                tr.apply_point(center),
                tr.apply_vector(axis),
                *radius,
                *a,
                *b,
                name,
                modifier,
            ),
            SurfaceKind::GeneralQuadric { m, v, k } => {
                let r = tr.rotation();
                let t = tr.translation();
                let m = r * m * r.transpose();
                let rv = r * v;
                let mt = m * t;
                let v = rv - mt * 2.0;
                let k = k + t.dot(&mt) - rv.dot(&t);
                Surface::new_quadric(m, v, k, name, modifier)
            }
        }
    }

    pub fn value(&self, x: &Point) -> f64 {
        self.eval(x, None)
    }

    pub fn gradient(&self, x: &Point) -> Point {
        let mut g = Point::zeros();
        self.eval(x, Some(&mut g));
        g
    }

    /// Sign of the surface function at each point: +1 or -1, following the
    /// sign bit of the value (so `-0.0` gives -1). NaN values give 0.
    pub fn test_points(&self, points: &[Point]) -> Vec<i32> {
        points.iter().map(|p| sign_of(self.value(p))).collect()
    }
}

/// `copysign(1, value)` as an integer, 0 for NaN.
pub(crate) fn sign_of(value: f64) -> i32 {
    if value.is_nan() {
        0
    } else if value.is_sign_negative() {
        -1
    } else {
        1
    }
}
