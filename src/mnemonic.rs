// Construction of surfaces from MCNP surface mnemonics
use crate::error::{GeometryError, Result};
use crate::surface::{Modifier, Surface};
use crate::Point;
use nalgebra::Matrix3;

/// Relative resolution below which two axisymmetric points share a height
/// or a radius. Magnitudes under 1 are compared against 1.
const RESOLUTION: f64 = 1e-10;

fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < RESOLUTION * a.abs().max(b.abs()).max(1.0)
}

fn expect_count(kind: &str, params: &[f64], allowed: &[usize]) -> Result<()> {
    if allowed.contains(&params.len()) {
        Ok(())
    } else {
        let expected = allowed
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        Err(GeometryError::WrongParameterCount {
            kind: kind.to_string(),
            expected,
            got: params.len(),
        })
    }
}

/// Unit axis named by the last letter of the mnemonic.
fn axis_of(kind: &str) -> Option<Point> {
    match kind.chars().last()? {
        'X' => Some(Point::x()),
        'Y' => Some(Point::y()),
        'Z' => Some(Point::z()),
        _ => None,
    }
}

fn require_axis(kind: &str) -> Result<Point> {
    axis_of(kind).ok_or_else(|| GeometryError::UnknownSurfaceKind(kind.to_string()))
}

/// Optional trailing cone sheet selector: -1, 0 (both nappes) or +1.
fn sheet_of(kind: &str, params: &[f64], required: usize) -> Result<i8> {
    match params.get(required) {
        None => Ok(0),
        Some(&s) if s == -1.0 || s == 0.0 || s == 1.0 => Ok(s as i8),
        Some(&s) => Err(GeometryError::InvalidParameter(format!(
            "{} sheet must be -1, 0 or 1, got {}",
            kind, s
        ))),
    }
}

/// Point on an axis-parallel line given its two off-axis coordinates.
fn off_axis_point(axis_letter: char, u: f64, v: f64) -> Point {
    match axis_letter {
        'X' => Point::new(0.0, u, v),
        'Y' => Point::new(u, 0.0, v),
        _ => Point::new(u, v, 0.0),
    }
}

impl Surface {
    /// Build a surface from an MCNP mnemonic and its card parameters.
    ///
    /// Supported mnemonics: `P`, `PX`/`PY`/`PZ`, `SO`, `S`, `SX`/`SY`/`SZ`,
    /// `C/X`.., `CX`.., `K/X`.., `KX`.., `TX`.., `GQ`, `SQ` and the
    /// axisymmetric `X`/`Y`/`Z` forms defined by one or two `(h, r)` pairs.
    /// A trailing cone sheet selector keeps only the nappe on that side of
    /// the apex; the axisymmetric cone keeps the nappe holding its points.
    ///
    /// ```
    /// use quadric_box::{Point, Surface};
    ///
    /// let plane = Surface::from_mnemonic("px", &[2.0], 1, None).unwrap();
    /// assert_eq!(plane.value(&Point::new(3.0, 0.0, 0.0)), 1.0);
    /// ```
    pub fn from_mnemonic(
        kind: &str,
        params: &[f64],
        name: u32,
        modifier: Option<Modifier>,
    ) -> Result<Self> {
        let kind = kind.trim().to_uppercase();
        let k = kind.as_str();
        if let Some(bad) = params.iter().find(|p| !p.is_finite()) {
            return Err(GeometryError::InvalidParameter(format!(
                "{} parameter {} is not finite",
                k, bad
            )));
        }

        match k {
            "P" => {
                expect_count(k, params, &[4])?;
                let normal = Point::new(params[0], params[1], params[2]);
                if normal.norm() == 0.0 {
                    return Err(GeometryError::InvalidParameter(
                        "plane normal must not be zero".to_string(),
                    ));
                }
                Ok(Surface::new_plane(normal, -params[3], name, modifier))
            }
            "PX" | "PY" | "PZ" => {
                expect_count(k, params, &[1])?;
                Ok(Surface::new_plane(require_axis(k)?, -params[0], name, modifier))
            }
            "SO" => {
                expect_count(k, params, &[1])?;
                Ok(Surface::new_sphere(Point::zeros(), params[0], name, modifier))
            }
            "S" => {
                expect_count(k, params, &[4])?;
                let center = Point::new(params[0], params[1], params[2]);
                Ok(Surface::new_sphere(center, params[3], name, modifier))
            }
            "SX" | "SY" | "SZ" => {
                expect_count(k, params, &[2])?;
                let center = require_axis(k)? * params[0];
                Ok(Surface::new_sphere(center, params[1], name, modifier))
            }
            "SQ" => {
                expect_count(k, params, &[10])?;
                let (a, b, c, d, e, f, g) = (
                    params[0], params[1], params[2], params[3], params[4], params[5], params[6],
                );
                let (x0, y0, z0) = (params[7], params[8], params[9]);
                let m = Matrix3::from_diagonal(&Point::new(a, b, c));
                let v = Point::new(d - a * x0, e - b * y0, f - c * z0) * 2.0;
                let free = a * x0 * x0 + b * y0 * y0 + c * z0 * z0
                    - 2.0 * (d * x0 + e * y0 + f * z0)
                    + g;
                Ok(Surface::new_quadric(m, v, free, name, modifier))
            }
            "C/X" | "C/Y" | "C/Z" => {
                expect_count(k, params, &[3])?;
                let letter = k.chars().last().unwrap_or('Z');
                let point = off_axis_point(letter, params[0], params[1]);
                Ok(Surface::new_cylinder(point, require_axis(k)?, params[2], name, modifier))
            }
            "CX" | "CY" | "CZ" => {
                expect_count(k, params, &[1])?;
                Ok(Surface::new_cylinder(Point::zeros(), require_axis(k)?, params[0], name, modifier))
            }
            "K/X" | "K/Y" | "K/Z" => {
                expect_count(k, params, &[4, 5])?;
                let apex = Point::new(params[0], params[1], params[2]);
                let sheet = sheet_of(k, params, 4)?;
                Ok(Surface::new_cone(apex, require_axis(k)?, params[3], sheet, name, modifier))
            }
            "KX" | "KY" | "KZ" => {
                expect_count(k, params, &[2, 3])?;
                let axis = require_axis(k)?;
                let sheet = sheet_of(k, params, 2)?;
                Ok(Surface::new_cone(axis * params[0], axis, params[1], sheet, name, modifier))
            }
            "TX" | "TY" | "TZ" => {
                expect_count(k, params, &[6])?;
                let center = Point::new(params[0], params[1], params[2]);
                Ok(Surface::new_torus(
                    center,
                    require_axis(k)?,
                    params[3],
                    params[4],
                    params[5],
                    name,
                    modifier,
                ))
            }
            "GQ" => {
                expect_count(k, params, &[10])?;
                let (a, b, c, d, e, f) = (
                    params[0], params[1], params[2], params[3], params[4], params[5],
                );
                #[rustfmt::skip]
                let m = Matrix3::new(
                    a,       0.5 * d, 0.5 * f,
                    0.5 * d, b,       0.5 * e,
                    0.5 * f, 0.5 * e, c,
                );
                let v = Point::new(params[6], params[7], params[8]);
                Ok(Surface::new_quadric(m, v, params[9], name, modifier))
            }
            "X" | "Y" | "Z" => axisymmetric(k, params, name, modifier),
            _ => Err(GeometryError::UnknownSurfaceKind(k.to_string())),
        }
    }
}

/// Surface of revolution through one or two `(height, radius)` points.
fn axisymmetric(kind: &str, params: &[f64], name: u32, modifier: Option<Modifier>) -> Result<Surface> {
    expect_count(kind, params, &[2, 4])?;
    let axis = require_axis(kind)?;
    if params.len() == 2 {
        return Ok(Surface::new_plane(axis, -params[0], name, modifier));
    }

    let (h1, r1, h2, r2) = (params[0], params[1], params[2], params[3]);
    if nearly_equal(h1, h2) {
        return Ok(Surface::new_plane(axis, -0.5 * (h1 + h2), name, modifier));
    }
    if nearly_equal(r1, r2) {
        let radius = 0.5 * (r1.abs() + r2.abs());
        if nearly_equal(radius, 0.0) {
            return Err(GeometryError::InvalidParameter(
                "both points lie on the axis".to_string(),
            ));
        }
        return Ok(Surface::new_cylinder(Point::zeros(), axis, radius, name, modifier));
    }
    if r1 * r2 < 0.0 {
        return Err(GeometryError::InvalidParameter(
            "points must belong to one sheet of the cone".to_string(),
        ));
    }
    let apex_height = (r1.abs() * h2 - r2.abs() * h1) / (r1.abs() - r2.abs());
    let tangent = ((r1 - r2) / (h1 - h2)).abs();
    // The point farther from the apex fixes the nappe
    let far = if (h1 - apex_height).abs() >= (h2 - apex_height).abs() { h1 } else { h2 };
    let sheet = if far > apex_height { 1 } else { -1 };
    Ok(Surface::new_cone(
        axis * apex_height,
        axis,
        tangent * tangent,
        sheet,
        name,
        modifier,
    ))
}
