use itertools::iproduct;
use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

/// Smallest accepted value of `1 - cos²α - cos²β - cos²γ + 2 cosα cosβ cosγ`,
/// the squared volume of a cell with unit edges.
const MIN_UNIT_VOLUME_SQUARED: f64 = 1e-12;

/// Represents errors raised when cell parameters cannot describe a lattice.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LatticeError {
    /// A cell edge length is zero, negative or not a finite number.
    #[error("Cell length '{name}' must be positive and finite, got {value}")]
    InvalidLength { name: &'static str, value: f64 },
    /// A cell angle lies outside the open interval (0°, 180°).
    #[error("Cell angle '{name}' must lie strictly between 0 and 180 degrees, got {value}")]
    InvalidAngle { name: &'static str, value: f64 },
    /// The cell parameters are individually valid but span (almost) no volume.
    #[error("Cell parameters describe a degenerate cell with volume {volume}")]
    DegenerateVolume { volume: f64 },
}

/// The six cell parameters: edge lengths in Angstroms and angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// A crystal lattice: the coordinate system in which fractional coordinates live.
///
/// The lattice keeps the metric tensor `G` (pairwise dot products of the basis vectors)
/// and the Cartesian basis matrix `B` whose columns are the lattice vectors, so that
/// `cartesian = B · fractional`. Every tolerance-based distance comparison in the crate
/// goes through [`Lattice::distance`] or [`Lattice::minimum_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    parameters: LatticeParameters,
    metric: Matrix3<f64>,
    base: Matrix3<f64>,
    inverse_base: Matrix3<f64>,
    reciprocal_lengths: Vector3<f64>,
}

/// Cosine of an angle in degrees, exact for the multiples of 30° and 90° that dominate
/// crystallographic cells.
pub fn cosd(degrees: f64) -> f64 {
    let reduced = degrees.rem_euclid(360.0);
    match reduced {
        x if x == 0.0 => 1.0,
        x if x == 60.0 || x == 300.0 => 0.5,
        x if x == 90.0 || x == 270.0 => 0.0,
        x if x == 120.0 || x == 240.0 => -0.5,
        x if x == 180.0 => -1.0,
        x => x.to_radians().cos(),
    }
}

/// Sine of an angle in degrees, with the same exact values as [`cosd`].
pub fn sind(degrees: f64) -> f64 {
    cosd(90.0 - degrees)
}

impl Lattice {
    /// Creates a lattice from the six cell parameters.
    ///
    /// The lattice is placed in the standard orientation: `c` along Cartesian `z` and
    /// `b` in the `yz` plane.
    ///
    /// # Arguments
    ///
    /// * `a`, `b`, `c` - Cell edge lengths.
    /// * `alpha`, `beta`, `gamma` - Cell angles in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError`] for non-positive lengths, angles outside `(0°, 180°)`,
    /// or angle combinations that leave the cell without volume.
    pub fn new(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, LatticeError> {
        for (name, value) in [("a", a), ("b", b), ("c", c)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LatticeError::InvalidLength { name, value });
            }
        }
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !(value.is_finite() && value > 0.0 && value < 180.0) {
                return Err(LatticeError::InvalidAngle { name, value });
            }
        }

        let (ca, cb, cg) = (cosd(alpha), cosd(beta), cosd(gamma));
        let (sa, sb) = (sind(alpha), sind(beta));

        let unit_volume_squared = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
        if unit_volume_squared <= MIN_UNIT_VOLUME_SQUARED {
            return Err(LatticeError::DegenerateVolume {
                volume: a * b * c * unit_volume_squared.max(0.0).sqrt(),
            });
        }
        let unit_volume = unit_volume_squared.sqrt();

        let ar = sa / (a * unit_volume);
        let cgr = (ca * cb - cg) / (sa * sb);
        let sgr = (1.0 - cgr * cgr).sqrt();

        #[rustfmt::skip]
        let base = Matrix3::new(
            1.0 / ar, 0.0, 0.0,
            -cgr / sgr / ar, b * sa, 0.0,
            cb * a, b * ca, c,
        );
        #[rustfmt::skip]
        let metric = Matrix3::new(
            a * a, a * b * cg, a * c * cb,
            b * a * cg, b * b, b * c * ca,
            c * a * cb, c * b * ca, c * c,
        );

        let parameters = LatticeParameters {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        };
        Self::from_parts(parameters, base, metric)
    }

    /// Creates a lattice from three Cartesian basis vectors, keeping their orientation.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError`] when a vector has zero length or the vectors are coplanar.
    pub fn from_vectors(
        a: Vector3<f64>,
        b: Vector3<f64>,
        c: Vector3<f64>,
    ) -> Result<Self, LatticeError> {
        for (name, vector) in [("a", &a), ("b", &b), ("c", &c)] {
            let value = vector.norm();
            if !(value.is_finite() && value > 0.0) {
                return Err(LatticeError::InvalidLength { name, value });
            }
        }
        let base = Matrix3::from_columns(&[a, b, c]);
        let (la, lb, lc) = (a.norm(), b.norm(), c.norm());
        let volume = base.determinant().abs();
        if volume <= MIN_UNIT_VOLUME_SQUARED.sqrt() * la * lb * lc {
            return Err(LatticeError::DegenerateVolume { volume });
        }
        let angle = |u: &Vector3<f64>, v: &Vector3<f64>| {
            (u.dot(v) / (u.norm() * v.norm())).clamp(-1.0, 1.0).acos().to_degrees()
        };
        let parameters = LatticeParameters {
            a: la,
            b: lb,
            c: lc,
            alpha: angle(&b, &c),
            beta: angle(&a, &c),
            gamma: angle(&a, &b),
        };
        let metric = base.transpose() * base;
        Self::from_parts(parameters, base, metric)
    }

    /// The Cartesian lattice: unit edges along `x`, `y` and `z`.
    ///
    /// Distances in this lattice are plain Euclidean distances between fractional
    /// coordinates, which makes it the metric for tolerances given in fractional units.
    pub fn cartesian() -> Self {
        Self {
            parameters: LatticeParameters {
                a: 1.0,
                b: 1.0,
                c: 1.0,
                alpha: 90.0,
                beta: 90.0,
                gamma: 90.0,
            },
            metric: Matrix3::identity(),
            base: Matrix3::identity(),
            inverse_base: Matrix3::identity(),
            reciprocal_lengths: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    fn from_parts(
        parameters: LatticeParameters,
        base: Matrix3<f64>,
        metric: Matrix3<f64>,
    ) -> Result<Self, LatticeError> {
        let inverse_base = base
            .try_inverse()
            .ok_or(LatticeError::DegenerateVolume {
                volume: base.determinant().abs(),
            })?;
        let reciprocal_lengths = Vector3::from_fn(|i, _| inverse_base.row(i).norm());
        Ok(Self {
            parameters,
            metric,
            base,
            inverse_base,
            reciprocal_lengths,
        })
    }

    pub fn parameters(&self) -> LatticeParameters {
        self.parameters
    }

    /// The metric tensor `G`, with `G[(i, j)] = a_i · a_j`.
    pub fn metric(&self) -> &Matrix3<f64> {
        &self.metric
    }

    /// The basis matrix `B` whose columns are the Cartesian lattice vectors.
    pub fn base(&self) -> &Matrix3<f64> {
        &self.base
    }

    /// Inverse of the basis matrix; its rows are the reciprocal lattice vectors.
    pub fn inverse_base(&self) -> &Matrix3<f64> {
        &self.inverse_base
    }

    /// Lengths of the reciprocal lattice vectors `a*`, `b*`, `c*` (without the 2π factor).
    pub fn reciprocal_lengths(&self) -> &Vector3<f64> {
        &self.reciprocal_lengths
    }

    /// Cell volume in cubic Angstroms.
    pub fn volume(&self) -> f64 {
        self.base.determinant().abs()
    }

    /// Converts fractional coordinates to Cartesian coordinates.
    pub fn cartesian_position(&self, fractional: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.base * fractional.coords)
    }

    /// Converts Cartesian coordinates to fractional coordinates.
    pub fn fractional_position(&self, cartesian: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.inverse_base * cartesian.coords)
    }

    /// Dot product of two vectors given in fractional coordinates.
    pub fn dot(&self, u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
        u.dot(&(self.metric * v))
    }

    /// Length of a vector given in fractional coordinates.
    pub fn norm(&self, u: &Vector3<f64>) -> f64 {
        self.dot(u, u).max(0.0).sqrt()
    }

    /// Distance `sqrt((p−q)ᵗ G (p−q))` between two fractional positions, without
    /// periodic wrapping.
    pub fn distance(&self, p: &Point3<f64>, q: &Point3<f64>) -> f64 {
        self.norm(&(p - q))
    }

    /// Angle in degrees between two directions given in fractional coordinates.
    pub fn angle(&self, u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
        let cosine = self.dot(u, v) / (self.norm(u) * self.norm(v));
        cosine.clamp(-1.0, 1.0).acos().to_degrees()
    }

    /// Finds the lattice translation that brings a fractional difference vector closest to
    /// the origin.
    ///
    /// The rounded difference and its 26 neighbors are inspected, which covers oblique
    /// cells where plain rounding does not give the shortest image.
    ///
    /// # Return
    ///
    /// The integer translation `n` and the length of `difference - n`. Ties resolve to the
    /// first image in a fixed enumeration order.
    pub fn minimum_image(&self, difference: &Vector3<f64>) -> (Vector3<f64>, f64) {
        let rounded = difference.map(f64::round);
        iproduct!(-1i32..=1, -1i32..=1, -1i32..=1)
            .map(|(i, j, k)| {
                let shift = rounded + Vector3::new(f64::from(i), f64::from(j), f64::from(k));
                (shift, self.norm(&(difference - shift)))
            })
            .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))
            .unwrap_or_else(|| (rounded, self.norm(&(difference - rounded))))
    }

    /// Shortest distance between two fractional positions over all lattice images.
    pub fn periodic_distance(&self, p: &Point3<f64>, q: &Point3<f64>) -> f64 {
        self.minimum_image(&(p - q)).1
    }

    /// The reciprocal lattice (without the 2π factor).
    pub fn reciprocal(&self) -> Self {
        let base = self.inverse_base.transpose();
        let columns: Vec<Vector3<f64>> = (0..3).map(|i| base.column(i).into_owned()).collect();
        let angle = |u: &Vector3<f64>, v: &Vector3<f64>| {
            (u.dot(v) / (u.norm() * v.norm())).clamp(-1.0, 1.0).acos().to_degrees()
        };
        Self {
            parameters: LatticeParameters {
                a: columns[0].norm(),
                b: columns[1].norm(),
                c: columns[2].norm(),
                alpha: angle(&columns[1], &columns[2]),
                beta: angle(&columns[0], &columns[2]),
                gamma: angle(&columns[0], &columns[1]),
            },
            metric: base.transpose() * base,
            inverse_base: self.base.transpose(),
            reciprocal_lengths: Vector3::new(
                self.parameters.a,
                self.parameters.b,
                self.parameters.c,
            ),
            base,
        }
    }

    /// Displacement tensor of a unit isotropic displacement, expressed in the
    /// reciprocal-normalized basis used for anisotropic displacement parameters.
    pub fn isotropic_unit(&self) -> Matrix3<f64> {
        let scale = Matrix3::from_diagonal(&self.reciprocal_lengths.map(|r| 1.0 / r));
        let mut unit = scale * self.inverse_base * self.inverse_base.transpose() * scale;
        for i in 0..3 {
            unit[(i, i)] = 1.0;
        }
        unit
    }

    /// Checks whether a displacement tensor deviates from an isotropic one by more than
    /// `tolerance` in any element.
    pub fn is_anisotropic(&self, tensor: &Matrix3<f64>, tolerance: f64) -> bool {
        let mean = tensor.trace() / 3.0;
        let deviation = tensor - self.isotropic_unit() * mean;
        deviation.amax() > tolerance
    }
}

impl Default for Lattice {
    fn default() -> Self {
        Self::cartesian()
    }
}
