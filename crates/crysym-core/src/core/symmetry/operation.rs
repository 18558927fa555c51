use crate::core::models::displacement::adp_action;
use crate::core::utils::periodic::{integer_deviation, wrap_point, wrap_vector};
use nalgebra::{Matrix3, Matrix6, Point3, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Denominators tried when printing a translation as a fraction.
const TRANSLATION_DENOMINATORS: [i64; 7] = [1, 2, 3, 4, 6, 8, 12];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationParseError {
    #[error("Expected three comma-separated components in '{0}'")]
    ComponentCount(String),
    #[error("Empty term in component '{0}'")]
    EmptyTerm(String),
    #[error("Unexpected character '{character}' in component '{component}'")]
    UnexpectedCharacter { component: String, character: char },
    #[error("Invalid number '{text}' in component '{component}'")]
    InvalidNumber { component: String, text: String },
    #[error("Linear part of '{0}' is singular")]
    Singular(String),
}

/// An affine symmetry operation `p ↦ R·p + t` on fractional coordinates.
///
/// Equality is tolerance-based (see [`SymOp::equals`]): linear parts must match exactly
/// and translations only modulo 1, so the type deliberately has no `PartialEq`.
#[derive(Debug, Clone)]
pub struct SymOp {
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
}

impl SymOp {
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    /// Parses a Jones-faithful triplet such as `"-x+1/2,y,-z"`.
    pub fn parse(text: &str) -> Result<Self, OperationParseError> {
        text.parse()
    }

    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }

    /// Applies the operation without wrapping the result.
    pub fn apply(&self, position: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * position.coords + self.translation)
    }

    /// Applies the operation and wraps the result into `[0, 1)`.
    pub fn apply_wrapped(&self, position: &Point3<f64>) -> Point3<f64> {
        wrap_point(&self.apply(position))
    }

    /// Applies only the linear part, as for a difference vector.
    pub fn apply_to_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector
    }

    /// The composition `self ∘ other`, i.e. `p ↦ self(other(p))`.
    pub fn compose(&self, other: &SymOp) -> SymOp {
        SymOp::new(
            self.rotation * other.rotation,
            self.rotation * other.translation + self.translation,
        )
    }

    /// The inverse operation, or `None` for a singular linear part.
    pub fn inverse(&self) -> Option<SymOp> {
        let inverse = self.rotation.try_inverse()?;
        Some(SymOp::new(inverse, -(inverse * self.translation)))
    }

    /// The same operation with its translation wrapped into `[0, 1)`.
    pub fn normalized(&self) -> SymOp {
        SymOp::new(self.rotation, wrap_vector(&self.translation))
    }

    /// The operation followed by an extra translation.
    pub fn translated(&self, shift: &Vector3<f64>) -> SymOp {
        SymOp::new(self.rotation, self.translation + shift)
    }

    /// The operation acting about a shifted origin, `p ↦ self(p + origin) − origin`.
    pub fn about_origin(&self, origin: &Vector3<f64>) -> SymOp {
        SymOp::new(
            self.rotation,
            self.translation + self.rotation * origin - origin,
        )
    }

    /// Compares linear parts exactly and translations modulo 1 within `tolerance`.
    pub fn equals(&self, other: &SymOp, tolerance: f64) -> bool {
        self.rotation == other.rotation
            && integer_deviation(&(self.translation - other.translation)) < tolerance
    }

    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.equals(&SymOp::identity(), tolerance)
    }

    /// The induced action on six-component displacement vectors.
    pub fn adp_action(&self) -> Matrix6<f64> {
        adp_action(&self.rotation)
    }

    /// A hashable key of the linear part; equal linear parts give equal keys.
    pub(crate) fn rotation_key(&self) -> [u64; 9] {
        let mut key = [0u64; 9];
        for (slot, value) in key.iter_mut().zip(self.rotation.iter()) {
            *slot = (value + 0.0).to_bits();
        }
        key
    }
}

impl FromStr for SymOp {
    type Err = OperationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components: Vec<&str> = s.split(',').collect();
        if components.len() != 3 {
            return Err(OperationParseError::ComponentCount(s.to_string()));
        }
        let mut rotation = Matrix3::zeros();
        let mut translation = Vector3::zeros();
        for (i, component) in components.iter().enumerate() {
            let (coefficients, constant) = parse_component(component)?;
            for (j, coefficient) in coefficients.iter().enumerate() {
                rotation[(i, j)] = *coefficient;
            }
            translation[i] = constant;
        }
        if rotation.determinant().abs() < f64::EPSILON {
            return Err(OperationParseError::Singular(s.to_string()));
        }
        Ok(SymOp::new(rotation, translation))
    }
}

fn parse_component(component: &str) -> Result<([f64; 3], f64), OperationParseError> {
    let chars: Vec<char> = component.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.is_empty() {
        return Err(OperationParseError::EmptyTerm(component.to_string()));
    }
    let mut coefficients = [0.0; 3];
    let mut constant = 0.0;
    let mut i = 0;

    while i < chars.len() {
        let mut sign = 1.0;
        while let Some(&c) = chars.get(i).filter(|c| matches!(**c, '+' | '-')) {
            if c == '-' {
                sign = -sign;
            }
            i += 1;
        }

        let start = i;
        while chars
            .get(i)
            .is_some_and(|c| c.is_ascii_digit() || *c == '.' || *c == '/')
        {
            i += 1;
        }
        let number = if i > start {
            let text: String = chars[start..i].iter().collect();
            Some(parse_number(component, &text)?)
        } else {
            None
        };
        if chars.get(i) == Some(&'*') {
            i += 1;
        }

        match chars.get(i).map(|c| c.to_ascii_lowercase()) {
            Some(axis @ ('x' | 'y' | 'z')) => {
                let index = match axis {
                    'x' => 0,
                    'y' => 1,
                    _ => 2,
                };
                coefficients[index] += sign * number.unwrap_or(1.0);
                i += 1;
            }
            Some(c) if c != '+' && c != '-' => {
                return Err(OperationParseError::UnexpectedCharacter {
                    component: component.to_string(),
                    character: chars[i],
                });
            }
            _ => {
                let value =
                    number.ok_or_else(|| OperationParseError::EmptyTerm(component.to_string()))?;
                constant += sign * value;
            }
        }
    }
    Ok((coefficients, constant))
}

fn parse_number(component: &str, text: &str) -> Result<f64, OperationParseError> {
    let invalid = || OperationParseError::InvalidNumber {
        component: component.to_string(),
        text: text.to_string(),
    };
    match text.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: f64 = numerator.parse().map_err(|_| invalid())?;
            let denominator: f64 = denominator.parse().map_err(|_| invalid())?;
            if denominator == 0.0 {
                return Err(invalid());
            }
            Ok(numerator / denominator)
        }
        None => text.parse().map_err(|_| invalid()),
    }
}

fn format_translation(value: f64) -> String {
    for denominator in TRANSLATION_DENOMINATORS {
        let scaled = value * denominator as f64;
        let numerator = scaled.round();
        if (scaled - numerator).abs() < 1e-9 {
            return if denominator == 1 {
                format!("{}", numerator as i64)
            } else {
                format!("{}/{}", numerator as i64, denominator)
            };
        }
    }
    format!("{value:.6}")
}

impl fmt::Display for SymOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut components = Vec::with_capacity(3);
        for i in 0..3 {
            let mut text = String::new();
            for (j, axis) in ['x', 'y', 'z'].iter().enumerate() {
                let coefficient = self.rotation[(i, j)];
                if coefficient == 0.0 {
                    continue;
                }
                let sign = if coefficient < 0.0 {
                    "-"
                } else if text.is_empty() {
                    ""
                } else {
                    "+"
                };
                let magnitude = coefficient.abs();
                if magnitude == 1.0 {
                    text.push_str(&format!("{sign}{axis}"));
                } else {
                    text.push_str(&format!("{sign}{}*{axis}", format_translation(magnitude)));
                }
            }
            let t = self.translation[i];
            if t != 0.0 {
                let sign = if t < 0.0 {
                    "-"
                } else if text.is_empty() {
                    ""
                } else {
                    "+"
                };
                text.push_str(&format!("{sign}{}", format_translation(t.abs())));
            }
            if text.is_empty() {
                text.push('0');
            }
            components.push(text);
        }
        write!(f, "{}", components.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::Lattice;

    fn op(text: &str) -> SymOp {
        SymOp::parse(text).unwrap()
    }

    #[test]
    fn parse_reads_coefficients_and_translations() {
        let parsed = op("-x+1/2, y-x, -z+0.25");
        #[rustfmt::skip]
        let expected = Matrix3::new(
            -1.0, 0.0, 0.0,
            -1.0, 1.0, 0.0,
            0.0, 0.0, -1.0,
        );
        assert_eq!(*parsed.rotation(), expected);
        assert_eq!(*parsed.translation(), Vector3::new(0.5, 0.0, 0.25));
    }

    #[test]
    fn parse_accepts_leading_constants_and_uppercase() {
        let parsed = op("1/2+X,-Y,2*z");
        assert_eq!(parsed.translation()[0], 0.5);
        assert_eq!(parsed.rotation()[(1, 1)], -1.0);
        assert_eq!(parsed.rotation()[(2, 2)], 2.0);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(matches!(
            SymOp::parse("x,y"),
            Err(OperationParseError::ComponentCount(_))
        ));
        assert!(matches!(
            SymOp::parse("x,y,w"),
            Err(OperationParseError::UnexpectedCharacter { character: 'w', .. })
        ));
        assert!(matches!(
            SymOp::parse("x,y,z+1/0"),
            Err(OperationParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            SymOp::parse("x,y,-"),
            Err(OperationParseError::EmptyTerm(_))
        ));
        assert!(matches!(
            SymOp::parse("x,x,z"),
            Err(OperationParseError::Singular(_))
        ));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for text in ["x,y,z", "-x+1/2,y+1/2,-z", "x-y,x,z+1/6", "-y+3/4,x+1/4,z+2/3"] {
            let parsed = op(text);
            assert_eq!(parsed.to_string(), text);
            assert!(op(&parsed.to_string()).equals(&parsed, 1e-12));
        }
    }

    #[test]
    fn compose_applies_right_operand_first() {
        let screw = op("-x,y+1/2,-z");
        let mirror = op("x,-y,z");
        let p = Point3::new(0.1, 0.2, 0.3);
        let composed = screw.compose(&mirror);
        let expected = screw.apply(&mirror.apply(&p));
        assert!((composed.apply(&p) - expected).norm() < 1e-15);
    }

    #[test]
    fn inverse_undoes_the_operation() {
        let g = op("-y+1/4,x-y+1/2,z+1/3");
        let inverse = g.inverse().unwrap();
        assert!(g.compose(&inverse).is_identity(1e-12));
        assert!(inverse.compose(&g).is_identity(1e-12));
    }

    #[test]
    fn equality_ignores_integer_translations() {
        let a = op("-x+1/2,y,z");
        let b = op("-x-1/2,y,z+1");
        assert!(a.equals(&b, 1e-4));
        assert!(!a.equals(&op("-x+0.4,y,z"), 1e-4));
        assert!(!a.equals(&op("x+1/2,y,z"), 1e-4));
    }

    #[test]
    fn apply_wrapped_lands_in_unit_cell() {
        let g = op("-x,-y+1/2,z+1");
        let image = g.apply_wrapped(&Point3::new(0.25, 0.75, 0.5));
        assert!((image - Point3::new(0.75, 0.75, 0.5)).norm() < 1e-15);
    }

    #[test]
    fn distance_to_image_equals_distance_from_inverse_image() {
        let lattice = Lattice::new(5.0, 5.0, 5.0, 90.0, 90.0, 90.0).unwrap();
        let points = [Point3::new(0.1, 0.2, 0.3), Point3::new(0.77, 0.05, 0.61)];
        for text in ["-x+1/2,y+1/2,-z", "-y,x,z+1/4", "z,x,y", "-x,-y,-z"] {
            let g = op(text);
            let inverse = g.inverse().unwrap();
            for p in &points {
                let forward = lattice.periodic_distance(&g.apply(p), p);
                let backward = lattice.periodic_distance(p, &inverse.apply(p));
                assert!((forward - backward).abs() < 1e-9, "{text}");
            }
        }
    }

    #[test]
    fn difference_vectors_ignore_translation() {
        let g = op("-y+1/4,x+1/2,z+3/4");
        let (p, q) = (Point3::new(0.1, 0.2, 0.3), Point3::new(0.6, 0.9, 0.1));
        let image = g.apply_to_vector(&(p - q));
        assert!((image - (g.apply(&p) - g.apply(&q))).norm() < 1e-15);
    }

    #[test]
    fn shifted_origin_conjugates_by_the_offset() {
        let g = op("-y,x,z+1/2");
        let origin = Vector3::new(0.1, 0.25, 0.0);
        let shifted = g.about_origin(&origin);
        let p = Point3::new(0.3, 0.7, 0.2);
        let expected = g.apply(&(p + origin)) - origin;
        assert!((shifted.apply(&p) - expected).norm() < 1e-15);
        assert!(g.about_origin(&Vector3::zeros()).equals(&g, 1e-15));
    }

    #[test]
    fn adp_action_of_inversion_is_identity() {
        let action = op("-x,-y,-z").adp_action();
        assert!((action - Matrix6::identity()).amax() < 1e-15);
    }
}
