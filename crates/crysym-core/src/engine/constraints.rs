use super::config::SymmetryConfig;
use super::error::SymmetryError;
use super::site::SiteSymmetry;
use crate::core::models::displacement::ADP_LABELS;
use crate::core::utils::linalg::{ReducedSystem, reduce};
use nalgebra::{DMatrix, DVector, Point3, Vector6};
use std::collections::BTreeMap;
use tracing::{instrument, trace, warn};

/// Growth factor of the pivot threshold between row-reduction attempts.
const REPIVOT_SCALE: f64 = 10.0;

/// The parameter vector a constraint set describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Fractional coordinates `(x, y, z)`.
    Position,
    /// Anisotropic displacement components `(U11, U22, U33, U12, U13, U23)`.
    Displacement,
}

impl ParameterKind {
    pub fn dimension(&self) -> usize {
        match self {
            ParameterKind::Position => 3,
            ParameterKind::Displacement => 6,
        }
    }

    /// Conventional name of a component ("x", "U12", ...).
    pub fn component_name(&self, component: usize) -> &'static str {
        match self {
            ParameterKind::Position => ["x", "y", "z"].get(component).copied().unwrap_or("?"),
            ParameterKind::Displacement => ADP_LABELS.get(component).copied().unwrap_or("?"),
        }
    }
}

/// A dependent component expressed as `constant + Σ coefficient · independent component`.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    /// `(independent component, coefficient)` pairs, ascending by component, all non-zero.
    pub coefficients: Vec<(usize, f64)>,
    pub constant: f64,
}

impl Formula {
    /// Evaluates the formula against a full parameter vector.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .map(|&(component, coefficient)| coefficient * values[component])
            .sum::<f64>()
            + self.constant
    }

    pub fn references(&self, component: usize) -> bool {
        self.coefficients.iter().any(|&(c, _)| c == component)
    }

    pub fn is_constant(&self) -> bool {
        self.coefficients.is_empty()
    }
}

/// Partition of a parameter vector into independent components and formulas for the
/// dependent ones.
///
/// Every formula refers to independent components only, so resolving all of them takes
/// one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    kind: ParameterKind,
    independent: Vec<usize>,
    formulas: BTreeMap<usize, Formula>,
}

impl ConstraintSet {
    /// A set without constraints: every component is independent.
    pub fn unconstrained(kind: ParameterKind) -> Self {
        Self {
            kind,
            independent: (0..kind.dimension()).collect(),
            formulas: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// Independent components in ascending order.
    pub fn independent(&self) -> &[usize] {
        &self.independent
    }

    /// Formulas of the dependent components, keyed by component.
    pub fn formulas(&self) -> &BTreeMap<usize, Formula> {
        &self.formulas
    }

    pub fn formula(&self, component: usize) -> Option<&Formula> {
        self.formulas.get(&component)
    }

    pub fn is_independent(&self, component: usize) -> bool {
        self.independent.contains(&component)
    }

    /// Builds the full parameter vector from values of the independent components, given
    /// in the order of [`ConstraintSet::independent`].
    ///
    /// # Return
    ///
    /// Returns `None` when `free_values` does not have one value per independent component.
    pub fn resolve(&self, free_values: &[f64]) -> Option<Vec<f64>> {
        if free_values.len() != self.independent.len() {
            return None;
        }
        let mut values = vec![0.0; self.kind.dimension()];
        for (&component, &value) in self.independent.iter().zip(free_values) {
            values[component] = value;
        }
        for (&component, formula) in &self.formulas {
            values[component] = formula.evaluate(&values);
        }
        Some(values)
    }

    /// Keeps the independent components of `values` and recomputes the dependent ones.
    pub fn project(&self, values: &[f64]) -> Option<Vec<f64>> {
        if values.len() != self.kind.dimension() {
            return None;
        }
        let free: Vec<f64> = self.independent.iter().map(|&c| values[c]).collect();
        self.resolve(&free)
    }

    pub fn project_position(&self, position: &Point3<f64>) -> Option<Point3<f64>> {
        let values = self.project(position.coords.as_slice())?;
        Some(Point3::new(values[0], values[1], values[2]))
    }

    pub fn project_displacement(&self, components: &Vector6<f64>) -> Option<Vector6<f64>> {
        let values = self.project(components.as_slice())?;
        Some(Vector6::from_column_slice(&values))
    }
}

/// Derives the constraints that the site symmetry places on the fractional position.
///
/// Each fixing operation contributes `(R − I)·x = n − t`. The stacked system is row
/// reduced with the highest-index components as preferred pivots, so the lowest-index
/// components stay independent.
///
/// # Errors
///
/// Returns [`SymmetryError::Config`] for an invalid configuration and
/// [`SymmetryError::UnresolvablePivot`] when no pivot choice within the configured number
/// of attempts yields consistent formulas free of self-reference.
#[instrument(skip_all, fields(site = %site.name(), site_order = site.order()))]
pub fn position_constraints(
    site: &SiteSymmetry,
    config: &SymmetryConfig,
) -> Result<ConstraintSet, SymmetryError> {
    config.validate()?;
    let rows = 3 * site.order();
    let mut matrix = DMatrix::zeros(rows, 3);
    let mut rhs = DVector::zeros(rows);
    for (k, site_op) in site.operations().iter().enumerate() {
        let rotation = site_op.operation.rotation();
        let translation = site_op.operation.translation();
        for i in 0..3 {
            for j in 0..3 {
                matrix[(3 * k + i, j)] = rotation[(i, j)] - if i == j { 1.0 } else { 0.0 };
            }
            rhs[3 * k + i] = site_op.shift[i] - translation[i];
        }
    }
    solve(ParameterKind::Position, matrix, rhs, site, config)
}

/// Derives the constraints that the site symmetry places on anisotropic displacement
/// parameters, from `(M_R − I)·u = 0` for the induced action `M_R` of every fixing
/// operation.
///
/// # Errors
///
/// See [`position_constraints`].
#[instrument(skip_all, fields(site = %site.name(), site_order = site.order()))]
pub fn adp_constraints(
    site: &SiteSymmetry,
    config: &SymmetryConfig,
) -> Result<ConstraintSet, SymmetryError> {
    config.validate()?;
    let rows = 6 * site.order();
    let mut matrix = DMatrix::zeros(rows, 6);
    for (k, site_op) in site.operations().iter().enumerate() {
        for i in 0..6 {
            for j in 0..6 {
                matrix[(6 * k + i, j)] =
                    site_op.adp_action[(i, j)] - if i == j { 1.0 } else { 0.0 };
            }
        }
    }
    solve(
        ParameterKind::Displacement,
        matrix,
        DVector::zeros(rows),
        site,
        config,
    )
}

fn solve(
    kind: ParameterKind,
    matrix: DMatrix<f64>,
    rhs: DVector<f64>,
    site: &SiteSymmetry,
    config: &SymmetryConfig,
) -> Result<ConstraintSet, SymmetryError> {
    let column_order: Vec<usize> = (0..kind.dimension()).rev().collect();
    let mut pivot_tolerance = config.coefficient_tolerance;
    let attempts = config.max_repivot_attempts + 1;

    for attempt in 0..attempts {
        let reduced = reduce(matrix.clone(), rhs.clone(), &column_order, pivot_tolerance);
        if let Some(set) = extract(kind, &reduced, config.coefficient_tolerance) {
            trace!(
                independent = set.independent.len(),
                dependent = set.formulas.len(),
                attempt,
                "Derived constraints"
            );
            return Ok(set);
        }
        warn!(
            attempt,
            pivot_tolerance, "Constraint system is inconsistent or self-referencing, re-pivoting"
        );
        pivot_tolerance *= REPIVOT_SCALE;
    }

    Err(SymmetryError::UnresolvablePivot {
        site: site.name(),
        attempts,
    })
}

/// Reads formulas off a reduced system, or `None` when the system is inconsistent or a
/// pivot row still carries a non-zero coefficient on a dependent component (its own
/// included) or a non-finite value.
fn extract(
    kind: ParameterKind,
    reduced: &ReducedSystem,
    tolerance: f64,
) -> Option<ConstraintSet> {
    let residual = reduced.residual();
    if residual.is_nan() || residual > tolerance {
        return None;
    }
    let independent = reduced.free_columns();
    let mut formulas = BTreeMap::new();

    for &(row, column) in reduced.pivots() {
        let pivot = reduced.coefficient(row, column);
        if !pivot.is_finite() || (pivot - 1.0).abs() > tolerance {
            return None;
        }
        let refers_to_dependent = reduced.pivots().iter().any(|&(_, other)| {
            other != column && reduced.coefficient(row, other).abs() > tolerance
        });
        if refers_to_dependent {
            return None;
        }

        let constant = reduced.rhs(row);
        let row_values = independent.iter().map(|&free| reduced.coefficient(row, free));
        if !constant.is_finite() || row_values.clone().any(|value| !value.is_finite()) {
            return None;
        }
        let coefficients = independent
            .iter()
            .zip(row_values)
            .map(|(&free, value)| (free, -value))
            .filter(|(_, coefficient)| coefficient.abs() > tolerance)
            .collect();
        let formula = Formula {
            coefficients,
            constant: if constant.abs() > tolerance { constant } else { 0.0 },
        };
        if formula.references(column) {
            return None;
        }
        formulas.insert(column, formula);
    }

    Some(ConstraintSet {
        kind,
        independent,
        formulas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::symmetry::space_group::SpaceGroup;
    use crate::engine::config::ConfigError;
    use crate::core::symmetry::table::{BuiltinTable, GroupId, SpaceGroupTable};

    fn group(symbol: &str) -> SpaceGroup {
        BuiltinTable::new().resolve(&GroupId::parse(symbol)).unwrap()
    }

    fn constraints(symbol: &str, position: [f64; 3]) -> (ConstraintSet, ConstraintSet) {
        let config = SymmetryConfig::default();
        let point = Point3::new(position[0], position[1], position[2]);
        let site = SiteSymmetry::analyze(&point, &group(symbol), &config).unwrap();
        (
            position_constraints(&site, &config).unwrap(),
            adp_constraints(&site, &config).unwrap(),
        )
    }

    fn assert_formula(
        set: &ConstraintSet,
        component: usize,
        coefficients: &[(usize, f64)],
        constant: f64,
    ) {
        let formula = set.formula(component).unwrap();
        assert_eq!(formula.coefficients.len(), coefficients.len(), "component {component}");
        for (&(c, v), &(ec, ev)) in formula.coefficients.iter().zip(coefficients) {
            assert_eq!(c, ec);
            assert!((v - ev).abs() < 1e-12, "coefficient of {c} in {component}: {v}");
        }
        assert!((formula.constant - constant).abs() < 1e-12, "constant of {component}");
    }

    fn assert_no_self_reference(set: &ConstraintSet) {
        for (&component, formula) in set.formulas() {
            assert!(!formula.references(component));
            for &(c, _) in &formula.coefficients {
                assert!(set.is_independent(c));
            }
        }
    }

    #[test]
    fn general_position_is_unconstrained() {
        let (positions, adps) = constraints("P21/c", [0.1, 0.2, 0.3]);
        assert_eq!(positions, ConstraintSet::unconstrained(ParameterKind::Position));
        assert_eq!(adps, ConstraintSet::unconstrained(ParameterKind::Displacement));
    }

    #[test]
    fn cubic_origin_forces_isotropic_displacement() {
        let (positions, adps) = constraints("Fm-3m", [0.0, 0.0, 0.0]);
        assert!(positions.independent().is_empty());
        for component in 0..3 {
            assert_formula(&positions, component, &[], 0.0);
        }
        assert_eq!(adps.independent(), &[0]);
        assert_formula(&adps, 1, &[(0, 1.0)], 0.0);
        assert_formula(&adps, 2, &[(0, 1.0)], 0.0);
        for component in 3..6 {
            assert_formula(&adps, component, &[], 0.0);
        }
    }

    #[test]
    fn mirror_plane_fixes_one_coordinate_and_two_cross_terms() {
        let (positions, adps) = constraints("Pm", [0.1, 0.0, 0.3]);
        assert_eq!(positions.independent(), &[0, 2]);
        assert_formula(&positions, 1, &[], 0.0);
        assert_eq!(adps.independent(), &[0, 1, 2, 4]);
        assert_formula(&adps, 3, &[], 0.0);
        assert_formula(&adps, 5, &[], 0.0);
    }

    #[test]
    fn threefold_axis_ties_diagonal_and_cross_terms() {
        let (positions, adps) = constraints("Pm-3m", [0.2, 0.2, 0.2]);
        assert_eq!(positions.independent(), &[0]);
        assert_formula(&positions, 1, &[(0, 1.0)], 0.0);
        assert_formula(&positions, 2, &[(0, 1.0)], 0.0);
        assert_eq!(adps.independent(), &[0, 3]);
        assert_formula(&adps, 1, &[(0, 1.0)], 0.0);
        assert_formula(&adps, 2, &[(0, 1.0)], 0.0);
        assert_formula(&adps, 4, &[(3, 1.0)], 0.0);
        assert_formula(&adps, 5, &[(3, 1.0)], 0.0);
    }

    #[test]
    fn hexagonal_site_has_half_cross_term() {
        let (positions, adps) = constraints("P6/mmm", [1.0 / 3.0, 2.0 / 3.0, 0.0]);
        assert!(positions.independent().is_empty());
        assert_formula(&positions, 0, &[], 1.0 / 3.0);
        assert_formula(&positions, 1, &[], 2.0 / 3.0);
        assert_formula(&positions, 2, &[], 0.0);
        assert_eq!(adps.independent(), &[0, 2]);
        assert_formula(&adps, 1, &[(0, 1.0)], 0.0);
        assert_formula(&adps, 3, &[(0, 0.5)], 0.0);
    }

    #[test]
    fn special_positions_with_translations_keep_constants() {
        let (positions, adps) = constraints("Pnma", [0.1, 0.25, 0.3]);
        assert_eq!(positions.independent(), &[0, 2]);
        assert_formula(&positions, 1, &[], 0.25);
        assert_eq!(adps.independent(), &[0, 1, 2, 4]);

        let (positions, adps) = constraints("Cmcm", [0.0, 0.3, 0.25]);
        assert_eq!(positions.independent(), &[1]);
        assert_formula(&positions, 0, &[], 0.0);
        assert_formula(&positions, 2, &[], 0.25);
        assert_eq!(adps.independent(), &[0, 1, 2]);
    }

    #[test]
    fn no_formula_refers_to_its_own_component() {
        let cases: [(&str, [f64; 3]); 6] = [
            ("R-3m", [0.0, 0.0, 0.3]),
            ("P4/mmm", [0.5, 0.5, 0.25]),
            ("Im-3m", [0.25, 0.0, 0.5]),
            ("P63/mmc", [1.0 / 3.0, 2.0 / 3.0, 0.25]),
            ("F-43m", [0.25, 0.25, 0.25]),
            ("P-1", [0.5, 0.5, 0.5]),
        ];
        for (symbol, position) in cases {
            let (positions, adps) = constraints(symbol, position);
            assert_no_self_reference(&positions);
            assert_no_self_reference(&adps);
        }
    }

    #[test]
    fn projection_snaps_values_onto_constraints() {
        let (positions, adps) = constraints("Pm-3m", [0.2, 0.2, 0.2]);
        let projected = positions.project_position(&Point3::new(0.2, 0.21, 0.19)).unwrap();
        assert!((projected - Point3::new(0.2, 0.2, 0.2)).norm() < 1e-12);

        let u = Vector6::new(0.01, 0.02, 0.03, 0.004, 0.005, 0.006);
        let projected = adps.project_displacement(&u).unwrap();
        let expected = Vector6::new(0.01, 0.01, 0.01, 0.004, 0.004, 0.004);
        assert!((projected - expected).amax() < 1e-12);

        let resolved = positions.resolve(&[0.3]).unwrap();
        assert!(resolved.iter().all(|value| (value - 0.3).abs() < 1e-12));
        assert!(positions.resolve(&[0.3, 0.4]).is_none());
        assert!(positions.project(&[0.3]).is_none());
    }

    #[test]
    fn repivot_budget_exhaustion_is_reported() {
        let config = SymmetryConfig::default();
        let site = SiteSymmetry::analyze(&Point3::new(0.1, 0.2, 0.3), &group("P1"), &config)
            .unwrap()
            .labeled("C1");
        // A non-finite coefficient survives every pivot choice.
        let matrix = DMatrix::from_row_slice(1, 3, &[f64::NAN, 0.0, 1.0]);
        let result = solve(ParameterKind::Position, matrix, DVector::zeros(1), &site, &config);
        assert!(matches!(
            result,
            Err(SymmetryError::UnresolvablePivot { ref site, attempts: 4 }) if site == "C1"
        ));
    }

    #[test]
    fn inconsistent_system_is_not_accepted() {
        let config = SymmetryConfig::default();
        let site = SiteSymmetry::analyze(&Point3::new(0.1, 0.2, 0.3), &group("P1"), &config)
            .unwrap()
            .labeled("C1");
        // x = 0.1 and x = 0.2 cannot both hold.
        let matrix = DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let rhs = DVector::from_vec(vec![0.1, 0.2]);
        assert!(matches!(
            solve(ParameterKind::Position, matrix, rhs, &site, &config),
            Err(SymmetryError::UnresolvablePivot { attempts: 4, .. })
        ));
    }

    #[test]
    fn zero_coefficient_tolerance_is_a_configuration_error() {
        let valid = SymmetryConfig::default();
        let site = SiteSymmetry::analyze(&Point3::new(0.1, 0.2, 0.3), &group("P1"), &valid)
            .unwrap();
        let config = SymmetryConfig {
            coefficient_tolerance: 0.0,
            ..valid
        };
        for result in [
            position_constraints(&site, &config),
            adp_constraints(&site, &config),
        ] {
            assert!(matches!(
                result,
                Err(SymmetryError::Config {
                    source: ConfigError::InvalidTolerance {
                        name: "coefficient_tolerance",
                        ..
                    }
                })
            ));
        }
    }

    #[test]
    fn component_names_follow_conventions() {
        assert_eq!(ParameterKind::Position.component_name(2), "z");
        assert_eq!(ParameterKind::Displacement.component_name(3), "U12");
        assert_eq!(ParameterKind::Displacement.dimension(), 6);
    }
}
