use super::config::SymmetryConfig;
use super::error::SymmetryError;
use crate::core::lattice::Lattice;
use crate::core::symmetry::operation::SymOp;
use crate::core::symmetry::space_group::SpaceGroup;
use itertools::{Itertools, iproduct};
use nalgebra::{Matrix3, Matrix6, Point3, Vector3};
use tracing::trace;

/// One operation of a site-symmetry group.
#[derive(Debug, Clone)]
pub struct SiteOperation {
    /// Index of the operation in the space group's storage order.
    pub index: usize,
    /// The space group operation, acting about the configured origin.
    pub operation: SymOp,
    /// The lattice translation `n` with `g(p) − n = p` at the symmetrized position.
    pub shift: Vector3<f64>,
    /// The induced action on six-component displacement vectors.
    pub adp_action: Matrix6<f64>,
}

impl SiteOperation {
    fn new(index: usize, operation: &SymOp, shift: Vector3<f64>) -> Self {
        Self {
            index,
            operation: operation.clone(),
            shift,
            adp_action: operation.adp_action(),
        }
    }

    /// The operation combined with `−n`, which maps the site onto itself without wrapping.
    pub fn fixing_operation(&self) -> SymOp {
        self.operation.translated(&-self.shift)
    }
}

/// The operations of a space group that fix a site modulo lattice translations.
#[derive(Debug, Clone)]
pub struct SiteSymmetry {
    label: Option<String>,
    position: Point3<f64>,
    operations: Vec<SiteOperation>,
    group_order: usize,
}

impl SiteSymmetry {
    /// Finds the site-symmetry group of `position` with tolerances in fractional units.
    ///
    /// # Errors
    ///
    /// Returns [`SymmetryError::Config`] for an invalid configuration and
    /// [`SymmetryError::MissingIdentity`] when no operation fixes the site, which only
    /// happens for an operation list without the identity.
    pub fn analyze(
        position: &Point3<f64>,
        group: &SpaceGroup,
        config: &SymmetryConfig,
    ) -> Result<Self, SymmetryError> {
        Self::analyze_in(&Lattice::cartesian(), position, group, config)
    }

    /// Finds the site-symmetry group of `position`, measuring distances with `lattice`.
    ///
    /// An operation `g` fixes the site when `g(p) − p`, carried by the linear part of
    /// some group operation, lies within `config.position_tolerance` of a lattice vector:
    /// the site then coincides with its image at that equivalent location. The operations
    /// found are closed under composition, and the search is repeated at the average of
    /// the site's images until the group stops growing, so a site slightly off a special
    /// position gets the full site-symmetry group of that position. Operations are kept in
    /// the group's storage order.
    pub fn analyze_in(
        lattice: &Lattice,
        position: &Point3<f64>,
        group: &SpaceGroup,
        config: &SymmetryConfig,
    ) -> Result<Self, SymmetryError> {
        config.validate()?;
        let operations = config.operations_of(group);
        let mut site = Self {
            label: None,
            position: *position,
            operations: Vec::new(),
            group_order: group.order(),
        };

        let mut center = *position;
        loop {
            let found = close(
                fixing_operations(lattice, &center, &operations, config.position_tolerance),
                &operations,
                config.operation_tolerance,
            );
            if !site.operations.is_empty() && found.len() <= site.operations.len() {
                break;
            }
            site.operations = found;
            if site.operations.is_empty() {
                break;
            }
            center = site.symmetrized_position();
        }

        if !site.contains_identity() {
            return Err(SymmetryError::MissingIdentity { site: site.name() });
        }
        Ok(site)
    }

    /// Attaches a label used to name the site in errors and logs.
    pub fn labeled(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// The site label, or its coordinates when unlabeled.
    pub fn name(&self) -> String {
        match &self.label {
            Some(label) if !label.is_empty() => label.clone(),
            _ => format!(
                "({:.5}, {:.5}, {:.5})",
                self.position.x, self.position.y, self.position.z
            ),
        }
    }

    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    pub fn operations(&self) -> &[SiteOperation] {
        &self.operations
    }

    /// Number of operations in the site-symmetry group.
    pub fn order(&self) -> usize {
        self.operations.len()
    }

    pub fn group_order(&self) -> usize {
        self.group_order
    }

    /// Number of symmetry-equivalent sites in the unit cell: group order divided by the
    /// site-symmetry order.
    pub fn multiplicity(&self) -> usize {
        self.group_order / self.order().max(1)
    }

    /// True when the site lies on a symmetry element other than the identity.
    pub fn is_special(&self) -> bool {
        self.multiplicity() < self.group_order
    }

    pub fn contains_identity(&self) -> bool {
        self.operations
            .iter()
            .any(|site_op| site_op.fixing_operation().is_identity(f64::EPSILON))
    }

    /// The average of the site's images under its fixing operations.
    ///
    /// The fixing operations form a group, so the average is a fixed point of every one of
    /// them: for a position within tolerance of a special position this is the exact
    /// special position.
    pub fn symmetrized_position(&self) -> Point3<f64> {
        let sum = self
            .operations
            .iter()
            .fold(Vector3::zeros(), |sum, site_op| {
                sum + site_op.fixing_operation().apply(&self.position).coords
            });
        Point3::from(sum / self.order().max(1) as f64)
    }
}

fn fixing_operations(
    lattice: &Lattice,
    position: &Point3<f64>,
    operations: &[SymOp],
    tolerance: f64,
) -> Vec<SiteOperation> {
    let rotations: Vec<&Matrix3<f64>> = operations
        .iter()
        .unique_by(|op| op.rotation_key())
        .map(SymOp::rotation)
        .collect();
    operations
        .iter()
        .enumerate()
        .filter_map(|(index, op)| {
            let difference = op.apply(position) - position;
            let (shift, _) = lattice.minimum_image(&difference);
            let distance = rotations
                .iter()
                .map(|&rotation| lattice.minimum_image(&(rotation * difference)).1)
                .fold(f64::INFINITY, f64::min);
            (distance < tolerance).then(|| {
                trace!(index, operation = %op, distance, "Operation fixes site");
                SiteOperation::new(index, op, shift)
            })
        })
        .collect()
}

/// Adds every product of fixing operations that is itself a group operation, until the
/// set is closed. Products outside the operation list are skipped.
fn close(
    mut found: Vec<SiteOperation>,
    operations: &[SymOp],
    tolerance: f64,
) -> Vec<SiteOperation> {
    let mut grew = true;
    while grew {
        grew = false;
        let fixing: Vec<SymOp> = found.iter().map(SiteOperation::fixing_operation).collect();
        for (a, b) in iproduct!(&fixing, &fixing) {
            let product = a.compose(b);
            let Some(index) = operations
                .iter()
                .position(|op| op.equals(&product, tolerance))
            else {
                continue;
            };
            if found.iter().any(|site_op| site_op.index == index) {
                continue;
            }
            let op = &operations[index];
            let shift = (op.translation() - product.translation()).map(f64::round);
            trace!(index, operation = %op, "Operation added by closure");
            found.push(SiteOperation::new(index, op, shift));
            grew = true;
        }
    }
    found.sort_by_key(|site_op| site_op.index);
    found
}
