use crate::core::models::displacement::{Displacement, adp_action};
use crate::core::models::ids::SiteId;
use crate::core::models::structure::Structure;
use crate::core::symmetry::operation::SymOp;
use crate::core::symmetry::space_group::SpaceGroup;
use crate::engine::config::SymmetryConfig;
use crate::engine::constraints::{
    ConstraintSet, ParameterKind, adp_constraints, position_constraints,
};
use crate::engine::error::SymmetryError;
use crate::engine::expansion::find_mapping;
use crate::engine::site::SiteSymmetry;
use nalgebra::{Point3, Vector6};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, instrument};

/// A refinable parameter shared by a generator site and every site equivalent to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeParameter {
    /// Symbol such as `x0`, `U11_2` or `Uiso_1`; the number is the generator ordinal.
    pub name: String,
    pub value: f64,
}

/// `constant + Σ coefficient · parameter` over the global free parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearFormula {
    /// `(parameter index, coefficient)` pairs, ascending by index.
    pub terms: Vec<(usize, f64)>,
    pub constant: f64,
}

impl LinearFormula {
    fn parameter(index: usize) -> Self {
        Self {
            terms: vec![(index, 1.0)],
            constant: 0.0,
        }
    }

    /// Combines weighted formulas into one, dropping coefficients below `tolerance`.
    fn combine<'a>(
        parts: impl IntoIterator<Item = (f64, &'a LinearFormula)>,
        constant: f64,
        tolerance: f64,
    ) -> Self {
        let mut terms: BTreeMap<usize, f64> = BTreeMap::new();
        let mut constant = constant;
        for (weight, formula) in parts {
            if weight == 0.0 {
                continue;
            }
            constant += weight * formula.constant;
            for &(index, coefficient) in &formula.terms {
                *terms.entry(index).or_insert(0.0) += weight * coefficient;
            }
        }
        Self {
            terms: terms
                .into_iter()
                .filter(|(_, coefficient)| coefficient.abs() >= tolerance)
                .collect(),
            constant: if constant.abs() < tolerance { 0.0 } else { constant },
        }
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(index, coefficient)| coefficient * values[index])
            .sum::<f64>()
            + self.constant
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplacementFormulas {
    Isotropic(LinearFormula),
    /// One formula per component in `(U11, U22, U33, U12, U13, U23)` order.
    Anisotropic(Vec<LinearFormula>),
}

/// The formulas that determine one site of a structure.
#[derive(Debug, Clone)]
pub struct SiteConstraints {
    pub site: SiteId,
    /// The site whose parameters this site inherits (itself for a generator).
    pub generator: SiteId,
    /// Operation carrying the generator's position onto this site's position.
    pub operation: SymOp,
    /// Formulas for `x`, `y` and `z`.
    pub position: Vec<LinearFormula>,
    pub displacement: DisplacementFormulas,
}

impl SiteConstraints {
    pub fn is_generator(&self) -> bool {
        self.site == self.generator
    }
}

/// Symmetry constraints for every site of a structure, expressed over one shared list of
/// free parameters.
#[derive(Debug, Clone)]
pub struct StructureConstraints {
    parameters: Vec<FreeParameter>,
    sites: Vec<SiteConstraints>,
}

impl StructureConstraints {
    /// Derives the constraints of every site in `structure` under `group`.
    ///
    /// Sites are visited in insertion order. A site not yet claimed becomes a generator:
    /// its site symmetry determines which of its position and displacement components are
    /// free, and those become global parameters. Every later site of the same element that
    /// a group operation maps the generator onto is claimed by it and receives the
    /// generator's formulas transformed by that operation.
    ///
    /// # Errors
    ///
    /// Returns [`SymmetryError::Config`] for an invalid configuration and propagates the
    /// site-symmetry and constraint errors of any generator.
    #[instrument(skip_all, name = "constraint_workflow", fields(group = %group))]
    pub fn derive(
        structure: &Structure,
        group: &SpaceGroup,
        config: &SymmetryConfig,
    ) -> Result<Self, SymmetryError> {
        config.validate()?;
        info!(sites = structure.len(), "Deriving structure constraints.");

        let lattice = config.metric.lattice_for(structure.lattice());
        let mut parameters = Vec::new();
        let mut derived: HashMap<SiteId, SiteConstraints> = HashMap::new();
        let mut claimed: HashSet<SiteId> = HashSet::new();
        let mut generators = 0;

        for (index, &id) in structure.site_ids().iter().enumerate() {
            if claimed.contains(&id) {
                continue;
            }
            let Some(site) = structure.site(id) else {
                continue;
            };

            let site_symmetry = SiteSymmetry::analyze_in(&lattice, &site.position, group, config)?
                .labeled(&site.label);
            let position = parameterize(
                &position_constraints(&site_symmetry, config)?,
                site_symmetry.symmetrized_position().coords.as_slice(),
                generators,
                &mut parameters,
            );
            let displacement = match site.displacement {
                Displacement::Isotropic(u) => {
                    parameters.push(FreeParameter {
                        name: format!("Uiso_{generators}"),
                        value: u,
                    });
                    DisplacementFormulas::Isotropic(LinearFormula::parameter(parameters.len() - 1))
                }
                Displacement::Anisotropic(components) => {
                    DisplacementFormulas::Anisotropic(parameterize(
                        &adp_constraints(&site_symmetry, config)?,
                        components.as_slice(),
                        generators,
                        &mut parameters,
                    ))
                }
            };
            debug!(
                label = %site.label,
                site_order = site_symmetry.order(),
                multiplicity = site_symmetry.multiplicity(),
                parameters = parameters.len(),
                "Generator site"
            );

            let generator = SiteConstraints {
                site: id,
                generator: id,
                operation: SymOp::identity(),
                position,
                displacement,
            };
            for &other in &structure.site_ids()[index + 1..] {
                if claimed.contains(&other) {
                    continue;
                }
                let Some(candidate) = structure.site(other) else {
                    continue;
                };
                if candidate.bare_element() != site.bare_element() {
                    continue;
                }
                if let Some((_, operation)) =
                    find_mapping(&lattice, group, &site.position, &candidate.position, config)
                {
                    claimed.insert(other);
                    derived.insert(
                        other,
                        transform(&generator, other, operation, config.coefficient_tolerance),
                    );
                }
            }
            claimed.insert(id);
            derived.insert(id, generator);
            generators += 1;
        }

        let sites: Vec<SiteConstraints> = structure
            .site_ids()
            .iter()
            .filter_map(|id| derived.remove(id))
            .collect();
        info!(
            generators,
            parameters = parameters.len(),
            "Structure constraints derived."
        );
        Ok(Self { parameters, sites })
    }

    pub fn parameters(&self) -> &[FreeParameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&FreeParameter> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    /// Sets the value of a named parameter.
    ///
    /// # Return
    ///
    /// Returns `false` when no parameter has that name.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> bool {
        match self.parameters.iter_mut().find(|parameter| parameter.name == name) {
            Some(parameter) => {
                parameter.value = value;
                true
            }
            None => false,
        }
    }

    /// Per-site constraints in the structure's insertion order.
    pub fn sites(&self) -> &[SiteConstraints] {
        &self.sites
    }

    pub fn site(&self, id: SiteId) -> Option<&SiteConstraints> {
        self.sites.iter().find(|constraints| constraints.site == id)
    }

    fn values(&self) -> Vec<f64> {
        self.parameters.iter().map(|parameter| parameter.value).collect()
    }

    /// Position of a site computed from the current parameter values.
    pub fn position(&self, id: SiteId) -> Option<Point3<f64>> {
        self.site(id)
            .map(|constraints| evaluate_position(constraints, &self.values()))
    }

    /// Displacement of a site computed from the current parameter values.
    pub fn displacement(&self, id: SiteId) -> Option<Displacement> {
        self.site(id)
            .map(|constraints| evaluate_displacement(constraints, &self.values()))
    }

    /// Writes the positions and displacements implied by the current parameter values
    /// back into `structure`, making it exactly symmetric.
    ///
    /// # Errors
    ///
    /// Returns [`SymmetryError::SiteNotFound`] if a constrained site is no longer part of
    /// `structure`; the structure is then left unchanged.
    pub fn apply(&self, structure: &mut Structure) -> Result<(), SymmetryError> {
        if let Some(missing) = self
            .sites
            .iter()
            .find(|constraints| structure.site(constraints.site).is_none())
        {
            return Err(SymmetryError::SiteNotFound(missing.site));
        }

        let values = self.values();
        for constraints in &self.sites {
            let site = structure
                .site_mut(constraints.site)
                .ok_or(SymmetryError::SiteNotFound(constraints.site))?;
            site.position = evaluate_position(constraints, &values);
            site.displacement = evaluate_displacement(constraints, &values);
        }
        Ok(())
    }
}

fn evaluate_position(constraints: &SiteConstraints, values: &[f64]) -> Point3<f64> {
    let [x, y, z] = [0, 1, 2].map(|i| constraints.position[i].evaluate(values));
    Point3::new(x, y, z)
}

fn evaluate_displacement(constraints: &SiteConstraints, values: &[f64]) -> Displacement {
    match &constraints.displacement {
        DisplacementFormulas::Isotropic(formula) => {
            Displacement::Isotropic(formula.evaluate(values))
        }
        DisplacementFormulas::Anisotropic(formulas) => Displacement::Anisotropic(
            Vector6::from_iterator(formulas.iter().map(|formula| formula.evaluate(values))),
        ),
    }
}

/// Registers the independent components of `set` as parameters with the given current
/// values and returns one formula per component.
fn parameterize(
    set: &ConstraintSet,
    values: &[f64],
    generator: usize,
    parameters: &mut Vec<FreeParameter>,
) -> Vec<LinearFormula> {
    let kind = set.kind();
    let mut indices: HashMap<usize, usize> = HashMap::new();
    for &component in set.independent() {
        let name = match kind {
            ParameterKind::Position => format!("{}{generator}", kind.component_name(component)),
            ParameterKind::Displacement => {
                format!("{}_{generator}", kind.component_name(component))
            }
        };
        indices.insert(component, parameters.len());
        parameters.push(FreeParameter {
            name,
            value: values[component],
        });
    }

    (0..kind.dimension())
        .map(|component| match set.formula(component) {
            Some(formula) => LinearFormula {
                terms: formula
                    .coefficients
                    .iter()
                    .filter_map(|(independent, coefficient)| {
                        indices.get(independent).map(|&index| (index, *coefficient))
                    })
                    .collect(),
                constant: formula.constant,
            },
            None => indices
                .get(&component)
                .map(|&index| LinearFormula::parameter(index))
                .unwrap_or_default(),
        })
        .collect()
}

/// Carries the generator's formulas onto an equivalent site through `operation`.
fn transform(
    generator: &SiteConstraints,
    site: SiteId,
    operation: SymOp,
    tolerance: f64,
) -> SiteConstraints {
    let rotation = operation.rotation();
    let translation = operation.translation();
    let position = (0..3)
        .map(|i| {
            LinearFormula::combine(
                (0..3).map(|j| (rotation[(i, j)], &generator.position[j])),
                translation[i],
                tolerance,
            )
        })
        .collect();

    let displacement = match &generator.displacement {
        DisplacementFormulas::Isotropic(formula) => {
            DisplacementFormulas::Isotropic(formula.clone())
        }
        DisplacementFormulas::Anisotropic(formulas) => {
            let action = adp_action(rotation);
            DisplacementFormulas::Anisotropic(
                (0..6)
                    .map(|i| {
                        LinearFormula::combine(
                            (0..6).map(|j| (action[(i, j)], &formulas[j])),
                            0.0,
                            tolerance,
                        )
                    })
                    .collect(),
            )
        }
    };

    SiteConstraints {
        site,
        generator: generator.site,
        operation,
        position,
        displacement,
    }
}
