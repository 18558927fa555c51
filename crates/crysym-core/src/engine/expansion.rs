use super::config::SymmetryConfig;
use super::error::SymmetryError;
use super::site::SiteSymmetry;
use crate::core::lattice::Lattice;
use crate::core::models::atom::AtomSite;
use crate::core::symmetry::operation::SymOp;
use crate::core::symmetry::space_group::SpaceGroup;
use nalgebra::Point3;
use tracing::{debug, instrument, trace};

/// Fraction of the position tolerance by which the nearest retained position must beat
/// the runner-up for a merge to be unambiguous.
pub const AMBIGUITY_MARGIN: f64 = 1e-3;

/// One distinct position generated from a site.
#[derive(Debug, Clone)]
pub struct OrbitMember {
    /// Index of the first operation (in storage order) that produced this position.
    pub operation: usize,
    /// The generated site, wrapped into `[0, 1)`.
    pub site: AtomSite,
}

/// Generates the distinct images of a site under every operation of `group`.
///
/// The site is first moved onto its symmetrized position (see
/// [`SiteSymmetry::symmetrized_position`]), so coordinates rounded near a special position
/// yield the images of that position. Images are wrapped into `[0, 1)` and each one is
/// merged into the nearest retained position when their periodic distance in `lattice` is
/// below `config.position_tolerance`; the first operation producing a position wins.
/// Displacement parameters are transformed by the linear part of that operation.
///
/// # Errors
///
/// - [`SymmetryError::Config`] for an invalid configuration.
/// - [`SymmetryError::AmbiguousDeduplication`] when an image lies within tolerance of two
///   retained positions whose distances to it differ by no more than
///   [`AMBIGUITY_MARGIN`] times the tolerance.
/// - [`SymmetryError::InconsistentOrbit`] when the number of distinct positions differs
///   from the multiplicity implied by the site symmetry.
pub fn orbit(
    lattice: &Lattice,
    site: &AtomSite,
    group: &SpaceGroup,
    config: &SymmetryConfig,
) -> Result<Vec<OrbitMember>, SymmetryError> {
    let site_symmetry = SiteSymmetry::analyze_in(lattice, &site.position, group, config)?;
    let center = site_symmetry.symmetrized_position();
    let mut members: Vec<OrbitMember> = Vec::new();

    for (index, op) in config.operations_of(group).iter().enumerate() {
        let image = op.apply_wrapped(&center);
        let retained = members.iter().map(|member| &member.site.position);
        match nearest_match(lattice, retained, &image, config.position_tolerance) {
            Ok(Some(_)) => {}
            Ok(None) => {
                trace!(index, operation = %op, "New orbit position");
                members.push(OrbitMember {
                    operation: index,
                    site: site.derived(image, site.displacement.transformed(op.rotation())),
                });
            }
            Err(matches) => {
                return Err(SymmetryError::AmbiguousDeduplication {
                    site: site.label.clone(),
                    position: format_position(&image),
                    matches,
                });
            }
        }
    }

    if members.len() != site_symmetry.multiplicity() {
        return Err(SymmetryError::InconsistentOrbit {
            site: site.label.clone(),
            orbit_size: members.len(),
            expected: site_symmetry.multiplicity(),
            group_order: group.order(),
            site_order: site_symmetry.order(),
        });
    }
    Ok(members)
}

/// Expands an asymmetric unit into all symmetry-equivalent sites, with tolerances in
/// fractional units.
pub fn expand(
    atoms: &[AtomSite],
    group: &SpaceGroup,
    config: &SymmetryConfig,
) -> Result<Vec<AtomSite>, SymmetryError> {
    expand_in(&Lattice::cartesian(), atoms, group, config)
}

/// Expands an asymmetric unit into all symmetry-equivalent sites, measuring distances
/// with `lattice`.
///
/// Each atom contributes its orbit (see [`orbit`]) in input order. A generated position
/// whose nearest already emitted site of the same element lies within tolerance is
/// dropped, so re-expanding the output yields the same set of sites. Sites of different
/// elements sharing a position (substitutional disorder) are all kept. The call is
/// all-or-nothing: the first inconsistency aborts the whole expansion.
#[instrument(skip_all, fields(atoms = atoms.len(), group = %group))]
pub fn expand_in(
    lattice: &Lattice,
    atoms: &[AtomSite],
    group: &SpaceGroup,
    config: &SymmetryConfig,
) -> Result<Vec<AtomSite>, SymmetryError> {
    config.validate()?;
    let tolerance = config.position_tolerance;
    let mut expanded: Vec<AtomSite> = Vec::new();

    for atom in atoms {
        let members = orbit(lattice, atom, group, config)?;
        let orbit_size = members.len();
        let mut kept = 0;
        for member in members {
            let element = member.site.bare_element();
            let emitted = expanded
                .iter()
                .filter(|other| other.bare_element() == element)
                .map(|other| &other.position);
            match nearest_match(lattice, emitted, &member.site.position, tolerance) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    expanded.push(member.site);
                    kept += 1;
                }
                Err(matches) => {
                    return Err(SymmetryError::AmbiguousDeduplication {
                        site: atom.label.clone(),
                        position: format_position(&member.site.position),
                        matches,
                    });
                }
            }
        }
        debug!(
            label = %atom.label,
            orbit_size,
            kept,
            special = orbit_size < group.order(),
            "Expanded site"
        );
    }
    Ok(expanded)
}

/// Finds an operation carrying `from` onto `to` modulo lattice translations.
///
/// # Return
///
/// The storage index of the first matching operation, acting about the configured
/// origin and combined with the lattice translation that makes it map `from` onto the
/// image of `to` nearest to it, or `None` when the positions are not symmetry-equivalent
/// within `config.position_tolerance`.
pub fn find_mapping(
    lattice: &Lattice,
    group: &SpaceGroup,
    from: &Point3<f64>,
    to: &Point3<f64>,
    config: &SymmetryConfig,
) -> Option<(usize, SymOp)> {
    config
        .operations_of(group)
        .into_iter()
        .enumerate()
        .find_map(|(index, op)| {
            let (shift, distance) = lattice.minimum_image(&(op.apply(from) - to));
            (distance < config.position_tolerance).then(|| (index, op.translated(&-shift)))
        })
}

/// The index of the candidate nearest to `position` within `tolerance`.
///
/// # Return
///
/// `Ok(None)` when no candidate is within tolerance, or `Err` with the number of
/// candidates within tolerance when the two nearest are not separated by the margin.
fn nearest_match<'a>(
    lattice: &Lattice,
    candidates: impl Iterator<Item = &'a Point3<f64>>,
    position: &Point3<f64>,
    tolerance: f64,
) -> Result<Option<usize>, usize> {
    let mut matches: Vec<(usize, f64)> = candidates
        .enumerate()
        .map(|(index, candidate)| (index, lattice.periodic_distance(candidate, position)))
        .filter(|&(_, distance)| distance < tolerance)
        .collect();
    matches.sort_by(|a, b| a.1.total_cmp(&b.1));
    match matches.as_slice() {
        [] => Ok(None),
        [(index, _)] => Ok(Some(*index)),
        [(index, nearest), (_, runner_up), ..] => {
            if runner_up - nearest > AMBIGUITY_MARGIN * tolerance {
                Ok(Some(*index))
            } else {
                Err(matches.len())
            }
        }
    }
}

fn format_position(position: &Point3<f64>) -> String {
    format!("({:.5}, {:.5}, {:.5})", position.x, position.y, position.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::displacement::Displacement;
    use crate::core::symmetry::table::{BuiltinTable, GroupId, SpaceGroupTable, TomlTable};
    use nalgebra::Vector6;

    fn group(symbol: &str) -> SpaceGroup {
        BuiltinTable::new().resolve(&GroupId::parse(symbol)).unwrap()
    }

    fn contains(sites: &[AtomSite], position: Point3<f64>) -> bool {
        let lattice = Lattice::cartesian();
        sites
            .iter()
            .any(|site| lattice.periodic_distance(&site.position, &position) < 1e-9)
    }

    #[test]
    fn face_centered_origin_expands_to_four_sites() {
        let atom = AtomSite::new("Cu1", "Cu", Point3::origin())
            .with_displacement(Displacement::Isotropic(0.008));
        let sites = expand(&[atom], &group("Fm-3m"), &SymmetryConfig::default()).unwrap();
        assert_eq!(sites.len(), 4);
        for expected in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(0.5, 0.0, 0.5),
            Point3::new(0.0, 0.5, 0.5),
        ] {
            assert!(contains(&sites, expected), "missing {expected:?}");
        }
        assert!(sites.iter().all(|site| site.label == "Cu1"));
        assert!(sites.iter().all(|site| site.displacement == Displacement::Isotropic(0.008)));
    }

    #[test]
    fn general_position_count_equals_group_order() {
        let config = SymmetryConfig::default();
        let atom = AtomSite::new("C1", "C", Point3::new(0.1, 0.2, 0.3));
        for (symbol, order) in [("P1", 1), ("P-1", 2), ("P21/c", 4), ("Pnma", 8), ("Fm-3m", 192)] {
            let sites = expand(std::slice::from_ref(&atom), &group(symbol), &config).unwrap();
            assert_eq!(sites.len(), order, "group {symbol}");
        }
    }

    #[test]
    fn mirror_plane_halves_the_orbit() {
        let config = SymmetryConfig::default();
        let on_mirror = AtomSite::new("O1", "O", Point3::new(0.1, 0.0, 0.3));
        let off_mirror = AtomSite::new("O2", "O", Point3::new(0.1, 0.2, 0.3));
        assert_eq!(expand(&[on_mirror], &group("Pm"), &config).unwrap().len(), 1);
        assert_eq!(expand(&[off_mirror], &group("Pm"), &config).unwrap().len(), 2);
    }

    #[test]
    fn expansion_is_idempotent() {
        let config = SymmetryConfig::default();
        let group = group("P63/mmc");
        let atoms = [
            AtomSite::new("Mg1", "Mg", Point3::new(1.0 / 3.0, 2.0 / 3.0, 0.25)),
            AtomSite::new("O1", "O", Point3::new(0.17, 0.34, 0.08)),
        ];
        let once = expand(&atoms, &group, &config).unwrap();
        let twice = expand(&once, &group, &config).unwrap();
        assert_eq!(once.len(), 2 + 12);
        assert_eq!(twice.len(), once.len());
        for (a, b) in once.iter().zip(&twice) {
            assert!((a.position - b.position).norm() < 1e-12);
        }
    }

    #[test]
    fn expansion_is_deterministic() {
        let config = SymmetryConfig::default();
        let atoms = [AtomSite::new("Si1", "Si", Point3::new(0.12, 0.31, 0.77))];
        let first = expand(&atoms, &group("Im-3m"), &config).unwrap();
        let second = expand(&atoms, &group("Im-3m"), &config).unwrap();
        let positions = |sites: &[AtomSite]| sites.iter().map(|s| s.position).collect::<Vec<_>>();
        assert_eq!(positions(&first), positions(&second));
    }

    #[test]
    fn equivalent_input_sites_of_same_element_are_merged() {
        let config = SymmetryConfig::default();
        let atoms = [
            AtomSite::new("Na1", "Na", Point3::new(0.0, 0.0, 0.0)),
            AtomSite::new("Na2", "Na", Point3::new(0.5, 0.5, 0.0)),
            AtomSite::new("K1", "K", Point3::new(0.5, 0.5, 0.0)).with_occupancy(0.5),
        ];
        let sites = expand(&atoms, &group("Fm-3m"), &config).unwrap();
        assert_eq!(sites.iter().filter(|s| s.element == "Na").count(), 4);
        assert_eq!(sites.iter().filter(|s| s.element == "K").count(), 4);
    }

    #[test]
    fn anisotropic_displacement_follows_generating_operation() {
        let config = SymmetryConfig::default();
        let u = Vector6::new(0.01, 0.02, 0.03, 0.004, 0.0, 0.0);
        let atom = AtomSite::new("O1", "O", Point3::new(0.1, 0.2, 0.3))
            .with_displacement(Displacement::Anisotropic(u));
        let group = group("P4");
        let members = orbit(&Lattice::cartesian(), &atom, &group, &config).unwrap();
        assert_eq!(members.len(), 4);
        for member in &members {
            let op = &group.operations()[member.operation];
            assert_eq!(
                member.site.displacement,
                Displacement::Anisotropic(op.adp_action() * u)
            );
        }
    }

    #[test]
    fn ambiguous_deduplication_is_reported() {
        let config = SymmetryConfig::builder()
            .position_tolerance(0.1)
            .build()
            .unwrap();
        let atoms = [
            AtomSite::new("C1", "C", Point3::new(0.0, 0.0, 0.0)),
            AtomSite::new("C2", "C", Point3::new(0.15, 0.0, 0.0)),
            AtomSite::new("C3", "C", Point3::new(0.075, 0.0, 0.0)),
        ];
        match expand(&atoms, &group("P1"), &config) {
            Err(SymmetryError::AmbiguousDeduplication { site, matches, .. }) => {
                assert_eq!(site, "C3");
                assert_eq!(matches, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn upper_case_symbols_are_not_merged_with_their_first_letter() {
        let atoms = [
            AtomSite::new("C1", "C", Point3::new(0.1, 0.2, 0.3)),
            AtomSite::new("CL1", "CL", Point3::new(0.1, 0.2, 0.3)),
            AtomSite::new("Cl2", "Cl-", Point3::new(0.1, 0.2, 0.3)),
        ];
        let sites = expand(&atoms, &group("P1"), &SymmetryConfig::default()).unwrap();
        let labels: Vec<&str> = sites.iter().map(|site| site.label.as_str()).collect();
        assert_eq!(labels, ["C1", "CL1"]);
    }

    #[test]
    fn nearest_retained_site_wins_outside_the_margin() {
        let config = SymmetryConfig::builder()
            .position_tolerance(0.1)
            .build()
            .unwrap();
        let atoms = [
            AtomSite::new("C1", "C", Point3::new(0.0, 0.0, 0.0)),
            AtomSite::new("C2", "C", Point3::new(0.15, 0.0, 0.0)),
            AtomSite::new("C3", "C", Point3::new(0.07, 0.0, 0.0)),
        ];
        let sites = expand(&atoms, &group("P1"), &config).unwrap();
        let labels: Vec<&str> = sites.iter().map(|site| site.label.as_str()).collect();
        assert_eq!(labels, ["C1", "C2"]);
    }

    #[test]
    fn rounded_special_coordinates_expand_to_the_special_orbit() {
        let config = SymmetryConfig::default();
        let atom = AtomSite::new("X1", "X", Point3::new(0.3333, 0.6667, 0.25));
        let sites = expand(&[atom], &group("P63/mmc"), &config).unwrap();
        assert_eq!(sites.len(), 2);
        let lattice = Lattice::cartesian();
        for (site, exact) in sites.iter().zip([
            Point3::new(1.0 / 3.0, 2.0 / 3.0, 0.25),
            Point3::new(2.0 / 3.0, 1.0 / 3.0, 0.75),
        ]) {
            assert!(lattice.periodic_distance(&site.position, &exact) < 1e-12);
        }

        let atom = AtomSite::new("X2", "X", Point3::new(0.3333, 0.6667, 0.5));
        assert_eq!(expand(&[atom], &group("P6/mmm"), &config).unwrap().len(), 2);
    }

    #[test]
    fn perturbations_below_tolerance_expand_consistently() {
        let config = SymmetryConfig::default();
        let offsets = [-6e-5, 0.0, 6e-5];
        for (symbol, special) in [
            ("Pm-3m", Point3::new(0.0, 0.0, 0.0)),
            ("P6/mmm", Point3::new(1.0 / 3.0, 2.0 / 3.0, 0.5)),
            ("R-3m", Point3::new(0.0, 0.0, 0.5)),
        ] {
            let group = group(symbol);
            for (&dx, &dy, &dz) in itertools::iproduct!(&offsets, &offsets, &offsets) {
                let position = special + nalgebra::Vector3::new(dx, dy, dz);
                let atom = AtomSite::new("A1", "A", position);
                let sites = expand(&[atom], &group, &config)
                    .unwrap_or_else(|error| panic!("{symbol} at {position:?}: {error}"));
                assert_eq!(group.order() % sites.len(), 0, "{symbol} at {position:?}");
            }
        }
    }

    #[test]
    fn origin_offset_shifts_special_positions() {
        let config = SymmetryConfig::builder()
            .origin_offset([0.25, 0.0, 0.0])
            .build()
            .unwrap();
        let group = group("P-1");
        let origin = AtomSite::new("A1", "A", Point3::origin());
        let sites = expand(&[origin], &group, &config).unwrap();
        assert_eq!(sites.len(), 2);
        assert!(contains(&sites, Point3::new(0.5, 0.0, 0.0)));

        let center = AtomSite::new("B1", "B", Point3::new(0.75, 0.0, 0.0));
        assert_eq!(expand(&[center], &group, &config).unwrap().len(), 1);
    }

    #[test]
    fn invalid_configuration_is_rejected_before_expansion() {
        let config = SymmetryConfig {
            coefficient_tolerance: 0.0,
            ..SymmetryConfig::default()
        };
        let atom = AtomSite::new("C1", "C", Point3::new(0.1, 0.2, 0.3));
        assert!(matches!(
            expand(&[atom], &group("P1"), &config),
            Err(SymmetryError::Config { .. })
        ));
    }

    #[test]
    fn incomplete_operation_list_yields_inconsistent_orbit() {
        let content = r#"
[[group]]
number = 16
short_name = "P222"
crystal_system = "orthorhombic"
operations = ["x,y,z", "-x,-y,z", "-x,y,-z"]
"#;
        let table = TomlTable::from_toml(content, "inline").unwrap();
        let group = table.resolve(&GroupId::Number(16)).unwrap();
        let atom = AtomSite::new("S1", "S", Point3::new(0.0, 0.0, 0.3));
        assert!(matches!(
            expand(&[atom], &group, &SymmetryConfig::default()),
            Err(SymmetryError::InconsistentOrbit {
                orbit_size: 2,
                expected: 1,
                group_order: 3,
                site_order: 2,
                ..
            })
        ));
    }

    #[test]
    fn find_mapping_locates_the_operation_between_equivalent_sites() {
        let group = group("P21/c");
        let lattice = Lattice::cartesian();
        let from = Point3::new(0.1, 0.2, 0.3);
        let to = group.apply(1, &from).unwrap() + nalgebra::Vector3::new(1.0, 0.0, 0.0);
        let config = SymmetryConfig::default();
        let (index, op) = find_mapping(&lattice, &group, &from, &to, &config).unwrap();
        assert_eq!(index, 1);
        assert!((op.apply(&from) - to).norm() < 1e-12);
        let unrelated = Point3::new(0.4, 0.4, 0.4);
        assert!(find_mapping(&lattice, &group, &from, &unrelated, &config).is_none());
    }
}
