use crate::core::models::atom::AtomSite;
use crate::core::models::structure::Structure;
use crate::core::symmetry::space_group::SpaceGroup;
use crate::core::symmetry::table::{GroupId, SpaceGroupTable};
use crate::engine::cache::SpaceGroupCache;
use crate::engine::config::SymmetryConfig;
use crate::engine::error::SymmetryError;
use crate::engine::expansion::expand_in;
use tracing::{info, instrument};

/// Expands every site of `structure` under `group` and returns the result as a new P1
/// structure in the same lattice.
///
/// The input is left untouched; the returned structure has a fresh id and owns copies of
/// the generated sites. Nothing is returned unless every site expands consistently.
#[instrument(skip_all, name = "expansion_workflow", fields(group = %group))]
pub fn expand_structure(
    structure: &Structure,
    group: &SpaceGroup,
    config: &SymmetryConfig,
) -> Result<Structure, SymmetryError> {
    config.validate()?;
    info!(
        sites = structure.len(),
        order = group.order(),
        "Expanding structure to P1."
    );

    let lattice = config.metric.lattice_for(structure.lattice());
    let atoms: Vec<AtomSite> = structure.sites().map(|(_, site)| site.clone()).collect();
    let expanded = expand_in(&lattice, &atoms, group, config)?;

    let mut result = Structure::from_sites(structure.lattice().clone(), expanded);
    result.title = structure.title.clone();
    info!(sites = result.len(), "Expansion complete.");
    Ok(result)
}

/// Resolves `id` through `cache` and expands `structure` under the resulting group.
pub fn expand_structure_with<T: SpaceGroupTable>(
    structure: &Structure,
    cache: &SpaceGroupCache<T>,
    id: &GroupId,
    config: &SymmetryConfig,
) -> Result<Structure, SymmetryError> {
    let group = cache.get(id)?;
    expand_structure(structure, &group, config)
}
