use super::displacement::Displacement;
use super::ids::StructureId;
use nalgebra::Point3;

/// Represents one atom site of a crystal structure.
///
/// Positions are fractional coordinates of the owning structure's lattice. A site is
/// owned exclusively by a [`Structure`](super::structure::Structure); it only keeps the
/// owner's [`StructureId`] as a back-link, which the structure sets on insertion and
/// clears on removal.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomSite {
    /// The site label (e.g., "Na1", "O2"). May be empty until labels are assigned.
    pub label: String,
    /// The chemical element or ion symbol (e.g., "Na", "O2-").
    pub element: String,
    /// Fractional coordinates in the lattice of the owning structure.
    pub position: Point3<f64>,
    /// Site occupancy, 1.0 for a fully occupied site.
    pub occupancy: f64,
    /// Atomic displacement parameters.
    pub displacement: Displacement,
    owner: Option<StructureId>,
}

impl AtomSite {
    /// Creates a fully occupied site with zero isotropic displacement.
    ///
    /// # Arguments
    ///
    /// * `label` - The site label.
    /// * `element` - The element symbol.
    /// * `position` - Fractional coordinates of the site.
    pub fn new(label: &str, element: &str, position: Point3<f64>) -> Self {
        Self {
            label: label.to_string(),
            element: element.to_string(),
            position,
            occupancy: 1.0,
            displacement: Displacement::default(),
            owner: None,
        }
    }

    pub fn with_occupancy(mut self, occupancy: f64) -> Self {
        self.occupancy = occupancy;
        self
    }

    pub fn with_displacement(mut self, displacement: Displacement) -> Self {
        self.displacement = displacement;
        self
    }

    /// The structure that currently owns this site, if any.
    pub fn owner(&self) -> Option<StructureId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<StructureId>) {
        self.owner = owner;
    }

    /// A copy of this site detached from any owner, at a new position and with new
    /// displacement parameters.
    pub fn derived(&self, position: Point3<f64>, displacement: Displacement) -> Self {
        Self {
            label: self.label.clone(),
            element: self.element.clone(),
            position,
            occupancy: self.occupancy,
            displacement,
            owner: None,
        }
    }

    /// The bare element symbol with any charge suffix removed and its case normalized
    /// (e.g., "O2-" → "O", "CL" → "Cl").
    pub fn bare_element(&self) -> String {
        self.element
            .trim()
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .enumerate()
            .map(|(i, c)| {
                if i == 0 {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_site_is_fully_occupied_and_unowned() {
        let site = AtomSite::new("Na1", "Na", Point3::new(0.0, 0.0, 0.0));
        assert_eq!(site.occupancy, 1.0);
        assert_eq!(site.displacement, Displacement::Isotropic(0.0));
        assert!(site.owner().is_none());
    }

    #[test]
    fn builder_methods_set_fields() {
        let site = AtomSite::new("O1", "O", Point3::new(0.1, 0.2, 0.3))
            .with_occupancy(0.5)
            .with_displacement(Displacement::Isotropic(0.01));
        assert_eq!(site.occupancy, 0.5);
        assert_eq!(site.displacement, Displacement::Isotropic(0.01));
    }

    #[test]
    fn derived_site_drops_owner_and_keeps_identity_fields() {
        let mut site = AtomSite::new("Cl1", "Cl1-", Point3::new(0.1, 0.2, 0.3)).with_occupancy(0.8);
        site.set_owner(Some(StructureId::next()));
        let derived = site.derived(Point3::new(0.9, 0.8, 0.7), Displacement::Isotropic(0.02));
        assert!(derived.owner().is_none());
        assert_eq!(derived.label, "Cl1");
        assert_eq!(derived.occupancy, 0.8);
        assert_eq!(derived.position, Point3::new(0.9, 0.8, 0.7));
    }

    #[test]
    fn bare_element_strips_charge_and_digits() {
        let site = |element: &str| AtomSite::new("", element, Point3::origin());
        assert_eq!(site("O2-").bare_element(), "O");
        assert_eq!(site("Fe3+").bare_element(), "Fe");
        assert_eq!(site(" Na ").bare_element(), "Na");
        assert_eq!(site("CL").bare_element(), "Cl");
        assert_eq!(site("br1-").bare_element(), "Br");
        assert_ne!(site("CL").bare_element(), site("C").bare_element());
    }
}
