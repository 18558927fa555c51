use super::atom::AtomSite;
use super::displacement::Displacement;
use super::ids::{SiteId, StructureId};
use crate::core::lattice::Lattice;
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashMap};

/// Represents a crystal structure: a lattice and the atom sites placed in it.
///
/// The structure owns its sites in a slot map and remembers their insertion order, which
/// is the order every iteration, expansion and constraint derivation follows. Each site
/// carries this structure's [`StructureId`] as its back-link.
#[derive(Debug)]
pub struct Structure {
    id: StructureId,
    /// Free-form title, typically the compound name.
    pub title: String,
    lattice: Lattice,
    sites: SlotMap<SiteId, AtomSite>,
    order: Vec<SiteId>,
}

impl Structure {
    /// Creates an empty structure in the given lattice.
    pub fn new(lattice: Lattice) -> Self {
        Self {
            id: StructureId::next(),
            title: String::new(),
            lattice,
            sites: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Creates a structure holding `sites` in iteration order.
    pub fn from_sites(lattice: Lattice, sites: impl IntoIterator<Item = AtomSite>) -> Self {
        let mut structure = Self::new(lattice);
        for site in sites {
            structure.add_site(site);
        }
        structure
    }

    pub fn id(&self) -> StructureId {
        self.id
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Adds a site and takes ownership of it.
    ///
    /// # Return
    ///
    /// The handle of the new site.
    pub fn add_site(&mut self, mut site: AtomSite) -> SiteId {
        site.set_owner(Some(self.id));
        let id = self.sites.insert(site);
        self.order.push(id);
        id
    }

    /// Removes a site and hands it back detached from this structure.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomSite)` if the site existed, otherwise `None`.
    pub fn remove_site(&mut self, id: SiteId) -> Option<AtomSite> {
        let mut site = self.sites.remove(id)?;
        self.order.retain(|&other| other != id);
        site.set_owner(None);
        Some(site)
    }

    pub fn site(&self, id: SiteId) -> Option<&AtomSite> {
        self.sites.get(id)
    }

    pub fn site_mut(&mut self, id: SiteId) -> Option<&mut AtomSite> {
        self.sites.get_mut(id)
    }

    /// Returns an iterator over all sites in insertion order.
    ///
    /// # Return
    ///
    /// An iterator yielding `(SiteId, &AtomSite)` pairs.
    pub fn sites(&self) -> impl Iterator<Item = (SiteId, &AtomSite)> {
        self.order
            .iter()
            .filter_map(move |&id| self.sites.get(id).map(|site| (id, site)))
    }

    pub fn site_ids(&self) -> &[SiteId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Cartesian coordinates of a site.
    pub fn cartesian(&self, id: SiteId) -> Option<Point3<f64>> {
        self.site(id)
            .map(|site| self.lattice.cartesian_position(&site.position))
    }

    /// Distance in Angstroms between two sites, without periodic images.
    pub fn distance(&self, a: SiteId, b: SiteId) -> Option<f64> {
        let (pa, pb) = (self.site(a)?.position, self.site(b)?.position);
        Some(self.lattice.distance(&pa, &pb))
    }

    /// Angle in degrees at site `b` formed by sites `a`, `b` and `c`.
    pub fn angle(&self, a: SiteId, b: SiteId, c: SiteId) -> Option<f64> {
        let vertex = self.site(b)?.position;
        let ba = self.site(a)?.position - vertex;
        let bc = self.site(c)?.position - vertex;
        Some(self.lattice.angle(&ba, &bc))
    }

    /// Moves the structure into another lattice, keeping Cartesian positions and
    /// Cartesian displacement tensors unchanged.
    pub fn place_in_lattice(&mut self, lattice: Lattice) {
        for site in self.sites.values_mut() {
            let cartesian = self.lattice.cartesian_position(&site.position);
            site.position = lattice.fractional_position(&cartesian);
            if site.displacement.is_anisotropic() {
                let tensor = site.displacement.to_cartesian(&self.lattice);
                site.displacement = Displacement::from_cartesian(&lattice, &tensor);
            }
        }
        self.lattice = lattice;
    }

    /// Relabels every site as its bare element followed by a running number per
    /// element, in insertion order (e.g., "Na1", "Cl1", "Na2").
    pub fn assign_unique_labels(&mut self) {
        let mut counters: HashMap<String, usize> = HashMap::new();
        for id in &self.order {
            if let Some(site) = self.sites.get_mut(*id) {
                let element = site.bare_element();
                let counter = counters.entry(element.clone()).or_insert(0);
                *counter += 1;
                site.label = format!("{element}{counter}");
            }
        }
    }

    /// Total occupancy per bare element.
    pub fn composition(&self) -> BTreeMap<String, f64> {
        let mut composition = BTreeMap::new();
        for (_, site) in self.sites() {
            *composition
                .entry(site.bare_element())
                .or_insert(0.0) += site.occupancy;
        }
        composition
    }
}

impl Clone for Structure {
    /// Copies the structure under a fresh [`StructureId`]; the copied sites point to
    /// the new structure.
    fn clone(&self) -> Self {
        let mut structure = Self::new(self.lattice.clone());
        structure.title = self.title.clone();
        for (_, site) in self.sites() {
            structure.add_site(site.clone());
        }
        structure
    }
}
