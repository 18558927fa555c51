//! # Core Models Module
//!
//! This module contains the data structures used to represent a crystal structure:
//! atom sites, their displacement parameters and the structure that owns them.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom site with label, element, fractional position, occupancy and displacement
//! - [`displacement`] - Isotropic/anisotropic displacement parameters and how they transform
//! - [`structure`] - The owning container: a lattice plus ordered atom sites
//! - [`ids`] - Handle types for sites and structures
//!
//! ## Ownership
//!
//! Sites live in a `slotmap` inside their [`structure::Structure`]. A site never holds a
//! reference to its structure; it keeps a copyable [`ids::StructureId`] instead.
//!
//! ```ignore
//! use crysym::core::lattice::Lattice;
//! use crysym::core::models::{atom::AtomSite, structure::Structure};
//!
//! let lattice = Lattice::new(5.64, 5.64, 5.64, 90.0, 90.0, 90.0)?;
//! let mut structure = Structure::new(lattice);
//! let na = structure.add_site(AtomSite::new("Na1", "Na", Point3::new(0.0, 0.0, 0.0)));
//! assert_eq!(structure.site(na).unwrap().owner(), Some(structure.id()));
//! ```

pub mod atom;
pub mod displacement;
pub mod ids;
pub mod structure;
