//! # Engine Module
//!
//! Tolerance-driven symmetry analyses on top of the core algebra.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Tolerances, re-pivot budget and distance metric
//! - **Error Handling** ([`error`]) - The [`error::SymmetryError`] type shared by all analyses
//! - **Group Cache** ([`cache`]) - Memoized, optionally validated space group resolution
//! - **Site Symmetry** ([`site`]) - Operations fixing a site modulo lattice translations
//! - **Expansion** ([`expansion`]) - Orbit generation and deduplication
//! - **Constraints** ([`constraints`]) - Null-space constraints on positions and displacements
//!
//! Distances are measured with a [`crate::core::lattice::Lattice`]; the plain entry points use
//! the identity metric, so tolerances are in fractional units unless the caller opts into
//! the cell metric.

pub mod cache;
pub mod config;
pub mod constraints;
pub mod error;
pub mod expansion;
pub mod site;
