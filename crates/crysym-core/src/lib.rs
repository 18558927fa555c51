//! # crysym Core Library
//!
//! A space-group symmetry engine for crystal structures: the algebra of symmetry
//! operations, expansion of an asymmetric unit into the full set of equivalent sites,
//! and derivation of the linear constraints that keep positions and displacement
//! parameters consistent with local site symmetry.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture with a clear separation of concerns.
//!
//! - **[`core`]: The Foundation.** Stateless data models and algebra: the
//!   [`core::lattice::Lattice`] metric, atom sites and their owning `Structure`, symmetry
//!   operations, space groups and the read-only table services that resolve them.
//!
//! - **[`engine`]: The Logic Core.** Tolerance-driven analyses built on the core: site-symmetry
//!   detection, orbit generation and deduplication, and null-space constraint derivation. Every
//!   entry point takes its tolerances explicitly through [`engine::config::SymmetryConfig`].
//!
//! - **[`workflows`]: The Public API.** Structure-level procedures that tie the engine and core
//!   together, such as expanding a structure to P1 or deriving constraints for every site.

pub mod core;
pub mod engine;
pub mod workflows;
