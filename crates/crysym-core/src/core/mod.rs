//! # Core Module
//!
//! This module provides the fundamental building blocks of crysym: the lattice metric,
//! the atom-site data model and the space-group algebra.
//!
//! ## Architecture
//!
//! - **Coordinate System** ([`lattice`]) - Cell parameters, metric tensor, coordinate conversion
//! - **Crystal Representation** ([`models`]) - Atom sites, displacements and the owning structure
//! - **Symmetry Algebra** ([`symmetry`]) - Affine operations, space groups and table services
//! - **Numerics** ([`utils`]) - Row reduction and periodic coordinate helpers
//!
//! Nothing in this layer depends on tolerances chosen by the caller beyond what is passed
//! explicitly to each function; tolerance-driven analyses live in [`crate::engine`].

pub mod lattice;
pub mod models;
pub mod symmetry;
pub mod utils;
