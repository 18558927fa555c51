//! # Symmetry Module
//!
//! Space-group algebra on fractional coordinates.
//!
//! - [`operation`] - Affine operations `R·p + t`, their composition, inverse, tolerance-based
//!   equality and Jones-faithful parsing/formatting
//! - [`space_group`] - Immutable operation lists with metadata, centering and closure validation
//! - [`table`] - The [`table::SpaceGroupTable`] lookup service with built-in and TOML-backed tables
//! - [`data`] - Built-in space group records

pub mod data;
pub mod operation;
pub mod space_group;
pub mod table;
