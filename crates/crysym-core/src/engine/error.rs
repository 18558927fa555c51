use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::ids::SiteId;
use crate::core::symmetry::table::TableError;

#[derive(Debug, Error)]
pub enum SymmetryError {
    #[error("Space group lookup failed: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Site symmetry of '{site}' does not contain the identity operation")]
    MissingIdentity { site: String },

    #[error(
        "Inconsistent orbit for site '{site}': {orbit_size} distinct positions, \
         expected {expected} (group order {group_order}, site symmetry order {site_order})"
    )]
    InconsistentOrbit {
        site: String,
        orbit_size: usize,
        expected: usize,
        group_order: usize,
        site_order: usize,
    },

    #[error(
        "Ambiguous deduplication for site '{site}': image {position} lies within tolerance \
         of {matches} distinct positions, with no single nearest one"
    )]
    AmbiguousDeduplication {
        site: String,
        position: String,
        matches: usize,
    },

    #[error("Unresolvable constraint pivot for site '{site}' after {attempts} attempts")]
    UnresolvablePivot { site: String, attempts: usize },

    #[error("Site not found in structure: {0:?}")]
    SiteNotFound(SiteId),
}
