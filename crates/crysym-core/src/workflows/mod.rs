//! # Workflows Module
//!
//! Structure-level entry points that tie the engine analyses to a [`Structure`].
//!
//! - **Expansion Workflow** ([`expand`]) - Expands a structure's asymmetric unit into a new
//!   P1 structure, optionally resolving the group through a cached table.
//! - **Constraint Workflow** ([`constrain`]) - Groups equivalent sites under generators and
//!   expresses every position and displacement over one list of free parameters.
//!
//! [`Structure`]: crate::core::models::structure::Structure

pub mod constrain;
pub mod expand;
