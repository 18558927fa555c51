use super::config::SymmetryConfig;
use crate::core::symmetry::space_group::{ClosureDefect, SpaceGroup};
use crate::core::symmetry::table::{GroupId, SpaceGroupTable, TableError};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

#[derive(Debug)]
struct CachedGroup {
    group: Arc<SpaceGroup>,
    validation: Option<Result<(), ClosureDefect>>,
}

impl CachedGroup {
    fn outcome(&self) -> Result<Arc<SpaceGroup>, TableError> {
        match &self.validation {
            Some(Err(defect)) => Err(TableError::CorruptTable {
                group: self.group.short_name().to_string(),
                defect: defect.clone(),
            }),
            _ => Ok(Arc::clone(&self.group)),
        }
    }
}

/// Memoizes space group resolution per identifier.
///
/// Each identifier is resolved from the underlying table at most once; concurrent callers
/// share the resulting immutable group. When closure validation is enabled, the check also
/// runs once per identifier and its outcome is cached with the group, so a corrupt table
/// keeps failing without being re-validated.
#[derive(Debug)]
pub struct SpaceGroupCache<T> {
    table: T,
    validation_tolerance: Option<f64>,
    entries: RwLock<HashMap<GroupId, CachedGroup>>,
}

impl<T: SpaceGroupTable> SpaceGroupCache<T> {
    pub fn new(table: T) -> Self {
        Self {
            table,
            validation_tolerance: None,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Enables closure validation with translations compared within
    /// `config.operation_tolerance`.
    pub fn with_validation(mut self, config: &SymmetryConfig) -> Self {
        self.validation_tolerance = Some(config.operation_tolerance);
        self
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    /// Resolves a group, consulting the table only on the first request for `id`.
    ///
    /// # Errors
    ///
    /// Propagates the table's [`TableError`]; returns [`TableError::CorruptTable`] when
    /// validation is enabled and the group is not closed. Lookup failures are not cached.
    pub fn get(&self, id: &GroupId) -> Result<Arc<SpaceGroup>, TableError> {
        if let Some(entry) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
        {
            return entry.outcome();
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(id) {
            return entry.outcome();
        }
        let group = self.table.resolve(id)?;
        let validation = self
            .validation_tolerance
            .map(|tolerance| group.validate_closure(tolerance));
        debug!(
            id = %id,
            group = %group,
            order = group.order(),
            validated = validation.is_some(),
            "Cached space group"
        );
        let entry = CachedGroup {
            group: Arc::new(group),
            validation,
        };
        let outcome = entry.outcome();
        entries.insert(id.clone(), entry);
        outcome
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
