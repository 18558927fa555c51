use super::data::{GROUP_RECORDS, GroupRecord, SYMBOL_ALIASES};
use super::operation::{OperationParseError, SymOp};
use super::space_group::{
    Centering, ClosureDefect, CrystalSystem, SpaceGroup, SpaceGroupInfo, normalize_symbol,
};
use nalgebra::Vector3;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Identifier under which a space group is requested from a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupId {
    /// International Tables number.
    Number(u32),
    /// Hermann–Mauguin symbol, stored normalized (see [`normalize_symbol`]).
    Symbol(String),
}

impl GroupId {
    /// Builds an identifier from user text; plain integers become [`GroupId::Number`].
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<u32>() {
            Ok(number) => GroupId::Number(number),
            Err(_) => GroupId::Symbol(normalize_symbol(text)),
        }
    }
}

impl From<u32> for GroupId {
    fn from(number: u32) -> Self {
        GroupId::Number(number)
    }
}

impl From<&str> for GroupId {
    fn from(text: &str) -> Self {
        GroupId::parse(text)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Number(number) => write!(f, "{number}"),
            GroupId::Symbol(symbol) => f.write_str(symbol),
        }
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Unknown space group identifier: {0}")]
    UnknownGroup(GroupId),
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid operation '{operation}' in space group '{group}': {source}")]
    InvalidOperation {
        group: String,
        operation: String,
        source: OperationParseError,
    },
    #[error("Invalid record for space group '{group}': {message}")]
    InvalidRecord { group: String, message: String },
    #[error("Space group '{group}' failed validation: {defect}")]
    CorruptTable { group: String, defect: ClosureDefect },
}

/// A read-only lookup service resolving identifiers to space groups.
pub trait SpaceGroupTable {
    /// Resolves an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::UnknownGroup`] when the table has no such group, or another
    /// [`TableError`] when the stored record cannot be turned into a space group.
    fn resolve(&self, id: &GroupId) -> Result<SpaceGroup, TableError>;
}

/// Borrowed view of a space group record, whatever its source.
struct RecordView<'a> {
    number: u32,
    short_name: &'a str,
    full_name: &'a str,
    point_group: &'a str,
    crystal_system: &'a str,
    centering: &'a str,
    centering_vectors: Option<&'a [[f64; 3]]>,
    operations: Vec<&'a str>,
}

impl RecordView<'_> {
    fn build(&self) -> Result<SpaceGroup, TableError> {
        let group = self.short_name.to_string();
        let invalid = |message: String| TableError::InvalidRecord {
            group: group.clone(),
            message,
        };

        let crystal_system = self
            .crystal_system
            .parse::<CrystalSystem>()
            .map_err(|_| invalid(format!("unknown crystal system '{}'", self.crystal_system)))?;
        let mut symbols = self.centering.trim().chars();
        let centering = match (symbols.next(), symbols.next()) {
            (Some(symbol), None) => Centering::from_symbol(symbol),
            _ => None,
        }
        .ok_or_else(|| invalid(format!("unknown centering '{}'", self.centering)))?;
        if self.operations.is_empty() {
            return Err(invalid("no operations listed".to_string()));
        }

        let representatives = self
            .operations
            .iter()
            .map(|text| {
                SymOp::parse(text).map_err(|source| TableError::InvalidOperation {
                    group: group.clone(),
                    operation: text.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let centering_vectors = match self.centering_vectors {
            Some(vectors) => vectors
                .iter()
                .map(|v| Vector3::new(v[0], v[1], v[2]))
                .collect(),
            None => centering.vectors(),
        };

        let info = SpaceGroupInfo {
            number: self.number,
            short_name: self.short_name.to_string(),
            full_name: self.full_name.to_string(),
            point_group: self.point_group.to_string(),
            crystal_system,
            centering,
        };
        Ok(SpaceGroup::new(info, representatives, centering_vectors))
    }
}

impl<'a> From<&'a GroupRecord> for RecordView<'a> {
    fn from(record: &'a GroupRecord) -> Self {
        RecordView {
            number: record.number,
            short_name: record.short_name,
            full_name: record.full_name,
            point_group: record.point_group,
            crystal_system: record.crystal_system,
            centering: match record.centering {
                'A' => "A",
                'B' => "B",
                'C' => "C",
                'I' => "I",
                'R' => "R",
                'F' => "F",
                _ => "P",
            },
            centering_vectors: None,
            operations: record.operations.to_vec(),
        }
    }
}

/// The space groups compiled into the library.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTable;

impl BuiltinTable {
    pub fn new() -> Self {
        Self
    }

    /// International Tables numbers of all built-in groups, ascending.
    pub fn numbers(&self) -> impl Iterator<Item = u32> {
        GROUP_RECORDS.iter().map(|record| record.number)
    }

    fn record(&self, id: &GroupId) -> Option<&'static GroupRecord> {
        let number = match id {
            GroupId::Number(number) => *number,
            GroupId::Symbol(symbol) => *SYMBOL_ALIASES.get(normalize_symbol(symbol).as_str())?,
        };
        GROUP_RECORDS.iter().find(|record| record.number == number)
    }
}

impl SpaceGroupTable for BuiltinTable {
    fn resolve(&self, id: &GroupId) -> Result<SpaceGroup, TableError> {
        let record = self
            .record(id)
            .ok_or_else(|| TableError::UnknownGroup(id.clone()))?;
        RecordView::from(record).build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlRecord {
    number: u32,
    short_name: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    point_group: String,
    crystal_system: String,
    #[serde(default = "default_centering")]
    centering: String,
    #[serde(default)]
    centering_vectors: Option<Vec<[f64; 3]>>,
    operations: Vec<String>,
}

fn default_centering() -> String {
    "P".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlDocument {
    #[serde(default, rename = "group")]
    groups: Vec<TomlRecord>,
}

/// Space groups loaded from a TOML document.
///
/// The document holds an array of `[[group]]` tables:
///
/// ```toml
/// [[group]]
/// number = 14
/// short_name = "P21/c"
/// full_name = "P 1 21/c 1"
/// point_group = "2/m"
/// crystal_system = "monoclinic"
/// centering = "P"
/// operations = ["x,y,z", "-x,y+1/2,-z+1/2", "-x,-y,-z", "x,-y+1/2,z+1/2"]
/// ```
///
/// `centering_vectors` may replace the translations implied by `centering`. Records are
/// parsed when the table is loaded, so a malformed record fails the load.
#[derive(Debug, Clone, Default)]
pub struct TomlTable {
    groups: Vec<SpaceGroup>,
}

impl TomlTable {
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let content = std::fs::read_to_string(path).map_err(|e| TableError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml(&content, &path.to_string_lossy())
    }

    /// Parses a TOML document; `origin` names the source in error messages.
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, TableError> {
        let document: TomlDocument = toml::from_str(content).map_err(|e| TableError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        let groups = document
            .groups
            .iter()
            .map(|record| {
                RecordView {
                    number: record.number,
                    short_name: &record.short_name,
                    full_name: record.full_name.as_deref().unwrap_or(&record.short_name),
                    point_group: &record.point_group,
                    crystal_system: &record.crystal_system,
                    centering: &record.centering,
                    centering_vectors: record.centering_vectors.as_deref(),
                    operations: record.operations.iter().map(String::as_str).collect(),
                }
                .build()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { groups })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl SpaceGroupTable for TomlTable {
    fn resolve(&self, id: &GroupId) -> Result<SpaceGroup, TableError> {
        self.groups
            .iter()
            .find(|group| match id {
                GroupId::Number(number) => group.number() == *number,
                GroupId::Symbol(symbol) => group.matches_name(symbol),
            })
            .cloned()
            .ok_or_else(|| TableError::UnknownGroup(id.clone()))
    }
}
