use super::operation::SymOp;
use crate::core::lattice::{Lattice, LatticeParameters};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The seven crystal systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CrystalSystem {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Tetragonal,
    Trigonal,
    Hexagonal,
    Cubic,
}

impl CrystalSystem {
    pub fn name(&self) -> &'static str {
        match self {
            CrystalSystem::Triclinic => "triclinic",
            CrystalSystem::Monoclinic => "monoclinic",
            CrystalSystem::Orthorhombic => "orthorhombic",
            CrystalSystem::Tetragonal => "tetragonal",
            CrystalSystem::Trigonal => "trigonal",
            CrystalSystem::Hexagonal => "hexagonal",
            CrystalSystem::Cubic => "cubic",
        }
    }

    /// Checks the cell-parameter rules of the crystal system.
    ///
    /// Lengths and angles are compared with the same absolute `tolerance`. Monoclinic cells
    /// may be unique-axis `b` (α = γ = 90°) or unique-axis `c` (α = β = 90°); trigonal cells
    /// may be in the rhombohedral or the hexagonal setting.
    pub fn allows(&self, p: &LatticeParameters, tolerance: f64) -> bool {
        let eq = |x: f64, y: f64| (x - y).abs() <= tolerance;
        let right = |angle: f64| eq(angle, 90.0);
        let all_right = right(p.alpha) && right(p.beta) && right(p.gamma);
        match self {
            CrystalSystem::Triclinic => true,
            CrystalSystem::Monoclinic => {
                (right(p.alpha) && right(p.gamma)) || (right(p.alpha) && right(p.beta))
            }
            CrystalSystem::Orthorhombic => all_right,
            CrystalSystem::Tetragonal => eq(p.a, p.b) && all_right,
            CrystalSystem::Trigonal => {
                let rhombohedral =
                    eq(p.a, p.b) && eq(p.b, p.c) && eq(p.alpha, p.beta) && eq(p.beta, p.gamma);
                let hexagonal =
                    eq(p.a, p.b) && right(p.alpha) && right(p.beta) && eq(p.gamma, 120.0);
                rhombohedral || hexagonal
            }
            CrystalSystem::Hexagonal => {
                eq(p.a, p.b) && right(p.alpha) && right(p.beta) && eq(p.gamma, 120.0)
            }
            CrystalSystem::Cubic => eq(p.a, p.b) && eq(p.b, p.c) && all_right,
        }
    }
}

impl FromStr for CrystalSystem {
    type Err = ();

    /// Parses a crystal system name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triclinic" => Ok(CrystalSystem::Triclinic),
            "monoclinic" => Ok(CrystalSystem::Monoclinic),
            "orthorhombic" => Ok(CrystalSystem::Orthorhombic),
            "tetragonal" => Ok(CrystalSystem::Tetragonal),
            "trigonal" | "rhombohedral" => Ok(CrystalSystem::Trigonal),
            "hexagonal" => Ok(CrystalSystem::Hexagonal),
            "cubic" => Ok(CrystalSystem::Cubic),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CrystalSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lattice centering, named by the first letter of the Hermann–Mauguin symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Centering {
    #[default]
    Primitive,
    BaseA,
    BaseB,
    BaseC,
    Body,
    Rhombohedral,
    Face,
}

impl Centering {
    pub fn symbol(&self) -> char {
        match self {
            Centering::Primitive => 'P',
            Centering::BaseA => 'A',
            Centering::BaseB => 'B',
            Centering::BaseC => 'C',
            Centering::Body => 'I',
            Centering::Rhombohedral => 'R',
            Centering::Face => 'F',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'P' => Some(Centering::Primitive),
            'A' => Some(Centering::BaseA),
            'B' => Some(Centering::BaseB),
            'C' => Some(Centering::BaseC),
            'I' => Some(Centering::Body),
            'R' => Some(Centering::Rhombohedral),
            'F' => Some(Centering::Face),
            _ => None,
        }
    }

    /// The non-zero centering translations (rhombohedral centering in the obverse
    /// hexagonal setting).
    pub fn vectors(&self) -> Vec<Vector3<f64>> {
        const H: f64 = 0.5;
        const T1: f64 = 1.0 / 3.0;
        const T2: f64 = 2.0 / 3.0;
        match self {
            Centering::Primitive => vec![],
            Centering::BaseA => vec![Vector3::new(0.0, H, H)],
            Centering::BaseB => vec![Vector3::new(H, 0.0, H)],
            Centering::BaseC => vec![Vector3::new(H, H, 0.0)],
            Centering::Body => vec![Vector3::new(H, H, H)],
            Centering::Rhombohedral => vec![Vector3::new(T2, T1, T1), Vector3::new(T1, T2, T2)],
            Centering::Face => vec![
                Vector3::new(0.0, H, H),
                Vector3::new(H, 0.0, H),
                Vector3::new(H, H, 0.0),
            ],
        }
    }
}

/// Descriptive metadata of a space group.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceGroupInfo {
    /// International Tables number, 1 to 230.
    pub number: u32,
    /// Short Hermann–Mauguin symbol (e.g., "P21/c").
    pub short_name: String,
    /// Full Hermann–Mauguin symbol (e.g., "P 1 21/c 1").
    pub full_name: String,
    /// Point group symbol (e.g., "2/m").
    pub point_group: String,
    pub crystal_system: CrystalSystem,
    pub centering: Centering,
}

/// A structural defect found when checking that an operation list forms a group.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClosureDefect {
    #[error("the identity operation is missing")]
    MissingIdentity,
    #[error("operations {first} and {second} are duplicates")]
    Duplicate { first: usize, second: usize },
    #[error("the product of operations {left} and {right} is not in the group")]
    NotClosed { left: usize, right: usize },
    #[error("operation {index} has no inverse in the group")]
    MissingInverse { index: usize },
}

/// An immutable space group: metadata plus the ordered list of its operations.
///
/// The operation list is built once from the coset representatives (the operations of
/// the primitive part) and the centering vectors: every representative combined with the
/// zero translation comes first, followed by the same representatives shifted by each
/// centering vector. Translations are stored wrapped into `[0, 1)`. This storage order is
/// the order in which every analysis reports operations.
#[derive(Debug, Clone)]
pub struct SpaceGroup {
    info: SpaceGroupInfo,
    representatives: Vec<SymOp>,
    centering_vectors: Vec<Vector3<f64>>,
    operations: Vec<SymOp>,
}

/// Normalizes a space group symbol for comparison: whitespace and underscores are
/// dropped and letters are uppercased ("P 21/c" and "p2_1/c" both become "P21/C").
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl SpaceGroup {
    pub fn new(
        info: SpaceGroupInfo,
        representatives: Vec<SymOp>,
        centering_vectors: Vec<Vector3<f64>>,
    ) -> Self {
        let operations = std::iter::once(Vector3::zeros())
            .chain(centering_vectors.iter().copied())
            .flat_map(|shift| {
                representatives
                    .iter()
                    .map(move |op| op.translated(&shift).normalized())
            })
            .collect();
        Self {
            info,
            representatives,
            centering_vectors,
            operations,
        }
    }

    pub fn info(&self) -> &SpaceGroupInfo {
        &self.info
    }

    pub fn number(&self) -> u32 {
        self.info.number
    }

    pub fn short_name(&self) -> &str {
        &self.info.short_name
    }

    pub fn full_name(&self) -> &str {
        &self.info.full_name
    }

    pub fn point_group(&self) -> &str {
        &self.info.point_group
    }

    pub fn crystal_system(&self) -> CrystalSystem {
        self.info.crystal_system
    }

    pub fn centering(&self) -> Centering {
        self.info.centering
    }

    pub fn centering_vectors(&self) -> &[Vector3<f64>] {
        &self.centering_vectors
    }

    /// Operations of the primitive part, one per coset of the centering translations.
    pub fn representatives(&self) -> &[SymOp] {
        &self.representatives
    }

    /// All operations in storage order.
    pub fn operations(&self) -> &[SymOp] {
        &self.operations
    }

    pub fn operation(&self, index: usize) -> Option<&SymOp> {
        self.operations.get(index)
    }

    /// Number of operations, including centering translations.
    pub fn order(&self) -> usize {
        self.operations.len()
    }

    /// Applies the operation at `index` and wraps the result into `[0, 1)`.
    pub fn apply(&self, index: usize, position: &Point3<f64>) -> Option<Point3<f64>> {
        self.operation(index).map(|op| op.apply_wrapped(position))
    }

    /// Images of `position` under every operation, in storage order, wrapped into
    /// `[0, 1)`. Duplicates are not removed.
    pub fn equivalent_positions<'a>(
        &'a self,
        position: &'a Point3<f64>,
    ) -> impl Iterator<Item = Point3<f64>> + 'a {
        self.operations.iter().map(move |op| op.apply_wrapped(position))
    }

    /// Index of the first stored operation equal to `op` within `tolerance`.
    pub fn find(&self, op: &SymOp, tolerance: f64) -> Option<usize> {
        self.operations
            .iter()
            .position(|candidate| candidate.equals(op, tolerance))
    }

    /// Checks the group name against a symbol or an International Tables number.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = normalize_symbol(name);
        name == normalize_symbol(&self.info.short_name)
            || name == normalize_symbol(&self.info.full_name)
            || name == self.info.number.to_string()
    }

    /// Checks whether a lattice has the shape required by the group's crystal system.
    pub fn allows_lattice(&self, lattice: &Lattice, tolerance: f64) -> bool {
        self.info
            .crystal_system
            .allows(&lattice.parameters(), tolerance)
    }

    /// Verifies that the operations form a group.
    ///
    /// The identity must be present, no operation may be listed twice, and the product of
    /// any two operations and the inverse of each operation must again be in the list.
    /// Translations are compared modulo 1 within `tolerance`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ClosureDefect`] encountered.
    pub fn validate_closure(&self, tolerance: f64) -> Result<(), ClosureDefect> {
        let mut by_rotation: HashMap<[u64; 9], Vec<usize>> = HashMap::new();
        for (index, op) in self.operations.iter().enumerate() {
            by_rotation.entry(op.rotation_key()).or_default().push(index);
        }
        let lookup = |target: &SymOp| -> Option<usize> {
            by_rotation.get(&target.rotation_key()).and_then(|indices| {
                indices
                    .iter()
                    .copied()
                    .find(|&i| self.operations[i].equals(target, tolerance))
            })
        };

        if lookup(&SymOp::identity()).is_none() {
            return Err(ClosureDefect::MissingIdentity);
        }
        for (index, op) in self.operations.iter().enumerate() {
            if let Some(first) = lookup(op).filter(|&first| first != index) {
                return Err(ClosureDefect::Duplicate {
                    first,
                    second: index,
                });
            }
            let has_inverse = op.inverse().is_some_and(|inverse| lookup(&inverse).is_some());
            if !has_inverse {
                return Err(ClosureDefect::MissingInverse { index });
            }
        }
        for (left, a) in self.operations.iter().enumerate() {
            for (right, b) in self.operations.iter().enumerate() {
                if lookup(&a.compose(b)).is_none() {
                    return Err(ClosureDefect::NotClosed { left, right });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for SpaceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (No. {})", self.info.short_name, self.info.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(
        number: u32,
        short: &str,
        system: CrystalSystem,
        centering: Centering,
    ) -> SpaceGroupInfo {
        SpaceGroupInfo {
            number,
            short_name: short.to_string(),
            full_name: short.to_string(),
            point_group: String::new(),
            crystal_system: system,
            centering,
        }
    }

    fn ops(texts: &[&str]) -> Vec<SymOp> {
        texts.iter().map(|t| SymOp::parse(t).unwrap()).collect()
    }

    fn c2() -> SpaceGroup {
        let info = info(5, "C2", CrystalSystem::Monoclinic, Centering::BaseC);
        let vectors = info.centering.vectors();
        SpaceGroup::new(info, ops(&["x,y,z", "-x,y,-z"]), vectors)
    }

    #[test]
    fn centering_expands_operations_after_representatives() {
        let group = c2();
        assert_eq!(group.order(), 4);
        assert_eq!(group.representatives().len(), 2);
        assert!(group.operations()[0].is_identity(1e-12));
        assert_eq!(group.operations()[2].to_string(), "x+1/2,y+1/2,z");
        assert_eq!(group.operations()[3].to_string(), "-x+1/2,y+1/2,-z");
    }

    #[test]
    fn stored_translations_are_wrapped() {
        let info = info(4, "P21", CrystalSystem::Monoclinic, Centering::Primitive);
        let group = SpaceGroup::new(info, ops(&["x,y,z", "-x,y-1/2,-z"]), vec![]);
        assert_eq!(group.operations()[1].translation()[1], 0.5);
    }

    #[test]
    fn apply_wraps_into_unit_cell() {
        let group = c2();
        let image = group.apply(3, &Point3::new(0.1, 0.2, 0.3)).unwrap();
        assert!((image - Point3::new(0.4, 0.7, 0.7)).norm() < 1e-12);
        assert!(group.apply(4, &Point3::origin()).is_none());
        assert_eq!(group.equivalent_positions(&Point3::new(0.1, 0.2, 0.3)).count(), 4);
    }

    #[test]
    fn validate_closure_accepts_a_group() {
        assert_eq!(c2().validate_closure(1e-6), Ok(()));
    }

    #[test]
    fn validate_closure_reports_missing_identity() {
        let info = info(2, "P-1", CrystalSystem::Triclinic, Centering::Primitive);
        let group = SpaceGroup::new(info, ops(&["-x,-y,-z"]), vec![]);
        assert_eq!(group.validate_closure(1e-6), Err(ClosureDefect::MissingIdentity));
    }

    #[test]
    fn validate_closure_reports_missing_products() {
        let info = info(16, "P222", CrystalSystem::Orthorhombic, Centering::Primitive);
        let group = SpaceGroup::new(info, ops(&["x,y,z", "-x,-y,z", "-x,y,-z"]), vec![]);
        assert!(matches!(
            group.validate_closure(1e-6),
            Err(ClosureDefect::NotClosed { .. })
        ));
    }

    #[test]
    fn validate_closure_reports_missing_inverse() {
        let info = info(75, "P4", CrystalSystem::Tetragonal, Centering::Primitive);
        let group = SpaceGroup::new(info, ops(&["x,y,z", "-y,x,z", "-x,-y,z"]), vec![]);
        assert_eq!(
            group.validate_closure(1e-6),
            Err(ClosureDefect::MissingInverse { index: 1 })
        );
    }

    #[test]
    fn validate_closure_reports_duplicates() {
        let info = info(1, "P1", CrystalSystem::Triclinic, Centering::Primitive);
        let group = SpaceGroup::new(info, ops(&["x,y,z", "x,y,z+1"]), vec![]);
        assert_eq!(
            group.validate_closure(1e-6),
            Err(ClosureDefect::Duplicate { first: 0, second: 1 })
        );
    }

    #[test]
    fn matches_name_ignores_spacing_and_case() {
        let group = c2();
        assert!(group.matches_name("C 2"));
        assert!(group.matches_name("c2"));
        assert!(group.matches_name("5"));
        assert!(!group.matches_name("P2"));
    }

    #[test]
    fn crystal_system_rules_check_cell_shape() {
        let cubic = Lattice::new(4.0, 4.0, 4.0, 90.0, 90.0, 90.0).unwrap();
        let hexagonal = Lattice::new(3.0, 3.0, 5.0, 90.0, 90.0, 120.0).unwrap();
        let rhombohedral = Lattice::new(4.0, 4.0, 4.0, 70.0, 70.0, 70.0).unwrap();
        let monoclinic = Lattice::new(4.0, 5.0, 6.0, 90.0, 100.0, 90.0).unwrap();

        assert!(CrystalSystem::Cubic.allows(&cubic.parameters(), 1e-6));
        assert!(!CrystalSystem::Cubic.allows(&hexagonal.parameters(), 1e-6));
        assert!(CrystalSystem::Hexagonal.allows(&hexagonal.parameters(), 1e-6));
        assert!(CrystalSystem::Trigonal.allows(&hexagonal.parameters(), 1e-6));
        assert!(CrystalSystem::Trigonal.allows(&rhombohedral.parameters(), 1e-6));
        assert!(!CrystalSystem::Hexagonal.allows(&rhombohedral.parameters(), 1e-6));
        assert!(CrystalSystem::Monoclinic.allows(&monoclinic.parameters(), 1e-6));
        assert!(!CrystalSystem::Orthorhombic.allows(&monoclinic.parameters(), 1e-6));
        assert!(CrystalSystem::Triclinic.allows(&monoclinic.parameters(), 1e-6));
        assert!(c2().allows_lattice(&monoclinic, 1e-6));
    }

    #[test]
    fn crystal_system_parses_case_insensitively() {
        assert_eq!("Cubic".parse::<CrystalSystem>(), Ok(CrystalSystem::Cubic));
        assert_eq!("TRIGONAL".parse::<CrystalSystem>(), Ok(CrystalSystem::Trigonal));
        assert!("square".parse::<CrystalSystem>().is_err());
    }

    #[test]
    fn centering_symbols_round_trip() {
        for symbol in ['P', 'A', 'B', 'C', 'I', 'R', 'F'] {
            let centering = Centering::from_symbol(symbol).unwrap();
            assert_eq!(centering.symbol(), symbol);
        }
        assert_eq!(Centering::Face.vectors().len(), 3);
        assert_eq!(Centering::Rhombohedral.vectors().len(), 2);
        assert!(Centering::from_symbol('X').is_none());
    }
}
