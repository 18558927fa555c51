//! Built-in space group records.
//!
//! Each record lists the coset representatives of the primitive part in Jones-faithful
//! notation, identity first; centering translations are added when the record is resolved.
//! The set covers the common settings of every crystal system and centering type.

use phf::{Map, phf_map};

/// One built-in space group, in the textual form shared with TOML tables.
#[derive(Debug, Clone, Copy)]
pub struct GroupRecord {
    pub number: u32,
    pub short_name: &'static str,
    pub full_name: &'static str,
    pub point_group: &'static str,
    pub crystal_system: &'static str,
    pub centering: char,
    pub operations: &'static [&'static str],
}

pub static GROUP_RECORDS: &[GroupRecord] = &[
    GroupRecord {
        number: 1,
        short_name: "P1",
        full_name: "P 1",
        point_group: "1",
        crystal_system: "triclinic",
        centering: 'P',
        operations: &[
            "x,y,z",
        ],
    },
    GroupRecord {
        number: 2,
        short_name: "P-1",
        full_name: "P -1",
        point_group: "-1",
        crystal_system: "triclinic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x,-y,-z",
        ],
    },
    GroupRecord {
        number: 3,
        short_name: "P2",
        full_name: "P 1 2 1",
        point_group: "2",
        crystal_system: "monoclinic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x,y,-z",
        ],
    },
    GroupRecord {
        number: 4,
        short_name: "P21",
        full_name: "P 1 21 1",
        point_group: "2",
        crystal_system: "monoclinic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x,y+1/2,-z",
        ],
    },
    GroupRecord {
        number: 5,
        short_name: "C2",
        full_name: "C 1 2 1",
        point_group: "2",
        crystal_system: "monoclinic",
        centering: 'C',
        operations: &[
            "x,y,z", "-x,y,-z",
        ],
    },
    GroupRecord {
        number: 6,
        short_name: "Pm",
        full_name: "P 1 m 1",
        point_group: "m",
        crystal_system: "monoclinic",
        centering: 'P',
        operations: &[
            "x,y,z", "x,-y,z",
        ],
    },
    GroupRecord {
        number: 7,
        short_name: "Pc",
        full_name: "P 1 c 1",
        point_group: "m",
        crystal_system: "monoclinic",
        centering: 'P',
        operations: &[
            "x,y,z", "x,-y,z+1/2",
        ],
    },
    GroupRecord {
        number: 8,
        short_name: "Cm",
        full_name: "C 1 m 1",
        point_group: "m",
        crystal_system: "monoclinic",
        centering: 'C',
        operations: &[
            "x,y,z", "x,-y,z",
        ],
    },
    GroupRecord {
        number: 10,
        short_name: "P2/m",
        full_name: "P 1 2/m 1",
        point_group: "2/m",
        crystal_system: "monoclinic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x,y,-z", "-x,-y,-z", "x,-y,z",
        ],
    },
    GroupRecord {
        number: 11,
        short_name: "P21/m",
        full_name: "P 1 21/m 1",
        point_group: "2/m",
        crystal_system: "monoclinic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x,y+1/2,-z", "-x,-y,-z", "x,-y+1/2,z",
        ],
    },
    GroupRecord {
        number: 12,
        short_name: "C2/m",
        full_name: "C 1 2/m 1",
        point_group: "2/m",
        crystal_system: "monoclinic",
        centering: 'C',
        operations: &[
            "x,y,z", "-x,y,-z", "-x,-y,-z", "x,-y,z",
        ],
    },
    GroupRecord {
        number: 14,
        short_name: "P21/c",
        full_name: "P 1 21/c 1",
        point_group: "2/m",
        crystal_system: "monoclinic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x,y+1/2,-z+1/2", "-x,-y,-z", "x,-y+1/2,z+1/2",
        ],
    },
    GroupRecord {
        number: 15,
        short_name: "C2/c",
        full_name: "C 1 2/c 1",
        point_group: "2/m",
        crystal_system: "monoclinic",
        centering: 'C',
        operations: &[
            "x,y,z", "-x,y,-z+1/2", "-x,-y,-z", "x,-y,z+1/2",
        ],
    },
    GroupRecord {
        number: 16,
        short_name: "P222",
        full_name: "P 2 2 2",
        point_group: "222",
        crystal_system: "orthorhombic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x,-y,z", "-x,y,-z", "x,-y,-z",
        ],
    },
    GroupRecord {
        number: 19,
        short_name: "P212121",
        full_name: "P 21 21 21",
        point_group: "222",
        crystal_system: "orthorhombic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x+1/2,-y,z+1/2", "-x,y+1/2,-z+1/2", "x+1/2,-y+1/2,-z",
        ],
    },
    GroupRecord {
        number: 25,
        short_name: "Pmm2",
        full_name: "P m m 2",
        point_group: "mm2",
        crystal_system: "orthorhombic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x,-y,z", "x,-y,z", "-x,y,z",
        ],
    },
    GroupRecord {
        number: 47,
        short_name: "Pmmm",
        full_name: "P 2/m 2/m 2/m",
        point_group: "mmm",
        crystal_system: "orthorhombic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x,-y,z", "-x,y,-z", "-x,-y,-z", "x,-y,-z", "x,y,-z", "x,-y,z",
            "-x,y,z",
        ],
    },
    GroupRecord {
        number: 62,
        short_name: "Pnma",
        full_name: "P 21/n 21/m 21/a",
        point_group: "mmm",
        crystal_system: "orthorhombic",
        centering: 'P',
        operations: &[
            "x,y,z", "-x+1/2,-y,z+1/2", "-x,y+1/2,-z", "-x,-y,-z", "x+1/2,-y+1/2,-z+1/2",
            "x+1/2,y,-z+1/2", "x,-y+1/2,z", "-x+1/2,y+1/2,z+1/2",
        ],
    },
    GroupRecord {
        number: 63,
        short_name: "Cmcm",
        full_name: "C 2/m 2/c 21/m",
        point_group: "mmm",
        crystal_system: "orthorhombic",
        centering: 'C',
        operations: &[
            "x,y,z", "-x,-y,z+1/2", "-x,y,-z+1/2", "-x,-y,-z", "x,-y,-z", "x,y,-z+1/2",
            "x,-y,z+1/2", "-x,y,z",
        ],
    },
    GroupRecord {
        number: 65,
        short_name: "Cmmm",
        full_name: "C 2/m 2/m 2/m",
        point_group: "mmm",
        crystal_system: "orthorhombic",
        centering: 'C',
        operations: &[
            "x,y,z", "-x,-y,z", "-x,y,-z", "-x,-y,-z", "x,-y,-z", "x,y,-z", "x,-y,z",
            "-x,y,z",
        ],
    },
    GroupRecord {
        number: 69,
        short_name: "Fmmm",
        full_name: "F 2/m 2/m 2/m",
        point_group: "mmm",
        crystal_system: "orthorhombic",
        centering: 'F',
        operations: &[
            "x,y,z", "-x,-y,z", "-x,y,-z", "-x,-y,-z", "x,-y,-z", "x,y,-z", "x,-y,z",
            "-x,y,z",
        ],
    },
    GroupRecord {
        number: 71,
        short_name: "Immm",
        full_name: "I 2/m 2/m 2/m",
        point_group: "mmm",
        crystal_system: "orthorhombic",
        centering: 'I',
        operations: &[
            "x,y,z", "-x,-y,z", "-x,y,-z", "-x,-y,-z", "x,-y,-z", "x,y,-z", "x,-y,z",
            "-x,y,z",
        ],
    },
    GroupRecord {
        number: 75,
        short_name: "P4",
        full_name: "P 4",
        point_group: "4",
        crystal_system: "tetragonal",
        centering: 'P',
        operations: &[
            "x,y,z", "-y,x,z", "-x,-y,z", "y,-x,z",
        ],
    },
    GroupRecord {
        number: 99,
        short_name: "P4mm",
        full_name: "P 4 m m",
        point_group: "4mm",
        crystal_system: "tetragonal",
        centering: 'P',
        operations: &[
            "x,y,z", "-y,x,z", "x,-y,z", "-x,-y,z", "y,x,z", "-y,-x,z", "y,-x,z", "-x,y,z",
        ],
    },
    GroupRecord {
        number: 123,
        short_name: "P4/mmm",
        full_name: "P 4/m 2/m 2/m",
        point_group: "4/mmm",
        crystal_system: "tetragonal",
        centering: 'P',
        operations: &[
            "x,y,z", "-y,x,z", "x,-y,-z", "-x,-y,-z", "-x,-y,z", "y,x,-z", "y,-x,-z",
            "-y,-x,-z", "-x,y,z", "y,-x,z", "-x,y,-z", "x,y,-z", "-y,-x,z", "y,x,z",
            "-y,x,-z", "x,-y,z",
        ],
    },
    GroupRecord {
        number: 139,
        short_name: "I4/mmm",
        full_name: "I 4/m 2/m 2/m",
        point_group: "4/mmm",
        crystal_system: "tetragonal",
        centering: 'I',
        operations: &[
            "x,y,z", "-y,x,z", "x,-y,-z", "-x,-y,-z", "-x,-y,z", "y,x,-z", "y,-x,-z",
            "-y,-x,-z", "-x,y,z", "y,-x,z", "-x,y,-z", "x,y,-z", "-y,-x,z", "y,x,z",
            "-y,x,-z", "x,-y,z",
        ],
    },
    GroupRecord {
        number: 143,
        short_name: "P3",
        full_name: "P 3",
        point_group: "3",
        crystal_system: "trigonal",
        centering: 'P',
        operations: &[
            "x,y,z", "-y,x-y,z", "-x+y,-x,z",
        ],
    },
    GroupRecord {
        number: 148,
        short_name: "R-3",
        full_name: "R -3",
        point_group: "-3",
        crystal_system: "trigonal",
        centering: 'R',
        operations: &[
            "x,y,z", "-y,x-y,z", "-x,-y,-z", "-x+y,-x,z", "y,-x+y,-z", "x-y,x,-z",
        ],
    },
    GroupRecord {
        number: 166,
        short_name: "R-3m",
        full_name: "R -3 2/m",
        point_group: "-3m",
        crystal_system: "trigonal",
        centering: 'R',
        operations: &[
            "x,y,z", "-y,x-y,z", "y,x,-z", "-x,-y,-z", "-x+y,-x,z", "-x,-x+y,-z",
            "y,-x+y,-z", "x-y,-y,-z", "-y,-x,z", "x-y,x,-z", "x,x-y,z", "-x+y,y,z",
        ],
    },
    GroupRecord {
        number: 191,
        short_name: "P6/mmm",
        full_name: "P 6/m 2/m 2/m",
        point_group: "6/mmm",
        crystal_system: "hexagonal",
        centering: 'P',
        operations: &[
            "x,y,z", "x-y,x,z", "y,x,-z", "-x,-y,-z", "-y,x-y,z", "-x+y,y,-z", "-x+y,-x,-z",
            "x,x-y,-z", "-y,-x,z", "-x,-y,z", "-x,-x+y,-z", "y,-x+y,-z", "x-y,-y,z",
            "x-y,-y,-z", "y,-x+y,z", "-x,-x+y,z", "-x+y,-x,z", "-y,-x,-z", "x,y,-z",
            "x,x-y,z", "-x+y,y,z", "-y,x-y,-z", "x-y,x,-z", "y,x,z",
        ],
    },
    GroupRecord {
        number: 194,
        short_name: "P63/mmc",
        full_name: "P 63/m 2/m 2/c",
        point_group: "6/mmm",
        crystal_system: "hexagonal",
        centering: 'P',
        operations: &[
            "x,y,z", "x-y,x,z+1/2", "y,x,-z", "-x,-y,-z", "-y,x-y,z", "-x+y,y,-z+1/2",
            "-x+y,-x,-z+1/2", "x,x-y,-z+1/2", "-y,-x,z", "-x,-y,z+1/2", "-x,-x+y,-z",
            "y,-x+y,-z", "x-y,-y,z+1/2", "x-y,-y,-z", "y,-x+y,z+1/2", "-x,-x+y,z+1/2",
            "-x+y,-x,z", "-y,-x,-z+1/2", "x,y,-z+1/2", "x,x-y,z", "-x+y,y,z",
            "-y,x-y,-z+1/2", "x-y,x,-z", "y,x,z+1/2",
        ],
    },
    GroupRecord {
        number: 216,
        short_name: "F-43m",
        full_name: "F -4 3 m",
        point_group: "-43m",
        crystal_system: "cubic",
        centering: 'F',
        operations: &[
            "x,y,z", "z,x,y", "-x,-y,z", "y,-x,-z", "y,z,x", "z,-x,-y", "-z,y,-x",
            "-z,-x,y", "-y,x,-z", "x,-z,-y", "-y,z,-x", "-x,-z,y", "y,-z,-x", "-z,-y,x",
            "-y,-z,x", "-z,x,-y", "z,-y,-x", "-x,z,-y", "-x,y,-z", "x,-y,-z", "-y,-x,z",
            "x,z,y", "z,y,x", "y,x,z",
        ],
    },
    GroupRecord {
        number: 221,
        short_name: "Pm-3m",
        full_name: "P 4/m -3 2/m",
        point_group: "m-3m",
        crystal_system: "cubic",
        centering: 'P',
        operations: &[
            "x,y,z", "z,x,y", "-y,x,z", "-x,-y,-z", "y,z,x", "z,-y,x", "-z,-x,-y", "-x,z,y",
            "-x,-y,z", "y,-x,-z", "x,z,-y", "-y,-z,-x", "y,-x,z", "z,-x,-y", "-z,y,-x",
            "-z,y,x", "x,-z,-y", "-z,-x,y", "x,y,-z", "z,y,-x", "-y,z,-x", "-x,-z,y",
            "x,-z,y", "-y,x,-z", "y,-z,-x", "-z,x,y", "-z,x,-y", "z,-y,-x", "-y,-z,x",
            "z,x,-y", "y,x,-z", "-z,-y,x", "-x,y,-z", "y,-z,x", "-x,z,-y", "x,-y,-z",
            "-y,z,x", "-z,-y,-x", "z,-x,y", "-x,-z,-y", "y,z,-x", "-y,-x,z", "x,-y,z",
            "-y,-x,-z", "-x,y,z", "z,y,x", "x,z,y", "y,x,z",
        ],
    },
    GroupRecord {
        number: 225,
        short_name: "Fm-3m",
        full_name: "F 4/m -3 2/m",
        point_group: "m-3m",
        crystal_system: "cubic",
        centering: 'F',
        operations: &[
            "x,y,z", "z,x,y", "-y,x,z", "-x,-y,-z", "y,z,x", "z,-y,x", "-z,-x,-y", "-x,z,y",
            "-x,-y,z", "y,-x,-z", "x,z,-y", "-y,-z,-x", "y,-x,z", "z,-x,-y", "-z,y,-x",
            "-z,y,x", "x,-z,-y", "-z,-x,y", "x,y,-z", "z,y,-x", "-y,z,-x", "-x,-z,y",
            "x,-z,y", "-y,x,-z", "y,-z,-x", "-z,x,y", "-z,x,-y", "z,-y,-x", "-y,-z,x",
            "z,x,-y", "y,x,-z", "-z,-y,x", "-x,y,-z", "y,-z,x", "-x,z,-y", "x,-y,-z",
            "-y,z,x", "-z,-y,-x", "z,-x,y", "-x,-z,-y", "y,z,-x", "-y,-x,z", "x,-y,z",
            "-y,-x,-z", "-x,y,z", "z,y,x", "x,z,y", "y,x,z",
        ],
    },
    GroupRecord {
        number: 229,
        short_name: "Im-3m",
        full_name: "I 4/m -3 2/m",
        point_group: "m-3m",
        crystal_system: "cubic",
        centering: 'I',
        operations: &[
            "x,y,z", "z,x,y", "-y,x,z", "-x,-y,-z", "y,z,x", "z,-y,x", "-z,-x,-y", "-x,z,y",
            "-x,-y,z", "y,-x,-z", "x,z,-y", "-y,-z,-x", "y,-x,z", "z,-x,-y", "-z,y,-x",
            "-z,y,x", "x,-z,-y", "-z,-x,y", "x,y,-z", "z,y,-x", "-y,z,-x", "-x,-z,y",
            "x,-z,y", "-y,x,-z", "y,-z,-x", "-z,x,y", "-z,x,-y", "z,-y,-x", "-y,-z,x",
            "z,x,-y", "y,x,-z", "-z,-y,x", "-x,y,-z", "y,-z,x", "-x,z,-y", "x,-y,-z",
            "-y,z,x", "-z,-y,-x", "z,-x,y", "-x,-z,-y", "y,z,-x", "-y,-x,z", "x,-y,z",
            "-y,-x,-z", "-x,y,z", "z,y,x", "x,z,y", "y,x,z",
        ],
    },
];

/// Normalized symbols (see `normalize_symbol`) of the built-in groups, including a few
/// customary alternatives, mapped to International Tables numbers.
pub static SYMBOL_ALIASES: Map<&'static str, u32> = phf_map! {
    "P1" => 1,
    "P-1" => 2,
    "P2" => 3,
    "P121" => 3,
    "P21" => 4,
    "P1211" => 4,
    "C2" => 5,
    "C121" => 5,
    "PM" => 6,
    "P1M1" => 6,
    "PC" => 7,
    "P1C1" => 7,
    "CM" => 8,
    "C1M1" => 8,
    "P2/M" => 10,
    "P12/M1" => 10,
    "P21/M" => 11,
    "P121/M1" => 11,
    "C2/M" => 12,
    "C12/M1" => 12,
    "P21/C" => 14,
    "P121/C1" => 14,
    "C2/C" => 15,
    "C12/C1" => 15,
    "P222" => 16,
    "P212121" => 19,
    "PMM2" => 25,
    "PMMM" => 47,
    "P2/M2/M2/M" => 47,
    "PNMA" => 62,
    "P21/N21/M21/A" => 62,
    "CMCM" => 63,
    "C2/M2/C21/M" => 63,
    "CMMM" => 65,
    "C2/M2/M2/M" => 65,
    "FMMM" => 69,
    "F2/M2/M2/M" => 69,
    "IMMM" => 71,
    "I2/M2/M2/M" => 71,
    "P4" => 75,
    "P4MM" => 99,
    "P4/MMM" => 123,
    "P4/M2/M2/M" => 123,
    "I4/MMM" => 139,
    "I4/M2/M2/M" => 139,
    "P3" => 143,
    "R-3" => 148,
    "R-3M" => 166,
    "R-32/M" => 166,
    "P6/MMM" => 191,
    "P6/M2/M2/M" => 191,
    "P63/MMC" => 194,
    "P63/M2/M2/C" => 194,
    "F-43M" => 216,
    "PM-3M" => 221,
    "P4/M-32/M" => 221,
    "FM-3M" => 225,
    "F4/M-32/M" => 225,
    "IM-3M" => 229,
    "I4/M-32/M" => 229,
    "FM3M" => 225,
    "PM3M" => 221,
    "IM3M" => 229,
    "F43M" => 216,
};
