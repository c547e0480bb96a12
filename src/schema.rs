//! Field layout registry for type table files
//!
//! Every supported table file (`types/*.txt`) has a registered layout: a
//! sparse mapping from field positions to field names, the minimum field
//! count that distinguishes a data row from headers and comments, an
//! optional header descriptor for tables that support appending rows, and an
//! optional extended layout that some tables switch to mid-file when a row
//! of the extended width is seen (the Albion Prelude variants of `TShips`
//! and `Jobs` carry extra columns over their base-game layout).
//!
//! Field positions may be negative, counting backward from the end of the
//! row; this addresses trailing fields of variable-width rows. The final
//! field of every row is the line terminator itself, so `-1` names that
//! synthetic field and `-2` the last real value.

use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Header descriptor for tables that support row appends
///
/// The header is the first non-comment row whose field count equals
/// `columns`; the field at `count_index` holds the number of data rows and
/// must be bumped whenever rows are appended.
#[derive(Debug, Clone, Copy)]
pub struct HeaderSpec {
    /// Field count of the header row, including the terminator field
    pub columns: usize,
    /// Position of the entry-count field within the header row
    pub count_index: usize,
}

/// Extended layout switch for tables with a second, wider format
#[derive(Debug, Clone, Copy)]
pub struct ExtendedLayout {
    /// Registry identity of the layout to switch to
    pub schema: &'static str,
    /// Observed row width that triggers the switch
    pub trigger_width: usize,
}

/// Registered field layout for one table file
#[derive(Debug)]
pub struct TableSchema {
    /// Registry identity (file name for base layouts)
    pub name: &'static str,
    /// Sparse position-to-name mappings; negative positions count from the
    /// row end
    pub named: &'static [(i32, &'static str)],
    /// Minimum field count for a row to be classified as data
    pub min_data_entries: usize,
    /// Header descriptor, present only for tables that support appends
    pub header: Option<HeaderSpec>,
    /// Extended layout, present only for tables with a second format
    pub extended: Option<ExtendedLayout>,
}

/// Result of resolving a field position against a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldLookup {
    /// No mapping; the position keys itself
    Positional,
    /// A single mapping matched
    Named(&'static str),
    /// Both a positive and a negative mapping matched; authoring error
    Conflict,
}

impl TableSchema {
    /// Resolve the name for field `index` of a row with `width` fields.
    pub(crate) fn lookup(&self, index: usize, width: usize) -> FieldLookup {
        let positive = self.named.iter().find(|(i, _)| *i == index as i32);
        let negative = self
            .named
            .iter()
            .find(|(i, _)| *i == index as i32 - width as i32);
        match (positive, negative) {
            (Some(_), Some(_)) => FieldLookup::Conflict,
            (Some((_, name)), None) | (None, Some((_, name))) => FieldLookup::Named(name),
            (None, None) => FieldLookup::Positional,
        }
    }
}

/// Static layout registry, keyed by table identity.
///
/// Base layouts are keyed by file name; extended layouts use a synthetic
/// `<name>@ap` identity referenced from the base layout's `extended` field.
static REGISTRY: LazyLock<HashMap<&'static str, TableSchema>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for schema in SCHEMAS {
        map.insert(schema.name, schema);
    }
    map
});

/// Look up the layout registered for a table identity.
///
/// Every table the pipeline claims to support must have a registered
/// layout; a miss is a configuration error, not a recoverable condition.
pub fn schema_for(name: &str) -> Result<&'static TableSchema> {
    REGISTRY
        .get(name)
        .ok_or_else(|| Error::SchemaMissing(name.to_string()))
}

const SCHEMAS: [TableSchema; 10] = [
    TableSchema {
        name: "TShields.txt",
        named: &[
            (0, "model_scene"),
            (1, "picture_id"),
            (3, "name_id"),
            (4, "power_drain"),
            (5, "efficiency"),
            (6, "capacity"),
            (-3, "volume"),
            (-2, "id"),
        ],
        min_data_entries: 10,
        header: None,
        extended: None,
    },
    TableSchema {
        name: "TBullets.txt",
        named: &[
            (0, "model_scene"),
            (3, "name_id"),
            (7, "speed"),
            (8, "lifetime"),
            (18, "damage_hull"),
            (19, "damage_shield"),
            (-2, "id"),
        ],
        min_data_entries: 20,
        header: None,
        extended: None,
    },
    TableSchema {
        name: "TLaser.txt",
        named: &[
            (0, "model_scene"),
            (3, "name_id"),
            (7, "fire_delay"),
            (-4, "price"),
            (-2, "id"),
        ],
        min_data_entries: 10,
        header: None,
        extended: None,
    },
    TableSchema {
        name: "TShips.txt",
        named: &[
            (0, "model_scene"),
            (3, "name_id"),
            (7, "speed"),
            (8, "acceleration"),
            (13, "shield_type"),
            (14, "max_shields"),
            (-3, "variant_id"),
            (-2, "id"),
        ],
        min_data_entries: 20,
        header: Some(HeaderSpec {
            columns: 3,
            count_index: 1,
        }),
        extended: Some(ExtendedLayout {
            schema: "TShips.txt@ap",
            trigger_width: 53,
        }),
    },
    // Albion Prelude TShips rows carry extra columns after the turret
    // descriptors; trailing mappings are unchanged.
    TableSchema {
        name: "TShips.txt@ap",
        named: &[
            (0, "model_scene"),
            (3, "name_id"),
            (7, "speed"),
            (8, "acceleration"),
            (13, "shield_type"),
            (14, "max_shields"),
            (45, "war_flags"),
            (-3, "variant_id"),
            (-2, "id"),
        ],
        min_data_entries: 20,
        header: Some(HeaderSpec {
            columns: 3,
            count_index: 1,
        }),
        extended: None,
    },
    TableSchema {
        name: "TFactories.txt",
        named: &[(0, "model_scene"), (3, "name_id"), (-2, "id")],
        min_data_entries: 10,
        header: Some(HeaderSpec {
            columns: 3,
            count_index: 1,
        }),
        extended: None,
    },
    TableSchema {
        name: "Globals.txt",
        named: &[(0, "name"), (1, "value")],
        min_data_entries: 3,
        header: Some(HeaderSpec {
            columns: 2,
            count_index: 0,
        }),
        extended: None,
    },
    TableSchema {
        name: "WareLists.txt",
        named: &[],
        min_data_entries: 3,
        header: Some(HeaderSpec {
            columns: 2,
            count_index: 0,
        }),
        extended: None,
    },
    TableSchema {
        name: "Jobs.txt",
        named: &[(0, "id"), (1, "name"), (-2, "script")],
        min_data_entries: 10,
        header: None,
        extended: Some(ExtendedLayout {
            schema: "Jobs.txt@ap",
            trigger_width: 131,
        }),
    },
    TableSchema {
        name: "Jobs.txt@ap",
        named: &[
            (0, "id"),
            (1, "name"),
            (125, "jump_range"),
            (-2, "script"),
        ],
        min_data_entries: 10,
        header: None,
        extended: None,
    },
];
