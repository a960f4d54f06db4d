//! Attribute schema resolution.
//!
//! Turns raw attribute names (a CSV title row, or a JSON header's name and
//! size arrays) into the expanded list of scalar column names plus the
//! column index of each special role.

use serde::Serialize;
use tracing::warn;

use crate::util::{Error, Result};

// ============================================================================
// Special attributes
// ============================================================================

/// Semantic roles a column can be recognised as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum SpecialAttribute {
    Position = 0,
    Normal,
    Time,
    PointId,
    Life,
    Color,
    Alpha,
    Velocity,
    Type,
    Impulse,
    Age,
}

impl SpecialAttribute {
    /// Number of roles.
    pub const COUNT: usize = 11;

    /// All roles in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Position,
        Self::Normal,
        Self::Time,
        Self::PointId,
        Self::Life,
        Self::Color,
        Self::Alpha,
        Self::Velocity,
        Self::Type,
        Self::Impulse,
        Self::Age,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human readable name.
    pub fn label(self) -> &'static str {
        match self {
            Self::Position => "Position",
            Self::Normal => "Normal",
            Self::Time => "Time",
            Self::PointId => "ID",
            Self::Life => "Life",
            Self::Color => "Color",
            Self::Alpha => "Alpha",
            Self::Velocity => "Velocity",
            Self::Type => "Type",
            Self::Impulse => "Impulse",
            Self::Age => "Age",
        }
    }
}

/// Column index per special role; `None` when the role is absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpecialIndexes([Option<usize>; SpecialAttribute::COUNT]);

impl SpecialIndexes {
    #[inline]
    pub fn get(&self, role: SpecialAttribute) -> Option<usize> {
        self.0[role.index()]
    }

    #[inline]
    pub fn set(&mut self, role: SpecialAttribute, column: usize) {
        self.0[role.index()] = Some(column);
    }

    /// Register `column` for `role` unless the role is already taken.
    pub fn set_if_absent(&mut self, role: SpecialAttribute, column: usize) {
        if self.0[role.index()].is_none() {
            self.0[role.index()] = Some(column);
        }
    }

    /// Offset every registered column after `column` by `by`.
    pub fn shift_after(&mut self, column: usize, by: usize) {
        for slot in self.0.iter_mut().flatten() {
            if *slot > column {
                *slot += by;
            }
        }
    }

    /// Indices as signed ints with `-1` for absent roles.
    pub fn to_i32_array(&self) -> [i32; SpecialAttribute::COUNT] {
        let mut out = [-1; SpecialAttribute::COUNT];
        for (dst, src) in out.iter_mut().zip(self.0.iter()) {
            if let Some(column) = src {
                *dst = *column as i32;
            }
        }
        out
    }
}

// ============================================================================
// Name classification
// ============================================================================

/// How a multi-component header attribute names its components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ComponentKind {
    Vector,
    Color,
    Generic,
}

fn eq_any(name: &str, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| name.eq_ignore_ascii_case(c))
}

fn contains_time(name: &str) -> bool {
    name.to_ascii_lowercase().contains("time")
}

/// Role of a CSV title entry. First matching rule wins.
fn classify_title(name: &str) -> Option<SpecialAttribute> {
    use SpecialAttribute::*;
    if eq_any(name, &["P.x", "P", "Px", "X"]) {
        Some(Position)
    } else if eq_any(name, &["N.x", "N", "Nx"]) {
        Some(Normal)
    } else if contains_time(name) || eq_any(name, &["T"]) {
        Some(Time)
    } else if eq_any(name, &["id", "#"]) {
        Some(PointId)
    } else if eq_any(name, &["life"]) {
        Some(Life)
    } else if eq_any(name, &["age"]) {
        Some(Age)
    } else if eq_any(name, &["Cd.r", "Cd"]) {
        Some(Color)
    } else if eq_any(name, &["alpha", "A"]) {
        Some(Alpha)
    } else if eq_any(name, &["v.x", "v", "Vx"]) {
        Some(Velocity)
    } else if eq_any(name, &["type"]) {
        Some(Type)
    } else if eq_any(name, &["impulse"]) {
        Some(Impulse)
    } else {
        None
    }
}

/// Role and component naming of a JSON header attribute.
fn classify_header(name: &str) -> (Option<SpecialAttribute>, ComponentKind) {
    use SpecialAttribute::*;
    if eq_any(name, &["P"]) {
        (Some(Position), ComponentKind::Vector)
    } else if eq_any(name, &["N"]) {
        (Some(Normal), ComponentKind::Vector)
    } else if contains_time(name) {
        (Some(Time), ComponentKind::Generic)
    } else if eq_any(name, &["id"]) {
        (Some(PointId), ComponentKind::Generic)
    } else if eq_any(name, &["life"]) {
        (Some(Life), ComponentKind::Generic)
    } else if eq_any(name, &["age"]) {
        (Some(Age), ComponentKind::Generic)
    } else if eq_any(name, &["Cd"]) {
        (Some(Color), ComponentKind::Color)
    } else if eq_any(name, &["alpha"]) {
        (Some(Alpha), ComponentKind::Generic)
    } else if eq_any(name, &["v"]) {
        (Some(Velocity), ComponentKind::Vector)
    } else if eq_any(name, &["type"]) {
        (Some(Type), ComponentKind::Generic)
    } else if eq_any(name, &["impulse"]) {
        (Some(Impulse), ComponentKind::Generic)
    } else {
        (None, ComponentKind::Generic)
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Expanded attribute names and the special role table.
#[derive(Clone, Debug, Default)]
pub struct AttributeSchema {
    /// One name per scalar column.
    pub names: Vec<String>,
    /// Role to column map.
    pub special: SpecialIndexes,
    /// Column count used for the sample table.
    pub number_of_attributes: usize,
}

impl AttributeSchema {
    /// Column of `role`, if it is registered and inside the table.
    pub fn role_index(&self, role: SpecialAttribute) -> Option<usize> {
        self.special
            .get(role)
            .filter(|&column| column < self.number_of_attributes)
    }

    /// Resolve a CSV title row.
    ///
    /// `first_row` is the first data row; parenthesised groups in it mark
    /// packed vectors that are expanded in the title. Returns the schema and
    /// whether any packed group was found.
    pub fn from_csv_title(title_row: &str, first_row: &str) -> Result<(Self, bool)> {
        let mut names: Vec<String> = title_row
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.replace(' ', ""))
            .collect();

        if names.is_empty() {
            return Err(Error::InvalidTitleRow("not enough columns".into()));
        }

        let mut special = SpecialIndexes::default();
        for (column, name) in names.iter().enumerate() {
            if let Some(role) = classify_title(name) {
                special.set_if_absent(role, column);
            }
        }

        let mut schema = Self {
            number_of_attributes: names.len(),
            names: Vec::new(),
            special,
        };

        let mut has_packed = false;
        let mut search_from = 0;
        while let Some(found) = first_row[search_from..].find('(') {
            let open = search_from + found;
            search_from = open + 1;

            // Commas before the group give its (already expanded) column
            let column = first_row[..open].matches(',').count();
            if column >= names.len() {
                warn!(
                    "Couldn't unpack vector found at character {} in the first row",
                    open + 1
                );
                continue;
            }

            let Some(close) = first_row[open..].find(')') else {
                continue;
            };
            let size = first_row[open + 1..open + close].matches(',').count() + 1;
            if size < 2 {
                continue;
            }

            schema.number_of_attributes += size - 1;
            schema.expand_packed(&mut names, column, size);
            has_packed = true;
        }

        if names.len() != schema.number_of_attributes {
            warn!(
                "Found {} columns but the title row has {} values, some values will be offset",
                schema.number_of_attributes,
                names.len()
            );
        }
        let first_row_columns = first_row.matches(',').count() + 1;
        if first_row_columns != schema.number_of_attributes {
            warn!(
                "Found {} columns but the first row has {} values, some values will be offset",
                schema.number_of_attributes, first_row_columns
            );
        }

        schema.names = names;
        Ok((schema, has_packed))
    }

    /// Expand the title entry at `column` into `size` component names.
    fn expand_packed(&mut self, names: &mut Vec<String>, column: usize, size: usize) {
        use SpecialAttribute::*;

        let is = |role| self.role_index(role) == Some(column);
        let mut set_alpha = false;

        if is(Position) && size == 3 {
            splice_components(names, column, &["P.x", "P.y", "P.z"]);
        } else if is(Normal) && size == 3 {
            splice_components(names, column, &["N.x", "N.y", "N.z"]);
        } else if is(Velocity) && size == 3 {
            splice_components(names, column, &["v.x", "v.y", "v.z"]);
        } else if is(Color) && (size == 3 || size == 4) {
            if size == 4 {
                splice_components(names, column, &["Cd.r", "Cd.g", "Cd.b", "Cd.a"]);
                set_alpha = self.role_index(Alpha).is_none();
            } else {
                splice_components(names, column, &["Cd.r", "Cd.g", "Cd.b"]);
            }
        } else {
            let base = names[column].clone();
            let components: Vec<String> = (0..size).map(|n| format!("{}.{}", base, n)).collect();
            let refs: Vec<&str> = components.iter().map(String::as_str).collect();
            splice_components(names, column, &refs);
        }

        self.special.shift_after(column, size - 1);
        if set_alpha {
            self.special.set(Alpha, column + 3);
        }
    }

    /// Resolve a JSON-family header. Returns the schema and the number of
    /// values each sample carries in the file.
    ///
    /// A `time` column is appended when no attribute resolves to time.
    pub fn from_header<S: AsRef<str>>(names: &[S], sizes: &[usize]) -> (Self, usize) {
        const VECTOR: [char; 4] = ['x', 'y', 'z', 'w'];
        const COLOR: [char; 4] = ['r', 'g', 'b', 'a'];

        let mut schema = Self::default();
        let mut column = 0;

        for (raw, &size) in names.iter().zip(sizes) {
            let name = raw.as_ref().replace(' ', "");
            let (role, kind) = classify_header(&name);
            if let Some(role) = role {
                schema.special.set_if_absent(role, column);
            }

            if size > 1 {
                for component in 0..size {
                    let suffix = match kind {
                        ComponentKind::Vector if component < 4 => VECTOR[component].to_string(),
                        ComponentKind::Color if component < 4 => COLOR[component].to_string(),
                        _ => (component + 1).to_string(),
                    };
                    schema.names.push(format!("{}.{}", name, suffix));
                }
            } else if size == 1 {
                schema.names.push(name);
            }
            column += size;
        }

        let file_components = column;
        schema.number_of_attributes = schema.names.len();

        if schema.role_index(SpecialAttribute::Time).is_none() {
            schema.names.push("time".to_string());
            schema.number_of_attributes = schema.names.len();
            schema.special.set(SpecialAttribute::Time, schema.number_of_attributes - 1);
        }

        (schema, file_components)
    }
}

/// Replace `names[column]` with `components[0]` and insert the rest after it.
fn splice_components(names: &mut Vec<String>, column: usize, components: &[&str]) {
    let replacement = components.iter().map(|s| s.to_string());
    names.splice(column..column + 1, replacement);
}

/// Find a column by name.
///
/// Exact match first. Otherwise, when `query` has no `.`, the first column
/// named `query.<component>` (prefix compared case-insensitively).
pub fn find_attribute<S: AsRef<str>>(names: &[S], query: &str) -> Option<usize> {
    if let Some(index) = names.iter().position(|n| n.as_ref() == query) {
        return Some(index);
    }
    if query.contains('.') {
        return None;
    }
    let prefix_len = query.len();
    names.iter().position(|n| {
        let n = n.as_ref();
        n.len() > prefix_len
            && n.is_char_boundary(prefix_len)
            && n[..prefix_len].eq_ignore_ascii_case(query)
            && n.as_bytes()[prefix_len] == b'.'
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use SpecialAttribute::*;

    #[test]
    fn test_plain_title() {
        let (schema, packed) =
            AttributeSchema::from_csv_title("id, P.x,P.y,P.z, time ,life", "0,1,2,3,0.5,2").unwrap();
        assert!(!packed);
        assert_eq!(schema.names, vec!["id", "P.x", "P.y", "P.z", "time", "life"]);
        assert_eq!(schema.role_index(PointId), Some(0));
        assert_eq!(schema.role_index(Position), Some(1));
        assert_eq!(schema.role_index(Time), Some(4));
        assert_eq!(schema.role_index(Life), Some(5));
        assert_eq!(schema.role_index(Normal), None);
    }

    #[test]
    fn test_packed_title() {
        let (schema, packed) = AttributeSchema::from_csv_title(
            "P,N,Cd",
            "\"(1,2,3)\",\"(0,1,0)\",\"(0.5,0.5,0.5,1)\"",
        )
        .unwrap();
        assert!(packed);
        assert_eq!(
            schema.names,
            vec!["P.x", "P.y", "P.z", "N.x", "N.y", "N.z", "Cd.r", "Cd.g", "Cd.b", "Cd.a"]
        );
        assert_eq!(schema.number_of_attributes, 10);
        assert_eq!(schema.role_index(Position), Some(0));
        assert_eq!(schema.role_index(Normal), Some(3));
        assert_eq!(schema.role_index(Color), Some(6));
        assert_eq!(schema.role_index(Alpha), Some(9));
    }

    #[test]
    fn test_packed_generic_and_shift() {
        let (schema, _) =
            AttributeSchema::from_csv_title("id,orient,time", "3,\"(0,0,0,1)\",0.5").unwrap();
        assert_eq!(
            schema.names,
            vec!["id", "orient.0", "orient.1", "orient.2", "orient.3", "time"]
        );
        assert_eq!(schema.role_index(PointId), Some(0));
        assert_eq!(schema.role_index(Time), Some(5));
    }

    #[test]
    fn test_first_match_wins() {
        let (schema, _) = AttributeSchema::from_csv_title("time,frame_time,Px,X", "0,0,0,0").unwrap();
        assert_eq!(schema.role_index(Time), Some(0));
        assert_eq!(schema.role_index(Position), Some(2));
    }

    #[test]
    fn test_empty_title() {
        assert!(AttributeSchema::from_csv_title(",,", "1").is_err());
    }

    #[test]
    fn test_header_schema() {
        let (schema, components) =
            AttributeSchema::from_header(&["id", "P", "Cd", "orient", "age"], &[1, 3, 4, 4, 1]);
        assert_eq!(components, 13);
        assert_eq!(
            schema.names,
            vec![
                "id", "P.x", "P.y", "P.z", "Cd.r", "Cd.g", "Cd.b", "Cd.a", "orient.1",
                "orient.2", "orient.3", "orient.4", "age", "time"
            ]
        );
        assert_eq!(schema.number_of_attributes, 14);
        assert_eq!(schema.role_index(Position), Some(1));
        assert_eq!(schema.role_index(Color), Some(4));
        assert_eq!(schema.role_index(Age), Some(12));
        assert_eq!(schema.role_index(Time), Some(13));
    }

    #[test]
    fn test_header_with_time() {
        let (schema, components) = AttributeSchema::from_header(&["time", "P"], &[1, 3]);
        assert_eq!(components, 4);
        assert_eq!(schema.number_of_attributes, 4);
        assert_eq!(schema.role_index(Time), Some(0));
    }

    #[test]
    fn test_find_attribute() {
        let names = ["id", "P.x", "P.y", "P.z", "Cd.r", "Cd.g", "Cd.b"];
        assert_eq!(find_attribute(&names, "P.y"), Some(2));
        assert_eq!(find_attribute(&names, "p"), Some(1));
        assert_eq!(find_attribute(&names, "cd"), Some(4));
        assert_eq!(find_attribute(&names, "C"), None);
        assert_eq!(find_attribute(&names, "p.q"), None);
        assert_eq!(find_attribute(&names, "id"), Some(0));
    }

    #[test]
    fn test_special_to_i32() {
        let mut special = SpecialIndexes::default();
        special.set(Time, 4);
        let arr = special.to_i32_array();
        assert_eq!(arr[Time.index()], 4);
        assert_eq!(arr[Position.index()], -1);
    }
}
