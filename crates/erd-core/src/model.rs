//! Schema document model.
//!
//! The document is a flat list of tables (each owning its columns and
//! column-level constraints) plus a list of foreign keys that reference
//! tables and columns by id. Ids are interned, so the model is cheap to
//! clone and compare. The JSON shape (camelCase, `type` for the column type)
//! is the persisted document format.

use crate::id::{ColumnId, ConstraintId, ForeignKeyId, TableId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Column-id list used by keys and constraints; almost always 1–2 entries.
pub type ColumnList = SmallVec<[ColumnId; 2]>;

/// Reads an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid schema document: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode schema document: {0}")]
    Encode(#[source] serde_json::Error),
}

// ─── Position & colour ───────────────────────────────────────────────────

/// Top-left corner of a table node in diagram space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Header colour key of a table node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum TableColor {
    #[default]
    White,
    Blue,
    Green,
    Red,
}

impl TableColor {
    pub const ALL: [TableColor; 4] = [Self::White, Self::Blue, Self::Green, Self::Red];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Red => "red",
        }
    }
}

/// Unknown keys fall back to white.
impl From<String> for TableColor {
    fn from(s: String) -> Self {
        match s.as_str() {
            "blue" => Self::Blue,
            "green" => Self::Green,
            "red" => Self::Red,
            _ => Self::White,
        }
    }
}

impl Serialize for TableColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ─── Columns & constraints ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub id: ConstraintId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: ColumnList,
}

// ─── Tables ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: TableId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<Column>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary_key: ColumnList,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unique_constraints: Vec<UniqueConstraint>,
    /// Carried through untouched; the editor does not manage indexes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub indexes: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: TableColor,
}

impl Table {
    pub fn new(id: TableId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            columns: Vec::new(),
            primary_key: ColumnList::new(),
            unique_constraints: Vec::new(),
            indexes: Vec::new(),
            position: None,
            color: TableColor::default(),
        }
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_mut(&mut self, id: ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == id)
    }

    /// Row index of a column in display order.
    pub fn column_index(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn is_primary_key(&self, id: ColumnId) -> bool {
        self.primary_key.contains(&id)
    }

    pub fn is_unique(&self, id: ColumnId) -> bool {
        self.unique_constraints
            .iter()
            .any(|uq| uq.columns.contains(&id))
    }

    pub fn has_column_named(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

// ─── Foreign keys ────────────────────────────────────────────────────────

/// SQL referential action for `ON DELETE` / `ON UPDATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl ReferentialAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for ReferentialAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', " ").to_ascii_uppercase();
        match normalized.as_str() {
            "NO ACTION" => Ok(Self::NoAction),
            "CASCADE" => Ok(Self::Cascade),
            "SET NULL" => Ok(Self::SetNull),
            "SET DEFAULT" => Ok(Self::SetDefault),
            "RESTRICT" => Ok(Self::Restrict),
            _ => Err(format!("unknown referential action: {s}")),
        }
    }
}

impl From<String> for ReferentialAction {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_else(|e| {
            log::warn!("{e}; using NO ACTION");
            Self::NoAction
        })
    }
}

impl Serialize for ReferentialAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_sql())
    }
}

/// One end of a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FkEndpoint {
    pub table: TableId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: ColumnList,
}

impl FkEndpoint {
    pub fn single(table: TableId, column: ColumnId) -> Self {
        let mut columns = ColumnList::new();
        columns.push(column);
        Self { table, columns }
    }

    pub fn references(&self, table: TableId, column: ColumnId) -> bool {
        self.table == table && self.columns.contains(&column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub id: ForeignKeyId,
    pub from: FkEndpoint,
    pub to: FkEndpoint,
    #[serde(default, deserialize_with = "null_as_default")]
    pub on_delete: ReferentialAction,
    #[serde(default, deserialize_with = "null_as_default")]
    pub on_update: ReferentialAction,
}

impl ForeignKey {
    /// Whether either end of this key involves the given column.
    pub fn touches_column(&self, table: TableId, column: ColumnId) -> bool {
        self.from.references(table, column) || self.to.references(table, column)
    }

    pub fn touches_table(&self, table: TableId) -> bool {
        self.from.table == table || self.to.table == table
    }
}

// ─── Schema ──────────────────────────────────────────────────────────────

/// The complete schema document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tables: Vec<Table>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Decode a schema document from JSON.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(text).map_err(SchemaError::Decode)
    }

    /// Encode as pretty-printed JSON (two-space indent).
    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self).map_err(SchemaError::Encode)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string(self).map_err(SchemaError::Encode)
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn table_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == id)
    }

    pub fn has_table_named(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }

    /// Look up a column through its owning table.
    pub fn column(&self, table: TableId, column: ColumnId) -> Option<(&Table, &Column)> {
        let t = self.table(table)?;
        let c = t.column(column)?;
        Some((t, c))
    }

    /// Whether any foreign key references the column at either end.
    pub fn is_foreign_key_column(&self, table: TableId, column: ColumnId) -> bool {
        self.foreign_keys
            .iter()
            .any(|fk| fk.touches_column(table, column))
    }

    /// Resolve an endpoint to its table and first column.
    /// `None` when the table or column no longer exists.
    pub fn resolve_endpoint(&self, endpoint: &FkEndpoint) -> Option<(&Table, &Column)> {
        let column = *endpoint.columns.first()?;
        self.column(endpoint.table, column)
    }
}

// ─── Selection ───────────────────────────────────────────────────────────

/// Which table, and optionally which of its columns, is selected.
///
/// Fields are private so the pairing rule holds by construction: a column
/// is only ever selected together with its owning table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    table: Option<TableId>,
    column: Option<ColumnId>,
}

impl Selection {
    pub const NONE: Selection = Selection {
        table: None,
        column: None,
    };

    /// Select a table (or nothing); any column selection is dropped.
    pub fn table(id: Option<TableId>) -> Self {
        Self {
            table: id,
            column: None,
        }
    }

    /// Select a column together with its owning table.
    pub fn column(table: TableId, column: ColumnId) -> Self {
        Self {
            table: Some(table),
            column: Some(column),
        }
    }

    pub fn table_id(&self) -> Option<TableId> {
        self.table
    }

    pub fn column_id(&self) -> Option<ColumnId> {
        self.column
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_none()
    }

    pub fn is_table_selected(&self, id: TableId) -> bool {
        self.table == Some(id)
    }

    pub fn is_column_selected(&self, table: TableId, column: ColumnId) -> bool {
        self.table == Some(table) && self.column == Some(column)
    }
}
