//! Selection coordinator.
//!
//! Holds the selected table and column and derives the form state the page
//! shows for them: the foreign-key pickers for a selected table, and the
//! column editor for a selected column.

use erd_core::{COMMON_TYPES, ColumnId, Schema, Selection, Table, TableId, normalize_type_name};

/// `(id, display name)` entry of a picker.
pub type Choice<Id> = (Id, String);

/// Options for the "add foreign key" form of the selected table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForeignKeyChoices {
    /// Columns of the selected table.
    pub source_columns: Vec<Choice<ColumnId>>,
    /// Every table in the document.
    pub target_tables: Vec<Choice<TableId>>,
    /// The target table whose columns are listed.
    pub target_table: Option<TableId>,
    pub target_columns: Vec<Choice<ColumnId>>,
}

/// Current attributes of the selected column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnForm {
    pub table: TableId,
    pub column: ColumnId,
    pub name: String,
    /// One of the common type names; unrecognized types show the first.
    pub type_name: String,
    pub nullable: bool,
    pub default: String,
    pub primary_key: bool,
    pub unique: bool,
}

/// Picker value for a stored type: its canonical spelling when that is one
/// of [`COMMON_TYPES`], otherwise the first entry.
fn picker_type(raw: &str) -> String {
    let normalized = normalize_type_name(raw);
    if COMMON_TYPES.contains(&normalized.as_str()) {
        normalized
    } else {
        COMMON_TYPES[0].to_string()
    }
}

fn column_choices(table: Option<&Table>) -> Vec<Choice<ColumnId>> {
    table
        .map(|t| t.columns.iter().map(|c| (c.id, c.name.clone())).collect())
        .unwrap_or_default()
}

/// Picker contents for `source`, listing the columns of `target` (or of the
/// first table when `target` is absent or unknown).
pub fn foreign_key_choices(
    schema: &Schema,
    source: TableId,
    target: Option<TableId>,
) -> ForeignKeyChoices {
    let target_table = target
        .and_then(|id| schema.table(id))
        .or_else(|| schema.tables.first());
    ForeignKeyChoices {
        source_columns: column_choices(schema.table(source)),
        target_tables: schema
            .tables
            .iter()
            .map(|t| (t.id, t.name.clone()))
            .collect(),
        target_table: target_table.map(|t| t.id),
        target_columns: column_choices(target_table),
    }
}

/// Form state for `column` of `table`; `None` if either is unknown.
pub fn column_form(schema: &Schema, table: TableId, column: ColumnId) -> Option<ColumnForm> {
    let (t, c) = schema.column(table, column)?;
    Some(ColumnForm {
        table,
        column,
        name: c.name.clone(),
        type_name: picker_type(&c.type_name),
        nullable: c.nullable,
        default: c.default.clone().unwrap_or_default(),
        primary_key: t.is_primary_key(column),
        unique: t.is_unique(column),
    })
}

#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    current: Selection,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Selection {
        self.current
    }

    /// Select a table, dropping any column selection. `None`, or an id not
    /// in `schema`, clears the selection. Returns the foreign-key pickers
    /// when a table ends up selected.
    pub fn select_table(
        &mut self,
        schema: &Schema,
        id: Option<TableId>,
    ) -> Option<ForeignKeyChoices> {
        let id = id.filter(|id| schema.table(*id).is_some());
        self.current = Selection::table(id);
        log::debug!("select table {id:?}");
        id.map(|id| foreign_key_choices(schema, id, None))
    }

    /// Select a column and its owning table. Leaves the selection unchanged
    /// when either id does not resolve.
    pub fn select_column(
        &mut self,
        schema: &Schema,
        table: TableId,
        column: ColumnId,
    ) -> Option<ColumnForm> {
        let form = column_form(schema, table, column)?;
        self.current = Selection::column(table, column);
        log::debug!("select column {table}.{column}");
        Some(form)
    }

    pub fn clear(&mut self) {
        self.current = Selection::NONE;
    }

    /// Drop selected ids that no longer exist in `schema`. Returns `true`
    /// when the selection changed.
    pub fn retain_existing(&mut self, schema: &Schema) -> bool {
        let before = self.current;
        self.current = match (before.table_id(), before.column_id()) {
            (Some(t), Some(c)) if schema.column(t, c).is_some() => before,
            (Some(t), _) if schema.table(t).is_some() => Selection::table(Some(t)),
            _ => Selection::NONE,
        };
        self.current != before
    }
}
