//! Schema edits.
//!
//! Every change the page's forms can make is a [`SchemaEdit`]. Applying one
//! mutates the document in place and reports which selection the page
//! should show next; the session then persists and re-renders.

use erd_core::{
    COMMON_TYPES, Column, ColumnId, ConstraintId, FkEndpoint, ForeignKey, ForeignKeyId, Position,
    ReferentialAction, Schema, Selection, Table, TableColor, TableId, UniqueConstraint,
};
use smallvec::smallvec;

/// Offset of the first new table and stagger between successive ones.
const NEW_TABLE_ORIGIN: f64 = 80.0;
const NEW_TABLE_STAGGER: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Name is required")]
    EmptyName,
    #[error("Name already used")]
    DuplicateTableName(String),
    #[error("Unknown table {0}")]
    TableNotFound(TableId),
    #[error("Unknown field {column} in table {table}")]
    ColumnNotFound { table: TableId, column: ColumnId },
    #[error("Foreign key endpoint {table}.{column} does not exist")]
    UnresolvedEndpoint { table: TableId, column: ColumnId },
}

/// Column attributes as entered in the field form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnDraft {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
    pub unique: bool,
}

impl ColumnDraft {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            ..Self::default()
        }
    }

    fn clean_type(&self) -> String {
        let t = self.type_name.trim();
        if t.is_empty() {
            COMMON_TYPES[0].to_string()
        } else {
            t.to_string()
        }
    }

    fn clean_default(&self) -> Option<String> {
        self.default
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaEdit {
    AddTable {
        name: String,
    },
    RenameTable {
        id: TableId,
        name: String,
    },
    DeleteTable {
        id: TableId,
    },
    SetTableColor {
        id: TableId,
        color: TableColor,
    },
    AddColumn {
        table: TableId,
        draft: ColumnDraft,
    },
    UpdateColumn {
        table: TableId,
        column: ColumnId,
        draft: ColumnDraft,
    },
    DeleteColumn {
        table: TableId,
        column: ColumnId,
    },
    AddForeignKey {
        from_table: TableId,
        from_column: ColumnId,
        to_table: TableId,
        to_column: ColumnId,
        on_delete: ReferentialAction,
    },
    /// Remove the foreign keys whose source is this column.
    RemoveForeignKeysForColumn {
        table: TableId,
        column: ColumnId,
    },
}

/// Selection the page should show after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    Keep,
    SelectTable(Option<TableId>),
    SelectColumn(TableId, ColumnId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub follow_up: FollowUp,
    pub status: Option<String>,
}

impl EditOutcome {
    fn select(follow_up: FollowUp) -> Self {
        Self {
            follow_up,
            status: None,
        }
    }

    fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// `base`, or `base_1`, `base_2`, … whichever is first not `taken`.
fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut name = base.to_string();
    let mut i = 1;
    while taken(&name) {
        name = format!("{base}_{i}");
        i += 1;
    }
    name
}

fn clean_name(raw: &str) -> Result<&str, EditError> {
    let name = raw.trim();
    if name.is_empty() {
        Err(EditError::EmptyName)
    } else {
        Ok(name)
    }
}

fn table_mut(schema: &mut Schema, id: TableId) -> Result<&mut Table, EditError> {
    schema.table_mut(id).ok_or(EditError::TableNotFound(id))
}

/// Make `column`'s primary-key and single-column unique membership match
/// the draft.
fn apply_key_flags(table: &mut Table, column: ColumnId, draft: &ColumnDraft) {
    table.primary_key.retain(|c| *c != column);
    if draft.primary_key {
        table.primary_key.push(column);
        if let Some(c) = table.column_mut(column) {
            c.nullable = false;
        }
    }

    table
        .unique_constraints
        .retain(|uq| !uq.columns.contains(&column));
    if draft.unique {
        table.unique_constraints.push(UniqueConstraint {
            id: ConstraintId::generate(),
            columns: smallvec![column],
        });
    }
}

impl SchemaEdit {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddTable { .. } => "add table",
            Self::RenameTable { .. } => "rename table",
            Self::DeleteTable { .. } => "delete table",
            Self::SetTableColor { .. } => "set table colour",
            Self::AddColumn { .. } => "add field",
            Self::UpdateColumn { .. } => "update field",
            Self::DeleteColumn { .. } => "delete field",
            Self::AddForeignKey { .. } => "add foreign key",
            Self::RemoveForeignKeysForColumn { .. } => "remove foreign keys",
        }
    }

    /// Apply to `schema`. On error the document is unchanged.
    pub fn apply(&self, schema: &mut Schema, selection: Selection) -> Result<EditOutcome, EditError> {
        match self {
            Self::AddTable { name } => {
                let base = clean_name(name)?;
                let name = unique_name(base, |n| schema.has_table_named(n));
                let n = schema.tables.len() as f64;
                let offset = NEW_TABLE_ORIGIN + NEW_TABLE_STAGGER * n;
                let mut table = Table::new(TableId::generate(&name), name.clone());
                table.position = Some(Position::new(offset, offset));
                let id = table.id;
                schema.tables.push(table);
                Ok(EditOutcome::select(FollowUp::SelectTable(Some(id)))
                    .with_status(format!("Added table \"{name}\"")))
            }

            Self::RenameTable { id, name } => {
                let name = clean_name(name)?;
                if schema.tables.iter().any(|t| t.id != *id && t.name == name) {
                    return Err(EditError::DuplicateTableName(name.to_string()));
                }
                table_mut(schema, *id)?.name = name.to_string();
                Ok(EditOutcome::select(FollowUp::SelectTable(Some(*id))))
            }

            Self::DeleteTable { id } => {
                let index = schema
                    .tables
                    .iter()
                    .position(|t| t.id == *id)
                    .ok_or(EditError::TableNotFound(*id))?;
                schema.foreign_keys.retain(|fk| !fk.touches_table(*id));
                schema.tables.remove(index);
                let next = selection.table_id().filter(|t| t != id);
                Ok(EditOutcome::select(FollowUp::SelectTable(next)).with_status("Table deleted"))
            }

            Self::SetTableColor { id, color } => {
                table_mut(schema, *id)?.color = *color;
                Ok(EditOutcome::select(FollowUp::Keep))
            }

            Self::AddColumn { table, draft } => {
                let base = clean_name(&draft.name)?;
                let t = table_mut(schema, *table)?;
                let name = unique_name(base, |n| t.has_column_named(n));
                let id = ColumnId::generate(&name);
                t.columns.push(Column {
                    id,
                    name,
                    type_name: draft.clean_type(),
                    nullable: draft.nullable,
                    default: draft.clean_default(),
                });
                apply_key_flags(t, id, draft);
                Ok(EditOutcome::select(FollowUp::SelectTable(Some(*table))))
            }

            Self::UpdateColumn {
                table,
                column,
                draft,
            } => {
                let base = clean_name(&draft.name)?;
                let t = table_mut(schema, *table)?;
                let current = t
                    .column(*column)
                    .map(|c| c.name.clone())
                    .ok_or(EditError::ColumnNotFound {
                        table: *table,
                        column: *column,
                    })?;
                let name = if current == base {
                    current
                } else {
                    unique_name(base, |n| {
                        t.columns.iter().any(|c| c.id != *column && c.name == n)
                    })
                };
                if let Some(c) = t.column_mut(*column) {
                    c.name = name;
                    c.type_name = draft.clean_type();
                    c.nullable = draft.nullable;
                    c.default = draft.clean_default();
                }
                apply_key_flags(t, *column, draft);
                Ok(EditOutcome::select(FollowUp::SelectColumn(*table, *column)))
            }

            Self::DeleteColumn { table, column } => {
                let t = table_mut(schema, *table)?;
                let index = t.column_index(*column).ok_or(EditError::ColumnNotFound {
                    table: *table,
                    column: *column,
                })?;
                t.primary_key.retain(|c| c != column);
                t.unique_constraints.retain(|uq| !uq.columns.contains(column));
                t.columns.remove(index);
                schema
                    .foreign_keys
                    .retain(|fk| !fk.touches_column(*table, *column));
                Ok(EditOutcome::select(FollowUp::SelectTable(Some(*table))))
            }

            Self::AddForeignKey {
                from_table,
                from_column,
                to_table,
                to_column,
                on_delete,
            } => {
                for (table, column) in [(*from_table, *from_column), (*to_table, *to_column)] {
                    if schema.column(table, column).is_none() {
                        return Err(EditError::UnresolvedEndpoint { table, column });
                    }
                }
                schema.foreign_keys.push(ForeignKey {
                    id: ForeignKeyId::generate(),
                    from: FkEndpoint::single(*from_table, *from_column),
                    to: FkEndpoint::single(*to_table, *to_column),
                    on_delete: *on_delete,
                    on_update: ReferentialAction::NoAction,
                });
                Ok(EditOutcome::select(FollowUp::SelectTable(Some(*from_table))))
            }

            Self::RemoveForeignKeysForColumn { table, column } => {
                let before = schema.foreign_keys.len();
                schema
                    .foreign_keys
                    .retain(|fk| !fk.from.references(*table, *column));
                let removed = before - schema.foreign_keys.len();
                Ok(EditOutcome::select(FollowUp::Keep)
                    .with_status(format!("Removed {removed} foreign key(s)")))
            }
        }
    }
}
