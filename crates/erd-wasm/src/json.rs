//! JSON handed across the JS boundary.

use erd_core::{ColumnId, Selection, TableId};
use erd_editor::{ColumnDraft, ColumnForm, ForeignKeyChoices, SelectionUpdate};
use serde::Deserialize;
use serde_json::{Value, json};

/// Column form fields as posted by the page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ColumnDraftJson {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_name: String,
    #[serde(default = "nullable_default")]
    pub nullable: bool,
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
}

fn nullable_default() -> bool {
    true
}

impl From<ColumnDraftJson> for ColumnDraft {
    fn from(j: ColumnDraftJson) -> Self {
        let mut draft = ColumnDraft::new(j.name, j.type_name);
        draft.nullable = j.nullable;
        draft.default = Some(j.default);
        draft.primary_key = j.primary_key;
        draft.unique = j.unique;
        draft
    }
}

pub(crate) fn parse_draft(json: &str) -> Option<ColumnDraft> {
    match serde_json::from_str::<ColumnDraftJson>(json) {
        Ok(d) => Some(d.into()),
        Err(e) => {
            log::warn!("bad column form: {e}");
            None
        }
    }
}

fn choices<Id: Copy>(items: &[(Id, String)], id_str: fn(&Id) -> &'static str) -> Value {
    Value::Array(
        items
            .iter()
            .map(|(id, name)| json!({ "id": id_str(id), "name": name }))
            .collect(),
    )
}

pub(crate) fn foreign_key_choices(c: &ForeignKeyChoices) -> Value {
    json!({
        "sourceColumns": choices(&c.source_columns, ColumnId::as_str),
        "targetTables": choices(&c.target_tables, TableId::as_str),
        "targetTable": c.target_table.map(|t| t.as_str()),
        "targetColumns": choices(&c.target_columns, ColumnId::as_str),
    })
}

pub(crate) fn column_form(f: &ColumnForm) -> Value {
    json!({
        "table": f.table.as_str(),
        "column": f.column.as_str(),
        "name": f.name,
        "type": f.type_name,
        "nullable": f.nullable,
        "default": f.default,
        "primaryKey": f.primary_key,
        "unique": f.unique,
    })
}

pub(crate) fn selection(s: Selection) -> Value {
    json!({
        "table": s.table_id().map(|t| t.as_str()),
        "column": s.column_id().map(|c| c.as_str()),
    })
}

/// Payload of the page's selection callback.
pub(crate) fn selection_change(s: Selection, update: &SelectionUpdate) -> Value {
    let form = match update {
        SelectionUpdate::Cleared => json!({ "kind": "cleared" }),
        SelectionUpdate::Table(c) => json!({ "kind": "table", "choices": foreign_key_choices(c) }),
        SelectionUpdate::Column(f) => json!({ "kind": "column", "form": column_form(f) }),
    };
    json!({ "selection": selection(s), "update": form })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn draft_fields_default_like_a_fresh_form() {
        let d = parse_draft(r#"{"name":"email","type":"varchar(255)"}"#).unwrap();
        assert_eq!(d.name, "email");
        assert!(d.nullable);
        assert!(!d.primary_key);

        let pk = parse_draft(r#"{"name":"id","nullable":false,"primaryKey":true}"#).unwrap();
        assert!(!pk.nullable);
        assert!(pk.primary_key);

        assert!(parse_draft("[1,2]").is_none());
    }

    #[test]
    fn selection_change_names_the_form_kind() {
        let t = TableId::intern("tbl_json_users");
        let c = ColumnId::intern("col_json_id");
        let form = ColumnForm {
            table: t,
            column: c,
            name: "id".into(),
            type_name: "int".into(),
            nullable: false,
            default: String::new(),
            primary_key: true,
            unique: false,
        };
        let v = selection_change(Selection::column(t, c), &SelectionUpdate::Column(form));
        assert_eq!(v["selection"]["table"], "tbl_json_users");
        assert_eq!(v["selection"]["column"], "col_json_id");
        assert_eq!(v["update"]["kind"], "column");
        assert_eq!(v["update"]["form"]["primaryKey"], true);

        let cleared = selection_change(Selection::NONE, &SelectionUpdate::Cleared);
        assert_eq!(cleared["selection"]["table"], Value::Null);
        assert_eq!(cleared["update"]["kind"], "cleared");
    }

    #[test]
    fn choices_list_ids_and_names() {
        let users = TableId::intern("tbl_json_a");
        let c = ForeignKeyChoices {
            source_columns: vec![(ColumnId::intern("col_json_a"), "a".into())],
            target_tables: vec![(users, "users".into())],
            target_table: Some(users),
            target_columns: vec![],
        };
        let v = foreign_key_choices(&c);
        assert_eq!(v["sourceColumns"][0]["id"], "col_json_a");
        assert_eq!(v["targetTables"][0]["name"], "users");
        assert_eq!(v["targetTable"], "tbl_json_a");
        assert_eq!(v["targetColumns"], json!([]));
    }
}
