//! Hit testing: diagram point → click target.
//!
//! Reverse-walks the viewport (last painted = topmost) to find the table
//! node under the point. Within that node the drag handle wins over a column
//! row, and a column row wins over the node body. Edges are not targets.

use crate::scene::{Role, Surface};
use erd_core::{ColumnId, TableId};
use petgraph::stable_graph::NodeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    DragHandle(TableId),
    Column { table: TableId, column: ColumnId },
    Table(TableId),
    Background,
}

impl Hit {
    pub fn is_background(&self) -> bool {
        matches!(self, Hit::Background)
    }
}

/// Receiver of the selection callbacks bound to table and column targets.
pub trait SelectionSink {
    fn select_table(&mut self, table: TableId);
    fn select_column(&mut self, table: TableId, column: ColumnId);
}

impl Surface {
    /// Find the click target at diagram point `(x, y)`.
    pub fn hit_test(&self, x: f64, y: f64) -> Hit {
        for &node in self.children(self.viewport()).iter().rev() {
            let Some(el) = self.element(node) else { continue };
            let Role::Table(table) = el.role else { continue };
            if el.hit.is_some_and(|b| b.contains(x, y)) {
                return self.hit_within(node, table, x, y);
            }
        }
        Hit::Background
    }

    fn hit_within(&self, node: NodeIndex, table: TableId, x: f64, y: f64) -> Hit {
        let mut column_hit = None;
        for &child in self.children(node) {
            let Some(el) = self.element(child) else { continue };
            if !el.hit.is_some_and(|b| b.contains(x, y)) {
                continue;
            }
            match el.role {
                Role::DragHandle(t) => return Hit::DragHandle(t),
                Role::Column { table, column } if column_hit.is_none() => {
                    column_hit = Some(Hit::Column { table, column });
                }
                _ => {}
            }
        }
        column_hit.unwrap_or(Hit::Table(table))
    }

    /// Hit-test `(x, y)` and deliver the matching selection callback.
    ///
    /// Column rows call `select_column`, node bodies call `select_table`.
    /// The drag handle and the background deliver nothing; the caller
    /// decides what a background click means.
    pub fn dispatch_click(&self, x: f64, y: f64, sink: &mut impl SelectionSink) -> Hit {
        let hit = self.hit_test(x, y);
        match hit {
            Hit::Column { table, column } => sink.select_column(table, column),
            Hit::Table(table) => sink.select_table(table),
            Hit::DragHandle(_) | Hit::Background => {}
        }
        log::trace!("click ({x}, {y}) → {hit:?}");
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;
    use erd_core::{Column, Position, Schema, Selection, Table};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl SelectionSink for Recorder {
        fn select_table(&mut self, table: TableId) {
            self.calls.push(format!("table {table}"));
        }
        fn select_column(&mut self, table: TableId, column: ColumnId) {
            self.calls.push(format!("column {table} {column}"));
        }
    }

    fn table(id: &str, x: f64, y: f64, cols: &[&str]) -> Table {
        let mut t = Table::new(TableId::intern(id), id);
        t.position = Some(Position::new(x, y));
        for c in cols {
            t.columns.push(Column {
                id: ColumnId::intern(c),
                name: c.to_string(),
                type_name: "int".into(),
                nullable: true,
                default: None,
            });
        }
        t
    }

    fn surface_for(tables: Vec<Table>) -> Surface {
        let mut schema = Schema::new("hit");
        schema.tables = tables;
        let mut surface = Surface::default();
        render(&mut surface, &schema, &Selection::NONE);
        surface
    }

    #[test]
    fn priority_handle_then_column_then_body() {
        let s = surface_for(vec![table("tbl_h_a", 100.0, 100.0, &["col_h_a1"])]);
        let a = TableId::intern("tbl_h_a");

        // handle occupies (314..330, 106..122)
        assert_eq!(s.hit_test(320.0, 110.0), Hit::DragHandle(a));
        // first row centred at y = 147
        assert_eq!(
            s.hit_test(150.0, 147.0),
            Hit::Column {
                table: a,
                column: ColumnId::intern("col_h_a1")
            }
        );
        // title band, away from the handle
        assert_eq!(s.hit_test(150.0, 110.0), Hit::Table(a));
        assert_eq!(s.hit_test(10.0, 10.0), Hit::Background);
    }

    #[test]
    fn topmost_table_wins_on_overlap() {
        let s = surface_for(vec![
            table("tbl_h_under", 0.0, 0.0, &[]),
            table("tbl_h_over", 100.0, 0.0, &[]),
        ]);
        assert_eq!(s.hit_test(150.0, 20.0), Hit::Table(TableId::intern("tbl_h_over")));
        assert_eq!(s.hit_test(50.0, 20.0), Hit::Table(TableId::intern("tbl_h_under")));
    }

    #[test]
    fn dispatch_delivers_exactly_one_callback() {
        let s = surface_for(vec![table("tbl_h_d", 0.0, 0.0, &["col_h_d1"])]);
        let mut rec = Recorder::default();

        s.dispatch_click(100.0, 47.0, &mut rec);
        s.dispatch_click(100.0, 10.0, &mut rec);
        s.dispatch_click(220.0, 12.0, &mut rec);
        let bg = s.dispatch_click(900.0, 900.0, &mut rec);

        assert!(bg.is_background());
        assert_eq!(
            rec.calls,
            vec!["column tbl_h_d col_h_d1".to_string(), "table tbl_h_d".to_string()]
        );
    }
}
