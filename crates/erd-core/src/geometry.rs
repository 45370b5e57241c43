//! Diagram geometry.
//!
//! Pure functions from the schema document to node boxes, row anchors,
//! and edge curves. Nothing here holds state; every result is a function of
//! the table (or pair of tables) and the constants below.

use crate::id::ColumnId;
use crate::model::{Position, Table};

/// Fixed width of every table node.
pub const NODE_WIDTH: f64 = 240.0;
/// Height of one column row.
pub const ROW_HEIGHT: f64 = 22.0;
/// Horizontal inset of text inside a node.
pub const PADDING_X: f64 = 10.0;
/// Height of the title band.
pub const HEADER_HEIGHT: f64 = 28.0;
/// Vertical gap above the first row and below the last.
pub const GAP: f64 = 8.0;
/// Corner radius of the node container.
pub const CORNER_RADIUS: f64 = 8.0;
/// Side of the square drag handle in the header.
pub const HANDLE_SIZE: f64 = 16.0;
/// Minimum horizontal control-point offset for edge curves.
pub const MIN_EDGE_OFFSET: f64 = 40.0;
/// Position used for tables that carry none.
pub const DEFAULT_POSITION: Position = Position::new(50.0, 50.0);

/// Axis-aligned rectangle in diagram space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    pub fn inflate(&self, pad: f64) -> Bounds {
        Bounds::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }
}

/// Node height for a table with `rows` columns.
pub fn node_height(rows: usize) -> f64 {
    HEADER_HEIGHT + GAP + rows as f64 * ROW_HEIGHT + GAP
}

/// The table's position, or [`DEFAULT_POSITION`] when it has none.
pub fn table_origin(table: &Table) -> Position {
    table.position.unwrap_or(DEFAULT_POSITION)
}

/// Bounding box of a table node.
pub fn table_bounds(table: &Table) -> Bounds {
    let Position { x, y } = table_origin(table);
    Bounds::new(x, y, NODE_WIDTH, node_height(table.columns.len()))
}

/// The title band at the top of a node.
pub fn header_bounds(table: &Table) -> Bounds {
    let b = table_bounds(table);
    Bounds::new(b.x, b.y, b.width, HEADER_HEIGHT)
}

/// Vertical centre of row `index` for a node whose top edge is `y`.
fn row_center(y: f64, index: f64) -> f64 {
    y + HEADER_HEIGHT + GAP + ROW_HEIGHT / 2.0 + index * ROW_HEIGHT
}

/// Vertical centre of the row holding `column`.
///
/// An unknown column id behaves as index `-1`, one row above the first.
/// Callers that need a meaningful anchor must check the column exists.
pub fn column_anchor_y(table: &Table, column: ColumnId) -> f64 {
    let index = table
        .column_index(column)
        .map(|i| i as f64)
        .unwrap_or(-1.0);
    row_center(table_origin(table).y, index)
}

/// Full-width hit box of row `index`.
pub fn column_row_bounds(table: &Table, index: usize) -> Bounds {
    let Position { x, y } = table_origin(table);
    let cy = row_center(y, index as f64);
    Bounds::new(x, cy - ROW_HEIGHT / 2.0, NODE_WIDTH, ROW_HEIGHT)
}

/// The drag handle, right-aligned and vertically centred in the header.
pub fn drag_handle_bounds(table: &Table) -> Bounds {
    let Position { x, y } = table_origin(table);
    Bounds::new(
        x + NODE_WIDTH - PADDING_X - HANDLE_SIZE,
        y + (HEADER_HEIGHT - HANDLE_SIZE) / 2.0,
        HANDLE_SIZE,
        HANDLE_SIZE,
    )
}

/// Control polygon of a foreign-key curve: start, two controls, end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCurve {
    pub start: (f64, f64),
    pub c1: (f64, f64),
    pub c2: (f64, f64),
    pub end: (f64, f64),
}

/// Curve from the right edge of the source row to the left edge of the
/// target row. The horizontal control offset is a third of the horizontal
/// distance, never less than [`MIN_EDGE_OFFSET`].
///
/// `None` if either column is missing from its table.
pub fn edge_curve(
    from_table: &Table,
    from_column: ColumnId,
    to_table: &Table,
    to_column: ColumnId,
) -> Option<EdgeCurve> {
    from_table.column_index(from_column)?;
    to_table.column_index(to_column)?;

    let from_x = table_origin(from_table).x + NODE_WIDTH;
    let from_y = column_anchor_y(from_table, from_column);
    let to_x = table_origin(to_table).x;
    let to_y = column_anchor_y(to_table, to_column);
    let dx = MIN_EDGE_OFFSET.max((to_x - from_x).abs() / 3.0);

    Some(EdgeCurve {
        start: (from_x, from_y),
        c1: (from_x + dx, from_y),
        c2: (to_x - dx, to_y),
        end: (to_x, to_y),
    })
}

/// Union of all table boxes, or `None` for an empty document.
pub fn diagram_extent<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Option<Bounds> {
    tables
        .into_iter()
        .map(table_bounds)
        .reduce(|acc, b| acc.union(&b))
}

// ─── View transform ──────────────────────────────────────────────────────

/// Translate-then-scale mapping from diagram space to screen space:
/// `screen = diagram * k + (tx, ty)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub k: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        k: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub const fn new(k: f64, tx: f64, ty: f64) -> Self {
        Self { k, tx, ty }
    }

    /// Pure translation.
    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self { k: 1.0, tx, ty }
    }

    pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.k + self.tx, y * self.k + self.ty)
    }

    pub fn to_diagram(&self, sx: f64, sy: f64) -> (f64, f64) {
        ((sx - self.tx) / self.k, (sy - self.ty) / self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TableId;
    use crate::model::Column;
    use pretty_assertions::assert_eq;

    fn table_with(n: usize, position: Option<Position>) -> Table {
        let mut t = Table::new(TableId::intern("tbl_geom"), "geom");
        t.position = position;
        for i in 0..n {
            t.columns.push(Column {
                id: ColumnId::intern(&format!("col_geom_{i}")),
                name: format!("c{i}"),
                type_name: "int".into(),
                nullable: true,
                default: None,
            });
        }
        t
    }

    #[test]
    fn height_formula_holds_for_all_row_counts() {
        for n in 0..12 {
            let b = table_bounds(&table_with(n, Some(Position::new(0.0, 0.0))));
            assert_eq!(b.height, HEADER_HEIGHT + 2.0 * GAP + n as f64 * ROW_HEIGHT);
            assert_eq!(b.width, NODE_WIDTH);
        }
    }

    #[test]
    fn missing_position_defaults() {
        let b = table_bounds(&table_with(2, None));
        assert_eq!((b.x, b.y), (50.0, 50.0));
        assert_eq!(b.height, 88.0);
    }

    #[test]
    fn adjacent_anchors_differ_by_one_row() {
        let t = table_with(3, Some(Position::new(100.0, 100.0)));
        let a0 = column_anchor_y(&t, t.columns[0].id);
        let a1 = column_anchor_y(&t, t.columns[1].id);
        let a2 = column_anchor_y(&t, t.columns[2].id);
        assert_eq!(a0, 147.0);
        assert_eq!(a1 - a0, ROW_HEIGHT);
        assert_eq!(a2 - a1, ROW_HEIGHT);
    }

    #[test]
    fn unknown_column_anchors_one_row_above() {
        let t = table_with(1, Some(Position::new(0.0, 0.0)));
        let first = column_anchor_y(&t, t.columns[0].id);
        let missing = column_anchor_y(&t, ColumnId::intern("col_nowhere"));
        assert_eq!(first - missing, ROW_HEIGHT);
    }

    #[test]
    fn handle_sits_in_header_top_right() {
        let t = table_with(0, Some(Position::new(100.0, 100.0)));
        let h = drag_handle_bounds(&t);
        assert_eq!(h, Bounds::new(314.0, 106.0, 16.0, 16.0));
        assert!(header_bounds(&t).contains(h.x, h.y));
    }

    #[test]
    fn row_bounds_are_centred_on_anchor() {
        let t = table_with(2, Some(Position::new(0.0, 0.0)));
        let row = column_row_bounds(&t, 1);
        let anchor = column_anchor_y(&t, t.columns[1].id);
        assert_eq!(row.y + row.height / 2.0, anchor);
    }

    #[test]
    fn edge_offset_has_a_floor() {
        let mut a = table_with(1, Some(Position::new(0.0, 0.0)));
        a.id = TableId::intern("tbl_geom_a");
        let mut b = table_with(1, Some(Position::new(260.0, 0.0)));
        b.id = TableId::intern("tbl_geom_b");

        // |260 - 240| / 3 < 40 → floor applies
        let curve = edge_curve(&a, a.columns[0].id, &b, b.columns[0].id).unwrap();
        assert_eq!(curve.start, (240.0, 47.0));
        assert_eq!(curve.c1.0 - curve.start.0, MIN_EDGE_OFFSET);
        assert_eq!(curve.end.0 - curve.c2.0, MIN_EDGE_OFFSET);

        b.position = Some(Position::new(840.0, 0.0));
        let curve = edge_curve(&a, a.columns[0].id, &b, b.columns[0].id).unwrap();
        assert_eq!(curve.c1.0 - curve.start.0, 200.0);
    }

    #[test]
    fn edge_requires_both_columns() {
        let a = table_with(1, None);
        let b = table_with(1, None);
        assert!(edge_curve(&a, ColumnId::intern("col_gone"), &b, b.columns[0].id).is_none());
    }

    #[test]
    fn extent_covers_all_tables() {
        let a = table_with(0, Some(Position::new(0.0, 0.0)));
        let b = table_with(0, Some(Position::new(300.0, 200.0)));
        let e = diagram_extent([&a, &b]).unwrap();
        assert_eq!(e, Bounds::new(0.0, 0.0, 540.0, 244.0));
        assert!(diagram_extent(std::iter::empty::<&Table>()).is_none());
    }

    #[test]
    fn view_transform_roundtrips() {
        let v = ViewTransform::new(1.5, 100.0, 50.0);
        assert_eq!(v.to_screen(0.0, 0.0), (100.0, 50.0));
        let (x, y) = v.to_diagram(400.0, 350.0);
        assert_eq!((x, y), (200.0, 200.0));
        assert_eq!(v.to_screen(x, y), (400.0, 350.0));
    }
}
