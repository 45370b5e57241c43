//! Schema → scene rebuild.
//!
//! Every call discards the previous viewport content and draws every table,
//! then every foreign-key edge, then re-applies the surface's view
//! transform. Nothing is diffed; the only state read besides the arguments
//! is the transform and theme held by the surface.

use crate::scene::{ARROW_MARKER_ID, Element, ElementKind, Role, Style, Surface};
use erd_core::geometry::{
    self, CORNER_RADIUS, HANDLE_SIZE, HEADER_HEIGHT, NODE_WIDTH, PADDING_X,
};
use erd_core::{Column, ForeignKey, Schema, Selection, Table, ViewTransform};
use kurbo::{BezPath, Rect, RoundedRect, RoundedRectRadii, Shape};

/// Drag-handle dot centres, relative to the handle's top-left corner.
const HANDLE_DOTS: [(f64, f64); 6] = [
    (4.0, 5.0),
    (8.0, 5.0),
    (12.0, 5.0),
    (4.0, 10.0),
    (8.0, 10.0),
    (12.0, 10.0),
];

const PK_GLYPH: &str = "\u{1F511} ";
const FK_GLYPH: &str = "\u{1F517} ";

/// Rebuild the viewport content of `surface` from `schema`.
pub fn render(surface: &mut Surface, schema: &Schema, selection: &Selection) {
    surface.clear_viewport();
    surface.ensure_arrow_marker();

    for table in &schema.tables {
        draw_table(surface, schema, table, selection);
    }

    let mut skipped = 0usize;
    for fk in &schema.foreign_keys {
        if !draw_edge(surface, schema, fk) {
            skipped += 1;
        }
    }
    if skipped > 0 {
        log::debug!("skipped {skipped} unresolved foreign-key edge(s)");
    }

    let view = surface.view();
    surface.set_view(view);
    log::trace!(
        "rendered {} tables, {} edges",
        surface.table_node_count(),
        surface.edge_count()
    );
}

/// Row label: key glyphs, `name: type`, and ` NOT NULL` when not nullable.
pub fn column_label(schema: &Schema, table: &Table, column: &Column) -> String {
    let mut label = String::new();
    if table.is_primary_key(column.id) {
        label.push_str(PK_GLYPH);
    }
    if schema.is_foreign_key_column(table.id, column.id) {
        label.push_str(FK_GLYPH);
    }
    label.push_str(&column.name);
    label.push_str(": ");
    label.push_str(&column.type_name);
    if !column.nullable {
        label.push_str(" NOT NULL");
    }
    label
}

fn draw_table(surface: &mut Surface, schema: &Schema, table: &Table, selection: &Selection) {
    let theme = surface.theme().clone();
    let bounds = geometry::table_bounds(table);
    let selected = selection.is_table_selected(table.id);

    let mut group = Element::new(ElementKind::Group)
        .role(Role::Table(table.id))
        .class("table")
        .hit(bounds);
    if selected {
        group = group.class("selected");
    }
    let g = surface.append(surface.viewport(), group);

    let border = if selected {
        Style::fill(theme.node_fill).with_stroke(theme.selected_stroke, 2.0)
    } else {
        Style::fill(theme.node_fill).with_stroke(theme.node_stroke, 1.0)
    };
    surface.append(
        g,
        Element::new(ElementKind::Rect {
            bounds,
            radius: CORNER_RADIUS,
        })
        .class("table-box")
        .style(border),
    );

    surface.append(
        g,
        Element::new(ElementKind::Path {
            path: header_path(table),
            marker_end: None,
        })
        .class("table-header")
        .style(Style::fill(theme.header_fill(table.color))),
    );

    surface.append(
        g,
        Element::new(ElementKind::Text {
            x: bounds.x + PADDING_X,
            y: bounds.y + HEADER_HEIGHT / 2.0,
            content: table.name.clone(),
        })
        .class("table-title")
        .style(Style {
            bold: true,
            ..Style::fill(theme.title_text)
        }),
    );

    surface.append(
        g,
        Element::new(ElementKind::Line {
            from: (bounds.x, bounds.y + HEADER_HEIGHT),
            to: (bounds.right(), bounds.y + HEADER_HEIGHT),
        })
        .style(Style::stroke(theme.separator, 1.0)),
    );

    draw_handle(surface, g, table);

    for (i, column) in table.columns.iter().enumerate() {
        let row = geometry::column_row_bounds(table, i);
        let editing = selection.is_column_selected(table.id, column.id);
        let mut text = Element::new(ElementKind::Text {
            x: bounds.x + PADDING_X,
            y: row.y + row.height / 2.0,
            content: column_label(schema, table, column),
        })
        .role(Role::Column {
            table: table.id,
            column: column.id,
        })
        .class("col-text")
        .hit(row);
        text = if editing {
            text.class("col-editing")
                .style(Style::fill(theme.editing_text))
        } else {
            text.style(Style::fill(theme.column_text))
        };
        surface.append(g, text);
    }
}

fn draw_handle(surface: &mut Surface, parent: petgraph::stable_graph::NodeIndex, table: &Table) {
    let theme = surface.theme().clone();
    let hb = geometry::drag_handle_bounds(table);
    let handle = surface.append(
        parent,
        Element::new(ElementKind::Group)
            .role(Role::DragHandle(table.id))
            .class("drag-button")
            .class("drag-handle")
            .transform(ViewTransform::translate(hb.x, hb.y))
            .hit(hb),
    );
    surface.append(
        handle,
        Element::new(ElementKind::Rect {
            bounds: erd_core::Bounds::new(0.0, 0.0, HANDLE_SIZE, HANDLE_SIZE),
            radius: 4.0,
        })
        .class("drag-btn-bg")
        .style(Style::fill(theme.handle_fill)),
    );
    for (cx, cy) in HANDLE_DOTS {
        surface.append(
            handle,
            Element::new(ElementKind::Circle { cx, cy, r: 1.3 })
                .class("drag-btn-dot")
                .style(Style::fill(theme.handle_dot)),
        );
    }
}

/// Header band with rounded top corners and square bottom corners.
fn header_path(table: &Table) -> BezPath {
    let b = geometry::header_bounds(table);
    let r = CORNER_RADIUS.min(b.height).min(NODE_WIDTH / 2.0);
    let rect = Rect::new(b.x, b.y, b.right(), b.bottom());
    RoundedRect::from_rect(rect, RoundedRectRadii::new(r, r, 0.0, 0.0)).to_path(0.1)
}

/// Draw one edge; `false` if an endpoint does not resolve.
fn draw_edge(surface: &mut Surface, schema: &Schema, fk: &ForeignKey) -> bool {
    let Some((from_table, from_column)) = schema.resolve_endpoint(&fk.from) else {
        return false;
    };
    let Some((to_table, to_column)) = schema.resolve_endpoint(&fk.to) else {
        return false;
    };
    let Some(curve) = geometry::edge_curve(from_table, from_column.id, to_table, to_column.id)
    else {
        return false;
    };

    let mut path = BezPath::new();
    path.move_to(curve.start);
    path.curve_to(curve.c1, curve.c2, curve.end);

    let edge = surface.theme().edge;
    surface.append(
        surface.viewport(),
        Element::new(ElementKind::Path {
            path,
            marker_end: Some(ARROW_MARKER_ID),
        })
        .role(Role::Edge(fk.id))
        .class("edge")
        .style(Style::stroke(edge, 1.5)),
    );
    true
}
