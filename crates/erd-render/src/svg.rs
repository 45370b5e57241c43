//! Surface → SVG markup.
//!
//! Emits the element tree as-is: class names, `data-*` ids and the
//! viewport transform survive, so the output can be dropped into a page
//! and styled or queried like a live diagram.

use crate::scene::{Element, ElementKind, Role, Style, Surface};
use crate::theme::Rgba;
use erd_core::ViewTransform;
use kurbo::{BezPath, PathEl};
use petgraph::stable_graph::NodeIndex;
use std::fmt::Write;

/// Serialize `surface` as a standalone `<svg>` document of the given size.
pub fn to_svg(surface: &Surface, width: f64, height: f64) -> String {
    let mut out = String::with_capacity(4096);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" font-family="system-ui, sans-serif" font-size="12">"#
    );
    let _ = write!(
        out,
        r#"<rect class="background" width="100%" height="100%" fill="{}"/>"#,
        surface.theme().background.to_hex()
    );
    for &child in surface.children(surface.root()) {
        write_node(&mut out, surface, child);
    }
    out.push_str("</svg>");
    out
}

/// SVG path data in `M x,y C x,y x,y x,y` form.
pub fn path_data(path: &BezPath) -> String {
    let mut d = String::new();
    for el in path.elements() {
        if !d.is_empty() {
            d.push(' ');
        }
        let _ = match *el {
            PathEl::MoveTo(p) => write!(d, "M {},{}", p.x, p.y),
            PathEl::LineTo(p) => write!(d, "L {},{}", p.x, p.y),
            PathEl::QuadTo(c, p) => write!(d, "Q {},{} {},{}", c.x, c.y, p.x, p.y),
            PathEl::CurveTo(c1, c2, p) => write!(
                d,
                "C {},{} {},{} {},{}",
                c1.x, c1.y, c2.x, c2.y, p.x, p.y
            ),
            PathEl::ClosePath => write!(d, "Z"),
        };
    }
    d
}

pub fn transform_attr(t: &ViewTransform) -> String {
    if t.k == 1.0 {
        format!("translate({},{})", t.tx, t.ty)
    } else {
        format!("translate({},{}) scale({})", t.tx, t.ty, t.k)
    }
}

fn write_node(out: &mut String, surface: &Surface, idx: NodeIndex) {
    let Some(el) = surface.element(idx) else { return };
    let children = surface.children(idx);

    let tag = match &el.kind {
        ElementKind::Root => return,
        ElementKind::Defs => {
            out.push_str("<defs");
            "defs"
        }
        ElementKind::Viewport | ElementKind::Group => {
            out.push_str("<g");
            "g"
        }
        ElementKind::Marker {
            id,
            width,
            height,
            ref_x,
            ref_y,
        } => {
            let _ = write!(
                out,
                r#"<marker id="{id}" markerWidth="{width}" markerHeight="{height}" refX="{ref_x}" refY="{ref_y}" orient="auto" markerUnits="strokeWidth""#
            );
            "marker"
        }
        ElementKind::Rect { bounds, radius } => {
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{radius}" ry="{radius}""#,
                bounds.x, bounds.y, bounds.width, bounds.height
            );
            "rect"
        }
        ElementKind::Path { path, marker_end } => {
            let _ = write!(out, r#"<path d="{}""#, path_data(path));
            if let Some(m) = marker_end {
                let _ = write!(out, r#" marker-end="url(#{m})""#);
            }
            "path"
        }
        ElementKind::Line { from, to } => {
            let _ = write!(
                out,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}""#,
                from.0, from.1, to.0, to.1
            );
            "line"
        }
        ElementKind::Circle { cx, cy, r } => {
            let _ = write!(out, r#"<circle cx="{cx}" cy="{cy}" r="{r}""#);
            "circle"
        }
        ElementKind::Text { x, y, .. } => {
            let _ = write!(out, r#"<text x="{x}" y="{y}" dominant-baseline="middle""#);
            "text"
        }
    };

    write_common_attrs(out, el);

    match &el.kind {
        ElementKind::Text { content, .. } => {
            out.push('>');
            escape_into(out, content);
            let _ = write!(out, "</{tag}>");
        }
        _ if children.is_empty() && !matches!(el.kind, ElementKind::Defs) => {
            out.push_str("/>");
        }
        _ => {
            out.push('>');
            for &child in children {
                write_node(out, surface, child);
            }
            let _ = write!(out, "</{tag}>");
        }
    }
}

fn write_common_attrs(out: &mut String, el: &Element) {
    if !el.classes.is_empty() {
        let _ = write!(out, r#" class="{}""#, el.classes.join(" "));
    }
    match el.role {
        Role::Table(id) => {
            let _ = write!(out, r#" data-id="{id}""#);
        }
        Role::Column { column, .. } => {
            let _ = write!(out, r#" data-col-id="{column}""#);
        }
        Role::Edge(id) => {
            let _ = write!(out, r#" data-fk-id="{id}""#);
        }
        Role::DragHandle(_) => out.push_str(r#" role="button""#),
        Role::None => {}
    }
    if let Some(t) = &el.transform {
        let _ = write!(out, r#" transform="{}""#, transform_attr(t));
    }
    write_style(out, &el.kind, &el.style);
}

fn write_style(out: &mut String, kind: &ElementKind, style: &Style) {
    let paints = !matches!(
        kind,
        ElementKind::Root | ElementKind::Defs | ElementKind::Viewport | ElementKind::Group | ElementKind::Marker { .. }
    );
    if !paints {
        return;
    }
    match style.fill {
        Some(c) => color_attr(out, "fill", c),
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(c) = style.stroke {
        color_attr(out, "stroke", c);
        let _ = write!(out, r#" stroke-width="{}""#, style.stroke_width);
    }
    if style.bold {
        out.push_str(r#" font-weight="600""#);
    }
}

fn color_attr(out: &mut String, name: &str, c: Rgba) {
    let _ = write!(out, r#" {name}="{}""#, c.to_hex());
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render;
    use erd_core::{Column, ColumnId, Position, Schema, Selection, Table, TableId};

    #[test]
    fn edge_path_data_uses_move_and_cubic() {
        let mut p = BezPath::new();
        p.move_to((340.0, 147.0));
        p.curve_to((380.0, 147.0), (410.0, 47.0), (450.0, 47.0));
        assert_eq!(path_data(&p), "M 340,147 C 380,147 410,47 450,47");
    }

    #[test]
    fn viewport_transform_is_translate_then_scale() {
        let t = ViewTransform::new(1.5, 100.0, 50.0);
        assert_eq!(transform_attr(&t), "translate(100,50) scale(1.5)");
        assert_eq!(transform_attr(&ViewTransform::translate(314.0, 106.0)), "translate(314,106)");
    }

    #[test]
    fn document_contains_marker_nodes_and_escaped_text() {
        let mut t = Table::new(TableId::intern("tbl_svg"), "a<b>");
        t.position = Some(Position::new(0.0, 0.0));
        t.columns.push(Column {
            id: ColumnId::intern("col_svg"),
            name: "x".into(),
            type_name: "int".into(),
            nullable: false,
            default: None,
        });
        let mut schema = Schema::new("svg");
        schema.tables.push(t);

        let mut surface = Surface::default();
        render(&mut surface, &schema, &Selection::table(Some(TableId::intern("tbl_svg"))));
        let svg = to_svg(&surface, 800.0, 600.0);

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(r#"<marker id="arrow""#));
        assert!(svg.contains(r#"class="table selected" data-id="tbl_svg""#));
        assert!(svg.contains(r#"class="drag-button drag-handle" role="button""#));
        assert!(svg.contains("a&lt;b&gt;"));
        assert!(svg.contains("x: int NOT NULL"));
        assert_eq!(svg.matches("<circle").count(), 6);
    }
}
