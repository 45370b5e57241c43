//! Surface → Vello drawing commands.
//!
//! Walks the element tree with an accumulated transform and emits fills and
//! strokes. Marker definitions are not painted directly; edges that
//! reference the arrow marker get an arrowhead at their end point.

use crate::scene::{ARROW_MARKER_ID, Element, ElementKind, Style, Surface};
use crate::theme::Rgba;
use erd_core::ViewTransform;
use kurbo::{Affine, BezPath, Circle, Line, PathEl, Point, Rect, Stroke, Vec2};
use peniko::{Color, Fill};
use petgraph::stable_graph::NodeIndex;
use vello::Scene;

/// Arrowhead length and half-width, matching the marker definition.
const ARROW_LENGTH: f64 = 10.0;
const ARROW_HALF_WIDTH: f64 = 3.5;

/// Paint the whole surface into `scene`.
///
/// Call once per frame with a freshly-reset `Scene`.
pub fn paint_surface(scene: &mut Scene, surface: &Surface) {
    for &child in surface.children(surface.root()) {
        paint_node(scene, surface, child, Affine::IDENTITY);
    }
}

fn to_affine(t: &ViewTransform) -> Affine {
    Affine::translate((t.tx, t.ty)) * Affine::scale(t.k)
}

fn paint_node(scene: &mut Scene, surface: &Surface, idx: NodeIndex, parent: Affine) {
    let Some(el) = surface.element(idx) else { return };
    let transform = el
        .transform
        .as_ref()
        .map(|t| parent * to_affine(t))
        .unwrap_or(parent);

    match &el.kind {
        ElementKind::Defs | ElementKind::Marker { .. } => return,
        ElementKind::Root | ElementKind::Viewport | ElementKind::Group => {}
        ElementKind::Rect { bounds, radius } => {
            let shape = Rect::new(bounds.x, bounds.y, bounds.right(), bounds.bottom())
                .to_rounded_rect(*radius);
            fill_shape(scene, transform, &shape, &el.style);
            stroke_shape(scene, transform, &shape, &el.style);
        }
        ElementKind::Path { path, marker_end } => {
            fill_shape(scene, transform, path, &el.style);
            stroke_shape(scene, transform, path, &el.style);
            if *marker_end == Some(ARROW_MARKER_ID) {
                paint_arrowhead(scene, transform, path, el);
            }
        }
        ElementKind::Line { from, to } => {
            stroke_shape(scene, transform, &Line::new(*from, *to), &el.style);
        }
        ElementKind::Circle { cx, cy, r } => {
            let shape = Circle::new((*cx, *cy), *r);
            fill_shape(scene, transform, &shape, &el.style);
            stroke_shape(scene, transform, &shape, &el.style);
        }
        ElementKind::Text { x, y, content } => {
            // Glyph shaping needs a font context the surface does not carry.
            log::trace!("TEXT {content:?} at ({x}, {y})");
        }
    }

    for &child in surface.children(idx) {
        paint_node(scene, surface, child, transform);
    }
}

/// Filled triangle whose tip sits on the path's end point, pointing along
/// the final tangent.
fn paint_arrowhead(scene: &mut Scene, transform: Affine, path: &BezPath, el: &Element) {
    let Some((tip, dir)) = end_tangent(path) else { return };
    let Some(color) = el.style.stroke.or(el.style.fill) else { return };
    let back = tip - dir * ARROW_LENGTH;
    let normal = Vec2::new(-dir.y, dir.x) * ARROW_HALF_WIDTH;

    let mut head = BezPath::new();
    head.move_to(tip);
    head.line_to(back + normal);
    head.line_to(back - normal);
    head.close_path();
    scene.fill(Fill::NonZero, transform, to_color(color), None, &head);
}

/// End point and unit direction of the last segment.
fn end_tangent(path: &BezPath) -> Option<(Point, Vec2)> {
    let mut prev = None;
    let mut result = None;
    for el in path.elements() {
        let (from, to) = match *el {
            PathEl::MoveTo(p) => {
                prev = Some(p);
                continue;
            }
            PathEl::LineTo(p) => (prev?, p),
            PathEl::QuadTo(c, p) => (if c == p { prev? } else { c }, p),
            PathEl::CurveTo(c1, c2, p) => {
                let from = if c2 != p {
                    c2
                } else if c1 != p {
                    c1
                } else {
                    prev?
                };
                (from, p)
            }
            PathEl::ClosePath => continue,
        };
        prev = Some(to);
        let d = to - from;
        if d.hypot() > f64::EPSILON {
            result = Some((to, d.normalize()));
        }
    }
    result
}

fn fill_shape<S: kurbo::Shape>(scene: &mut Scene, transform: Affine, shape: &S, style: &Style) {
    if let Some(color) = style.fill {
        scene.fill(Fill::NonZero, transform, to_color(color), None, shape);
    }
}

fn stroke_shape<S: kurbo::Shape>(scene: &mut Scene, transform: Affine, shape: &S, style: &Style) {
    if let Some(color) = style.stroke {
        let stroke = Stroke::new(style.stroke_width.max(0.5));
        scene.stroke(&stroke, transform, to_color(color), None, shape);
    }
}

fn to_color(c: Rgba) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tangent_of_edge_curve_points_into_target() {
        let mut p = BezPath::new();
        p.move_to((240.0, 47.0));
        p.curve_to((280.0, 47.0), (360.0, 47.0), (400.0, 47.0));
        let (tip, dir) = end_tangent(&p).unwrap();
        assert_eq!(tip, Point::new(400.0, 47.0));
        assert_eq!(dir, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn degenerate_controls_fall_back_to_previous_point() {
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.curve_to((0.0, 10.0), (0.0, 10.0), (0.0, 10.0));
        let (_, dir) = end_tangent(&p).unwrap();
        assert_eq!(dir, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn painting_a_rendered_surface_does_not_panic() {
        use crate::render::render;
        use erd_core::{Schema, Selection, Table, TableId};

        let mut schema = Schema::new("paint");
        schema.tables.push(Table::new(TableId::intern("tbl_paint"), "p"));
        let mut surface = Surface::default();
        render(&mut surface, &schema, &Selection::NONE);

        let mut scene = Scene::new();
        paint_surface(&mut scene, &surface);
    }
}
