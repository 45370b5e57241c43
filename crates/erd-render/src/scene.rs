//! Retained diagram scene.
//!
//! A [`Surface`] is a small element tree stored in a petgraph
//! `StableDiGraph`: a persistent root holding one `defs` layer (marker
//! definitions) and one viewport group. The renderer rebuilds only the
//! viewport's descendants; the root, `defs` and the arrow marker live for
//! the lifetime of the surface.

use crate::theme::{Rgba, Theme};
use erd_core::{Bounds, ColumnId, ForeignKeyId, TableId, ViewTransform};
use kurbo::BezPath;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::Dfs;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Id of the arrowhead marker referenced by edges.
pub const ARROW_MARKER_ID: &str = "arrow";

/// What a click on an element means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    None,
    Table(TableId),
    Column { table: TableId, column: ColumnId },
    DragHandle(TableId),
    Edge(ForeignKeyId),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    pub fill: Option<Rgba>,
    pub stroke: Option<Rgba>,
    pub stroke_width: f64,
    pub bold: bool,
}

impl Style {
    pub fn fill(color: Rgba) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    pub fn stroke(color: Rgba, width: f64) -> Self {
        Self {
            stroke: Some(color),
            stroke_width: width,
            ..Self::default()
        }
    }

    pub fn with_stroke(mut self, color: Rgba, width: f64) -> Self {
        self.stroke = Some(color);
        self.stroke_width = width;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Root,
    Defs,
    Viewport,
    Group,
    Marker {
        id: &'static str,
        width: f64,
        height: f64,
        ref_x: f64,
        ref_y: f64,
    },
    Rect {
        bounds: Bounds,
        radius: f64,
    },
    Path {
        path: BezPath,
        marker_end: Option<&'static str>,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    /// Text anchored at its left edge, vertically centred on `y`.
    Text {
        x: f64,
        y: f64,
        content: String,
    },
}

/// A node of the scene tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub role: Role,
    pub classes: SmallVec<[&'static str; 2]>,
    pub style: Style,
    /// Transform applied to this element and its children.
    pub transform: Option<ViewTransform>,
    /// Click target in the coordinate space of the element's parent.
    pub hit: Option<Bounds>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            role: Role::None,
            classes: SmallVec::new(),
            style: Style::default(),
            transform: None,
            hit: None,
        }
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn class(mut self, class: &'static str) -> Self {
        self.classes.push(class);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn transform(mut self, transform: ViewTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn hit(mut self, bounds: Bounds) -> Self {
        self.hit = Some(bounds);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| *c == class)
    }
}

/// The drawing target: root → (`defs`, viewport).
#[derive(Debug, Clone)]
pub struct Surface {
    graph: StableDiGraph<Element, ()>,
    /// Paint order of each parent's children. Indices of removed nodes are
    /// reused by the graph, so order cannot be derived from `NodeIndex`.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
    root: NodeIndex,
    defs: NodeIndex,
    viewport: NodeIndex,
    view: ViewTransform,
    theme: Theme,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl Surface {
    pub fn new(theme: Theme) -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(Element::new(ElementKind::Root));
        let mut surface = Self {
            graph,
            child_order: HashMap::new(),
            root,
            defs: root,
            viewport: root,
            view: ViewTransform::IDENTITY,
            theme,
        };
        surface.defs = surface.append(root, Element::new(ElementKind::Defs));
        surface.viewport = surface.append(
            root,
            Element::new(ElementKind::Viewport)
                .class("viewport")
                .transform(ViewTransform::IDENTITY),
        );
        surface
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn defs(&self) -> NodeIndex {
        self.defs
    }

    pub fn viewport(&self) -> NodeIndex {
        self.viewport
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Takes effect on the next render.
    /// Swap the palette. The arrow marker is recoloured in place; every
    /// other element picks the new colours up on the next render.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        let Some(marker) = self.arrow_marker() else {
            return;
        };
        let edge = self.theme.edge;
        for idx in self.children(marker).to_vec() {
            self.graph[idx].style = Style::fill(edge);
        }
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    /// Store the view transform and apply it to the viewport group.
    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
        self.graph[self.viewport].transform = Some(view);
    }

    pub fn element(&self, idx: NodeIndex) -> Option<&Element> {
        self.graph.node_weight(idx)
    }

    /// Children of `idx` in paint order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append `element` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeIndex, element: Element) -> NodeIndex {
        let idx = self.graph.add_node(element);
        self.graph.add_edge(parent, idx, ());
        self.child_order.entry(parent).or_default().push(idx);
        idx
    }

    /// Remove every descendant of the viewport group, keeping the group.
    pub fn clear_viewport(&mut self) {
        let mut doomed = Vec::new();
        let mut dfs = Dfs::new(&self.graph, self.viewport);
        while let Some(idx) = dfs.next(&self.graph) {
            if idx != self.viewport {
                doomed.push(idx);
            }
        }
        for idx in &doomed {
            self.graph.remove_node(*idx);
            self.child_order.remove(idx);
        }
        self.child_order.remove(&self.viewport);
        log::trace!("cleared {} viewport elements", doomed.len());
    }

    fn arrow_marker(&self) -> Option<NodeIndex> {
        self.children(self.defs).iter().copied().find(|&idx| {
            matches!(
                self.graph[idx].kind,
                ElementKind::Marker { id, .. } if id == ARROW_MARKER_ID
            )
        })
    }

    pub fn has_arrow_marker(&self) -> bool {
        self.arrow_marker().is_some()
    }

    /// Create the arrowhead marker under `defs` unless it already exists.
    /// Returns `true` when it was created.
    pub fn ensure_arrow_marker(&mut self) -> bool {
        if self.has_arrow_marker() {
            return false;
        }
        let edge = self.theme.edge;
        let marker = self.append(
            self.defs,
            Element::new(ElementKind::Marker {
                id: ARROW_MARKER_ID,
                width: 10.0,
                height: 7.0,
                ref_x: 10.0,
                ref_y: 3.5,
            }),
        );
        let mut tip = BezPath::new();
        tip.move_to((0.0, 0.0));
        tip.line_to((10.0, 3.5));
        tip.line_to((0.0, 7.0));
        tip.close_path();
        self.append(
            marker,
            Element::new(ElementKind::Path {
                path: tip,
                marker_end: None,
            })
            .class("edge-marker")
            .style(Style::fill(edge)),
        );
        true
    }

    fn viewport_roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.children(self.viewport)
            .iter()
            .map(|&idx| self.graph[idx].role)
    }

    /// Number of table nodes currently drawn.
    pub fn table_node_count(&self) -> usize {
        self.viewport_roles()
            .filter(|r| matches!(r, Role::Table(_)))
            .count()
    }

    /// Number of foreign-key edges currently drawn.
    pub fn edge_count(&self) -> usize {
        self.viewport_roles()
            .filter(|r| matches!(r, Role::Edge(_)))
            .count()
    }

    /// The node group drawn for `table`, if any.
    pub fn table_node(&self, table: TableId) -> Option<NodeIndex> {
        self.children(self.viewport)
            .iter()
            .copied()
            .find(|&idx| self.graph[idx].role == Role::Table(table))
    }

    /// All elements under `idx` (inclusive) in paint order.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        self.collect(idx, &mut out);
        out
    }

    fn collect(&self, idx: NodeIndex, out: &mut Vec<NodeIndex>) {
        out.push(idx);
        for &child in self.children(idx) {
            self.collect(child, out);
        }
    }

    /// Total number of elements, root included.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_surface_has_defs_and_viewport() {
        let s = Surface::default();
        assert_eq!(s.children(s.root()), &[s.defs(), s.viewport()]);
        assert_eq!(s.len(), 3);
        assert!(!s.has_arrow_marker());
    }

    #[test]
    fn arrow_marker_is_created_once() {
        let mut s = Surface::default();
        assert!(s.ensure_arrow_marker());
        assert!(!s.ensure_arrow_marker());
        assert_eq!(s.children(s.defs()).len(), 1);
    }

    #[test]
    fn theme_switch_recolours_the_arrowhead() {
        let mut s = Surface::default();
        s.ensure_arrow_marker();
        let marker = s.children(s.defs())[0];
        let tip = s.children(marker)[0];
        assert_eq!(s.element(tip).unwrap().style.fill, Some(Theme::light().edge));

        s.set_theme(Theme::dark());
        assert_eq!(s.element(tip).unwrap().style.fill, Some(Theme::dark().edge));
        assert!(!s.ensure_arrow_marker());
    }

    #[test]
    fn clear_viewport_keeps_the_group_and_defs() {
        let mut s = Surface::default();
        s.ensure_arrow_marker();
        let vp = s.viewport();
        let g = s.append(vp, Element::new(ElementKind::Group));
        s.append(g, Element::new(ElementKind::Group));
        s.append(vp, Element::new(ElementKind::Group));
        assert_eq!(s.descendants(vp).len(), 4);

        s.clear_viewport();
        assert_eq!(s.descendants(vp), vec![vp]);
        assert!(s.has_arrow_marker());
        assert!(s.element(vp).is_some());
    }

    #[test]
    fn child_order_survives_index_reuse() {
        let mut s = Surface::default();
        let vp = s.viewport();
        s.append(vp, Element::new(ElementKind::Group).class("a"));
        s.clear_viewport();
        let first = s.append(vp, Element::new(ElementKind::Group).class("first"));
        let second = s.append(vp, Element::new(ElementKind::Group).class("second"));
        assert_eq!(s.children(vp), &[first, second]);
    }

    #[test]
    fn set_view_updates_viewport_transform() {
        let mut s = Surface::default();
        let v = ViewTransform::new(1.5, 100.0, 50.0);
        s.set_view(v);
        assert_eq!(s.view(), v);
        assert_eq!(s.element(s.viewport()).and_then(|e| e.transform), Some(v));
    }
}
