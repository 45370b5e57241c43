//! Editing session.
//!
//! Owns the document, selection, view transform, gesture state and drawing
//! surface, and wires them together: input events go through hit testing to
//! the drag controller, the pan gesture or the selection coordinator; edits
//! are applied, persisted and re-rendered. The page supplies [`HostHooks`]
//! for everything outside the diagram.

use crate::autosave::Autosave;
use crate::commands::{EditError, FollowUp, SchemaEdit};
use crate::drag::DragController;
use crate::input::{InputEvent, PointerCapture};
use crate::selection::{
    ColumnForm, ForeignKeyChoices, SelectionCoordinator, column_form, foreign_key_choices,
};
use crate::viewport::Viewport;
use erd_core::geometry::diagram_extent;
use erd_core::{ColumnId, Schema, SchemaError, Selection, TableId, ViewTransform};
use erd_render::{SelectionSink, Surface, Theme, render};
use kurbo::Point;

/// What the page should show for the new selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionUpdate {
    Cleared,
    Table(ForeignKeyChoices),
    Column(ColumnForm),
}

/// Callbacks into the page.
pub trait HostHooks {
    /// Cache the document. Called once per committed change.
    fn persist(&mut self, schema: &Schema);

    fn selection_changed(&mut self, _selection: Selection, _update: &SelectionUpdate) {}

    /// Called when a wheel zoom or a pan gesture finishes.
    fn view_changed(&mut self, _view: ViewTransform) {}

    fn status(&mut self, _message: &str) {}
}

/// Collects the selection callback of a click.
#[derive(Default)]
struct ClickTarget(Option<Selection>);

impl SelectionSink for ClickTarget {
    fn select_table(&mut self, table: TableId) {
        self.0 = Some(Selection::table(Some(table)));
    }

    fn select_column(&mut self, table: TableId, column: ColumnId) {
        self.0 = Some(Selection::column(table, column));
    }
}

pub struct Session<H: HostHooks> {
    schema: Schema,
    selection: SelectionCoordinator,
    viewport: Viewport,
    drag: DragController,
    surface: Surface,
    autosave: Autosave,
    hooks: H,
    dragging_enabled: bool,
    pan_zoom_enabled: bool,
}

impl<H: HostHooks> Session<H> {
    pub fn new(hooks: H) -> Self {
        Self::with_theme(hooks, Theme::default())
    }

    pub fn with_theme(hooks: H, theme: Theme) -> Self {
        Self {
            schema: Schema::default(),
            selection: SelectionCoordinator::new(),
            viewport: Viewport::new(),
            drag: DragController::new(),
            surface: Surface::new(theme),
            autosave: Autosave::default(),
            hooks,
            dragging_enabled: false,
            pan_zoom_enabled: false,
        }
    }

    /// Replace the autosave cadence.
    pub fn set_autosave(&mut self, autosave: Autosave) {
        self.autosave = autosave;
    }

    /// Take over `schema`: cache it, draw it and select its first table.
    pub fn load(&mut self, schema: Schema) {
        self.schema = schema;
        self.drag = DragController::new();
        self.selection.clear();
        self.hooks.status(&format!("Loaded: {}", self.schema.name));
        self.persist();
        self.render();
        if let Some(first) = self.schema.tables.first().map(|t| t.id) {
            self.select_table(Some(first));
        }
        log::debug!(
            "loaded {} tables, {} foreign keys",
            self.schema.tables.len(),
            self.schema.foreign_keys.len()
        );
    }

    /// Decode and load a JSON document. On failure the current document is
    /// kept and the page is told.
    pub fn load_json(&mut self, json: &str) -> Result<(), SchemaError> {
        match Schema::from_json(json) {
            Ok(schema) => {
                self.load(schema);
                Ok(())
            }
            Err(e) => {
                log::warn!("{e}");
                self.hooks.status("Failed to load schema.");
                Err(e)
            }
        }
    }

    /// Let pointer-downs on drag handles move tables.
    pub fn enable_dragging(&mut self) {
        self.dragging_enabled = true;
    }

    /// Let the wheel zoom and background drags pan.
    pub fn enable_pan_zoom(&mut self) {
        self.pan_zoom_enabled = true;
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn selection(&self) -> Selection {
        self.selection.current()
    }

    pub fn view(&self) -> ViewTransform {
        self.viewport.view()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn is_panning(&self) -> bool {
        self.viewport.is_panning()
    }

    /// Rebuild the surface from the current document and selection.
    pub fn render(&mut self) {
        render(&mut self.surface, &self.schema, &self.selection.current());
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.surface.set_theme(theme);
        self.render();
    }

    pub fn set_view(&mut self, view: ViewTransform) {
        if !self.viewport.set_view(view) {
            return;
        }
        self.surface.set_view(self.viewport.view());
        self.hooks.view_changed(self.viewport.view());
    }

    /// Frame every table in a `width` × `height` screen. Returns `false`
    /// for an empty document.
    pub fn fit_view(&mut self, width: f64, height: f64) -> bool {
        let Some(extent) = diagram_extent(&self.schema.tables) else {
            return false;
        };
        let view = self.viewport.fit(extent, width, height);
        self.surface.set_view(view);
        self.hooks.view_changed(view);
        true
    }

    pub fn select_table(&mut self, id: Option<TableId>) {
        let update = match self.selection.select_table(&self.schema, id) {
            Some(choices) => SelectionUpdate::Table(choices),
            None => SelectionUpdate::Cleared,
        };
        self.render();
        self.hooks
            .selection_changed(self.selection.current(), &update);
    }

    /// Returns `false` (and changes nothing) if the ids do not resolve.
    pub fn select_column(&mut self, table: TableId, column: ColumnId) -> bool {
        let Some(form) = self.selection.select_column(&self.schema, table, column) else {
            return false;
        };
        self.render();
        self.hooks
            .selection_changed(self.selection.current(), &SelectionUpdate::Column(form));
        true
    }

    /// Foreign-key pickers of the selected table with `target` as the target
    /// table; `None` when no table is selected.
    pub fn foreign_key_choices(&self, target: Option<TableId>) -> Option<ForeignKeyChoices> {
        let source = self.selection.current().table_id()?;
        Some(foreign_key_choices(&self.schema, source, target))
    }

    /// Form state of the selected column, if any.
    pub fn column_form(&self) -> Option<ColumnForm> {
        let sel = self.selection.current();
        column_form(&self.schema, sel.table_id()?, sel.column_id()?)
    }

    /// Apply an edit, then persist, update the selection and re-render.
    /// Failures leave the document untouched and are reported as status.
    pub fn apply(&mut self, edit: SchemaEdit) -> Result<(), EditError> {
        let outcome = match edit.apply(&mut self.schema, self.selection.current()) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::debug!("{} rejected: {e}", edit.label());
                self.hooks.status(&e.to_string());
                return Err(e);
            }
        };
        log::debug!("{}", edit.label());
        self.persist();
        if let Some(status) = &outcome.status {
            self.hooks.status(status);
        }
        match outcome.follow_up {
            FollowUp::Keep => {
                let changed = self.selection.retain_existing(&self.schema);
                self.render();
                if changed {
                    self.notify_selection();
                }
            }
            FollowUp::SelectTable(id) => self.select_table(id),
            FollowUp::SelectColumn(table, column) => {
                if !self.select_column(table, column) {
                    self.select_table(Some(table));
                }
            }
        }
        Ok(())
    }

    /// Tell the page about the current selection.
    fn notify_selection(&mut self) {
        let current = self.selection.current();
        let update = match (current.table_id(), current.column_id()) {
            (Some(t), Some(c)) => column_form(&self.schema, t, c).map(SelectionUpdate::Column),
            (Some(t), None) => Some(SelectionUpdate::Table(foreign_key_choices(
                &self.schema,
                t,
                None,
            ))),
            _ => None,
        }
        .unwrap_or(SelectionUpdate::Cleared);
        self.hooks.selection_changed(current, &update);
    }

    fn persist(&mut self) {
        self.autosave.mark_dirty();
        self.hooks.persist(&self.schema);
    }

    /// Route one input event. Returns `true` when the surface changed.
    pub fn handle(&mut self, event: InputEvent, capture: &mut impl PointerCapture) -> bool {
        match event {
            InputEvent::PointerDown { pointer_id, x, y } => {
                let screen = Point::new(x, y);
                let at = self.viewport.screen_to_diagram(screen);
                let hit = self.surface.hit_test(at.x, at.y);
                if self.dragging_enabled
                    && !self.viewport.is_panning()
                    && self
                        .drag
                        .pointer_down(&self.schema, hit, pointer_id, at, capture)
                {
                    return false;
                }
                if self.pan_zoom_enabled && hit.is_background() && !self.drag.is_dragging() {
                    self.viewport.begin_pan(pointer_id, screen, capture);
                }
                false
            }

            InputEvent::PointerMove { pointer_id, x, y } => {
                let screen = Point::new(x, y);
                if self.drag.is_dragging() {
                    let at = self.viewport.screen_to_diagram(screen);
                    if self
                        .drag
                        .pointer_move(&mut self.schema, pointer_id, at)
                        .is_some()
                    {
                        self.render();
                        return true;
                    }
                    return false;
                }
                if self.viewport.update_pan(pointer_id, screen) {
                    self.surface.set_view(self.viewport.view());
                    return true;
                }
                false
            }

            InputEvent::PointerUp { .. } | InputEvent::PointerCancel { .. } => {
                let mut changed = false;
                if let Some(commit) = self.drag.release(&self.schema, capture) {
                    log::debug!("commit {} at {:?}", commit.table, commit.position);
                    self.persist();
                    self.render();
                    changed = true;
                }
                if self.viewport.end_pan(capture) {
                    self.hooks.view_changed(self.viewport.view());
                    changed = true;
                }
                changed
            }

            InputEvent::Wheel { x, y, delta_y } => {
                if !self.pan_zoom_enabled {
                    return false;
                }
                let view = self.viewport.zoom_for_wheel(Point::new(x, y), delta_y);
                self.surface.set_view(view);
                self.hooks.view_changed(view);
                true
            }

            InputEvent::Click { x, y } => {
                let at = self.viewport.screen_to_diagram(Point::new(x, y));
                let mut target = ClickTarget::default();
                let hit = self.surface.dispatch_click(at.x, at.y, &mut target);
                match target.0 {
                    Some(sel) => match (sel.table_id(), sel.column_id()) {
                        (Some(table), Some(column)) => {
                            self.select_column(table, column);
                        }
                        (table, _) => self.select_table(table),
                    },
                    None if hit.is_background() => self.select_table(None),
                    None => return false,
                }
                true
            }
        }
    }

    // ─── Autosave ────────────────────────────────────────────────────────

    pub fn autosave(&self) -> &Autosave {
        &self.autosave
    }

    /// Whether the page should send the document now.
    pub fn autosave_due(&self, now_ms: f64) -> bool {
        self.autosave.due(now_ms)
    }

    /// Pretty-printed document for the server copy.
    pub fn autosave_payload(&self) -> Result<String, SchemaError> {
        self.schema.to_json_pretty()
    }

    /// Report the outcome of a send started at `now_ms`.
    pub fn autosave_finished(&mut self, ok: bool, now_ms: f64) {
        if ok {
            let status = self.autosave.mark_sent(now_ms);
            self.hooks.status(&status);
        } else {
            let status = self.autosave.mark_failed();
            self.hooks.status(status);
        }
    }
}
