//! WASM bridge for schema-canvas: exposes the editing session to the page.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the DOM
//! events, the autosave timer and the server `fetch`; everything else runs
//! here.

mod host;
mod json;

use erd_core::{ColumnId, ReferentialAction, TableColor, TableId, ViewTransform};
use erd_editor::autosave::load_cached;
use erd_editor::{InputEvent, SchemaEdit, Session};
use erd_render::Theme;
use erd_render::svg::to_svg;
use host::{DomCapture, PageHooks};
use wasm_bindgen::prelude::*;

/// The diagram controller behind one host element.
///
/// Pointer handlers return `true` when the diagram changed; the canvas
/// redraws itself in that case, the return value only tells the page to
/// refresh anything it derives from the document.
#[wasm_bindgen]
pub struct ErdCanvas {
    session: Session<PageHooks>,
    host: web_sys::Element,
    width: f64,
    height: f64,
    dark_mode: bool,
}

#[wasm_bindgen]
impl ErdCanvas {
    /// Attach to `host`, usually a `<div>` sized `width` × `height`.
    #[wasm_bindgen(constructor)]
    pub fn new(host: web_sys::Element, width: f64, height: f64) -> ErdCanvas {
        host::install_console();
        let mut session = Session::new(PageHooks::default());
        session.enable_dragging();
        session.enable_pan_zoom();
        ErdCanvas {
            session,
            host,
            width,
            height,
            dark_mode: false,
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.redraw();
    }

    /// Write the current diagram into the host element.
    pub fn redraw(&self) {
        self.host.set_inner_html(&self.svg_markup());
    }

    /// Standalone SVG of the diagram at the current view.
    pub fn svg_markup(&self) -> String {
        to_svg(self.session.surface(), self.width, self.height)
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        if self.dark_mode == dark {
            return;
        }
        self.dark_mode = dark;
        let theme = if dark { Theme::dark() } else { Theme::light() };
        self.session.set_theme(theme);
        self.redraw();
    }

    /// Console verbosity: `"error"`, `"warn"`, `"info"`, `"debug"` or `"trace"`.
    pub fn set_log_level(&self, level: &str) {
        host::set_log_level(level);
    }

    // ─── Callbacks ───────────────────────────────────────────────────────

    /// `cb(json)` with `{selection: {table, column}, update: {kind, ...}}`.
    pub fn on_selection_change(&mut self, cb: js_sys::Function) {
        self.session.hooks_mut().on_selection = Some(cb);
    }

    /// `cb(message)` for the status line.
    pub fn on_status(&mut self, cb: js_sys::Function) {
        self.session.hooks_mut().on_status = Some(cb);
    }

    /// `cb(json)` with `{k, x, y}` after a zoom or pan.
    pub fn on_view_change(&mut self, cb: js_sys::Function) {
        self.session.hooks_mut().on_view = Some(cb);
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Load a schema document. Returns `false` (keeping the current
    /// document) when it does not decode.
    pub fn load_json(&mut self, json: &str) -> bool {
        let ok = self.session.load_json(json).is_ok();
        if ok {
            self.redraw();
        }
        ok
    }

    /// Restore the document cached in local storage, if there is one.
    pub fn load_cached(&mut self) -> bool {
        let Some(schema) = load_cached(&self.session.hooks().store) else {
            return false;
        };
        self.session.load(schema);
        self.redraw();
        true
    }

    /// The document as pretty-printed JSON, or an empty string.
    pub fn to_json(&self) -> String {
        self.session.schema().to_json_pretty().unwrap_or_default()
    }

    pub fn schema_name(&self) -> String {
        self.session.schema().name.clone()
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    pub fn pointer_down(&mut self, pointer_id: i32, x: f64, y: f64) -> bool {
        self.input(InputEvent::PointerDown { pointer_id, x, y })
    }

    pub fn pointer_move(&mut self, pointer_id: i32, x: f64, y: f64) -> bool {
        self.input(InputEvent::PointerMove { pointer_id, x, y })
    }

    pub fn pointer_up(&mut self, pointer_id: i32, x: f64, y: f64) -> bool {
        self.input(InputEvent::PointerUp { pointer_id, x, y })
    }

    pub fn pointer_cancel(&mut self, pointer_id: i32) -> bool {
        self.input(InputEvent::PointerCancel { pointer_id })
    }

    /// The page should `preventDefault()` the wheel event when this
    /// returns `true`.
    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) -> bool {
        self.input(InputEvent::Wheel { x, y, delta_y })
    }

    pub fn click(&mut self, x: f64, y: f64) -> bool {
        self.input(InputEvent::Click { x, y })
    }

    pub fn is_panning(&self) -> bool {
        self.session.is_panning()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_dragging()
    }

    /// Current view as `{k, x, y}`.
    pub fn view_json(&self) -> String {
        let v = self.session.view();
        serde_json::json!({ "k": v.k, "x": v.tx, "y": v.ty }).to_string()
    }

    pub fn set_view(&mut self, k: f64, x: f64, y: f64) {
        self.session.set_view(ViewTransform::new(k, x, y));
        self.redraw();
    }

    /// Frame the whole diagram. Returns `false` for an empty document.
    pub fn fit_view(&mut self) -> bool {
        let ok = self.session.fit_view(self.width, self.height);
        if ok {
            self.redraw();
        }
        ok
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a table by id; an empty id clears the selection.
    pub fn select_table(&mut self, table_id: &str) {
        let id = (!table_id.is_empty()).then(|| TableId::intern(table_id));
        self.session.select_table(id);
        self.redraw();
    }

    pub fn select_column(&mut self, table_id: &str, column_id: &str) -> bool {
        let ok = self
            .session
            .select_column(TableId::intern(table_id), ColumnId::intern(column_id));
        if ok {
            self.redraw();
        }
        ok
    }

    pub fn selection_json(&self) -> String {
        json::selection(self.session.selection()).to_string()
    }

    /// Foreign-key pickers of the selected table listing the columns of
    /// `target_table_id` (the first table when empty). `null` when no table
    /// is selected.
    pub fn foreign_key_choices_json(&self, target_table_id: &str) -> String {
        let target = (!target_table_id.is_empty()).then(|| TableId::intern(target_table_id));
        match self.session.foreign_key_choices(target) {
            Some(c) => json::foreign_key_choices(&c).to_string(),
            None => "null".to_string(),
        }
    }

    /// Form state of the selected column, or `null`.
    pub fn column_form_json(&self) -> String {
        match self.session.column_form() {
            Some(f) => json::column_form(&f).to_string(),
            None => "null".to_string(),
        }
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    pub fn add_table(&mut self, name: &str) -> bool {
        self.edit(SchemaEdit::AddTable {
            name: name.to_string(),
        })
    }

    pub fn rename_table(&mut self, table_id: &str, name: &str) -> bool {
        self.edit(SchemaEdit::RenameTable {
            id: TableId::intern(table_id),
            name: name.to_string(),
        })
    }

    pub fn delete_table(&mut self, table_id: &str) -> bool {
        self.edit(SchemaEdit::DeleteTable {
            id: TableId::intern(table_id),
        })
    }

    /// `color` is one of `white`, `blue`, `green`, `red`.
    pub fn set_table_color(&mut self, table_id: &str, color: &str) -> bool {
        self.edit(SchemaEdit::SetTableColor {
            id: TableId::intern(table_id),
            color: TableColor::from(color.to_string()),
        })
    }

    /// `draft_json`: `{name, type, nullable, default, primaryKey, unique}`.
    pub fn add_column(&mut self, table_id: &str, draft_json: &str) -> bool {
        let Some(draft) = json::parse_draft(draft_json) else {
            return false;
        };
        self.edit(SchemaEdit::AddColumn {
            table: TableId::intern(table_id),
            draft,
        })
    }

    pub fn update_column(&mut self, table_id: &str, column_id: &str, draft_json: &str) -> bool {
        let Some(draft) = json::parse_draft(draft_json) else {
            return false;
        };
        self.edit(SchemaEdit::UpdateColumn {
            table: TableId::intern(table_id),
            column: ColumnId::intern(column_id),
            draft,
        })
    }

    pub fn delete_column(&mut self, table_id: &str, column_id: &str) -> bool {
        self.edit(SchemaEdit::DeleteColumn {
            table: TableId::intern(table_id),
            column: ColumnId::intern(column_id),
        })
    }

    /// `on_delete` is an SQL action such as `"CASCADE"` or `"SET NULL"`.
    pub fn add_foreign_key(
        &mut self,
        from_table: &str,
        from_column: &str,
        to_table: &str,
        to_column: &str,
        on_delete: &str,
    ) -> bool {
        self.edit(SchemaEdit::AddForeignKey {
            from_table: TableId::intern(from_table),
            from_column: ColumnId::intern(from_column),
            to_table: TableId::intern(to_table),
            to_column: ColumnId::intern(to_column),
            on_delete: ReferentialAction::from(on_delete.to_string()),
        })
    }

    pub fn remove_foreign_keys_for_column(&mut self, table_id: &str, column_id: &str) -> bool {
        self.edit(SchemaEdit::RemoveForeignKeysForColumn {
            table: TableId::intern(table_id),
            column: ColumnId::intern(column_id),
        })
    }

    // ─── Autosave ────────────────────────────────────────────────────────

    /// How often the page should call [`ErdCanvas::autosave_due`].
    pub fn autosave_tick_ms(&self) -> u32 {
        self.session.autosave().config().tick_interval_ms
    }

    /// File name to send with the payload.
    pub fn autosave_target(&self) -> String {
        self.session.autosave().config().target_file.clone()
    }

    pub fn autosave_due(&self, now_ms: f64) -> bool {
        self.session.autosave_due(now_ms)
    }

    /// Document body for the server; empty if it cannot be encoded.
    pub fn autosave_payload(&self) -> String {
        match self.session.autosave_payload() {
            Ok(json) => json,
            Err(e) => {
                log::error!("{e}");
                String::new()
            }
        }
    }

    /// Report how the send started at `now_ms` went.
    pub fn autosave_finished(&mut self, ok: bool, now_ms: f64) {
        self.session.autosave_finished(ok, now_ms);
    }
}

impl ErdCanvas {
    fn input(&mut self, event: InputEvent) -> bool {
        let mut capture = DomCapture(&self.host);
        let changed = self.session.handle(event, &mut capture);
        if changed {
            self.redraw();
        }
        changed
    }

    fn edit(&mut self, edit: SchemaEdit) -> bool {
        let ok = self.session.apply(edit).is_ok();
        if ok {
            self.redraw();
        }
        ok
    }
}
