//! Browser-side implementations of the session's host traits.

use crate::json;
use erd_core::{Schema, Selection, ViewTransform};
use erd_editor::autosave::{LOCAL_STORAGE_KEY, cache_schema};
use erd_editor::{CaptureError, HostHooks, LocalStore, PointerCapture, PointerId, SelectionUpdate};
use wasm_bindgen::JsValue;

/// `window.localStorage`, or nothing when the page has no storage.
#[derive(Default)]
pub struct BrowserStore;

impl BrowserStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

impl LocalStore for BrowserStore {
    fn save(&mut self, json: &str) {
        let Some(storage) = Self::storage() else {
            return;
        };
        if let Err(e) = storage.set_item(LOCAL_STORAGE_KEY, json) {
            log::warn!("localStorage write failed: {e:?}");
        }
    }

    fn load(&self) -> Option<String> {
        Self::storage()?.get_item(LOCAL_STORAGE_KEY).ok().flatten()
    }
}

/// Page callbacks. Every callback is optional.
#[derive(Default)]
pub struct PageHooks {
    pub store: BrowserStore,
    pub on_selection: Option<js_sys::Function>,
    pub on_status: Option<js_sys::Function>,
    pub on_view: Option<js_sys::Function>,
}

fn call(f: &Option<js_sys::Function>, arg: JsValue) {
    let Some(f) = f else {
        return;
    };
    if let Err(e) = f.call1(&JsValue::NULL, &arg) {
        log::error!("page callback threw: {e:?}");
    }
}

impl HostHooks for PageHooks {
    fn persist(&mut self, schema: &Schema) {
        cache_schema(&mut self.store, schema);
    }

    fn selection_changed(&mut self, selection: Selection, update: &SelectionUpdate) {
        let payload = json::selection_change(selection, update).to_string();
        call(&self.on_selection, JsValue::from_str(&payload));
    }

    fn view_changed(&mut self, view: ViewTransform) {
        let payload = serde_json::json!({ "k": view.k, "x": view.tx, "y": view.ty });
        call(&self.on_view, JsValue::from_str(&payload.to_string()));
    }

    fn status(&mut self, message: &str) {
        call(&self.on_status, JsValue::from_str(message));
    }
}

/// Pointer capture on the diagram's host element.
pub struct DomCapture<'a>(pub &'a web_sys::Element);

fn capture_error(pointer_id: PointerId, e: JsValue) -> CaptureError {
    CaptureError {
        pointer_id,
        reason: format!("{e:?}"),
    }
}

impl PointerCapture for DomCapture<'_> {
    fn set_capture(&mut self, pointer_id: PointerId) -> Result<(), CaptureError> {
        self.0
            .set_pointer_capture(pointer_id)
            .map_err(|e| capture_error(pointer_id, e))
    }

    fn release_capture(&mut self, pointer_id: PointerId) -> Result<(), CaptureError> {
        self.0
            .release_pointer_capture(pointer_id)
            .map_err(|e| capture_error(pointer_id, e))
    }
}

// ─── Console logging & panic hook ────────────────────────────────────────

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Route `log` records and panics to the browser console. Idempotent.
pub fn install_console() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static INSTALL: Once = Once::new();
        static LOGGER: ConsoleLogger = ConsoleLogger;
        INSTALL.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("schema-canvas panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

/// Raise or lower console verbosity.
pub fn set_log_level(level: &str) {
    match level.parse::<log::LevelFilter>() {
        Ok(filter) => log::set_max_level(filter),
        Err(_) => log::warn!("unknown log level {level:?}"),
    }
}
