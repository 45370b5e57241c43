pub mod autosave;
pub mod commands;
pub mod drag;
pub mod input;
pub mod selection;
pub mod session;
pub mod viewport;

pub use autosave::{Autosave, AutosaveConfig, LocalStore, MemoryStore};
pub use commands::{ColumnDraft, EditError, SchemaEdit};
pub use input::{CaptureError, InputEvent, NoCapture, PointerCapture, PointerId};
pub use selection::{ColumnForm, ForeignKeyChoices};
pub use session::{HostHooks, Session, SelectionUpdate};
pub use viewport::{Viewport, ZoomDirection};
