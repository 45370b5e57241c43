pub mod hit;
pub mod paint;
pub mod render;
pub mod scene;
pub mod svg;
pub mod theme;

pub use hit::{Hit, SelectionSink};
pub use render::render;
pub use scene::{Element, ElementKind, Role, Style, Surface};
pub use theme::{Rgba, Theme};
