pub mod geometry;
pub mod id;
pub mod model;
pub mod types;

pub use geometry::{Bounds, ViewTransform, column_anchor_y, table_bounds};
pub use id::{ColumnId, ConstraintId, ForeignKeyId, TableId};
pub use model::*;
pub use types::{COMMON_TYPES, SqlType, normalize_type_name};
