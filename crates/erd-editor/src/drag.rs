//! Drag controller: repositions a table from its drag handle.
//!
//! `Idle → Dragging → Idle`. A gesture starts only on a drag-handle hit,
//! moves the table to the pointer minus the grab offset (rounded to whole
//! units), and ends on pointer-up or pointer-cancel with a single commit.

use crate::input::{PointerCapture, PointerId, release_quietly};
use erd_core::geometry::table_origin;
use erd_core::{Position, Schema, TableId};
use erd_render::Hit;
use kurbo::{Point, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        pointer_id: PointerId,
        table: TableId,
        /// Pointer minus table origin at grab time, in diagram units.
        offset: Vec2,
    },
}

/// A finished drag; the table's new position is already in the schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragCommit {
    pub table: TableId,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Start dragging when `hit` is a drag handle of a table in `schema`.
    /// `at` is the pointer in diagram space. Returns `true` when a gesture
    /// started; the caller must then suppress selection for this press.
    pub fn pointer_down(
        &mut self,
        schema: &Schema,
        hit: Hit,
        pointer_id: PointerId,
        at: Point,
        capture: &mut impl PointerCapture,
    ) -> bool {
        let Hit::DragHandle(table_id) = hit else {
            return false;
        };
        if let DragState::Dragging { pointer_id: active, .. } = self.state {
            log::debug!("ignoring drag start for pointer {pointer_id}; pointer {active} is dragging");
            return false;
        }
        let Some(table) = schema.table(table_id) else {
            log::debug!("drag handle for unknown table {table_id}");
            return false;
        };

        let origin = table_origin(table);
        let offset = at - Point::new(origin.x, origin.y);
        if let Err(e) = capture.set_capture(pointer_id) {
            log::debug!("drag continues without capture: {e}");
        }
        self.state = DragState::Dragging {
            pointer_id,
            table: table_id,
            offset,
        };
        log::debug!("drag start {table_id} offset ({}, {})", offset.x, offset.y);
        true
    }

    /// Move the dragged table under the pointer. Returns the moved table
    /// so the caller can re-render.
    pub fn pointer_move(
        &mut self,
        schema: &mut Schema,
        pointer_id: PointerId,
        at: Point,
    ) -> Option<TableId> {
        let DragState::Dragging {
            pointer_id: active,
            table,
            offset,
        } = self.state
        else {
            return None;
        };
        if active != pointer_id {
            return None;
        }
        let target = at - offset;
        let t = schema.table_mut(table)?;
        t.position = Some(Position::new(target.x.round(), target.y.round()));
        log::trace!("drag {table} → {:?}", t.position);
        Some(table)
    }

    /// End the gesture (pointer-up or pointer-cancel), releasing capture.
    /// Returns the commit, or `None` when no drag was active.
    pub fn release(
        &mut self,
        schema: &Schema,
        capture: &mut impl PointerCapture,
    ) -> Option<DragCommit> {
        let DragState::Dragging {
            pointer_id, table, ..
        } = std::mem::take(&mut self.state)
        else {
            return None;
        };
        release_quietly(capture, pointer_id);
        let position = schema.table(table).and_then(|t| t.position);
        log::debug!("drag end {table} at {position:?}");
        Some(DragCommit { table, position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NoCapture;
    use erd_core::Table;
    use pretty_assertions::assert_eq;

    fn schema_with_table_at(x: f64, y: f64) -> (Schema, TableId) {
        let id = TableId::intern("tbl_drag");
        let mut t = Table::new(id, "drag");
        t.position = Some(Position::new(x, y));
        let mut s = Schema::new("drag");
        s.tables.push(t);
        (s, id)
    }

    #[test]
    fn moves_by_the_pointer_delta() {
        let (mut schema, id) = schema_with_table_at(10.0, 10.0);
        let mut drag = DragController::new();
        let mut cap = NoCapture;

        let grab = Point::new(236.0, 18.0);
        assert!(drag.pointer_down(&schema, Hit::DragHandle(id), 1, grab, &mut cap));
        drag.pointer_move(&mut schema, 1, grab + Vec2::new(20.0, -5.0));
        drag.pointer_move(&mut schema, 1, grab + Vec2::new(50.0, -20.0));

        let commit = drag.release(&schema, &mut cap).unwrap();
        assert_eq!(commit.position, Some(Position::new(60.0, -10.0)));
        assert_eq!(schema.tables[0].position, Some(Position::new(60.0, -10.0)));
        assert!(!drag.is_dragging());
        assert!(drag.release(&schema, &mut cap).is_none());
    }

    #[test]
    fn positions_are_rounded() {
        let (mut schema, id) = schema_with_table_at(0.0, 0.0);
        let mut drag = DragController::new();
        drag.pointer_down(&schema, Hit::DragHandle(id), 1, Point::new(0.0, 0.0), &mut NoCapture);
        drag.pointer_move(&mut schema, 1, Point::new(12.4, 7.6));
        assert_eq!(schema.tables[0].position, Some(Position::new(12.0, 8.0)));
    }

    #[test]
    fn only_drag_handles_start_a_gesture() {
        let (schema, id) = schema_with_table_at(0.0, 0.0);
        let mut drag = DragController::new();
        assert!(!drag.pointer_down(&schema, Hit::Table(id), 1, Point::ZERO, &mut NoCapture));
        assert!(!drag.pointer_down(&schema, Hit::Background, 1, Point::ZERO, &mut NoCapture));
        assert_eq!(drag.state(), DragState::Idle);
    }

    #[test]
    fn first_gesture_wins() {
        let (mut schema, id) = schema_with_table_at(0.0, 0.0);
        let mut drag = DragController::new();
        assert!(drag.pointer_down(&schema, Hit::DragHandle(id), 1, Point::ZERO, &mut NoCapture));
        assert!(!drag.pointer_down(&schema, Hit::DragHandle(id), 2, Point::ZERO, &mut NoCapture));
        assert_eq!(drag.pointer_move(&mut schema, 2, Point::new(99.0, 99.0)), None);
        assert_eq!(schema.tables[0].position, Some(Position::new(0.0, 0.0)));
    }

    #[test]
    fn table_without_position_drags_from_default() {
        let (mut schema, id) = schema_with_table_at(0.0, 0.0);
        schema.tables[0].position = None;
        let mut drag = DragController::new();
        drag.pointer_down(&schema, Hit::DragHandle(id), 1, Point::new(60.0, 60.0), &mut NoCapture);
        drag.pointer_move(&mut schema, 1, Point::new(70.0, 60.0));
        assert_eq!(schema.tables[0].position, Some(Position::new(60.0, 50.0)));
    }
}
