use erd_core::{ColumnId, Position, Schema, Selection, TableId, ViewTransform};
use erd_editor::{
    CaptureError, HostHooks, InputEvent, NoCapture, PointerCapture, PointerId, SchemaEdit,
    SelectionUpdate, Session,
};
use pretty_assertions::assert_eq;

const CRM: &str = include_str!("fixtures/crm.json");

#[derive(Default)]
struct Page {
    persisted: Vec<Schema>,
    views: Vec<ViewTransform>,
    updates: Vec<SelectionUpdate>,
}

impl HostHooks for Page {
    fn persist(&mut self, schema: &Schema) {
        self.persisted.push(schema.clone());
    }

    fn selection_changed(&mut self, _selection: Selection, update: &SelectionUpdate) {
        self.updates.push(update.clone());
    }

    fn view_changed(&mut self, view: ViewTransform) {
        self.views.push(view);
    }
}

/// Records capture calls; release can be made to fail.
#[derive(Default)]
struct Capture {
    held: Vec<PointerId>,
    released: Vec<PointerId>,
    fail_release: bool,
}

impl PointerCapture for Capture {
    fn set_capture(&mut self, pointer_id: PointerId) -> Result<(), CaptureError> {
        self.held.push(pointer_id);
        Ok(())
    }

    fn release_capture(&mut self, pointer_id: PointerId) -> Result<(), CaptureError> {
        self.released.push(pointer_id);
        if self.fail_release {
            Err(CaptureError {
                pointer_id,
                reason: "InvalidPointerId".into(),
            })
        } else {
            Ok(())
        }
    }
}

fn session() -> Session<Page> {
    let mut s = Session::new(Page::default());
    s.load_json(CRM).unwrap();
    s.enable_dragging();
    s.enable_pan_zoom();
    s
}

fn accounts() -> TableId {
    TableId::intern("tbl_accounts_1")
}

fn down(pointer_id: PointerId, x: f64, y: f64) -> InputEvent {
    InputEvent::PointerDown { pointer_id, x, y }
}

fn mv(pointer_id: PointerId, x: f64, y: f64) -> InputEvent {
    InputEvent::PointerMove { pointer_id, x, y }
}

fn up(pointer_id: PointerId, x: f64, y: f64) -> InputEvent {
    InputEvent::PointerUp { pointer_id, x, y }
}

#[test]
fn fixture_renders_resolvable_edges_only() {
    let s = session();
    assert_eq!(s.surface().table_node_count(), 2);
    // fk_contacts_owner targets a missing table
    assert_eq!(s.surface().edge_count(), 1);
}

#[test]
fn drag_commits_once_with_the_new_position() {
    let mut s = session();
    let mut cap = Capture::default();
    let persisted_at_load = s.hooks().persisted.len();

    // accounts sits at (10, 10); its handle spans (224..240, 16..32)
    assert!(!s.handle(down(1, 230.0, 20.0), &mut cap));
    assert!(s.is_dragging());
    assert!(s.handle(mv(1, 250.0, 10.0), &mut cap));
    assert!(s.handle(mv(1, 280.0, 0.0), &mut cap));
    assert_eq!(s.hooks().persisted.len(), persisted_at_load);
    assert!(s.handle(up(1, 280.0, 0.0), &mut cap));

    let table = s.schema().table(accounts()).unwrap();
    assert_eq!(table.position, Some(Position::new(60.0, -10.0)));

    let commits = &s.hooks().persisted[persisted_at_load..];
    assert_eq!(commits.len(), 1);
    assert_eq!(
        commits[0].table(accounts()).unwrap().position,
        Some(Position::new(60.0, -10.0))
    );
    assert_eq!(cap.held, vec![1]);
    assert_eq!(cap.released, vec![1]);
    assert!(!s.is_panning());
}

#[test]
fn drag_follows_the_pointer_in_diagram_space() {
    let mut s = session();
    s.set_view(ViewTransform::new(2.0, 0.0, 0.0));

    // handle point (230, 20) is at screen (460, 40) at 2x
    s.handle(down(4, 460.0, 40.0), &mut NoCapture);
    s.handle(mv(4, 560.0, 0.0), &mut NoCapture);
    s.handle(InputEvent::PointerCancel { pointer_id: 4 }, &mut NoCapture);

    assert_eq!(
        s.schema().table(accounts()).unwrap().position,
        Some(Position::new(60.0, -10.0))
    );
}

#[test]
fn rows_stay_clickable_during_a_drag() {
    let mut s = session();
    s.handle(down(1, 230.0, 20.0), &mut NoCapture);
    s.handle(mv(1, 330.0, 20.0), &mut NoCapture);

    // accounts moved right by 100; its second row is centred at y = 79
    assert!(s.handle(InputEvent::Click { x: 150.0, y: 79.0 }, &mut NoCapture));
    assert_eq!(
        s.selection(),
        Selection::column(accounts(), ColumnId::intern("col_acc_name"))
    );
    s.handle(up(1, 330.0, 20.0), &mut NoCapture);
}

#[test]
fn release_failure_does_not_stop_cleanup() {
    let mut s = session();
    let mut cap = Capture {
        fail_release: true,
        ..Capture::default()
    };
    s.handle(down(9, 230.0, 20.0), &mut cap);
    s.handle(mv(9, 240.0, 20.0), &mut cap);
    assert!(s.handle(InputEvent::PointerCancel { pointer_id: 9 }, &mut cap));
    assert!(!s.is_dragging());
    assert_eq!(cap.released, vec![9]);
}

#[test]
fn pan_then_cancel_keeps_the_last_view() {
    let mut s = session();
    let mut cap = Capture::default();

    assert!(!s.handle(down(2, 900.0, 900.0), &mut cap));
    assert!(s.is_panning());
    assert!(s.handle(mv(2, 950.0, 880.0), &mut cap));
    assert!(s.handle(InputEvent::PointerCancel { pointer_id: 2 }, &mut cap));

    let expected = ViewTransform::new(1.0, 50.0, -20.0);
    assert_eq!(s.view(), expected);
    assert_eq!(s.surface().view(), expected);
    assert_eq!(s.hooks().views, vec![expected]);
    assert_eq!(cap.released, vec![2]);
}

#[test]
fn pressing_a_table_body_neither_pans_nor_drags() {
    let mut s = session();
    s.handle(down(1, 100.0, 60.0), &mut NoCapture);
    assert!(!s.is_panning());
    assert!(!s.is_dragging());
    assert!(!s.handle(mv(1, 300.0, 300.0), &mut NoCapture));
    assert_eq!(s.view(), ViewTransform::IDENTITY);
}

#[test]
fn click_priority() {
    let mut s = session();
    let before = s.selection();

    // drag handle: nothing happens
    assert!(!s.handle(InputEvent::Click { x: 230.0, y: 20.0 }, &mut NoCapture));
    assert_eq!(s.selection(), before);

    // first row of accounts
    s.handle(InputEvent::Click { x: 100.0, y: 57.0 }, &mut NoCapture);
    assert_eq!(
        s.selection(),
        Selection::column(accounts(), ColumnId::intern("col_acc_id"))
    );
    assert!(matches!(
        s.hooks().updates.last(),
        Some(SelectionUpdate::Column(form)) if form.primary_key && form.name == "id"
    ));

    // header of contacts
    s.handle(InputEvent::Click { x: 450.0, y: 310.0 }, &mut NoCapture);
    assert_eq!(
        s.selection(),
        Selection::table(Some(TableId::intern("tbl_contacts_1")))
    );

    // background
    s.handle(InputEvent::Click { x: 900.0, y: 20.0 }, &mut NoCapture);
    assert!(s.selection().is_empty());
    assert_eq!(s.hooks().updates.last(), Some(&SelectionUpdate::Cleared));
}

#[test]
fn wheel_zoom_then_reverse_restores_the_view() {
    let mut s = session();
    let wheel = |delta_y| InputEvent::Wheel {
        x: 300.0,
        y: 200.0,
        delta_y,
    };
    s.handle(wheel(-120.0), &mut NoCapture);
    s.handle(wheel(120.0), &mut NoCapture);
    let v = s.view();
    assert!((v.k - 1.0).abs() < 1e-9);
    assert!(v.tx.abs() < 1e-9);
    assert!(v.ty.abs() < 1e-9);
}

#[test]
fn deleting_a_table_removes_its_edges_and_node() {
    let mut s = session();
    s.apply(SchemaEdit::DeleteTable { id: accounts() }).unwrap();
    assert_eq!(s.surface().table_node_count(), 1);
    assert_eq!(s.surface().edge_count(), 0);
    // the dangling key to the missing users table survives untouched
    assert_eq!(s.schema().foreign_keys.len(), 1);
}

#[test]
fn indexes_survive_a_save_roundtrip() {
    let s = session();
    let json = s.autosave_payload().unwrap();
    let again = Schema::from_json(&json).unwrap();
    assert_eq!(again, *s.schema());
    assert_eq!(again.tables[0].indexes.len(), 1);
}

#[test]
fn fit_view_frames_both_tables() {
    let mut s = session();
    assert!(s.fit_view(800.0, 600.0));
    let v = s.view();
    assert!(v.k <= 1.0);
    assert_eq!(s.hooks().views, vec![v]);

    // both table origins land on screen
    for table in &s.schema().tables {
        let p = table.position.unwrap();
        let (x, y) = v.to_screen(p.x, p.y);
        assert!((0.0..=800.0).contains(&x) && (0.0..=600.0).contains(&y));
    }
}
