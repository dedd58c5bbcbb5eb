//! Integration tests driving a view through host-supplied input.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use treeline::model::{
    ColumnTreeModel, Item, ItemFlags, ItemId, RowData, TreeModel, VisibilityTreeModel,
    WritableTreeModel,
};
use treeline::render::{ImageBuffer, Point, Rect, Size};
use treeline::widget::{
    Column, ColumnTreeView, DragPayload, DropPosition, ExternalDrop, InteractionState, MouseButton,
    PointerEvent, SortOrder, Transit, ViewHost, keys,
};
use treeline::ViewConfig;

const HEADER: f32 = 24.0;
const ROW: f32 = 20.0;
const INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
struct Row {
    name: String,
    size: u64,
}

impl RowData for Row {
    fn column_text(&self, column: usize) -> String {
        match column {
            0 => self.name.clone(),
            1 => self.size.to_string(),
            _ => String::new(),
        }
    }

    fn compare_column(&self, other: &Self, column: usize) -> Ordering {
        match column {
            1 => self.size.cmp(&other.size),
            _ => self.name.cmp(&other.name),
        }
    }
}

fn row(name: &str, size: u64) -> Item<Row> {
    Item::new(Row {
        name: name.to_string(),
        size,
    })
}

#[derive(Default)]
struct RecordingHost {
    invalidated: Mutex<Vec<Rect>>,
    drags: Mutex<Vec<Arc<DragPayload>>>,
    double_click: Option<Duration>,
}

impl ViewHost<Row> for RecordingHost {
    fn now(&self) -> Duration {
        Duration::ZERO
    }

    fn double_click_interval(&self) -> Option<Duration> {
        self.double_click
    }

    fn invalidate(&self, rect: Rect) {
        self.invalidated.lock().push(rect);
    }

    fn begin_drag(&self, payload: Arc<DragPayload>, _preview: ImageBuffer) -> bool {
        self.drags.lock().push(payload);
        true
    }
}

struct Fixture {
    model: Arc<ColumnTreeModel<Row>>,
    host: Arc<RecordingHost>,
    view: ColumnTreeView<Row>,
}

fn fixture_with_host(rows: usize, host: RecordingHost) -> Fixture {
    let model = Arc::new(ColumnTreeModel::new());
    for i in 0..rows {
        model
            .add_sub_item(None, row(&format!("row{i}"), (rows - i) as u64), None)
            .unwrap();
    }
    let host = Arc::new(host);
    let mut view = ColumnTreeView::new(model.clone(), host.clone(), ViewConfig::default()).unwrap();
    view.add_column(Column::new("Name", 120.0));
    view.add_column(Column::new("Size", 80.0));
    view.set_viewport_size(Size::new(400.0, HEADER + 10.0 * ROW));
    Fixture { model, host, view }
}

fn fixture(rows: usize) -> Fixture {
    fixture_with_host(rows, RecordingHost::default())
}

fn row_point(index: usize) -> Point {
    Point::new(60.0, HEADER + index as f32 * ROW + ROW / 2.0)
}

fn collect<A: Clone + Send + 'static>(signal: &treeline::Signal<A>) -> Arc<Mutex<Vec<A>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    signal.connect(move |args: &A| sink.lock().push(args.clone()));
    seen
}

fn click(view: &mut ColumnTreeView<Row>, position: Point, t: Duration) {
    view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, position, t));
    view.handle_pointer(&PointerEvent::released(MouseButton::Left, position, t));
}

#[test]
fn test_selection_shifts_over_inserted_rows() {
    let Fixture { model, view, .. } = fixture(10);
    for index in [2, 5, 7] {
        assert!(view.select(index, true));
    }
    for offset in 0..3 {
        model.add_sub_item(None, row("new", 0), Some(4 + offset)).unwrap();
    }
    assert_eq!(view.selected_indices(), vec![2, 8, 10]);

    let flagged: Vec<usize> = (0..model.count_visible_items())
        .filter(|&i| {
            model
                .visible_item_at(i)
                .and_then(|id| model.item_flags(id))
                .is_some_and(|f| f.contains(ItemFlags::SELECTED))
        })
        .collect();
    assert_eq!(flagged, vec![2, 8, 10]);
}

#[test]
fn test_hiding_rows_drops_their_selection() {
    let Fixture { model, view, .. } = fixture(5);
    for index in [0, 2, 4] {
        view.select(index, true);
    }
    let changes = collect(&view.signals().selection_changed);

    let hidden: Vec<ItemId> = (1..3).filter_map(|i| model.visible_item_at(i)).collect();
    for id in hidden {
        assert!(model.set_item_visible(id, false));
    }
    assert_eq!(view.selected_indices(), vec![0, 2]);
    assert_eq!(view.selected_items().len(), 2);
    assert_eq!(changes.lock().len(), 1);
}

#[test]
fn test_small_move_is_a_click_not_a_drag() {
    let Fixture { host, mut view, .. } = fixture(5);
    view.select(0, false);
    let changes = collect(&view.signals().selection_changed);

    let t = Duration::from_secs(1);
    let press = row_point(3);
    view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, press, t));
    assert!(matches!(view.row_interaction(), InteractionState::Pressed(_)));
    view.handle_pointer(&PointerEvent::moved(press.offset(1.0, 0.0), t));
    view.handle_pointer(&PointerEvent::released(MouseButton::Left, press.offset(1.0, 0.0), t));

    assert_eq!(view.selected_indices(), vec![3]);
    assert_eq!(changes.lock().len(), 1);
    assert!(host.drags.lock().is_empty());
    assert!(matches!(view.row_interaction(), InteractionState::Inside { .. }));
    assert_eq!(view.current_index(), Some(3));
}

#[test]
fn test_double_click_interval_boundary() {
    let one = Duration::from_millis(1);
    let t = Duration::from_secs(5);

    let Fixture { model, mut view, .. } = fixture(3);
    let invoked = collect(&view.signals().item_invoked);
    click(&mut view, row_point(1), t);
    click(&mut view, row_point(1), t + INTERVAL - one);
    assert_eq!(*invoked.lock(), vec![model.visible_item_at(1).unwrap()]);

    let Fixture { mut view, .. } = fixture(3);
    let invoked = collect(&view.signals().item_invoked);
    click(&mut view, row_point(1), t);
    click(&mut view, row_point(1), t + INTERVAL + one);
    assert!(invoked.lock().is_empty());
}

#[test]
fn test_host_double_click_interval_wins() {
    let host = RecordingHost {
        double_click: Some(Duration::from_millis(100)),
        ..Default::default()
    };
    let Fixture { mut view, .. } = fixture_with_host(3, host);
    let invoked = collect(&view.signals().item_invoked);
    let t = Duration::from_secs(5);
    click(&mut view, row_point(0), t);
    click(&mut view, row_point(0), t + Duration::from_millis(200));
    assert!(invoked.lock().is_empty());
}

#[test]
fn test_expander_click_toggles_without_selecting() {
    let Fixture { model, mut view, .. } = fixture(2);
    let parent = model.visible_item_at(0).unwrap();
    model.add_sub_item(Some(parent), row("child", 1), None).unwrap();
    assert_eq!(model.count_visible_items(), 2);

    // The expander sits in the first indentation slot of the tree column.
    let expander = Point::new(6.0, row_point(0).y);
    click(&mut view, expander, Duration::from_secs(1));
    assert_eq!(model.count_visible_items(), 3);
    assert!(view.selected_indices().is_empty());

    click(&mut view, expander, Duration::from_secs(3));
    assert_eq!(model.count_visible_items(), 2);
}

#[test]
fn test_external_payload_drop_is_reported() {
    let Fixture { model, mut view, .. } = fixture(3);
    let drops = collect(&view.signals().external_drop);

    let mut payload = DragPayload::new();
    payload.set(keys::TEXT, String::from("from elsewhere"));
    let payload = Arc::new(payload);

    let over = row_point(1);
    let t = Duration::ZERO;
    view.handle_pointer(
        &PointerEvent::moved(over, t)
            .with_transit(Transit::Entered)
            .with_payload(payload.clone()),
    );
    assert!(view.row_interaction().is_dragging());
    assert_eq!(view.drop_target().map(|t| t.position), Some(DropPosition::OnItem));

    view.handle_pointer(&PointerEvent::released(MouseButton::Left, over, t).with_payload(payload));
    let drops = drops.lock();
    assert_eq!(drops.len(), 1);
    let ExternalDrop { payload, point, .. } = &drops[0];
    assert_eq!(payload.get::<String>(keys::TEXT).map(String::as_str), Some("from elsewhere"));
    assert_eq!(point.parent, model.visible_item_at(1));
    assert_eq!(model.count_items(), 3);
    assert!(view.drop_target().is_none());
}

#[test]
fn test_payload_leaving_cancels_drag() {
    let Fixture { mut view, .. } = fixture(3);
    let mut payload = DragPayload::new();
    payload.set(keys::TEXT, String::from("x"));
    let payload = Arc::new(payload);

    view.handle_pointer(
        &PointerEvent::moved(row_point(0), Duration::ZERO)
            .with_transit(Transit::Entered)
            .with_payload(payload),
    );
    assert!(view.row_interaction().is_dragging());
    view.handle_pointer(&PointerEvent::exited(Point::new(500.0, 500.0), Duration::ZERO));
    assert!(matches!(view.row_interaction(), InteractionState::Outside));
    assert!(view.drop_target().is_none());
}

#[test]
fn test_dragging_selection_carries_items_and_text() {
    let Fixture { model, host, mut view } = fixture(4);
    view.select_range(1, 2, false).unwrap();
    let t = Duration::ZERO;
    view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, row_point(1), t));
    view.handle_pointer(&PointerEvent::moved(row_point(1).offset(0.0, 6.0), t));

    let drags = host.drags.lock();
    assert_eq!(drags.len(), 1);
    let expected: Vec<ItemId> = [1, 2].iter().filter_map(|&i| model.visible_item_at(i)).collect();
    assert_eq!(drags[0].items(), Some(expected.as_slice()));
    assert_eq!(drags[0].get::<String>(keys::TEXT).map(String::as_str), Some("row1\nrow2"));
}

#[test]
fn test_second_header_sorts_by_its_column() {
    let Fixture { model, mut view, .. } = fixture(3);
    let clicked = collect(&view.signals().header_clicked);
    let sorted = collect(&view.signals().sort_changed);

    // Sizes are 3, 2, 1 in insertion order.
    click(&mut view, Point::new(150.0, HEADER / 2.0), Duration::ZERO);
    assert_eq!(*clicked.lock(), vec![1]);
    assert_eq!(*sorted.lock(), vec![(1, SortOrder::Ascending)]);
    let first = model.visible_item_at(0).and_then(|id| model.item_data(id));
    assert_eq!(first.map(|r| r.size), Some(1));
    assert_eq!(view.columns().sort_indicator(), Some((1, SortOrder::Ascending)));
}

#[test]
fn test_header_drag_reorders_columns() {
    let Fixture { mut view, .. } = fixture(1);
    let moved = collect(&view.signals().column_moved);

    let t = Duration::ZERO;
    view.handle_pointer(&PointerEvent::pressed(MouseButton::Left, Point::new(40.0, 12.0), t));
    view.handle_pointer(&PointerEvent::moved(Point::new(160.0, 12.0), t));
    view.handle_pointer(&PointerEvent::released(MouseButton::Left, Point::new(160.0, 12.0), t));

    assert_eq!(view.columns().visible_columns().collect::<Vec<_>>(), vec![1, 0]);
    assert_eq!(*moved.lock(), vec![(0, 0, 1)]);
}

#[test]
fn test_scroll_wheel_moves_rows() {
    let Fixture { mut view, host, .. } = fixture(30);
    host.invalidated.lock().clear();
    assert!(view.handle_pointer(&PointerEvent::scrolled(45.0, row_point(0), Duration::ZERO)));
    assert_eq!(view.scroll_offset(), 45.0);
    assert!(!host.invalidated.lock().is_empty());
    // Row 2 now straddles the top of the row area.
    assert_eq!(view.row_at(Point::new(10.0, HEADER + 1.0)), Some(2));
}
