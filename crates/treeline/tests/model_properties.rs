//! Integration tests for the tree model's structural guarantees.
//!
//! Logging can be enabled with:
//! ```text
//! RUST_LOG=treeline=debug cargo test --package treeline --test model_properties
//! ```

use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use treeline::ModelError;
use treeline::model::{
    ColumnTreeModel, Item, ItemId, ModelEvent, RowData, SortableTreeModel, TreeModel,
    VisibilityTreeModel, WritableTreeModel,
};

#[derive(Debug, Clone, PartialEq)]
struct Row {
    key: u32,
    label: &'static str,
}

impl Row {
    fn new(key: u32, label: &'static str) -> Self {
        Self { key, label }
    }
}

impl RowData for Row {
    fn column_text(&self, column: usize) -> String {
        match column {
            0 => self.key.to_string(),
            1 => self.label.to_string(),
            _ => String::new(),
        }
    }

    fn compare_column(&self, other: &Self, column: usize) -> Ordering {
        match column {
            0 => self.key.cmp(&other.key),
            _ => self.label.cmp(other.label),
        }
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn record_events<T: RowData>(model: &ColumnTreeModel<T>) -> Arc<Mutex<Vec<ModelEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    model.events().connect(move |event| sink.lock().push(*event));
    events
}

fn labels(model: &ColumnTreeModel<Row>) -> Vec<&'static str> {
    model
        .visible_items()
        .into_iter()
        .filter_map(|id| model.item_data(id))
        .map(|row| row.label)
        .collect()
}

#[test]
fn test_sorted_insertion_is_stable() {
    init_logging();
    let model = ColumnTreeModel::<Row>::with_comparator(Arc::new(|a: &Row, b: &Row| a.key.cmp(&b.key)));
    for (key, label) in [(3, "c"), (1, "a1"), (2, "b"), (1, "a2")] {
        model.add_sub_item(None, Item::new(Row::new(key, label)), None).unwrap();
    }
    assert_eq!(labels(&model), vec!["a1", "a2", "b", "c"]);

    // An equal key goes after every existing equal sibling.
    let id = model.add_sub_item(None, Item::new(Row::new(1, "a3")), Some(0)).unwrap();
    assert_eq!(labels(&model), vec!["a1", "a2", "a3", "b", "c"]);
    assert_eq!(model.sub_item_index_of(id), Some(2));
}

#[test]
fn test_installing_comparator_resorts_once() {
    let model = ColumnTreeModel::new();
    for (key, label) in [(2, "b"), (3, "c"), (1, "a")] {
        model.add_sub_item(None, Item::new(Row::new(key, label)), None).unwrap();
    }
    let events = record_events(&model);

    model.set_sort_compare_function(Some(Arc::new(|a: &Row, b: &Row| b.label.cmp(a.label))));
    assert_eq!(labels(&model), vec!["c", "b", "a"]);
    assert_eq!(*events.lock(), vec![ModelEvent::ItemsSorted]);
    assert!(model.has_sort_compare_function());

    // Removing the comparator keeps the order.
    model.set_sort_compare_function(None);
    assert_eq!(labels(&model), vec!["c", "b", "a"]);
}

#[test]
fn test_collapse_then_expand_restores_projection() {
    let model = ColumnTreeModel::new();
    let root = model.add_sub_item(None, Item::new(Row::new(0, "root")).expanded(), None).unwrap();
    let children: Vec<ItemId> = ["x", "y", "z"]
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            model
                .add_sub_item(Some(root), Item::new(Row::new(i as u32, label)), None)
                .unwrap()
        })
        .collect();
    let before = model.visible_items();
    assert_eq!(before.len(), 4);

    let events = record_events(&model);
    assert!(model.collapse_item(root));
    assert_eq!(model.count_visible_items(), 1);
    assert!(children.iter().all(|&id| model.visible_index_of(id).is_none()));

    assert!(model.expand_item(root));
    assert_eq!(model.visible_items(), before);
    assert_eq!(
        *events.lock(),
        vec![
            ModelEvent::ItemsHidden { index: 1, count: 3, before: true },
            ModelEvent::ItemsHidden { index: 1, count: 3, before: false },
            ModelEvent::ItemCollapsed(root),
            ModelEvent::ItemsShown { index: 1, count: 3 },
            ModelEvent::ItemExpanded(root),
        ]
    );
}

#[test]
fn test_expand_is_idempotent() {
    let model = ColumnTreeModel::new();
    let root = model.add_sub_item(None, Item::new(Row::new(0, "root")), None).unwrap();
    model.add_sub_item(Some(root), Item::new(Row::new(1, "leaf")), None).unwrap();

    assert!(model.expand_item(root));
    let events = record_events(&model);
    assert!(!model.expand_item(root));
    assert_eq!(model.count_visible_items(), 2);
    assert!(events.lock().is_empty());

    assert!(model.collapse_item(root));
    assert!(!model.collapse_item(root));
}

#[test]
fn test_add_remove_round_trip() {
    let model = ColumnTreeModel::new();
    for (key, label) in [(1, "a"), (2, "b")] {
        model.add_sub_item(None, Item::new(Row::new(key, label)), None).unwrap();
    }
    let before = model.visible_items();
    let events = record_events(&model);

    let id = model.add_sub_item(None, Item::new(Row::new(9, "new")), Some(1)).unwrap();
    assert_eq!(model.count_items(), 3);
    assert_eq!(model.visible_index_of(id), Some(1));

    let removed = model.remove_sub_item(None, 1).unwrap();
    assert_eq!(removed.data(), &Row::new(9, "new"));
    assert!(!model.contains(id));
    assert_eq!(model.visible_items(), before);

    assert_eq!(
        *events.lock(),
        vec![
            ModelEvent::ItemsAdded { parent: None, index: 1, count: 1 },
            ModelEvent::ItemsShown { index: 1, count: 1 },
            ModelEvent::ItemsHidden { index: 1, count: 1, before: true },
            ModelEvent::ItemsRemoved { parent: None, index: 1, count: 1, before: true },
            ModelEvent::ItemsHidden { index: 1, count: 1, before: false },
            ModelEvent::ItemsRemoved { parent: None, index: 1, count: 1, before: false },
        ]
    );
}

#[test]
fn test_hiding_a_run_of_rows() {
    let model = ColumnTreeModel::new();
    let ids: Vec<ItemId> = ["a", "b", "c", "d"]
        .into_iter()
        .enumerate()
        .map(|(i, label)| model.add_sub_item(None, Item::new(Row::new(i as u32, label)), None).unwrap())
        .collect();

    for &id in &ids[1..3] {
        assert!(model.set_item_visible(id, false));
    }
    assert_eq!(labels(&model), vec!["a", "d"]);
    assert_eq!(model.visible_index_of(ids[3]), Some(1));
    assert_eq!(model.visible_index_of(ids[1]), None);
    // Hidden items stay in the tree.
    assert_eq!(model.count_sub_items(None), 4);
    assert!(!model.set_item_visible(ids[1], false));

    for &id in &ids[1..3] {
        assert!(model.set_item_visible(id, true));
    }
    assert_eq!(model.visible_items(), ids);
}

#[test]
fn test_invalid_operations_leave_model_untouched() {
    let model = ColumnTreeModel::new();
    let a = model.add_sub_item(None, Item::new(Row::new(1, "a")), None).unwrap();
    let child = model.add_sub_item(Some(a), Item::new(Row::new(2, "child")), None).unwrap();
    let events = record_events(&model);

    assert_eq!(model.move_item(a, Some(child), None), Err(ModelError::CycleDetected));
    assert!(matches!(
        model.remove_sub_items(None, 0, 5),
        Err(ModelError::InvalidRange { .. } | ModelError::IndexOutOfRange { .. })
    ));
    assert_eq!(
        model.add_sub_item(None, Item::new(Row::new(3, "b")), Some(7)).map(|_| ()),
        Err(ModelError::IndexOutOfRange { index: 7, len: 1 })
    );

    assert!(events.lock().is_empty());
    assert_eq!(model.count_items(), 2);
    assert_eq!(model.super_item_of(child), Ok(Some(a)));
}
