//! Structural change notifications.

use super::item::ItemId;

/// A change reported by a tree model.
///
/// Notifications are delivered synchronously, in registration order, after
/// the model's internal lock has been released. A listener observing
/// `ItemsAdded` therefore sees the model in its post-insertion state, and may
/// query it freely. Listeners must not structurally mutate the subtree whose
/// change they are being told about.
///
/// Paired `before` events bracket a removal or hide:
///
/// ```text
/// ItemsHidden { before: true }    projection indices still valid
/// ItemsRemoved { before: true }   items still attached
///     -- mutation --
/// ItemsHidden { before: false }
/// ItemsRemoved { before: false }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
    /// `count` children were inserted under `parent` starting at `index`.
    ItemsAdded {
        parent: Option<ItemId>,
        index: usize,
        count: usize,
    },
    /// `count` children of `parent` starting at `index` are being removed.
    ItemsRemoved {
        parent: Option<ItemId>,
        index: usize,
        count: usize,
        before: bool,
    },
    /// `count` rows entered the visible projection at `index`.
    ItemsShown { index: usize, count: usize },
    /// `count` rows starting at projection `index` are leaving it.
    ItemsHidden {
        index: usize,
        count: usize,
        before: bool,
    },
    /// The item's expanded flag was set.
    ItemExpanded(ItemId),
    /// The item's expanded flag was cleared.
    ItemCollapsed(ItemId),
    /// Every sibling list was reordered by the active comparator.
    ItemsSorted,
    /// An item's data changed; structure is unaffected.
    ItemChanged(ItemId),
}

impl ModelEvent {
    /// Whether this is the "about to happen" half of a paired notification.
    pub fn is_before(&self) -> bool {
        matches!(
            self,
            ModelEvent::ItemsRemoved { before: true, .. }
                | ModelEvent::ItemsHidden { before: true, .. }
        )
    }

    /// Whether the event changes the visible projection.
    pub fn affects_projection(&self) -> bool {
        matches!(
            self,
            ModelEvent::ItemsShown { .. } | ModelEvent::ItemsHidden { .. } | ModelEvent::ItemsSorted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classification() {
        let hidden = ModelEvent::ItemsHidden {
            index: 0,
            count: 1,
            before: true,
        };
        assert!(hidden.is_before());
        assert!(hidden.affects_projection());

        let added = ModelEvent::ItemsAdded {
            parent: None,
            index: 0,
            count: 1,
        };
        assert!(!added.is_before());
        assert!(!added.affects_projection());
        assert!(ModelEvent::ItemsSorted.affects_projection());
    }
}
