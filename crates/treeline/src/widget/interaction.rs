//! Pointer interaction state machine.
//!
//! A view runs one [`InteractionState`] for its header strip and one for its
//! row area. Each pointer event consumes the current state and returns the
//! next one; the area-specific behaviour (what a click selects, what a drag
//! carries) lives behind the [`InteractionTarget`] trait, so both areas share
//! the same transitions:
//!
//! ```text
//! Outside --Entered--> Inside | Dragging (payload) | Ignore (button held)
//! Inside  --Exited---> Outside
//! Inside  --Pressed--> Pressed | Resizing (over a resize grip)
//! Pressed --Moved past threshold--> Dragging
//! Pressed --Released--> Inside | Outside        (runs click semantics)
//! Dragging --Released--> Inside | Outside       (drops)
//! Dragging --Exited--> Outside                  (cancels)
//! Resizing --Released--> Inside | Outside
//! Ignore  --Exited---> Outside
//! ```

use std::sync::Arc;

use treeline_core::logging::targets;
use treeline_render::Point;

use super::drag_drop::DragPayload;
use super::events::{KeyboardModifiers, MouseButton, PointerEvent, PointerEventKind, Transit};
use super::mouse::ClickKind;

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoverZone {
    /// Empty space.
    #[default]
    None,
    /// A row (row area) or header (header strip), by index.
    Item(usize),
    /// The expand/collapse glyph of a row.
    Expander(usize),
    /// The resize grip at a column's right edge, by logical column.
    ResizeGrip(usize),
}

impl HoverZone {
    /// Index of the row or header the zone belongs to.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Item(index) | Self::Expander(index) => Some(index),
            Self::None | Self::ResizeGrip(_) => None,
        }
    }
}

/// A press waiting to become a click or a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressState {
    pub zone: HoverZone,
    pub origin: Point,
    pub modifiers: KeyboardModifiers,
    pub click: ClickKind,
    /// The target refused to start a drag for this press.
    pub drag_refused: bool,
}

/// A drag in progress over this area.
#[derive(Debug, Clone)]
pub struct DragState {
    /// What the drag started on; `HoverZone::None` for a drag from elsewhere.
    pub zone: HoverZone,
    pub origin: Point,
    pub payload: Option<Arc<DragPayload>>,
}

/// A column resize in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeState {
    pub column: usize,
    pub origin: Point,
    pub start_width: f32,
}

/// The area-specific half of the state machine.
pub trait InteractionTarget {
    /// Classify `position`.
    fn hover_zone(&self, position: Point) -> HoverZone;

    /// Whether `position` lies inside this area.
    fn contains(&self, position: Point) -> bool;

    /// The hovered zone changed.
    fn set_hover(&mut self, zone: HoverZone);

    /// Manhattan distance a press must travel to start a drag.
    fn drag_threshold(&self) -> f32;

    /// Whether a payload arriving from elsewhere can be dropped here.
    fn accepts_payload(&self, payload: &DragPayload) -> bool {
        let _ = payload;
        false
    }

    /// A left-button press landed on `zone`.
    fn press(&mut self, zone: HoverZone, event: &PointerEvent) -> ClickKind;

    /// A press was released without turning into a drag.
    fn click(&mut self, press: &PressState, event: &PointerEvent);

    /// The press moved past the threshold. `None` refuses the drag.
    fn begin_drag(&mut self, press: &PressState, event: &PointerEvent) -> Option<DragState>;

    fn drag_move(&mut self, drag: &mut DragState, event: &PointerEvent);

    /// The drag was released over this area.
    fn complete_drop(&mut self, drag: &DragState, event: &PointerEvent);

    /// The drag left this area or was cancelled.
    fn drag_cancel(&mut self, drag: &DragState);

    /// Current width of a resizable column.
    fn column_width(&self, column: usize) -> Option<f32> {
        let _ = column;
        None
    }

    fn resize(&mut self, column: usize, width: f32) {
        let _ = (column, width);
    }

    fn finish_resize(&mut self, column: usize) {
        let _ = column;
    }
}

/// The current interaction state of one area.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Outside,
    Inside {
        hover: HoverZone,
    },
    Pressed(PressState),
    Dragging(DragState),
    Resizing(ResizeState),
    /// The pointer entered with a button down and nothing to drop; wait for it
    /// to leave.
    Ignore,
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Outside => "Outside",
            Self::Inside { .. } => "Inside",
            Self::Pressed(_) => "Pressed",
            Self::Dragging(_) => "Dragging",
            Self::Resizing(_) => "Resizing",
            Self::Ignore => "Ignore",
        }
    }

    /// Whether the area owns the pointer until the button is released.
    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Pressed(_) | Self::Dragging(_) | Self::Resizing(_))
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging(_))
    }

    /// Feed one pointer event through the state machine.
    pub fn handle(self, event: &PointerEvent, target: &mut dyn InteractionTarget) -> Self {
        let from = self.name();
        let next = match self {
            Self::Outside => Self::on_outside(event, target),
            Self::Inside { hover } => Self::on_inside(hover, event, target),
            Self::Pressed(press) => Self::on_pressed(press, event, target),
            Self::Dragging(drag) => Self::on_dragging(drag, event, target),
            Self::Resizing(resize) => Self::on_resizing(resize, event, target),
            Self::Ignore => match event.transit {
                Transit::Exited => Self::Outside,
                _ => Self::Ignore,
            },
        };
        if next.name() != from {
            tracing::trace!(target: targets::INTERACTION, from, to = next.name(), "state transition");
        }
        next
    }

    /// Abandon a drag or resize, returning to Inside or Outside without
    /// dropping. Other states are returned unchanged.
    pub fn cancel(self, position: Point, target: &mut dyn InteractionTarget) -> Self {
        match self {
            Self::Dragging(drag) => {
                target.drag_cancel(&drag);
                tracing::debug!(target: targets::INTERACTION, "drag cancelled");
                Self::settle(position, target)
            }
            Self::Resizing(resize) => {
                target.resize(resize.column, resize.start_width);
                target.finish_resize(resize.column);
                tracing::debug!(target: targets::INTERACTION, column = resize.column, "resize cancelled");
                Self::settle(position, target)
            }
            other => other,
        }
    }

    fn on_outside(event: &PointerEvent, target: &mut dyn InteractionTarget) -> Self {
        if event.transit == Transit::Exited {
            return Self::Outside;
        }
        if let Some(payload) = &event.payload {
            if !target.accepts_payload(payload) {
                return Self::Ignore;
            }
            let mut drag = DragState {
                zone: HoverZone::None,
                origin: event.position,
                payload: Some(payload.clone()),
            };
            target.drag_move(&mut drag, event);
            return Self::Dragging(drag);
        }
        if !event.buttons.is_empty() {
            return Self::Ignore;
        }
        let hover = target.hover_zone(event.position);
        target.set_hover(hover);
        Self::Inside { hover }
    }

    fn on_inside(hover: HoverZone, event: &PointerEvent, target: &mut dyn InteractionTarget) -> Self {
        if event.transit == Transit::Exited {
            target.set_hover(HoverZone::None);
            return Self::Outside;
        }
        match event.kind {
            PointerEventKind::Press(MouseButton::Left) => {
                let zone = target.hover_zone(event.position);
                if let HoverZone::ResizeGrip(column) = zone
                    && let Some(start_width) = target.column_width(column)
                {
                    return Self::Resizing(ResizeState {
                        column,
                        origin: event.position,
                        start_width,
                    });
                }
                let click = target.press(zone, event);
                Self::Pressed(PressState {
                    zone,
                    origin: event.position,
                    modifiers: event.modifiers,
                    click,
                    drag_refused: false,
                })
            }
            PointerEventKind::Move => {
                let zone = target.hover_zone(event.position);
                if zone != hover {
                    target.set_hover(zone);
                }
                Self::Inside { hover: zone }
            }
            _ => Self::Inside { hover },
        }
    }

    fn on_pressed(mut press: PressState, event: &PointerEvent, target: &mut dyn InteractionTarget) -> Self {
        match event.kind {
            PointerEventKind::Move => {
                let travelled = event.position.manhattan_distance(press.origin);
                if press.drag_refused || travelled <= target.drag_threshold() {
                    return Self::Pressed(press);
                }
                match target.begin_drag(&press, event) {
                    Some(mut drag) => {
                        target.drag_move(&mut drag, event);
                        Self::Dragging(drag)
                    }
                    None => {
                        press.drag_refused = true;
                        Self::Pressed(press)
                    }
                }
            }
            PointerEventKind::Release(MouseButton::Left) => {
                target.click(&press, event);
                Self::settle(event.position, target)
            }
            _ => Self::Pressed(press),
        }
    }

    fn on_dragging(mut drag: DragState, event: &PointerEvent, target: &mut dyn InteractionTarget) -> Self {
        if event.transit == Transit::Exited {
            target.drag_cancel(&drag);
            return Self::Outside;
        }
        match event.kind {
            PointerEventKind::Move => {
                target.drag_move(&mut drag, event);
                Self::Dragging(drag)
            }
            PointerEventKind::Release(_) => {
                target.complete_drop(&drag, event);
                Self::settle(event.position, target)
            }
            _ => Self::Dragging(drag),
        }
    }

    fn on_resizing(resize: ResizeState, event: &PointerEvent, target: &mut dyn InteractionTarget) -> Self {
        match event.kind {
            PointerEventKind::Move => {
                let width = resize.start_width + (event.position.x - resize.origin.x);
                target.resize(resize.column, width);
                Self::Resizing(resize)
            }
            PointerEventKind::Release(MouseButton::Left) => {
                target.finish_resize(resize.column);
                Self::settle(event.position, target)
            }
            _ => Self::Resizing(resize),
        }
    }

    /// Inside or Outside, depending on where the pointer ended up.
    fn settle(position: Point, target: &mut dyn InteractionTarget) -> Self {
        if target.contains(position) {
            let hover = target.hover_zone(position);
            target.set_hover(hover);
            Self::Inside { hover }
        } else {
            target.set_hover(HoverZone::None);
            Self::Outside
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::events::MouseButtons;
    use std::time::Duration;

    /// Rows of 10 px starting at y = 0; the area is 100 px tall.
    #[derive(Default)]
    struct ScriptedTarget {
        log: Vec<String>,
        refuse_drag: bool,
        width: f32,
    }

    impl InteractionTarget for ScriptedTarget {
        fn hover_zone(&self, position: Point) -> HoverZone {
            if position.x >= 95.0 {
                HoverZone::ResizeGrip(0)
            } else if (0.0..100.0).contains(&position.y) {
                HoverZone::Item((position.y / 10.0) as usize)
            } else {
                HoverZone::None
            }
        }

        fn contains(&self, position: Point) -> bool {
            (0.0..100.0).contains(&position.y)
        }

        fn set_hover(&mut self, zone: HoverZone) {
            self.log.push(format!("hover {zone:?}"));
        }

        fn drag_threshold(&self) -> f32 {
            2.0
        }

        fn accepts_payload(&self, _payload: &DragPayload) -> bool {
            true
        }

        fn press(&mut self, zone: HoverZone, _event: &PointerEvent) -> ClickKind {
            self.log.push(format!("press {zone:?}"));
            ClickKind::Single
        }

        fn click(&mut self, press: &PressState, _event: &PointerEvent) {
            self.log.push(format!("click {:?}", press.zone));
        }

        fn begin_drag(&mut self, press: &PressState, _event: &PointerEvent) -> Option<DragState> {
            self.log.push("begin_drag".into());
            (!self.refuse_drag).then(|| DragState {
                zone: press.zone,
                origin: press.origin,
                payload: None,
            })
        }

        fn drag_move(&mut self, _drag: &mut DragState, _event: &PointerEvent) {
            self.log.push("drag_move".into());
        }

        fn complete_drop(&mut self, _drag: &DragState, _event: &PointerEvent) {
            self.log.push("drop".into());
        }

        fn drag_cancel(&mut self, _drag: &DragState) {
            self.log.push("cancel".into());
        }

        fn column_width(&self, _column: usize) -> Option<f32> {
            Some(self.width)
        }

        fn resize(&mut self, _column: usize, width: f32) {
            self.width = width;
        }
    }

    const T: Duration = Duration::ZERO;

    fn run(state: InteractionState, events: &[PointerEvent], area: &mut ScriptedTarget) -> InteractionState {
        events.iter().fold(state, |state, event| state.handle(event, area))
    }

    #[test]
    fn test_press_small_move_release_is_click() {
        let mut area = ScriptedTarget::default();
        let p = Point::new(10.0, 35.0);
        let state = run(
            InteractionState::Outside,
            &[
                PointerEvent::entered(p, T),
                PointerEvent::pressed(MouseButton::Left, p, T),
                PointerEvent::moved(p.offset(1.0, 0.0), T).with_buttons(MouseButtons::LEFT),
                PointerEvent::released(MouseButton::Left, p, T),
            ],
            &mut area,
        );
        assert!(matches!(state, InteractionState::Inside { hover: HoverZone::Item(3) }));
        assert!(area.log.contains(&"click Item(3)".to_string()));
        assert!(!area.log.contains(&"begin_drag".to_string()));
    }

    #[test]
    fn test_release_outside_settles_outside() {
        let mut area = ScriptedTarget::default();
        let p = Point::new(10.0, 35.0);
        let state = run(
            InteractionState::Inside { hover: HoverZone::None },
            &[
                PointerEvent::pressed(MouseButton::Left, p, T),
                PointerEvent::released(MouseButton::Left, Point::new(10.0, 150.0), T),
            ],
            &mut area,
        );
        assert!(matches!(state, InteractionState::Outside));
    }

    #[test]
    fn test_drag_past_threshold_then_drop() {
        let mut area = ScriptedTarget::default();
        let p = Point::new(10.0, 35.0);
        let state = run(
            InteractionState::Inside { hover: HoverZone::None },
            &[
                PointerEvent::pressed(MouseButton::Left, p, T),
                PointerEvent::moved(p.offset(2.0, 1.0), T),
            ],
            &mut area,
        );
        assert!(state.is_dragging());

        let state = state.handle(&PointerEvent::released(MouseButton::Left, p, T), &mut area);
        assert!(matches!(state, InteractionState::Inside { .. }));
        assert!(area.log.contains(&"drop".to_string()));
        assert!(!area.log.iter().any(|l| l.starts_with("click")));
    }

    #[test]
    fn test_refused_drag_is_not_retried() {
        let mut area = ScriptedTarget {
            refuse_drag: true,
            ..Default::default()
        };
        let p = Point::new(10.0, 35.0);
        let state = run(
            InteractionState::Inside { hover: HoverZone::None },
            &[
                PointerEvent::pressed(MouseButton::Left, p, T),
                PointerEvent::moved(p.offset(5.0, 0.0), T),
                PointerEvent::moved(p.offset(9.0, 0.0), T),
            ],
            &mut area,
        );
        assert!(matches!(state, InteractionState::Pressed(PressState { drag_refused: true, .. })));
        assert_eq!(area.log.iter().filter(|l| *l == "begin_drag").count(), 1);
    }

    #[test]
    fn test_enter_with_button_down_ignores_until_exit() {
        let mut area = ScriptedTarget::default();
        let p = Point::new(10.0, 35.0);
        let state = InteractionState::Outside.handle(
            &PointerEvent::entered(p, T).with_buttons(MouseButtons::LEFT),
            &mut area,
        );
        assert!(matches!(state, InteractionState::Ignore));
        let state = state.handle(&PointerEvent::released(MouseButton::Left, p, T), &mut area);
        assert!(matches!(state, InteractionState::Ignore));
        let state = state.handle(&PointerEvent::exited(p, T), &mut area);
        assert!(matches!(state, InteractionState::Outside));
    }

    #[test]
    fn test_enter_with_payload_starts_drag_and_exit_cancels() {
        let mut area = ScriptedTarget::default();
        let p = Point::new(10.0, 35.0);
        let state = InteractionState::Outside.handle(
            &PointerEvent::entered(p, T)
                .with_buttons(MouseButtons::LEFT)
                .with_payload(Arc::new(DragPayload::new())),
            &mut area,
        );
        assert!(state.is_dragging());
        let state = state.handle(&PointerEvent::exited(p, T), &mut area);
        assert!(matches!(state, InteractionState::Outside));
        assert_eq!(area.log, vec!["drag_move", "cancel"]);
    }

    #[test]
    fn test_resize_tracks_pointer_and_cancel_restores() {
        let mut area = ScriptedTarget {
            width: 50.0,
            ..Default::default()
        };
        let grip = Point::new(96.0, 5.0);
        let state = run(
            InteractionState::Inside { hover: HoverZone::None },
            &[
                PointerEvent::pressed(MouseButton::Left, grip, T),
                PointerEvent::moved(grip.offset(30.0, 0.0), T),
            ],
            &mut area,
        );
        assert!(matches!(state, InteractionState::Resizing(_)));
        assert_eq!(area.width, 80.0);

        let state = state.cancel(grip, &mut area);
        assert_eq!(area.width, 50.0);
        assert!(matches!(state, InteractionState::Inside { .. }));
    }
}
