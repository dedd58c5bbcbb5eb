//! Input events delivered by the host.
//!
//! The view does not talk to a windowing system. The host translates its own
//! pointer and keyboard events into [`PointerEvent`] and [`KeyEvent`] and
//! hands them to the view, in order, one at a time.

use std::sync::Arc;
use std::time::Duration;

use treeline_render::Point;

use super::drag_drop::DragPayload;

/// Keyboard modifiers held during an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held (Cmd on macOS).
    pub control: bool,
    /// The Alt key is held (Option on macOS).
    pub alt: bool,
    /// The Meta/Super key is held.
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Control + Shift.
    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        control: true,
        alt: false,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MouseButton {
    /// Primary button (usually left).
    Left = 0,
    /// Secondary button (usually right).
    Right = 1,
    /// Middle button.
    Middle = 2,
}

/// Set of currently pressed buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct MouseButtons(u8);

impl MouseButtons {
    pub const NONE: Self = Self(0);
    pub const LEFT: Self = Self(1 << MouseButton::Left as u8);

    pub fn with(self, button: MouseButton) -> Self {
        Self(self.0 | 1 << button as u8)
    }

    pub fn without(self, button: MouseButton) -> Self {
        Self(self.0 & !(1 << button as u8))
    }

    pub fn contains(self, button: MouseButton) -> bool {
        self.0 & (1 << button as u8) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// How a pointer event relates to the control's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transit {
    /// The pointer just crossed into the control.
    Entered,
    /// The pointer just left the control.
    Exited,
    /// The pointer moved while staying inside (or, during a capture, outside).
    #[default]
    Inside,
}

/// What happened to the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEventKind {
    Move,
    Press(MouseButton),
    Release(MouseButton),
    /// Wheel rotation, in pixels; positive scrolls content up.
    Scroll { delta: f32 },
}

/// A pointer event in view-local coordinates.
#[derive(Debug, Clone)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: Point,
    pub transit: Transit,
    /// Buttons held after this event was applied.
    pub buttons: MouseButtons,
    pub modifiers: KeyboardModifiers,
    /// Host click count; informational, the view classifies clicks itself.
    pub click_count: u32,
    /// Monotonic host time of the event.
    pub timestamp: Duration,
    /// Drag-and-drop payload travelling with the pointer, if any.
    pub payload: Option<Arc<DragPayload>>,
}

impl PointerEvent {
    fn new(kind: PointerEventKind, position: Point, timestamp: Duration) -> Self {
        Self {
            kind,
            position,
            transit: Transit::Inside,
            buttons: MouseButtons::NONE,
            modifiers: KeyboardModifiers::NONE,
            click_count: 0,
            timestamp,
            payload: None,
        }
    }

    /// An interior move with no buttons held.
    pub fn moved(position: Point, timestamp: Duration) -> Self {
        Self::new(PointerEventKind::Move, position, timestamp)
    }

    /// A button press; `buttons` includes the pressed button.
    pub fn pressed(button: MouseButton, position: Point, timestamp: Duration) -> Self {
        let mut event = Self::new(PointerEventKind::Press(button), position, timestamp);
        event.buttons = MouseButtons::NONE.with(button);
        event.click_count = 1;
        event
    }

    /// A button release; `buttons` no longer includes it.
    pub fn released(button: MouseButton, position: Point, timestamp: Duration) -> Self {
        Self::new(PointerEventKind::Release(button), position, timestamp)
    }

    pub fn entered(position: Point, timestamp: Duration) -> Self {
        Self::new(PointerEventKind::Move, position, timestamp).with_transit(Transit::Entered)
    }

    pub fn exited(position: Point, timestamp: Duration) -> Self {
        Self::new(PointerEventKind::Move, position, timestamp).with_transit(Transit::Exited)
    }

    pub fn scrolled(delta: f32, position: Point, timestamp: Duration) -> Self {
        Self::new(PointerEventKind::Scroll { delta }, position, timestamp)
    }

    pub fn with_transit(mut self, transit: Transit) -> Self {
        self.transit = transit;
        self
    }

    pub fn with_buttons(mut self, buttons: MouseButtons) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_modifiers(mut self, modifiers: KeyboardModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_payload(mut self, payload: Arc<DragPayload>) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Keys the view reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Space,
    Escape,
    /// A printable character, used for type-ahead and Ctrl+A.
    Char(char),
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: KeyboardModifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_set() {
        let buttons = MouseButtons::NONE.with(MouseButton::Left).with(MouseButton::Right);
        assert!(buttons.contains(MouseButton::Left));
        assert!(buttons.contains(MouseButton::Right));
        assert!(!buttons.contains(MouseButton::Middle));
        assert!(buttons.without(MouseButton::Left).without(MouseButton::Right).is_empty());
        assert_eq!(MouseButtons::NONE.with(MouseButton::Left), MouseButtons::LEFT);
    }

    #[test]
    fn test_constructors() {
        let t = Duration::from_millis(10);
        let press = PointerEvent::pressed(MouseButton::Left, Point::new(1.0, 2.0), t);
        assert!(press.buttons.contains(MouseButton::Left));
        assert_eq!(press.transit, Transit::Inside);

        let release = PointerEvent::released(MouseButton::Left, Point::ZERO, t);
        assert!(release.buttons.is_empty());
        assert_eq!(PointerEvent::exited(Point::ZERO, t).transit, Transit::Exited);
        assert!(KeyboardModifiers::CTRL_SHIFT.any());
        assert!(KeyboardModifiers::NONE.none());
    }
}
