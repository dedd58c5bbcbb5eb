//! A [`Painter`] that records every call.
//!
//! Hosts can replay the recorded commands onto their own backend, and tests
//! use it to assert on what a view painted.

use crate::image_buffer::ImageBuffer;
use crate::painter::{ClipStack, Painter};
use crate::types::{Color, Point, Rect, Stroke, TextStyle};

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, stroke: Stroke },
    Line { from: Point, to: Point, stroke: Stroke },
    Text { text: String, bounds: Rect, style: TextStyle },
    Image { width: u32, height: u32, dest: Rect },
    PushClip(Rect),
    PopClip,
}

/// Painter that stores commands instead of drawing.
#[derive(Debug, Clone, Default)]
pub struct RecordingPainter {
    commands: Vec<PaintCommand>,
    clips: ClipStack,
}

impl RecordingPainter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands recorded so far.
    pub fn commands(&self) -> &[PaintCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the recorder empty.
    pub fn take_commands(&mut self) -> Vec<PaintCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Text strings drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                PaintCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether every pushed clip was popped.
    pub fn is_balanced(&self) -> bool {
        self.clips.depth() == 0
    }
}

impl Painter for RecordingPainter {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(PaintCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &Stroke) {
        self.commands.push(PaintCommand::StrokeRect {
            rect,
            stroke: *stroke,
        });
    }

    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.commands.push(PaintCommand::Line {
            from,
            to,
            stroke: *stroke,
        });
    }

    fn draw_text(&mut self, text: &str, bounds: Rect, style: &TextStyle) {
        self.commands.push(PaintCommand::Text {
            text: text.to_owned(),
            bounds,
            style: *style,
        });
    }

    fn draw_image(&mut self, image: &ImageBuffer, dest: Rect) {
        self.commands.push(PaintCommand::Image {
            width: image.width(),
            height: image.height(),
            dest,
        });
    }

    fn push_clip(&mut self, rect: Rect) {
        self.clips.push(rect);
        self.commands.push(PaintCommand::PushClip(rect));
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
        self.commands.push(PaintCommand::PopClip);
    }

    fn clip_bounds(&self) -> Option<Rect> {
        self.clips.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut painter = RecordingPainter::new();
        painter.push_clip(Rect::new(0.0, 0.0, 10.0, 10.0));
        painter.fill_rect(Rect::new(1.0, 1.0, 2.0, 2.0), Color::BLACK);
        painter.draw_text("row", Rect::new(0.0, 0.0, 10.0, 10.0), &TextStyle::default());
        assert!(!painter.is_balanced());
        painter.pop_clip();

        assert!(painter.is_balanced());
        assert_eq!(painter.texts(), vec!["row"]);
        assert_eq!(painter.commands().len(), 4);
        assert_eq!(painter.take_commands().len(), 4);
        assert!(painter.commands().is_empty());
    }
}
