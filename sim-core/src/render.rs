//! The drawing seam between the engine and whatever owns the pixels.
//!
//! [`Renderer`] is a small immediate-mode 2-D API in the style of an HTML
//! canvas context. The engine only ever talks to this trait; hosts either
//! implement it directly or use [`CommandBuffer`], which records the calls
//! so they can be replayed later (and inspected in tests).

use crate::types::Color;
use glam::Vec2;
use std::f32::consts::PI;

/// A fill or stroke style: a color plus an alpha in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub alpha: f32,
}

impl Paint {
    pub fn new(color: Color, alpha: f32) -> Self {
        Self { color, alpha }
    }
}

/// Opaque handle to an image asset decoded by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub u64);

/// Canvas-like immediate-mode drawing surface.
///
/// Angles are in radians. Coordinates are surface pixels with `y` growing
/// downwards.
pub trait Renderer {
    fn clear_rect(&mut self, origin: Vec2, size: Vec2);
    fn fill_rect(&mut self, origin: Vec2, size: Vec2);

    fn set_fill_style(&mut self, paint: Paint);
    fn set_stroke_style(&mut self, paint: Paint);
    fn set_line_width(&mut self, width: f32);

    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, p: Vec2);
    fn line_to(&mut self, p: Vec2);
    fn arc(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32);
    fn rect(&mut self, origin: Vec2, size: Vec2);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, offset: Vec2);
    fn rotate(&mut self, angle: f32);

    fn draw_image(&mut self, image: ImageId, origin: Vec2, size: Vec2);
}

/// One recorded [`Renderer`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    ClearRect { origin: Vec2, size: Vec2 },
    FillRect { origin: Vec2, size: Vec2 },
    FillStyle(Paint),
    StrokeStyle(Paint),
    LineWidth(f32),
    BeginPath,
    ClosePath,
    MoveTo(Vec2),
    LineTo(Vec2),
    Arc {
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    },
    Rect { origin: Vec2, size: Vec2 },
    Fill,
    Stroke,
    Save,
    Restore,
    Translate(Vec2),
    Rotate(f32),
    DrawImage {
        image: ImageId,
        origin: Vec2,
        size: Vec2,
    },
}

/// A [`Renderer`] that records every call.
///
/// A `clear_rect` discards everything recorded before it, so the buffer
/// always holds the commands of the most recent frame only.
#[derive(Clone, Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<DrawCommand>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Segments stroked after a `MoveTo`/`LineTo` pair, with the stroke
    /// alpha in effect at the time.
    ///
    /// Mostly useful for checking link and grab lines.
    pub fn stroked_lines(&self) -> Vec<(Vec2, Vec2, f32)> {
        let mut lines = Vec::new();
        let mut alpha = 1.0;
        let mut from = None;
        let mut segment = None;

        for cmd in &self.commands {
            match cmd {
                DrawCommand::StrokeStyle(paint) => alpha = paint.alpha,
                DrawCommand::BeginPath => {
                    from = None;
                    segment = None;
                }
                DrawCommand::MoveTo(p) => from = Some(*p),
                DrawCommand::LineTo(p) => segment = from.map(|a| (a, *p)),
                DrawCommand::Stroke => {
                    if let Some((a, b)) = segment.take() {
                        lines.push((a, b, alpha));
                    }
                }
                _ => {}
            }
        }
        lines
    }
}

impl Renderer for CommandBuffer {
    fn clear_rect(&mut self, origin: Vec2, size: Vec2) {
        self.commands.clear();
        self.commands.push(DrawCommand::ClearRect { origin, size });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::FillRect { origin, size });
    }

    fn set_fill_style(&mut self, paint: Paint) {
        self.commands.push(DrawCommand::FillStyle(paint));
    }

    fn set_stroke_style(&mut self, paint: Paint) {
        self.commands.push(DrawCommand::StrokeStyle(paint));
    }

    fn set_line_width(&mut self, width: f32) {
        self.commands.push(DrawCommand::LineWidth(width));
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn move_to(&mut self, p: Vec2) {
        self.commands.push(DrawCommand::MoveTo(p));
    }

    fn line_to(&mut self, p: Vec2) {
        self.commands.push(DrawCommand::LineTo(p));
    }

    fn arc(&mut self, center: Vec2, radius: f32, start_angle: f32, end_angle: f32) {
        self.commands.push(DrawCommand::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        });
    }

    fn rect(&mut self, origin: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::Rect { origin, size });
    }

    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, offset: Vec2) {
        self.commands.push(DrawCommand::Translate(offset));
    }

    fn rotate(&mut self, angle: f32) {
        self.commands.push(DrawCommand::Rotate(angle));
    }

    fn draw_image(&mut self, image: ImageId, origin: Vec2, size: Vec2) {
        self.commands.push(DrawCommand::DrawImage {
            image,
            origin,
            size,
        });
    }
}

/// Traces and fills a regular polygon (or star) by walking its edges.
///
/// The turtle starts at `start`, draws `numerator * denominator` edges of
/// length `side_length`, and turns by the exterior angle of a polygon with
/// `numerator / denominator` sides after each one. A denominator of 1 gives
/// a convex polygon, 2 gives a star.
pub fn draw_regular_polygon(
    r: &mut dyn Renderer,
    start: Vec2,
    side_length: f32,
    numerator: u32,
    denominator: u32,
) {
    let side_count = numerator * denominator;
    let decimal_sides = numerator as f32 / denominator as f32;
    let interior_degrees = (180.0 * (decimal_sides - 2.0)) / decimal_sides;
    let turn = PI - PI * interior_degrees / 180.0;

    r.save();
    r.begin_path();
    r.translate(start);
    r.move_to(Vec2::ZERO);
    for _ in 0..side_count {
        r.line_to(Vec2::new(side_length, 0.0));
        r.translate(Vec2::new(side_length, 0.0));
        r.rotate(turn);
    }
    r.fill();
    r.restore();
}
