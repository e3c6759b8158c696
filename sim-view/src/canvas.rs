//! Replays recorded engine drawing commands as egui shapes.
//!
//! The engine draws into a [`particulate_core::render::CommandBuffer`] in
//! surface pixels. [`replay`] walks those commands like a canvas context
//! would (fill/stroke styles, a current path, a save/restore stack) and
//! emits screen-space [`egui::Shape`]s.

use glam::{Affine2, Vec2};
use particulate_core::render::{DrawCommand, ImageId, Paint};
use std::f32::consts::TAU;

/// Segments used to approximate a full circle.
const ARC_SEGMENTS: f32 = 32.0;

#[derive(Clone, Copy, Debug)]
struct Style {
    transform: Affine2,
    fill: egui::Color32,
    stroke: egui::Color32,
    line_width: f32,
}

#[derive(Clone, Debug, Default)]
struct SubPath {
    points: Vec<egui::Pos2>,
    closed: bool,
}

/// Canvas-like replay state.
struct Replay<'a> {
    style: Style,
    saved: Vec<Style>,
    path: Vec<SubPath>,
    shapes: Vec<egui::Shape>,
    texture: &'a dyn Fn(ImageId) -> Option<egui::TextureId>,
}

/// Converts a core paint to an egui color with unmultiplied alpha.
pub fn paint_to_color32(paint: Paint) -> egui::Color32 {
    let rgb = paint.color.to_rgb();
    let alpha = (paint.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, alpha)
}

fn to_pos(v: Vec2) -> egui::Pos2 {
    egui::pos2(v.x, v.y)
}

/// Replays `commands` through `transform` (surface pixels to screen points).
///
/// ### Parameters
/// - `commands` - One frame of recorded drawing commands.
/// - `transform` - Maps surface pixels to egui screen coordinates.
/// - `texture` - Looks up the egui texture for an engine image handle;
///   image blits without a texture are skipped.
///
/// ### Returns
/// The shapes to hand to an [`egui::Painter`], in drawing order.
pub fn replay(
    commands: &[DrawCommand],
    transform: Affine2,
    texture: &dyn Fn(ImageId) -> Option<egui::TextureId>,
) -> Vec<egui::Shape> {
    let mut r = Replay {
        style: Style {
            transform,
            fill: egui::Color32::BLACK,
            stroke: egui::Color32::BLACK,
            line_width: 1.0,
        },
        saved: Vec::new(),
        path: Vec::new(),
        shapes: Vec::new(),
        texture,
    };

    for cmd in commands {
        r.apply(cmd);
    }
    r.shapes
}

impl Replay<'_> {
    fn point(&self, p: Vec2) -> egui::Pos2 {
        to_pos(self.style.transform.transform_point2(p))
    }

    fn current(&mut self) -> &mut SubPath {
        if self.path.last().is_none_or(|s| s.closed) {
            self.path.push(SubPath::default());
        }
        let last = self.path.len() - 1;
        &mut self.path[last]
    }

    fn apply(&mut self, cmd: &DrawCommand) {
        match *cmd {
            DrawCommand::ClearRect { .. } => self.shapes.clear(),
            DrawCommand::FillRect { origin, size } => {
                let corners = self.rect_points(origin, size);
                self.fill_points(&corners, self.style.fill);
            }
            DrawCommand::FillStyle(paint) => self.style.fill = paint_to_color32(paint),
            DrawCommand::StrokeStyle(paint) => self.style.stroke = paint_to_color32(paint),
            DrawCommand::LineWidth(width) => self.style.line_width = width,
            DrawCommand::BeginPath => self.path.clear(),
            DrawCommand::ClosePath => {
                if let Some(last) = self.path.last_mut()
                    && !last.points.is_empty()
                {
                    last.closed = true;
                }
            }
            DrawCommand::MoveTo(p) => {
                let p = self.point(p);
                self.path.push(SubPath {
                    points: vec![p],
                    closed: false,
                });
            }
            DrawCommand::LineTo(p) => {
                let p = self.point(p);
                self.current().points.push(p);
            }
            DrawCommand::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let sweep = end_angle - start_angle;
                let segments = ((sweep.abs() / TAU) * ARC_SEGMENTS).ceil().max(1.0) as usize;
                let points: Vec<egui::Pos2> = (0..=segments)
                    .map(|i| {
                        let a = start_angle + sweep * i as f32 / segments as f32;
                        self.point(center + Vec2::new(a.cos(), a.sin()) * radius)
                    })
                    .collect();
                self.current().points.extend(points);
            }
            DrawCommand::Rect { origin, size } => {
                let points = self.rect_points(origin, size).to_vec();
                self.path.push(SubPath {
                    points,
                    closed: true,
                });
            }
            DrawCommand::Fill => {
                let fill = self.style.fill;
                let subpaths = std::mem::take(&mut self.path);
                for sub in &subpaths {
                    self.fill_points(&sub.points, fill);
                }
                self.path = subpaths;
            }
            DrawCommand::Stroke => {
                let width = self.style.line_width * self.style.transform.matrix2.x_axis.length();
                let stroke = egui::Stroke::new(width, self.style.stroke);
                for sub in &self.path {
                    if sub.points.len() < 2 {
                        continue;
                    }
                    let shape = if sub.closed {
                        egui::Shape::closed_line(sub.points.clone(), stroke)
                    } else {
                        egui::Shape::line(sub.points.clone(), stroke)
                    };
                    self.shapes.push(shape);
                }
            }
            DrawCommand::Save => self.saved.push(self.style),
            DrawCommand::Restore => {
                if let Some(style) = self.saved.pop() {
                    self.style = style;
                }
            }
            DrawCommand::Translate(offset) => {
                self.style.transform = self.style.transform * Affine2::from_translation(offset);
            }
            DrawCommand::Rotate(angle) => {
                self.style.transform = self.style.transform * Affine2::from_angle(angle);
            }
            DrawCommand::DrawImage {
                image,
                origin,
                size,
            } => {
                if let Some(texture) = (self.texture)(image) {
                    let rect = egui::Rect::from_two_pos(self.point(origin), self.point(origin + size));
                    self.shapes.push(egui::Shape::image(
                        texture,
                        rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    ));
                }
            }
        }
    }

    fn rect_points(&self, origin: Vec2, size: Vec2) -> [egui::Pos2; 4] {
        [
            self.point(origin),
            self.point(origin + Vec2::new(size.x, 0.0)),
            self.point(origin + size),
            self.point(origin + Vec2::new(0.0, size.y)),
        ]
    }

    /// Fills a polygon as a triangle fan around its centroid.
    fn fill_points(&mut self, points: &[egui::Pos2], color: egui::Color32) {
        if points.len() < 3 || color.a() == 0 {
            return;
        }

        let n = points.len() as f32;
        let centroid = points
            .iter()
            .fold(egui::Vec2::ZERO, |acc, p| acc + p.to_vec2())
            / n;

        let mut mesh = egui::Mesh::default();
        mesh.colored_vertex(centroid.to_pos2(), color);
        for p in points {
            mesh.colored_vertex(*p, color);
        }
        let count = points.len() as u32;
        for i in 0..count {
            mesh.add_triangle(0, 1 + i, 1 + (i + 1) % count);
        }
        self.shapes.push(egui::Shape::mesh(mesh));
    }
}
