//! Interactions between two particles: linking lines, mutual attraction and
//! contact bounce.
//!
//! The engine calls these once per unordered pair per tick, each only when
//! its toggle is enabled.

use crate::{
    config::{AttractConfig, LineLinkedConfig},
    particle::Particle,
    render::{Paint, Renderer},
    types::Color,
};
use glam::Vec2;

/// Line opacity for two points `dist` apart, fading linearly from
/// `opacity` at zero distance to zero at `threshold`.
#[inline]
pub fn line_opacity(opacity: f32, dist: f32, threshold: f32) -> f32 {
    opacity - dist / (1.0 / opacity) / threshold
}

/// Strokes a single segment with the given color, alpha and width.
pub fn stroke_line(r: &mut dyn Renderer, from: Vec2, to: Vec2, color: Color, alpha: f32, width: f32) {
    r.set_stroke_style(Paint::new(color, alpha));
    r.set_line_width(width);
    r.begin_path();
    r.move_to(from);
    r.line_to(to);
    r.stroke();
    r.close_path();
}

/// Draws a fading line between two particles closer than the link distance.
///
/// Returns whether a line was drawn.
pub fn link(
    a: &Particle,
    b: &Particle,
    cfg: &LineLinkedConfig,
    color: Color,
    r: &mut dyn Renderer,
) -> bool {
    let dist = a.distance_to(b);
    if dist > cfg.distance {
        return false;
    }

    let opacity = line_opacity(cfg.opacity, dist, cfg.distance);
    if opacity <= 0.0 {
        return false;
    }

    stroke_line(r, a.pos, b.pos, color, opacity, cfg.width);
    true
}

/// Pulls two particles within `link_distance` towards each other.
///
/// The pull is the offset between them divided by `rotate * 1000` on each
/// axis; a zero rotate constant disables that axis.
pub fn attract(a: &mut Particle, b: &mut Particle, cfg: &AttractConfig, link_distance: f32) {
    let d = a.pos - b.pos;
    if d.length() > link_distance {
        return;
    }

    let pull = Vec2::new(
        axis_pull(d.x, cfg.rotate_x),
        axis_pull(d.y, cfg.rotate_y),
    );
    a.vel -= pull;
    b.vel += pull;
}

#[inline]
fn axis_pull(offset: f32, rotate: f32) -> f32 {
    if rotate == 0.0 {
        0.0
    } else {
        offset / (rotate * 1000.0)
    }
}

/// Reverses both particles when they touch.
///
/// Returns whether they collided.
pub fn bounce(a: &mut Particle, b: &mut Particle) -> bool {
    if !a.overlaps(b) {
        return false;
    }
    a.vel = -a.vel;
    b.vel = -b.vel;
    true
}
