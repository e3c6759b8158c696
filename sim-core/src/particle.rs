//! A single animated particle and its self-contained evolution rules.
//!
//! Particles never look at their siblings. Everything they need (the
//! configuration, the surface size, the random source, the renderer) is
//! passed in by the engine for the duration of one call.

use crate::{
    config::{ColorSource, OutMode, ParticlesConfig},
    render::{ImageId, Paint, Renderer, draw_regular_polygon},
    types::{Color, ShapeKind, SurfaceSize},
};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// Back-and-forth animation state for one scalar (radius or opacity).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Oscillation {
    /// `true` while the value is climbing towards its maximum.
    pub growing: bool,
    /// Amount added or removed per tick.
    pub step: f32,
}

impl Oscillation {
    fn new(speed: f32, sync: bool, rng: &mut impl Rng) -> Self {
        let mut step = speed / 100.0;
        if !sync {
            step *= rng.random::<f32>();
        }
        Self {
            growing: false,
            step,
        }
    }

    /// Moves `value` one step, turning around at `max` and `min`.
    ///
    /// The turn is decided before the step, so a value may overshoot its
    /// bound by at most one step; callers clamp afterwards.
    fn advance(&mut self, value: &mut f32, max: f32, min: f32) {
        if self.growing {
            if *value >= max {
                self.growing = false;
            }
            *value += self.step;
        } else {
            if *value <= min {
                self.growing = true;
            }
            *value -= self.step;
        }
    }
}

/// Image-shape data carried by a particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageRef {
    /// Width over height of the drawn image.
    pub ratio: f32,
}

/// Everything besides the particle itself that drawing needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawStyle {
    /// Side count shared by polygons and stars.
    pub polygon_sides: u32,
    /// Outline color and width, when outlines are enabled.
    pub stroke: Option<(Color, f32)>,
    /// Decoded image for image-shaped particles, once loaded.
    pub image: Option<ImageId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Velocity assigned at creation, restored after transient forces.
    pub initial_vel: Vec2,
    pub radius: f32,
    /// Radius override while a bubble interaction affects this particle.
    pub radius_bubble: Option<f32>,
    pub opacity: f32,
    /// Opacity override while a bubble interaction affects this particle.
    pub opacity_bubble: Option<f32>,
    pub size_anim: Oscillation,
    pub opacity_anim: Oscillation,
    pub color: Color,
    pub shape: ShapeKind,
    pub image: Option<ImageRef>,
}

impl Particle {
    /// Creates a particle following the configured construction rules.
    ///
    /// With no `position` the particle lands at a random point. Either way
    /// it is nudged inward by one radius when it starts within two radii of
    /// an edge.
    pub fn new(
        cfg: &ParticlesConfig,
        colors: &ColorSource,
        surface: SurfaceSize,
        position: Option<Vec2>,
        rng: &mut impl Rng,
    ) -> Self {
        let radius = random_factor(cfg.size.random, rng) * cfg.size.value;
        let size_anim = Oscillation::new(cfg.size.anim.speed, cfg.size.anim.sync, rng);

        let mut pos = position.unwrap_or_else(|| surface.random_point(rng));
        pos.x = nudge_inward(pos.x, radius, surface.width);
        pos.y = nudge_inward(pos.y, radius, surface.height);

        let color = colors.pick(rng);

        let opacity = random_factor(cfg.opacity.random, rng) * cfg.opacity.value;
        let opacity_anim = Oscillation::new(cfg.opacity.anim.speed, cfg.opacity.anim.sync, rng);

        let base = cfg.movement.direction.base_velocity();
        let vel = if cfg.movement.straight {
            if cfg.movement.random {
                Vec2::new(base.x * rng.random::<f32>(), base.y * rng.random::<f32>())
            } else {
                base
            }
        } else {
            base + Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5)
        };

        let shape = cfg.shape.kind.pick(rng);
        let image = (shape == ShapeKind::Image).then(|| ImageRef {
            ratio: cfg.shape.image.ratio(),
        });

        Self {
            pos,
            vel,
            initial_vel: vel,
            radius,
            radius_bubble: None,
            opacity,
            opacity_bubble: None,
            size_anim,
            opacity_anim,
            color,
            shape,
            image,
        }
    }

    pub fn effective_radius(&self) -> f32 {
        self.radius_bubble.unwrap_or(self.radius)
    }

    pub fn effective_opacity(&self) -> f32 {
        self.opacity_bubble.unwrap_or(self.opacity)
    }

    /// Drops any bubble override, falling back to the base values.
    pub fn clear_bubble(&mut self) {
        self.radius_bubble = None;
        self.opacity_bubble = None;
    }

    pub fn distance_to(&self, other: &Particle) -> f32 {
        self.pos.distance(other.pos)
    }

    pub fn overlaps(&self, other: &Particle) -> bool {
        self.distance_to(other) <= self.radius + other.radius
    }

    /// One tick of self-evolution: motion, opacity and size animation, then
    /// the out-of-bounds policy.
    pub fn evolve(&mut self, cfg: &ParticlesConfig, surface: SurfaceSize, rng: &mut impl Rng) {
        if cfg.movement.enable {
            self.pos += self.vel * (cfg.movement.speed / 2.0);
        }

        if cfg.opacity.anim.enable {
            self.opacity_anim.advance(
                &mut self.opacity,
                cfg.opacity.value,
                cfg.opacity.anim.opacity_min,
            );
        }
        self.opacity = self.opacity.clamp(0.0, 1.0);

        if cfg.size.anim.enable {
            self.size_anim
                .advance(&mut self.radius, cfg.size.value, cfg.size.anim.size_min);
        }
        self.radius = self.radius.max(0.0);

        match cfg.movement.out_mode {
            OutMode::Wrap => self.wrap(surface, rng),
            OutMode::Bounce => self.bounce_off_edges(surface),
        }
    }

    /// Teleports a particle that fully left the surface to the opposite edge.
    ///
    /// Only the perpendicular coordinate is re-randomized, and the x axis is
    /// handled before the y axis.
    fn wrap(&mut self, surface: SurfaceSize, rng: &mut impl Rng) {
        let r = self.radius;

        if self.pos.x - r > surface.width {
            self.pos.x = r;
            self.pos.y = rng.random::<f32>() * surface.height;
        } else if self.pos.x + r < 0.0 {
            self.pos.x = surface.width - r;
            self.pos.y = rng.random::<f32>() * surface.height;
        }

        if self.pos.y - r > surface.height {
            self.pos.y = r;
            self.pos.x = rng.random::<f32>() * surface.width;
        } else if self.pos.y + r < 0.0 {
            self.pos.y = surface.height - r;
            self.pos.x = rng.random::<f32>() * surface.width;
        }
    }

    /// Inverts a velocity component that carries the particle across an edge.
    ///
    /// Only outward-pointing components are flipped, so a particle that is
    /// still outside on the next tick is not flipped back.
    fn bounce_off_edges(&mut self, surface: SurfaceSize) {
        let r = self.radius;

        if (self.pos.x + r > surface.width && self.vel.x > 0.0)
            || (self.pos.x - r < 0.0 && self.vel.x < 0.0)
        {
            self.vel.x = -self.vel.x;
        }

        if (self.pos.y + r > surface.height && self.vel.y > 0.0)
            || (self.pos.y - r < 0.0 && self.vel.y < 0.0)
        {
            self.vel.y = -self.vel.y;
        }
    }

    /// Issues the drawing commands for this particle.
    pub fn draw(&self, r: &mut dyn Renderer, style: &DrawStyle) {
        let radius = self.effective_radius();
        let Vec2 { x, y } = self.pos;

        r.set_fill_style(Paint::new(self.color, self.effective_opacity()));
        r.begin_path();

        match self.shape {
            ShapeKind::Circle => r.arc(self.pos, radius, 0.0, TAU),
            ShapeKind::Edge => r.rect(self.pos - radius, Vec2::splat(radius * 2.0)),
            ShapeKind::Triangle => draw_regular_polygon(
                r,
                Vec2::new(x - radius, y + radius / 1.66),
                radius * 2.0,
                3,
                2,
            ),
            ShapeKind::Polygon => {
                let n = style.polygon_sides.max(3);
                let sides = n as f32;
                draw_regular_polygon(
                    r,
                    Vec2::new(x - radius / (sides / 3.5), y - radius / (2.66 / 3.5)),
                    radius * 2.66 / (sides / 3.0),
                    n,
                    1,
                );
            }
            ShapeKind::Star => {
                let n = style.polygon_sides.max(3);
                let sides = n as f32;
                draw_regular_polygon(
                    r,
                    Vec2::new(
                        x - radius * 2.0 / (sides / 4.0),
                        y - radius / (2.0 * 2.66 / 3.5),
                    ),
                    radius * 2.0 * 2.66 / (sides / 3.0),
                    n,
                    2,
                );
            }
            ShapeKind::Image => {
                if let (Some(image), Some(img)) = (style.image, self.image) {
                    r.draw_image(
                        image,
                        self.pos - radius,
                        Vec2::new(radius * 2.0, radius * 2.0 / img.ratio),
                    );
                }
            }
        }

        r.close_path();
        if let Some((color, width)) = style.stroke {
            r.set_stroke_style(Paint::new(color, 1.0));
            r.set_line_width(width);
            r.stroke();
        }
        r.fill();
    }
}

fn random_factor(random: bool, rng: &mut impl Rng) -> f32 {
    if random { rng.random::<f32>() } else { 1.0 }
}

fn nudge_inward(v: f32, radius: f32, extent: f32) -> f32 {
    if v > extent - radius * 2.0 {
        v - radius
    } else if v < radius * 2.0 {
        v + radius
    } else {
        v
    }
}
