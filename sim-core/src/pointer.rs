//! Pointer-driven interactions: grab, bubble and repulse.
//!
//! [`PointerState`] is written between ticks by whoever delivers pointer
//! events and read during the tick. The click-triggered modes keep their
//! timing in an [`InteractionSession`] owned by the engine and handed in by
//! reference, so two engines never share session state.

use crate::{
    config::{Config, ModesConfig, OutMode},
    pairwise::{line_opacity, stroke_line},
    particle::Particle,
    render::Renderer,
    types::{Color, SurfaceSize},
};
use glam::Vec2;

/// Most recent pointer transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerStatus {
    Hovering,
    Left,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointerState {
    /// Current position in surface pixels, `None` when the pointer is away.
    pub position: Option<Vec2>,
    pub click_position: Option<Vec2>,
    /// Clock time of the last click, in seconds.
    pub click_time: Option<f64>,
    /// `None` until the first pointer event.
    pub status: Option<PointerStatus>,
}

impl PointerState {
    pub fn move_to(&mut self, position: Vec2) {
        self.position = Some(position);
        self.status = Some(PointerStatus::Hovering);
    }

    pub fn leave(&mut self) {
        self.position = None;
        self.status = Some(PointerStatus::Left);
    }

    /// Records a click at the current position.
    pub fn click(&mut self, now: f64) {
        self.click_position = self.position;
        self.click_time = Some(now);
    }

    /// Position of a hovering pointer, if any.
    pub fn hovering_at(&self) -> Option<Vec2> {
        match self.status {
            Some(PointerStatus::Hovering) => self.position,
            _ => None,
        }
    }
}

/// Timed state of a click-triggered bubble.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BubbleSession {
    pub active: bool,
    /// Past the configured duration: overrides decay back to base values.
    pub settling: bool,
    /// Seconds since the click, refreshed once per tick.
    pub elapsed: f32,
}

/// Timed state of a click-triggered repulse.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RepulseSession {
    pub active: bool,
    pub started_at: f64,
    /// Particles processed since the click.
    pub visited: usize,
    /// Every particle has received its push.
    pub finished: bool,
}

/// What changed when the session clock was advanced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionChange {
    pub bubble_ended: bool,
    pub repulse_ended: bool,
}

/// Per-engine state of the click-triggered interactions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionSession {
    pub bubble: BubbleSession,
    pub repulse: RepulseSession,
}

impl InteractionSession {
    pub fn start_bubble(&mut self) {
        self.bubble = BubbleSession {
            active: true,
            settling: false,
            elapsed: 0.0,
        };
    }

    /// Starts (or restarts) a repulse; a second click resets the counter.
    pub fn start_repulse(&mut self, now: f64) {
        self.repulse = RepulseSession {
            active: true,
            started_at: now,
            visited: 0,
            finished: false,
        };
    }

    /// Brings both sessions up to date with the wall clock.
    ///
    /// Called once at the start of every tick.
    pub fn advance(&mut self, now: f64, pointer: &PointerState, modes: &ModesConfig) -> SessionChange {
        let mut change = SessionChange::default();

        if self.bubble.active {
            match pointer.click_time {
                Some(t0) => {
                    let elapsed = (now - t0) as f32;
                    let duration = modes.bubble.duration;
                    self.bubble.elapsed = elapsed;
                    if elapsed > duration {
                        self.bubble.settling = true;
                    }
                    if elapsed > duration * 2.0 {
                        self.bubble = BubbleSession::default();
                        change.bubble_ended = true;
                    }
                }
                None => {
                    self.bubble = BubbleSession::default();
                    change.bubble_ended = true;
                }
            }
        }

        if self.repulse.active && now - self.repulse.started_at >= f64::from(modes.repulse.duration) {
            self.repulse.active = false;
            change.repulse_ended = true;
        }

        change
    }
}

/// Read-only inputs shared by every pointer interaction in a tick.
#[derive(Clone, Copy, Debug)]
pub struct InteractionContext<'a> {
    pub config: &'a Config,
    pub surface: SurfaceSize,
    pub pointer: &'a PointerState,
    /// Color of link and grab lines.
    pub line_color: Color,
}

/// Draws a line from a particle to a nearby hovering pointer.
///
/// ### Parameters
/// - `p` - The particle; only read access is required.
/// - `ctx` - Tick inputs; the grab distance and line opacity come from
///   `ctx.config`, the line color and width from the link settings.
/// - `r` - Surface the line is stroked on.
///
/// ### Returns
/// Whether a line was drawn.
pub fn grab(p: &Particle, ctx: &InteractionContext<'_>, r: &mut dyn Renderer) -> bool {
    let Some(mouse) = ctx.pointer.hovering_at() else {
        return false;
    };
    let grab = &ctx.config.interactivity.modes.grab;

    let dist = p.pos.distance(mouse);
    if dist > grab.distance {
        return false;
    }

    let opacity = line_opacity(grab.line_linked.opacity, dist, grab.distance);
    if opacity <= 0.0 {
        return false;
    }

    stroke_line(
        r,
        p.pos,
        mouse,
        ctx.line_color,
        opacity,
        ctx.config.particles.line_linked.width,
    );
    true
}

/// Inflates (or deflates) particles near a hovering pointer.
///
/// Outside the bubble distance, or once the pointer has left, the overrides
/// are cleared.
///
/// ### Parameters
/// - `p` - The particle whose `radius_bubble`/`opacity_bubble` overrides
///   are set or cleared.
/// - `ctx` - Tick inputs, providing the hovering pointer position and the
///   bubble distance, size and opacity targets.
pub fn bubble_hover(p: &mut Particle, ctx: &InteractionContext<'_>) {
    let Some(mouse) = ctx.pointer.hovering_at() else {
        p.clear_bubble();
        return;
    };
    let bubble = &ctx.config.interactivity.modes.bubble;
    let particles = &ctx.config.particles;

    let dist = p.pos.distance(mouse);
    if dist > bubble.distance || bubble.distance <= 0.0 {
        p.clear_bubble();
        return;
    }
    let ratio = 1.0 - dist / bubble.distance;

    if bubble.size != particles.size.value {
        if bubble.size > particles.size.value {
            let size = p.radius + bubble.size * ratio;
            if size >= 0.0 {
                p.radius_bubble = Some(size);
            }
        } else {
            let dif = p.radius - bubble.size;
            p.radius_bubble = Some((p.radius - dif * ratio).max(0.0));
        }
    }

    if let Some(target) = bubble.opacity
        && target != particles.opacity.value
    {
        let opacity = if target > particles.opacity.value {
            let o = target * ratio;
            (o > p.opacity && o <= target).then_some(o)
        } else {
            let o = p.opacity - (particles.opacity.value - target) * ratio;
            (o < p.opacity && o >= target).then_some(o)
        };
        p.opacity_bubble = opacity.map(|o| o.clamp(0.0, 1.0));
    }
}

/// Moves the bubble overrides of particles near the click point along the
/// session timeline: towards the target while active, back towards the base
/// value while settling.
pub fn bubble_click(p: &mut Particle, ctx: &InteractionContext<'_>, session: &BubbleSession) {
    if !session.active {
        return;
    }
    let Some(click) = ctx.pointer.click_position else {
        return;
    };
    let bubble = &ctx.config.interactivity.modes.bubble;
    let particles = &ctx.config.particles;

    let timeline = BubbleTimeline {
        in_range: p.pos.distance(click) <= bubble.distance,
        progress: if bubble.duration > 0.0 {
            session.elapsed / bubble.duration
        } else {
            1.0
        },
        settling: session.settling,
    };

    if bubble.size != particles.size.value {
        p.radius_bubble = timeline
            .value(p.radius_bubble, p.radius, bubble.size)
            .map(|r| r.max(0.0));
    }

    if let Some(target) = bubble.opacity
        && target != particles.opacity.value
    {
        p.opacity_bubble = timeline
            .value(p.opacity_bubble, p.opacity, target)
            .map(|o| o.clamp(0.0, 1.0));
    }
}

struct BubbleTimeline {
    in_range: bool,
    /// Elapsed time over the configured duration.
    progress: f32,
    settling: bool,
}

impl BubbleTimeline {
    fn value(&self, current: Option<f32>, base: f32, target: f32) -> Option<f32> {
        let towards = base - self.progress * (base - target);
        if self.settling {
            // Mirror around the target: progress 1 -> target, 2 -> base.
            current.map(|_| target + (target - towards))
        } else if !self.in_range {
            None
        } else if current.unwrap_or(base) != target {
            Some(towards)
        } else {
            current
        }
    }
}

/// Pushes particles away from a hovering pointer.
///
/// The push fades with the square of the normalized distance and is capped
/// at 50 pixels. Under the bounce policy a push that would cross an edge is
/// dropped for that axis.
pub fn repulse_hover(p: &mut Particle, ctx: &InteractionContext<'_>) {
    let Some(mouse) = ctx.pointer.hovering_at() else {
        return;
    };
    let radius = ctx.config.interactivity.modes.repulse.distance;
    if radius <= 0.0 {
        return;
    }

    let delta = p.pos - mouse;
    let dist = delta.length();
    if dist == 0.0 {
        return;
    }
    let norm = delta / dist;

    const VELOCITY: f32 = 100.0;
    let factor = ((1.0 / radius) * (1.0 - (dist / radius).powi(2)) * radius * VELOCITY).clamp(0.0, 50.0);
    let target = p.pos + norm * factor;

    match ctx.config.particles.movement.out_mode {
        OutMode::Bounce => {
            let r = p.radius;
            if target.x - r > 0.0 && target.x + r < ctx.surface.width {
                p.pos.x = target.x;
            }
            if target.y - r > 0.0 && target.y + r < ctx.surface.height {
                p.pos.y = target.y;
            }
        }
        OutMode::Wrap => p.pos = target,
    }
}

/// Gives particles near the click point a velocity away from it.
///
/// Each particle is pushed at most once per session: after `population`
/// particles have been visited the session is marked finished. A particle
/// sitting exactly on the click point is counted but not pushed.
///
/// ### Parameters
/// - `p` - The particle; its velocity is replaced when it is within reach.
/// - `ctx` - Tick inputs, providing the click position, the repulse
///   distance and the out-of-bounds policy.
/// - `session` - The running repulse session; its visit counter advances.
/// - `population` - Number of particles in the engine this tick.
pub fn repulse_click(
    p: &mut Particle,
    ctx: &InteractionContext<'_>,
    session: &mut RepulseSession,
    population: usize,
) {
    if !session.active {
        return;
    }

    if !session.finished
        && let Some(click) = ctx.pointer.click_position
    {
        let reach = (ctx.config.interactivity.modes.repulse.distance / 6.0).powi(3);
        let delta = click - p.pos;
        let d = delta.length_squared();

        if d > 0.0 && d <= reach {
            let force = -reach / d;
            let angle = delta.y.atan2(delta.x);
            p.vel = Vec2::new(force * angle.cos(), force * angle.sin());

            if ctx.config.particles.movement.out_mode == OutMode::Bounce {
                let next = p.pos + p.vel;
                let r = p.radius;
                if next.x + r > ctx.surface.width || next.x - r < 0.0 {
                    p.vel.x = -p.vel.x;
                }
                if next.y + r > ctx.surface.height || next.y - r < 0.0 {
                    p.vel.y = -p.vel.y;
                }
            }
        }
    }

    if !session.finished {
        session.visited += 1;
        if session.visited >= population {
            session.finished = true;
        }
    }
}
