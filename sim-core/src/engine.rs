//! The engine: owns the particle population and drives one frame per tick.
//!
//! A frame is:
//! 1. advance the click sessions against the wall clock,
//! 2. for every particle, evolve it, apply the pointer interactions, then
//!    run the enabled pairwise interactions against every later particle,
//! 3. draw every particle.
//!
//! The engine never loops on its own. It asks its [`TickScheduler`] for the
//! next frame at the end of a tick while motion is enabled, and stops after
//! one frame otherwise.

use crate::{
    config::{ColorSource, Config, InteractionMode},
    density::{self, DensityAdjustment},
    error::{Error, Result},
    frame::{Clock, SystemClock, TickHandle, TickQueue, TickScheduler},
    pairwise::{attract, bounce, link},
    particle::{DrawStyle, Particle},
    pointer::{
        InteractionContext, InteractionSession, PointerState, bubble_click, bubble_hover, grab,
        repulse_click, repulse_hover,
    },
    render::{ImageId, Paint, Renderer},
    types::{Color, Rgb, SurfaceSize},
};
use glam::Vec2;
use log::{debug, error, info, warn};
use rand::{SeedableRng, rngs::StdRng};

/// Attempts at finding a non-overlapping spot for a new particle.
const MAX_PLACEMENT_ATTEMPTS: usize = 100;

/// Lifecycle of an [`Engine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Built, not started.
    Idle,
    /// Waiting for the host to deliver the image asset.
    AwaitingAsset,
    /// Population created, first frame requested.
    Ready,
    /// Drawing every scheduled frame.
    Running,
    /// Motion disabled: one frame drawn, no frame pending.
    Drawn,
    /// A configuration or asset error was latched; nothing is drawn.
    Faulted,
    Disposed,
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    config: Config,
    size: SurfaceSize,
    pixel_ratio: f32,
    seed: Option<u64>,
    scheduler: Option<Box<dyn TickScheduler>>,
    clock: Option<Box<dyn Clock>>,
}

impl EngineBuilder {
    /// Starts a builder for a surface of `size` logical pixels.
    pub fn new(config: Config, size: SurfaceSize) -> Self {
        Self {
            config,
            size,
            pixel_ratio: 1.0,
            seed: None,
            scheduler: None,
            clock: None,
        }
    }

    /// Device pixel ratio, used when `retina_detect` is on.
    pub fn pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    /// Seeds the random source for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Frame scheduler; defaults to a private [`TickQueue`].
    pub fn scheduler(mut self, scheduler: impl TickScheduler + 'static) -> Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    /// Wall clock; defaults to [`SystemClock`].
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Validates the configuration and builds an idle engine drawing onto
    /// `surface`.
    ///
    /// ### Errors
    /// Returns [`Error::InvalidColor`] when a particle, link or stroke color
    /// cannot be parsed.
    pub fn build<R: Renderer>(self, surface: R) -> Result<Engine<R>> {
        let palette = Palette::resolve(&self.config)?;
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut engine = Engine {
            surface: Some(surface),
            scheduler: self
                .scheduler
                .unwrap_or_else(|| Box::new(TickQueue::new())),
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock::new())),
            rng,
            config: self.config.clone(),
            base_config: self.config,
            palette,
            particles: Vec::new(),
            pointer: PointerState::default(),
            session: InteractionSession::default(),
            state: EngineState::Idle,
            pending: None,
            asset: None,
            logical_size: self.size,
            pixel_ratio: self.pixel_ratio,
        };
        engine.rescale();
        Ok(engine)
    }
}

/// Colors resolved from the configuration once, up front.
#[derive(Clone, Debug, PartialEq)]
struct Palette {
    particles: ColorSource,
    line: Color,
    stroke: Option<(Color, f32)>,
}

impl Palette {
    fn resolve(config: &Config) -> Result<Self> {
        let shape = &config.particles.shape;
        let stroke = if shape.stroke.width > 0.0 {
            Some((
                Color::Rgb(Rgb::from_hex(&shape.stroke.color)?),
                shape.stroke.width,
            ))
        } else {
            None
        };

        Ok(Self {
            particles: config.particles.color.value.resolve()?,
            line: Color::Rgb(Rgb::from_hex(&config.particles.line_linked.color)?),
            stroke,
        })
    }
}

/// A particle simulation bound to one drawing surface.
pub struct Engine<R: Renderer> {
    /// `None` once disposed.
    surface: Option<R>,
    scheduler: Box<dyn TickScheduler>,
    clock: Box<dyn Clock>,
    rng: StdRng,
    /// Configuration as supplied.
    base_config: Config,
    /// Configuration with lengths scaled for the pixel ratio.
    config: Config,
    palette: Palette,
    particles: Vec<Particle>,
    pointer: PointerState,
    session: InteractionSession,
    state: EngineState,
    /// At most one outstanding frame.
    pending: Option<TickHandle>,
    asset: Option<ImageId>,
    logical_size: SurfaceSize,
    pixel_ratio: f32,
}

impl<R: Renderer> Engine<R> {
    /// Builds an idle engine with the default scheduler and clock.
    pub fn new(config: Config, size: SurfaceSize, surface: R) -> Result<Self> {
        EngineBuilder::new(config, size).build(surface)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn session(&self) -> &InteractionSession {
        &self.session
    }

    /// The configuration as supplied.
    pub fn config(&self) -> &Config {
        &self.base_config
    }

    /// The configuration with lengths scaled for the pixel ratio.
    pub fn effective_config(&self) -> &Config {
        &self.config
    }

    pub fn surface(&self) -> Option<&R> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut R> {
        self.surface.as_mut()
    }

    /// Surface size in surface pixels (logical size times the active
    /// pixel ratio).
    pub fn surface_size(&self) -> SurfaceSize {
        let ratio = self.retina_ratio().unwrap_or(1.0);
        SurfaceSize::new(
            self.logical_size.width * ratio,
            self.logical_size.height * ratio,
        )
    }

    /// Pixel ratio applied to the surface, if high-density scaling is on.
    pub fn retina_ratio(&self) -> Option<f32> {
        (self.base_config.retina_detect && self.pixel_ratio > 1.0).then_some(self.pixel_ratio)
    }

    pub fn has_pending_tick(&self) -> bool {
        self.pending.is_some()
    }

    fn is_live(&self) -> bool {
        matches!(
            self.state,
            EngineState::Ready | EngineState::Running | EngineState::Drawn
        )
    }

    /// Starts (or restarts) the engine.
    ///
    /// Shapes that need an image wait in [`EngineState::AwaitingAsset`]
    /// until [`Engine::asset_ready`] is called; an image shape without a
    /// source latches [`EngineState::Faulted`].
    pub fn start(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.cancel_pending();
        self.session = InteractionSession::default();
        self.particles.clear();

        let shape = &self.config.particles.shape;
        if shape.requires_image() {
            if shape.image.src.is_empty() {
                error!("{}", Error::MissingImageSource);
                self.state = EngineState::Faulted;
                return;
            }
            if self.asset.is_none() {
                debug!("waiting for image asset {:?}", shape.image.src);
                self.state = EngineState::AwaitingAsset;
                self.request_tick();
                return;
            }
        }

        self.initialize();
    }

    /// Creates the initial population and requests the first frame.
    fn initialize(&mut self) {
        let size = self.surface_size();
        if let Some(surface) = self.surface.as_mut() {
            surface.set_fill_style(Paint::new(Color::Rgb(Rgb::WHITE), 0.0));
            surface.fill_rect(Vec2::ZERO, size.as_vec2());
        }

        for _ in 0..self.config.particles.number.value {
            self.spawn(None);
        }
        self.regulate_density();

        info!(
            "initialized {} particles on a {}x{} surface",
            self.particles.len(),
            size.width,
            size.height
        );
        self.state = EngineState::Ready;
        self.request_tick();
    }

    /// Runs one scheduled frame.
    pub fn tick(&mut self) {
        self.cancel_pending();

        match self.state {
            EngineState::Idle | EngineState::Faulted | EngineState::Disposed => return,
            EngineState::AwaitingAsset => {
                if self.asset.is_some() {
                    self.initialize();
                } else {
                    self.request_tick();
                }
                return;
            }
            EngineState::Ready | EngineState::Running | EngineState::Drawn => {}
        }

        self.draw_frame();

        if self.config.particles.movement.enable {
            self.state = EngineState::Running;
            self.request_tick();
        } else {
            self.state = EngineState::Drawn;
        }
    }

    /// Clears the surface, updates every particle and draws the result.
    fn draw_frame(&mut self) {
        let size = self.surface_size();
        let now = self.clock.now();

        let Self {
            surface,
            rng,
            config,
            palette,
            particles,
            pointer,
            session,
            asset,
            ..
        } = self;
        let Some(surface) = surface.as_mut() else {
            return;
        };
        let r: &mut dyn Renderer = surface;

        r.clear_rect(Vec2::ZERO, size.as_vec2());

        let change = session.advance(now, pointer, &config.interactivity.modes);
        if change.bubble_ended {
            debug!("bubble session ended");
            particles.iter_mut().for_each(Particle::clear_bubble);
        }
        if change.repulse_ended {
            debug!("repulse session ended");
            for p in particles.iter_mut() {
                p.vel = p.initial_vel;
            }
        }

        let config = &*config;
        let cfg = &config.particles;
        let interactivity = &config.interactivity;
        let ctx = InteractionContext {
            config,
            surface: size,
            pointer: &*pointer,
            line_color: palette.line,
        };
        let population = particles.len();
        let any_pairwise =
            cfg.line_linked.enable || cfg.movement.attract.enable || cfg.movement.bounce;

        for i in 0..population {
            let (head, tail) = particles.split_at_mut(i + 1);
            let p = &mut head[i];

            p.evolve(cfg, size, rng);

            if interactivity.hover_is(InteractionMode::Grab) {
                grab(p, &ctx, r);
            }

            if interactivity.hover_is(InteractionMode::Bubble) {
                bubble_hover(p, &ctx);
            } else if interactivity.click_is(InteractionMode::Bubble) {
                bubble_click(p, &ctx, &session.bubble);
            }

            if interactivity.hover_is(InteractionMode::Repulse) {
                repulse_hover(p, &ctx);
            } else if interactivity.click_is(InteractionMode::Repulse) {
                repulse_click(p, &ctx, &mut session.repulse, population);
            }

            if any_pairwise {
                for q in tail.iter_mut() {
                    if cfg.line_linked.enable {
                        link(p, q, &cfg.line_linked, palette.line, r);
                    }
                    if cfg.movement.attract.enable {
                        attract(p, q, &cfg.movement.attract, cfg.line_linked.distance);
                    }
                    if cfg.movement.bounce {
                        bounce(p, q);
                    }
                }
            }
        }

        let style = DrawStyle {
            polygon_sides: cfg.shape.polygon.nb_sides,
            stroke: palette.stroke,
            image: *asset,
        };
        for p in particles.iter() {
            p.draw(r, &style);
        }
    }

    /// Redraws immediately when nothing else will.
    fn redraw_if_static(&mut self) {
        if !self.config.particles.movement.enable && self.is_live() {
            self.draw_frame();
        }
    }

    /// Appends one particle built with the usual construction rules.
    fn spawn(&mut self, position: Option<Vec2>) {
        let size = self.surface_size();
        let mut p = Particle::new(
            &self.config.particles,
            &self.palette.particles,
            size,
            position,
            &mut self.rng,
        );

        if self.config.particles.movement.bounce {
            let mut attempts = 0;
            while self.particles.iter().any(|other| p.overlaps(other)) {
                attempts += 1;
                if attempts >= MAX_PLACEMENT_ATTEMPTS {
                    warn!("no free spot for a new particle after {attempts} attempts");
                    break;
                }
                p.pos = size.random_point(&mut self.rng);
            }
        }

        self.particles.push(p);
    }

    /// Adds particles built with the usual construction rules.
    ///
    /// Ignored until the engine is initialized. With motion disabled the
    /// static frame is redrawn right away.
    ///
    /// ### Parameters
    /// - `count` - Number of particles to append.
    /// - `position` - Spawn point in surface pixels, or `None` for random
    ///   positions on the surface.
    pub fn push_particles(&mut self, count: usize, position: Option<Vec2>) {
        if !self.is_live() {
            return;
        }
        for _ in 0..count {
            self.spawn(position);
        }
        self.redraw_if_static();
    }

    /// Removes the `count` oldest particles (all of them when fewer exist).
    ///
    /// Ignored until the engine is initialized. With motion disabled the
    /// static frame is redrawn right away.
    pub fn remove_particles(&mut self, count: usize) {
        if !self.is_live() {
            return;
        }
        let count = count.min(self.particles.len());
        self.particles.drain(..count);
        self.redraw_if_static();
    }

    /// Brings the population to the density target for the current surface.
    fn regulate_density(&mut self) {
        let adjustment = density::regulate(
            self.particles.len(),
            self.surface_size(),
            &self.config.particles.number,
            self.retina_ratio(),
        );

        match adjustment {
            Some(DensityAdjustment::Push(n)) => {
                debug!("density: adding {n} particles");
                for _ in 0..n {
                    self.spawn(None);
                }
            }
            Some(DensityAdjustment::Remove(n)) => {
                debug!("density: removing {n} particles");
                self.particles.drain(..n.min(self.particles.len()));
            }
            None => return,
        }
        self.redraw_if_static();
    }

    /// Notifies the engine that the surface now measures `width` x `height`
    /// logical pixels.
    ///
    /// With motion disabled the population is rebuilt and redrawn; the
    /// density target is re-applied either way.
    pub fn resize(&mut self, width: f32, height: f32) {
        if self.state == EngineState::Disposed {
            return;
        }
        if !self.base_config.interactivity.events.resize {
            debug!("resize ignored: resize events disabled");
            return;
        }
        self.logical_size = SurfaceSize::new(width, height);

        if !self.is_live() {
            return;
        }

        if !self.config.particles.movement.enable {
            self.particles.clear();
            for _ in 0..self.config.particles.number.value {
                self.spawn(None);
            }
            self.draw_frame();
        }
        self.regulate_density();
    }

    /// Changes the device pixel ratio, rescaling every length.
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        if self.pixel_ratio == ratio {
            return;
        }
        self.pixel_ratio = ratio;
        self.rescale();
    }

    fn rescale(&mut self) {
        self.config = match self.retina_ratio() {
            Some(ratio) => self.base_config.scaled(ratio),
            None => self.base_config.clone(),
        };
    }

    fn to_surface(&self, position: Vec2) -> Vec2 {
        position * self.retina_ratio().unwrap_or(1.0)
    }

    /// Pointer moved to `(x, y)` in logical pixels.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if self.state == EngineState::Disposed {
            return;
        }
        let position = self.to_surface(Vec2::new(x, y));
        self.pointer.move_to(position);
    }

    pub fn pointer_leave(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.pointer.leave();
    }

    /// Pointer clicked at its current position; dispatches on the click mode.
    pub fn pointer_click(&mut self) {
        let onclick = &self.config.interactivity.events.onclick;
        if !self.is_live() || !onclick.enable {
            return;
        }
        let mode = onclick.mode;

        let now = self.clock.now();
        self.pointer.click(now);

        let modes = &self.config.interactivity.modes;
        match mode {
            InteractionMode::Push => {
                let count = modes.push.particles_nb;
                let at = if self.config.particles.movement.enable || count == 1 {
                    self.pointer.position
                } else {
                    None
                };
                self.push_particles(count, at);
            }
            InteractionMode::Remove => {
                let count = modes.remove.particles_nb;
                self.remove_particles(count);
            }
            InteractionMode::Bubble => {
                debug!("bubble session started");
                self.session.start_bubble();
            }
            InteractionMode::Repulse => {
                debug!("repulse session started");
                self.session.start_repulse(now);
            }
            InteractionMode::Grab => {}
        }
    }

    /// The host finished decoding the configured image.
    ///
    /// Ignored after [`Engine::dispose`] or a latched failure.
    pub fn asset_ready(&mut self, image: ImageId) {
        if matches!(self.state, EngineState::Disposed | EngineState::Faulted) {
            debug!("ignoring image asset delivered in state {:?}", self.state);
            return;
        }
        debug!("image asset ready: {image:?}");
        self.asset = Some(image);
    }

    /// The host failed to fetch or decode the configured image.
    ///
    /// The failure is latched: nothing is drawn until the next restart.
    pub fn asset_failed(&mut self, reason: impl Into<String>) {
        if self.state == EngineState::Disposed {
            return;
        }
        warn!("{}", Error::AssetLoad(reason.into()));
        self.cancel_pending();
        self.state = EngineState::Faulted;
    }

    /// Cancels any pending frame, clears the surface and starts over.
    ///
    /// The loaded image is released too, so image shapes wait for the host
    /// to deliver it again.
    pub fn refresh(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.cancel_pending();
        self.asset = None;
        let size = self.surface_size();
        if let Some(surface) = self.surface.as_mut() {
            surface.clear_rect(Vec2::ZERO, size.as_vec2());
        }
        self.state = EngineState::Idle;
        self.start();
    }

    /// Replaces the configuration and restarts.
    ///
    /// ### Errors
    /// Returns [`Error::InvalidColor`] when the new configuration has an
    /// unparseable color; the engine keeps running with the old one.
    pub fn set_config(&mut self, config: Config) -> Result<()> {
        let palette = Palette::resolve(&config)?;
        self.palette = palette;
        self.base_config = config;
        self.rescale();
        self.refresh();
        Ok(())
    }

    /// Cancels the pending frame and releases the surface.
    pub fn dispose(&mut self) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.cancel_pending();
        self.surface = None;
        self.particles.clear();
        self.state = EngineState::Disposed;
        info!("engine disposed");
    }

    fn request_tick(&mut self) {
        if let Some(stale) = self.pending.take() {
            self.scheduler.cancel_tick(stale);
        }
        self.pending = Some(self.scheduler.request_tick());
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_tick(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::OutMode,
        frame::ManualClock,
        render::{CommandBuffer, DrawCommand},
        types::ShapeKind,
    };

    fn small_config() -> Config {
        let mut cfg = Config::default();
        cfg.particles.number.value = 10;
        cfg.particles.number.density.enable = false;
        cfg
    }

    fn engine(cfg: Config) -> (Engine<CommandBuffer>, TickQueue, ManualClock) {
        let queue = TickQueue::new();
        let clock = ManualClock::new();
        let engine = EngineBuilder::new(cfg, SurfaceSize::new(400.0, 300.0))
            .seed(7)
            .scheduler(queue.clone())
            .clock(clock.clone())
            .build(CommandBuffer::new())
            .unwrap();
        (engine, queue, clock)
    }

    fn arcs(buf: &CommandBuffer) -> usize {
        buf.commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Arc { .. }))
            .count()
    }

    #[test]
    fn build_rejects_bad_colors() {
        let mut cfg = small_config();
        cfg.particles.line_linked.color = "#nothex".into();
        let err = EngineBuilder::new(cfg, SurfaceSize::new(10.0, 10.0))
            .build(CommandBuffer::new())
            .err();
        assert!(matches!(err, Some(Error::InvalidColor(_))));
    }

    #[test]
    fn start_populates_and_requests_one_frame() {
        let (mut engine, queue, _) = engine(small_config());
        assert_eq!(engine.state(), EngineState::Idle);

        engine.start();
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.particles().len(), 10);
        assert!(queue.is_pending());
        assert_eq!(queue.requested(), 1);
    }

    #[test]
    fn tick_draws_every_particle_and_keeps_running() {
        let (mut engine, queue, _) = engine(small_config());
        engine.start();

        assert!(queue.take_due());
        engine.tick();

        assert_eq!(engine.state(), EngineState::Running);
        assert!(queue.is_pending());
        let buf = engine.surface().unwrap();
        assert!(matches!(buf.commands()[0], DrawCommand::ClearRect { .. }));
        assert_eq!(arcs(buf), 10);
    }

    #[test]
    fn static_render_stops_after_one_frame() {
        let mut cfg = small_config();
        cfg.particles.movement.enable = false;
        let (mut engine, queue, _) = engine(cfg);
        engine.start();

        assert!(queue.take_due());
        engine.tick();
        assert_eq!(engine.state(), EngineState::Drawn);
        assert!(!queue.is_pending());
        assert!(!engine.has_pending_tick());
    }

    #[test]
    fn ticks_before_start_do_nothing() {
        let (mut engine, queue, _) = engine(small_config());
        engine.tick();
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(!queue.is_pending());
        assert!(engine.surface().unwrap().commands().is_empty());
    }

    #[test]
    fn links_are_drawn_between_close_particles() {
        let mut cfg = small_config();
        cfg.particles.number.value = 0;
        cfg.particles.movement.enable = false;
        cfg.particles.size.value = 2.0;
        cfg.interactivity.events.onhover.enable = false;
        let (mut engine, _, _) = engine(cfg);
        engine.start();

        engine.push_particles(1, Some(Vec2::new(100.0, 100.0)));
        engine.push_particles(1, Some(Vec2::new(150.0, 100.0)));

        let lines = engine.surface().unwrap().stroked_lines();
        assert_eq!(lines.len(), 1);
        assert!((lines[0].2 - 0.5).abs() < 1e-5);
    }

    #[test]
    fn click_push_spawns_at_the_pointer() {
        let mut cfg = small_config();
        cfg.particles.number.value = 0;
        let (mut engine, _, _) = engine(cfg);
        engine.start();

        engine.pointer_move(200.0, 150.0);
        engine.pointer_click();

        assert_eq!(engine.particles().len(), 4);
        for p in engine.particles() {
            assert_eq!(p.pos, Vec2::new(200.0, 150.0));
        }
    }

    #[test]
    fn click_remove_drops_the_oldest() {
        let mut cfg = small_config();
        cfg.interactivity.events.onclick.mode = InteractionMode::Remove;
        let (mut engine, _, _) = engine(cfg);
        engine.start();

        let survivors: Vec<Vec2> = engine.particles()[2..].iter().map(|p| p.pos).collect();
        engine.pointer_click();

        let left: Vec<Vec2> = engine.particles().iter().map(|p| p.pos).collect();
        assert_eq!(left, survivors);
    }

    #[test]
    fn remove_more_than_present_empties() {
        let (mut engine, _, _) = engine(small_config());
        engine.start();
        engine.remove_particles(1_000);
        assert!(engine.particles().is_empty());
    }

    #[test]
    fn density_is_applied_at_start() {
        let mut cfg = Config::default();
        cfg.particles.number.value = 100;
        let queue = TickQueue::new();
        let mut engine = EngineBuilder::new(cfg, SurfaceSize::new(1000.0, 1000.0))
            .seed(1)
            .scheduler(queue)
            .build(CommandBuffer::new())
            .unwrap();
        engine.start();
        assert_eq!(engine.particles().len(), 125);

        engine.resize(1000.0, 800.0);
        assert_eq!(engine.particles().len(), 100);
    }

    #[test]
    fn retina_scales_lengths_and_pointer() {
        let mut cfg = small_config();
        cfg.retina_detect = true;
        let queue = TickQueue::new();
        let mut engine = EngineBuilder::new(cfg, SurfaceSize::new(400.0, 300.0))
            .pixel_ratio(2.0)
            .seed(3)
            .scheduler(queue)
            .build(CommandBuffer::new())
            .unwrap();

        assert_eq!(engine.surface_size(), SurfaceSize::new(800.0, 600.0));
        assert_eq!(engine.effective_config().particles.size.value, 40.0);
        assert_eq!(engine.config().particles.size.value, 20.0);

        engine.pointer_move(10.0, 20.0);
        assert_eq!(engine.pointer().position, Some(Vec2::new(20.0, 40.0)));

        // Rescaling starts from the supplied configuration every time.
        engine.set_pixel_ratio(3.0);
        assert_eq!(engine.effective_config().particles.size.value, 60.0);
    }

    #[test]
    fn bounce_mode_avoids_overlapping_spawns() {
        let mut cfg = small_config();
        cfg.particles.number.value = 20;
        cfg.particles.size.value = 3.0;
        cfg.particles.movement.bounce = true;
        cfg.particles.movement.out_mode = OutMode::Bounce;
        let (mut engine, _, _) = engine(cfg);
        engine.start();

        let ps = engine.particles();
        for (i, a) in ps.iter().enumerate() {
            for b in &ps[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn image_shape_without_source_faults() {
        let mut cfg = small_config();
        cfg.particles.shape.kind = crate::config::ShapeSelection::One(ShapeKind::Image);
        let (mut engine, queue, _) = engine(cfg);
        engine.start();

        assert_eq!(engine.state(), EngineState::Faulted);
        assert!(!queue.is_pending());
        assert!(engine.particles().is_empty());
    }

    #[test]
    fn set_config_restarts_and_keeps_old_config_on_error() {
        let (mut engine, _, _) = engine(small_config());
        engine.start();

        let mut bad = small_config();
        bad.particles.color.value = crate::config::ColorSpec::Text("#12".into());
        assert!(engine.set_config(bad).is_err());
        assert_eq!(engine.particles().len(), 10);

        let mut good = small_config();
        good.particles.number.value = 3;
        engine.set_config(good).unwrap();
        assert_eq!(engine.particles().len(), 3);
        assert_eq!(engine.state(), EngineState::Ready);
    }

    #[test]
    fn resize_events_can_be_disabled() {
        let mut cfg = small_config();
        cfg.interactivity.events.resize = false;
        let (mut engine, _, _) = engine(cfg);
        engine.start();
        engine.resize(10.0, 10.0);
        assert_eq!(engine.surface_size(), SurfaceSize::new(400.0, 300.0));
    }
}
