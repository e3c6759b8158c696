//! Interactive particle viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which hosts one particle [`Engine`] and
//! implements [`eframe::App`]. The viewer plays every collaborator the
//! engine needs: it owns the recording surface, forwards pointer events,
//! delivers scheduled frames from a shared [`TickQueue`] and decodes the
//! configured image asset.

use crate::canvas;
use eframe::App;
use glam::{Affine2, Vec2};
use log::{info, warn};
use particulate_core::{
    Result,
    config::{Config, InteractionMode, OutMode},
    engine::{Engine, EngineBuilder, EngineState},
    frame::TickQueue,
    render::{CommandBuffer, ImageId},
    types::SurfaceSize,
};
use std::collections::HashMap;

/// Surface size used until the first layout pass reports the real one.
const INITIAL_SIZE: SurfaceSize = SurfaceSize {
    width: 800.0,
    height: 600.0,
};

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(17, 24, 39);

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Sync the surface size and pixel ratio with the central panel.
/// 2. Forward hover, leave and click events to the engine.
/// 3. If the engine asked for a frame, run [`Engine::tick`].
/// 4. Replay the recorded commands with the egui painter.
///
/// ### Fields
/// - `engine` - The simulation, drawing into a [`CommandBuffer`].
/// - `frames` - Host side of the engine's frame scheduler.
/// - `cfg` - Working copy of the configuration edited in the side panel.
///
/// - `textures` - egui textures for image handles given to the engine.
/// - `next_image` - Next [`ImageId`] to hand out.
/// - `asset_requested` - The configured image has been loaded (or failed)
///   for the current run.
///
/// - `surface` - Size of the central panel at the last sync.
/// - `hovering` - Whether the last pointer event was a hover.
/// - `last_error` - Shown in the status bar until the next successful apply.
pub struct Viewer {
    engine: Engine<CommandBuffer>,
    frames: TickQueue,
    cfg: Config,

    textures: HashMap<ImageId, egui::TextureHandle>,
    next_image: u64,
    asset_requested: bool,

    surface: Option<egui::Vec2>,
    hovering: bool,
    last_error: Option<String>,
}

impl Viewer {
    /// Creates a viewer around a new, not yet started engine.
    ///
    /// The engine starts on the first frame, once the panel size is known.
    ///
    /// ### Parameters
    /// - `cfg` - Initial configuration.
    /// - `seed` - Optional seed for a reproducible particle layout.
    ///
    /// ### Errors
    /// Fails when the configuration contains an invalid color.
    pub fn new(cfg: Config, seed: Option<u64>) -> Result<Self> {
        let frames = TickQueue::new();
        let mut builder = EngineBuilder::new(cfg.clone(), INITIAL_SIZE).scheduler(frames.clone());
        if let Some(seed) = seed {
            builder = builder.seed(seed);
        }
        let engine = builder.build(CommandBuffer::new())?;

        Ok(Self {
            engine,
            frames,
            cfg,
            textures: HashMap::new(),
            next_image: 1,
            asset_requested: false,
            surface: None,
            hovering: false,
            last_error: None,
        })
    }

    /// Restarts the engine with its current configuration.
    fn restart(&mut self) {
        self.asset_requested = false;
        self.engine.refresh();
    }

    /// Pushes the edited configuration into the engine.
    ///
    /// On error the engine keeps running with its previous configuration
    /// and the message is kept for the status bar.
    fn apply_config(&mut self) {
        self.asset_requested = false;
        match self.engine.set_config(self.cfg.clone()) {
            Ok(()) => {
                info!("configuration applied");
                self.last_error = None;
            }
            Err(err) => {
                warn!("configuration rejected: {err}");
                self.last_error = Some(err.to_string());
            }
        }
    }

    /// Maps engine surface pixels into the screen rectangle.
    fn surface_transform(&self, rect: egui::Rect) -> Affine2 {
        let ratio = self.engine.retina_ratio().unwrap_or(1.0);
        Affine2::from_translation(Vec2::new(rect.min.x, rect.min.y))
            * Affine2::from_scale(Vec2::splat(1.0 / ratio))
    }

    /// Keeps the engine surface in step with the panel and starts the
    /// engine on the first call.
    fn sync_surface(&mut self, rect: egui::Rect, pixels_per_point: f32) {
        self.engine.set_pixel_ratio(pixels_per_point);

        let size = rect.size();
        if self.surface != Some(size) {
            self.surface = Some(size);
            self.engine.resize(size.x, size.y);
        }

        if self.engine.state() == EngineState::Idle {
            self.engine.start();
        }
    }

    /// Forwards hover, leave and click events in panel-local coordinates.
    fn forward_pointer(&mut self, response: &egui::Response) {
        match response.hover_pos() {
            Some(pos) => {
                let local = pos - response.rect.min;
                self.engine.pointer_move(local.x, local.y);
                self.hovering = true;
            }
            None if self.hovering => {
                self.engine.pointer_leave();
                self.hovering = false;
            }
            None => {}
        }

        if response.clicked() {
            self.engine.pointer_click();
        }
    }

    /// Loads the configured image once per run while the engine waits.
    fn poll_asset(&mut self, ctx: &egui::Context) {
        if self.engine.state() != EngineState::AwaitingAsset || self.asset_requested {
            return;
        }
        self.asset_requested = true;

        let src = self.engine.config().particles.shape.image.src.clone();
        match load_texture(ctx, &src) {
            Ok(texture) => self.install_asset(texture),
            Err(err) => self.engine.asset_failed(format!("{src}: {err}")),
        }
    }

    /// Hands a freshly loaded texture to the engine, releasing the one
    /// from the previous run.
    fn install_asset(&mut self, texture: egui::TextureHandle) {
        self.textures.clear();
        let id = ImageId(self.next_image);
        self.next_image += 1;
        self.textures.insert(id, texture);
        self.engine.asset_ready(id);
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Combo box over the interaction modes.
    fn mode_combo(ui: &mut egui::Ui, id: &str, mode: &mut InteractionMode) {
        egui::ComboBox::from_id_salt(id)
            .selected_text(format!("{mode:?}"))
            .show_ui(ui, |ui| {
                for m in [
                    InteractionMode::Grab,
                    InteractionMode::Bubble,
                    InteractionMode::Repulse,
                    InteractionMode::Push,
                    InteractionMode::Remove,
                ] {
                    ui.selectable_value(mode, m, format!("{m:?}"));
                }
            });
    }

    /// Builds the top panel UI (restart, push, remove).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("⟳ Restart").clicked() {
                    self.restart();
                }

                ui.separator();

                if ui.button("Push").clicked() {
                    let count = self.engine.effective_config().interactivity.modes.push.particles_nb;
                    self.engine.push_particles(count, None);
                }

                if ui.button("Remove").clicked() {
                    let count = self
                        .engine
                        .effective_config()
                        .interactivity
                        .modes
                        .remove
                        .particles_nb;
                    self.engine.remove_particles(count);
                }
            });
        });
    }

    /// Builds the bottom status bar (state, particle count, errors).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("state = {:?}", self.engine.state()));
                ui.label(format!("particles = {}", self.engine.particles().len()));
                if let Some(ratio) = self.engine.retina_ratio() {
                    ui.label(format!("retina x{ratio:.1}"));
                }
                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
            });
        });
    }

    /// Builds the right-hand configuration panel.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Config");

                    ui.separator();
                    ui.label("Population");
                    let particles = &mut self.cfg.particles;
                    Self::labeled_drag_usize(ui, "number:", &mut particles.number.value, 0..=2000, 1.0);
                    ui.checkbox(&mut particles.number.density.enable, "density");
                    Self::labeled_drag_f32(
                        ui,
                        "value_area:",
                        &mut particles.number.density.value_area,
                        1.0..=5000.0,
                        5.0,
                    );

                    ui.separator();
                    ui.label("Appearance");
                    Self::labeled_drag_f32(ui, "size:", &mut particles.size.value, 0.0..=100.0, 0.2);
                    ui.checkbox(&mut particles.size.random, "random size");
                    ui.checkbox(&mut particles.size.anim.enable, "animate size");
                    Self::labeled_drag_f32(ui, "opacity:", &mut particles.opacity.value, 0.0..=1.0, 0.01);
                    ui.checkbox(&mut particles.opacity.random, "random opacity");
                    ui.checkbox(&mut particles.opacity.anim.enable, "animate opacity");

                    ui.separator();
                    ui.label("Links");
                    ui.checkbox(&mut particles.line_linked.enable, "enable");
                    Self::labeled_drag_f32(
                        ui,
                        "distance:",
                        &mut particles.line_linked.distance,
                        0.0..=500.0,
                        1.0,
                    );
                    Self::labeled_drag_f32(ui, "width:", &mut particles.line_linked.width, 0.0..=10.0, 0.1);

                    ui.separator();
                    ui.label("Movement");
                    let movement = &mut particles.movement;
                    ui.checkbox(&mut movement.enable, "enable");
                    Self::labeled_drag_f32(ui, "speed:", &mut movement.speed, 0.0..=50.0, 0.1);
                    ui.horizontal(|ui| {
                        ui.label("out_mode:");
                        ui.selectable_value(&mut movement.out_mode, OutMode::Wrap, "out");
                        ui.selectable_value(&mut movement.out_mode, OutMode::Bounce, "bounce");
                    });
                    ui.checkbox(&mut movement.bounce, "particle bounce");
                    ui.checkbox(&mut movement.attract.enable, "attract");

                    ui.separator();
                    ui.label("Interactivity");
                    let events = &mut self.cfg.interactivity.events;
                    ui.horizontal(|ui| {
                        ui.checkbox(&mut events.onhover.enable, "hover");
                        Self::mode_combo(ui, "hover_mode", &mut events.onhover.mode);
                    });
                    ui.horizontal(|ui| {
                        ui.checkbox(&mut events.onclick.enable, "click");
                        Self::mode_combo(ui, "click_mode", &mut events.onclick.mode);
                    });
                    ui.checkbox(&mut self.cfg.retina_detect, "retina_detect");

                    ui.separator();
                    ui.horizontal(|ui| {
                        if ui.button("Apply").clicked() {
                            self.apply_config();
                        }
                        if ui.button("Reset cfg to default").clicked() {
                            self.cfg = Config::default();
                        }
                    });
                });
            });
    }

    /// Builds the central panel where the particles are drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(BACKGROUND))
            .show(ctx, |ui| {
                let response = ui.allocate_response(ui.available_size(), egui::Sense::click());
                let rect = response.rect;

                self.sync_surface(rect, ctx.pixels_per_point());
                self.forward_pointer(&response);
                self.poll_asset(ctx);

                if self.frames.take_due() {
                    self.engine.tick();
                }

                let painter = ui.painter_at(rect);
                if let Some(buffer) = self.engine.surface() {
                    let textures = &self.textures;
                    let lookup = |id: ImageId| textures.get(&id).map(|t| t.id());
                    let shapes =
                        canvas::replay(buffer.commands(), self.surface_transform(rect), &lookup);
                    painter.extend(shapes);
                }

                if self.frames.is_pending() {
                    ctx.request_repaint();
                }
            });
    }
}

/// Decodes an image file into an egui texture.
fn load_texture(ctx: &egui::Context, path: &str) -> image::ImageResult<egui::TextureHandle> {
    let img = image::open(path)?.to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    let pixels = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
    Ok(ctx.load_texture(path, pixels, egui::TextureOptions::LINEAR))
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.engine.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particulate_core::config::ShapeSelection;
    use particulate_core::types::ShapeKind;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(20.0, 40.0), egui::vec2(400.0, 300.0))
    }

    fn small_config() -> Config {
        let mut cfg = Config::default();
        cfg.particles.number.value = 12;
        cfg.particles.number.density.enable = false;
        cfg
    }

    #[test]
    fn first_sync_sizes_and_starts_the_engine() {
        let mut viewer = Viewer::new(small_config(), Some(1)).unwrap();
        assert_eq!(viewer.engine.state(), EngineState::Idle);

        viewer.sync_surface(test_rect(), 1.0);

        assert_eq!(viewer.engine.state(), EngineState::Ready);
        assert_eq!(viewer.engine.surface_size(), SurfaceSize::new(400.0, 300.0));
        assert_eq!(viewer.engine.particles().len(), 12);
        assert!(viewer.frames.is_pending());
    }

    #[test]
    fn surface_transform_offsets_and_scales_for_retina() {
        let mut cfg = small_config();
        cfg.retina_detect = true;
        let mut viewer = Viewer::new(cfg, Some(1)).unwrap();
        viewer.sync_surface(test_rect(), 2.0);

        let t = viewer.surface_transform(test_rect());
        assert_eq!(t.transform_point2(Vec2::new(200.0, 100.0)), Vec2::new(120.0, 90.0));
        assert_eq!(viewer.engine.surface_size(), SurfaceSize::new(800.0, 600.0));
    }

    #[test]
    fn rejected_config_is_reported_and_engine_keeps_running() {
        let mut viewer = Viewer::new(small_config(), Some(1)).unwrap();
        viewer.sync_surface(test_rect(), 1.0);

        viewer.cfg.particles.line_linked.color = "#zz".into();
        viewer.apply_config();

        assert!(viewer.last_error.is_some());
        assert_eq!(viewer.engine.state(), EngineState::Ready);
        assert_eq!(viewer.engine.particles().len(), 12);
    }

    #[test]
    fn applied_config_restarts_the_engine() {
        let mut viewer = Viewer::new(small_config(), Some(1)).unwrap();
        viewer.sync_surface(test_rect(), 1.0);

        viewer.cfg.particles.number.value = 30;
        viewer.apply_config();

        assert!(viewer.last_error.is_none());
        assert_eq!(viewer.engine.particles().len(), 30);
    }

    #[test]
    fn restart_allows_the_asset_to_be_requested_again() {
        let mut cfg = small_config();
        cfg.particles.shape.kind = ShapeSelection::One(ShapeKind::Image);
        cfg.particles.shape.image.src = "missing.png".into();
        let mut viewer = Viewer::new(cfg, Some(1)).unwrap();
        viewer.sync_surface(test_rect(), 1.0);
        assert_eq!(viewer.engine.state(), EngineState::AwaitingAsset);

        viewer.asset_requested = true;
        viewer.restart();
        assert!(!viewer.asset_requested);
        assert_eq!(viewer.engine.state(), EngineState::AwaitingAsset);
    }

    #[test]
    fn reloaded_asset_replaces_the_previous_texture() {
        let mut cfg = small_config();
        cfg.particles.shape.kind = ShapeSelection::One(ShapeKind::Image);
        cfg.particles.shape.image.src = "dot.png".into();
        let mut viewer = Viewer::new(cfg, Some(1)).unwrap();
        viewer.sync_surface(test_rect(), 1.0);

        let ctx = egui::Context::default();
        let dot = |ctx: &egui::Context| {
            let pixels = egui::ColorImage::from_rgba_unmultiplied([1, 1], &[255, 255, 255, 255]);
            ctx.load_texture("dot", pixels, egui::TextureOptions::LINEAR)
        };

        viewer.install_asset(dot(&ctx));
        assert_eq!(viewer.textures.len(), 1);
        assert!(viewer.textures.contains_key(&ImageId(1)));

        viewer.restart();
        assert_eq!(viewer.engine.state(), EngineState::AwaitingAsset);
        viewer.install_asset(dot(&ctx));
        assert_eq!(viewer.textures.len(), 1);
        assert!(viewer.textures.contains_key(&ImageId(2)));
    }
}
