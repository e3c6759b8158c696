//! Engine configuration.
//!
//! The tree mirrors the classic particles JSON layout (`particles.*`,
//! `interactivity.*`, `retina_detect`). Every struct is `#[serde(default)]`,
//! so a partial document only has to name what it changes.

use crate::{
    error::{Error, Result},
    types::{Color, Hsl, Rgb, ShapeKind},
};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub particles: ParticlesConfig,
    pub interactivity: InteractivityConfig,
    /// Scale the surface and distances by the device pixel ratio.
    pub retina_detect: bool,
}

impl Config {
    /// Parses a (possibly partial) JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Returns a copy with every length-like parameter multiplied by `ratio`.
    ///
    /// Always applied to the unscaled configuration, so scaling twice never
    /// compounds inside the engine.
    pub fn scaled(&self, ratio: f32) -> Self {
        let mut cfg = self.clone();
        cfg.particles.size.value *= ratio;
        cfg.particles.size.anim.speed *= ratio;
        cfg.particles.movement.speed *= ratio;
        cfg.particles.line_linked.distance *= ratio;
        cfg.particles.line_linked.width *= ratio;
        cfg.interactivity.modes.grab.distance *= ratio;
        cfg.interactivity.modes.bubble.distance *= ratio;
        cfg.interactivity.modes.bubble.size *= ratio;
        cfg.interactivity.modes.repulse.distance *= ratio;
        cfg
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticlesConfig {
    pub number: NumberConfig,
    pub color: ColorConfig,
    pub shape: ShapeConfig,
    pub opacity: OpacityConfig,
    pub size: SizeConfig,
    pub line_linked: LineLinkedConfig,
    #[serde(rename = "move")]
    pub movement: MoveConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberConfig {
    /// Base particle count (also the count used at initialization).
    pub value: usize,
    pub density: DensityConfig,
}

impl Default for NumberConfig {
    fn default() -> Self {
        Self {
            value: 400,
            density: DensityConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub enable: bool,
    pub value_area: f32,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            enable: true,
            value_area: 800.0,
        }
    }
}

/// `particles.color`: the color description lives under `value`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub value: ColorSpec,
}

/// How particle colors are specified in the configuration document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Rgb(Rgb),
    Hsl(Hsl),
    /// One of these hex colors, picked per particle.
    Palette(Vec<String>),
    /// A hex color, or the literal `"random"`.
    Text(String),
}

impl Default for ColorSpec {
    fn default() -> Self {
        ColorSpec::Text("#fff".to_owned())
    }
}

impl ColorSpec {
    /// Validates the color description and turns it into a [`ColorSource`].
    pub fn resolve(&self) -> Result<ColorSource> {
        match self {
            ColorSpec::Rgb(rgb) => Ok(ColorSource::Fixed(Color::Rgb(*rgb))),
            ColorSpec::Hsl(hsl) => Ok(ColorSource::Fixed(Color::Hsl(*hsl))),
            ColorSpec::Palette(list) => {
                if list.is_empty() {
                    return Err(Error::InvalidColor("empty color palette".to_owned()));
                }
                let colors = list
                    .iter()
                    .map(|hex| Rgb::from_hex(hex).map(Color::Rgb))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ColorSource::Palette(colors))
            }
            ColorSpec::Text(text) if text == "random" => Ok(ColorSource::Random),
            ColorSpec::Text(hex) => Ok(ColorSource::Fixed(Color::Rgb(Rgb::from_hex(hex)?))),
        }
    }
}

/// A validated color choice, ready to hand out particle colors.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorSource {
    Fixed(Color),
    Palette(Vec<Color>),
    Random,
}

impl ColorSource {
    pub fn pick(&self, rng: &mut impl Rng) -> Color {
        match self {
            ColorSource::Fixed(color) => *color,
            ColorSource::Palette(colors) => colors[rng.random_range(0..colors.len())],
            ColorSource::Random => Color::Rgb(Rgb::random(rng)),
        }
    }
}

/// Either one shape for every particle, or a list to pick from at random.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeSelection {
    One(ShapeKind),
    Many(Vec<ShapeKind>),
}

impl ShapeSelection {
    pub fn pick(&self, rng: &mut impl Rng) -> ShapeKind {
        match self {
            ShapeSelection::One(kind) => *kind,
            ShapeSelection::Many(kinds) if kinds.is_empty() => ShapeKind::Circle,
            ShapeSelection::Many(kinds) => kinds[rng.random_range(0..kinds.len())],
        }
    }

    pub fn contains(&self, kind: ShapeKind) -> bool {
        match self {
            ShapeSelection::One(k) => *k == kind,
            ShapeSelection::Many(kinds) => kinds.contains(&kind),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    #[serde(rename = "type")]
    pub kind: ShapeSelection,
    pub stroke: StrokeConfig,
    pub polygon: PolygonConfig,
    pub image: ImageConfig,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            kind: ShapeSelection::One(ShapeKind::Circle),
            stroke: StrokeConfig::default(),
            polygon: PolygonConfig::default(),
            image: ImageConfig::default(),
        }
    }
}

impl ShapeConfig {
    /// Whether drawing has to wait for an image asset.
    pub fn requires_image(&self) -> bool {
        self.kind.contains(ShapeKind::Image)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeConfig {
    pub width: f32,
    pub color: String,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            width: 0.0,
            color: "#ff0000".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonConfig {
    /// Side count shared by the polygon and star shapes.
    pub nb_sides: u32,
}

impl Default for PolygonConfig {
    fn default() -> Self {
        Self { nb_sides: 5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            src: String::new(),
            width: 100.0,
            height: 100.0,
        }
    }
}

impl ImageConfig {
    /// Width over height, or `1.0` when that is not a usable number.
    pub fn ratio(&self) -> f32 {
        let ratio = self.width / self.height;
        if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            1.0
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpacityConfig {
    pub value: f32,
    pub random: bool,
    pub anim: OpacityAnim,
}

impl Default for OpacityConfig {
    fn default() -> Self {
        Self {
            value: 1.0,
            random: false,
            anim: OpacityAnim::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpacityAnim {
    pub enable: bool,
    pub speed: f32,
    pub opacity_min: f32,
    pub sync: bool,
}

impl Default for OpacityAnim {
    fn default() -> Self {
        Self {
            enable: false,
            speed: 2.0,
            opacity_min: 0.0,
            sync: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeConfig {
    pub value: f32,
    pub random: bool,
    pub anim: SizeAnim,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            value: 20.0,
            random: false,
            anim: SizeAnim::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeAnim {
    pub enable: bool,
    pub speed: f32,
    pub size_min: f32,
    pub sync: bool,
}

impl Default for SizeAnim {
    fn default() -> Self {
        Self {
            enable: false,
            speed: 20.0,
            size_min: 0.0,
            sync: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineLinkedConfig {
    pub enable: bool,
    pub distance: f32,
    pub color: String,
    pub opacity: f32,
    pub width: f32,
}

impl Default for LineLinkedConfig {
    fn default() -> Self {
        Self {
            enable: true,
            distance: 100.0,
            color: "#fff".to_owned(),
            opacity: 1.0,
            width: 1.0,
        }
    }
}

/// Base direction of the initial particle velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    None,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    TopLeft,
}

impl Direction {
    pub fn base_velocity(self) -> Vec2 {
        match self {
            Direction::None => Vec2::ZERO,
            Direction::Top => Vec2::new(0.0, -1.0),
            Direction::TopRight => Vec2::new(0.5, -0.5),
            Direction::Right => Vec2::new(1.0, 0.0),
            Direction::BottomRight => Vec2::new(0.5, 0.5),
            Direction::Bottom => Vec2::new(0.0, 1.0),
            Direction::BottomLeft => Vec2::new(-0.5, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::TopLeft => Vec2::new(-0.5, -0.5),
        }
    }
}

/// What happens when a particle reaches the surface edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutMode {
    /// Leave through one edge, re-enter through the opposite one.
    #[default]
    #[serde(rename = "out", alias = "wrap")]
    Wrap,
    #[serde(rename = "bounce")]
    Bounce,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveConfig {
    pub enable: bool,
    pub speed: f32,
    pub direction: Direction,
    pub random: bool,
    pub straight: bool,
    pub out_mode: OutMode,
    /// Particles bounce off each other on contact.
    pub bounce: bool,
    pub attract: AttractConfig,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            enable: true,
            speed: 2.0,
            direction: Direction::None,
            random: false,
            straight: false,
            out_mode: OutMode::Wrap,
            bounce: false,
            attract: AttractConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttractConfig {
    pub enable: bool,
    #[serde(rename = "rotateX")]
    pub rotate_x: f32,
    #[serde(rename = "rotateY")]
    pub rotate_y: f32,
}

impl Default for AttractConfig {
    fn default() -> Self {
        Self {
            enable: false,
            rotate_x: 3000.0,
            rotate_y: 3000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    Grab,
    Bubble,
    Repulse,
    Push,
    Remove,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractivityConfig {
    pub events: EventsConfig,
    pub modes: ModesConfig,
}

impl InteractivityConfig {
    pub fn hover_is(&self, mode: InteractionMode) -> bool {
        self.events.onhover.enable && self.events.onhover.mode == mode
    }

    pub fn click_is(&self, mode: InteractionMode) -> bool {
        self.events.onclick.enable && self.events.onclick.mode == mode
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub onhover: EventConfig,
    pub onclick: EventConfig,
    pub resize: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            onhover: EventConfig {
                enable: true,
                mode: InteractionMode::Grab,
            },
            onclick: EventConfig {
                enable: true,
                mode: InteractionMode::Push,
            },
            resize: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    pub enable: bool,
    pub mode: InteractionMode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModesConfig {
    pub grab: GrabMode,
    pub bubble: BubbleMode,
    pub repulse: RepulseMode,
    pub push: CountMode,
    pub remove: CountMode,
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            grab: GrabMode::default(),
            bubble: BubbleMode::default(),
            repulse: RepulseMode::default(),
            push: CountMode { particles_nb: 4 },
            remove: CountMode { particles_nb: 2 },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabMode {
    pub distance: f32,
    pub line_linked: GrabLine,
}

impl Default for GrabMode {
    fn default() -> Self {
        Self {
            distance: 100.0,
            line_linked: GrabLine::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabLine {
    pub opacity: f32,
}

impl Default for GrabLine {
    fn default() -> Self {
        Self { opacity: 1.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleMode {
    pub distance: f32,
    /// Target radius.
    pub size: f32,
    /// Seconds.
    pub duration: f32,
    /// Target opacity; opacity is left alone when unset.
    pub opacity: Option<f32>,
}

impl Default for BubbleMode {
    fn default() -> Self {
        Self {
            distance: 200.0,
            size: 80.0,
            duration: 0.4,
            opacity: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepulseMode {
    pub distance: f32,
    /// Seconds.
    pub duration: f32,
}

impl Default for RepulseMode {
    fn default() -> Self {
        Self {
            distance: 200.0,
            duration: 0.4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountMode {
    pub particles_nb: usize,
}

impl Default for CountMode {
    fn default() -> Self {
        Self { particles_nb: 4 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn partial_document_keeps_defaults() {
        let cfg = Config::from_json_str(
            r#"{
                "particles": {
                    "number": { "value": 80 },
                    "move": { "out_mode": "bounce", "attract": { "rotateX": 600 } }
                },
                "interactivity": { "events": { "onhover": { "enable": true, "mode": "repulse" } } }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.particles.number.value, 80);
        assert_eq!(cfg.particles.number.density.value_area, 800.0);
        assert_eq!(cfg.particles.movement.out_mode, OutMode::Bounce);
        assert_eq!(cfg.particles.movement.attract.rotate_x, 600.0);
        assert_eq!(cfg.particles.movement.attract.rotate_y, 3000.0);
        assert_eq!(cfg.particles.movement.speed, 2.0);
        assert!(cfg.interactivity.hover_is(InteractionMode::Repulse));
        assert!(cfg.interactivity.click_is(InteractionMode::Push));
        assert_eq!(cfg.interactivity.modes.push.particles_nb, 4);
        assert_eq!(cfg.interactivity.modes.remove.particles_nb, 2);
    }

    #[test]
    fn out_mode_accepts_wrap_alias() {
        let cfg = Config::from_json_str(r#"{ "particles": { "move": { "out_mode": "wrap" } } }"#)
            .unwrap();
        assert_eq!(cfg.particles.movement.out_mode, OutMode::Wrap);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = Config::from_json_str("{ \"particles\": 3 }").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn color_specs_resolve() {
        let mut rng = StdRng::seed_from_u64(7);

        let fixed = ColorSpec::Text("#ff0000".into()).resolve().unwrap();
        assert_eq!(
            fixed.pick(&mut rng),
            Color::Rgb(Rgb { r: 255, g: 0, b: 0 })
        );

        let palette = ColorSpec::Palette(vec!["#000".into(), "#fff".into()])
            .resolve()
            .unwrap();
        for _ in 0..16 {
            let Color::Rgb(rgb) = palette.pick(&mut rng) else {
                panic!("palette colors are rgb");
            };
            assert!(rgb == Rgb::WHITE || rgb == Rgb { r: 0, g: 0, b: 0 });
        }

        assert_eq!(
            ColorSpec::Text("random".into()).resolve().unwrap(),
            ColorSource::Random
        );

        let hsl: ColorSpec = serde_json::from_str(r#"{ "h": 200, "s": 50, "l": 40 }"#).unwrap();
        assert!(matches!(
            hsl.resolve().unwrap(),
            ColorSource::Fixed(Color::Hsl(_))
        ));
    }

    #[test]
    fn particle_color_is_read_from_value() {
        let cfg = Config::from_json_str(r##"{ "particles": { "color": { "value": "#ff0000" } } }"##)
            .unwrap();
        assert_eq!(cfg.particles.color.value, ColorSpec::Text("#ff0000".into()));

        let cfg = Config::from_json_str(
            r##"{ "particles": { "color": { "value": ["#000", "#fff"] } } }"##,
        )
        .unwrap();
        assert!(matches!(
            cfg.particles.color.value.resolve().unwrap(),
            ColorSource::Palette(ref colors) if colors.len() == 2
        ));

        let cfg = Config::from_json_str(r#"{ "particles": { "color": {} } }"#).unwrap();
        assert_eq!(cfg.particles.color, ColorConfig::default());
    }

    #[test]
    fn invalid_colors_are_rejected() {
        assert!(ColorSpec::Text("nope".into()).resolve().is_err());
        assert!(ColorSpec::Palette(vec![]).resolve().is_err());
        assert!(
            ColorSpec::Palette(vec!["#fff".into(), "#zzz".into()])
                .resolve()
                .is_err()
        );
    }

    #[test]
    fn scaled_multiplies_lengths_only() {
        let base = Config::default();
        let scaled = base.scaled(2.0);

        assert_eq!(scaled.particles.size.value, 40.0);
        assert_eq!(scaled.particles.movement.speed, 4.0);
        assert_eq!(scaled.particles.line_linked.distance, 200.0);
        assert_eq!(scaled.interactivity.modes.repulse.distance, 400.0);
        assert_eq!(scaled.interactivity.modes.bubble.size, 160.0);
        // Counts and durations are not lengths.
        assert_eq!(scaled.particles.number.value, 400);
        assert_eq!(scaled.interactivity.modes.bubble.duration, 0.4);
    }

    #[test]
    fn image_ratio_falls_back_to_one() {
        let mut image = ImageConfig::default();
        assert_eq!(image.ratio(), 1.0);
        image.width = 200.0;
        assert_eq!(image.ratio(), 2.0);
        image.height = 0.0;
        assert_eq!(image.ratio(), 1.0);
    }

    #[test]
    fn shape_selection_picks_from_list() {
        let mut rng = StdRng::seed_from_u64(1);
        let sel: ShapeSelection = serde_json::from_str(r#"["star", "triangle"]"#).unwrap();
        for _ in 0..8 {
            let kind = sel.pick(&mut rng);
            assert!(kind == ShapeKind::Star || kind == ShapeKind::Triangle);
        }
        assert!(!sel.contains(ShapeKind::Image));
        assert!(ShapeSelection::One(ShapeKind::Image).contains(ShapeKind::Image));
    }
}
