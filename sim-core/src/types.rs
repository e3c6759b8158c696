//! Small value types shared across the engine: surface size, colors and
//! particle shapes.

use crate::error::{Error, Result};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Size of the drawing surface in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// A uniformly random point on the surface.
    pub fn random_point(self, rng: &mut impl Rng) -> Vec2 {
        Vec2::new(
            rng.random::<f32>() * self.width,
            rng.random::<f32>() * self.height,
        )
    }
}

/// An 8-bit RGB triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Parses a `#rgb` or `#rrggbb` hex string (the leading `#` is optional).
    ///
    /// ### Errors
    /// Returns [`Error::InvalidColor`] for anything that is not 3 or 6 hex digits.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(hex.to_owned()));
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_owned(),
            _ => return Err(Error::InvalidColor(hex.to_owned())),
        };

        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| Error::InvalidColor(hex.to_owned()))
        };

        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            r: rng.random(),
            g: rng.random(),
            b: rng.random(),
        }
    }
}

/// Hue in degrees, saturation and lightness in percent (CSS `hsl()` units).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    /// Converts to RGB using the standard CSS algorithm.
    pub fn to_rgb(self) -> Rgb {
        let h = self.h.rem_euclid(360.0) / 360.0;
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Rgb { r: v, g: v, b: v };
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        let hue = |mut t: f32| {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round() as u8
        };

        Rgb {
            r: hue(h + 1.0 / 3.0),
            g: hue(h),
            b: hue(h - 1.0 / 3.0),
        }
    }
}

/// A particle color, resolved once when the particle is created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Color {
    Rgb(Rgb),
    Hsl(Hsl),
}

impl Color {
    pub fn to_rgb(self) -> Rgb {
        match self {
            Color::Rgb(rgb) => rgb,
            Color::Hsl(hsl) => hsl.to_rgb(),
        }
    }
}

/// The closed set of shapes a particle can be drawn as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    /// An axis-aligned square.
    Edge,
    Triangle,
    Polygon,
    Star,
    Image,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_accepts_long_and_short_forms() {
        assert_eq!(
            Rgb::from_hex("#ff8000").unwrap(),
            Rgb {
                r: 255,
                g: 128,
                b: 0
            }
        );
        assert_eq!(Rgb::from_hex("fff").unwrap(), Rgb::WHITE);
        assert_eq!(
            Rgb::from_hex("#03F").unwrap(),
            Rgb {
                r: 0x00,
                g: 0x33,
                b: 0xff
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        for bad in ["", "#12", "#12345", "#gggggg", "#ééé", "white"] {
            assert!(
                matches!(Rgb::from_hex(bad), Err(Error::InvalidColor(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn hsl_primaries_convert_to_rgb() {
        let red = Hsl {
            h: 0.0,
            s: 100.0,
            l: 50.0,
        };
        assert_eq!(red.to_rgb(), Rgb { r: 255, g: 0, b: 0 });

        let blue = Hsl {
            h: 240.0,
            s: 100.0,
            l: 50.0,
        };
        assert_eq!(blue.to_rgb(), Rgb { r: 0, g: 0, b: 255 });

        let grey = Hsl {
            h: 123.0,
            s: 0.0,
            l: 50.0,
        };
        assert_eq!(
            grey.to_rgb(),
            Rgb {
                r: 128,
                g: 128,
                b: 128
            }
        );
    }

    #[test]
    fn shape_kind_uses_lowercase_names() {
        let kind: ShapeKind = serde_json::from_str("\"edge\"").unwrap();
        assert_eq!(kind, ShapeKind::Edge);
    }
}
