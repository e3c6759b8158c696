//! Population-density regulation.
//!
//! The regulator only computes how many particles to add or drop; the
//! engine applies the change with its regular push and remove operations.

use crate::{config::NumberConfig, types::SurfaceSize};

/// Change needed to bring the population to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DensityAdjustment {
    Push(usize),
    Remove(usize),
}

/// Number of particles the surface should hold.
///
/// `retina_ratio` is the device pixel ratio when high-density scaling is
/// active; the area is then divided by twice that ratio.
pub fn target_count(surface: SurfaceSize, number: &NumberConfig, retina_ratio: Option<f32>) -> f32 {
    let mut area = surface.width * surface.height / 1000.0;
    if let Some(ratio) = retina_ratio {
        area /= ratio * 2.0;
    }
    area * number.value as f32 / number.density.value_area
}

/// Adjustment moving `current` towards the density target.
///
/// Fractional differences round down, so a single call never overshoots.
/// Returns `None` when density is disabled, unusable, or already met.
pub fn regulate(
    current: usize,
    surface: SurfaceSize,
    number: &NumberConfig,
    retina_ratio: Option<f32>,
) -> Option<DensityAdjustment> {
    if !number.density.enable || number.density.value_area <= 0.0 {
        return None;
    }

    let target = target_count(surface, number, retina_ratio);
    if !target.is_finite() {
        return None;
    }

    let missing = current as f32 - target;
    let count = missing.abs().floor() as usize;
    match count {
        0 => None,
        n if missing < 0.0 => Some(DensityAdjustment::Push(n)),
        n => Some(DensityAdjustment::Remove(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DensityConfig;

    fn number(value: usize, value_area: f32) -> NumberConfig {
        NumberConfig {
            value,
            density: DensityConfig {
                enable: true,
                value_area,
            },
        }
    }

    #[test]
    fn target_scales_with_area() {
        let surface = SurfaceSize::new(1000.0, 1000.0);
        assert_eq!(target_count(surface, &number(100, 800.0), None), 125.0);
    }

    #[test]
    fn retina_divides_area_by_twice_the_ratio() {
        let surface = SurfaceSize::new(2000.0, 2000.0);
        // 4000 / (2 * 2) = 1000 units of area.
        assert_eq!(target_count(surface, &number(100, 800.0), Some(2.0)), 125.0);
    }

    #[test]
    fn regulate_pushes_or_removes_the_exact_difference() {
        let surface = SurfaceSize::new(1000.0, 1000.0);
        let cfg = number(100, 800.0);

        assert_eq!(regulate(0, surface, &cfg, None), Some(DensityAdjustment::Push(125)));
        assert_eq!(regulate(100, surface, &cfg, None), Some(DensityAdjustment::Push(25)));
        assert_eq!(regulate(200, surface, &cfg, None), Some(DensityAdjustment::Remove(75)));
        assert_eq!(regulate(125, surface, &cfg, None), None);
    }

    #[test]
    fn regulate_never_overshoots_on_fractional_targets() {
        // 300 * 500 / 1000 = 150 area -> 150 * 10 / 800 = 1.875
        let surface = SurfaceSize::new(300.0, 500.0);
        let cfg = number(10, 800.0);

        assert_eq!(regulate(0, surface, &cfg, None), Some(DensityAdjustment::Push(1)));
        assert_eq!(regulate(1, surface, &cfg, None), None);
        assert_eq!(regulate(4, surface, &cfg, None), Some(DensityAdjustment::Remove(2)));
    }

    #[test]
    fn disabled_or_degenerate_density_does_nothing() {
        let surface = SurfaceSize::new(1000.0, 1000.0);

        let mut cfg = number(100, 800.0);
        cfg.density.enable = false;
        assert_eq!(regulate(0, surface, &cfg, None), None);

        assert_eq!(regulate(0, surface, &number(100, 0.0), None), None);
    }
}
