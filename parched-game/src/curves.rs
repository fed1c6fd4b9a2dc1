//! Hunger buff curves mapping the hydration ratio onto a hunger-rate multiplier.
use serde::{Deserialize, Serialize};

/// Shape of the hunger-rate response to dehydration.
///
/// Every shape maps a thirst level `x = 1 - hydration/max` from `[0, 1]` onto
/// `[0, 1]`, is monotonic, and is scaled by the configured maximum buff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HungerBuffCurve {
    /// No hunger modifier at all.
    None,
    #[default]
    Linear,
    Quadratic,
    Cubic,
    Sqrt,
    Arctangent,
    /// Full buff once hydration drops below half, nothing above.
    Step,
}

impl HungerBuffCurve {
    fn shape(self, thirst: f32) -> f32 {
        let x = thirst.clamp(0.0, 1.0);
        match self {
            Self::None => 0.0,
            Self::Linear => x,
            Self::Quadratic => x * x,
            Self::Cubic => x * x * x,
            Self::Sqrt => x.sqrt(),
            Self::Arctangent => (4.0 * x).atan() / 4.0_f32.atan(),
            Self::Step => {
                if x > 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Hunger-rate multiplier for a hydration ratio in `[0, 1]`.
    #[must_use]
    pub fn hunger_modifier(self, ratio: f32, max_buff: f32) -> f32 {
        let ratio = if ratio.is_finite() { ratio } else { 0.0 };
        1.0 + max_buff * self.shape(1.0 - ratio)
    }
}

/// Pick the curve for the ratio and evaluate it.
///
/// The lower-half curve only applies strictly below a 0.5 ratio and only when
/// it is not [`HungerBuffCurve::None`].
#[must_use]
pub fn hunger_modifier(
    curve: HungerBuffCurve,
    lower_half: HungerBuffCurve,
    ratio: f32,
    max_buff: f32,
) -> f32 {
    if lower_half != HungerBuffCurve::None && ratio < 0.5 {
        lower_half.hunger_modifier(ratio, max_buff)
    } else {
        curve.hunger_modifier(ratio, max_buff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVES: [HungerBuffCurve; 6] = [
        HungerBuffCurve::Linear,
        HungerBuffCurve::Quadratic,
        HungerBuffCurve::Cubic,
        HungerBuffCurve::Sqrt,
        HungerBuffCurve::Arctangent,
        HungerBuffCurve::Step,
    ];

    #[test]
    fn curves_are_neutral_when_hydrated_and_full_when_empty() {
        for curve in CURVES {
            assert!((curve.hunger_modifier(1.0, 0.4) - 1.0).abs() < 1e-6, "{curve:?}");
            assert!((curve.hunger_modifier(0.0, 0.4) - 1.4).abs() < 1e-6, "{curve:?}");
        }
        assert!((HungerBuffCurve::None.hunger_modifier(0.0, 0.4) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn curves_are_monotonic_in_ratio() {
        for curve in CURVES {
            let samples: Vec<f32> = (0..=20)
                .map(|step| curve.hunger_modifier(step as f32 / 20.0, 0.5))
                .collect();
            assert!(
                samples.windows(2).all(|pair| pair[0] >= pair[1]),
                "{curve:?} not monotonic: {samples:?}"
            );
        }
    }

    #[test]
    fn lower_half_applies_only_below_half() {
        let above = hunger_modifier(HungerBuffCurve::Linear, HungerBuffCurve::Step, 0.5, 1.0);
        let below = hunger_modifier(HungerBuffCurve::Linear, HungerBuffCurve::Step, 0.49, 1.0);
        assert!((above - 1.5).abs() < 1e-6);
        assert!((below - 2.0).abs() < 1e-6);
        let ignored = hunger_modifier(HungerBuffCurve::Linear, HungerBuffCurve::None, 0.25, 1.0);
        assert!((ignored - 1.75).abs() < 1e-6);
    }
}
