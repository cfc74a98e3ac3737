//! Easing curves for camera glides.

/// Easing curve applied to the normalized progress of a camera glide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    /// No easing.
    Linear,
    /// Fast start, slow end.
    QuadraticOut,
    /// Cubic Hermite with configurable control points,
    /// `c1*3t(1-t)^2 + c2*3(1-t)t^2 + t^3`.
    CubicHermite { c1: f32, c2: f32 },
}

impl Easing {
    /// Ease-out curve used for every animated waypoint.
    pub const DEFAULT: Easing = Easing::CubicHermite { c1: 0.33, c2: 1.0 };

    /// Evaluate the curve at `t`. Input is clamped to `[0, 1]` and the
    /// result stays in `[0, 1]`.
    #[inline]
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticOut => {
                let omt = 1.0 - t;
                1.0 - omt * omt
            }
            Easing::CubicHermite { c1, c2 } => {
                let omt = 1.0 - t;
                c1 * 3.0 * t * omt * omt + c2 * 3.0 * omt * t * t + t * t * t
            }
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact() {
        for easing in [Easing::Linear, Easing::QuadraticOut, Easing::DEFAULT] {
            assert_eq!(easing.evaluate(0.0), 0.0);
            assert!((easing.evaluate(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn default_curve_eases_out() {
        // Ease-out means early progress outruns linear time.
        assert!(Easing::DEFAULT.evaluate(0.25) > 0.25);
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(Easing::Linear.evaluate(-1.0), 0.0);
        assert_eq!(Easing::Linear.evaluate(2.0), 1.0);
    }
}
