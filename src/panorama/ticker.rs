//! Triangle-wave oscillator driving the global scroll offset.

/// Scroll offsets oscillate within `[-SCROLL_BOUND, SCROLL_BOUND]`.
pub const SCROLL_BOUND: f32 = 480.0;

/// Advances a scroll offset by a signed velocity each tick, bouncing off the
/// bounds to produce a triangle wave. The value is clamped on overshoot before
/// the direction flips, so it never leaves the bounded range regardless of
/// velocity magnitude.
#[derive(Debug, Clone, Copy)]
pub struct ScrollTicker {
    value: f32,
    velocity: f32,
    bound: f32,
}

impl ScrollTicker {
    pub fn new(velocity: f32) -> Self {
        Self {
            value: 0.0,
            velocity,
            bound: SCROLL_BOUND,
        }
    }

    /// Advance one tick and return the new offset.
    pub fn tick(&mut self) -> f32 {
        self.value += self.velocity;
        if self.value.abs() >= self.bound {
            self.value = self.value.clamp(-self.bound, self.bound);
            self.velocity = -self.velocity;
        }
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Jump the offset directly (panel scrubbing). Clamped to the bounds.
    pub fn set_value(&mut self, value: f32) {
        self.value = value.clamp(-self.bound, self.bound);
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Replace the per-tick step, sign included. Subsequent bounces keep
    /// flipping the stored value as usual.
    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advances_by_velocity() {
        let mut ticker = ScrollTicker::new(10.0);
        assert_eq!(ticker.tick(), 10.0);
        assert_eq!(ticker.tick(), 20.0);
    }

    #[test]
    fn test_reverses_at_bound() {
        let mut ticker = ScrollTicker::new(100.0);
        ticker.set_value(450.0);
        assert_eq!(ticker.tick(), SCROLL_BOUND);
        assert!(ticker.velocity() < 0.0);
        assert_eq!(ticker.tick(), SCROLL_BOUND - 100.0);
    }

    #[test]
    fn test_stays_bounded_for_large_velocities() {
        let mut ticker = ScrollTicker::new(333.0);
        for _ in 0..10_000 {
            let value = ticker.tick();
            assert!(value.abs() <= SCROLL_BOUND, "offset escaped: {value}");
        }
    }

    #[test]
    fn test_triangle_wave_shape() {
        let mut ticker = ScrollTicker::new(240.0);
        let wave: Vec<f32> = (0..8).map(|_| ticker.tick()).collect();
        assert_eq!(
            wave,
            vec![240.0, 480.0, 240.0, 0.0, -240.0, -480.0, -240.0, 0.0]
        );
    }

    #[test]
    fn test_negative_velocity_travels_negative() {
        let mut ticker = ScrollTicker::new(-10.0);
        assert_eq!(ticker.tick(), -10.0);
        assert_eq!(ticker.tick(), -20.0);
        // Bounces off the negative bound back toward positive.
        ticker.set_value(-470.0);
        assert_eq!(ticker.tick(), -SCROLL_BOUND);
        assert!(ticker.velocity() > 0.0);
    }

    #[test]
    fn test_set_velocity_reverses_direction() {
        let mut ticker = ScrollTicker::new(100.0);
        ticker.set_velocity(-25.0);
        assert_eq!(ticker.tick(), -25.0);
        assert_eq!(ticker.velocity(), -25.0);
    }

    #[test]
    fn test_set_value_clamps() {
        let mut ticker = ScrollTicker::new(1.0);
        ticker.set_value(9000.0);
        assert_eq!(ticker.value(), SCROLL_BOUND);
    }
}
