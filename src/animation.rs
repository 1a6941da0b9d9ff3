//! Release animations for the active bead. Purely cosmetic: counting never
//! waits on these, they only decide where the bead is drawn.

use std::time::Duration;

pub const FADE_OUT_DURATION: Duration = Duration::from_millis(180);

/// Spring constant of the return motion (per second squared)
pub const SPRING_STIFFNESS: f64 = 220.0;
/// Hard cap so a pathological tick stream can't keep the bead bouncing
pub const SPRING_MAX_DURATION: Duration = Duration::from_millis(1500);

const SPRING_SETTLE_POSITION: f64 = 1e-3;
const SPRING_SETTLE_SPEED: f64 = 1e-2;
const SPRING_MAX_SUBSTEP: f64 = 1.0 / 240.0;

/// Opacity ramp from 1 to 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeOut {
    pub elapsed: Duration,
}

impl FadeOut {
    pub fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
        }
    }

    pub fn opacity(&self) -> f64 {
        let progress = self.elapsed.as_secs_f64() / FADE_OUT_DURATION.as_secs_f64();
        (1.0 - progress).clamp(0.0, 1.0)
    }

    /// Advance by `dt`; true once fully transparent
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.elapsed >= FADE_OUT_DURATION
    }
}

impl Default for FadeOut {
    fn default() -> Self {
        Self::new()
    }
}

/// Critically damped spring pulling a progress value toward `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringReturn {
    pub target: f64,
    pub velocity: f64,
    pub elapsed: Duration,
}

impl SpringReturn {
    pub fn new(target: f64) -> Self {
        Self {
            target,
            velocity: 0.0,
            elapsed: Duration::ZERO,
        }
    }

    /// Advance `position` by `dt`; true once settled at the target
    pub fn advance(&mut self, position: &mut f64, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);

        let damping = 2.0 * SPRING_STIFFNESS.sqrt();
        let mut remaining = dt.as_secs_f64();
        while remaining > 0.0 {
            let h = remaining.min(SPRING_MAX_SUBSTEP);
            let accel = -SPRING_STIFFNESS * (*position - self.target) - damping * self.velocity;
            self.velocity += accel * h;
            *position += self.velocity * h;
            remaining -= h;
        }

        let settled = (*position - self.target).abs() < SPRING_SETTLE_POSITION
            && self.velocity.abs() < SPRING_SETTLE_SPEED;
        if settled || self.elapsed >= SPRING_MAX_DURATION {
            *position = self.target;
            self.velocity = 0.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn test_fade_starts_opaque() {
        assert_eq!(FadeOut::new().opacity(), 1.0);
    }

    #[test]
    fn test_fade_reaches_zero() {
        let mut fade = FadeOut::new();
        let mut last = fade.opacity();
        let mut done = false;
        for _ in 0..100 {
            done = fade.advance(FRAME);
            assert!(fade.opacity() <= last);
            last = fade.opacity();
            if done {
                break;
            }
        }
        assert!(done);
        assert_eq!(fade.opacity(), 0.0);
    }

    #[test]
    fn test_spring_settles_at_target() {
        let mut spring = SpringReturn::new(0.1);
        let mut position = 0.6;
        let mut done = false;
        for _ in 0..200 {
            done = spring.advance(&mut position, FRAME);
            if done {
                break;
            }
        }
        assert!(done);
        assert_eq!(position, 0.1);
        assert!(spring.elapsed < SPRING_MAX_DURATION);
    }

    #[test]
    fn test_spring_does_not_overshoot_much() {
        let mut spring = SpringReturn::new(0.1);
        let mut position = 0.6;
        for _ in 0..200 {
            if spring.advance(&mut position, FRAME) {
                break;
            }
            assert!(position > 0.1 - 0.01, "overshoot to {position}");
        }
    }

    #[test]
    fn test_spring_capped_by_duration() {
        let mut spring = SpringReturn::new(0.0);
        let mut position = 1.0;
        // A single huge tick is integrated in substeps and then capped
        assert!(spring.advance(&mut position, Duration::from_secs(2)));
        assert_eq!(position, 0.0);
    }
}
