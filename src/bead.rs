use crate::geometry::{clamp, Path, Point};

/// Bead layout along the string. All positions are progress values on the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeadConfig {
    /// Bead diameter in canvas units
    pub size: f64,
    /// Number of static beads queued at the far end of the string
    pub count: usize,
    /// Progress between neighbouring static beads
    pub spacing: f64,
    /// Where the active bead rests between gestures
    pub resting_start_t: f64,
    /// Backward floor a drag may reach
    pub reset_position_t: f64,
    /// Crossing this progress commits a count
    pub counting_threshold_t: f64,
    pub static_beads_start_t: f64,
}

impl Default for BeadConfig {
    fn default() -> Self {
        Self {
            size: 24.0,
            count: 4,
            spacing: 0.02,
            resting_start_t: 0.10,
            reset_position_t: 0.05,
            counting_threshold_t: 0.90,
            static_beads_start_t: 0.92,
        }
    }
}

impl BeadConfig {
    /// Pointer-down within this distance of the active bead grabs it
    pub fn capture_radius(&self) -> f64 {
        self.size * 1.5
    }

    /// Progress values of the static queued beads, clamped to the string
    pub fn static_bead_ts(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(move |i| clamp(self.static_beads_start_t + i as f64 * self.spacing, 0.0, 1.0))
    }

    pub fn static_bead_points(&self, path: &Path) -> Vec<Point> {
        self.static_bead_ts().map(|t| path.point(t)).collect()
    }
}
