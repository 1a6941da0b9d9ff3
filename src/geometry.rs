//! Fixed 2D string the beads travel along.
//!
//! A [`Path`] is a chain of cubic Bézier segments with a precomputed
//! arc-length sample table. `t ∈ [0, 1]` is the fraction of total length
//! travelled from the first segment's start point.

use crate::error::{Result, TasbeehError};
use crate::util::{self, golden_section_min};

/// Width of the canvas the default string is laid out in.
pub const CANVAS_WIDTH: f64 = 400.0;
/// Height of the canvas the default string is laid out in. Y grows downward.
pub const CANVAS_HEIGHT: f64 = 600.0;
/// Number of samples in the default string's lookup table.
pub const DEFAULT_SAMPLE_COUNT: usize = 1024;

const REFINE_ITERATIONS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// One cubic Bézier piece of the string
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl CubicSegment {
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Evaluate at local parameter `u ∈ [0, 1]`
    pub fn eval(&self, u: f64) -> Point {
        let u = util::clamp(u, 0.0, 1.0);
        let v = 1.0 - u;
        let a = v * v * v;
        let b = 3.0 * v * v * u;
        let c = 3.0 * v * u * u;
        let d = u * u * u;
        Point::new(
            a * self.p0.x + b * self.p1.x + c * self.p2.x + d * self.p3.x,
            a * self.p0.y + b * self.p1.y + c * self.p2.y + d * self.p3.y,
        )
    }

    /// First derivative with respect to `u`
    pub fn derivative(&self, u: f64) -> Point {
        let u = util::clamp(u, 0.0, 1.0);
        let v = 1.0 - u;
        let a = 3.0 * v * v;
        let b = 6.0 * v * u;
        let c = 3.0 * u * u;
        Point::new(
            a * (self.p1.x - self.p0.x) + b * (self.p2.x - self.p1.x) + c * (self.p3.x - self.p2.x),
            a * (self.p1.y - self.p0.y) + b * (self.p2.y - self.p1.y) + c * (self.p3.y - self.p2.y),
        )
    }
}

/// Relative to the largest control-point coordinate
const ZERO_LENGTH_TOLERANCE: f64 = 1e-9;

fn control_scale(segments: &[CubicSegment]) -> f64 {
    segments
        .iter()
        .flat_map(|s| [s.p0, s.p1, s.p2, s.p3])
        .flat_map(|p| [p.x.abs(), p.y.abs()])
        .fold(0.0, f64::max)
}

/// Entry of the arc-length lookup table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub segment: usize,
    pub u: f64,
    pub point: Point,
}

/// Immutable string geometry. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Path {
    segments: Vec<CubicSegment>,
    samples: Vec<Sample>,
    length: f64,
}

impl Path {
    /// Build a path from connected segments, with roughly `sample_count`
    /// lookup entries spread over the whole length.
    pub fn new(segments: Vec<CubicSegment>, sample_count: usize) -> Result<Self> {
        if segments.is_empty() {
            return Err(TasbeehError::InvalidPath("no segments".into()));
        }
        if sample_count == 0 {
            return Err(TasbeehError::InvalidPath("sample count must be positive".into()));
        }
        if segments
            .iter()
            .any(|s| !(s.p0.is_finite() && s.p1.is_finite() && s.p2.is_finite() && s.p3.is_finite()))
        {
            return Err(TasbeehError::InvalidPath("non-finite control point".into()));
        }

        let steps = (sample_count / segments.len()).max(1);
        let mut samples = Vec::with_capacity(steps * segments.len() + 1);
        let mut cumulative = Vec::with_capacity(steps * segments.len() + 1);
        let mut length = 0.0;
        let mut previous: Option<Point> = None;

        for (index, segment) in segments.iter().enumerate() {
            // The start of every later segment coincides with the previous end
            let first = if index == 0 { 0 } else { 1 };
            for step in first..=steps {
                let u = step as f64 / steps as f64;
                let point = segment.eval(u);
                if let Some(prev) = previous {
                    length += prev.distance(point);
                }
                previous = Some(point);
                cumulative.push(length);
                samples.push(Sample {
                    t: 0.0,
                    segment: index,
                    u,
                    point,
                });
            }
        }

        // Coincident control points still leave rounding residue in `length`
        if length <= ZERO_LENGTH_TOLERANCE * control_scale(&segments).max(1.0) {
            return Err(TasbeehError::InvalidPath("path has zero length".into()));
        }

        for (sample, travelled) in samples.iter_mut().zip(cumulative) {
            sample.t = travelled / length;
        }
        if let Some(last) = samples.last_mut() {
            last.t = 1.0;
        }

        Ok(Self {
            segments,
            samples,
            length,
        })
    }

    /// The default hanging string: left side down, an arc along the bottom,
    /// right side back up.
    pub fn tasbeeh_string() -> Self {
        let segments = vec![
            CubicSegment::new(
                Point::new(80.0, 60.0),
                Point::new(40.0, 240.0),
                Point::new(40.0, 400.0),
                Point::new(120.0, 500.0),
            ),
            CubicSegment::new(
                Point::new(120.0, 500.0),
                Point::new(170.0, 562.5),
                Point::new(230.0, 562.5),
                Point::new(280.0, 500.0),
            ),
            CubicSegment::new(
                Point::new(280.0, 500.0),
                Point::new(360.0, 400.0),
                Point::new(360.0, 240.0),
                Point::new(320.0, 60.0),
            ),
        ];

        // The control points above are fixed and finite, so construction cannot fail.
        match Self::new(segments, DEFAULT_SAMPLE_COUNT) {
            Ok(path) => path,
            Err(e) => unreachable!("default string is well formed: {e}"),
        }
    }

    pub fn segments(&self) -> &[CubicSegment] {
        &self.segments
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Approximate arc length in canvas units
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn start(&self) -> Point {
        self.samples[0].point
    }

    pub fn end(&self) -> Point {
        self.samples[self.samples.len() - 1].point
    }

    /// Position on the string at progress `t`. Out-of-range `t` is clamped.
    pub fn point(&self, t: f64) -> Point {
        let t = clamp(t, 0.0, 1.0);

        // First sample whose t is >= the query
        let upper = self.samples.partition_point(|s| s.t < t);
        if upper == 0 {
            return self.samples[0].point;
        }
        if upper >= self.samples.len() {
            return self.end();
        }

        let a = self.samples[upper - 1];
        let b = self.samples[upper];
        let span = b.t - a.t;
        let frac = if span > 0.0 { (t - a.t) / span } else { 0.0 };

        let (segment, u0) = if a.segment == b.segment {
            (a.segment, a.u)
        } else {
            (b.segment, 0.0)
        };
        self.segments[segment].eval(util::lerp(u0, b.u, frac))
    }

    /// Approximate inverse of [`Path::point`]: the progress whose point is
    /// nearest to `(x, y)`. Non-finite coordinates map to 0.
    pub fn closest_t(&self, x: f64, y: f64) -> f64 {
        let target = Point::new(x, y);
        if !target.is_finite() {
            return 0.0;
        }

        let (nearest, nearest_dist) = self
            .samples
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.point.distance_sq(target)))
            .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });

        let lo = self.samples[nearest.saturating_sub(1)].t;
        let hi = self.samples[(nearest + 1).min(self.samples.len() - 1)].t;
        if hi <= lo {
            return self.samples[nearest].t;
        }

        let refined = golden_section_min(lo, hi, REFINE_ITERATIONS, |t| {
            self.point(t).distance_sq(target)
        });

        if self.point(refined).distance_sq(target) <= nearest_dist {
            refined
        } else {
            self.samples[nearest].t
        }
    }

    /// `n` evenly spaced points along the string, for drawing
    pub fn polyline(&self, n: usize) -> Vec<Point> {
        match n {
            0 => Vec::new(),
            1 => vec![self.point(0.0)],
            _ => (0..n)
                .map(|i| self.point(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

/// Pure clamp on the progress axis. NaN maps to `lo`.
pub fn clamp(t: f64, lo: f64, hi: f64) -> f64 {
    util::clamp(t, lo, hi)
}
