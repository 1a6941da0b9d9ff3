/// Golden ratio conjugate, (sqrt(5) - 1) / 2
const INV_PHI: f64 = 0.618_033_988_749_894_9;

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Clamp that maps NaN to `lo` instead of propagating it.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.max(lo).min(hi)
    }
}

/// Minimise a unimodal function on `[lo, hi]` with golden-section search.
/// Returns the abscissa of the best point found after `iterations` steps.
pub fn golden_section_min<F>(mut lo: f64, mut hi: f64, iterations: usize, f: F) -> f64
where
    F: Fn(f64) -> f64,
{
    if hi < lo {
        std::mem::swap(&mut lo, &mut hi);
    }

    let mut c = hi - INV_PHI * (hi - lo);
    let mut d = lo + INV_PHI * (hi - lo);
    let mut fc = f(c);
    let mut fd = f(d);

    for _ in 0..iterations {
        if fc < fd {
            hi = d;
            d = c;
            fd = fc;
            c = hi - INV_PHI * (hi - lo);
            fc = f(c);
        } else {
            lo = c;
            c = d;
            fc = fd;
            d = lo + INV_PHI * (hi - lo);
            fd = f(d);
        }
    }

    if fc < fd {
        c
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
    }

    #[test]
    fn test_clamp_within_range() {
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }

    #[test]
    fn test_clamp_out_of_range() {
        assert_eq!(clamp(-3.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(7.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_nan_goes_low() {
        assert_eq!(clamp(f64::NAN, 0.25, 1.0), 0.25);
    }

    #[test]
    fn test_golden_section_parabola() {
        let x = golden_section_min(-5.0, 5.0, 60, |x| (x - 1.25) * (x - 1.25));
        assert!((x - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_golden_section_swapped_bounds() {
        let x = golden_section_min(3.0, 0.0, 60, |x| (x - 2.0).abs());
        assert!((x - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_golden_section_minimum_at_edge() {
        let x = golden_section_min(0.0, 1.0, 60, |x| x);
        assert!(x < 1e-6);
    }
}
