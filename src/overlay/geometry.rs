//! Overlay Geometry
//!
//! Pure placement math for invisible text runs. Page units equal source
//! pixels; the page origin is bottom-left while detection boxes are
//! top-left, so anchors are axis-flipped here.

/// Page-space anchor for a detection box.
///
/// The text baseline sits at the bottom edge of the detected box:
/// `(x1, page_height - y2)`.
pub fn anchor(page_height: f64, x1: f64, y2: f64) -> (f64, f64) {
    (x1, page_height - y2)
}

/// Font size from box height: `clamp(bh * k, min_pt, max_pt)`.
///
/// OCR boxes are tighter than full font ascent plus descent, so a fixed
/// fraction of the box height approximates cap height.
pub fn font_size(box_height: f64, k: f64, min_pt: f64, max_pt: f64) -> f64 {
    (box_height * k).clamp(min_pt, max_pt)
}

/// Horizontal scale percent making the run's rendered width match the box.
///
/// Returns `None` when the natural width is non-positive (nothing to fit
/// against). The result is clamped to `[min_pct, max_pct]`.
pub fn horizontal_scale(
    box_width: f64,
    natural_width: f64,
    min_pct: f64,
    max_pct: f64,
) -> Option<f64> {
    if natural_width <= 0.0 || !natural_width.is_finite() {
        return None;
    }
    Some((box_width / natural_width * 100.0).clamp(min_pct, max_pct))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_flips_to_bottom_left_origin() {
        // Box (10,20,110,40) on a 200x300 page anchors at (10, 260)
        assert_eq!(anchor(300.0, 10.0, 40.0), (10.0, 260.0));
    }

    #[test]
    fn font_size_scales_and_clamps() {
        assert_eq!(font_size(20.0, 0.75, 6.0, 72.0), 15.0);
        assert_eq!(font_size(2.0, 0.75, 6.0, 72.0), 6.0);
        assert_eq!(font_size(500.0, 0.75, 6.0, 72.0), 72.0);
    }

    #[test]
    fn horizontal_scale_fits_box_width() {
        let s = horizontal_scale(100.0, 50.0, 50.0, 200.0).unwrap();
        assert_eq!(s, 200.0);
        let s = horizontal_scale(50.0, 50.0, 50.0, 200.0).unwrap();
        assert_eq!(s, 100.0);
    }

    #[test]
    fn horizontal_scale_stays_within_bounds() {
        for (bw, nw) in [(1.0, 1000.0), (1000.0, 1.0), (3.0, 7.0), (7.0, 3.0)] {
            let s = horizontal_scale(bw, nw, 50.0, 200.0).unwrap();
            assert!((50.0..=200.0).contains(&s), "scale {} out of bounds", s);
        }
    }

    #[test]
    fn horizontal_scale_rejects_zero_natural_width() {
        assert_eq!(horizontal_scale(100.0, 0.0, 50.0, 200.0), None);
        assert_eq!(horizontal_scale(100.0, -5.0, 50.0, 200.0), None);
    }

    #[test]
    fn placement_is_pure() {
        let a = (
            anchor(300.0, 10.0, 40.0),
            font_size(20.0, 0.75, 6.0, 72.0),
            horizontal_scale(100.0, 80.0, 50.0, 200.0),
        );
        let b = (
            anchor(300.0, 10.0, 40.0),
            font_size(20.0, 0.75, 6.0, 72.0),
            horizontal_scale(100.0, 80.0, 50.0, 200.0),
        );
        assert_eq!(a, b);
    }
}
