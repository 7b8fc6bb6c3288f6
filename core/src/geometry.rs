/// Clamps `value` to `[min, max]`. A degenerate range (`max < min`, which
/// happens when an item is larger than the canvas) collapses to `min`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if max < min {
        return min;
    }
    value.max(min).min(max)
}

/// Box test with the box anchored at its top-left corner. Boundaries are
/// exclusive, matching the canvas hit conventions used throughout.
pub fn point_in_box(px: f64, py: f64, x: f64, y: f64, width: f64, height: f64) -> bool {
    px > x && px < x + width && py > y && py < y + height
}

/// Box test with the box centered on `(cx, cy)`.
pub fn point_in_centered_box(px: f64, py: f64, cx: f64, cy: f64, width: f64, height: f64) -> bool {
    point_in_box(px, py, cx - width / 2.0, cy - height / 2.0, width, height)
}

/// Text measurement seam. The live editor measures through the drawing
/// surface; tests and non-canvas callers use [`MonospaceMeasure`].
pub trait MeasureText {
    fn text_width(&self, text: &str, font_size: f64) -> f64;
}

/// Fixed-advance approximation of text width: every character advances by
/// `advance * font_size` pixels. Deterministic, so geometry tests can
/// compute expected bounds exactly. Also serves as a fallback when the
/// drawing surface cannot measure.
#[derive(Clone, Copy, Debug)]
pub struct MonospaceMeasure {
    pub advance: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl MeasureText for MonospaceMeasure {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_orders_bounds() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-3.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(42.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn clamp_degenerate_range_collapses_to_min() {
        // canvas_width - width goes negative for oversized items
        assert_eq!(clamp(5.0, 0.0, -20.0), 0.0);
    }

    #[test]
    fn box_boundaries_are_exclusive() {
        assert!(point_in_box(5.0, 5.0, 0.0, 0.0, 10.0, 10.0));
        assert!(!point_in_box(0.0, 5.0, 0.0, 0.0, 10.0, 10.0));
        assert!(!point_in_box(10.0, 5.0, 0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn centered_box_is_symmetric_around_anchor() {
        assert!(point_in_centered_box(99.0, 101.0, 100.0, 100.0, 40.0, 20.0));
        assert!(!point_in_centered_box(121.0, 100.0, 100.0, 100.0, 40.0, 20.0));
        assert!(!point_in_centered_box(100.0, 111.0, 100.0, 100.0, 40.0, 20.0));
    }

    #[test]
    fn monospace_measure_scales_with_font_size() {
        let measure = MonospaceMeasure::default();
        assert_eq!(measure.text_width("Hello", 20.0), 60.0);
        assert_eq!(measure.text_width("", 20.0), 0.0);
        assert_eq!(measure.text_width("Hi", 10.0), 12.0);
    }
}
