/// Axis-aligned box in normalized (0..1) image coordinates.
///
/// Always satisfies `0 <= left <= right <= 1` and `0 <= top <= bottom <= 1`;
/// [`NormalizedBox::new`] clamps and reorders its inputs to keep that true.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl NormalizedBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        let (left, right) = ordered(clamp_unit(left), clamp_unit(right));
        let (top, bottom) = ordered(clamp_unit(top), clamp_unit(bottom));
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from center form `(cx, cy, w, h)`.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    /// Box centered in the frame covering `fraction` of each axis.
    pub fn centered(fraction: f32) -> Self {
        let fraction = clamp_unit(fraction);
        Self::from_center(0.5, 0.5, fraction, fraction)
    }

    /// The whole frame.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// NaN collapses to 0 so a bad model output cannot poison later geometry.
fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}
