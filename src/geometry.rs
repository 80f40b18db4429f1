//! Axis-aligned bounding boxes and Intersection-over-Union.
//!
//! Boxes are stored as top-left origin plus size. The coordinate space is
//! up to the caller (normalized image fractions or pixels); IoU only needs
//! both boxes to share it.

/// Axis-aligned rectangle with a top-left origin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl BoundingBox {
    /// Creates a box from its top-left corner and size.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a box centered on `(cx, cy)`.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Creates a box from its corner coordinates `[x0, y0, x1, y1]`.
    pub fn from_xyxy(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Returns `[x0, y0, x1, y1]`.
    pub fn to_xyxy(&self) -> [f32; 4] {
        [self.x, self.y, self.x1(), self.y1()]
    }

    /// Right edge.
    #[inline]
    pub fn x1(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[inline]
    pub fn y1(&self) -> f32 {
        self.y + self.height
    }

    /// Center point `(cx, cy)`.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Area, or `0.0` when either side is non-positive or not finite.
    #[inline]
    pub fn area(&self) -> f32 {
        if self.is_degenerate() {
            0.0
        } else {
            self.width * self.height
        }
    }

    /// True when the box encloses no area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite())
    }

    /// Intersection-over-Union with `other`. See [`compute_iou`].
    #[inline]
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        compute_iou(self, other)
    }
}

/// Intersection-over-Union of two boxes, in `[0, 1]`.
///
/// Returns `0.0` if either box is degenerate or the boxes do not overlap.
pub fn compute_iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    if a.is_degenerate() || b.is_degenerate() {
        return 0.0;
    }
    // Areas come from the same edge differences as the intersection so that
    // identical boxes score exactly 1.
    let area_a = (a.x1() - a.x) * (a.y1() - a.y);
    let area_b = (b.x1() - b.x) * (b.y1() - b.y);

    let ix0 = a.x.max(b.x);
    let iy0 = a.y.max(b.y);
    let ix1 = a.x1().min(b.x1());
    let iy1 = a.y1().min(b.y1());

    let iw = (ix1 - ix0).max(0.0);
    let ih = (iy1 - iy0).max(0.0);
    let inter = iw * ih;
    if inter <= 0.0 {
        return 0.0;
    }

    // Edge differences are monotonic, so inter <= min(area_a, area_b) and
    // the union is strictly positive.
    (inter / (area_a + area_b - inter)).clamp(0.0, 1.0)
}
