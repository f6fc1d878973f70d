/// Axis-aligned rectangle in image pixel space.
///
/// Coordinates are half-open: a rectangle covers columns `xmin..xmax` and
/// rows `ymin..ymax`. Valid rectangles have `xmin < xmax` and `ymin < ymax`,
/// but nothing here enforces it; annotation data may contain anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl Rect {
    pub const fn new(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// Saturates at the `i64` range for extreme coordinates.
    pub fn width(&self) -> i64 {
        self.xmax.saturating_sub(self.xmin)
    }

    pub fn height(&self) -> i64 {
        self.ymax.saturating_sub(self.ymin)
    }

    pub fn area(&self) -> i64 {
        self.width().max(0).saturating_mul(self.height().max(0))
    }

    /// True when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Clamp every coordinate into `[0, width] x [0, height]`.
    pub fn clamp_to(&self, bounds: ImageBounds) -> Rect {
        let w = i64::from(bounds.width);
        let h = i64::from(bounds.height);
        Rect {
            xmin: self.xmin.clamp(0, w),
            ymin: self.ymin.clamp(0, h),
            xmax: self.xmax.clamp(0, w),
            ymax: self.ymax.clamp(0, h),
        }
    }

    pub fn within(&self, bounds: ImageBounds) -> bool {
        self.xmin >= 0
            && self.ymin >= 0
            && self.xmax <= i64::from(bounds.width)
            && self.ymax <= i64::from(bounds.height)
    }

    pub fn disjoint(&self, other: &Rect) -> bool {
        disjoint(self, other)
    }
}

impl AsRef<Rect> for Rect {
    fn as_ref(&self) -> &Rect {
        self
    }
}

/// Two rectangles are disjoint when they share no interior area.
/// Rectangles that only touch along an edge count as disjoint.
pub fn disjoint(a: &Rect, b: &Rect) -> bool {
    a.xmax <= b.xmin || a.xmin >= b.xmax || a.ymax <= b.ymin || a.ymin >= b.ymax
}

/// A face rectangle as it appears in an annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRect {
    pub rect: Rect,
    pub label: String,
}

impl LabeledRect {
    pub fn new(rect: Rect, label: impl Into<String>) -> Self {
        Self { rect, label: label.into() }
    }
}

impl AsRef<Rect> for LabeledRect {
    fn as_ref(&self) -> &Rect {
        &self.rect
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
}

impl ImageBounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSize {
    pub width: u32,
    pub height: u32,
}

impl PatchSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size of a face's bounding box, or `None` for an empty rectangle or one
    /// wider or taller than `u32::MAX`.
    pub fn of(rect: &Rect) -> Option<Self> {
        if rect.is_empty() {
            return None;
        }
        let width = u32::try_from(rect.width()).ok()?;
        let height = u32::try_from(rect.height()).ok()?;
        Some(Self { width, height })
    }

    pub fn fits(&self, bounds: ImageBounds) -> bool {
        self.width <= bounds.width && self.height <= bounds.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_are_disjoint() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 20, 10);
        assert!(disjoint(&a, &b));
        let below = Rect::new(0, 10, 10, 20);
        assert!(disjoint(&a, &below));
    }

    #[test]
    fn overlapping_rects_are_not_disjoint() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 15, 15);
        assert!(!disjoint(&a, &b));
    }

    #[test]
    fn containment_is_overlap() {
        let outer = Rect::new(0, 0, 100, 100);
        let inner = Rect::new(40, 40, 60, 60);
        assert!(!disjoint(&outer, &inner));
        assert!(!disjoint(&inner, &outer));
    }

    #[test]
    fn disjoint_is_symmetric() {
        let rects = [
            Rect::new(0, 0, 10, 10),
            Rect::new(10, 0, 20, 10),
            Rect::new(5, 5, 15, 15),
            Rect::new(-5, -5, 1, 1),
            Rect::new(30, 30, 31, 31),
            Rect::new(9, 9, 10, 10),
        ];
        for a in &rects {
            for b in &rects {
                assert_eq!(disjoint(a, b), disjoint(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn positive_area_rect_overlaps_itself() {
        for r in [Rect::new(0, 0, 1, 1), Rect::new(3, 4, 50, 9), Rect::new(-10, -10, -2, 0)] {
            assert!(!disjoint(&r, &r));
            // no hidden state between calls
            assert_eq!(disjoint(&r, &r), disjoint(&r, &r));
        }
    }

    #[test]
    fn clamp_keeps_rect_inside_image() {
        let bounds = ImageBounds::new(50, 40);
        let r = Rect::new(-5, 10, 70, 45).clamp_to(bounds);
        assert_eq!(r, Rect::new(0, 10, 50, 40));
        assert!(r.within(bounds));
    }

    #[test]
    fn clamp_outside_image_is_empty() {
        let bounds = ImageBounds::new(50, 40);
        let r = Rect::new(60, 10, 80, 20).clamp_to(bounds);
        assert!(r.is_empty());
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn patch_size_of_face() {
        assert_eq!(PatchSize::of(&Rect::new(10, 20, 42, 60)), Some(PatchSize::new(32, 40)));
        assert_eq!(PatchSize::of(&Rect::new(10, 20, 10, 60)), None);
        assert_eq!(PatchSize::of(&Rect::new(10, 20, 5, 60)), None);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let r = Rect::new(i64::MIN, 0, i64::MAX, 10);
        assert_eq!(r.width(), i64::MAX);
        assert_eq!(r.height(), 10);
        assert_eq!(r.area(), i64::MAX);
        assert!(!r.is_empty());
        assert_eq!(PatchSize::of(&r), None);

        let inverted = Rect::new(i64::MAX, i64::MAX, i64::MIN, i64::MIN);
        assert_eq!(inverted.width(), i64::MIN);
        assert!(inverted.is_empty());
        assert_eq!(inverted.area(), 0);

        let bounds = ImageBounds::new(100, 100);
        assert_eq!(r.clamp_to(bounds), Rect::new(0, 0, 100, 10));
    }
}
