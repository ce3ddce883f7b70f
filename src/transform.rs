//! Pure display-geometry math: zoom-mode rectangle placement and the
//! EXIF-orientation affine matrix applied when drawing.

/// EXIF orientation codes 1-8. Absent or unreadable metadata is `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    MirrorHorizontal,
    Rotate180,
    MirrorVertical,
    MirrorRotate90,
    Rotate90,
    MirrorRotate270,
    Rotate270,
}

impl Orientation {
    pub fn from_exif(code: u32) -> Self {
        match code {
            2 => Self::MirrorHorizontal,
            3 => Self::Rotate180,
            4 => Self::MirrorVertical,
            5 => Self::MirrorRotate90,
            6 => Self::Rotate90,
            7 => Self::MirrorRotate270,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }
}

/// How the image is sized into the viewport. `ShrinkToFit` shows the image
/// 1:1 when it already fits and scales down otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomMode {
    Actual,
    Fit,
    ShrinkToFit,
}

impl ZoomMode {
    pub fn cycle(self) -> Self {
        match self {
            Self::ShrinkToFit => Self::Fit,
            Self::Fit => Self::Actual,
            Self::Actual => Self::ShrinkToFit,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Actual => "1:1",
            Self::Fit => "fit",
            Self::ShrinkToFit => "shrink",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// 2D affine transform: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`
/// (column-vector convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Matrix {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn rotate(degrees: f32) -> Self {
        let r = degrees.to_radians();
        let (sin, cos) = r.sin_cos();
        Matrix {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self * other`: `other` is applied to points first.
    pub fn mul(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn rotate_about(degrees: f32, cx: f32, cy: f32) -> Self {
        Matrix::translate(cx, cy)
            .mul(&Matrix::rotate(degrees))
            .mul(&Matrix::translate(-cx, -cy))
    }

    pub fn scale_about(sx: f32, sy: f32, cx: f32, cy: f32) -> Self {
        Matrix::translate(cx, cy)
            .mul(&Matrix::scale(sx, sy))
            .mul(&Matrix::translate(-cx, -cy))
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn invert(&self) -> Option<Matrix> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-9 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Matrix {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    pub fn is_identity(&self) -> bool {
        const EPS: f32 = 1e-5;
        (self.a - 1.0).abs() < EPS
            && self.b.abs() < EPS
            && self.c.abs() < EPS
            && (self.d - 1.0).abs() < EPS
            && self.e.abs() < EPS
            && self.f.abs() < EPS
    }
}

/// Derive the destination rectangle (pre-rotation bounding box) and the
/// orientation matrix for drawing a `src_w`×`src_h` image into `viewport`.
///
/// A degenerate viewport or source returns a zero-area rect and identity;
/// zero-sized sources are treated as "no image" upstream, this just refuses
/// to divide by them.
pub fn compute(
    src_w: u32,
    src_h: u32,
    orientation: Orientation,
    viewport: Rect,
    zoom: ZoomMode,
) -> (Rect, Matrix) {
    if viewport.w <= 0.0 || viewport.h <= 0.0 || src_w == 0 || src_h == 0 {
        return (Rect::default(), Matrix::IDENTITY);
    }

    let (sw, sh) = (src_w as f32, src_h as f32);
    let mut rect = Rect::new(viewport.x, viewport.y, sw, sh);

    let fits = sw <= viewport.w && sh <= viewport.h;
    if zoom == ZoomMode::Actual || (zoom == ZoomMode::ShrinkToFit && fits) {
        rect.x += (viewport.w - rect.w) / 2.0;
        rect.y += (viewport.h - rect.h) / 2.0;
    } else {
        let img_aspect = sw / sh;
        let vp_aspect = viewport.w / viewport.h;
        if img_aspect > vp_aspect {
            // Image is wider: width pins to the viewport, height scales down.
            rect.w = viewport.w;
            rect.h = viewport.w / img_aspect;
            rect.y += (viewport.h - rect.h) / 2.0;
        } else {
            rect.h = viewport.h;
            rect.w = viewport.h * img_aspect;
            rect.x += (viewport.w - rect.w) / 2.0;
        }
    }

    (rect, orientation_matrix(orientation, &rect))
}

/// The mirror/rotation combination for each orientation code, anchored at
/// the destination rectangle's center.
fn orientation_matrix(orientation: Orientation, rect: &Rect) -> Matrix {
    let (cx, cy) = rect.center();
    match orientation {
        Orientation::Normal => Matrix::IDENTITY,
        Orientation::MirrorHorizontal => Matrix::scale_about(-1.0, 1.0, cx, cy),
        Orientation::Rotate180 => Matrix::rotate_about(180.0, cx, cy),
        Orientation::MirrorVertical => Matrix::scale_about(1.0, -1.0, cx, cy),
        Orientation::MirrorRotate90 => Matrix::rotate_about(90.0, cx, cy)
            .mul(&Matrix::scale_about(1.0, -1.0, cx, cy)),
        Orientation::Rotate90 => Matrix::rotate_about(90.0, cx, cy),
        Orientation::MirrorRotate270 => Matrix::rotate_about(270.0, cx, cy)
            .mul(&Matrix::scale_about(1.0, -1.0, cx, cy)),
        Orientation::Rotate270 => Matrix::rotate_about(270.0, cx, cy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(got: f32, want: f32) {
        assert!((got - want).abs() < 1e-3, "got {got}, want {want}");
    }

    #[test]
    fn orientation_one_is_identity() {
        let vp = Rect::new(0.0, 0.0, 800.0, 600.0);
        for zoom in [ZoomMode::Actual, ZoomMode::Fit, ZoomMode::ShrinkToFit] {
            let (_, mx) = compute(400, 300, Orientation::Normal, vp, zoom);
            assert!(mx.is_identity());
        }
    }

    #[test]
    fn fit_scales_wide_image_and_centers_vertically() {
        let vp = Rect::new(0.0, 0.0, 800.0, 600.0);
        let (rect, mx) = compute(1600, 900, Orientation::Normal, vp, ZoomMode::Fit);
        assert_close(rect.w, 800.0);
        assert_close(rect.h, 450.0);
        assert_close(rect.x, 0.0);
        assert_close(rect.y, 75.0);
        assert!(mx.is_identity());
    }

    #[test]
    fn fit_scales_tall_image_and_centers_horizontally() {
        let vp = Rect::new(0.0, 0.0, 800.0, 600.0);
        let (rect, _) = compute(500, 1000, Orientation::Normal, vp, ZoomMode::Fit);
        assert_close(rect.h, 600.0);
        assert_close(rect.w, 300.0);
        assert_close(rect.x, 250.0);
        assert_close(rect.y, 0.0);
    }

    #[test]
    fn actual_centers_at_source_size() {
        let vp = Rect::new(0.0, 0.0, 200.0, 200.0);
        let (rect, _) = compute(100, 50, Orientation::Normal, vp, ZoomMode::Actual);
        assert_close(rect.x, 50.0);
        assert_close(rect.y, 75.0);
        assert_close(rect.w, 100.0);
        assert_close(rect.h, 50.0);
    }

    #[test]
    fn shrink_to_fit_is_actual_when_image_fits() {
        let vp = Rect::new(0.0, 0.0, 800.0, 600.0);
        let (small, _) = compute(100, 50, Orientation::Normal, vp, ZoomMode::ShrinkToFit);
        assert_close(small.w, 100.0);
        assert_close(small.h, 50.0);

        let (large, _) = compute(1600, 900, Orientation::Normal, vp, ZoomMode::ShrinkToFit);
        assert_close(large.w, 800.0);
        assert_close(large.h, 450.0);
    }

    #[test]
    fn rotate90_spins_about_rect_center() {
        let vp = Rect::new(0.0, 0.0, 200.0, 200.0);
        let (rect, mx) = compute(100, 50, Orientation::Rotate90, vp, ZoomMode::Actual);
        // Rect is the pre-rotation bounding box, centered at source size.
        assert_close(rect.x, 50.0);
        assert_close(rect.y, 75.0);

        // The center is a fixed point.
        let (cx, cy) = rect.center();
        let (px, py) = mx.apply(cx, cy);
        assert_close(px, cx);
        assert_close(py, cy);

        // Top-left corner rotates 90 degrees clockwise about the center.
        let (px, py) = mx.apply(rect.x, rect.y);
        assert_close(px, 125.0);
        assert_close(py, 50.0);
    }

    #[test]
    fn rotate180_maps_corner_to_opposite_corner() {
        let vp = Rect::new(0.0, 0.0, 100.0, 100.0);
        let (rect, mx) = compute(100, 100, Orientation::Rotate180, vp, ZoomMode::Actual);
        let (px, py) = mx.apply(rect.x, rect.y);
        assert_close(px, rect.x + rect.w);
        assert_close(py, rect.y + rect.h);
    }

    #[test]
    fn mirror_horizontal_flips_within_rect() {
        let vp = Rect::new(0.0, 0.0, 300.0, 300.0);
        let (rect, mx) =
            compute(100, 100, Orientation::MirrorHorizontal, vp, ZoomMode::Actual);
        let (px, py) = mx.apply(rect.x, rect.y);
        assert_close(px, rect.x + rect.w);
        assert_close(py, rect.y);
    }

    #[test]
    fn degenerate_viewport_does_not_divide_by_zero() {
        let vp = Rect::new(0.0, 0.0, 0.0, 600.0);
        let (rect, mx) = compute(1600, 900, Orientation::Rotate90, vp, ZoomMode::Fit);
        assert_eq!(rect, Rect::default());
        assert!(mx.is_identity());
    }

    #[test]
    fn zero_source_is_not_a_transform_error() {
        let vp = Rect::new(0.0, 0.0, 800.0, 600.0);
        let (rect, mx) = compute(0, 900, Orientation::Normal, vp, ZoomMode::Fit);
        assert_eq!(rect, Rect::default());
        assert!(mx.is_identity());
    }

    #[test]
    fn matrix_inverse_round_trips() {
        let mx = Matrix::rotate_about(90.0, 40.0, 60.0)
            .mul(&Matrix::scale_about(1.0, -1.0, 40.0, 60.0));
        let inv = mx.invert().unwrap();
        let (x, y) = mx.apply(12.0, 34.0);
        let (bx, by) = inv.apply(x, y);
        assert_close(bx, 12.0);
        assert_close(by, 34.0);
    }
}
