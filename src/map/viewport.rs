use crate::map::feature::GeoFeature;
use crate::map::projection::{LonMode, ProjectedPoint, Projector};

/// Margin used for a single-feature preview
pub const SINGLE_EXPANSION: f64 = 0.15;
/// Margin used for a multi-feature group view
pub const GROUP_EXPANSION: f64 = 0.08;

/// A point in content-box pixel space
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Target area the fitted geometry is scaled into
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContentBox {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    /// Fractional margin added around the fitted extent
    pub expansion_ratio: f64,
}

impl ContentBox {
    pub const DEFAULT_PADDING: f64 = 4.0;

    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            padding: Self::DEFAULT_PADDING,
            expansion_ratio: 0.0,
        }
    }

    pub fn single_preview(width: f64, height: f64) -> Self {
        Self::new(width, height).with_expansion(SINGLE_EXPANSION)
    }

    pub fn group(width: f64, height: f64) -> Self {
        Self::new(width, height).with_expansion(GROUP_EXPANSION)
    }

    /// Tight frame for the prime-meridian world view
    pub fn world_centered(width: f64, height: f64) -> Self {
        Self::new(width, height)
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_expansion(mut self, expansion_ratio: f64) -> Self {
        self.expansion_ratio = expansion_ratio;
        self
    }

    pub fn inner_width(&self) -> f64 {
        self.width - 2.0 * self.padding
    }

    pub fn inner_height(&self) -> f64 {
        self.height - 2.0 * self.padding
    }
}

/// Affine mapping from projected space into a content box.
///
/// ```text
/// px = padding + (x - origin_x) * scale_x
/// py = padding + (top_y - y) * scale_y
/// ```
///
/// Carries the projector it was fitted with so every consumer projects the
/// same way. Replaced, never mutated, when the fitted set changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
    pub origin_x: f64,
    pub top_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub padding: f64,
    pub width: f64,
    pub height: f64,
    pub projector: Projector,
}

impl ViewportTransform {
    #[inline(always)]
    pub fn apply(&self, p: ProjectedPoint) -> PixelPoint {
        PixelPoint {
            x: self.padding + (p.x - self.origin_x) * self.scale_x,
            y: self.padding + (self.top_y - p.y) * self.scale_y,
        }
    }

    /// Project a geographic coordinate and map it to pixels
    #[inline(always)]
    pub fn to_pixel(&self, lon: f64, lat: f64) -> PixelPoint {
        self.apply(self.projector.project(lon, lat))
    }
}

/// Projected bounding box accumulator
#[derive(Clone, Copy, Debug)]
struct Extent {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Extent {
    fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    fn include(&mut self, p: ProjectedPoint) {
        self.min_x = self.min_x.min(p.x);
        self.max_x = self.max_x.max(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_y = self.max_y.max(p.y);
    }

    fn is_empty(&self) -> bool {
        !(self.min_x <= self.max_x && self.min_y <= self.max_y)
    }
}

/// Extent along one axis; zero (or NaN) extents become 1
#[inline(always)]
fn span_or_unit(min: f64, max: f64) -> f64 {
    let span = max - min;
    if span > 0.0 {
        span
    } else {
        1.0
    }
}

/// Computes the transform that fits a feature set into a content box
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewportFitter {
    pub projector: Projector,
}

impl ViewportFitter {
    pub fn new(projector: Projector) -> Self {
        Self { projector }
    }

    /// Fit every vertex of `features` into `content`.
    ///
    /// Axes are scaled independently, so the aspect ratio is not preserved.
    /// With [`LonMode::PrimeMeridian`] the horizontal extent is pinned to ±180°.
    /// Returns `None` when no feature contributes a vertex.
    pub fn fit<'a>(
        &self,
        features: impl IntoIterator<Item = &'a GeoFeature>,
        content: &ContentBox,
    ) -> Option<ViewportTransform> {
        let mut extent = Extent::empty();
        for (lon, lat) in features.into_iter().flat_map(GeoFeature::vertices) {
            extent.include(self.projector.project(lon, lat));
        }

        if extent.is_empty() {
            tracing::debug!("viewport fit skipped: no vertices");
            return None;
        }

        if self.projector.mode == LonMode::PrimeMeridian {
            extent.min_x = self.projector.project(-180.0, 0.0).x;
            extent.max_x = self.projector.project(180.0, 0.0).x;
        }

        let expand = 1.0 + content.expansion_ratio;
        let dx = span_or_unit(extent.min_x, extent.max_x) * expand;
        let dy = span_or_unit(extent.min_y, extent.max_y) * expand;
        let cx = (extent.min_x + extent.max_x) / 2.0;
        let cy = (extent.min_y + extent.max_y) / 2.0;

        Some(ViewportTransform {
            origin_x: cx - dx / 2.0,
            top_y: cy + dy / 2.0,
            scale_x: content.inner_width() / dx,
            scale_y: content.inner_height() / dy,
            padding: content.padding,
            width: content.width,
            height: content.height,
            projector: self.projector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::feature::{PropertyBag, Ring};

    fn feature(rings: Vec<Ring>) -> GeoFeature {
        GeoFeature::polygon(rings, PropertyBag::new())
    }

    fn assert_contained(features: &[GeoFeature], t: &ViewportTransform) {
        let eps = 1e-9;
        for (lon, lat) in features.iter().flat_map(GeoFeature::vertices) {
            let p = t.to_pixel(lon, lat);
            assert!(p.x >= t.padding - eps && p.x <= t.width - t.padding + eps, "x {} out of box", p.x);
            assert!(p.y >= t.padding - eps && p.y <= t.height - t.padding + eps, "y {} out of box", p.y);
        }
    }

    #[test]
    fn test_containment_for_various_expansions() {
        let features = vec![
            feature(vec![vec![(3.3, 50.7), (7.2, 50.7), (7.2, 53.6), (3.3, 53.6)]]),
            feature(vec![vec![(-9.5, 36.9), (-6.2, 36.9), (-6.2, 42.2)]]),
            feature(vec![vec![(100.0, -10.0), (140.0, -40.0), (150.0, -20.0)]]),
        ];
        let fitter = ViewportFitter::default();
        for expansion in [0.0, 0.08, 0.15, 0.5] {
            let content = ContentBox::new(400.0, 240.0).with_padding(10.0).with_expansion(expansion);
            let t = fitter.fit(&features, &content).unwrap();
            assert_contained(&features, &t);
        }
    }

    #[test]
    fn test_zero_expansion_touches_edges() {
        let features = vec![feature(vec![vec![(0.0, 0.0), (10.0, 10.0)]])];
        let content = ContentBox::new(200.0, 100.0);
        let t = ViewportFitter::default().fit(&features, &content).unwrap();

        let a = t.to_pixel(0.0, 0.0);
        let b = t.to_pixel(10.0, 10.0);
        assert!((a.x - 4.0).abs() < 1e-9);
        assert!((b.x - 196.0).abs() < 1e-9);
        // y grows downward
        assert!((b.y - 4.0).abs() < 1e-9);
        assert!((a.y - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_expansion_leaves_margin() {
        let features = vec![feature(vec![vec![(0.0, 0.0), (10.0, 10.0)]])];
        let content = ContentBox::single_preview(200.0, 100.0);
        let t = ViewportFitter::default().fit(&features, &content).unwrap();
        let a = t.to_pixel(0.0, 0.0);
        assert!(a.x > 4.0 + 1.0);
        let mid = t.to_pixel(5.0, 0.0);
        assert!((mid.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_extent_forced_to_one() {
        let features = vec![feature(vec![vec![(5.0, 5.0)]])];
        let content = ContentBox::new(100.0, 100.0).with_padding(0.0);
        let t = ViewportFitter::default().fit(&features, &content).unwrap();
        assert!((t.scale_x - 100.0).abs() < 1e-9);
        assert!((t.scale_y - 100.0).abs() < 1e-9);
        let p = t.to_pixel(5.0, 5.0);
        assert!((p.x - 50.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_axes_scale_independently() {
        let features = vec![feature(vec![vec![(0.0, 0.0), (40.0, 1.0)]])];
        let t = ViewportFitter::default().fit(&features, &ContentBox::new(200.0, 200.0)).unwrap();
        assert!(t.scale_y > t.scale_x * 10.0);
    }

    #[test]
    fn test_no_vertices_yields_none() {
        let fitter = ViewportFitter::default();
        let content = ContentBox::group(100.0, 100.0);
        assert!(fitter.fit(std::iter::empty::<&GeoFeature>(), &content).is_none());
        assert!(fitter.fit(&[GeoFeature::default()], &content).is_none());
    }

    #[test]
    fn test_prime_meridian_pins_horizontal_frame() {
        let fitter = ViewportFitter::new(Projector::new(LonMode::PrimeMeridian));
        let content = ContentBox::world_centered(720.0, 360.0).with_padding(0.0);

        let nl = vec![feature(vec![vec![(3.3, 50.7), (7.2, 53.6)]])];
        let chile = vec![feature(vec![vec![(-75.0, -55.0), (-67.0, -17.0)]])];
        let a = fitter.fit(&nl, &content).unwrap();
        let b = fitter.fit(&chile, &content).unwrap();

        assert_eq!(a.origin_x, b.origin_x);
        assert_eq!(a.scale_x, b.scale_x);
        assert!((a.to_pixel(-180.0, 0.0).x).abs() < 1e-9);
        assert!((a.to_pixel(180.0, 0.0).x - 720.0).abs() < 1e-9);
        assert!((a.to_pixel(0.0, 0.0).x - 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_mode_keeps_pacific_contiguous() {
        let fitter = ViewportFitter::new(Projector::new(LonMode::WrapPacific));
        let fiji = vec![feature(vec![vec![(177.0, -18.0), (179.9, -16.0), (-179.9, -16.5), (-178.0, -19.0)]])];
        let content = ContentBox::group(400.0, 400.0);
        let t = fitter.fit(&fiji, &content).unwrap();
        // 10° of longitude across, so the fit is narrow rather than world-wide
        let span = t.to_pixel(-178.0, -18.0).x - t.to_pixel(177.0, -18.0).x;
        assert!(span > 300.0);
        assert_contained(&fiji, &t);
    }
}
