use std::f64::consts::FRAC_PI_4;

use glam::DVec2;

use crate::map::feature::GeoFeature;
use crate::map::projection::{project, ProjectedPoint};
use crate::map::viewport::{PixelPoint, ViewportTransform};

/// Semi-axis used when the samples collapse to a point or a line
pub const MIN_ELLIPSE_RADIUS: f64 = 8.0;
/// Every Nth vertex is sampled for the bounding ellipse
pub const DEFAULT_SAMPLE_STRIDE: usize = 5;

/// Axis-aligned ellipse in pixel space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipse {
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
}

impl Ellipse {
    /// Size used for small-country comparison (`rx * ry`, π omitted)
    #[inline(always)]
    pub fn area_measure(&self) -> f64 {
        self.rx * self.ry
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.cx, self.cy)
    }
}

/// Arrow pointing at a feature centroid
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Callout {
    pub tail: PixelPoint,
    pub tip: PixelPoint,
    /// Arrowhead end points, each joined to `tip`
    pub barbs: [PixelPoint; 2],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalloutStyle {
    pub length: f64,
    /// Approach angle in radians; 0 points along +x, positive turns toward +y (down)
    pub angle: f64,
    pub barb_length: f64,
    pub barb_spread: f64,
}

impl Default for CalloutStyle {
    fn default() -> Self {
        Self {
            length: 55.0,
            angle: FRAC_PI_4,
            barb_length: 14.0,
            barb_spread: 0.65,
        }
    }
}

impl CalloutStyle {
    /// Arrow whose tip sits on `tip`, approaching from the upper left
    pub fn callout_to(&self, tip: PixelPoint) -> Callout {
        let tip_v = DVec2::new(tip.x, tip.y);
        let tail = tip_v - DVec2::from_angle(self.angle) * self.length;
        let barb = |angle: f64| {
            let end = tip_v - DVec2::from_angle(angle) * self.barb_length;
            PixelPoint::new(end.x, end.y)
        };

        Callout {
            tail: PixelPoint::new(tail.x, tail.y),
            tip,
            barbs: [barb(self.angle - self.barb_spread), barb(self.angle + self.barb_spread)],
        }
    }
}

/// Overlay geometry for one highlighted feature
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HighlightGeometry {
    /// Mean vertex position, projected
    pub centroid: ProjectedPoint,
    pub centroid_px: PixelPoint,
    pub ellipse: Ellipse,
    /// Smaller than the reference feature at this transform
    pub is_emphasized: bool,
    /// Present only when emphasized
    pub callout: Option<Callout>,
}

/// Decides whether a feature is too small to notice and builds its overlay
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmallFeatureHighlighter {
    pub sample_stride: usize,
    pub min_radius: f64,
    pub callout: CalloutStyle,
}

impl Default for SmallFeatureHighlighter {
    fn default() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            min_radius: MIN_ELLIPSE_RADIUS,
            callout: CalloutStyle::default(),
        }
    }
}

impl SmallFeatureHighlighter {
    pub fn new(sample_stride: usize) -> Self {
        Self {
            sample_stride,
            ..Self::default()
        }
    }

    /// Highlight geometry of `feature` under `transform`.
    ///
    /// The feature is emphasized when its bounding-ellipse measure is strictly
    /// smaller than the reference's. A missing reference measures 0, so nothing
    /// is emphasized. Returns `None` when the feature has no vertices.
    pub fn compute(
        &self,
        feature: &GeoFeature,
        transform: &ViewportTransform,
        reference: Option<&GeoFeature>,
    ) -> Option<HighlightGeometry> {
        let Some(centroid) = self.centroid(feature, transform) else {
            tracing::debug!("no highlight: feature has no vertices");
            return None;
        };
        let ellipse = self.bounding_ellipse(&self.sample_pixels(feature, transform))?;

        let reference_measure = match reference {
            Some(r) => self.ellipse_measure(r, transform),
            None => {
                tracing::debug!("no reference feature, emphasis disabled");
                0.0
            }
        };
        let is_emphasized = ellipse.area_measure() < reference_measure;

        let centroid_px = transform.apply(centroid);
        Some(HighlightGeometry {
            centroid,
            centroid_px,
            ellipse,
            is_emphasized,
            callout: is_emphasized.then(|| self.callout.callout_to(centroid_px)),
        })
    }

    /// Unweighted mean of all vertices after the transform's longitude adjustment.
    ///
    /// This deliberately differs from the mean of raw longitudes: a feature split at
    /// the dateline averages to the antimeridian, where it is drawn, instead of 0°.
    fn centroid(&self, feature: &GeoFeature, transform: &ViewportTransform) -> Option<ProjectedPoint> {
        let (mut sum_lon, mut sum_lat, mut count) = (0.0, 0.0, 0usize);
        for (lon, lat) in feature.vertices() {
            sum_lon += transform.projector.adjust_lon(lon);
            sum_lat += lat;
            count += 1;
        }
        (count > 0).then(|| project(sum_lon / count as f64, sum_lat / count as f64))
    }

    /// Every `sample_stride`-th vertex in pixel space, counted across all rings
    pub fn sample_pixels(&self, feature: &GeoFeature, transform: &ViewportTransform) -> Vec<PixelPoint> {
        let stride = self.sample_stride.max(1);
        feature
            .vertices()
            .step_by(stride)
            .map(|(lon, lat)| transform.to_pixel(lon, lat))
            .collect()
    }

    /// Sample bounding box halved into semi-axes. Not a true minimum-enclosing
    /// ellipse; emphasis thresholds are tuned against this approximation.
    pub fn bounding_ellipse(&self, samples: &[PixelPoint]) -> Option<Ellipse> {
        match samples {
            [] => None,
            [p] => Some(Ellipse {
                cx: p.x,
                cy: p.y,
                rx: self.min_radius,
                ry: self.min_radius,
            }),
            _ => {
                let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
                let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
                for p in samples {
                    min_x = min_x.min(p.x);
                    max_x = max_x.max(p.x);
                    min_y = min_y.min(p.y);
                    max_y = max_y.max(p.y);
                }
                let radius = |span: f64| if span > 0.0 { span / 2.0 } else { self.min_radius };
                Some(Ellipse {
                    cx: (min_x + max_x) / 2.0,
                    cy: (min_y + max_y) / 2.0,
                    rx: radius(max_x - min_x),
                    ry: radius(max_y - min_y),
                })
            }
        }
    }

    /// Ellipse measure of a feature; 0 when it has no vertices
    pub fn ellipse_measure(&self, feature: &GeoFeature, transform: &ViewportTransform) -> f64 {
        self.bounding_ellipse(&self.sample_pixels(feature, transform))
            .map_or(0.0, |e| e.area_measure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::feature::{PropertyBag, Ring};
    use crate::map::projection::{LonMode, Projector};
    use crate::map::viewport::{ContentBox, ViewportFitter};

    /// Square ring with `steps` points per side; corners land on multiples of `steps`
    fn dense_square(lon: f64, lat: f64, size: f64, steps: usize) -> Ring {
        let d = size / steps as f64;
        let mut ring = Vec::new();
        for i in 0..steps {
            ring.push((lon + d * i as f64, lat));
        }
        for i in 0..steps {
            ring.push((lon + size, lat + d * i as f64));
        }
        for i in 0..steps {
            ring.push((lon + size - d * i as f64, lat + size));
        }
        for i in 0..steps {
            ring.push((lon, lat + size - d * i as f64));
        }
        ring.push((lon, lat));
        ring
    }

    fn square_feature(lon: f64, lat: f64, size: f64) -> GeoFeature {
        GeoFeature::polygon(vec![dense_square(lon, lat, size, 10)], PropertyBag::new())
    }

    fn fixture() -> (GeoFeature, GeoFeature, GeoFeature, ViewportTransform) {
        let reference = square_feature(0.0, 40.0, 10.0);
        let tiny = square_feature(20.0, 45.0, 0.5);
        let large = square_feature(-40.0, 0.0, 30.0);
        let t = ViewportFitter::default()
            .fit([&reference, &tiny, &large], &ContentBox::group(400.0, 300.0))
            .unwrap();
        (reference, tiny, large, t)
    }

    #[test]
    fn test_small_feature_is_emphasized() {
        let (reference, tiny, _, t) = fixture();
        let h = SmallFeatureHighlighter::default().compute(&tiny, &t, Some(&reference)).unwrap();
        assert!(h.is_emphasized);
        assert!(h.callout.is_some());
    }

    #[test]
    fn test_large_feature_is_not_emphasized() {
        let (reference, _, large, t) = fixture();
        let h = SmallFeatureHighlighter::default().compute(&large, &t, Some(&reference)).unwrap();
        assert!(!h.is_emphasized);
        assert!(h.callout.is_none());
        // Reference against itself is not strictly smaller
        let h = SmallFeatureHighlighter::default().compute(&reference, &t, Some(&reference)).unwrap();
        assert!(!h.is_emphasized);
    }

    #[test]
    fn test_missing_reference_never_emphasizes() {
        let (_, tiny, _, t) = fixture();
        let h = SmallFeatureHighlighter::default().compute(&tiny, &t, None).unwrap();
        assert!(!h.is_emphasized);
    }

    #[test]
    fn test_stride_samples_corners_of_box() {
        let (reference, _, _, t) = fixture();
        let highlighter = SmallFeatureHighlighter::default();
        let e = highlighter.bounding_ellipse(&highlighter.sample_pixels(&reference, &t)).unwrap();

        let lo = t.to_pixel(0.0, 40.0);
        let hi = t.to_pixel(10.0, 50.0);
        assert!((e.rx - (hi.x - lo.x).abs() / 2.0).abs() < 1e-9);
        assert!((e.ry - (hi.y - lo.y).abs() / 2.0).abs() < 1e-9);
        assert!((e.cx - (lo.x + hi.x) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_gets_minimum_radius() {
        let (reference, _, _, t) = fixture();
        let dot = GeoFeature::polygon(vec![vec![(5.0, 45.0)]], PropertyBag::new());
        let h = SmallFeatureHighlighter::default().compute(&dot, &t, Some(&reference)).unwrap();
        assert_eq!(h.ellipse.rx, MIN_ELLIPSE_RADIUS);
        assert_eq!(h.ellipse.ry, MIN_ELLIPSE_RADIUS);
        assert!((h.ellipse.cx - h.centroid_px.x).abs() < 1e-9);
    }

    #[test]
    fn test_stride_beyond_vertex_count_gives_single_sample() {
        let (_, tiny, _, t) = fixture();
        let e = SmallFeatureHighlighter::new(1000)
            .bounding_ellipse(&SmallFeatureHighlighter::new(1000).sample_pixels(&tiny, &t))
            .unwrap();
        assert_eq!((e.rx, e.ry), (MIN_ELLIPSE_RADIUS, MIN_ELLIPSE_RADIUS));
    }

    #[test]
    fn test_collapsed_axis_falls_back_to_minimum() {
        let highlighter = SmallFeatureHighlighter::default();
        let e = highlighter
            .bounding_ellipse(&[PixelPoint::new(10.0, 5.0), PixelPoint::new(30.0, 5.0)])
            .unwrap();
        assert_eq!(e.rx, 10.0);
        assert_eq!(e.ry, MIN_ELLIPSE_RADIUS);
        assert!(highlighter.bounding_ellipse(&[]).is_none());
    }

    #[test]
    fn test_radii_non_negative() {
        let (reference, tiny, large, t) = fixture();
        for stride in [0, 1, 2, 5, 7, 40] {
            let highlighter = SmallFeatureHighlighter::new(stride);
            for f in [&reference, &tiny, &large] {
                let e = highlighter.bounding_ellipse(&highlighter.sample_pixels(f, &t)).unwrap();
                assert!(e.rx >= 0.0 && e.ry >= 0.0);
            }
        }
    }

    #[test]
    fn test_no_geometry_yields_none() {
        let (reference, _, _, t) = fixture();
        let h = SmallFeatureHighlighter::default().compute(&GeoFeature::default(), &t, Some(&reference));
        assert!(h.is_none());
    }

    #[test]
    fn test_callout_geometry() {
        let style = CalloutStyle::default();
        let c = style.callout_to(PixelPoint::new(100.0, 100.0));
        let offset = 55.0 * FRAC_PI_4.cos();
        assert!((c.tail.x - (100.0 - offset)).abs() < 1e-9);
        assert!((c.tail.y - (100.0 - offset)).abs() < 1e-9);
        for barb in c.barbs {
            let len = ((barb.x - 100.0).powi(2) + (barb.y - 100.0).powi(2)).sqrt();
            assert!((len - 14.0).abs() < 1e-9);
        }
        // Barbs mirror each other across the shaft
        assert!((c.barbs[0].x - c.barbs[1].y).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_uses_wrapped_longitudes() {
        let fiji = GeoFeature::polygon(
            vec![vec![(177.0, -18.0), (179.0, -16.0), (-179.0, -16.0), (-177.0, -18.0)]],
            PropertyBag::new(),
        );
        let t = ViewportFitter::new(Projector::new(LonMode::WrapPacific))
            .fit([&fiji], &ContentBox::group(400.0, 300.0))
            .unwrap();
        let h = SmallFeatureHighlighter::default().compute(&fiji, &t, None).unwrap();
        // Mean of 177, 179, 181, 183 is the antimeridian, the middle of the frame
        assert!((h.centroid.x - 180.0_f64.to_radians()).abs() < 1e-9);
        assert!((h.centroid_px.x - 200.0).abs() < 1e-6);
    }
}
