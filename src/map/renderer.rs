use rayon::prelude::*;

use crate::braille::BrailleCanvas;
use crate::config::EngineConfig;
use crate::data::FeatureSet;
use crate::map::geometry::{draw_callout, draw_ellipse, fill_path, stroke_path};
use crate::map::highlight::HighlightGeometry;
use crate::map::identity::{CountryCode, IdentityCache, IdentityResolver};
use crate::map::path::PathDescription;
use crate::map::projection::LonMode;
use crate::map::spatial::FeatureGrid;
use crate::map::viewport::{PixelPoint, ViewportFitter, ViewportTransform};
use crate::map::GeoFeature;

/// Hit-test grid cell in dots
const HIT_CELL_SIZE: f64 = 16.0;

/// Which features the viewport is fitted to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Every feature, plain longitudes
    #[default]
    World,
    /// Every feature, framed on Greenwich with ±180° at the edges
    WorldCentered,
    /// Only the highlighted feature
    Single,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::World => "world",
            ViewMode::WorldCentered => "world (0°)",
            ViewMode::Single => "single",
        }
    }
}

/// Braille layers, composed back to front
pub struct MapLayers {
    pub outlines: BrailleCanvas,
    pub fill: BrailleCanvas,
    pub overlay: BrailleCanvas,
}

impl MapLayers {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            outlines: BrailleCanvas::new(cols, rows),
            fill: BrailleCanvas::new(cols, rows),
            overlay: BrailleCanvas::new(cols, rows),
        }
    }
}

/// Owns the loaded features and everything derived from the current view:
/// identities, transform, per-feature paths, hit grid and highlight.
/// Derived state is rebuilt wholesale whenever the view changes.
pub struct MapRenderer {
    features: FeatureSet,
    config: EngineConfig,
    resolver: IdentityResolver,
    identities: IdentityCache,
    reference: Option<usize>,
    mode: ViewMode,
    highlighted: Option<usize>,
    cols: usize,
    rows: usize,
    transform: Option<ViewportTransform>,
    paths: Vec<PathDescription>,
    grid: FeatureGrid,
    highlight: Option<HighlightGeometry>,
}

impl MapRenderer {
    pub fn new(features: FeatureSet, config: EngineConfig) -> Self {
        let resolver = IdentityResolver::new();
        let mut identities = IdentityCache::new();
        for (idx, feature) in features.features.iter().enumerate() {
            identities.get_or_resolve(idx, feature, &resolver);
        }

        let reference = resolver.resolve_code(&config.reference).and_then(|code| {
            (0..features.len()).find(|&idx| identities.peek(idx).flatten() == Some(code))
        });
        match reference {
            Some(idx) => tracing::debug!(reference = %config.reference, feature = idx, "reference country found"),
            None => tracing::warn!(reference = %config.reference, "reference country not loaded, nothing will be emphasized"),
        }

        Self {
            features,
            config,
            resolver,
            identities,
            reference,
            mode: ViewMode::default(),
            highlighted: None,
            cols: 0,
            rows: 0,
            transform: None,
            paths: Vec::new(),
            grid: FeatureGrid::default(),
            highlight: None,
        }
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn identity(&self, idx: usize) -> Option<CountryCode> {
        self.identities.peek(idx).flatten()
    }

    /// Features with geometry and a resolved code, ordered by code
    pub fn countries(&self) -> Vec<(usize, CountryCode)> {
        let mut list: Vec<(usize, CountryCode)> = self
            .features
            .features
            .iter()
            .enumerate()
            .filter(|(_, f)| f.has_geometry())
            .filter_map(|(idx, _)| Some((idx, self.identity(idx)?)))
            .collect();
        list.sort_by_key(|&(idx, code)| (code, idx));
        list
    }

    /// First feature resolved to `code`
    pub fn find(&self, code: CountryCode) -> Option<usize> {
        (0..self.features.len()).find(|&idx| self.identity(idx) == Some(code))
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if self.mode != mode {
            self.mode = mode;
            self.refit();
        }
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Highlight a feature by index; out-of-range indices clear the highlight
    pub fn set_highlighted(&mut self, idx: Option<usize>) {
        let idx = idx.filter(|&i| i < self.features.len());
        if self.highlighted != idx {
            self.highlighted = idx;
            self.refit();
        }
    }

    pub fn highlight(&self) -> Option<&HighlightGeometry> {
        self.highlight.as_ref()
    }

    pub fn transform(&self) -> Option<&ViewportTransform> {
        self.transform.as_ref()
    }

    pub fn path(&self, idx: usize) -> Option<&PathDescription> {
        self.paths.get(idx)
    }

    /// Resize to a map area of `cols` x `rows` characters
    pub fn resize(&mut self, cols: usize, rows: usize) {
        if (self.cols, self.rows) != (cols, rows) {
            self.cols = cols;
            self.rows = rows;
            self.refit();
        }
    }

    /// Dot resolution of the map area
    pub fn pixel_size(&self) -> (usize, usize) {
        (self.cols * 2, self.rows * 4)
    }

    /// Feature under a dot position. Overlapping candidates resolve to the
    /// one with the smallest bounding box, so enclaves win over their host.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        let point = PixelPoint::new(x, y);
        self.grid
            .query_point(x, y)
            .iter()
            .copied()
            .filter(|&idx| self.paths.get(idx).is_some_and(|p| p.contains(point)))
            .min_by(|&a, &b| bbox_area(&self.paths[a]).total_cmp(&bbox_area(&self.paths[b])))
    }

    pub fn render(&self) -> MapLayers {
        let mut layers = MapLayers::new(self.cols, self.rows);

        for path in &self.paths {
            stroke_path(&mut layers.outlines, path);
        }

        if let Some(path) = self.highlighted.and_then(|idx| self.paths.get(idx)) {
            fill_path(&mut layers.fill, path);
        }

        if let Some(highlight) = &self.highlight {
            if highlight.is_emphasized {
                draw_ellipse(&mut layers.overlay, &highlight.ellipse);
            }
            if let Some(callout) = &highlight.callout {
                draw_callout(&mut layers.overlay, callout);
            }
        }

        layers
    }

    fn refit(&mut self) {
        let (width, height) = self.pixel_size();
        self.transform = None;
        self.paths.clear();
        self.grid = FeatureGrid::default();
        self.highlight = None;
        if width == 0 || height == 0 {
            return;
        }

        // Single view frames only the highlighted feature
        let all = &self.features.features;
        let single: Option<&GeoFeature> = match self.mode {
            ViewMode::Single => self.highlighted.and_then(|idx| all.get(idx)),
            _ => None,
        };

        // Whole-world frames keep North America in one piece; only a lone
        // feature is wrapped across the Pacific
        let lon_mode = match (self.mode, single) {
            (ViewMode::WorldCentered, _) => LonMode::PrimeMeridian,
            (_, Some(feature)) => LonMode::auto_for([feature]),
            _ => LonMode::Plain,
        };

        // Fit the viewport
        let content = self.config.content_box(self.mode, width as f64, height as f64);
        let fitter = ViewportFitter::new(self.config.projector(lon_mode));
        let fitted = match single {
            Some(feature) => fitter.fit([feature], &content),
            None => fitter.fit(all, &content),
        };
        let Some(transform) = fitted else {
            tracing::debug!(mode = ?self.mode, "nothing to fit");
            return;
        };

        // Paths for every feature, including those pushed off-canvas
        let builder = self.config.path_builder();
        self.paths = all.par_iter().map(|f| builder.build_feature(f, &transform)).collect();

        // Hit grid covers the canvas only
        self.grid = FeatureGrid::build(
            self.paths.iter().map(PathDescription::bounds),
            HIT_CELL_SIZE,
            width as f64,
            height as f64,
        );

        // Ellipse and callout against the reference country
        let reference = self.reference.and_then(|idx| all.get(idx));
        self.highlight = self
            .highlighted
            .and_then(|idx| all.get(idx))
            .and_then(|f| self.config.highlighter().compute(f, &transform, reference));
        self.transform = Some(transform);

        tracing::trace!(mode = ?self.mode, lon_mode = ?lon_mode, width, height, "viewport refit");
    }
}

fn bbox_area(path: &PathDescription) -> f64 {
    path.bounds()
        .map_or(f64::INFINITY, |(x0, y0, x1, y1)| (x1 - x0) * (y1 - y0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::builtin_world;
    use crate::map::{PropertyBag, Ring};

    fn renderer() -> MapRenderer {
        let mut r = MapRenderer::new(builtin_world(), EngineConfig::default());
        r.resize(80, 24);
        r
    }

    fn code(s: &str) -> CountryCode {
        CountryCode::new(s).unwrap()
    }

    fn square(code: &str, lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> GeoFeature {
        let mut properties = PropertyBag::new();
        properties.insert("iso_a3".to_string(), code.into());
        let ring: Ring = vec![(lon0, lat0), (lon1, lat0), (lon1, lat1), (lon0, lat1), (lon0, lat0)];
        GeoFeature::polygon(vec![ring], properties)
    }

    #[test]
    fn test_countries_are_resolved_and_sorted() {
        let r = renderer();
        let countries = r.countries();
        let codes: Vec<&str> = countries.iter().map(|(_, c)| c.as_str()).collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        assert_eq!(codes, sorted);
        assert!(codes.contains(&"NLD"));
        assert!(codes.contains(&"XKX"));
        // The record without any usable code stays anonymous
        assert_eq!(countries.len(), r.features().len() - 1);
    }

    #[test]
    fn test_world_fit_draws_outlines() {
        let r = renderer();
        let t = r.transform().unwrap();
        assert_eq!(t.projector.mode, LonMode::Plain);
        assert_eq!(t.width, 160.0);
        assert_eq!(t.height, 96.0);
        assert_eq!(r.path(0).map(|p| p.is_empty()), Some(false));

        let layers = r.render();
        assert!(layers.outlines.dot_count() > 0);
        assert_eq!(layers.fill.dot_count(), 0);
        assert_eq!(layers.overlay.dot_count(), 0);
    }

    #[test]
    fn test_small_country_gets_callout() {
        let mut r = renderer();
        let lux = r.find(code("LUX")).unwrap();
        r.set_highlighted(Some(lux));
        let h = r.highlight().unwrap();
        assert!(h.is_emphasized);
        assert!(h.callout.is_some());
        assert!(r.render().overlay.dot_count() > 0);
    }

    #[test]
    fn test_large_country_is_filled_without_callout() {
        let mut r = renderer();
        let bra = r.find(code("BRA")).unwrap();
        r.set_highlighted(Some(bra));
        let h = r.highlight().unwrap();
        assert!(!h.is_emphasized);
        let layers = r.render();
        assert!(layers.fill.dot_count() > 0);
        assert_eq!(layers.overlay.dot_count(), 0);
    }

    #[test]
    fn test_hit_test_identifies_country() {
        let r = renderer();
        let t = *r.transform().unwrap();
        let p = t.to_pixel(-55.0, -10.0);
        let hit = r.hit_test(p.x, p.y).unwrap();
        assert_eq!(r.identity(hit), Some(code("BRA")));

        let ocean = t.to_pixel(-30.0, -50.0);
        assert_eq!(r.hit_test(ocean.x, ocean.y), None);
    }

    #[test]
    fn test_hit_test_western_us() {
        let r = renderer();
        let t = *r.transform().unwrap();
        for (lon, lat) in [(-105.0, 39.0), (-110.0, 42.0), (-90.0, 38.0)] {
            let p = t.to_pixel(lon, lat);
            let hit = r.hit_test(p.x, p.y);
            assert_eq!(hit.and_then(|idx| r.identity(idx)), Some(code("USA")), "at {lon},{lat}");
        }
    }

    #[test]
    fn test_single_view_of_tiny_feature_stays_bounded() {
        let features = FeatureSet::new(vec![
            square("VAT", 12.45, 41.90, 12.46, 41.91),
            square("RUS", 30.0, 45.0, 180.0, 75.0),
            square("NLD", 3.3, 50.7, 7.2, 53.6),
        ]);
        let mut r = MapRenderer::new(features, EngineConfig::default());
        r.resize(80, 24);
        r.set_highlighted(Some(0));
        r.set_mode(ViewMode::Single);

        // Neighbours project millions of dots away
        let (x0, _, x1, _) = r.path(1).unwrap().bounds().unwrap();
        assert!(x1 - x0 > 1.0e5);

        // At most one entry per on-canvas cell and feature: 10 x 6 cells
        assert!(r.grid.entry_count() <= 60 * 3);

        let (w, h) = r.pixel_size();
        assert_eq!(r.hit_test(w as f64 / 2.0, h as f64 / 2.0), Some(0));

        let layers = r.render();
        assert!(layers.fill.dot_count() > 0);
        assert!(layers.outlines.dot_count() <= w * h);
    }

    #[test]
    fn test_modes_refit() {
        let mut r = renderer();
        r.set_mode(ViewMode::WorldCentered);
        assert_eq!(r.transform().unwrap().projector.mode, LonMode::PrimeMeridian);

        let nld = r.find(code("NLD")).unwrap();
        r.set_highlighted(Some(nld));
        r.set_mode(ViewMode::Single);
        let bounds = r.path(nld).unwrap().bounds().unwrap();
        // Single view spans most of the 160 dot width
        assert!(bounds.2 - bounds.0 > 100.0);

        // Single view without a highlight falls back to the whole set
        r.set_highlighted(None);
        assert!(r.transform().is_some());
        assert!(r.highlight().is_none());
    }

    #[test]
    fn test_missing_reference_disables_emphasis() {
        let config = EngineConfig {
            reference: "ZZZ".to_string(),
            ..EngineConfig::default()
        };
        let mut r = MapRenderer::new(builtin_world(), config);
        r.resize(80, 24);
        r.set_highlighted(r.find(code("LUX")));
        assert!(!r.highlight().unwrap().is_emphasized);
    }

    #[test]
    fn test_zero_size_and_bad_index() {
        let mut r = renderer();
        r.set_highlighted(Some(10_000));
        assert_eq!(r.highlighted(), None);
        r.resize(0, 0);
        assert!(r.transform().is_none());
        assert_eq!(r.hit_test(1.0, 1.0), None);
        assert_eq!(r.render().outlines.dot_count(), 0);
    }
}
