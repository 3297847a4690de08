use std::f64::consts::FRAC_PI_4;

use crate::map::feature::GeoFeature;

/// Latitude bound of the conformal cylindrical projection (degrees)
pub const MAX_LATITUDE: f64 = 85.051129;

/// Longitudes west of this are shifted east by 360° in [`LonMode::WrapPacific`]
pub const PACIFIC_WRAP_LON: f64 = -100.0;

/// A point in projected (radian) space. No inherent bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Longitude pre-processing applied before projection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LonMode {
    /// Longitudes projected as given
    #[default]
    Plain,
    /// Far-western longitudes move past +180° so antimeridian features stay contiguous
    WrapPacific,
    /// Longitudes above 180° move back by 360° for a frame centered on Greenwich
    PrimeMeridian,
}

impl LonMode {
    /// Pick wrapping for a feature set whose raw longitude extent exceeds half the globe
    pub fn auto_for<'a>(features: impl IntoIterator<Item = &'a GeoFeature>) -> Self {
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        for (lon, _) in features.into_iter().flat_map(GeoFeature::vertices) {
            min_lon = min_lon.min(lon);
            max_lon = max_lon.max(lon);
        }

        if max_lon - min_lon > 180.0 {
            LonMode::WrapPacific
        } else {
            LonMode::Plain
        }
    }
}

/// Mercator projector with latitude clipping and an optional longitude mode
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projector {
    pub mode: LonMode,
    /// Threshold used by [`LonMode::WrapPacific`]
    pub wrap_lon: f64,
}

impl Projector {
    pub fn new(mode: LonMode) -> Self {
        Self {
            mode,
            wrap_lon: PACIFIC_WRAP_LON,
        }
    }

    pub fn with_wrap_lon(mut self, wrap_lon: f64) -> Self {
        self.wrap_lon = wrap_lon;
        self
    }

    /// Longitude after the mode's pre-processing
    #[inline(always)]
    pub fn adjust_lon(&self, lon: f64) -> f64 {
        match self.mode {
            LonMode::Plain => lon,
            LonMode::WrapPacific if lon < self.wrap_lon => lon + 360.0,
            LonMode::PrimeMeridian if lon > 180.0 => lon - 360.0,
            _ => lon,
        }
    }

    #[inline(always)]
    pub fn project(&self, lon: f64, lat: f64) -> ProjectedPoint {
        project(self.adjust_lon(lon), lat)
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(LonMode::Plain)
    }
}

/// Mercator projection of a geographic coordinate.
/// `x` is the longitude in radians; latitude is clamped to ±[`MAX_LATITUDE`].
#[inline(always)]
pub fn project(lon: f64, lat: f64) -> ProjectedPoint {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = lon.to_radians();
    let y = (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    ProjectedPoint { x, y }
}
