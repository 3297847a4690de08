use std::fs;
use std::path::{Path, PathBuf};

use geojson::{GeoJson, Geometry, JsonObject, JsonValue, Value};
use thiserror::Error;

use crate::map::{FeatureGeometry, GeoFeature, Ring};

/// Property keys tried, in order, for a human-readable label
const LABEL_KEYS: [&str; 5] = ["NAME", "name", "ADMIN", "admin", "NAME_EN"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid GeoJSON: {0}")]
    Parse(#[from] simd_json::Error),
    #[error("no features in {0}")]
    Empty(String),
}

/// Loaded boundary features with a display label per feature
#[derive(Clone, Debug, Default)]
pub struct FeatureSet {
    pub features: Vec<GeoFeature>,
    labels: Vec<Option<String>>,
}

impl FeatureSet {
    pub fn new(features: Vec<GeoFeature>) -> Self {
        let labels = features.iter().map(|f| display_name(&f.properties)).collect();
        Self { features, labels }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&GeoFeature> {
        self.features.get(idx)
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).and_then(|l| l.as_deref())
    }
}

/// First non-empty string among the label keys
pub fn display_name(properties: &JsonObject) -> Option<String> {
    LABEL_KEYS
        .iter()
        .filter_map(|key| properties.get(*key).and_then(JsonValue::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Load country boundaries from a GeoJSON file
pub fn load_features(path: &Path) -> Result<FeatureSet, LoadError> {
    let mut bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let set = parse_features(&mut bytes).map_err(|e| match e {
        LoadError::Empty(_) => LoadError::Empty(path.display().to_string()),
        other => other,
    })?;
    tracing::info!(path = %path.display(), features = set.len(), "loaded boundaries");
    Ok(set)
}

/// Parse GeoJSON bytes in place. Accepts a FeatureCollection, a single Feature
/// or a bare Geometry.
pub fn parse_features(bytes: &mut [u8]) -> Result<FeatureSet, LoadError> {
    let geojson: GeoJson = simd_json::serde::from_slice(bytes)?;

    let features: Vec<GeoFeature> = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.into_iter().map(convert_feature).collect(),
        GeoJson::Feature(f) => vec![convert_feature(f)],
        GeoJson::Geometry(g) => vec![GeoFeature::new(convert_geometry(&g), JsonObject::new())],
    };

    if features.is_empty() {
        return Err(LoadError::Empty("input".to_string()));
    }

    let without_geometry = features.iter().filter(|f| !f.has_geometry()).count();
    if without_geometry > 0 {
        tracing::debug!(count = without_geometry, "features without polygon geometry");
    }

    Ok(FeatureSet::new(features))
}

fn convert_feature(feature: geojson::Feature) -> GeoFeature {
    let geometry = feature.geometry.as_ref().and_then(convert_geometry);
    GeoFeature::new(geometry, feature.properties.unwrap_or_default())
}

/// Polygon and MultiPolygon are kept; anything else has no drawable area
fn convert_geometry(geometry: &Geometry) -> Option<FeatureGeometry> {
    match &geometry.value {
        Value::Polygon(rings) => Some(FeatureGeometry::Polygon(convert_rings(rings))),
        Value::MultiPolygon(polygons) => Some(FeatureGeometry::MultiPolygon(
            polygons.iter().map(|rings| convert_rings(rings)).collect(),
        )),
        _ => None,
    }
}

fn convert_rings(rings: &[Vec<Vec<f64>>]) -> Vec<Ring> {
    rings
        .iter()
        .map(|ring| ring.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect())
        .collect()
}

struct BuiltinCountry {
    properties: &'static [(&'static str, &'static str)],
    polygons: &'static [&'static [(f64, f64)]],
}

/// Coarse outlines covering the identity-resolution cases the map has to handle:
/// sentinel codes, alpha-2 only records, remapped codes, unresolvable records
/// and antimeridian splits.
const BUILTIN_WORLD: &[BuiltinCountry] = &[
    BuiltinCountry {
        properties: &[("iso_a3", "NLD"), ("NAME", "Netherlands")],
        polygons: &[&[
            (3.4, 51.4), (4.3, 51.4), (5.9, 50.8), (6.1, 51.8), (7.0, 52.2),
            (7.2, 53.2), (6.9, 53.5), (5.0, 53.4), (4.6, 52.9), (3.4, 51.4),
        ]],
    },
    BuiltinCountry {
        properties: &[("iso_a3", "LUX"), ("NAME", "Luxembourg")],
        polygons: &[&[
            (5.73, 49.54), (5.95, 49.45), (6.14, 49.47), (6.37, 49.46), (6.5, 49.72),
            (6.52, 49.81), (6.28, 50.0), (6.12, 50.13), (5.98, 50.17), (5.75, 49.9),
            (5.73, 49.54),
        ]],
    },
    BuiltinCountry {
        properties: &[("iso_a3", "-99"), ("adm0_a3", "FRA"), ("NAME", "France")],
        polygons: &[
            &[
                (-4.8, 48.4), (-1.4, 48.7), (1.6, 50.9), (4.2, 49.9), (8.2, 49.0),
                (7.5, 47.5), (6.8, 46.0), (7.6, 43.8), (3.1, 43.1), (-1.8, 43.4),
                (-1.2, 46.2), (-4.8, 48.4),
            ],
            &[(8.6, 42.4), (9.6, 42.9), (9.4, 41.4), (8.6, 42.4)],
        ],
    },
    BuiltinCountry {
        properties: &[("iso_a2", "GB"), ("ADMIN", "United Kingdom")],
        polygons: &[&[
            (-5.7, 50.0), (1.4, 51.2), (1.7, 52.7), (-0.2, 54.0), (-2.0, 55.8),
            (-1.8, 57.6), (-3.1, 58.6), (-5.0, 58.6), (-6.2, 56.8), (-4.8, 54.8),
            (-3.0, 53.4), (-4.7, 51.7), (-5.7, 50.0),
        ]],
    },
    BuiltinCountry {
        properties: &[("iso_a3", "-99"), ("adm0_a3", "KOS"), ("NAME", "Kosovo")],
        polygons: &[&[(20.1, 42.6), (20.8, 43.2), (21.8, 42.7), (21.3, 42.2), (20.6, 42.0), (20.1, 42.6)]],
    },
    BuiltinCountry {
        properties: &[("iso_a3", "-99"), ("adm0_a3", "-99"), ("NAME", "Somaliland")],
        polygons: &[&[(43.2, 11.4), (48.9, 11.3), (48.9, 9.5), (47.0, 8.0), (44.0, 9.0), (43.2, 11.4)]],
    },
    BuiltinCountry {
        properties: &[("iso_a2", "BR"), ("NAME", "Brazil")],
        polygons: &[&[
            (-60.0, 5.0), (-50.0, 4.0), (-35.0, -5.0), (-39.0, -17.0), (-48.0, -26.0),
            (-53.0, -33.7), (-57.6, -30.2), (-58.0, -20.0), (-65.0, -10.0), (-73.0, -8.0),
            (-70.0, 2.0), (-60.0, 5.0),
        ]],
    },
    BuiltinCountry {
        properties: &[("ISO_A3", "USA"), ("NAME", "United States of America")],
        polygons: &[
            &[
                (-124.7, 48.4), (-95.2, 49.0), (-82.5, 41.7), (-67.0, 44.8), (-75.5, 35.2),
                (-80.0, 25.2), (-84.0, 30.0), (-97.2, 25.9), (-106.5, 31.8), (-117.1, 32.5),
                (-124.3, 40.3), (-124.7, 48.4),
            ],
            &[(-168.0, 65.6), (-141.0, 69.6), (-141.0, 60.3), (-152.0, 57.6), (-165.0, 60.5), (-168.0, 65.6)],
        ],
    },
    BuiltinCountry {
        properties: &[("iso_a3", "AUS"), ("NAME", "Australia")],
        polygons: &[&[
            (113.5, -22.0), (129.0, -14.9), (136.7, -12.2), (142.5, -10.7), (153.6, -28.2),
            (150.0, -37.5), (140.0, -38.0), (135.0, -34.6), (115.0, -34.3), (113.5, -22.0),
        ]],
    },
    BuiltinCountry {
        properties: &[("iso_a3", "RUS"), ("NAME", "Russia")],
        polygons: &[
            &[
                (28.0, 69.0), (60.0, 70.0), (100.0, 77.0), (140.0, 72.0), (180.0, 69.0),
                (180.0, 65.0), (160.0, 60.0), (135.0, 43.0), (87.0, 49.0), (50.0, 47.0),
                (38.0, 47.0), (28.0, 56.0), (28.0, 69.0),
            ],
            &[(-180.0, 69.0), (-175.0, 67.5), (-172.0, 64.5), (-180.0, 65.0), (-180.0, 69.0)],
        ],
    },
    BuiltinCountry {
        properties: &[("iso_a3", "FJI"), ("NAME", "Fiji")],
        polygons: &[
            &[(177.3, -17.5), (178.6, -17.2), (178.7, -18.2), (177.4, -18.2), (177.3, -17.5)],
            &[(178.5, -16.8), (180.0, -16.1), (180.0, -16.6), (178.7, -17.0), (178.5, -16.8)],
            &[(-180.0, -16.1), (-179.8, -16.0), (-179.9, -16.5), (-180.0, -16.6), (-180.0, -16.1)],
        ],
    },
    BuiltinCountry {
        properties: &[("iso_a3", "CHN"), ("NAME", "China")],
        polygons: &[&[
            (73.5, 39.5), (80.0, 45.0), (87.0, 49.0), (97.0, 42.8), (111.0, 43.5),
            (119.7, 49.5), (135.0, 48.3), (130.0, 42.5), (121.6, 40.0), (122.0, 31.0),
            (117.0, 23.5), (108.0, 21.5), (101.0, 21.5), (97.5, 28.0), (79.0, 30.5),
            (73.5, 39.5),
        ]],
    },
];

/// Small built-in world used when no data file is available
pub fn builtin_world() -> FeatureSet {
    let features = BUILTIN_WORLD
        .iter()
        .map(|country| {
            let properties: JsonObject = country
                .properties
                .iter()
                .map(|(k, v)| (k.to_string(), JsonValue::from(*v)))
                .collect();
            let polygons = country.polygons.iter().map(|ring| vec![ring.to_vec()]).collect();
            GeoFeature::multi_polygon(polygons, properties)
        })
        .collect();
    FeatureSet::new(features)
}
