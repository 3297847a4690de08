use geojson::JsonObject;

/// A closed ring of (lon, lat) vertices
pub type Ring = Vec<(f64, f64)>;

/// Untyped feature metadata as handed over by the GeoJSON loader
pub type PropertyBag = JsonObject;

/// Boundary geometry of a country feature
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureGeometry {
    /// Outer ring followed by holes
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl FeatureGeometry {
    /// Every ring of the geometry, regardless of polygon nesting
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        let polygons: &[Vec<Ring>] = match self {
            FeatureGeometry::Polygon(rings) => std::slice::from_ref(rings),
            FeatureGeometry::MultiPolygon(polygons) => polygons,
        };
        polygons.iter().flat_map(|rings| rings.iter())
    }
}

/// Immutable boundary record: geometry plus its property bag.
/// A feature without geometry is still carried so its identity can be listed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoFeature {
    pub geometry: Option<FeatureGeometry>,
    pub properties: PropertyBag,
}

impl GeoFeature {
    pub fn new(geometry: Option<FeatureGeometry>, properties: PropertyBag) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Single-polygon feature
    pub fn polygon(rings: Vec<Ring>, properties: PropertyBag) -> Self {
        Self::new(Some(FeatureGeometry::Polygon(rings)), properties)
    }

    /// Multi-polygon feature
    pub fn multi_polygon(polygons: Vec<Vec<Ring>>, properties: PropertyBag) -> Self {
        Self::new(Some(FeatureGeometry::MultiPolygon(polygons)), properties)
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    /// All rings (empty when the geometry is missing)
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.geometry.iter().flat_map(|g| g.rings())
    }

    /// All (lon, lat) vertices in ring order
    pub fn vertices(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.rings().flat_map(|ring| ring.iter().copied())
    }
}
