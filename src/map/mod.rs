mod feature;
mod geometry;
mod highlight;
mod identity;
mod path;
mod projection;
mod renderer;
mod spatial;
mod viewport;

pub use feature::{FeatureGeometry, GeoFeature, PropertyBag, Ring};
pub use highlight::{
    Callout, CalloutStyle, Ellipse, HighlightGeometry, SmallFeatureHighlighter, DEFAULT_SAMPLE_STRIDE,
    MIN_ELLIPSE_RADIUS,
};
pub use identity::{is_plausible_code, CountryCode, IdentityCache, IdentityResolver, IDENTITY_KEYS, NO_DATA};
pub use path::{PathBuilder, PathCommand, PathDescription, DEFAULT_WRAP_RATIO};
pub use projection::{project, LonMode, ProjectedPoint, Projector, MAX_LATITUDE, PACIFIC_WRAP_LON};
pub use renderer::{MapLayers, MapRenderer, ViewMode};
pub use viewport::{ContentBox, PixelPoint, ViewportFitter, ViewportTransform, GROUP_EXPANSION, SINGLE_EXPANSION};
