use crate::map::{
    CalloutStyle, ContentBox, LonMode, PathBuilder, Projector, SmallFeatureHighlighter, ViewMode,
    DEFAULT_SAMPLE_STRIDE, DEFAULT_WRAP_RATIO, GROUP_EXPANSION, MIN_ELLIPSE_RADIUS, PACIFIC_WRAP_LON,
    SINGLE_EXPANSION,
};

/// Country used as the "is this small?" yardstick
pub const DEFAULT_REFERENCE: &str = "NLD";

/// Rendering tunables shared by the fitter, path builder and highlighter
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Raw code of the reference country, resolved against the loaded data
    pub reference: String,
    pub sample_stride: usize,
    pub wrap_ratio: f64,
    pub padding: f64,
    pub wrap_lon: f64,
    pub single_expansion: f64,
    pub group_expansion: f64,
    pub min_radius: f64,
    pub callout: CalloutStyle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference: DEFAULT_REFERENCE.to_string(),
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            wrap_ratio: DEFAULT_WRAP_RATIO,
            padding: ContentBox::DEFAULT_PADDING,
            wrap_lon: PACIFIC_WRAP_LON,
            single_expansion: SINGLE_EXPANSION,
            group_expansion: GROUP_EXPANSION,
            min_radius: MIN_ELLIPSE_RADIUS,
            callout: CalloutStyle::default(),
        }
    }
}

impl EngineConfig {
    pub fn path_builder(&self) -> PathBuilder {
        PathBuilder::new(self.wrap_ratio)
    }

    pub fn highlighter(&self) -> SmallFeatureHighlighter {
        SmallFeatureHighlighter {
            sample_stride: self.sample_stride,
            min_radius: self.min_radius,
            callout: self.callout,
        }
    }

    pub fn projector(&self, mode: LonMode) -> Projector {
        Projector::new(mode).with_wrap_lon(self.wrap_lon)
    }

    /// Content box for a view of `width` x `height` pixels
    pub fn content_box(&self, view: ViewMode, width: f64, height: f64) -> ContentBox {
        let content = match view {
            ViewMode::World => ContentBox::new(width, height).with_expansion(self.group_expansion),
            ViewMode::WorldCentered => ContentBox::world_centered(width, height),
            ViewMode::Single => ContentBox::new(width, height).with_expansion(self.single_expansion),
        };
        content.with_padding(self.padding)
    }
}
