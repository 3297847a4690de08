use std::fmt;

use crate::map::feature::{GeoFeature, Ring};
use crate::map::viewport::{PixelPoint, ViewportTransform};

/// Default dateline-wrap break: a horizontal jump wider than this share of the
/// content width starts a new subpath. Empirically tuned for world-boundary data;
/// it can falsely break very wide geometry at high zoom.
pub const DEFAULT_WRAP_RATIO: f64 = 0.5;

/// One draw instruction in content-box pixel space
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(PixelPoint),
    LineTo(PixelPoint),
    /// End of a ring
    Close,
}

/// Ordered draw instructions for one feature
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathDescription {
    commands: Vec<PathCommand>,
}

impl PathDescription {
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Point runs between moves and closes. Each run is one visible polyline;
    /// for filling and hit testing it is treated as implicitly closed.
    pub fn subpaths(&self) -> Vec<Vec<PixelPoint>> {
        let mut runs = Vec::new();
        let mut current: Vec<PixelPoint> = Vec::new();
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    if !current.is_empty() {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.push(p);
                }
                PathCommand::LineTo(p) => current.push(p),
                PathCommand::Close => {
                    if !current.is_empty() {
                        runs.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }

    /// Pixel bounding box (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.commands
            .iter()
            .filter_map(|cmd| match *cmd {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(p),
                PathCommand::Close => None,
            })
            .fold(None, |acc, p| match acc {
                None => Some((p.x, p.y, p.x, p.y)),
                Some((x0, y0, x1, y1)) => Some((x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))),
            })
    }

    /// Even-odd containment test over all subpaths
    pub fn contains(&self, point: PixelPoint) -> bool {
        let mut inside = false;
        for run in self.subpaths() {
            if run.len() < 3 {
                continue;
            }
            let mut j = run.len() - 1;
            for i in 0..run.len() {
                let (a, b) = (run[i], run[j]);
                if (a.y > point.y) != (b.y > point.y) {
                    let cross_x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
                    if point.x < cross_x {
                        inside = !inside;
                    }
                }
                j = i;
            }
        }
        inside
    }
}

impl From<Vec<PathCommand>> for PathDescription {
    fn from(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }
}

/// SVG path data (`M x y L x y ... Z`)
impl fmt::Display for PathDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match cmd {
                PathCommand::MoveTo(p) => write!(f, "M{:.2} {:.2}", p.x, p.y)?,
                PathCommand::LineTo(p) => write!(f, "L{:.2} {:.2}", p.x, p.y)?,
                PathCommand::Close => f.write_str("Z")?,
            }
        }
        Ok(())
    }
}

/// Turns feature rings into pixel-space draw instructions
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathBuilder {
    /// Share of the content width above which a horizontal jump breaks the path
    pub wrap_ratio: f64,
}

impl PathBuilder {
    pub fn new(wrap_ratio: f64) -> Self {
        Self { wrap_ratio }
    }

    /// Project and map every ring vertex; each ring starts with a move and ends
    /// with a close. Wrap-around jumps become moves instead of lines.
    pub fn build<'a>(
        &self,
        rings: impl IntoIterator<Item = &'a Ring>,
        transform: &ViewportTransform,
    ) -> PathDescription {
        let threshold = transform.width * self.wrap_ratio;
        let mut commands = Vec::new();

        for ring in rings {
            if ring.is_empty() {
                continue;
            }
            let mut prev_x: Option<f64> = None;
            for &(lon, lat) in ring {
                let p = transform.to_pixel(lon, lat);
                let jump = prev_x.map_or(true, |px| (p.x - px).abs() > threshold);
                commands.push(if jump {
                    PathCommand::MoveTo(p)
                } else {
                    PathCommand::LineTo(p)
                });
                prev_x = Some(p.x);
            }
            commands.push(PathCommand::Close);
        }

        PathDescription { commands }
    }

    /// Path of every ring of the feature; empty when it has no geometry
    pub fn build_feature(&self, feature: &GeoFeature, transform: &ViewportTransform) -> PathDescription {
        self.build(feature.rings(), transform)
    }
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_WRAP_RATIO)
    }
}
