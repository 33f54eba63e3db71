use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::merge::MergeLimits;

/// How a frame is cut into candidate regions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TilingMode {
    /// The whole frame at once; islands are merged when `merge_islands` is on.
    WholeImage,
    /// Fixed `cell_size` square grid; every non-empty cell is cropped on its own.
    Grid { cell_size: u32 },
}

impl FromStr for TilingMode {
    type Err = ();
    /// Accepts `whole`, `whole_image`, `grid:N` and `grid=N`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        if matches!(s.as_str(), "whole" | "whole_image" | "wholeimage") {
            return Ok(Self::WholeImage);
        }
        let rest = s
            .strip_prefix("grid:")
            .or_else(|| s.strip_prefix("grid="))
            .ok_or(())?;
        let cell_size = rest.trim().parse::<u32>().map_err(|_| ())?;
        Ok(Self::Grid { cell_size })
    }
}

/// Granularity of duplicate detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DedupGranularity {
    /// Every region gets its own atlas entry.
    Off,
    /// Byte-identical source frames share all their regions.
    Frame,
    /// Byte-identical regions are shared, whichever frame they come from.
    Region,
}

impl FromStr for DedupGranularity {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "frame" => Ok(Self::Frame),
            "region" | "tile" => Ok(Self::Region),
            _ => Err(()),
        }
    }
}

/// MaxRects placement heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    BestAreaFit,
    BestShortSideFit,
    BestLongSideFit,
    BottomLeft,
    ContactPoint,
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Order in which the packer considers regions. Sorting is stable; ties keep registration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    AreaDesc,
    MaxSideDesc,
    HeightDesc,
    WidthDesc,
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "area_desc" => Ok(Self::AreaDesc),
            "max_side_desc" => Ok(Self::MaxSideDesc),
            "height_desc" => Ok(Self::HeightDesc),
            "width_desc" => Ok(Self::WidthDesc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtlasConfig {
    /// Horizontal pivot as a fraction of the source frame width (0 = left, 1 = right).
    pub pivot_x: f64,
    /// Vertical pivot as a fraction of the source frame height (0 = top, 1 = bottom).
    pub pivot_y: f64,
    /// Largest width/height of any region.
    pub max_rect_size: u32,
    /// Largest waste in pixels a single merge may introduce.
    pub merge_waste_budget: u64,
    /// Whole-image mode: merge opaque spans into regions (true) or take one bounding box (false).
    pub merge_islands: bool,
    pub tiling: TilingMode,
    pub dedup: DedupGranularity,

    /// Atlas page width in pixels.
    pub page_width: u32,
    /// Atlas page height in pixels.
    pub page_height: u32,
    /// Pixels kept free around the page border and between regions.
    pub margin: u32,
    pub heuristic: MaxRectsHeuristic,
    pub sort_order: SortOrder,
    /// Shrink each page to the extent of what was placed on it.
    pub fit_pages_to_content: bool,

    /// Extract frames on the rayon pool when feature "parallel" is on.
    pub parallel: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            pivot_x: 0.5,
            pivot_y: 0.5,
            max_rect_size: 512,
            merge_waste_budget: 8192,
            merge_islands: true,
            tiling: TilingMode::WholeImage,
            dedup: DedupGranularity::Region,
            page_width: 2048,
            page_height: 2048,
            margin: 2,
            heuristic: MaxRectsHeuristic::BestAreaFit,
            sort_order: SortOrder::AreaDesc,
            fit_pages_to_content: false,
            parallel: false,
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - A pivot lies outside `[0, 1]`
    /// - `max_rect_size` or a grid cell size is zero
    /// - Page dimensions are zero, or the margin leaves no usable space
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasError;

        for (name, v) in [("pivot_x", self.pivot_x), ("pivot_y", self.pivot_y)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(AtlasError::InvalidConfig(format!(
                    "{name} ({v}) must be within [0, 1]"
                )));
            }
        }

        if self.max_rect_size == 0 {
            return Err(AtlasError::InvalidConfig(
                "max_rect_size must be positive".into(),
            ));
        }

        if let TilingMode::Grid { cell_size: 0 } = self.tiling {
            return Err(AtlasError::InvalidConfig(
                "grid cell_size must be positive".into(),
            ));
        }

        if self.page_width == 0 || self.page_height == 0 {
            return Err(AtlasError::InvalidDimensions {
                width: self.page_width,
                height: self.page_height,
            });
        }

        let total_margin = self.margin.saturating_mul(2);
        if total_margin >= self.page_width || total_margin >= self.page_height {
            return Err(AtlasError::InvalidConfig(format!(
                "margin ({}) * 2 exceeds page dimensions ({}x{})",
                self.margin, self.page_width, self.page_height
            )));
        }

        Ok(())
    }

    pub fn merge_limits(&self) -> MergeLimits {
        MergeLimits {
            max_rect_size: self.max_rect_size,
            merge_waste_budget: self.merge_waste_budget,
        }
    }

    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn pivot(mut self, x: f64, y: f64) -> Self {
        self.cfg.pivot_x = x;
        self.cfg.pivot_y = y;
        self
    }
    pub fn max_rect_size(mut self, v: u32) -> Self {
        self.cfg.max_rect_size = v;
        self
    }
    pub fn merge_waste_budget(mut self, v: u64) -> Self {
        self.cfg.merge_waste_budget = v;
        self
    }
    pub fn merge_islands(mut self, v: bool) -> Self {
        self.cfg.merge_islands = v;
        self
    }
    pub fn tiling(mut self, v: TilingMode) -> Self {
        self.cfg.tiling = v;
        self
    }
    pub fn dedup(mut self, v: DedupGranularity) -> Self {
        self.cfg.dedup = v;
        self
    }
    pub fn with_page_size(mut self, w: u32, h: u32) -> Self {
        self.cfg.page_width = w;
        self.cfg.page_height = h;
        self
    }
    pub fn margin(mut self, v: u32) -> Self {
        self.cfg.margin = v;
        self
    }
    pub fn heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.cfg.heuristic = v;
        self
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.sort_order = v;
        self
    }
    pub fn fit_pages_to_content(mut self, v: bool) -> Self {
        self.cfg.fit_pages_to_content = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}
