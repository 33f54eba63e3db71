use serde::ser::{SerializeMap, SerializeTuple};
use serde::{Deserialize, Serialize, Serializer};

/// Index of a source frame buffer within one generation run.
pub type SourceId = usize;
/// Index of a distinct region within one generation run (registration order).
pub type RegionId = usize;

/// Axis-aligned rectangle in source pixels. `x,y` is top-left; `right()`/`bottom()` are exclusive.
///
/// `used_pixels` counts opaque pixels that genuinely belong to the rect; it can be lower
/// than `area()` once merges have pulled transparent padding in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub used_pixels: i64,
}

impl Rect {
    /// Fully used rect (`used_pixels == width * height`).
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            used_pixels: width as i64 * height as i64,
        }
    }

    /// One-row opaque run.
    pub fn span(x: i32, y: i32, width: i32) -> Self {
        Self::new(x, y, width, 1)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Transparent pixels included in the bounds.
    pub fn waste(&self) -> i64 {
        self.area() - self.used_pixels
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Bounding rect of both, with `used_pixels` summed.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
            used_pixels: self.used_pixels + other.used_pixels,
        }
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// A finalized, tightened rect of one source frame. The atomic unit submitted to packing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region {
    pub id: RegionId,
    /// Source buffer the pixels are copied from when compositing.
    pub source: SourceId,
    pub rect: Rect,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.rect.width as u32
    }

    pub fn height(&self) -> u32 {
        self.rect.height as u32
    }
}

/// One occurrence of a region inside a frame.
///
/// Draw offsets belong to the occurrence, not the region, so a region shared by
/// frames of different sizes still renders at the right spot in each of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RegionRef {
    pub region: RegionId,
    pub draw_offset_x: f64,
    pub draw_offset_y: f64,
}

/// Ordered region occurrences of one source frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameRegionSet {
    pub refs: Vec<RegionRef>,
}

impl FrameRegionSet {
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }
}

/// Named animation; `frames[n]` is frame number `n` in input order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Animation {
    pub id: String,
    pub frames: Vec<FrameRegionSet>,
}

/// Where the packer put a region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasPlacement {
    pub region: RegionId,
    pub page_index: u32,
    pub page_x: i32,
    pub page_y: i32,
}

/// A single atlas page (logical record).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub index: u32,
    pub width: u32,
    pub height: u32,
}

/// One rect of one output frame.
///
/// Serializes as the positional array
/// `[width, height, page_index, page_x, page_y, draw_offset_x, draw_offset_y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectTuple {
    pub width: u32,
    pub height: u32,
    pub page_index: u32,
    pub page_x: i32,
    pub page_y: i32,
    pub draw_offset_x: f64,
    pub draw_offset_y: f64,
}

impl Serialize for RectTuple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut t = serializer.serialize_tuple(7)?;
        t.serialize_element(&self.width)?;
        t.serialize_element(&self.height)?;
        t.serialize_element(&self.page_index)?;
        t.serialize_element(&self.page_x)?;
        t.serialize_element(&self.page_y)?;
        t.serialize_element(&self.draw_offset_x)?;
        t.serialize_element(&self.draw_offset_y)?;
        t.end()
    }
}

/// Output frames of one animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationOutput {
    pub id: String,
    pub frames: Vec<Vec<RectTuple>>,
}

/// Animation id -> frames -> rect tuples, in the order animations were supplied.
///
/// Serializes as a JSON object keyed by animation id. Frames without regions and
/// animations without frames are not present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputDescription {
    pub animations: Vec<AnimationOutput>,
}

impl OutputDescription {
    pub fn get(&self, id: &str) -> Option<&[Vec<RectTuple>]> {
        self.animations
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.frames.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

impl Serialize for OutputDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.animations.len()))?;
        for anim in &self.animations {
            map.serialize_entry(&anim.id, &anim.frames)?;
        }
        map.end()
    }
}

/// Statistics about an atlas generation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtlasStats {
    /// Number of atlas pages.
    pub num_pages: usize,
    /// Number of distinct regions placed on pages.
    pub num_regions: usize,
    /// Number of region occurrences across all frames.
    pub num_references: usize,
    /// Lookups answered by an already registered frame or region.
    pub dedup_hits: usize,
    /// Sum of page areas.
    pub total_page_area: u64,
    /// Sum of placed region areas.
    pub used_region_area: u64,
    /// used_region_area / total_page_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl AtlasStats {
    pub fn compute(
        pages: &[PageInfo],
        regions: &[Region],
        num_references: usize,
        dedup_hits: usize,
    ) -> Self {
        let total_page_area: u64 = pages
            .iter()
            .map(|p| (p.width as u64) * (p.height as u64))
            .sum();
        let used_region_area: u64 = regions
            .iter()
            .map(|r| (r.width() as u64) * (r.height() as u64))
            .sum();
        let occupancy = if total_page_area > 0 {
            used_region_area as f64 / total_page_area as f64
        } else {
            0.0
        };
        Self {
            num_pages: pages.len(),
            num_regions: regions.len(),
            num_references,
            dedup_hits,
            total_page_area,
            used_region_area,
            occupancy,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Regions: {}, References: {}, Dedup hits: {}, Occupancy: {:.2}%, Used Area: {} px², Wasted Area: {} px², Total Area: {} px²",
            self.num_pages,
            self.num_regions,
            self.num_references,
            self.dedup_hits,
            self.occupancy * 100.0,
            self.used_region_area,
            self.wasted_area(),
            self.total_page_area,
        )
    }

    /// Returns unused page area in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_page_area.saturating_sub(self.used_region_area)
    }
}
