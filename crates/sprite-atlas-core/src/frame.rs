//! Per-frame region extraction and registration.
//!
//! Extraction ([`extract_rects`]) is pure and may run on any thread. Registration
//! goes through a single [`FrameProcessor`], which owns the duplicate indices and
//! hands out region ids, so it is always driven from one thread in input order.

use tracing::debug;

use crate::config::{AtlasConfig, DedupGranularity, TilingMode};
use crate::dedup::{DuplicateIndex, Lookup};
use crate::error::Result;
use crate::merge::{consolidate, merge_regions};
use crate::model::{FrameRegionSet, Rect, Region, RegionId, RegionRef, SourceId};
use crate::pixels::PixelBuffer;
use crate::scan::{alpha_bounds, opaque_bounds};

/// Candidate rects of one frame, tightened and size-bounded, in deterministic order:
/// scan order (y, then x) for whole-image mode, row-major cell order for grid mode.
pub fn extract_rects(buf: &PixelBuffer, cfg: &AtlasConfig) -> Result<Vec<Rect>> {
    match cfg.tiling {
        TilingMode::WholeImage => {
            let mut rects = if cfg.merge_islands {
                merge_regions(buf, cfg.merge_limits())?
            } else {
                match opaque_bounds(buf) {
                    Some(bounds) => consolidate(buf, vec![bounds], cfg.max_rect_size)?,
                    None => Vec::new(),
                }
            };
            sort_scan_order(&mut rects);
            Ok(rects)
        }
        TilingMode::Grid { cell_size } => grid_rects(buf, cell_size, cfg.max_rect_size),
    }
}

fn sort_scan_order(rects: &mut [Rect]) {
    rects.sort_by(|a, b| a.y.cmp(&b.y).then_with(|| a.x.cmp(&b.x)));
}

fn grid_rects(buf: &PixelBuffer, cell_size: u32, max_rect_size: u32) -> Result<Vec<Rect>> {
    let cell = cell_size.clamp(1, i32::MAX as u32) as i32;
    let (w, h) = (buf.width() as i32, buf.height() as i32);
    let mut out = Vec::new();
    let mut cy = 0;
    while cy < h {
        let mut cx = 0;
        while cx < w {
            let cell_rect = Rect::new(cx, cy, cell.min(w - cx), cell.min(h - cy));
            if let Some(bounds) = alpha_bounds(buf, &cell_rect) {
                let mut pieces = consolidate(buf, vec![bounds.to_rect()], max_rect_size)?;
                sort_scan_order(&mut pieces);
                out.extend(pieces);
            }
            cx = cx.saturating_add(cell);
        }
        cy = cy.saturating_add(cell);
    }
    Ok(out)
}

/// Outcome of the whole-frame duplicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClaim {
    /// Frame dedup is not active for this run.
    Untracked,
    /// First frame with this content; its regions get recorded under the entry.
    New(usize),
    /// Same content as an earlier frame; reuse that frame's regions.
    Duplicate(usize),
}

/// Registers extracted rects as regions and builds frame region sets.
///
/// Frames are addressed by [`SourceId`] into a caller-owned slice of buffers. The same
/// slice (or a longer one with the same prefix) must be passed to every call, since
/// duplicate confirmation reads earlier frames back from it.
#[derive(Debug)]
pub struct FrameProcessor {
    cfg: AtlasConfig,
    regions: Vec<Region>,
    region_index: DuplicateIndex<RegionId>,
    frame_index: DuplicateIndex<SourceId>,
    /// Region id and occurrence rect of every region of a first-seen frame, per frame entry.
    frame_regions: Vec<Vec<(RegionId, Rect)>>,
}

impl FrameProcessor {
    pub fn new(cfg: AtlasConfig) -> Self {
        Self {
            cfg,
            regions: Vec::new(),
            region_index: DuplicateIndex::new(),
            frame_index: DuplicateIndex::new(),
            frame_regions: Vec::new(),
        }
    }

    /// Extracts and registers frame `source`.
    pub fn process(&mut self, sources: &[PixelBuffer], source: SourceId) -> Result<FrameRegionSet> {
        let claim = self.claim_frame(sources, source);
        let rects = match claim {
            FrameClaim::Duplicate(_) => Vec::new(),
            FrameClaim::New(_) | FrameClaim::Untracked => extract_rects(&sources[source], &self.cfg)?,
        };
        Ok(self.complete(sources, source, claim, rects))
    }

    /// Whole-frame duplicate check. Claims must be completed in the order they were made.
    pub fn claim_frame(&mut self, sources: &[PixelBuffer], source: SourceId) -> FrameClaim {
        if self.cfg.dedup != DedupGranularity::Frame {
            return FrameClaim::Untracked;
        }
        let buf = &sources[source];
        let content = buf.content(&buf.bounds());
        let stored = |&s: &SourceId| sources[s].content(&sources[s].bounds());
        match self.frame_index.lookup_or_register(content, source, stored) {
            Lookup::Existing(entry) => FrameClaim::Duplicate(entry),
            Lookup::Registered(entry) => {
                self.frame_regions.push(Vec::new());
                FrameClaim::New(entry)
            }
        }
    }

    /// Registers `rects` (ignored for duplicates) and returns the frame's region set.
    ///
    /// Draw offsets come from each occurrence's own rect, so a region shared with an
    /// earlier frame (or with another cell of the same frame) is drawn where it appears here.
    pub fn complete(
        &mut self,
        sources: &[PixelBuffer],
        source: SourceId,
        claim: FrameClaim,
        rects: Vec<Rect>,
    ) -> FrameRegionSet {
        let occurrences: Vec<(RegionId, Rect)> = match claim {
            // Identical pixels and dimensions, so the first frame's rects apply as-is.
            FrameClaim::Duplicate(entry) => self.frame_regions[entry].clone(),
            FrameClaim::New(_) | FrameClaim::Untracked => rects
                .into_iter()
                .map(|rect| (self.register_region(sources, source, rect), rect))
                .collect(),
        };
        if let FrameClaim::New(entry) = claim {
            self.frame_regions[entry] = occurrences.clone();
        }

        let buf = &sources[source];
        let (w, h) = (buf.width() as f64, buf.height() as f64);
        let refs: Vec<RegionRef> = occurrences
            .into_iter()
            .map(|(region, rect)| RegionRef {
                region,
                draw_offset_x: rect.x as f64 - w * self.cfg.pivot_x,
                draw_offset_y: rect.y as f64 - h * self.cfg.pivot_y,
            })
            .collect();
        debug!(source, regions = refs.len(), ?claim, "frame registered");
        FrameRegionSet { refs }
    }

    fn register_region(&mut self, sources: &[PixelBuffer], source: SourceId, rect: Rect) -> RegionId {
        let id = self.regions.len();
        if self.cfg.dedup == DedupGranularity::Region {
            let content = sources[source].content(&rect);
            let regions = &self.regions;
            let stored = |&r: &RegionId| {
                let region = &regions[r];
                sources[region.source].content(&region.rect)
            };
            // Every region passes through the index in this mode, so keys are region ids.
            if let Lookup::Existing(entry) = self.region_index.lookup_or_register(content, id, stored)
            {
                return self.region_index.key(entry).copied().unwrap_or(entry);
            }
        }
        self.regions.push(Region { id, source, rect });
        id
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    /// Lookups answered by an existing frame or region.
    pub fn dedup_hits(&self) -> usize {
        self.region_index.hits() + self.frame_index.hits()
    }
}
