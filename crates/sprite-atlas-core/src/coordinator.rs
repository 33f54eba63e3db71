use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument};

use crate::config::AtlasConfig;
use crate::error::{AtlasError, Result};
use crate::frame::{FrameClaim, FrameProcessor, extract_rects};
use crate::model::{
    Animation, AnimationOutput, AtlasPlacement, AtlasStats, FrameRegionSet, OutputDescription,
    PageInfo, Rect, RectTuple, Region, RegionId,
};
use crate::packer::maxrects::MaxRectsPacker;
use crate::packer::{PackItem, PackedPage, Packer};
use crate::pixels::PixelBuffer;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One decoded source frame (key + pixels).
#[derive(Debug, Clone)]
pub struct FrameInput {
    pub key: String,
    pub image: PixelBuffer,
}

/// Frames of one animation, in playback order.
#[derive(Debug, Clone)]
pub struct AnimationInput {
    pub id: String,
    pub frames: Vec<FrameInput>,
}

/// Everything a generation run produces.
#[derive(Debug)]
pub struct AtlasOutput {
    pub animations: Vec<Animation>,
    /// Distinct regions, indexed by region id.
    pub regions: Vec<Region>,
    /// Placement of every region, indexed by region id.
    pub placements: Vec<AtlasPlacement>,
    pub pages: Vec<PageInfo>,
    /// Source buffers, indexed by `Region::source`; kept for compositing.
    pub sources: Vec<PixelBuffer>,
    /// Input keys, indexed like `sources`.
    pub source_keys: Vec<String>,
    pub description: OutputDescription,
    pub stats: AtlasStats,
}

impl AtlasOutput {
    pub fn placement(&self, region: RegionId) -> Option<&AtlasPlacement> {
        self.placements.get(region)
    }

    /// Source buffer and sub-rectangle to copy for `region`.
    pub fn source_of(&self, region: RegionId) -> Option<(&PixelBuffer, Rect)> {
        let r = self.regions.get(region)?;
        Some((self.sources.get(r.source)?, r.rect))
    }
}

/// Drives frame processing for all animations, then packing and output assembly.
#[derive(Debug)]
pub struct AtlasCoordinator {
    cfg: AtlasConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl AtlasCoordinator {
    pub fn new(cfg: AtlasConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg, cancel: None })
    }

    /// Setting `flag` aborts the run with [`AtlasError::Cancelled`] at the next frame boundary.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn check_cancel(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(AtlasError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Default packer for this configuration.
    pub fn default_packer(&self) -> MaxRectsPacker {
        MaxRectsPacker {
            heuristic: self.cfg.heuristic,
            sort_order: self.cfg.sort_order,
            fit_to_content: self.cfg.fit_pages_to_content,
        }
    }

    /// Extracts, deduplicates and packs all frames of `animations`.
    ///
    /// Notes:
    /// - Regions are registered in input order (animation order, then frame order), which
    ///   is also the order they are submitted to `packer`.
    /// - Frames without opaque pixels are kept in `AtlasOutput::animations` but left out of
    ///   the output description.
    #[instrument(skip_all)]
    pub fn run<P: Packer<RegionId>>(
        &self,
        animations: Vec<AnimationInput>,
        packer: &mut P,
    ) -> Result<AtlasOutput> {
        let frame_count: usize = animations.iter().map(|a| a.frames.len()).sum();
        if frame_count == 0 {
            return Err(AtlasError::Empty);
        }

        // Flatten to source ids in input order.
        let mut sources: Vec<PixelBuffer> = Vec::with_capacity(frame_count);
        let mut source_keys: Vec<String> = Vec::with_capacity(frame_count);
        let mut layout: Vec<(String, usize)> = Vec::with_capacity(animations.len());
        for anim in animations {
            layout.push((anim.id, anim.frames.len()));
            for frame in anim.frames {
                sources.push(frame.image);
                source_keys.push(frame.key);
            }
        }

        let mut processor = FrameProcessor::new(self.cfg.clone());
        let claims: Vec<FrameClaim> = (0..sources.len())
            .map(|source| processor.claim_frame(&sources, source))
            .collect();
        let extracted = self.extract_all(&sources, &claims)?;

        let mut sets: Vec<FrameRegionSet> = Vec::with_capacity(frame_count);
        for (source, (claim, rects)) in claims.into_iter().zip(extracted).enumerate() {
            self.check_cancel()?;
            sets.push(processor.complete(&sources, source, claim, rects));
        }
        let dedup_hits = processor.dedup_hits();
        let regions = processor.into_regions();
        debug!(frames = frame_count, regions = regions.len(), dedup_hits, "frames processed");

        let mut sets = sets.into_iter();
        let animations: Vec<Animation> = layout
            .into_iter()
            .map(|(id, n)| Animation {
                id,
                frames: sets.by_ref().take(n).collect(),
            })
            .collect();

        let items: Vec<PackItem<RegionId>> = regions
            .iter()
            .map(|r| PackItem {
                width: r.width(),
                height: r.height(),
                tag: r.id,
            })
            .collect();
        let packed = if items.is_empty() {
            Vec::new()
        } else {
            packer.pack(
                items,
                (self.cfg.page_width, self.cfg.page_height),
                self.cfg.margin,
            )?
        };
        let (placements, pages) = collect_placements(&regions, packed)?;

        let description = describe(&animations, &regions, &placements);
        let num_references = animations
            .iter()
            .flat_map(|a| a.frames.iter())
            .map(|f| f.len())
            .sum();
        let stats = AtlasStats::compute(&pages, &regions, num_references, dedup_hits);
        info!(
            frames = frame_count,
            regions = regions.len(),
            pages = pages.len(),
            occupancy = format!("{:.2}%", stats.occupancy * 100.0),
            "atlas generated"
        );

        Ok(AtlasOutput {
            animations,
            regions,
            placements,
            pages,
            sources,
            source_keys,
            description,
            stats,
        })
    }

    fn extract_all(
        &self,
        sources: &[PixelBuffer],
        claims: &[FrameClaim],
    ) -> Result<Vec<Vec<Rect>>> {
        let extract = |buf: &PixelBuffer, claim: &FrameClaim| -> Result<Vec<Rect>> {
            self.check_cancel()?;
            match claim {
                FrameClaim::Duplicate(_) => Ok(Vec::new()),
                FrameClaim::New(_) | FrameClaim::Untracked => extract_rects(buf, &self.cfg),
            }
        };

        #[cfg(feature = "parallel")]
        {
            if self.cfg.parallel {
                return sources
                    .par_iter()
                    .zip(claims.par_iter())
                    .map(|(buf, claim)| extract(buf, claim))
                    .collect();
            }
        }

        sources
            .iter()
            .zip(claims.iter())
            .map(|(buf, claim)| extract(buf, claim))
            .collect()
    }
}

/// Validates the packer's answer and turns it into a placement table indexed by region id.
fn collect_placements(
    regions: &[Region],
    packed: Vec<PackedPage<RegionId>>,
) -> Result<(Vec<AtlasPlacement>, Vec<PageInfo>)> {
    let mut table: Vec<Option<AtlasPlacement>> = vec![None; regions.len()];
    let mut pages = Vec::with_capacity(packed.len());
    for page in packed {
        for r in page.rects {
            let region = regions.get(r.tag).ok_or_else(|| {
                AtlasError::PackerContract(format!("unknown region {} returned", r.tag))
            })?;
            if r.width != region.width() || r.height != region.height() {
                return Err(AtlasError::PackerContract(format!(
                    "region {} resized from {}x{} to {}x{}",
                    r.tag,
                    region.width(),
                    region.height(),
                    r.width,
                    r.height
                )));
            }
            if r.x.saturating_add(r.width) > page.width || r.y.saturating_add(r.height) > page.height
            {
                return Err(AtlasError::PackerContract(format!(
                    "region {} placed outside page {}",
                    r.tag, page.page_index
                )));
            }
            let slot = &mut table[r.tag];
            if slot.is_some() {
                return Err(AtlasError::PackerContract(format!(
                    "region {} placed twice",
                    r.tag
                )));
            }
            *slot = Some(AtlasPlacement {
                region: r.tag,
                page_index: page.page_index,
                page_x: r.x as i32,
                page_y: r.y as i32,
            });
        }
        pages.push(PageInfo {
            index: page.page_index,
            width: page.width,
            height: page.height,
        });
    }
    let placements = table
        .into_iter()
        .enumerate()
        .map(|(id, p)| {
            p.ok_or_else(|| AtlasError::PackerContract(format!("region {id} was not placed")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((placements, pages))
}

/// Expands frame region sets into output tuples. Shared regions yield one tuple per occurrence.
fn describe(
    animations: &[Animation],
    regions: &[Region],
    placements: &[AtlasPlacement],
) -> OutputDescription {
    let animations = animations
        .iter()
        .filter_map(|anim| {
            let frames: Vec<Vec<RectTuple>> = anim
                .frames
                .iter()
                .filter(|set| !set.is_empty())
                .map(|set| {
                    set.refs
                        .iter()
                        .map(|r| {
                            let region = &regions[r.region];
                            let placement = &placements[r.region];
                            RectTuple {
                                width: region.width(),
                                height: region.height(),
                                page_index: placement.page_index,
                                page_x: placement.page_x,
                                page_y: placement.page_y,
                                draw_offset_x: r.draw_offset_x,
                                draw_offset_y: r.draw_offset_y,
                            }
                        })
                        .collect()
                })
                .collect();
            (!frames.is_empty()).then(|| AnimationOutput {
                id: anim.id.clone(),
                frames,
            })
        })
        .collect();
    OutputDescription { animations }
}

/// Runs a full generation with the default MaxRects packer built from `cfg`.
///
/// Quick example:
/// ```ignore
/// use sprite_atlas_core::{AnimationInput, AtlasConfig, FrameInput, decode, generate_atlas};
/// # fn main() -> anyhow::Result<()> {
/// let idle = AnimationInput {
///     id: "IDLE".into(),
///     frames: vec![FrameInput { key: "idle_0.png".into(), image: decode(&std::fs::read("idle_0.png")?)? }],
/// };
/// let out = generate_atlas(vec![idle], AtlasConfig::default())?;
/// println!("{}", sprite_atlas_core::to_json(&out.description));
/// # Ok(()) }
/// ```
pub fn generate_atlas(animations: Vec<AnimationInput>, cfg: AtlasConfig) -> Result<AtlasOutput> {
    let coordinator = AtlasCoordinator::new(cfg)?;
    let mut packer = coordinator.default_packer();
    coordinator.run(animations, &mut packer)
}
