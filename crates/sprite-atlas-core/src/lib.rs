//! Core library for turning sprite animation frames into atlas layouts.
//!
//! - Extraction: each frame is reduced to tight opaque regions (row spans merged under a
//!   waste budget, or fixed grid cells), capped at a maximum region size
//! - Deduplication: byte-identical regions (or whole frames) share one atlas slot
//! - Packing: regions go through the [`Packer`] trait; [`MaxRectsPacker`] is the default
//! - Output: an [`OutputDescription`] per animation plus composed page images
//!
//! Quick example:
//! ```ignore
//! use sprite_atlas_core::{AnimationInput, AtlasConfig, FrameInput, decode, generate_atlas};
//! # fn main() -> anyhow::Result<()> {
//! let frames = ["idle_0.png", "idle_1.png"]
//!     .iter()
//!     .map(|p| Ok(FrameInput { key: p.to_string(), image: decode(&std::fs::read(p)?)? }))
//!     .collect::<anyhow::Result<Vec<_>>>()?;
//! let cfg = AtlasConfig { page_width: 1024, page_height: 1024, ..Default::default() };
//! let out = generate_atlas(vec![AnimationInput { id: "IDLE".into(), frames }], cfg)?;
//! println!("pages: {}", out.pages.len());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod coordinator;
pub mod dedup;
pub mod error;
pub mod export;
pub mod frame;
pub mod merge;
pub mod model;
pub mod packer;
pub mod pixels;
pub mod scan;

pub use compositing::*;
pub use config::*;
pub use coordinator::*;
pub use dedup::*;
pub use error::*;
pub use export::*;
pub use frame::*;
pub use merge::*;
pub use model::*;
pub use packer::maxrects::{MaxRectsPacker, MaxRectsPage};
pub use packer::*;
pub use pixels::*;
pub use scan::*;

/// Convenience prelude for common types and functions.
/// Importing `sprite_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        AtlasConfig, AtlasConfigBuilder, DedupGranularity, MaxRectsHeuristic, SortOrder,
        TilingMode,
    };
    pub use crate::model::{
        Animation, AtlasPlacement, AtlasStats, FrameRegionSet, OutputDescription, PageInfo, Rect,
        RectTuple, Region, RegionId, RegionRef,
    };
    pub use crate::packer::{PackItem, PackedPage, PackedRect, Packer};
    pub use crate::{
        AnimationInput, AtlasCoordinator, AtlasOutput, FrameInput, MaxRectsPacker, PixelBuffer,
        compose_pages, decode, generate_atlas, to_json,
    };
}
