use crate::error::Result;

pub mod maxrects;

/// Size request handed to a packer. `tag` comes back unchanged with the placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackItem<T> {
    pub width: u32,
    pub height: u32,
    pub tag: T,
}

/// A placed item; `width`/`height` equal the request (no rotation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedRect<T> {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub tag: T,
}

/// One atlas page produced by a packer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPage<T> {
    pub page_index: u32,
    pub width: u32,
    pub height: u32,
    pub rects: Vec<PackedRect<T>>,
}

/// A packer places every item on some page.
///
/// Implementations must put each item in exactly one output rect, never overlap
/// rects within a page, keep `margin` pixels free around the page border and
/// between rects, stay inside `page_size`, and never rotate.
pub trait Packer<T> {
    fn pack(
        &mut self,
        items: Vec<PackItem<T>>,
        page_size: (u32, u32),
        margin: u32,
    ) -> Result<Vec<PackedPage<T>>>;
}
