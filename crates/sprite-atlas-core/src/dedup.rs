//! Exact-content registry for frames and regions.
//!
//! An xxHash64 digest narrows the candidates; equality is always confirmed by
//! comparing dimensions and every byte, so digest collisions only cost time.
//! The index keeps no pixels of its own: each entry is a caller-chosen key, and
//! confirmation reads the stored content back through a resolver.

use std::collections::HashMap;
use std::hash::Hasher;

use tracing::trace;
use twox_hash::XxHash64;

/// Borrowed pixel content: `width * height` RGBA pixels, row-major.
///
/// Rows may be `stride` bytes apart, so a sub-rectangle of a larger buffer can be
/// viewed without copying.
#[derive(Debug, Clone, Copy)]
pub struct PixelContent<'a> {
    pub width: u32,
    pub height: u32,
    stride: usize,
    pixels: &'a [u8],
}

impl<'a> PixelContent<'a> {
    /// Tightly packed content; `pixels` holds exactly `height` rows of `width * 4` bytes.
    pub fn new(width: u32, height: u32, pixels: &'a [u8]) -> Self {
        Self::strided(width, height, width as usize * 4, pixels)
    }

    /// Content whose rows start `stride` bytes apart, beginning at `pixels[0]`.
    pub fn strided(width: u32, height: u32, stride: usize, pixels: &'a [u8]) -> Self {
        Self {
            width,
            height,
            stride,
            pixels,
        }
    }

    /// RGBA bytes of each row, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> {
        let (row_len, stride, pixels) = (self.width as usize * 4, self.stride, self.pixels);
        (0..self.height as usize).map(move |y| {
            let start = y * stride;
            &pixels[start..start + row_len]
        })
    }

    /// 64-bit content digest over dimensions and bytes.
    pub fn digest(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write_u32(self.width);
        hasher.write_u32(self.height);
        for row in self.rows() {
            hasher.write(row);
        }
        hasher.finish()
    }

    /// Same dimensions and identical bytes.
    pub fn same_as(&self, other: &PixelContent<'_>) -> bool {
        self.width == other.width && self.height == other.height && self.rows().eq(other.rows())
    }
}

/// Result of [`DuplicateIndex::lookup_or_register`]; both carry the entry index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Identical content was registered before.
    Existing(usize),
    /// The content is new and now registered under this index.
    Registered(usize),
}

impl Lookup {
    pub fn entry(self) -> usize {
        match self {
            Lookup::Existing(i) | Lookup::Registered(i) => i,
        }
    }

    pub fn is_existing(self) -> bool {
        matches!(self, Lookup::Existing(_))
    }
}

/// Registry of distinct pixel contents, one key per entry. Entry indices are dense,
/// in registration order.
pub struct DuplicateIndex<K> {
    by_digest: HashMap<u64, Vec<usize>>,
    keys: Vec<K>,
    hits: usize,
}

impl<K> Default for DuplicateIndex<K> {
    fn default() -> Self {
        Self {
            by_digest: HashMap::new(),
            keys: Vec::new(),
            hits: 0,
        }
    }
}

impl<K> std::fmt::Debug for DuplicateIndex<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateIndex")
            .field("entries", &self.keys.len())
            .field("hits", &self.hits)
            .finish()
    }
}

impl<K> DuplicateIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry index of content identical to `content`, if any. `stored` maps a key back
    /// to the content it was registered with.
    pub fn lookup<'s, F>(&self, content: &PixelContent<'_>, stored: F) -> Option<usize>
    where
        F: Fn(&K) -> PixelContent<'s>,
    {
        self.find(content.digest(), content, &stored)
    }

    fn find<'s, F>(&self, digest: u64, content: &PixelContent<'_>, stored: &F) -> Option<usize>
    where
        F: Fn(&K) -> PixelContent<'s>,
    {
        self.by_digest
            .get(&digest)?
            .iter()
            .copied()
            .find(|&i| stored(&self.keys[i]).same_as(content))
    }

    /// Returns the existing entry for identical content, or registers `key` for it.
    ///
    /// Content registered under `key` must stay readable through `stored` for as long
    /// as the index is used.
    pub fn lookup_or_register<'s, F>(&mut self, content: PixelContent<'_>, key: K, stored: F) -> Lookup
    where
        F: Fn(&K) -> PixelContent<'s>,
    {
        let digest = content.digest();
        if let Some(i) = self.find(digest, &content, &stored) {
            self.hits += 1;
            trace!(entry = i, w = content.width, h = content.height, "duplicate content");
            return Lookup::Existing(i);
        }
        let i = self.keys.len();
        self.keys.push(key);
        self.by_digest.entry(digest).or_default().push(i);
        Lookup::Registered(i)
    }

    /// Key registered for entry `i`.
    pub fn key(&self, i: usize) -> Option<&K> {
        self.keys.get(i)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of lookups answered with [`Lookup::Existing`].
    pub fn hits(&self) -> usize {
        self.hits
    }
}
