//! Greedy region merging.
//!
//! Row spans are agglomerated pairwise, always taking the pair whose bounding
//! rect wastes the fewest transparent pixels, until the cheapest merge would
//! exceed the waste budget. Every merge also swallows whatever else its new
//! bounds touch, so the working set never contains overlapping rects. Two
//! post-passes follow: oversize rects are cut at `max_rect_size`, and every
//! rect is shrunk back to the opaque pixels it actually holds.

use tracing::{debug, trace};

use crate::error::{AtlasError, Result};
use crate::model::Rect;
use crate::pixels::PixelBuffer;
use crate::scan::{alpha_bounds, row_spans};

/// Limits applied while merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeLimits {
    /// Largest width or height a rect may have.
    pub max_rect_size: u32,
    /// Largest waste (transparent pixels pulled in) a single merge may add.
    pub merge_waste_budget: u64,
}

impl MergeLimits {
    fn max_side(&self) -> i32 {
        self.max_rect_size.min(i32::MAX as u32) as i32
    }

    fn budget(&self) -> i64 {
        self.merge_waste_budget.min(i64::MAX as u64) as i64
    }
}

/// Full merger pipeline for one buffer: spans, greedy merge, size split, tightening.
pub fn merge_regions(buf: &PixelBuffer, limits: MergeLimits) -> Result<Vec<Rect>> {
    let spans = row_spans(buf);
    if spans.is_empty() {
        return Ok(Vec::new());
    }
    let span_count = spans.len();
    let merged = merge_spans(spans, limits);
    debug!(spans = span_count, rects = merged.len(), "merged spans");
    consolidate(buf, merged, limits.max_rect_size)
}

/// Greedy pairwise agglomeration of disjoint rects.
///
/// Ties between equally cheap pairs go to the first pair in `(i, j)` order, `i < j`,
/// over the current list. Absorbed rects are removed in place and the merged rect is
/// appended, so the order of the survivors is stable.
pub fn merge_spans(mut rects: Vec<Rect>, limits: MergeLimits) -> Vec<Rect> {
    let max = limits.max_side();
    let budget = limits.budget();
    let mut absorbed: Vec<usize> = Vec::new();

    while rects.len() > 1 {
        let Some((i, j, waste)) = cheapest_pair(&rects, max) else {
            break;
        };
        if waste > budget {
            trace!(waste, budget, "cheapest merge over budget");
            break;
        }

        let mut merged = rects[i].union(&rects[j]);
        absorbed.clear();
        absorbed.push(i);
        absorbed.push(j);

        // Fold in everything the new bounds touch until nothing else intersects.
        let mut k = 0;
        while k < rects.len() {
            if !absorbed.contains(&k) && merged.intersects(&rects[k]) {
                merged = merged.union(&rects[k]);
                absorbed.push(k);
                k = 0;
            } else {
                k += 1;
            }
        }
        trace!(
            waste,
            absorbed = absorbed.len(),
            x = merged.x,
            y = merged.y,
            w = merged.width,
            h = merged.height,
            "merge"
        );

        let mut idx = 0;
        rects.retain(|_| {
            let keep = !absorbed.contains(&idx);
            idx += 1;
            keep
        });
        rects.push(merged);
    }
    rects
}

/// Pair with the smallest union waste whose union fits `max` on both axes.
fn cheapest_pair(rects: &[Rect], max: i32) -> Option<(usize, usize, i64)> {
    let mut best: Option<(usize, usize, i64)> = None;
    for i in 0..rects.len() {
        let a = &rects[i];
        for (j, b) in rects.iter().enumerate().skip(i + 1) {
            let candidate = a.union(b);
            if candidate.width > max || candidate.height > max {
                continue;
            }
            let waste = candidate.waste();
            if best.is_none_or(|(_, _, w)| waste < w) {
                best = Some((i, j, waste));
                // Nothing beats zero, and the first zero found wins the tie.
                if waste == 0 {
                    return best;
                }
            }
        }
    }
    best
}

/// Cuts every rect wider or taller than `max_rect_size` at the bound.
///
/// The left (or top) piece keeps the bound; the remainder is queued and cut again if
/// needed. `used_pixels` of the pieces is an estimate until [`tighten`] recounts it.
pub fn enforce_max_size(mut rects: Vec<Rect>, max_rect_size: u32) -> Vec<Rect> {
    let max = max_rect_size.clamp(1, i32::MAX as u32) as i32;
    let mut i = 0;
    while i < rects.len() {
        let r = rects[i];
        if r.width > max {
            let (head, tail) = split_at(r, max, true);
            rects[i] = head;
            rects.push(tail);
        } else if r.height > max {
            let (head, tail) = split_at(r, max, false);
            rects[i] = head;
            rects.push(tail);
        } else {
            i += 1;
        }
    }
    rects
}

fn split_at(r: Rect, at: i32, along_x: bool) -> (Rect, Rect) {
    let (mut head, mut tail) = (r, r);
    if along_x {
        head.width = at;
        tail.x = r.x + at;
        tail.width = r.width - at;
    } else {
        head.height = at;
        tail.y = r.y + at;
        tail.height = r.height - at;
    }
    head.used_pixels = r.used_pixels.min(head.area());
    tail.used_pixels = (r.used_pixels - head.used_pixels).clamp(0, tail.area());
    (head, tail)
}

/// Shrinks every rect to the opaque pixels inside it and recounts `used_pixels`.
/// Rects with no opaque pixel left are dropped.
pub fn tighten(buf: &PixelBuffer, rects: Vec<Rect>) -> Vec<Rect> {
    rects
        .into_iter()
        .filter_map(|r| alpha_bounds(buf, &r).map(|b| b.to_rect()))
        .collect()
}

/// Size split followed by tightening. Fails with [`AtlasError::OversizeRegion`] if a
/// rect is still larger than `max_rect_size` afterwards.
pub fn consolidate(buf: &PixelBuffer, rects: Vec<Rect>, max_rect_size: u32) -> Result<Vec<Rect>> {
    let rects = tighten(buf, enforce_max_size(rects, max_rect_size));
    let max = max_rect_size.min(i32::MAX as u32) as i32;
    if let Some(r) = rects.iter().find(|r| r.width > max || r.height > max) {
        return Err(AtlasError::OversizeRegion {
            width: r.width,
            height: r.height,
            max: max_rect_size,
        });
    }
    Ok(rects)
}
