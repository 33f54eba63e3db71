use tracing::debug;

use super::{PackItem, PackedPage, PackedRect, Packer};
use crate::config::{MaxRectsHeuristic, SortOrder};
use crate::error::{AtlasError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

impl Slot {
    fn right(&self) -> u32 {
        self.x + self.w
    }
    fn bottom(&self) -> u32 {
        self.y + self.h
    }
    fn intersects(&self, o: &Slot) -> bool {
        self.x < o.right() && o.x < self.right() && self.y < o.bottom() && o.y < self.bottom()
    }
    fn contains(&self, o: &Slot) -> bool {
        o.x >= self.x && o.y >= self.y && o.right() <= self.right() && o.bottom() <= self.bottom()
    }
}

/// Single page MaxRects free-list. Reservations never rotate.
#[derive(Debug)]
pub struct MaxRectsPage {
    bounds: Slot,
    free: Vec<Slot>,
    used: Vec<Slot>,
    heuristic: MaxRectsHeuristic,
}

impl MaxRectsPage {
    /// Usable area starts `margin` pixels in from the top-left corner. Callers reserve
    /// `w + margin` by `h + margin` per item, which leaves the same gap on the far sides.
    pub fn new(width: u32, height: u32, margin: u32, heuristic: MaxRectsHeuristic) -> Self {
        let bounds = Slot {
            x: margin,
            y: margin,
            w: width.saturating_sub(margin),
            h: height.saturating_sub(margin),
        };
        Self {
            bounds,
            free: vec![bounds],
            used: Vec::new(),
            heuristic,
        }
    }

    /// Reserves a `w` x `h` slot and returns its top-left corner.
    pub fn insert(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w == 0 || h == 0 {
            return None;
        }
        let slot = self.find_position(w, h)?;
        self.place(slot);
        Some((slot.x, slot.y))
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }

    fn find_position(&self, w: u32, h: u32) -> Option<Slot> {
        let mut best: Option<(Slot, (i64, i64), u32)> = None;
        for fr in &self.free {
            if fr.w < w || fr.h < h {
                continue;
            }
            let candidate = Slot {
                x: fr.x,
                y: fr.y,
                w,
                h,
            };
            if fr.w == w && fr.h == h {
                return Some(candidate);
            }
            let score = self.score(fr, w, h);
            let top = fr.y + h;
            // tie-break: smaller top side, then smaller x
            let better = match &best {
                None => true,
                Some((b, bs, btop)) => {
                    score < *bs || (score == *bs && (top < *btop || (top == *btop && fr.x < b.x)))
                }
            };
            if better {
                best = Some((candidate, score, top));
            }
        }
        best.map(|(slot, _, _)| slot)
    }

    fn score(&self, fr: &Slot, w: u32, h: u32) -> (i64, i64) {
        let leftover_h = (fr.w - w) as i64;
        let leftover_v = (fr.h - h) as i64;
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = fr.w as i64 * fr.h as i64 - w as i64 * h as i64;
        match self.heuristic {
            MaxRectsHeuristic::BestAreaFit => (area_fit, short_fit),
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BottomLeft => (fr.y as i64, fr.x as i64),
            MaxRectsHeuristic::ContactPoint => {
                let contact = self.contact_score(&Slot {
                    x: fr.x,
                    y: fr.y,
                    w,
                    h,
                });
                (-(contact as i64), area_fit)
            }
        }
    }

    fn contact_score(&self, node: &Slot) -> u64 {
        let mut score = 0u64;
        if node.x == self.bounds.x || node.right() == self.bounds.right() {
            score += node.h as u64;
        }
        if node.y == self.bounds.y || node.bottom() == self.bounds.bottom() {
            score += node.w as u64;
        }
        for u in &self.used {
            if node.x == u.right() || u.x == node.right() {
                score += overlap_1d(node.y, node.bottom(), u.y, u.bottom()) as u64;
            }
            if node.y == u.bottom() || u.y == node.bottom() {
                score += overlap_1d(node.x, node.right(), u.x, u.right()) as u64;
            }
        }
        score
    }

    /// Cuts every free rect the node touches into its maximal leftovers, then prunes
    /// free rects contained in others.
    fn place(&mut self, node: Slot) {
        let mut next: Vec<Slot> = Vec::with_capacity(self.free.len() + 4);
        for fr in &self.free {
            if !fr.intersects(&node) {
                next.push(*fr);
                continue;
            }
            if node.x > fr.x {
                next.push(Slot {
                    x: fr.x,
                    y: fr.y,
                    w: node.x - fr.x,
                    h: fr.h,
                });
            }
            if node.right() < fr.right() {
                next.push(Slot {
                    x: node.right(),
                    y: fr.y,
                    w: fr.right() - node.right(),
                    h: fr.h,
                });
            }
            if node.y > fr.y {
                next.push(Slot {
                    x: fr.x,
                    y: fr.y,
                    w: fr.w,
                    h: node.y - fr.y,
                });
            }
            if node.bottom() < fr.bottom() {
                next.push(Slot {
                    x: fr.x,
                    y: node.bottom(),
                    w: fr.w,
                    h: fr.bottom() - node.bottom(),
                });
            }
        }
        self.free = next;
        self.prune();
        self.used.push(node);
    }

    fn prune(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.swap_remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }
}

fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    a2.min(b2).saturating_sub(a1.max(b1))
}

/// Multi-page MaxRects packer: fills one page at a time, opening a new page for
/// whatever did not fit.
#[derive(Debug, Clone)]
pub struct MaxRectsPacker {
    pub heuristic: MaxRectsHeuristic,
    pub sort_order: SortOrder,
    /// Report each page at the extent of its content (plus margin) instead of `page_size`.
    pub fit_to_content: bool,
}

impl Default for MaxRectsPacker {
    fn default() -> Self {
        Self {
            heuristic: MaxRectsHeuristic::BestAreaFit,
            sort_order: SortOrder::AreaDesc,
            fit_to_content: false,
        }
    }
}

impl MaxRectsPacker {
    pub fn new(heuristic: MaxRectsHeuristic, sort_order: SortOrder) -> Self {
        Self {
            heuristic,
            sort_order,
            fit_to_content: false,
        }
    }

    fn sorted_indices<T>(&self, items: &[PackItem<T>]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..items.len()).collect();
        let area = |i: usize| items[i].width as u64 * items[i].height as u64;
        match self.sort_order {
            SortOrder::None => {}
            SortOrder::AreaDesc => order.sort_by(|&a, &b| area(b).cmp(&area(a))),
            SortOrder::MaxSideDesc => order.sort_by(|&a, &b| {
                let side = |i: usize| items[i].width.max(items[i].height);
                side(b).cmp(&side(a))
            }),
            SortOrder::HeightDesc => order.sort_by(|&a, &b| items[b].height.cmp(&items[a].height)),
            SortOrder::WidthDesc => order.sort_by(|&a, &b| items[b].width.cmp(&items[a].width)),
        }
        order
    }
}

impl<T> Packer<T> for MaxRectsPacker {
    fn pack(
        &mut self,
        items: Vec<PackItem<T>>,
        page_size: (u32, u32),
        margin: u32,
    ) -> Result<Vec<PackedPage<T>>> {
        let (page_w, page_h) = page_size;
        let total = items.len();
        for it in &items {
            let fits = it.width.saturating_add(margin.saturating_mul(2)) <= page_w
                && it.height.saturating_add(margin.saturating_mul(2)) <= page_h;
            if it.width == 0 || it.height == 0 || !fits {
                return Err(AtlasError::RegionTooLarge {
                    width: it.width,
                    height: it.height,
                    page_width: page_w,
                    page_height: page_h,
                    margin,
                });
            }
        }

        let mut remaining = self.sorted_indices(&items);
        let mut slots: Vec<Option<PackItem<T>>> = items.into_iter().map(Some).collect();
        let mut pages: Vec<PackedPage<T>> = Vec::new();
        let mut placed_total = 0usize;

        while !remaining.is_empty() {
            let mut page = MaxRectsPage::new(page_w, page_h, margin, self.heuristic);
            let mut rects: Vec<PackedRect<T>> = Vec::new();
            remaining.retain(|&idx| {
                let Some(item) = slots[idx].as_ref() else {
                    return false;
                };
                let reserve_w = item.width + margin;
                let reserve_h = item.height + margin;
                match page.insert(reserve_w, reserve_h) {
                    Some((x, y)) => {
                        if let Some(item) = slots[idx].take() {
                            rects.push(PackedRect {
                                x,
                                y,
                                width: item.width,
                                height: item.height,
                                tag: item.tag,
                            });
                        }
                        false
                    }
                    None => true,
                }
            });

            if rects.is_empty() {
                return Err(AtlasError::OutOfSpace {
                    placed: placed_total,
                    total,
                });
            }
            placed_total += rects.len();

            let (width, height) = if self.fit_to_content {
                let w = rects.iter().map(|r| r.x + r.width).max().unwrap_or(0) + margin;
                let h = rects.iter().map(|r| r.y + r.height).max().unwrap_or(0) + margin;
                (w.min(page_w), h.min(page_h))
            } else {
                (page_w, page_h)
            };
            debug!(
                page = pages.len(),
                rects = rects.len(),
                free = page.free_list_len(),
                "page filled"
            );
            pages.push(PackedPage {
                page_index: pages.len() as u32,
                width,
                height,
                rects,
            });
        }
        Ok(pages)
    }
}
