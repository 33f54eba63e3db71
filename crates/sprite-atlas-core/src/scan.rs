//! Alpha scanning: opaque bounds of a buffer or sub-rectangle, and per-row opaque spans.
//!
//! A pixel counts as opaque when its alpha channel is non-zero.

use crate::model::Rect;
use crate::pixels::PixelBuffer;

/// Inclusive bounds of the opaque pixels found in a scanned area, plus their count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphaBounds {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
    pub opaque: i64,
}

impl AlphaBounds {
    /// Bounding rect with `used_pixels` set to the opaque count.
    pub fn to_rect(&self) -> Rect {
        Rect {
            x: self.x_min,
            y: self.y_min,
            width: self.x_max - self.x_min + 1,
            height: self.y_max - self.y_min + 1,
            used_pixels: self.opaque,
        }
    }
}

/// Scans `area` (clipped to the buffer) once and returns the opaque bounds,
/// or `None` when every pixel in it is transparent.
pub fn alpha_bounds(buf: &PixelBuffer, area: &Rect) -> Option<AlphaBounds> {
    let x0 = area.x.max(0);
    let y0 = area.y.max(0);
    let x1 = area.right().min(buf.width() as i32);
    let y1 = area.bottom().min(buf.height() as i32);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let mut x_min = i32::MAX;
    let mut y_min = i32::MAX;
    let mut x_max = -1;
    let mut y_max = -1;
    let mut opaque = 0i64;

    for y in y0..y1 {
        let row = buf.row(y as u32);
        let mut row_first = -1;
        let mut row_last = -1;
        for x in x0..x1 {
            if row[x as usize * 4 + 3] != 0 {
                if row_first < 0 {
                    row_first = x;
                }
                row_last = x;
                opaque += 1;
            }
        }
        if row_first >= 0 {
            x_min = x_min.min(row_first);
            x_max = x_max.max(row_last);
            y_min = y_min.min(y);
            y_max = y;
        }
    }

    if x_max < 0 {
        return None;
    }
    Some(AlphaBounds {
        x_min,
        y_min,
        x_max,
        y_max,
        opaque,
    })
}

/// Opaque bounding rect of the whole buffer.
pub fn opaque_bounds(buf: &PixelBuffer) -> Option<Rect> {
    alpha_bounds(buf, &buf.bounds()).map(|b| b.to_rect())
}

/// Maximal horizontal runs of opaque pixels, row by row, left to right.
pub fn row_spans(buf: &PixelBuffer) -> Vec<Rect> {
    let mut spans = Vec::new();
    let width = buf.width() as i32;
    for y in 0..buf.height() {
        let row = buf.row(y);
        let mut start: Option<i32> = None;
        for x in 0..width {
            let visible = row[x as usize * 4 + 3] != 0;
            match (visible, start) {
                (true, None) => start = Some(x),
                (false, Some(s)) => {
                    spans.push(Rect::span(s, y as i32, x - s));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push(Rect::span(s, y as i32, width - s));
        }
    }
    spans
}
