use image::{Rgba, RgbaImage};
use tracing::instrument;

use crate::coordinator::AtlasOutput;
use crate::model::Rect;
use crate::pixels::PixelBuffer;

/// Copy `rect` of `src` into `canvas` with its top-left corner at (dx, dy).
/// Pixels falling outside `canvas` are skipped. With `outlines`, a red 1px frame
/// is drawn over the border of the copied area for debugging.
pub fn blit_region(
    src: &PixelBuffer,
    rect: &Rect,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    outlines: bool,
) {
    let (cw, ch) = canvas.dimensions();
    let clipped = Rect::new(
        rect.x.max(0),
        rect.y.max(0),
        rect.right().min(src.width() as i32) - rect.x.max(0),
        rect.bottom().min(src.height() as i32) - rect.y.max(0),
    );
    if clipped.width <= 0 || clipped.height <= 0 {
        return;
    }
    let (rw, rh) = (clipped.width as u32, clipped.height as u32);

    for yy in 0..rh {
        if dy + yy >= ch {
            break;
        }
        let row = src.row(clipped.y as u32 + yy);
        for xx in 0..rw {
            if dx + xx >= cw {
                break;
            }
            let i = (clipped.x as usize + xx as usize) * 4;
            let px = Rgba([row[i], row[i + 1], row[i + 2], row[i + 3]]);
            canvas.put_pixel(dx + xx, dy + yy, px);
        }
    }

    if outlines {
        let red = Rgba([255, 0, 0, 255]);
        for xx in 0..rw {
            if dx + xx < cw && dy < ch {
                canvas.put_pixel(dx + xx, dy, red);
            }
            let by = dy + rh - 1;
            if dx + xx < cw && by < ch {
                canvas.put_pixel(dx + xx, by, red);
            }
        }
        for yy in 0..rh {
            if dx < cw && dy + yy < ch {
                canvas.put_pixel(dx, dy + yy, red);
            }
            let rx = dx + rw - 1;
            if rx < cw && dy + yy < ch {
                canvas.put_pixel(rx, dy + yy, red);
            }
        }
    }
}

/// Render every atlas page: a transparent canvas of the page size with each
/// placed region copied in from its source frame.
#[instrument(skip_all)]
pub fn compose_pages(out: &AtlasOutput, outlines: bool) -> Vec<RgbaImage> {
    let mut canvases: Vec<RgbaImage> = out
        .pages
        .iter()
        .map(|p| RgbaImage::from_pixel(p.width, p.height, Rgba([0, 0, 0, 0])))
        .collect();
    for placement in &out.placements {
        let Some((src, rect)) = out.source_of(placement.region) else {
            continue;
        };
        let Some(canvas) = out
            .pages
            .iter()
            .position(|p| p.index == placement.page_index)
            .and_then(|i| canvases.get_mut(i))
        else {
            continue;
        };
        blit_region(
            src,
            &rect,
            canvas,
            placement.page_x.max(0) as u32,
            placement.page_y.max(0) as u32,
            outlines,
        );
    }
    canvases
}
