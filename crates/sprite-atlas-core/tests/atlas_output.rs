use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use image::{Rgba, RgbaImage};
use sprite_atlas_core::prelude::*;
use sprite_atlas_core::{AtlasError, Result, to_json_string};

fn frame(key: &str, w: u32, h: u32, blocks: &[(u32, u32, u32, u32, [u8; 4])]) -> FrameInput {
    let mut img = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
    for &(x, y, bw, bh, c) in blocks {
        for yy in y..y + bh {
            for xx in x..x + bw {
                img.put_pixel(xx, yy, Rgba(c));
            }
        }
    }
    FrameInput {
        key: key.into(),
        image: PixelBuffer::from(img),
    }
}

fn anim(id: &str, frames: Vec<FrameInput>) -> AnimationInput {
    AnimationInput {
        id: id.into(),
        frames,
    }
}

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

#[test]
fn identical_frames_share_one_region_and_placement() {
    let idle = anim(
        "IDLE",
        vec![
            frame("idle_0", 10, 10, &[(2, 2, 3, 3, RED)]),
            frame("idle_1", 10, 10, &[(2, 2, 3, 3, RED)]),
        ],
    );
    let out = generate_atlas(vec![idle], AtlasConfig::default()).unwrap();

    assert_eq!(out.regions.len(), 1);
    assert_eq!(out.placements.len(), 1);
    assert_eq!(out.pages.len(), 1);
    assert_eq!(out.stats.num_references, 2);
    assert_eq!(out.stats.dedup_hits, 1);
    assert_eq!(out.stats.wasted_area(), 2048 * 2048 - 9);
    assert!(
        out.stats.summary().contains("Wasted Area: 4194295 px²"),
        "{}",
        out.stats.summary()
    );

    let frames = out.description.get("IDLE").unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], frames[1]);
    let t = frames[0][0];
    assert_eq!((t.width, t.height, t.page_index), (3, 3, 0));
    assert_eq!((t.page_x, t.page_y), (2, 2)); // margin 2 from the page border
    assert_eq!((t.draw_offset_x, t.draw_offset_y), (-3.0, -3.0));
}

#[test]
fn moved_sprite_shares_a_placement_with_its_own_offsets() {
    let walk = anim(
        "MOVE",
        vec![
            frame("move_0", 16, 16, &[(2, 3, 4, 4, GREEN)]),
            frame("move_1", 16, 16, &[(9, 6, 4, 4, GREEN)]),
        ],
    );
    let out = generate_atlas(vec![walk], AtlasConfig::default()).unwrap();
    assert_eq!(out.regions.len(), 1);

    let frames = out.description.get("MOVE").unwrap();
    let (a, b) = (frames[0][0], frames[1][0]);
    assert_eq!((a.page_x, a.page_y), (b.page_x, b.page_y));
    assert_eq!((a.draw_offset_x, a.draw_offset_y), (-6.0, -5.0));
    assert_eq!((b.draw_offset_x, b.draw_offset_y), (1.0, -2.0));
}

#[test]
fn json_is_keyed_by_animation_in_input_order() {
    let out = generate_atlas(
        vec![
            anim("MOVE", vec![frame("m0", 8, 8, &[(0, 0, 2, 2, RED)])]),
            anim("IDLE", vec![frame("i0", 8, 8, &[(4, 4, 4, 4, GREEN)])]),
        ],
        AtlasConfig::default(),
    )
    .unwrap();

    let json = to_json(&out.description);
    let obj = json.as_object().unwrap();
    let keys: Vec<&String> = obj.keys().collect();
    assert_eq!(keys, ["MOVE", "IDLE"]);

    let tuple = &json["IDLE"][0][0];
    let arr = tuple.as_array().unwrap();
    assert_eq!(arr.len(), 7);
    assert_eq!(arr[0], 4);
    assert_eq!(arr[1], 4);
    assert!(arr[2].is_u64() && arr[3].is_i64() && arr[4].is_i64());
    assert_eq!(arr[5].as_f64(), Some(0.0));
    assert_eq!(arr[6].as_f64(), Some(0.0));

    // serde and the Value builder agree
    assert_eq!(serde_json::to_value(&out.description).unwrap(), json);
    assert!(to_json_string(&out.description, false).starts_with("{\"MOVE\":[[["));
}

#[test]
fn empty_frames_and_animations_are_omitted() {
    let out = generate_atlas(
        vec![
            anim(
                "IDLE",
                vec![
                    frame("i0", 6, 6, &[]),
                    frame("i1", 6, 6, &[(1, 1, 2, 2, RED)]),
                ],
            ),
            anim("ATTACK", vec![frame("a0", 6, 6, &[])]),
        ],
        AtlasConfig::default(),
    )
    .unwrap();

    assert_eq!(out.animations.len(), 2);
    assert_eq!(out.animations[0].frames.len(), 2);
    assert!(out.animations[0].frames[0].is_empty());
    assert_eq!(out.description.get("IDLE").unwrap().len(), 1);
    assert!(out.description.get("ATTACK").is_none());
}

#[test]
fn all_transparent_input_produces_no_pages() {
    let out = generate_atlas(
        vec![anim("IDLE", vec![frame("i0", 4, 4, &[])])],
        AtlasConfig::default(),
    )
    .unwrap();
    assert!(out.description.is_empty());
    assert!(out.pages.is_empty());
    assert_eq!(out.stats.occupancy, 0.0);
}

#[test]
fn no_frames_is_an_error() {
    let err = generate_atlas(vec![anim("IDLE", vec![])], AtlasConfig::default()).unwrap_err();
    assert!(matches!(err, AtlasError::Empty));
}

#[test]
fn invalid_config_is_rejected_before_work() {
    let cfg = AtlasConfig::builder().pivot(1.5, 0.5).build();
    let err = generate_atlas(
        vec![anim("IDLE", vec![frame("i0", 4, 4, &[(0, 0, 1, 1, RED)])])],
        cfg,
    )
    .unwrap_err();
    assert!(matches!(err, AtlasError::InvalidConfig(_)));
}

#[test]
fn cancelled_run_returns_cancelled() {
    let flag = Arc::new(AtomicBool::new(true));
    let coordinator = AtlasCoordinator::new(AtlasConfig::default())
        .unwrap()
        .with_cancel_flag(flag);
    let mut packer = coordinator.default_packer();
    let err = coordinator
        .run(
            vec![anim("IDLE", vec![frame("i0", 4, 4, &[(0, 0, 1, 1, RED)])])],
            &mut packer,
        )
        .unwrap_err();
    assert!(matches!(err, AtlasError::Cancelled));
}

#[test]
fn parallel_flag_gives_same_output() {
    let make = || {
        (0..6)
            .map(|i| {
                frame(
                    &format!("f{i}"),
                    24,
                    24,
                    &[(i, 1, 3, 5, RED), (10, 10 + i, 4, 2, GREEN)],
                )
            })
            .collect::<Vec<_>>()
    };
    let seq = generate_atlas(vec![anim("MOVE", make())], AtlasConfig::default()).unwrap();
    let par = generate_atlas(
        vec![anim("MOVE", make())],
        AtlasConfig::builder().parallel(true).build(),
    )
    .unwrap();
    assert_eq!(seq.description, par.description);
    assert_eq!(seq.regions, par.regions);
}

#[test]
fn regions_over_page_size_fail() {
    let cfg = AtlasConfig::builder().with_page_size(16, 16).build();
    let err = generate_atlas(
        vec![anim("IDLE", vec![frame("i0", 20, 20, &[(0, 0, 14, 14, RED)])])],
        cfg,
    )
    .unwrap_err();
    assert!(matches!(err, AtlasError::RegionTooLarge { .. }), "{err}");
}

/// Packer that drops the last item.
struct LossyPacker;

impl Packer<RegionId> for LossyPacker {
    fn pack(
        &mut self,
        mut items: Vec<PackItem<RegionId>>,
        page_size: (u32, u32),
        margin: u32,
    ) -> Result<Vec<PackedPage<RegionId>>> {
        items.pop();
        let mut inner = MaxRectsPacker::default();
        inner.pack(items, page_size, margin)
    }
}

/// Packer that reports every item one pixel wider.
struct StretchingPacker;

impl Packer<RegionId> for StretchingPacker {
    fn pack(
        &mut self,
        items: Vec<PackItem<RegionId>>,
        page_size: (u32, u32),
        margin: u32,
    ) -> Result<Vec<PackedPage<RegionId>>> {
        let mut pages = MaxRectsPacker::default().pack(items, page_size, margin)?;
        for r in pages.iter_mut().flat_map(|p| p.rects.iter_mut()) {
            r.width += 1;
        }
        Ok(pages)
    }
}

#[test]
fn packer_contract_violations_are_detected() {
    let input = || {
        vec![anim(
            "IDLE",
            vec![frame("i0", 32, 32, &[(0, 0, 2, 2, RED), (20, 20, 5, 5, GREEN)])],
        )]
    };
    let cfg = AtlasConfig::builder().merge_waste_budget(0).build();
    let coordinator = AtlasCoordinator::new(cfg).unwrap();

    let err = coordinator.run(input(), &mut LossyPacker).unwrap_err();
    assert!(matches!(err, AtlasError::PackerContract(ref m) if m.contains("not placed")), "{err}");

    let err = coordinator.run(input(), &mut StretchingPacker).unwrap_err();
    assert!(matches!(err, AtlasError::PackerContract(ref m) if m.contains("resized")), "{err}");
}

#[test]
fn regions_are_submitted_in_registration_order() {
    struct Recorder(Vec<RegionId>);
    impl Packer<RegionId> for Recorder {
        fn pack(
            &mut self,
            items: Vec<PackItem<RegionId>>,
            page_size: (u32, u32),
            margin: u32,
        ) -> Result<Vec<PackedPage<RegionId>>> {
            self.0 = items.iter().map(|i| i.tag).collect();
            MaxRectsPacker::default().pack(items, page_size, margin)
        }
    }

    let coordinator = AtlasCoordinator::new(AtlasConfig::default()).unwrap();
    let mut rec = Recorder(Vec::new());
    let out = coordinator
        .run(
            vec![
                anim("IDLE", vec![frame("i0", 8, 8, &[(0, 0, 2, 2, RED)])]),
                anim("MOVE", vec![frame("m0", 8, 8, &[(0, 0, 3, 1, GREEN)])]),
            ],
            &mut rec,
        )
        .unwrap();
    assert_eq!(rec.0, vec![0, 1]);
    assert_eq!(out.regions[1].source, 1);
}
