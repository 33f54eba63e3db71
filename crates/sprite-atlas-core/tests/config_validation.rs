use sprite_atlas_core::config::{
    AtlasConfig, DedupGranularity, MaxRectsHeuristic, SortOrder, TilingMode,
};
use sprite_atlas_core::error::AtlasError;

#[test]
fn defaults_are_valid() {
    let cfg = AtlasConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!((cfg.pivot_x, cfg.pivot_y), (0.5, 0.5));
    assert_eq!(cfg.max_rect_size, 512);
    assert_eq!(cfg.merge_waste_budget, 8192);
    assert_eq!((cfg.page_width, cfg.page_height, cfg.margin), (2048, 2048, 2));
    assert_eq!(cfg.dedup, DedupGranularity::Region);
    assert_eq!(cfg.tiling, TilingMode::WholeImage);
}

#[test]
fn pivot_outside_unit_range_is_rejected() {
    for (x, y) in [(-0.1, 0.5), (0.5, 1.01), (f64::NAN, 0.0)] {
        let cfg = AtlasConfig::builder().pivot(x, y).build();
        assert!(
            matches!(cfg.validate(), Err(AtlasError::InvalidConfig(_))),
            "pivot ({x}, {y}) accepted"
        );
    }
    let edges = AtlasConfig::builder().pivot(0.0, 1.0).build();
    assert!(edges.validate().is_ok());
}

#[test]
fn zero_sizes_are_rejected() {
    let cfg = AtlasConfig::builder().max_rect_size(0).build();
    assert!(matches!(cfg.validate(), Err(AtlasError::InvalidConfig(_))));

    let cfg = AtlasConfig::builder()
        .tiling(TilingMode::Grid { cell_size: 0 })
        .build();
    assert!(matches!(cfg.validate(), Err(AtlasError::InvalidConfig(_))));

    let cfg = AtlasConfig::builder().with_page_size(0, 64).build();
    assert!(matches!(
        cfg.validate(),
        Err(AtlasError::InvalidDimensions {
            width: 0,
            height: 64
        })
    ));
}

#[test]
fn margin_must_leave_room() {
    let cfg = AtlasConfig::builder()
        .with_page_size(64, 64)
        .margin(32)
        .build();
    match cfg.validate() {
        Err(AtlasError::InvalidConfig(msg)) => assert!(msg.contains("margin"), "{msg}"),
        other => panic!("unexpected: {other:?}"),
    }
    let cfg = AtlasConfig::builder()
        .with_page_size(64, 64)
        .margin(31)
        .build();
    assert!(cfg.validate().is_ok());
}

#[test]
fn enums_parse_from_cli_strings() {
    assert_eq!("whole".parse::<TilingMode>(), Ok(TilingMode::WholeImage));
    assert_eq!(
        "grid:32".parse::<TilingMode>(),
        Ok(TilingMode::Grid { cell_size: 32 })
    );
    assert_eq!(
        "GRID=16".parse::<TilingMode>(),
        Ok(TilingMode::Grid { cell_size: 16 })
    );
    assert!("grid:x".parse::<TilingMode>().is_err());

    assert_eq!("none".parse::<DedupGranularity>(), Ok(DedupGranularity::Off));
    assert_eq!("Frame".parse::<DedupGranularity>(), Ok(DedupGranularity::Frame));
    assert_eq!("tile".parse::<DedupGranularity>(), Ok(DedupGranularity::Region));

    assert_eq!("cp".parse::<MaxRectsHeuristic>(), Ok(MaxRectsHeuristic::ContactPoint));
    assert_eq!("height_desc".parse::<SortOrder>(), Ok(SortOrder::HeightDesc));
    assert!("diagonal".parse::<SortOrder>().is_err());
}

#[test]
fn partial_json_config_falls_back_to_defaults() {
    let cfg: AtlasConfig = serde_json::from_str(
        r#"{"max_rect_size": 256, "dedup": "frame", "tiling": {"grid": {"cell_size": 64}}}"#,
    )
    .unwrap();
    assert_eq!(cfg.max_rect_size, 256);
    assert_eq!(cfg.dedup, DedupGranularity::Frame);
    assert_eq!(cfg.tiling, TilingMode::Grid { cell_size: 64 });
    assert_eq!(cfg.merge_waste_budget, 8192);
    assert_eq!(cfg.margin, 2);
}
