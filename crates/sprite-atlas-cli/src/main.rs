use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use sprite_atlas_core::config::{
    AtlasConfig, DedupGranularity, MaxRectsHeuristic, SortOrder, TilingMode,
};
use sprite_atlas_core::{
    AnimationInput, AtlasOutput, FrameInput, compose_pages, decode_keyed, generate_atlas,
    to_json, to_layout_json,
};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "sprite-atlas",
    about = "Turn sprite animation frames into atlas pages and an animation layout",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract, deduplicate and pack frames; write page images and animations.json
    Generate(GenerateArgs),
    /// Layout-only: compute placements and write animations.json (no page images)
    Layout(GenerateArgs),
}

#[derive(Parser, Debug, Clone)]
struct GenerateArgs {
    // Input/Output
    /// Animation input as ID=PATH (PATH is an image file or a directory); repeatable
    #[arg(long = "animation", value_name = "ID=PATH", help_heading = "Input/Output")]
    animations: Vec<String>,
    /// Directory whose images are assigned to animations by filename prefix
    #[arg(long, value_name = "PATH", help_heading = "Input/Output")]
    auto: Option<PathBuf>,
    /// Animation ids recognised by --auto (case-insensitive prefixes)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "IDLE,MOVE,ATTACK",
        help_heading = "Input/Output"
    )]
    animation_ids: Vec<String>,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// YAML config file path (overrides extraction/layout options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// What to do when a frame fails to decode: skip | abort
    #[arg(long, value_parser = ["skip", "abort"], default_value = "skip", help_heading = "Input/Output")]
    on_decode_error: String,

    // Extraction
    /// Horizontal pivot (0 = left edge, 1 = right edge)
    #[arg(long, default_value_t = 0.5, help_heading = "Extraction")]
    pivot_x: f64,
    /// Vertical pivot (0 = top edge, 1 = bottom edge)
    #[arg(long, default_value_t = 0.5, help_heading = "Extraction")]
    pivot_y: f64,
    /// Largest region width/height
    #[arg(long, default_value_t = 512, help_heading = "Extraction")]
    max_rect_size: u32,
    /// Largest number of transparent pixels a single merge may add
    #[arg(long, default_value_t = 8192, help_heading = "Extraction")]
    merge_waste_budget: u64,
    /// Merge opaque islands into regions (false: one bounding box per frame)
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Extraction")]
    merge_islands: bool,
    /// Tiling: whole | grid:N
    #[arg(long, default_value = "whole", help_heading = "Extraction")]
    tiling: String,
    /// Duplicate detection: off | frame | region
    #[arg(long, default_value = "region", help_heading = "Extraction")]
    dedup: String,
    /// Extract frames in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Extraction")]
    parallel: bool,

    // Layout
    /// Page width
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    page_width: u32,
    /// Page height
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    page_height: u32,
    /// Pixels kept free around the page border and between regions
    #[arg(long, default_value_t = 2, help_heading = "Layout")]
    margin: u32,
    /// MaxRects heuristic: baf|bssf|blsf|bl|cp
    #[arg(long, default_value = "baf", help_heading = "Layout")]
    heuristic: String,
    /// Sort order: area_desc|max_side_desc|height_desc|width_desc|none
    #[arg(long, default_value = "area_desc", help_heading = "Layout")]
    sort_order: String,
    /// Shrink each page to its content
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    fit_pages: bool,

    // Export
    /// Page image format: png | webp
    #[arg(long, value_parser = ["png", "webp"], default_value = "png", help_heading = "Export")]
    page_format: String,
    /// Draw red outlines around regions (debug)
    #[arg(long, default_value_t = false, help_heading = "Export")]
    outlines: bool,
    /// Also write layout.json (regions with source keys and placements)
    #[arg(long, default_value_t = false, help_heading = "Export")]
    layout_json: bool,
    /// Export generation stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Generate(args) => run_generate(args, progress, true),
        Commands::Layout(args) => run_generate(args, progress, false),
    }
}

fn run_generate(cli: &GenerateArgs, show_progress: bool, write_pages: bool) -> anyhow::Result<()> {
    let mut cfg = build_config(cli)?;
    if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.into_atlas_config(cfg)?;
    }

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let sources = collect_animation_paths(cli)?;
    let abort_on_error = cli.on_decode_error == "abort";
    let animations = load_animations_with_progress(sources, show_progress, abort_on_error)?;
    let frame_count: usize = animations.iter().map(|a| a.frames.len()).sum();
    info!(
        animations = animations.len(),
        frames = frame_count,
        "loaded input frames"
    );

    let out = generate_atlas(animations, cfg)?;
    info!("{}", out.stats.summary());

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
        if write_pages {
            write_pages_to(&out, &cli.out_dir, &cli.page_format, cli.outlines)?;
        }

        let json_path = cli.out_dir.join("animations.json");
        let json = serde_json::to_string_pretty(&to_json(&out.description))?;
        fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
        info!(?json_path, pages = out.pages.len(), "animations written");

        if cli.layout_json {
            let layout_path = cli.out_dir.join("layout.json");
            let json = serde_json::to_string_pretty(&to_layout_json(&out))?;
            fs::write(&layout_path, json)
                .with_context(|| format!("write {}", layout_path.display()))?;
            info!(?layout_path, "layout written");
        }
    }

    if let Some(stats_path) = &cli.export_stats {
        let json = serde_json::to_string_pretty(&out.stats)?;
        fs::write(stats_path, json).with_context(|| format!("write {}", stats_path.display()))?;
        info!(?stats_path, "stats exported");
    }
    Ok(())
}

fn build_config(cli: &GenerateArgs) -> anyhow::Result<AtlasConfig> {
    Ok(AtlasConfig {
        pivot_x: cli.pivot_x,
        pivot_y: cli.pivot_y,
        max_rect_size: cli.max_rect_size,
        merge_waste_budget: cli.merge_waste_budget,
        merge_islands: cli.merge_islands,
        tiling: parse_tiling(&cli.tiling)?,
        dedup: parse_dedup(&cli.dedup)?,
        page_width: cli.page_width,
        page_height: cli.page_height,
        margin: cli.margin,
        heuristic: parse_heuristic(&cli.heuristic)?,
        sort_order: parse_sort_order(&cli.sort_order)?,
        fit_pages_to_content: cli.fit_pages,
        parallel: cli.parallel,
    })
}

fn write_pages_to(
    out: &AtlasOutput,
    out_dir: &Path,
    format: &str,
    outlines: bool,
) -> anyhow::Result<()> {
    let canvases = compose_pages(out, outlines);
    for (page, rgba) in out.pages.iter().zip(canvases) {
        let path = out_dir.join(format!("page{}.{}", page.index, format));
        rgba.save(&path)
            .with_context(|| format!("write {}", path.display()))?;
        info!(?path, id = page.index, "wrote page");
    }
    Ok(())
}

/// Resolves `--animation` and `--auto` inputs to ordered frame paths per animation id.
fn collect_animation_paths(cli: &GenerateArgs) -> anyhow::Result<Vec<(String, Vec<PathBuf>)>> {
    let include = build_globset(&cli.include)?;
    let exclude = build_globset(&cli.exclude)?;
    let mut groups: Vec<(String, Vec<PathBuf>)> = Vec::new();

    for arg in &cli.animations {
        let Some((id, path)) = arg.split_once('=') else {
            anyhow::bail!("--animation expects ID=PATH, got {arg:?}");
        };
        let id = id.trim();
        if id.is_empty() {
            anyhow::bail!("empty animation id in {arg:?}");
        }
        let paths = gather_paths(Path::new(path), include.as_ref(), exclude.as_ref())?;
        push_group(&mut groups, id, paths);
    }

    if let Some(dir) = &cli.auto {
        let ids: Vec<String> = cli
            .animation_ids
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let mut buckets: Vec<Vec<PathBuf>> = vec![Vec::new(); ids.len()];
        for p in gather_paths(dir, include.as_ref(), exclude.as_ref())? {
            let name = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
            match assign_animation(name, &ids) {
                Some(i) => buckets[i].push(p),
                None => warn!(?p, "no animation id matches file name, skipped"),
            }
        }
        for (id, paths) in ids.iter().zip(buckets) {
            if !paths.is_empty() {
                push_group(&mut groups, id, paths);
            }
        }
    }

    for (id, paths) in &mut groups {
        paths.sort_by(|a, b| frame_order(a, b));
        debug!(id = %id, frames = paths.len(), "animation frames");
    }
    groups.retain(|(id, paths)| {
        if paths.is_empty() {
            warn!(id = %id, "animation has no image files");
        }
        !paths.is_empty()
    });
    if groups.is_empty() {
        anyhow::bail!("no input frames: pass --animation ID=PATH and/or --auto PATH");
    }
    Ok(groups)
}

fn push_group(groups: &mut Vec<(String, Vec<PathBuf>)>, id: &str, paths: Vec<PathBuf>) {
    match groups.iter_mut().find(|(g, _)| g == id) {
        Some((_, existing)) => existing.extend(paths),
        None => groups.push((id.to_string(), paths)),
    }
}

/// Index of the longest id that prefixes `file_name`, ignoring case.
fn assign_animation(file_name: &str, ids: &[String]) -> Option<usize> {
    let lower = file_name.to_ascii_lowercase();
    ids.iter()
        .enumerate()
        .filter(|(_, id)| lower.starts_with(&id.to_ascii_lowercase()))
        .max_by_key(|(_, id)| id.len())
        .map(|(i, _)| i)
}

/// File name order with digit runs compared numerically (`run_2` before `run_10`).
fn frame_order(a: &Path, b: &Path) -> Ordering {
    let name = |p: &Path| {
        p.file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    natural_cmp(&name(a), &name(b)).then_with(|| a.cmp(b))
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut ai, mut bi) = (a.chars().peekable(), b.chars().peekable());
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let take_num = |it: &mut std::iter::Peekable<std::str::Chars<'_>>| {
                    let mut digits = String::new();
                    while let Some(c) = it.peek().copied().filter(char::is_ascii_digit) {
                        digits.push(c);
                        it.next();
                    }
                    digits
                };
                let (da, db) = (take_num(&mut ai), take_num(&mut bi));
                let (ta, tb) = (da.trim_start_matches('0'), db.trim_start_matches('0'));
                let ord = ta.len().cmp(&tb.len()).then_with(|| ta.cmp(tb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("invalid glob {pat:?}"))?);
    }
    Ok(Some(b.build()?))
}

fn gather_paths(
    path: &Path,
    include: Option<&GlobSet>,
    exclude: Option<&GlobSet>,
) -> anyhow::Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("input path {} does not exist", path.display());
    }
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, include, exclude) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && !should_skip(p, include, exclude) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "webp" | "bmp" | "tga" | "gif")
    )
}

fn load_animations_with_progress(
    groups: Vec<(String, Vec<PathBuf>)>,
    progress: bool,
    abort_on_error: bool,
) -> anyhow::Result<Vec<AnimationInput>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let total: usize = groups.iter().map(|(_, p)| p.len()).sum();
    let bar = if progress {
        let b = ProgressBar::new(total as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} decoding {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };

    let mut animations = Vec::with_capacity(groups.len());
    for (id, paths) in groups {
        let mut frames = Vec::with_capacity(paths.len());
        for p in paths {
            let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
            if let Some(b) = &bar {
                b.set_message(format!("{id}: {msg}"));
            }
            let key = p.to_string_lossy().replace('\\', "/");
            match load_frame(&p, &key) {
                Ok(image) => frames.push(FrameInput { key, image }),
                Err(e) if abort_on_error => {
                    if let Some(b) = &bar {
                        b.abandon();
                    }
                    return Err(e);
                }
                Err(e) => {
                    error!(?p, error = %e, "skip image");
                }
            }
            if let Some(b) = &bar {
                b.inc(1);
            }
        }
        animations.push(AnimationInput { id, frames });
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(animations)
}

fn load_frame(p: &Path, key: &str) -> anyhow::Result<sprite_atlas_core::PixelBuffer> {
    let bytes = fs::read(p).with_context(|| format!("read {}", p.display()))?;
    Ok(decode_keyed(key, &bytes)?)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YamlConfig {
    pivot_x: Option<f64>,
    pivot_y: Option<f64>,
    max_rect_size: Option<u32>,
    merge_waste_budget: Option<u64>,
    merge_islands: Option<bool>,
    tiling: Option<String>,
    dedup: Option<String>,
    page_width: Option<u32>,
    page_height: Option<u32>,
    margin: Option<u32>,
    heuristic: Option<String>,
    sort_order: Option<String>,
    fit_pages_to_content: Option<bool>,
    parallel: Option<bool>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> anyhow::Result<AtlasConfig> {
        if let Some(v) = self.pivot_x {
            cfg.pivot_x = v;
        }
        if let Some(v) = self.pivot_y {
            cfg.pivot_y = v;
        }
        if let Some(v) = self.max_rect_size {
            cfg.max_rect_size = v;
        }
        if let Some(v) = self.merge_waste_budget {
            cfg.merge_waste_budget = v;
        }
        if let Some(v) = self.merge_islands {
            cfg.merge_islands = v;
        }
        if let Some(v) = self.tiling {
            cfg.tiling = parse_tiling(&v)?;
        }
        if let Some(v) = self.dedup {
            cfg.dedup = parse_dedup(&v)?;
        }
        if let Some(v) = self.page_width {
            cfg.page_width = v;
        }
        if let Some(v) = self.page_height {
            cfg.page_height = v;
        }
        if let Some(v) = self.margin {
            cfg.margin = v;
        }
        if let Some(v) = self.heuristic {
            cfg.heuristic = parse_heuristic(&v)?;
        }
        if let Some(v) = self.sort_order {
            cfg.sort_order = parse_sort_order(&v)?;
        }
        if let Some(v) = self.fit_pages_to_content {
            cfg.fit_pages_to_content = v;
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        Ok(cfg)
    }
}

fn parse_tiling(s: &str) -> anyhow::Result<TilingMode> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown tiling mode: {} (expected whole or grid:N)", s))
}

fn parse_dedup(s: &str) -> anyhow::Result<DedupGranularity> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown dedup mode: {}", s))
}

fn parse_heuristic(s: &str) -> anyhow::Result<MaxRectsHeuristic> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown heuristic: {}", s))
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        let ids: Vec<String> = ["IDLE", "MOVE", "ATTACK", "ATTACK_HEAVY"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(assign_animation("idle_03.png", &ids), Some(0));
        assert_eq!(assign_animation("Attack_heavy_1.png", &ids), Some(3));
        assert_eq!(assign_animation("attack_1.png", &ids), Some(2));
        assert_eq!(assign_animation("jump_1.png", &ids), None);
    }

    #[test]
    fn frames_sort_numerically() {
        let mut names = vec!["run_10.png", "run_2.png", "run_1.png", "Run_02b.png"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, ["run_1.png", "run_2.png", "Run_02b.png", "run_10.png"]);
    }

    #[test]
    fn yaml_overrides_cli_values() {
        let y: YamlConfig =
            serde_yaml::from_str("max_rect_size: 128\ndedup: frame\ntiling: grid:32\n").unwrap();
        let cfg = y.into_atlas_config(AtlasConfig::default()).unwrap();
        assert_eq!(cfg.max_rect_size, 128);
        assert_eq!(cfg.dedup, DedupGranularity::Frame);
        assert_eq!(cfg.tiling, TilingMode::Grid { cell_size: 32 });
        assert_eq!(cfg.page_width, 2048);
    }

    #[test]
    fn cli_parses_generate_arguments() {
        let cli = Cli::try_parse_from([
            "sprite-atlas",
            "generate",
            "--animation",
            "IDLE=frames/idle",
            "--auto",
            "frames",
            "--animation-ids",
            "IDLE,WALK",
            "--tiling",
            "grid:64",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.animations, ["IDLE=frames/idle"]);
        assert_eq!(args.animation_ids, ["IDLE", "WALK"]);
        let cfg = build_config(&args).unwrap();
        assert_eq!(cfg.tiling, TilingMode::Grid { cell_size: 64 });
        assert_eq!(cfg.margin, 2);
    }

    /// Two decodable frames around a file that is not an image at all.
    fn idle_group_with_corrupt_frame(dir: &Path) -> Vec<(String, Vec<PathBuf>)> {
        let good: Vec<PathBuf> = ["idle_0.png", "idle_2.png"]
            .iter()
            .map(|name| {
                let path = dir.join(name);
                image::RgbaImage::from_pixel(4, 4, image::Rgba([9, 9, 9, 255]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect();
        let broken = dir.join("idle_1.png");
        fs::write(&broken, b"definitely not a png").unwrap();
        vec![(
            "IDLE".to_string(),
            vec![good[0].clone(), broken, good[1].clone()],
        )]
    }

    #[test]
    fn corrupt_frame_is_skipped_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let groups = idle_group_with_corrupt_frame(dir.path());
        let animations = load_animations_with_progress(groups, false, false).unwrap();
        assert_eq!(animations.len(), 1);
        let keys: Vec<&str> = animations[0].frames.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].ends_with("idle_0.png") && keys[1].ends_with("idle_2.png"), "{keys:?}");
    }

    #[test]
    fn corrupt_frame_aborts_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let groups = idle_group_with_corrupt_frame(dir.path());
        let err = load_animations_with_progress(groups, false, true).unwrap_err();
        assert!(err.to_string().contains("idle_1.png"), "{err}");
    }

    #[test]
    fn decode_policy_flag_rejects_unknown_values() {
        let base = ["sprite-atlas", "generate", "--animation", "IDLE=idle"];
        let parsed = Cli::try_parse_from(base.iter().chain(&["--on-decode-error", "ignore"]));
        assert!(parsed.is_err());
        let parsed = Cli::try_parse_from(base.iter().chain(&["--on-decode-error", "abort"]));
        let Commands::Generate(args) = parsed.unwrap().command else {
            panic!("expected generate");
        };
        assert_eq!(args.on_decode_error, "abort");
    }
}
